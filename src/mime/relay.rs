//-
// Copyright (c) 2020, Jason Lingle
//
// This file is part of Mimetree.
//
// Mimetree is free software: you can  redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Mimetree is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without  even the implied  warranty of MERCHANTABILITY  or FITNESS
// FOR  A PARTICULAR  PURPOSE.  See the  GNU General  Public  License for  more
// details.
//
// You should have received a copy of the GNU General Public License along with
// Mimetree. If not, see <http://www.gnu.org/licenses/>.

use std::io::{self, Write};

use chrono::prelude::*;

use super::component::{Component, GenerationContext, ParsingContext};
use super::fold::LineFolder;
use super::syntax;

/// The trace information of a `Received` field (RFC 2822 3.6.7).
///
/// The clauses are kept as free text, since there is little agreement in
/// practice about what goes in them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Relay {
    pub from: String,
    pub by: String,
    pub via: String,
    pub with: Vec<String>,
    pub id: String,
    pub for_: String,
    pub date: Option<DateTime<FixedOffset>>,
}

#[derive(Clone, Copy)]
enum Clause {
    None,
    From,
    By,
    Via,
    With,
    Id,
    For,
}

impl Relay {
    pub(crate) fn parse_value(raw: &[u8]) -> Self {
        let mut relay = Relay::default();

        let clauses = match memchr::memrchr(b';', raw) {
            Some(semi) => {
                relay.date = syntax::parse_date_time(&raw[semi + 1..]);
                &raw[..semi]
            }
            None => raw,
        };

        let mut clause = Clause::None;
        for word in syntax::relay_words(clauses) {
            let keyword = match word.to_ascii_lowercase().as_str() {
                "from" => Some(Clause::From),
                "by" => Some(Clause::By),
                "via" => Some(Clause::Via),
                "with" => Some(Clause::With),
                "id" => Some(Clause::Id),
                "for" => Some(Clause::For),
                _ => None,
            };

            if let Some(keyword) = keyword {
                clause = keyword;
                if let Clause::With = clause {
                    relay.with.push(String::new());
                }
                continue;
            }

            let target = match clause {
                Clause::None => continue,
                Clause::From => &mut relay.from,
                Clause::By => &mut relay.by,
                Clause::Via => &mut relay.via,
                Clause::Id => &mut relay.id,
                Clause::For => &mut relay.for_,
                Clause::With => match relay.with.last_mut() {
                    Some(with) => with,
                    None => continue,
                },
            };

            if !target.is_empty() {
                target.push(' ');
            }
            target.push_str(&word);
        }

        relay.with.retain(|w| !w.is_empty());
        relay
    }
}

impl Component for Relay {
    fn parse(
        &mut self,
        _: &ParsingContext<'_>,
        buffer: &[u8],
        start: usize,
        end: usize,
    ) -> usize {
        *self = Relay::parse_value(&buffer[start..end]);
        end
    }

    fn generate(
        &self,
        ctx: &GenerationContext,
        out: &mut dyn Write,
        cur_line_pos: usize,
    ) -> io::Result<usize> {
        let mut folder =
            LineFolder::new(out, ctx.max_line_length, cur_line_pos);
        let mut first = true;
        write_clause(&mut folder, &mut first, "from", &self.from)?;
        write_clause(&mut folder, &mut first, "by", &self.by)?;
        write_clause(&mut folder, &mut first, "via", &self.via)?;
        for with in &self.with {
            write_clause(&mut folder, &mut first, "with", with)?;
        }
        write_clause(&mut folder, &mut first, "id", &self.id)?;
        write_clause(&mut folder, &mut first, "for", &self.for_)?;

        if let Some(date) = self.date {
            folder.token(";", false)?;
            for word in date.to_rfc2822().split(' ') {
                folder.token(word, true)?;
            }
        }

        Ok(folder.finish())
    }
}

fn write_clause(
    folder: &mut LineFolder<'_>,
    first: &mut bool,
    keyword: &str,
    value: &str,
) -> io::Result<()> {
    if value.is_empty() {
        return Ok(());
    }

    folder.token(keyword, !*first)?;
    *first = false;
    for word in value.split(' ') {
        folder.token(word, true)?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_received() {
        let mut relay = Relay::default();
        relay.parse_bytes(
            b"from mail.example.test (mail.example.test [192.0.2.1])\r\n\
              \tby mx.example.test (Postfix) with ESMTPS id 4C1A2B3\r\n\
              \tfor <user@example.test>; Tue, 1 Jul 2003 10:52:37 +0200",
        );

        assert_eq!("mail.example.test", relay.from);
        assert_eq!("mx.example.test", relay.by);
        assert_eq!(vec!["ESMTPS".to_owned()], relay.with);
        assert_eq!("4C1A2B3", relay.id);
        assert_eq!("<user@example.test>", relay.for_);
        assert_eq!(
            "2003-07-01T10:52:37+02:00",
            relay.date.unwrap().to_rfc3339()
        );
    }

    #[test]
    fn parse_odd_received() {
        let mut relay = Relay::default();
        relay.parse_bytes(b"by localhost; not a date");
        assert_eq!("localhost", relay.by);
        assert_eq!(None, relay.date);

        relay.parse_bytes(b"");
        assert_eq!(Relay::default(), relay);
    }

    #[test]
    fn generate_then_parse() {
        let relay = Relay {
            from: "a.example.test".to_owned(),
            by: "b.example.test".to_owned(),
            with: vec!["SMTP".to_owned(), "LMTP".to_owned()],
            id: "abc123".to_owned(),
            date: Some(
                FixedOffset::east_opt(3600)
                    .unwrap()
                    .with_ymd_and_hms(2020, 2, 29, 23, 59, 1)
                    .unwrap(),
            ),
            ..Relay::default()
        };

        let generated = relay.generate_to_string(&GenerationContext::default());
        assert!(generated.starts_with("from a.example.test by b.example.test"));
        for line in generated.split("\r\n") {
            assert!(line.len() <= 78, "Line too long: {:?}", line);
        }

        let mut parsed = Relay::default();
        parsed.parse_bytes(generated.as_bytes());
        assert_eq!(relay, parsed);
    }
}
