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
use log::debug;

use super::address::Mailbox;
use super::address_list::AddressList;
use super::component::{Component, GenerationContext, ParsingContext};
use super::disposition::ContentDisposition;
use super::encoding::Encoding;
use super::fold::LineFolder;
use super::media_type::ContentType;
use super::message_id::{MessageId, MessageIdSequence};
use super::relay::Relay;
use super::syntax;
use super::text::{unfold, Text};

/// The typed value of a header field.
///
/// Which variant a field gets is decided by its name, through the field
/// registry. A value which cannot be understood as its registered type is
/// kept as `Generic` so that it survives regeneration unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    Mailbox(Mailbox),
    AddressList(AddressList),
    Text(Text),
    Date(DateTime<FixedOffset>),
    ContentType(ContentType),
    ContentDisposition(ContentDisposition),
    Encoding(Encoding),
    Relay(Relay),
    MessageId(MessageId),
    MessageIdSequence(MessageIdSequence),
    /// Unfolded raw text, not decoded in any way.
    Generic(String),
}

macro_rules! accessors {
    ($($get:ident, $get_mut:ident => $variant:ident: $t:ty;)*) => {
        $(
            pub fn $get(&self) -> Option<&$t> {
                match *self {
                    FieldValue::$variant(ref v) => Some(v),
                    _ => None,
                }
            }

            pub fn $get_mut(&mut self) -> Option<&mut $t> {
                match *self {
                    FieldValue::$variant(ref mut v) => Some(v),
                    _ => None,
                }
            }
        )*
    };
}

impl FieldValue {
    accessors! {
        as_mailbox, as_mailbox_mut => Mailbox: Mailbox;
        as_address_list, as_address_list_mut => AddressList: AddressList;
        as_text, as_text_mut => Text: Text;
        as_date, as_date_mut => Date: DateTime<FixedOffset>;
        as_content_type, as_content_type_mut => ContentType: ContentType;
        as_content_disposition, as_content_disposition_mut =>
            ContentDisposition: ContentDisposition;
        as_encoding, as_encoding_mut => Encoding: Encoding;
        as_relay, as_relay_mut => Relay: Relay;
        as_message_id, as_message_id_mut => MessageId: MessageId;
        as_message_id_sequence, as_message_id_sequence_mut =>
            MessageIdSequence: MessageIdSequence;
        as_generic, as_generic_mut => Generic: String;
    }

    pub fn is_generic(&self) -> bool {
        match *self {
            FieldValue::Generic(_) => true,
            _ => false,
        }
    }

    /// Parses `raw` as a value of the same kind as `self`, degrading to
    /// `Generic` if it cannot be understood as such.
    pub(crate) fn parse_as_kind(&self, raw: &[u8]) -> FieldValue {
        let parsed = match *self {
            FieldValue::Mailbox(_) => Mailbox::parse_prefix(raw)
                .filter(|&(_, rest)| syntax::skip_cfws(rest).is_empty())
                .map(|(mailbox, _)| FieldValue::Mailbox(mailbox)),
            FieldValue::AddressList(_) => {
                Some(FieldValue::AddressList(AddressList::parse_lenient(raw)))
            }
            FieldValue::Text(_) => {
                Some(FieldValue::Text(Text::from_unstructured(raw)))
            }
            FieldValue::Date(_) => {
                syntax::parse_date_time(raw).map(FieldValue::Date)
            }
            FieldValue::ContentType(_) => {
                ContentType::parse_value(raw).map(FieldValue::ContentType)
            }
            FieldValue::ContentDisposition(_) => {
                ContentDisposition::parse_value(raw)
                    .map(FieldValue::ContentDisposition)
            }
            FieldValue::Encoding(_) => syntax::bare_token(raw)
                .ok()
                .map(|(_, name)| FieldValue::Encoding(Encoding::from_name(&name))),
            FieldValue::Relay(_) => {
                Some(FieldValue::Relay(Relay::parse_value(raw)))
            }
            FieldValue::MessageId(_) => MessageId::parse_prefix(raw)
                .map(|(id, _)| FieldValue::MessageId(id)),
            FieldValue::MessageIdSequence(_) => Some(
                FieldValue::MessageIdSequence(MessageIdSequence::parse_lenient(
                    raw,
                )),
            ),
            FieldValue::Generic(_) => None,
        };

        parsed.unwrap_or_else(|| {
            let text = unfold(raw).trim().to_owned();
            if !self.is_generic() {
                debug!("Keeping unparseable field value as-is: {:?}", text);
            }
            FieldValue::Generic(text)
        })
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Generic(String::new())
    }
}

impl Component for FieldValue {
    /// Parses the range as a value of the kind `self` currently holds.
    fn parse(
        &mut self,
        _: &ParsingContext<'_>,
        buffer: &[u8],
        start: usize,
        end: usize,
    ) -> usize {
        *self = self.parse_as_kind(&buffer[start..end]);
        end
    }

    fn generate(
        &self,
        ctx: &GenerationContext,
        out: &mut dyn Write,
        cur_line_pos: usize,
    ) -> io::Result<usize> {
        match *self {
            FieldValue::Mailbox(ref v) => v.generate(ctx, out, cur_line_pos),
            FieldValue::AddressList(ref v) => {
                v.generate(ctx, out, cur_line_pos)
            }
            FieldValue::Text(ref v) => v.generate(ctx, out, cur_line_pos),
            FieldValue::ContentType(ref v) => {
                v.generate(ctx, out, cur_line_pos)
            }
            FieldValue::ContentDisposition(ref v) => {
                v.generate(ctx, out, cur_line_pos)
            }
            FieldValue::Encoding(ref v) => v.generate(ctx, out, cur_line_pos),
            FieldValue::Relay(ref v) => v.generate(ctx, out, cur_line_pos),
            FieldValue::MessageId(ref v) => v.generate(ctx, out, cur_line_pos),
            FieldValue::MessageIdSequence(ref v) => {
                v.generate(ctx, out, cur_line_pos)
            }
            FieldValue::Date(ref date) => {
                write_words(ctx, out, cur_line_pos, &date.to_rfc2822())
            }
            FieldValue::Generic(ref text) => {
                write_words(ctx, out, cur_line_pos, text)
            }
        }
    }
}

fn write_words(
    ctx: &GenerationContext,
    out: &mut dyn Write,
    cur_line_pos: usize,
    text: &str,
) -> io::Result<usize> {
    let mut folder = LineFolder::new(out, ctx.max_line_length, cur_line_pos);
    for (ix, word) in text.split(' ').enumerate() {
        folder.token(word, ix > 0)?;
    }
    Ok(folder.finish())
}

/// A named header field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderField {
    name: String,
    value: FieldValue,
}

impl HeaderField {
    pub fn new(name: &str, value: FieldValue) -> Self {
        HeaderField {
            name: name.to_owned(),
            value,
        }
    }

    /// The name as it was given or found, in its original case.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut FieldValue {
        &mut self.value
    }

    pub fn set_value(&mut self, value: FieldValue) {
        self.value = value;
    }

    pub fn into_value(self) -> FieldValue {
        self.value
    }

    /// Builds a field from its name and raw (possibly folded) body, typed
    /// according to the registry in `ctx`.
    pub(crate) fn from_raw(
        ctx: &ParsingContext<'_>,
        name: &str,
        raw: &[u8],
    ) -> Self {
        let template = ctx.fields.create_value(name);
        HeaderField {
            name: name.to_owned(),
            value: template.parse_as_kind(raw),
        }
    }
}

impl Component for HeaderField {
    /// Parses a complete `Name: value` field, without the final line break.
    fn parse(
        &mut self,
        ctx: &ParsingContext<'_>,
        buffer: &[u8],
        start: usize,
        end: usize,
    ) -> usize {
        let raw = &buffer[start..end];
        *self = match memchr::memchr(b':', raw) {
            Some(colon) => HeaderField::from_raw(
                ctx,
                String::from_utf8_lossy(&raw[..colon]).trim(),
                &raw[colon + 1..],
            ),
            None => {
                debug!(
                    "Header field without colon: {:?}",
                    String::from_utf8_lossy(raw)
                );
                HeaderField::new(
                    String::from_utf8_lossy(raw).trim(),
                    FieldValue::default(),
                )
            }
        };
        end
    }

    fn generate(
        &self,
        ctx: &GenerationContext,
        out: &mut dyn Write,
        cur_line_pos: usize,
    ) -> io::Result<usize> {
        write!(out, "{}: ", self.name)?;
        self.value
            .generate(ctx, out, cur_line_pos + self.name.len() + 2)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mime::address::{Address, EmailAddress};

    fn parse(s: &str) -> HeaderField {
        let mut field = HeaderField::default();
        field.parse_bytes(s.as_bytes());
        field
    }

    fn generate(field: &HeaderField) -> String {
        field.generate_to_string(&GenerationContext::default())
    }

    #[test]
    fn fields_are_typed_by_name() {
        let field = parse("FROM: Ann <ann@example.test>");
        assert!(field.is_named("From"));
        assert_eq!("FROM", field.name());
        assert_eq!(
            "ann",
            field.value().as_mailbox().unwrap().email().local_part()
        );
        assert_eq!(None, field.value().as_text());

        let field = parse("Subject: =?utf-8?q?Gr=C3=BC=C3=9Fe?= aus Bern");
        assert_eq!("Grüße aus Bern", field.value().as_text().unwrap().as_str());

        let field = parse("To: a@example.test,\r\n b@example.test");
        assert_eq!(2, field.value().as_address_list().unwrap().address_count());

        let field = parse("Date: Fri, 21 Nov 1997 09:55:06 -0600");
        assert_eq!(
            "1997-11-21T09:55:06-06:00",
            field.value().as_date().unwrap().to_rfc3339()
        );

        let field = parse("Content-Transfer-Encoding: Base64");
        assert_eq!(Some(&Encoding::Base64), field.value().as_encoding());

        let field = parse("References: <a@x.test> <b@x.test>");
        assert_eq!(
            2,
            field
                .value()
                .as_message_id_sequence()
                .unwrap()
                .message_id_count()
        );
    }

    #[test]
    fn unknown_fields_are_generic() {
        let field = parse("X-Whatever:  some\r\n\tvalue  ");
        assert_eq!(Some("some value"), field.value().as_generic().map(String::as_str));
        assert_eq!("X-Whatever: some value", generate(&field));
    }

    #[test]
    fn unparseable_typed_fields_degrade() {
        let field = parse("Date: the day before yesterday");
        assert_eq!(
            &FieldValue::Generic("the day before yesterday".to_owned()),
            field.value()
        );
        assert_eq!("Date: the day before yesterday", generate(&field));

        let field = parse("From: a@example.test, b@example.test");
        assert!(field.value().is_generic());

        let field = parse("Content-Type: ; charset=utf-8");
        assert!(field.value().is_generic());

        let field = parse("no colon here");
        assert_eq!("no colon here", field.name());
        assert!(field.value().is_generic());
    }

    #[test]
    fn generate_typed_fields() {
        let field = HeaderField::new(
            "To",
            FieldValue::AddressList(AddressList::from(vec![Address::from(
                Mailbox::new("Ann", EmailAddress::new("ann", "example.test")),
            )])),
        );
        assert_eq!("To: Ann <ann@example.test>", generate(&field));

        let date = FixedOffset::west_opt(6 * 3600)
            .unwrap()
            .with_ymd_and_hms(1997, 11, 21, 9, 55, 6)
            .unwrap();
        let field = HeaderField::new("Date", FieldValue::Date(date));
        let generated = generate(&field);
        assert_eq!("Date: Fri, 21 Nov 1997 09:55:06 -0600", generated);
        assert_eq!(field, parse(&generated));
    }

    #[test]
    fn long_fields_fold_after_name() {
        let subject = "word ".repeat(30);
        let field = HeaderField::new(
            "Subject",
            FieldValue::Text(Text::new(subject.trim())),
        );
        let generated = generate(&field);
        for line in generated.split("\r\n") {
            assert!(line.len() <= 78, "Line too long: {:?}", line);
        }
        assert_eq!(field, parse(&generated));
    }
}
