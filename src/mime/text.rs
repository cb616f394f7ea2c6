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

use std::fmt;
use std::io::{self, Write};

use super::component::{Component, GenerationContext, ParsingContext};
use super::encoded_word::{ew_decode, ew_encode, looks_encoded};
use super::fold::LineFolder;
use super::syntax::is_ascii_atext;

/// Human-readable text, such as a subject or a display name.
///
/// The value is held decoded. On the wire, anything that cannot be written
/// as plain ASCII is carried in RFC 2047 encoded words.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Text(String);

impl Text {
    pub fn new(s: impl Into<String>) -> Self {
        Text(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Decodes an unstructured field body: unfolds it, trims it, and decodes
    /// any encoded words.
    pub(crate) fn from_unstructured(raw: &[u8]) -> Self {
        Text(decode_unstructured(unfold(raw).trim()))
    }

    pub(crate) fn write_unstructured(
        &self,
        folder: &mut LineFolder<'_>,
    ) -> io::Result<()> {
        let words: Vec<&str> = self.0.split(' ').collect();
        let encoded: Vec<bool> =
            (0..words.len()).map(|ix| in_encoded_run(&words, ix)).collect();

        let mut tokens: Vec<String> = Vec::new();
        let mut ix = 0;
        while ix < words.len() {
            if encoded[ix] {
                // Encode the whole run of unprintable words at once, since
                // the whitespace between adjacent encoded words is lost
                let run_end = (ix..words.len())
                    .find(|&j| !encoded[j])
                    .unwrap_or(words.len());
                tokens.extend(ew_encode(&words[ix..run_end].join(" ")));
                ix = run_end;
            } else {
                // Extra spaces end the previous token, so that folding after
                // it cannot collapse them
                if words[ix].is_empty() && !tokens.is_empty() {
                    if let Some(last) = tokens.last_mut() {
                        last.push(' ');
                    }
                } else {
                    tokens.push(words[ix].to_owned());
                }
                ix += 1;
            }
        }

        for (ix, token) in tokens.iter().enumerate() {
            folder.token(token, ix > 0)?;
        }

        Ok(())
    }

    /// Writes this text as an RFC 2822 `phrase`, as used for display names.
    pub(crate) fn write_phrase(
        &self,
        folder: &mut LineFolder<'_>,
        space: bool,
    ) -> io::Result<()> {
        if self.0.split(' ').all(is_atom) {
            for (ix, word) in self.0.split(' ').enumerate() {
                folder.token(word, space || ix > 0)?;
            }
        } else if self.0.bytes().all(|b| (b' '..=b'~').contains(&b)) {
            folder.token(&quote(&self.0), space)?;
        } else {
            for (ix, word) in ew_encode(&self.0).iter().enumerate() {
                folder.token(word, space || ix > 0)?;
            }
        }

        Ok(())
    }
}

impl From<&str> for Text {
    fn from(s: &str) -> Self {
        Text(s.to_owned())
    }
}

impl From<String> for Text {
    fn from(s: String) -> Self {
        Text(s)
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Component for Text {
    fn parse(
        &mut self,
        _: &ParsingContext<'_>,
        buffer: &[u8],
        start: usize,
        end: usize,
    ) -> usize {
        *self = Text::from_unstructured(&buffer[start..end]);
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
        self.write_unstructured(&mut folder)?;
        Ok(folder.finish())
    }
}

/// A word of an RFC 2822 `phrase`, as produced by the grammar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum PhraseWord<'a> {
    Atom(&'a [u8]),
    Quoted(Vec<u8>),
    /// Obsolete syntax allows bare dots in phrases, e.g. `John Q. Public`.
    Dot,
}

pub(crate) fn decode_phrase(words: Vec<PhraseWord<'_>>) -> String {
    let mut out = String::new();
    let mut prev_encoded = false;

    for (ix, word) in words.into_iter().enumerate() {
        match word {
            PhraseWord::Dot => {
                out.push('.');
                prev_encoded = false;
            }
            PhraseWord::Atom(atom) => {
                let atom = String::from_utf8_lossy(atom);
                match ew_decode(&atom) {
                    Some(decoded) => {
                        if ix > 0 && !prev_encoded {
                            out.push(' ');
                        }
                        out.push_str(&decoded);
                        prev_encoded = true;
                    }
                    None => {
                        if ix > 0 {
                            out.push(' ');
                        }
                        out.push_str(&atom);
                        prev_encoded = false;
                    }
                }
            }
            PhraseWord::Quoted(quoted) => {
                if ix > 0 {
                    out.push(' ');
                }
                out.push_str(&String::from_utf8_lossy(&quoted));
                prev_encoded = false;
            }
        }
    }

    out
}

/// Removes folding from a raw field body.
///
/// Each line break, together with the whitespace around the start of the
/// next line, becomes a single space.
pub(crate) fn unfold(raw: &[u8]) -> String {
    if memchr::memchr2(b'\r', b'\n', raw).is_none() {
        return String::from_utf8_lossy(raw).into_owned();
    }

    let mut unfolded = Vec::with_capacity(raw.len());
    let mut is_unfolding = false;
    for ch in raw.iter().copied() {
        if is_unfolding {
            if b' ' == ch || b'\t' == ch || b'\r' == ch || b'\n' == ch {
                continue;
            }
            is_unfolding = false;
            unfolded.push(ch);
        } else if b'\r' == ch || b'\n' == ch {
            unfolded.push(b' ');
            is_unfolding = true;
        } else {
            unfolded.push(ch);
        }
    }

    match String::from_utf8(unfolded) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

/// Decodes the encoded words in unfolded unstructured text.
///
/// Whitespace between two adjacent encoded words is dropped; all other
/// whitespace is kept as-is.
pub(crate) fn decode_unstructured(s: &str) -> String {
    fn is_ws(c: char) -> bool {
        ' ' == c || '\t' == c
    }

    let mut out = String::with_capacity(s.len());
    let mut prev_encoded = false;
    let mut rest = s;

    loop {
        let word_start = rest.len() - rest.trim_start_matches(is_ws).len();
        let (ws, tail) = rest.split_at(word_start);
        if tail.is_empty() {
            out.push_str(ws);
            break;
        }

        let word_end = tail.find(is_ws).unwrap_or(tail.len());
        let (word, tail) = tail.split_at(word_end);
        rest = tail;

        match ew_decode(word) {
            Some(decoded) => {
                if !prev_encoded {
                    out.push_str(ws);
                }
                out.push_str(&decoded);
                prev_encoded = true;
            }
            None => {
                out.push_str(ws);
                out.push_str(word);
                prev_encoded = false;
            }
        }
    }

    out
}

fn is_plain(word: &str) -> bool {
    word.bytes().all(|b| (b'!'..=b'~').contains(&b)) && !looks_encoded(word)
}

/// Whether `words[ix]` must go inside an encoded word. Empty words, which
/// stand for extra spaces, do when both neighbouring words are encoded.
fn in_encoded_run(words: &[&str], ix: usize) -> bool {
    if !words[ix].is_empty() {
        return !is_plain(words[ix]);
    }

    let prev = words[..ix].iter().rev().find(|w| !w.is_empty());
    let next = words[ix + 1..].iter().find(|w| !w.is_empty());
    match (prev, next) {
        (Some(prev), Some(next)) => !is_plain(prev) && !is_plain(next),
        _ => false,
    }
}

fn is_atom(word: &str) -> bool {
    !word.is_empty()
        && word.bytes().all(is_ascii_atext)
        && !looks_encoded(word)
}

fn quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for ch in s.chars() {
        if '"' == ch || '\\' == ch {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;
    use crate::mime::fold::line_length;

    fn phrase(text: &str) -> String {
        let mut out = Vec::new();
        let mut folder = LineFolder::new(&mut out, line_length::INFINITE, 0);
        Text::from(text).write_phrase(&mut folder, false).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn unfolding() {
        assert_eq!("foo bar", unfold(b"foo\r\n bar"));
        assert_eq!("foo bar", unfold(b"foo\r\n\t  bar"));
        assert_eq!("foo bar", unfold(b"foo\n bar"));
        assert_eq!("plain", unfold(b"plain"));
    }

    #[test]
    fn unstructured_decoding() {
        assert_eq!(
            "Hello world",
            Text::from_unstructured(b"  Hello\r\n world\r\n").as_str()
        );
        assert_eq!(
            "ab",
            decode_unstructured("=?ISO-8859-1?Q?a?=  \t =?ISO-8859-1?Q?b?=")
        );
        assert_eq!("a b", decode_unstructured("=?ISO-8859-1?Q?a?= b"));
        assert_eq!("a b", decode_unstructured("a =?ISO-8859-1?Q?b?="));
        assert_eq!("=?bogus?= x", decode_unstructured("=?bogus?= x"));
    }

    #[test]
    fn phrase_generation() {
        assert_eq!("John Doe", phrase("John Doe"));
        assert_eq!("\"Doe, John\"", phrase("Doe, John"));
        assert_eq!("\"say \\\"hi\\\"\"", phrase("say \"hi\""));
        assert_eq!("=?utf-8?B?SsO2cmc=?=", phrase("Jörg"));
    }

    #[test]
    fn phrase_decoding() {
        assert_eq!(
            "John Q. Public",
            decode_phrase(vec![
                PhraseWord::Atom(b"John"),
                PhraseWord::Atom(b"Q"),
                PhraseWord::Dot,
                PhraseWord::Atom(b"Public"),
            ])
        );
        assert_eq!(
            "Keld Jørn Simonsen",
            decode_phrase(vec![
                PhraseWord::Atom(b"=?ISO-8859-1?Q?Keld_J=F8rn?="),
                PhraseWord::Atom(b"=?ISO-8859-1?Q?_Simonsen?="),
            ])
        );
        assert_eq!(
            "Doe, John",
            decode_phrase(vec![PhraseWord::Quoted(b"Doe, John".to_vec())])
        );
    }

    #[test]
    fn unstructured_generation_folds() {
        let text = Text::from(
            "This is a rather long subject line which will certainly need \
             to be folded at least once",
        );
        let generated =
            text.generate_to_string(&GenerationContext::default());
        assert!(generated.contains("\r\n "));
        for line in generated.split("\r\n") {
            assert!(line.len() <= 78);
        }
        assert_eq!(text, Text::from_unstructured(generated.as_bytes()));
    }

    #[test]
    fn repeated_spaces_survive_generation() {
        let text = Text::from("\u{4e00}  \u{e0}");
        let generated =
            text.generate_to_string(&GenerationContext::default());
        assert_eq!(1, generated.matches("=?utf-8?B?").count());
        assert_eq!(text, Text::from_unstructured(generated.as_bytes()));

        let text = Text::from("\u{4e00}   mixed  with \u{e0}  plain");
        let generated =
            text.generate_to_string(&GenerationContext::default());
        assert_eq!(text, Text::from_unstructured(generated.as_bytes()));

        let mut text = String::new();
        for _ in 0..12 {
            text.push_str("spaced  out   ");
        }
        let text = Text::from(text.trim_end());
        let generated =
            text.generate_to_string(&GenerationContext::default());
        assert!(generated.contains("\r\n "));
        assert_eq!(text, Text::from_unstructured(generated.as_bytes()));
    }

    #[test]
    fn unstructured_generation_encodes() {
        let text = Text::from("Grüße aus Köln und so");
        let generated =
            text.generate_to_string(&GenerationContext::default());
        assert!(generated.is_ascii());
        assert!(generated.contains("=?utf-8?B?"));
        assert!(generated.ends_with(" und so"));
        assert_eq!(text, Text::from_unstructured(generated.as_bytes()));

        let sneaky = Text::from("=?utf-8?Q?not_encoded?=");
        let generated =
            sneaky.generate_to_string(&GenerationContext::default());
        assert_ne!("=?utf-8?Q?not_encoded?=", generated);
        assert_eq!(sneaky, Text::from_unstructured(generated.as_bytes()));
    }

    proptest! {
        #[test]
        fn unstructured_round_trip(
            s in "[a-zA-Z0-9äöüß一!.,]{1,12}( {1,3}[a-zA-Z0-9äöüß一!.,]{1,12}){0,10}"
        ) {
            let text = Text::from(s.as_str());
            let generated = text.generate_to_vec(&GenerationContext::default());
            prop_assert_eq!(text, Text::from_unstructured(&generated));
        }
    }
}
