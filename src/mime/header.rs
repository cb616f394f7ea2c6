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

use log::debug;

use super::component::{Component, GenerationContext, ParsingContext};
use super::constants::fields;
use super::disposition::ContentDisposition;
use super::encoding::Encoding;
use super::field_registry::FieldRegistry;
use super::header_field::HeaderField;
use super::media_type::ContentType;

/// An ordered list of header fields.
///
/// Field names may repeat. Lookups by name are case-insensitive and find the
/// first field with that name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Header {
    fields: Vec<HeaderField>,
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find_field(&self, name: &str) -> Option<&HeaderField> {
        self.fields.iter().find(|f| f.is_named(name))
    }

    pub fn find_field_mut(&mut self, name: &str) -> Option<&mut HeaderField> {
        self.fields.iter_mut().find(|f| f.is_named(name))
    }

    pub fn find_all_fields<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a HeaderField> + 'a {
        self.fields.iter().filter(move |f| f.is_named(name))
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.find_field(name).is_some()
    }

    /// Returns the first field named `name`, appending an empty one of the
    /// kind `registry` gives that name if there is none.
    pub fn get_or_create_field(
        &mut self,
        registry: &FieldRegistry,
        name: &str,
    ) -> &mut HeaderField {
        let pos = match self.fields.iter().position(|f| f.is_named(name)) {
            Some(pos) => pos,
            None => {
                self.fields.push(registry.create(name));
                self.fields.len() - 1
            }
        };
        &mut self.fields[pos]
    }

    pub fn append_field(&mut self, field: HeaderField) {
        self.fields.push(field);
    }

    /// # Panics
    ///
    /// Panics if `pos > self.field_count()`.
    pub fn insert_field_before(&mut self, pos: usize, field: HeaderField) {
        self.fields.insert(pos, field);
    }

    /// # Panics
    ///
    /// Panics if `pos >= self.field_count()`.
    pub fn insert_field_after(&mut self, pos: usize, field: HeaderField) {
        self.fields.insert(pos + 1, field);
    }

    /// # Panics
    ///
    /// Panics if `pos >= self.field_count()`.
    pub fn remove_field(&mut self, pos: usize) -> HeaderField {
        self.fields.remove(pos)
    }

    /// Removes every field named `name`, returning how many there were.
    pub fn remove_all_fields(&mut self, name: &str) -> usize {
        let before = self.fields.len();
        self.fields.retain(|f| !f.is_named(name));
        before - self.fields.len()
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field_at(&self, pos: usize) -> Option<&HeaderField> {
        self.fields.get(pos)
    }

    pub fn fields(&self) -> &[HeaderField] {
        &self.fields
    }

    /// The `Content-Type`, if present and understood.
    pub fn content_type(&self) -> Option<&ContentType> {
        self.find_field(fields::CONTENT_TYPE)
            .and_then(|f| f.value().as_content_type())
    }

    pub fn content_disposition(&self) -> Option<&ContentDisposition> {
        self.find_field(fields::CONTENT_DISPOSITION)
            .and_then(|f| f.value().as_content_disposition())
    }

    /// The `Content-Transfer-Encoding`, defaulting to `7bit`.
    pub fn content_transfer_encoding(&self) -> Encoding {
        self.find_field(fields::CONTENT_TRANSFER_ENCODING)
            .and_then(|f| f.value().as_encoding())
            .cloned()
            .unwrap_or_default()
    }
}

impl Component for Header {
    /// Parses fields up to and including the blank line which ends the
    /// header, returning the offset of the body.
    ///
    /// A line which can be neither a field nor a continuation also ends the
    /// header, and is left at the start of the body. If there is no such line
    /// and no blank line, the whole range is taken as the header.
    fn parse(
        &mut self,
        ctx: &ParsingContext<'_>,
        buffer: &[u8],
        start: usize,
        end: usize,
    ) -> usize {
        self.fields.clear();

        // Range of the field currently being accumulated, excluding the
        // line ending of its last line
        let mut current: Option<(usize, usize)> = None;
        let mut pos = start;
        let mut body_start = end;

        while pos < end {
            let (line_end, next) =
                match memchr::memchr(b'\n', &buffer[pos..end]) {
                    Some(lf) => (pos + lf, pos + lf + 1),
                    None => (end, end),
                };
            let content_end = if line_end > pos && b'\r' == buffer[line_end - 1]
            {
                line_end - 1
            } else {
                line_end
            };
            let line = &buffer[pos..content_end];

            if line.is_empty() {
                body_start = next;
                break;
            }

            let is_continuation = b' ' == line[0] || b'\t' == line[0];
            match current {
                Some((_, ref mut field_end)) if is_continuation => {
                    *field_end = content_end;
                }
                _ if !is_continuation
                    && memchr::memchr(b':', line).is_some() =>
                {
                    if let Some((field_start, field_end)) = current.take() {
                        self.push_raw_field(
                            ctx,
                            buffer,
                            field_start,
                            field_end,
                        );
                    }
                    current = Some((pos, content_end));
                }
                _ => {
                    debug!(
                        "Header ended by non-field line: {:?}",
                        String::from_utf8_lossy(line)
                    );
                    body_start = pos;
                    break;
                }
            }

            pos = next;
        }

        if let Some((field_start, field_end)) = current {
            self.push_raw_field(ctx, buffer, field_start, field_end);
        }

        body_start
    }

    /// Writes each field on its own line. The blank line ending the header is
    /// not written.
    fn generate(
        &self,
        ctx: &GenerationContext,
        out: &mut dyn Write,
        _cur_line_pos: usize,
    ) -> io::Result<usize> {
        for field in &self.fields {
            field.generate(ctx, out, 0)?;
            out.write_all(b"\r\n")?;
        }
        Ok(0)
    }
}

impl Header {
    fn push_raw_field(
        &mut self,
        ctx: &ParsingContext<'_>,
        buffer: &[u8],
        start: usize,
        end: usize,
    ) {
        let mut field = HeaderField::default();
        field.parse(ctx, buffer, start, end);
        self.fields.push(field);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mime::header_field::FieldValue;
    use crate::mime::text::Text;

    fn parse(s: &str) -> (Header, usize) {
        let mut header = Header::new();
        let body_start = header.parse_bytes(s.as_bytes());
        (header, body_start)
    }

    #[test]
    fn parse_header() {
        let raw = "Received: from a by b; Tue, 1 Jul 2003 10:52:37 +0200\r\n\
                   Received: from c by d; Tue, 1 Jul 2003 10:52:38 +0200\r\n\
                   Subject: a long\r\n \
                   \tsubject\r\n\
                   Content-Type: text/plain; charset=iso-8859-1\r\n\
                   \r\n\
                   Body text\r\n";
        let (header, body_start) = parse(raw);
        assert_eq!("Body text\r\n", &raw[body_start..]);
        assert_eq!(4, header.field_count());
        assert_eq!(2, header.find_all_fields("received").count());
        assert_eq!(
            "a",
            header.find_field("Received").unwrap().value().as_relay().unwrap().from
        );
        assert_eq!(
            "a long subject",
            header.find_field("subject").unwrap().value().as_text().unwrap().as_str()
        );
        assert!(header.content_type().unwrap().media_type().is("text", "plain"));
        assert_eq!(Encoding::SevenBit, header.content_transfer_encoding());
        assert!(header.content_disposition().is_none());
        assert!(!header.has_field("To"));
    }

    #[test]
    fn parse_odd_headers() {
        let (header, body_start) = parse("Subject: no body");
        assert_eq!(1, header.field_count());
        assert_eq!(16, body_start);

        let (header, body_start) = parse("\nbody");
        assert!(header.is_empty());
        assert_eq!(1, body_start);

        let (header, body_start) = parse("X-A: 1\nX-B: 2\n more\nFrom me\nX-C: 3\n\nrest");
        assert_eq!(2, header.field_count());
        assert_eq!("X-B", header.field_at(1).unwrap().name());
        assert_eq!(
            "From me\nX-C: 3\n\nrest",
            &"X-A: 1\nX-B: 2\n more\nFrom me\nX-C: 3\n\nrest"[body_start..]
        );
    }

    #[test]
    fn text_without_header_is_body() {
        let raw = "Hello world, this is the body\r\nsecond line\r\n";
        let (header, body_start) = parse(raw);
        assert!(header.is_empty());
        assert_eq!(0, body_start);

        let raw = " indented first line\r\nX-A: 1\r\n";
        let (header, body_start) = parse(raw);
        assert!(header.is_empty());
        assert_eq!(0, body_start);
    }

    #[test]
    fn field_editing() {
        let (mut header, _) = parse("A: 1\r\nB: 2\r\nA: 3\r\n\r\n");
        header.insert_field_before(
            0,
            HeaderField::new("Z", FieldValue::Generic("0".to_owned())),
        );
        header.insert_field_after(
            3,
            HeaderField::new("C", FieldValue::Generic("4".to_owned())),
        );
        assert_eq!(
            vec!["Z", "A", "B", "A", "C"],
            header.fields().iter().map(HeaderField::name).collect::<Vec<_>>()
        );

        assert_eq!(2, header.remove_all_fields("a"));
        assert_eq!("Z", header.remove_field(0).name());
        assert_eq!(2, header.field_count());

        let subject =
            header.get_or_create_field(FieldRegistry::standard(), "Subject");
        assert_eq!(Some(&Text::default()), subject.value().as_text());
        subject.set_value(FieldValue::Text(Text::from("Hi")));
        header
            .get_or_create_field(FieldRegistry::standard(), "SUBJECT")
            .value_mut()
            .as_text_mut()
            .unwrap()
            .clone_from(&Text::from("Hello"));
        assert_eq!(3, header.field_count());
        assert_eq!(
            "Hello",
            header.find_field("subject").unwrap().value().as_text().unwrap().as_str()
        );
    }

    #[test]
    fn generate_header() {
        let (header, _) = parse(
            "From: Ann <ann@example.test>\r\nX-Custom:   spaced\r\n\tout\r\n\r\n",
        );
        assert_eq!(
            "From: Ann <ann@example.test>\r\nX-Custom: spaced out\r\n",
            header.generate_to_string(&GenerationContext::default())
        );
    }
}
