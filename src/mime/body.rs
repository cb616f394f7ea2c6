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

//! The tree of body parts.

use std::borrow::Cow;
use std::io::{self, Write};
use std::ops::{Deref, DerefMut};

use log::{debug, warn};
use rand::distributions::Alphanumeric;
use rand::Rng;

use super::component::{Component, GenerationContext, ParsingContext};
use super::constants::{fields, media_types};
use super::encoding::Contents;
use super::header::Header;
use super::header_field::{FieldValue, HeaderField};
use super::media_type::{ContentType, MediaType};

/// The body of a part: either leaf content, or a list of child parts with
/// the prolog and epilog text around them.
///
/// When there are child parts, the leaf content is ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Body {
    contents: Contents,
    prolog: Vec<u8>,
    epilog: Vec<u8>,
    parts: Vec<BodyPart>,
}

impl Body {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> &Contents {
        &self.contents
    }

    pub fn set_contents(&mut self, contents: Contents) {
        self.contents = contents;
    }

    /// Text before the first boundary of a multipart body.
    pub fn prolog(&self) -> &[u8] {
        &self.prolog
    }

    pub fn set_prolog(&mut self, prolog: Vec<u8>) {
        self.prolog = prolog;
    }

    /// Text after the closing boundary of a multipart body.
    pub fn epilog(&self) -> &[u8] {
        &self.epilog
    }

    pub fn set_epilog(&mut self, epilog: Vec<u8>) {
        self.epilog = epilog;
    }

    pub fn is_multipart(&self) -> bool {
        !self.parts.is_empty()
    }

    pub fn parts(&self) -> &[BodyPart] {
        &self.parts
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    pub fn part_at(&self, pos: usize) -> Option<&BodyPart> {
        self.parts.get(pos)
    }

    pub fn part_at_mut(&mut self, pos: usize) -> Option<&mut BodyPart> {
        self.parts.get_mut(pos)
    }

    pub fn append_part(&mut self, part: BodyPart) {
        self.parts.push(part);
    }

    /// # Panics
    ///
    /// Panics if `pos > self.part_count()`.
    pub fn insert_part_before(&mut self, pos: usize, part: BodyPart) {
        self.parts.insert(pos, part);
    }

    /// # Panics
    ///
    /// Panics if `pos >= self.part_count()`.
    pub fn insert_part_after(&mut self, pos: usize, part: BodyPart) {
        self.parts.insert(pos + 1, part);
    }

    /// # Panics
    ///
    /// Panics if `pos >= self.part_count()`.
    pub fn remove_part(&mut self, pos: usize) -> BodyPart {
        self.parts.remove(pos)
    }

    pub fn remove_all_parts(&mut self) {
        self.parts.clear();
    }

    /// Splits `buffer[start..end]` into parts at `boundary`.
    ///
    /// Returns `false`, leaving `self` untouched, if no part delimiter is
    /// found.
    #[allow(clippy::too_many_arguments)]
    fn parse_multipart(
        &mut self,
        ctx: &ParsingContext<'_>,
        buffer: &[u8],
        start: usize,
        end: usize,
        boundary: &str,
        depth: u32,
        budget: &mut u32,
    ) -> bool {
        let delimiters = find_delimiters(buffer, start, end, boundary);
        if !delimiters.iter().any(|d| !d.is_close) {
            return false;
        }

        self.prolog =
            buffer[start..strip_line_ending(buffer, start, delimiters[0].start)]
                .to_vec();
        self.epilog.clear();
        self.parts.clear();

        for (ix, delimiter) in delimiters.iter().enumerate() {
            if delimiter.is_close {
                self.epilog = buffer[delimiter.after..end].to_vec();
                break;
            }

            if 0 == *budget {
                warn!("Too many body parts; keeping the rest as epilog");
                self.epilog = buffer[delimiter.start..end].to_vec();
                break;
            }
            *budget -= 1;

            let part_end = match delimiters.get(ix + 1) {
                Some(next) => {
                    strip_line_ending(buffer, delimiter.after, next.start)
                }
                None => end,
            };

            let mut part = BodyPart::default();
            part.parse_nested(
                ctx,
                buffer,
                delimiter.after,
                part_end,
                depth + 1,
                budget,
            );
            self.parts.push(part);
        }

        true
    }

    fn generate_multipart(
        &self,
        ctx: &GenerationContext,
        out: &mut dyn Write,
        boundary: &str,
    ) -> io::Result<usize> {
        if !self.prolog.is_empty() {
            out.write_all(&self.prolog)?;
            out.write_all(b"\r\n")?;
        }

        for part in &self.parts {
            write!(out, "--{}\r\n", boundary)?;
            part.generate(ctx, out, 0)?;
            out.write_all(b"\r\n")?;
        }

        write!(out, "--{}--\r\n", boundary)?;
        out.write_all(&self.epilog)?;
        Ok(line_position_after(&self.epilog, 0))
    }
}

struct Delimiter {
    /// Offset of the start of the delimiter line
    start: usize,
    /// Offset just past the delimiter line and its line ending
    after: usize,
    is_close: bool,
}

/// Finds the delimiter lines for `boundary`, up to and including the first
/// close delimiter.
fn find_delimiters(
    buffer: &[u8],
    start: usize,
    end: usize,
    boundary: &str,
) -> Vec<Delimiter> {
    let dash_boundary = format!("--{}", boundary);
    let mut delimiters = Vec::new();
    let mut pos = start;

    while pos < end {
        let (line_end, next) = match memchr::memchr(b'\n', &buffer[pos..end])
        {
            Some(lf) => (pos + lf, pos + lf + 1),
            None => (end, end),
        };
        let line = &buffer[pos..line_end];

        if line.starts_with(dash_boundary.as_bytes()) {
            let rest = &line[dash_boundary.len()..];
            let (is_close, rest) = if rest.starts_with(b"--") {
                (true, &rest[2..])
            } else {
                (false, rest)
            };

            // Transport padding is permitted after the boundary
            if rest.iter().all(|&b| b' ' == b || b'\t' == b || b'\r' == b) {
                delimiters.push(Delimiter {
                    start: pos,
                    after: next,
                    is_close,
                });
                if is_close {
                    break;
                }
            }
        }

        pos = next;
    }

    delimiters
}

/// Guesses the boundary of a multipart body which doesn't declare one from
/// its first line that looks like a delimiter.
fn discover_boundary(body: &[u8]) -> Option<String> {
    body.split(|&b| b'\n' == b)
        .map(|line| {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            let mut end = line.len();
            while end > 0 && (b' ' == line[end - 1] || b'\t' == line[end - 1]) {
                end -= 1;
            }
            &line[..end]
        })
        .find(|line| line.len() > 2 && line.starts_with(b"--"))
        .map(|line| String::from_utf8_lossy(&line[2..]).into_owned())
}

/// The line ending before a delimiter belongs to the delimiter; this
/// returns `pos` moved back over it, but never before `floor`.
fn strip_line_ending(buffer: &[u8], floor: usize, pos: usize) -> usize {
    if pos >= floor + 2 && b"\r\n" == &buffer[pos - 2..pos] {
        pos - 2
    } else if pos > floor && b'\n' == buffer[pos - 1] {
        pos - 1
    } else {
        pos
    }
}

fn line_position_after(data: &[u8], start_pos: usize) -> usize {
    match memchr::memrchr(b'\n', data) {
        Some(lf) => data.len() - lf - 1,
        None => start_pos + data.len(),
    }
}

fn generate_boundary(prefix: &str) -> String {
    let random: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(24)
        .collect();
    format!("{}{}", prefix, random)
}

/// One node of the body tree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BodyPart {
    header: Header,
    body: Body,
}

impl BodyPart {
    pub fn new(header: Header, body: Body) -> Self {
        BodyPart { header, body }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn parse_nested(
        &mut self,
        ctx: &ParsingContext<'_>,
        buffer: &[u8],
        start: usize,
        end: usize,
        depth: u32,
        budget: &mut u32,
    ) {
        let body_start = self.header.parse(ctx, buffer, start, end);
        let encoding = self.header.content_transfer_encoding();
        self.body = Body::default();

        let boundary = match self.header.content_type() {
            Some(ct) if ct.media_type().is_type(media_types::MULTIPART) => {
                let boundary = ct.boundary().map(str::to_owned).or_else(|| {
                    discover_boundary(&buffer[body_start..end])
                });
                if boundary.is_none() {
                    debug!("Multipart body without boundary kept as content");
                }
                boundary
            }
            _ => None,
        };

        if let Some(boundary) = boundary {
            if depth >= ctx.max_depth {
                warn!(
                    "Multipart nested deeper than {}; kept as content",
                    ctx.max_depth
                );
            } else if self.body.parse_multipart(
                ctx, buffer, body_start, end, &boundary, depth, budget,
            ) {
                self.body.contents = Contents::new(Vec::new(), encoding);
                return;
            } else {
                debug!("No delimiter for boundary {:?} found", boundary);
            }
        }

        self.body.contents =
            Contents::new(buffer[body_start..end].to_vec(), encoding);
    }

    /// The header to write along with the boundary of the body, if it is
    /// multipart.
    ///
    /// A multipart body needs its header to declare a multipart type and a
    /// boundary; if the header does not, a copy is amended.
    fn header_for_generation(
        &self,
        ctx: &GenerationContext,
    ) -> (Cow<'_, Header>, Option<String>) {
        if !self.body.is_multipart() {
            return (Cow::Borrowed(&self.header), None);
        }

        if let Some(boundary) = self
            .header
            .content_type()
            .filter(|ct| ct.media_type().is_type(media_types::MULTIPART))
            .and_then(ContentType::boundary)
        {
            return (Cow::Borrowed(&self.header), Some(boundary.to_owned()));
        }

        let mut header = self.header.clone();
        let mut ct = header.content_type().cloned().unwrap_or_default();
        if !ct.media_type().is_type(media_types::MULTIPART) {
            ct.set_media_type(MediaType::new(
                media_types::MULTIPART,
                media_types::MULTIPART_MIXED,
            ));
        }
        let boundary = match ct.boundary() {
            Some(boundary) => boundary.to_owned(),
            None => {
                let boundary = generate_boundary(&ctx.boundary_prefix);
                ct.set_boundary(boundary.as_str());
                boundary
            }
        };

        match header.find_field_mut(fields::CONTENT_TYPE) {
            Some(field) => field.set_value(FieldValue::ContentType(ct)),
            None => header.append_field(HeaderField::new(
                fields::CONTENT_TYPE,
                FieldValue::ContentType(ct),
            )),
        }

        (Cow::Owned(header), Some(boundary))
    }
}

impl Component for BodyPart {
    fn parse(
        &mut self,
        ctx: &ParsingContext<'_>,
        buffer: &[u8],
        start: usize,
        end: usize,
    ) -> usize {
        let mut budget = ctx.max_parts;
        self.parse_nested(ctx, buffer, start, end, 0, &mut budget);
        end
    }

    fn generate(
        &self,
        ctx: &GenerationContext,
        out: &mut dyn Write,
        _cur_line_pos: usize,
    ) -> io::Result<usize> {
        let (header, boundary) = self.header_for_generation(ctx);
        header.generate(ctx, out, 0)?;
        out.write_all(b"\r\n")?;

        match boundary {
            Some(boundary) => {
                self.body.generate_multipart(ctx, out, &boundary)
            }
            None => {
                let data = self.body.contents.data();
                out.write_all(data)?;
                Ok(line_position_after(data, 0))
            }
        }
    }
}

/// A whole message: the root of the body tree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Message(BodyPart);

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a message with the standard field registry and default
    /// limits.
    pub fn from_bytes(buffer: &[u8]) -> Self {
        let mut message = Message::new();
        message.parse_bytes(buffer);
        message
    }

    pub fn into_body_part(self) -> BodyPart {
        self.0
    }

    /// The media type the message declares, or `text/plain` if it declares
    /// none.
    pub fn media_type(&self) -> MediaType {
        self.header()
            .content_type()
            .map(ContentType::media_type)
            .cloned()
            .unwrap_or_default()
    }
}

impl From<BodyPart> for Message {
    fn from(part: BodyPart) -> Self {
        Message(part)
    }
}

impl Deref for Message {
    type Target = BodyPart;

    fn deref(&self) -> &BodyPart {
        &self.0
    }
}

impl DerefMut for Message {
    fn deref_mut(&mut self) -> &mut BodyPart {
        &mut self.0
    }
}

impl Component for Message {
    fn parse(
        &mut self,
        ctx: &ParsingContext<'_>,
        buffer: &[u8],
        start: usize,
        end: usize,
    ) -> usize {
        self.0.parse(ctx, buffer, start, end)
    }

    fn generate(
        &self,
        ctx: &GenerationContext,
        out: &mut dyn Write,
        cur_line_pos: usize,
    ) -> io::Result<usize> {
        self.0.generate(ctx, out, cur_line_pos)
    }
}
