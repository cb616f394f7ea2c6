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

use log::debug;

use super::charset::Charset;
use super::component::{Component, GenerationContext, ParsingContext};
use super::constants::media_types;
use super::fold::LineFolder;
use super::parameter::Parameters;
use super::syntax;

/// A `type/subtype` pair, held in lower case.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MediaType {
    typ: String,
    subtype: String,
}

impl MediaType {
    pub fn new(typ: &str, subtype: &str) -> Self {
        MediaType {
            typ: typ.trim().to_ascii_lowercase(),
            subtype: subtype.trim().to_ascii_lowercase(),
        }
    }

    /// `application/octet-stream`, assumed for parts that say nothing about
    /// their content.
    pub fn octet_stream() -> Self {
        MediaType::new(
            media_types::APPLICATION,
            media_types::APPLICATION_OCTET_STREAM,
        )
    }

    pub fn typ(&self) -> &str {
        &self.typ
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    /// Whether the top-level type is `typ`, ignoring case.
    pub fn is_type(&self, typ: &str) -> bool {
        self.typ.eq_ignore_ascii_case(typ)
    }

    pub fn is(&self, typ: &str, subtype: &str) -> bool {
        self.is_type(typ) && self.subtype.eq_ignore_ascii_case(subtype)
    }

    pub(crate) fn parse_prefix(raw: &[u8]) -> Option<(Self, &[u8])> {
        syntax::media_type(raw).ok().map(|(rest, mt)| (mt, rest))
    }
}

impl Default for MediaType {
    fn default() -> Self {
        MediaType::new(media_types::TEXT, media_types::TEXT_PLAIN)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.typ, self.subtype)
    }
}

impl Component for MediaType {
    fn parse(
        &mut self,
        _: &ParsingContext<'_>,
        buffer: &[u8],
        start: usize,
        end: usize,
    ) -> usize {
        match MediaType::parse_prefix(&buffer[start..end]) {
            Some((mt, rest)) => {
                *self = mt;
                end - rest.len()
            }
            None => {
                debug!(
                    "Unparseable media type: {:?}",
                    String::from_utf8_lossy(&buffer[start..end])
                );
                *self = MediaType::default();
                end
            }
        }
    }

    fn generate(
        &self,
        ctx: &GenerationContext,
        out: &mut dyn Write,
        cur_line_pos: usize,
    ) -> io::Result<usize> {
        let mut folder =
            LineFolder::new(out, ctx.max_line_length, cur_line_pos);
        folder.token(&self.to_string(), false)?;
        Ok(folder.finish())
    }
}

/// The value of a `Content-Type` field.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ContentType {
    media_type: MediaType,
    params: Parameters,
}

impl ContentType {
    pub fn new(media_type: MediaType) -> Self {
        ContentType {
            media_type,
            params: Parameters::new(),
        }
    }

    pub fn media_type(&self) -> &MediaType {
        &self.media_type
    }

    pub fn set_media_type(&mut self, media_type: MediaType) {
        self.media_type = media_type;
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut Parameters {
        &mut self.params
    }

    /// The declared charset, if any.
    pub fn charset(&self) -> Option<Charset> {
        self.params.get("charset").map(Charset::new)
    }

    pub fn set_charset(&mut self, charset: &Charset) {
        self.params.set("charset", charset.name());
    }

    pub fn boundary(&self) -> Option<&str> {
        self.params.get("boundary").filter(|b| !b.is_empty())
    }

    pub fn set_boundary(&mut self, boundary: impl Into<String>) {
        self.params.set("boundary", boundary);
    }

    /// The obsolete `name` parameter, which some agents still use in place
    /// of a disposition file name.
    pub fn name(&self) -> Option<&str> {
        self.params.get("name")
    }

    /// Parses a complete field body, or returns `None` if it does not even
    /// start with a media type.
    pub(crate) fn parse_value(raw: &[u8]) -> Option<Self> {
        let (media_type, rest) = MediaType::parse_prefix(raw)?;
        Some(ContentType {
            media_type,
            params: Parameters::parse_lenient(rest),
        })
    }
}

impl Component for ContentType {
    fn parse(
        &mut self,
        _: &ParsingContext<'_>,
        buffer: &[u8],
        start: usize,
        end: usize,
    ) -> usize {
        *self = ContentType::parse_value(&buffer[start..end])
            .unwrap_or_else(|| {
                debug!(
                    "Unparseable content type: {:?}",
                    String::from_utf8_lossy(&buffer[start..end])
                );
                ContentType::default()
            });
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
        folder.token(&self.media_type.to_string(), false)?;
        self.params.write(&mut folder)?;
        Ok(folder.finish())
    }
}
