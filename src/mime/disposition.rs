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
use super::constants::disposition_types;
use super::fold::LineFolder;
use super::parameter::Parameters;
use super::syntax;

/// The value of a `Content-Disposition` field (RFC 2183).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ContentDisposition {
    name: String,
    params: Parameters,
}

impl ContentDisposition {
    pub fn new(name: &str) -> Self {
        ContentDisposition {
            name: name.to_ascii_lowercase(),
            params: Parameters::new(),
        }
    }

    pub fn attachment() -> Self {
        ContentDisposition::new(disposition_types::ATTACHMENT)
    }

    /// The disposition type, e.g. `inline` or `attachment`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_ascii_lowercase();
    }

    pub fn is_inline(&self) -> bool {
        disposition_types::INLINE == self.name
    }

    pub fn filename(&self) -> Option<&str> {
        self.params.get("filename")
    }

    pub fn set_filename(&mut self, filename: impl Into<String>) {
        self.params.set("filename", filename);
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut Parameters {
        &mut self.params
    }

    pub(crate) fn parse_value(raw: &[u8]) -> Option<Self> {
        let (rest, name) = syntax::bare_token(raw).ok()?;
        Some(ContentDisposition {
            name: name.to_ascii_lowercase(),
            params: Parameters::parse_lenient(rest),
        })
    }
}

impl Default for ContentDisposition {
    fn default() -> Self {
        ContentDisposition::new(disposition_types::INLINE)
    }
}

impl Component for ContentDisposition {
    fn parse(
        &mut self,
        _: &ParsingContext<'_>,
        buffer: &[u8],
        start: usize,
        end: usize,
    ) -> usize {
        *self = ContentDisposition::parse_value(&buffer[start..end])
            .unwrap_or_else(|| {
                debug!(
                    "Unparseable content disposition: {:?}",
                    String::from_utf8_lossy(&buffer[start..end])
                );
                ContentDisposition::default()
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
        folder.token(&self.name, false)?;
        self.params.write(&mut folder)?;
        Ok(folder.finish())
    }
}
