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

use super::field_registry::FieldRegistry;
use super::fold::line_length;
use crate::support::config::{GenerationConfig, MimeConfig, ParsingConfig};

/// Everything a parse needs beyond the bytes themselves.
#[derive(Clone, Copy, Debug)]
pub struct ParsingContext<'a> {
    /// Decides the value type of each header field by name.
    pub fields: &'a FieldRegistry,
    /// Multipart bodies nested deeper than this are kept as leaf content.
    pub max_depth: u32,
    /// Total body parts a single parse may produce.
    pub max_parts: u32,
}

impl<'a> ParsingContext<'a> {
    pub fn new(fields: &'a FieldRegistry, config: &ParsingConfig) -> Self {
        ParsingContext {
            fields,
            max_depth: config.max_depth,
            max_parts: config.max_parts,
        }
    }
}

impl ParsingContext<'static> {
    /// A context using the standard field registry.
    pub fn from_config(config: &MimeConfig) -> Self {
        ParsingContext::new(FieldRegistry::standard(), &config.parsing)
    }
}

impl Default for ParsingContext<'static> {
    fn default() -> Self {
        ParsingContext::new(
            FieldRegistry::standard(),
            &ParsingConfig::default(),
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationContext {
    /// Header lines are folded to stay within this length where possible.
    pub max_line_length: usize,
    /// Prefix of boundaries invented for multipart bodies that lack one.
    pub boundary_prefix: String,
}

impl GenerationContext {
    pub fn from_config(config: &GenerationConfig) -> Self {
        GenerationContext {
            max_line_length: if 0 == config.max_line_length {
                line_length::INFINITE
            } else {
                config.max_line_length
            },
            boundary_prefix: config.boundary_prefix.clone(),
        }
    }

    pub fn with_max_line_length(max_line_length: usize) -> Self {
        GenerationContext {
            max_line_length,
            ..GenerationContext::default()
        }
    }
}

impl Default for GenerationContext {
    fn default() -> Self {
        GenerationContext::from_config(&GenerationConfig::default())
    }
}

/// The parse/generate protocol shared by every element of the document
/// model.
///
/// Parsing is lenient: implementations consume what they understand and
/// replace their state with something sensible for what they don't, rather
/// than failing.
pub trait Component {
    /// Replaces the state of `self` with the result of parsing the byte range
    /// `start..end` of `buffer`.
    ///
    /// Returns the position just after the last byte consumed, which is
    /// between `start` and `end` inclusive.
    fn parse(
        &mut self,
        ctx: &ParsingContext<'_>,
        buffer: &[u8],
        start: usize,
        end: usize,
    ) -> usize;

    /// Writes the wire form of `self` to `out`.
    ///
    /// `cur_line_pos` is the position within the current line at which
    /// output begins. Returns the position within the line on which output
    /// ended.
    fn generate(
        &self,
        ctx: &GenerationContext,
        out: &mut dyn Write,
        cur_line_pos: usize,
    ) -> io::Result<usize>;

    /// Parses the whole of `buffer` with the default context.
    fn parse_bytes(&mut self, buffer: &[u8]) -> usize {
        self.parse(&ParsingContext::default(), buffer, 0, buffer.len())
    }

    fn generate_to_vec(&self, ctx: &GenerationContext) -> Vec<u8> {
        let mut out = Vec::new();
        // Writes into a Vec never fail
        let _ = self.generate(ctx, &mut out, 0);
        out
    }

    fn generate_to_string(&self, ctx: &GenerationContext) -> String {
        String::from_utf8_lossy(&self.generate_to_vec(ctx)).into_owned()
    }
}

/// Constructs a `T` from the whole of `buffer` with the given context.
pub fn parse_component<T: Component + Default>(
    ctx: &ParsingContext<'_>,
    buffer: &[u8],
) -> T {
    let mut component = T::default();
    component.parse(ctx, buffer, 0, buffer.len());
    component
}
