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
use rand::distributions::Alphanumeric;
use rand::Rng;

use super::component::{Component, GenerationContext, ParsingContext};
use super::fold::LineFolder;
use super::syntax;
use crate::support::error::Error;

/// A message identifier, `<left@right>`.
///
/// The right-hand side may be empty, since enough agents omit it that
/// refusing such identifiers would be unhelpful.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct MessageId {
    left: String,
    right: String,
}

impl MessageId {
    pub fn new(left: impl Into<String>, right: Option<String>) -> Self {
        MessageId {
            left: left.into(),
            right: right.unwrap_or_default(),
        }
    }

    /// Generates a fresh, globally unique identifier for a message created
    /// on `host`.
    pub fn generate(host: &str) -> Self {
        let rng = rand::thread_rng();
        let random: String =
            rng.sample_iter(&Alphanumeric).take(16).collect();
        MessageId {
            left: format!(
                "{}.{}",
                chrono::Utc::now().format("%Y%m%d%H%M%S"),
                random
            ),
            right: host.to_owned(),
        }
    }

    pub fn left(&self) -> &str {
        &self.left
    }

    pub fn right(&self) -> &str {
        &self.right
    }

    /// The identifier without angle brackets, as used after `cid:` in URLs.
    pub fn id(&self) -> String {
        if self.right.is_empty() {
            self.left.clone()
        } else {
            format!("{}@{}", self.left, self.right)
        }
    }

    pub(crate) fn parse_prefix(raw: &[u8]) -> Option<(Self, &[u8])> {
        syntax::msg_id(raw).ok().map(|(rest, id)| (id, rest))
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.id())
    }
}

impl Component for MessageId {
    fn parse(
        &mut self,
        _: &ParsingContext<'_>,
        buffer: &[u8],
        start: usize,
        end: usize,
    ) -> usize {
        match MessageId::parse_prefix(&buffer[start..end]) {
            Some((id, rest)) => {
                *self = id;
                end - rest.len()
            }
            None => {
                debug!(
                    "Unparseable message-id: {:?}",
                    String::from_utf8_lossy(&buffer[start..end])
                );
                *self = MessageId::default();
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

/// An ordered list of message identifiers, as in `References`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct MessageIdSequence {
    list: Vec<MessageId>,
}

impl MessageIdSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_message_id(&mut self, id: MessageId) {
        self.list.push(id);
    }

    /// Inserts `id` immediately before the first identifier equal to
    /// `before`.
    ///
    /// Fails with `NoSuchMessageId`, leaving the sequence unchanged, if there
    /// is none.
    pub fn insert_message_id_before(
        &mut self,
        before: &MessageId,
        id: MessageId,
    ) -> Result<(), Error> {
        let pos = self.position_of(before)?;
        self.list.insert(pos, id);
        Ok(())
    }

    /// # Panics
    ///
    /// Panics if `pos > self.message_id_count()`.
    pub fn insert_message_id_before_index(&mut self, pos: usize, id: MessageId) {
        self.list.insert(pos, id);
    }

    pub fn insert_message_id_after(
        &mut self,
        after: &MessageId,
        id: MessageId,
    ) -> Result<(), Error> {
        let pos = self.position_of(after)?;
        self.list.insert(pos + 1, id);
        Ok(())
    }

    /// # Panics
    ///
    /// Panics if `pos >= self.message_id_count()`.
    pub fn insert_message_id_after_index(&mut self, pos: usize, id: MessageId) {
        self.list.insert(pos + 1, id);
    }

    pub fn remove_message_id(&mut self, id: &MessageId) -> Result<(), Error> {
        let pos = self.position_of(id)?;
        self.list.remove(pos);
        Ok(())
    }

    /// # Panics
    ///
    /// Panics if `pos >= self.message_id_count()`.
    pub fn remove_message_id_at(&mut self, pos: usize) -> MessageId {
        self.list.remove(pos)
    }

    pub fn remove_all_message_ids(&mut self) {
        self.list.clear();
    }

    pub fn message_id_count(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn message_id_at(&self, pos: usize) -> Option<&MessageId> {
        self.list.get(pos)
    }

    pub fn message_ids(&self) -> &[MessageId] {
        &self.list
    }

    fn position_of(&self, id: &MessageId) -> Result<usize, Error> {
        self.list
            .iter()
            .position(|i| i == id)
            .ok_or(Error::NoSuchMessageId)
    }

    /// Parses every identifier that can be found in `raw`, skipping anything
    /// between them that isn't one.
    pub(crate) fn parse_lenient(mut raw: &[u8]) -> Self {
        let mut list = Vec::new();
        loop {
            raw = syntax::skip_separators(raw);
            if raw.is_empty() {
                break;
            }

            match MessageId::parse_prefix(raw) {
                Some((id, rest)) => {
                    list.push(id);
                    raw = rest;
                }
                None => {
                    let skip = memchr::memchr(b'<', &raw[1..])
                        .map(|ix| ix + 1)
                        .unwrap_or(raw.len());
                    debug!(
                        "Skipping junk in message-id list: {:?}",
                        String::from_utf8_lossy(&raw[..skip])
                    );
                    raw = &raw[skip..];
                }
            }
        }

        MessageIdSequence { list }
    }
}

impl From<Vec<MessageId>> for MessageIdSequence {
    fn from(list: Vec<MessageId>) -> Self {
        MessageIdSequence { list }
    }
}

impl Component for MessageIdSequence {
    fn parse(
        &mut self,
        _: &ParsingContext<'_>,
        buffer: &[u8],
        start: usize,
        end: usize,
    ) -> usize {
        *self = MessageIdSequence::parse_lenient(&buffer[start..end]);
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
        for (ix, id) in self.list.iter().enumerate() {
            folder.token(&id.to_string(), ix > 0)?;
        }
        Ok(folder.finish())
    }
}
