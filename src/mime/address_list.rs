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

use super::address::{Address, Mailbox};
use super::component::{Component, GenerationContext, ParsingContext};
use super::fold::LineFolder;
use super::syntax;
use crate::support::error::Error;

/// An ordered list of addresses, as found in `To`, `Cc` and similar fields.
///
/// Anchor-based operations locate their anchor by equality and act on the
/// first match.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct AddressList {
    list: Vec<Address>,
}

impl AddressList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_address(&mut self, address: impl Into<Address>) {
        self.list.push(address.into());
    }

    /// Inserts `address` immediately before `before`.
    ///
    /// Fails with `NoSuchAddress`, leaving the list unchanged, if `before` is
    /// not in the list.
    pub fn insert_address_before(
        &mut self,
        before: &Address,
        address: impl Into<Address>,
    ) -> Result<(), Error> {
        let pos = self.position_of(before)?;
        self.list.insert(pos, address.into());
        Ok(())
    }

    /// # Panics
    ///
    /// Panics if `pos > self.address_count()`.
    pub fn insert_address_before_index(
        &mut self,
        pos: usize,
        address: impl Into<Address>,
    ) {
        self.list.insert(pos, address.into());
    }

    /// Inserts `address` immediately after `after`.
    ///
    /// Fails with `NoSuchAddress`, leaving the list unchanged, if `after` is
    /// not in the list.
    pub fn insert_address_after(
        &mut self,
        after: &Address,
        address: impl Into<Address>,
    ) -> Result<(), Error> {
        let pos = self.position_of(after)?;
        self.list.insert(pos + 1, address.into());
        Ok(())
    }

    /// # Panics
    ///
    /// Panics if `pos >= self.address_count()`.
    pub fn insert_address_after_index(
        &mut self,
        pos: usize,
        address: impl Into<Address>,
    ) {
        self.list.insert(pos + 1, address.into());
    }

    pub fn remove_address(&mut self, address: &Address) -> Result<(), Error> {
        let pos = self.position_of(address)?;
        self.list.remove(pos);
        Ok(())
    }

    /// # Panics
    ///
    /// Panics if `pos >= self.address_count()`.
    pub fn remove_address_at(&mut self, pos: usize) -> Address {
        self.list.remove(pos)
    }

    pub fn remove_all_addresses(&mut self) {
        self.list.clear();
    }

    pub fn address_count(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn address_at(&self, pos: usize) -> Option<&Address> {
        self.list.get(pos)
    }

    pub fn addresses(&self) -> &[Address] {
        &self.list
    }

    /// Every mailbox in the list, with groups flattened in place.
    pub fn to_mailboxes(&self) -> Vec<&Mailbox> {
        let mut mailboxes = Vec::new();
        for address in &self.list {
            match *address {
                Address::Mailbox(ref mailbox) => mailboxes.push(mailbox),
                Address::Group(ref group) => {
                    mailboxes.extend(group.mailboxes().iter())
                }
            }
        }
        mailboxes
    }

    fn position_of(&self, address: &Address) -> Result<usize, Error> {
        self.list
            .iter()
            .position(|a| a == address)
            .ok_or(Error::NoSuchAddress)
    }

    /// Parses every address that can be recognised in `raw`.
    ///
    /// Entries which cannot be parsed are skipped up to the next comma.
    pub(crate) fn parse_lenient(mut raw: &[u8]) -> Self {
        let mut list = Vec::new();
        loop {
            raw = syntax::skip_separators(raw);
            if raw.is_empty() {
                break;
            }

            match Address::parse_prefix(raw) {
                Some((address, rest)) => {
                    list.push(address);
                    raw = rest;
                }
                None => {
                    let skip = syntax::skip_past(raw, b',');
                    debug!(
                        "Skipping unparseable address: {:?}",
                        String::from_utf8_lossy(&raw[..skip])
                    );
                    raw = &raw[skip..];
                }
            }
        }

        AddressList { list }
    }
}

impl From<Vec<Address>> for AddressList {
    fn from(list: Vec<Address>) -> Self {
        AddressList { list }
    }
}

impl From<Vec<Mailbox>> for AddressList {
    fn from(mailboxes: Vec<Mailbox>) -> Self {
        AddressList {
            list: mailboxes.into_iter().map(Address::Mailbox).collect(),
        }
    }
}

impl Component for AddressList {
    fn parse(
        &mut self,
        _: &ParsingContext<'_>,
        buffer: &[u8],
        start: usize,
        end: usize,
    ) -> usize {
        *self = AddressList::parse_lenient(&buffer[start..end]);
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
        for (ix, address) in self.list.iter().enumerate() {
            if ix > 0 {
                folder.token(",", false)?;
            }
            address.write(&mut folder, ix > 0)?;
        }
        Ok(folder.finish())
    }
}
