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

use super::component::{Component, GenerationContext, ParsingContext};
use super::fold::LineFolder;
use super::syntax;
use super::text::Text;
use crate::support::error::Error;

/// An RFC 2822 `addr-spec`, i.e., `local@domain`.
///
/// The local part is held unquoted; it is quoted again on output if it is
/// not a valid `dot-atom`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct EmailAddress {
    local_part: String,
    domain: String,
}

impl EmailAddress {
    pub fn new(local_part: impl Into<String>, domain: impl Into<String>) -> Self {
        EmailAddress {
            local_part: local_part.into(),
            domain: domain.into(),
        }
    }

    pub fn local_part(&self) -> &str {
        &self.local_part
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn is_empty(&self) -> bool {
        self.local_part.is_empty() && self.domain.is_empty()
    }

    fn is_dot_atom(s: &str) -> bool {
        !s.is_empty()
            && s.split('.').all(|atom| {
                !atom.is_empty() && atom.bytes().all(syntax::is_ascii_atext)
            })
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if EmailAddress::is_dot_atom(&self.local_part) {
            write!(f, "{}", self.local_part)?;
        } else {
            f.write_str("\"")?;
            for ch in self.local_part.chars() {
                if '"' == ch || '\\' == ch {
                    f.write_str("\\")?;
                }
                write!(f, "{}", ch)?;
            }
            f.write_str("\"")?;
        }

        if !self.domain.is_empty() {
            write!(f, "@{}", self.domain)?;
        }

        Ok(())
    }
}

/// A single mailbox: an address with an optional display name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Mailbox {
    name: Text,
    email: EmailAddress,
}

impl Mailbox {
    pub fn new(name: impl Into<Text>, email: EmailAddress) -> Self {
        Mailbox {
            name: name.into(),
            email,
        }
    }

    pub fn from_email(email: EmailAddress) -> Self {
        Mailbox {
            name: Text::default(),
            email,
        }
    }

    pub fn name(&self) -> &Text {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<Text>) {
        self.name = name.into();
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn set_email(&mut self, email: EmailAddress) {
        self.email = email;
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.email.is_empty()
    }

    /// Parses a mailbox from the start of `raw`, returning it and the
    /// unconsumed remainder, or `None` if `raw` does not start with one.
    pub(crate) fn parse_prefix(raw: &[u8]) -> Option<(Self, &[u8])> {
        syntax::mailbox(raw).ok().map(|(rest, mailbox)| (mailbox, rest))
    }

    pub(crate) fn write(
        &self,
        folder: &mut LineFolder<'_>,
        space: bool,
    ) -> io::Result<()> {
        if self.name.is_empty() {
            folder.token(&self.email.to_string(), space)
        } else {
            self.name.write_phrase(folder, space)?;
            folder.token(&format!("<{}>", self.email), true)
        }
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.email)
        } else {
            write!(f, "{} <{}>", self.name, self.email)
        }
    }
}

impl Component for Mailbox {
    fn parse(
        &mut self,
        _: &ParsingContext<'_>,
        buffer: &[u8],
        start: usize,
        end: usize,
    ) -> usize {
        match Mailbox::parse_prefix(&buffer[start..end]) {
            Some((mailbox, rest)) => {
                *self = mailbox;
                end - rest.len()
            }
            None => {
                debug!(
                    "Unparseable mailbox: {:?}",
                    String::from_utf8_lossy(&buffer[start..end])
                );
                *self = Mailbox::default();
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
        self.write(&mut folder, false)?;
        Ok(folder.finish())
    }
}

/// A named group of mailboxes, e.g. `Team: a@x.test, b@x.test;`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct MailboxGroup {
    name: Text,
    mailboxes: Vec<Mailbox>,
}

impl MailboxGroup {
    pub fn new(name: impl Into<Text>, mailboxes: Vec<Mailbox>) -> Self {
        MailboxGroup {
            name: name.into(),
            mailboxes,
        }
    }

    pub fn name(&self) -> &Text {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<Text>) {
        self.name = name.into();
    }

    pub fn append_mailbox(&mut self, mailbox: Mailbox) {
        self.mailboxes.push(mailbox);
    }

    /// Inserts `mailbox` before the first mailbox equal to `before`.
    ///
    /// Fails with `NoSuchMailbox`, leaving the group unchanged, if there is
    /// no such mailbox.
    pub fn insert_mailbox_before(
        &mut self,
        before: &Mailbox,
        mailbox: Mailbox,
    ) -> Result<(), Error> {
        let pos = self.position_of(before)?;
        self.mailboxes.insert(pos, mailbox);
        Ok(())
    }

    /// # Panics
    ///
    /// Panics if `pos > self.mailbox_count()`.
    pub fn insert_mailbox_before_index(&mut self, pos: usize, mailbox: Mailbox) {
        self.mailboxes.insert(pos, mailbox);
    }

    pub fn insert_mailbox_after(
        &mut self,
        after: &Mailbox,
        mailbox: Mailbox,
    ) -> Result<(), Error> {
        let pos = self.position_of(after)?;
        self.mailboxes.insert(pos + 1, mailbox);
        Ok(())
    }

    /// # Panics
    ///
    /// Panics if `pos >= self.mailbox_count()`.
    pub fn insert_mailbox_after_index(&mut self, pos: usize, mailbox: Mailbox) {
        self.mailboxes.insert(pos + 1, mailbox);
    }

    pub fn remove_mailbox(&mut self, mailbox: &Mailbox) -> Result<(), Error> {
        let pos = self.position_of(mailbox)?;
        self.mailboxes.remove(pos);
        Ok(())
    }

    /// # Panics
    ///
    /// Panics if `pos >= self.mailbox_count()`.
    pub fn remove_mailbox_at(&mut self, pos: usize) -> Mailbox {
        self.mailboxes.remove(pos)
    }

    pub fn remove_all_mailboxes(&mut self) {
        self.mailboxes.clear();
    }

    pub fn mailbox_count(&self) -> usize {
        self.mailboxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mailboxes.is_empty()
    }

    pub fn mailbox_at(&self, pos: usize) -> Option<&Mailbox> {
        self.mailboxes.get(pos)
    }

    pub fn mailboxes(&self) -> &[Mailbox] {
        &self.mailboxes
    }

    fn position_of(&self, mailbox: &Mailbox) -> Result<usize, Error> {
        self.mailboxes
            .iter()
            .position(|m| m == mailbox)
            .ok_or(Error::NoSuchMailbox)
    }

    pub(crate) fn write(
        &self,
        folder: &mut LineFolder<'_>,
        space: bool,
    ) -> io::Result<()> {
        if self.name.is_empty() {
            // A group needs some name to be parseable again
            folder.token("\"\":", space)?;
        } else {
            self.name.write_phrase(folder, space)?;
            folder.token(":", false)?;
        }

        for (ix, mailbox) in self.mailboxes.iter().enumerate() {
            if ix > 0 {
                folder.token(",", false)?;
            }
            mailbox.write(folder, true)?;
        }

        folder.token(";", false)
    }
}

impl Component for MailboxGroup {
    fn parse(
        &mut self,
        ctx: &ParsingContext<'_>,
        buffer: &[u8],
        start: usize,
        end: usize,
    ) -> usize {
        let mut address = Address::default();
        let consumed = address.parse(ctx, buffer, start, end);
        *self = match address {
            Address::Group(group) => group,
            Address::Mailbox(mailbox) => {
                MailboxGroup::new(Text::default(), vec![mailbox])
            }
        };
        consumed
    }

    fn generate(
        &self,
        ctx: &GenerationContext,
        out: &mut dyn Write,
        cur_line_pos: usize,
    ) -> io::Result<usize> {
        let mut folder =
            LineFolder::new(out, ctx.max_line_length, cur_line_pos);
        self.write(&mut folder, false)?;
        Ok(folder.finish())
    }
}

/// One entry of an address list: either a mailbox or a group of them.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Address {
    Mailbox(Mailbox),
    Group(MailboxGroup),
}

impl Address {
    pub fn is_group(&self) -> bool {
        matches!(*self, Address::Group(_))
    }

    pub fn as_mailbox(&self) -> Option<&Mailbox> {
        match *self {
            Address::Mailbox(ref mailbox) => Some(mailbox),
            Address::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&MailboxGroup> {
        match *self {
            Address::Mailbox(_) => None,
            Address::Group(ref group) => Some(group),
        }
    }

    pub(crate) fn parse_prefix(raw: &[u8]) -> Option<(Self, &[u8])> {
        syntax::address(raw).ok().map(|(rest, address)| (address, rest))
    }

    pub(crate) fn write(
        &self,
        folder: &mut LineFolder<'_>,
        space: bool,
    ) -> io::Result<()> {
        match *self {
            Address::Mailbox(ref mailbox) => mailbox.write(folder, space),
            Address::Group(ref group) => group.write(folder, space),
        }
    }
}

impl Default for Address {
    fn default() -> Self {
        Address::Mailbox(Mailbox::default())
    }
}

impl From<Mailbox> for Address {
    fn from(mailbox: Mailbox) -> Self {
        Address::Mailbox(mailbox)
    }
}

impl From<MailboxGroup> for Address {
    fn from(group: MailboxGroup) -> Self {
        Address::Group(group)
    }
}

impl Component for Address {
    fn parse(
        &mut self,
        _: &ParsingContext<'_>,
        buffer: &[u8],
        start: usize,
        end: usize,
    ) -> usize {
        match Address::parse_prefix(&buffer[start..end]) {
            Some((address, rest)) => {
                *self = address;
                end - rest.len()
            }
            None => {
                debug!(
                    "Unparseable address: {:?}",
                    String::from_utf8_lossy(&buffer[start..end])
                );
                *self = Address::default();
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
        self.write(&mut folder, false)?;
        Ok(folder.finish())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mime::component::parse_component;

    fn mb(name: &str, addr: &str) -> Mailbox {
        let mut parts = addr.splitn(2, '@');
        let local = parts.next().unwrap_or_default();
        let domain = parts.next().unwrap_or_default();
        Mailbox::new(name, EmailAddress::new(local, domain))
    }

    fn generate<C: Component>(c: &C) -> String {
        c.generate_to_string(&GenerationContext::default())
    }

    #[test]
    fn email_address_display() {
        assert_eq!("a.b@x.test", EmailAddress::new("a.b", "x.test").to_string());
        assert_eq!(
            "\"john doe\"@x.test",
            EmailAddress::new("john doe", "x.test").to_string()
        );
        assert_eq!(
            "\"a..b\"@x.test",
            EmailAddress::new("a..b", "x.test").to_string()
        );
        assert_eq!("\"\"", EmailAddress::default().to_string());
    }

    #[test]
    fn mailbox_generation() {
        assert_eq!("a@x.test", generate(&mb("", "a@x.test")));
        assert_eq!("Ann Example <a@x.test>", generate(&mb("Ann Example", "a@x.test")));
        assert_eq!(
            "\"Example, Ann\" <a@x.test>",
            generate(&mb("Example, Ann", "a@x.test"))
        );
        assert_eq!(
            "=?utf-8?B?w4VzYQ==?= <a@x.test>",
            generate(&mb("Åsa", "a@x.test"))
        );
    }

    #[test]
    fn mailbox_round_trip() {
        let ctx = ParsingContext::default();
        for mailbox in &[
            mb("", "a@x.test"),
            mb("Ann Example", "a@x.test"),
            mb("Example, Ann", "a@x.test"),
            mb("Åsa Ödegård", "asa@x.test"),
            mb("", "john doe@x.test"),
        ] {
            let generated = generate(mailbox);
            let parsed: Mailbox = parse_component(&ctx, generated.as_bytes());
            assert_eq!(mailbox, &parsed, "generated: {}", generated);
        }
    }

    #[test]
    fn unparseable_mailbox_is_empty() {
        let mut mailbox = mb("Ann", "a@x.test");
        assert_eq!(8, mailbox.parse_bytes(b"garbage!"));
        assert!(mailbox.is_empty());
    }

    #[test]
    fn parse_reports_consumed_length() {
        let mut mailbox = Mailbox::default();
        let input = b"a@x.test, b@x.test";
        assert_eq!(8, mailbox.parse_bytes(input));
        assert_eq!(&mb("", "a@x.test"), &mailbox);
    }

    #[test]
    fn group_operations() {
        let a = mb("", "a@x.test");
        let b = mb("", "b@x.test");
        let c = mb("", "c@x.test");
        let stranger = mb("", "z@x.test");

        let mut group = MailboxGroup::new("Team", vec![]);
        group.append_mailbox(a.clone());
        group.insert_mailbox_after(&a, c.clone()).unwrap();
        group.insert_mailbox_before(&c, b.clone()).unwrap();
        assert_eq!(&[a.clone(), b.clone(), c.clone()][..], group.mailboxes());

        assert_matches!(
            Err(Error::NoSuchMailbox),
            group.insert_mailbox_before(&stranger, a.clone())
        );
        assert_matches!(Err(Error::NoSuchMailbox), group.remove_mailbox(&stranger));
        assert_eq!(3, group.mailbox_count());

        group.remove_mailbox(&b).unwrap();
        assert_eq!(&[a.clone(), c.clone()][..], group.mailboxes());
        assert_eq!(a, group.remove_mailbox_at(0));
        group.insert_mailbox_before_index(0, b.clone());
        group.insert_mailbox_after_index(1, a.clone());
        assert_eq!(&[b, c, a][..], group.mailboxes());

        group.remove_all_mailboxes();
        assert!(group.is_empty());
    }

    #[test]
    fn group_generation() {
        let group = MailboxGroup::new(
            "Team",
            vec![mb("", "a@x.test"), mb("Bea", "b@x.test")],
        );
        assert_eq!("Team: a@x.test, Bea <b@x.test>;", generate(&group));
        assert_eq!("Undisclosed:;", generate(&MailboxGroup::new("Undisclosed", vec![])));

        let mut parsed = MailboxGroup::default();
        parsed.parse_bytes(generate(&group).as_bytes());
        assert_eq!(group, parsed);
    }
}
