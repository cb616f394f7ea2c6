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

use std::collections::HashMap;

use chrono::prelude::*;
use lazy_static::lazy_static;

use super::address::Mailbox;
use super::address_list::AddressList;
use super::constants::fields;
use super::disposition::ContentDisposition;
use super::encoding::Encoding;
use super::header_field::{FieldValue, HeaderField};
use super::media_type::ContentType;
use super::message_id::{MessageId, MessageIdSequence};
use super::relay::Relay;
use super::text::Text;

/// Produces an empty value of the kind a field should hold.
pub type FieldConstructor = fn() -> FieldValue;

lazy_static! {
    static ref STANDARD: FieldRegistry = FieldRegistry::standard_builder().build();
}

/// Maps header field names to the kind of value they hold.
///
/// Lookups are case-insensitive. Names that were never registered get a
/// `Generic` value, so a registry never refuses a field.
#[derive(Clone, Debug, Default)]
pub struct FieldRegistry {
    constructors: HashMap<String, FieldConstructor>,
}

impl FieldRegistry {
    pub fn builder() -> FieldRegistryBuilder {
        FieldRegistryBuilder::default()
    }

    /// A builder preloaded with the standard fields, for callers who want to
    /// add their own.
    pub fn standard_builder() -> FieldRegistryBuilder {
        let mailbox: FieldConstructor =
            || FieldValue::Mailbox(Mailbox::default());
        let address_list: FieldConstructor =
            || FieldValue::AddressList(AddressList::default());
        let text: FieldConstructor = || FieldValue::Text(Text::default());

        FieldRegistry::builder()
            .register(fields::FROM, mailbox)
            .register(fields::SENDER, mailbox)
            .register(fields::REPLY_TO, mailbox)
            .register(fields::DELIVERED_TO, mailbox)
            .register(fields::RETURN_PATH, mailbox)
            .register(fields::TO, address_list)
            .register(fields::CC, address_list)
            .register(fields::BCC, address_list)
            .register(fields::SUBJECT, text)
            .register(fields::ORGANIZATION, text)
            .register(fields::USER_AGENT, text)
            .register(fields::X_MAILER, text)
            .register(fields::CONTENT_DESCRIPTION, text)
            .register(fields::MIME_VERSION, text)
            .register(fields::DATE, || FieldValue::Date(Utc::now().into()))
            .register(fields::CONTENT_TYPE, || {
                FieldValue::ContentType(ContentType::default())
            })
            .register(fields::CONTENT_DISPOSITION, || {
                FieldValue::ContentDisposition(ContentDisposition::default())
            })
            .register(fields::CONTENT_TRANSFER_ENCODING, || {
                FieldValue::Encoding(Encoding::default())
            })
            .register(fields::RECEIVED, || FieldValue::Relay(Relay::default()))
            .register(fields::MESSAGE_ID, || {
                FieldValue::MessageId(MessageId::default())
            })
            .register(fields::CONTENT_ID, || {
                FieldValue::MessageId(MessageId::default())
            })
            .register(fields::IN_REPLY_TO, || {
                FieldValue::MessageIdSequence(MessageIdSequence::default())
            })
            .register(fields::REFERENCES, || {
                FieldValue::MessageIdSequence(MessageIdSequence::default())
            })
    }

    /// The registry of standard fields, built on first use.
    pub fn standard() -> &'static FieldRegistry {
        &STANDARD
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.constructors.contains_key(&name.to_ascii_lowercase())
    }

    /// An empty value of the kind `name` holds.
    pub fn create_value(&self, name: &str) -> FieldValue {
        match self.constructors.get(&name.to_ascii_lowercase()) {
            Some(constructor) => constructor(),
            None => FieldValue::default(),
        }
    }

    /// An empty field named `name`.
    pub fn create(&self, name: &str) -> HeaderField {
        HeaderField::new(name, self.create_value(name))
    }
}

#[derive(Clone, Debug, Default)]
pub struct FieldRegistryBuilder {
    constructors: HashMap<String, FieldConstructor>,
}

impl FieldRegistryBuilder {
    /// Registers `constructor` for `name`, replacing any earlier
    /// registration of the same name.
    pub fn register(mut self, name: &str, constructor: FieldConstructor) -> Self {
        self.constructors
            .insert(name.to_ascii_lowercase(), constructor);
        self
    }

    pub fn build(self) -> FieldRegistry {
        FieldRegistry {
            constructors: self.constructors,
        }
    }
}
