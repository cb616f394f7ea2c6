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

//! A lenient MIME document model.
//!
//! Messages are parsed into a tree of `BodyPart`s, each carrying a `Header`
//! of typed fields and a `Body`. Parsing never refuses input: malformed
//! structured fields degrade to opaque text, and malformed multipart bodies
//! degrade to leaf content. Any component can be generated back to wire
//! form with line folding.
//!
//! `MessageAnalyzer` turns a parsed message into a reader's view of it
//! (sender, recipients, subject, date, attachments, text parts), and the
//! `messaging` module carries the change-notification plumbing used by
//! folder implementations.

#[cfg(test)]
macro_rules! assert_matches {
    ($expected:pat, $actual:expr) => {
        match $actual {
            $expected => (),
            unexpected => panic!(
                "Expected {} matches {}, got {:?}",
                stringify!($expected),
                stringify!($actual),
                unexpected
            ),
        }
    };
}

pub mod messaging;
pub mod mime;
pub mod support;

pub use crate::mime::address::{Address, EmailAddress, Mailbox, MailboxGroup};
pub use crate::mime::address_list::AddressList;
pub use crate::mime::analyzer::MessageAnalyzer;
pub use crate::mime::attachment::Attachment;
pub use crate::mime::body::{Body, BodyPart, Message};
pub use crate::mime::component::{
    Component, GenerationContext, ParsingContext,
};
pub use crate::mime::field_registry::FieldRegistry;
pub use crate::mime::header::Header;
pub use crate::mime::header_field::{FieldValue, HeaderField};
pub use crate::mime::message_id::{MessageId, MessageIdSequence};
pub use crate::mime::text_part::{TextPart, TextPartRegistry};
pub use crate::support::config::MimeConfig;
pub use crate::support::error::Error;

#[cfg(test)]
static INIT_TEST_LOG: std::sync::Once = std::sync::Once::new();

#[cfg(test)]
fn init_test_log() {
    use log4rs::append::console::{ConsoleAppender, Target};
    use log4rs::config::{Appender, Config, Root};
    use log4rs::encode::pattern::PatternEncoder;

    INIT_TEST_LOG.call_once(|| {
        let stderr = ConsoleAppender::builder()
            .target(Target::Stderr)
            .encoder(Box::new(PatternEncoder::new(
                "{d(%H:%M:%S%.3f)} [{l}][{t}] {m}{n}",
            )))
            .build();
        let config = Config::builder()
            .appender(Appender::builder().build("stderr", Box::new(stderr)))
            .build(
                Root::builder()
                    .appender("stderr")
                    .build(log::LevelFilter::Debug),
            )
            .unwrap();
        log4rs::init_config(config).unwrap();
    })
}
