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

//! Extraction of the parts of a message a mail reader presents: who sent it
//! to whom and when, its renderable text, and its attachments.

use chrono::prelude::*;
use log::{debug, trace};

use super::address::Mailbox;
use super::address_list::AddressList;
use super::attachment::Attachment;
use super::body::{BodyPart, Message};
use super::constants::{fields, media_types};
use super::header::Header;
use super::header_field::{FieldValue, HeaderField};
use super::media_type::{ContentType, MediaType};
use super::text::Text;
use super::text_part::{TextPart, TextPartRegistry};
use crate::support::error::Error;

/// The result of analysing one message.
///
/// Analysis happens entirely at construction. Nothing about the message is
/// ever reported as an error; missing or malformed information is replaced
/// with an empty value, or the current time in the case of the date.
#[derive(Debug)]
pub struct MessageAnalyzer {
    expeditor: Mailbox,
    recipients: AddressList,
    copy_recipients: AddressList,
    blind_copy_recipients: AddressList,
    subject: Text,
    date: DateTime<FixedOffset>,
    attachments: Vec<Attachment>,
    text_parts: Vec<Box<dyn TextPart>>,
}

impl MessageAnalyzer {
    /// Parses `buffer` as a message and analyses it.
    pub fn from_bytes(buffer: &[u8]) -> Self {
        MessageAnalyzer::new(&Message::from_bytes(buffer))
    }

    /// Analyses `message` using the standard text part registry.
    pub fn new(message: &Message) -> Self {
        MessageAnalyzer::with_registry(message, TextPartRegistry::standard())
    }

    pub fn with_registry(
        message: &Message,
        registry: &TextPartRegistry,
    ) -> Self {
        let header = message.header();
        let mut this = MessageAnalyzer {
            expeditor: header
                .find_field(fields::FROM)
                .and_then(|f| f.value().as_mailbox())
                .cloned()
                .unwrap_or_default(),
            recipients: address_list(header, fields::TO),
            copy_recipients: address_list(header, fields::CC),
            blind_copy_recipients: address_list(header, fields::BCC),
            subject: header
                .find_field(fields::SUBJECT)
                .and_then(|f| f.value().as_text())
                .cloned()
                .unwrap_or_default(),
            date: resolve_date(header),
            attachments: Vec::new(),
            text_parts: Vec::new(),
        };

        // The root itself only counts when it is a single part; a message
        // without a Content-Type is plain text.
        if !message.body().is_multipart() {
            if let Some(attachment) =
                classify(message, MediaType::default())
            {
                this.attachments.push(attachment);
            }
        }
        this.find_attachments(message);
        this.find_text_parts(registry, message);

        trace!(
            "Analysed message: {} attachment(s), {} text part(s)",
            this.attachments.len(),
            this.text_parts.len()
        );
        this
    }

    /// The sender, from the `From` field.
    pub fn expeditor(&self) -> &Mailbox {
        &self.expeditor
    }

    /// The addresses in the `To` field.
    pub fn recipients(&self) -> &AddressList {
        &self.recipients
    }

    /// The addresses in the `Cc` field.
    pub fn copy_recipients(&self) -> &AddressList {
        &self.copy_recipients
    }

    /// The addresses in the `Bcc` field.
    pub fn blind_copy_recipients(&self) -> &AddressList {
        &self.blind_copy_recipients
    }

    pub fn subject(&self) -> &Text {
        &self.subject
    }

    /// When the message was received, or failing that when it claims to
    /// have been written, or failing that when it was analysed.
    pub fn date(&self) -> DateTime<FixedOffset> {
        self.date
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn attachment_count(&self) -> usize {
        self.attachments.len()
    }

    pub fn attachment_at(&self, pos: usize) -> Option<&Attachment> {
        self.attachments.get(pos)
    }

    /// The `Content-Disposition` field which marked `attachment` as such,
    /// if any.
    ///
    /// `attachment` must be one returned by this analyser; others are never
    /// found.
    pub fn attachment_info(
        &self,
        attachment: &Attachment,
    ) -> Option<&HeaderField> {
        self.attachments
            .iter()
            .find(|a| std::ptr::eq(*a, attachment))
            .and_then(Attachment::disposition_field)
    }

    pub fn text_parts(&self) -> &[Box<dyn TextPart>] {
        &self.text_parts
    }

    pub fn text_part_count(&self) -> usize {
        self.text_parts.len()
    }

    pub fn text_part_at(&self, pos: usize) -> Option<&dyn TextPart> {
        self.text_parts.get(pos).map(|p| &**p)
    }

    fn find_attachments(&mut self, part: &BodyPart) {
        for child in part.body().parts() {
            if let Some(attachment) =
                classify(child, MediaType::octet_stream())
            {
                self.attachments.push(attachment);
            }

            if child.body().is_multipart() {
                self.find_attachments(child);
            }
        }
    }

    fn find_text_parts(&mut self, registry: &TextPartRegistry, message: &Message) {
        if message.body().is_multipart() {
            self.find_sub_text_parts(registry, message);
            return;
        }

        let media_type = match message.header().content_type() {
            None => MediaType::default(),
            Some(ct) if ct.media_type().is_type(media_types::TEXT) => {
                ct.media_type().clone()
            }
            Some(_) => return,
        };

        self.push_text_part(registry, &media_type, message, message);
    }

    /// Collects the text children of `part`, or if it has none, those of
    /// the first descendant that has any.
    ///
    /// Returns whether any text children were found, even if none of them
    /// could be rendered.
    fn find_sub_text_parts(
        &mut self,
        registry: &TextPartRegistry,
        part: &BodyPart,
    ) -> bool {
        let text_children = part
            .body()
            .parts()
            .iter()
            .filter_map(|child| {
                child
                    .header()
                    .content_type()
                    .map(ContentType::media_type)
                    .filter(|mt| mt.is_type(media_types::TEXT))
                    .map(|mt| (mt, child))
            })
            .collect::<Vec<_>>();

        if !text_children.is_empty() {
            for (media_type, child) in text_children {
                self.push_text_part(registry, media_type, part, child);
            }
            return true;
        }

        part.body()
            .parts()
            .iter()
            .any(|child| self.find_sub_text_parts(registry, child))
    }

    fn push_text_part(
        &mut self,
        registry: &TextPartRegistry,
        media_type: &MediaType,
        parent: &BodyPart,
        part: &BodyPart,
    ) {
        match registry.create(media_type) {
            Ok(mut text_part) => {
                text_part.parse(parent, part);
                self.text_parts.push(text_part);
            }
            Err(Error::NoFactoryAvailable(_)) => {
                debug!("No text part for {}; skipped", media_type)
            }
            Err(e) => debug!("Text part {} skipped: {}", media_type, e),
        }
    }
}

fn address_list(header: &Header, name: &str) -> AddressList {
    header
        .find_field(name)
        .and_then(|f| f.value().as_address_list())
        .cloned()
        .unwrap_or_default()
}

fn resolve_date(header: &Header) -> DateTime<FixedOffset> {
    if let Some(date) = header
        .find_field(fields::RECEIVED)
        .and_then(|f| f.value().as_relay())
        .and_then(|relay| relay.date)
    {
        return date;
    }

    if let Some(date) = header
        .find_field(fields::DATE)
        .and_then(|f| f.value().as_date())
    {
        return *date;
    }

    debug!("Message has no usable date; using current time");
    Utc::now().into()
}

/// Decides whether `part` is an attachment.
///
/// A part whose disposition is anything but `inline` always is. A part
/// without a disposition is if its media type, `default_type` if it has no
/// `Content-Type`, is neither text nor multipart.
fn classify(part: &BodyPart, default_type: MediaType) -> Option<Attachment> {
    let header = part.header();
    let disposition = header.find_field(fields::CONTENT_DISPOSITION);

    match disposition.map(|f| (f, f.value())) {
        Some((field, &FieldValue::ContentDisposition(ref cd))) => {
            if cd.is_inline() {
                None
            } else {
                Some(Attachment::from_part(
                    part,
                    MediaType::octet_stream(),
                    Some(field.clone()),
                ))
            }
        }
        _ => {
            let media_type = header
                .content_type()
                .map(ContentType::media_type)
                .cloned()
                .unwrap_or(default_type);
            if media_type.is_type(media_types::TEXT)
                || media_type.is_type(media_types::MULTIPART)
            {
                None
            } else {
                Some(Attachment::from_part(part, media_type, None))
            }
        }
    }
}
