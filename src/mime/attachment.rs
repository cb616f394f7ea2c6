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

use super::body::BodyPart;
use super::constants::fields;
use super::encoding::Contents;
use super::header_field::{FieldValue, HeaderField};
use super::media_type::{ContentType, MediaType};
use super::text::Text;

/// A part of a message meant to be presented as a discrete file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    media_type: MediaType,
    description: Option<Text>,
    contents: Contents,
    content_type: Option<ContentType>,
    disposition_field: Option<HeaderField>,
}

impl Attachment {
    pub fn new(media_type: MediaType, contents: Contents) -> Self {
        Attachment {
            media_type,
            description: None,
            contents,
            content_type: None,
            disposition_field: None,
        }
    }

    /// Builds the attachment for `part`.
    ///
    /// `default_type` is used if `part` has no usable `Content-Type`.
    /// `disposition_field` is the field that caused `part` to be classified
    /// as an attachment, if any.
    pub(crate) fn from_part(
        part: &BodyPart,
        default_type: MediaType,
        disposition_field: Option<HeaderField>,
    ) -> Self {
        let header = part.header();
        let content_type = header.content_type().cloned();
        let media_type = content_type
            .as_ref()
            .map(|ct| ct.media_type().clone())
            .unwrap_or(default_type);
        let description = header
            .find_field(fields::CONTENT_DESCRIPTION)
            .and_then(|f| match *f.value() {
                FieldValue::Text(ref text) => Some(text.clone()),
                FieldValue::Generic(ref raw) => Some(Text::new(raw.as_str())),
                _ => None,
            });

        Attachment {
            media_type,
            description,
            contents: part.body().contents().clone(),
            content_type,
            disposition_field,
        }
    }

    pub fn media_type(&self) -> &MediaType {
        &self.media_type
    }

    pub fn description(&self) -> Option<&Text> {
        self.description.as_ref()
    }

    pub fn set_description(&mut self, description: Option<Text>) {
        self.description = description;
    }

    /// The content, still transfer-encoded.
    pub fn contents(&self) -> &Contents {
        &self.contents
    }

    /// The `Content-Disposition` field which marked this part as an
    /// attachment, or `None` if it was classified by its media type.
    pub fn disposition_field(&self) -> Option<&HeaderField> {
        self.disposition_field.as_ref()
    }

    /// The suggested file name: the disposition's `filename` parameter, or
    /// else the `name` parameter of the content type.
    pub fn name(&self) -> Option<&str> {
        self.disposition_field
            .as_ref()
            .and_then(|f| f.value().as_content_disposition())
            .and_then(|cd| cd.filename())
            .or_else(|| self.content_type.as_ref().and_then(ContentType::name))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mime::body::Message;
    use crate::mime::encoding::Encoding;

    #[test]
    fn attachment_from_part() {
        let message = Message::from_bytes(
            b"Content-Type: application/pdf; name=\"report.pdf\"\r\n\
              Content-Disposition: attachment; filename=\"q3.pdf\"\r\n\
              Content-Description: =?utf-8?q?Quartalsbericht_f=C3=BCr_Q3?=\r\n\
              Content-Transfer-Encoding: base64\r\n\
              \r\n\
              JVBERi0=\r\n",
        );

        let field = message
            .header()
            .find_field(fields::CONTENT_DISPOSITION)
            .cloned();
        let attachment =
            Attachment::from_part(&message, MediaType::octet_stream(), field);

        assert_eq!(&MediaType::new("application", "pdf"), attachment.media_type());
        assert_eq!(
            "Quartalsbericht für Q3",
            attachment.description().unwrap().as_str()
        );
        assert_eq!(&Encoding::Base64, attachment.contents().encoding());
        assert_eq!(b"%PDF-".to_vec(), attachment.contents().decode().unwrap());
        assert_eq!(Some("q3.pdf"), attachment.name());
        assert!(attachment.disposition_field().is_some());
    }

    #[test]
    fn name_falls_back_to_content_type() {
        let message = Message::from_bytes(
            b"Content-Type: image/png; name=logo.png\r\n\r\nPNG",
        );
        let attachment =
            Attachment::from_part(&message, MediaType::octet_stream(), None);
        assert_eq!(Some("logo.png"), attachment.name());
        assert!(attachment.description().is_none());
        assert!(attachment.disposition_field().is_none());

        let bare = Attachment::new(
            MediaType::octet_stream(),
            Contents::new(b"data".to_vec(), Encoding::Binary),
        );
        assert_eq!(None, bare.name());
    }

    #[test]
    fn default_type_applies_without_content_type() {
        let message = Message::from_bytes(b"X-Foo: bar\r\n\r\ndata");
        let attachment =
            Attachment::from_part(&message, MediaType::octet_stream(), None);
        assert_eq!(&MediaType::octet_stream(), attachment.media_type());
        assert_eq!(b"data", attachment.contents().data());
    }
}
