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

//! Renderable text extracted from a message, and the registry that decides
//! which media types can be rendered.

use std::collections::HashMap;
use std::fmt;
use std::ptr;

use lazy_static::lazy_static;

use super::body::BodyPart;
use super::charset::Charset;
use super::constants::{fields, media_types};
use super::encoding::Contents;
use super::header_field::FieldValue;
use super::media_type::{ContentType, MediaType};
use crate::support::error::Error;

/// One textual rendering of a message, e.g. its plain text or its HTML.
pub trait TextPart: fmt::Debug + Send + Sync {
    fn media_type(&self) -> MediaType;

    /// The charset of the content; `us-ascii` if none was declared.
    fn charset(&self) -> &Charset;

    /// The content, still transfer-encoded.
    fn contents(&self) -> &Contents;

    /// The content decoded to a string.
    ///
    /// Unknown charsets are read as UTF-8; only failure to remove the
    /// transfer encoding is an error.
    fn text(&self) -> Result<String, Error> {
        let raw = self.contents().decode()?;
        Ok(self.charset().decode_lossy(&raw))
    }

    /// Extracts this text part from `part`, whose parent is `parent`. For a
    /// message which isn't multipart, both are the message itself.
    fn parse(&mut self, parent: &BodyPart, part: &BodyPart);
}

fn charset_of(part: &BodyPart) -> Charset {
    part.header()
        .content_type()
        .and_then(ContentType::charset)
        .unwrap_or_default()
}

#[derive(Clone, Debug, Default)]
pub struct PlainTextPart {
    charset: Charset,
    contents: Contents,
}

impl TextPart for PlainTextPart {
    fn media_type(&self) -> MediaType {
        MediaType::new(media_types::TEXT, media_types::TEXT_PLAIN)
    }

    fn charset(&self) -> &Charset {
        &self.charset
    }

    fn contents(&self) -> &Contents {
        &self.contents
    }

    fn parse(&mut self, _parent: &BodyPart, part: &BodyPart) {
        self.charset = charset_of(part);
        self.contents = part.body().contents().clone();
    }
}

/// How an embedded object is referred to from HTML.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectReference {
    /// By `cid:` URL, matching the `Content-Id` of the object.
    Id,
    /// By the `Content-Location` of the object.
    Location,
}

/// A part next to an HTML text part which the HTML can refer to, such as an
/// inline image.
#[derive(Clone, Debug)]
pub struct EmbeddedObject {
    pub id: String,
    pub reference: ObjectReference,
    pub media_type: MediaType,
    pub contents: Contents,
}

impl EmbeddedObject {
    /// Whether `url`, as found in an HTML attribute, refers to this object.
    pub fn matches(&self, url: &str) -> bool {
        match self.reference {
            ObjectReference::Id => {
                url.get(..4)
                    .map_or(false, |p| p.eq_ignore_ascii_case("cid:"))
                    && url.get(4..) == Some(self.id.as_str())
            }
            ObjectReference::Location => url == self.id,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct HtmlTextPart {
    charset: Charset,
    contents: Contents,
    plain: Option<PlainTextPart>,
    objects: Vec<EmbeddedObject>,
}

impl HtmlTextPart {
    /// The plain text alternative sent alongside the HTML, if any.
    pub fn plain_text(&self) -> Option<&PlainTextPart> {
        self.plain.as_ref()
    }

    pub fn objects(&self) -> &[EmbeddedObject] {
        &self.objects
    }

    pub fn find_object(&self, url: &str) -> Option<&EmbeddedObject> {
        self.objects.iter().find(|o| o.matches(url))
    }
}

impl TextPart for HtmlTextPart {
    fn media_type(&self) -> MediaType {
        MediaType::new(media_types::TEXT, media_types::TEXT_HTML)
    }

    fn charset(&self) -> &Charset {
        &self.charset
    }

    fn contents(&self) -> &Contents {
        &self.contents
    }

    fn parse(&mut self, parent: &BodyPart, part: &BodyPart) {
        self.charset = charset_of(part);
        self.contents = part.body().contents().clone();
        self.plain = None;
        self.objects.clear();

        for sibling in parent.body().parts() {
            if ptr::eq(sibling, part) {
                continue;
            }

            let header = sibling.header();
            let media_type = header
                .content_type()
                .map(ContentType::media_type)
                .cloned()
                .unwrap_or_else(MediaType::octet_stream);

            if self.plain.is_none()
                && media_type.is(media_types::TEXT, media_types::TEXT_PLAIN)
            {
                let mut plain = PlainTextPart::default();
                plain.parse(parent, sibling);
                self.plain = Some(plain);
                continue;
            }

            let reference = if let Some(field) =
                header.find_field(fields::CONTENT_ID)
            {
                Some((
                    ObjectReference::Id,
                    match *field.value() {
                        FieldValue::MessageId(ref id) => id.id(),
                        ref other => field_text(other)
                            .trim_matches(|c| '<' == c || '>' == c)
                            .to_owned(),
                    },
                ))
            } else {
                header.find_field(fields::CONTENT_LOCATION).map(|field| {
                    (
                        ObjectReference::Location,
                        field_text(field.value()).to_owned(),
                    )
                })
            };

            if let Some((reference, id)) = reference {
                self.objects.push(EmbeddedObject {
                    id,
                    reference,
                    media_type,
                    contents: sibling.body().contents().clone(),
                });
            }
        }
    }
}

fn field_text(value: &FieldValue) -> &str {
    match *value {
        FieldValue::Generic(ref s) => s,
        FieldValue::Text(ref t) => t.as_str(),
        _ => "",
    }
}

/// Constructs an empty text part of some kind.
pub type TextPartConstructor = fn() -> Box<dyn TextPart>;

lazy_static! {
    static ref STANDARD: TextPartRegistry =
        TextPartRegistry::standard_builder().build();
}

/// Maps `type/subtype` media types to text part constructors.
///
/// Unlike the field registry, this one does refuse unknown types.
#[derive(Clone, Debug, Default)]
pub struct TextPartRegistry {
    constructors: HashMap<String, TextPartConstructor>,
}

impl TextPartRegistry {
    pub fn builder() -> TextPartRegistryBuilder {
        TextPartRegistryBuilder::default()
    }

    pub fn standard_builder() -> TextPartRegistryBuilder {
        TextPartRegistry::builder()
            .register("text/plain", || Box::new(PlainTextPart::default()))
            .register("text/html", || Box::new(HtmlTextPart::default()))
    }

    /// The registry of plain text and HTML parts.
    pub fn standard() -> &'static TextPartRegistry {
        &STANDARD
    }

    pub fn is_registered(&self, media_type: &MediaType) -> bool {
        self.constructors.contains_key(&media_type.to_string())
    }

    pub fn create(
        &self,
        media_type: &MediaType,
    ) -> Result<Box<dyn TextPart>, Error> {
        let key = media_type.to_string();
        match self.constructors.get(&key) {
            Some(constructor) => Ok(constructor()),
            None => Err(Error::NoFactoryAvailable(key)),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct TextPartRegistryBuilder {
    constructors: HashMap<String, TextPartConstructor>,
}

impl TextPartRegistryBuilder {
    /// Registers `constructor` for `media_type`, given as `type/subtype`,
    /// replacing any earlier registration.
    pub fn register(
        mut self,
        media_type: &str,
        constructor: TextPartConstructor,
    ) -> Self {
        self.constructors
            .insert(media_type.trim().to_ascii_lowercase(), constructor);
        self
    }

    pub fn build(self) -> TextPartRegistry {
        TextPartRegistry {
            constructors: self.constructors,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mime::body::Message;
    use crate::mime::encoding::Encoding;

    #[test]
    fn registry_lookups() {
        let registry = TextPartRegistry::standard();
        assert_eq!(
            MediaType::new("text", "plain"),
            registry.create(&MediaType::new("TEXT", "Plain")).unwrap().media_type()
        );
        assert_eq!(
            MediaType::new("text", "html"),
            registry.create(&MediaType::new("text", "html")).unwrap().media_type()
        );
        assert_matches!(
            Err(Error::NoFactoryAvailable(_)),
            registry.create(&MediaType::new("text", "enriched"))
        );
        assert!(!registry.is_registered(&MediaType::new("text", "enriched")));
    }

    #[test]
    fn registrations_can_be_overridden_and_extended() {
        let registry = TextPartRegistry::standard_builder()
            .register("Text/Enriched", || Box::new(PlainTextPart::default()))
            .register("text/html", || Box::new(PlainTextPart::default()))
            .build();
        assert!(registry.is_registered(&MediaType::new("text", "enriched")));
        assert_eq!(
            MediaType::new("text", "plain"),
            registry.create(&MediaType::new("text", "html")).unwrap().media_type()
        );
    }

    #[test]
    fn plain_text_decoding() {
        let message = Message::from_bytes(
            b"Content-Type: text/plain; charset=iso-8859-1\r\n\
              Content-Transfer-Encoding: quoted-printable\r\n\
              \r\n\
              Gr=FC=DFe\r\n",
        );

        let mut part = PlainTextPart::default();
        part.parse(&message, &message);
        assert_eq!(&Charset::new("iso-8859-1"), part.charset());
        assert_eq!(&Encoding::QuotedPrintable, part.contents().encoding());
        assert_eq!("Grüße\r\n", part.text().unwrap());
    }

    #[test]
    fn unknown_charset_reads_as_utf8() {
        let message = Message::from_bytes(
            "Content-Type: text/plain; charset=x-unheard-of\r\n\r\nGrüße"
                .as_bytes(),
        );
        let mut part = PlainTextPart::default();
        part.parse(&message, &message);
        assert_eq!("Grüße", part.text().unwrap());
    }

    #[test]
    fn html_with_alternative_and_objects() {
        let message = Message::from_bytes(
            b"Content-Type: multipart/related; boundary=b\r\n\
              \r\n\
              --b\r\n\
              Content-Type: text/html\r\n\
              \r\n\
              <img src=\"cid:logo@example.test\">\r\n\
              --b\r\n\
              Content-Type: text/plain\r\n\
              \r\n\
              plain\r\n\
              --b\r\n\
              Content-Type: image/png\r\n\
              Content-Id: <logo@example.test>\r\n\
              \r\n\
              PNG\r\n\
              --b\r\n\
              Content-Type: image/gif\r\n\
              Content-Location: http://example.test/a.gif\r\n\
              \r\n\
              GIF\r\n\
              --b\r\n\
              Content-Type: application/octet-stream\r\n\
              \r\n\
              ignored\r\n\
              --b--\r\n",
        );

        let html_part = message.body().part_at(0).unwrap();
        let mut html = HtmlTextPart::default();
        html.parse(&message, html_part);

        assert_eq!("<img src=\"cid:logo@example.test\">", html.text().unwrap());
        assert_eq!("plain", html.plain_text().unwrap().text().unwrap());
        assert_eq!(2, html.objects().len());

        let logo = html.find_object("CID:logo@example.test").unwrap();
        assert_eq!(ObjectReference::Id, logo.reference);
        assert_eq!(MediaType::new("image", "png"), logo.media_type);
        assert_eq!(b"PNG", logo.contents.data());

        let gif = html.find_object("http://example.test/a.gif").unwrap();
        assert_eq!(ObjectReference::Location, gif.reference);
        assert!(html.find_object("cid:nothing").is_none());
        assert!(html.find_object("logo@example.test").is_none());
    }

    #[test]
    fn object_urls_with_non_ascii_characters() {
        let object = EmbeddedObject {
            id: "logo@example.test".to_owned(),
            reference: ObjectReference::Id,
            media_type: MediaType::new("image", "png"),
            contents: Contents::default(),
        };

        assert!(!object.matches("cid\u{e9}x"));
        assert!(!object.matches("\u{e9}\u{e9}\u{e9}"));
        assert!(!object.matches("ci\u{e9}logo@example.test"));
        assert!(!object.matches("cid"));
        assert!(object.matches("cid:logo@example.test"));

        let unicode = EmbeddedObject {
            id: "\u{e9}t\u{e9}@example.test".to_owned(),
            ..object
        };
        assert!(unicode.matches("Cid:\u{e9}t\u{e9}@example.test"));
    }
}
