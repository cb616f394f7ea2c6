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

//! Content transfer encodings and the codecs behind them.

use std::fmt;
use std::io::{self, Write};

use log::debug;

use super::component::{Component, GenerationContext, ParsingContext};
use super::constants::encoding_types;
use super::fold::{line_length, LineFolder};
use super::quoted_printable::{qp_decode, qp_encode};
use super::syntax;
use crate::support::error::Error;

/// Converts between the raw and the transfer-encoded form of body content.
pub trait Codec {
    fn decode(&self, data: &[u8]) -> Result<Vec<u8>, Error>;
    fn encode(&self, data: &[u8]) -> Vec<u8>;
}

/// `7bit`, `8bit` and `binary`, none of which transform the data.
#[derive(Clone, Copy, Debug)]
pub struct IdentityCodec;

impl Codec for IdentityCodec {
    fn decode(&self, data: &[u8]) -> Result<Vec<u8>, Error> {
        Ok(data.to_vec())
    }

    fn encode(&self, data: &[u8]) -> Vec<u8> {
        data.to_vec()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Base64Codec;

impl Codec for Base64Codec {
    /// Anything outside the base64 alphabet, such as line breaks, is
    /// ignored.
    fn decode(&self, data: &[u8]) -> Result<Vec<u8>, Error> {
        let filtered: Vec<u8> = data
            .iter()
            .copied()
            .filter(|&b| {
                b.is_ascii_alphanumeric() || b'+' == b || b'/' == b || b'=' == b
            })
            .collect();
        Ok(base64::decode_config(&filtered, base64::STANDARD)?)
    }

    fn encode(&self, data: &[u8]) -> Vec<u8> {
        let encoded = base64::encode_config(data, base64::STANDARD);
        let mut out = Vec::with_capacity(
            encoded.len() + encoded.len() / line_length::CONVENIENT * 2,
        );
        for (ix, line) in encoded.as_bytes().chunks(line_length::CONVENIENT).enumerate()
        {
            if ix > 0 {
                out.extend_from_slice(b"\r\n");
            }
            out.extend_from_slice(line);
        }
        out
    }
}

#[derive(Clone, Copy, Debug)]
pub struct QuotedPrintableCodec;

impl Codec for QuotedPrintableCodec {
    fn decode(&self, data: &[u8]) -> Result<Vec<u8>, Error> {
        Ok(qp_decode(data).into_owned())
    }

    fn encode(&self, data: &[u8]) -> Vec<u8> {
        qp_encode(data, line_length::CONVENIENT)
    }
}

/// A `Content-Transfer-Encoding` token.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Encoding {
    SevenBit,
    EightBit,
    Base64,
    QuotedPrintable,
    Binary,
    UuEncode,
    /// Anything else, in lower case.
    Other(String),
}

impl Encoding {
    pub fn from_name(name: &str) -> Self {
        let name = name.trim().to_ascii_lowercase();
        match name.as_str() {
            encoding_types::SEVEN_BIT => Encoding::SevenBit,
            encoding_types::EIGHT_BIT => Encoding::EightBit,
            encoding_types::BASE64 => Encoding::Base64,
            encoding_types::QUOTED_PRINTABLE => Encoding::QuotedPrintable,
            encoding_types::BINARY => Encoding::Binary,
            encoding_types::UUENCODE | "x-uuencode" | "x-uue" => {
                Encoding::UuEncode
            }
            _ => Encoding::Other(name),
        }
    }

    pub fn name(&self) -> &str {
        match *self {
            Encoding::SevenBit => encoding_types::SEVEN_BIT,
            Encoding::EightBit => encoding_types::EIGHT_BIT,
            Encoding::Base64 => encoding_types::BASE64,
            Encoding::QuotedPrintable => encoding_types::QUOTED_PRINTABLE,
            Encoding::Binary => encoding_types::BINARY,
            Encoding::UuEncode => encoding_types::UUENCODE,
            Encoding::Other(ref name) => name,
        }
    }

    /// The codec implementing this encoding.
    pub fn codec(&self) -> Result<&'static dyn Codec, Error> {
        match *self {
            Encoding::SevenBit | Encoding::EightBit | Encoding::Binary => {
                Ok(&IdentityCodec)
            }
            Encoding::Base64 => Ok(&Base64Codec),
            Encoding::QuotedPrintable => Ok(&QuotedPrintableCodec),
            Encoding::UuEncode | Encoding::Other(_) => {
                Err(Error::UnsupportedEncoding(self.name().to_owned()))
            }
        }
    }

    pub fn decode(&self, data: &[u8]) -> Result<Vec<u8>, Error> {
        self.codec()?.decode(data)
    }

    pub fn encode(&self, data: &[u8]) -> Result<Vec<u8>, Error> {
        Ok(self.codec()?.encode(data))
    }
}

impl Default for Encoding {
    fn default() -> Self {
        Encoding::SevenBit
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Component for Encoding {
    fn parse(
        &mut self,
        _: &ParsingContext<'_>,
        buffer: &[u8],
        start: usize,
        end: usize,
    ) -> usize {
        match syntax::bare_token(&buffer[start..end]) {
            Ok((rest, name)) => {
                *self = Encoding::from_name(&name);
                end - rest.len()
            }
            Err(_) => {
                debug!(
                    "Unparseable transfer encoding: {:?}",
                    String::from_utf8_lossy(&buffer[start..end])
                );
                *self = Encoding::default();
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
        folder.token(self.name(), false)?;
        Ok(folder.finish())
    }
}

/// Leaf body content: the bytes as they appear on the wire, plus the
/// transfer encoding they are in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Contents {
    data: Vec<u8>,
    encoding: Encoding,
}

impl Contents {
    pub fn new(data: Vec<u8>, encoding: Encoding) -> Self {
        Contents { data, encoding }
    }

    /// Encodes `raw` with `encoding`.
    pub fn encode_from(raw: &[u8], encoding: Encoding) -> Result<Self, Error> {
        Ok(Contents {
            data: encoding.encode(raw)?,
            encoding,
        })
    }

    /// The encoded data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn encoding(&self) -> &Encoding {
        &self.encoding
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The data with its transfer encoding removed.
    pub fn decode(&self) -> Result<Vec<u8>, Error> {
        self.encoding.decode(&self.data)
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn encoding_names() {
        assert_eq!(Encoding::Base64, Encoding::from_name(" BASE64 "));
        assert_eq!(
            Encoding::QuotedPrintable,
            Encoding::from_name("Quoted-Printable")
        );
        assert_eq!(Encoding::UuEncode, Encoding::from_name("x-uuencode"));
        assert_eq!(
            Encoding::Other("x-custom".to_owned()),
            Encoding::from_name("X-Custom")
        );
        assert_eq!("8bit", Encoding::EightBit.to_string());
    }

    #[test]
    fn parse_encoding_field() {
        let mut encoding = Encoding::default();
        encoding.parse_bytes(b" base64 (because)\r\n");
        assert_eq!(Encoding::Base64, encoding);
        encoding.parse_bytes(b"");
        assert_eq!(Encoding::SevenBit, encoding);
    }

    #[test]
    fn base64_decoding_is_lenient_about_whitespace() {
        let contents = Contents::new(
            b"SGVsbG8s\r\nIHdvcmxk\r\nIQ==\r\n".to_vec(),
            Encoding::Base64,
        );
        assert_eq!(b"Hello, world!".to_vec(), contents.decode().unwrap());

        let contents = Contents::new(b"SGVsbG8=x".to_vec(), Encoding::Base64);
        assert_matches!(Err(Error::Base64(_)), contents.decode());
    }

    #[test]
    fn base64_lines_are_wrapped() {
        let encoded = Encoding::Base64.encode(&[0u8; 200]).unwrap();
        for line in encoded.split(|&b| b'\n' == b) {
            assert!(line.len() <= 77);
        }
    }

    #[test]
    fn unsupported_encodings() {
        match Encoding::UuEncode.decode(b"begin 644 x\n") {
            Err(Error::UnsupportedEncoding(name)) => assert_eq!("uuencode", name),
            r => panic!("Unexpected result: {:?}", r),
        }
        assert_matches!(
            Err(Error::UnsupportedEncoding(_)),
            Contents::encode_from(b"x", Encoding::Other("x-foo".to_owned()))
        );
    }

    #[test]
    fn quoted_printable_contents() {
        let contents =
            Contents::encode_from("Grüße\r\n".as_bytes(), Encoding::QuotedPrintable)
                .unwrap();
        assert_eq!(&b"Gr=C3=BC=C3=9Fe\r\n"[..], contents.data());
        assert_eq!("Grüße\r\n".as_bytes().to_vec(), contents.decode().unwrap());
    }

    proptest! {
        #[test]
        fn base64_round_trip(data in prop::collection::vec(any::<u8>(), 0..500)) {
            let contents = Contents::encode_from(&data, Encoding::Base64).unwrap();
            prop_assert_eq!(data, contents.decode().unwrap());
        }
    }
}
