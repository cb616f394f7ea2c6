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

use std::borrow::Cow;
use std::fmt;

use encoding_rs::Encoding;

use super::constants::charsets;
use crate::support::error::Error;

/// A named character set, as found in `charset` parameters and encoded
/// words.
///
/// Names are kept in lower case. Conversion is done by `encoding_rs`, which
/// knows every charset a mail reader is likely to meet, with the exception
/// of a few (notably UTF-7 and UTF-32) which are reported as unknown.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Charset(String);

impl Charset {
    pub fn new(name: &str) -> Self {
        Charset(name.trim().to_ascii_lowercase())
    }

    pub fn us_ascii() -> Self {
        Charset(charsets::US_ASCII.to_owned())
    }

    pub fn utf_8() -> Self {
        Charset(charsets::UTF_8.to_owned())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    fn encoding(&self) -> Result<&'static Encoding, Error> {
        // encoding_rs knows the DOS code pages as "cp866" and so forth
        let label: Cow<str> = match self.0.strip_prefix("cp-") {
            Some(number) => Cow::Owned(format!("cp{}", number)),
            None => Cow::Borrowed(self.0.as_str()),
        };

        Encoding::for_label_no_replacement(label.as_bytes())
            .ok_or_else(|| Error::UnknownCharset(self.0.clone()))
    }

    /// Decodes `data` from this charset. Malformed sequences are replaced
    /// with U+FFFD. Byte order marks are kept as content.
    pub fn decode(&self, data: &[u8]) -> Result<String, Error> {
        Ok(self
            .encoding()?
            .decode_without_bom_handling(data)
            .0
            .into_owned())
    }

    /// Like `decode`, but falls back to lossy UTF-8 for unknown charsets.
    pub fn decode_lossy(&self, data: &[u8]) -> String {
        match self.decode(data) {
            Ok(s) => s,
            Err(_) => String::from_utf8_lossy(data).into_owned(),
        }
    }

    /// Encodes `text` into this charset.
    ///
    /// Characters the charset cannot represent are written as HTML numeric
    /// character references.
    pub fn encode(&self, text: &str) -> Result<Vec<u8>, Error> {
        Ok(self.encoding()?.encode(text).0.into_owned())
    }
}

impl Default for Charset {
    fn default() -> Self {
        Charset::us_ascii()
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn names_are_normalised() {
        assert_eq!("utf-8", Charset::new(" UTF-8 ").name());
        assert_eq!(Charset::us_ascii(), Charset::default());
    }

    #[test]
    fn decode_known_charsets() {
        assert_eq!(
            "Andr\u{e9}",
            Charset::new("ISO-8859-1").decode(b"Andr\xe9").unwrap()
        );
        assert_eq!(
            "\u{20ac}",
            Charset::new(charsets::CP_1252).decode(b"\x80").unwrap()
        );
        assert_eq!(
            "\u{444}",
            Charset::new(charsets::CP_866).decode(b"\xe4").unwrap()
        );
        assert_eq!("hello", Charset::utf_8().decode(b"hello").unwrap());
    }

    #[test]
    fn unknown_charsets() {
        assert_matches!(
            Err(Error::UnknownCharset(_)),
            Charset::new(charsets::UTF_7).decode(b"+AGEAYgBj-")
        );
        assert_matches!(
            Err(Error::UnknownCharset(_)),
            Charset::new("x-klingon").encode("nuqneH")
        );
        assert_eq!(
            "plain \u{fffd}",
            Charset::new("x-klingon").decode_lossy(b"plain \xff")
        );
    }

    #[test]
    fn encode_round_trips() {
        let latin1 = Charset::new(charsets::ISO8859_1);
        let encoded = latin1.encode("Keld J\u{f8}rn").unwrap();
        assert_eq!(b"Keld J\xf8rn", &encoded[..]);
        assert_eq!("Keld J\u{f8}rn", latin1.decode(&encoded).unwrap());
    }
}
