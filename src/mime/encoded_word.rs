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

use lazy_static::lazy_static;
use regex::Regex;

use super::charset::Charset;
use super::quoted_printable::qp_decode;

lazy_static! {
    static ref ENCODED_WORD: Regex =
        Regex::new(r"^=\?([!->@-~]*)\?([!->@-~]*)\?([!->@-~]*)\?=$").unwrap();
}

/// The most raw bytes put into one generated encoded word. 45 bytes of
/// base64 is 60 characters, which with the `=?utf-8?B?` framing stays under
/// the 75 character limit of RFC 2047.
const MAX_CHUNK: usize = 45;

/// Test if `word` (in its entirety) is an RFC 2047 "encoded word".
///
/// If it is, decode it and return its decoded value.
///
/// Returns `None` if it is not an encoded word or if it could not be decoded.
/// The distinction from "unchanged" matters to callers, since whitespace
/// between adjacent encoded words is deleted but must be kept everywhere
/// else.
///
/// Encoded words longer than the RFC 2047 limit are accepted; enough agents
/// produce them that refusing would only hurt.
pub fn ew_decode(word: &str) -> Option<String> {
    let captures = ENCODED_WORD.captures(word)?;

    // RFC 2231 allows a language suffix on the charset
    let charset = captures.get(1)?.as_str();
    let charset = charset.split('*').next().unwrap_or(charset);
    let transfer_encoding = captures.get(2)?.as_str();
    let mut content = Cow::Borrowed(captures.get(3)?.as_str().as_bytes());

    let content: Cow<[u8]> = match transfer_encoding {
        "q" | "Q" => {
            // _ stands for ASCII space regardless of charset
            if content.contains(&b'_') {
                for b in content.to_mut() {
                    if b'_' == *b {
                        *b = b' ';
                    }
                }
            }
            Cow::Owned(qp_decode(&content).into_owned())
        }
        "b" | "B" => Cow::Owned(base64::decode(&content[..]).ok()?),
        _ => return None,
    };

    Charset::new(charset).decode(&content).ok()
}

/// Encodes `text` as one or more B-encoded UTF-8 encoded words.
///
/// Characters are never split across words, so each word decodes on its
/// own. Adjacent words decode back into `text` when separated by nothing
/// but whitespace.
pub fn ew_encode(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let mut split = rest.len().min(MAX_CHUNK);
        while !rest.is_char_boundary(split) {
            split -= 1;
        }

        let (chunk, tail) = rest.split_at(split);
        words.push(format!("=?utf-8?B?{}?=", base64::encode(chunk)));
        rest = tail;
    }

    words
}

/// Whether `word` could be mistaken for an encoded word if written as-is.
pub fn looks_encoded(word: &str) -> bool {
    word.starts_with("=?") && word.ends_with("?=")
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_ew_decode() {
        assert_eq!(None, ew_decode("hello world"));

        // Examples from RFC 2047
        assert_eq!(
            "Keith Moore",
            ew_decode("=?US-ASCII?Q?Keith_Moore?=").unwrap()
        );
        assert_eq!(
            "Keld Jørn Simonsen",
            ew_decode("=?ISO-8859-1?Q?Keld_J=F8rn_Simonsen?=").unwrap()
        );
        assert_eq!("André", ew_decode("=?ISO-8859-1?Q?Andr=E9?=").unwrap());
        assert_eq!(
            "If you can read this yo",
            ew_decode("=?ISO-8859-1?B?SWYgeW91IGNhbiByZWFkIHRoaXMgeW8=?=")
                .unwrap()
        );
        assert_eq!(
            "u understand the example.",
            ew_decode("=?ISO-8859-2?B?dSB1bmRlcnN0YW5kIHRoZSBleGFtcGxlLg==?=")
                .unwrap()
        );
        assert_eq!(
            "םולש ןב ילטפנ",
            ew_decode("=?iso-8859-8?b?7eXs+SDv4SDp7Oj08A==?=").unwrap()
        );
        assert_eq!("a", ew_decode("=?US-ASCII*EN?Q?a?=").unwrap());
    }

    #[test]
    fn undecodable_words() {
        assert_eq!(None, ew_decode("=?utf-8?X?abc?="));
        assert_eq!(None, ew_decode("=?utf-8?B?!!!?="));
        assert_eq!(None, ew_decode("=?x-unknown?Q?abc?="));
    }

    #[test]
    fn test_ew_encode() {
        assert_eq!(vec!["=?utf-8?B?w6k=?="], ew_encode("é"));
        assert!(ew_encode("").is_empty());

        let long = "ö".repeat(100);
        let words = ew_encode(&long);
        assert_eq!(5, words.len());
        for word in &words {
            assert!(word.len() <= 75);
        }
        let decoded: String =
            words.iter().map(|w| ew_decode(w).unwrap()).collect();
        assert_eq!(long, decoded);
    }

    proptest! {
        #[test]
        fn ew_decode_never_panics(s in r"=\?.*\?.*\?.*\?=") {
            ew_decode(&s);
        }

        #[test]
        fn ew_encode_round_trips(s in ".{0,200}") {
            let decoded: String = ew_encode(&s).iter()
                .map(|w| ew_decode(w).unwrap())
                .collect();
            prop_assert_eq!(s, decoded);
        }
    }
}
