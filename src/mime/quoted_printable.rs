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

const HEX_CHARS: &[u8; 16] = b"0123456789ABCDEF";

/// Decodes quoted-printable encoding, as described by RFC 2045.
///
/// Encoded bytes and soft line endings are both handled, the latter by
/// discarding. UNIX line endings are handled as well as DOS line endings.
///
/// This never fails. Invalid or truncated escapes are passed through
/// untransformed, as are 8-bit bytes and trailing whitespace.
pub fn qp_decode(s: &[u8]) -> Cow<[u8]> {
    if memchr::memchr(b'=', s).is_none() {
        return Cow::Borrowed(s);
    }

    let mut decoded = Vec::with_capacity(s.len());
    let mut rest = s;
    while let Some(eq) = memchr::memchr(b'=', rest) {
        decoded.extend_from_slice(&rest[..eq]);
        let tail = &rest[eq + 1..];

        if tail.starts_with(b"\r\n") {
            rest = &tail[2..];
        } else if tail.starts_with(b"\n") {
            rest = &tail[1..];
        } else if let Some(byte) = tail.get(..2).and_then(hex_byte) {
            decoded.push(byte);
            rest = &tail[2..];
        } else {
            decoded.push(b'=');
            rest = tail;
        }
    }
    decoded.extend_from_slice(rest);

    Cow::Owned(decoded)
}

fn hex_byte(pair: &[u8]) -> Option<u8> {
    let hi = (pair[0] as char).to_digit(16)?;
    let lo = (pair[1] as char).to_digit(16)?;
    Some((hi * 16 + lo) as u8)
}

/// Encodes `data` as quoted-printable body content.
///
/// Line breaks in the input, whether DOS or UNIX, become hard CRLF line
/// breaks in the output. Other lines are wrapped with soft line breaks so
/// that no encoded line exceeds `max_line_length`.
pub fn qp_encode(data: &[u8], max_line_length: usize) -> Vec<u8> {
    enum Byte {
        Passthru(u8),
        Encode(u8),
    }

    // Leave room for the = of a soft line break
    let limit = max_line_length.max(4) - 1;
    let mut result = Vec::with_capacity(data.len() + data.len() / 8);
    let mut lines = data.split(|&b| b'\n' == b).peekable();

    while let Some(line) = lines.next() {
        let hard_break = lines.peek().is_some();
        let line = match line.last() {
            Some(b'\r') if hard_break => &line[..line.len() - 1],
            _ => line,
        };

        let mut line_length = 0;
        for (ix, &c) in line.iter().enumerate() {
            let last = ix + 1 == line.len();
            let b = if (b'!'..=b'~').contains(&c) && b'=' != c {
                Byte::Passthru(c)
            } else if !last && (b' ' == c || b'\t' == c) {
                Byte::Passthru(c)
            } else {
                Byte::Encode(c)
            };

            let need_len = match b {
                Byte::Passthru(_) => 1,
                Byte::Encode(_) => 3,
            };

            if line_length + need_len > limit {
                result.extend_from_slice(b"=\r\n");
                line_length = 0;
            }

            match b {
                Byte::Passthru(c) => result.push(c),
                Byte::Encode(c) => {
                    result.push(b'=');
                    result.push(HEX_CHARS[(c as usize) >> 4]);
                    result.push(HEX_CHARS[(c as usize) & 0x0f]);
                }
            }

            line_length += need_len;
        }

        if hard_break {
            result.extend_from_slice(b"\r\n");
        }
    }

    result
}
