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

//! The `; name=value` parameter lists of `Content-Type` and
//! `Content-Disposition`, including RFC 2231 continuations and charset
//! encoding.

use std::io;

use log::debug;

use super::charset::Charset;
use super::fold::LineFolder;
use super::syntax;

const HEX_CHARS: &[u8; 16] = b"0123456789ABCDEF";

/// Encoded RFC 2231 values longer than this are split into sections.
const MAX_SECTION: usize = 50;

/// An ordered set of parameters. Names are case-insensitive and held in
/// lower case; values are held fully decoded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Parameters(Vec<(String, String)>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|&&(ref n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, ref v)| v.as_str())
    }

    /// Sets `name` to `value`, replacing any existing value in place.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.0.iter_mut().find(|&&mut (ref n, _)| n.eq_ignore_ascii_case(name)) {
            Some(&mut (_, ref mut v)) => *v = value,
            None => self.0.push((name.to_ascii_lowercase(), value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let pos = self.0.iter().position(|&(ref n, _)| n.eq_ignore_ascii_case(name))?;
        Some(self.0.remove(pos).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|&(ref n, ref v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parses a parameter list, starting at or before the first `;`.
    ///
    /// Malformed parameters are skipped up to the next `;`.
    pub(crate) fn parse_lenient(mut raw: &[u8]) -> Self {
        let mut raw_params = Vec::new();
        loop {
            raw = syntax::skip_cfws(raw);
            if raw.is_empty() {
                break;
            }

            if b';' == raw[0] {
                raw = &raw[1..];
                continue;
            }

            match syntax::parameter(raw) {
                Ok((rest, param)) => {
                    raw_params.push(param);
                    raw = rest;
                }
                Err(_) => {
                    let skip = syntax::skip_past(raw, b';');
                    debug!(
                        "Skipping malformed parameter: {:?}",
                        String::from_utf8_lossy(&raw[..skip])
                    );
                    raw = &raw[skip..];
                }
            }
        }

        Parameters::from_raw(raw_params)
    }

    /// Combines RFC 2231 sections and decodes extended values.
    fn from_raw(raw_params: Vec<(String, String)>) -> Self {
        struct Pending {
            name: String,
            plain: Option<String>,
            sections: Vec<(u32, bool, String)>,
        }

        let mut pending: Vec<Pending> = Vec::new();
        for (name, value) in raw_params {
            let name = name.to_ascii_lowercase();
            let (name, extended) = match name.strip_suffix('*') {
                Some(base) => (base.to_owned(), true),
                None => (name, false),
            };
            let (name, section) = match name.rfind('*') {
                Some(star) => match name[star + 1..].parse::<u32>() {
                    Ok(n) => (name[..star].to_owned(), Some(n)),
                    Err(_) => (name, None),
                },
                None => (name, None),
            };

            let ix = match pending.iter().position(|p| p.name == name) {
                Some(ix) => ix,
                None => {
                    pending.push(Pending {
                        name,
                        plain: None,
                        sections: Vec::new(),
                    });
                    pending.len() - 1
                }
            };

            match (section, extended) {
                (None, false) => {
                    pending[ix].plain.get_or_insert(value);
                }
                (None, true) => pending[ix].sections = vec![(0, true, value)],
                (Some(n), extended) => {
                    pending[ix].sections.push((n, extended, value))
                }
            }
        }

        Parameters(
            pending
                .into_iter()
                .filter_map(|mut p| {
                    if p.sections.is_empty() {
                        let name = p.name;
                        return p.plain.map(|v| (name, v));
                    }

                    p.sections.sort_by_key(|&(n, _, _)| n);
                    Some((p.name, decode_sections(&p.sections)))
                })
                .collect(),
        )
    }

    /// Writes each parameter as `; name=value`, folding between parameters.
    pub(crate) fn write(&self, folder: &mut LineFolder<'_>) -> io::Result<()> {
        for &(ref name, ref value) in &self.0 {
            folder.token(";", false)?;

            if !value.is_empty() && value.bytes().all(syntax::is_token_char) {
                folder.token(&format!("{}={}", name, value), true)?;
            } else if value.bytes().all(|b| (b' '..=b'~').contains(&b)) {
                folder.token(&format!("{}={}", name, quote(value)), true)?;
            } else {
                let sections = encode_sections(value);
                if 1 == sections.len() {
                    folder.token(
                        &format!("{}*=utf-8''{}", name, sections[0]),
                        true,
                    )?;
                } else {
                    for (n, section) in sections.iter().enumerate() {
                        let prefix = if 0 == n { "utf-8''" } else { "" };
                        folder.token(
                            &format!("{}*{}*={}{}", name, n, prefix, section),
                            true,
                        )?;
                        if n + 1 < sections.len() {
                            folder.token(";", false)?;
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

fn decode_sections(sections: &[(u32, bool, String)]) -> String {
    let mut charset = None;
    let mut data = Vec::new();

    for (ix, &(_, extended, ref value)) in sections.iter().enumerate() {
        if !extended {
            data.extend_from_slice(value.as_bytes());
            continue;
        }

        let mut value = value.as_str();
        if 0 == ix {
            let mut parts = value.splitn(3, '\'');
            if let (Some(cs), Some(_lang), Some(rest)) =
                (parts.next(), parts.next(), parts.next())
            {
                if !cs.is_empty() {
                    charset = Some(Charset::new(cs));
                }
                value = rest;
            }
        }
        data.extend(percent_decode(value));
    }

    match charset {
        Some(charset) => charset.decode_lossy(&data),
        None => String::from_utf8_lossy(&data).into_owned(),
    }
}

fn percent_decode(s: &str) -> Vec<u8> {
    let s = s.as_bytes();
    let mut out = Vec::with_capacity(s.len());
    let mut ix = 0;
    while ix < s.len() {
        if b'%' == s[ix] && ix + 2 < s.len() {
            let hex = std::str::from_utf8(&s[ix + 1..ix + 3])
                .ok()
                .filter(|h| h.bytes().all(|b| b.is_ascii_hexdigit()))
                .and_then(|h| u8::from_str_radix(h, 16).ok());
            if let Some(byte) = hex {
                out.push(byte);
                ix += 3;
                continue;
            }
        }
        out.push(s[ix]);
        ix += 1;
    }
    out
}

fn is_attr_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&b)
}

fn encode_sections(value: &str) -> Vec<String> {
    let mut sections = Vec::new();
    let mut current = String::new();
    for b in value.bytes() {
        let piece_len = if is_attr_char(b) { 1 } else { 3 };
        if current.len() + piece_len > MAX_SECTION {
            sections.push(std::mem::take(&mut current));
        }

        if is_attr_char(b) {
            current.push(b as char);
        } else {
            current.push('%');
            current.push(HEX_CHARS[(b as usize) >> 4] as char);
            current.push(HEX_CHARS[(b as usize) & 0x0f] as char);
        }
    }
    sections.push(current);
    sections
}

fn quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for ch in s.chars() {
        if '"' == ch || '\\' == ch {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}
