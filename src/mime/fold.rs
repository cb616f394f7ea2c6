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

use std::io::{self, Write};

/// Line length limits for generated output.
pub mod line_length {
    /// No folding at all.
    pub const INFINITE: usize = usize::MAX;
    /// The length base64 and quoted-printable bodies are wrapped to.
    pub const CONVENIENT: usize = 76;
    /// RFC 2822 section 2.1.1 "SHOULD" limit.
    pub const MAX_RECOMMENDED: usize = 78;
    /// RFC 2822 section 2.1.1 "MUST" limit, excluding the CRLF.
    pub const MAX: usize = 998;
}

/// Writes header tokens to an output, inserting folds between tokens so
/// that lines stay within a maximum length where possible.
///
/// A fold is always CRLF followed by a single space, which takes the place
/// of the space that would otherwise have separated the two tokens. Tokens
/// themselves are never split; a token longer than the limit gets a line of
/// its own.
pub struct LineFolder<'a> {
    out: &'a mut dyn Write,
    max_line_length: usize,
    pos: usize,
}

impl<'a> LineFolder<'a> {
    pub fn new(
        out: &'a mut dyn Write,
        max_line_length: usize,
        cur_line_pos: usize,
    ) -> Self {
        LineFolder {
            out,
            max_line_length,
            pos: cur_line_pos,
        }
    }

    /// The current position within the line being written.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Writes `s` verbatim, never folding before it.
    pub fn raw(&mut self, s: &[u8]) -> io::Result<()> {
        self.out.write_all(s)?;
        match memchr::memrchr(b'\n', s) {
            Some(nl) => self.pos = s.len() - nl - 1,
            None => self.pos = self.pos.saturating_add(s.len()),
        }
        Ok(())
    }

    /// Writes `token`, separated from what came before by a single space if
    /// `space` is set.
    ///
    /// If the token would run past the limit and something other than the
    /// fold indent already sits on the line, the line is folded first. A
    /// token written with `space` unset is glued to its predecessor and is
    /// never folded.
    pub fn token(&mut self, token: &str, space: bool) -> io::Result<()> {
        let needed = token.len() + (space as usize);
        if space
            && self.pos > 1
            && self.pos.saturating_add(needed) > self.max_line_length
        {
            self.out.write_all(b"\r\n ")?;
            self.pos = 1;
        } else if space {
            self.out.write_all(b" ")?;
            self.pos = self.pos.saturating_add(1);
        }

        self.out.write_all(token.as_bytes())?;
        self.pos = self.pos.saturating_add(token.len());
        Ok(())
    }

    /// Consumes the folder, returning the final line position.
    pub fn finish(self) -> usize {
        self.pos
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn fold(max: usize, start: usize, tokens: &[&str]) -> (String, usize) {
        let mut out = Vec::new();
        let mut folder = LineFolder::new(&mut out, max, start);
        for (ix, tok) in tokens.iter().enumerate() {
            folder.token(tok, ix > 0).unwrap();
        }
        let pos = folder.finish();
        (String::from_utf8(out).unwrap(), pos)
    }

    #[test]
    fn short_tokens_stay_on_one_line() {
        assert_eq!(
            ("foo bar baz".to_owned(), 20),
            fold(78, 9, &["foo", "bar", "baz"])
        );
    }

    #[test]
    fn folds_before_overflowing_token() {
        assert_eq!(
            ("aaaa bbbb\r\n cccc".to_owned(), 5),
            fold(10, 0, &["aaaa", "bbbb", "cccc"])
        );
    }

    #[test]
    fn long_token_is_never_split() {
        let (out, pos) = fold(10, 0, &["ab", "0123456789abcdef", "b"]);
        assert_eq!("ab\r\n 0123456789abcdef\r\n b", out);
        assert_eq!(2, pos);

        for line in out.split("\r\n") {
            assert!(!line.is_empty());
        }
    }

    #[test]
    fn infinite_never_folds() {
        let tokens = vec!["word"; 100];
        let (out, _) = fold(line_length::INFINITE, 0, &tokens);
        assert!(!out.contains('\n'));
    }

    #[test]
    fn raw_tracks_position_across_newlines() {
        let mut out = Vec::new();
        let mut folder = LineFolder::new(&mut out, 78, 10);
        folder.raw(b"abc").unwrap();
        assert_eq!(13, folder.position());
        folder.raw(b"xyz\r\nhello").unwrap();
        assert_eq!(5, folder.position());
    }

    #[test]
    fn glued_token_never_folds() {
        assert_eq!(
            ("aaaaaaaa,".to_owned(), 9),
            fold_glued(8, &["aaaaaaaa", ","])
        );
    }

    fn fold_glued(max: usize, tokens: &[&str]) -> (String, usize) {
        let mut out = Vec::new();
        let mut folder = LineFolder::new(&mut out, max, 0);
        for tok in tokens {
            folder.token(tok, false).unwrap();
        }
        let pos = folder.finish();
        (String::from_utf8(out).unwrap(), pos)
    }
}
