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

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::Error;

/// Tunables for parsing and generation, normally read from a TOML file.
///
/// Every section and every key is optional; anything missing takes its
/// default.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct MimeConfig {
    #[serde(default)]
    pub parsing: ParsingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ParsingConfig {
    /// The maximum nesting depth of multipart bodies. Multipart parts below
    /// this depth are kept as opaque leaf content.
    pub max_depth: u32,
    /// The maximum number of body parts in one message. Parts beyond this
    /// limit are left in the epilog of their container.
    pub max_parts: u32,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        ParsingConfig {
            max_depth: 20,
            max_parts: 1000,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Lines are folded before they would exceed this many bytes. 0 disables
    /// folding.
    pub max_line_length: usize,
    /// Prefix of randomly generated multipart boundaries.
    pub boundary_prefix: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        GenerationConfig {
            max_line_length: 78,
            boundary_prefix: "=_".to_owned(),
        }
    }
}

impl MimeConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, Error> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let data = fs::read_to_string(path)?;
        Self::from_toml_str(&data)
    }
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use super::*;

    #[test]
    fn empty_config_is_default() {
        assert_eq!(
            MimeConfig::default(),
            MimeConfig::from_toml_str("").unwrap()
        );
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let config = MimeConfig::from_toml_str(
            "[parsing]\n\
             max_depth = 4\n\
             [generation]\n\
             boundary_prefix = \"--mt\"\n",
        )
        .unwrap();

        assert_eq!(4, config.parsing.max_depth);
        assert_eq!(1000, config.parsing.max_parts);
        assert_eq!(78, config.generation.max_line_length);
        assert_eq!("--mt", config.generation.boundary_prefix);
    }

    #[test]
    fn bad_config_is_error() {
        assert_matches!(
            Err(Error::Config(_)),
            MimeConfig::from_toml_str("[parsing]\nmax_depth = \"deep\"\n")
        );
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[generation]\nmax_line_length = 0").unwrap();

        let config = MimeConfig::load(file.path()).unwrap();
        assert_eq!(0, config.generation.max_line_length);
        assert_eq!(20, config.parsing.max_depth);

        assert_matches!(
            Err(Error::Io(_)),
            MimeConfig::load(file.path().with_extension("missing"))
        );
    }
}
