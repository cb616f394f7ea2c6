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

pub mod address;
pub mod address_list;
pub mod analyzer;
pub mod attachment;
pub mod body;
pub mod charset;
pub mod component;
pub mod constants;
pub mod disposition;
pub mod encoded_word;
pub mod encoding;
pub mod field_registry;
pub mod fold;
pub mod header;
pub mod header_field;
pub mod media_type;
pub mod message_id;
pub mod parameter;
pub mod quoted_printable;
pub mod relay;
mod syntax;
pub mod text;
pub mod text_part;
