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

//! Change notification for folder implementations.
//!
//! A folder owns a `FolderEvents` and calls its `notify_*` methods as
//! messages and folders change; interested parties register listeners
//! with it.

pub mod events;
pub mod folder;

pub use self::events::{
    FolderEvent, FolderEventKind, FolderListener, MessageChangedEvent,
    MessageChangedListener, MessageCountEvent, MessageCountKind,
    MessageCountListener, MessageFlags,
};
pub use self::folder::{FolderEvents, Listeners};
