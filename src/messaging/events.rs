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

use bitflags::bitflags;

bitflags! {
    /// Flags which can be set on a message in a folder.
    pub struct MessageFlags: u32 {
        const SEEN = 1 << 0;
        const RECENT = 1 << 1;
        const DELETED = 1 << 2;
        const REPLIED = 1 << 3;
        const MARKED = 1 << 4;
        const PASSED = 1 << 5;
    }
}

/// The flags of some messages changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageChangedEvent {
    /// The 1-based numbers of the affected messages within the folder.
    pub numbers: Vec<u32>,
    /// The flags which were added or removed.
    pub flags: MessageFlags,
}

impl MessageChangedEvent {
    pub fn new(numbers: Vec<u32>, flags: MessageFlags) -> Self {
        MessageChangedEvent { numbers, flags }
    }

    pub fn dispatch(&self, listener: &dyn MessageChangedListener) {
        listener.message_changed(self);
    }
}

pub trait MessageChangedListener: Send + Sync {
    fn message_changed(&self, event: &MessageChangedEvent);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageCountKind {
    Added,
    Removed,
}

/// Messages were added to or removed from a folder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageCountEvent {
    pub kind: MessageCountKind,
    pub numbers: Vec<u32>,
}

impl MessageCountEvent {
    pub fn new(kind: MessageCountKind, numbers: Vec<u32>) -> Self {
        MessageCountEvent { kind, numbers }
    }

    pub fn dispatch(&self, listener: &dyn MessageCountListener) {
        match self.kind {
            MessageCountKind::Added => listener.messages_added(self),
            MessageCountKind::Removed => listener.messages_removed(self),
        }
    }
}

pub trait MessageCountListener: Send + Sync {
    fn messages_added(&self, event: &MessageCountEvent);
    fn messages_removed(&self, event: &MessageCountEvent);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FolderEventKind {
    Created,
    Deleted,
    Renamed,
}

/// A folder was created, deleted or renamed.
///
/// `old_path` and `new_path` are the same except for renames.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FolderEvent {
    pub kind: FolderEventKind,
    pub old_path: String,
    pub new_path: String,
}

impl FolderEvent {
    pub fn created(path: impl Into<String>) -> Self {
        let path = path.into();
        FolderEvent {
            kind: FolderEventKind::Created,
            old_path: path.clone(),
            new_path: path,
        }
    }

    pub fn deleted(path: impl Into<String>) -> Self {
        let path = path.into();
        FolderEvent {
            kind: FolderEventKind::Deleted,
            old_path: path.clone(),
            new_path: path,
        }
    }

    pub fn renamed(
        old_path: impl Into<String>,
        new_path: impl Into<String>,
    ) -> Self {
        FolderEvent {
            kind: FolderEventKind::Renamed,
            old_path: old_path.into(),
            new_path: new_path.into(),
        }
    }

    pub fn dispatch(&self, listener: &dyn FolderListener) {
        match self.kind {
            FolderEventKind::Created => listener.folder_created(self),
            FolderEventKind::Deleted => listener.folder_deleted(self),
            FolderEventKind::Renamed => listener.folder_renamed(self),
        }
    }
}

pub trait FolderListener: Send + Sync {
    fn folder_created(&self, event: &FolderEvent);
    fn folder_deleted(&self, event: &FolderEvent);
    fn folder_renamed(&self, event: &FolderEvent);
}
