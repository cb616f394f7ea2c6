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

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::trace;

use super::events::*;

/// An ordered set of listeners.
///
/// Listeners are identified by the `Arc` they were added with. Dispatch
/// works on a snapshot, so listeners may add or remove listeners (including
/// themselves) while being notified; such changes apply from the next
/// notification on.
pub struct Listeners<L: ?Sized> {
    list: Mutex<Vec<Arc<L>>>,
}

impl<L: ?Sized> Listeners<L> {
    pub fn new() -> Self {
        Listeners {
            list: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<L>>> {
        // A panicking listener cannot leave the list inconsistent.
        self.list.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add(&self, listener: Arc<L>) {
        self.lock().push(listener);
    }

    /// Removes `listener`, returning whether it was registered.
    pub fn remove(&self, listener: &Arc<L>) -> bool {
        let mut list = self.lock();
        let before = list.len();
        list.retain(|l| !same_listener(l, listener));
        list.len() != before
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// The listeners currently registered, in registration order.
    pub fn snapshot(&self) -> Vec<Arc<L>> {
        self.lock().clone()
    }
}

fn same_listener<L: ?Sized>(a: &Arc<L>, b: &Arc<L>) -> bool {
    // Data addresses only; the vtable half of a `dyn` pointer is not unique.
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

impl<L: ?Sized> Default for Listeners<L> {
    fn default() -> Self {
        Listeners::new()
    }
}

impl<L: ?Sized> fmt::Debug for Listeners<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.len())
            .finish()
    }
}

/// The listener registries of one folder.
#[derive(Debug, Default)]
pub struct FolderEvents {
    message_changed: Listeners<dyn MessageChangedListener>,
    message_count: Listeners<dyn MessageCountListener>,
    folder: Listeners<dyn FolderListener>,
}

impl FolderEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_message_changed_listener(
        &self,
        listener: Arc<dyn MessageChangedListener>,
    ) {
        self.message_changed.add(listener);
    }

    pub fn remove_message_changed_listener(
        &self,
        listener: &Arc<dyn MessageChangedListener>,
    ) -> bool {
        self.message_changed.remove(listener)
    }

    pub fn notify_message_changed(&self, event: &MessageChangedEvent) {
        let listeners = self.message_changed.snapshot();
        trace!(
            "Message changed: {:?} on {} message(s), {} listener(s)",
            event.flags,
            event.numbers.len(),
            listeners.len()
        );
        for listener in listeners {
            event.dispatch(&*listener);
        }
    }

    pub fn add_message_count_listener(
        &self,
        listener: Arc<dyn MessageCountListener>,
    ) {
        self.message_count.add(listener);
    }

    pub fn remove_message_count_listener(
        &self,
        listener: &Arc<dyn MessageCountListener>,
    ) -> bool {
        self.message_count.remove(listener)
    }

    pub fn notify_message_count(&self, event: &MessageCountEvent) {
        let listeners = self.message_count.snapshot();
        trace!(
            "Message count: {:?} {} message(s), {} listener(s)",
            event.kind,
            event.numbers.len(),
            listeners.len()
        );
        for listener in listeners {
            event.dispatch(&*listener);
        }
    }

    pub fn add_folder_listener(&self, listener: Arc<dyn FolderListener>) {
        self.folder.add(listener);
    }

    pub fn remove_folder_listener(
        &self,
        listener: &Arc<dyn FolderListener>,
    ) -> bool {
        self.folder.remove(listener)
    }

    pub fn notify_folder(&self, event: &FolderEvent) {
        let listeners = self.folder.snapshot();
        trace!(
            "Folder {:?}: {:?} -> {:?}, {} listener(s)",
            event.kind,
            event.old_path,
            event.new_path,
            listeners.len()
        );
        for listener in listeners {
            event.dispatch(&*listener);
        }
    }

    pub fn message_changed_listeners(
        &self,
    ) -> &Listeners<dyn MessageChangedListener> {
        &self.message_changed
    }

    pub fn message_count_listeners(
        &self,
    ) -> &Listeners<dyn MessageCountListener> {
        &self.message_count
    }

    pub fn folder_listeners(&self) -> &Listeners<dyn FolderListener> {
        &self.folder
    }
}

#[cfg(test)]
mod test {
    use std::sync::Weak;

    use super::*;

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Recorder {
        fn new(name: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Arc<Self> {
            Arc::new(Recorder {
                name,
                log: Arc::clone(log),
            })
        }

        fn record(&self, what: String) {
            self.log.lock().unwrap().push(format!("{} {}", self.name, what));
        }
    }

    impl MessageChangedListener for Recorder {
        fn message_changed(&self, event: &MessageChangedEvent) {
            self.record(format!("changed {:?}", event.numbers));
        }
    }

    impl MessageCountListener for Recorder {
        fn messages_added(&self, event: &MessageCountEvent) {
            self.record(format!("added {:?}", event.numbers));
        }

        fn messages_removed(&self, event: &MessageCountEvent) {
            self.record(format!("removed {:?}", event.numbers));
        }
    }

    impl FolderListener for Recorder {
        fn folder_created(&self, event: &FolderEvent) {
            self.record(format!("created {}", event.new_path));
        }

        fn folder_deleted(&self, event: &FolderEvent) {
            self.record(format!("deleted {}", event.old_path));
        }

        fn folder_renamed(&self, event: &FolderEvent) {
            self.record(format!(
                "renamed {} {}",
                event.old_path, event.new_path
            ));
        }
    }

    fn take(log: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
        std::mem::replace(&mut *log.lock().unwrap(), Vec::new())
    }

    #[test]
    fn dispatch_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = Recorder::new("a", &log);
        let b = Recorder::new("b", &log);
        let events = FolderEvents::new();

        events.add_message_count_listener(a.clone());
        events.add_message_count_listener(b.clone());
        events.add_folder_listener(b.clone());
        events.add_message_changed_listener(a.clone());

        events.notify_message_count(&MessageCountEvent::new(
            MessageCountKind::Added,
            vec![3, 4],
        ));
        events.notify_message_count(&MessageCountEvent::new(
            MessageCountKind::Removed,
            vec![1],
        ));
        events.notify_folder(&FolderEvent::created("INBOX/new"));
        events.notify_folder(&FolderEvent::renamed("INBOX/new", "Archive"));
        events.notify_folder(&FolderEvent::deleted("Archive"));
        events.notify_message_changed(&MessageChangedEvent::new(
            vec![2],
            MessageFlags::SEEN | MessageFlags::MARKED,
        ));

        assert_eq!(
            vec![
                "a added [3, 4]",
                "b added [3, 4]",
                "a removed [1]",
                "b removed [1]",
                "b created INBOX/new",
                "b renamed INBOX/new Archive",
                "b deleted Archive",
                "a changed [2]",
            ],
            take(&log)
        );
    }

    #[test]
    fn remove_actually_removes() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let a: Arc<dyn FolderListener> = Recorder::new("a", &log);
        let b: Arc<dyn FolderListener> = Recorder::new("b", &log);
        let events = FolderEvents::new();

        events.add_folder_listener(Arc::clone(&a));
        events.add_folder_listener(Arc::clone(&b));
        assert_eq!(2, events.folder_listeners().len());

        assert!(events.remove_folder_listener(&a));
        assert!(!events.remove_folder_listener(&a));
        assert_eq!(1, events.folder_listeners().len());

        events.notify_folder(&FolderEvent::created("x"));
        assert_eq!(vec!["b created x"], take(&log));
        assert!(events.message_changed_listeners().is_empty());
        assert!(events.message_count_listeners().is_empty());
    }

    struct Unsubscriber {
        events: Weak<FolderEvents>,
        victim: Arc<dyn MessageCountListener>,
    }

    impl MessageCountListener for Unsubscriber {
        fn messages_added(&self, _: &MessageCountEvent) {
            if let Some(events) = self.events.upgrade() {
                events.remove_message_count_listener(&self.victim);
            }
        }

        fn messages_removed(&self, _: &MessageCountEvent) {}
    }

    #[test]
    fn removal_during_dispatch_applies_to_next_notification() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let events = Arc::new(FolderEvents::new());
        let victim: Arc<dyn MessageCountListener> = Recorder::new("v", &log);

        events.add_message_count_listener(Arc::new(Unsubscriber {
            events: Arc::downgrade(&events),
            victim: Arc::clone(&victim),
        }));
        events.add_message_count_listener(Arc::clone(&victim));

        let added = MessageCountEvent::new(MessageCountKind::Added, vec![1]);
        events.notify_message_count(&added);
        assert_eq!(vec!["v added [1]"], take(&log));
        assert_eq!(1, events.message_count_listeners().len());

        events.notify_message_count(&added);
        assert!(take(&log).is_empty());
    }

    #[test]
    fn same_object_under_different_traits() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let recorder = Recorder::new("r", &log);
        let listeners = Listeners::<dyn FolderListener>::new();
        listeners.add(recorder.clone());
        listeners.add(recorder.clone());
        assert_eq!(2, listeners.snapshot().len());

        let as_listener: Arc<dyn FolderListener> = recorder;
        assert!(listeners.remove(&as_listener));
        assert!(listeners.is_empty());
    }
}
