use std::{
    fmt,
    sync::{Arc, PoisonError, RwLock},
};

use crate::models::Note;

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

pub type NotesCallback = Box<dyn Fn(&[Note]) + Send + Sync>;

#[derive(Debug, Default)]
struct Published {
    notes: Arc<[Note]>,
    revision: u64,
}

/// Read-only view of the repository's current note list.
///
/// Clones share state with the repository. Each snapshot is immutable; a
/// mutation publishes a new one and bumps the revision.
#[derive(Debug, Clone, Default)]
pub struct NotesView {
    inner: Arc<RwLock<Published>>,
}

impl NotesView {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn snapshot(&self) -> Arc<[Note]> {
        let published = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&published.notes)
    }

    /// Number of lists published so far
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .revision
    }

    pub(crate) fn publish(&self, notes: Arc<[Note]>) -> u64 {
        let mut published = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        published.notes = notes;
        published.revision += 1;
        published.revision
    }
}

/// Callbacks run after each publish
#[derive(Default)]
pub(crate) struct Observers {
    next_id: u64,
    callbacks: Vec<(SubscriptionId, NotesCallback)>,
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("count", &self.callbacks.len())
            .finish_non_exhaustive()
    }
}

impl Observers {
    pub(crate) fn add(&mut self, callback: NotesCallback) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.callbacks.push((id, callback));
        id
    }

    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(existing, _)| *existing != id);
        self.callbacks.len() != before
    }

    pub(crate) fn notify(&self, notes: &[Note]) {
        for (_, callback) in &self.callbacks {
            callback(notes);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;
    use crate::models::{CommonFields, NoteType, TypeFields};

    fn note(id: &str) -> Note {
        Note {
            id: id.to_string(),
            common: CommonFields::new(NoteType::Text, "c"),
            content: String::new(),
            file_path: format!("/n/{id}.evry"),
            type_fields: TypeFields::Text,
        }
    }

    #[test]
    fn test_publish_replaces_snapshot() {
        let view = NotesView::new();
        let reader = view.clone();
        assert!(reader.snapshot().is_empty());
        assert_eq!(reader.revision(), 0);

        let before = reader.snapshot();
        view.publish(vec![note("a")].into());

        assert!(before.is_empty());
        assert_eq!(reader.snapshot().len(), 1);
        assert_eq!(reader.revision(), 1);
    }

    #[test]
    fn test_observers_add_notify_remove() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut observers = Observers::default();
        let counter = Arc::clone(&calls);
        let id = observers.add(Box::new(move |notes| {
            counter.fetch_add(notes.len(), Ordering::SeqCst);
        }));

        observers.notify(&[note("a"), note("b")]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        assert!(observers.remove(id));
        assert!(!observers.remove(id));
        observers.notify(&[note("a")]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
