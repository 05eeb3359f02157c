//! Observable Arrays
//!
//! The node array and the edge array of a graph dataset are mutated by the
//! user at arbitrary times. Every structural mutation has to be mirrored into
//! the controller's positional caches before the call returns, so the arrays
//! are wrapped in an [`ObservableVec`] that reports each mutation to an
//! [`ArrayListener`].
//!
//! # How Observation Works
//!
//! 1. The owner attaches itself with [`ObservableVec::listen`] and keeps the
//!    returned [`ListenerId`].
//!
//! 2. Mutations go through [`ObservableVec::observe`], which pairs the array
//!    with a listener value and returns an [`Observed`] handle.
//!
//! 3. The handle performs the mutation and then invokes the matching
//!    callback, passing the array as it is after the change.
//!
//! 4. [`ObservableVec::unlisten`] detaches the owner. Mutations made through
//!    a handle carrying a detached id still change the array but notify
//!    nobody.
//!
//! Notification is synchronous: there is no event queue, and a callback
//! observes the array exactly as the mutation left it.

use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Deserializer};

/// Unique identifier for an array listener attachment.
///
/// Ids come from a process-wide counter, so an id issued for one array
/// never matches an attachment on another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Generate a new unique listener ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

/// Callbacks for the five structural mutations of an ordered collection.
///
/// Every callback receives `array`, the collection after the mutation.
pub trait ArrayListener<T> {
    /// `count` items were appended, starting at `start`.
    fn on_push(&mut self, array: &[T], start: usize, count: usize);

    /// The last item was removed.
    fn on_pop(&mut self, array: &[T]);

    /// The first item was removed.
    fn on_shift(&mut self, array: &[T]);

    /// `removed` items were removed at `start` and `inserted` items were
    /// inserted in their place.
    fn on_splice(&mut self, array: &[T], start: usize, removed: usize, inserted: usize);

    /// `count` items were inserted at the front.
    fn on_unshift(&mut self, array: &[T], count: usize);
}

/// A vector whose structural mutations are reported to an attached listener.
///
/// Read access goes through `Deref<Target = [T]>`. Write access goes through
/// [`observe`](Self::observe).
pub struct ObservableVec<T> {
    items: Vec<T>,
    listener: Option<ListenerId>,
}

impl<T> ObservableVec<T> {
    /// Create an empty, unobserved array.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            listener: None,
        }
    }

    /// Attach a listener, replacing any previous attachment.
    pub fn listen(&mut self) -> ListenerId {
        let id = ListenerId::new();
        if let Some(previous) = self.listener.replace(id) {
            tracing::debug!(?previous, ?id, "replaced array listener");
        }
        id
    }

    /// Detach the listener with the given id.
    ///
    /// Returns `false` if `id` was not attached.
    pub fn unlisten(&mut self, id: ListenerId) -> bool {
        if self.listener == Some(id) {
            self.listener = None;
            true
        } else {
            false
        }
    }

    /// Whether `id` is the attached listener.
    pub fn is_listened_by(&self, id: ListenerId) -> bool {
        self.listener == Some(id)
    }

    /// Begin a mutation on behalf of listener `id`.
    ///
    /// `listener` is notified only while `id` is attached.
    pub fn observe<L>(&mut self, id: ListenerId, listener: L) -> Observed<'_, T, L>
    where
        L: ArrayListener<T>,
    {
        let notify = self.is_listened_by(id);
        Observed {
            items: &mut self.items,
            listener,
            notify,
        }
    }

    /// Borrow the items as a slice.
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<T> Default for ObservableVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<Vec<T>> for ObservableVec<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            items,
            listener: None,
        }
    }
}

impl<T> FromIterator<T> for ObservableVec<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl<T> Deref for ObservableVec<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableVec")
            .field("items", &self.items)
            .field("listener", &self.listener)
            .finish()
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for ObservableVec<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<T>::deserialize(deserializer).map(Self::from)
    }
}

/// A mutation handle pairing an array with the listener to notify.
pub struct Observed<'a, T, L: ArrayListener<T>> {
    items: &'a mut Vec<T>,
    listener: L,
    notify: bool,
}

impl<'a, T, L: ArrayListener<T>> Observed<'a, T, L> {
    /// Append one item.
    pub fn push(&mut self, item: T) {
        self.extend(std::iter::once(item));
    }

    /// Append several items as one mutation.
    pub fn extend<I: IntoIterator<Item = T>>(&mut self, items: I) {
        let start = self.items.len();
        self.items.extend(items);
        let count = self.items.len() - start;
        if self.notify && count > 0 {
            self.listener.on_push(&self.items[..], start, count);
        }
    }

    /// Remove the last item. Popping an empty array notifies nobody.
    pub fn pop(&mut self) -> Option<T> {
        let item = self.items.pop()?;
        if self.notify {
            self.listener.on_pop(&self.items[..]);
        }
        Some(item)
    }

    /// Remove the first item. Shifting an empty array notifies nobody.
    pub fn shift(&mut self) -> Option<T> {
        if self.items.is_empty() {
            return None;
        }
        let item = self.items.remove(0);
        if self.notify {
            self.listener.on_shift(&self.items[..]);
        }
        Some(item)
    }

    /// Remove `count` items at `start` and insert `items` there.
    ///
    /// The range is clamped to the array.
    /// Returns the removed items.
    pub fn splice<I: IntoIterator<Item = T>>(&mut self, start: usize, count: usize, items: I) -> Vec<T> {
        let start = start.min(self.items.len());
        let end = start.saturating_add(count).min(self.items.len());
        let before = self.items.len();
        let removed: Vec<T> = self.items.splice(start..end, items).collect();
        let inserted = self.items.len() + removed.len() - before;
        if self.notify && (!removed.is_empty() || inserted > 0) {
            self.listener.on_splice(&self.items[..], start, removed.len(), inserted);
        }
        removed
    }

    /// Insert items at the front, keeping their order.
    pub fn unshift<I: IntoIterator<Item = T>>(&mut self, items: I) {
        let before = self.items.len();
        self.items.splice(0..0, items);
        let count = self.items.len() - before;
        if self.notify && count > 0 {
            self.listener.on_unshift(&self.items[..], count);
        }
    }

    /// The array as it currently is.
    pub fn as_slice(&self) -> &[T] {
        &self.items[..]
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Event {
        Push(usize, usize),
        Pop,
        Shift,
        Splice(usize, usize, usize),
        Unshift(usize),
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<Event>,
        lengths: Vec<usize>,
    }

    impl ArrayListener<i32> for &mut Recorder {
        fn on_push(&mut self, array: &[i32], start: usize, count: usize) {
            self.events.push(Event::Push(start, count));
            self.lengths.push(array.len());
        }

        fn on_pop(&mut self, array: &[i32]) {
            self.events.push(Event::Pop);
            self.lengths.push(array.len());
        }

        fn on_shift(&mut self, array: &[i32]) {
            self.events.push(Event::Shift);
            self.lengths.push(array.len());
        }

        fn on_splice(&mut self, array: &[i32], start: usize, removed: usize, inserted: usize) {
            self.events.push(Event::Splice(start, removed, inserted));
            self.lengths.push(array.len());
        }

        fn on_unshift(&mut self, array: &[i32], count: usize) {
            self.events.push(Event::Unshift(count));
            self.lengths.push(array.len());
        }
    }

    #[test]
    fn listener_ids_are_unique() {
        assert_ne!(ListenerId::new(), ListenerId::new());
    }

    #[test]
    fn mutations_notify_after_change() {
        let mut vec = ObservableVec::from(vec![1, 2, 3]);
        let id = vec.listen();
        let mut recorder = Recorder::default();

        {
            let mut handle = vec.observe(id, &mut recorder);
            handle.extend([4, 5]);
            handle.pop();
            handle.shift();
            handle.unshift([0]);
        }

        assert_eq!(
            recorder.events,
            vec![Event::Push(3, 2), Event::Pop, Event::Shift, Event::Unshift(1)]
        );
        assert_eq!(recorder.lengths, vec![5, 4, 3, 4]);
        assert_eq!(vec.as_slice(), &[0, 2, 3, 4]);
    }

    #[test]
    fn splice_is_clamped() {
        let mut vec = ObservableVec::from(vec![1, 2, 3]);
        let id = vec.listen();
        let mut recorder = Recorder::default();

        let removed = vec.observe(id, &mut recorder).splice(2, 10, [7, 8]);

        assert_eq!(removed, vec![3]);
        assert_eq!(recorder.events, vec![Event::Splice(2, 1, 2)]);
        assert_eq!(vec.as_slice(), &[1, 2, 7, 8]);
    }

    #[test]
    fn empty_removals_do_not_notify() {
        let mut vec: ObservableVec<i32> = ObservableVec::new();
        let id = vec.listen();
        let mut recorder = Recorder::default();

        {
            let mut handle = vec.observe(id, &mut recorder);
            assert_eq!(handle.pop(), None);
            assert_eq!(handle.shift(), None);
            handle.splice(0, 3, []);
        }

        assert!(recorder.events.is_empty());
    }

    #[test]
    fn detached_listener_is_not_notified() {
        let mut vec = ObservableVec::from(vec![1]);
        let id = vec.listen();
        assert!(vec.unlisten(id));
        assert!(!vec.unlisten(id));

        let mut recorder = Recorder::default();
        vec.observe(id, &mut recorder).push(2);

        assert!(recorder.events.is_empty());
        assert_eq!(vec.len(), 2);
    }

    #[test]
    fn listen_replaces_previous_attachment() {
        let mut vec: ObservableVec<i32> = ObservableVec::new();
        let first = vec.listen();
        let second = vec.listen();

        assert!(!vec.is_listened_by(first));
        assert!(vec.is_listened_by(second));
    }
}
