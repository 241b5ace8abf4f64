// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Subscriber lists for resize notifications.
//!
//! [`Listeners`] holds boxed callbacks and calls them in subscription order on
//! [`post`](Listeners::post). The viewport and the stage each own one.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

/// Handle returned by [`Listeners::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u32);

/// An ordered list of callbacks for events of type `E`.
pub struct Listeners<E> {
    next: u32,
    entries: Vec<(ListenerId, Box<dyn FnMut(&E)>)>,
}

impl<E> fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Listeners<E> {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next: 0,
            entries: Vec::new(),
        }
    }

    /// Adds `callback` to the end of the list.
    pub fn subscribe(&mut self, callback: impl FnMut(&E) + 'static) -> ListenerId {
        let id = ListenerId(self.next);
        self.next = self.next.wrapping_add(1);
        self.entries.push((id, Box::new(callback)));
        id
    }

    /// Removes a callback. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    /// Calls every callback with `event`.
    pub fn post(&mut self, event: &E) {
        for (_, callback) in &mut self.entries {
            callback(event);
        }
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nobody is subscribed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
