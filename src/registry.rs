// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The in-memory subscriber session registry.
//!
//! Holds every active session plus the two shutdown flags behind a single
//! [`std::sync::Mutex`]. The mutex (not a sharded map) is load-bearing: the
//! ordering invariant in spec §3/§5 requires that the audit record for a
//! transition is written while the registry lock is still held, so that an
//! external reader of the audit log never observes a `create`/`delete` line
//! before the corresponding registry state is visible to a concurrent
//! `/check_subscriber` query. A sharded map (e.g. `dashmap`) cannot give a
//! caller a single lock spanning both the mutation and an unrelated I/O
//! write.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
    time::{Duration, Instant},
};

use tokio::sync::Notify;

/// A single subscriber session: the moment it was accepted, on the
/// monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct Session {
    pub created_at: Instant,
}

/// Outcome of [`Registry::insert_if_absent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyPresent,
}

struct Inner {
    sessions: HashMap<String, Session>,
    shutting_down: bool,
    drain_complete: bool,
}

/// Shared session registry plus the static denial set and shutdown
/// signaling.
///
/// `denylist` is populated once at startup and never mutated again, so per
/// spec §9 it needs no synchronization of its own; it's read directly
/// through a shared reference.
pub struct Registry {
    inner: Mutex<Inner>,
    denylist: HashSet<String>,
    drain_notify: Notify,
}

impl Registry {
    /// Builds an empty registry with the given (immutable) denial set.
    pub fn new(denylist: impl IntoIterator<Item = String>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                sessions: HashMap::new(),
                shutting_down: false,
                drain_complete: false,
            }),
            denylist: denylist.into_iter().collect(),
            drain_notify: Notify::new(),
        }
    }

    /// Whether `identity` is on the static denial list.
    pub fn is_denied(&self, identity: &str) -> bool {
        self.denylist.contains(identity)
    }

    /// Whether `identity` currently has an active session.
    pub fn contains(&self, identity: &str) -> bool {
        let guard = self.inner.lock().expect("registry mutex poisoned");
        guard.sessions.contains_key(identity)
    }

    /// Number of active sessions.
    pub fn size(&self) -> usize {
        let guard = self.inner.lock().expect("registry mutex poisoned");
        guard.sessions.len()
    }

    /// Atomically inserts `identity` with creation time `now` unless it is
    /// already present, in which case nothing changes.
    ///
    /// `on_create` runs while the registry lock is still held, guaranteeing
    /// that a concurrent reader never sees the success reply implied by the
    /// caller before the audit record lands. Must not itself block on the
    /// registry lock.
    pub fn insert_if_absent(
        &self,
        identity: &str,
        now: Instant,
        on_create: impl FnOnce(),
    ) -> InsertOutcome {
        let mut guard = self.inner.lock().expect("registry mutex poisoned");
        if guard.sessions.contains_key(identity) {
            return InsertOutcome::AlreadyPresent;
        }
        guard
            .sessions
            .insert(identity.to_string(), Session { created_at: now });
        on_create();
        InsertOutcome::Inserted
    }

    /// Re-stamps an already-present session's creation time (used by the
    /// `Refresh` duplicate policy) and runs `on_renew` under the same lock.
    /// Returns `false` if the identity has no active session.
    pub fn renew(&self, identity: &str, now: Instant, on_renew: impl FnOnce()) -> bool {
        let mut guard = self.inner.lock().expect("registry mutex poisoned");
        match guard.sessions.get_mut(identity) {
            Some(session) => {
                session.created_at = now;
                on_renew();
                true
            },
            None => false,
        }
    }

    /// Removes `identity` if present, running `on_erase` under the same
    /// lock. Returns `true` if a session was removed.
    pub fn erase(&self, identity: &str, on_erase: impl FnOnce()) -> bool {
        let mut guard = self.inner.lock().expect("registry mutex poisoned");
        if guard.sessions.remove(identity).is_some() {
            on_erase();
            true
        } else {
            false
        }
    }

    /// Returns every identity whose session age exceeds `timeout`, without
    /// removing them (snapshot-then-remove is safe because the reaper is
    /// the sole deleter outside drain).
    pub fn snapshot_expired(&self, now: Instant, timeout: Duration) -> Vec<String> {
        let guard = self.inner.lock().expect("registry mutex poisoned");
        guard
            .sessions
            .iter()
            .filter(|(_, session)| now.saturating_duration_since(session.created_at) > timeout)
            .map(|(identity, _)| identity.clone())
            .collect()
    }

    /// Removes and returns up to `n` identities, in arbitrary (iteration)
    /// order, running `on_remove` for each one while the lock is still
    /// held. Used only during drain.
    pub fn take_up_to(&self, n: usize, mut on_remove: impl FnMut(&str)) -> Vec<String> {
        let mut guard = self.inner.lock().expect("registry mutex poisoned");
        let victims: Vec<String> = guard.sessions.keys().take(n).cloned().collect();
        for identity in &victims {
            guard.sessions.remove(identity);
            on_remove(identity);
        }
        victims
    }

    /// Marks the registry as shutting down. Idempotent.
    pub fn begin_shutdown(&self) {
        let mut guard = self.inner.lock().expect("registry mutex poisoned");
        guard.shutting_down = true;
    }

    /// Whether shutdown has been requested.
    pub fn is_shutting_down(&self) -> bool {
        let guard = self.inner.lock().expect("registry mutex poisoned");
        guard.shutting_down
    }

    /// Marks drain as complete and wakes anyone waiting in
    /// [`Registry::wait_drain_complete`]. Idempotent.
    pub fn mark_drain_complete(&self) {
        {
            let mut guard = self.inner.lock().expect("registry mutex poisoned");
            guard.drain_complete = true;
        }
        self.drain_notify.notify_waiters();
    }

    /// Whether drain has completed.
    pub fn is_drain_complete(&self) -> bool {
        let guard = self.inner.lock().expect("registry mutex poisoned");
        guard.drain_complete
    }

    /// Waits until [`Registry::mark_drain_complete`] has been called.
    pub async fn wait_drain_complete(&self) {
        loop {
            if self.is_drain_complete() {
                return;
            }
            let notified = self.drain_notify.notified();
            if self.is_drain_complete() {
                return;
            }
            notified.await;
        }
    }
}
