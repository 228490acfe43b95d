//! Thread-safe waiting pool
//!
//! A single mutex guards enqueue, snapshot and removal. Every operation is
//! total: a poisoned lock is recovered rather than reported, since the
//! guarded `Vec` is never left half-updated by any operation here.

use crate::types::Participant;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Authoritative collection of participants not yet assigned to a team
#[derive(Debug, Default)]
pub struct WaitingPool {
    participants: Mutex<Vec<Participant>>,
}

impl WaitingPool {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Participant>> {
        self.participants
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a participant to the pool
    ///
    /// Returns `false` without modifying the pool when a participant with the
    /// same identity is already waiting.
    pub fn enqueue(&self, participant: Participant) -> bool {
        let mut participants = self.lock();

        if participants.iter().any(|p| p.id == participant.id) {
            debug!(
                "Ignoring duplicate enqueue for participant '{}'",
                participant.id
            );
            return false;
        }

        debug!(
            "Enqueued participant '{}' - skill: {}, latency: {}ms, pool size: {}",
            participant.id,
            participant.skill,
            participant.latency_ms,
            participants.len() + 1
        );
        participants.push(participant);
        true
    }

    /// Copy of every participant currently waiting, in insertion order
    pub fn snapshot(&self) -> Vec<Participant> {
        self.lock().clone()
    }

    /// Remove one participant by identity; no-op if absent
    pub fn remove(&self, participant_id: &str) -> bool {
        let mut participants = self.lock();
        match participants.iter().position(|p| p.id == participant_id) {
            Some(index) => {
                participants.remove(index);
                debug!("Removed participant '{}' from pool", participant_id);
                true
            }
            None => false,
        }
    }

    /// Remove exactly the given pool entries under one lock acquisition
    ///
    /// An entry is removed only when it is equal to one of `matched`, so a
    /// participant that left and re-joined after a snapshot was taken keeps
    /// its new entry. Returns how many participants were actually removed.
    pub fn remove_all<'a, I>(&self, matched: I) -> usize
    where
        I: IntoIterator<Item = &'a Participant>,
    {
        let matched: HashMap<&str, &Participant> =
            matched.into_iter().map(|p| (p.id.as_str(), p)).collect();
        if matched.is_empty() {
            return 0;
        }

        let mut participants = self.lock();
        let before = participants.len();
        participants.retain(|p| matched.get(p.id.as_str()) != Some(&p));
        let removed = before - participants.len();

        debug!(
            "Removed {} of {} requested participants, pool size: {}",
            removed,
            matched.len(),
            participants.len()
        );
        removed
    }

    pub fn contains(&self, participant_id: &str) -> bool {
        self.lock().iter().any(|p| p.id == participant_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
