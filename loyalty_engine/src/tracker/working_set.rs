use std::{collections::HashMap, time::Duration};

use tokio::time::Instant;

use crate::db_types::OrderNumber;

#[derive(Debug, Clone, Copy)]
struct Entry {
    /// Position in arrival order
    seq: u64,
    last_checked: Option<Instant>,
}

/// The orders the tracker is polling, with the time each was last checked.
///
/// Orders whose settlement can never be applied are set aside: they are no longer polled, re-scans do not bring them
/// back, and they are still reported as pending when the set is drained.
///
/// Owned by the tracker's task. Nothing outside the task can reach it.
#[derive(Debug, Default)]
pub struct WorkingSet {
    entries: HashMap<OrderNumber, Entry>,
    set_aside: HashMap<OrderNumber, u64>,
    next_seq: u64,
}

impl WorkingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking the order. New orders are due for a check immediately. Returns `false` if the order was already
    /// being tracked, in which case its schedule is left alone.
    pub fn track(&mut self, number: OrderNumber) -> bool {
        if self.entries.contains_key(&number) || self.set_aside.contains_key(&number) {
            return false;
        }
        self.entries.insert(number, Entry { seq: self.next_seq, last_checked: None });
        self.next_seq += 1;
        true
    }

    /// Stops tracking the order. Returns `false` if it was not tracked.
    pub fn retire(&mut self, number: &OrderNumber) -> bool {
        self.entries.remove(number).is_some()
    }

    /// Stops polling the order without forgetting it. Returns `false` if it was not tracked.
    pub fn set_aside(&mut self, number: &OrderNumber) -> bool {
        match self.entries.remove(number) {
            Some(entry) => {
                self.set_aside.insert(number.clone(), entry.seq);
                true
            },
            None => false,
        }
    }

    pub fn mark_checked(&mut self, number: &OrderNumber, at: Instant) {
        if let Some(entry) = self.entries.get_mut(number) {
            entry.last_checked = Some(at);
        }
    }

    /// Orders that have never been checked, or were last checked at least `recheck_interval` before `now`, in the
    /// order they started being tracked.
    pub fn due(&self, now: Instant, recheck_interval: Duration) -> Vec<OrderNumber> {
        let mut due = self
            .entries
            .iter()
            .filter(|(_, e)| match e.last_checked {
                None => true,
                Some(t) => now.saturating_duration_since(t) >= recheck_interval,
            })
            .map(|(n, e)| (e.seq, n.clone()))
            .collect::<Vec<_>>();
        due.sort_unstable_by_key(|(seq, _)| *seq);
        due.into_iter().map(|(_, n)| n).collect()
    }

    pub fn contains(&self, number: &OrderNumber) -> bool {
        self.entries.contains_key(number)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Empties the set, returning the tracked and set-aside orders in arrival order.
    pub fn drain(&mut self) -> Vec<OrderNumber> {
        let mut all = self
            .entries
            .drain()
            .map(|(n, e)| (e.seq, n))
            .chain(self.set_aside.drain().map(|(n, seq)| (seq, n)))
            .collect::<Vec<_>>();
        all.sort_unstable_by_key(|(seq, _)| *seq);
        all.into_iter().map(|(_, n)| n).collect()
    }
}
