//! Ready-set containers shared by the schedulers.

use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::Pid;

/// FIFO of ready processes, used by round robin.
///
/// A pid is never queued twice.
#[derive(Debug, Default)]
pub struct ReadyQueue {
    queue: VecDeque<Pid>,
}

impl ReadyQueue {
    pub fn new() -> Self {
        ReadyQueue {
            queue: VecDeque::new(),
        }
    }

    /// Appends `pid` to the tail. Returns `false` if it was already queued.
    pub fn push_back(&mut self, pid: Pid) -> bool {
        if self.queue.contains(&pid) {
            return false;
        }
        self.queue.push_back(pid);
        true
    }

    pub fn pop_front(&mut self) -> Option<Pid> {
        self.queue.pop_front()
    }

    pub fn front(&self) -> Option<Pid> {
        self.queue.front().copied()
    }

    pub fn remove(&mut self, pid: Pid) -> bool {
        match self.queue.iter().position(|queued| *queued == pid) {
            Some(index) => self.queue.remove(index).is_some(),
            None => false,
        }
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.queue.contains(&pid)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Pid> + '_ {
        self.queue.iter().copied()
    }
}

/// Ready processes ordered by a policy key, smallest first.
///
/// Entries with equal keys come out in insertion order. Every insert takes a
/// fresh sequence number, so a process that is removed and inserted again
/// goes behind the processes that were already waiting with the same key.
#[derive(Debug)]
pub struct ReadySet<K> {
    order: BTreeMap<(K, u64), Pid>,
    index: HashMap<Pid, (K, u64)>,
    sequence: u64,
}

impl<K: Ord + Copy> ReadySet<K> {
    pub fn new() -> Self {
        ReadySet {
            order: BTreeMap::new(),
            index: HashMap::new(),
            sequence: 0,
        }
    }

    /// Inserts `pid` with `key`. Returns `false`, leaving the set untouched,
    /// if `pid` is already present.
    pub fn insert(&mut self, pid: Pid, key: K) -> bool {
        if self.index.contains_key(&pid) {
            return false;
        }
        let slot = (key, self.sequence);
        self.sequence += 1;
        self.order.insert(slot, pid);
        self.index.insert(pid, slot);
        true
    }

    /// Removes `pid` and returns the key it was stored with.
    pub fn remove(&mut self, pid: Pid) -> Option<K> {
        let slot = self.index.remove(&pid)?;
        self.order.remove(&slot);
        Some(slot.0)
    }

    /// Moves `pid` to the position of `key`, inserting it if it is absent.
    pub fn reposition(&mut self, pid: Pid, key: K) {
        self.remove(pid);
        self.insert(pid, key);
    }

    /// Returns the entry with the smallest key.
    pub fn first(&self) -> Option<(Pid, K)> {
        self.order
            .iter()
            .next()
            .map(|((key, _), pid)| (*pid, *key))
    }

    pub fn key(&self, pid: Pid) -> Option<K> {
        self.index.get(&pid).map(|slot| slot.0)
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.index.contains_key(&pid)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Iterates the set in scheduling order.
    pub fn iter(&self) -> impl Iterator<Item = (Pid, K)> + '_ {
        self.order.iter().map(|((key, _), pid)| (*pid, *key))
    }
}

impl<K: Ord + Copy> Default for ReadySet<K> {
    fn default() -> Self {
        Self::new()
    }
}
