//! Ordered child storage
//!
//! An id-keyed map with a doubly linked list threaded through its entries.
//! The map gives O(1) membership and removal by id, the links keep
//! document order without shifting a Vec on every removal.
//!
//! ```text
//! entries: { #3: (None, #7), #7: (#3, #5), #5: (#7, None) }
//!            head ─────────────────────────────── tail
//! ```

use crate::types::NodeId;
use ahash::AHashMap;

/// Link record of one child inside its parent's collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChildEntry {
    pub(crate) prev: Option<NodeId>,
    pub(crate) next: Option<NodeId>,
}

impl ChildEntry {
    pub fn prev(&self) -> Option<NodeId> {
        self.prev
    }

    pub fn next(&self) -> Option<NodeId> {
        self.next
    }
}

/// Direct children of a node, in insertion order
///
/// `head` and `tail` are cached endpoints; they always name the single entry
/// with no `prev` and the single entry with no `next`.
#[derive(Debug, Clone, Default)]
pub struct ChildCollection {
    entries: AHashMap<NodeId, ChildEntry>,
    head: Option<NodeId>,
    tail: Option<NodeId>,
}

impl ChildCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&ChildEntry> {
        self.entries.get(&id)
    }

    pub fn first(&self) -> Option<NodeId> {
        self.head
    }

    pub fn last(&self) -> Option<NodeId> {
        self.tail
    }

    /// Append `id` at the tail. Returns false, untouched, if already present.
    pub fn push_back(&mut self, id: NodeId) -> bool {
        if self.entries.contains_key(&id) {
            return false;
        }

        let entry = ChildEntry {
            prev: self.tail,
            next: None,
        };

        match self.tail.and_then(|tail| self.entries.get_mut(&tail)) {
            Some(old_tail) => old_tail.next = Some(id),
            None => self.head = Some(id),
        }

        self.entries.insert(id, entry);
        self.tail = Some(id);
        true
    }

    /// Splice `id` out of the list in O(1). Absent ids are ignored.
    pub fn remove(&mut self, id: NodeId) -> Option<ChildEntry> {
        let entry = self.entries.remove(&id)?;

        match entry.prev.and_then(|prev| self.entries.get_mut(&prev)) {
            Some(prev) => prev.next = entry.next,
            None => self.head = entry.next,
        }

        match entry.next.and_then(|next| self.entries.get_mut(&next)) {
            Some(next) => next.prev = entry.prev,
            None => self.tail = entry.prev,
        }

        Some(entry)
    }

    /// `None` if `id` is not a member, `Some(None)` if it is the tail.
    pub fn next_of(&self, id: NodeId) -> Option<Option<NodeId>> {
        self.entries.get(&id).map(|entry| entry.next)
    }

    /// `None` if `id` is not a member, `Some(None)` if it is the head.
    pub fn prev_of(&self, id: NodeId) -> Option<Option<NodeId>> {
        self.entries.get(&id).map(|entry| entry.prev)
    }

    /// Children in document order
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            entries: &self.entries,
            cursor: self.head,
            remaining: self.entries.len(),
            forward: true,
        }
    }

    /// Children in reverse document order
    pub fn iter_rev(&self) -> Iter<'_> {
        Iter {
            entries: &self.entries,
            cursor: self.tail,
            remaining: self.entries.len(),
            forward: false,
        }
    }

    /// Check the list invariants: one head, one tail, both walks cover
    /// every entry exactly once and agree with each other.
    pub fn is_consistent(&self) -> bool {
        if self.entries.is_empty() {
            return self.head.is_none() && self.tail.is_none();
        }

        let heads = self.entries.values().filter(|e| e.prev.is_none()).count();
        let tails = self.entries.values().filter(|e| e.next.is_none()).count();
        if heads != 1 || tails != 1 {
            return false;
        }

        let head_ok = self
            .head
            .and_then(|h| self.entries.get(&h))
            .is_some_and(|e| e.prev.is_none());
        let tail_ok = self
            .tail
            .and_then(|t| self.entries.get(&t))
            .is_some_and(|e| e.next.is_none());
        if !head_ok || !tail_ok {
            return false;
        }

        // Every forward link must be mirrored by a backward link.
        for (&id, entry) in &self.entries {
            if let Some(next) = entry.next {
                match self.entries.get(&next) {
                    Some(n) if n.prev == Some(id) => {}
                    _ => return false,
                }
            }
        }

        let forward: Vec<NodeId> = self.iter().collect();
        let mut backward: Vec<NodeId> = self.iter_rev().collect();
        backward.reverse();

        forward.len() == self.entries.len()
            && forward == backward
            && forward.last() == self.tail.as_ref()
    }
}

/// Link-walking iterator over a [`ChildCollection`]
pub struct Iter<'a> {
    entries: &'a AHashMap<NodeId, ChildEntry>,
    cursor: Option<NodeId>,
    remaining: usize,
    forward: bool,
}

impl Iterator for Iter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        // `remaining` bounds the walk even if the links were corrupted into a loop
        if self.remaining == 0 {
            return None;
        }
        let id = self.cursor?;
        let entry = self.entries.get(&id)?;
        self.cursor = if self.forward { entry.next } else { entry.prev };
        self.remaining -= 1;
        Some(id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

impl<'a> IntoIterator for &'a ChildCollection {
    type Item = NodeId;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u32]) -> Vec<NodeId> {
        raw.iter().map(|&i| NodeId::new(i)).collect()
    }

    fn collection(raw: &[u32]) -> ChildCollection {
        let mut children = ChildCollection::new();
        for id in ids(raw) {
            assert!(children.push_back(id));
        }
        children
    }

    #[test]
    fn test_push_back_keeps_order() {
        let children = collection(&[3, 7, 5]);

        assert_eq!(children.len(), 3);
        assert_eq!(children.first(), Some(NodeId::new(3)));
        assert_eq!(children.last(), Some(NodeId::new(5)));
        assert_eq!(children.iter().collect::<Vec<_>>(), ids(&[3, 7, 5]));
        assert_eq!(children.iter_rev().collect::<Vec<_>>(), ids(&[5, 7, 3]));
        assert!(children.is_consistent());
    }

    #[test]
    fn test_push_back_duplicate_is_noop() {
        let mut children = collection(&[1, 2, 3]);

        assert!(!children.push_back(NodeId::new(1)));
        assert_eq!(children.len(), 3);
        assert_eq!(children.iter().collect::<Vec<_>>(), ids(&[1, 2, 3]));
    }

    #[test]
    fn test_remove_middle_head_tail() {
        let mut children = collection(&[1, 2, 3, 4]);

        let removed = children.remove(NodeId::new(2)).unwrap();
        assert_eq!(removed.prev(), Some(NodeId::new(1)));
        assert_eq!(removed.next(), Some(NodeId::new(3)));
        assert_eq!(children.next_of(NodeId::new(1)), Some(Some(NodeId::new(3))));
        assert_eq!(children.prev_of(NodeId::new(3)), Some(Some(NodeId::new(1))));

        children.remove(NodeId::new(1));
        assert_eq!(children.first(), Some(NodeId::new(3)));

        children.remove(NodeId::new(4));
        assert_eq!(children.last(), Some(NodeId::new(3)));
        assert_eq!(children.iter().collect::<Vec<_>>(), ids(&[3]));
        assert!(children.is_consistent());

        children.remove(NodeId::new(3));
        assert!(children.is_empty());
        assert_eq!(children.first(), None);
        assert_eq!(children.last(), None);
        assert!(children.is_consistent());
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut children = collection(&[1, 2]);
        assert!(children.remove(NodeId::new(9)).is_none());
        assert_eq!(children.iter().collect::<Vec<_>>(), ids(&[1, 2]));
    }

    #[test]
    fn test_boundaries_are_distinct_from_missing() {
        let children = collection(&[1, 2]);

        assert_eq!(children.prev_of(NodeId::new(1)), Some(None));
        assert_eq!(children.next_of(NodeId::new(2)), Some(None));
        assert_eq!(children.next_of(NodeId::new(5)), None);
    }

    #[test]
    fn test_reappend_after_remove_goes_to_tail() {
        let mut children = collection(&[1, 2, 3]);
        children.remove(NodeId::new(1));
        assert!(children.push_back(NodeId::new(1)));
        assert_eq!(children.iter().collect::<Vec<_>>(), ids(&[2, 3, 1]));
        assert!(children.is_consistent());
    }

    #[test]
    fn test_random_mutations_stay_consistent() {
        let mut children = ChildCollection::new();
        let mut mirror: Vec<NodeId> = Vec::new();
        let mut seed: u32 = 0x2545_f491;

        for _ in 0..2000 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let id = NodeId::new((seed >> 16) % 32);

            if (seed >> 8) & 1 == 0 {
                let added = children.push_back(id);
                assert_eq!(added, !mirror.contains(&id));
                if added {
                    mirror.push(id);
                }
            } else {
                let removed = children.remove(id).is_some();
                assert_eq!(removed, mirror.contains(&id));
                mirror.retain(|&m| m != id);
            }

            assert!(children.is_consistent());
        }

        assert_eq!(children.iter().collect::<Vec<_>>(), mirror);
    }
}
