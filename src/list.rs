//! Index-linked lists over a shared node arena.
//!
//! A LIRS segment threads every entry through up to two lists at once: the
//! recency stack and one of the two cold queues. Instead of raw pointers, all
//! entries of a segment live in an [`Arena`] and lists link them by [`NodeId`].
//! A node carries one [`Link`] slot per [`Chain`], so the same node can sit in
//! the stack and in a queue simultaneously.
//!
//! ```text
//!   Arena slots:   [0: a] [1: b] [2: --] [3: c]        free list: [2]
//!
//!   stack:  head ──▶ c ──▶ a ──▶ b ◀── tail
//!   queue:  head ──▶ b ◀── tail
//! ```
//!
//! Node ids stay valid until the node is removed from the arena, after which
//! the slot is recycled. Lists never own nodes; callers unlink a node from
//! every list before removing it from the arena.

extern crate alloc;

use alloc::vec::Vec;
use core::fmt;
use core::ops::{Index, IndexMut};

/// Stable handle to a node stored in an [`Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

impl NodeId {
    #[cfg(test)]
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// Slot-recycling storage for list nodes.
pub(crate) struct Arena<T> {
    slots: Vec<Option<T>>,
    free: Vec<usize>,
    len: usize,
}

impl<T> Arena<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Arena {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            len: 0,
        }
    }

    pub(crate) fn insert(&mut self, value: T) -> NodeId {
        self.len += 1;
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(value);
                NodeId(slot)
            }
            None => {
                self.slots.push(Some(value));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    /// Removes a node, returning it. Returns `None` for a vacant slot.
    pub(crate) fn remove(&mut self, id: NodeId) -> Option<T> {
        let value = self.slots.get_mut(id.0)?.take()?;
        self.free.push(id.0);
        self.len -= 1;
        Some(value)
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&T> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }
}

impl<T> Index<NodeId> for Arena<T> {
    type Output = T;

    fn index(&self, id: NodeId) -> &T {
        match self.slots.get(id.0) {
            Some(Some(node)) => node,
            _ => panic!("stale node id {}", id.0),
        }
    }
}

impl<T> IndexMut<NodeId> for Arena<T> {
    fn index_mut(&mut self, id: NodeId) -> &mut T {
        match self.slots.get_mut(id.0) {
            Some(Some(node)) => node,
            _ => panic!("stale node id {}", id.0),
        }
    }
}

impl<T> fmt::Debug for Arena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("len", &self.len)
            .field("slots", &self.slots.len())
            .field("free", &self.free.len())
            .finish()
    }
}

/// Which of a node's link slots a list threads through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Chain {
    Stack,
    Queue,
}

/// Neighbours of a node within one list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Link {
    pub(crate) prev: Option<NodeId>,
    pub(crate) next: Option<NodeId>,
}

/// A node that can be threaded through lists of every [`Chain`].
///
/// `None` in a slot means the node is not linked into any list of that chain.
pub(crate) trait Linked {
    fn link(&self, chain: Chain) -> Option<Link>;
    fn link_mut(&mut self, chain: Chain) -> &mut Option<Link>;
}

/// Doubly linked list of arena nodes; head is the most recent end.
#[derive(Debug, Clone, Copy)]
pub(crate) struct List {
    chain: Chain,
    head: Option<NodeId>,
    tail: Option<NodeId>,
    len: usize,
}

impl List {
    pub(crate) const fn new(chain: Chain) -> Self {
        List {
            chain,
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn front(&self) -> Option<NodeId> {
        self.head
    }

    pub(crate) fn back(&self) -> Option<NodeId> {
        self.tail
    }

    pub(crate) fn push_front<T: Linked>(&mut self, arena: &mut Arena<T>, id: NodeId) {
        debug_assert!(arena[id].link(self.chain).is_none(), "node already linked");
        *arena[id].link_mut(self.chain) = Some(Link {
            prev: None,
            next: self.head,
        });
        match self.head {
            Some(head) => set_prev(arena, self.chain, head, Some(id)),
            None => self.tail = Some(id),
        }
        self.head = Some(id);
        self.len += 1;
    }

    pub(crate) fn push_back<T: Linked>(&mut self, arena: &mut Arena<T>, id: NodeId) {
        debug_assert!(arena[id].link(self.chain).is_none(), "node already linked");
        *arena[id].link_mut(self.chain) = Some(Link {
            prev: self.tail,
            next: None,
        });
        match self.tail {
            Some(tail) => set_next(arena, self.chain, tail, Some(id)),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        self.len += 1;
    }

    /// Unlinks `id` from this list. Returns `false` if it was not linked.
    ///
    /// The caller must only pass nodes of this list, not of a sibling list
    /// sharing the same chain.
    pub(crate) fn unlink<T: Linked>(&mut self, arena: &mut Arena<T>, id: NodeId) -> bool {
        let Some(link) = arena[id].link_mut(self.chain).take() else {
            return false;
        };
        match link.prev {
            Some(prev) => set_next(arena, self.chain, prev, link.next),
            None => self.head = link.next,
        }
        match link.next {
            Some(next) => set_prev(arena, self.chain, next, link.prev),
            None => self.tail = link.prev,
        }
        self.len -= 1;
        true
    }

    /// Iterates node ids from head to tail.
    pub(crate) fn iter<'a, T: Linked>(&self, arena: &'a Arena<T>) -> Iter<'a, T> {
        Iter {
            arena,
            chain: self.chain,
            next: self.head,
            remaining: self.len,
        }
    }
}

fn set_prev<T: Linked>(arena: &mut Arena<T>, chain: Chain, id: NodeId, prev: Option<NodeId>) {
    if let Some(link) = arena[id].link_mut(chain) {
        link.prev = prev;
    }
}

fn set_next<T: Linked>(arena: &mut Arena<T>, chain: Chain, id: NodeId, next: Option<NodeId>) {
    if let Some(link) = arena[id].link_mut(chain) {
        link.next = next;
    }
}

/// Head-to-tail iterator over the ids of a [`List`].
pub(crate) struct Iter<'a, T> {
    arena: &'a Arena<T>,
    chain: Chain,
    next: Option<NodeId>,
    remaining: usize,
}

impl<T: Linked> Iterator for Iter<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.arena[current].link(self.chain).and_then(|l| l.next);
        self.remaining = self.remaining.saturating_sub(1);
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> fmt::Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter")
            .field("chain", &self.chain)
            .field("next", &self.next)
            .finish()
    }
}
