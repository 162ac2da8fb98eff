//! LIRS cache entry.
//!
//! Every key a segment knows about is represented by one [`LirsEntry`], whether
//! its value is resident or only its history survives. The entry's
//! classification is derived from its links rather than stored:
//!
//! | Queue link | Value   | Class                 |
//! |------------|---------|-----------------------|
//! | none       | present | hot                   |
//! | resident   | present | cold resident         |
//! | history    | absent  | cold non-resident     |
//!
//! Independently of its class, an entry may also sit in the recency stack.

use crate::list::{Chain, Link, Linked};
use core::fmt;

/// A key with its (optional) value, memory cost and list membership.
pub(crate) struct LirsEntry<K, V> {
    pub(crate) key: K,
    /// `None` once the entry has been demoted to a history record.
    pub(crate) value: Option<V>,
    /// Caller-declared cost; zero for non-resident entries.
    pub(crate) memory: u64,
    /// Value of the segment's stack move counter when this entry was last
    /// pushed onto the stack head.
    pub(crate) last_stack_move: u64,
    stack: Option<Link>,
    queue: Option<Link>,
}

impl<K, V> LirsEntry<K, V> {
    pub(crate) fn new(key: K, value: V, memory: u64) -> Self {
        LirsEntry {
            key,
            value: Some(value),
            memory,
            last_stack_move: 0,
            stack: None,
            queue: None,
        }
    }

    /// Hot entries are resident and sit in no queue.
    #[inline]
    pub(crate) fn is_hot(&self) -> bool {
        self.queue.is_none()
    }

    #[inline]
    pub(crate) fn is_resident(&self) -> bool {
        self.value.is_some()
    }

    #[inline]
    pub(crate) fn on_stack(&self) -> bool {
        self.stack.is_some()
    }

    /// Drops the value and memory cost, leaving only the key as history.
    pub(crate) fn make_non_resident(&mut self) -> Option<V> {
        self.memory = 0;
        self.value.take()
    }
}

impl<K, V> Linked for LirsEntry<K, V> {
    #[inline]
    fn link(&self, chain: Chain) -> Option<Link> {
        match chain {
            Chain::Stack => self.stack,
            Chain::Queue => self.queue,
        }
    }

    #[inline]
    fn link_mut(&mut self, chain: Chain) -> &mut Option<Link> {
        match chain {
            Chain::Stack => &mut self.stack,
            Chain::Queue => &mut self.queue,
        }
    }
}

impl<K: fmt::Debug, V> fmt::Debug for LirsEntry<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LirsEntry")
            .field("key", &self.key)
            .field("resident", &self.is_resident())
            .field("hot", &self.is_hot())
            .field("on_stack", &self.on_stack())
            .field("memory", &self.memory)
            .field("last_stack_move", &self.last_stack_move)
            .finish()
    }
}
