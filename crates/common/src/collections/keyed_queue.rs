#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

//! A FIFO queue whose items are addressable by a unique key.
//!
//! # Complexity
//! - `enqueue`, `dequeue`, `peek`: `O(1)` amortized.
//! - `has_key`, `get_by_key`, `get_by_key_mut`, `remove_by_key`, `promote`:
//!   `O(1)` amortized through the key index.
//! - `remove_first`: `O(n)` scan from tail to head.
//! - `clear`: `O(n)` due to drops.
//!
//! # Orientation
//! - The **head** holds the oldest item and is where `dequeue` and `peek`
//!   operate.
//! - The **tail** holds the newest item and is where `enqueue` and `promote`
//!   place items.
//! - Every node links `prev` toward the tail and `next` toward the head.
//!
//! # Failure Semantics
//! - Inserting a key that is already present, or addressing a key that is
//!   absent, returns a [`QueueError`] and leaves the queue untouched.
//! - Nodes live in an arena addressed by slot index, so removal never leaves a
//!   dangling link behind.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::iter::FusedIterator;

use crate::error::{QueueError, QueueResult};

type NodeSlot<K, V> = Option<Node<K, V>>;

/// Queue of uniquely keyed items backed by an indexable doubly linked list
/// stored in a `Vec`.
///
/// # Examples
///
/// ```
/// use orderly_common::collections::KeyedQueue;
///
/// let mut queue = KeyedQueue::new();
/// queue.enqueue(1, "one").unwrap();
/// queue.enqueue(2, "two").unwrap();
/// queue.enqueue(3, "three").unwrap();
///
/// // Move the oldest item to the newest end.
/// queue.promote(&1).unwrap();
///
/// let order: Vec<_> = queue.iter().map(|(key, _)| *key).collect();
/// assert_eq!(order, vec![1, 3, 2]);
/// assert!(queue.enqueue(2, "again").is_err());
/// ```
pub struct KeyedQueue<K, V>
where
    K: Eq + Hash,
{
    index: HashMap<K, usize>,
    nodes: Vec<NodeSlot<K, V>>,
    free_list: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<K, V> Default for KeyedQueue<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> KeyedQueue<K, V>
where
    K: Eq + Hash,
{
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty queue with room for `capacity` items before
    /// reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            index: HashMap::with_capacity(capacity),
            nodes: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Returns the number of items currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` when the queue holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` when an item with `key` is queued.
    #[must_use]
    pub fn has_key(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Removes every item, dropping the chain and the key index together.
    pub fn clear(&mut self) {
        self.index.clear();
        self.nodes.clear();
        self.free_list.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    /// Returns the oldest item without removing it.
    pub fn peek(&self) -> QueueResult<(&K, &V)> {
        self.head
            .and_then(|index| self.node(index))
            .map(|node| (&node.key, &node.value))
            .ok_or(QueueError::EmptyQueue)
    }

    /// Returns an iterator from the tail (newest) to the head (oldest).
    ///
    /// Every call starts a fresh traversal.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter { queue: self, current: self.tail, remaining: self.len }
    }

    /// Removes and returns the first item, scanning from the tail, that
    /// satisfies `predicate`.
    pub fn remove_first<F>(&mut self, mut predicate: F) -> Option<(K, V)>
    where
        F: FnMut(&K, &V) -> bool,
    {
        let mut current = self.tail;
        while let Some(index) = current {
            let node = self.node(index)?;
            if predicate(&node.key, &node.value) {
                let node = self.unlink(index)?;
                self.index.remove(&node.key);
                return Some((node.key, node.value));
            }
            current = node.next;
        }
        None
    }

    fn node(&self, index: usize) -> Option<&Node<K, V>> {
        self.nodes.get(index).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, index: usize) -> Option<&mut Node<K, V>> {
        self.nodes.get_mut(index).and_then(Option::as_mut)
    }

    fn allocate_slot(&mut self, key: K, value: V) -> usize {
        if let Some(index) = self.free_list.pop() {
            self.nodes[index] = Some(Node::new(key, value));
            index
        } else {
            self.nodes.push(Some(Node::new(key, value)));
            self.nodes.len() - 1
        }
    }

    /// Detaches the node at `index` and releases its slot.
    fn unlink(&mut self, index: usize) -> Option<Node<K, V>> {
        self.detach(index);
        let node = self.nodes.get_mut(index).and_then(Option::take)?;
        self.free_list.push(index);
        self.len = self.len.saturating_sub(1);
        Some(node)
    }

    fn detach(&mut self, index: usize) {
        let (prev, next) = match self.node(index) {
            Some(node) => (node.prev, node.next),
            None => return,
        };

        match prev {
            Some(prev_index) => {
                if let Some(prev_node) = self.node_mut(prev_index) {
                    prev_node.next = next;
                }
            }
            None => {
                self.tail = next;
            }
        }

        match next {
            Some(next_index) => {
                if let Some(next_node) = self.node_mut(next_index) {
                    next_node.prev = prev;
                }
            }
            None => {
                self.head = prev;
            }
        }

        if let Some(node) = self.node_mut(index) {
            node.prev = None;
            node.next = None;
        }
    }

    fn attach_tail(&mut self, index: usize) {
        let old_tail = self.tail;
        if let Some(node) = self.node_mut(index) {
            node.prev = None;
            node.next = old_tail;
        }

        if let Some(tail_index) = old_tail {
            if let Some(tail_node) = self.node_mut(tail_index) {
                tail_node.prev = Some(index);
            }
        } else {
            self.head = Some(index);
        }

        self.tail = Some(index);
    }
}

impl<K, V> KeyedQueue<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    /// Inserts an item at the tail.
    ///
    /// Fails with [`QueueError::DuplicateKey`] when `key` is already queued.
    pub fn enqueue(&mut self, key: K, value: V) -> QueueResult<()> {
        if self.index.contains_key(&key) {
            return Err(QueueError::duplicate_key(&key));
        }

        let index = self.allocate_slot(key.clone(), value);
        self.attach_tail(index);
        self.index.insert(key, index);
        self.len += 1;
        Ok(())
    }

    /// Removes and returns the head (oldest item).
    pub fn dequeue(&mut self) -> QueueResult<(K, V)> {
        let index = self.head.ok_or(QueueError::EmptyQueue)?;
        let node = self.unlink(index).ok_or(QueueError::EmptyQueue)?;
        self.index.remove(&node.key);
        Ok((node.key, node.value))
    }

    /// Returns the item stored under `key`.
    pub fn get_by_key(&self, key: &K) -> QueueResult<&V> {
        self.index
            .get(key)
            .and_then(|&index| self.node(index))
            .map(|node| &node.value)
            .ok_or_else(|| QueueError::unknown_key(key))
    }

    /// Returns a mutable reference to the item stored under `key`.
    pub fn get_by_key_mut(&mut self, key: &K) -> QueueResult<&mut V> {
        let index = self.slot_of(key)?;
        self.node_mut(index).map(|node| &mut node.value).ok_or_else(|| QueueError::unknown_key(key))
    }

    /// Removes the item stored under `key` and returns its value.
    pub fn remove_by_key(&mut self, key: &K) -> QueueResult<V> {
        let index = self.slot_of(key)?;
        let node = self.unlink(index).ok_or_else(|| QueueError::unknown_key(key))?;
        self.index.remove(key);
        Ok(node.value)
    }

    /// Moves the item stored under `key` to the tail and returns it.
    pub fn promote(&mut self, key: &K) -> QueueResult<&mut V> {
        let index = self.slot_of(key)?;
        if self.tail != Some(index) {
            self.detach(index);
            self.attach_tail(index);
        }
        self.node_mut(index).map(|node| &mut node.value).ok_or_else(|| QueueError::unknown_key(key))
    }

    fn slot_of(&self, key: &K) -> QueueResult<usize> {
        self.index.get(key).copied().ok_or_else(|| QueueError::unknown_key(key))
    }
}

impl<K, V> fmt::Debug for KeyedQueue<K, V>
where
    K: Eq + Hash + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedQueue")
            .field("len", &self.len)
            .field("keys", &self.iter().map(|(key, _)| key).collect::<Vec<_>>())
            .finish()
    }
}

impl<'a, K, V> IntoIterator for &'a KeyedQueue<K, V>
where
    K: Eq + Hash,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    /// Neighbour toward the tail.
    prev: Option<usize>,
    /// Neighbour toward the head.
    next: Option<usize>,
}

impl<K, V> Node<K, V> {
    fn new(key: K, value: V) -> Self {
        Self { key, value, prev: None, next: None }
    }
}

/// Iterator over queue items from the tail (newest) to the head (oldest).
pub struct Iter<'a, K, V>
where
    K: Eq + Hash,
{
    queue: &'a KeyedQueue<K, V>,
    current: Option<usize>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V>
where
    K: Eq + Hash,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.current?;
        let node = self.queue.node(index)?;
        self.current = node.next;
        self.remaining = self.remaining.saturating_sub(1);
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V> ExactSizeIterator for Iter<'a, K, V> where K: Eq + Hash {}

impl<'a, K, V> FusedIterator for Iter<'a, K, V> where K: Eq + Hash {}
