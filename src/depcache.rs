//! In-process dependency cache.
//!
//! A chained hash table mapping a file path to its last-modified time. The
//! rebuild engine fills it while scanning `#include` graphs, so re-checking
//! a header shared by many translation units costs one stat for the whole
//! build run.
//!
//! Entries are never removed. Buckets hold indexes into a node arena and
//! collisions chain through `next` indexes; growing the table re-chains the
//! existing nodes into a wider bucket array without touching their storage.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

const NIL: usize = usize::MAX;
const INITIAL_BUCKETS: usize = 64;

#[derive(Debug)]
struct Node {
    path: PathBuf,
    mtime: SystemTime,
    next: usize,
}

#[derive(Debug)]
pub struct DepTable {
    /// Head node index per bucket; length is always a power of two.
    buckets: Vec<usize>,
    nodes: Vec<Node>,
}

/// djb2 over the path's raw bytes.
fn hash_path(path: &Path) -> u64 {
    let mut hash: u64 = 5381;
    for &byte in path.as_os_str().as_encoded_bytes() {
        hash = hash.wrapping_mul(33).wrapping_add(u64::from(byte));
    }
    hash
}

impl DepTable {
    pub fn new() -> Self {
        Self {
            buckets: vec![NIL; INITIAL_BUCKETS],
            nodes: Vec::new(),
        }
    }

    /// Number of distinct paths stored.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Current bucket count.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    fn bucket_of(&self, path: &Path) -> usize {
        // power-of-two capacity, so masking replaces modulo
        (hash_path(path) & (self.buckets.len() as u64 - 1)) as usize
    }

    pub fn get(&self, path: &Path) -> Option<SystemTime> {
        let mut at = self.buckets[self.bucket_of(path)];
        while at != NIL {
            let node = &self.nodes[at];
            if node.path.as_path() == path {
                return Some(node.mtime);
            }
            at = node.next;
        }
        None
    }

    /// Inserts the path if absent and returns the stored mtime. Re-inserting
    /// an existing path is a lookup, not a duplicate: the original mtime is
    /// kept and returned.
    pub fn insert(&mut self, path: &Path, mtime: SystemTime) -> SystemTime {
        if let Some(existing) = self.get(path) {
            return existing;
        }
        if self.nodes.len() + 1 > self.buckets.len() / 2 {
            self.grow();
        }
        let bucket = self.bucket_of(path);
        let index = self.nodes.len();
        self.nodes.push(Node {
            path: path.to_path_buf(),
            mtime,
            next: self.buckets[bucket],
        });
        self.buckets[bucket] = index;
        mtime
    }

    /// Doubles the bucket array and re-chains every node in place.
    fn grow(&mut self) {
        let new_capacity = self.buckets.len() * 2;
        let mut buckets = vec![NIL; new_capacity];
        for (index, node) in self.nodes.iter_mut().enumerate() {
            let bucket = (hash_path(&node.path) & (new_capacity as u64 - 1)) as usize;
            node.next = buckets[bucket];
            buckets[bucket] = index;
        }
        self.buckets = buckets;
    }
}

impl Default for DepTable {
    fn default() -> Self {
        Self::new()
    }
}
