// Ping-pong buffer bookkeeping

use std::ops::{Index, IndexMut};

/// One of the two picture resources of a double-buffered surface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BufferIndex {
    /// First resource (active after allocation)
    #[default]
    A,
    /// Second resource
    B,
}

impl BufferIndex {
    /// The other buffer
    #[inline]
    pub fn other(self) -> Self {
        match self {
            BufferIndex::A => BufferIndex::B,
            BufferIndex::B => BufferIndex::A,
        }
    }

    /// Numeric form (A = 0, B = 1)
    pub fn as_usize(self) -> usize {
        match self {
            BufferIndex::A => 0,
            BufferIndex::B => 1,
        }
    }
}

/// A pair of values addressed by [`BufferIndex`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingPong<T> {
    a: T,
    b: T,
}

impl<T> PingPong<T> {
    /// Create a pair
    pub fn new(a: T, b: T) -> Self {
        Self { a, b }
    }

    /// Both values, A first
    pub fn both(&self) -> [&T; 2] {
        [&self.a, &self.b]
    }
}

impl<T> Index<BufferIndex> for PingPong<T> {
    type Output = T;

    fn index(&self, index: BufferIndex) -> &T {
        match index {
            BufferIndex::A => &self.a,
            BufferIndex::B => &self.b,
        }
    }
}

impl<T> IndexMut<BufferIndex> for PingPong<T> {
    fn index_mut(&mut self, index: BufferIndex) -> &mut T {
        match index {
            BufferIndex::A => &mut self.a,
            BufferIndex::B => &mut self.b,
        }
    }
}
