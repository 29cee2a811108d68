//! Mutex-guarded ring buffer
//!
//! 互斥锁保护的环形缓冲区
//!
//! Same logical operations as [`RingBuf`](crate::RingBuf), but every operation holds a
//! `parking_lot::Mutex` for its whole duration. Any non-zero capacity is accepted and
//! every query is exact at the moment the lock is held.
//!
//! 与 [`RingBuf`](crate::RingBuf) 提供相同的逻辑操作，但每个操作在整个执行期间都持有
//! `parking_lot::Mutex`。接受任意非零容量，所有查询在持锁时刻都是精确的。

use crate::error::RingBufError;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tracing::debug;

/// Lock-based bounded FIFO ring buffer
///
/// 基于锁的有界 FIFO 环形缓冲区
///
/// # Examples
///
/// ```
/// use easyring::GuardedRingBuf;
///
/// let buf = GuardedRingBuf::new(3).unwrap();
/// for i in 1..=3 {
///     buf.insert(i).unwrap();
/// }
/// assert!(buf.is_full());
/// assert_eq!(buf.get_last_n(2), vec![2, 3]);
/// assert_eq!(buf.remove(), Ok(1));
/// ```
#[derive(Debug)]
pub struct GuardedRingBuf<T> {
    items: Mutex<VecDeque<T>>,
    capacity: usize,
}

impl<T> GuardedRingBuf<T> {
    /// Create a new guarded buffer
    ///
    /// 创建新的受保护缓冲区
    ///
    /// # Errors
    ///
    /// `RingBufError::InvalidCapacity(0)` for a zero capacity.
    pub fn new(capacity: usize) -> Result<Self, RingBufError<T>> {
        if capacity == 0 {
            return Err(RingBufError::InvalidCapacity(capacity));
        }
        debug!(capacity, "created guarded ring buffer");

        Ok(Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        })
    }

    /// Maximum number of items the buffer can hold
    ///
    /// 缓冲区可容纳的最大元素数量
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of items currently stored
    ///
    /// 当前存储的元素数量
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Check if the buffer is empty
    ///
    /// 检查缓冲区是否为空
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Check if the buffer is full
    ///
    /// 检查缓冲区是否已满
    pub fn is_full(&self) -> bool {
        self.items.lock().len() == self.capacity
    }

    /// Insert an item at the tail
    ///
    /// 在尾部插入元素
    ///
    /// # Errors
    ///
    /// `RingBufError::Full(item)` when the buffer holds `capacity` items.
    pub fn insert(&self, item: T) -> Result<(), RingBufError<T>> {
        let mut items = self.items.lock();
        if items.len() == self.capacity {
            return Err(RingBufError::Full(item));
        }
        items.push_back(item);
        Ok(())
    }

    /// Remove the oldest item
    ///
    /// 移除最旧的元素
    pub fn remove(&self) -> Result<T, RingBufError<T>> {
        self.items.lock().pop_front().ok_or(RingBufError::Empty)
    }

    /// Drop every item
    ///
    /// drop 所有元素
    pub fn reset(&self) {
        let dropped = {
            let mut items = self.items.lock();
            let dropped = items.len();
            items.clear();
            dropped
        };
        debug!(dropped, "reset guarded ring buffer");
    }
}

impl<T: Clone> GuardedRingBuf<T> {
    /// Clone the oldest item without removing it
    ///
    /// 克隆最旧的元素但不移除
    pub fn peek(&self) -> Result<T, RingBufError<T>> {
        self.items.lock().front().cloned().ok_or(RingBufError::Empty)
    }

    /// Clone the item `offset` positions after the oldest one
    ///
    /// 克隆距最旧元素 `offset` 个位置的元素
    pub fn get(&self, offset: usize) -> Result<T, RingBufError<T>> {
        let items = self.items.lock();
        items
            .get(offset)
            .cloned()
            .ok_or(RingBufError::IndexOutOfRange {
                offset,
                size: items.len(),
            })
    }

    /// All items, oldest first
    ///
    /// 所有元素，最旧的在前
    pub fn get_all(&self) -> Vec<T> {
        self.items.lock().iter().cloned().collect()
    }

    /// The newest `n` items (fewer if the buffer holds less), oldest first
    ///
    /// 最新的 `n` 个元素（不足时返回全部），最旧的在前
    pub fn get_last_n(&self, n: usize) -> Vec<T> {
        let items = self.items.lock();
        let skip = items.len().saturating_sub(n);
        items.iter().skip(skip).cloned().collect()
    }
}
