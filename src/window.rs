//! Rolling windows for log lines and numeric samples
//!
//! 用于日志行和数值样本的滚动窗口
//!
//! A rolling window is an overwrite-mode ring: `add` never fails, and once the
//! window is full every new item evicts the oldest one. Views are linearized from
//! the oldest element, so position `0` is always the oldest retained item.
//!
//! 滚动窗口是覆盖模式的环：`add` 永不失败，窗口满后每个新元素都会淘汰最旧的元素。
//! 视图从最旧元素开始线性化，因此位置 `0` 总是保留的最旧元素。
//!
//! Windows are single-owner (`&mut self`). Put one behind a lock to share it.
//!
//! 窗口为单一所有者（`&mut self`），需要共享时请放在锁后面。

use crate::error::RingBufError;
use std::collections::VecDeque;
use std::collections::vec_deque;

/// Rolling window of log lines
///
/// 日志行滚动窗口
pub type LogWindow = RollingWindow<String>;

/// Rolling window of numeric samples
///
/// 数值样本滚动窗口
pub type SampleWindow = RollingWindow<f64>;

/// Fixed-capacity window that evicts its oldest item when full
///
/// 满时淘汰最旧元素的固定容量窗口
///
/// # Examples
///
/// ```
/// use easyring::SampleWindow;
///
/// let mut window = SampleWindow::new(3).unwrap();
/// for v in [1.0, 2.0, 3.0, 4.0] {
///     window.add(v);
/// }
/// assert_eq!(window.values(), vec![2.0, 3.0, 4.0]);
/// assert_eq!(window.last(2), vec![3.0, 4.0]);
/// assert_eq!(window.range(0, 2), vec![2.0, 3.0]);
/// assert_eq!(window.mean(), Some(3.0));
/// ```
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> RollingWindow<T> {
    /// Create an empty window
    ///
    /// 创建空窗口
    ///
    /// # Errors
    ///
    /// `RingBufError::InvalidCapacity(0)` for a zero capacity.
    pub fn new(capacity: usize) -> Result<Self, RingBufError<T>> {
        if capacity == 0 {
            return Err(RingBufError::InvalidCapacity(capacity));
        }

        Ok(Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    /// Maximum number of retained items
    ///
    /// 最多保留的元素数量
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of retained items
    ///
    /// 当前保留的元素数量
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the window holds no items
    ///
    /// 检查窗口是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Check if the next `add` will evict
    ///
    /// 检查下一次 `add` 是否会淘汰元素
    #[inline]
    pub fn is_full(&self) -> bool {
        self.items.len() == self.capacity
    }

    /// Append an item, returning the evicted oldest item if the window was full
    ///
    /// 追加元素；如果窗口已满，返回被淘汰的最旧元素
    pub fn add(&mut self, item: T) -> Option<T> {
        let evicted = if self.is_full() {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    /// Iterate oldest first
    ///
    /// 从最旧元素开始迭代
    pub fn iter(&self) -> vec_deque::Iter<'_, T> {
        self.items.iter()
    }

    /// Drop every item
    ///
    /// drop 所有元素
    pub fn reset(&mut self) {
        self.items.clear();
    }
}

impl<T: Clone> RollingWindow<T> {
    /// All items, oldest first
    ///
    /// 所有元素，最旧的在前
    pub fn values(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }

    /// The newest `n` items (fewer if the window holds less), oldest first
    ///
    /// 最新的 `n` 个元素（不足时返回全部），最旧的在前
    pub fn last(&self, n: usize) -> Vec<T> {
        let skip = self.items.len().saturating_sub(n);
        self.items.iter().skip(skip).cloned().collect()
    }

    /// Items at linearized positions `[start, end)`, clamped to the current length
    ///
    /// 线性化位置 `[start, end)` 上的元素，按当前长度截断
    pub fn range(&self, start: usize, end: usize) -> Vec<T> {
        let end = end.min(self.items.len());
        if start >= end {
            return Vec::new();
        }
        self.items.range(start..end).cloned().collect()
    }
}

impl<'a, T> IntoIterator for &'a RollingWindow<T> {
    type Item = &'a T;
    type IntoIter = vec_deque::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl RollingWindow<f64> {
    /// Arithmetic mean of the retained samples
    ///
    /// 保留样本的算术平均值
    pub fn mean(&self) -> Option<f64> {
        if self.items.is_empty() {
            return None;
        }
        Some(self.items.iter().sum::<f64>() / self.items.len() as f64)
    }

    /// Smallest retained sample
    ///
    /// 保留样本中的最小值
    pub fn min(&self) -> Option<f64> {
        self.items.iter().copied().reduce(f64::min)
    }

    /// Largest retained sample
    ///
    /// 保留样本中的最大值
    pub fn max(&self) -> Option<f64> {
        self.items.iter().copied().reduce(f64::max)
    }
}
