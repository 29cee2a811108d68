//! Ring buffer error taxonomy
//!
//! 环形缓冲区错误类型

use thiserror::Error;

/// Ring buffer operation error
///
/// 环形缓冲区操作错误
///
/// Only `InvalidCapacity` is permanent. `Full`, `Empty` and `IndexOutOfRange` are
/// transient and can succeed on retry once the other side makes progress.
///
/// 只有 `InvalidCapacity` 是永久性错误。`Full`、`Empty` 和 `IndexOutOfRange`
/// 是暂时性的，对端推进后重试即可成功。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RingBufError<T> {
    /// Requested capacity is rejected by the constructor
    ///
    /// 构造时容量无效
    #[error("invalid ring buffer capacity {0}")]
    InvalidCapacity(usize),

    /// Buffer is full; the rejected item is handed back
    ///
    /// 缓冲区已满，被拒绝的元素原样返回
    #[error("ring buffer is full")]
    Full(T),

    /// Buffer is empty
    ///
    /// 缓冲区为空
    #[error("ring buffer is empty")]
    Empty,

    /// Positional read past the current size
    ///
    /// 位置读取超出当前大小
    #[error("offset {offset} out of range for ring buffer of size {size}")]
    IndexOutOfRange {
        /// Requested position, counted from the oldest item
        ///
        /// 请求的位置，从最旧元素起算
        offset: usize,
        /// Number of items at the time of the read
        ///
        /// 读取时的元素数量
        size: usize,
    },
}

impl<T> RingBufError<T> {
    /// Recover the item rejected by a full buffer
    ///
    /// 取回因缓冲区已满而被拒绝的元素
    #[inline]
    pub fn into_inner(self) -> Option<T> {
        match self {
            RingBufError::Full(item) => Some(item),
            _ => None,
        }
    }

    /// Check if this is a `Full` error
    ///
    /// 检查是否为 `Full` 错误
    #[inline]
    pub fn is_full(&self) -> bool {
        matches!(self, RingBufError::Full(_))
    }

    /// Check if this is an `Empty` error
    ///
    /// 检查是否为 `Empty` 错误
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, RingBufError::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err: RingBufError<i32> = RingBufError::InvalidCapacity(5);
        assert_eq!(err.to_string(), "invalid ring buffer capacity 5");

        let err: RingBufError<i32> = RingBufError::IndexOutOfRange { offset: 3, size: 2 };
        assert_eq!(err.to_string(), "offset 3 out of range for ring buffer of size 2");

        assert_eq!(RingBufError::Full(1).to_string(), "ring buffer is full");
        assert_eq!(RingBufError::<i32>::Empty.to_string(), "ring buffer is empty");
    }

    #[test]
    fn test_into_inner() {
        assert_eq!(RingBufError::Full("x".to_string()).into_inner(), Some("x".to_string()));
        assert_eq!(RingBufError::<String>::Empty.into_inner(), None);
        assert!(RingBufError::Full(7).is_full());
        assert!(RingBufError::<u8>::Empty.is_empty());
    }
}
