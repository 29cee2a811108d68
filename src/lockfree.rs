//! Lock-free MPMC ring buffer with ticket claim/publish protocol
//!
//! 基于票据领取/发布协议的无锁多生产者多消费者环形缓冲区
//!
//! The buffer is coordinated by four monotonically increasing 64-bit counters:
//!
//! 缓冲区由四个单调递增的 64 位计数器协调：
//!
//! ```text
//! read_reserve <= read_pointer <= write_reserve <= write_pointer
//!      |               |               |                |
//!  removals        next read       writes          next write
//!  published        ticket        published          ticket
//! ```
//!
//! A producer claims a ticket by CAS on `write_pointer`, writes its slot, then
//! publishes by CAS on `write_reserve` from its own ticket. That publish can only
//! succeed once every earlier ticket has published, so consumers observe items in
//! exactly claim order and never see a half-written slot. Consumers run the mirror
//! protocol on `read_pointer` / `read_reserve`.
//!
//! 生产者通过对 `write_pointer` 执行 CAS 领取票据，写入槽位后再以自身票据对
//! `write_reserve` 执行 CAS 发布。只有所有更早的票据都已发布，该发布才能成功，
//! 因此消费者严格按领取顺序看到元素，且不会看到写了一半的槽位。消费者在
//! `read_pointer` / `read_reserve` 上执行对称协议。
//!
//! # Liveness
//!
//! The publish step waits for all earlier tickets. If the thread holding an earlier
//! ticket is preempted or dies between claim and publish, every later producer (or
//! consumer) keeps waiting. There is no timeout: abandoning the wait would break the
//! in-order visibility guarantee. A saturated backoff is logged at `debug`; a wait
//! longer than [`STALL_WARN_AFTER`] is logged once at `warn`.
//!
//! 发布阶段需要等待所有更早的票据。如果持有更早票据的线程在领取与发布之间被抢占或终止，
//! 所有后续生产者（或消费者）都会持续等待。这里没有超时：放弃等待会破坏按序可见性保证。
//! 退避饱和时以 `debug` 级别记录；等待超过 [`STALL_WARN_AFTER`] 时以 `warn` 级别记录一次。

use crate::core::RingBufCore;
use crate::error::RingBufError;
use crate::shim::SpinWait;
use crate::shim::atomic::{AtomicU64, Ordering, fence};
use crossbeam_utils::CachePadded;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// How long a publish may wait on earlier tickets before it is reported at `warn`
///
/// 发布等待更早票据超过此时长时以 `warn` 级别报告
pub const STALL_WARN_AFTER: Duration = Duration::from_millis(100);

/// Lock-free bounded MPMC ring buffer
///
/// 无锁有界多生产者多消费者环形缓冲区
///
/// Share it between threads through `Arc<RingBuf<T>>` or scoped borrows; every data
/// path operation takes `&self`. Only `reset` needs `&mut self`.
///
/// 通过 `Arc<RingBuf<T>>` 或作用域借用在线程间共享；所有数据路径操作都只需 `&self`，
/// 只有 `reset` 需要 `&mut self`。
///
/// # Examples
///
/// ```
/// use easyring::{RingBuf, RingBufError};
///
/// let buf = RingBuf::new(2).unwrap();
/// buf.insert("a").unwrap();
/// buf.insert("b").unwrap();
/// assert_eq!(buf.insert("c"), Err(RingBufError::Full("c")));
///
/// assert_eq!(buf.remove(), Ok("a"));
/// assert_eq!(buf.remove(), Ok("b"));
/// assert_eq!(buf.remove(), Err(RingBufError::Empty));
/// ```
pub struct RingBuf<T> {
    core: RingBufCore<T>,

    /// Next write ticket to be claimed
    ///
    /// 下一个待领取的写票据
    write_pointer: CachePadded<AtomicU64>,

    /// Writes below this ticket are visible to consumers
    ///
    /// 低于此票据的写入对消费者可见
    write_reserve: CachePadded<AtomicU64>,

    /// Next read ticket to be claimed
    ///
    /// 下一个待领取的读票据
    read_pointer: CachePadded<AtomicU64>,

    /// Removals below this ticket have released their slot to producers
    ///
    /// 低于此票据的移除已将槽位归还给生产者
    read_reserve: CachePadded<AtomicU64>,
}

impl<T> RingBuf<T> {
    /// Create a new ring buffer with the specified capacity
    ///
    /// 创建指定容量的新环形缓冲区
    ///
    /// Capacity is used as given; it is never rounded.
    ///
    /// 容量按原值使用，不做取整。
    ///
    /// # Errors
    ///
    /// `RingBufError::InvalidCapacity` if `capacity` is zero or not a power of two.
    ///
    /// # Examples
    ///
    /// ```
    /// use easyring::{RingBuf, RingBufError};
    ///
    /// let buf: RingBuf<u32> = RingBuf::new(16).unwrap();
    /// assert_eq!(buf.capacity(), 16);
    ///
    /// assert!(matches!(RingBuf::<u32>::new(100), Err(RingBufError::InvalidCapacity(100))));
    /// ```
    pub fn new(capacity: usize) -> Result<Self, RingBufError<T>> {
        let core = RingBufCore::new(capacity).ok_or(RingBufError::InvalidCapacity(capacity))?;
        debug!(capacity, "created lock-free ring buffer");

        Ok(Self {
            core,
            write_pointer: CachePadded::new(AtomicU64::new(0)),
            write_reserve: CachePadded::new(AtomicU64::new(0)),
            read_pointer: CachePadded::new(AtomicU64::new(0)),
            read_reserve: CachePadded::new(AtomicU64::new(0)),
        })
    }

    /// Maximum number of items the buffer can hold
    ///
    /// 缓冲区可容纳的最大元素数量
    #[inline]
    pub fn capacity(&self) -> usize {
        self.core.capacity()
    }

    /// Number of published items not yet released by consumers
    ///
    /// 已发布但尚未被消费者释放的元素数量
    ///
    /// A snapshot: it may be stale by the time the caller acts on it.
    ///
    /// 这是一个快照，调用者使用时可能已过时。
    #[inline]
    pub fn len(&self) -> usize {
        // read_reserve first: both only grow, so the later write_reserve load
        // can never be behind it.
        let read = self.read_reserve.load(Ordering::Acquire);
        let write = self.write_reserve.load(Ordering::Acquire);
        (write.saturating_sub(read) as usize).min(self.core.capacity())
    }

    /// Whether a `remove` issued now would report `Empty`
    ///
    /// 现在调用 `remove` 是否会返回 `Empty`
    #[inline]
    pub fn is_empty(&self) -> bool {
        let read = self.read_pointer.load(Ordering::Acquire);
        let write = self.write_reserve.load(Ordering::Acquire);
        read >= write
    }

    /// Whether an `insert` issued now would report `Full`
    ///
    /// 现在调用 `insert` 是否会返回 `Full`
    #[inline]
    pub fn is_full(&self) -> bool {
        let read = self.read_reserve.load(Ordering::Acquire);
        let write = self.write_pointer.load(Ordering::Acquire);
        write.saturating_sub(read) >= self.core.capacity() as u64
    }

    /// Insert an item at the tail
    ///
    /// 在尾部插入一个元素
    ///
    /// Never waits for space. It does wait for producers holding earlier tickets to
    /// publish (see the module level liveness notes).
    ///
    /// 不会等待空间，但会等待持有更早票据的生产者完成发布（见模块级活性说明）。
    ///
    /// # Errors
    ///
    /// `RingBufError::Full(item)` hands the item back when no slot is free.
    pub fn insert(&self, item: T) -> Result<(), RingBufError<T>> {
        let capacity = self.core.capacity() as u64;

        let ticket = loop {
            let write = self.write_pointer.load(Ordering::Relaxed);
            let read = self.read_reserve.load(Ordering::Acquire);

            // A stale `write` can trail `read`; the CAS below then fails and we retry.
            if write.saturating_sub(read) >= capacity {
                trace!(write, read, "insert rejected: ring buffer full");
                return Err(RingBufError::Full(item));
            }

            if self
                .write_pointer
                .compare_exchange_weak(write, write + 1, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                break write;
            }
        };

        // SAFETY: the CAS handed us this ticket exclusively, and read_reserve (Acquire)
        // shows the consumer of ticket - capacity has already moved its value out.
        unsafe { self.core.write_at(self.core.index(ticket), item) };

        publish(&self.write_reserve, ticket, "write");
        Ok(())
    }

    /// Remove the item at the head
    ///
    /// 移除头部元素
    ///
    /// # Errors
    ///
    /// `RingBufError::Empty` when no published item is available.
    pub fn remove(&self) -> Result<T, RingBufError<T>> {
        let ticket = loop {
            let read = self.read_pointer.load(Ordering::Relaxed);
            let write = self.write_reserve.load(Ordering::Acquire);

            if read >= write {
                trace!(read, write, "remove rejected: ring buffer empty");
                return Err(RingBufError::Empty);
            }

            if self
                .read_pointer
                .compare_exchange_weak(read, read + 1, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                break read;
            }
        };

        // SAFETY: ticket < write_reserve (Acquire) so the slot is fully written, and the
        // CAS made us its only consumer. Moving the value out leaves nothing behind.
        let value = unsafe { self.core.read_at(self.core.index(ticket)) };

        publish(&self.read_reserve, ticket, "read");
        Ok(value)
    }

    /// Read the item `offset` positions after the oldest one, without removing it
    ///
    /// 读取距最旧元素 `offset` 个位置的元素，但不移除
    ///
    /// Best-effort and not linearizable: the value was in the buffer at some point
    /// during the call, but may already have been removed when the call returns.
    /// A slot recycled by a producer during the copy is detected and reported as
    /// out of range.
    ///
    /// 尽力而为且不可线性化：返回的值在调用期间某一时刻存在于缓冲区中，但返回时可能已被移除。
    /// 复制期间被生产者回收的槽位会被检测到并报告为越界。
    ///
    /// # Errors
    ///
    /// `RingBufError::IndexOutOfRange` if `offset >= len()` at read time.
    ///
    /// # Examples
    ///
    /// ```
    /// use easyring::RingBuf;
    ///
    /// let buf = RingBuf::new(4).unwrap();
    /// buf.insert(10).unwrap();
    /// buf.insert(20).unwrap();
    /// assert_eq!(buf.get(1), Ok(20));
    /// assert_eq!(buf.len(), 2);
    /// assert!(buf.get(2).is_err());
    /// ```
    pub fn get(&self, offset: usize) -> Result<T, RingBufError<T>>
    where
        T: Copy,
    {
        let read = self.read_reserve.load(Ordering::Acquire);
        let write = self.write_reserve.load(Ordering::Acquire);
        let size = write.saturating_sub(read) as usize;

        if offset >= size {
            return Err(RingBufError::IndexOutOfRange { offset, size });
        }

        let ticket = read + offset as u64;
        // SAFETY: in bounds via the mask. The copy is only trusted after the
        // validation below.
        let value = unsafe { self.core.copy_at(self.core.index(ticket)) };

        // A producer may reuse the slot only after read_reserve has passed ticket.
        // The RMW reads the latest value in modification order.
        fence(Ordering::Acquire);
        if self.read_reserve.fetch_add(0, Ordering::AcqRel) > ticket {
            let size = self.len();
            return Err(RingBufError::IndexOutOfRange { offset, size });
        }

        Ok(value)
    }

    /// Clone the item `offset` positions after the oldest one
    ///
    /// 克隆距最旧元素 `offset` 个位置的元素
    ///
    /// Exclusive access makes the read exact for any `T: Clone`.
    ///
    /// 独占访问使任意 `T: Clone` 的读取都是精确的。
    pub fn get_cloned(&mut self, offset: usize) -> Result<T, RingBufError<T>>
    where
        T: Clone,
    {
        let read = self.read_reserve.load(Ordering::Relaxed);
        let size = self.len();
        if offset >= size {
            return Err(RingBufError::IndexOutOfRange { offset, size });
        }

        // SAFETY: exclusive borrow, and read + offset lies in the published range.
        let value = unsafe { self.core.peek_at(self.core.index(read + offset as u64)) };
        Ok(value.clone())
    }

    /// Drop every item and rewind all counters to zero
    ///
    /// drop 所有元素并将所有计数器归零
    ///
    /// `&mut self` guarantees no insert or remove is in flight.
    ///
    /// `&mut self` 保证没有进行中的插入或移除。
    ///
    /// # Examples
    ///
    /// ```
    /// use easyring::RingBuf;
    ///
    /// let mut buf = RingBuf::new(4).unwrap();
    /// buf.insert(1).unwrap();
    /// buf.insert(2).unwrap();
    /// buf.reset();
    /// assert!(buf.is_empty());
    /// assert_eq!(buf.len(), 0);
    /// ```
    pub fn reset(&mut self) {
        let dropped = self.drop_live();

        self.write_pointer.store(0, Ordering::Relaxed);
        self.write_reserve.store(0, Ordering::Relaxed);
        self.read_pointer.store(0, Ordering::Relaxed);
        self.read_reserve.store(0, Ordering::Relaxed);

        debug!(dropped, "reset lock-free ring buffer");
    }

    fn drop_live(&mut self) -> u64 {
        let read = self.read_reserve.load(Ordering::Relaxed);
        let write = self.write_reserve.load(Ordering::Relaxed);

        for ticket in read..write {
            // SAFETY: exclusive access; tickets in [read_reserve, write_reserve) hold
            // published values nobody has moved out.
            unsafe { self.core.drop_at(self.core.index(ticket)) };
        }

        write - read
    }
}

/// Advance `reserve` from `ticket` to `ticket + 1` once every earlier ticket has
/// published
///
/// 在所有更早的票据发布后，将 `reserve` 从 `ticket` 推进到 `ticket + 1`
#[inline]
fn publish(reserve: &AtomicU64, ticket: u64, side: &'static str) {
    let spin = SpinWait::new();
    let mut stalled_since: Option<Instant> = None;
    let mut warned = false;

    while reserve
        .compare_exchange_weak(ticket, ticket + 1, Ordering::AcqRel, Ordering::Relaxed)
        .is_err()
    {
        if !warned && spin.is_saturated() {
            let since = *stalled_since.get_or_insert_with(|| {
                debug!(side, ticket, "publish backoff saturated, yielding");
                Instant::now()
            });
            let waited = since.elapsed();
            if waited >= STALL_WARN_AFTER {
                warned = true;
                warn!(
                    side,
                    ticket,
                    published = reserve.load(Ordering::Relaxed),
                    waited_ms = waited.as_millis() as u64,
                    "publish stalled waiting for an earlier ticket"
                );
            }
        }
        spin.snooze();
    }
}

impl<T> Drop for RingBuf<T> {
    fn drop(&mut self) {
        self.drop_live();
    }
}

impl<T> fmt::Debug for RingBuf<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingBuf")
            .field("capacity", &self.core.capacity())
            .field("write_pointer", &self.write_pointer.load(Ordering::Relaxed))
            .field("write_reserve", &self.write_reserve.load(Ordering::Relaxed))
            .field("read_pointer", &self.read_pointer.load(Ordering::Relaxed))
            .field("read_reserve", &self.read_reserve.load(Ordering::Relaxed))
            .finish()
    }
}

// Slot ownership is handed between threads by the ticket protocol.
unsafe impl<T: Send> Send for RingBuf<T> {}
unsafe impl<T: Send> Sync for RingBuf<T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::thread;
    use tracing::{Level, Subscriber};
    use tracing_subscriber::{Layer, Registry, layer::Context, layer::SubscriberExt};

    #[test]
    fn test_new_is_empty() {
        let buf: RingBuf<i32> = RingBuf::new(8).unwrap();
        assert_eq!(buf.capacity(), 8);
        assert_eq!(buf.len(), 0);
        assert!(buf.is_empty());
        assert!(!buf.is_full());
    }

    #[test]
    fn test_invalid_capacity() {
        for capacity in [0, 3, 5, 6, 100] {
            assert!(matches!(
                RingBuf::<i32>::new(capacity),
                Err(RingBufError::InvalidCapacity(c)) if c == capacity
            ));
        }
    }

    #[test]
    fn test_basic_insert_remove() {
        let buf = RingBuf::new(4).unwrap();

        buf.insert(1).unwrap();
        buf.insert(2).unwrap();
        buf.insert(3).unwrap();

        assert_eq!(buf.len(), 3);
        assert_eq!(buf.remove(), Ok(1));
        assert_eq!(buf.remove(), Ok(2));
        assert_eq!(buf.remove(), Ok(3));
        assert_eq!(buf.remove(), Err(RingBufError::Empty));
    }

    #[test]
    fn test_full_hands_item_back() {
        let buf = RingBuf::new(2).unwrap();
        buf.insert("a".to_string()).unwrap();
        buf.insert("b".to_string()).unwrap();

        let err = buf.insert("c".to_string()).unwrap_err();
        assert_eq!(err.into_inner(), Some("c".to_string()));
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn test_capacity_one() {
        let buf = RingBuf::new(1).unwrap();
        for i in 0..10 {
            buf.insert(i).unwrap();
            assert!(buf.is_full());
            assert_eq!(buf.insert(i), Err(RingBufError::Full(i)));
            assert_eq!(buf.remove(), Ok(i));
            assert!(buf.is_empty());
        }
    }

    #[test]
    fn test_counters_stay_ordered() {
        let buf = RingBuf::new(4).unwrap();
        for i in 0..10 {
            buf.insert(i).unwrap();
            buf.insert(i).unwrap();
            buf.remove().unwrap();

            let rr = buf.read_reserve.load(Ordering::Relaxed);
            let rp = buf.read_pointer.load(Ordering::Relaxed);
            let wr = buf.write_reserve.load(Ordering::Relaxed);
            let wp = buf.write_pointer.load(Ordering::Relaxed);
            assert!(rr <= rp && rp <= wr && wr <= wp);
            buf.remove().unwrap();
        }
    }

    #[test]
    fn test_get_and_get_cloned() {
        let mut buf = RingBuf::new(4).unwrap();
        buf.insert(10).unwrap();
        buf.insert(20).unwrap();

        assert_eq!(buf.get(0), Ok(10));
        assert_eq!(buf.get(1), Ok(20));
        assert_eq!(
            buf.get(2),
            Err(RingBufError::IndexOutOfRange { offset: 2, size: 2 })
        );
        assert_eq!(buf.get_cloned(1), Ok(20));
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn test_reset_rewinds_counters() {
        let mut buf = RingBuf::new(4).unwrap();
        for i in 0..3 {
            buf.insert(i).unwrap();
        }
        buf.remove().unwrap();
        buf.reset();

        assert_eq!(buf.write_pointer.load(Ordering::Relaxed), 0);
        assert_eq!(buf.write_reserve.load(Ordering::Relaxed), 0);
        assert_eq!(buf.read_pointer.load(Ordering::Relaxed), 0);
        assert_eq!(buf.read_reserve.load(Ordering::Relaxed), 0);
        assert!(buf.is_empty());
    }

    #[derive(Clone)]
    struct WarnCounter {
        warnings: Arc<AtomicUsize>,
    }

    impl<S: Subscriber> Layer<S> for WarnCounter {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == Level::WARN {
                self.warnings.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    /// Publish ticket 1 while another thread publishes ticket 0 after `delay`
    fn warnings_for_publish_delay(delay: Duration) -> usize {
        let warnings = Arc::new(AtomicUsize::new(0));
        let subscriber = Registry::default().with(WarnCounter {
            warnings: Arc::clone(&warnings),
        });
        let reserve = Arc::new(AtomicU64::new(0));

        let earlier = {
            let reserve = Arc::clone(&reserve);
            thread::spawn(move || {
                thread::sleep(delay);
                publish(&reserve, 0, "write");
            })
        };
        tracing::subscriber::with_default(subscriber, || publish(&reserve, 1, "write"));
        earlier.join().unwrap();

        assert_eq!(reserve.load(Ordering::SeqCst), 2);
        warnings.load(Ordering::SeqCst)
    }

    #[test]
    fn test_short_publish_stall_does_not_warn() {
        assert_eq!(warnings_for_publish_delay(Duration::from_millis(5)), 0);
    }

    #[test]
    fn test_long_publish_stall_warns_once() {
        assert_eq!(
            warnings_for_publish_delay(STALL_WARN_AFTER + Duration::from_millis(150)),
            1
        );
    }

    #[test]
    fn test_debug_shows_counters() {
        let buf = RingBuf::new(2).unwrap();
        buf.insert(1u8).unwrap();
        let text = format!("{buf:?}");
        assert!(text.contains("capacity: 2"));
        assert!(text.contains("write_pointer: 1"));
    }
}
