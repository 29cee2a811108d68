//! # Fixed-Capacity Ring Buffers
//!
//! 固定容量环形缓冲区
//!
//! `easyring` provides a lock-free Multi Producer Multi Consumer (MPMC) ring buffer
//! built on a ticket claim/publish protocol, plus two simpler siblings for
//! lower-contention use.
//!
//! `easyring` 提供基于票据领取/发布协议的无锁多生产者多消费者（MPMC）环形缓冲区，
//! 以及两个适用于低竞争场景的简单变体。
//!
//! ## Features
//!
//! 特性
//!
//! - **Lock-Free** - Four atomic counters, CAS claim and in-order publish
//! - **Strict FIFO** - Items become visible in exactly the order tickets were claimed
//! - **Bounded** - Fixed power-of-two capacity, no allocation on the data path
//! - **Guarded Variant** - `parking_lot` mutex ring with exact queries
//! - **Rolling Windows** - Overwrite-oldest windows for log lines and samples
//!
//! - **无锁设计** - 四个原子计数器，CAS 领取与按序发布
//! - **严格 FIFO** - 元素按票据领取顺序可见
//! - **有界** - 固定的 2 的幂次容量，数据路径上无内存分配
//! - **加锁变体** - 基于 `parking_lot` 互斥锁的环，查询结果精确
//! - **滚动窗口** - 覆盖最旧数据的日志行与样本窗口
//!
//! ## Quick Start
//!
//! 快速开始
//!
//! ```rust
//! use easyring::RingBuf;
//!
//! // Capacity must be a power of two
//! // 容量必须是 2 的幂次
//! let buf = RingBuf::new(8).unwrap();
//!
//! buf.insert(42).unwrap();
//! buf.insert(100).unwrap();
//!
//! assert_eq!(buf.remove().unwrap(), 42);
//! assert_eq!(buf.remove().unwrap(), 100);
//! ```
//!
//! ## Multi-threaded Usage
//!
//! 多线程使用
//!
//! ```rust
//! use easyring::RingBuf;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let buf = Arc::new(RingBuf::new(64).unwrap());
//!
//! let producers: Vec<_> = (0..2)
//!     .map(|p| {
//!         let buf = Arc::clone(&buf);
//!         thread::spawn(move || {
//!             for i in 0..100 {
//!                 let mut item = p * 100 + i;
//!                 // Full is transient: retry once consumers make room
//!                 // Full 是暂时性的：消费者腾出空间后重试
//!                 while let Err(err) = buf.insert(item) {
//!                     item = err.into_inner().unwrap();
//!                     thread::yield_now();
//!                 }
//!             }
//!         })
//!     })
//!     .collect();
//!
//! let mut received = Vec::new();
//! while received.len() < 200 {
//!     match buf.remove() {
//!         Ok(v) => received.push(v),
//!         Err(_) => thread::yield_now(),
//!     }
//! }
//!
//! for handle in producers {
//!     handle.join().unwrap();
//! }
//! received.sort();
//! assert_eq!(received, (0..200).collect::<Vec<_>>());
//! ```
//!
//! ## Rolling Windows
//!
//! 滚动窗口
//!
//! ```rust
//! use easyring::LogWindow;
//!
//! let mut errors = LogWindow::new(100).unwrap();
//! errors.add("ERROR: Line count not found".to_string());
//! assert_eq!(errors.last(10).len(), 1);
//! ```
//!
//! ## Notes
//!
//! 注意事项
//!
//! - Capacity is never rounded: non-powers of two are rejected by `RingBuf::new`
//! - `len`, `is_empty`, `is_full` and `get` are snapshots and may be stale under concurrency
//! - A thread stalled between claiming and publishing a ticket stalls every later ticket
//! - `reset` takes `&mut self`, so it cannot race with inserts or removes
//!
//! - 容量不会取整：`RingBuf::new` 拒绝非 2 的幂次容量
//! - `len`、`is_empty`、`is_full` 和 `get` 是快照，并发下可能过时
//! - 在领取与发布票据之间停滞的线程会阻塞所有更晚的票据
//! - `reset` 需要 `&mut self`，因此不会与插入或移除竞争

#![warn(missing_docs)]

pub mod error;
pub mod guarded;
pub mod lockfree;
pub mod window;
mod core;
mod shim;

pub use error::RingBufError;
pub use guarded::GuardedRingBuf;
pub use lockfree::RingBuf;
pub use window::{LogWindow, RollingWindow, SampleWindow};

#[cfg(test)]
mod tests;
