//! Shim module to abstract over std and loom primitives.
//!
//! This module provides a unified interface for synchronization primitives that transparently
//! switches between `std` implementation (for production) and `loom` implementation (for testing).
//!
//! 此模块为同步原语提供统一接口，在 `std`（生产）与 `loom`（测试）实现之间透明切换。

#[cfg(not(feature = "loom"))]
pub mod atomic {
    pub use std::sync::atomic::*;
}

#[cfg(feature = "loom")]
pub mod atomic {
    pub use loom::sync::atomic::*;
}

/// Wait strategy for the publish step of the ticket protocol
///
/// 票据协议发布阶段的等待策略
///
/// Spins with exponential backoff and falls back to yielding the thread once the
/// backoff saturates. Under loom every step yields to the model scheduler, otherwise
/// loom would reject the spin loop as non-terminating.
///
/// 使用指数退避自旋，退避饱和后让出线程。在 loom 下每一步都让出给模型调度器。
pub struct SpinWait {
    #[cfg(not(feature = "loom"))]
    backoff: crossbeam_utils::Backoff,
}

impl SpinWait {
    /// Fresh wait with no backoff accumulated
    ///
    /// 创建尚未累积退避的等待
    #[inline]
    pub fn new() -> Self {
        Self {
            #[cfg(not(feature = "loom"))]
            backoff: crossbeam_utils::Backoff::new(),
        }
    }

    /// Back off once
    ///
    /// 退避一次
    #[inline]
    pub fn snooze(&self) {
        #[cfg(not(feature = "loom"))]
        self.backoff.snooze();
        #[cfg(feature = "loom")]
        loom::thread::yield_now();
    }

    /// Whether spinning has stopped paying off and the waiter is now yielding
    ///
    /// 自旋是否已饱和（此后等待者改为让出线程）
    #[inline]
    pub fn is_saturated(&self) -> bool {
        #[cfg(not(feature = "loom"))]
        {
            self.backoff.is_completed()
        }
        #[cfg(feature = "loom")]
        {
            false
        }
    }
}
