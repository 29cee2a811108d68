//! Core slot storage - Shared by the lock-free ring buffer
//!
//! 核心槽位存储 - 供无锁环形缓冲区使用
//!
//! This module owns the fixed slot array and the power-of-two mask:
//! - Capacity validation (non-zero power of two, never rounded)
//! - Ticket to physical index mapping via the mask
//! - Raw slot access for callers that hold exclusive ownership of a ticket
//!
//! 此模块持有固定槽位数组和 2 的幂次掩码：
//! - 容量校验（非零且为 2 的幂次，不做取整）
//! - 通过掩码将票据映射为物理索引
//! - 为持有票据独占所有权的调用者提供原始槽位访问

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::ptr;

/// Fixed slot array addressed by `ticket & mask`
///
/// 以 `ticket & mask` 寻址的固定槽位数组
///
/// Slots carry no initialisation flag. Which slots are live is decided entirely by
/// the owner's counters, so every accessor is `unsafe`.
///
/// 槽位不携带初始化标记，哪些槽位有效完全由持有者的计数器决定，因此所有访问器都是 `unsafe`。
pub struct RingBufCore<T> {
    /// Slot storage, length == capacity
    ///
    /// 槽位存储，长度等于容量
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,

    /// Mask for fast modulo operation (capacity - 1)
    ///
    /// 快速取模运算的掩码（capacity - 1）
    mask: usize,
}

impl<T> RingBufCore<T> {
    /// Allocate the slot array
    ///
    /// 分配槽位数组
    ///
    /// Returns `None` if `capacity` is zero or not a power of two.
    ///
    /// 如果 `capacity` 为零或不是 2 的幂次，返回 `None`。
    pub fn new(capacity: usize) -> Option<Self> {
        if !is_valid_capacity(capacity) {
            return None;
        }

        let slots = (0..capacity)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Some(Self {
            slots,
            mask: capacity - 1,
        })
    }

    /// Number of slots
    ///
    /// 槽位数量
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Map a monotonically increasing ticket to a physical slot index
    ///
    /// 将单调递增的票据映射为物理槽位索引
    #[inline]
    pub fn index(&self, ticket: u64) -> usize {
        (ticket as usize) & self.mask
    }

    #[inline]
    fn slot_ptr(&self, index: usize) -> *mut T {
        debug_assert!(index < self.slots.len());
        // SAFETY: index is masked by every caller, so it is in bounds.
        unsafe { self.slots.get_unchecked(index).get().cast::<T>() }
    }

    /// Write a single element at the specified index
    ///
    /// 在指定索引处写入单个元素
    ///
    /// # Safety
    /// Caller must ensure:
    /// - The index is within bounds (use `index()` to calculate)
    /// - The caller exclusively owns the slot (claimed ticket)
    /// - The slot does not hold a live value, or that value was already moved out
    ///
    /// # 安全性
    /// 调用者必须确保：
    /// - 索引在边界内（使用 `index()` 计算）
    /// - 调用者独占该槽位（已领取票据）
    /// - 槽位中没有存活值，或其值已被移出
    #[inline]
    pub unsafe fn write_at(&self, index: usize, value: T) {
        unsafe { self.slot_ptr(index).write(value) }
    }

    /// Move the element out of the specified index
    ///
    /// 将指定索引处的元素移出
    ///
    /// # Safety
    /// Caller must ensure:
    /// - The index is within bounds
    /// - The slot holds a live, fully published value
    /// - The caller exclusively owns the slot; afterwards it is logically uninitialised
    ///
    /// # 安全性
    /// 调用者必须确保：
    /// - 索引在边界内
    /// - 槽位中存有已完全发布的有效值
    /// - 调用者独占该槽位；此后槽位在逻辑上未初始化
    #[inline]
    pub unsafe fn read_at(&self, index: usize) -> T {
        unsafe { self.slot_ptr(index).read() }
    }

    /// Bitwise copy of the element at the specified index without taking ownership
    ///
    /// 按位复制指定索引处的元素，不取得所有权
    ///
    /// # Safety
    /// Caller must ensure the index is within bounds and must validate the copy
    /// against the owner's counters before trusting it: a concurrent producer may be
    /// writing the slot.
    ///
    /// # 安全性
    /// 调用者必须确保索引在边界内，并在信任该副本之前用计数器进行校验：并发生产者可能正在写入该槽位。
    #[inline]
    pub unsafe fn copy_at(&self, index: usize) -> T
    where
        T: Copy,
    {
        unsafe { ptr::read_volatile(self.slot_ptr(index)) }
    }

    /// Borrow the element at the specified index
    ///
    /// 借用指定索引处的元素
    ///
    /// # Safety
    /// The slot must hold a live value and nobody may move it out or overwrite it
    /// while the reference is alive.
    ///
    /// # 安全性
    /// 槽位必须存有有效值，且引用存活期间任何人不得移出或覆盖它。
    #[inline]
    pub unsafe fn peek_at(&self, index: usize) -> &T {
        unsafe { &*self.slot_ptr(index) }
    }

    /// Drop the element in place
    ///
    /// 原地 drop 元素
    ///
    /// # Safety
    /// The slot must hold a live value that nobody else will read afterwards.
    ///
    /// # 安全性
    /// 槽位必须存有有效值，且此后没有其他人会读取它。
    #[inline]
    pub unsafe fn drop_at(&self, index: usize) {
        unsafe { ptr::drop_in_place(self.slot_ptr(index)) }
    }
}

/// Capacity accepted by the masked ring: non-zero power of two
///
/// 掩码环形结构接受的容量：非零的 2 的幂次
#[inline]
pub fn is_valid_capacity(capacity: usize) -> bool {
    capacity.is_power_of_two()
}
