//! Concurrent tests for the guarded ring buffer
//!
//! 受保护环形缓冲区的并发测试

use crate::guarded::GuardedRingBuf;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

#[test]
fn test_concurrent_non_overwrite_mode() {
    // Eight writers race for 64 slots; exactly 64 inserts succeed
    // 八个写者竞争 64 个槽位，恰好 64 次插入成功
    let buf = Arc::new(GuardedRingBuf::new(64).unwrap());
    let success_count = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..8)
        .map(|thread_id| {
            let buf = Arc::clone(&buf);
            let success_count = Arc::clone(&success_count);
            thread::spawn(move || {
                for i in 0..50 {
                    if buf.insert(thread_id * 1000 + i).is_ok() {
                        success_count.fetch_add(1, Ordering::SeqCst);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(success_count.load(Ordering::SeqCst), 64);
    assert_eq!(buf.len(), 64);
    assert!(buf.is_full());
}

#[test]
fn test_concurrent_readers_and_writers() {
    const WRITERS: usize = 4;
    const PER_WRITER: usize = 2_000;
    const TOTAL: usize = WRITERS * PER_WRITER;

    let buf = Arc::new(GuardedRingBuf::<usize>::new(32).unwrap());
    let consumed = Arc::new(AtomicUsize::new(0));

    let writers: Vec<_> = (0..WRITERS)
        .map(|w| {
            let buf = Arc::clone(&buf);
            thread::spawn(move || {
                for i in 0..PER_WRITER {
                    let mut item = w * PER_WRITER + i;
                    while let Err(err) = buf.insert(item) {
                        item = err.into_inner().unwrap();
                        thread::yield_now();
                    }
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..2)
        .map(|_| {
            let buf = Arc::clone(&buf);
            let consumed = Arc::clone(&consumed);
            thread::spawn(move || {
                let mut local = Vec::new();
                while consumed.load(Ordering::SeqCst) < TOTAL {
                    match buf.remove() {
                        Ok(v) => {
                            local.push(v);
                            consumed.fetch_add(1, Ordering::SeqCst);
                        }
                        Err(_) => thread::yield_now(),
                    }
                }
                local
            })
        })
        .collect();

    for handle in writers {
        handle.join().unwrap();
    }

    let mut seen = HashSet::new();
    for handle in readers {
        for v in handle.join().unwrap() {
            assert!(seen.insert(v));
        }
    }
    assert_eq!(seen.len(), TOTAL);
    assert!(buf.is_empty());
}

#[test]
fn test_reset_while_shared() {
    let buf = Arc::new(GuardedRingBuf::new(8).unwrap());
    for i in 0..8 {
        buf.insert(i).unwrap();
    }

    let other = Arc::clone(&buf);
    thread::spawn(move || other.reset()).join().unwrap();

    assert!(buf.is_empty());
    assert!(buf.get_all().is_empty());
}
