//! Rolling log windows shared by an application, plus a lock-free work queue
//!
//! 应用共享的滚动日志窗口，以及一个无锁工作队列
//!
//! Run with `RUST_LOG=debug cargo run --example log_windows` to see the buffer events.

use easyring::{LogWindow, RingBuf, SampleWindow};
use parking_lot::Mutex;
use std::error::Error;
use std::sync::Arc;
use std::thread;
use tracing::info;
use tracing_subscriber::EnvFilter;

struct App {
    info: Mutex<LogWindow>,
    warn: Mutex<LogWindow>,
    error: Mutex<LogWindow>,
    samples: Mutex<SampleWindow>,
}

impl App {
    fn new(capacity: usize) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            info: Mutex::new(LogWindow::new(capacity)?),
            warn: Mutex::new(LogWindow::new(capacity)?),
            error: Mutex::new(LogWindow::new(capacity)?),
            samples: Mutex::new(SampleWindow::new(capacity)?),
        })
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let app = App::new(100)?;

    app.info.lock().add("INFO: service started".to_string());
    app.warn.lock().add("WARN: Application has bad references".to_string());
    app.error.lock().add("ERROR: Line count not found".to_string());

    let pi = 3.145926;
    for i in 0..=300 {
        app.samples.lock().add(i as f64 + pi);
    }

    info!(last = ?app.info.lock().last(10), "last INFO messages");
    info!(last = ?app.warn.lock().last(10), "last WARN messages");
    info!(last = ?app.error.lock().last(10), "last ERROR messages");

    {
        let samples = app.samples.lock();
        info!(last = ?samples.last(10), "last samples");
        info!(capacity = samples.capacity(), "sample window capacity");
        info!(range = ?samples.range(10, 25), "samples at positions 10..25");
        info!(mean = ?samples.mean(), min = ?samples.min(), max = ?samples.max(), "sample stats");
    }
    app.samples.lock().reset();

    // Work queue: two producers, one consumer
    let queue = Arc::new(RingBuf::<u32>::new(16)?);
    let producers: Vec<_> = (0..2u32)
        .map(|p| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..50 {
                    let mut job = p * 1000 + i;
                    while let Err(err) = queue.insert(job) {
                        job = err.into_inner().unwrap_or(job);
                        thread::yield_now();
                    }
                }
            })
        })
        .collect();

    let mut processed = 0;
    while processed < 100 {
        match queue.remove() {
            Ok(_) => processed += 1,
            Err(_) => thread::yield_now(),
        }
    }
    for handle in producers {
        handle.join().map_err(|_| "producer panicked")?;
    }
    info!(processed, "work queue drained");

    Ok(())
}
