//! Software tick source for hosted targets
//!
//! Stands in for the hardware timer interrupt: a background thread calls
//! `Scheduler::tick` once per period. Ticks are scheduled against absolute
//! deadlines, so a late wakeup does not stretch the following periods.
//!
//! Author: Moroya Sakamoto

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::debug;

use crate::idle::Idle;
use crate::scheduler::Scheduler;

/// Periodic tick thread bound to one scheduler
///
/// Stops when `stop` is called or the ticker is dropped.
pub struct Ticker {
    stop: Arc<AtomicBool>,
    delivered: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Start ticking `scheduler` every `period`
    pub fn start<const N: usize, I>(
        scheduler: &'static Scheduler<'static, N, I>,
        period: Duration,
    ) -> Self
    where
        I: Idle + Sync,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let delivered = Arc::new(AtomicU64::new(0));

        let handle = {
            let stop = Arc::clone(&stop);
            let delivered = Arc::clone(&delivered);
            thread::spawn(move || {
                let mut deadline = Instant::now() + period;
                while !stop.load(Ordering::Acquire) {
                    let now = Instant::now();
                    if now < deadline {
                        thread::park_timeout(deadline - now);
                        continue;
                    }
                    scheduler.tick();
                    delivered.fetch_add(1, Ordering::Relaxed);
                    deadline += period;
                }
            })
        };
        debug!("rtcs: ticker started ({:?} per tick)", period);

        Self {
            stop,
            delivered,
            handle: Some(handle),
        }
    }

    /// Ticks delivered so far
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Stop the tick thread, returning the number of ticks delivered
    pub fn stop(mut self) -> u64 {
        self.halt();
        self.delivered()
    }

    fn halt(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.stop.store(true, Ordering::Release);
            handle.thread().unpark();
            let _ = handle.join();
            debug!("rtcs: ticker stopped after {} ticks", self.delivered());
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.halt();
    }
}
