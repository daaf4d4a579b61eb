//! Idle strategies for the dispatch loop
//!
//! When a scan finds nothing pending, `Scheduler::run` calls `Idle::wait`,
//! handing it a re-check of the table. `Scheduler::tick` calls `Idle::wake`
//! whenever a slot was released.
//! Whatever the strategy, the next scan starts again from priority 0.
//!
//! Author: Moroya Sakamoto

/// What the dispatch loop does between releases
pub trait Idle {
    /// Called by the dispatch loop after an empty scan.
    ///
    /// `pending` reports whether a release arrived since the scan; return
    /// without sleeping when it does.
    fn wait(&self, pending: impl Fn() -> bool);
    /// Called by the tick source after at least one release
    fn wake(&self);
}

/// Busy-poll: rescan immediately
#[derive(Debug, Default, Clone, Copy)]
pub struct Spin;

impl Idle for Spin {
    #[inline]
    fn wait(&self, _pending: impl Fn() -> bool) {
        core::hint::spin_loop();
    }

    #[inline]
    fn wake(&self) {}
}

/// Sleep until the next interrupt (Cortex-M `WFI`)
///
/// The re-check and `WFI` run with interrupts masked: a tick that lands in
/// between stays pending and ends the sleep at once, so no release waits a
/// whole extra period. The tick interrupt itself wakes the core, so `wake`
/// has nothing to do.
#[cfg(feature = "cortex-m")]
#[derive(Debug, Default, Clone, Copy)]
pub struct Wfi;

#[cfg(feature = "cortex-m")]
impl Idle for Wfi {
    #[inline]
    fn wait(&self, pending: impl Fn() -> bool) {
        cortex_m::interrupt::free(|_| {
            if !pending() {
                cortex_m::asm::wfi();
            }
        });
    }

    #[inline]
    fn wake(&self) {}
}

/// Block the dispatch thread until the ticker releases something
///
/// The flag is sticky: a `wake` that arrives before `wait` is not lost.
#[cfg(feature = "std")]
pub struct Parker {
    released: parking_lot::Mutex<bool>,
    cond: parking_lot::Condvar,
}

#[cfg(feature = "std")]
impl Parker {
    /// Parker with no wake recorded
    pub const fn new() -> Self {
        Self {
            released: parking_lot::Mutex::new(false),
            cond: parking_lot::Condvar::new(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for Parker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Idle for Parker {
    fn wait(&self, pending: impl Fn() -> bool) {
        if pending() {
            return;
        }
        let mut released = self.released.lock();
        while !*released {
            self.cond.wait(&mut released);
        }
        *released = false;
    }

    fn wake(&self) {
        *self.released.lock() = true;
        self.cond.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spin_never_blocks() {
        let spin = Spin;
        spin.wake();
        spin.wait(|| false);
        spin.wait(|| true);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_parker_wake_before_wait() {
        let parker = Parker::new();
        parker.wake();
        // Returns immediately: the earlier wake is remembered
        parker.wait(|| false);
        assert!(!*parker.released.lock());
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_parker_wakes_blocked_thread() {
        use std::sync::Arc;

        let parker = Arc::new(Parker::new());
        let waiter = {
            let parker = Arc::clone(&parker);
            std::thread::spawn(move || parker.wait(|| false))
        };
        std::thread::sleep(std::time::Duration::from_millis(10));
        parker.wake();
        waiter.join().unwrap();
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_parker_skips_sleep_when_pending() {
        let parker = Parker::new();
        // No wake recorded: only the re-check keeps this from blocking
        parker.wait(|| true);
        assert!(!*parker.released.lock());
    }
}
