use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crossbeam_channel::{Receiver, Sender};

/// Cooperative cancellation token shared by every pipeline component.
///
/// Starts clear and transitions to set exactly once; it is never reset.
/// Besides the flag, setting the signal disconnects an internal channel so
/// threads blocked in `crossbeam_channel::select!` on [`StopSignal::watch`]
/// wake up immediately instead of waiting out their timeout.
#[derive(Clone)]
pub struct StopSignal {
    inner: Arc<Inner>,
}

struct Inner {
    flag: AtomicBool,
    trigger: Mutex<Option<Sender<()>>>,
    watch: Receiver<()>,
}

impl StopSignal {
    pub fn new() -> Self {
        let (trigger, watch) = crossbeam_channel::bounded(0);
        Self {
            inner: Arc::new(Inner {
                flag: AtomicBool::new(false),
                trigger: Mutex::new(Some(trigger)),
                watch,
            }),
        }
    }

    pub fn is_set(&self) -> bool {
        self.inner.flag.load(Ordering::Acquire)
    }

    /// Sets the signal. Returns `true` only for the call that flipped it.
    pub fn set(&self) -> bool {
        if self.inner.flag.swap(true, Ordering::AcqRel) {
            return false;
        }
        // Poisoning only happens if a holder panicked mid-take; the sender
        // is still there to drop in that case.
        let mut trigger = match self.inner.trigger.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        trigger.take();
        true
    }

    /// Receiver that becomes ready (disconnected) once the signal is set.
    ///
    /// Nothing is ever sent on it, so any `recv` completing means "stop".
    pub fn watch(&self) -> &Receiver<()> {
        &self.inner.watch
    }

    /// Returns a guard that sets the signal when dropped.
    pub fn set_on_drop(&self) -> SetOnDrop {
        SetOnDrop {
            signal: self.clone(),
        }
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StopSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StopSignal")
            .field("set", &self.is_set())
            .finish()
    }
}

/// Sets the owning [`StopSignal`] on drop, including during unwinding.
pub struct SetOnDrop {
    signal: StopSignal,
}

impl Drop for SetOnDrop {
    fn drop(&mut self) {
        if self.signal.set() {
            log::debug!("Stop signal set on scope exit");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn test_starts_clear() {
        assert!(!StopSignal::new().is_set());
    }

    #[test]
    fn test_set_is_monotonic_and_reports_first_transition() {
        let stop = StopSignal::new();
        assert!(stop.set());
        assert!(stop.is_set());
        assert!(!stop.set());
        assert!(stop.is_set());
    }

    #[test]
    fn test_clones_share_state() {
        let stop = StopSignal::new();
        let other = stop.clone();
        other.set();
        assert!(stop.is_set());
    }

    #[test]
    fn test_watch_blocks_until_set() {
        let stop = StopSignal::new();
        assert!(stop
            .watch()
            .recv_timeout(Duration::from_millis(10))
            .is_err_and(|e| e.is_timeout()));
        stop.set();
        assert!(stop
            .watch()
            .recv_timeout(Duration::from_millis(10))
            .is_err_and(|e| e.is_disconnected()));
    }

    #[test]
    fn test_set_wakes_blocked_thread() {
        let stop = StopSignal::new();
        let waiter = stop.clone();
        let handle = thread::spawn(move || {
            let start = Instant::now();
            let _ = waiter.watch().recv_timeout(Duration::from_secs(10));
            start.elapsed()
        });
        thread::sleep(Duration::from_millis(20));
        stop.set();
        let waited = handle.join().unwrap();
        assert!(waited < Duration::from_secs(5));
    }

    #[test]
    fn test_guard_sets_on_drop() {
        let stop = StopSignal::new();
        {
            let _guard = stop.set_on_drop();
            assert!(!stop.is_set());
        }
        assert!(stop.is_set());
    }

    #[test]
    fn test_guard_sets_during_panic() {
        let stop = StopSignal::new();
        let inner = stop.clone();
        let result = thread::spawn(move || {
            let _guard = inner.set_on_drop();
            panic!("boom");
        })
        .join();
        assert!(result.is_err());
        assert!(stop.is_set());
    }
}
