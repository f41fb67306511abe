//! Test helper utilities and common functionality.

use crate::arch::detection::CoreId;
use crate::arch::host;
use core::cell::UnsafeCell;
use portable_atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use std::vec::Vec;

// The kernel state is process-wide, so tests that touch it cannot run
// concurrently with each other.
static SERIAL: spin::Mutex<()> = spin::Mutex::new(());

/// Host-time period of the emulated kernel tick.
///
/// Deliberately slow relative to thread scheduling latency so the
/// microsecond-denominated protocol timeouts never fire spuriously.
pub(crate) const TICK_PERIOD: Duration = Duration::from_millis(1);

/// Serialized test environment over the process-wide kernel state.
///
/// Acquiring it resets the kernel and the emulated platform to their
/// power-on state; dropping it stops and joins any worker threads it
/// spawned.
pub(crate) struct TestEnvironment {
    _serial: spin::MutexGuard<'static, ()>,
    stop: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,
}

impl TestEnvironment {
    pub(crate) fn new() -> Self {
        let serial = SERIAL.lock();
        host::reset_state();
        host::set_current_core(CoreId::Cm7);
        host::set_interrupt_context(false);
        crate::time::clock::reset_for_test();
        crate::section::critical::reset_for_test();
        crate::section::exclusive::reset_for_test();
        crate::system::reset_for_test();
        Self {
            _serial: serial,
            stop: Arc::new(AtomicBool::new(false)),
            workers: Vec::new(),
        }
    }

    /// Drive the kernel tick from a dedicated thread, one tick per
    /// [`TICK_PERIOD`] of host time.
    pub(crate) fn start_ticker(&mut self) {
        let stop = self.stop.clone();
        self.workers.push(thread::spawn(move || {
            // The tick is carried by CM7 in the reference wiring.
            host::set_current_core(CoreId::Cm7);
            host::set_interrupt_context(true);
            while !stop.load(Ordering::Acquire) {
                crate::time::update_time();
                thread::sleep(TICK_PERIOD);
            }
        }));
    }

    /// Emulate both cores' cross-core wake interrupt lines: one thread
    /// per core polls the event latch and runs the wake handler.
    pub(crate) fn start_wake_pumps(&mut self) {
        for core in [CoreId::Cm7, CoreId::Cm4] {
            let stop = self.stop.clone();
            self.workers.push(thread::spawn(move || {
                host::set_current_core(core);
                host::set_interrupt_context(true);
                while !stop.load(Ordering::Acquire) {
                    if host::take_event(core) {
                        crate::system::sev_wake_handler();
                    } else {
                        thread::yield_now();
                    }
                }
            }));
        }
    }
}

impl Drop for TestEnvironment {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

/// Spawn a thread that adopts `core`'s identity before running `f`.
pub(crate) fn spawn_core<F, T>(core: CoreId, f: F) -> JoinHandle<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    thread::spawn(move || {
        host::set_current_core(core);
        f()
    })
}

/// Spawn a detached wake-interrupt pump for `core`.
///
/// Used by shutdown tests, where the handler never returns and the
/// thread can therefore not be joined.
pub(crate) fn spawn_detached_pump(core: CoreId) {
    let _ = thread::spawn(move || {
        host::set_current_core(core);
        host::set_interrupt_context(true);
        loop {
            if host::take_event(core) {
                crate::system::sev_wake_handler();
            } else {
                thread::yield_now();
            }
        }
    });
}

/// Poll `pred` until it holds or `timeout` of host time elapses.
pub(crate) fn wait_until<F: FnMut() -> bool>(mut pred: F, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if pred() {
            return true;
        }
        thread::yield_now();
    }
    pred()
}

/// A deliberately unsynchronized cell for mutual-exclusion tests: if the
/// exclusive section ever admits both cores, increments through it race.
pub(crate) struct RacyCell<T>(UnsafeCell<T>);

unsafe impl<T> Sync for RacyCell<T> {}

impl<T> RacyCell<T> {
    pub(crate) const fn new(value: T) -> Self {
        Self(UnsafeCell::new(value))
    }

    /// # Safety
    ///
    /// Caller must guarantee exclusive access for the duration of the
    /// returned pointer's use.
    pub(crate) unsafe fn get(&self) -> *mut T {
        self.0.get()
    }
}
