//! Exit-handler tables swept during shutdown.
//!
//! Three fixed-capacity tables: one per core for kernel teardown, plus a
//! shared MCU table that only the CM7 path sweeps. Handlers are
//! registered at startup and run front-to-back, in registration order,
//! exactly once per table even when both cores shut down concurrently.

use crate::arch::detection::CoreId;
use crate::config::EXIT_TABLE_CAPACITY;
use crate::errors::{KernelError, KernelResult};
use portable_atomic::{AtomicBool, AtomicUsize, Ordering};

pub(crate) struct ExitTable {
    slots: [AtomicUsize; EXIT_TABLE_CAPACITY],
    len: AtomicUsize,
    ran: AtomicBool,
    register_lock: spin::Mutex<()>,
}

impl ExitTable {
    const EMPTY_SLOT: AtomicUsize = AtomicUsize::new(0);

    const fn new() -> Self {
        Self {
            slots: [Self::EMPTY_SLOT; EXIT_TABLE_CAPACITY],
            len: AtomicUsize::new(0),
            ran: AtomicBool::new(false),
            register_lock: spin::Mutex::new(()),
        }
    }

    /// Append a handler. Order of registration is order of execution.
    pub(crate) fn register(&self, handler: fn()) -> KernelResult<()> {
        let _guard = self.register_lock.lock();
        let len = self.len.load(Ordering::Acquire);
        if len == EXIT_TABLE_CAPACITY {
            return Err(KernelError::Busy);
        }
        self.slots[len].store(handler as usize, Ordering::Release);
        self.len.store(len + 1, Ordering::Release);
        Ok(())
    }

    /// Sweep the table front-to-back; every call after the first is a
    /// no-op, which is what makes concurrent shutdowns idempotent.
    pub(crate) fn run_once(&self) {
        if self.ran.swap(true, Ordering::AcqRel) {
            return;
        }
        let len = self.len.load(Ordering::Acquire);
        for slot in &self.slots[..len] {
            let raw = slot.load(Ordering::Acquire);
            if raw != 0 {
                // Safety: slots are only written by `register`, which
                // stores a `fn()`.
                let handler: fn() = unsafe { core::mem::transmute(raw) };
                handler();
            }
        }
    }

    #[cfg(test)]
    fn reset_for_test(&self) {
        let _guard = self.register_lock.lock();
        self.len.store(0, Ordering::SeqCst);
        self.ran.store(false, Ordering::SeqCst);
        for slot in &self.slots {
            slot.store(0, Ordering::SeqCst);
        }
    }
}

static CM7_EXIT: ExitTable = ExitTable::new();
static CM4_EXIT: ExitTable = ExitTable::new();
static MCU_EXIT: ExitTable = ExitTable::new();

pub(crate) fn kernel_table(core: CoreId) -> &'static ExitTable {
    match core {
        CoreId::Cm7 => &CM7_EXIT,
        CoreId::Cm4 => &CM4_EXIT,
    }
}

pub(crate) fn mcu_table() -> &'static ExitTable {
    &MCU_EXIT
}

#[cfg(test)]
pub(crate) fn reset_for_test() {
    CM7_EXIT.reset_for_test();
    CM4_EXIT.reset_for_test();
    MCU_EXIT.reset_for_test();
}
