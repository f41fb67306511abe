//! Stress tests for the concurrent protocols.

#[cfg(test)]
mod stress_tests {
    use crate::arch::detection::CoreId;
    use crate::arch::{DefaultPlatform as P, Platform};
    use crate::errors::KernelError;
    use crate::section::critical;
    use crate::section::{enter_critical, enter_exclusive, exit_critical, exit_exclusive};
    use crate::tests::helpers::{spawn_core, RacyCell, TestEnvironment};
    use crate::time::{get_time, update_time, TICK_INCREMENT_US};
    use portable_atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn seqlock_reads_never_tear_under_contention() {
        let _env = TestEnvironment::new();
        let writer_done = Arc::new(AtomicBool::new(false));

        // The tick handler hammers the clock from CM7 while CM4 reads it.
        let done = writer_done.clone();
        let writer = spawn_core(CoreId::Cm7, move || {
            for _ in 0..150_000 {
                update_time();
                for _ in 0..20 {
                    core::hint::spin_loop();
                }
            }
            done.store(true, Ordering::Release);
        });

        let done = writer_done.clone();
        let reader = spawn_core(CoreId::Cm4, move || {
            let mut last = 0i64;
            let mut successes = 0u64;
            // Keep reading until the writer is done, and long enough to
            // have produced a meaningful sample even if this thread was
            // scheduled late.
            while !done.load(Ordering::Acquire) || successes < 10_000 {
                match get_time() {
                    Ok(now) => {
                        // A torn read would produce a value that is not a
                        // whole number of ticks, or one that goes backwards.
                        assert_eq!(now % TICK_INCREMENT_US, 0);
                        assert!(now >= last);
                        last = now;
                        successes += 1;
                    }
                    Err(KernelError::Timeout) => {}
                    Err(other) => panic!("unexpected clock error: {other}"),
                }
            }
            successes
        });

        writer.join().expect("writer panicked");
        let successes = reader.join().expect("reader panicked");
        assert!(successes >= 10_000);
        assert_eq!(get_time(), Ok(150_000 * TICK_INCREMENT_US));
    }

    #[test]
    fn exclusive_section_is_mutually_exclusive() {
        const PER_CORE: u64 = 1_500;
        static COUNTER: RacyCell<u64> = RacyCell::new(0);

        let mut env = TestEnvironment::new();
        env.start_ticker();
        env.start_wake_pumps();

        let contend = |core: CoreId| {
            spawn_core(core, move || {
                let mut acquired = 0u64;
                while acquired < PER_CORE {
                    match enter_exclusive() {
                        Ok(()) => {}
                        // Contention past the bound; try again
                        Err(KernelError::Timeout) => continue,
                        Err(other) => panic!("enter_exclusive failed: {other}"),
                    }
                    // Safety: the exclusive section is what guarantees
                    // sole access; that is the property under test.
                    unsafe {
                        *COUNTER.get() += 1;
                    }
                    loop {
                        match exit_exclusive() {
                            Ok(()) => break,
                            // The peer's acknowledgment window lapsed while
                            // we held the section; reopen it and retry.
                            Err(KernelError::Timeout) => {
                                P::dsb();
                                P::sev();
                            }
                            Err(other) => panic!("exit_exclusive failed: {other}"),
                        }
                    }
                    acquired += 1;
                }
            })
        };

        let cm7 = contend(CoreId::Cm7);
        let cm4 = contend(CoreId::Cm4);
        cm7.join().expect("CM7 contender panicked");
        cm4.join().expect("CM4 contender panicked");

        // Safety: both contenders have joined.
        assert_eq!(unsafe { *COUNTER.get() }, 2 * PER_CORE);
    }

    #[test]
    fn deep_critical_nesting_on_both_cores() {
        const DEPTH: usize = 10_000;
        let _env = TestEnvironment::new();

        let nest = |core: CoreId| {
            spawn_core(core, move || {
                for _ in 0..DEPTH {
                    enter_critical();
                }
                for _ in 0..DEPTH {
                    exit_critical().expect("exit_critical failed");
                }
            })
        };

        let cm7 = nest(CoreId::Cm7);
        let cm4 = nest(CoreId::Cm4);
        cm7.join().expect("CM7 thread panicked");
        cm4.join().expect("CM4 thread panicked");

        assert_eq!(critical::depth_for_test(CoreId::Cm7), 0);
        assert_eq!(critical::depth_for_test(CoreId::Cm4), 0);
    }
}
