//! Cortex-M7/M4 implementation of the architecture facade.
//!
//! Everything here is a thin wrapper over an instruction or a System
//! Control Block register. Both cores of the STM32H755 expose the same
//! register map at the same private-peripheral addresses, so one
//! implementation serves CM7 and CM4.

use super::Platform;
use core::arch::asm;

/// SCB CPUID register (core-private).
const SCB_CPUID: *const u32 = 0xE000_ED00 as *const u32;

/// SCB System Control Register (core-private).
const SCB_SCR: *mut u32 = 0xE000_ED10 as *mut u32;

/// SCB Application Interrupt and Reset Control Register.
const SCB_AIRCR: *mut u32 = 0xE000_ED0C as *mut u32;

/// SLEEPDEEP bit in SCB_SCR.
const SCR_SLEEPDEEP: u32 = 1 << 2;

/// SYSRESETREQ bit in SCB_AIRCR.
const AIRCR_SYSRESETREQ: u32 = 1 << 2;

/// Key value for the VECTKEY field; AIRCR writes are ignored without it.
const AIRCR_VECTKEY: u32 = 0x05FA << 16;

/// PRIGROUP field of AIRCR, preserved across the reset-request write.
const AIRCR_PRIGROUP_MASK: u32 = 0x0000_0700;

/// Cortex-M implementation of [`Platform`].
pub struct CortexM;

impl Platform for CortexM {
    #[inline(always)]
    fn isb() {
        unsafe { asm!("isb", options(nostack, preserves_flags)) };
    }

    #[inline(always)]
    fn dsb() {
        unsafe { asm!("dsb", options(nostack, preserves_flags)) };
    }

    #[inline(always)]
    fn wfi() {
        unsafe { asm!("wfi", options(nomem, nostack, preserves_flags)) };
    }

    #[inline(always)]
    fn wfe() {
        unsafe { asm!("wfe", options(nomem, nostack, preserves_flags)) };
    }

    #[inline(always)]
    fn sev() {
        unsafe { asm!("sev", options(nomem, nostack, preserves_flags)) };
    }

    #[inline]
    fn set_basepri(level: u8) {
        unsafe {
            asm!("msr BASEPRI, {}", in(reg) level as u32, options(nomem, nostack));
        }
    }

    #[inline]
    fn disable_faults() {
        unsafe { asm!("cpsid f", options(nomem, nostack)) };
    }

    #[inline]
    fn cpu_part_number() -> u32 {
        // PARTNO is CPUID[15:4]
        let cpuid = unsafe { SCB_CPUID.read_volatile() };
        (cpuid >> 4) & 0xFFF
    }

    #[inline]
    fn active_interrupt() -> u32 {
        let ipsr: u32;
        unsafe {
            asm!("mrs {}, IPSR", out(reg) ipsr, options(nomem, nostack, preserves_flags));
        }
        ipsr
    }

    #[inline]
    fn sleep_deep() {
        unsafe {
            let scr = SCB_SCR.read_volatile();
            SCB_SCR.write_volatile(scr | SCR_SLEEPDEEP);
        }
    }

    #[inline]
    fn request_system_reset() {
        unsafe {
            let aircr = SCB_AIRCR.read_volatile();
            SCB_AIRCR
                .write_volatile(AIRCR_VECTKEY | (aircr & AIRCR_PRIGROUP_MASK) | AIRCR_SYSRESETREQ);
        }
    }

    fn halt() -> ! {
        loop {
            Self::wfe();
        }
    }
}
