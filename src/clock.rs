// src/clock.rs
//! Hardware cycle counter access and wall-clock calibration
//!
//! Free-running cycle counters are not required to tick at any advertised
//! frequency, so the only portable way to convert tick deltas into real time
//! units is to measure the ratio against a monotonic wall clock once at
//! startup.
//!
//! Counter sources by target:
//!
//! - **x86_64**: `rdtscp` (carries an implicit pipeline flush, unlike `rdtsc`)
//! - **aarch64**: `cntvct_el0` virtual counter
//! - **other**: monotonic nanoseconds since a process-local start instant

use std::time::{Duration, Instant};

use tracing::debug;

/// Measured ratio between the cycle counter and wall-clock time.
#[derive(Debug, Clone, Copy)]
pub struct Calibration {
    /// Counter ticks per wall-clock second
    pub ticks_per_second: f64,
}

/// Read the hardware cycle counter.
#[inline(always)]
pub fn read_cycle_counter() -> u64 {
    #[cfg(target_arch = "x86_64")]
    {
        let mut aux = 0u32;
        unsafe { std::arch::x86_64::__rdtscp(&mut aux) }
    }

    #[cfg(target_arch = "aarch64")]
    {
        let ticks: u64;
        unsafe {
            std::arch::asm!("mrs {}, cntvct_el0", out(reg) ticks, options(nomem, nostack));
        }
        ticks
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        use std::sync::OnceLock;
        static START: OnceLock<Instant> = OnceLock::new();
        START.get_or_init(Instant::now).elapsed().as_nanos() as u64
    }
}

/// Measure the counter frequency against the monotonic wall clock.
///
/// Reads the counter and the clock, sleeps for `period`, reads both again,
/// and divides. There is no error path: a preempted sleep or a coarse clock
/// only degrades the accuracy of the computed ratio. Runs once at startup,
/// off any hot path.
pub fn calibrate(period: Duration) -> Calibration {
    let wall_start = Instant::now();
    let tick_start = read_cycle_counter();

    std::thread::sleep(period);

    let wall_nanos = wall_start.elapsed().as_nanos() as f64;
    let tick_end = read_cycle_counter();

    let ticks = tick_end.wrapping_sub(tick_start) as f64;
    let ticks_per_second = ticks / wall_nanos * 1e9;

    debug!(
        "calibrated cycle counter: {:.0} ticks/s over {:?}",
        ticks_per_second, period
    );

    Calibration { ticks_per_second }
}
