//! Paced main loop.
//!
//! Drives [`Pib::tick`] at a fixed cadence with per-cycle timing stats.
//!
//! ## RT Setup Sequence (`rt` feature)
//! 1. `mlockall(MCL_CURRENT | MCL_FUTURE)` — lock all pages.
//! 2. Prefault stack pages.
//! 3. `sched_setaffinity` — pin to a core.
//! 4. `sched_setscheduler(SCHED_FIFO)` — RT priority.
//! 5. Absolute-time sleep on `CLOCK_MONOTONIC` for drift-free pacing.
//!
//! Without the feature every RT call is a no-op and pacing falls back to
//! `std::thread::sleep` — fine for ground test, where the tick cadence is
//! seconds, not microseconds.
//!
//! The runner also drains the typed outboxes each cycle. In a flight
//! harness the host forwards them to the serial links; here they land in
//! the log, which is what ground test wants anyway.

use std::time::Instant;

use pib_common::msg::zephyr::ZephyrMsg;
use pib_common::time::TickClock;
use tracing::{debug, info};

use crate::supervisor::Pib;

/// Errors during RT setup or loop execution.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("RT setup error: {0}")]
    RtSetup(String),
    #[error("invalid tick rate: {0} Hz")]
    BadRate(u32),
}

// ─── Cycle statistics ───────────────────────────────────────────────

/// O(1) per-cycle timing statistics.
#[derive(Debug, Clone)]
pub struct TickStats {
    /// Total ticks executed.
    pub tick_count: u64,
    /// Last tick duration [ns].
    pub last_tick_ns: i64,
    /// Minimum tick duration [ns].
    pub min_tick_ns: i64,
    /// Maximum tick duration [ns].
    pub max_tick_ns: i64,
    /// Running sum for average computation.
    pub sum_tick_ns: i64,
    /// Number of ticks that overran the cadence.
    pub overruns: u64,
}

impl TickStats {
    pub const fn new() -> Self {
        Self {
            tick_count: 0,
            last_tick_ns: 0,
            min_tick_ns: i64::MAX,
            max_tick_ns: 0,
            sum_tick_ns: 0,
            overruns: 0,
        }
    }

    /// Record a tick duration. O(1), no allocation.
    #[inline]
    pub fn record(&mut self, duration_ns: i64) {
        self.tick_count += 1;
        self.last_tick_ns = duration_ns;
        if duration_ns < self.min_tick_ns {
            self.min_tick_ns = duration_ns;
        }
        if duration_ns > self.max_tick_ns {
            self.max_tick_ns = duration_ns;
        }
        self.sum_tick_ns += duration_ns;
    }

    /// Average tick time [ns] (0 before the first tick).
    #[inline]
    pub fn avg_tick_ns(&self) -> i64 {
        if self.tick_count == 0 {
            0
        } else {
            self.sum_tick_ns / self.tick_count as i64
        }
    }
}

impl Default for TickStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── RT setup ───────────────────────────────────────────────────────

#[cfg(feature = "rt")]
fn rt_mlockall() -> Result<(), RunnerError> {
    use nix::sys::mman::{mlockall, MlockallFlags};
    mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
        .map_err(|e| RunnerError::RtSetup(format!("mlockall failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_mlockall() -> Result<(), RunnerError> {
    Ok(()) // No-op in simulation mode
}

/// Prefault stack pages to prevent page faults while ticking.
fn prefault_stack() {
    let mut buf = [0u8; 256 * 1024];
    for byte in buf.iter_mut() {
        unsafe { core::ptr::write_volatile(byte, 0xFF) };
    }
    core::hint::black_box(&buf);
}

#[cfg(feature = "rt")]
fn rt_set_affinity(cpu: usize) -> Result<(), RunnerError> {
    use nix::sched::{sched_setaffinity, CpuSet};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| RunnerError::RtSetup(format!("CpuSet::set({cpu}) failed: {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| RunnerError::RtSetup(format!("sched_setaffinity failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_set_affinity(_cpu: usize) -> Result<(), RunnerError> {
    Ok(()) // No-op in simulation mode
}

#[cfg(feature = "rt")]
fn rt_set_scheduler(priority: i32) -> Result<(), RunnerError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(RunnerError::RtSetup(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        )));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_scheduler(_priority: i32) -> Result<(), RunnerError> {
    Ok(()) // No-op in simulation mode
}

/// Full RT setup sequence; call before [`Runner::run`].
pub fn rt_setup(cpu_core: usize, rt_priority: i32) -> Result<(), RunnerError> {
    rt_mlockall()?;
    prefault_stack();
    rt_set_affinity(cpu_core)?;
    rt_set_scheduler(rt_priority)?;
    Ok(())
}

// ─── Runner ─────────────────────────────────────────────────────────

/// Paced tick loop around one [`Pib`].
pub struct Runner {
    pub pib: Pib,
    pub stats: TickStats,
    tick_ns: i64,
    start: Instant,
}

impl Runner {
    pub fn new(pib: Pib, rate_hz: u32) -> Result<Self, RunnerError> {
        if rate_hz == 0 || rate_hz > 1000 {
            return Err(RunnerError::BadRate(rate_hz));
        }
        Ok(Self {
            pib,
            stats: TickStats::new(),
            tick_ns: 1_000_000_000 / i64::from(rate_hz),
            start: Instant::now(),
        })
    }

    fn now_clock(&self) -> TickClock {
        let mono_ms = self.start.elapsed().as_millis() as u64;
        let epoch = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0);
        TickClock::new(mono_ms, epoch)
    }

    /// One cycle: tick, drain outboxes, record timing.
    pub fn cycle(&mut self) {
        let cycle_start = Instant::now();

        self.pib.tick(self.now_clock());
        self.drain_outboxes();

        let duration_ns = cycle_start.elapsed().as_nanos() as i64;
        self.stats.record(duration_ns);
        if duration_ns > self.tick_ns {
            self.stats.overruns += 1;
            debug!(
                "tick overrun: {duration_ns}ns > {}ns cadence",
                self.tick_ns
            );
        }
    }

    /// Enter the paced loop; never returns under normal operation.
    pub fn run(&mut self) -> Result<(), RunnerError> {
        #[cfg(feature = "rt")]
        {
            self.run_rt_loop()
        }
        #[cfg(not(feature = "rt"))]
        {
            self.run_sim_loop()
        }
    }

    /// Absolute-time pacing on `CLOCK_MONOTONIC`: no drift accumulation.
    #[cfg(feature = "rt")]
    fn run_rt_loop(&mut self) -> Result<(), RunnerError> {
        use nix::time::{clock_gettime, clock_nanosleep, ClockId, ClockNanosleepFlags};

        let clock = ClockId::CLOCK_MONOTONIC;
        let mut next_wake = clock_gettime(clock)
            .map_err(|e| RunnerError::RtSetup(format!("clock_gettime: {e}")))?;

        loop {
            next_wake = timespec_add_ns(next_wake, self.tick_ns);
            self.cycle();
            let _ = clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &next_wake);
        }
    }

    /// Relative sleep pacing; drift is irrelevant at ground-test cadences.
    #[cfg(not(feature = "rt"))]
    fn run_sim_loop(&mut self) -> Result<(), RunnerError> {
        let cadence = std::time::Duration::from_nanos(self.tick_ns as u64);
        loop {
            let cycle_start = Instant::now();
            self.cycle();
            if let Some(remaining) = cadence.checked_sub(cycle_start.elapsed()) {
                std::thread::sleep(remaining);
            }
        }
    }

    fn drain_outboxes(&mut self) {
        while let Some(cmd) = self.pib.mcb.outbox.pop_front() {
            debug!(?cmd, "MCB command");
        }
        while let Some(cmd) = self.pib.pu.outbox.pop_front() {
            debug!(?cmd, "PU command");
        }
        while let Some(msg) = self.pib.zephyr.outbox.pop_front() {
            match msg {
                ZephyrMsg::Tm {
                    flag,
                    detail,
                    payload,
                } => info!(?flag, detail = detail.as_str(), bytes = payload.len(), "TM"),
                ZephyrMsg::Log { level, text } => {
                    info!(?level, text = text.as_str(), "Zephyr log")
                }
                other => info!(?other, "Zephyr message"),
            }
        }
    }
}

/// Add nanoseconds to a TimeSpec.
#[cfg(feature = "rt")]
fn timespec_add_ns(ts: nix::sys::time::TimeSpec, ns: i64) -> nix::sys::time::TimeSpec {
    use nix::sys::time::TimeSpec;
    let mut secs = ts.tv_sec();
    let mut nanos = ts.tv_nsec() + ns;
    while nanos >= 1_000_000_000 {
        secs += 1;
        nanos -= 1_000_000_000;
    }
    TimeSpec::new(secs, nanos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pib_common::config::PibConfig;
    use pib_common::mode::Mode;

    #[test]
    fn tick_stats_basic() {
        let mut stats = TickStats::new();
        assert_eq!(stats.avg_tick_ns(), 0);

        stats.record(500_000);
        assert_eq!(stats.tick_count, 1);
        assert_eq!(stats.min_tick_ns, 500_000);
        assert_eq!(stats.max_tick_ns, 500_000);
        assert_eq!(stats.avg_tick_ns(), 500_000);

        stats.record(700_000);
        assert_eq!(stats.max_tick_ns, 700_000);
        assert_eq!(stats.avg_tick_ns(), 600_000);
    }

    #[test]
    fn rejects_bad_rates() {
        assert!(matches!(
            Runner::new(Pib::new(PibConfig::default()), 0),
            Err(RunnerError::BadRate(0))
        ));
    }

    #[test]
    fn cycle_ticks_and_drains() {
        let mut runner = Runner::new(Pib::new(PibConfig::default()), 10).unwrap();
        runner.cycle();
        runner.cycle();
        assert_eq!(runner.stats.tick_count, 2);
        assert_eq!(runner.pib.mode(), Mode::Standby);
        assert!(runner.pib.zephyr.outbox.is_empty());
    }

    #[test]
    fn rt_setup_without_rt_feature_is_noop() {
        #[cfg(not(feature = "rt"))]
        {
            assert!(rt_setup(0, 80).is_ok());
        }
    }
}
