//! Shared test harness: a simulated host loop around one supervisor.
//!
//! Time is script-controlled: `tick` advances one second, `advance` jumps.
//! Frames are injected into the typed inboxes and outbound traffic is
//! drained into plain vectors for assertions.

#![allow(dead_code)]

use pib_common::config::PibConfig;
use pib_common::mode::Mode;
use pib_common::msg::mcb::{McbAck, McbCommand, McbFrame};
use pib_common::msg::pu::{PuCommand, PuFrame};
use pib_common::msg::zephyr::{LogLevel, StateFlag, ZephyrMsg};
use pib_common::time::TickClock;
use pib_control::modes::flight::FlightSt;
use pib_control::modes::ModeState;
use pib_control::supervisor::Pib;

/// Epoch base placed well clear of the ten-minute TSEN alignment window,
/// so scripted scenarios do not trip the cadence check.
pub const EPOCH_BASE: u32 = 999_660;

pub struct Sim {
    pub pib: Pib,
    pub mono_ms: u64,
    pub epoch: u32,
}

impl Sim {
    pub fn new(config: PibConfig) -> Self {
        Self {
            pib: Pib::new(config),
            mono_ms: 0,
            epoch: EPOCH_BASE,
        }
    }

    /// Advance one second and run a tick.
    pub fn tick(&mut self) {
        self.advance(1);
    }

    pub fn tick_n(&mut self, n: usize) {
        for _ in 0..n {
            self.tick();
        }
    }

    /// Jump `secs` forward and run a single tick at the new time.
    pub fn advance(&mut self, secs: u64) {
        self.mono_ms += secs * 1000;
        self.epoch += secs as u32;
        self.pib.tick(TickClock::new(self.mono_ms, self.epoch));
    }

    // ── Frame injection (delivered on the next tick) ────────────────

    pub fn mcb_ack(&mut self, ack: McbAck) {
        self.mcb_frame(McbFrame::Ack(ack));
    }

    pub fn mcb_frame(&mut self, frame: McbFrame) {
        self.pib.mcb.inbox.push_back(frame).unwrap();
    }

    pub fn pu_frame(&mut self, frame: PuFrame) {
        self.pib.pu.inbox.push_back(frame).unwrap();
    }

    pub fn pu_status(&mut self, time: u32) {
        self.pu_frame(PuFrame::Status {
            checksum_valid: true,
            time,
            v_battery: 15.1,
            i_charge: 0.4,
            therm1: -10.0,
            therm2: -12.5,
            heater_stat: 1,
        });
    }

    // ── Outbound observation ────────────────────────────────────────

    pub fn drain_mcb(&mut self) -> Vec<McbCommand> {
        let mut out = Vec::new();
        while let Some(cmd) = self.pib.mcb.outbox.pop_front() {
            out.push(cmd);
        }
        out
    }

    pub fn drain_pu(&mut self) -> Vec<PuCommand> {
        let mut out = Vec::new();
        while let Some(cmd) = self.pib.pu.outbox.pop_front() {
            out.push(cmd);
        }
        out
    }

    pub fn drain_zephyr(&mut self) -> Vec<ZephyrMsg> {
        let mut out = Vec::new();
        while let Some(msg) = self.pib.zephyr.outbox.pop_front() {
            out.push(msg);
        }
        out
    }

    /// Drain and keep only the log lines.
    pub fn logs(&mut self) -> Vec<(LogLevel, String)> {
        self.drain_zephyr()
            .into_iter()
            .filter_map(|msg| match msg {
                ZephyrMsg::Log { level, text } => Some((level, text.as_str().to_string())),
                _ => None,
            })
            .collect()
    }

    /// Drain and keep only the telemetry packets.
    pub fn tms(&mut self) -> Vec<(StateFlag, String, usize)> {
        self.drain_zephyr()
            .into_iter()
            .filter_map(|msg| match msg {
                ZephyrMsg::Tm {
                    flag,
                    detail,
                    payload,
                } => Some((flag, detail.as_str().to_string(), payload.len())),
                _ => None,
            })
            .collect()
    }

    // ── Mode driving ────────────────────────────────────────────────

    pub fn flight_state(&self) -> FlightSt {
        match self.pib.mode_state() {
            ModeState::Flight(st) => st,
            other => panic!("not in flight: {other:?}"),
        }
    }

    /// From cold standby into flight idle with valid GPS time.
    pub fn enter_flight(&mut self, autonomous: bool, sza: f32) {
        self.pib.autonomous_mode = autonomous;
        self.pib.request_mode(Mode::Flight);
        self.tick(); // standby exit
        self.tick(); // flight entry → GPS wait
        self.pib.update_gps(sza, true);
        self.tick(); // GPS wait → idle
        self.drain_zephyr();
        self.drain_mcb();
        self.drain_pu();
    }

    /// Tick until an MCB command matching `want` is drained.
    pub fn tick_until_mcb(&mut self, want: fn(&McbCommand) -> bool, max: usize) -> McbCommand {
        for _ in 0..max {
            if let Some(cmd) = self.drain_mcb().into_iter().find(|c| want(c)) {
                return cmd;
            }
            self.tick();
        }
        panic!("expected MCB command not observed within {max} ticks");
    }

    /// Tick until a PU command matching `want` is drained.
    pub fn tick_until_pu(&mut self, want: fn(&PuCommand) -> bool, max: usize) -> PuCommand {
        for _ in 0..max {
            if let Some(cmd) = self.drain_pu().into_iter().find(|c| want(c)) {
                return cmd;
            }
            self.tick();
        }
        panic!("expected PU command not observed within {max} ticks");
    }
}
