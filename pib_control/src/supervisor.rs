//! The supervisor: one owning value composing the scheduler, flag registry,
//! configuration, peer links and every sub-machine's local state.
//!
//! The host main loop calls [`Pib::tick`] at a fixed cadence. A tick drains
//! the peer inboxes through the routers, applies any pending mode
//! transition, advances the active mode's substate machine one step, runs
//! the TSEN cadence check, fires due scheduled actions and decays stale
//! flags. Routers run before the mode step, so anything a handler sets is
//! observable by the same tick's mode code.
//!
//! Mode changes never happen mid-step: routers and sub-machines raise a
//! pending transition and the supervisor applies it at the next tick
//! boundary, driving the outgoing mode through its exit substate first.

use pib_common::action::ActionId;
use pib_common::config::{PibConfig, TIME_TRIGGER_DISABLED};
use pib_common::consts::PROFILE_SCHEDULE_OFFSET_S;
use pib_common::detail;
use pib_common::mode::Mode;
use pib_common::motion::MotionKind;
use pib_common::msg::mcb::McbCommand;
use pib_common::msg::pu::PuCommand;
use pib_common::msg::zephyr::{AckKind, AckState, StateFlag};
use pib_common::status::GpsStatus;
use pib_common::time::TickClock;
use tracing::{error, info};

use crate::flags::ActionRegistry;
use crate::link::{LoraLink, McbLink, McbState, OutputPins, PuLink, PuState, ZephyrLink};
use crate::lora::LoraTmBuffer;
use crate::modes::flight::FlightSubMachines;
use crate::modes::ModeState;
use crate::sched::Scheduler;
use crate::telemetry::McbTmBuffer;

/// Per-run motion lengths [revolutions]. Transient, not persisted config.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ProfileParams {
    pub deploy_length: f32,
    pub retract_length: f32,
    pub dock_length: f32,
}

/// The Profiler Interface Board control brain.
pub struct Pib {
    // ── Shared singletons ──
    pub config: PibConfig,
    /// A telecommand changed a persisted value; host owes a config save.
    pub config_dirty: bool,
    pub flags: ActionRegistry,
    pub sched: Scheduler,

    // ── Peer endpoints and tracked peer state ──
    pub mcb: McbLink,
    pub mcb_state: McbState,
    pub pu: PuLink,
    pub pu_state: PuState,
    pub zephyr: ZephyrLink,
    pub lora: LoraLink,
    pub pins: OutputPins,
    pub gps: GpsStatus,

    // ── Telemetry accumulators ──
    pub mcb_tm: McbTmBuffer,
    pub lora_tm: LoraTmBuffer,

    // ── Flight bookkeeping ──
    pub autonomous_mode: bool,
    pub profiles_remaining: u8,
    pub profiles_scheduled: bool,
    pub params: ProfileParams,
    pub docked_profile_time: u16,
    pub(crate) profile_start_ms: u64,

    // ── Sub-machine local state ──
    pub(crate) sub: FlightSubMachines,

    // ── Mode control ──
    state: ModeState,
    pending_mode: Option<Mode>,
    pending_error: bool,
    pending_shutdown: bool,
    pending_reenter: bool,

    pub(crate) clock: TickClock,
    last_tsen_epoch: u32,
}

impl Pib {
    pub fn new(config: PibConfig) -> Self {
        Self {
            config,
            config_dirty: false,
            flags: ActionRegistry::new(),
            sched: Scheduler::new(),
            mcb: McbLink::default(),
            mcb_state: McbState::default(),
            pu: PuLink::default(),
            pu_state: PuState::default(),
            zephyr: ZephyrLink::default(),
            lora: LoraLink::default(),
            pins: OutputPins::default(),
            gps: GpsStatus::default(),
            mcb_tm: McbTmBuffer::new(),
            lora_tm: LoraTmBuffer::new(),
            autonomous_mode: false,
            profiles_remaining: 0,
            profiles_scheduled: false,
            params: ProfileParams::default(),
            docked_profile_time: 0,
            profile_start_ms: 0,
            sub: FlightSubMachines::default(),
            state: ModeState::entry(Mode::Standby),
            pending_mode: None,
            pending_error: false,
            pending_shutdown: false,
            pending_reenter: false,
            clock: TickClock::default(),
            last_tsen_epoch: 0,
        }
    }

    // ─── Tick ───────────────────────────────────────────────────────

    /// One control cycle: route inbound, transition, step, schedule, decay.
    pub fn tick(&mut self, clock: TickClock) {
        self.clock = clock;

        self.run_mcb_router();
        self.run_pu_router();
        self.lora_rx();

        let switched = self.apply_pending_transitions();
        if !switched {
            self.mode_tick();
        }

        self.check_tsen();

        self.sched.poll(clock.mono_ms, &mut self.flags);
        self.flags.sweep();
    }

    /// Returns true when a mode switch consumed this tick's substate step.
    fn apply_pending_transitions(&mut self) -> bool {
        if self.pending_error {
            self.pending_error = false;
            self.state = self.state.error_landing();
        }
        if self.pending_reenter {
            self.pending_reenter = false;
            self.state = ModeState::entry(self.state.mode());
        }
        if self.pending_shutdown {
            self.pending_shutdown = false;
            self.state = self.state.shutdown();
        }
        if let Some(mode) = self.pending_mode.take() {
            if mode != self.state.mode() {
                self.state = self.state.exit();
                self.mode_tick();
                self.state = ModeState::entry(mode);
                return true;
            }
        }
        false
    }

    fn mode_tick(&mut self) {
        self.state = match self.state {
            ModeState::Standby(st) => ModeState::Standby(self.standby_tick(st)),
            ModeState::Flight(st) => ModeState::Flight(self.flight_tick(st)),
            ModeState::LowPower(st) => ModeState::LowPower(self.low_power_tick(st)),
            ModeState::Safety(st) => ModeState::Safety(self.safety_tick(st)),
            ModeState::EndOfFlight(st) => ModeState::EndOfFlight(self.end_of_flight_tick(st)),
        };
    }

    // ─── Host-facing events ─────────────────────────────────────────

    /// OBC commanded a mode change; the current mode exits first.
    pub fn request_mode(&mut self, mode: Mode) {
        self.pending_mode = Some(mode);
    }

    /// OBC shutdown warning: land in the mode's shutdown substate.
    pub fn shutdown_warning(&mut self) {
        self.pending_shutdown = true;
    }

    /// GPS/time update relayed by the OBC.
    pub fn update_gps(&mut self, solar_zenith_angle: f32, time_valid: bool) {
        self.gps.solar_zenith_angle = solar_zenith_angle;
        self.gps.time_valid = time_valid;
    }

    /// OBC handshake reply.
    pub fn handle_zephyr_ack(&mut self, kind: AckKind, ack: bool) {
        let state = if ack { AckState::Ack } else { AckState::Nak };
        match kind {
            AckKind::Ra => self.zephyr.ra_ack = state,
            AckKind::Tm => self.zephyr.tm_ack = state,
            AckKind::Safety => self.zephyr.s_ack = state,
        }
    }

    // ─── Observability ──────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.state.mode()
    }

    pub fn mode_state(&self) -> ModeState {
        self.state
    }

    // ─── Internal transitions ───────────────────────────────────────

    /// Force the current mode into its error substate at the next tick
    /// boundary. The sole escalation path for routers and sub-machines.
    pub(crate) fn force_mode_error(&mut self) {
        self.pending_error = true;
    }

    /// Restart the current mode from its entry substate (autonomy switch).
    pub(crate) fn reenter_mode(&mut self) {
        self.pending_reenter = true;
    }

    /// Arm a one-shot action. Scheduler exhaustion is critical: the timers
    /// are what keep the retry machinery alive.
    pub(crate) fn arm(&mut self, action: ActionId, delay_s: u32) {
        if !self.sched.add(action, delay_s, self.clock.mono_ms) {
            self.zephyr
                .log_crit(detail!("Scheduler full arming {action:?}"));
            self.force_mode_error();
        }
    }

    // ─── Motion helpers ─────────────────────────────────────────────

    /// Issue the MCB command for the currently selected motion kind, sized
    /// from the per-run lengths and configured velocities.
    pub(crate) fn start_mcb_motion(&mut self) -> bool {
        let Some(kind) = self.mcb_state.motion else {
            error!("Unknown motion type to start");
            return false;
        };

        let cfg = &self.config;
        let (msg, cmd, revs, rpm) = match kind {
            MotionKind::ReelIn => {
                let revs = self.params.retract_length;
                let rpm = cfg.retract_velocity;
                (
                    detail!("Retracting {revs:.1} revs"),
                    McbCommand::ReelIn {
                        revs,
                        speed_rpm: rpm,
                    },
                    revs,
                    rpm,
                )
            }
            MotionKind::ReelOut => {
                let revs = self.params.deploy_length;
                let rpm = cfg.deploy_velocity;
                (
                    detail!("Deploying {revs:.1} revs"),
                    McbCommand::ReelOut {
                        revs,
                        speed_rpm: rpm,
                    },
                    revs,
                    rpm,
                )
            }
            MotionKind::Dock => {
                let revs = self.params.dock_length;
                let rpm = cfg.dock_velocity;
                (
                    detail!("Docking {revs:.1} revs"),
                    McbCommand::Dock {
                        revs,
                        speed_rpm: rpm,
                    },
                    revs,
                    rpm,
                )
            }
            MotionKind::InNoLooseWire => {
                let revs = self.params.retract_length;
                let rpm = cfg.dock_velocity;
                (
                    detail!("Reel in (no LW) {revs:.1} revs"),
                    McbCommand::InNoLooseWire {
                        revs,
                        speed_rpm: rpm,
                    },
                    revs,
                    rpm,
                )
            }
        };

        if kind == MotionKind::ReelOut {
            self.pu_undock();
        }

        self.mcb_state.max_motion_seconds =
            (60.0 * revs / rpm) as u32 + u32::from(self.config.motion_timeout);
        self.mcb.send(cmd);

        if self.autonomous_mode {
            info!("{}", msg.as_str());
        } else {
            self.zephyr.log_fine(msg);
        }
        true
    }

    /// Motion ack edge: the commanded motion is now running on the MCB.
    pub(crate) fn note_profile_start(&mut self) {
        self.mcb_state.motion_ongoing = true;
        self.profile_start_ms = self.clock.mono_ms;
        if matches!(self.mcb_state.motion, Some(k) if k.ends_on_dock()) {
            self.mcb_state.dock_ongoing = true;
        }
        self.mcb_tm.start_profile(self.clock.epoch);
    }

    /// Queue the configured number of nightly profiles, spaced by the
    /// profile period. Any trigger consumes the time trigger; a fresh
    /// telecommand is needed to arm a new one. On scheduler exhaustion the
    /// schedule is rolled back untouched.
    pub(crate) fn schedule_profiles(&mut self) -> bool {
        self.config.time_trigger = TIME_TRIGGER_DISABLED;
        self.config_dirty = true;

        let mark = self.sched.len();
        for i in 0..self.config.num_profiles {
            let delay =
                u32::from(i) * u32::from(self.config.profile_period) + PROFILE_SCHEDULE_OFFSET_S;
            if !self.sched.add(ActionId::BeginProfile, delay, self.clock.mono_ms) {
                self.sched.truncate(mark);
                self.zephyr
                    .log_crit(detail!("Error scheduling profiles, scheduler failure"));
                return false;
            }
        }

        let cfg = &self.config;
        self.zephyr.log_fine(detail!(
            "Scheduled profiles: {}, {:.2}, {:.2}, {:.2}, {}, {}",
            cfg.num_profiles,
            cfg.profile_size,
            cfg.dock_amount,
            cfg.dock_overshoot,
            cfg.dwell_time,
            cfg.profile_period
        ));
        true
    }

    // ─── PU helpers ─────────────────────────────────────────────────

    /// The PU is physically docked: power it and record the fact.
    pub(crate) fn pu_dock(&mut self) {
        if !self.config.pu_docked {
            self.config.pu_docked = true;
            self.config_dirty = true;
        }
        self.pins.pu_power = true;
    }

    /// The PU is leaving the dock (reel out): drop power and the flag.
    pub(crate) fn pu_undock(&mut self) {
        if self.config.pu_docked {
            self.config.pu_docked = false;
            self.config_dirty = true;
        }
        self.pins.pu_power = false;
    }

    /// Send the PU its profile execution plan and bump the profile id.
    pub(crate) fn pu_start_profile(&mut self) {
        let cfg = &self.config;
        let t_down = (60.0 * (self.params.deploy_length / cfg.deploy_velocity)) as i32
            + i32::from(cfg.preprofile_time);
        // Extra time on the way up covers the dock delay.
        let t_up = (60.0
            * (self.params.retract_length / cfg.retract_velocity
                + self.params.dock_length / cfg.dock_velocity)) as i32
            + i32::from(cfg.motion_timeout);

        self.pu.send(PuCommand::Profile {
            t_down,
            dwell: cfg.dwell_time,
            t_up,
            profile_rate: cfg.profile_rate,
            dwell_rate: cfg.dwell_rate,
            tsen: cfg.profile_tsen,
            ropc: cfg.profile_ropc,
            flash: cfg.profile_flash,
            lora_tm: cfg.lora_tx_tm,
        });
        info!(
            "Profile plan sent to PU: {}, {}, {}, {}, {}",
            t_down, cfg.dwell_time, t_up, cfg.profile_rate, cfg.dwell_rate
        );

        self.config.profile_id = self.config.profile_id.wrapping_add(1);
        self.config_dirty = true;
    }

    // ─── Telemetry helpers ──────────────────────────────────────────

    /// Downlink the accumulated motion TM with a state detail message.
    pub(crate) fn send_mcb_tm(&mut self, flag: StateFlag, message: &str) {
        let payload = self.mcb_tm.take();
        self.zephyr.tm(flag, detail!("{message}"), payload);
        info!("{message}");
    }

    /// Downlink the buffered PU record as a TSEN TM with status detail.
    pub(crate) fn send_tsen_tm(&mut self) {
        let s = &self.pu_state.status;
        let d = detail!(
            "PU TSEN: {}, {:.2}, {:.2}, {:.2}, {:.2}, {}",
            s.time,
            s.v_battery,
            s.i_charge,
            s.therm1,
            s.therm2,
            s.heater_stat
        );
        let payload = core::mem::take(&mut self.pu_state.record_buf);
        self.zephyr.tm(StateFlag::Fine, d, payload);
    }

    /// Downlink the buffered PU record as a numbered profile-record TM.
    pub(crate) fn send_profile_tm(&mut self, packet_num: u8) {
        let s = &self.pu_state.status;
        let d = detail!(
            "PU Prof. Rec. {}.{}: {}, {:.2}, {:.2}, {:.2}, {:.2}, {}",
            self.config.profile_id,
            packet_num,
            s.time,
            s.v_battery,
            s.i_charge,
            s.therm1,
            s.therm2,
            s.heater_stat
        );
        let payload = core::mem::take(&mut self.pu_state.record_buf);
        self.zephyr.tm(StateFlag::Fine, d, payload);
    }

    // ─── TSEN cadence ───────────────────────────────────────────────

    /// Every ten minutes aligned with the hour, queue a TSEN fetch.
    fn check_tsen(&mut self) {
        if self.clock.epoch > self.last_tsen_epoch + 540 && self.clock.minute() % 10 == 0 {
            self.last_tsen_epoch = self.clock.epoch;
            self.flags.set(ActionId::SendTsen);
        }
    }
}
