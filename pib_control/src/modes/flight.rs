//! Flight mode: GPS wait, then manual or autonomous operations.
//!
//! Manual flight polls, in priority order, for action flags posted by the
//! telecommand handler and hands control to the matching sub-machine.
//! Autonomous flight schedules nightly profiles off the SZA or time
//! trigger and runs the profile → offload → bookkeeping chain.
//!
//! Sub-machines are restartable: dispatch restarts one and steps it once
//! in the same tick, then the owning substate steps it until done.

pub mod check_pu;
pub mod docked;
pub mod manual_motion;
pub mod motion;
pub mod offload;
pub mod profile;
pub mod redock;
pub mod tsen;

use pib_common::action::ActionId;
use pib_common::consts::{MCB_RESEND_TIMEOUT_S, SZA_DAYTIME_RESET_DEG};
use pib_common::detail;
use pib_common::motion::MotionKind;
use pib_common::msg::mcb::McbCommand;
use tracing::{debug, error, info};

use crate::supervisor::Pib;

use self::check_pu::CheckPu;
use self::docked::DockedProfile;
use self::manual_motion::ManualMotion;
use self::motion::MotionSequencer;
use self::offload::PuOffload;
use self::profile::Profile;
use self::redock::ReDock;
use self::tsen::Tsen;

/// Progress report from one sub-machine step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Keep stepping.
    Continue,
    /// Terminal; the owner moves on.
    Done,
}

/// Local state of every flight sub-machine, owned by the supervisor so
/// restart semantics are plain data.
#[derive(Debug, Default)]
pub struct FlightSubMachines {
    pub(crate) check_pu: CheckPu,
    pub(crate) profile: Profile,
    pub(crate) redock: ReDock,
    pub(crate) offload: PuOffload,
    pub(crate) tsen: Tsen,
    pub(crate) manual_motion: ManualMotion,
    pub(crate) docked: DockedProfile,
    pub(crate) motion: MotionSequencer,
}

/// Flight substates. `Manual*` and `Auto*` families are only reachable in
/// the matching autonomy setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightSt {
    Entry,
    GpsWait,

    // ── Manual family ──
    ManualIdle,
    ManualCheckPu,
    ManualMotion,
    ManualRedock,
    ManualTsen,
    ManualOffload,
    ManualProfile,
    ManualDocked,

    // ── Autonomous family ──
    AutoIdle,
    AutoWaitProfile,
    AutoTsen,
    AutoProfile,
    AutoOffload,
    AutoNoteProfileEnd,

    // ── Off-nominal ──
    ErrorLanding,
    ErrorLoop,
    ShutdownLanding,
    ShutdownLoop,
    Exit,
}

impl Pib {
    pub(crate) fn flight_tick(&mut self, st: FlightSt) -> FlightSt {
        use FlightSt as F;
        match st {
            F::Entry => {
                info!("Entering flight");
                F::GpsWait
            }

            F::GpsWait => {
                // Hold until the OBC has given us valid time.
                debug!("Waiting on GPS time");
                if self.gps.time_valid {
                    if self.autonomous_mode {
                        F::AutoIdle
                    } else {
                        F::ManualIdle
                    }
                } else {
                    F::GpsWait
                }
            }

            F::ErrorLanding => {
                error!("Landed in flight error");
                self.sched.clear();
                self.mcb_state.motion_ongoing = false;
                self.profiles_remaining = 0;
                self.mcb_state.motion = None;
                self.mcb.send(McbCommand::GoLowPower);
                self.arm(ActionId::ResendMcbLowPower, MCB_RESEND_TIMEOUT_S);
                self.mcb_state.low_power = false;
                F::ErrorLoop
            }

            F::ErrorLoop => {
                debug!("Flight error loop");
                if !self.mcb_state.low_power && self.flags.consume(ActionId::ResendMcbLowPower) {
                    self.arm(ActionId::ResendMcbLowPower, MCB_RESEND_TIMEOUT_S);
                    self.mcb.send(McbCommand::GoLowPower);
                }
                if self.flags.consume(ActionId::ExitErrorState) {
                    info!("Leaving flight error loop");
                    F::Entry
                } else {
                    F::ErrorLoop
                }
            }

            F::ShutdownLanding => {
                info!("Shutdown warning received in flight");
                self.mcb.send(McbCommand::GoLowPower);
                F::ShutdownLoop
            }

            F::ShutdownLoop => F::ShutdownLoop,

            F::Exit => {
                self.mcb.send(McbCommand::GoLowPower);
                info!("Exiting flight");
                F::Exit
            }

            _ => {
                if self.autonomous_mode {
                    self.autonomous_flight(st)
                } else {
                    self.manual_flight(st)
                }
            }
        }
    }

    fn manual_flight(&mut self, st: FlightSt) -> FlightSt {
        use FlightSt as F;
        match st {
            F::ManualIdle => {
                debug!("Flight manual idle");
                if self.flags.consume(ActionId::ReelIn) {
                    info!("Reel in manual command");
                    self.mcb_state.motion = Some(MotionKind::ReelIn);
                    self.sub.manual_motion.restart();
                    self.run_sub(Pib::manual_motion_step, F::ManualMotion, F::ManualIdle)
                } else if self.flags.consume(ActionId::ReelOut) {
                    info!("Reel out manual command");
                    self.mcb_state.motion = Some(MotionKind::ReelOut);
                    self.sub.manual_motion.restart();
                    self.run_sub(Pib::manual_motion_step, F::ManualMotion, F::ManualIdle)
                } else if self.flags.consume(ActionId::Dock) {
                    info!("Dock manual command");
                    self.mcb_state.motion = Some(MotionKind::Dock);
                    self.sub.manual_motion.restart();
                    self.run_sub(Pib::manual_motion_step, F::ManualMotion, F::ManualIdle)
                } else if self.flags.consume(ActionId::CheckPu) {
                    info!("Check PU manual command");
                    self.sub.check_pu.restart();
                    self.run_sub(Pib::check_pu_step, F::ManualCheckPu, F::ManualIdle)
                } else if self.flags.consume(ActionId::Redock) {
                    info!("Redock manual command");
                    self.sub.redock.restart();
                    self.run_sub(Pib::redock_step, F::ManualRedock, F::ManualIdle)
                } else if self.flags.consume(ActionId::SendTsen) {
                    info!("Send TSEN manual command");
                    self.sub.tsen.restart();
                    self.run_sub(Pib::tsen_step, F::ManualTsen, F::ManualIdle)
                } else if self.flags.consume(ActionId::ManualProfile) {
                    info!("Profile manual command");
                    self.sub.profile.restart();
                    self.run_sub(Pib::profile_step, F::ManualProfile, F::ManualIdle)
                } else if self.flags.consume(ActionId::OffloadPu) {
                    info!("Offload PU manual command");
                    self.sub.offload.restart();
                    self.run_sub(Pib::offload_step, F::ManualOffload, F::ManualIdle)
                } else if self.flags.consume(ActionId::DockedProfile) {
                    info!("Docked profile manual command");
                    self.sub.docked.restart();
                    self.run_sub(Pib::docked_step, F::ManualDocked, F::ManualIdle)
                } else {
                    F::ManualIdle
                }
            }

            F::ManualCheckPu => {
                if self.check_pu_step() == Step::Done {
                    // Status goes to the ground only on success; failure
                    // already produced a warning.
                    if self.pu_state.check_success {
                        let s = &self.pu_state.status;
                        self.zephyr.log_fine(detail!(
                            "PU status: {}, {:.2}, {:.2}, {:.2}, {:.2}, {}",
                            s.time,
                            s.v_battery,
                            s.i_charge,
                            s.therm1,
                            s.therm2,
                            s.heater_stat
                        ));
                    }
                    F::ManualIdle
                } else {
                    st
                }
            }

            F::ManualMotion => self.run_sub(Pib::manual_motion_step, st, F::ManualIdle),
            F::ManualRedock => self.run_sub(Pib::redock_step, st, F::ManualIdle),
            F::ManualTsen => self.run_sub(Pib::tsen_step, st, F::ManualIdle),
            F::ManualOffload => self.run_sub(Pib::offload_step, st, F::ManualIdle),
            F::ManualProfile => self.run_sub(Pib::profile_step, st, F::ManualIdle),
            F::ManualDocked => self.run_sub(Pib::docked_step, st, F::ManualIdle),

            _ => {
                error!("Unknown manual substate");
                st
            }
        }
    }

    fn autonomous_flight(&mut self, st: FlightSt) -> FlightSt {
        use FlightSt as F;
        match st {
            F::AutoIdle => {
                // Daytime re-arms the nightly profile allotment.
                if self.gps.solar_zenith_angle < SZA_DAYTIME_RESET_DEG {
                    self.profiles_remaining = self.config.num_profiles;
                    self.profiles_scheduled = false;
                }

                let sza_go = self.config.sza_trigger
                    && self.gps.solar_zenith_angle > self.config.sza_minimum;
                let time_go =
                    !self.config.sza_trigger && self.clock.epoch >= self.config.time_trigger;

                if self.profiles_remaining != 0 && (sza_go || time_go) {
                    if self.profiles_scheduled {
                        F::AutoWaitProfile
                    } else if self.schedule_profiles() {
                        self.profiles_scheduled = true;
                        F::AutoWaitProfile
                    } else {
                        F::ErrorLanding
                    }
                } else if self.flags.consume(ActionId::SendTsen) {
                    self.sub.tsen.restart();
                    self.run_sub(Pib::tsen_step, F::AutoTsen, F::AutoIdle)
                } else {
                    F::AutoIdle
                }
            }

            F::AutoWaitProfile => {
                if self.flags.consume(ActionId::BeginProfile) {
                    self.sub.profile.restart();
                    self.run_sub(Pib::profile_step, F::AutoProfile, F::AutoIdle)
                } else if self.flags.consume(ActionId::SendTsen) {
                    self.sub.tsen.restart();
                    self.run_sub(Pib::tsen_step, F::AutoTsen, F::AutoWaitProfile)
                } else {
                    st
                }
            }

            F::AutoTsen => self.run_sub(Pib::tsen_step, st, F::AutoIdle),

            F::AutoProfile => {
                if self.profile_step() == Step::Done {
                    self.sub.offload.restart();
                    self.run_sub(Pib::offload_step, F::AutoOffload, F::AutoNoteProfileEnd)
                } else {
                    st
                }
            }

            F::AutoOffload => self.run_sub(Pib::offload_step, st, F::AutoNoteProfileEnd),

            F::AutoNoteProfileEnd => {
                self.profiles_remaining = self.profiles_remaining.saturating_sub(1);
                F::AutoIdle
            }

            _ => {
                error!("Unknown autonomous substate");
                st
            }
        }
    }

    /// Step a sub-machine once: settle in `active`, or move to `done` when
    /// it reports terminal. Dispatch sites restart the machine first and
    /// use the same helper, so the restarted machine gets its entry step
    /// on the dispatching tick.
    fn run_sub(&mut self, step: fn(&mut Pib) -> Step, active: FlightSt, done: FlightSt) -> FlightSt {
        match step(self) {
            Step::Continue => active,
            Step::Done => done,
        }
    }
}
