//! The full profile sequence.
//!
//! RA handshake → PU warmup → TSEN sweep → PU profile plan → preprofile
//! dwell → reel out → dwell → reel in → dock-wait grace → dock → PU check
//! → dock verification, with a bounded redock loop, then reel zeroing and
//! MCB low power. Auto-offload is queued at terminal success when
//! configured.

use pib_common::action::ActionId;
use pib_common::consts::{
    DOCK_WAIT_GRACE_S, MCB_RESEND_TIMEOUT_S, PU_RESEND_TIMEOUT_S, ZEPHYR_RESEND_TIMEOUT_S,
};
use pib_common::detail;
use pib_common::motion::MotionKind;
use pib_common::msg::mcb::McbCommand;
use pib_common::msg::pu::PuCommand;
use pib_common::msg::zephyr::{AckState, StateFlag};
use tracing::{debug, info};

use crate::modes::flight::motion::MotionStep;
use crate::modes::flight::Step;
use crate::supervisor::Pib;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ProfileSt {
    #[default]
    SendRa,
    WaitRaAck,
    SetPuWarmup,
    ConfirmPuWarmup,
    Warmup,
    GetTsen,
    SetPuProfile,
    ConfirmPuProfile,
    PreprofileWait,
    ReelOut,
    Dwell,
    ReelIn,
    DockWait,
    Dock,
    Motion,
    GetPuStatus,
    VerifyDock,
    Redock,
    ConfirmMcbLowPower,
}

/// Local state of the profile sequence.
#[derive(Debug, Default)]
pub struct Profile {
    state: ProfileSt,
    resend_attempted: bool,
    redock_count: u8,
}

impl Profile {
    pub fn restart(&mut self) {
        self.state = ProfileSt::SendRa;
        self.resend_attempted = false;
        self.redock_count = 0;
    }
}

impl Pib {
    pub(crate) fn profile_step(&mut self) -> Step {
        use ProfileSt as P;
        match self.sub.profile.state {
            P::SendRa => {
                self.zephyr.ra();
                self.arm(ActionId::ResendRa, ZEPHYR_RESEND_TIMEOUT_S);
                self.sub.profile.state = P::WaitRaAck;
                info!("Sending RA");
                Step::Continue
            }

            P::WaitRaAck => {
                if self.config.ra_override {
                    // Emergency/test override of the RA requirement.
                    self.zephyr.ra_ack = AckState::Ack;
                }
                debug!("Profile waiting on RA ack");
                match self.zephyr.ra_ack {
                    AckState::Ack => {
                        info!("RA ACK");
                        self.sub.profile.resend_attempted = false;
                        self.sub.profile.state = P::SetPuWarmup;
                    }
                    AckState::Nak => {
                        self.sub.profile.resend_attempted = false;
                        self.zephyr
                            .log_warn(detail!("Cannot perform motion, RA NAK"));
                        return Step::Done;
                    }
                    AckState::NoAck => {
                        if self.flags.consume(ActionId::ResendRa) {
                            if !self.sub.profile.resend_attempted {
                                self.sub.profile.resend_attempted = true;
                                self.sub.profile.state = P::SendRa;
                            } else {
                                self.sub.profile.resend_attempted = false;
                                self.zephyr.log_warn(detail!("Never received RA ack"));
                                return Step::Done;
                            }
                        }
                    }
                }
                Step::Continue
            }

            P::SetPuWarmup => {
                self.pu_state.warmup_acked = false;
                let cfg = &self.config;
                self.pu.send(PuCommand::Warmup {
                    flash_temp: cfg.flash_temp,
                    heater1_temp: cfg.heater1_temp,
                    heater2_temp: cfg.heater2_temp,
                    flash_power: cfg.flash_power,
                    tsen_power: cfg.tsen_power,
                });
                self.arm(ActionId::ResendPuWarmup, PU_RESEND_TIMEOUT_S);
                self.sub.profile.state = P::ConfirmPuWarmup;
                Step::Continue
            }

            P::ConfirmPuWarmup => {
                if self.pu_state.warmup_acked {
                    self.sub.profile.state = P::Warmup;
                    let warmup = u32::from(self.config.puwarmup_time);
                    self.arm(ActionId::EndWarmup, warmup);
                } else if self.flags.consume(ActionId::ResendPuWarmup) {
                    if !self.sub.profile.resend_attempted {
                        self.sub.profile.resend_attempted = true;
                        self.sub.profile.state = P::SetPuWarmup;
                    } else {
                        self.sub.profile.resend_attempted = false;
                        self.zephyr
                            .log_warn(detail!("PU not responding to warmup command"));
                        return Step::Done;
                    }
                }
                Step::Continue
            }

            P::Warmup => {
                if self.flags.consume(ActionId::EndWarmup) {
                    self.sub.tsen.restart();
                    self.sub.profile.state = if self.tsen_step() == Step::Done {
                        P::SetPuProfile
                    } else {
                        P::GetTsen
                    };
                }
                Step::Continue
            }

            P::GetTsen => {
                if self.tsen_step() == Step::Done {
                    self.sub.profile.state = P::SetPuProfile;
                }
                Step::Continue
            }

            P::SetPuProfile => {
                let cfg = &self.config;
                self.params.retract_length = cfg.profile_size - cfg.dock_amount;
                self.params.deploy_length = cfg.profile_size;
                self.params.dock_length = cfg.dock_amount + cfg.dock_overshoot;
                self.pu_state.profile_acked = false;
                self.pu_start_profile();
                self.arm(ActionId::ResendPuGoProfile, PU_RESEND_TIMEOUT_S);
                self.sub.profile.state = P::ConfirmPuProfile;
                Step::Continue
            }

            P::ConfirmPuProfile => {
                if self.pu_state.profile_acked {
                    self.sub.profile.state = P::PreprofileWait;
                    let preprofile = u32::from(self.config.preprofile_time);
                    self.arm(ActionId::EndPreprofile, preprofile);
                } else if self.flags.consume(ActionId::ResendPuGoProfile) {
                    if !self.sub.profile.resend_attempted {
                        self.sub.profile.resend_attempted = true;
                        self.sub.profile.state = P::SetPuProfile;
                    } else {
                        self.sub.profile.resend_attempted = false;
                        self.zephyr
                            .log_warn(detail!("PU not responding to profile command"));
                        return Step::Done;
                    }
                }
                Step::Continue
            }

            P::PreprofileWait => {
                if self.flags.consume(ActionId::EndPreprofile) {
                    self.sub.profile.state = P::ReelOut;
                    self.sub.profile.resend_attempted = false;
                }
                Step::Continue
            }

            P::ReelOut => {
                debug!("Profile reel out");
                self.mcb_state.motion = Some(MotionKind::ReelOut);
                self.sub.motion.restart(true);
                self.sub.profile.state = P::Motion;
                Step::Continue
            }

            P::Dwell => {
                debug!("Profile dwell");
                if self.flags.consume(ActionId::EndDwell) {
                    info!("Finished dwell");
                    self.sub.profile.state = P::ReelIn;
                }
                Step::Continue
            }

            P::ReelIn => {
                debug!("Profile reel in");
                self.mcb_state.motion = Some(MotionKind::ReelIn);
                self.sub.motion.restart(true);
                self.sub.profile.state = P::Motion;
                Step::Continue
            }

            P::DockWait => {
                // The stale reel-in motion budget fires shortly after the
                // reel-in finishes; take it or the backup grace timer,
                // whichever lands first.
                if self.flags.consume(ActionId::MotionTimeout)
                    || self.flags.consume(ActionId::EndDockWait)
                {
                    self.sub.profile.state = P::Dock;
                }
                Step::Continue
            }

            P::Dock => {
                debug!("Profile dock");
                self.mcb_state.motion = Some(MotionKind::Dock);
                self.sub.motion.restart(true);
                self.sub.profile.state = P::Motion;
                Step::Continue
            }

            P::Motion => match self.motion_step() {
                MotionStep::Pending => Step::Continue,
                MotionStep::Stopped => {
                    self.zephyr
                        .log_warn(detail!("Commanded motion stop in profile"));
                    self.force_mode_error();
                    Step::Continue
                }
                MotionStep::Failed => {
                    self.force_mode_error();
                    Step::Continue
                }
                MotionStep::Complete(kind) => {
                    info!("Motion complete");
                    self.profile_motion_complete(kind)
                }
            },

            P::GetPuStatus => {
                if self.check_pu_step() == Step::Done {
                    self.sub.profile.state = P::VerifyDock;
                }
                Step::Continue
            }

            P::VerifyDock => {
                if self.config.pu_docked {
                    self.mcb.send(McbCommand::ZeroReel);
                    self.mcb.send(McbCommand::GoLowPower);
                    self.arm(ActionId::ResendMcbLowPower, MCB_RESEND_TIMEOUT_S);
                    self.sub.profile.state = P::ConfirmMcbLowPower;
                } else {
                    self.sub.profile.redock_count += 1;
                    if self.sub.profile.redock_count > self.config.num_redock {
                        self.zephyr.log_crit(detail!(
                            "No dock! Exceeded allowable number of redock attempts"
                        ));
                        self.force_mode_error();
                    } else {
                        self.params.deploy_length = self.config.redock_out;
                        self.params.retract_length = self.config.redock_in;
                        self.sub.redock.restart();
                        if self.redock_step() == Step::Done {
                            self.start_post_dock_check();
                        } else {
                            self.sub.profile.state = P::Redock;
                        }
                    }
                }
                Step::Continue
            }

            P::Redock => {
                if self.redock_step() == Step::Done {
                    self.start_post_dock_check();
                }
                Step::Continue
            }

            P::ConfirmMcbLowPower => {
                if self.mcb_state.low_power {
                    info!("Profile finished, MCB in low power");
                    self.mcb_state.low_power = false;
                    if self.config.pu_auto_offload {
                        info!("Begin automatic PU offload");
                        self.flags.set(ActionId::OffloadPu);
                        self.flags.set(ActionId::OverrideTsen);
                    }
                    return Step::Done;
                } else if self.flags.consume(ActionId::ResendMcbLowPower) {
                    if !self.sub.profile.resend_attempted {
                        self.sub.profile.resend_attempted = true;
                        self.mcb.send(McbCommand::GoLowPower);
                        self.arm(ActionId::ResendMcbLowPower, MCB_RESEND_TIMEOUT_S);
                    } else {
                        self.sub.profile.resend_attempted = false;
                        self.zephyr
                            .log_warn(detail!("MCB never powered off after profile"));
                        self.force_mode_error();
                    }
                }
                Step::Continue
            }
        }
    }

    /// Kick off the post-dock PU check: restart plus its entry step on
    /// this tick, like every other sub-machine hand-off.
    fn start_post_dock_check(&mut self) {
        self.sub.check_pu.restart();
        self.sub.profile.state = if self.check_pu_step() == Step::Done {
            ProfileSt::VerifyDock
        } else {
            ProfileSt::GetPuStatus
        };
    }

    /// Phase advance after a completed profile motion.
    fn profile_motion_complete(&mut self, kind: MotionKind) -> Step {
        use ProfileSt as P;
        match kind {
            MotionKind::ReelOut => {
                self.send_mcb_tm(StateFlag::Fine, "Finished profile reel out");
                let dwell = u32::from(self.config.dwell_time);
                if self.sched.add(ActionId::EndDwell, dwell, self.clock.mono_ms) {
                    info!("Scheduled dwell: {dwell} s");
                    self.sub.profile.state = P::Dwell;
                } else {
                    self.zephyr.log_crit(detail!("Unable to schedule dwell"));
                    self.force_mode_error();
                }
            }
            MotionKind::ReelIn => {
                self.send_mcb_tm(StateFlag::Fine, "Finished profile reel in");
                self.arm(ActionId::EndDockWait, DOCK_WAIT_GRACE_S);
                self.sub.profile.state = P::DockWait;
            }
            MotionKind::Dock => {
                // The dock TM went out with the fault-as-dock report.
                self.sub.profile.redock_count = 0;
                self.start_post_dock_check();
            }
            MotionKind::InNoLooseWire => {
                self.send_mcb_tm(StateFlag::Crit, "Unknown motion finished in profile monitor");
                self.force_mode_error();
            }
        }
        Step::Continue
    }
}
