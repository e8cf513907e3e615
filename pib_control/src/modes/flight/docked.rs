//! Docked profile: run the PU's sensors without deploying.
//!
//! Warmup → TSEN sweep → a profile plan parameterised for a stationary
//! run (the PU only needs the total to bound its sampling window) → timed
//! wait → done, with the same auto-offload hand-off as a real profile.

use pib_common::action::ActionId;
use pib_common::consts::PU_RESEND_TIMEOUT_S;
use pib_common::detail;
use pib_common::msg::pu::PuCommand;

use crate::modes::flight::Step;
use crate::supervisor::Pib;

/// Seconds shaved off the docked duration for the nominal "down" leg.
const DOCKED_DOWN_MARGIN_S: u16 = 10;
/// Stub dwell/up legs of the stationary plan.
const DOCKED_STUB_S: u16 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum DockedProfileSt {
    #[default]
    SetPuWarmup,
    ConfirmPuWarmup,
    Warmup,
    GetTsen,
    SetPuProfile,
    ConfirmPuProfile,
    ProfileWait,
}

/// Local state of the docked profile.
#[derive(Debug, Default)]
pub struct DockedProfile {
    state: DockedProfileSt,
    resend_attempted: bool,
}

impl DockedProfile {
    pub fn restart(&mut self) {
        self.state = DockedProfileSt::SetPuWarmup;
        self.resend_attempted = false;
    }
}

impl Pib {
    pub(crate) fn docked_step(&mut self) -> Step {
        use DockedProfileSt as D;
        match self.sub.docked.state {
            D::SetPuWarmup => {
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
                self.sub.docked.state = D::ConfirmPuWarmup;
                Step::Continue
            }

            D::ConfirmPuWarmup => {
                if self.pu_state.warmup_acked {
                    self.sub.docked.state = D::Warmup;
                    let warmup = u32::from(self.config.puwarmup_time);
                    self.arm(ActionId::EndWarmup, warmup);
                } else if self.flags.consume(ActionId::ResendPuWarmup) {
                    if !self.sub.docked.resend_attempted {
                        self.sub.docked.resend_attempted = true;
                        self.sub.docked.state = D::SetPuWarmup;
                    } else {
                        self.sub.docked.resend_attempted = false;
                        self.zephyr
                            .log_warn(detail!("PU not responding to warmup command"));
                        return Step::Done;
                    }
                }
                Step::Continue
            }

            D::Warmup => {
                if self.flags.consume(ActionId::EndWarmup) {
                    self.sub.tsen.restart();
                    self.sub.docked.state = if self.tsen_step() == Step::Done {
                        D::SetPuProfile
                    } else {
                        D::GetTsen
                    };
                }
                Step::Continue
            }

            D::GetTsen => {
                if self.tsen_step() == Step::Done {
                    self.sub.docked.state = D::SetPuProfile;
                }
                Step::Continue
            }

            D::SetPuProfile => {
                // The generic profile plan stands in for a dedicated docked
                // command: short stub legs, LoRa off. The PU acks it as a
                // profile, so that is the ack we wait on.
                self.pu_state.profile_acked = false;
                let cfg = &self.config;
                let t_down = self
                    .docked_profile_time
                    .saturating_sub(DOCKED_DOWN_MARGIN_S);
                self.pu.send(PuCommand::Profile {
                    t_down: i32::from(t_down),
                    dwell: DOCKED_STUB_S,
                    t_up: i32::from(DOCKED_STUB_S),
                    profile_rate: cfg.docked_rate,
                    dwell_rate: 1,
                    tsen: cfg.docked_tsen,
                    ropc: cfg.docked_ropc,
                    flash: cfg.docked_flash,
                    lora_tm: false,
                });
                self.arm(ActionId::ResendPuGoProfile, PU_RESEND_TIMEOUT_S);
                self.sub.docked.state = D::ConfirmPuProfile;
                Step::Continue
            }

            D::ConfirmPuProfile => {
                if self.pu_state.profile_acked {
                    self.sub.docked.state = D::ProfileWait;
                    let wait = u32::from(self.docked_profile_time);
                    self.arm(ActionId::EndPreprofile, wait);
                } else if self.flags.consume(ActionId::ResendPuGoProfile) {
                    if !self.sub.docked.resend_attempted {
                        self.sub.docked.resend_attempted = true;
                        self.sub.docked.state = D::SetPuProfile;
                    } else {
                        self.sub.docked.resend_attempted = false;
                        self.zephyr
                            .log_warn(detail!("PU not responding to profile command"));
                        return Step::Done;
                    }
                }
                Step::Continue
            }

            D::ProfileWait => {
                if self.flags.consume(ActionId::EndPreprofile) {
                    self.zephyr.log_fine(detail!("Finished docked profile"));
                    if self.config.pu_auto_offload {
                        tracing::info!("Begin automatic PU offload");
                        self.flags.set(ActionId::OffloadPu);
                        self.flags.set(ActionId::OverrideTsen);
                    }
                    return Step::Done;
                }
                Step::Continue
            }
        }
    }
}
