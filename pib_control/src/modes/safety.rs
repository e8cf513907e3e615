//! Safety: linear recovery posture.
//!
//! Full retract, dock, MCB to low power, announce safety, then loop with
//! the SAFE line asserted until the OBC moves us on. The retract and dock
//! resends here are unbounded: there is no better fallback from safety
//! mode than trying again.

use pib_common::action::ActionId;
use pib_common::consts::{
    MCB_RESEND_TIMEOUT_S, SAFETY_DOCK_LENGTH_REVS, ZEPHYR_RESEND_TIMEOUT_S,
};
use pib_common::detail;
use pib_common::motion::MotionKind;
use pib_common::msg::mcb::McbCommand;
use pib_common::msg::zephyr::AckState;
use tracing::{debug, info};

use crate::supervisor::Pib;

/// Safety substates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetySt {
    Entry,
    SendFullRetract,
    VerifyFullRetract,
    MonitorFullRetract,
    CommandDock,
    VerifyDock,
    MonitorDock,
    SendMcbLowPower,
    VerifyMcbLowPower,
    SendSafety,
    AckWait,
    Loop,
    Error,
    Shutdown,
    Exit,
}

impl Pib {
    pub(crate) fn safety_tick(&mut self, st: SafetySt) -> SafetySt {
        use SafetySt as S;
        match st {
            S::Entry => {
                info!("Entering safety");
                S::SendFullRetract
            }

            S::SendFullRetract => {
                self.mcb_state.reeling_in = false;
                // Full retract has no length to size a budget from; the
                // finish report is the only completion signal.
                self.mcb_state.motion_ongoing = true;
                self.mcb.send(McbCommand::FullRetract);
                self.arm(ActionId::ResendFullRetract, MCB_RESEND_TIMEOUT_S);
                S::VerifyFullRetract
            }

            S::VerifyFullRetract => {
                if self.mcb_state.reeling_in {
                    info!("MCB performing full retract");
                    return S::MonitorFullRetract;
                }
                if self.flags.consume(ActionId::ResendFullRetract) {
                    return S::SendFullRetract;
                }
                S::VerifyFullRetract
            }

            S::MonitorFullRetract => {
                if !self.mcb_state.motion_ongoing {
                    info!("MCB full retract appears complete");
                    self.params.dock_length = SAFETY_DOCK_LENGTH_REVS;
                    return S::CommandDock;
                }
                S::MonitorFullRetract
            }

            S::CommandDock => {
                self.mcb_state.motion = Some(MotionKind::Dock);
                if self.start_mcb_motion() {
                    self.arm(ActionId::ResendMotionCommand, MCB_RESEND_TIMEOUT_S);
                    S::VerifyDock
                } else {
                    self.zephyr.log_warn(detail!("Motion start error"));
                    self.force_mode_error();
                    S::CommandDock
                }
            }

            S::VerifyDock => {
                if self.mcb_state.motion_ongoing {
                    info!("MCB commanded motion");
                    let budget = self.mcb_state.max_motion_seconds;
                    self.arm(ActionId::MotionTimeout, budget);
                    return S::MonitorDock;
                }
                if self.flags.consume(ActionId::ResendMotionCommand) {
                    return S::CommandDock;
                }
                S::VerifyDock
            }

            S::MonitorDock => {
                if !self.mcb_state.motion_ongoing {
                    S::SendMcbLowPower
                } else {
                    S::MonitorDock
                }
            }

            S::SendMcbLowPower => {
                self.mcb_state.low_power = false;
                self.mcb.send(McbCommand::GoLowPower);
                self.arm(ActionId::ResendMcbLowPower, MCB_RESEND_TIMEOUT_S);
                S::VerifyMcbLowPower
            }

            S::VerifyMcbLowPower => {
                if self.mcb_state.low_power {
                    info!("MCB in low power for safety");
                    return S::SendSafety;
                }
                if self.flags.consume(ActionId::ResendMcbLowPower) {
                    // One more try, then just get the safety message out.
                    self.mcb.send(McbCommand::GoLowPower);
                    return S::SendSafety;
                }
                S::VerifyMcbLowPower
            }

            S::SendSafety => {
                info!("Sending safety message");
                self.pins.safe = true;
                self.zephyr.safety();
                self.arm(ActionId::ResendSafety, ZEPHYR_RESEND_TIMEOUT_S);
                S::AckWait
            }

            S::AckWait => {
                debug!("Waiting on safety ack");
                match self.zephyr.s_ack {
                    AckState::Ack => {
                        self.zephyr.s_ack = AckState::NoAck;
                        return S::Loop;
                    }
                    AckState::Nak => {
                        // A resend is already scheduled; just clear it.
                        self.zephyr.s_ack = AckState::NoAck;
                    }
                    AckState::NoAck => {}
                }
                if self.flags.consume(ActionId::ResendSafety) {
                    return S::SendSafety;
                }
                S::AckWait
            }

            S::Loop => {
                debug!("Safety loop");
                self.pins.safe = true;
                S::Loop
            }

            S::Error => {
                debug!("Safety error");
                S::Error
            }

            S::Shutdown => {
                info!("Shutdown warning received in safety");
                S::Shutdown
            }

            S::Exit => {
                self.pins.safe = false;
                info!("Exiting safety");
                S::Exit
            }
        }
    }
}
