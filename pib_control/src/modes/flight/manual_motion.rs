//! Ground-commanded single motion.
//!
//! RA handshake, then the shared motion sequence, then a motion TM with a
//! single-retransmit receipt wait. The motion kind and lengths were set by
//! the telecommand handler before dispatch.

use pib_common::action::ActionId;
use pib_common::consts::ZEPHYR_RESEND_TIMEOUT_S;
use pib_common::detail;
use pib_common::msg::zephyr::{AckState, StateFlag};
use tracing::{error, info};

use crate::modes::flight::motion::MotionStep;
use crate::modes::flight::Step;
use crate::supervisor::Pib;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ManualMotionSt {
    #[default]
    SendRa,
    WaitRaAck,
    Motion,
    TmAck,
}

/// Local state of the manual motion procedure.
#[derive(Debug, Default)]
pub struct ManualMotion {
    state: ManualMotionSt,
    resend_attempted: bool,
}

impl ManualMotion {
    pub fn restart(&mut self) {
        self.state = ManualMotionSt::SendRa;
        self.resend_attempted = false;
    }
}

impl Pib {
    pub(crate) fn manual_motion_step(&mut self) -> Step {
        use ManualMotionSt as M;
        match self.sub.manual_motion.state {
            M::SendRa => {
                self.zephyr.ra();
                self.arm(ActionId::ResendRa, ZEPHYR_RESEND_TIMEOUT_S);
                self.sub.manual_motion.state = M::WaitRaAck;
                info!("Sending RA");
                Step::Continue
            }

            M::WaitRaAck => {
                if self.config.ra_override {
                    // Emergency/test override of the RA requirement.
                    self.zephyr.ra_ack = AckState::Ack;
                }
                match self.zephyr.ra_ack {
                    AckState::Ack => {
                        info!("RA ACK");
                        self.sub.manual_motion.resend_attempted = false;
                        self.sub.motion.restart(true);
                        self.sub.manual_motion.state = M::Motion;
                    }
                    AckState::Nak => {
                        self.sub.manual_motion.resend_attempted = false;
                        self.zephyr
                            .log_warn(detail!("Cannot perform motion, RA NAK"));
                        return Step::Done;
                    }
                    AckState::NoAck => {
                        if self.flags.consume(ActionId::ResendRa) {
                            if !self.sub.manual_motion.resend_attempted {
                                self.sub.manual_motion.resend_attempted = true;
                                self.sub.manual_motion.state = M::SendRa;
                            } else {
                                self.sub.manual_motion.resend_attempted = false;
                                self.zephyr.log_warn(detail!("Never received RA ack"));
                                return Step::Done;
                            }
                        }
                    }
                }
                Step::Continue
            }

            M::Motion => match self.motion_step() {
                MotionStep::Pending => Step::Continue,
                MotionStep::Stopped => {
                    self.zephyr.log_fine(detail!("Commanded motion stop"));
                    Step::Done
                }
                MotionStep::Failed => {
                    self.force_mode_error();
                    Step::Continue
                }
                MotionStep::Complete(_) => {
                    self.send_mcb_tm(StateFlag::Fine, "Finished commanded manual motion");
                    self.arm(ActionId::ResendTm, ZEPHYR_RESEND_TIMEOUT_S);
                    self.sub.manual_motion.state = M::TmAck;
                    Step::Continue
                }
            },

            M::TmAck => {
                match self.zephyr.tm_ack {
                    AckState::Ack => {
                        info!("Zephyr acked motion TM");
                        return Step::Done;
                    }
                    AckState::Nak => {
                        error!("Needed to resend TM");
                        self.zephyr.resend_tm();
                        return Step::Done;
                    }
                    AckState::NoAck => {
                        if self.flags.consume(ActionId::ResendTm) {
                            error!("Needed to resend TM");
                            self.zephyr.resend_tm();
                            return Step::Done;
                        }
                    }
                }
                Step::Continue
            }
        }
    }
}
