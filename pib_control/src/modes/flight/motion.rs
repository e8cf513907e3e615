//! Shared motion sequence: command, verify the ack, monitor to completion.
//!
//! One retry covers most transient serial losses without risking a double
//! start: if the MCB actually started the motion and only the ack was
//! lost, the eventual ack sets `motion_ongoing` and the re-entry guard in
//! the start step refuses a second command.

use pib_common::action::ActionId;
use pib_common::consts::MCB_RESEND_TIMEOUT_S;
use pib_common::detail;
use pib_common::motion::MotionKind;
use pib_common::msg::mcb::McbCommand;
use pib_common::msg::zephyr::StateFlag;
use tracing::info;

use crate::supervisor::Pib;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum MotionSeqSt {
    #[default]
    Start,
    Verify,
    Monitor,
}

/// Local state of the motion sequence.
#[derive(Debug, Default)]
pub struct MotionSequencer {
    state: MotionSeqSt,
    resend_attempted: bool,
    arm_timeout: bool,
}

impl MotionSequencer {
    /// Reset for a fresh motion. `arm_timeout` arms the motion budget
    /// timer once the MCB acks; the redock choreography paces itself with
    /// its own timers instead.
    pub fn restart(&mut self, arm_timeout: bool) {
        self.state = MotionSeqSt::Start;
        self.resend_attempted = false;
        self.arm_timeout = arm_timeout;
    }
}

/// Progress of the motion sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionStep {
    /// Keep stepping.
    Pending,
    /// Motion ran to completion (finish or dock-assumed fault).
    Complete(MotionKind),
    /// Ground commanded a stop; the owner decides how to report it.
    Stopped,
    /// Unrecoverable (never acked, or timed out); the owner escalates.
    Failed,
}

impl Pib {
    pub(crate) fn motion_step(&mut self) -> MotionStep {
        use MotionSeqSt as M;
        match self.sub.motion.state {
            M::Start => {
                if self.mcb_state.motion_ongoing {
                    self.zephyr
                        .log_warn(detail!("Motion commanded while motion ongoing"));
                    return MotionStep::Failed;
                }
                if self.start_mcb_motion() {
                    self.arm(ActionId::ResendMotionCommand, MCB_RESEND_TIMEOUT_S);
                    self.sub.motion.state = M::Verify;
                    MotionStep::Pending
                } else {
                    self.zephyr.log_warn(detail!("Motion start error"));
                    MotionStep::Failed
                }
            }

            M::Verify => {
                if self.mcb_state.motion_ongoing {
                    // Set by the ack handler.
                    info!("MCB commanded motion");
                    if self.sub.motion.arm_timeout {
                        let budget = self.mcb_state.max_motion_seconds;
                        self.arm(ActionId::MotionTimeout, budget);
                    }
                    self.sub.motion.state = M::Monitor;
                    return MotionStep::Pending;
                }
                if self.flags.consume(ActionId::ResendMotionCommand) {
                    if !self.sub.motion.resend_attempted {
                        self.sub.motion.resend_attempted = true;
                        self.sub.motion.state = M::Start;
                    } else {
                        self.sub.motion.resend_attempted = false;
                        self.zephyr.log_warn(detail!("MCB never confirmed motion"));
                        return MotionStep::Failed;
                    }
                }
                MotionStep::Pending
            }

            M::Monitor => {
                if self.flags.consume(ActionId::MotionStop) {
                    return MotionStep::Stopped;
                }
                // Only watch the budget we armed; a stale timeout from an
                // earlier motion must not kill a self-paced sequence.
                if self.sub.motion.arm_timeout && self.flags.consume(ActionId::MotionTimeout) {
                    self.send_mcb_tm(StateFlag::Crit, "MCB motion took longer than expected");
                    self.mcb.send(McbCommand::CancelMotion);
                    return MotionStep::Failed;
                }
                if !self.mcb_state.motion_ongoing {
                    // Finish, or a fault the router resolved.
                    return match self.mcb_state.motion {
                        Some(kind) => MotionStep::Complete(kind),
                        None => MotionStep::Failed,
                    };
                }
                MotionStep::Pending
            }
        }
    }
}
