//! Redock choreography.
//!
//! Post the reel-out immediately, schedule the no-loose-wire retract at
//! +30 s and the PU check at +60 s, then dispatch on whichever fires.
//! The fixed pacing stands in for a motion budget: each leg is a few
//! revolutions. Terminal on PU-docked confirmation or on status silence.

use pib_common::action::ActionId;
use pib_common::consts::PU_RESEND_TIMEOUT_S;
use pib_common::detail;
use pib_common::motion::MotionKind;
use pib_common::msg::mcb::McbCommand;
use pib_common::msg::pu::PuCommand;

use crate::modes::flight::motion::MotionStep;
use crate::modes::flight::Step;
use crate::supervisor::Pib;

/// Seconds from entry to the no-loose-wire retract leg.
const RETRACT_DELAY_S: u32 = 30;
/// Seconds from entry to the PU check.
const CHECK_PU_DELAY_S: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ReDockSt {
    #[default]
    Entry,
    Idle,
    Motion,
    CheckPu,
    WaitPu,
}

/// Local state of the redock choreography.
#[derive(Debug, Default)]
pub struct ReDock {
    state: ReDockSt,
    resend_attempted: bool,
}

impl ReDock {
    pub fn restart(&mut self) {
        self.state = ReDockSt::Entry;
    }
}

impl Pib {
    pub(crate) fn redock_step(&mut self) -> Step {
        use ReDockSt as R;
        match self.sub.redock.state {
            R::Entry => {
                self.flags.set(ActionId::ReelOut);
                self.arm(ActionId::InNoLooseWire, RETRACT_DELAY_S);
                self.arm(ActionId::CheckPu, CHECK_PU_DELAY_S);
                self.sub.redock.state = R::Idle;
                Step::Continue
            }

            R::Idle => {
                if self.flags.consume(ActionId::ReelOut) {
                    self.mcb_state.motion = Some(MotionKind::ReelOut);
                    self.sub.motion.restart(false);
                    self.sub.redock.state = R::Motion;
                } else if self.flags.consume(ActionId::InNoLooseWire) {
                    self.mcb_state.motion = Some(MotionKind::InNoLooseWire);
                    self.sub.motion.restart(false);
                    self.sub.redock.state = R::Motion;
                } else if self.flags.consume(ActionId::CheckPu) {
                    self.sub.redock.resend_attempted = false;
                    self.sub.redock.state = R::CheckPu;
                }
                Step::Continue
            }

            R::Motion => match self.motion_step() {
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
                    self.sub.redock.state = R::Idle;
                    Step::Continue
                }
            },

            R::CheckPu => {
                self.pu.send(PuCommand::SendStatus);
                self.arm(ActionId::ResendPuCheck, PU_RESEND_TIMEOUT_S);
                self.sub.redock.state = R::WaitPu;
                Step::Continue
            }

            R::WaitPu => {
                // Any frame over the wired link marks the PU docked.
                if self.config.pu_docked {
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
                    self.mcb.send(McbCommand::ZeroReel);
                    return Step::Done;
                }

                if self.flags.consume(ActionId::ResendPuCheck) {
                    if !self.sub.redock.resend_attempted {
                        self.sub.redock.resend_attempted = true;
                        self.sub.redock.state = R::CheckPu;
                    } else {
                        self.sub.redock.resend_attempted = false;
                        self.zephyr
                            .log_warn(detail!("PU not responding to status request"));
                        return Step::Done;
                    }
                }
                Step::Continue
            }
        }
    }
}
