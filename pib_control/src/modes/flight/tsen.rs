//! TSEN record fetch and downlink.
//!
//! Loops record-by-record until the PU reports its store empty. The
//! machine is preemptible: a manual override kills it, and in autonomous
//! mode a pending profile wins — the profile trigger is re-posted so the
//! wait state sees it.

use pib_common::action::ActionId;
use pib_common::consts::{PU_RESEND_TIMEOUT_S, ZEPHYR_RESEND_TIMEOUT_S};
use pib_common::detail;
use pib_common::msg::pu::PuCommand;
use pib_common::msg::zephyr::AckState;
use tracing::{error, info};

use crate::modes::flight::Step;
use crate::supervisor::Pib;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum TsenSt {
    #[default]
    Entry,
    GetPuStatus,
    RequestTsen,
    WaitTsen,
    TmAck,
}

/// Local state of the TSEN fetch.
#[derive(Debug, Default)]
pub struct Tsen {
    state: TsenSt,
    resend_attempted: bool,
}

impl Tsen {
    pub fn restart(&mut self) {
        self.state = TsenSt::Entry;
    }
}

impl Pib {
    pub(crate) fn tsen_step(&mut self) -> Step {
        // Preemption checks run before the state step on every call.
        if !self.autonomous_mode && self.flags.consume(ActionId::OverrideTsen) {
            return Step::Done;
        }
        if self.autonomous_mode && self.flags.consume(ActionId::BeginProfile) {
            // Profile wins; hand the trigger back for the profile wait.
            self.flags.set(ActionId::BeginProfile);
            return Step::Done;
        }

        use TsenSt as T;
        match self.sub.tsen.state {
            T::Entry => {
                self.sub.tsen.resend_attempted = false;
                self.sub.check_pu.restart();
                self.sub.tsen.state = if self.check_pu_step() == Step::Done {
                    T::RequestTsen
                } else {
                    T::GetPuStatus
                };
                Step::Continue
            }

            T::GetPuStatus => {
                if self.check_pu_step() == Step::Done {
                    self.sub.tsen.state = T::RequestTsen;
                }
                Step::Continue
            }

            T::RequestTsen => {
                self.pu.send(PuCommand::SendTsenRecord);
                self.arm(ActionId::ResendPuTsen, PU_RESEND_TIMEOUT_S);
                self.pu_state.tsen_received = false;
                self.pu_state.no_more_records = false;
                self.sub.tsen.state = T::WaitTsen;
                Step::Continue
            }

            T::WaitTsen => {
                if self.pu_state.tsen_received {
                    // Receipt already acked by the router.
                    self.pu_state.tsen_received = false;
                    info!("Received TSEN: {} bytes", self.pu_state.record_buf.len());
                    self.send_tsen_tm();
                    self.arm(ActionId::ResendTm, ZEPHYR_RESEND_TIMEOUT_S);
                    self.sub.tsen.state = T::TmAck;
                    return Step::Continue;
                } else if self.pu_state.no_more_records {
                    self.pu_state.no_more_records = false;
                    info!("No more TSEN records");
                    return Step::Done;
                }

                if self.flags.consume(ActionId::ResendPuTsen) {
                    if !self.sub.tsen.resend_attempted {
                        self.sub.tsen.resend_attempted = true;
                        self.sub.tsen.state = T::RequestTsen;
                    } else {
                        self.sub.tsen.resend_attempted = false;
                        self.zephyr
                            .log_warn(detail!("PU not successful in sending TSEN"));
                        return Step::Done;
                    }
                }
                Step::Continue
            }

            T::TmAck => {
                match self.zephyr.tm_ack {
                    AckState::Ack => {
                        self.sub.tsen.state = T::Entry;
                    }
                    AckState::Nak => {
                        error!("Needed to resend TM");
                        self.zephyr.resend_tm();
                        self.sub.tsen.state = T::Entry;
                    }
                    AckState::NoAck => {
                        if self.flags.consume(ActionId::ResendTm) {
                            error!("Needed to resend TM");
                            self.zephyr.resend_tm();
                            self.sub.tsen.state = T::Entry;
                        }
                    }
                }
                Step::Continue
            }
        }
    }
}
