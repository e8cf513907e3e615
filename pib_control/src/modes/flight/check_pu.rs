//! PU liveness check.
//!
//! Success is a fresh status: the router stamps the status watermark on a
//! valid reply, and this machine records the watermark at entry and waits
//! for it to move. One retry; a second silence is reported as a warning
//! and the machine completes with `check_success` false.

use pib_common::action::ActionId;
use pib_common::consts::PU_RESEND_TIMEOUT_S;
use pib_common::detail;
use pib_common::msg::pu::PuCommand;
use tracing::info;

use crate::modes::flight::Step;
use crate::supervisor::Pib;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum CheckPuSt {
    #[default]
    Entry,
    SendRequest,
    WaitStatus,
}

/// Local state of the PU check.
#[derive(Debug, Default)]
pub struct CheckPu {
    state: CheckPuSt,
    resend_attempted: bool,
    /// Status watermark captured at entry.
    watermark: u32,
}

impl CheckPu {
    pub fn restart(&mut self) {
        self.state = CheckPuSt::Entry;
    }
}

impl Pib {
    pub(crate) fn check_pu_step(&mut self) -> Step {
        use CheckPuSt as C;
        match self.sub.check_pu.state {
            C::Entry => {
                info!("Starting PU check");
                self.sub.check_pu.resend_attempted = false;
                self.pu_state.check_success = false;
                self.sub.check_pu.watermark = self.pu_state.status.last_status;
                self.sub.check_pu.state = C::SendRequest;
                Step::Continue
            }

            C::SendRequest => {
                self.pu.send(PuCommand::SendStatus);
                self.arm(ActionId::ResendPuCheck, PU_RESEND_TIMEOUT_S);
                self.sub.check_pu.state = C::WaitStatus;
                Step::Continue
            }

            C::WaitStatus => {
                if self.sub.check_pu.watermark != self.pu_state.status.last_status {
                    self.sub.check_pu.resend_attempted = false;
                    self.pu_state.check_success = true;
                    return Step::Done;
                }

                if self.flags.consume(ActionId::ResendPuCheck) {
                    if !self.sub.check_pu.resend_attempted {
                        self.sub.check_pu.resend_attempted = true;
                        self.sub.check_pu.state = C::SendRequest;
                    } else {
                        self.sub.check_pu.resend_attempted = false;
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

#[cfg(test)]
mod tests {
    use super::*;
    use pib_common::config::PibConfig;
    use pib_common::time::TickClock;

    fn checking_pib() -> Pib {
        let mut pib = Pib::new(PibConfig::default());
        pib.clock = TickClock::new(5_000, 2_000);
        pib.sub.check_pu.restart();
        pib
    }

    #[test]
    fn fresh_status_completes_without_retry() {
        let mut pib = checking_pib();
        pib.pu_state.status.last_status = 1_000;

        assert_eq!(pib.check_pu_step(), Step::Continue); // entry: watermark captured
        assert_eq!(pib.check_pu_step(), Step::Continue); // request out
        assert_eq!(pib.pu.outbox.pop_front(), Some(PuCommand::SendStatus));

        // The router stamps a newer status before the first retry fires.
        pib.pu_state.status.last_status = 1_050;
        assert_eq!(pib.check_pu_step(), Step::Done);
        assert!(pib.pu_state.check_success);
        assert!(pib.pu.outbox.is_empty());
    }

    #[test]
    fn unchanged_watermark_keeps_waiting() {
        let mut pib = checking_pib();
        pib.pu_state.status.last_status = 1_000;
        pib.check_pu_step();
        pib.check_pu_step();
        for _ in 0..5 {
            assert_eq!(pib.check_pu_step(), Step::Continue);
        }
        assert!(!pib.pu_state.check_success);
    }

    #[test]
    fn silence_retries_once_then_reports_failure() {
        let mut pib = checking_pib();
        pib.check_pu_step(); // entry
        pib.check_pu_step(); // first request
        assert_eq!(pib.pu.outbox.pop_front(), Some(PuCommand::SendStatus));

        pib.flags.set(ActionId::ResendPuCheck); // first window closes
        assert_eq!(pib.check_pu_step(), Step::Continue);
        assert_eq!(pib.check_pu_step(), Step::Continue); // retry goes out
        assert_eq!(pib.pu.outbox.pop_front(), Some(PuCommand::SendStatus));

        pib.flags.set(ActionId::ResendPuCheck); // second window closes
        assert_eq!(pib.check_pu_step(), Step::Done);
        assert!(!pib.pu_state.check_success);
        assert!(pib.pu.outbox.is_empty());
    }

    #[test]
    fn restart_resets_the_watermark() {
        let mut pib = checking_pib();
        pib.pu_state.status.last_status = 1_000;
        pib.check_pu_step();
        pib.pu_state.status.last_status = 1_050;
        pib.check_pu_step();
        assert_eq!(pib.check_pu_step(), Step::Done);

        // A second run must not ride on the old watermark.
        pib.sub.check_pu.restart();
        pib.check_pu_step();
        pib.check_pu_step();
        for _ in 0..3 {
            assert_eq!(pib.check_pu_step(), Step::Continue);
        }
        assert!(!pib.pu_state.check_success);
    }
}
