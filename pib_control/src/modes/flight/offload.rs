//! Post-profile PU data offload.
//!
//! Loop: check the PU, request one profile record, downlink it with a
//! status-bearing detail string, wait for the TM receipt, repeat until
//! the PU reports no more records.

use pib_common::action::ActionId;
use pib_common::consts::{PU_RESEND_TIMEOUT_S, ZEPHYR_RESEND_TIMEOUT_S};
use pib_common::detail;
use pib_common::msg::pu::PuCommand;
use pib_common::msg::zephyr::AckState;
use tracing::{error, info};

use crate::modes::flight::Step;
use crate::supervisor::Pib;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum PuOffloadSt {
    #[default]
    Entry,
    GetPuStatus,
    WaitPuStatus,
    RequestPacket,
    WaitPacket,
    TmAck,
}

/// Local state of the PU offload.
#[derive(Debug, Default)]
pub struct PuOffload {
    state: PuOffloadSt,
    resend_attempted: bool,
    packet_num: u8,
}

impl PuOffload {
    pub fn restart(&mut self) {
        self.state = PuOffloadSt::Entry;
    }
}

impl Pib {
    pub(crate) fn offload_step(&mut self) -> Step {
        use PuOffloadSt as O;
        match self.sub.offload.state {
            O::Entry => {
                self.sub.offload.resend_attempted = false;
                self.sub.offload.packet_num = 0;
                self.sub.offload.state = O::GetPuStatus;
                Step::Continue
            }

            O::GetPuStatus => {
                self.sub.check_pu.restart();
                self.sub.offload.state = if self.check_pu_step() == Step::Done {
                    O::RequestPacket
                } else {
                    O::WaitPuStatus
                };
                Step::Continue
            }

            O::WaitPuStatus => {
                if self.check_pu_step() == Step::Done {
                    self.sub.offload.state = O::RequestPacket;
                }
                Step::Continue
            }

            O::RequestPacket => {
                self.pu.send(PuCommand::SendProfileRecord);
                self.arm(ActionId::ResendPuRecord, PU_RESEND_TIMEOUT_S);
                self.pu_state.record_received = false;
                self.pu_state.no_more_records = false;
                self.sub.offload.state = O::WaitPacket;
                Step::Continue
            }

            O::WaitPacket => {
                if self.pu_state.record_received {
                    // Receipt already acked by the router.
                    self.pu_state.record_received = false;
                    self.sub.offload.packet_num = self.sub.offload.packet_num.wrapping_add(1);
                    info!(
                        "Received profile record: {} bytes",
                        self.pu_state.record_buf.len()
                    );
                    let n = self.sub.offload.packet_num;
                    self.send_profile_tm(n);
                    self.arm(ActionId::ResendTm, ZEPHYR_RESEND_TIMEOUT_S);
                    self.sub.offload.state = O::TmAck;
                    return Step::Continue;
                } else if self.pu_state.no_more_records {
                    self.pu_state.no_more_records = false;
                    info!("No more profile records");
                    return Step::Done;
                }

                if self.flags.consume(ActionId::ResendPuRecord) {
                    if !self.sub.offload.resend_attempted {
                        self.sub.offload.resend_attempted = true;
                        self.sub.offload.state = O::RequestPacket;
                    } else {
                        self.sub.offload.resend_attempted = false;
                        self.zephyr
                            .log_warn(detail!("PU not successful in sending profile record"));
                        return Step::Done;
                    }
                }
                Step::Continue
            }

            O::TmAck => {
                match self.zephyr.tm_ack {
                    AckState::Ack => {
                        self.sub.offload.resend_attempted = false;
                        self.sub.offload.state = O::GetPuStatus;
                    }
                    AckState::Nak => {
                        error!("Needed to resend TM");
                        self.zephyr.resend_tm();
                        self.sub.offload.resend_attempted = false;
                        self.sub.offload.state = O::GetPuStatus;
                    }
                    AckState::NoAck => {
                        if self.flags.consume(ActionId::ResendTm) {
                            error!("Needed to resend TM");
                            self.zephyr.resend_tm();
                            self.sub.offload.resend_attempted = false;
                            self.sub.offload.state = O::GetPuStatus;
                        }
                    }
                }
                Step::Continue
            }
        }
    }
}
