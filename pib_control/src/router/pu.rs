//! PU message router and handlers.
//!
//! Every frame drained off the wired link marks the PU docked and powered:
//! bytes on that connector physically require a completed dock.

use pib_common::detail;
use pib_common::msg::pu::{PuAck, PuCommand, PuFrame, PuRecordKind};
use pib_common::status::PuStatus;
use tracing::{error, info};

use crate::supervisor::Pib;

impl Pib {
    /// Drain and handle every queued PU frame.
    pub(crate) fn run_pu_router(&mut self) {
        while let Some(frame) = self.pu.inbox.pop_front() {
            self.pu_dock();
            self.handle_pu_frame(frame);
        }
    }

    fn handle_pu_frame(&mut self, frame: PuFrame) {
        match frame {
            PuFrame::Status {
                checksum_valid,
                time,
                v_battery,
                i_charge,
                therm1,
                therm2,
                heater_stat,
            } => {
                if checksum_valid {
                    self.pu_state.status = PuStatus {
                        last_status: self.clock.epoch,
                        time,
                        v_battery,
                        i_charge,
                        therm1,
                        therm2,
                        heater_stat,
                    };
                } else {
                    self.pu_state.status.zero_fields();
                }
            }

            PuFrame::NoMoreRecords => {
                self.pu_state.no_more_records = true;
            }

            PuFrame::Ack(PuAck::GoWarmup) => {
                info!("PU in warmup");
                self.pu_state.warmup_acked = true;
            }
            PuFrame::Ack(PuAck::GoProfile) => {
                info!("PU in profile");
                self.pu_state.profile_acked = true;
            }
            PuFrame::Ack(PuAck::GoPreprofile) => {
                info!("PU in preprofile");
                self.pu_state.preprofile_acked = true;
            }
            PuFrame::Ack(PuAck::Reset) => {
                self.zephyr.log_fine(detail!("PU acked reset"));
            }

            PuFrame::Tsen {
                checksum_valid,
                data,
            } => self.accept_pu_record(PuRecordKind::Tsen, checksum_valid, &data),
            PuFrame::ProfileRecord {
                checksum_valid,
                data,
            } => self.accept_pu_record(PuRecordKind::ProfileRecord, checksum_valid, &data),

            PuFrame::Error(text) => {
                self.zephyr.log_crit(text);
                self.force_mode_error();
            }
        }
    }

    /// Stage a binary record for downlink and ack/nak the receipt.
    fn accept_pu_record(&mut self, kind: PuRecordKind, checksum_valid: bool, data: &[u8]) {
        let fits = data.len() <= self.pu_state.record_buf.capacity();
        if checksum_valid && fits {
            self.pu_state.record_buf.clear();
            let _ = self.pu_state.record_buf.extend_from_slice(data);
            match kind {
                PuRecordKind::Tsen => self.pu_state.tsen_received = true,
                PuRecordKind::ProfileRecord => self.pu_state.record_received = true,
            }
            self.pu.send(PuCommand::RecordAck {
                record: kind,
                accept: true,
            });
        } else {
            error!("{kind:?} checksum invalid or no room for downlink");
            self.pu.send(PuCommand::RecordAck {
                record: kind,
                accept: false,
            });
        }
    }
}
