//! MCB message router and handlers.

use pib_common::action::ActionId;
use pib_common::consts::{MOTION_TM_REEL_POS_OFFSET, MOTION_TM_SIZE};
use pib_common::detail;
use pib_common::motion::MotionKind;
use pib_common::msg::mcb::{McbAck, McbFrame};
use pib_common::msg::zephyr::{StateFlag, TmPayload};
use tracing::{error, info};

use crate::supervisor::Pib;

impl Pib {
    /// Drain and handle every queued MCB frame.
    pub(crate) fn run_mcb_router(&mut self) {
        while let Some(frame) = self.mcb.inbox.pop_front() {
            self.handle_mcb_frame(frame);
        }
    }

    fn handle_mcb_frame(&mut self, frame: McbFrame) {
        match frame {
            McbFrame::MotionFinished => {
                // Clear the motion budget flag if it already fired.
                self.flags.consume(ActionId::MotionTimeout);
                info!("MCB motion finished");
                self.mcb_state.motion_ongoing = false;
            }
            McbFrame::MotionFault { words, params_ok } => {
                self.handle_motion_fault(words, params_ok)
            }
            McbFrame::Ack(ack) => self.handle_mcb_ack(ack),
            McbFrame::MotionTm(data) => self.add_mcb_tm(&data),
            McbFrame::Eeprom(data) => {
                let mut payload = TmPayload::new();
                let _ = payload.extend_from_slice(&data);
                self.zephyr
                    .tm(StateFlag::Fine, detail!("MCB EEPROM contents"), payload);
                info!("Sent MCB EEPROM as TM");
            }
            McbFrame::Error(text) => {
                self.zephyr.log_crit(text);
                self.force_mode_error();
            }
        }
    }

    /// A fault while a dock is expected is the dock: the MCB reports dock
    /// contact on its loose-wire fault line. Any other fault is critical.
    fn handle_motion_fault(&mut self, words: [u16; 8], params_ok: bool) {
        self.flags.consume(ActionId::MotionTimeout);

        // The MCB repeats fault reports; only the first one counts.
        if !self.mcb_state.motion_ongoing {
            return;
        }
        self.mcb_state.fault_words = words;

        if params_ok {
            if self.mcb_state.dock_ongoing {
                let d = detail!(
                    "MCB: dock condition assumed: {:x},{:x},{:x},{:x},{:x},{:x},{:x},{:x}",
                    words[0],
                    words[1],
                    words[2],
                    words[3],
                    words[4],
                    words[5],
                    words[6],
                    words[7]
                );
                self.send_mcb_tm(StateFlag::Fine, d.as_str());
                self.mcb_state.dock_ongoing = false;
                self.mcb_state.motion_ongoing = false;
            } else {
                self.mcb_state.motion_ongoing = false;
                let d = detail!(
                    "MCB fault: {:x},{:x},{:x},{:x},{:x},{:x},{:x},{:x}",
                    words[0],
                    words[1],
                    words[2],
                    words[3],
                    words[4],
                    words[5],
                    words[6],
                    words[7]
                );
                self.send_mcb_tm(StateFlag::Crit, d.as_str());
                self.force_mode_error();
            }
        } else if self.mcb_state.dock_ongoing {
            self.send_mcb_tm(
                StateFlag::Fine,
                "MCB dock detected: error receiving expected fault info",
            );
            self.mcb_state.dock_ongoing = false;
            self.mcb_state.motion_ongoing = false;
        } else {
            self.mcb_state.motion_ongoing = false;
            self.send_mcb_tm(StateFlag::Crit, "MCB fault: error receiving parameters");
            self.force_mode_error();
        }
    }

    fn handle_mcb_ack(&mut self, ack: McbAck) {
        match ack {
            McbAck::GoLowPower => {
                info!("MCB in low power");
                self.mcb_state.low_power = true;
            }
            // A motion ack is the "commanded → ongoing" edge, but only for
            // the motion we actually commanded.
            McbAck::ReelIn => {
                if self.mcb_state.motion == Some(MotionKind::ReelIn) {
                    self.note_profile_start();
                }
            }
            McbAck::ReelOut => {
                if self.mcb_state.motion == Some(MotionKind::ReelOut) {
                    self.note_profile_start();
                }
            }
            McbAck::Dock => {
                if self.mcb_state.motion == Some(MotionKind::Dock) {
                    self.note_profile_start();
                }
            }
            McbAck::InNoLooseWire => {
                if self.mcb_state.motion == Some(MotionKind::InNoLooseWire) {
                    self.note_profile_start();
                }
            }
            McbAck::FullRetract => {
                self.mcb_state.reeling_in = true;
            }
            McbAck::RetractAcceleration => {
                self.zephyr.log_fine(detail!("MCB acked retract acc"));
            }
            McbAck::DeployAcceleration => {
                self.zephyr.log_fine(detail!("MCB acked deploy acc"));
            }
            McbAck::DockAcceleration => {
                self.zephyr.log_fine(detail!("MCB acked dock acc"));
            }
            McbAck::ZeroReel => {
                self.zephyr.log_fine(detail!("MCB acked zero reel"));
            }
            McbAck::TempLimits => {
                self.zephyr.log_fine(detail!("MCB acked temp limits"));
            }
            McbAck::TorqueLimits => {
                self.zephyr.log_fine(detail!("MCB acked torque limits"));
            }
            McbAck::CurrentLimits => {
                self.zephyr.log_fine(detail!("MCB acked curr limits"));
            }
            McbAck::IgnoreLimits => {
                self.zephyr.log_fine(detail!("MCB acked ignore limits"));
            }
            McbAck::UseLimits => {
                self.zephyr.log_fine(detail!("MCB acked use limits"));
            }
        }
    }

    /// Accumulate (or immediately forward) one motion TM packet.
    fn add_mcb_tm(&mut self, data: &[u8]) {
        if data.len() != MOTION_TM_SIZE {
            error!("Invalid motion TM size");
            return;
        }

        let mut pos = [0u8; 4];
        pos.copy_from_slice(&data[MOTION_TM_REEL_POS_OFFSET..MOTION_TM_REEL_POS_OFFSET + 4]);
        info!("Reel position: {}", f32::from_be_bytes(pos) as i32);

        let elapsed = self.clock.elapsed_tenths_since(self.profile_start_ms);
        let real_time = self.config.real_time_mcb;
        if !self.mcb_tm.push_packet(data, elapsed, real_time) {
            error!("MCB TM buffer full, motion TM dropped");
            return;
        }

        if real_time {
            let n = self.mcb_tm.next_packet_num();
            let payload = self.mcb_tm.take();
            self.zephyr
                .tm(StateFlag::Fine, detail!("MCB TM Packet {n}"), payload);
        }
    }
}
