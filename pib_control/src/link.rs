//! Typed peer link endpoints.
//!
//! Each peer gets a pair of fixed-capacity queues: the host fills the inbox
//! with classified frames as it drains the wire, and drains the outbox into
//! the wire's framing layer. The control brain only ever sees typed
//! messages. Overflowing an outbox is link loss, not a fault: the command
//! is dropped with an error log and the normal resend machinery covers it.

use heapless::Deque;
use pib_common::consts::LORA_PACKET_MAX;
use pib_common::msg::mcb::{McbCommand, McbFrame};
use pib_common::msg::pu::{PuCommand, PuFrame};
use pib_common::msg::zephyr::{AckState, LogLevel, StateFlag, TmPayload, ZephyrMsg};
use pib_common::motion::MotionKind;
use pib_common::status::PuStatus;
use pib_common::text::DetailString;
use tracing::error;

// ─── MCB ────────────────────────────────────────────────────────────

/// Serial endpoint to the Motor Control Board.
#[derive(Debug, Default)]
pub struct McbLink {
    pub inbox: Deque<McbFrame, 16>,
    pub outbox: Deque<McbCommand, 16>,
}

impl McbLink {
    pub fn send(&mut self, cmd: McbCommand) {
        if self.outbox.push_back(cmd).is_err() {
            error!("MCB outbox full, command dropped");
        }
    }
}

/// MCB-side state tracked from acks and motion reports.
#[derive(Debug, Default)]
pub struct McbState {
    /// The currently commanded motion kind, if any.
    pub motion: Option<MotionKind>,
    /// True between the motion ack and finish/fault/timeout.
    pub motion_ongoing: bool,
    /// True while the active motion is expected to end on the dock.
    pub dock_ongoing: bool,
    /// Full-retract acknowledged and running.
    pub reeling_in: bool,
    /// MCB acknowledged low power.
    pub low_power: bool,
    /// Motion budget for the active command [s].
    pub max_motion_seconds: u32,
    /// Status words from the last motion fault.
    pub fault_words: [u16; 8],
}

// ─── PU ─────────────────────────────────────────────────────────────

/// Serial endpoint to the Profiling Unit (wired, docked link).
#[derive(Debug, Default)]
pub struct PuLink {
    pub inbox: Deque<PuFrame, 8>,
    pub outbox: Deque<PuCommand, 8>,
}

impl PuLink {
    pub fn send(&mut self, cmd: PuCommand) {
        if self.outbox.push_back(cmd).is_err() {
            error!("PU outbox full, command dropped");
        }
    }
}

/// PU-side state tracked from frames and acks.
#[derive(Debug, Default)]
pub struct PuState {
    pub status: PuStatus,
    /// A profile record was accepted into the record buffer.
    pub record_received: bool,
    /// A TSEN record was accepted into the record buffer.
    pub tsen_received: bool,
    /// The PU reported an empty record store.
    pub no_more_records: bool,
    pub warmup_acked: bool,
    pub profile_acked: bool,
    pub preprofile_acked: bool,
    /// Outcome of the last PU check sub-machine run.
    pub check_success: bool,
    /// Last accepted binary record, pending downlink.
    pub record_buf: TmPayload,
}

// ─── LoRa ───────────────────────────────────────────────────────────

/// One raw LoRa packet as received by the modem driver.
#[derive(Debug, Clone, PartialEq)]
pub struct LoraPacket(pub heapless::Vec<u8, LORA_PACKET_MAX>);

/// Receive-only LoRa endpoint from the PU.
#[derive(Debug, Default)]
pub struct LoraLink {
    pub inbox: Deque<LoraPacket, 8>,
}

// ─── Zephyr ─────────────────────────────────────────────────────────

/// Endpoint to the OBC, with the tri-state handshake flags.
#[derive(Debug, Default)]
pub struct ZephyrLink {
    pub outbox: Deque<ZephyrMsg, 16>,
    pub ra_ack: AckState,
    pub tm_ack: AckState,
    pub s_ack: AckState,
    /// Last telemetry packet, kept for single-shot retransmission.
    last_tm: Option<ZephyrMsg>,
}

impl ZephyrLink {
    fn push(&mut self, msg: ZephyrMsg) {
        if self.outbox.push_back(msg).is_err() {
            error!("Zephyr outbox full, message dropped");
        }
    }

    /// Request an instrument mode from the OBC.
    pub fn imr(&mut self) {
        self.push(ZephyrMsg::InstrumentModeRequest);
    }

    /// Start the request-authority handshake.
    pub fn ra(&mut self) {
        self.ra_ack = AckState::NoAck;
        self.push(ZephyrMsg::RequestAuthority);
    }

    /// Announce the safety posture.
    pub fn safety(&mut self) {
        self.s_ack = AckState::NoAck;
        self.push(ZephyrMsg::Safety);
    }

    /// Send a telemetry packet and arm the TM handshake.
    pub fn tm(&mut self, flag: StateFlag, detail: DetailString, payload: TmPayload) {
        let msg = ZephyrMsg::Tm {
            flag,
            detail,
            payload,
        };
        self.tm_ack = AckState::NoAck;
        self.last_tm = Some(msg.clone());
        self.push(msg);
    }

    /// Retransmit the last telemetry packet unchanged.
    pub fn resend_tm(&mut self) {
        if let Some(msg) = self.last_tm.clone() {
            self.tm_ack = AckState::NoAck;
            self.push(msg);
        }
    }

    pub fn log_fine(&mut self, text: DetailString) {
        self.push(ZephyrMsg::Log {
            level: LogLevel::Fine,
            text,
        });
    }

    pub fn log_warn(&mut self, text: DetailString) {
        self.push(ZephyrMsg::Log {
            level: LogLevel::Warn,
            text,
        });
    }

    pub fn log_crit(&mut self, text: DetailString) {
        self.push(ZephyrMsg::Log {
            level: LogLevel::Crit,
            text,
        });
    }
}

// ─── Output pins ────────────────────────────────────────────────────

/// Discrete outputs the host mirrors to hardware.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OutputPins {
    /// PU power switch.
    pub pu_power: bool,
    /// SAFE line to the OBC; held high while looping in safety mode.
    pub safe: bool,
}
