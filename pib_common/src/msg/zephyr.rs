//! Zephyr (OBC) message set.

use crate::consts::MCB_TM_BUFFER_SIZE;
use crate::text::DetailString;

/// Telemetry payload bytes.
pub type TmPayload = heapless::Vec<u8, MCB_TM_BUFFER_SIZE>;

/// Severity flag attached to a telemetry packet's first state field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateFlag {
    Fine,
    Warn,
    Crit,
}

/// Severity of a Zephyr-bound log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Fine,
    Warn,
    Crit,
}

/// Outbound message to the OBC.
#[derive(Debug, Clone, PartialEq)]
pub enum ZephyrMsg {
    /// Instrument mode request.
    InstrumentModeRequest,
    /// Request authority for motion.
    RequestAuthority,
    /// Safety posture reached.
    Safety,
    /// Telemetry packet: first state flag + detail string + binary payload.
    Tm {
        flag: StateFlag,
        detail: DetailString,
        payload: TmPayload,
    },
    /// Log line downlinked out-of-band of telemetry.
    Log { level: LogLevel, text: DetailString },
}

/// Tri-state acknowledgement for Zephyr-bound handshakes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AckState {
    /// No reply yet.
    #[default]
    NoAck,
    Ack,
    Nak,
}

/// Which Zephyr handshake an inbound ack refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckKind {
    /// Request-authority reply.
    Ra,
    /// Telemetry receipt.
    Tm,
    /// Safety message receipt.
    Safety,
}
