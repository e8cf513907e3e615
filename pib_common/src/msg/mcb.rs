//! Motor Control Board message set.

use crate::consts::EEPROM_SNAPSHOT_MAX;
use crate::text::DetailString;

/// Command to the MCB.
#[derive(Debug, Clone, PartialEq)]
pub enum McbCommand {
    // ── Motion ──
    ReelIn { revs: f32, speed_rpm: f32 },
    ReelOut { revs: f32, speed_rpm: f32 },
    Dock { revs: f32, speed_rpm: f32 },
    InNoLooseWire { revs: f32, speed_rpm: f32 },
    FullRetract,
    CancelMotion,

    // ── Power / bookkeeping ──
    GoLowPower,
    ZeroReel,
    GetEeprom,

    // ── Tuning pass-through ──
    DeployAcceleration(f32),
    RetractAcceleration(f32),
    DockAcceleration(f32),
    TempLimits([f32; 6]),
    TorqueLimits([f32; 2]),
    CurrentLimits([f32; 2]),
    IgnoreLimits,
    UseLimits,
}

/// Acknowledgement identity echoed by the MCB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum McbAck {
    GoLowPower,
    ReelIn,
    ReelOut,
    Dock,
    InNoLooseWire,
    FullRetract,
    DeployAcceleration,
    RetractAcceleration,
    DockAcceleration,
    ZeroReel,
    TempLimits,
    TorqueLimits,
    CurrentLimits,
    IgnoreLimits,
    UseLimits,
}

/// Classified inbound frame from the MCB.
#[derive(Debug, Clone, PartialEq)]
pub enum McbFrame {
    /// Commanded motion ran to completion.
    MotionFinished,
    /// Motion aborted on a fault; eight status words follow when the frame
    /// parsed cleanly.
    MotionFault {
        words: [u16; 8],
        /// False when the fault parameters could not be read off the wire.
        params_ok: bool,
    },
    /// Command acknowledgement.
    Ack(McbAck),
    /// One motion telemetry packet (fixed length when well-formed).
    MotionTm(heapless::Vec<u8, 64>),
    /// MCB EEPROM contents, forwarded to the ground on request.
    Eeprom(heapless::Vec<u8, EEPROM_SNAPSHOT_MAX>),
    /// Free-form error report.
    Error(DetailString),
}
