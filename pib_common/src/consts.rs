//! Fixed protocol constants: resend timeouts, staleness, buffer sizing.
//!
//! Buffer capacities carry compile-time checks tying them to the payloads
//! they must absorb in one drain, in the spirit of the serial buffer guards
//! on the original hardware.

use static_assertions::const_assert;

/// Loop ticks before a posted-but-unconsumed action flag is force-cleared.
pub const FLAG_STALE_TICKS: u8 = 3;

/// Seconds before an unacknowledged MCB command is retried.
pub const MCB_RESEND_TIMEOUT_S: u32 = 10;
/// Seconds before an unacknowledged PU command is retried.
pub const PU_RESEND_TIMEOUT_S: u32 = 10;
/// Seconds before an unacknowledged Zephyr handshake is retried.
pub const ZEPHYR_RESEND_TIMEOUT_S: u32 = 60;
/// Idle seconds after which a partially filled LoRa TM buffer is flushed.
pub const LORA_TM_TIMEOUT_S: u32 = 600;

/// Fixed length of one MCB motion telemetry packet.
pub const MOTION_TM_SIZE: usize = 25;
/// Byte offset of the big-endian reel position float inside a motion TM.
pub const MOTION_TM_REEL_POS_OFFSET: usize = 21;

/// Sync byte prefacing each buffered MCB motion TM packet.
pub const MCB_TM_SYNC: u8 = 0xA5;

/// Capacity of the buffered MCB motion telemetry accumulator.
pub const MCB_TM_BUFFER_SIZE: usize = 8192;
/// Capacity of the LoRa profile-TM aggregation buffer.
pub const LORA_TM_BUFFER_SIZE: usize = 6005;
/// Largest binary record the PU delivers over the wired link.
pub const PU_RECORD_MAX: usize = 4096;
/// Largest EEPROM snapshot the MCB forwards for downlink.
pub const EEPROM_SNAPSHOT_MAX: usize = 256;
/// Largest raw LoRa packet.
pub const LORA_PACKET_MAX: usize = 256;

/// Grace period between reel-in completion and commanding the dock.
pub const DOCK_WAIT_GRACE_S: u32 = 60;
/// Dock length commanded by the safety retract sequence, in revolutions.
/// If the reel is further out than this after a full retract, something
/// bigger is wrong.
pub const SAFETY_DOCK_LENGTH_REVS: f32 = 200.0;
/// Offset of the first autonomously scheduled profile, in seconds.
pub const PROFILE_SCHEDULE_OFFSET_S: u32 = 5;
/// Solar zenith angle below which the nightly profile allotment is re-armed.
pub const SZA_DAYTIME_RESET_DEG: f32 = 45.0;

// A full PU record plus framing must fit the MCB TM accumulator, and the
// LoRa aggregation buffer must hold the largest fragment run we forward.
const_assert!(PU_RECORD_MAX <= MCB_TM_BUFFER_SIZE);
const_assert!(LORA_PACKET_MAX <= LORA_TM_BUFFER_SIZE);
const_assert!(MOTION_TM_REEL_POS_OFFSET + 4 <= MOTION_TM_SIZE);
