//! Profiling Unit message set.

use crate::consts::PU_RECORD_MAX;
use crate::text::DetailString;

/// Command to the PU over the wired (docked) link.
#[derive(Debug, Clone, PartialEq)]
pub enum PuCommand {
    SendStatus,
    SendTsenRecord,
    SendProfileRecord,
    Reset,
    /// Pre-profile conditioning targets.
    Warmup {
        flash_temp: f32,
        heater1_temp: f32,
        heater2_temp: f32,
        flash_power: u8,
        tsen_power: u8,
    },
    /// Profile execution plan. Times in seconds, rates in samples/s.
    Profile {
        t_down: i32,
        dwell: u16,
        t_up: i32,
        profile_rate: u32,
        dwell_rate: u32,
        tsen: u8,
        ropc: u8,
        flash: u8,
        lora_tm: bool,
    },
    /// How often the PU should radio a status string, in seconds.
    LoraStatusRate(u16),
    /// Accept/reject receipt for a binary record.
    RecordAck { record: PuRecordKind, accept: bool },
}

/// Which binary record a [`PuCommand::RecordAck`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PuRecordKind {
    Tsen,
    ProfileRecord,
}

/// Acknowledgement identity echoed by the PU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PuAck {
    GoWarmup,
    GoProfile,
    GoPreprofile,
    Reset,
}

/// Classified inbound frame from the PU.
#[derive(Debug, Clone, PartialEq)]
pub enum PuFrame {
    /// Housekeeping status reply.
    Status {
        checksum_valid: bool,
        time: u32,
        v_battery: f32,
        i_charge: f32,
        therm1: f32,
        therm2: f32,
        heater_stat: u8,
    },
    /// The PU's record store is exhausted.
    NoMoreRecords,
    /// Command acknowledgement.
    Ack(PuAck),
    /// One TSEN record.
    Tsen {
        checksum_valid: bool,
        data: heapless::Vec<u8, PU_RECORD_MAX>,
    },
    /// One profile record.
    ProfileRecord {
        checksum_valid: bool,
        data: heapless::Vec<u8, PU_RECORD_MAX>,
    },
    /// Free-form error report.
    Error(DetailString),
}
