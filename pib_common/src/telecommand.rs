//! Ground telecommand set.
//!
//! Telecommands arrive from the OBC already parsed into this typed form;
//! the handler in the control crate applies them and answers Ack/Nak.

/// One ground telecommand with its parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Telecommand {
    // ── MCB motion ──
    /// Deploy the given number of revolutions (manual mode only).
    Deploy { revs: f32 },
    SetDeployVelocity { rpm: f32 },
    SetDeployAcceleration { acc: f32 },
    /// Retract the given number of revolutions (manual mode only).
    Retract { revs: f32 },
    SetRetractVelocity { rpm: f32 },
    SetRetractAcceleration { acc: f32 },
    /// Dock the given number of revolutions (manual mode only).
    Dock { revs: f32 },
    SetDockVelocity { rpm: f32 },
    SetDockAcceleration { acc: f32 },
    /// Declared in the command set but intentionally refused; request
    /// Safety mode instead.
    FullRetract,
    CancelMotion,
    ZeroReel,
    TempLimits { limits: [f32; 6] },
    TorqueLimits { limits: [f32; 2] },
    CurrentLimits { limits: [f32; 2] },
    IgnoreLimits,
    UseLimits,
    GetMcbEeprom,

    // ── PIB configuration / operations ──
    SetAutonomous,
    SetManual,
    SetSzaMinimum { deg: f32 },
    SetProfileSize { revs: f32 },
    SetDockAmount { revs: f32 },
    SetDwellTime { seconds: u16 },
    SetProfilePeriod { seconds: u16 },
    SetNumProfiles { count: u8 },
    SetTimeTrigger { epoch: u32 },
    UseSzaTrigger,
    UseTimeTrigger,
    SetDockOvershoot { revs: f32 },
    RetryDock { deploy_revs: f32, retract_revs: f32 },
    GetPuStatus,
    PuPowerOn,
    PuPowerOff,
    ManualProfile {
        profile_size: f32,
        dock_amount: f32,
        dock_overshoot: f32,
        dwell_time: u16,
    },
    OffloadPuProfile,
    SetPreprofileTime { seconds: u16 },
    SetPuWarmupTime { seconds: u16 },
    AutoRedockParams {
        deploy_revs: f32,
        retract_revs: f32,
        attempts: u8,
    },
    SetMotionTimeout { seconds: u16 },
    GetPibConfig,
    DockedProfile { seconds: u16 },
    StartRealTimeMcb,
    ExitRealTimeMcb,
    LoraTxTm { enable: bool },
    RaOverride,
    RaResume,
    SetAutoOffload,
    SetManualOffload,

    // ── PU configuration ──
    LoraTxStatus { seconds: u16 },
    PuWarmupConfigs {
        flash_temp: f32,
        heater1_temp: f32,
        heater2_temp: f32,
        flash_power: u8,
        tsen_power: u8,
    },
    PuProfileConfigs {
        profile_rate: u32,
        dwell_rate: u32,
        tsen: u8,
        ropc: u8,
        flash: u8,
        lora_tm: bool,
    },
    PuReset,
    PuDockedConfigs {
        rate: u32,
        tsen: u8,
        ropc: u8,
        flash: u8,
    },

    // ── General ──
    ExitError,
}
