//! Persisted configuration snapshot.
//!
//! The full reloadable parameter set of the instrument. Values are read
//! through plain fields; persistence is the host's job (the control brain
//! marks a dirty flag when a telecommand changes something). The TOML form
//! doubles as the ground-test config file format.
//!
//! Defaults are the flight defaults burned in as fallback when the stored
//! copy fails to load.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// `time_trigger` sentinel: no time trigger armed.
pub const TIME_TRIGGER_DISABLED: u32 = u32::MAX;

/// Complete persisted configuration of the instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PibConfig {
    // ── Profile triggers ──
    /// Minimum solar zenith angle for an SZA-triggered profile [deg].
    pub sza_minimum: f32,
    /// Epoch seconds of the next time-triggered profile;
    /// [`TIME_TRIGGER_DISABLED`] when unset.
    pub time_trigger: u32,
    /// True: SZA triggers profiles. False: `time_trigger` does.
    pub sza_trigger: bool,

    // ── Profile sizing [revolutions] ──
    pub profile_size: f32,
    pub dock_amount: f32,
    pub dock_overshoot: f32,
    pub redock_out: f32,
    pub redock_in: f32,

    // ── Profile speeds [rpm] ──
    pub deploy_velocity: f32,
    pub retract_velocity: f32,
    pub dock_velocity: f32,

    // ── PU configuration ──
    pub flash_temp: f32,
    pub heater1_temp: f32,
    pub heater2_temp: f32,
    pub profile_rate: u32,
    pub dwell_rate: u32,
    pub flash_power: u8,
    pub tsen_power: u8,
    pub profile_tsen: u8,
    pub profile_ropc: u8,
    pub profile_flash: u8,
    pub docked_rate: u32,
    pub docked_tsen: u8,
    pub docked_ropc: u8,
    pub docked_flash: u8,

    // ── Profile timing [seconds] ──
    pub dwell_time: u16,
    pub preprofile_time: u16,
    pub puwarmup_time: u16,
    pub motion_timeout: u16,
    pub profile_period: u16,

    // ── Autonomous operation ──
    /// Profiles per night.
    pub num_profiles: u8,
    /// Redock attempts before erroring out.
    pub num_redock: u8,

    // ── PU tracking ──
    pub pu_docked: bool,

    // ── MCB TM mode ──
    pub real_time_mcb: bool,

    // ── LoRa ──
    pub lora_tx_tm: bool,
    pub lora_tx_status: u16,

    /// Monotonically increasing per profile start.
    pub profile_id: u16,
    pub ra_override: bool,
    pub pu_auto_offload: bool,
}

impl Default for PibConfig {
    fn default() -> Self {
        Self {
            sza_minimum: 105.0,
            time_trigger: TIME_TRIGGER_DISABLED,
            sza_trigger: false,
            profile_size: 7500.0,
            dock_amount: 200.0,
            dock_overshoot: 100.0,
            redock_out: 5.0,
            redock_in: 10.0,
            deploy_velocity: 250.0,
            retract_velocity: 250.0,
            dock_velocity: 80.0,
            flash_temp: -20.0,
            heater1_temp: 0.0,
            heater2_temp: -15.0,
            profile_rate: 1,
            dwell_rate: 10,
            flash_power: 1,
            tsen_power: 1,
            profile_tsen: 1,
            profile_ropc: 1,
            profile_flash: 1,
            docked_rate: 10,
            docked_tsen: 1,
            docked_ropc: 1,
            docked_flash: 1,
            dwell_time: 900,
            preprofile_time: 180,
            puwarmup_time: 900,
            motion_timeout: 30,
            profile_period: 7200,
            num_profiles: 3,
            num_redock: 3,
            pu_docked: false,
            real_time_mcb: false,
            lora_tx_tm: false,
            lora_tx_status: 1800,
            profile_id: 1,
            ra_override: false,
            pu_auto_offload: false,
        }
    }
}

/// Configuration loading/validation error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("config validation: {0}")]
    Validation(&'static str),
}

impl PibConfig {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let cfg: Self = toml::from_str(&text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Persist the snapshot.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = toml::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Sanity bounds: motion math divides by the velocities, and the
    /// autonomous scheduler multiplies by the period.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.deploy_velocity <= 0.0
            || self.retract_velocity <= 0.0
            || self.dock_velocity <= 0.0
        {
            return Err(ConfigError::Validation("velocities must be positive"));
        }
        if self.profile_size <= 0.0 {
            return Err(ConfigError::Validation("profile_size must be positive"));
        }
        if self.profile_size < self.dock_amount {
            return Err(ConfigError::Validation(
                "profile_size must cover dock_amount",
            ));
        }
        if self.profile_period == 0 {
            return Err(ConfigError::Validation("profile_period must be nonzero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        PibConfig::default().validate().unwrap();
    }

    #[test]
    fn default_time_trigger_disabled() {
        assert_eq!(PibConfig::default().time_trigger, TIME_TRIGGER_DISABLED);
    }

    #[test]
    fn rejects_zero_velocity() {
        let cfg = PibConfig {
            dock_velocity: 0.0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn rejects_dock_amount_exceeding_profile() {
        let cfg = PibConfig {
            profile_size: 100.0,
            dock_amount: 200.0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pib.toml");
        let mut cfg = PibConfig::default();
        cfg.sza_trigger = true;
        cfg.num_profiles = 5;
        cfg.save(&path).unwrap();
        let loaded = PibConfig::load(&path).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: PibConfig = toml::from_str("num_profiles = 7\n").unwrap();
        assert_eq!(cfg.num_profiles, 7);
        assert_eq!(cfg.dwell_time, 900);
    }
}
