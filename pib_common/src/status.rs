//! Peer status snapshots.

/// Housekeeping status of the Profiling Unit, updated only by the PU router
/// on a checksum-valid status frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PuStatus {
    /// Wall-clock time the last valid status arrived; freshness watermark.
    pub last_status: u32,
    /// PU-reported time.
    pub time: u32,
    /// Battery voltage [V].
    pub v_battery: f32,
    /// Charge current [A].
    pub i_charge: f32,
    /// Thermistor 1 [degC].
    pub therm1: f32,
    /// Thermistor 2 [degC].
    pub therm2: f32,
    /// Heater status byte.
    pub heater_stat: u8,
}

impl PuStatus {
    /// Zero the reported fields after an invalid status frame. The
    /// freshness watermark is left alone.
    pub fn zero_fields(&mut self) {
        self.time = 0;
        self.v_battery = 0.0;
        self.i_charge = 0.0;
        self.therm1 = 0.0;
        self.therm2 = 0.0;
        self.heater_stat = 0;
    }
}

/// GPS/time state relayed by the OBC.
#[derive(Debug, Clone, Copy, Default)]
pub struct GpsStatus {
    /// Whether a valid GPS time has been received since boot.
    pub time_valid: bool,
    /// Solar zenith angle [deg]; >90 is night.
    pub solar_zenith_angle: f32,
}
