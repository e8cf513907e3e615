//! Mode substate machines.
//!
//! One module per mode, each with its own substate tag type. The
//! [`ModeState`] wrapper is the single source of truth for "which mode,
//! which substate"; the supervisor owns exactly one.

pub mod end_of_flight;
pub mod flight;
pub mod low_power;
pub mod safety;
pub mod standby;

use pib_common::mode::Mode;

use self::end_of_flight::EndOfFlightSt;
use self::flight::FlightSt;
use self::low_power::LowPowerSt;
use self::safety::SafetySt;
use self::standby::StandbySt;

/// Active mode plus its substate tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeState {
    Standby(StandbySt),
    Flight(FlightSt),
    LowPower(LowPowerSt),
    Safety(SafetySt),
    EndOfFlight(EndOfFlightSt),
}

impl ModeState {
    /// Which mode this state belongs to.
    pub fn mode(&self) -> Mode {
        match self {
            ModeState::Standby(_) => Mode::Standby,
            ModeState::Flight(_) => Mode::Flight,
            ModeState::LowPower(_) => Mode::LowPower,
            ModeState::Safety(_) => Mode::Safety,
            ModeState::EndOfFlight(_) => Mode::EndOfFlight,
        }
    }

    /// Entry substate of a mode.
    pub fn entry(mode: Mode) -> Self {
        match mode {
            Mode::Standby => ModeState::Standby(StandbySt::Entry),
            Mode::Flight => ModeState::Flight(FlightSt::Entry),
            Mode::LowPower => ModeState::LowPower(LowPowerSt::Entry),
            Mode::Safety => ModeState::Safety(SafetySt::Entry),
            Mode::EndOfFlight => ModeState::EndOfFlight(EndOfFlightSt::Entry),
        }
    }

    /// Same mode, error landing substate.
    pub fn error_landing(self) -> Self {
        match self {
            ModeState::Standby(_) => ModeState::Standby(StandbySt::Error),
            ModeState::Flight(_) => ModeState::Flight(FlightSt::ErrorLanding),
            ModeState::LowPower(_) => ModeState::LowPower(LowPowerSt::Error),
            ModeState::Safety(_) => ModeState::Safety(SafetySt::Error),
            ModeState::EndOfFlight(_) => ModeState::EndOfFlight(EndOfFlightSt::Error),
        }
    }

    /// Same mode, shutdown substate.
    pub fn shutdown(self) -> Self {
        match self {
            ModeState::Standby(_) => ModeState::Standby(StandbySt::Shutdown),
            ModeState::Flight(_) => ModeState::Flight(FlightSt::ShutdownLanding),
            ModeState::LowPower(_) => ModeState::LowPower(LowPowerSt::Shutdown),
            ModeState::Safety(_) => ModeState::Safety(SafetySt::Shutdown),
            ModeState::EndOfFlight(_) => ModeState::EndOfFlight(EndOfFlightSt::Shutdown),
        }
    }

    /// Same mode, exit substate.
    pub fn exit(self) -> Self {
        match self {
            ModeState::Standby(_) => ModeState::Standby(StandbySt::Exit),
            ModeState::Flight(_) => ModeState::Flight(FlightSt::Exit),
            ModeState::LowPower(_) => ModeState::LowPower(LowPowerSt::Exit),
            ModeState::Safety(_) => ModeState::Safety(SafetySt::Exit),
            ModeState::EndOfFlight(_) => ModeState::EndOfFlight(EndOfFlightSt::Exit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_round_trips_mode() {
        for mode in [
            Mode::Standby,
            Mode::Flight,
            Mode::LowPower,
            Mode::Safety,
            Mode::EndOfFlight,
        ] {
            assert_eq!(ModeState::entry(mode).mode(), mode);
            assert_eq!(ModeState::entry(mode).error_landing().mode(), mode);
            assert_eq!(ModeState::entry(mode).exit().mode(), mode);
        }
    }
}
