//! End of flight: cancel any motion, power down the MCB, idle forever.

use pib_common::msg::mcb::McbCommand;
use tracing::{debug, info};

use crate::supervisor::Pib;

/// End-of-flight substates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndOfFlightSt {
    Entry,
    Loop,
    Error,
    Shutdown,
    Exit,
}

impl Pib {
    pub(crate) fn end_of_flight_tick(&mut self, st: EndOfFlightSt) -> EndOfFlightSt {
        match st {
            EndOfFlightSt::Entry => {
                info!("Entering end of flight");
                self.mcb.send(McbCommand::CancelMotion);
                self.mcb.send(McbCommand::GoLowPower);
                EndOfFlightSt::Loop
            }
            EndOfFlightSt::Loop => {
                debug!("End of flight loop");
                EndOfFlightSt::Loop
            }
            EndOfFlightSt::Error => {
                debug!("End of flight error");
                EndOfFlightSt::Error
            }
            EndOfFlightSt::Shutdown => {
                info!("Shutdown warning received in end of flight");
                EndOfFlightSt::Shutdown
            }
            EndOfFlightSt::Exit => {
                info!("Exiting end of flight");
                EndOfFlightSt::Exit
            }
        }
    }
}
