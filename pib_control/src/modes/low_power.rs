//! Low power: put the MCB to sleep, then idle.

use pib_common::action::ActionId;
use pib_common::consts::MCB_RESEND_TIMEOUT_S;
use pib_common::msg::mcb::McbCommand;
use tracing::{debug, info};

use crate::supervisor::Pib;

/// Low-power substates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LowPowerSt {
    Entry,
    AlertMcb,
    CheckMcb,
    Loop,
    Error,
    Shutdown,
    Exit,
}

impl Pib {
    pub(crate) fn low_power_tick(&mut self, st: LowPowerSt) -> LowPowerSt {
        match st {
            LowPowerSt::Entry => {
                info!("Entering low power");
                LowPowerSt::AlertMcb
            }
            LowPowerSt::AlertMcb => {
                info!("Commanding MCB low power");
                self.mcb.send(McbCommand::GoLowPower);
                self.arm(ActionId::ResendMcbLowPower, MCB_RESEND_TIMEOUT_S);
                LowPowerSt::CheckMcb
            }
            LowPowerSt::CheckMcb => {
                debug!("Waiting on MCB low-power ack");
                if self.mcb_state.low_power {
                    self.mcb_state.low_power = false;
                    LowPowerSt::Loop
                } else if self.flags.consume(ActionId::ResendMcbLowPower) {
                    LowPowerSt::AlertMcb
                } else {
                    LowPowerSt::CheckMcb
                }
            }
            LowPowerSt::Loop => {
                debug!("Low power loop");
                LowPowerSt::Loop
            }
            LowPowerSt::Error => {
                debug!("Low power error");
                LowPowerSt::Error
            }
            LowPowerSt::Shutdown => {
                info!("Shutdown warning received in low power");
                LowPowerSt::Shutdown
            }
            LowPowerSt::Exit => {
                info!("Exiting low power");
                LowPowerSt::Exit
            }
        }
    }
}
