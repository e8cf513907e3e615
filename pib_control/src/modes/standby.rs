//! Standby: park and periodically ask the OBC for a mode.

use pib_common::action::ActionId;
use pib_common::consts::ZEPHYR_RESEND_TIMEOUT_S;
use tracing::{debug, info};

use crate::supervisor::Pib;

/// Standby substates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandbySt {
    Entry,
    Loop,
    Error,
    Shutdown,
    Exit,
}

impl Pib {
    pub(crate) fn standby_tick(&mut self, st: StandbySt) -> StandbySt {
        match st {
            StandbySt::Entry => {
                info!("Entering standby");
                // First mode request goes out on the next loop.
                self.arm(ActionId::SendImr, 0);
                StandbySt::Loop
            }
            StandbySt::Loop => {
                debug!("Standby loop");
                if self.flags.consume(ActionId::SendImr) {
                    info!("Sending mode request to OBC");
                    self.zephyr.imr();
                    self.arm(ActionId::SendImr, ZEPHYR_RESEND_TIMEOUT_S);
                }
                StandbySt::Loop
            }
            StandbySt::Error => {
                debug!("Standby error");
                StandbySt::Error
            }
            StandbySt::Shutdown => {
                info!("Shutdown warning received in standby");
                StandbySt::Shutdown
            }
            StandbySt::Exit => {
                info!("Exiting standby");
                StandbySt::Exit
            }
        }
    }
}
