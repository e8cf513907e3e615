//! Ground telecommand handler.
//!
//! Applies configuration updates, posts action flags for the flight
//! machines, and switches the autonomy setting. Returns the Ack/Nak the
//! OBC relays back to the ground. Warn-and-ignore cases still ack (the
//! command was understood); hard rejections nak.

use pib_common::action::ActionId;
use pib_common::detail;
use pib_common::msg::mcb::McbCommand;
use pib_common::msg::pu::PuCommand;
use pib_common::msg::zephyr::{StateFlag, TmPayload};
use pib_common::telecommand::Telecommand;
use tracing::{debug, error, info};

use crate::supervisor::Pib;

impl Pib {
    /// Handle one parsed telecommand. Returns true to ack, false to nak.
    pub fn handle_telecommand(&mut self, tc: Telecommand) -> bool {
        use Telecommand as Tc;
        debug!("Received telecommand");

        match tc {
            // ── MCB motion ──────────────────────────────────────────
            Tc::Deploy { revs } => {
                if self.warn_if_autonomous() {
                    return true;
                }
                self.params.deploy_length = revs;
                self.flags.set(ActionId::ReelOut);
                self.flags.set(ActionId::OverrideTsen);
                true
            }
            Tc::Retract { revs } => {
                if self.warn_if_autonomous() {
                    return true;
                }
                self.params.retract_length = revs;
                self.flags.set(ActionId::ReelIn);
                self.flags.set(ActionId::OverrideTsen);
                true
            }
            Tc::Dock { revs } => {
                if self.warn_if_autonomous() {
                    return true;
                }
                self.params.dock_length = revs;
                self.flags.set(ActionId::Dock);
                self.flags.set(ActionId::OverrideTsen);
                true
            }

            Tc::SetDeployVelocity { rpm } => {
                self.config.deploy_velocity = rpm;
                self.config_dirty = true;
                self.zephyr.log_fine(detail!("Set deploy_velocity: {rpm}"));
                true
            }
            Tc::SetRetractVelocity { rpm } => {
                self.config.retract_velocity = rpm;
                self.config_dirty = true;
                self.zephyr.log_fine(detail!("Set retract_velocity: {rpm}"));
                true
            }
            Tc::SetDockVelocity { rpm } => {
                self.config.dock_velocity = rpm;
                self.config_dirty = true;
                self.zephyr.log_fine(detail!("Set dock_velocity: {rpm}"));
                true
            }

            Tc::SetDeployAcceleration { acc } => {
                self.mcb.send(McbCommand::DeployAcceleration(acc));
                true
            }
            Tc::SetRetractAcceleration { acc } => {
                self.mcb.send(McbCommand::RetractAcceleration(acc));
                true
            }
            Tc::SetDockAcceleration { acc } => {
                self.mcb.send(McbCommand::DockAcceleration(acc));
                true
            }

            Tc::FullRetract => {
                // Bypassing the RA handshake and the motion guard from
                // flight is not worth it; the safety sequence covers this.
                self.zephyr.log_warn(detail!(
                    "Full retract TC not supported, request safety mode"
                ));
                false
            }

            Tc::CancelMotion => {
                // Attempt the cancel no matter the mode.
                self.mcb.send(McbCommand::CancelMotion);
                self.flags.set(ActionId::MotionStop);
                self.flags.set(ActionId::OverrideTsen);
                true
            }

            Tc::ZeroReel => {
                if self.mcb_state.dock_ongoing {
                    self.zephyr
                        .log_warn(detail!("Can't zero reel, motion ongoing"));
                }
                self.mcb.send(McbCommand::ZeroReel);
                true
            }

            Tc::TempLimits { limits } => {
                self.mcb.send(McbCommand::TempLimits(limits));
                true
            }
            Tc::TorqueLimits { limits } => {
                self.mcb.send(McbCommand::TorqueLimits(limits));
                true
            }
            Tc::CurrentLimits { limits } => {
                self.mcb.send(McbCommand::CurrentLimits(limits));
                true
            }
            Tc::IgnoreLimits => {
                self.mcb.send(McbCommand::IgnoreLimits);
                true
            }
            Tc::UseLimits => {
                self.mcb.send(McbCommand::UseLimits);
                true
            }

            Tc::GetMcbEeprom => {
                if self.mcb_state.motion_ongoing {
                    self.zephyr
                        .log_warn(detail!("Motion ongoing, request MCB EEPROM later"));
                } else {
                    self.mcb.send(McbCommand::GetEeprom);
                }
                true
            }

            // ── PIB configuration / operations ──────────────────────
            Tc::SetAutonomous => self.switch_autonomy(true),
            Tc::SetManual => self.switch_autonomy(false),

            Tc::SetSzaMinimum { deg } => {
                self.config.sza_minimum = deg;
                self.config_dirty = true;
                self.zephyr.log_fine(detail!("Set sza_minimum: {deg}"));
                true
            }
            Tc::SetProfileSize { revs } => {
                self.config.profile_size = revs;
                self.config_dirty = true;
                self.zephyr.log_fine(detail!("Set profile_size: {revs}"));
                true
            }
            Tc::SetDockAmount { revs } => {
                self.config.dock_amount = revs;
                self.config_dirty = true;
                self.zephyr.log_fine(detail!("Set dock_amount: {revs}"));
                true
            }
            Tc::SetDockOvershoot { revs } => {
                self.config.dock_overshoot = revs;
                self.config_dirty = true;
                self.zephyr.log_fine(detail!("Set dock_overshoot: {revs}"));
                true
            }
            Tc::SetDwellTime { seconds } => {
                self.config.dwell_time = seconds;
                self.config_dirty = true;
                self.zephyr.log_fine(detail!("Set dwell_time: {seconds}"));
                true
            }
            Tc::SetProfilePeriod { seconds } => {
                self.config.profile_period = seconds;
                self.config_dirty = true;
                self.zephyr.log_fine(detail!("Set profile_period: {seconds}"));
                true
            }
            Tc::SetNumProfiles { count } => {
                self.config.num_profiles = count;
                self.config_dirty = true;
                self.zephyr.log_fine(detail!("Set num_profiles: {count}"));
                true
            }
            Tc::SetPreprofileTime { seconds } => {
                self.config.preprofile_time = seconds;
                self.config_dirty = true;
                self.zephyr.log_fine(detail!("Set preprofile_time: {seconds}"));
                true
            }
            Tc::SetPuWarmupTime { seconds } => {
                self.config.puwarmup_time = seconds;
                self.config_dirty = true;
                self.zephyr.log_fine(detail!("Set puwarmup_time: {seconds}"));
                true
            }
            Tc::SetMotionTimeout { seconds } => {
                self.config.motion_timeout = seconds;
                self.config_dirty = true;
                self.zephyr.log_fine(detail!("Set motion_timeout: {seconds}"));
                true
            }

            Tc::SetTimeTrigger { epoch } => {
                if self.clock.epoch > epoch {
                    self.zephyr.log_warn(detail!(
                        "Can't use time trigger in past: {} is less than {}",
                        epoch,
                        self.clock.epoch
                    ));
                    return false;
                }
                self.config.time_trigger = epoch;
                self.config_dirty = true;
                self.zephyr.log_fine(detail!("Set time_trigger: {epoch}"));
                self.profiles_remaining = self.config.num_profiles;
                true
            }
            Tc::UseSzaTrigger => {
                self.config.sza_trigger = true;
                self.config_dirty = true;
                self.zephyr.log_fine(detail!("Set sza_trigger: true"));
                true
            }
            Tc::UseTimeTrigger => {
                self.config.sza_trigger = false;
                self.config_dirty = true;
                self.zephyr.log_fine(detail!("Set sza_trigger: false"));
                true
            }

            Tc::RetryDock {
                deploy_revs,
                retract_revs,
            } => {
                if self.warn_if_autonomous() {
                    return true;
                }
                info!("Received retry dock telecommand");
                self.flags.set(ActionId::Redock);
                self.flags.set(ActionId::OverrideTsen);
                self.params.deploy_length = deploy_revs;
                self.params.retract_length = retract_revs;
                true
            }

            Tc::GetPuStatus => {
                if self.autonomous_mode {
                    self.zephyr
                        .log_warn(detail!("PU status TC only implemented for manual"));
                    return true;
                }
                info!("Received get PU status TC");
                self.flags.set(ActionId::CheckPu);
                true
            }

            Tc::PuPowerOn => {
                self.pins.pu_power = true;
                self.zephyr.log_fine(detail!("PU powered on"));
                true
            }
            Tc::PuPowerOff => {
                self.pins.pu_power = false;
                self.zephyr.log_fine(detail!("PU powered off"));
                true
            }

            Tc::ManualProfile {
                profile_size,
                dock_amount,
                dock_overshoot,
                dwell_time,
            } => {
                if self.warn_if_autonomous() {
                    return true;
                }
                info!("Received manual profile telecommand");
                self.config.profile_size = profile_size;
                self.config.dock_amount = dock_amount;
                self.config.dock_overshoot = dock_overshoot;
                self.config.dwell_time = dwell_time;
                self.config_dirty = true;
                self.flags.set(ActionId::ManualProfile);
                self.flags.set(ActionId::OverrideTsen);
                true
            }

            Tc::OffloadPuProfile => {
                if self.autonomous_mode {
                    self.zephyr
                        .log_warn(detail!("PU profile offload TC only implemented for manual"));
                    return true;
                }
                info!("Received offload PU profile TC");
                self.flags.set(ActionId::OffloadPu);
                self.flags.set(ActionId::OverrideTsen);
                true
            }

            Tc::AutoRedockParams {
                deploy_revs,
                retract_revs,
                attempts,
            } => {
                self.config.redock_out = deploy_revs;
                self.config.redock_in = retract_revs;
                self.config.num_redock = attempts;
                self.config_dirty = true;
                self.zephyr.log_fine(detail!(
                    "New auto redock params: {:.2}, {:.2}, {}",
                    deploy_revs,
                    retract_revs,
                    attempts
                ));
                true
            }

            Tc::GetPibConfig => {
                if self.mcb_state.motion_ongoing {
                    self.zephyr
                        .log_warn(detail!("Motion ongoing, request PIB config later"));
                } else {
                    self.send_config_tm();
                }
                true
            }

            Tc::DockedProfile { seconds } => {
                if self.warn_if_autonomous() {
                    return true;
                }
                info!("Received docked profile telecommand");
                self.docked_profile_time = seconds;
                self.flags.set(ActionId::DockedProfile);
                self.flags.set(ActionId::OverrideTsen);
                true
            }

            Tc::StartRealTimeMcb => {
                if self.mcb_state.motion_ongoing {
                    self.zephyr
                        .log_warn(detail!("Cannot start real-time MCB mode, motion ongoing"));
                } else {
                    self.config.real_time_mcb = true;
                    self.config_dirty = true;
                    self.zephyr.log_fine(detail!("Started real-time MCB mode"));
                }
                true
            }
            Tc::ExitRealTimeMcb => {
                if self.mcb_state.motion_ongoing {
                    self.zephyr
                        .log_warn(detail!("Cannot exit real-time MCB mode, motion ongoing"));
                } else {
                    self.config.real_time_mcb = false;
                    self.config_dirty = true;
                    self.zephyr.log_fine(detail!("Exited real-time MCB mode"));
                }
                true
            }

            Tc::LoraTxTm { enable } => {
                self.config.lora_tx_tm = enable;
                self.config_dirty = true;
                if enable {
                    self.zephyr.log_fine(detail!("Turning on LoRa profile TMs"));
                } else {
                    self.zephyr.log_fine(detail!("Turning off LoRa profile TMs"));
                }
                true
            }

            Tc::RaOverride => {
                self.config.ra_override = true;
                self.config_dirty = true;
                self.zephyr.log_warn(detail!("RA override activated"));
                true
            }
            Tc::RaResume => {
                self.config.ra_override = false;
                self.config_dirty = true;
                self.zephyr.log_fine(detail!("RA override canceled"));
                true
            }

            Tc::SetAutoOffload => {
                self.config.pu_auto_offload = true;
                self.config_dirty = true;
                self.zephyr
                    .log_warn(detail!("PU data auto offload after profile"));
                true
            }
            Tc::SetManualOffload => {
                self.config.pu_auto_offload = false;
                self.config_dirty = true;
                self.zephyr
                    .log_fine(detail!("PU data manual offload after profile"));
                true
            }

            // ── PU configuration ────────────────────────────────────
            Tc::LoraTxStatus { seconds } => {
                self.config.lora_tx_status = seconds;
                self.config_dirty = true;
                // Via the docking connector; the PU applies it when docked.
                self.pu.send(PuCommand::LoraStatusRate(seconds));
                self.zephyr
                    .log_fine(detail!("Updated PU LoRa status TX rate"));
                true
            }

            Tc::PuWarmupConfigs {
                flash_temp,
                heater1_temp,
                heater2_temp,
                flash_power,
                tsen_power,
            } => {
                self.config.flash_temp = flash_temp;
                self.config.heater1_temp = heater1_temp;
                self.config.heater2_temp = heater2_temp;
                self.config.flash_power = flash_power;
                self.config.tsen_power = tsen_power;
                self.config_dirty = true;
                self.zephyr.log_fine(detail!(
                    "New PU warmup configs: {:.2}, {:.2}, {:.2}, {}, {}",
                    flash_temp,
                    heater1_temp,
                    heater2_temp,
                    flash_power,
                    tsen_power
                ));
                true
            }

            Tc::PuProfileConfigs {
                profile_rate,
                dwell_rate,
                tsen,
                ropc,
                flash,
                lora_tm,
            } => {
                self.config.profile_rate = profile_rate;
                self.config.dwell_rate = dwell_rate;
                self.config.profile_tsen = tsen;
                self.config.profile_ropc = ropc;
                self.config.profile_flash = flash;
                self.config.lora_tx_tm = lora_tm;
                self.config_dirty = true;
                self.zephyr.log_fine(detail!(
                    "New PU profile configs: {}, {}, {}, {}, {}, {}",
                    profile_rate,
                    dwell_rate,
                    tsen,
                    ropc,
                    flash,
                    lora_tm
                ));
                true
            }

            Tc::PuReset => {
                self.pu.send(PuCommand::Reset);
                true
            }

            Tc::PuDockedConfigs {
                rate,
                tsen,
                ropc,
                flash,
            } => {
                self.config.docked_rate = rate;
                self.config.docked_tsen = tsen;
                self.config.docked_ropc = ropc;
                self.config.docked_flash = flash;
                self.config_dirty = true;
                self.zephyr.log_fine(detail!(
                    "New PU docked profile configs: {rate}, {tsen}, {ropc}, {flash}"
                ));
                true
            }

            // ── General ─────────────────────────────────────────────
            Tc::ExitError => {
                self.flags.set(ActionId::ExitErrorState);
                self.zephyr
                    .log_fine(detail!("Received exit error command"));
                true
            }
        }
    }

    /// Motion-family guard: warn and skip when autonomous.
    fn warn_if_autonomous(&mut self) -> bool {
        if self.autonomous_mode {
            self.zephyr
                .log_warn(detail!("Switch to manual mode before commanding motion"));
            true
        } else {
            false
        }
    }

    /// Autonomy switch, refused while the reel is moving.
    fn switch_autonomy(&mut self, autonomous: bool) -> bool {
        if self.mcb_state.motion_ongoing {
            self.zephyr
                .log_warn(detail!("Motion ongoing, can't update mode"));
            return false;
        }
        self.autonomous_mode = autonomous;
        self.reenter_mode();
        if autonomous {
            self.zephyr.log_fine(detail!("Set mode to auto"));
        } else {
            self.zephyr.log_fine(detail!("Set mode to manual"));
        }
        true
    }

    /// Downlink the live configuration snapshot in its file form.
    fn send_config_tm(&mut self) {
        match toml::to_string_pretty(&self.config) {
            Ok(text) => {
                let bytes = text.as_bytes();
                let mut payload = TmPayload::new();
                let take = bytes.len().min(payload.capacity());
                let _ = payload.extend_from_slice(&bytes[..take]);
                self.zephyr
                    .tm(StateFlag::Fine, detail!("PIB config contents"), payload);
                info!("Sent PIB config as TM");
            }
            Err(e) => error!("Unable to serialize PIB config: {e}"),
        }
    }
}
