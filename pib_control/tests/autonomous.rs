//! Autonomous flight: nightly scheduling, trigger selection, TSEN
//! interleave and preemption.

mod common;

use common::Sim;
use pib_common::action::ActionId;
use pib_common::config::{PibConfig, TIME_TRIGGER_DISABLED};
use pib_common::mode::Mode;
use pib_control::modes::flight::FlightSt;
use pib_control::modes::ModeState;

fn night_config() -> PibConfig {
    PibConfig {
        sza_trigger: true,
        num_profiles: 3,
        profile_period: 7200,
        ..Default::default()
    }
}

#[test]
fn night_start_schedules_the_allotment() {
    let mut sim = Sim::new(night_config());
    sim.enter_flight(true, 30.0);
    assert_eq!(sim.pib.profiles_remaining, 0);

    // Daytime re-arms the allotment, every tick.
    sim.tick();
    assert_eq!(sim.pib.profiles_remaining, 3);
    sim.tick();
    assert_eq!(sim.pib.profiles_remaining, 3);
    assert!(!sim.pib.profiles_scheduled);

    // Nightfall past the SZA minimum: one batch, spaced by the period.
    sim.pib.update_gps(110.0, true);
    sim.tick();
    let t0 = sim.mono_ms;
    assert_eq!(sim.flight_state(), FlightSt::AutoWaitProfile);
    assert!(sim.pib.profiles_scheduled);
    let times = sim.pib.sched.fire_times_ms(ActionId::BeginProfile);
    assert_eq!(
        times.as_slice(),
        &[t0 + 5_000, t0 + 7_205_000, t0 + 14_405_000]
    );
    // Any scheduling consumes the time trigger.
    assert_eq!(sim.pib.config.time_trigger, TIME_TRIGGER_DISABLED);

    // The first trigger starts a profile.
    sim.advance(6);
    sim.tick();
    assert_eq!(sim.flight_state(), FlightSt::AutoProfile);
}

#[test]
fn night_ticks_do_not_reschedule() {
    let mut sim = Sim::new(night_config());
    sim.enter_flight(true, 30.0);
    sim.tick();
    sim.pib.update_gps(110.0, true);
    sim.tick();
    let scheduled = sim.pib.sched.len();

    // Riding through more night ticks in the wait state adds nothing.
    sim.tick_n(3);
    assert_eq!(sim.pib.sched.len(), scheduled);
}

#[test]
fn time_trigger_fires_when_sza_trigger_disabled() {
    let mut sim = Sim::new(PibConfig {
        sza_trigger: false,
        num_profiles: 2,
        profile_period: 600,
        ..Default::default()
    });
    sim.enter_flight(true, 30.0);
    sim.tick(); // day reset arms the allotment

    let trigger = sim.epoch + 30;
    assert!(sim
        .pib
        .handle_telecommand(pib_common::telecommand::Telecommand::SetTimeTrigger {
            epoch: trigger
        }));
    sim.pib.update_gps(110.0, true); // night, but SZA trigger is off
    sim.tick();
    assert_eq!(sim.flight_state(), FlightSt::AutoIdle);

    sim.advance(31); // past the trigger epoch
    assert_eq!(sim.flight_state(), FlightSt::AutoWaitProfile);
    assert_eq!(
        sim.pib.sched.fire_times_ms(ActionId::BeginProfile).len(),
        2
    );
}

#[test]
fn tsen_interleaves_while_waiting_for_profile() {
    let mut sim = Sim::new(night_config());
    sim.enter_flight(true, 30.0);
    sim.tick();
    sim.pib.update_gps(110.0, true);
    sim.tick(); // scheduled, waiting (first trigger at +5 s)

    sim.pib.flags.set(ActionId::SendTsen);
    sim.tick();
    assert_eq!(sim.flight_state(), FlightSt::AutoTsen);
}

#[test]
fn pending_profile_preempts_tsen() {
    let mut sim = Sim::new(night_config());
    sim.enter_flight(true, 30.0);
    sim.tick(); // day: allotment armed, no trigger

    sim.pib.flags.set(ActionId::SendTsen);
    sim.tick();
    assert_eq!(sim.flight_state(), FlightSt::AutoTsen);

    // A profile trigger lands while TSEN is mid-flight.
    sim.pib.flags.set(ActionId::BeginProfile);
    sim.tick();
    assert_eq!(sim.flight_state(), FlightSt::AutoIdle);
    // The trigger was handed back for the profile wait state.
    assert!(sim.pib.flags.is_set(ActionId::BeginProfile));
}

#[test]
fn flight_error_loop_exits_on_ground_command() {
    let mut sim = Sim::new(night_config());
    sim.enter_flight(true, 110.0);
    sim.tick();
    // A peer-reported error string lands the mode in its error loop; the
    // landing runs on the same tick the router raises it.
    sim.mcb_frame(pib_common::msg::mcb::McbFrame::Error(pib_common::detail!(
        "resolver fault"
    )));
    sim.tick();
    assert_eq!(sim.flight_state(), FlightSt::ErrorLoop);
    assert_eq!(sim.pib.sched.len(), 1); // only the low-power resend timer
    assert_eq!(sim.pib.profiles_remaining, 0);

    assert!(sim
        .pib
        .handle_telecommand(pib_common::telecommand::Telecommand::ExitError));
    sim.tick();
    assert_eq!(sim.flight_state(), FlightSt::Entry);
    sim.tick();
    assert_eq!(sim.flight_state(), FlightSt::GpsWait);
    assert_eq!(sim.pib.mode(), Mode::Flight);
    assert!(matches!(sim.pib.mode_state(), ModeState::Flight(_)));
}
