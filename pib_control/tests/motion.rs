//! Manual motion: retry policy, dock-fault reinterpretation, ground stop.

mod common;

use common::Sim;
use pib_common::config::PibConfig;
use pib_common::msg::mcb::{McbAck, McbCommand, McbFrame};
use pib_common::msg::zephyr::{AckKind, LogLevel, StateFlag};
use pib_common::telecommand::Telecommand;
use pib_control::modes::flight::FlightSt;

fn manual_sim() -> Sim {
    let mut sim = Sim::new(PibConfig {
        ra_override: true,
        ..Default::default()
    });
    sim.enter_flight(false, 30.0);
    sim
}

fn is_reel_out(cmd: &McbCommand) -> bool {
    matches!(cmd, McbCommand::ReelOut { .. })
}

#[test]
fn unacked_motion_retries_once_then_errors() {
    let mut sim = manual_sim();
    assert!(sim.pib.handle_telecommand(Telecommand::Deploy { revs: 100.0 }));

    sim.tick(); // dispatch: RA sent
    sim.tick(); // RA override accepts
    sim.tick(); // motion start
    let cmds = sim.drain_mcb();
    assert_eq!(
        cmds,
        vec![McbCommand::ReelOut {
            revs: 100.0,
            speed_rpm: 250.0
        }]
    );

    // No ack: the resend timer fires at +10 s and one retry goes out.
    sim.advance(11);
    sim.tick(); // verify consumes the timer
    sim.tick(); // second (and last) transmission
    let cmds = sim.drain_mcb();
    assert_eq!(cmds.iter().filter(|c| is_reel_out(c)).count(), 1);

    // Still no ack: the machine gives up instead of sending a third.
    sim.advance(11);
    sim.tick(); // verify: retry already spent
    let warned = sim
        .logs()
        .iter()
        .any(|(lvl, text)| *lvl == LogLevel::Warn && text == "MCB never confirmed motion");
    assert!(warned);
    sim.tick(); // error landing
    sim.tick();
    assert_eq!(sim.flight_state(), FlightSt::ErrorLoop);
    assert!(!sim.drain_mcb().iter().any(is_reel_out));
}

#[test]
fn motion_ongoing_tracks_ack_to_finish() {
    let mut sim = manual_sim();
    assert!(sim.pib.handle_telecommand(Telecommand::Deploy { revs: 50.0 }));
    sim.tick_n(3); // dispatch, RA, start
    assert!(!sim.pib.mcb_state.motion_ongoing);

    sim.mcb_ack(McbAck::ReelOut);
    sim.tick();
    assert!(sim.pib.mcb_state.motion_ongoing);

    sim.mcb_frame(McbFrame::MotionFinished);
    sim.tick();
    assert!(!sim.pib.mcb_state.motion_ongoing);
}

#[test]
fn wrong_kind_ack_does_not_start_motion() {
    let mut sim = manual_sim();
    assert!(sim.pib.handle_telecommand(Telecommand::Deploy { revs: 50.0 }));
    sim.tick_n(3);
    sim.mcb_ack(McbAck::ReelIn); // stale ack from some earlier command
    sim.tick();
    assert!(!sim.pib.mcb_state.motion_ongoing);
}

#[test]
fn dock_fault_is_reported_as_dock_success() {
    let mut sim = manual_sim();
    assert!(sim.pib.handle_telecommand(Telecommand::Dock { revs: 30.0 }));
    sim.tick_n(3); // dispatch, RA, start
    match sim.drain_mcb().as_slice() {
        [McbCommand::Dock { revs, speed_rpm }] => {
            assert_eq!(*revs, 30.0);
            assert_eq!(*speed_rpm, 80.0);
        }
        other => panic!("expected dock command, got {other:?}"),
    }

    sim.mcb_ack(McbAck::Dock);
    sim.tick();
    assert!(sim.pib.mcb_state.motion_ongoing);
    assert!(sim.pib.mcb_state.dock_ongoing);

    sim.mcb_frame(McbFrame::MotionFault {
        words: [0x8, 0, 0, 0, 0, 0, 0, 0],
        params_ok: true,
    });
    sim.tick();
    assert!(!sim.pib.mcb_state.motion_ongoing);
    assert!(!sim.pib.mcb_state.dock_ongoing);

    let tms = sim.tms();
    assert!(tms
        .iter()
        .any(|(flag, detail, _)| *flag == StateFlag::Fine
            && detail.starts_with("MCB: dock condition assumed")));
    assert!(tms
        .iter()
        .any(|(_, detail, _)| detail == "Finished commanded manual motion"));

    // Receipt closes the procedure with no mode error.
    sim.pib.handle_zephyr_ack(AckKind::Tm, true);
    sim.tick();
    assert_eq!(sim.flight_state(), FlightSt::ManualIdle);
}

#[test]
fn fault_outside_dock_is_critical() {
    let mut sim = manual_sim();
    assert!(sim.pib.handle_telecommand(Telecommand::Deploy { revs: 50.0 }));
    sim.tick_n(3);
    sim.mcb_ack(McbAck::ReelOut);
    sim.tick();

    sim.mcb_frame(McbFrame::MotionFault {
        words: [0x4, 0, 0, 0, 0, 0, 0, 0],
        params_ok: true,
    });
    sim.tick();
    let tms = sim.tms();
    assert!(tms
        .iter()
        .any(|(flag, detail, _)| *flag == StateFlag::Crit && detail.starts_with("MCB fault:")));
    assert_eq!(sim.flight_state(), FlightSt::ErrorLoop);
}

#[test]
fn repeated_fault_reports_are_ignored() {
    let mut sim = manual_sim();
    assert!(sim.pib.handle_telecommand(Telecommand::Dock { revs: 30.0 }));
    sim.tick_n(3);
    sim.mcb_ack(McbAck::Dock);
    sim.tick();

    let fault = McbFrame::MotionFault {
        words: [0x8, 0, 0, 0, 0, 0, 0, 0],
        params_ok: true,
    };
    sim.mcb_frame(fault.clone());
    sim.mcb_frame(fault);
    sim.tick();
    let dock_tms = sim
        .tms()
        .into_iter()
        .filter(|(_, detail, _)| detail.starts_with("MCB: dock condition assumed"))
        .count();
    assert_eq!(dock_tms, 1);
}

#[test]
fn ground_stop_ends_the_procedure_without_error() {
    let mut sim = manual_sim();
    assert!(sim.pib.handle_telecommand(Telecommand::Deploy { revs: 50.0 }));
    sim.tick_n(3);
    sim.mcb_ack(McbAck::ReelOut);
    sim.tick(); // monitoring

    assert!(sim.pib.handle_telecommand(Telecommand::CancelMotion));
    assert!(sim.drain_mcb().contains(&McbCommand::CancelMotion));
    sim.tick(); // monitor consumes the stop
    let stopped = sim
        .logs()
        .iter()
        .any(|(lvl, text)| *lvl == LogLevel::Fine && text == "Commanded motion stop");
    assert!(stopped);
    assert_eq!(sim.flight_state(), FlightSt::ManualIdle);

    // The MCB confirms the cancel with a finish report.
    sim.mcb_frame(McbFrame::MotionFinished);
    sim.tick();
    assert!(!sim.pib.mcb_state.motion_ongoing);
}
