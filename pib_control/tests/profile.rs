//! The full profile sequence, end to end: happy path through warmup,
//! TSEN, deploy, dwell, retract, dock and offload; and the bounded
//! redock loop exhausting into the mode error.

mod common;

use common::Sim;
use pib_common::action::ActionId;
use pib_common::config::PibConfig;
use pib_common::msg::mcb::{McbAck, McbCommand, McbFrame};
use pib_common::msg::pu::{PuAck, PuCommand, PuFrame};
use pib_common::msg::zephyr::{AckKind, LogLevel, StateFlag};
use pib_control::modes::flight::FlightSt;

fn profile_config() -> PibConfig {
    PibConfig {
        sza_trigger: true,
        num_profiles: 1,
        profile_period: 600,
        puwarmup_time: 20,
        preprofile_time: 15,
        dwell_time: 20,
        profile_size: 100.0,
        dock_amount: 20.0,
        dock_overshoot: 10.0,
        num_redock: 2,
        redock_out: 5.0,
        redock_in: 10.0,
        ..Default::default()
    }
}

fn record(len: usize) -> heapless::Vec<u8, 4096> {
    let mut v = heapless::Vec::new();
    for i in 0..len {
        v.push(i as u8).unwrap();
    }
    v
}

/// Into flight, through the night trigger, up to the RA grant.
fn start_profile(sim: &mut Sim) {
    sim.enter_flight(true, 30.0);
    sim.tick(); // day tick arms the allotment
    assert_eq!(sim.pib.profiles_remaining, 1);

    sim.pib.update_gps(110.0, true);
    sim.tick(); // schedule → wait
    sim.advance(6); // first trigger fires
    sim.tick(); // profile dispatched, RA out
    assert_eq!(sim.flight_state(), FlightSt::AutoProfile);

    sim.pib.handle_zephyr_ack(AckKind::Ra, true);
    sim.tick(); // RA accepted
}

/// Answer the warmup/TSEN preamble up to the PU profile plan.
fn run_preamble(sim: &mut Sim) -> PuCommand {
    sim.tick_until_pu(|c| matches!(c, PuCommand::Warmup { .. }), 5);
    sim.pu_frame(PuFrame::Ack(PuAck::GoWarmup));
    sim.tick(); // warmup confirmed, dwell armed
    sim.advance(21); // warmup elapses
    sim.tick(); // into the TSEN sweep

    // One TSEN record, then the store runs dry.
    sim.tick_until_pu(|c| matches!(c, PuCommand::SendStatus), 8);
    sim.pu_status(111);
    sim.tick_until_pu(|c| matches!(c, PuCommand::SendTsenRecord), 8);
    sim.pu_frame(PuFrame::Tsen {
        checksum_valid: true,
        data: record(64),
    });
    sim.tick(); // record staged, TSEN TM out
    let tsen_tm = sim
        .tms()
        .into_iter()
        .find(|(_, detail, _)| detail.starts_with("PU TSEN:"))
        .expect("TSEN TM");
    assert_eq!(tsen_tm.2, 64);
    sim.pib.handle_zephyr_ack(AckKind::Tm, true);
    sim.tick(); // receipt closes the record

    sim.tick_until_pu(|c| matches!(c, PuCommand::SendStatus), 8);
    sim.pu_status(222);
    sim.tick_until_pu(|c| matches!(c, PuCommand::SendTsenRecord), 8);
    sim.pu_frame(PuFrame::NoMoreRecords);
    sim.tick(); // TSEN done → profile plan

    sim.tick_until_pu(|c| matches!(c, PuCommand::Profile { .. }), 5)
}

/// Deploy/dwell/retract/dock with prompt MCB responses.
fn run_motion_phases(sim: &mut Sim) {
    sim.pu_frame(PuFrame::Ack(PuAck::GoProfile));
    sim.tick(); // plan confirmed, preprofile armed
    sim.advance(16); // preprofile elapses
    sim.tick(); // → reel out

    let cmd = sim.tick_until_mcb(|c| matches!(c, McbCommand::ReelOut { .. }), 5);
    assert_eq!(
        cmd,
        McbCommand::ReelOut {
            revs: 100.0,
            speed_rpm: 250.0
        }
    );
    // Deploying drops the PU from the dock.
    assert!(!sim.pib.config.pu_docked);
    sim.mcb_ack(McbAck::ReelOut);
    sim.tick();
    assert!(sim.pib.mcb_state.motion_ongoing);
    sim.mcb_frame(McbFrame::MotionFinished);
    sim.tick(); // reel out TM + dwell armed
    assert!(sim
        .tms()
        .iter()
        .any(|(flag, detail, _)| *flag == StateFlag::Fine
            && detail == "Finished profile reel out"));

    sim.advance(21); // dwell elapses
    sim.tick(); // → reel in
    let cmd = sim.tick_until_mcb(|c| matches!(c, McbCommand::ReelIn { .. }), 5);
    assert_eq!(
        cmd,
        McbCommand::ReelIn {
            revs: 80.0,
            speed_rpm: 250.0
        }
    );
    sim.mcb_ack(McbAck::ReelIn);
    sim.tick();
    sim.mcb_frame(McbFrame::MotionFinished);
    sim.tick(); // reel in TM + dock-wait grace armed

    sim.advance(61); // grace (and the stale reel-in budget) fire
    sim.tick(); // → dock
    let cmd = sim.tick_until_mcb(|c| matches!(c, McbCommand::Dock { .. }), 5);
    assert_eq!(
        cmd,
        McbCommand::Dock {
            revs: 30.0,
            speed_rpm: 80.0
        }
    );
    sim.mcb_ack(McbAck::Dock);
    sim.tick();
    assert!(sim.pib.mcb_state.dock_ongoing);
    sim.mcb_frame(McbFrame::MotionFault {
        words: [0x8, 0, 0, 0, 0, 0, 0, 0],
        params_ok: true,
    });
    sim.tick(); // dock assumed → PU status check
    assert!(sim
        .tms()
        .iter()
        .any(|(_, detail, _)| detail.starts_with("MCB: dock condition assumed")));
}

/// Let one PU check run both attempts into silence.
fn let_pu_check_fail(sim: &mut Sim) {
    sim.tick_until_pu(|c| matches!(c, PuCommand::SendStatus), 10);
    sim.advance(11); // first retry timer
    sim.tick(); // consumed, resend queued
    sim.tick_until_pu(|c| matches!(c, PuCommand::SendStatus), 5);
    sim.advance(11); // second window closes
    sim.tick(); // retry spent: warn, sub-machine done
}

/// One full redock choreography with the PU staying silent.
fn run_silent_redock(sim: &mut Sim) {
    let cmd = sim.tick_until_mcb(|c| matches!(c, McbCommand::ReelOut { .. }), 10);
    assert_eq!(
        cmd,
        McbCommand::ReelOut {
            revs: 5.0,
            speed_rpm: 250.0
        }
    );
    sim.mcb_ack(McbAck::ReelOut);
    sim.tick();
    sim.mcb_frame(McbFrame::MotionFinished);
    sim.tick();

    sim.advance(30); // the retract leg comes due
    let cmd = sim.tick_until_mcb(|c| matches!(c, McbCommand::InNoLooseWire { .. }), 10);
    assert_eq!(
        cmd,
        McbCommand::InNoLooseWire {
            revs: 10.0,
            speed_rpm: 80.0
        }
    );
    sim.mcb_ack(McbAck::InNoLooseWire);
    sim.tick();
    sim.mcb_frame(McbFrame::MotionFault {
        words: [0x8, 0, 0, 0, 0, 0, 0, 0],
        params_ok: true,
    });
    sim.tick();

    sim.advance(30); // the PU check comes due, and goes unanswered
    let_pu_check_fail(sim);
    sim.tick(); // redock reports done
}

#[test]
fn autonomous_profile_happy_path() {
    let mut sim = Sim::new(profile_config());
    start_profile(&mut sim);

    let plan = run_preamble(&mut sim);
    match plan {
        PuCommand::Profile {
            t_down,
            dwell,
            t_up,
            lora_tm,
            ..
        } => {
            // 60*100/250 + 15 and 60*(80/250 + 30/80) + 30.
            assert_eq!(t_down, 39);
            assert_eq!(t_up, 71);
            assert_eq!(dwell, 20);
            assert!(!lora_tm);
        }
        other => panic!("expected profile plan, got {other:?}"),
    }
    // Each plan burns a profile id.
    assert_eq!(sim.pib.config.profile_id, 2);

    run_motion_phases(&mut sim);

    // The PU answers the post-dock check, which also re-marks it docked.
    sim.tick_until_pu(|c| matches!(c, PuCommand::SendStatus), 8);
    sim.pu_status(333);
    sim.tick(); // check done
    sim.tick(); // dock verified: zero reel + MCB low power
    let cmds = sim.drain_mcb();
    assert!(cmds.contains(&McbCommand::ZeroReel));
    assert!(cmds.contains(&McbCommand::GoLowPower));

    sim.mcb_ack(McbAck::GoLowPower);
    sim.tick(); // profile done → offload begins
    assert_eq!(sim.flight_state(), FlightSt::AutoOffload);

    // Offload: status answers, but the record store is empty.
    sim.tick_until_pu(|c| matches!(c, PuCommand::SendStatus), 8);
    sim.pu_status(444);
    sim.tick_until_pu(|c| matches!(c, PuCommand::SendProfileRecord), 8);
    sim.pu_frame(PuFrame::NoMoreRecords);
    sim.tick(); // offload done
    sim.tick(); // bookkeeping
    assert_eq!(sim.pib.profiles_remaining, 0);
    assert_eq!(sim.flight_state(), FlightSt::AutoIdle);
}

#[test]
fn offload_downlinks_records_until_dry() {
    let mut sim = Sim::new(profile_config());
    sim.enter_flight(false, 30.0);
    sim.pib.flags.set(ActionId::OffloadPu);
    sim.tick(); // dispatch

    for n in 1..=2u8 {
        sim.tick_until_pu(|c| matches!(c, PuCommand::SendStatus), 8);
        sim.pu_status(1000 + u32::from(n));
        sim.tick_until_pu(|c| matches!(c, PuCommand::SendProfileRecord), 8);
        sim.pu_frame(PuFrame::ProfileRecord {
            checksum_valid: true,
            data: record(128),
        });
        sim.tick(); // record staged and downlinked
        let tm = sim
            .tms()
            .into_iter()
            .find(|(_, detail, _)| detail.starts_with("PU Prof. Rec."))
            .expect("profile record TM");
        assert!(tm.1.starts_with(&format!("PU Prof. Rec. 1.{n}:")));
        assert_eq!(tm.2, 128);
        sim.pib.handle_zephyr_ack(AckKind::Tm, true);
        sim.tick();
    }

    sim.tick_until_pu(|c| matches!(c, PuCommand::SendStatus), 8);
    sim.pu_status(2000);
    sim.tick_until_pu(|c| matches!(c, PuCommand::SendProfileRecord), 8);
    sim.pu_frame(PuFrame::NoMoreRecords);
    sim.tick();
    sim.tick();
    assert_eq!(sim.flight_state(), FlightSt::ManualIdle);
}

#[test]
fn redock_exhaustion_escalates_to_mode_error() {
    let mut sim = Sim::new(profile_config());
    start_profile(&mut sim);
    run_preamble(&mut sim);
    run_motion_phases(&mut sim);

    // The PU never answers after the dock: the check fails, the dock is
    // unverified, and each redock attempt burns one of the two allowed.
    let_pu_check_fail(&mut sim);
    sim.tick(); // verify dock: attempt 1 → redock
    run_silent_redock(&mut sim);

    let_pu_check_fail(&mut sim);
    sim.tick(); // verify dock: attempt 2 → redock
    run_silent_redock(&mut sim);

    let_pu_check_fail(&mut sim);
    sim.tick(); // verify dock: attempt 3 exceeds the allowance
    let escalated = sim
        .logs()
        .iter()
        .any(|(lvl, text)| *lvl == LogLevel::Crit && text.starts_with("No dock!"));
    assert!(escalated);
    sim.tick();
    assert_eq!(sim.flight_state(), FlightSt::ErrorLoop);
    assert_eq!(sim.pib.profiles_remaining, 0);
}
