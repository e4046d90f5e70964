//! Integration tests for the AppService → FSM → actuators pipeline.
//!
//! These run on the host (x86_64) against [`MockHardware`] and a synthetic
//! 10 ms clock.  Inputs pass through the real debouncers, so an input
//! flipped before tick `t` becomes stable at `t + STEP_MS + debounce`.

use crate::mock_hw::{ActuatorCall, Rig, STEP_MS};

use kitchenguard::app::events::AppEvent;
use kitchenguard::audio::ToneCommand;
use kitchenguard::config::SystemConfig;
use kitchenguard::fsm::StateId;
use kitchenguard::fsm::context::LockoutCause;
use kitchenguard::hazard::HazardAlarmState;

/// Clock reading at which an input changed now becomes stable.
fn settles_at(rig: &Rig) -> u64 {
    rig.now_ms + STEP_MS + rig.debounce_ms()
}

fn request_with_water(rig: &mut Rig) -> u64 {
    rig.hw.inputs.pump_request = true;
    rig.hw.inputs.water_present = true;
    let t = settles_at(rig);
    rig.run_until(t);
    assert_eq!(rig.app.state(), StateId::Testing);
    t
}

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn boot_holds_pump_off_through_startup() {
    let mut rig = Rig::new(SystemConfig::default());
    assert_eq!(rig.hw.calls.first(), Some(&ActuatorCall::AllOff));
    rig.hw.inputs.pump_request = true;
    rig.hw.inputs.water_present = true;
    rig.run_until_checking(2_990, |r| {
        assert_eq!(r.app.state(), StateId::Startup);
        assert!(!r.hw.pump_on());
    });
    rig.run_until(3_000);
    assert_eq!(rig.app.state(), StateId::Idle);
    assert_eq!(rig.sink.entered_at(StateId::Idle), Some(3_000));
}

// ── Pump: happy path ──────────────────────────────────────────

#[test]
fn verified_flow_reaches_running_with_pump_held_on() {
    let mut rig = Rig::idle();
    let t_test = request_with_water(&mut rig);
    assert!(rig.hw.pump_on());

    rig.pulses(6);
    rig.run_until(t_test + 4_000);
    rig.pulses(6);
    rig.run_until_checking(t_test + 7_990, |r| {
        assert_eq!(r.app.state(), StateId::Testing);
        assert!(r.hw.pump_on());
    });

    rig.run_until(t_test + 8_000);
    assert_eq!(rig.app.state(), StateId::Running);
    assert!(rig.hw.pump_on());
    assert_eq!(rig.sink.entered_at(StateId::Running), Some(t_test + 8_000));

    let first_on = rig
        .hw
        .calls
        .iter()
        .position(|c| *c == ActuatorCall::SetPump(true))
        .unwrap();
    assert!(
        !rig.hw.calls[first_on..].contains(&ActuatorCall::SetPump(false)),
        "relay released between Testing and Running"
    );
}

#[test]
fn running_reports_flow_and_stops_on_request_drop() {
    let mut rig = Rig::idle();
    let t_test = request_with_water(&mut rig);
    rig.pulses(20);
    rig.run_until(t_test + 8_000);
    assert_eq!(rig.app.state(), StateId::Running);

    // 450 pulses/L: 30 pulses per second is 4 L/min.
    for second in 1..=3 {
        rig.pulses(30);
        rig.run_until(t_test + 8_000 + second * 1_000);
    }
    let samples: Vec<_> = rig
        .sink
        .events
        .iter()
        .filter_map(|(_, e)| match e {
            AppEvent::FlowSample {
                pulses,
                litres_per_min,
            } => Some((*pulses, *litres_per_min)),
            _ => None,
        })
        .collect();
    assert_eq!(samples.len(), 3);
    for (pulses, lpm) in samples {
        assert_eq!(pulses, 30);
        assert!((lpm - 4.0).abs() < 1e-3);
    }
    assert!((rig.app.status_report().litres_per_min - 4.0).abs() < 1e-3);

    rig.hw.inputs.pump_request = false;
    let t_stop = settles_at(&rig);
    rig.run_until(t_stop);
    assert_eq!(rig.app.state(), StateId::Idle);
    assert!(!rig.hw.pump_on());
    assert_eq!(rig.app.status_report().litres_per_min, 0.0);
}

// ── Pump: verification failures ───────────────────────────────

#[test]
fn dry_test_locks_out_then_retries_after_lockout() {
    let mut config = SystemConfig::default();
    config.lockout_duration_ms = 60_000;
    let mut rig = Rig::new(config);
    rig.run_until(3_000);
    let t_test = request_with_water(&mut rig);

    rig.pulses(9);
    rig.run_until(t_test + 8_000);
    assert_eq!(rig.app.state(), StateId::LockedOut);
    assert!(!rig.hw.pump_on());
    assert_eq!(
        rig.sink.count(|e| *e
            == AppEvent::LockoutEntered(LockoutCause::NoFlowDuringTest { pulses: 9 })),
        1
    );

    // Request stays asserted: nothing happens until the lockout expires.
    let t_lock = t_test + 8_000;
    rig.run_until_checking(t_lock + 59_990, |r| {
        assert_eq!(r.app.state(), StateId::LockedOut);
        assert!(!r.hw.pump_on());
    });
    rig.run_until(t_lock + 60_000);
    assert_eq!(rig.app.state(), StateId::Idle);
    rig.run_until(t_lock + 60_010);
    assert_eq!(rig.app.state(), StateId::Testing);
}

#[test]
fn flow_loss_while_running_locks_out_with_pump_released() {
    let mut rig = Rig::idle();
    let t_test = request_with_water(&mut rig);
    rig.pulses(15);
    rig.run_until(t_test + 8_000);
    assert_eq!(rig.app.state(), StateId::Running);

    let t_run = rig.now_ms;
    rig.run_until_checking(t_run + 15_000, |r| {
        if !r.app.state().permits_pump() {
            assert!(!r.hw.pump_on(), "relay on in {:?}", r.app.state());
        }
    });
    assert_eq!(rig.app.state(), StateId::LockedOut);
    let locked = rig.sink.entered_at(StateId::LockedOut).unwrap();
    assert!(locked > t_run + 10_000, "watchdog fired early at {locked}");
    assert!(locked <= t_run + 11_000);
    assert_eq!(
        rig.sink
            .count(|e| *e == AppEvent::LockoutEntered(LockoutCause::FlowLostWhileRunning)),
        1
    );
}

// ── Pump: water pre-check ─────────────────────────────────────

#[test]
fn missing_water_waits_with_intermittent_alarm_until_request_drops() {
    let mut rig = Rig::idle();
    rig.hw.inputs.pump_request = true;
    let t_wait = settles_at(&rig);
    rig.run_until(t_wait);
    assert_eq!(rig.app.state(), StateId::WaitingForWater);
    assert!(rig.app.intermittent_alarm_active());
    assert_eq!(rig.hw.tone(), ToneCommand::Pulsed(750));
    assert!(!rig.hw.pump_on());

    // De-asserted so that the debounced edge lands 5 s after entry.
    rig.run_until(t_wait + 5_000 - STEP_MS - rig.debounce_ms());
    rig.hw.inputs.pump_request = false;
    rig.run_until(t_wait + 5_000);
    assert_eq!(rig.app.state(), StateId::Idle);
    assert!(!rig.app.intermittent_alarm_active());
    assert_eq!(rig.hw.tone(), ToneCommand::Silence);

    // Beeps started at +0, +2000 and +4000.
    let beeps = rig
        .hw
        .tone_writes()
        .into_iter()
        .filter(|t| matches!(t, ToneCommand::Pulsed(_)))
        .count();
    assert_eq!(beeps, 3);
}

#[test]
fn water_arriving_reruns_precheck_through_idle() {
    let mut rig = Rig::idle();
    rig.hw.inputs.pump_request = true;
    rig.run_until(settles_at(&rig));
    assert_eq!(rig.app.state(), StateId::WaitingForWater);

    rig.hw.inputs.water_present = true;
    let t_water = settles_at(&rig);
    rig.run_until(t_water);
    assert_eq!(rig.app.state(), StateId::Idle);
    rig.run_until(t_water + STEP_MS);
    assert_eq!(rig.app.state(), StateId::Testing);

    let path: Vec<_> = rig.sink.transitions().into_iter().map(|(_, _, to)| to).collect();
    assert_eq!(
        path,
        vec![
            StateId::Idle,
            StateId::WaitingForWater,
            StateId::Idle,
            StateId::Testing
        ]
    );
}

#[test]
fn disabled_water_check_goes_straight_to_testing() {
    let mut config = SystemConfig::default();
    config.water_presence_check_enabled = false;
    let mut rig = Rig::new(config);
    rig.run_until(3_000);
    rig.hw.inputs.pump_request = true;
    rig.run_until(settles_at(&rig));
    assert_eq!(rig.app.state(), StateId::Testing);
    assert!(rig.hw.pump_on());
}

#[test]
fn chattering_request_line_is_ignored() {
    let mut rig = Rig::idle();
    for _ in 0..100 {
        rig.hw.inputs.pump_request = !rig.hw.inputs.pump_request;
        let t = rig.now_ms + 2 * STEP_MS;
        rig.run_until(t);
        assert_eq!(rig.app.state(), StateId::Idle);
    }
    assert!(!rig.hw.pump_on());
}

// ── Hazards ───────────────────────────────────────────────────

#[test]
fn hazard_silences_pump_beep_and_beep_restarts_after_clear() {
    let mut rig = Rig::idle();
    let fire = ToneCommand::Continuous(rig.app.config().fire_tone_hz);
    rig.hw.inputs.pump_request = true;
    rig.run_until(settles_at(&rig));
    assert_eq!(rig.app.state(), StateId::WaitingForWater);
    rig.run_until(rig.now_ms + 40);
    assert_eq!(rig.hw.tone(), ToneCommand::Pulsed(750), "mid-beep");

    rig.hw.inputs.flame_detected = true;
    let t_fire = settles_at(&rig);
    rig.run_until(t_fire);
    assert_eq!(rig.app.hazard(), HazardAlarmState::Fire);
    assert_eq!(rig.hw.tone(), fire);
    assert!(rig.hw.buzzer_on());
    rig.run_until(t_fire + 500);
    assert!(!rig.hw.buzzer_on(), "buzzer off-phase");
    assert_eq!(rig.hw.tone(), fire, "speaker stays continuous");
    rig.run_until(t_fire + 2_500);
    assert!(rig.hw.buzzer_on());

    rig.run_until_checking(t_fire + 6_000, |r| {
        assert_eq!(r.hw.tone(), fire);
        assert!(r.app.intermittent_alarm_active());
    });

    rig.hw.inputs.flame_detected = false;
    let t_clear = settles_at(&rig);
    rig.run_until(t_clear);
    assert_eq!(rig.app.hazard(), HazardAlarmState::Off);
    assert_eq!(rig.hw.tone(), ToneCommand::Pulsed(750), "fresh on-phase");
    assert!(!rig.hw.buzzer_on());

    assert_eq!(
        rig.sink
            .count(|e| *e == AppEvent::HazardRaised(HazardAlarmState::Fire)),
        1
    );
    assert_eq!(rig.sink.count(|e| *e == AppEvent::HazardCleared), 1);
}

#[test]
fn gas_alarm_waits_for_sensor_warmup() {
    let mut rig = Rig::new(SystemConfig::default());
    rig.hw.inputs.lpg_level = 3_900;
    rig.hw.inputs.smoke_level = 3_100;
    rig.run_until_checking(29_990, |r| {
        assert_eq!(r.app.hazard(), HazardAlarmState::Off);
    });
    rig.run_until(30_000);
    assert_eq!(rig.app.hazard(), HazardAlarmState::Lpg);
    assert_eq!(
        rig.hw.tone(),
        ToneCommand::Continuous(rig.app.config().lpg_tone_hz)
    );
    assert_eq!(rig.sink.count(|e| *e == AppEvent::SensorWarmupComplete), 1);

    // LPG clears, smoke remains: de-escalation is a new raise.
    rig.hw.inputs.lpg_level = 100;
    rig.run_until(30_010);
    assert_eq!(rig.app.hazard(), HazardAlarmState::Smoke);
    assert_eq!(
        rig.sink
            .count(|e| *e == AppEvent::HazardRaised(HazardAlarmState::Smoke)),
        1
    );
}

#[test]
fn gas_warmup_runs_from_service_start() {
    let mut rig = Rig::started_at(SystemConfig::default(), 20_000);
    rig.hw.inputs.lpg_level = 4_000;
    rig.run_until_checking(49_990, |r| {
        assert_eq!(r.app.hazard(), HazardAlarmState::Off);
    });
    rig.run_until(50_000);
    assert_eq!(rig.app.hazard(), HazardAlarmState::Lpg);
    assert_eq!(rig.sink.entered_at(StateId::Idle), Some(23_000));
}

#[test]
fn hazard_does_not_touch_the_pump() {
    let mut rig = Rig::idle();
    let t_test = request_with_water(&mut rig);
    rig.hw.inputs.flame_detected = true;
    rig.pulses(12);
    rig.run_until(t_test + 8_000);
    assert_eq!(rig.app.hazard(), HazardAlarmState::Fire);
    assert_eq!(rig.app.state(), StateId::Running);
    assert!(rig.hw.pump_on());
}

// ── Resilience ────────────────────────────────────────────────

#[test]
fn relay_write_failures_do_not_stall_the_loop() {
    let mut rig = Rig::idle();
    rig.hw.fail_pump_writes = true;
    rig.hw.inputs.pump_request = true;
    rig.hw.inputs.water_present = true;
    rig.run_until(rig.now_ms + 8_200);
    assert_eq!(rig.app.state(), StateId::LockedOut);
    assert!(rig.app.tick_count() > 800);
}

#[test]
fn status_reports_every_two_seconds() {
    let mut rig = Rig::new(SystemConfig::default());
    rig.run_until(10_000);
    let times: Vec<u64> = rig
        .sink
        .events
        .iter()
        .filter(|(_, e)| matches!(e, AppEvent::Status(_)))
        .map(|(t, _)| *t)
        .collect();
    assert_eq!(times, vec![2_000, 4_000, 6_000, 8_000, 10_000]);
}
