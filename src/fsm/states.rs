//! Concrete pump state handler functions and table builder.
//!
//! Each state is defined by three plain `fn` pointers: no closures, no
//! dynamic dispatch, no heap.
//!
//! ```text
//!  STARTUP ──[delay]──▶ IDLE ◀───────────[request off / water gone]────┐
//!                        │ ▲                                            │
//!     [request, no water]│ │[request off / water back]                  │
//!                        ▼ │                                            │
//!                  WAITING_FOR_WATER                                    │
//!                                                                       │
//!  IDLE ──[request, water ok]──▶ TESTING ──[pulses ≥ threshold]──▶ RUNNING
//!                                   │                                   │
//!                          [too few pulses]                [no flow > tolerance]
//!                                   ▼                                   │
//!                               LOCKED_OUT ◀────────────────────────────┘
//!                                   │
//!                          [lockout elapsed]──▶ IDLE
//! ```
//!
//! The pump is never energized without a bounded verification window, and
//! never stays energized past a bounded gap in flow.  Missing pulses within
//! a deadline always count as failure.

use super::context::{FlowReading, FsmContext, LockoutCause, PumpCommands};
use super::{StateDescriptor, StateId};
use crate::app::events::AppEvent;
use crate::sensors::flow::litres_per_minute;
use log::{info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0 — Startup
        StateDescriptor {
            id: StateId::Startup,
            name: "Startup",
            on_enter: Some(startup_enter),
            on_exit: None,
            on_update: startup_update,
        },
        // Index 1 — Idle
        StateDescriptor {
            id: StateId::Idle,
            name: "Idle",
            on_enter: None,
            on_exit: None,
            on_update: idle_update,
        },
        // Index 2 — WaitingForWater
        StateDescriptor {
            id: StateId::WaitingForWater,
            name: "WaitingForWater",
            on_enter: Some(waiting_enter),
            on_exit: Some(waiting_exit),
            on_update: waiting_update,
        },
        // Index 3 — Testing
        StateDescriptor {
            id: StateId::Testing,
            name: "Testing",
            on_enter: Some(testing_enter),
            on_exit: None,
            on_update: testing_update,
        },
        // Index 4 — Running
        StateDescriptor {
            id: StateId::Running,
            name: "Running",
            on_enter: Some(running_enter),
            on_exit: Some(running_exit),
            on_update: running_update,
        },
        // Index 5 — LockedOut
        StateDescriptor {
            id: StateId::LockedOut,
            name: "LockedOut",
            on_enter: Some(locked_out_enter),
            on_exit: None,
            on_update: locked_out_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  STARTUP — let supply rails and sensors settle
// ═══════════════════════════════════════════════════════════════════════════

fn startup_enter(ctx: &mut FsmContext) {
    ctx.commands = PumpCommands::all_off();
    info!(
        "STARTUP: holding pump off for {}ms",
        ctx.config.startup_delay_ms
    );
}

fn startup_update(ctx: &mut FsmContext) -> Option<StateId> {
    (ctx.ms_in_state >= ctx.config.startup_delay_ms).then_some(StateId::Idle)
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE — single entry point into the verification path
// ═══════════════════════════════════════════════════════════════════════════

fn idle_update(ctx: &mut FsmContext) -> Option<StateId> {
    if !ctx.inputs.pump_request {
        return None;
    }

    if ctx.water_ok() {
        info!("IDLE: pump requested, starting flow test");
        Some(StateId::Testing)
    } else {
        warn!("IDLE: pump requested but supply pipe is dry");
        Some(StateId::WaitingForWater)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  WAITING_FOR_WATER — requested, but the pre-check failed
// ═══════════════════════════════════════════════════════════════════════════

fn waiting_enter(ctx: &mut FsmContext) {
    ctx.commands.intermittent_alarm = true;
}

fn waiting_exit(ctx: &mut FsmContext) {
    ctx.commands.intermittent_alarm = false;
}

fn waiting_update(ctx: &mut FsmContext) -> Option<StateId> {
    if !ctx.inputs.pump_request {
        info!("WAITING: request withdrawn");
        return Some(StateId::Idle);
    }

    // Back through Idle so the pre-check runs from one place.
    if ctx.inputs.water_present {
        info!("WAITING: water detected, re-checking from Idle");
        return Some(StateId::Idle);
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  TESTING — pump on, counting pulses for a fixed window
// ═══════════════════════════════════════════════════════════════════════════

fn testing_enter(ctx: &mut FsmContext) {
    ctx.flow.reset();
    ctx.commands.pump_energized = true;
    info!(
        "TESTING: pump energized, need {} pulses within {}ms",
        ctx.config.flow_pulse_threshold, ctx.config.flow_test_duration_ms
    );
}

fn testing_update(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.ms_in_state < ctx.config.flow_test_duration_ms {
        return None;
    }

    let pulses = ctx.flow.drain();
    ctx.last_flow = FlowReading {
        pulses,
        litres_per_min: litres_per_minute(
            pulses,
            ctx.ms_in_state,
            ctx.config.flow_pulses_per_litre,
        ),
    };

    if pulses >= ctx.config.flow_pulse_threshold {
        info!("TESTING: {} pulses, flow verified", pulses);
        ctx.no_flow_since = None;
        Some(StateId::Running)
    } else {
        ctx.commands.pump_energized = false;
        warn!(
            "TESTING: only {} of {} pulses, pump may be dry or jammed",
            pulses, ctx.config.flow_pulse_threshold
        );
        ctx.push_event(AppEvent::LockoutEntered(LockoutCause::NoFlowDuringTest {
            pulses,
        }));
        Some(StateId::LockedOut)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  RUNNING — verified flow, watched by the no-flow watchdog
// ═══════════════════════════════════════════════════════════════════════════

fn running_enter(ctx: &mut FsmContext) {
    // The drain that ended Testing has already zeroed the counter.
    ctx.sample_window_start_ms = ctx.now_ms;
    ctx.no_flow_since = None;
    info!("RUNNING: pump on, sampling flow every {}ms", ctx.config.flow_sample_interval_ms);
}

fn running_exit(ctx: &mut FsmContext) {
    ctx.commands.pump_energized = false;
    ctx.no_flow_since = None;
    ctx.last_flow = FlowReading::default();
}

fn running_update(ctx: &mut FsmContext) -> Option<StateId> {
    if !ctx.inputs.pump_request || !ctx.water_ok() {
        ctx.commands.pump_energized = false;
        ctx.no_flow_since = None;
        info!("RUNNING: request withdrawn or water gone, stopping pump");
        return Some(StateId::Idle);
    }

    let window = ctx.now_ms.saturating_sub(ctx.sample_window_start_ms);
    if window < ctx.config.flow_sample_interval_ms {
        return None;
    }

    let pulses = ctx.flow.drain();
    let litres_per_min = litres_per_minute(pulses, window, ctx.config.flow_pulses_per_litre);
    ctx.last_flow = FlowReading {
        pulses,
        litres_per_min,
    };
    ctx.push_event(AppEvent::FlowSample {
        pulses,
        litres_per_min,
    });

    if pulses == 0 {
        // No pulses since the window opened.
        let since = *ctx.no_flow_since.get_or_insert(ctx.sample_window_start_ms);
        ctx.sample_window_start_ms = ctx.now_ms;
        if ctx.now_ms.saturating_sub(since) > ctx.config.max_no_flow_duration_ms {
            ctx.commands.pump_energized = false;
            ctx.no_flow_since = None;
            warn!(
                "RUNNING: no flow for {}ms, locking out",
                ctx.now_ms.saturating_sub(since)
            );
            ctx.push_event(AppEvent::LockoutEntered(LockoutCause::FlowLostWhileRunning));
            return Some(StateId::LockedOut);
        }
    } else {
        ctx.no_flow_since = None;
        ctx.sample_window_start_ms = ctx.now_ms;
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  LOCKED_OUT — timed refusal after a flow failure
// ═══════════════════════════════════════════════════════════════════════════

fn locked_out_enter(ctx: &mut FsmContext) {
    ctx.commands = PumpCommands::all_off();
    warn!(
        "LOCKED_OUT: pump disabled for {}s",
        ctx.config.lockout_duration_ms / 1000
    );
}

fn locked_out_update(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.ms_in_state >= ctx.config.lockout_duration_ms {
        info!("LOCKED_OUT: lockout elapsed, returning to Idle");
        return Some(StateId::Idle);
    }
    None
}
