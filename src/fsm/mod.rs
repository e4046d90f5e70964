//! Function-pointer finite state machine engine for the pump controller.
//!
//! Classic embedded FSM pattern ported to Rust:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │  StateTable                                                    │
//! │  ┌─────────────────┬───────────┬──────────┬───────────────────┐│
//! │  │ StateId         │ on_enter  │ on_exit  │ on_update         ││
//! │  ├─────────────────┼───────────┼──────────┼───────────────────┤│
//! │  │ Startup         │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> ││
//! │  │ Idle            │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> ││
//! │  │ WaitingForWater │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> ││
//! │  │ Testing         │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> ││
//! │  │ Running         │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> ││
//! │  │ LockedOut       │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> ││
//! │  └─────────────────┴───────────┴──────────┴───────────────────┘│
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** state.
//! If it returns `Some(next_id)`, the engine runs `on_exit` for the
//! current state, then `on_enter` for the next, and updates the
//! current pointer.  All functions receive `&mut FsmContext`.
//!
//! Time is never read here.  The caller stamps `ctx.now_ms` before each
//! tick and the engine derives `ctx.ms_in_state` from the entry stamp of
//! the current state.

pub mod context;
pub mod states;

use context::FsmContext;
use log::info;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all pump states.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum StateId {
    Startup = 0,
    Idle = 1,
    WaitingForWater = 2,
    Testing = 3,
    Running = 4,
    LockedOut = 5,
}

impl StateId {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 6;

    /// Convert a `usize` index back to `StateId`.  Panics on out-of-range in
    /// debug builds; returns `LockedOut` in release (pump stays off).
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Startup,
            1 => Self::Idle,
            2 => Self::WaitingForWater,
            3 => Self::Testing,
            4 => Self::Running,
            5 => Self::LockedOut,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::LockedOut
            }
        }
    }

    /// States in which the relay may be energized.
    pub fn permits_pump(self) -> bool {
        matches!(self, Self::Testing | Self::Running)
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
/// These run exactly once on each state transition.
pub type StateActionFn = fn(&mut FsmContext);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut FsmContext) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
/// Stored in a fixed-size array: no heap, no `dyn`.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    /// Index of the currently active state.
    current: usize,
    /// Clock reading at which the current state was entered.
    state_entry_ms: u64,
}

impl Fsm {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial as usize,
            state_entry_ms: 0,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut FsmContext) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        self.state_entry_ms = ctx.now_ms;
        ctx.ms_in_state = 0;
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM by one tick at `ctx.now_ms`.
    ///
    /// 1. Refresh `ctx.ms_in_state`.
    /// 2. Call `on_update` for the current state.
    /// 3. If it returns `Some(next)`, execute the transition:
    ///    `on_exit(current)` → update pointer → `on_enter(next)`.
    pub fn tick(&mut self, ctx: &mut FsmContext) {
        ctx.ms_in_state = ctx.now_ms.saturating_sub(self.state_entry_ms);

        let next = (self.table[self.current].on_update)(ctx);

        if let Some(next_id) = next {
            self.transition(next_id, ctx);
        }
    }

    /// Force an immediate transition regardless of what `on_update` would
    /// return.  A no-op if already in `next`.
    #[cfg(test)]
    pub(crate) fn force_transition(&mut self, next: StateId, ctx: &mut FsmContext) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    /// The current state's identity.
    pub fn current_state(&self) -> StateId {
        StateId::from_index(self.current)
    }

    /// Clock reading at which the current state was entered.
    pub fn state_entry_ms(&self) -> u64 {
        self.state_entry_ms
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: StateId, ctx: &mut FsmContext) {
        let next_idx = next_id as usize;

        info!(
            "FSM transition: {} -> {} at t={}ms",
            self.table[self.current].name, self.table[next_idx].name, ctx.now_ms
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;
        self.state_entry_ms = ctx.now_ms;
        ctx.ms_in_state = 0;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
