//! KitchenGuard firmware library.
//!
//! Exposes the control core (hazard arbitration, pump FSM, tone
//! arbitration) and its adapters for integration testing.  All
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module, so the whole core builds and tests on the host.

#![deny(unused_must_use)]

pub mod app;
pub mod audio;
pub mod config;
pub mod error;
pub mod fsm;
pub mod hazard;
pub mod pins;

pub mod adapters;
pub mod drivers;
pub mod sensors;
