//! KitchenGuard Firmware — Main Entry Point
//!
//! Hexagonal architecture around a single cooperative control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter        LogEventSink       MonotonicClock      │
//! │  (Input+Actuator)       (EventSink)        (now_ms)            │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Debounce · Hazard · Pump FSM · Tone arbitration       │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Flow ISR ──▶ FLOW_PULSES (atomic) ──▶ Pump FSM                │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyIOPin, Input, PinDriver, Pull};
use log::{info, warn};

use kitchenguard::adapters::hardware::HardwareAdapter;
use kitchenguard::adapters::log_sink::LogEventSink;
use kitchenguard::adapters::time::MonotonicClock;
use kitchenguard::app::service::AppService;
use kitchenguard::config::SystemConfig;
use kitchenguard::drivers::hw_init;
use kitchenguard::drivers::pump::PumpRelay;
use kitchenguard::drivers::tone::ToneDriver;
use kitchenguard::drivers::watchdog::{WATCHDOG_TIMEOUT_MS, Watchdog};
use kitchenguard::pins;
use kitchenguard::sensors::SensorHub;
use kitchenguard::sensors::flow::FLOW_PULSES;
use kitchenguard::sensors::gas::{GasKind, GasSensor};
use kitchenguard::sensors::lines::{ActiveLevel, DigitalLine};

/// Control loop period.  Must stay well under the debounce interval.
const LOOP_PERIOD_MS: u32 = 10;

type InputLine = PinDriver<'static, AnyIOPin, Input>;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  KitchenGuard v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = boot_config()?;

    // ── 3. Peripherals ────────────────────────────────────────
    hw_init::init_peripherals()?;
    hw_init::init_isr_service()?;

    let sensor_hub = SensorHub::new(
        DigitalLine::new(
            input_line(pins::PUMP_REQUEST_GPIO, Pull::Up)?,
            ActiveLevel::Low,
            "pump_request",
        ),
        DigitalLine::new(
            input_line(pins::WATER_PRESENCE_GPIO, Pull::Up)?,
            ActiveLevel::High,
            "water_presence",
        ),
        DigitalLine::new(
            input_line(pins::FLAME_GPIO, Pull::Floating)?,
            ActiveLevel::Low,
            "flame",
        ),
        GasSensor::new(GasKind::Lpg),
        GasSensor::new(GasKind::Smoke),
    );
    // SAFETY: `Peripherals` is never taken, and the relay GPIO is claimed
    // nowhere else.
    let relay_pin = unsafe { AnyIOPin::new(pins::PUMP_RELAY_GPIO) };
    let relay = PumpRelay::new(PinDriver::output(relay_pin)?, ActiveLevel::High)?;
    let mut hw = HardwareAdapter::new(sensor_hub, relay, ToneDriver::new());

    let watchdog = Watchdog::subscribe(WATCHDOG_TIMEOUT_MS);
    let clock = MonotonicClock::new();
    let mut sink = LogEventSink::new();

    // ── 4. Application core ───────────────────────────────────
    let mut app = AppService::new(config, &FLOW_PULSES);
    app.start(&mut hw, &mut sink, clock.now_ms());

    info!("System ready. Entering control loop ({}ms period).", LOOP_PERIOD_MS);

    // ── 5. Control loop ───────────────────────────────────────
    loop {
        app.tick(&mut hw, &mut sink, clock.now_ms());
        watchdog.feed();
        FreeRtos::delay_ms(LOOP_PERIOD_MS);
    }
}

/// Compiled-in defaults, optionally overridden by a JSON document baked in
/// at build time through `KITCHENGUARD_CONFIG`.
fn boot_config() -> Result<SystemConfig> {
    match option_env!("KITCHENGUARD_CONFIG") {
        Some(json) => {
            let config = SystemConfig::from_json(json)?;
            info!("Config: build-time override applied");
            Ok(config)
        }
        None => {
            let config = SystemConfig::default();
            if let Err(e) = config.validate() {
                warn!("Config: defaults rejected ({}), refusing to start", e);
                return Err(e.into());
            }
            info!("Config: compiled-in defaults");
            Ok(config)
        }
    }
}

/// Claims `gpio` from the board map as a polled input.
fn input_line(gpio: i32, pull: Pull) -> Result<InputLine> {
    // SAFETY: `Peripherals` is never taken, and each board-map GPIO is
    // claimed exactly once, here or in `hw_init`.
    let pin = unsafe { AnyIOPin::new(gpio) };
    let mut line = PinDriver::input(pin)?;
    line.set_pull(pull)?;
    Ok(line)
}
