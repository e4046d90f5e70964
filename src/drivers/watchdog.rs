//! Task Watchdog Timer (TWDT) driver.
//!
//! Resets the board if the control loop stalls.  The main task subscribes
//! itself and feeds on every iteration.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// Default stall tolerance.  Far above one loop iteration, well below the
/// time a dry pump takes to overheat.
pub const WATCHDOG_TIMEOUT_MS: u32 = 5_000;

pub struct Watchdog {
    #[cfg(target_os = "espidf")]
    subscribed: bool,
    timeout_ms: u32,
}

impl Watchdog {
    /// Configure the TWDT and subscribe the calling task.
    pub fn subscribe(timeout_ms: u32) -> Self {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: TWDT calls are thread-safe; invoked once from the main task.
            unsafe {
                let cfg = esp_task_wdt_config_t {
                    timeout_ms,
                    idle_core_mask: 0,
                    trigger_panic: true,
                };
                let ret = esp_task_wdt_reconfigure(&cfg);
                if ret != ESP_OK {
                    log::warn!("Watchdog: reconfigure returned {} (already running?)", ret);
                }

                let subscribed = esp_task_wdt_add(core::ptr::null_mut()) == ESP_OK;
                if subscribed {
                    log::info!("Watchdog: main task subscribed ({}ms, panic)", timeout_ms);
                } else {
                    log::warn!("Watchdog: subscribe failed; running unguarded");
                }
                Self {
                    subscribed,
                    timeout_ms,
                }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            log::info!("Watchdog(sim): {}ms, no-op", timeout_ms);
            Self { timeout_ms }
        }
    }

    /// Reset the countdown.  Call once per loop iteration.
    pub fn feed(&self) {
        #[cfg(target_os = "espidf")]
        if self.subscribed {
            // SAFETY: reset of the calling task's own subscription.
            unsafe {
                esp_task_wdt_reset();
            }
        }
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }
}
