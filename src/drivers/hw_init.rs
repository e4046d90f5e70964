//! One-shot hardware peripheral initialization.
//!
//! Configures the gas-sensor ADC channels, the hazard buzzer output, the
//! speaker's LEDC timer/channel and the flow-sensor interrupt using raw
//! ESP-IDF sys calls.  Called once from `main()` before the control loop
//! starts.  The polled digital lines and the pump relay are owned by
//! `PinDriver`s built in `main` instead.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

use crate::error::ActuatorError;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
    LedcInitFailed(i32),
    IsrInstallFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::LedcInitFailed(rc) => write!(f, "LEDC timer/channel config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR install failed (rc={})", rc),
        }
    }
}

impl core::error::Error for HwInitError {}

impl From<HwInitError> for crate::error::Error {
    fn from(_: HwInitError) -> Self {
        Self::Init("peripheral bring-up failed")
    }
}

/// ADC1 channel of the MQ-6 pin.
pub const ADC1_CH_LPG: u32 = adc1_channel(crate::pins::LPG_ADC_GPIO);
/// ADC1 channel of the MQ-2 pin.
pub const ADC1_CH_SMOKE: u32 = adc1_channel(crate::pins::SMOKE_ADC_GPIO);

/// ESP32 GPIO to ADC1 channel.  Fails the build for a pin with no ADC1 input.
pub const fn adc1_channel(gpio: i32) -> u32 {
    match gpio {
        36 => 0,
        37 => 1,
        38 => 2,
        39 => 3,
        32 => 4,
        33 => 5,
        34 => 6,
        35 => 7,
        _ => panic!("GPIO is not an ADC1 input"),
    }
}

/// 50 % duty at [`crate::pins::TONE_RESOLUTION_BITS`] gives a square wave.
pub const TONE_DUTY_HALF: u32 = 1 << (crate::pins::TONE_RESOLUTION_BITS - 1);

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the control loop; single-threaded.
    unsafe {
        init_adc()?;
        init_buzzer()?;
        init_flow_input()?;
        init_ledc()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: Must be called only from the single-threaded init path or the
/// main-loop ADC read path.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    // 12 dB attenuation covers the MQ modules' 0–3.3 V swing.
    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };

    for channel in [ADC1_CH_LPG, ADC1_CH_SMOKE] {
        let ret = unsafe { adc_oneshot_config_channel(adc1_handle(), channel, &chan_cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::AdcInitFailed(ret));
        }
    }

    info!("hw_init: ADC1 configured (CH6=LPG, CH7=smoke)");
    Ok(())
}

/// One conversion on ADC1.  `None` if the driver reports an error.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> Option<u16> {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract, single-threaded main-loop access only.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return None;
    }
    Some(raw.clamp(0, 4095) as u16)
}

// ── GPIO ──────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_buzzer() -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::HAZARD_BUZZER_GPIO,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    unsafe { gpio_set_level(pins::HAZARD_BUZZER_GPIO, 0) };
    Ok(())
}

#[cfg(target_os = "espidf")]
unsafe fn init_flow_input() -> Result<(), HwInitError> {
    // GPIO12 is a strapping pin: no internal pull-up, the sensor board
    // carries its own.  Count rising edges.
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::FLOW_PULSE_GPIO,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_POSEDGE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    Ok(())
}

/// Drive the hazard buzzer line.
#[cfg(target_os = "espidf")]
pub fn buzzer_write(on: bool) -> Result<(), ActuatorError> {
    // SAFETY: pin configured as output in init_buzzer(); main loop only.
    let ret = unsafe { gpio_set_level(pins::HAZARD_BUZZER_GPIO, u32::from(on)) };
    if ret != ESP_OK as i32 {
        return Err(ActuatorError::GpioWriteFailed);
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
std::thread_local! {
    static SIM_AUDIO_FAULT: core::cell::Cell<bool> = const { core::cell::Cell::new(false) };
}

/// Make every host audio write on the calling thread fail until cleared.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_audio_fault(fail: bool) {
    SIM_AUDIO_FAULT.with(|f| f.set(fail));
}

#[cfg(not(target_os = "espidf"))]
fn sim_audio_write(err: ActuatorError) -> Result<(), ActuatorError> {
    if SIM_AUDIO_FAULT.with(|f| f.get()) { Err(err) } else { Ok(()) }
}

#[cfg(not(target_os = "espidf"))]
pub fn buzzer_write(_on: bool) -> Result<(), ActuatorError> {
    sim_audio_write(ActuatorError::GpioWriteFailed)
}

// ── LEDC tone ─────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
const TONE_TIMER: ledc_timer_t = ledc_timer_t_LEDC_TIMER_0;
#[cfg(target_os = "espidf")]
const TONE_CHANNEL: ledc_channel_t = ledc_channel_t_LEDC_CHANNEL_0;

#[cfg(target_os = "espidf")]
unsafe fn init_ledc() -> Result<(), HwInitError> {
    let timer = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: TONE_TIMER,
        duty_resolution: ledc_timer_bit_t_LEDC_TIMER_10_BIT,
        freq_hz: 1_000,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    // SAFETY: single main-task context via init_peripherals().
    let ret = unsafe { ledc_timer_config(&timer) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::LedcInitFailed(ret));
    }

    let ret = unsafe {
        ledc_channel_config(&ledc_channel_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel: TONE_CHANNEL,
            timer_sel: TONE_TIMER,
            gpio_num: pins::SPEAKER_GPIO,
            duty: 0,
            hpoint: 0,
            ..Default::default()
        })
    };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::LedcInitFailed(ret));
    }

    info!("hw_init: LEDC configured (speaker=CH0 on GPIO{})", pins::SPEAKER_GPIO);
    Ok(())
}

/// Start a square wave at `hz` on the speaker.
#[cfg(target_os = "espidf")]
pub fn tone_start(hz: u16) -> Result<(), ActuatorError> {
    // SAFETY: timer and channel configured in init_ledc(); main loop only.
    unsafe {
        if ledc_set_freq(ledc_mode_t_LEDC_LOW_SPEED_MODE, TONE_TIMER, u32::from(hz)) != ESP_OK {
            return Err(ActuatorError::ToneWriteFailed);
        }
        set_tone_duty(TONE_DUTY_HALF)
    }
}

/// Silence the speaker.
#[cfg(target_os = "espidf")]
pub fn tone_stop() -> Result<(), ActuatorError> {
    // SAFETY: as tone_start().
    unsafe { set_tone_duty(0) }
}

#[cfg(target_os = "espidf")]
unsafe fn set_tone_duty(duty: u32) -> Result<(), ActuatorError> {
    let mode = ledc_mode_t_LEDC_LOW_SPEED_MODE;
    let ok = unsafe {
        ledc_set_duty(mode, TONE_CHANNEL, duty) == ESP_OK
            && ledc_update_duty(mode, TONE_CHANNEL) == ESP_OK
    };
    if ok { Ok(()) } else { Err(ActuatorError::ToneWriteFailed) }
}

#[cfg(not(target_os = "espidf"))]
pub fn tone_start(_hz: u16) -> Result<(), ActuatorError> {
    sim_audio_write(ActuatorError::ToneWriteFailed)
}

#[cfg(not(target_os = "espidf"))]
pub fn tone_stop() -> Result<(), ActuatorError> {
    sim_audio_write(ActuatorError::ToneWriteFailed)
}

// ── GPIO ISR Service ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
use crate::sensors::flow::flow_isr_handler;

#[cfg(target_os = "espidf")]
unsafe extern "C" fn flow_gpio_isr(_arg: *mut core::ffi::c_void) {
    flow_isr_handler();
}

/// Install the per-pin GPIO ISR service and hook the flow sensor.
/// Call after init_peripherals() and before the control loop.
#[cfg(target_os = "espidf")]
pub fn init_isr_service() -> Result<(), HwInitError> {
    // SAFETY: gpio_install_isr_service is idempotent; ESP_ERR_INVALID_STATE
    // means it was already installed.  The handler only touches an atomic.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK && ret != ESP_ERR_INVALID_STATE {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        let ret = gpio_isr_handler_add(
            pins::FLOW_PULSE_GPIO,
            Some(flow_gpio_isr),
            core::ptr::null_mut(),
        );
        if ret != ESP_OK {
            return Err(HwInitError::IsrInstallFailed(ret));
        }
        gpio_intr_enable(pins::FLOW_PULSE_GPIO);
    }
    info!("hw_init: flow ISR installed on GPIO{}", pins::FLOW_PULSE_GPIO);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}
