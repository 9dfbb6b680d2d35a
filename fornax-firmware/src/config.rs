//! Oven configuration
//!
//! Pin assignments live in `main.rs` where the peripherals are split;
//! everything else the tasks need is collected here. Values mirror the
//! reference oven build: two MCP960x sensors on one bus, SSRs switched
//! at the control-loop rate, 4 kHz piezo buzzer.
//!
//! Persisting configuration (EEPROM, flash) is deliberately out of
//! scope; the firmware runs from these compiled-in values.

use fornax_core::profile::{Pace, Profile, Step};
use fornax_drivers::thermocouple::RawSensorConfig;

/// Control loop rate (Hz); also the SSR PWM frequency
pub const LOOP_HZ: u32 = 10;

/// Open/short status refresh cadence, in control-loop ticks
pub const STATUS_POLL_TICKS: u32 = 10;

/// Fallback starting temperature when no sensor reading is usable at
/// profile start
pub const AMBIENT_FALLBACK_C: f32 = 25.0;

/// Oven configuration handed to the control task
#[derive(Debug, Clone)]
pub struct OvenConfig {
    /// Buzzer frequency (Hz)
    pub buzzer_freq_hz: u32,
    /// I2C address of thermocouple 1
    pub tc1_addr: u8,
    /// I2C address of thermocouple 2
    pub tc2_addr: u8,
    /// Shared sensor settings, validated at startup
    pub sensors: RawSensorConfig,
}

impl Default for OvenConfig {
    fn default() -> Self {
        Self {
            buzzer_freq_hz: 4000,
            tc1_addr: 0x60,
            tc2_addr: 0x61,
            sensors: RawSensorConfig {
                tc_type: 0b000, // K-type
                filter_level: 0,
                adc_resolution: 0b01, // 16-bit
                cold_resolution: 1,   // 0.25 °C
                burst_samples: 0b000, // 1 sample
            },
        }
    }
}

/// Built-in demonstration profile: a lead-free reflow-style curve.
///
/// The control law is currently disabled, so tracking this profile
/// exercises the whole setpoint path without energizing the heaters.
pub fn default_profile() -> Profile {
    let mut profile = Profile::new();
    let steps = [
        // Preheat
        Step::Ramp {
            target_c: 150.0,
            pace: Pace::Duration(90.0),
        },
        // Soak
        Step::Hold { duration_s: 90.0 },
        // Ramp to peak
        Step::Ramp {
            target_c: 235.0,
            pace: Pace::Rate(1.5),
        },
        // Time above liquidus
        Step::Hold { duration_s: 20.0 },
        // Controlled cool-down
        Step::Ramp {
            target_c: 50.0,
            pace: Pace::Rate(2.0),
        },
    ];
    for step in steps {
        let _ = profile.add_step(step);
    }
    profile
}
