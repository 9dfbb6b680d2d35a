//! Fornax - Thermal-Process Oven Controller Firmware
//!
//! Main firmware binary for RP2040-based oven controller boards.
//!
//! Named after the Latin "fornax" (furnace) - the Roman goddess of the
//! oven, who kept bread from burning while it baked.
//!
//! The main task brings up the peripherals, spawns the control, buzzer
//! and UI units, and then acts as the supervisor: the instant either
//! long-running unit exits, it latches the shared shutdown flag, waits
//! for everything to wind down, and resets the system. Any unit dying
//! takes the whole oven down - there is no partial restart.

#![no_std]
#![no_main]

use core::sync::atomic::Ordering;

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::i2c::{self, I2c};
use embassy_rp::peripherals::I2C1;
use embassy_rp::pwm;
use embassy_time::{Duration, Timer};
use {defmt_rtt as _, panic_probe as _};

mod channels;
mod config;
mod tasks;

use channels::{BUZZER_EXITED, CONTROL_EXITED, SHUTDOWN, UI_EXITED};
use config::{OvenConfig, LOOP_HZ};

/// Supervisor liveness-poll interval
const WATCHDOG_POLL: Duration = Duration::from_millis(100);

/// SSR PWM divider/top pair: 125 MHz / 200 / 62500 = the 10 Hz loop
/// rate
const SSR_PWM_DIVIDER: u8 = 200;
const SSR_PWM_TOP: u16 = (125_000_000 / SSR_PWM_DIVIDER as u32 / LOOP_HZ) as u16 - 1;

bind_interrupts!(struct Irqs {
    I2C1_IRQ => i2c::InterruptHandler<I2C1>;
});

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Fornax firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let oven = OvenConfig::default();

    // E-stop input; the normally-closed chain holds the line high
    let estop = Input::new(p.PIN_21, Pull::Up);
    info!("Initialized e-stop input");

    // Convection fan output, off until the control task runs
    let fan = Output::new(p.PIN_26, Level::Low);
    info!("Initialized convection fan output");

    // SSR PWM, both channels at the control-loop rate, zero duty
    let mut ssr_config = pwm::Config::default();
    ssr_config.divider = SSR_PWM_DIVIDER.into();
    ssr_config.top = SSR_PWM_TOP;
    ssr_config.compare_a = 0;
    ssr_config.compare_b = 0;
    let ssr = pwm::Pwm::new_output_ab(p.PWM_SLICE7, p.PIN_14, p.PIN_15, ssr_config.clone());
    info!("Initialized SSR PWM");

    // Buzzer output pin
    let buzzer_pin = Output::new(p.PIN_27, Level::Low);

    // I2C bus shared by the two thermocouple ICs, owned by the control
    // task
    let bus = I2c::new_async(p.I2C1, p.PIN_3, p.PIN_2, Irqs, i2c::Config::default());
    info!("Initialized I2C bus");

    // Spawn tasks
    spawner
        .spawn(tasks::buzzer_task(buzzer_pin, oven.buzzer_freq_hz))
        .unwrap();
    spawner
        .spawn(tasks::control_task(bus, estop, fan, ssr, ssr_config, oven))
        .unwrap();
    spawner.spawn(tasks::ui_task()).unwrap();

    info!("All tasks spawned, firmware running");

    // Supervise: poll liveness of the control and UI units
    loop {
        Timer::after(WATCHDOG_POLL).await;

        if CONTROL_EXITED.load(Ordering::Acquire) || UI_EXITED.load(Ordering::Acquire) {
            info!("A unit has exited, shutting down the rest...");
            SHUTDOWN.set();
            break;
        }
    }

    // Wait for every unit to acknowledge the latch
    while !(CONTROL_EXITED.load(Ordering::Acquire)
        && UI_EXITED.load(Ordering::Acquire)
        && BUZZER_EXITED.load(Ordering::Acquire))
    {
        Timer::after(WATCHDOG_POLL).await;
    }

    info!("All units exited, resetting");
    cortex_m::peripheral::SCB::sys_reset();
}
