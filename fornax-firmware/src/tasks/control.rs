//! Oven control task
//!
//! The control unit: owns the I2C bus, the e-stop input, the
//! convection-fan output, and the two SSR PWM channels. Brings up both
//! thermocouple sensors (an unrecognized chip is fatal - the supervisor
//! tears the whole system down), then runs the fixed-rate loop:
//! sample, mix, advance the profile, apply the control law, publish
//! status.

use core::sync::atomic::Ordering;

use defmt::*;
use embassy_rp::gpio::{Input, Output};
use embassy_rp::i2c::{self, Async, I2c};
use embassy_rp::peripherals::I2C1;
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_time::{Delay, Duration, Instant, Ticker};

use fornax_core::control::{ControlLaw, DisabledLaw, FirstValidMix, ReadingMix};
use fornax_core::safety::{SafetyMonitor, SafetyStatus};
use fornax_core::temperature::ThermocoupleReading;
use fornax_drivers::buzzer::BuzzerCommand;
use fornax_drivers::thermocouple::{Mcp960x, Mcp960xError, SensorConfig};

use crate::channels::{StatusSnapshot, BUZZER_QUEUE, CONTROL_EXITED, SHUTDOWN, STATUS};
use crate::config::{self, OvenConfig, AMBIENT_FALLBACK_C, LOOP_HZ, STATUS_POLL_TICKS};

type Bus = I2c<'static, I2C1, Async>;
type ControlError = Mcp960xError<i2c::Error>;

/// Apply duty cycles to the two SSR channels.
///
/// The PWM slice runs at the loop rate; duty is expressed 0.0..=1.0.
fn set_duty(ssr: &mut Pwm<'static>, ssr_config: &mut PwmConfig, duty1: f32, duty2: f32) {
    ssr_config.compare_a = (duty1.clamp(0.0, 1.0) * ssr_config.top as f32) as u16;
    ssr_config.compare_b = (duty2.clamp(0.0, 1.0) * ssr_config.top as f32) as u16;
    ssr.set_config(ssr_config);
}

/// Oven control task
#[embassy_executor::task]
pub async fn control_task(
    mut bus: Bus,
    estop: Input<'static>,
    mut fan: Output<'static>,
    mut ssr: Pwm<'static>,
    mut ssr_config: PwmConfig,
    oven: OvenConfig,
) {
    info!("Control task started");

    let result = run(&mut bus, &estop, &mut fan, &mut ssr, &mut ssr_config, &oven).await;
    if let Err(e) = result {
        error!("Control task failed: {:?}", e);
    }

    // Cleanup on every exit path: heaters off, fan off
    set_duty(&mut ssr, &mut ssr_config, 0.0, 0.0);
    fan.set_low();

    CONTROL_EXITED.store(true, Ordering::Release);
    info!("Control task exited");
}

async fn run(
    bus: &mut Bus,
    estop: &Input<'static>,
    fan: &mut Output<'static>,
    ssr: &mut Pwm<'static>,
    ssr_config: &mut PwmConfig,
    oven: &OvenConfig,
) -> Result<(), ControlError> {
    let mut delay = Delay;

    // Sensor settings are shared by both channels; out-of-range fields
    // fall back to defaults with a warning rather than failing bring-up
    let (sensor_config, fallbacks) = SensorConfig::sanitize(&oven.sensors);
    for fallback in &fallbacks {
        warn!("Invalid sensor config field, using default: {:?}", fallback);
    }

    // Probe both thermocouple ICs; an unknown chip id aborts bring-up
    let mut tc1 = Mcp960x::new(oven.tc1_addr, sensor_config);
    let identity = tc1.init(bus).await?;
    info!(
        "Found a {:?} at I2C address 0x{:x} (rev {}.{})",
        identity.chip, oven.tc1_addr, identity.rev_major, identity.rev_minor
    );

    let mut tc2 = Mcp960x::new(oven.tc2_addr, sensor_config);
    let identity = tc2.init(bus).await?;
    info!(
        "Found a {:?} at I2C address 0x{:x} (rev {}.{})",
        identity.chip, oven.tc2_addr, identity.rev_major, identity.rev_minor
    );

    // Start-up chirp
    BUZZER_QUEUE.send(BuzzerCommand::beep(0.1)).await;
    BUZZER_QUEUE.send(BuzzerCommand::pause(1.0)).await;
    BUZZER_QUEUE.send(BuzzerCommand::beep(0.1)).await;

    // Convection fan runs for the whole session
    fan.set_high();

    // Control seams: placeholders until a tuned law and a validated
    // mix policy exist for the target oven
    let mut mix = FirstValidMix;
    let mut law = DisabledLaw;
    let mut monitor = SafetyMonitor::new();

    // Arm the built-in profile from the first usable reading
    let started = Instant::now();
    let mut profile = config::default_profile();
    let initial = read_channel(&mut tc1, bus, &mut delay, "tc1").await?;
    let initial_c = mix
        .mix(Some(initial), None)
        .unwrap_or(AMBIENT_FALLBACK_C);
    profile.begin(initial_c, started.elapsed().as_millis());
    info!(
        "Profile armed from {} degC, {} steps",
        initial_c,
        profile.num_steps()
    );

    info!("Loop rate is {} Hz", LOOP_HZ);
    info!("Entering main loop...");

    let mut ticker = Ticker::every(Duration::from_millis(1000 / LOOP_HZ as u64));
    let mut tick: u32 = 0;
    let dt_s = 1.0 / LOOP_HZ as f32;

    loop {
        if SHUTDOWN.is_set() {
            info!("Shutdown latch set, leaving control loop");
            break;
        }

        // E-stop chain is normally closed; an open chain reads low
        monitor.update_estop(estop.is_low());

        // Wiring faults change slowly; refresh them on a slow cadence
        if tick % STATUS_POLL_TICKS == 0 {
            let s1 = tc1.update_status(bus).await?;
            let s2 = tc2.update_status(bus).await?;
            if s1.has_fault() {
                warn!(
                    "tc1 wiring fault: open={} short={}",
                    s1.open_circuit, s1.short_circuit
                );
            }
            if s2.has_fault() {
                warn!(
                    "tc2 wiring fault: open={} short={}",
                    s2.open_circuit, s2.short_circuit
                );
            }
        }

        // Sample both hot junctions
        let r1 = read_channel(&mut tc1, bus, &mut delay, "tc1").await?;
        let r2 = read_channel(&mut tc2, bus, &mut delay, "tc2").await?;
        monitor.update_readings(Some(r1), Some(r2));
        let process_c = mix.mix(Some(r1), Some(r2));

        // Advance the profile while it runs; one completion chirp
        let mut target_c = None;
        if !profile.finished() {
            target_c = Some(profile.update(started.elapsed().as_millis()));
            if profile.finished() {
                info!("Profile complete");
                BUZZER_QUEUE.send(BuzzerCommand::beep(0.5)).await;
            }
        }

        // Any fault forces the SSRs off; otherwise the installed law
        // decides the duty
        let safety = monitor.check();
        let duty = match (safety, target_c, process_c) {
            (SafetyStatus::Ok, Some(target), Some(process)) => law.output(target, process, dt_s),
            (SafetyStatus::Fault(kind), _, _) => {
                warn!("Safety fault, SSRs forced off: {:?}", kind);
                law.reset();
                0.0
            }
            _ => 0.0,
        };
        set_duty(ssr, ssr_config, duty, duty);

        STATUS.signal(StatusSnapshot {
            tc1: Some(r1),
            tc2: Some(r2),
            process_c,
            target_c,
            profile_step: (!profile.finished())
                .then(|| (profile.step_number(), profile.num_steps())),
            duty,
            safety: Some(safety),
        });

        tick = tick.wrapping_add(1);
        ticker.next().await;
    }

    Ok(())
}

/// Burst-sample one channel, logging a stale conversion
async fn read_channel(
    sensor: &mut Mcp960x,
    bus: &mut Bus,
    delay: &mut Delay,
    label: &str,
) -> Result<ThermocoupleReading, ControlError> {
    let measurement = sensor.read_temperature(bus, delay).await?;
    if measurement.stale {
        warn!("{}: timed out waiting for conversion, using latched value", label);
    }
    Ok(measurement.reading)
}
