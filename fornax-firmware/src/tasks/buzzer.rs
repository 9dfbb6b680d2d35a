//! Buzzer render task
//!
//! Thin wrapper that hands the buzzer pin to the soft-PWM driver and
//! lets it consume the command queue until shutdown.

use core::sync::atomic::Ordering;

use defmt::*;
use embassy_rp::gpio::Output;

use fornax_drivers::buzzer::SoftPwmBuzzer;

use crate::channels::{BUZZER_EXITED, BUZZER_QUEUE, SHUTDOWN};

/// Buzzer render task
#[embassy_executor::task]
pub async fn buzzer_task(pin: Output<'static>, freq_hz: u32) {
    info!("Buzzer task started ({} Hz)", freq_hz);

    // The pin error type is infallible on this target
    if let Ok(mut buzzer) = SoftPwmBuzzer::new(pin, freq_hz) {
        let _ = buzzer.run(BUZZER_QUEUE.receiver(), &SHUTDOWN).await;
    }

    BUZZER_EXITED.store(true, Ordering::Release);
    info!("Buzzer task exited");
}
