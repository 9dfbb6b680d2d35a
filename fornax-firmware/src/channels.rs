//! Inter-task communication channels
//!
//! Defines the static channels, signals, and flags used for
//! communication between Embassy tasks. Tasks never call into one
//! another; everything crosses these boundaries.

use core::sync::atomic::AtomicBool;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use fornax_core::safety::SafetyStatus;
use fornax_core::shutdown::ShutdownLatch;
use fornax_core::temperature::ThermocoupleReading;
use fornax_drivers::buzzer::{BuzzerCommand, QUEUE_DEPTH};

/// Buzzer commands from the control task to the render loop.
///
/// Bounded: a full queue blocks the producer, which is the signal that
/// alerts are being issued faster than they can sound.
pub static BUZZER_QUEUE: Channel<CriticalSectionRawMutex, BuzzerCommand, QUEUE_DEPTH> =
    Channel::new();

/// Latest oven status for the UI task
pub static STATUS: Signal<CriticalSectionRawMutex, StatusSnapshot> = Signal::new();

/// Process-wide shutdown latch, set once by whichever unit dies first
/// (or by the supervisor on its behalf)
pub static SHUTDOWN: ShutdownLatch = ShutdownLatch::new();

/// Liveness flags the supervisor polls; each task stores `true` on
/// return
pub static CONTROL_EXITED: AtomicBool = AtomicBool::new(false);
pub static UI_EXITED: AtomicBool = AtomicBool::new(false);
pub static BUZZER_EXITED: AtomicBool = AtomicBool::new(false);

/// One iteration's view of the oven, published by the control task
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusSnapshot {
    pub tc1: Option<ThermocoupleReading>,
    pub tc2: Option<ThermocoupleReading>,
    /// Combined process temperature the control law sees
    pub process_c: Option<f32>,
    /// Profile setpoint, `None` once the profile has finished
    pub target_c: Option<f32>,
    /// (current step, total steps) while a profile is running
    pub profile_step: Option<(usize, usize)>,
    /// SSR duty cycle currently applied
    pub duty: f32,
    pub safety: Option<SafetyStatus>,
}
