//! Status display task
//!
//! Stand-in for the operator-facing surface: renders each status
//! snapshot from the control loop as log lines. A richer front end
//! would consume the same snapshots.

use core::sync::atomic::Ordering;

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Timer};

use crate::channels::{SHUTDOWN, STATUS, UI_EXITED};

/// How often the task re-checks the shutdown latch while no status
/// update arrives
const LATCH_POLL: Duration = Duration::from_millis(100);

/// Status display task
#[embassy_executor::task]
pub async fn ui_task() {
    info!("UI task started");

    loop {
        if SHUTDOWN.is_set() {
            info!("Shutdown latch set, leaving UI loop");
            break;
        }

        match select(STATUS.wait(), Timer::after(LATCH_POLL)).await {
            Either::First(snapshot) => {
                info!(
                    "oven: process={:?} degC target={:?} degC step={:?} duty={} tc1={:?} tc2={:?} safety={:?}",
                    snapshot.process_c,
                    snapshot.target_c,
                    snapshot.profile_step,
                    snapshot.duty,
                    snapshot.tc1,
                    snapshot.tc2,
                    snapshot.safety,
                );
            }
            Either::Second(()) => {}
        }
    }

    UI_EXITED.store(true, Ordering::Release);
    info!("UI task exited");
}
