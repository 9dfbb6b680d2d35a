//! Pluggable control seams
//!
//! The control loop is generic over three policies that are machine
//! specific: how the two thermocouple readings are combined, and how a
//! setpoint error becomes an actuator duty cycle. The loop calls
//! through these traits; the firmware decides what to install.

use crate::temperature::ThermocoupleReading;

/// Policy for combining the two hot-junction readings into the single
/// process temperature the control law sees.
pub trait ReadingMix {
    /// Combine the available readings, or `None` when no usable
    /// process temperature exists this iteration.
    fn mix(
        &mut self,
        a: Option<ThermocoupleReading>,
        b: Option<ThermocoupleReading>,
    ) -> Option<f32>;
}

/// Closed-loop control law mapping setpoint error to SSR duty cycle.
pub trait ControlLaw {
    /// Compute the duty cycle (0.0..=1.0) for this iteration.
    fn output(&mut self, setpoint_c: f32, measured_c: f32, dt_s: f32) -> f32;

    /// Discard accumulated state (integrators, filters) after a fault
    /// or a run boundary.
    fn reset(&mut self) {}
}

/// Placeholder mix: the first reading without a wiring fault wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstValidMix;

impl ReadingMix for FirstValidMix {
    fn mix(
        &mut self,
        a: Option<ThermocoupleReading>,
        b: Option<ThermocoupleReading>,
    ) -> Option<f32> {
        [a, b]
            .into_iter()
            .flatten()
            .find(ThermocoupleReading::is_valid)
            .map(|r| r.celsius())
    }
}

/// Placeholder law that keeps the heaters de-energized.
///
/// TODO: replace with a tuned PID once the target oven's thermal
/// response has been characterized.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledLaw;

impl ControlLaw for DisabledLaw {
    fn output(&mut self, _setpoint_c: f32, _measured_c: f32, _dt_s: f32) -> f32 {
        0.0
    }
}
