//! Safety monitor
//!
//! Tracks the e-stop input and the thermocouple wiring/overtemperature
//! conditions. The monitor only surfaces faults; the control loop owns
//! the response (which today is forcing the SSR duty to zero).

use crate::temperature::ThermocoupleReading;

/// Ceiling above which any reading is treated as a fault, regardless
/// of what the profile asks for.
pub const MAX_TEMPERATURE_C: f32 = 300.0;

/// Fault categories the monitor can raise
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultKind {
    /// The e-stop chain is open
    EmergencyStop,
    /// A thermocouple reports open or short circuit
    SensorFault,
    /// A reading exceeds [`MAX_TEMPERATURE_C`]
    OverTemperature,
}

/// Safety condition status
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SafetyStatus {
    /// All conditions normal
    Ok,
    /// Safety condition violated
    Fault(FaultKind),
}

/// Safety monitor for fault detection
#[derive(Debug, Clone, Default)]
pub struct SafetyMonitor {
    estop_active: bool,
    tc1: Option<ThermocoupleReading>,
    tc2: Option<ThermocoupleReading>,
}

impl SafetyMonitor {
    /// Create a new safety monitor
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the e-stop input state
    pub fn update_estop(&mut self, active: bool) {
        self.estop_active = active;
    }

    /// Update the latest thermocouple readings
    ///
    /// `None` means the channel produced nothing this iteration (for
    /// example a bus error); absence is not itself a fault.
    pub fn update_readings(
        &mut self,
        tc1: Option<ThermocoupleReading>,
        tc2: Option<ThermocoupleReading>,
    ) {
        self.tc1 = tc1;
        self.tc2 = tc2;
    }

    /// Check all safety conditions
    ///
    /// Returns the first fault detected, or Ok if all conditions are
    /// normal.
    pub fn check(&self) -> SafetyStatus {
        if self.estop_active {
            return SafetyStatus::Fault(FaultKind::EmergencyStop);
        }

        for reading in [&self.tc1, &self.tc2].into_iter().flatten() {
            if !reading.is_valid() {
                return SafetyStatus::Fault(FaultKind::SensorFault);
            }
            if reading.celsius() > MAX_TEMPERATURE_C {
                return SafetyStatus::Fault(FaultKind::OverTemperature);
            }
        }

        SafetyStatus::Ok
    }

    /// Whether the e-stop is currently active
    pub fn estop_active(&self) -> bool {
        self.estop_active
    }
}
