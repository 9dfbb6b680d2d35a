//! Audible-alert drivers

pub mod soft_pwm;

pub use soft_pwm::{BuzzerCommand, SoftPwmBuzzer, QUEUE_DEPTH};
