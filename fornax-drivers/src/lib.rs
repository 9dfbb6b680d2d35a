//! Hardware drivers for the Fornax oven controller
//!
//! Drivers are generic over `embedded-hal`/`embedded-hal-async` traits
//! so they can be exercised on the host with mock pins and buses. The
//! firmware owns the concrete transports (I2C bus, GPIO pins) and
//! passes them in; drivers hold only protocol state.

#![no_std]

pub mod buzzer;
pub mod thermocouple;
