//! Thermocouple sensor drivers

pub mod mcp960x;

pub use mcp960x::{
    ChipModel, ConfigFallback, Identity, Mcp960x, Mcp960xError, Measurement, RawSensorConfig,
    SensorConfig, Status,
};
