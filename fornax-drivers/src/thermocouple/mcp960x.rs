//! MCP9600/MCP9601 thermocouple EMF-to-temperature converter (I2C)
//!
//! Both parts expose the same register map: a register-select byte is
//! written first, then the register contents are read or written at
//! the width the register defines. Multi-byte registers are big-endian
//! on the wire; the temperature registers are two's-complement
//! fixed-point with a 1/16 °C LSB.
//!
//! # Measurement model
//!
//! The driver keeps the device in shutdown between measurements and
//! uses burst mode for each sample: burst mode runs the configured
//! number of conversions, raises the burst-complete status bit, and
//! stops. `read_temperature` drives that sequence and polls for the
//! completion bit with a bounded timeout.
//!
//! # Bus ownership
//!
//! The driver holds only protocol state (address, configuration,
//! identity, fault flags). The I2C bus is owned by the caller and
//! passed into each operation, so two sensors can share one bus
//! without any locking.

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;
use heapless::Vec;

use fornax_core::temperature::ThermocoupleReading;

/// MCP960x register addresses and bitfields
pub mod reg {
    /// Hot-junction temperature (16-bit two's complement, 1/16 °C)
    pub const HOT_JUNCTION: u8 = 0x00;
    /// Hot minus cold junction delta (16-bit two's complement)
    pub const DELTA_JUNCTION: u8 = 0x01;
    /// Cold-junction temperature (12-bit two's complement)
    pub const COLD_JUNCTION: u8 = 0x02;
    /// Raw ADC conversion data (18-bit two's complement)
    pub const RAW_ADC: u8 = 0x03;
    /// Status flags
    pub const STATUS: u8 = 0x04;
    /// Thermocouple type + filter coefficient
    pub const TC_CONFIG: u8 = 0x05;
    /// Resolutions, burst samples, shutdown mode
    pub const DEVICE_CONFIG: u8 = 0x06;
    /// Alert 1-4 configuration
    pub const ALERT1_CONFIG: u8 = 0x08;
    /// Alert 1-4 hysteresis (8-bit unsigned, °C)
    pub const ALERT1_HYSTERESIS: u8 = 0x0C;
    /// Alert 1-4 limit (16-bit two's complement)
    pub const ALERT1_LIMIT: u8 = 0x10;
    /// Device id byte + hardware revision nibbles
    pub const DEVICE_REVISION: u8 = 0x20;

    // STATUS bits
    pub const STATUS_ALERT1: u8 = 1 << 0;
    pub const STATUS_ALERT2: u8 = 1 << 1;
    pub const STATUS_ALERT3: u8 = 1 << 2;
    pub const STATUS_ALERT4: u8 = 1 << 3;
    pub const STATUS_OPEN_CIRCUIT: u8 = 1 << 4;
    pub const STATUS_SHORT_CIRCUIT: u8 = 1 << 5;
    pub const STATUS_TH_UPDATE: u8 = 1 << 6;
    pub const STATUS_BURST_COMPLETE: u8 = 1 << 7;

    // DEVICE_CONFIG fields
    pub const MODE_MASK: u8 = 0x03;

    // ALERTn_CONFIG bits
    pub const ALERT_ENABLE: u8 = 1 << 0;
    pub const ALERT_MODE: u8 = 1 << 1;
    pub const ALERT_POL: u8 = 1 << 2;
    pub const ALERT_DIR: u8 = 1 << 3;
    pub const ALERT_TEMP: u8 = 1 << 4;
    pub const ALERT_CLEAR: u8 = 1 << 7;
}

/// Device id byte for the MCP9600
const MCP9600_DEVICE_ID: u8 = 0x40;
/// Device id byte for the MCP9601
const MCP9601_DEVICE_ID: u8 = 0x41;

/// How long to wait for a burst conversion before giving up
pub const BURST_TIMEOUT_MS: u32 = 1000;
/// Sleep between completion polls so the bus and CPU are not hammered
const BURST_POLL_INTERVAL_MS: u32 = 1;

/// Recognized chip models
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChipModel {
    Mcp9600,
    Mcp9601,
}

impl ChipModel {
    /// Decode the id byte read from the revision register
    pub fn from_device_id(id: u8) -> Option<Self> {
        match id {
            MCP9600_DEVICE_ID => Some(Self::Mcp9600),
            MCP9601_DEVICE_ID => Some(Self::Mcp9601),
            _ => None,
        }
    }
}

/// Thermocouple junction type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TcType {
    #[default]
    K = 0b000,
    J = 0b001,
    T = 0b010,
    N = 0b011,
    S = 0b100,
    E = 0b101,
    B = 0b110,
    R = 0b111,
}

impl TcType {
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0b000 => Some(Self::K),
            0b001 => Some(Self::J),
            0b010 => Some(Self::T),
            0b011 => Some(Self::N),
            0b100 => Some(Self::S),
            0b101 => Some(Self::E),
            0b110 => Some(Self::B),
            0b111 => Some(Self::R),
            _ => None,
        }
    }

    pub fn bits(self) -> u8 {
        self as u8
    }
}

/// Thermocouple ADC measurement resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcResolution {
    #[default]
    Bits18 = 0b00,
    Bits16 = 0b01,
    Bits14 = 0b10,
    Bits12 = 0b11,
}

impl AdcResolution {
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0b00 => Some(Self::Bits18),
            0b01 => Some(Self::Bits16),
            0b10 => Some(Self::Bits14),
            0b11 => Some(Self::Bits12),
            _ => None,
        }
    }

    pub fn bits(self) -> u8 {
        self as u8
    }
}

/// Cold-junction sensing resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ColdResolution {
    /// 0.0625 °C per LSB
    #[default]
    SixteenthDegree = 0,
    /// 0.25 °C per LSB (faster conversions)
    QuarterDegree = 1,
}

impl ColdResolution {
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::SixteenthDegree),
            1 => Some(Self::QuarterDegree),
            _ => None,
        }
    }

    pub fn bits(self) -> u8 {
        self as u8
    }
}

/// Number of conversions averaged per burst
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BurstSamples {
    #[default]
    Samples1 = 0b000,
    Samples2 = 0b001,
    Samples4 = 0b010,
    Samples8 = 0b011,
    Samples16 = 0b100,
    Samples32 = 0b101,
    Samples64 = 0b110,
    Samples128 = 0b111,
}

impl BurstSamples {
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0b000 => Some(Self::Samples1),
            0b001 => Some(Self::Samples2),
            0b010 => Some(Self::Samples4),
            0b011 => Some(Self::Samples8),
            0b100 => Some(Self::Samples16),
            0b101 => Some(Self::Samples32),
            0b110 => Some(Self::Samples64),
            0b111 => Some(Self::Samples128),
            _ => None,
        }
    }

    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Conversions per burst this setting selects
    pub fn count(self) -> u16 {
        1 << (self as u8)
    }
}

/// Device operating modes (DEVICE_CONFIG bits 0-1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    Normal = 0b00,
    Shutdown = 0b01,
    Burst = 0b10,
}

impl Mode {
    pub fn bits(self) -> u8 {
        self as u8
    }
}

/// Validated sensor configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorConfig {
    pub tc_type: TcType,
    /// Digital filter coefficient, 0 (off) to 7 (maximum)
    pub filter_level: u8,
    pub adc_resolution: AdcResolution,
    pub cold_resolution: ColdResolution,
    pub burst_samples: BurstSamples,
}

/// Unvalidated sensor configuration, as it arrives from the outside
/// world (board config, UI, host tooling)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSensorConfig {
    pub tc_type: u8,
    pub filter_level: u8,
    pub adc_resolution: u8,
    pub cold_resolution: u8,
    pub burst_samples: u8,
}

/// A configuration field that was out of range and fell back to its
/// default. Carries the rejected raw value for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigFallback {
    TcType(u8),
    FilterLevel(u8),
    AdcResolution(u8),
    ColdResolution(u8),
    BurstSamples(u8),
}

fn sanitize_tc_type(raw: u8) -> (TcType, Option<ConfigFallback>) {
    match TcType::from_bits(raw) {
        Some(v) => (v, None),
        None => (TcType::default(), Some(ConfigFallback::TcType(raw))),
    }
}

fn sanitize_filter_level(raw: u8) -> (u8, Option<ConfigFallback>) {
    if raw <= 7 {
        (raw, None)
    } else {
        (0, Some(ConfigFallback::FilterLevel(raw)))
    }
}

fn sanitize_adc_resolution(raw: u8) -> (AdcResolution, Option<ConfigFallback>) {
    match AdcResolution::from_bits(raw) {
        Some(v) => (v, None),
        None => (
            AdcResolution::default(),
            Some(ConfigFallback::AdcResolution(raw)),
        ),
    }
}

fn sanitize_cold_resolution(raw: u8) -> (ColdResolution, Option<ConfigFallback>) {
    match ColdResolution::from_bits(raw) {
        Some(v) => (v, None),
        None => (
            ColdResolution::default(),
            Some(ConfigFallback::ColdResolution(raw)),
        ),
    }
}

fn sanitize_burst_samples(raw: u8) -> (BurstSamples, Option<ConfigFallback>) {
    match BurstSamples::from_bits(raw) {
        Some(v) => (v, None),
        None => (
            BurstSamples::default(),
            Some(ConfigFallback::BurstSamples(raw)),
        ),
    }
}

impl SensorConfig {
    /// Validate a raw configuration field by field.
    ///
    /// Out-of-range fields are replaced by their defaults and reported
    /// in the returned list; the configuration itself always ends up
    /// in a defined state.
    pub fn sanitize(raw: &RawSensorConfig) -> (Self, Vec<ConfigFallback, 5>) {
        let mut fallbacks = Vec::new();

        let (tc_type, f) = sanitize_tc_type(raw.tc_type);
        if let Some(f) = f {
            let _ = fallbacks.push(f);
        }
        let (filter_level, f) = sanitize_filter_level(raw.filter_level);
        if let Some(f) = f {
            let _ = fallbacks.push(f);
        }
        let (adc_resolution, f) = sanitize_adc_resolution(raw.adc_resolution);
        if let Some(f) = f {
            let _ = fallbacks.push(f);
        }
        let (cold_resolution, f) = sanitize_cold_resolution(raw.cold_resolution);
        if let Some(f) = f {
            let _ = fallbacks.push(f);
        }
        let (burst_samples, f) = sanitize_burst_samples(raw.burst_samples);
        if let Some(f) = f {
            let _ = fallbacks.push(f);
        }

        (
            Self {
                tc_type,
                filter_level,
                adc_resolution,
                cold_resolution,
                burst_samples,
            },
            fallbacks,
        )
    }

    /// TC_CONFIG register value: type in bits 4-6, filter in bits 0-2
    pub fn tc_config_byte(&self) -> u8 {
        (self.tc_type.bits() << 4) | (self.filter_level & 0x07)
    }

    /// DEVICE_CONFIG register value: cold resolution bit 7, ADC
    /// resolution bits 5-6, burst samples bits 2-4, mode bits 0-1
    pub fn device_config_byte(&self, mode: Mode) -> u8 {
        (self.cold_resolution.bits() << 7)
            | (self.adc_resolution.bits() << 5)
            | (self.burst_samples.bits() << 2)
            | mode.bits()
    }
}

/// Parsed STATUS register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status {
    pub alert1: bool,
    pub alert2: bool,
    pub alert3: bool,
    pub alert4: bool,
    /// Thermocouple disconnected (MCP9601 detects this in hardware)
    pub open_circuit: bool,
    /// Thermocouple shorted to VDD/VSS
    pub short_circuit: bool,
    /// Hot-junction register updated since last read
    pub th_update: bool,
    /// Burst conversion sequence complete
    pub burst_complete: bool,
}

impl Status {
    /// Parse from the raw STATUS register value
    pub fn from_bits(value: u8) -> Self {
        Self {
            alert1: value & reg::STATUS_ALERT1 != 0,
            alert2: value & reg::STATUS_ALERT2 != 0,
            alert3: value & reg::STATUS_ALERT3 != 0,
            alert4: value & reg::STATUS_ALERT4 != 0,
            open_circuit: value & reg::STATUS_OPEN_CIRCUIT != 0,
            short_circuit: value & reg::STATUS_SHORT_CIRCUIT != 0,
            th_update: value & reg::STATUS_TH_UPDATE != 0,
            burst_complete: value & reg::STATUS_BURST_COMPLETE != 0,
        }
    }

    /// Check if a wiring fault is present
    pub fn has_fault(&self) -> bool {
        self.open_circuit || self.short_circuit
    }
}

/// One of the four programmable temperature alerts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Alert {
    Alert1,
    Alert2,
    Alert3,
    Alert4,
}

impl Alert {
    fn index(self) -> u8 {
        match self {
            Self::Alert1 => 0,
            Self::Alert2 => 1,
            Self::Alert3 => 2,
            Self::Alert4 => 3,
        }
    }

    fn config_reg(self) -> u8 {
        reg::ALERT1_CONFIG + self.index()
    }

    fn hysteresis_reg(self) -> u8 {
        reg::ALERT1_HYSTERESIS + self.index()
    }

    fn limit_reg(self) -> u8 {
        reg::ALERT1_LIMIT + self.index()
    }
}

/// Configuration for one alert output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlertConfig {
    /// Enable the alert output
    pub enable: bool,
    /// Interrupt mode (latched, cleared by `clear_interrupt`) instead
    /// of comparator mode
    pub interrupt_mode: bool,
    /// Alert pin is active-high
    pub active_high: bool,
    /// Trigger while temperature rises through the limit (falling
    /// otherwise)
    pub rising: bool,
    /// Monitor the cold junction instead of the hot junction
    pub monitor_cold_junction: bool,
    /// Write-1 to clear a latched interrupt
    pub clear_interrupt: bool,
}

impl AlertConfig {
    /// ALERTn_CONFIG register value
    pub fn bits(&self) -> u8 {
        let mut value = 0;
        if self.enable {
            value |= reg::ALERT_ENABLE;
        }
        if self.interrupt_mode {
            value |= reg::ALERT_MODE;
        }
        if self.active_high {
            value |= reg::ALERT_POL;
        }
        if self.rising {
            value |= reg::ALERT_DIR;
        }
        if self.monitor_cold_junction {
            value |= reg::ALERT_TEMP;
        }
        if self.clear_interrupt {
            value |= reg::ALERT_CLEAR;
        }
        value
    }
}

/// Chip identity reported by the revision register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Identity {
    pub chip: ChipModel,
    pub rev_major: u8,
    pub rev_minor: u8,
}

/// Result of one burst measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    pub reading: ThermocoupleReading,
    /// The burst-complete flag never appeared within the timeout
    /// window; the value is whatever the device had latched. A stale
    /// sample is still preferable to stalling the control loop.
    pub stale: bool,
}

/// MCP960x communication errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mcp960xError<E> {
    /// Underlying bus transfer failed
    Bus(E),
    /// The id byte did not decode to a known chip. The device cannot
    /// be driven safely without a known register map.
    NotFound { addr: u8, id: u8 },
}

impl<E> From<E> for Mcp960xError<E> {
    fn from(e: E) -> Self {
        Self::Bus(e)
    }
}

/// Sign-extend a 12-bit two's-complement value
pub fn sign_extend_12(raw: u16) -> i16 {
    ((raw << 4) as i16) >> 4
}

/// Sign-extend an 18-bit two's-complement value
pub fn sign_extend_18(raw: u32) -> i32 {
    ((raw << 14) as i32) >> 14
}

/// MCP9600/MCP9601 driver state
pub struct Mcp960x {
    addr: u8,
    config: SensorConfig,
    chip: Option<ChipModel>,
    rev_major: u8,
    rev_minor: u8,
    open_circuit: bool,
    short_circuit: bool,
}

impl Mcp960x {
    /// Create a driver for the device at `addr` (7-bit address)
    pub fn new(addr: u8, config: SensorConfig) -> Self {
        Self {
            addr,
            config,
            chip: None,
            rev_major: 0,
            rev_minor: 0,
            open_circuit: false,
            short_circuit: false,
        }
    }

    /// 7-bit bus address
    pub fn address(&self) -> u8 {
        self.addr
    }

    /// Active configuration
    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    /// Identified chip model, if `identify` has succeeded
    pub fn chip(&self) -> Option<ChipModel> {
        self.chip
    }

    /// Hardware revision as (major, minor)
    pub fn revision(&self) -> (u8, u8) {
        (self.rev_major, self.rev_minor)
    }

    /// Last observed open-circuit flag
    pub fn open_circuit(&self) -> bool {
        self.open_circuit
    }

    /// Last observed short-circuit flag
    pub fn short_circuit(&self) -> bool {
        self.short_circuit
    }

    /// Probe and configure the device: `identify` then `configure`.
    ///
    /// An unknown id byte aborts before anything is written.
    pub async fn init<B: I2c>(&mut self, bus: &mut B) -> Result<Identity, Mcp960xError<B::Error>> {
        let identity = self.identify(bus).await?;
        self.configure(bus).await?;
        Ok(identity)
    }

    /// Read the revision register and verify the chip id.
    pub async fn identify<B: I2c>(
        &mut self,
        bus: &mut B,
    ) -> Result<Identity, Mcp960xError<B::Error>> {
        let rev: [u8; 2] = self.read_reg(bus, reg::DEVICE_REVISION).await?;

        let chip = ChipModel::from_device_id(rev[0]).ok_or(Mcp960xError::NotFound {
            addr: self.addr,
            id: rev[0],
        })?;

        self.chip = Some(chip);
        self.rev_major = rev[1] >> 4;
        self.rev_minor = rev[1] & 0x0F;

        Ok(Identity {
            chip,
            rev_major: self.rev_major,
            rev_minor: self.rev_minor,
        })
    }

    /// Write the packed configuration registers and leave the device
    /// in shutdown mode.
    pub async fn configure<B: I2c>(&mut self, bus: &mut B) -> Result<(), Mcp960xError<B::Error>> {
        self.write_reg(bus, reg::TC_CONFIG, &[self.config.tc_config_byte()])
            .await?;
        self.write_reg(
            bus,
            reg::DEVICE_CONFIG,
            &[self.config.device_config_byte(Mode::Shutdown)],
        )
        .await?;
        Ok(())
    }

    /// Run one burst conversion and read the hot-junction temperature.
    ///
    /// Switches the device to burst mode, clears the status register,
    /// polls for the burst-complete bit (sleeping between polls) until
    /// [`BURST_TIMEOUT_MS`] elapses, then restores shutdown mode and
    /// reads the latched hot-junction register. A timeout is reported
    /// through [`Measurement::stale`], not as an error.
    pub async fn read_temperature<B: I2c, D: DelayNs>(
        &mut self,
        bus: &mut B,
        delay: &mut D,
    ) -> Result<Measurement, Mcp960xError<B::Error>> {
        self.set_mode(bus, Mode::Burst).await?;
        self.write_reg(bus, reg::STATUS, &[0x00]).await?;

        let mut waited_ms = 0u32;
        let stale = loop {
            let status: [u8; 1] = self.read_reg(bus, reg::STATUS).await?;
            if status[0] & reg::STATUS_BURST_COMPLETE != 0 {
                break false;
            }
            if waited_ms >= BURST_TIMEOUT_MS {
                break true;
            }
            delay.delay_ms(BURST_POLL_INTERVAL_MS).await;
            waited_ms += BURST_POLL_INTERVAL_MS;
        };

        self.set_mode(bus, Mode::Shutdown).await?;

        let data: [u8; 2] = self.read_reg(bus, reg::HOT_JUNCTION).await?;
        let temp_x16 = i16::from_be_bytes(data);

        Ok(Measurement {
            reading: ThermocoupleReading {
                temp_x16,
                open_circuit: self.open_circuit,
                short_circuit: self.short_circuit,
            },
            stale,
        })
    }

    /// Read and parse the status register, refreshing the driver's
    /// open/short-circuit flags. Does not alter conversion state.
    pub async fn update_status<B: I2c>(
        &mut self,
        bus: &mut B,
    ) -> Result<Status, Mcp960xError<B::Error>> {
        let data: [u8; 1] = self.read_reg(bus, reg::STATUS).await?;
        let status = Status::from_bits(data[0]);

        self.open_circuit = status.open_circuit;
        self.short_circuit = status.short_circuit;

        Ok(status)
    }

    /// Hot minus cold junction delta in 1/16 °C units
    pub async fn read_delta<B: I2c>(&mut self, bus: &mut B) -> Result<i16, Mcp960xError<B::Error>> {
        let data: [u8; 2] = self.read_reg(bus, reg::DELTA_JUNCTION).await?;
        Ok(i16::from_be_bytes(data))
    }

    /// Cold-junction temperature, sign-extended from its native 12-bit
    /// width, in 1/16 °C units
    pub async fn read_cold_junction<B: I2c>(
        &mut self,
        bus: &mut B,
    ) -> Result<i16, Mcp960xError<B::Error>> {
        let data: [u8; 2] = self.read_reg(bus, reg::COLD_JUNCTION).await?;
        let raw = u16::from_be_bytes(data) & 0x0FFF;
        Ok(sign_extend_12(raw))
    }

    /// Raw thermocouple ADC conversion, sign-extended from its native
    /// 18-bit width
    pub async fn read_raw_adc<B: I2c>(
        &mut self,
        bus: &mut B,
    ) -> Result<i32, Mcp960xError<B::Error>> {
        let data: [u8; 3] = self.read_reg(bus, reg::RAW_ADC).await?;
        let raw = ((data[0] as u32) << 16 | (data[1] as u32) << 8 | data[2] as u32) & 0x3_FFFF;
        Ok(sign_extend_18(raw))
    }

    /// Program one alert: limit first, then hysteresis, then the
    /// config byte so the alert arms against settled thresholds.
    ///
    /// `limit_x16` is in 1/16 °C units; the device ignores the low two
    /// bits (alerts compare in 0.25 °C steps).
    pub async fn configure_alert<B: I2c>(
        &mut self,
        bus: &mut B,
        alert: Alert,
        config: AlertConfig,
        hysteresis_c: u8,
        limit_x16: i16,
    ) -> Result<(), Mcp960xError<B::Error>> {
        self.write_reg(bus, alert.limit_reg(), &limit_x16.to_be_bytes())
            .await?;
        self.write_reg(bus, alert.hysteresis_reg(), &[hysteresis_c])
            .await?;
        self.write_reg(bus, alert.config_reg(), &[config.bits()])
            .await?;
        Ok(())
    }

    /// Switch operating mode, preserving the other DEVICE_CONFIG
    /// fields via read-modify-write.
    async fn set_mode<B: I2c>(
        &mut self,
        bus: &mut B,
        mode: Mode,
    ) -> Result<(), Mcp960xError<B::Error>> {
        let current: [u8; 1] = self.read_reg(bus, reg::DEVICE_CONFIG).await?;
        let next = (current[0] & !reg::MODE_MASK) | mode.bits();
        self.write_reg(bus, reg::DEVICE_CONFIG, &[next]).await
    }

    /// Register read: select the register, then read `N` bytes
    async fn read_reg<B: I2c, const N: usize>(
        &self,
        bus: &mut B,
        register: u8,
    ) -> Result<[u8; N], Mcp960xError<B::Error>> {
        let mut data = [0u8; N];
        bus.write_read(self.addr, &[register], &mut data).await?;
        Ok(data)
    }

    /// Register write: register-select byte plus payload in one
    /// transaction
    async fn write_reg<B: I2c>(
        &self,
        bus: &mut B,
        register: u8,
        data: &[u8],
    ) -> Result<(), Mcp960xError<B::Error>> {
        let mut buf = [0u8; 3];
        buf[0] = register;
        buf[1..1 + data.len()].copy_from_slice(data);
        bus.write(self.addr, &buf[..1 + data.len()]).await?;
        Ok(())
    }
}
