//! Peripheral abstraction layer
//!
//! Provides the addressable-bus abstraction consumed by the firmware's port
//! layer. Wraps `embedded-hal` I2C with bus-speed configuration and a single
//! error vocabulary.

use embedded_hal::i2c::{Error as _, ErrorKind};

/// Addressable (I2C) bus abstraction
pub trait I2cPeripheral {
    /// Write to device
    fn write(
        &mut self,
        address: u8,
        data: &[u8],
    ) -> impl core::future::Future<Output = Result<(), BusError>>;

    /// Read from device
    fn read(
        &mut self,
        address: u8,
        buffer: &mut [u8],
    ) -> impl core::future::Future<Output = Result<(), BusError>>;

    /// Write then read (repeated start)
    fn write_read(
        &mut self,
        address: u8,
        write: &[u8],
        read: &mut [u8],
    ) -> impl core::future::Future<Output = Result<(), BusError>>;

    /// Configure I2C speed
    fn configure(&mut self, config: I2cConfig) -> Result<(), BusError>;
}

/// I2C configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cConfig {
    /// Clock frequency in Hz
    pub frequency: u32,
}

/// A failed bus transaction.
///
/// Always transient from the firmware's point of view: the owning task logs
/// it and retries after a back-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// Device did not acknowledge its address or a data byte
    Nack,
    /// Arbitration loss, bus fault or controller error
    Bus,
    /// Device returned data with a bad checksum
    Crc,
    /// Device returned data outside its documented range
    InvalidData,
}

impl From<ErrorKind> for BusError {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::NoAcknowledge(_) => Self::Nack,
            _ => Self::Bus,
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BusError {}

impl core::fmt::Display for BusError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Nack => write!(f, "Bus device did not acknowledge"),
            Self::Bus => write!(f, "Bus transaction failed"),
            Self::Crc => write!(f, "Bus device returned bad checksum"),
            Self::InvalidData => write!(f, "Bus device returned invalid data"),
        }
    }
}

/// Adapter turning any blocking `embedded-hal` I2C driver into an
/// [`I2cPeripheral`].
///
/// `embedded-hal` has no clock-control method, so the configured frequency
/// is only recorded; HAL drivers take their real clock at construction.
pub struct EhI2c<I> {
    inner: I,
    frequency: u32,
}

impl<I> EhI2c<I> {
    /// Wrap a HAL driver already running at `frequency` Hz.
    pub fn new(inner: I, frequency: u32) -> Self {
        Self { inner, frequency }
    }

    /// Last configured bus clock.
    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    /// Give the wrapped driver back.
    pub fn release(self) -> I {
        self.inner
    }
}

impl<I: embedded_hal::i2c::I2c> I2cPeripheral for EhI2c<I> {
    async fn write(&mut self, address: u8, data: &[u8]) -> Result<(), BusError> {
        self.inner
            .write(address, data)
            .map_err(|e| BusError::from(e.kind()))
    }

    async fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), BusError> {
        self.inner
            .read(address, buffer)
            .map_err(|e| BusError::from(e.kind()))
    }

    async fn write_read(
        &mut self,
        address: u8,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<(), BusError> {
        self.inner
            .write_read(address, write, read)
            .map_err(|e| BusError::from(e.kind()))
    }

    fn configure(&mut self, config: I2cConfig) -> Result<(), BusError> {
        self.frequency = config.frequency;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::NoAcknowledgeSource;

    #[test]
    fn nack_kinds_map_to_nack() {
        let kind = ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address);
        assert_eq!(BusError::from(kind), BusError::Nack);
        assert_eq!(BusError::from(ErrorKind::ArbitrationLoss), BusError::Bus);
    }
}
