//! SHT3x temperature/humidity sensor (ENV II unit on Port A).

// Conversions operate on 16-bit raw words scaled into f32; nothing here can
// overflow.
#![allow(clippy::arithmetic_side_effects)]

use embassy_time::{Duration, Timer};
use platform::{BusError, I2cPeripheral};

use crate::port::BusPort;

/// Soft reset command.
pub const CMD_SOFT_RESET: [u8; 2] = [0x30, 0xA2];
/// Single shot, high repeatability, no clock stretching.
pub const CMD_MEASURE_HIGH: [u8; 2] = [0x24, 0x00];

/// Worst-case high-repeatability conversion time.
const CONVERSION_TIME: Duration = Duration::from_millis(16);
/// Time the sensor needs after a soft reset.
const RESET_TIME: Duration = Duration::from_millis(2);

/// One temperature/humidity sample.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    /// Temperature, °C
    pub temperature: f32,
    /// Relative humidity, %
    pub humidity: f32,
}

impl Measurement {
    /// Decode a 6-byte frame: T msb, T lsb, T crc, RH msb, RH lsb, RH crc.
    pub fn from_frame(frame: &[u8; 6]) -> Result<Self, BusError> {
        let [t_hi, t_lo, t_crc, h_hi, h_lo, h_crc] = *frame;
        if crc8(&[t_hi, t_lo]) != t_crc || crc8(&[h_hi, h_lo]) != h_crc {
            return Err(BusError::Crc);
        }
        let raw_t = f32::from(u16::from_be_bytes([t_hi, t_lo]));
        let raw_h = f32::from(u16::from_be_bytes([h_hi, h_lo]));
        Ok(Self {
            temperature: -45.0 + 175.0 * raw_t / 65535.0,
            humidity: 100.0 * raw_h / 65535.0,
        })
    }

    /// Temperature truncated to whole degrees.
    pub fn temperature_int(&self) -> i32 {
        self.temperature as i32
    }

    /// Humidity truncated to whole percent.
    pub fn humidity_int(&self) -> i32 {
        self.humidity as i32
    }
}

/// CRC-8 used by Sensirion sensors (poly 0x31, init 0xFF).
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc: u8 = 0xFF;
    for byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ 0x31
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// SHT3x driver.
pub struct Sht3x<'a, I> {
    bus: &'a BusPort<I>,
    address: u8,
}

impl<'a, I: I2cPeripheral> Sht3x<'a, I> {
    /// Driver for the sensor at `address` on `bus`.
    pub fn new(bus: &'a BusPort<I>, address: u8) -> Self {
        Self { bus, address }
    }

    /// Soft-reset the sensor. Boot uses this to check the sensor is present.
    pub async fn reset(&mut self) -> Result<(), BusError> {
        let mut device = self.bus.open(self.address, 0).await?;
        device.write(&CMD_SOFT_RESET).await?;
        device.close();
        Timer::after(RESET_TIME).await;
        Ok(())
    }

    /// Trigger one conversion and read it back.
    ///
    /// The bus is released while the sensor converts.
    pub async fn measure(&mut self) -> Result<Measurement, BusError> {
        let mut device = self.bus.open(self.address, 0).await?;
        device.write(&CMD_MEASURE_HIGH).await?;
        device.close();

        Timer::after(CONVERSION_TIME).await;

        let mut frame = [0u8; 6];
        let mut device = self.bus.open(self.address, 0).await?;
        device.read(&mut frame).await?;
        device.close();

        Measurement::from_frame(&frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction};
    use platform::{EhI2c, PortMap};

    #[test]
    fn crc_matches_datasheet_example() {
        assert_eq!(crc8(&[0xBE, 0xEF]), 0x92);
    }

    #[test]
    fn frame_converts_to_engineering_units() {
        // 0x6666 -> 25.0 °C, 0x8000 -> 50.0 %
        let frame = [0x66, 0x66, crc8(&[0x66, 0x66]), 0x80, 0x00, crc8(&[0x80, 0x00])];
        let m = Measurement::from_frame(&frame).unwrap();
        assert!((m.temperature - 25.0).abs() < 0.01);
        assert!((m.humidity - 50.0).abs() < 0.01);
        assert_eq!(m.temperature_int(), 25);
        assert_eq!(m.humidity_int(), 50);
    }

    #[test]
    fn bad_checksum_is_rejected() {
        let frame = [0x66, 0x66, 0x00, 0x80, 0x00, crc8(&[0x80, 0x00])];
        assert_eq!(Measurement::from_frame(&frame), Err(BusError::Crc));
    }

    #[tokio::test]
    async fn measure_issues_command_then_reads() {
        let frame = vec![0x66, 0x66, crc8(&[0x66, 0x66]), 0x80, 0x00, crc8(&[0x80, 0x00])];
        let expectations = [
            Transaction::write(0x44, CMD_MEASURE_HIGH.to_vec()),
            Transaction::read(0x44, frame),
        ];
        let bus = BusPort::new(
            EhI2c::new(I2cMock::new(&expectations), 100_000),
            PortMap::STICK_C_PLUS.port_a_bus,
        );

        let m = Sht3x::new(&bus, 0x44).measure().await.unwrap();
        assert_eq!(m.humidity_int(), 50);

        into_mock(bus).done();
    }

    #[tokio::test]
    async fn nack_surfaces_as_bus_error() {
        use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
        let expectations = [Transaction::write(0x44, CMD_SOFT_RESET.to_vec())
            .with_error(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address))];
        let bus = BusPort::new(
            EhI2c::new(I2cMock::new(&expectations), 100_000),
            PortMap::STICK_C_PLUS.port_a_bus,
        );

        assert_eq!(Sht3x::new(&bus, 0x44).reset().await, Err(BusError::Nack));
        into_mock(bus).done();
    }

    fn into_mock(bus: BusPort<EhI2c<I2cMock>>) -> I2cMock {
        bus.into_inner().release()
    }
}
