//! PCF8563 real-time clock on the internal bus.
//!
//! Time registers 0x02..=0x08 are BCD: seconds (bit 7 = voltage-low flag),
//! minutes, hours, day, weekday, month (bit 7 = century flag, set for
//! 1900-1999) and two-digit year.

// BCD digits are bounded 0..=9 and every field is range-checked, so the
// nibble arithmetic below cannot overflow.
#![allow(clippy::arithmetic_side_effects)]

use platform::{BusError, DateTime, I2cPeripheral};

use crate::port::BusPort;

/// First time register (VL_seconds).
pub const REG_SECONDS: u8 = 0x02;

const VOLTAGE_LOW: u8 = 0x80;
const CENTURY: u8 = 0x80;

/// A decoded clock read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RtcReading {
    /// Stored date and time
    pub datetime: DateTime,
    /// Supply dropped since the last write; the time may be invalid
    pub voltage_low: bool,
}

/// Two-digit BCD encoding of `value` (`0..=99`).
pub const fn to_bcd(value: u8) -> u8 {
    ((value / 10) << 4) | (value % 10)
}

/// Decode two BCD digits, rejecting nibbles above 9.
pub const fn from_bcd(bcd: u8) -> Option<u8> {
    let hi = bcd >> 4;
    let lo = bcd & 0x0F;
    if hi > 9 || lo > 9 {
        None
    } else {
        Some(hi * 10 + lo)
    }
}

/// Register image for `datetime`, starting at [`REG_SECONDS`].
pub fn encode(datetime: &DateTime) -> [u8; 7] {
    let century = if datetime.year() < 2000 { CENTURY } else { 0 };
    [
        to_bcd(datetime.second()),
        to_bcd(datetime.minute()),
        to_bcd(datetime.hour()),
        to_bcd(datetime.day()),
        datetime.weekday(),
        to_bcd(datetime.month()) | century,
        to_bcd((datetime.year() % 100) as u8),
    ]
}

/// Decode a register image read from [`REG_SECONDS`].
pub fn decode(regs: &[u8; 7]) -> Result<RtcReading, BusError> {
    let [sec, min, hour, day, _weekday, month, year] = *regs;
    let field = |raw: u8, mask: u8| from_bcd(raw & mask).ok_or(BusError::InvalidData);

    let century_base: u16 = if month & CENTURY != 0 { 1900 } else { 2000 };
    let datetime = DateTime::new(
        century_base + u16::from(field(year, 0xFF)?),
        field(month, 0x1F)?,
        field(day, 0x3F)?,
        field(hour, 0x3F)?,
        field(min, 0x7F)?,
        field(sec, 0x7F)?,
    )
    .map_err(|_| BusError::InvalidData)?;

    Ok(RtcReading {
        datetime,
        voltage_low: sec & VOLTAGE_LOW != 0,
    })
}

/// PCF8563 driver.
pub struct Pcf8563<'a, I> {
    bus: &'a BusPort<I>,
    address: u8,
}

impl<I> Clone for Pcf8563<'_, I> {
    fn clone(&self) -> Self {
        Self {
            bus: self.bus,
            address: self.address,
        }
    }
}

impl<'a, I: I2cPeripheral> Pcf8563<'a, I> {
    /// Driver for the clock at `address` on `bus`.
    pub fn new(bus: &'a BusPort<I>, address: u8) -> Self {
        Self { bus, address }
    }

    /// Read the stored time.
    pub async fn read_time(&mut self) -> Result<RtcReading, BusError> {
        let mut regs = [0u8; 7];
        let mut device = self.bus.open(self.address, 0).await?;
        device.read_register(REG_SECONDS, &mut regs).await?;
        device.close();
        decode(&regs)
    }

    /// Store `datetime` in one write transaction. Clears the voltage-low flag.
    pub async fn write_time(&mut self, datetime: &DateTime) -> Result<(), BusError> {
        let regs = encode(datetime);
        let mut device = self.bus.open(self.address, 0).await?;
        device.write_register(REG_SECONDS, &regs).await?;
        device.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction};
    use platform::{EhI2c, PortMap};

    fn leap_day() -> DateTime {
        DateTime::new(2024, 2, 29, 12, 34, 56).unwrap()
    }

    #[test]
    fn bcd_digits() {
        assert_eq!(to_bcd(59), 0x59);
        assert_eq!(from_bcd(0x59), Some(59));
        assert_eq!(from_bcd(0x5A), None);
    }

    #[test]
    fn encode_uses_bcd_and_weekday() {
        assert_eq!(
            encode(&leap_day()),
            [0x56, 0x34, 0x12, 0x29, 0x04, 0x02, 0x24]
        );
    }

    #[test]
    fn century_flag_marks_1900s() {
        let dt = DateTime::new(1999, 12, 31, 23, 59, 59).unwrap();
        let regs = encode(&dt);
        assert_eq!(regs[5], 0x80 | 0x12);
        assert_eq!(decode(&regs).unwrap().datetime, dt);
    }

    #[test]
    fn decode_masks_flags_and_reports_voltage_low() {
        let mut regs = encode(&leap_day());
        regs[0] |= 0x80;
        let reading = decode(&regs).unwrap();
        assert!(reading.voltage_low);
        assert_eq!(reading.datetime, leap_day());
    }

    #[test]
    fn decode_rejects_garbage() {
        assert_eq!(
            decode(&[0x00, 0x00, 0x00, 0x31, 0x00, 0x02, 0x23]),
            Err(BusError::InvalidData),
            "Feb 31st"
        );
        assert_eq!(
            decode(&[0x0F, 0x00, 0x00, 0x01, 0x00, 0x01, 0x23]),
            Err(BusError::InvalidData)
        );
    }

    #[tokio::test]
    async fn write_then_read_round_trip() {
        let regs = encode(&leap_day()).to_vec();
        let mut frame = vec![REG_SECONDS];
        frame.extend_from_slice(&regs);
        let expectations = [
            Transaction::write(0x51, frame),
            Transaction::write_read(0x51, vec![REG_SECONDS], regs),
        ];
        let bus = BusPort::new(
            EhI2c::new(I2cMock::new(&expectations), 100_000),
            PortMap::STICK_C_PLUS.internal_bus,
        );
        let mut rtc = Pcf8563::new(&bus, 0x51);

        rtc.write_time(&leap_day()).await.unwrap();
        let reading = rtc.read_time().await.unwrap();
        assert_eq!(reading.datetime, leap_day());
        assert!(!reading.voltage_low);

        bus.into_inner().release().done();
    }
}
