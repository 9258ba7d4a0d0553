//! Expansion-connector port layer.
//!
//! [`ExpansionPort`] owns the pad controller and the table of pin bindings.
//! A pin must appear in the board's [`PortMap`] and support the requested
//! mode; once bound it keeps that mode until it is released with
//! [`PinMode::None`]. Reapplying the mode a pin already has is a no-op.
//!
//! [`BusPort`] guards one connector's addressable bus. A [`BusDevice`] is the
//! open handle: while it lives nobody else can reach the bus, and dropping it
//! (or calling [`BusDevice::close`]) releases the bus.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use heapless::Vec;

use platform::{
    BusAssignment, BusError, GpioController, GpioNum, I2cConfig, I2cPeripheral, PinMode, PinState,
    PortMap,
};

use crate::log;

/// Most pins the binding table tracks at once.
pub const MAX_BOUND_PINS: usize = 8;

/// Largest register write (register byte included).
pub const MAX_WRITE: usize = 16;

/// Rejected pin request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PortError {
    /// Pin is not routed to any expansion connector
    UnknownPin(GpioNum),
    /// Pad cannot take the requested mode
    Unsupported(GpioNum, PinMode),
    /// Pin is already bound to a different mode
    Conflict(GpioNum, PinMode),
    /// Read/write on a pin not configured for it
    WrongMode(GpioNum, PinMode),
    /// Pad controller reported a failure
    Hardware(GpioNum),
    /// Every binding slot is taken
    TableFull(GpioNum),
}

#[cfg(feature = "std")]
impl std::error::Error for PortError {}

impl core::fmt::Display for PortError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnknownPin(pin) => write!(f, "{pin} is not on an expansion connector"),
            Self::Unsupported(pin, mode) => write!(f, "{pin} cannot be {}", mode.as_str()),
            Self::Conflict(pin, mode) => write!(f, "{pin} is already bound as {}", mode.as_str()),
            Self::WrongMode(pin, mode) => write!(f, "{pin} is not configured as {}", mode.as_str()),
            Self::Hardware(pin) => write!(f, "{pin} pad controller failure"),
            Self::TableFull(pin) => write!(f, "{pin} not bound: binding table full"),
        }
    }
}

impl embedded_hal::digital::Error for PortError {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

// ---------------------------------------------------------------------------
// GPIO
// ---------------------------------------------------------------------------

struct Bindings<G> {
    gpio: G,
    bound: Vec<(GpioNum, PinMode), MAX_BOUND_PINS>,
}

impl<G> Bindings<G> {
    fn mode(&self, pin: GpioNum) -> Option<PinMode> {
        self.bound.iter().find(|(p, _)| *p == pin).map(|(_, m)| *m)
    }

    fn unbind(&mut self, pin: GpioNum) {
        self.bound.retain(|(p, _)| *p != pin);
    }
}

/// Pin/mode arbiter for every expansion-connector pin.
pub struct ExpansionPort<G> {
    map: PortMap,
    state: BlockingMutex<CriticalSectionRawMutex, RefCell<Bindings<G>>>,
}

impl<G: GpioController> ExpansionPort<G> {
    /// Take ownership of the pad controller.
    pub fn new(gpio: G, map: PortMap) -> Self {
        Self {
            map,
            state: BlockingMutex::new(RefCell::new(Bindings {
                gpio,
                bound: Vec::new(),
            })),
        }
    }

    /// Board table this port validates against.
    pub fn map(&self) -> &PortMap {
        &self.map
    }

    /// Give the pad controller back.
    pub fn into_inner(self) -> G {
        self.state.into_inner().into_inner().gpio
    }

    /// Validate and apply `mode` on `pin`.
    pub fn configure(&self, pin: GpioNum, mode: PinMode) -> Result<(), PortError> {
        let spec = self.map.find(pin).ok_or(PortError::UnknownPin(pin))?;
        if !spec.modes.contains(mode) {
            return Err(PortError::Unsupported(pin, mode));
        }

        self.state.lock(|cell| {
            let mut state = cell.borrow_mut();
            let current = state.mode(pin);
            match (current, mode) {
                (Some(bound), _) if bound == mode => return Ok(()),
                (None, PinMode::None) => return Ok(()),
                (Some(bound), _) if mode != PinMode::None => {
                    return Err(PortError::Conflict(pin, bound));
                }
                (None, _) if state.bound.is_full() => return Err(PortError::TableFull(pin)),
                _ => {}
            }

            state
                .gpio
                .apply(pin, mode)
                .map_err(|_| PortError::Hardware(pin))?;

            if mode == PinMode::None {
                state.unbind(pin);
            } else {
                state
                    .bound
                    .push((pin, mode))
                    .map_err(|_| PortError::TableFull(pin))?;
            }
            log::debug!("{} -> {}", pin, mode.as_str());
            Ok(())
        })
    }

    /// Mode `pin` is currently bound to.
    pub fn mode(&self, pin: GpioNum) -> Option<PinMode> {
        self.state.lock(|cell| cell.borrow().mode(pin))
    }

    /// Sample an input pin.
    pub fn read(&self, pin: GpioNum) -> Result<PinState, PortError> {
        self.state.lock(|cell| {
            let mut state = cell.borrow_mut();
            if state.mode(pin) != Some(PinMode::Input) {
                return Err(PortError::WrongMode(pin, PinMode::Input));
            }
            state.gpio.level(pin).map_err(|_| PortError::Hardware(pin))
        })
    }

    /// Drive an output pin.
    pub fn write(&self, pin: GpioNum, level: PinState) -> Result<(), PortError> {
        self.state.lock(|cell| {
            let mut state = cell.borrow_mut();
            if state.mode(pin) != Some(PinMode::Output) {
                return Err(PortError::WrongMode(pin, PinMode::Output));
            }
            state
                .gpio
                .set_level(pin, level)
                .map_err(|_| PortError::Hardware(pin))
        })
    }

    /// Configure `pin` and hand out an `embedded-hal` handle for it.
    ///
    /// `mode` should be [`PinMode::Input`] or [`PinMode::Output`]; any other
    /// mode yields a handle whose reads and writes fail with
    /// [`PortError::WrongMode`].
    pub fn line(&self, pin: GpioNum, mode: PinMode) -> Result<PortLine<'_, G>, PortError> {
        self.configure(pin, mode)?;
        Ok(PortLine { port: self, pin })
    }

    /// Bind a bus's data and clock lines to [`PinMode::I2c`].
    pub fn claim_bus(&self, bus: &BusAssignment) -> Result<(), PortError> {
        self.configure(bus.sda, PinMode::I2c)?;
        self.configure(bus.scl, PinMode::I2c)
    }
}

/// One configured connector pin, usable wherever `embedded-hal` digital
/// traits are expected.
pub struct PortLine<'a, G> {
    port: &'a ExpansionPort<G>,
    pin: GpioNum,
}

impl<G> PortLine<'_, G> {
    /// Pin this handle drives or samples.
    pub fn pin(&self) -> GpioNum {
        self.pin
    }
}

impl<G> embedded_hal::digital::ErrorType for PortLine<'_, G> {
    type Error = PortError;
}

impl<G: GpioController> embedded_hal::digital::InputPin for PortLine<'_, G> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.port.read(self.pin).map(bool::from)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

impl<G: GpioController> embedded_hal::digital::OutputPin for PortLine<'_, G> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.port.write(self.pin, PinState::Low)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.port.write(self.pin, PinState::High)
    }
}

// ---------------------------------------------------------------------------
// Addressable bus
// ---------------------------------------------------------------------------

/// One connector's addressable bus with single-owner access.
pub struct BusPort<I> {
    assignment: BusAssignment,
    bus: Mutex<CriticalSectionRawMutex, I>,
}

impl<I: I2cPeripheral> BusPort<I> {
    /// Wrap a bus wired as `assignment`.
    pub fn new(bus: I, assignment: BusAssignment) -> Self {
        Self {
            assignment,
            bus: Mutex::new(bus),
        }
    }

    /// Wiring and clock limits of this bus.
    pub fn assignment(&self) -> &BusAssignment {
        &self.assignment
    }

    /// Give the bus back.
    pub fn into_inner(self) -> I {
        self.bus.into_inner()
    }

    /// Wait for exclusive ownership and open a handle to `address`.
    ///
    /// `requested_hz` is clamped to the bus ceiling; `0` selects the
    /// standard rate.
    pub async fn open(&self, address: u8, requested_hz: u32) -> Result<BusDevice<'_, I>, BusError> {
        let mut bus = self.bus.lock().await;
        let frequency = self.assignment.clamp(requested_hz);
        bus.configure(I2cConfig { frequency })?;
        Ok(BusDevice {
            bus,
            address,
            frequency,
        })
    }
}

/// Open handle to one device on a [`BusPort`].
pub struct BusDevice<'a, I> {
    bus: MutexGuard<'a, CriticalSectionRawMutex, I>,
    address: u8,
    frequency: u32,
}

impl<I: I2cPeripheral> BusDevice<'_, I> {
    /// Device address
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Bus clock this session runs at
    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    /// Read `buffer.len()` bytes starting at `register`.
    pub async fn read_register(&mut self, register: u8, buffer: &mut [u8]) -> Result<(), BusError> {
        self.bus.write_read(self.address, &[register], buffer).await
    }

    /// Write `data` starting at `register`, in one transaction.
    pub async fn write_register(&mut self, register: u8, data: &[u8]) -> Result<(), BusError> {
        let mut frame: Vec<u8, MAX_WRITE> = Vec::new();
        frame.push(register).map_err(|_| BusError::InvalidData)?;
        frame
            .extend_from_slice(data)
            .map_err(|_| BusError::InvalidData)?;
        self.bus.write(self.address, &frame).await
    }

    /// Raw write without a register prefix (command-style devices).
    pub async fn write(&mut self, data: &[u8]) -> Result<(), BusError> {
        self.bus.write(self.address, data).await
    }

    /// Raw read without a register prefix.
    pub async fn read(&mut self, buffer: &mut [u8]) -> Result<(), BusError> {
        self.bus.read(self.address, buffer).await
    }

    /// Release the bus.
    pub fn close(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::digital::{InputPin, OutputPin};
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction};
    use platform::mocks::MockGpio;
    use platform::EhI2c;

    const HAT_IO: GpioNum = GpioNum::new(26);
    const INPUT_ONLY: GpioNum = GpioNum::new(36);

    fn port() -> ExpansionPort<MockGpio> {
        ExpansionPort::new(MockGpio::new(), PortMap::STICK_C_PLUS)
    }

    #[test]
    fn configure_rejects_pins_off_the_connectors() {
        let port = port();
        assert_eq!(
            port.configure(GpioNum::new(10), PinMode::Output),
            Err(PortError::UnknownPin(GpioNum::new(10)))
        );
    }

    #[test]
    fn configure_rejects_modes_the_pad_lacks() {
        let port = port();
        assert_eq!(
            port.configure(INPUT_ONLY, PinMode::Output),
            Err(PortError::Unsupported(INPUT_ONLY, PinMode::Output))
        );
        assert_eq!(port.mode(INPUT_ONLY), None);
    }

    #[test]
    fn rebinding_requires_release_first() {
        let port = port();
        port.configure(HAT_IO, PinMode::Output).unwrap();
        assert_eq!(
            port.configure(HAT_IO, PinMode::Input),
            Err(PortError::Conflict(HAT_IO, PinMode::Output))
        );
        port.configure(HAT_IO, PinMode::None).unwrap();
        port.configure(HAT_IO, PinMode::Input).unwrap();
        assert_eq!(port.mode(HAT_IO), Some(PinMode::Input));
    }

    #[test]
    fn read_and_write_check_the_bound_mode() {
        let port = port();
        port.configure(HAT_IO, PinMode::Input).unwrap();
        assert_eq!(
            port.write(HAT_IO, PinState::High),
            Err(PortError::WrongMode(HAT_IO, PinMode::Output))
        );
        assert_eq!(port.read(HAT_IO), Ok(PinState::Low));
        assert_eq!(
            port.read(GpioNum::new(0)),
            Err(PortError::WrongMode(GpioNum::new(0), PinMode::Input))
        );
    }

    #[test]
    fn hardware_failure_leaves_pin_unbound() {
        let mut gpio = MockGpio::new();
        gpio.fail_on(HAT_IO);
        let port = ExpansionPort::new(gpio, PortMap::STICK_C_PLUS);
        assert_eq!(
            port.configure(HAT_IO, PinMode::Output),
            Err(PortError::Hardware(HAT_IO))
        );
        assert_eq!(port.mode(HAT_IO), None);
    }

    #[test]
    fn full_table_rejects_before_touching_the_pad() {
        const fn pin(n: u8) -> platform::PortPin {
            platform::PortPin {
                gpio: GpioNum::new(n),
                connector: platform::Connector::Hat,
                modes: platform::ModeSet::of(&[PinMode::Output]),
            }
        }
        static WIDE: [platform::PortPin; MAX_BOUND_PINS + 1] =
            [pin(0), pin(1), pin(2), pin(3), pin(4), pin(5), pin(6), pin(7), pin(8)];
        let map = PortMap {
            pins: &WIDE,
            ..PortMap::STICK_C_PLUS
        };

        let port = ExpansionPort::new(MockGpio::new(), map);
        for spec in WIDE.iter().take(MAX_BOUND_PINS) {
            port.configure(spec.gpio, PinMode::Output).unwrap();
        }
        let last = GpioNum::new(8);
        assert_eq!(
            port.configure(last, PinMode::Output),
            Err(PortError::TableFull(last))
        );
        assert_eq!(port.mode(last), None);

        let gpio = port.into_inner();
        assert_eq!(gpio.mode(last), None);
        assert_eq!(gpio.apply_count(), MAX_BOUND_PINS);
    }

    #[test]
    fn line_drives_output_through_the_port() {
        let port = port();
        let mut led = port.line(HAT_IO, PinMode::Output).unwrap();
        led.set_high().unwrap();
        led.set_low().unwrap();
        assert!(port.write(HAT_IO, PinState::High).is_ok());
    }

    #[test]
    fn line_samples_input_through_the_port() {
        let mut gpio = MockGpio::new();
        gpio.set_input(INPUT_ONLY, PinState::High);
        let port = ExpansionPort::new(gpio, PortMap::STICK_C_PLUS);
        let mut button = port.line(INPUT_ONLY, PinMode::Input).unwrap();
        assert!(button.is_high().unwrap());
        assert!(!button.is_low().unwrap());
    }

    #[test]
    fn claimed_bus_pins_cannot_be_reused() {
        let port = port();
        let bus = PortMap::STICK_C_PLUS.port_a_bus;
        port.claim_bus(&bus).unwrap();
        assert_eq!(
            port.configure(bus.sda, PinMode::Output),
            Err(PortError::Conflict(bus.sda, PinMode::I2c))
        );
    }

    #[tokio::test]
    async fn open_clamps_bus_speed() {
        let mock = I2cMock::new(&[]);
        let bus = BusPort::new(EhI2c::new(mock, 100_000), PortMap::STICK_C_PLUS.port_a_bus);

        let device = bus.open(0x44, 1_000_000).await.unwrap();
        assert_eq!(device.frequency(), 400_000);
        device.close();

        let device = bus.open(0x44, 0).await.unwrap();
        assert_eq!(device.frequency(), 100_000);
        device.close();

        bus.into_inner().release().done();
    }

    #[tokio::test]
    async fn register_access_uses_one_transaction() {
        let expectations = [
            Transaction::write(0x51, vec![0x02, 0x11, 0x22]),
            Transaction::write_read(0x51, vec![0x02], vec![0x11, 0x22]),
        ];
        let bus = BusPort::new(
            EhI2c::new(I2cMock::new(&expectations), 100_000),
            PortMap::STICK_C_PLUS.internal_bus,
        );

        let mut device = bus.open(0x51, 0).await.unwrap();
        device.write_register(0x02, &[0x11, 0x22]).await.unwrap();
        let mut buf = [0u8; 2];
        device.read_register(0x02, &mut buf).await.unwrap();
        device.close();
        assert_eq!(buf, [0x11, 0x22]);

        bus.into_inner().release().done();
    }

    #[tokio::test]
    async fn oversized_write_is_refused_before_the_bus() {
        let bus = BusPort::new(
            EhI2c::new(I2cMock::new(&[]), 100_000),
            PortMap::STICK_C_PLUS.internal_bus,
        );
        let mut device = bus.open(0x51, 0).await.unwrap();
        let data = [0u8; MAX_WRITE];
        assert_eq!(
            device.write_register(0x00, &data).await,
            Err(BusError::InvalidData)
        );
        device.close();
        bus.into_inner().release().done();
    }
}
