/*!
  # DS1302 style command codec

  Every exchange with the chip is one command byte followed by one data byte,
  both sent over a [`ThreeWire`] link inside a single CE frame.

  ```text
  bit  7   6      5..1      0
       1  RAM/CK  register  RD/W
  ```

  ## Example

  ```ignore
    use bitbang_peripherals::delay::TimerDelay;
    use bitbang_peripherals::ds1302::{Ds1302, RtcRegister};
    use bitbang_peripherals::three_wire::{Config, OpenDrain, ThreeWire};

    let delay = TimerDelay::new(tmr);
    let link = ThreeWire::new(OpenDrain::new(io), sclk, ce, delay, Config::default())?;
    let mut rtc = Ds1302::new(link);

    rtc.write_field(RtcRegister::Minutes, 42)?;
    let minutes = rtc.read_field(RtcRegister::Minutes)?;
  ```
*/

use crate::bcd;
use crate::delay::Delay;
use crate::three_wire::{self, Bidirectional, ThreeWire};
use core::ops::RangeInclusive;
use embedded_hal::digital::v2::{InputPin, OutputPin};

const WRITE_TO_RAM_CMD: u8 = 0b1100_0000;
const READ_FROM_RAM_CMD: u8 = 0b1100_0001;
const WRITE_TO_RTC_CMD: u8 = 0b1000_0000;
const READ_FROM_RTC_CMD: u8 = 0b1000_0001;

const REGISTER_MASK: u8 = 0x1F;

/// Number of addressable RAM registers
pub const RAM_REGISTERS: u8 = 31;

/// Command error
#[derive(Debug, Eq, PartialEq)]
pub enum Error<E> {
    /// Link error
    Link(three_wire::Error<E>),
    /// Transfer was still disabled after enabling it
    NotReady,
    /// Register index outside `0..=30`
    InvalidRegister(u8),
    /// Decimal value does not fit the register
    InvalidValue(u8),
}

impl<E> From<three_wire::Error<E>> for Error<E> {
    fn from(e: three_wire::Error<E>) -> Self {
        Error::Link(e)
    }
}

/// Register bank addressed by a command
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum RegisterClass {
    /// Battery backed scratch RAM
    Ram,
    /// Clock and calendar registers
    Rtc,
}

/// Transfer direction of a command
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Access {
    /// Host sends the data byte
    Write,
    /// Chip sends the data byte
    Read,
}

/// Command byte
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Command(u8);

impl Command {
    /// Build the command for `index` in `class`.
    ///
    /// Index 31 selects burst mode on the chip and yields `None` like any
    /// index past it.
    pub fn new(access: Access, class: RegisterClass, index: u8) -> Option<Self> {
        if index >= RAM_REGISTERS {
            return None;
        }
        let opcode = match (access, class) {
            (Access::Write, RegisterClass::Ram) => WRITE_TO_RAM_CMD,
            (Access::Read, RegisterClass::Ram) => READ_FROM_RAM_CMD,
            (Access::Write, RegisterClass::Rtc) => WRITE_TO_RTC_CMD,
            (Access::Read, RegisterClass::Rtc) => READ_FROM_RTC_CMD,
        };
        Some(Command(opcode | ((index & REGISTER_MASK) << 1)))
    }

    /// Raw byte as clocked onto the link
    pub fn bits(self) -> u8 {
        self.0
    }
}

/// Clock and calendar registers with the bits holding their BCD value
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum RtcRegister {
    Seconds,
    Minutes,
    Hours,
    Date,
    Month,
    Day,
    Year,
}

const REGISTER_MASKS: [u8; 7] = [0x7F, 0x7F, 0x3F, 0x3F, 0x1F, 0x07, 0x00];
const REGISTER_RANGES: [RangeInclusive<u8>; 7] =
    [0..=59, 0..=59, 0..=23, 1..=31, 1..=12, 1..=7, 0..=99];

impl RtcRegister {
    /// Register index on the chip
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Bits holding the BCD value; `0x00` when the whole byte is used
    pub fn mask(self) -> u8 {
        REGISTER_MASKS[self as usize]
    }

    /// Decimal values the register counts through
    pub fn range(self) -> RangeInclusive<u8> {
        REGISTER_RANGES[self as usize].clone()
    }
}

/// DS1302 driver
pub struct Ds1302<DATA, CLK, CE, D>
where
    DATA: OutputPin + InputPin + Bidirectional,
    CLK: OutputPin,
    CE: OutputPin,
    D: Delay,
{
    link: ThreeWire<DATA, CLK, CE, D>,
}

impl<DATA, CLK, CE, D, E> Ds1302<DATA, CLK, CE, D>
where
    DATA: OutputPin<Error = E> + InputPin<Error = E> + Bidirectional<Error = E>,
    CLK: OutputPin<Error = E>,
    CE: OutputPin<Error = E>,
    D: Delay,
{
    /// Create instance
    pub fn new(link: ThreeWire<DATA, CLK, CE, D>) -> Self {
        Ds1302 { link }
    }

    /// Release the link
    pub fn destroy(self) -> ThreeWire<DATA, CLK, CE, D> {
        self.link
    }

    /// Write one byte to a register
    pub fn write_to(&mut self, class: RegisterClass, index: u8, value: u8) -> Result<(), Error<E>> {
        let command =
            Command::new(Access::Write, class, index).ok_or(Error::InvalidRegister(index))?;
        self.execute_write(command, value)
    }

    /// Read one byte from a register
    pub fn read_from(&mut self, class: RegisterClass, index: u8) -> Result<u8, Error<E>> {
        let command =
            Command::new(Access::Read, class, index).ok_or(Error::InvalidRegister(index))?;
        self.execute_read(command)
    }

    /// Write one byte of scratch RAM
    pub fn write_ram(&mut self, index: u8, value: u8) -> Result<(), Error<E>> {
        self.write_to(RegisterClass::Ram, index, value)
    }

    /// Read one byte of scratch RAM
    pub fn read_ram(&mut self, index: u8) -> Result<u8, Error<E>> {
        self.read_from(RegisterClass::Ram, index)
    }

    /// Write a raw clock register
    pub fn write_rtc(&mut self, index: u8, value: u8) -> Result<(), Error<E>> {
        self.write_to(RegisterClass::Rtc, index, value)
    }

    /// Read a raw clock register
    pub fn read_rtc(&mut self, index: u8) -> Result<u8, Error<E>> {
        self.read_from(RegisterClass::Rtc, index)
    }

    /// Read a clock or calendar field as a decimal number
    pub fn read_field(&mut self, register: RtcRegister) -> Result<u8, Error<E>> {
        let raw = self.read_rtc(register.index())?;
        Ok(bcd::to_decimal(raw, register.mask()))
    }

    /// Store a decimal number in a clock or calendar field.
    ///
    /// The other bits of the register (clock halt, 12 hour mode) are written
    /// as zero.
    pub fn write_field(&mut self, register: RtcRegister, value: u8) -> Result<(), Error<E>> {
        if !register.range().contains(&value) {
            return Err(Error::InvalidValue(value));
        }
        self.write_rtc(register.index(), bcd::to_bcd(value))
    }

    fn execute_write(&mut self, command: Command, data: u8) -> Result<(), Error<E>> {
        let result = self.link.transaction(|link| {
            if !link.is_transfer_enabled() {
                return Err(Error::NotReady);
            }
            link.clock_in(command.bits())?;
            link.clock_in(data)?;
            Ok(())
        });

        if result.is_err() {
            log::debug!("command {:#04x} failed", command.bits());
        }
        result
    }

    fn execute_read(&mut self, command: Command) -> Result<u8, Error<E>> {
        let result = self.link.transaction(|link| {
            if !link.is_transfer_enabled() {
                return Err(Error::NotReady);
            }
            link.clock_in(command.bits())?;
            Ok(link.clock_out()?)
        });

        if result.is_err() {
            log::debug!("command {:#04x} failed", command.bits());
        }
        result
    }
}
