/*!
  # Three-wire clocked serial link

  Half duplex link used by DS1302 style chips. It consumes:
  - A bidirectional data pin (I/O)
  - A clock pin (SCLK)
  - A chip enable pin (CE)
  - A [`Delay`](crate::delay::Delay) for the pulse duration

  Bytes go over the wire least significant bit first. The chip samples the
  data line on the rising clock edge while a byte is clocked in, and presents
  the next bit after the falling edge while a byte is clocked out.

  Every exchange is framed by [`ThreeWire::enable_transfer`] and
  [`ThreeWire::disable_transfer`]; [`ThreeWire::transaction`] does both and
  always releases CE, even when the exchange fails.

  ## Hardware requirements

  1. The clock must be low when CE rises. `enable_transfer` takes care of it.
  2. The data pin has to switch between output and input. Pins that cannot,
     but are wired open drain with a pull-up, can be wrapped in [`OpenDrain`].
*/

use crate::delay::Delay;
use embedded_hal::digital::v2::{InputPin, OutputPin};

/// Pulse duration used by `Config::default()`, in nanoseconds
pub const DEFAULT_PULSE_NANOS: u32 = 1_000;

/// Link error
#[derive(Debug, Eq, PartialEq)]
pub enum Error<E> {
    /// GPIO error
    Bus(E),
    /// A byte was clocked while CE was released
    TransferDisabled,
    /// Pulse duration must be longer than zero
    InvalidPulse,
}

/// Link configuration
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Config {
    /// Clock half period and pin settle time, in nanoseconds
    pub pulse_nanos: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            pulse_nanos: DEFAULT_PULSE_NANOS,
        }
    }
}

/// Data pin direction
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Direction {
    /// The chip drives the line
    Input,
    /// The host drives the line
    Output,
}

/// A pin that can be switched between input and output
pub trait Bidirectional {
    /// Error raised by the pin
    type Error;

    /// Turn the pin around
    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error>;
}

/// Open drain pin used as a bidirectional line.
///
/// Switching to input releases the line by driving it high, the external
/// pull-up then lets the other side pull it low.
pub struct OpenDrain<P> {
    pin: P,
}

impl<P> OpenDrain<P> {
    /// Wrap an open drain output pin
    pub fn new(pin: P) -> Self {
        OpenDrain { pin }
    }

    /// Release the pin
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P, E> OutputPin for OpenDrain<P>
where
    P: OutputPin<Error = E>,
{
    type Error = E;

    fn set_low(&mut self) -> Result<(), E> {
        self.pin.set_low()
    }

    fn set_high(&mut self) -> Result<(), E> {
        self.pin.set_high()
    }
}

impl<P, E> InputPin for OpenDrain<P>
where
    P: InputPin<Error = E>,
{
    type Error = E;

    fn is_high(&self) -> Result<bool, E> {
        self.pin.is_high()
    }

    fn is_low(&self) -> Result<bool, E> {
        self.pin.is_low()
    }
}

impl<P, E> Bidirectional for OpenDrain<P>
where
    P: OutputPin<Error = E>,
{
    type Error = E;

    fn set_direction(&mut self, direction: Direction) -> Result<(), E> {
        match direction {
            Direction::Input => self.pin.set_high(),
            Direction::Output => Ok(()),
        }
    }
}

/// Bit banging three-wire link
pub struct ThreeWire<DATA, CLK, CE, D>
where
    DATA: OutputPin + InputPin + Bidirectional,
    CLK: OutputPin,
    CE: OutputPin,
    D: Delay,
{
    data: DATA,
    clk: CLK,
    ce: CE,
    delay: D,
    pulse_nanos: u32,
    transfer_enabled: bool,
    direction: Option<Direction>,
}

impl<DATA, CLK, CE, D, E> ThreeWire<DATA, CLK, CE, D>
where
    DATA: OutputPin<Error = E> + InputPin<Error = E> + Bidirectional<Error = E>,
    CLK: OutputPin<Error = E>,
    CE: OutputPin<Error = E>,
    D: Delay,
{
    /// Create instance. CE is driven low.
    pub fn new(data: DATA, clk: CLK, ce: CE, delay: D, config: Config) -> Result<Self, Error<E>> {
        if config.pulse_nanos == 0 {
            return Err(Error::InvalidPulse);
        }

        let mut link = ThreeWire {
            data,
            clk,
            ce,
            delay,
            pulse_nanos: config.pulse_nanos,
            transfer_enabled: false,
            direction: None,
        };
        link.ce.set_low().map_err(Error::Bus)?;

        Ok(link)
    }

    /// Release the pins and the delay
    pub fn destroy(self) -> (DATA, CLK, CE, D) {
        (self.data, self.clk, self.ce, self.delay)
    }

    pub fn pulse_nanos(&self) -> u32 {
        self.pulse_nanos
    }

    /// Can bytes be clocked in and out?
    pub fn is_transfer_enabled(&self) -> bool {
        self.transfer_enabled
    }

    /// Current data pin direction, `None` before the first byte or after a
    /// failed switch.
    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    /// Pull the clock low, then raise CE
    pub fn enable_transfer(&mut self) -> Result<(), Error<E>> {
        self.clk.set_low().map_err(Error::Bus)?;
        self.wait_for_pulse();

        self.ce.set_high().map_err(Error::Bus)?;
        self.wait_for_pulse();

        self.transfer_enabled = true;
        Ok(())
    }

    /// Release CE.
    ///
    /// The link counts as disabled afterwards even if the pin write failed.
    pub fn disable_transfer(&mut self) -> Result<(), Error<E>> {
        let released = self.ce.set_low().map_err(Error::Bus);
        self.wait_for_pulse();

        self.transfer_enabled = false;
        released
    }

    /// Clock one byte into the chip, LSB first
    pub fn clock_in(&mut self, byte: u8) -> Result<(), Error<E>> {
        self.check_enabled()?;
        self.switch_direction(Direction::Output)?;

        let mut data_out = byte;
        for _bit in 0..8 {
            if data_out & 1 == 1 {
                self.data.set_high().map_err(Error::Bus)?;
            } else {
                self.data.set_low().map_err(Error::Bus)?;
            }
            self.wait_for_pulse();

            self.pulse_clk()?;
            data_out >>= 1;
        }

        log::trace!("clocked in {:#04x}", byte);
        Ok(())
    }

    /// Clock one byte out of the chip, LSB first
    pub fn clock_out(&mut self) -> Result<u8, Error<E>> {
        self.check_enabled()?;
        self.switch_direction(Direction::Input)?;

        let mut data_in: u8 = 0;
        for bit_offset in 0..8 {
            if self.data.is_high().map_err(Error::Bus)? {
                data_in |= 1 << bit_offset;
            }
            self.wait_for_pulse();

            self.pulse_clk()?;
        }

        log::trace!("clocked out {:#04x}", data_in);
        Ok(data_in)
    }

    /// Run `exchange` between `enable_transfer` and `disable_transfer`.
    ///
    /// CE is released whatever the outcome. The first error wins.
    pub fn transaction<T, X, F>(&mut self, exchange: F) -> Result<T, X>
    where
        F: FnOnce(&mut Self) -> Result<T, X>,
        X: From<Error<E>>,
    {
        let result = match self.enable_transfer() {
            Ok(()) => exchange(self),
            Err(e) => Err(X::from(e)),
        };
        let released = self.disable_transfer();

        let value = result?;
        released?;
        Ok(value)
    }

    #[inline]
    fn check_enabled(&self) -> Result<(), Error<E>> {
        if self.transfer_enabled {
            Ok(())
        } else {
            Err(Error::TransferDisabled)
        }
    }

    // Only called before the first bit of a byte
    #[inline]
    fn switch_direction(&mut self, direction: Direction) -> Result<(), Error<E>> {
        if self.direction == Some(direction) {
            return Ok(());
        }
        self.direction = None;
        self.data.set_direction(direction).map_err(Error::Bus)?;
        self.direction = Some(direction);
        Ok(())
    }

    #[inline]
    fn pulse_clk(&mut self) -> Result<(), Error<E>> {
        self.clk.set_high().map_err(Error::Bus)?;
        self.wait_for_pulse();

        self.clk.set_low().map_err(Error::Bus)?;
        self.wait_for_pulse();

        Ok(())
    }

    #[inline]
    fn wait_for_pulse(&mut self) {
        self.delay.pause_nanos(self.pulse_nanos);
    }
}
