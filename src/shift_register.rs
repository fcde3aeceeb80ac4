/*!
  # Serial-in, parallel-out shift registers driven over GPIO

  This implementation consumes the following hardware resources:
  - A data pin presenting the next bit
  - A clock pin, every pulse shifts the data pin into the register
  - A latch pin, every pulse copies the register onto the outputs
  - A [`Delay`](crate::delay::Delay) timing the clock pulse

  The register keeps count of how many bits have been loaded since the last
  commit. The counter is the only record of that: a register that was latched
  before it was full looks no different on the pins.

  The first bit loaded ends up on the last output once latched. Use
  [`OrderedShiftRegister`](crate::ordered::OrderedShiftRegister) to pick the
  order explicitly.

  ## Example

  ```ignore
    use bitbang_peripherals::delay::TimerDelay;
    use bitbang_peripherals::shift_register::{Config, ShiftRegister, ShiftRegisterBB};

    let config = Config { capacity: 16, pulse_nanos: 500 };
    let mut register = ShiftRegisterBB::new(data, clock, latch, TimerDelay::new(tmr), config)?;

    register.clear_outputs()?;
    register.latch_value(0x0F3F)?;
  ```
*/

use crate::delay::Delay;
use embedded_hal::digital::v2::OutputPin;

/// Register size used by `Config::default()`
pub const DEFAULT_CAPACITY: usize = 8;

/// Shift register error
#[derive(Debug, Eq, PartialEq)]
pub enum Error<E> {
    /// GPIO error
    Bus(E),
    /// Every bit of the register has already been loaded
    Full,
    /// Commit needs a fully loaded register
    NotFull,
    /// Capacity must be at least one bit
    ZeroCapacity,
    /// Capacity is larger than the bit buffer can hold
    CapacityExceeded,
}

/// Shift register configuration
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Config {
    /// Register size in bits
    pub capacity: usize,
    /// Time the clock is held high and then low, in nanoseconds.
    /// Zero toggles the clock back to back.
    pub pulse_nanos: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            capacity: DEFAULT_CAPACITY,
            pulse_nanos: 0,
        }
    }
}

/// Bit oriented shift register interface
pub trait ShiftRegister {
    /// Error raised by the underlying pins
    type BusError;

    /// Resize the register. Pending bits are dropped.
    fn configure(&mut self, capacity: usize) -> Result<(), Error<Self::BusError>>;

    /// Register size in bits
    fn capacity(&self) -> usize;

    /// Bits left to load before the register is full
    fn bits_remaining(&self) -> usize;

    /// Shift in one bit
    fn load(&mut self, bit: bool) -> Result<(), Error<Self::BusError>>;

    /// Latch the register content onto the outputs and start a new cycle
    fn commit(&mut self) -> Result<(), Error<Self::BusError>>;

    /// Forget the bits loaded since the last commit without latching them
    fn discard(&mut self);

    /// Has every bit been loaded?
    fn is_full(&self) -> bool {
        self.bits_remaining() == 0
    }

    /// Drive every output low
    fn clear_outputs(&mut self) -> Result<(), Error<Self::BusError>> {
        self.latch_value(0)
    }

    /// Load `value` least significant bit first until the register is full,
    /// then commit. Positions past bit 31 are loaded as zero.
    fn latch_value(&mut self, value: u32) -> Result<(), Error<Self::BusError>> {
        self.discard();

        let mut value = value;
        while !self.is_full() {
            if let Err(e) = self.load(value & 1 == 1) {
                self.discard();
                return Err(e);
            }
            value >>= 1;
        }
        self.commit()
    }
}

/// Bit banging shift register
pub struct ShiftRegisterBB<DATA, CLK, LATCH, D>
where
    DATA: OutputPin,
    CLK: OutputPin,
    LATCH: OutputPin,
    D: Delay,
{
    data: DATA,
    clk: CLK,
    latch: LATCH,
    delay: D,
    pulse_nanos: u32,
    capacity: usize,
    bits_remaining: usize,
}

impl<DATA, CLK, LATCH, D, E> ShiftRegisterBB<DATA, CLK, LATCH, D>
where
    DATA: OutputPin<Error = E>,
    CLK: OutputPin<Error = E>,
    LATCH: OutputPin<Error = E>,
    D: Delay,
{
    /// Create instance. Clock and latch are driven low.
    pub fn new(
        data: DATA,
        clk: CLK,
        latch: LATCH,
        delay: D,
        config: Config,
    ) -> Result<Self, Error<E>> {
        if config.capacity == 0 {
            return Err(Error::ZeroCapacity);
        }

        let mut register = ShiftRegisterBB {
            data,
            clk,
            latch,
            delay,
            pulse_nanos: config.pulse_nanos,
            capacity: config.capacity,
            bits_remaining: config.capacity,
        };
        register.clk.set_low().map_err(Error::Bus)?;
        register.latch.set_low().map_err(Error::Bus)?;

        Ok(register)
    }

    /// Release the pins and the delay
    pub fn destroy(self) -> (DATA, CLK, LATCH, D) {
        (self.data, self.clk, self.latch, self.delay)
    }

    #[inline]
    fn set_data(&mut self, bit: bool) -> Result<(), Error<E>> {
        if bit {
            self.data.set_high().map_err(Error::Bus)
        } else {
            self.data.set_low().map_err(Error::Bus)
        }
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
    fn pulse_latch(&mut self) -> Result<(), Error<E>> {
        self.latch.set_high().map_err(Error::Bus)?;
        self.latch.set_low().map_err(Error::Bus)
    }

    #[inline]
    fn wait_for_pulse(&mut self) {
        if self.pulse_nanos > 0 {
            self.delay.pause_nanos(self.pulse_nanos);
        }
    }
}

impl<DATA, CLK, LATCH, D, E> ShiftRegister for ShiftRegisterBB<DATA, CLK, LATCH, D>
where
    DATA: OutputPin<Error = E>,
    CLK: OutputPin<Error = E>,
    LATCH: OutputPin<Error = E>,
    D: Delay,
{
    type BusError = E;

    fn configure(&mut self, capacity: usize) -> Result<(), Error<E>> {
        if capacity == 0 {
            return Err(Error::ZeroCapacity);
        }
        log::debug!("shift register resized to {} bits", capacity);

        self.capacity = capacity;
        self.bits_remaining = capacity;
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn bits_remaining(&self) -> usize {
        self.bits_remaining
    }

    fn load(&mut self, bit: bool) -> Result<(), Error<E>> {
        if self.is_full() {
            return Err(Error::Full);
        }
        let remaining_before = self.bits_remaining;

        self.set_data(bit)?;
        self.pulse_clk()?;
        self.bits_remaining -= 1;

        debug_assert_eq!(self.bits_remaining, remaining_before - 1);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), Error<E>> {
        log::trace!(
            "latching {} of {} bits",
            self.capacity - self.bits_remaining,
            self.capacity
        );

        let latched = self.pulse_latch();
        self.bits_remaining = self.capacity;
        latched
    }

    fn discard(&mut self) {
        self.bits_remaining = self.capacity;
    }
}
