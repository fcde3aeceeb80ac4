/*!
  # Shift register with a selectable latch order

  A plain [`ShiftRegister`] puts the first loaded bit on the last output. With
  inputs `A7..A0` shifted in `A0` first onto outputs `Q7..Q0` that gives:

  ```text
  Q7 <- A0 | Q6 <- A1 | Q5 <- A2 | ... | Q0 <- A7
  ```

  [`OrderedShiftRegister`] buffers the bits a caller loads and only shifts them
  out on commit, in the order that produces the requested mapping:

  - [`BitOrder::Natural`]: `A0 -> Q0`, `A1 -> Q1`, ... The buffer is replayed
    back to front.
  - [`BitOrder::Inverse`]: `A0 -> Q7`, `A1 -> Q6`, ... The buffer is replayed
    front to back, matching the plain register.

  Two buffers are provided, [`ArrayBuffer`] and [`DequeBuffer`]. They behave
  identically; neither allocates.
*/

use crate::shift_register::{Error, ShiftRegister};
use heapless::Deque;

/// Mapping of loaded bits to latched outputs
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum BitOrder {
    /// First loaded bit on the first output
    Natural,
    /// First loaded bit on the last output
    Inverse,
}

impl Default for BitOrder {
    fn default() -> Self {
        BitOrder::Inverse
    }
}

/// Storage for bits waiting to be shifted out
pub trait BitBuffer {
    /// Most bits the buffer can hold
    fn storage(&self) -> usize;

    /// Number of bits held
    fn len(&self) -> usize;

    /// Is the buffer empty?
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a bit. Returns `false` when there is no room left.
    fn append(&mut self, bit: bool) -> bool;

    /// Remove the oldest bit
    fn pop_first(&mut self) -> Option<bool>;

    /// Remove the newest bit
    fn pop_last(&mut self) -> Option<bool>;

    /// Drop every bit
    fn clear(&mut self);
}

/// Fixed array with a write cursor.
///
/// INVARIANT: `head <= cursor <= N`
#[derive(Debug, Clone)]
pub struct ArrayBuffer<const N: usize> {
    bits: [bool; N],
    head: usize,
    cursor: usize,
}

impl<const N: usize> ArrayBuffer<N> {
    /// Create an empty buffer
    pub const fn new() -> Self {
        ArrayBuffer {
            bits: [false; N],
            head: 0,
            cursor: 0,
        }
    }
}

impl<const N: usize> Default for ArrayBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> BitBuffer for ArrayBuffer<N> {
    fn storage(&self) -> usize {
        N
    }

    fn len(&self) -> usize {
        self.cursor - self.head
    }

    fn append(&mut self, bit: bool) -> bool {
        if self.cursor == N {
            return false;
        }
        self.bits[self.cursor] = bit;
        self.cursor += 1;
        true
    }

    fn pop_first(&mut self) -> Option<bool> {
        if self.head == self.cursor {
            return None;
        }
        let bit = self.bits[self.head];
        self.head += 1;
        Some(bit)
    }

    fn pop_last(&mut self) -> Option<bool> {
        if self.head == self.cursor {
            return None;
        }
        self.cursor -= 1;
        Some(self.bits[self.cursor])
    }

    fn clear(&mut self) {
        self.head = 0;
        self.cursor = 0;
    }
}

/// Double ended queue of bits
#[derive(Debug, Clone)]
pub struct DequeBuffer<const N: usize> {
    bits: Deque<bool, N>,
}

impl<const N: usize> DequeBuffer<N> {
    /// Create an empty buffer
    pub const fn new() -> Self {
        DequeBuffer { bits: Deque::new() }
    }
}

impl<const N: usize> Default for DequeBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> BitBuffer for DequeBuffer<N> {
    fn storage(&self) -> usize {
        N
    }

    fn len(&self) -> usize {
        self.bits.len()
    }

    fn append(&mut self, bit: bool) -> bool {
        self.bits.push_back(bit).is_ok()
    }

    fn pop_first(&mut self) -> Option<bool> {
        self.bits.pop_front()
    }

    fn pop_last(&mut self) -> Option<bool> {
        self.bits.pop_back()
    }

    fn clear(&mut self) {
        self.bits.clear();
    }
}

/// Shift register that latches out bits in a configurable order
pub struct OrderedShiftRegister<R, B> {
    register: R,
    buffer: B,
    order: BitOrder,
    bits_remaining: usize,
}

impl<R, B> OrderedShiftRegister<R, B>
where
    R: ShiftRegister,
    B: BitBuffer,
{
    /// Wrap `register` using inverse order.
    ///
    /// Fails with `CapacityExceeded` if the register is larger than `buffer`.
    pub fn new(register: R, buffer: B) -> Result<Self, Error<R::BusError>> {
        Self::with_order(register, buffer, BitOrder::default())
    }

    /// Wrap `register` using the given order
    pub fn with_order(
        mut register: R,
        mut buffer: B,
        order: BitOrder,
    ) -> Result<Self, Error<R::BusError>> {
        if register.capacity() > buffer.storage() {
            return Err(Error::CapacityExceeded);
        }
        register.discard();
        buffer.clear();

        Ok(OrderedShiftRegister {
            bits_remaining: register.capacity(),
            register,
            buffer,
            order,
        })
    }

    /// First loaded bit goes to the first output
    pub fn make_natural_order(&mut self) {
        self.order = BitOrder::Natural;
    }

    /// First loaded bit goes to the last output
    pub fn make_inverse_order(&mut self) {
        self.order = BitOrder::Inverse;
    }

    /// Current bit order
    pub fn order(&self) -> BitOrder {
        self.order
    }

    /// Release the wrapped register
    pub fn into_inner(self) -> R {
        self.register
    }

    fn replay(&mut self) -> Result<(), Error<R::BusError>> {
        loop {
            let next = match self.order {
                BitOrder::Natural => self.buffer.pop_last(),
                BitOrder::Inverse => self.buffer.pop_first(),
            };
            match next {
                Some(bit) => self.register.load(bit)?,
                None => break,
            }
        }
        self.register.commit()
    }
}

impl<R, B> ShiftRegister for OrderedShiftRegister<R, B>
where
    R: ShiftRegister,
    B: BitBuffer,
{
    type BusError = R::BusError;

    fn configure(&mut self, capacity: usize) -> Result<(), Error<Self::BusError>> {
        if capacity > self.buffer.storage() {
            return Err(Error::CapacityExceeded);
        }
        self.register.configure(capacity)?;

        self.buffer.clear();
        self.bits_remaining = capacity;
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.register.capacity()
    }

    fn bits_remaining(&self) -> usize {
        self.bits_remaining
    }

    /// Buffer one bit. No pin is driven until [`commit`](Self::commit).
    fn load(&mut self, bit: bool) -> Result<(), Error<Self::BusError>> {
        if self.is_full() {
            return Err(Error::Full);
        }
        let appended = self.buffer.append(bit);
        debug_assert!(appended, "buffer smaller than register capacity");

        self.bits_remaining -= 1;
        debug_assert_eq!(self.buffer.len() + self.bits_remaining, self.capacity());
        Ok(())
    }

    /// Shift the buffered bits out in the configured order and latch them.
    ///
    /// Requires a full register. Buffer and counter are reset whether or not
    /// the pins could be driven.
    fn commit(&mut self) -> Result<(), Error<Self::BusError>> {
        if !self.is_full() {
            return Err(Error::NotFull);
        }

        let result = self.replay();
        if result.is_err() {
            log::debug!("shift register commit failed, dropping buffered bits");
            self.register.discard();
        }

        self.buffer.clear();
        self.bits_remaining = self.capacity();
        result
    }

    fn discard(&mut self) {
        self.buffer.clear();
        self.register.discard();
        self.bits_remaining = self.capacity();
    }
}
