//! [Bit banging] drivers for shift registers and three-wire RTC chips on top
//! of the [`embedded-hal`] digital pin traits.
//!
//! - [`shift_register`]: serial-in, parallel-out registers (74HC595 and the like)
//! - [`ordered`]: the same with a configurable latch order
//! - [`three_wire`]: the CE/SCLK/I/O link spoken by DS1302 style chips
//! - [`ds1302`]: command bytes and register access over that link
//! - [`bcd`]: BCD helpers for clock registers
//! - [`delay`]: the pause primitive every pin edge is timed with
//!
//! [Bit banging]: https://en.wikipedia.org/wiki/Bit_banging
//! [`embedded-hal`]: https://github.com/rust-embedded/embedded-hal
//!
//! ## Usage examples
//!
//! See the examples in the module documentation and the `tests` folder in the
//! crate sources, which drive the drivers against simulated chips.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod bcd;
pub mod delay;
pub mod ds1302;
pub mod ordered;
pub mod shift_register;
pub mod three_wire;
