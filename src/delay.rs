/*!
  # Blocking pauses used to time every pin edge

  Protocol code only ever talks to the [`Delay`] trait, so the time source can
  be swapped for a hardware timer, an `embedded-hal` delay provider or, in
  tests, something that does not wait at all.

  - [`TimerDelay`] restarts a `CountDown` timer for every pause.
  - [`HalDelay`] forwards to a `DelayMs`/`DelayUs` provider.
  - `StdDelay` (feature `std`) sleeps the thread for millisecond pauses and
    busy-waits on `Instant` for nanosecond pauses.
*/

use core::time::Duration;
use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use embedded_hal::timer::CountDown;
use nb::block;

/// Blocking pause provider
pub trait Delay {
    /// Coarse pause. Implementations may yield to other work.
    fn pause_millis(&mut self, millis: u32);

    /// Fine pause, busy-waiting where the platform allows it.
    fn pause_nanos(&mut self, nanos: u32);
}

impl<T: Delay + ?Sized> Delay for &mut T {
    fn pause_millis(&mut self, millis: u32) {
        (**self).pause_millis(millis)
    }

    fn pause_nanos(&mut self, nanos: u32) {
        (**self).pause_nanos(nanos)
    }
}

/// Pauses by running a count down timer to completion
pub struct TimerDelay<T> {
    timer: T,
}

impl<T> TimerDelay<T>
where
    T: CountDown,
    T::Time: From<Duration>,
{
    /// Create instance
    pub fn new(timer: T) -> Self {
        TimerDelay { timer }
    }

    /// Release the timer
    pub fn destroy(self) -> T {
        self.timer
    }

    #[inline]
    fn wait_time(&mut self, duration: Duration) {
        self.timer.start(duration);
        block!(self.timer.wait()).ok();
    }
}

impl<T> Delay for TimerDelay<T>
where
    T: CountDown,
    T::Time: From<Duration>,
{
    fn pause_millis(&mut self, millis: u32) {
        if millis > 0 {
            self.wait_time(Duration::from_millis(u64::from(millis)));
        }
    }

    fn pause_nanos(&mut self, nanos: u32) {
        if nanos > 0 {
            self.wait_time(Duration::from_nanos(u64::from(nanos)));
        }
    }
}

/// Adapter for `embedded-hal` blocking delay providers.
///
/// The finest granularity available there is a microsecond, so nanosecond
/// pauses are rounded up.
pub struct HalDelay<D> {
    delay: D,
}

impl<D> HalDelay<D>
where
    D: DelayMs<u32> + DelayUs<u32>,
{
    /// Create instance
    pub fn new(delay: D) -> Self {
        HalDelay { delay }
    }

    /// Release the delay provider
    pub fn destroy(self) -> D {
        self.delay
    }
}

impl<D> Delay for HalDelay<D>
where
    D: DelayMs<u32> + DelayUs<u32>,
{
    fn pause_millis(&mut self, millis: u32) {
        if millis > 0 {
            self.delay.delay_ms(millis);
        }
    }

    fn pause_nanos(&mut self, nanos: u32) {
        let micros = nanos_to_micros(nanos);
        if micros > 0 {
            self.delay.delay_us(micros);
        }
    }
}

#[inline]
fn nanos_to_micros(nanos: u32) -> u32 {
    nanos / 1_000 + u32::from(nanos % 1_000 != 0)
}

#[cfg(feature = "std")]
pub use self::host::StdDelay;

#[cfg(feature = "std")]
mod host {
    use super::Delay;
    use std::thread;
    use std::time::{Duration, Instant};

    /// Host clock backed pauses
    #[derive(Debug, Default, Clone, Copy)]
    pub struct StdDelay;

    impl StdDelay {
        /// Create instance
        pub fn new() -> Self {
            StdDelay
        }
    }

    impl Delay for StdDelay {
        fn pause_millis(&mut self, millis: u32) {
            if millis > 0 {
                thread::sleep(Duration::from_millis(u64::from(millis)));
            }
        }

        fn pause_nanos(&mut self, nanos: u32) {
            let stop_at = Instant::now() + Duration::from_nanos(u64::from(nanos));
            while Instant::now() < stop_at {
                core::hint::spin_loop();
            }
        }
    }
}
