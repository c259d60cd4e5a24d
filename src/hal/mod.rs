//! Granița cu hardware-ul: ieșirea PWM și sursa de timp.

use std::time::{Duration, Instant};

use crate::channel::ChannelId;

#[cfg(target_os = "espidf")]
pub mod ledc;
pub mod sim;

/// Ieșire PWM cu un canal per servo.
///
/// `set_duty` primește valoarea deja rescalată la rezoluția timerului.
pub trait PwmOutput {
    fn configure(&mut self, frequency_hz: u32, resolution_bits: u8) -> anyhow::Result<()>;
    fn set_duty(&mut self, channel: ChannelId, duty: u32) -> anyhow::Result<()>;
}

impl<T: PwmOutput + ?Sized> PwmOutput for Box<T> {
    fn configure(&mut self, frequency_hz: u32, resolution_bits: u8) -> anyhow::Result<()> {
        (**self).configure(frequency_hz, resolution_bits)
    }

    fn set_duty(&mut self, channel: ChannelId, duty: u32) -> anyhow::Result<()> {
        (**self).set_duty(channel, duty)
    }
}

/// Timp monoton + sleep; singurul punct în care bucla de control „doarme”.
pub trait Clock {
    fn now(&self) -> Duration;
    fn sleep(&mut self, duration: Duration);
}

/// `Instant` + `thread::sleep`: merge și pe host și pe ESP-IDF (std).
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    origin: Instant,
}

impl StdClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for StdClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
