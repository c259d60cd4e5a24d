//! PWM și ceas simulate: demo-ul de pe host și testele rulează fără placă.

use std::time::Duration;

use anyhow::bail;
use log::trace;

use super::{Clock, PwmOutput};
use crate::channel::ChannelId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DutyWrite {
    pub channel: ChannelId,
    pub duty: u32,
}

/// Înregistrează fiecare scriere; poate simula o defecțiune pe un canal.
///
/// `SimPwm::unrecorded()` doar numără scrierile (pentru demo-uri lungi).
#[derive(Debug)]
pub struct SimPwm {
    configured: Option<(u32, u8)>,
    writes: Vec<DutyWrite>,
    record: bool,
    total: u64,
    fault: Option<ChannelId>,
}

impl Default for SimPwm {
    fn default() -> Self {
        Self::new()
    }
}

impl SimPwm {
    pub fn new() -> Self {
        Self { configured: None, writes: Vec::new(), record: true, total: 0, fault: None }
    }

    pub fn unrecorded() -> Self {
        Self { record: false, ..Self::new() }
    }

    /// de acum înainte, orice scriere pe `channel` eșuează
    pub fn inject_fault(&mut self, channel: ChannelId) {
        self.fault = Some(channel);
    }

    pub fn clear_fault(&mut self) {
        self.fault = None;
    }

    /// toate scrierile reușite, și cele neînregistrate
    pub fn total_writes(&self) -> u64 {
        self.total
    }

    pub fn configured(&self) -> Option<(u32, u8)> {
        self.configured
    }

    pub fn writes(&self) -> &[DutyWrite] {
        &self.writes
    }

    pub fn writes_for(&self, channel: ChannelId) -> impl Iterator<Item = u32> + '_ {
        self.writes
            .iter()
            .filter(move |w| w.channel == channel)
            .map(|w| w.duty)
    }

    pub fn last_duty(&self, channel: ChannelId) -> Option<u32> {
        self.writes_for(channel).last()
    }

    pub fn clear(&mut self) {
        self.writes.clear();
    }
}

impl PwmOutput for SimPwm {
    fn configure(&mut self, frequency_hz: u32, resolution_bits: u8) -> anyhow::Result<()> {
        self.configured = Some((frequency_hz, resolution_bits));
        Ok(())
    }

    fn set_duty(&mut self, channel: ChannelId, duty: u32) -> anyhow::Result<()> {
        if self.configured.is_none() {
            bail!("PWM neconfigurat");
        }
        if self.fault == Some(channel) {
            bail!("defecțiune simulată pe {channel}");
        }
        trace!("pwm {channel} <- {duty}");
        self.total += 1;
        if self.record {
            self.writes.push(DutyWrite { channel, duty });
        }
        Ok(())
    }
}

/// Ceas virtual: `sleep` avansează timpul instant.
///
/// `oversleep` se adaugă la fiecare `sleep`, ca să simulăm tick-uri întârziate.
#[derive(Debug, Default, Clone)]
pub struct SimClock {
    now: Duration,
    oversleep: Duration,
    sleeps: u64,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_oversleep(oversleep: Duration) -> Self {
        Self { oversleep, ..Self::default() }
    }

    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }

    pub fn sleeps(&self) -> u64 {
        self.sleeps
    }
}

impl Clock for SimClock {
    fn now(&self) -> Duration {
        self.now
    }

    fn sleep(&mut self, duration: Duration) {
        self.sleeps += 1;
        self.now += duration + self.oversleep;
    }
}
