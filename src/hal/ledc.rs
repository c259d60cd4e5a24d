//! Backend LEDC pentru ESP32: patru canale pe un singur timer de 50 Hz.
//!
//! Pini: Base=GPIO4, Shoulder=GPIO5, Elbow=GPIO6, Gripper=GPIO7.

use anyhow::{bail, Result};
use esp_idf_hal::{
    gpio::{Gpio4, Gpio5, Gpio6, Gpio7},
    ledc::{config::TimerConfig, LedcDriver, LedcTimerDriver, Resolution, LEDC},
    prelude::*,
};
use log::info;

use super::PwmOutput;
use crate::channel::{ChannelId, CHANNEL_COUNT};

pub struct LedcServos<'d> {
    channels: [LedcDriver<'d>; CHANNEL_COUNT],
    frequency_hz: u32,
    resolution_bits: u8,
}

fn resolution(bits: u8) -> Result<Resolution> {
    Ok(match bits {
        10 => Resolution::Bits10,
        11 => Resolution::Bits11,
        12 => Resolution::Bits12,
        13 => Resolution::Bits13,
        14 => Resolution::Bits14,
        15 => Resolution::Bits15,
        other => bail!("rezoluție LEDC nesuportată: {other} biți"),
    })
}

impl<'d> LedcServos<'d> {
    pub fn new(
        ledc: LEDC,
        gpio4: Gpio4,
        gpio5: Gpio5,
        gpio6: Gpio6,
        gpio7: Gpio7,
        frequency_hz: u32,
        resolution_bits: u8,
    ) -> Result<Self> {
        // timer de 50 Hz comun pentru toate servo-urile
        let timer = LedcTimerDriver::new(
            ledc.timer0,
            &TimerConfig::default()
                .frequency(frequency_hz.Hz())
                .resolution(resolution(resolution_bits)?),
        )?;

        let channels = [
            LedcDriver::new(ledc.channel0, &timer, gpio4)?,
            LedcDriver::new(ledc.channel1, &timer, gpio5)?,
            LedcDriver::new(ledc.channel2, &timer, gpio6)?,
            LedcDriver::new(ledc.channel3, &timer, gpio7)?,
        ];
        info!("LEDC: {frequency_hz} Hz, {resolution_bits} biți, GPIO 4/5/6/7");

        Ok(Self { channels, frequency_hz, resolution_bits })
    }
}

impl PwmOutput for LedcServos<'_> {
    /// Timerul e configurat în `new`; aici doar verificăm că profilul cerut coincide.
    fn configure(&mut self, frequency_hz: u32, resolution_bits: u8) -> Result<()> {
        if frequency_hz != self.frequency_hz || resolution_bits != self.resolution_bits {
            bail!(
                "LEDC pornit la {} Hz/{} biți, cerut {} Hz/{} biți",
                self.frequency_hz,
                self.resolution_bits,
                frequency_hz,
                resolution_bits
            );
        }
        Ok(())
    }

    fn set_duty(&mut self, channel: ChannelId, duty: u32) -> Result<()> {
        let drv = &mut self.channels[channel.index()];
        let max = drv.get_max_duty();
        if duty > max {
            bail!("duty {duty} > {max} pe {channel}");
        }
        drv.set_duty(duty)?;
        Ok(())
    }
}
