//! Configurația brațului: filtru, profil PWM, tick implicit, calibrare.
//!
//! Pe placă nu avem sistem de fișiere, așa că `config/arm.json` este inclus în
//! binar; pe host se poate încărca și un fișier extern.

use std::path::Path;
use std::time::Duration;

use include_dir::{include_dir, Dir};
use serde::{Deserialize, Serialize};

use crate::calibration::Calibration;
use crate::error::{ArmError, Result};
use crate::quantizer::DutyProfile;

static CONFIG_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/config");

pub const DEFAULT_CONFIG_FILE: &str = "arm.json";

/// Cât „așteptăm” filtrul după ultimul tick al traiectoriei.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettleConfig {
    /// bugetul minim; pentru α mic se extinde automat
    pub max_ticks: u32,
    /// toleranța în grade sub care considerăm canalul ajuns
    pub epsilon: f32,
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self { max_ticks: 24, epsilon: 0.05 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmConfig {
    /// α din filtrul exponențial, în (0, 1]
    pub smoothing: f32,
    pub duty: DutyProfile,
    /// intervalul implicit dintre tick-uri
    pub tick_ms: u32,
    /// durata lui `home()`, în secunde
    pub home_duration: f32,
    /// > 1 încetinește toate pattern-urile, < 1 le accelerează
    pub speed_multiplier: f32,
    pub settle: SettleConfig,
    pub calibration: Calibration,
}

impl Default for ArmConfig {
    fn default() -> Self {
        Self {
            smoothing: 0.5,
            duty: DutyProfile::default(),
            tick_ms: 10,
            home_duration: 1.0,
            speed_multiplier: 1.0,
            settle: SettleConfig::default(),
            calibration: Calibration::default(),
        }
    }
}

impl ArmConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: ArmConfig = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&contents)?)
    }

    /// configurația inclusă la build din `config/arm.json`
    pub fn embedded() -> Result<Self> {
        let file = CONFIG_DIR
            .get_file(DEFAULT_CONFIG_FILE)
            .ok_or(ArmError::ConfigMissing(DEFAULT_CONFIG_FILE))?;
        let json = file
            .contents_utf8()
            .ok_or_else(|| ArmError::InvalidConfig(format!("{DEFAULT_CONFIG_FILE} nu e UTF-8")))?;
        Self::from_json(json)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.smoothing > 0.0 && self.smoothing <= 1.0) {
            return Err(invalid(format!("smoothing={} în afara (0, 1]", self.smoothing)));
        }

        let d = &self.duty;
        if d.native_bits == 0 || d.native_bits > 16 || d.resolution_bits > 20 {
            return Err(invalid(format!(
                "rezoluție nesuportată: native={} hw={}",
                d.native_bits, d.resolution_bits
            )));
        }
        if d.native_bits > d.resolution_bits {
            return Err(invalid(format!(
                "native_bits={} > resolution_bits={}",
                d.native_bits, d.resolution_bits
            )));
        }
        if d.min_duty >= d.max_duty || d.max_duty > d.native_max() {
            return Err(invalid(format!(
                "plajă de duty invalidă {}..{} (max nativ {})",
                d.min_duty,
                d.max_duty,
                d.native_max()
            )));
        }
        if d.to_hw(d.max_duty) > d.hw_max() {
            return Err(invalid(format!(
                "max_duty={} depășește registrul de {} biți",
                d.max_duty, d.resolution_bits
            )));
        }
        if d.frequency_hz == 0 {
            return Err(invalid("frequency_hz=0".into()));
        }

        if self.tick_ms == 0 {
            return Err(invalid("tick_ms=0".into()));
        }
        if !(self.home_duration.is_finite() && self.home_duration > 0.0) {
            return Err(invalid(format!("home_duration={}", self.home_duration)));
        }
        if !(self.speed_multiplier.is_finite() && self.speed_multiplier > 0.0) {
            return Err(invalid(format!("speed_multiplier={}", self.speed_multiplier)));
        }
        if !(self.settle.epsilon.is_finite() && self.settle.epsilon > 0.0) {
            return Err(invalid(format!("settle.epsilon={}", self.settle.epsilon)));
        }

        self.calibration.validate()
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms as u64)
    }

    /// durată de pattern scalată cu `speed_multiplier`
    pub fn scaled(&self, seconds: f32) -> f32 {
        seconds * self.speed_multiplier
    }

    pub fn scaled_tick(&self, tick: Duration) -> Duration {
        let nanos = tick.as_nanos() as f64 * self.speed_multiplier as f64;
        Duration::from_nanos(nanos.round() as u64)
    }
}

fn invalid(msg: String) -> ArmError {
    ArmError::InvalidConfig(msg)
}
