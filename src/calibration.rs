//! Plajele de calibrare per canal: `{min, max, default}` în grade.

use serde::{Deserialize, Serialize};

use crate::channel::{ChannelId, CHANNEL_COUNT};
use crate::error::{ArmError, Result};

pub const HW_MIN_ANGLE: f32 = 0.0;
pub const HW_MAX_ANGLE: f32 = 180.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRange {
    pub min: f32,
    pub max: f32,
    pub default: f32,
    /// servo montat invers: unghiul fizic este `180 - unghi`
    #[serde(default)]
    pub inverted: bool,
}

impl Default for CalibrationRange {
    fn default() -> Self {
        Self { min: HW_MIN_ANGLE, max: HW_MAX_ANGLE, default: 90.0, inverted: false }
    }
}

impl CalibrationRange {
    /// Construiește o plajă validată: `min <= default <= max`, totul în [0, 180].
    pub fn new(channel: ChannelId, min: f32, max: f32, default: f32) -> Result<Self> {
        let range = Self { min, max, default, inverted: false };
        range.validate(channel)?;
        Ok(range)
    }

    pub fn inverted(mut self, inverted: bool) -> Self {
        self.inverted = inverted;
        self
    }

    pub fn validate(&self, channel: ChannelId) -> Result<()> {
        let finite = self.min.is_finite() && self.max.is_finite() && self.default.is_finite();
        let ordered = self.min <= self.default && self.default <= self.max;
        let in_hw = self.min >= HW_MIN_ANGLE && self.max <= HW_MAX_ANGLE;
        if finite && ordered && in_hw {
            Ok(())
        } else {
            Err(ArmError::InvalidCalibration {
                channel,
                min: self.min,
                max: self.max,
                default: self.default,
            })
        }
    }

    #[inline]
    pub fn clamp(&self, angle: f32) -> f32 {
        angle.clamp(self.min, self.max)
    }

    #[inline]
    pub fn contains(&self, angle: f32) -> bool {
        (self.min..=self.max).contains(&angle)
    }

    /// unghi logic → unghi trimis la cuantizor
    #[inline]
    pub fn to_physical(&self, angle: f32) -> f32 {
        if self.inverted {
            HW_MAX_ANGLE - angle
        } else {
            angle
        }
    }
}

/// Calibrarea întregului braț, în formatul `servo_config.json`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    pub base: CalibrationRange,
    pub shoulder: CalibrationRange,
    pub elbow: CalibrationRange,
    pub gripper: CalibrationRange,
}

impl Calibration {
    pub fn range(&self, id: ChannelId) -> &CalibrationRange {
        match id {
            ChannelId::Base => &self.base,
            ChannelId::Shoulder => &self.shoulder,
            ChannelId::Elbow => &self.elbow,
            ChannelId::Gripper => &self.gripper,
        }
    }

    pub fn range_mut(&mut self, id: ChannelId) -> &mut CalibrationRange {
        match id {
            ChannelId::Base => &mut self.base,
            ChannelId::Shoulder => &mut self.shoulder,
            ChannelId::Elbow => &mut self.elbow,
            ChannelId::Gripper => &mut self.gripper,
        }
    }

    pub fn validate(&self) -> Result<()> {
        ChannelId::ALL
            .iter()
            .try_for_each(|&id| self.range(id).validate(id))
    }

    /// unghiurile de „home” ale tuturor canalelor
    pub fn defaults(&self) -> [f32; CHANNEL_COUNT] {
        ChannelId::ALL.map(|id| self.range(id).default)
    }
}
