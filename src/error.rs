use thiserror::Error;

use crate::channel::ChannelId;

pub type Result<T, E = ArmError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ArmError {
    #[error("{channel}: calibrare invalidă (min={min}, max={max}, default={default})")]
    InvalidCalibration {
        channel: ChannelId,
        min: f32,
        max: f32,
        default: f32,
    },

    #[error("configurație invalidă: {0}")]
    InvalidConfig(String),

    #[error("configurație JSON invalidă")]
    ConfigParse(#[from] serde_json::Error),

    #[error("fișierul de configurație {0} lipsește")]
    ConfigMissing(&'static str),

    #[error("{channel}: țintă nefinită ({value})")]
    NonFiniteTarget { channel: ChannelId, value: f32 },

    #[error("durată invalidă: {0} s")]
    InvalidDuration(f32),

    #[error("{channel}: scrierea PWM a eșuat")]
    Hardware {
        channel: ChannelId,
        #[source]
        source: anyhow::Error,
    },

    #[error("configurarea PWM a eșuat")]
    PwmSetup(#[source] anyhow::Error),

    #[error("mișcare anulată")]
    Cancelled,
}

impl ArmError {
    /// canalul implicat, dacă eroarea ține de unul anume
    pub fn channel(&self) -> Option<ChannelId> {
        match self {
            ArmError::InvalidCalibration { channel, .. }
            | ArmError::NonFiniteTarget { channel, .. }
            | ArmError::Hardware { channel, .. } => Some(*channel),
            _ => None,
        }
    }
}
