//! Identitatea canalelor și starea per servo.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::filter::Smoother;
use crate::quantizer::DutyGate;

pub const CHANNEL_COUNT: usize = 4;

/// Câte un unghi (opțional) pentru fiecare canal, indexat după [`ChannelId::index`].
pub type Targets = [Option<f32>; CHANNEL_COUNT];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelId {
    Base,
    Shoulder,
    Elbow,
    Gripper,
}

impl ChannelId {
    pub const ALL: [ChannelId; CHANNEL_COUNT] = [
        ChannelId::Base,
        ChannelId::Shoulder,
        ChannelId::Elbow,
        ChannelId::Gripper,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub const fn name(self) -> &'static str {
        match self {
            ChannelId::Base => "base",
            ChannelId::Shoulder => "shoulder",
            ChannelId::Elbow => "elbow",
            ChannelId::Gripper => "gripper",
        }
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Construiește un set de ținte dintr-o listă de perechi `(canal, unghi)`.
pub fn targets(pairs: &[(ChannelId, f32)]) -> Targets {
    let mut out = [None; CHANNEL_COUNT];
    for &(id, angle) in pairs {
        out[id.index()] = Some(angle);
    }
    out
}

/// Toate cele patru canale primesc o țintă.
pub fn all(angles: [f32; CHANNEL_COUNT]) -> Targets {
    angles.map(Some)
}

/// Starea unui servo; deținută exclusiv de [`crate::arm::ServoArm`].
#[derive(Debug, Clone)]
pub struct Channel {
    id: ChannelId,
    commanded: f32,
    smoother: Smoother,
    gate: DutyGate,
}

impl Channel {
    pub(crate) fn new(id: ChannelId, home: f32, alpha: f32) -> Self {
        Self {
            id,
            commanded: home,
            smoother: Smoother::new(alpha, home),
            gate: DutyGate::new(),
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// ultima țintă cerută (după clamp)
    pub fn commanded(&self) -> f32 {
        self.commanded
    }

    pub fn position(&self) -> f32 {
        self.smoother.value()
    }

    /// ultimul duty nativ scris; `None` până la prima scriere
    pub fn last_duty(&self) -> Option<u32> {
        self.gate.last()
    }

    pub(crate) fn set_commanded(&mut self, angle: f32) {
        self.commanded = angle;
    }

    pub(crate) fn smoother_mut(&mut self) -> &mut Smoother {
        &mut self.smoother
    }

    pub(crate) fn gate_mut(&mut self) -> &mut DutyGate {
        &mut self.gate
    }
}
