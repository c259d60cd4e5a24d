//! Gesturi expresive definite prin keyframe-uri.
//!
//! Fiecare keyframe e o poză completă + timpul în care e atinsă; durata
//! efectivă este `duration / speed`.

use heapless::Vec as HVec;

use crate::channel::CHANNEL_COUNT;

pub const MAX_KEYFRAMES: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    /// base, shoulder, elbow, gripper
    pub angles: [f32; CHANNEL_COUNT],
    pub duration: f32,
}

const fn kf(base: f32, shoulder: f32, elbow: f32, gripper: f32, duration: f32) -> Keyframe {
    Keyframe { angles: [base, shoulder, elbow, gripper], duration }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Gesture {
    pub name: &'static str,
    pub keyframes: HVec<Keyframe, MAX_KEYFRAMES>,
    pub loops: u32,
    pub speed: f32,
    pub return_home: bool,
}

impl Gesture {
    fn new(name: &'static str, frames: &[Keyframe]) -> Self {
        let mut keyframes = HVec::new();
        keyframes.extend(frames.iter().take(MAX_KEYFRAMES).copied());
        Self { name, keyframes, loops: 1, speed: 1.0, return_home: true }
    }

    pub fn loops(mut self, loops: u32) -> Self {
        self.loops = loops;
        self
    }

    pub fn speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// durata unei rulări complete, fără home
    pub fn duration(&self) -> f32 {
        let one: f32 = self.keyframes.iter().map(|k| k.duration).sum();
        one * self.loops.max(1) as f32 / self.speed
    }
}

/// Salut prietenos: brațul sus, baza oscilează ±25°·amplitude.
pub fn wave_friendly(amplitude: f32) -> Gesture {
    let amp = 25.0 * amplitude;
    Gesture::new(
        "wave_friendly",
        &[
            kf(90.0, 60.0, 45.0, 30.0, 0.4),
            kf(90.0 + amp, 60.0, 45.0, 30.0, 0.2),
            kf(90.0 - amp, 60.0, 45.0, 30.0, 0.2),
            kf(90.0 + amp, 60.0, 45.0, 30.0, 0.2),
            kf(90.0 - amp, 60.0, 45.0, 30.0, 0.2),
            kf(90.0 + amp, 60.0, 45.0, 30.0, 0.2),
            kf(90.0, 60.0, 45.0, 30.0, 0.2),
        ],
    )
}

pub fn nod_yes() -> Gesture {
    Gesture::new(
        "nod_yes",
        &[
            kf(90.0, 75.0, 90.0, 60.0, 0.3),
            kf(90.0, 105.0, 90.0, 60.0, 0.25),
            kf(90.0, 75.0, 90.0, 60.0, 0.25),
            kf(90.0, 105.0, 90.0, 60.0, 0.25),
            kf(90.0, 75.0, 90.0, 60.0, 0.25),
        ],
    )
}

pub fn shake_no() -> Gesture {
    Gesture::new(
        "shake_no",
        &[
            kf(90.0, 70.0, 60.0, 60.0, 0.3),
            kf(120.0, 70.0, 60.0, 60.0, 0.2),
            kf(60.0, 70.0, 60.0, 60.0, 0.2),
            kf(120.0, 70.0, 60.0, 60.0, 0.2),
            kf(60.0, 70.0, 60.0, 60.0, 0.2),
            kf(90.0, 70.0, 60.0, 60.0, 0.2),
        ],
    )
}

pub fn salute() -> Gesture {
    Gesture::new(
        "salute",
        &[
            kf(70.0, 45.0, 140.0, 90.0, 0.5),
            kf(70.0, 45.0, 140.0, 90.0, 0.8),
            kf(70.0, 50.0, 135.0, 90.0, 0.2),
            kf(70.0, 45.0, 140.0, 90.0, 0.2),
        ],
    )
}

pub fn celebrate() -> Gesture {
    Gesture::new(
        "celebrate",
        &[
            kf(90.0, 100.0, 110.0, 90.0, 0.3),
            kf(90.0, 40.0, 40.0, 90.0, 0.2),
            kf(90.0, 35.0, 35.0, 90.0, 0.4),
            kf(90.0, 50.0, 50.0, 90.0, 0.15),
            kf(90.0, 35.0, 35.0, 90.0, 0.15),
        ],
    )
    .loops(2)
}

/// caută un gest după nume
pub fn by_name(name: &str) -> Option<Gesture> {
    match name {
        "wave_friendly" => Some(wave_friendly(1.0)),
        "nod_yes" => Some(nod_yes()),
        "shake_no" => Some(shake_no()),
        "salute" => Some(salute()),
        "celebrate" => Some(celebrate()),
        _ => None,
    }
}

pub const NAMES: [&str; 5] = ["wave_friendly", "nod_yes", "shake_no", "salute", "celebrate"];
