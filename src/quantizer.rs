//! Unghi → valoare de duty, plus poarta care suprimă scrierile identice.

use serde::{Deserialize, Serialize};

/// `round(min_duty + (angle / 180) * (max_duty - min_duty))`
///
/// Nu limitează unghiul: apelantul face clamp înainte.
#[inline]
pub fn angle_to_duty(angle: f32, min_duty: u32, max_duty: u32) -> u32 {
    let span = max_duty as f32 - min_duty as f32;
    (min_duty as f32 + (angle / 180.0) * span).round() as u32
}

/// Profilul PWM al perifericului: frecvență, rezoluție și plaja de duty a servo-ului.
///
/// `min_duty`/`max_duty` sunt în rezoluția „nativă” a cuantizorului
/// (`native_bits`); dacă timerul hardware are mai mulți biți, valoarea se
/// rescalează în [`DutyProfile::to_hw`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DutyProfile {
    pub frequency_hz: u32,
    pub resolution_bits: u8,
    pub native_bits: u8,
    pub min_duty: u32,
    pub max_duty: u32,
}

impl Default for DutyProfile {
    fn default() -> Self {
        // 50 Hz, timer pe 14 biți, plaja 26..128 pe 8 biți
        Self {
            frequency_hz: 50,
            resolution_bits: 14,
            native_bits: 8,
            min_duty: 26,
            max_duty: 128,
        }
    }
}

impl DutyProfile {
    pub fn quantize(&self, angle: f32) -> u32 {
        angle_to_duty(angle, self.min_duty, self.max_duty)
    }

    /// valoarea maximă reprezentabilă în rezoluția nativă
    pub fn native_max(&self) -> u32 {
        (1u32 << self.native_bits) - 1
    }

    /// valoarea maximă a registrului de duty al timerului
    pub fn hw_max(&self) -> u32 {
        ((1u64 << self.resolution_bits) - 1) as u32
    }

    /// duty nativ → registru hardware (`duty * hw_max / native_max`)
    ///
    /// `native_max` ajunge exact pe `hw_max`, niciodată dincolo.
    pub fn to_hw(&self, duty: u32) -> u32 {
        if self.native_bits >= self.resolution_bits {
            return duty;
        }
        (duty as u64 * self.hw_max() as u64 / self.native_max() as u64) as u32
    }
}

/// Poarta de „change detection”: scriem în hardware doar când duty-ul se schimbă.
///
/// Starea inițială nu are nicio valoare, deci prima scriere are loc mereu.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DutyGate {
    last: Option<u32>,
}

impl DutyGate {
    pub fn new() -> Self {
        Self { last: None }
    }

    /// `true` dacă `duty` diferă de ultima valoare scrisă
    #[inline]
    pub fn changed(&self, duty: u32) -> bool {
        self.last != Some(duty)
    }

    /// de apelat doar după o scriere reușită
    #[inline]
    pub fn commit(&mut self, duty: u32) {
        self.last = Some(duty);
    }

    pub fn last(&self) -> Option<u32> {
        self.last
    }

    /// uităm ultima valoare (ex. după o eroare hardware)
    pub fn invalidate(&mut self) {
        self.last = None;
    }
}
