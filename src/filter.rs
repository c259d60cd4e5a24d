//! Filtru exponențial (IIR de ordinul 1) aplicat unghiului comandat.

/// `smoothed = smoothed * (1 - α) + target * α`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Smoother {
    alpha: f32,
    value: f32,
}

impl Smoother {
    /// `alpha` trebuie să fie în (0, 1]; validarea se face în [`crate::config::ArmConfig`].
    pub fn new(alpha: f32, initial: f32) -> Self {
        Self { alpha, value: initial }
    }

    /// un pas de filtru, apelat o dată pe tick
    #[inline]
    pub fn update(&mut self, target: f32) -> f32 {
        self.value = self.value * (1.0 - self.alpha) + target * self.alpha;
        self.value
    }

    /// re-sincronizare după o scriere directă (altfel filtrul „aleargă” după o valoare veche)
    pub fn reset(&mut self, value: f32) {
        self.value = value;
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }
}
