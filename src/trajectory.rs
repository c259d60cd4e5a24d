//! Generatorul de traiectorie: timp normalizat → factor de interpolare.
//!
//! Curba implicită este minimum-jerk (Flash & Hogan): `10t³ − 15t⁴ + 6t⁵`.
//! Coeficienții sunt aceiași ca în demo-urile MicroPython, ca să rămână
//! comparabile mișcările de pe host și de pe placă.

use serde::{Deserialize, Serialize};

/// Minimum-jerk: p(0)=0, p(1)=1, viteza și accelerația zero la capete.
///
/// `t` este limitat la [0, 1]; în afara intervalului polinomul nu mai e monoton.
#[inline]
pub fn minimum_jerk(t: f32) -> f32 {
    let t = clamp_unit(t);
    let t3 = t * t * t;
    let t4 = t3 * t;
    let t5 = t4 * t;
    10.0 * t3 - 15.0 * t4 + 6.0 * t5
}

/// `t^k`: pornire lentă pentru k > 1, „snap” pentru k < 1.
#[inline]
pub fn power_in(t: f32, k: f32) -> f32 {
    clamp_unit(t).powf(k)
}

/// `1 - (1-t)^k`, oglinda lui [`power_in`].
#[inline]
pub fn power_out(t: f32, k: f32) -> f32 {
    1.0 - (1.0 - clamp_unit(t)).powf(k)
}

/// `a0 + (a1 - a0) * s`
#[inline]
pub fn lerp(a0: f32, a1: f32, s: f32) -> f32 {
    a0 + (a1 - a0) * s
}

#[inline]
fn clamp_unit(t: f32) -> f32 {
    // NaN ajunge 0: mișcarea nu pornește în loc să sară
    if t.is_nan() {
        0.0
    } else {
        t.clamp(0.0, 1.0)
    }
}

/// Strategia de interpolare, interschimbabilă per mișcare.
///
/// Doar `MinimumJerk` garantează derivate zero la capete; curbele de putere
/// sunt pentru efecte voite („snap open”, „gentle grab”).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Easing {
    #[default]
    MinimumJerk,
    Linear,
    PowerIn { exponent: f32 },
    PowerOut { exponent: f32 },
    /// funcție arbitrară `[0,1] → [0,1]`
    #[serde(skip)]
    Custom(fn(f32) -> f32),
}

/// Două `Custom` nu sunt niciodată egale: adresele funcțiilor nu sunt stabile.
impl PartialEq for Easing {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Easing::MinimumJerk, Easing::MinimumJerk) | (Easing::Linear, Easing::Linear) => true,
            (Easing::PowerIn { exponent: a }, Easing::PowerIn { exponent: b })
            | (Easing::PowerOut { exponent: a }, Easing::PowerOut { exponent: b }) => a == b,
            _ => false,
        }
    }
}

impl Easing {
    /// factorul de interpolare pentru `t ∈ [0,1]`
    pub fn factor(self, t: f32) -> f32 {
        match self {
            Easing::MinimumJerk => minimum_jerk(t),
            Easing::Linear => clamp_unit(t),
            Easing::PowerIn { exponent } => power_in(t, exponent),
            Easing::PowerOut { exponent } => power_out(t, exponent),
            Easing::Custom(f) => clamp_unit(f(clamp_unit(t))),
        }
    }

    /// interpolează un singur unghi
    pub fn interpolate(self, a0: f32, a1: f32, t: f32) -> f32 {
        lerp(a0, a1, self.factor(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_minimum_jerk_boundaries() {
        assert_eq!(minimum_jerk(0.0), 0.0);
        assert_eq!(minimum_jerk(1.0), 1.0);
        assert_abs_diff_eq!(minimum_jerk(0.5), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_minimum_jerk_flat_at_endpoints() {
        let h = 1e-3;
        let v0 = (minimum_jerk(h) - minimum_jerk(0.0)) / h;
        let v1 = (minimum_jerk(1.0) - minimum_jerk(1.0 - h)) / h;
        assert!(v0.abs() < 1e-3, "v0 = {v0}");
        assert!(v1.abs() < 1e-3, "v1 = {v1}");
    }

    #[test]
    fn test_minimum_jerk_monotonic() {
        let mut prev = minimum_jerk(0.0);
        for i in 1..=1000 {
            let s = minimum_jerk(i as f32 / 1000.0);
            assert!(s >= prev, "scade la i={i}: {s} < {prev}");
            prev = s;
        }
    }

    #[test]
    fn test_clamps_outside_unit_interval() {
        assert_eq!(minimum_jerk(-0.5), 0.0);
        assert_eq!(minimum_jerk(1.7), 1.0);
        assert_eq!(minimum_jerk(f32::NAN), 0.0);
    }

    #[test]
    fn test_power_curves() {
        assert_abs_diff_eq!(power_in(0.25, 2.0), 0.0625, epsilon = 1e-6);
        assert_abs_diff_eq!(power_out(0.25, 2.0), 0.4375, epsilon = 1e-6);
        // snap: k < 1 avansează repede la început
        assert!(power_in(0.1, 0.3) > 0.4);
        for e in [Easing::PowerIn { exponent: 0.3 }, Easing::PowerOut { exponent: 0.4 }] {
            assert_eq!(e.factor(0.0), 0.0);
            assert_abs_diff_eq!(e.factor(1.0), 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_interpolate_sweep() {
        let e = Easing::MinimumJerk;
        assert_eq!(e.interpolate(90.0, 160.0, 0.0), 90.0);
        assert_eq!(e.interpolate(90.0, 160.0, 1.0), 160.0);
        assert_abs_diff_eq!(e.interpolate(90.0, 160.0, 0.5), 125.0, epsilon = 1e-4);
    }

    #[test]
    fn test_custom_easing_is_clamped() {
        fn overshoot(t: f32) -> f32 {
            t * 1.5
        }
        assert_eq!(Easing::Custom(overshoot).factor(1.0), 1.0);
    }

    #[test]
    fn test_easing_equality() {
        fn half(t: f32) -> f32 {
            t * 0.5
        }
        assert_eq!(Easing::PowerIn { exponent: 2.0 }, Easing::PowerIn { exponent: 2.0 });
        assert_ne!(Easing::PowerIn { exponent: 2.0 }, Easing::PowerOut { exponent: 2.0 });
        assert_ne!(Easing::Custom(half), Easing::Custom(half));
    }

    #[test]
    fn test_easing_from_json() {
        let e: Easing = serde_json::from_str(r#"{"kind":"power_out","exponent":0.4}"#).unwrap();
        assert_eq!(e, Easing::PowerOut { exponent: 0.4 });
        let d: Easing = serde_json::from_str(r#"{"kind":"minimum_jerk"}"#).unwrap();
        assert_eq!(d, Easing::MinimumJerk);
    }
}
