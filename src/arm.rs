//! Managerul de canale: deține cele 4 servo-uri și primitiva blocantă `move_to`.
//!
//! Un tick = toate canalele filtrate, cuantizate și (dacă s-a schimbat
//! duty-ul) scrise, apoi un singur sleep până la următorul termen. Canalele
//! care se mișcă împreună folosesc același `t`, deci nu apare decalaj între
//! articulații.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, trace, warn};

use crate::calibration::Calibration;
use crate::channel::{Channel, ChannelId, Targets, CHANNEL_COUNT};
use crate::config::ArmConfig;
use crate::error::{ArmError, Result};
use crate::hal::{Clock, PwmOutput};
use crate::trajectory::Easing;

/// Tick-ul și curba folosite de o mișcare.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveProfile {
    pub tick: Duration,
    pub easing: Easing,
}

impl MoveProfile {
    pub fn new(tick: Duration) -> Self {
        Self { tick, easing: Easing::MinimumJerk }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

/// Ce s-a calculat la un tick; primit de observator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickSample {
    pub index: u32,
    pub steps: u32,
    /// timpul normalizat, comun tuturor canalelor
    pub t: f32,
    /// factorul de interpolare la `t`
    pub factor: f32,
    /// țintele (după clamp) date filtrului
    pub targets: [f32; CHANNEL_COUNT],
}

pub type TickObserver = Box<dyn FnMut(&TickSample) + Send>;

/// Anulare cooperativă, verificată la fiecare graniță de tick.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Brațul cu 4 servo-uri.
///
/// Toate metodele de mișcare iau `&mut self`, deci două mișcări nu se pot
/// intercala; apelanții din mai multe thread-uri trebuie să țină brațul
/// într-un `Mutex`.
pub struct ServoArm<P, C> {
    config: ArmConfig,
    channels: [Channel; CHANNEL_COUNT],
    pwm: P,
    clock: C,
    cancel: CancelToken,
    observer: Option<TickObserver>,
    writes: u64,
}

impl<P: PwmOutput, C: Clock> ServoArm<P, C> {
    /// Validează configurația și configurează perifericul PWM.
    ///
    /// Nu scrie nimic în hardware; apelați [`ServoArm::home_direct`] ca să
    /// aliniați filtrul cu poziția fizică.
    pub fn new(config: ArmConfig, mut pwm: P, clock: C) -> Result<Self> {
        config.validate()?;
        pwm.configure(config.duty.frequency_hz, config.duty.resolution_bits)
            .map_err(ArmError::PwmSetup)?;

        let channels = ChannelId::ALL.map(|id| {
            Channel::new(id, config.calibration.range(id).default, config.smoothing)
        });

        Ok(Self {
            config,
            channels,
            pwm,
            clock,
            cancel: CancelToken::new(),
            observer: None,
            writes: 0,
        })
    }

    pub fn config(&self) -> &ArmConfig {
        &self.config
    }

    pub fn channel(&self, id: ChannelId) -> &Channel {
        &self.channels[id.index()]
    }

    /// pozițiile filtrate, în ordinea canalelor
    pub fn positions(&self) -> [f32; CHANNEL_COUNT] {
        self.channels.each_ref().map(|c| c.position())
    }

    pub fn pwm(&self) -> &P {
        &self.pwm
    }

    pub fn pwm_mut(&mut self) -> &mut P {
        &mut self.pwm
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// numărul de scrieri PWM efectuate
    pub fn write_count(&self) -> u64 {
        self.writes
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn set_observer(&mut self, observer: Option<TickObserver>) {
        self.observer = observer;
    }

    pub fn default_profile(&self) -> MoveProfile {
        MoveProfile::new(self.config.tick())
    }

    /// Mișcare minimum-jerk cu tick-ul implicit din configurație.
    pub fn move_to(&mut self, targets: Targets, duration: f32) -> Result<()> {
        let profile = self.default_profile();
        self.move_to_with(targets, duration, profile)
    }

    /// Mișcare blocantă: se întoarce după ce toate canalele au parcurs curba.
    ///
    /// `duration == 0` scrie direct unghiurile, fără filtru.
    pub fn move_to_with(&mut self, targets: Targets, duration: f32, profile: MoveProfile) -> Result<()> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(ArmError::InvalidDuration(duration));
        }
        let resolved = resolve_targets(&self.config.calibration, &targets)?;

        if duration == 0.0 {
            return self.write_direct(&resolved);
        }
        check_tick(profile.tick)?;

        let start = self.positions();
        let mut end = start;
        for ((slot, target), ch) in end.iter_mut().zip(resolved).zip(self.channels.iter_mut()) {
            if let Some(angle) = target {
                *slot = angle;
                ch.set_commanded(angle);
            }
        }

        let steps = steps_for(duration, profile.tick);
        debug!("move_to {end:?} în {duration} s ({steps} tick-uri)");

        let easing = profile.easing;
        self.run_ticks(steps, profile.tick, |t| {
            let s = easing.factor(t);
            let mut out = start;
            for (angle, (&a0, &a1)) in out.iter_mut().zip(start.iter().zip(end.iter())) {
                *angle = a0 + (a1 - a0) * s;
            }
            Ok((out, s))
        })?;

        self.settle(&end, profile.tick)
    }

    /// Urmărește o traiectorie parametrică: la fiecare tick `path(t)` dă țintele.
    ///
    /// Canalele pentru care `path` întoarce `None` își păstrează poziția.
    /// Nu există fază de așezare: traiectoria se termină unde o lasă `path`.
    pub fn track<F>(&mut self, duration: f32, tick: Duration, mut path: F) -> Result<()>
    where
        F: FnMut(f32) -> Targets,
    {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(ArmError::InvalidDuration(duration));
        }
        check_tick(tick)?;

        let calibration = self.config.calibration;
        let hold = self.positions();
        let steps = steps_for(duration, tick);
        let mut requested = [None; CHANNEL_COUNT];
        let result = self.run_ticks(steps, tick, |t| {
            let raw = path(t);
            let mut out = hold;
            for ((slot, target), last) in out
                .iter_mut()
                .zip(resolve_targets(&calibration, &raw)?)
                .zip(requested.iter_mut())
            {
                if let Some(angle) = target {
                    *slot = angle;
                    *last = Some(angle);
                }
            }
            Ok((out, t))
        });

        // ultima țintă cerută de traiectorie, chiar și la anulare
        for (ch, last) in self.channels.iter_mut().zip(requested) {
            if let Some(angle) = last {
                ch.set_commanded(angle);
            }
        }
        result
    }

    /// Întoarce toate canalele la unghiul `default` din calibrare.
    pub fn home(&mut self) -> Result<()> {
        let defaults = self.config.calibration.defaults();
        let duration = self.config.home_duration;
        self.move_to(defaults.map(Some), duration)
    }

    /// Home prin scriere directă (inițializare sau recuperare după eroare).
    pub fn home_direct(&mut self) -> Result<()> {
        let defaults = self.config.calibration.defaults();
        self.move_to(defaults.map(Some), 0.0)
    }

    fn write_direct(&mut self, targets: &[Option<f32>; CHANNEL_COUNT]) -> Result<()> {
        for (ch, target) in self.channels.iter_mut().zip(targets) {
            let Some(angle) = *target else { continue };
            let id = ch.id();
            let physical = self.config.calibration.range(id).to_physical(angle);
            let duty = self.config.duty.quantize(physical);

            self.pwm
                .set_duty(id, self.config.duty.to_hw(duty))
                .map_err(|source| {
                    ch.gate_mut().invalidate();
                    ArmError::Hardware { channel: id, source }
                })?;
            ch.gate_mut().commit(duty);
            self.writes += 1;

            ch.set_commanded(angle);
            ch.smoother_mut().reset(angle);
            trace!("{id}: direct {angle:.2}° -> duty {duty}");
        }
        Ok(())
    }

    /// Un tick: filtru + cuantizare + scriere (doar la schimbare) pe toate canalele.
    fn tick(&mut self, targets: &[f32; CHANNEL_COUNT]) -> Result<()> {
        for (ch, &target) in self.channels.iter_mut().zip(targets) {
            let id = ch.id();
            let position = ch.smoother_mut().update(target);

            let physical = self.config.calibration.range(id).to_physical(position);
            let duty = self.config.duty.quantize(physical);
            if !ch.gate_mut().changed(duty) {
                continue;
            }

            self.pwm
                .set_duty(id, self.config.duty.to_hw(duty))
                .map_err(|source| {
                    ch.gate_mut().invalidate();
                    ArmError::Hardware { channel: id, source }
                })?;
            ch.gate_mut().commit(duty);
            self.writes += 1;
            trace!("{id}: {position:.2}° -> duty {duty}");
        }
        Ok(())
    }

    /// Bucla de control cu termene fixe `start + i * tick`.
    ///
    /// Dacă un tick depășește termenul, tick-urile ratate se sar (durata
    /// totală se păstrează); ultimul tick (`t = 1`) se execută mereu.
    fn run_ticks<F>(&mut self, steps: u32, tick: Duration, mut sample: F) -> Result<()>
    where
        F: FnMut(f32) -> Result<([f32; CHANNEL_COUNT], f32)>,
    {
        let start = self.clock.now();
        let mut i = 1;
        while i <= steps {
            if self.cancel.is_cancelled() {
                return Err(ArmError::Cancelled);
            }

            let t = i as f32 / steps as f32;
            let (targets, factor) = sample(t)?;
            self.tick(&targets)?;

            if let Some(observer) = self.observer.as_mut() {
                observer(&TickSample { index: i, steps, t, factor, targets });
            }

            let deadline = start + tick * i;
            let now = self.clock.now();
            let mut next = i + 1;
            if now < deadline {
                self.clock.sleep(deadline - now);
            } else {
                let missed = ((now - deadline).as_nanos() / tick.as_nanos()) as u32;
                if missed > 0 {
                    warn!("depășire de timp la tick {i}/{steps}: sar {missed} tick-uri");
                    next = next.saturating_add(missed);
                    if i < steps {
                        next = next.min(steps);
                    }
                }
            }
            i = next;
        }
        Ok(())
    }

    /// Ține țintele finale până când filtrul ajunge la ele (în `settle.epsilon`).
    ///
    /// Bugetul se calculează din α și eroarea rămasă; `settle.max_ticks` e doar
    /// minimul.
    fn settle(&mut self, targets: &[f32; CHANNEL_COUNT], tick: Duration) -> Result<()> {
        let epsilon = self.config.settle.epsilon;
        let span = self.max_error(targets);
        let budget = settle_budget(self.config.smoothing, span, epsilon, self.config.settle.max_ticks);

        for _ in 0..budget {
            if self.max_error(targets) <= epsilon {
                return Ok(());
            }
            if self.cancel.is_cancelled() {
                return Err(ArmError::Cancelled);
            }
            self.tick(targets)?;
            self.clock.sleep(tick);
        }

        let left = self.max_error(targets);
        if left > epsilon {
            warn!("așezare incompletă după {budget} tick-uri: eroare {left:.3}°");
        }
        Ok(())
    }

    /// cea mai mare distanță dintre poziția filtrată și țintă
    fn max_error(&self, targets: &[f32; CHANNEL_COUNT]) -> f32 {
        self.channels
            .iter()
            .zip(targets)
            .map(|(ch, &target)| (ch.position() - target).abs())
            .fold(0.0, f32::max)
    }
}

/// Tick-uri necesare ca eroarea `span` să scadă sub `epsilon` cu factorul `1 - α`
/// pe tick: `ceil(ln(ε / span) / ln(1 - α))`, cel puțin `floor`.
fn settle_budget(alpha: f32, span: f32, epsilon: f32, floor: u32) -> u32 {
    if span <= epsilon {
        return floor;
    }
    if alpha >= 1.0 {
        return floor.max(1);
    }
    let needed = ((epsilon / span).ln() / (1.0 - alpha).ln()).ceil();
    // +1 pentru rotunjirile în virgulă mobilă
    (needed as u32).saturating_add(1).max(floor)
}

fn check_tick(tick: Duration) -> Result<()> {
    if tick.is_zero() {
        return Err(ArmError::InvalidConfig("tick=0".into()));
    }
    Ok(())
}

fn steps_for(duration: f32, tick: Duration) -> u32 {
    ((duration / tick.as_secs_f32()).round() as u32).max(1)
}

/// Respinge NaN/Inf și aplică clamp-ul din calibrare.
fn resolve_targets(calibration: &Calibration, targets: &Targets) -> Result<[Option<f32>; CHANNEL_COUNT]> {
    let mut out = [None; CHANNEL_COUNT];
    for (id, (slot, target)) in ChannelId::ALL.into_iter().zip(out.iter_mut().zip(targets)) {
        let Some(angle) = *target else { continue };
        if !angle.is_finite() {
            return Err(ArmError::NonFiniteTarget { channel: id, value: angle });
        }
        let clamped = calibration.range(id).clamp(angle);
        if clamped != angle {
            debug!("{id}: {angle:.1}° limitat la {clamped:.1}°");
        }
        *slot = Some(clamped);
    }
    Ok(out)
}
