//! Secvențiatorul: pattern-uri compuse din faze blocante.
//!
//! Fiecare pattern e o mașină de stări strict secvențială
//! `Idle → Phase(1) → … → Phase(n) → Homing → Idle`; o fază pornește doar
//! după ce cea anterioară s-a întors. La o eroare hardware brațul e dus
//! direct (fără filtru) la home și eroarea se propagă; la anulare, home lin.

use std::f32::consts::TAU;
use std::time::Duration;

use heapless::Vec as HVec;
use log::{debug, error, info};

use crate::arm::{MoveProfile, ServoArm};
use crate::channel::{self, ChannelId, Targets, CHANNEL_COUNT};
use crate::error::{ArmError, Result};
use crate::gestures::Gesture;
use crate::hal::{Clock, PwmOutput};
use crate::trajectory::Easing;

pub const MAX_PHASES: usize = 32;

/// centrul pe care oscilează gripper-ul în `Wave`
const WAVE_GRIPPER_CENTER: f32 = 75.0;
/// cât durează apropierea de punctul de start al unei traiectorii
const APPROACH_SECONDS: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceState {
    Idle,
    /// faza curentă, numărată de la 1
    Phase(usize),
    Homing,
}

/// Traiectorii închise evaluate la fiecare tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Path {
    /// `shoulder = c + R·sin θ`, `elbow = c + R·cos θ`
    Circle { center: f32, radius: f32, cycles: f32 },
    /// sinusoide defazate pe toate cele 4 axe
    Wave { amplitude: f32, cycles: f32 },
}

impl Path {
    /// țintele la timpul normalizat `t ∈ [0, 1]`
    pub fn sample(&self, t: f32) -> Targets {
        match *self {
            Path::Circle { center, radius, cycles } => {
                let theta = TAU * cycles * t;
                channel::targets(&[
                    (ChannelId::Shoulder, center + radius * theta.sin()),
                    (ChannelId::Elbow, center + radius * theta.cos()),
                ])
            }
            Path::Wave { amplitude, cycles } => {
                let theta = TAU * cycles * t;
                channel::all([
                    90.0 + amplitude * 0.5 * theta.sin(),
                    90.0 + amplitude * 0.4 * (theta + 0.8).sin(),
                    90.0 + amplitude * 0.5 * (theta + 1.6).sin(),
                    WAVE_GRIPPER_CENTER + amplitude * 0.4 * (theta + 2.4).sin(),
                ])
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    Move { targets: Targets, duration: f32, profile: MoveProfile },
    Track { path: Path, duration: f32, tick: Duration },
    /// ține poziția; filtrul continuă să fie apelat
    Pause { duration: f32, tick: Duration },
}

impl Phase {
    pub fn to(targets: Targets, duration: f32, tick: Duration) -> Self {
        Phase::Move { targets, duration, profile: MoveProfile::new(tick) }
    }

    pub fn eased(targets: Targets, duration: f32, tick: Duration, easing: Easing) -> Self {
        Phase::Move { targets, duration, profile: MoveProfile::new(tick).with_easing(easing) }
    }
}

/// Un punct dintr-o secvență arbitrară.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub targets: Targets,
    pub duration: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleParams {
    pub center: f32,
    pub radius: f32,
    pub cycles: u32,
    /// secunde per cerc
    pub period: f32,
    pub tick: Duration,
}

impl Default for CircleParams {
    fn default() -> Self {
        // 250 puncte × 4 ms per cerc
        Self { center: 90.0, radius: 30.0, cycles: 10, period: 1.0, tick: Duration::from_millis(4) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveParams {
    pub amplitude: f32,
    pub cycles: u32,
    pub period: f32,
    pub tick: Duration,
}

impl Default for WaveParams {
    fn default() -> Self {
        // 300 puncte × 6 ms per ciclu
        Self { amplitude: 30.0, cycles: 3, period: 1.8, tick: Duration::from_millis(6) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickPlaceParams {
    /// poza de prindere, cu gripper-ul deschis
    pub reach: [f32; CHANNEL_COUNT],
    pub grip_closed: f32,
    pub grip_open: f32,
    /// umăr/cot la transport
    pub lift_shoulder: f32,
    pub lift_elbow: f32,
    /// unghiul bazei la depunere
    pub place_base: f32,
    pub tick: Duration,
}

impl Default for PickPlaceParams {
    fn default() -> Self {
        Self {
            reach: [90.0, 115.0, 80.0, 120.0],
            grip_closed: 40.0,
            grip_open: 120.0,
            lift_shoulder: 60.0,
            lift_elbow: 90.0,
            place_base: 150.0,
            tick: Duration::from_millis(20),
        }
    }
}

pub struct Sequencer<P, C> {
    arm: ServoArm<P, C>,
    state: SequenceState,
}

impl<P: PwmOutput, C: Clock> Sequencer<P, C> {
    pub fn new(arm: ServoArm<P, C>) -> Self {
        Self { arm, state: SequenceState::Idle }
    }

    pub fn state(&self) -> SequenceState {
        self.state
    }

    pub fn arm(&self) -> &ServoArm<P, C> {
        &self.arm
    }

    pub fn arm_mut(&mut self) -> &mut ServoArm<P, C> {
        &mut self.arm
    }

    pub fn into_inner(self) -> ServoArm<P, C> {
        self.arm
    }

    /// Baleiere pe un singur canal prin `waypoints`, `segment` secunde fiecare.
    pub fn run_sweep(&mut self, id: ChannelId, waypoints: &[f32], segment: f32, tick: Duration) -> Result<()> {
        let mut phases: HVec<Phase, MAX_PHASES> = HVec::new();
        for &angle in waypoints {
            push(&mut phases, Phase::to(channel::targets(&[(id, angle)]), segment, tick))?;
        }
        self.execute("sweep", &phases, 1, true)
    }

    /// Cercuri umăr + cot.
    pub fn run_circle(&mut self, params: CircleParams) -> Result<()> {
        let path = Path::Circle {
            center: params.center,
            radius: params.radius,
            cycles: params.cycles as f32,
        };
        let phases = [
            Phase::to(path.sample(0.0), APPROACH_SECONDS, params.tick),
            Phase::Track { path, duration: params.period * params.cycles as f32, tick: params.tick },
        ];
        self.execute("circle", &phases, 1, true)
    }

    /// Val pe toate axele, cu faze decalate.
    pub fn run_wave(&mut self, params: WaveParams) -> Result<()> {
        let path = Path::Wave { amplitude: params.amplitude, cycles: params.cycles as f32 };
        let phases = [
            Phase::to(path.sample(0.0), APPROACH_SECONDS, params.tick),
            Phase::Track { path, duration: params.period * params.cycles as f32, tick: params.tick },
        ];
        self.execute("wave", &phases, 1, true)
    }

    /// Prinde, ridică, rotește, depune, eliberează.
    pub fn run_pick_and_place(&mut self, p: PickPlaceParams) -> Result<()> {
        use ChannelId::*;

        let [reach_base, reach_shoulder, reach_elbow, _] = p.reach;
        let tick = p.tick;
        let phases = [
            // coborâre cu gripper-ul deschis
            Phase::to(channel::all(p.reach), 2.0, tick),
            Phase::to(channel::targets(&[(Gripper, p.grip_closed)]), 0.8, tick),
            Phase::Pause { duration: 0.2, tick },
            Phase::to(
                channel::targets(&[(Shoulder, p.lift_shoulder), (Elbow, p.lift_elbow)]),
                1.2,
                tick,
            ),
            Phase::to(channel::targets(&[(Base, p.place_base)]), 1.5, tick),
            Phase::to(
                channel::targets(&[(Shoulder, reach_shoulder), (Elbow, reach_elbow)]),
                1.2,
                tick,
            ),
            Phase::to(channel::targets(&[(Gripper, p.grip_open)]), 0.6, tick),
            Phase::to(
                channel::targets(&[(Shoulder, p.lift_shoulder), (Elbow, p.lift_elbow)]),
                1.0,
                tick,
            ),
            Phase::to(channel::targets(&[(Base, reach_base)]), 1.5, tick),
        ];
        self.execute("pick_and_place", &phases, 1, true)
    }

    /// Demo de gripper: „snap open”, prindere blândă, pulsuri, eliberare lină.
    pub fn run_gripper_show(&mut self, tick: Duration) -> Result<()> {
        let g = |angle| channel::targets(&[(ChannelId::Gripper, angle)]);
        let mut phases: HVec<Phase, MAX_PHASES> = HVec::new();
        push(&mut phases, Phase::eased(g(120.0), 0.25, tick, Easing::PowerIn { exponent: 0.3 }))?;
        push(&mut phases, Phase::Pause { duration: 0.2, tick })?;
        push(&mut phases, Phase::eased(g(40.0), 1.0, tick, Easing::PowerOut { exponent: 0.4 }))?;
        push(&mut phases, Phase::Pause { duration: 0.3, tick })?;
        for _ in 0..4 {
            push(&mut phases, Phase::to(g(35.0), 0.2, tick))?;
            push(&mut phases, Phase::to(g(50.0), 0.2, tick))?;
        }
        push(&mut phases, Phase::to(g(90.0), 0.75, tick))?;
        self.execute("gripper_show", &phases, 1, true)
    }

    /// Secvență arbitrară de puncte.
    pub fn run_waypoints(&mut self, name: &str, waypoints: &[Waypoint], tick: Duration) -> Result<()> {
        let mut phases: HVec<Phase, MAX_PHASES> = HVec::new();
        for w in waypoints {
            push(&mut phases, Phase::to(w.targets, w.duration, tick))?;
        }
        self.execute(name, &phases, 1, true)
    }

    pub fn run_gesture(&mut self, gesture: &Gesture, tick: Duration) -> Result<()> {
        let speed = gesture.speed;
        if !(speed.is_finite() && speed > 0.0) {
            return Err(ArmError::InvalidConfig(format!("{}: speed={speed}", gesture.name)));
        }
        let mut phases: HVec<Phase, MAX_PHASES> = HVec::new();
        for k in &gesture.keyframes {
            push(&mut phases, Phase::to(channel::all(k.angles), k.duration / speed, tick))?;
        }
        self.execute(gesture.name, &phases, gesture.loops.max(1), gesture.return_home)
    }

    fn execute(&mut self, name: &str, phases: &[Phase], repeat: u32, return_home: bool) -> Result<()> {
        info!("▶ {name}: {} faze × {repeat}", phases.len());

        for round in 0..repeat {
            for (n, phase) in phases.iter().enumerate() {
                self.state = SequenceState::Phase(n + 1);
                debug!("{name}: runda {} faza {}", round + 1, n + 1);
                if let Err(e) = self.run_phase(phase) {
                    return Err(self.abort(name, e));
                }
            }
        }

        if return_home {
            self.state = SequenceState::Homing;
            if let Err(e) = self.arm.home() {
                return Err(self.abort(name, e));
            }
        }
        self.state = SequenceState::Idle;
        info!("✅ {name} terminat");
        Ok(())
    }

    fn run_phase(&mut self, phase: &Phase) -> Result<()> {
        let cfg = self.arm.config();
        match *phase {
            Phase::Move { targets, duration, profile } => {
                let profile = MoveProfile { tick: cfg.scaled_tick(profile.tick), ..profile };
                let duration = cfg.scaled(duration);
                self.arm.move_to_with(targets, duration, profile)
            }
            Phase::Track { path, duration, tick } => {
                let (duration, tick) = (cfg.scaled(duration), cfg.scaled_tick(tick));
                self.arm.track(duration, tick, |t| path.sample(t))
            }
            Phase::Pause { duration, tick } => {
                let profile = MoveProfile::new(cfg.scaled_tick(tick));
                let duration = cfg.scaled(duration);
                self.arm.move_to_with([None; CHANNEL_COUNT], duration, profile)
            }
        }
    }

    /// Duce brațul într-o stare sigură și întoarce eroarea originală.
    fn abort(&mut self, name: &str, err: ArmError) -> ArmError {
        error!("⛔ {name} oprit în {:?}: {err}", self.state);
        self.state = SequenceState::Homing;

        let recovery = match &err {
            ArmError::Hardware { channel, .. } => {
                // fără filtru, și fără canalul defect
                let mut targets = self.arm.config().calibration.defaults().map(Some);
                targets[channel.index()] = None;
                self.arm.move_to(targets, 0.0)
            }
            ArmError::Cancelled => {
                self.arm.cancel_token().reset();
                self.arm.home()
            }
            _ => self.arm.home(),
        };
        if let Err(e) = recovery {
            error!("{name}: revenirea la home a eșuat: {e}");
        }

        self.state = SequenceState::Idle;
        err
    }
}

fn push(phases: &mut HVec<Phase, MAX_PHASES>, phase: Phase) -> Result<()> {
    phases
        .push(phase)
        .map_err(|_| ArmError::InvalidConfig(format!("mai mult de {MAX_PHASES} faze")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArmConfig;
    use crate::hal::sim::{SimClock, SimPwm};
    use approx::assert_abs_diff_eq;

    fn sequencer() -> Sequencer<SimPwm, SimClock> {
        let arm = ServoArm::new(ArmConfig::default(), SimPwm::new(), SimClock::new()).unwrap();
        Sequencer::new(arm)
    }

    fn assert_home(seq: &Sequencer<SimPwm, SimClock>) {
        for p in seq.arm().positions() {
            assert_abs_diff_eq!(p, 90.0, epsilon = 0.5);
        }
    }

    #[test]
    fn test_circle_path_stays_on_circle() {
        let path = Path::Circle { center: 90.0, radius: 30.0, cycles: 1.0 };
        for i in 0..=250 {
            let t = path.sample(i as f32 / 250.0);
            let (s, e) = (t[1].unwrap(), t[2].unwrap());
            assert_abs_diff_eq!((s - 90.0).powi(2) + (e - 90.0).powi(2), 900.0, epsilon = 0.05);
            assert!(t[0].is_none() && t[3].is_none());
        }
    }

    #[test]
    fn test_wave_phase_offsets() {
        let path = Path::Wave { amplitude: 30.0, cycles: 1.0 };
        let t0 = path.sample(0.0);
        assert_abs_diff_eq!(t0[0].unwrap(), 90.0, epsilon = 1e-4);
        assert_abs_diff_eq!(t0[1].unwrap(), 90.0 + 12.0 * 0.8f32.sin(), epsilon = 1e-4);
        assert_abs_diff_eq!(t0[3].unwrap(), 75.0 + 12.0 * 2.4f32.sin(), epsilon = 1e-4);
    }

    #[test]
    fn test_sweep_ends_home_and_idle() {
        let mut seq = sequencer();
        seq.run_sweep(ChannelId::Base, &[160.0, 20.0, 90.0], 0.3, Duration::from_millis(3))
            .unwrap();
        assert_eq!(seq.state(), SequenceState::Idle);
        assert_home(&seq);
    }

    #[test]
    fn test_hardware_fault_aborts_to_direct_home() {
        let mut seq = sequencer();
        seq.arm_mut().pwm_mut().inject_fault(ChannelId::Elbow);
        let err = seq.run_circle(CircleParams { cycles: 1, ..Default::default() }).unwrap_err();
        assert_eq!(err.channel(), Some(ChannelId::Elbow));
        assert_eq!(seq.state(), SequenceState::Idle);
        // canalele sănătoase au fost scrise direct la home
        let home_duty = seq.arm().config().duty.quantize(90.0);
        for id in [ChannelId::Base, ChannelId::Shoulder, ChannelId::Gripper] {
            assert_eq!(seq.arm().channel(id).position(), 90.0);
            assert_eq!(seq.arm().channel(id).last_duty(), Some(home_duty));
        }
    }

    #[test]
    fn test_cancel_returns_home() {
        let mut seq = sequencer();
        seq.arm().cancel_token().cancel();
        let err = seq.run_wave(WaveParams { cycles: 1, ..Default::default() }).unwrap_err();
        assert!(matches!(err, ArmError::Cancelled));
        assert!(!seq.arm().cancel_token().is_cancelled());
        assert_home(&seq);
    }

    #[test]
    fn test_too_many_waypoints_rejected() {
        let mut seq = sequencer();
        let wp = Waypoint { targets: channel::all([90.0; 4]), duration: 0.1 };
        let many = [wp; MAX_PHASES + 1];
        let err = seq.run_waypoints("long", &many, Duration::from_millis(10)).unwrap_err();
        assert!(matches!(err, ArmError::InvalidConfig(_)));
        assert!(seq.arm().pwm().writes().is_empty());
    }

    #[test]
    fn test_gripper_show_completes() {
        let mut seq = sequencer();
        seq.run_gripper_show(Duration::from_millis(5)).unwrap();
        assert_home(&seq);
        assert!(seq.arm().write_count() > 0);
    }

    #[test]
    fn test_speed_multiplier_stretches_time() {
        let run = |speed: f32| {
            let cfg = ArmConfig { speed_multiplier: speed, ..Default::default() };
            let arm = ServoArm::new(cfg, SimPwm::new(), SimClock::new()).unwrap();
            let mut seq = Sequencer::new(arm);
            seq.run_sweep(ChannelId::Base, &[150.0], 1.0, Duration::from_millis(10)).unwrap();
            seq.arm().clock().now()
        };
        let slow = run(2.0);
        let fast = run(1.0);
        assert!(slow > fast + Duration::from_millis(900), "{slow:?} vs {fast:?}");
    }
}
