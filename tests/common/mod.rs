#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use servo_arm::hal::sim::{SimClock, SimPwm};
use servo_arm::{ArmConfig, ServoArm, TickSample};

pub type SimArm = ServoArm<SimPwm, SimClock>;

pub fn arm_with(config: ArmConfig) -> SimArm {
    ServoArm::new(config, SimPwm::new(), SimClock::new()).unwrap()
}

pub fn default_arm() -> SimArm {
    arm_with(ArmConfig::default())
}

/// calibrarea din `config/arm.json`
pub fn embedded_arm() -> SimArm {
    arm_with(ArmConfig::embedded().unwrap())
}

/// Atașează un observator care colectează toate tick-urile.
pub fn record(arm: &mut SimArm) -> Arc<Mutex<Vec<TickSample>>> {
    let samples = Arc::new(Mutex::new(Vec::new()));
    let sink = samples.clone();
    arm.set_observer(Some(Box::new(move |s: &TickSample| {
        sink.lock().unwrap().push(*s);
    })));
    samples
}

pub fn take(samples: &Arc<Mutex<Vec<TickSample>>>) -> Vec<TickSample> {
    std::mem::take(&mut *samples.lock().unwrap())
}
