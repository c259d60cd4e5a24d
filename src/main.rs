// ===================== main.rs =====================
// Demo complet: cercuri, baleiere pe bază, gripper, val, pick & place, salut.
//  • pe ESP32: LEDC pe GPIO 4/5/6/7, EspLogger
//  • pe host: PWM simulat, env_logger (RUST_LOG=trace arată fiecare scriere)

use std::time::Duration;

use anyhow::Result;
use log::info;

use servo_arm::{
    gestures,
    hal::{PwmOutput, StdClock},
    sequencer::{CircleParams, PickPlaceParams, WaveParams},
    ArmConfig, ChannelId, Sequencer, ServoArm,
};

fn demo<P: PwmOutput>(seq: &mut Sequencer<P, StdClock>) -> Result<()> {
    // 1️⃣  cercuri umăr + cot
    info!("1. Arm circles…");
    seq.run_circle(CircleParams::default())?;

    // 2️⃣  baza: 90 → 160 → 20 → 90
    info!("2. Base rotation…");
    seq.run_sweep(ChannelId::Base, &[160.0, 20.0, 90.0], 0.9, Duration::from_millis(3))?;

    // 3️⃣  gripper
    info!("3. Gripper…");
    seq.run_gripper_show(Duration::from_millis(4))?;

    // 4️⃣  val pe toate axele
    info!("4. Wave…");
    seq.run_wave(WaveParams::default())?;

    // 5️⃣  pick & place
    info!("5. Pick & place…");
    seq.run_pick_and_place(PickPlaceParams::default())?;

    // 6️⃣  salut
    if let Some(g) = gestures::by_name("wave_friendly") {
        info!("6. Gesture {}…", g.name);
        seq.run_gesture(&g, Duration::from_millis(10))?;
    }
    Ok(())
}

fn run<P: PwmOutput>(cfg: ArmConfig, pwm: P) -> Result<()> {
    info!("=== ROBOT ARM CONTROLLER ===");
    info!(
        "α={} tick={} ms duty {}..{} @ {} Hz / {} biți",
        cfg.smoothing,
        cfg.tick_ms,
        cfg.duty.min_duty,
        cfg.duty.max_duty,
        cfg.duty.frequency_hz,
        cfg.duty.resolution_bits
    );

    let mut arm = ServoArm::new(cfg, pwm, StdClock::new())?;

    // poziția fizică e necunoscută: scriere directă la home, filtrul pornește de acolo
    arm.home_direct()?;

    let mut seq = Sequencer::new(arm);
    demo(&mut seq)?;

    info!("🏁 Demo complet – {} scrieri PWM", seq.arm().write_count());
    Ok(())
}

#[cfg(target_os = "espidf")]
fn main() -> Result<()> {
    use esp_idf_hal::peripherals::Peripherals;
    use esp_idf_svc::{log::EspLogger, sys::link_patches};
    use servo_arm::hal::ledc::LedcServos;

    link_patches();
    EspLogger::initialize_default();

    let per = Peripherals::take()?;
    let cfg = ArmConfig::embedded()?;
    let pwm = LedcServos::new(
        per.ledc,
        per.pins.gpio4,
        per.pins.gpio5,
        per.pins.gpio6,
        per.pins.gpio7,
        cfg.duty.frequency_hz,
        cfg.duty.resolution_bits,
    )?;

    if let Err(e) = run(cfg, pwm) {
        log::error!("demo oprit: {e:?}");
    }

    // bucla principală – idle, servo-urile își țin poziția
    loop {
        std::thread::sleep(Duration::from_secs(60));
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() -> Result<()> {
    use servo_arm::hal::sim::SimPwm;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // argument opțional: calea unui arm.json
    let cfg = match std::env::args().nth(1) {
        Some(path) => ArmConfig::load(std::path::Path::new(&path))?,
        None => ArmConfig::embedded()?,
    };
    run(cfg, SimPwm::unrecorded())
}
