mod common;

use std::time::Duration;

use approx::assert_abs_diff_eq;
use servo_arm::channel::{self, ChannelId};
use servo_arm::hal::sim::{SimClock, SimPwm};
use servo_arm::hal::Clock;
use servo_arm::sequencer::{CircleParams, PickPlaceParams};
use servo_arm::{minimum_jerk, ArmConfig, MoveProfile, SequenceState, Sequencer, ServoArm};

use common::*;

#[test]
fn endpoint_is_reached_after_settling() {
    for (target, duration) in [(160.0, 0.9), (0.0, 0.3), (91.0, 0.05), (180.0, 2.0)] {
        let mut arm = default_arm();
        arm.move_to(channel::targets(&[(ChannelId::Base, target)]), duration).unwrap();
        assert_abs_diff_eq!(arm.channel(ChannelId::Base).position(), target, epsilon = 0.05);
    }
}

#[test]
fn sweep_follows_minimum_jerk() {
    let mut arm = default_arm();
    let samples = record(&mut arm);

    let profile = MoveProfile::new(Duration::from_millis(3));
    arm.move_to_with(channel::targets(&[(ChannelId::Base, 160.0)]), 0.9, profile)
        .unwrap();

    let samples = take(&samples);
    assert_eq!(samples.len(), 300);
    for (i, s) in samples.iter().enumerate() {
        let i = i as u32 + 1;
        assert_eq!(s.index, i);
        let expected = 90.0 + 70.0 * minimum_jerk(i as f32 / 300.0);
        assert_abs_diff_eq!(s.targets[0], expected, epsilon = 1e-3);
    }
    assert_eq!(samples.last().unwrap().targets[0], 160.0);
    assert_abs_diff_eq!(arm.channel(ChannelId::Base).position(), 160.0, epsilon = 0.05);
}

#[test]
fn home_after_arbitrary_pose() {
    let mut arm = embedded_arm();
    arm.move_to(channel::all([10.0, 30.0, 150.0, 110.0]), 0.5).unwrap();
    arm.home().unwrap();

    let defaults = arm.config().calibration.defaults();
    for (p, d) in arm.positions().into_iter().zip(defaults) {
        assert_abs_diff_eq!(p, d, epsilon = 0.5);
    }
}

#[test]
fn out_of_range_request_is_clamped() {
    let mut arm = embedded_arm();
    let samples = record(&mut arm);

    arm.move_to(channel::targets(&[(ChannelId::Shoulder, 200.0)]), 1.0).unwrap();

    let shoulder = arm.channel(ChannelId::Shoulder);
    assert_eq!(shoulder.commanded(), 121.0);
    assert_abs_diff_eq!(shoulder.position(), 121.0, epsilon = 0.05);
    assert!(take(&samples).iter().all(|s| s.targets[1] <= 121.0));

    let duty = arm.config().duty;
    let ceiling = duty.to_hw(duty.quantize(121.0));
    assert!(arm.pwm().writes_for(ChannelId::Shoulder).all(|d| d <= ceiling));
}

#[test]
fn circular_path_keeps_radius() {
    let mut arm = default_arm();
    let samples = record(&mut arm);

    arm.track(1.0, Duration::from_millis(4), |t| {
        let theta = std::f32::consts::TAU * t;
        channel::targets(&[
            (ChannelId::Shoulder, 90.0 + 30.0 * theta.sin()),
            (ChannelId::Elbow, 90.0 + 30.0 * theta.cos()),
        ])
    })
    .unwrap();

    let samples = take(&samples);
    assert_eq!(samples.len(), 250);
    for s in samples {
        let r2 = (s.targets[1] - 90.0).powi(2) + (s.targets[2] - 90.0).powi(2);
        assert_abs_diff_eq!(r2, 900.0, epsilon = 0.1);
        // baza și gripper-ul nu sunt atinse
        assert_eq!(s.targets[0], 90.0);
        assert_eq!(s.targets[3], 90.0);
    }
}

#[test]
fn identical_target_is_not_rewritten() {
    let cfg = ArmConfig { smoothing: 1.0, ..Default::default() };
    let mut arm = arm_with(cfg);
    arm.home_direct().unwrap();

    let hold_45 = |_t: f32| channel::targets(&[(ChannelId::Base, 45.0)]);
    let tick = Duration::from_millis(10);

    let before = arm.write_count();
    arm.track(0.01, tick, hold_45).unwrap();
    assert_eq!(arm.write_count(), before + 1);

    let before = arm.write_count();
    arm.track(0.01, tick, hold_45).unwrap();
    assert_eq!(arm.write_count(), before);
}

#[test]
fn slow_motion_skips_most_writes() {
    let mut arm = default_arm();
    arm.home_direct().unwrap();
    let before = arm.write_count();

    let profile = MoveProfile::new(Duration::from_millis(5));
    arm.move_to_with(channel::targets(&[(ChannelId::Base, 100.0)]), 2.0, profile)
        .unwrap();

    // 400 tick-uri, dar doar ~6 pași de duty pe 10°
    let writes = arm.write_count() - before;
    assert!(writes < 40, "{writes} scrieri");
}

#[test]
fn coordinated_axes_share_t() {
    let mut arm = default_arm();
    let samples = record(&mut arm);

    let targets = channel::targets(&[(ChannelId::Base, 150.0), (ChannelId::Elbow, 30.0)]);
    arm.move_to(targets, 0.5).unwrap();

    let samples = take(&samples);
    assert_eq!(samples.len(), 50);
    for (i, s) in samples.iter().enumerate() {
        assert_eq!(s.t, (i + 1) as f32 / 50.0);
        assert_eq!(s.factor, minimum_jerk(s.t));
        assert_abs_diff_eq!(s.targets[0], 90.0 + 60.0 * s.factor, epsilon = 1e-4);
        assert_abs_diff_eq!(s.targets[2], 90.0 - 60.0 * s.factor, epsilon = 1e-4);
    }
}

#[test]
fn overrun_skips_ticks_but_keeps_duration() {
    let clock = SimClock::with_oversleep(Duration::from_millis(25));
    let mut arm = ServoArm::new(ArmConfig::default(), SimPwm::new(), clock).unwrap();
    let samples = record(&mut arm);

    arm.track(1.0, Duration::from_millis(10), |_| channel::targets(&[(ChannelId::Base, 120.0)]))
        .unwrap();

    let samples = take(&samples);
    assert!(samples.len() < 100, "{} tick-uri", samples.len());
    assert!(samples.windows(2).all(|w| w[1].index > w[0].index));
    assert_eq!(samples.last().unwrap().t, 1.0);
    assert!(arm.clock().now() < Duration::from_millis(1100));
}

#[test]
fn independent_arms_do_not_share_state() {
    let mut left = default_arm();
    let mut right = default_arm();
    left.move_to(channel::targets(&[(ChannelId::Gripper, 40.0)]), 0.3).unwrap();
    assert_eq!(right.channel(ChannelId::Gripper).position(), 90.0);
    right.move_to(channel::targets(&[(ChannelId::Gripper, 120.0)]), 0.3).unwrap();
    assert_abs_diff_eq!(left.channel(ChannelId::Gripper).position(), 40.0, epsilon = 0.05);
}

#[test]
fn pick_and_place_runs_to_idle() {
    let mut seq = Sequencer::new(embedded_arm());
    seq.run_pick_and_place(PickPlaceParams::default()).unwrap();
    seq.run_circle(CircleParams { cycles: 2, ..Default::default() }).unwrap();
    assert_eq!(seq.state(), SequenceState::Idle);
    for p in seq.arm().positions() {
        assert_abs_diff_eq!(p, 90.0, epsilon = 0.5);
    }
}

#[test]
fn home_is_exact_with_slow_filter() {
    for alpha in [0.1, 0.05] {
        let mut arm = arm_with(ArmConfig { smoothing: alpha, ..Default::default() });
        arm.move_to(channel::all([0.0, 0.0, 180.0, 180.0]), 0.0).unwrap();
        arm.home().unwrap();

        for p in arm.positions() {
            assert_abs_diff_eq!(p, 90.0, epsilon = 0.05);
        }
    }
}
