//! Control lin pentru un braț cu 4 servo-uri (Base, Shoulder, Elbow, Gripper).
//!
//! Traiectorie minimum-jerk → filtru exponențial → cuantizare duty → scriere
//! PWM doar la schimbare, la un tick fix.

pub mod arm;
pub mod calibration;
pub mod channel;
pub mod config;
pub mod error;
pub mod filter;
pub mod gestures;
pub mod hal;
pub mod quantizer;
pub mod sequencer;
pub mod trajectory;

pub use arm::{CancelToken, MoveProfile, ServoArm, TickSample};
pub use calibration::{Calibration, CalibrationRange};
pub use channel::{ChannelId, Targets, CHANNEL_COUNT};
pub use config::ArmConfig;
pub use error::{ArmError, Result};
pub use sequencer::{Phase, SequenceState, Sequencer, Waypoint};
pub use trajectory::{minimum_jerk, Easing};
