//! Configuration loading and config-driven construction.

mod common;

use common::Rig;
use drv8825_motion::error::ConfigError;
use drv8825_motion::{load_config, parse_config, Error, MicrostepMode, SleepPolicy};
use embedded_hal::digital::PinState::{High, Low};

const BENCH_CONFIG: &str = r#"
[motors.feeder]
name = "Feeder"
mode = "1/8"
full_steps_per_revolution = 200
target_time_for_one_revolution_ms = 1000.0
sleep_policy = "reject"

[motors.turntable]
mode = 32
wake_settle_us = 0
init_on_build = false
"#;

#[test]
fn builder_from_named_motor_config() {
    let config = parse_config(BENCH_CONFIG).expect("Should parse bench config");
    let names: Vec<&str> = config.motor_names().collect();
    assert_eq!(names, vec!["feeder", "turntable"]);

    let rig = Rig::new();
    let motor = rig
        .builder()
        .from_config(&config, "feeder")
        .unwrap()
        .build()
        .unwrap();

    assert_eq!(motor.name(), "Feeder");
    assert_eq!(motor.mode(), MicrostepMode::Eighth);
    assert_eq!(motor.steps_per_revolution(), 1_600);
    // 1000 ms / 1600 / 2 = 0.3125 ms
    assert_eq!(motor.timing().half_pulse().ticks(), 313);
    assert_eq!(rig.mode_lines(), [Some(High), Some(High), Some(Low)]);
}

#[test]
fn config_sleep_policy_and_init_flag_apply() {
    let config = parse_config(BENCH_CONFIG).unwrap();

    let rig = Rig::new();
    let mut motor = rig
        .builder()
        .from_config(&config, "turntable")
        .unwrap()
        .build()
        .unwrap();
    assert!(rig.enable.writes().is_empty());
    assert_eq!(motor.mode(), MicrostepMode::ThirtySecond);

    // Default policy wakes on demand
    motor.sleep().unwrap();
    assert_eq!(motor.steps(3, true).unwrap().steps_done(), 3);

    let rig = Rig::new();
    let mut motor = rig
        .builder()
        .from_config(&config, "feeder")
        .unwrap()
        .build()
        .unwrap();
    motor.sleep().unwrap();
    assert!(motor.steps(3, true).is_err());
    assert_eq!(config.motor("feeder").unwrap().sleep_policy, SleepPolicy::Reject);
}

#[test]
fn unknown_motor_name() {
    let config = parse_config(BENCH_CONFIG).unwrap();
    let rig = Rig::new();

    let err = rig.builder().from_config(&config, "gantry").err().unwrap();
    assert!(matches!(
        err,
        Error::Config(ConfigError::MotorNotFound(ref name)) if name.as_str() == "gantry"
    ));
}

#[test]
fn invalid_values_rejected_on_parse() {
    let zero_steps = r#"
[motors.m1]
full_steps_per_revolution = 0
"#;
    assert!(matches!(
        parse_config(zero_steps),
        Err(Error::Config(ConfigError::InvalidStepsPerRevolution(0)))
    ));

    let bad_mode = r#"
[motors.m1]
mode = "1/64"
"#;
    assert!(matches!(
        parse_config(bad_mode),
        Err(Error::Config(ConfigError::ParseError(_)))
    ));

    let bad_policy = r#"
[motors.m1]
sleep_policy = "ignore"
"#;
    assert!(parse_config(bad_policy).is_err());
}

#[test]
fn load_config_from_file() {
    let path = std::env::temp_dir().join(format!("drv8825_motion_{}.toml", std::process::id()));
    std::fs::write(&path, BENCH_CONFIG).unwrap();

    let config = load_config(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(config.motor("turntable").unwrap().steps_per_revolution(), 6_400);
    assert_eq!(config.motor("turntable").unwrap().mode.lines(), [High, Low, High]);
    assert_eq!(MicrostepMode::Full.lines(), [Low, Low, Low]);
}

#[test]
fn load_config_missing_file() {
    let result = load_config("/nonexistent/drv8825_motion.toml");
    assert!(matches!(result, Err(Error::Config(ConfigError::IoError(_)))));
}
