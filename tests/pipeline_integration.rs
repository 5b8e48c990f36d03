//! End-to-end tests over in-memory sensor streams
//!
//! These run the same calibration and control code the CLI uses, with a
//! sample-count clock so timing is exact and independent of the machine.

use std::f64::consts::PI;
use std::io::Cursor;
use std::time::Duration;

use beta_drive::calibration::{CalibrationCondition, Calibrator, ThresholdConfig};
use beta_drive::config::AppConfig;
use beta_drive::control::Command;
use beta_drive::error::CalibrationError;
use beta_drive::link::{LineSensor, SampleClock, WriterSink};
use beta_drive::{ControlLoop, FeaturePipeline};

const RATE: usize = 512;

fn tone(freq: f64, amplitude: f64, windows: usize) -> Vec<f64> {
    (0..RATE * windows)
        .map(|i| amplitude * (2.0 * PI * freq * i as f64 / RATE as f64).sin())
        .collect()
}

fn to_lines(samples: &[f64]) -> String {
    samples.iter().map(|s| format!("{:.9}\n", s)).collect()
}

fn sensor(text: String) -> LineSensor<Cursor<Vec<u8>>> {
    LineSensor::new(Cursor::new(text.into_bytes()))
}

#[test]
fn test_calibration_then_control() {
    let config = AppConfig::default();

    // Relaxed: mostly alpha. Concentrated: strong beta.
    let mut recording = to_lines(&tone(10.0, 2.0, 3));
    recording.push_str(&to_lines(&tone(20.0, 2.0, 3)));

    let mut calibrator = Calibrator::new(
        FeaturePipeline::new(&config.dsp).unwrap(),
        sensor(recording),
        SampleClock::new(config.dsp.sample_rate),
    );
    let outcome = calibrator
        .calibrate(Duration::from_secs(3), |_| {})
        .expect("calibration should succeed");
    assert_eq!(outcome.relaxed.len(), 3);
    assert_eq!(outcome.concentrated.len(), 3);
    assert!(outcome.relaxed.mean() < outcome.thresholds.threshold());
    assert!(outcome.thresholds.threshold() < outcome.concentrated.mean());

    // Relaxed for two seconds, then concentrated for five
    let mut live = tone(10.0, 2.0, 2);
    live.extend(tone(20.0, 2.0, 5));
    let mut control = ControlLoop::new(
        &config,
        &outcome.thresholds,
        WriterSink::new(Vec::new()),
    )
    .unwrap();
    let mut clock = SampleClock::new(config.dsp.sample_rate);
    let mut timeline = Vec::new();
    let summary = control
        .run(&mut sensor(to_lines(&live)), &mut clock, |report| {
            for command in &report.commands {
                timeline.push((report.index, *command));
            }
        })
        .unwrap();

    assert_eq!(summary.windows, 7);
    assert_eq!(summary.spikes, 0);
    assert_eq!(timeline, vec![(3, Command::Move), (6, Command::Stop)]);
    assert_eq!(control.into_sink().into_inner(), b"FS".to_vec());
}

#[test]
fn test_malformed_lines_are_skipped_without_shifting_windows() {
    let config = AppConfig::default();
    let thresholds = ThresholdConfig::from_means(0.1, 0.1);

    let samples = tone(20.0, 1.0, 2);
    let mut noisy = String::new();
    for (i, sample) in samples.iter().enumerate() {
        if i % 100 == 0 {
            noisy.push_str("ERR\n\n  \n");
        }
        noisy.push_str(&format!("{:.9}\n", sample));
    }

    let mut clean_loop = ControlLoop::new(&config, &thresholds, WriterSink::new(Vec::new())).unwrap();
    let mut noisy_loop = ControlLoop::new(&config, &thresholds, WriterSink::new(Vec::new())).unwrap();

    let mut clean = Vec::new();
    clean_loop
        .run(
            &mut sensor(to_lines(&samples)),
            &mut SampleClock::new(config.dsp.sample_rate),
            |report| clean.push(report.beta_energy),
        )
        .unwrap();
    let mut noisy_energies = Vec::new();
    let summary = noisy_loop
        .run(
            &mut sensor(noisy),
            &mut SampleClock::new(config.dsp.sample_rate),
            |report| noisy_energies.push(report.beta_energy),
        )
        .unwrap();

    assert_eq!(summary.malformed_lines, 11);
    assert_eq!(summary.samples, 1024);
    assert_eq!(clean, noisy_energies);
}

#[test]
fn test_calibration_without_a_window_reports_condition() {
    let config = AppConfig::default();
    let mut calibrator = Calibrator::new(
        FeaturePipeline::new(&config.dsp).unwrap(),
        sensor(to_lines(&tone(20.0, 1.0, 1)[..300])),
        SampleClock::new(config.dsp.sample_rate),
    );
    let err = calibrator
        .calibrate(Duration::from_secs(2), |_| {})
        .unwrap_err();
    assert!(matches!(
        err,
        CalibrationError::NoWindowsCompleted { ref label, .. } if label == CalibrationCondition::Relaxed.label()
    ));
}

#[test]
fn test_saved_thresholds_drive_the_loop() {
    let path = std::env::temp_dir().join(format!(
        "beta_drive_pipeline_thresholds_{}.json",
        std::process::id()
    ));
    ThresholdConfig::from_means(0.05, 0.15).save(&path).unwrap();
    let loaded = ThresholdConfig::load(&path).unwrap();
    assert!((loaded.threshold() - 0.1).abs() < 1e-12);

    let config = AppConfig::default();
    let mut control = ControlLoop::new(&config, &loaded, WriterSink::new(Vec::new())).unwrap();
    let summary = control
        .run(
            &mut sensor(to_lines(&tone(20.0, 1.0, 2))),
            &mut SampleClock::new(config.dsp.sample_rate),
            |_| {},
        )
        .unwrap();
    assert_eq!(summary.moves, 1);
    assert_eq!(summary.stops, 0);
    assert!(control.state().moving);

    let _ = std::fs::remove_file(&path);
}
