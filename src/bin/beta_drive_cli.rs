use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use beta_drive::calibration::{CalibrationCondition, Calibrator, ThresholdConfig};
use beta_drive::config::{duration_from_secs, AppConfig};
use beta_drive::error::log_calibration_error;
use beta_drive::link::{serial, LineSensor, SampleClock, SystemClock, WriterSink};
use beta_drive::{ControlLoop, FeaturePipeline};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "beta_drive_cli",
    about = "Beta-band EEG calibration and threshold control for a serial actuator"
)]
struct Cli {
    /// JSON tuning file (defaults to beta_drive.json when present)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Debug logging, including every window's beta energy
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Record relaxed and concentrated sessions and save the threshold
    Calibrate {
        #[arg(long)]
        sensor_port: Option<String>,
        /// Seconds per session
        #[arg(long)]
        duration: Option<f64>,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Start each session without waiting for ENTER
        #[arg(long)]
        no_prompt: bool,
        /// Recorded relaxed samples instead of the serial sensor
        #[arg(long, requires = "concentrated_input")]
        relaxed_input: Option<PathBuf>,
        /// Recorded concentrated samples instead of the serial sensor
        #[arg(long, requires = "relaxed_input")]
        concentrated_input: Option<PathBuf>,
    },
    /// Drive the actuator from the live sensor until interrupted
    Run {
        #[arg(long)]
        thresholds: Option<PathBuf>,
        #[arg(long)]
        sensor_port: Option<String>,
        #[arg(long)]
        actuator_port: Option<String>,
    },
    /// Feed a recorded sample file through the control loop and print each window as JSON
    Replay {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, conflicts_with = "threshold")]
        thresholds: Option<PathBuf>,
        /// Fixed threshold instead of a thresholds file
        #[arg(long)]
        threshold: Option<f64>,
        /// Write the actuator bytes to this file
        #[arg(long)]
        actuator_out: Option<PathBuf>,
    },
    /// List serial ports
    ListPorts,
    /// Print the saved thresholds
    ShowThresholds {
        #[arg(long)]
        thresholds: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path),
        None if Path::new(beta_drive::config::DEFAULT_CONFIG_PATH).exists() => AppConfig::load(),
        None => AppConfig::default(),
    };
    config.validate().context("inconsistent configuration")?;

    match cli.command {
        Commands::Calibrate {
            sensor_port,
            duration,
            output,
            no_prompt,
            relaxed_input,
            concentrated_input,
        } => {
            let output = output.unwrap_or_else(|| config.calibration.thresholds_path.clone().into());
            let duration = match duration {
                Some(secs) => {
                    let duration = duration_from_secs("--duration", secs)?;
                    if duration.is_zero() {
                        bail!("calibration duration must be positive (got {secs})");
                    }
                    duration
                }
                None => config.calibration.duration(),
            };
            let thresholds = match (relaxed_input, concentrated_input) {
                (Some(relaxed), Some(concentrated)) => {
                    calibrate_from_files(&config, &relaxed, &concentrated, duration)?
                }
                _ => calibrate_live(&config, sensor_port, duration, no_prompt)?,
            };
            report_thresholds(&thresholds);
            thresholds.save(&output)?;
            println!(
                "Calibration completed and thresholds saved to '{}'.",
                output.display()
            );
            Ok(ExitCode::from(0))
        }
        Commands::Run {
            thresholds,
            sensor_port,
            actuator_port,
        } => run_live(&config, thresholds, sensor_port, actuator_port),
        Commands::Replay {
            input,
            thresholds,
            threshold,
            actuator_out,
        } => run_replay(&config, &input, thresholds, threshold, actuator_out),
        Commands::ListPorts => {
            let ports = serial::list_ports();
            if ports.is_empty() {
                println!("No serial ports found");
            }
            for port in ports {
                println!("{port}");
            }
            Ok(ExitCode::from(0))
        }
        Commands::ShowThresholds { thresholds } => {
            let path = thresholds_path(&config, thresholds);
            let loaded = ThresholdConfig::load(&path)?;
            println!("{}", serde_json::to_string_pretty(&loaded)?);
            Ok(ExitCode::from(0))
        }
    }
}

fn thresholds_path(config: &AppConfig, override_path: Option<PathBuf>) -> PathBuf {
    override_path.unwrap_or_else(|| config.calibration.thresholds_path.clone().into())
}

fn wait_for_enter(condition: CalibrationCondition) {
    println!(
        "Press ENTER to start {} calibration...",
        condition.display_name()
    );
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) => tracing::warn!(
            "stdin closed; starting {} session without confirmation",
            condition.display_name()
        ),
        Ok(_) => {}
        Err(err) => tracing::warn!(
            "Failed to read stdin ({}); starting {} session without confirmation",
            err,
            condition.display_name()
        ),
    }
}

fn calibrate_live(
    config: &AppConfig,
    sensor_port: Option<String>,
    duration: Duration,
    no_prompt: bool,
) -> Result<ThresholdConfig> {
    let mut serial_config = config.serial.clone();
    if let Some(port) = sensor_port {
        serial_config.sensor_port = port;
    }
    let sensor = serial::open_sensor(&serial_config)?;
    let pipeline = FeaturePipeline::new(&config.dsp)?;
    let mut calibrator = Calibrator::new(pipeline, sensor, SystemClock::new());

    let outcome = calibrator
        .calibrate(duration, |condition| {
            if !no_prompt {
                wait_for_enter(condition);
            }
            println!(
                "Be {} for {:.0} seconds...",
                condition.display_name(),
                duration.as_secs_f64()
            );
        })
        .map_err(|err| {
            log_calibration_error(&err, "calibrate");
            err
        })?;

    for session in [&outcome.relaxed, &outcome.concentrated] {
        println!(
            "{} average beta energy: {:.6} ({} windows)",
            session.condition().display_name(),
            session.mean(),
            session.len()
        );
    }
    Ok(outcome.thresholds)
}

fn calibrate_from_files(
    config: &AppConfig,
    relaxed: &Path,
    concentrated: &Path,
    duration: Duration,
) -> Result<ThresholdConfig> {
    let mut means = Vec::with_capacity(2);
    for (condition, path) in [
        (CalibrationCondition::Relaxed, relaxed),
        (CalibrationCondition::Concentrated, concentrated),
    ] {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let mut calibrator = Calibrator::new(
            FeaturePipeline::new(&config.dsp)?,
            LineSensor::new(BufReader::new(file)),
            SampleClock::new(config.dsp.sample_rate),
        );
        let session = calibrator.run(duration, condition).map_err(|err| {
            log_calibration_error(&err, "calibrate");
            err
        })?;
        println!(
            "{} average beta energy: {:.6} ({} windows)",
            condition.display_name(),
            session.mean(),
            session.len()
        );
        means.push(session.mean());
    }
    Ok(ThresholdConfig::from_means(means[0], means[1]))
}

fn report_thresholds(thresholds: &ThresholdConfig) {
    println!("FINAL THRESHOLD: {:.6}", thresholds.threshold());
}

fn run_live(
    config: &AppConfig,
    thresholds: Option<PathBuf>,
    sensor_port: Option<String>,
    actuator_port: Option<String>,
) -> Result<ExitCode> {
    // Thresholds first: without them there is nothing to decide with
    let thresholds = ThresholdConfig::load(thresholds_path(config, thresholds))?;
    println!("Using threshold: {:.6}", thresholds.threshold());

    let mut serial_config = config.serial.clone();
    if let Some(port) = sensor_port {
        serial_config.sensor_port = port;
    }
    if let Some(port) = actuator_port {
        serial_config.actuator_port = port;
    }

    let mut sensor = serial::open_sensor(&serial_config)?;
    let actuator = serial::open_actuator(&serial_config)?;
    thread::sleep(Duration::from_millis(serial_config.settle_delay_ms));

    let mut control = ControlLoop::new(config, &thresholds, actuator)?;
    let mut clock = SystemClock::new();
    println!("Starting brain-controlled actuator loop...");

    let summary = control.run(&mut sensor, &mut clock, |_| {})?;
    println!("Sensor closed after {} windows", summary.windows);
    Ok(ExitCode::from(0))
}

fn run_replay(
    config: &AppConfig,
    input: &Path,
    thresholds: Option<PathBuf>,
    threshold: Option<f64>,
    actuator_out: Option<PathBuf>,
) -> Result<ExitCode> {
    let thresholds = match threshold {
        Some(value) => ThresholdConfig::from_means(value, value),
        None => ThresholdConfig::load(thresholds_path(config, thresholds))?,
    };

    let file = File::open(input).with_context(|| format!("opening {}", input.display()))?;
    let mut sensor = LineSensor::new(BufReader::new(file));
    let mut clock = SampleClock::new(config.dsp.sample_rate);

    let sink: Box<dyn io::Write> = match &actuator_out {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        ),
        None => Box::new(io::sink()),
    };
    let mut control = ControlLoop::new(config, &thresholds, WriterSink::new(sink))?;

    let mut write_error = None;
    control.run(&mut sensor, &mut clock, |report| {
        if write_error.is_some() {
            return;
        }
        match serde_json::to_string(report) {
            Ok(line) => println!("{line}"),
            Err(err) => write_error = Some(err),
        }
    })?;
    if let Some(err) = write_error {
        return Err(err.into());
    }
    Ok(ExitCode::from(0))
}
