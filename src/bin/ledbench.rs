// LED strip characterization
//
// Sweeps an APA102 strip through color, brightness and optionally supply
// voltage, and records the current drawn at every setpoint to a CSV file.

use clap::Parser;
use ledbench_rs::progress::Eta;
use ledbench_rs::{
    Apa102Strip, DatasetWriter, KoradSupply, PowerSupply, ProgressDisplay, Provenance,
    RangeConfig, StepReport, SweepConfig, SweepRunner, SweepSummary,
};
use serialport::SerialPort;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "ledbench")]
#[command(version)]
#[command(about = "Measure LED strip current draw across colors, brightness and voltage")]
#[command(long_about = "Steps an APA102 strip through every configured color, global brightness and supply voltage, waits for the current to settle and records voltage and per-pixel current from a Korad power supply.")]
struct Args {
    /// CSV output file
    #[arg(value_name = "OUTPUT_FILE")]
    output_file: PathBuf,

    /// Color sweep mode
    #[arg(long, default_value = "individual", help = "Color sweep mode: individual, white or full")]
    mode: String,

    /// Power supply serial port
    #[arg(long, default_value = "/dev/ttyS0")]
    psu_port: String,

    /// Power supply channel (1-based)
    #[arg(long, default_value_t = 1)]
    psu_channel: u8,

    /// spidev node the strip is connected to
    #[arg(long, default_value = "/dev/spidev0.0")]
    strip_device: PathBuf,

    /// Strip color byte order
    #[arg(long, default_value = "rgb")]
    strip_rgb_order: String,

    /// Number of LEDs in the strip
    #[arg(long, default_value_t = 20)]
    num_leds: usize,

    #[arg(long, default_value_t = 0, help = "Lowest global brightness (0-31)")]
    min_brightness: u8,

    #[arg(long, default_value_t = 31, help = "Highest global brightness (0-31)")]
    max_brightness: u8,

    #[arg(long, default_value_t = 1)]
    brightness_step: u8,

    #[arg(long, default_value_t = 0, help = "Lowest LED channel value (0-255)")]
    min_value: u8,

    #[arg(long, default_value_t = 255, help = "Highest LED channel value (0-255)")]
    max_value: u8,

    #[arg(long, default_value_t = 1)]
    value_step: u8,

    /// Lowest supply voltage; enables the voltage sweep
    #[arg(long, requires_all = ["max_voltage", "voltage_step"])]
    min_voltage: Option<f64>,

    /// Highest supply voltage
    #[arg(long, requires_all = ["min_voltage", "voltage_step"])]
    max_voltage: Option<f64>,

    /// Supply voltage step
    #[arg(long, requires_all = ["min_voltage", "max_voltage"])]
    voltage_step: Option<f64>,

    #[arg(long, default_value_t = 100, help = "Milliseconds to wait for the current to settle at each setpoint")]
    settle_time: u64,

    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true, help = "Per-pixel baseline current to subtract, in mA")]
    current_offset: f64,

    #[arg(long, help = "Replace the output file if it already exists")]
    overwrite: bool,

    #[arg(short, long, help = "Show debug information and detailed logs")]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> SweepConfig {
        let voltage = match (self.min_voltage, self.max_voltage, self.voltage_step) {
            (Some(min), Some(max), Some(step)) => Some(RangeConfig::new(min, max, step)),
            _ => None,
        };

        SweepConfig {
            output: self.output_file,
            overwrite: self.overwrite,
            mode: self.mode,
            psu_port: self.psu_port,
            psu_channel: self.psu_channel,
            strip_device: self.strip_device,
            strip_rgb_order: self.strip_rgb_order,
            pixel_count: self.num_leds,
            brightness: RangeConfig::new(self.min_brightness, self.max_brightness, self.brightness_step),
            value: RangeConfig::new(self.min_value, self.max_value, self.value_step),
            voltage,
            settle_time: Duration::from_millis(self.settle_time),
            current_offset_ma: self.current_offset,
        }
    }
}

/// Single status line, refreshed in place.
struct ConsoleProgress {
    out: io::Stderr,
}

impl ProgressDisplay for ConsoleProgress {
    fn step(&mut self, report: &StepReport) {
        let voltage = report
            .setpoint
            .voltage
            .map(|v| format!(" @ {:5.2} V", v))
            .unwrap_or_default();
        let eta = report
            .eta
            .map_or_else(|| "-:--:--".to_string(), |d| Eta(d).to_string());

        let _ = write!(
            self.out,
            "\rProgress: {:6.2}%\tCurrent color: {} @ {:2}{}\tTime remaining: {}",
            report.percent_complete, report.setpoint.color, report.setpoint.brightness, voltage, eta
        );
        let _ = self.out.flush();
    }

    fn finish(&mut self, summary: &SweepSummary) {
        let _ = writeln!(self.out);
        let _ = writeln!(
            self.out,
            "Measured {} setpoints in {}",
            summary.steps,
            Eta(summary.elapsed)
        );
    }
}

/// Everything a sweep talks to, opened in order.
struct Rig {
    supply: KoradSupply<Box<dyn SerialPort>>,
    identity: String,
    strip: Apa102Strip<File>,
    dataset: DatasetWriter<File>,
}

impl Rig {
    /// The output file is created last, once both devices have answered.
    fn open(config: &SweepConfig) -> ledbench_rs::Result<Self> {
        let mut supply = KoradSupply::open(&config.psu_port)?;
        let identity = supply.identify()?;
        log::info!("PSU Model: {}", identity);

        let strip = Apa102Strip::open(&config.strip_device, config.pixel_count, config.rgb_order()?)?;
        let dataset = DatasetWriter::create(&config.output, config.overwrite)?;

        Ok(Self {
            supply,
            identity,
            strip,
            dataset,
        })
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }

    let command = std::env::args().collect::<Vec<_>>().join(" ");
    let config = args.into_config();

    // Validate everything before touching hardware or files
    let plan = config.plan()?;
    log::info!(
        "Sweeping {} setpoints ({} mode, {} ms settle time)",
        plan.total_count(),
        plan.colors().mode(),
        config.settle_time.as_millis()
    );

    let mut rig = Rig::open(&config)?;
    rig.dataset.set_provenance(Provenance {
        command: Some(command),
        instrument: Some(rig.identity.clone()),
        started: Some(chrono::Local::now()),
    });

    let mut display = ConsoleProgress { out: io::stderr() };
    let runner = SweepRunner::new(&plan, config.measurement_step(), &mut rig.supply, &mut rig.strip);
    if let Err(e) = runner.run(&mut rig.dataset, &mut display) {
        eprintln!();
        return Err(e.into());
    }

    Ok(())
}
