//! NeuroFocus Agent CLI
//!
//! Pulse-derived attention and stress monitor for serial biofeedback hardware.

use clap::{Parser, Subcommand};
use neurofocus_agent::{
    config::Config,
    device::discovery::list_ports,
    session::{MonitorSession, SessionError},
    ABOUT, VERSION,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "neurofocus")]
#[command(author = "NeuroFocus")]
#[command(version = VERSION)]
#[command(about = "Pulse-derived attention and stress monitor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start monitoring
    Start {
        /// Use the simulated signal generator instead of hardware
        #[arg(long)]
        demo: bool,

        /// Serial port to use (auto-discovered when omitted)
        #[arg(long)]
        port: Option<String>,

        /// Sampling interval in seconds
        #[arg(long)]
        interval: Option<f64>,

        /// Smoothing window size in samples (1-30)
        #[arg(long)]
        window: Option<usize>,

        /// Threshold at or above which the signal reads as relaxed
        #[arg(long)]
        high: Option<u16>,

        /// Threshold at or above which the signal reads as mild
        #[arg(long)]
        med: Option<u16>,

        /// Print one JSON object per tick instead of the human format
        #[arg(long)]
        json: bool,
    },

    /// List serial ports and flag likely pulse devices
    Ports,

    /// Update the saved configuration
    Set {
        /// Sampling interval in seconds
        #[arg(long)]
        interval: Option<f64>,

        /// Smoothing window size in samples (1-30)
        #[arg(long)]
        window: Option<usize>,

        /// Threshold at or above which the signal reads as relaxed
        #[arg(long)]
        high: Option<u16>,

        /// Threshold at or above which the signal reads as mild
        #[arg(long)]
        med: Option<u16>,

        /// Default to the simulated signal generator
        #[arg(long)]
        demo: Option<bool>,

        /// Serial port to use (auto-discovered when omitted)
        #[arg(long)]
        port: Option<String>,
    },

    /// Show configuration
    Config,

    /// Describe what the monitor does
    About,
}

fn main() {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            demo,
            port,
            interval,
            window,
            high,
            med,
            json,
        } => {
            cmd_start(demo, port, interval, window, high, med, json);
        }
        Commands::Ports => {
            cmd_ports();
        }
        Commands::Set {
            interval,
            window,
            high,
            med,
            demo,
            port,
        } => {
            cmd_set(interval, window, high, med, demo, port);
        }
        Commands::Config => {
            cmd_config();
        }
        Commands::About => {
            cmd_about();
        }
    }
}

/// Live-adjustable settings pinned by command-line flags for this run.
struct Overrides {
    interval: Option<Duration>,
    window: Option<usize>,
    high: Option<u16>,
    med: Option<u16>,
}

fn cmd_start(
    demo: bool,
    port: Option<String>,
    interval: Option<f64>,
    window: Option<usize>,
    high: Option<u16>,
    med: Option<u16>,
    json: bool,
) {
    if !json {
        println!("NeuroFocus Agent v{VERSION}");
        println!();
    }

    let pinned = Overrides {
        interval: parse_interval(interval),
        window,
        high,
        med,
    };

    // Load or create configuration
    let mut config = Config::load().unwrap_or_default();
    apply_overrides(&mut config, demo, &port, &pinned);

    if let Err(e) = config.validate() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    let mut session = MonitorSession::new();

    if let Err(e) = session.start(&config) {
        eprintln!("Error starting session: {e}");
        if matches!(e, SessionError::NoDeviceFound) {
            eprintln!();
            eprintln!("No pulse device was detected on any serial port.");
            eprintln!("Plug the device in and check `neurofocus ports`, or run");
            eprintln!("with --demo for a simulated signal.");
        }
        std::process::exit(1);
    }

    if !json {
        println!("Session ID: {}", session.session_id());
        if config.demo_mode {
            println!("  Source: demo generator");
        } else {
            println!(
                "  Source: device on {}",
                session.resolved_port().unwrap_or("<unknown>")
            );
            if !session.writer_connected() {
                println!("  Feedback: unavailable");
            }
        }
        println!("  Interval: {:.1}s", config.sample_interval.as_secs_f64());
        println!("  Window: {} samples", config.smooth_window);
        println!(
            "  Thresholds: relaxed >= {}, mild >= {}",
            config.thresh_high, config.thresh_med
        );
        println!();
        println!("Press Ctrl+C to stop");
        println!();
    }

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone());

    let mut tick_count: u64 = 0;
    let mut last_config_check = std::time::Instant::now();

    // Main tick loop
    while running.load(Ordering::SeqCst) {
        // Periodically reload config so `neurofocus set` can adjust a
        // running monitor. Flags given on the command line stay pinned.
        if last_config_check.elapsed() >= Duration::from_secs(1) {
            if let Ok(fresh) = Config::load() {
                adopt_live_settings(&mut config, fresh, &pinned);
            }
            last_config_check = std::time::Instant::now();
        }

        let reading = session.tick(&config);
        tick_count += 1;

        if json {
            match serde_json::to_string(&reading) {
                Ok(line) => println!("{line}"),
                Err(e) => eprintln!("Error serializing reading: {e}"),
            }
        } else {
            println!(
                "[{}] sample {:>3}  smoothed {:>3}  {}{}",
                reading.timestamp.format("%H:%M:%S"),
                reading.sample,
                reading.smoothed,
                reading.level,
                link_status(&session, &config)
            );
        }

        sleep_tick(config.sample_interval, &running);
    }

    // Stop monitoring
    if !json {
        println!();
        println!("Stopping session...");
    }
    session.stop();

    if !json {
        println!("Processed {tick_count} samples");
        if let Some(reading) = session.last_reading() {
            println!("Last level: {}", reading.level);
        }
    }
}

fn cmd_ports() {
    let ports = list_ports();

    println!("Serial Ports");
    println!("============");
    println!();

    if ports.is_empty() {
        println!("No serial ports found.");
        return;
    }

    for port in &ports {
        let marker = if port.matches { "  (pulse device)" } else { "" };
        if port.description.is_empty() {
            println!("  {}{}", port.name, marker);
        } else {
            println!("  {}  {}{}", port.name, port.description, marker);
        }
    }

    println!();
    match ports.iter().find(|p| p.matches) {
        Some(port) => println!("Auto-discovery would pick {}", port.name),
        None => println!("No known pulse hardware detected."),
    }
}

fn cmd_set(
    interval: Option<f64>,
    window: Option<usize>,
    high: Option<u16>,
    med: Option<u16>,
    demo: Option<bool>,
    port: Option<String>,
) {
    let mut config = Config::load().unwrap_or_default();

    if let Some(interval) = parse_interval(interval) {
        config.sample_interval = interval;
    }
    if let Some(window) = window {
        config.smooth_window = window;
    }
    if let Some(high) = high {
        config.thresh_high = high;
    }
    if let Some(med) = med {
        config.thresh_med = med;
    }
    if let Some(demo) = demo {
        config.demo_mode = demo;
    }
    if let Some(port) = port {
        config.port = Some(port);
    }

    if let Err(e) = config.validate() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    if let Err(e) = config.save() {
        eprintln!("Error saving config: {e}");
        std::process::exit(1);
    }

    println!("Configuration updated.");
    println!("  Interval: {:.1}s", config.sample_interval.as_secs_f64());
    println!("  Window: {} samples", config.smooth_window);
    println!(
        "  Thresholds: relaxed >= {}, mild >= {}",
        config.thresh_high, config.thresh_med
    );
    println!("  Demo mode: {}", config.demo_mode);
    match &config.port {
        Some(port) => println!("  Port: {port}"),
        None => println!("  Port: auto-discover"),
    }
    println!();
    println!("A running monitor picks up interval, window, and threshold");
    println!("changes on its next tick.");
}

fn cmd_config() {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}

fn cmd_about() {
    println!("{ABOUT}");
}

/// Validate and convert a `--interval` argument.
fn parse_interval(interval: Option<f64>) -> Option<Duration> {
    match interval.map(Duration::try_from_secs_f64) {
        Some(Ok(parsed)) if !parsed.is_zero() => Some(parsed),
        Some(_) => {
            eprintln!("Error: --interval must be a positive number of seconds");
            std::process::exit(1);
        }
        None => None,
    }
}

/// Apply command-line flags on top of the loaded configuration.
fn apply_overrides(config: &mut Config, demo: bool, port: &Option<String>, pinned: &Overrides) {
    if demo {
        config.demo_mode = true;
    }
    if let Some(port) = port {
        config.port = Some(port.clone());
    }
    if let Some(interval) = pinned.interval {
        config.sample_interval = interval;
    }
    if let Some(window) = pinned.window {
        config.smooth_window = window;
    }
    if let Some(high) = pinned.high {
        config.thresh_high = high;
    }
    if let Some(med) = pinned.med {
        config.thresh_med = med;
    }
}

/// Fold freshly loaded settings into the running configuration.
///
/// Only the live-safe fields move: interval, window, and thresholds.
/// Source selection stays fixed for the life of the run, and a fresh
/// config that fails validation is ignored wholesale.
fn adopt_live_settings(config: &mut Config, fresh: Config, pinned: &Overrides) {
    let mut candidate = config.clone();
    candidate.sample_interval = pinned.interval.unwrap_or(fresh.sample_interval);
    candidate.smooth_window = pinned.window.unwrap_or(fresh.smooth_window);
    candidate.thresh_high = pinned.high.unwrap_or(fresh.thresh_high);
    candidate.thresh_med = pinned.med.unwrap_or(fresh.thresh_med);

    if candidate.validate().is_ok() {
        *config = candidate;
    }
}

/// Warning suffix for the human render when a hardware link is down.
///
/// A session whose device has dropped keeps producing fallback samples,
/// so the marker is the only visible difference.
fn link_status(session: &MonitorSession, config: &Config) -> &'static str {
    if config.demo_mode {
        ""
    } else if !session.reader_connected() {
        "  [device disconnected]"
    } else if !session.writer_connected() {
        "  [no feedback]"
    } else {
        ""
    }
}

/// Sleep out one tick, polling the stop flag so Ctrl+C stays responsive
/// even with long intervals.
fn sleep_tick(interval: Duration, running: &AtomicBool) {
    let deadline = std::time::Instant::now() + interval;
    while running.load(Ordering::SeqCst) && std::time::Instant::now() < deadline {
        thread::sleep(Duration::from_millis(50));
    }
}

/// Install the tracing subscriber; `RUST_LOG` overrides the default level.
///
/// Logs go to stderr so `--json` output on stdout stays parseable.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");
}
