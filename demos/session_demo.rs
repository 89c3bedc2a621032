//! Demonstration of the NeuroFocus monitoring pipeline.
//!
//! This example shows how to:
//! 1. Build a configuration
//! 2. Start a demo-mode session
//! 3. Drive the tick loop and read classifications
//!
//! Run with: cargo run --example session_demo

use neurofocus_agent::config::Config;
use neurofocus_agent::session::MonitorSession;
use std::thread;
use std::time::Duration;

fn main() {
    println!("NeuroFocus Agent - Session Demo");
    println!("===============================");
    println!();

    // 1. Configuration: demo mode, ticking faster than the default
    let config = Config {
        demo_mode: true,
        sample_interval: Duration::from_millis(250),
        ..Config::default()
    };

    // 2. Start the session
    let mut session = MonitorSession::new();
    if let Err(e) = session.start(&config) {
        eprintln!("Error starting session: {e}");
        return;
    }

    println!("Session ID: {}", session.session_id());
    println!("Running 20 ticks of the simulated signal...");
    println!();

    // 3. Drive the tick loop
    for tick in 1..=20 {
        let reading = session.tick(&config);
        println!(
            "  [{:>2}] sample {:>3}  smoothed {:>3}  {}",
            tick, reading.sample, reading.smoothed, reading.level
        );
        thread::sleep(config.sample_interval);
    }

    session.stop();

    println!();
    println!("History kept {} samples", session.history().len());
    println!("Demo complete!");
}
