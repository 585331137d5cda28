//! FlowFi Streams CLI
//!
//! Replays a CSV file of stream commands and prints the state of every
//! stream at the evaluation time.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- commands.csv 1700003600 > streams.csv
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity
//! - `FLOWFI_NOW`: Evaluation time in Unix seconds when not passed as an argument

use flowfi_streams::{Config, Result, StreamEngine};
use std::fs::File;
use std::io::{self, BufReader};
use std::process;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = Config::from_env()?;

    let file = File::open(&config.input_path)?;
    let reader = BufReader::new(file);

    let engine = StreamEngine::new();
    engine.process_csv(reader)?;

    let stdout = io::stdout();
    let handle = stdout.lock();
    engine.write_output(handle, config.now)?;

    Ok(())
}
