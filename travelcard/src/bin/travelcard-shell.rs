//! Line-oriented driver for the travel card applet
//!
//! Reads one hex encoded command APDU per line from stdin and prints the
//! hex encoded response (data followed by SW1 SW2). Blank lines and lines
//! starting with `#` are skipped. The words `reset` and `terminate` invoke
//! the card management operations of the same name.
//!
//! State is kept in `$TRAVELCARD_STORAGE_DIR` (default `~/.travelcard`).
//!
//! Usage: echo "00A4040008F054524156454C01" | travelcard-shell

use std::io::{self, BufRead, Write};
use std::process;

use log::{error, info};
use travelcard::{CardConfig, TravelCardApplet};

fn main() {
    env_logger::init();

    let config = CardConfig::from_env();
    info!(
        "Starting travel card with AID {} (storage {:?})",
        hex::encode_upper(&config.aid),
        config.storage_dir
    );
    let mut card = TravelCardApplet::new(config);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to read input: {}", e);
                process::exit(1);
            }
        };

        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let reply = match line {
            "reset" => card.factory_reset().map(|()| "OK".to_string()),
            "terminate" => card.terminate().map(|()| "OK".to_string()),
            _ => {
                let compact: String = line.split_whitespace().collect();
                match hex::decode(&compact) {
                    Ok(raw) => Ok(hex::encode_upper(card.process_apdu(&raw))),
                    Err(e) => {
                        eprintln!("Invalid hex '{}': {}", line, e);
                        continue;
                    }
                }
            }
        };

        let written = match reply {
            Ok(text) => writeln!(out, "{}", text),
            Err(e) => writeln!(out, "ERROR {}", e),
        };
        if let Err(e) = written.and_then(|()| out.flush()) {
            error!("Failed to write output: {}", e);
            process::exit(1);
        }
    }
}
