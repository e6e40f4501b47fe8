//! Host build of the ICP app.
//!
//! Serves the device command channel over stdio: one hex-encoded command
//! per line on stdin, one hex-encoded response (data followed by the status
//! word) per line on stdout. A line reading `reset` resets the channel.
//!
//! # Usage
//!
//! ```bash
//! echo 1100000000 | icp-app
//! RUST_LOG=debug icp-app --expert --reject
//! ```

use std::io::{self, BufRead, Write};

use clap::Parser;

use icp_app::config::{AppConfig, DEFAULT_DISPLAY_WIDTH, DEFAULT_TX_BUFFER_CAPACITY};
use icp_app::crypto::Seed;
use icp_app::{CommandChannel, Dispatcher, Event, MockPlatform, Response};
use icp_common::APP_NAME;

#[derive(Parser, Debug)]
#[command(name = "icp-app", about = "ICP transaction review engine over stdio")]
struct Args {
    /// Start in expert mode
    #[arg(long)]
    expert: bool,

    /// Reject every review instead of approving it
    #[arg(long)]
    reject: bool,

    /// Maximum assembled transaction size
    #[arg(long, default_value_t = DEFAULT_TX_BUFFER_CAPACITY)]
    buffer_capacity: usize,

    /// Characters per review page
    #[arg(long, default_value_t = DEFAULT_DISPLAY_WIDTH)]
    display_width: usize,

    /// 64-byte BIP32 seed as hex; the test seed when absent
    #[arg(long)]
    seed: Option<String>,
}

struct StdioChannel<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> CommandChannel for StdioChannel<R, W> {
    type Error = io::Error;

    fn receive(&mut self) -> Result<Event, io::Error> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(Event::Closed);
            }
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line.eq_ignore_ascii_case("reset") {
                return Ok(Event::Reset);
            }
            match hex::decode(line) {
                Ok(command) => return Ok(Event::Command(command)),
                Err(e) => log::warn!("icp-app: ignoring malformed line: {}", e),
            }
        }
    }

    fn send(&mut self, response: &Response) -> Result<(), io::Error> {
        writeln!(self.output, "{}", hex::encode(response.to_bytes()))?;
        self.output.flush()
    }
}

fn parse_seed(hex_seed: &str) -> Result<Seed, Box<dyn std::error::Error>> {
    let bytes: [u8; 64] = hex::decode(hex_seed)
        .map_err(|e| format!("invalid seed: {}", e))?
        .try_into()
        .map_err(|_| "seed must be 64 bytes")?;
    Ok(Seed::from_bytes(&bytes))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let args = Args::parse();

    let config = AppConfig {
        expert_default: args.expert,
        tx_buffer_capacity: args.buffer_capacity,
        display_width: args.display_width,
        ..AppConfig::default()
    };

    let mut platform = match args.seed.as_deref() {
        Some(hex_seed) => MockPlatform::with_seed(parse_seed(hex_seed)?),
        None => {
            log::warn!("icp-app: using the test seed, NEVER use it with real funds");
            MockPlatform::new()
        }
    };
    platform.set_auto_approve(!args.reject);

    log::info!(
        "icp-app: {} v{}.{}.{}, buffer {} bytes",
        APP_NAME,
        config.version.major,
        config.version.minor,
        config.version.patch,
        config.tx_buffer_capacity
    );

    let mut dispatcher = Dispatcher::new(config, platform);
    let stdin = io::stdin();
    let mut channel = StdioChannel {
        input: stdin.lock(),
        output: io::stdout(),
    };
    dispatcher.run(&mut channel)?;
    Ok(())
}
