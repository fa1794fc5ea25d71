//! `satctl` — command-line entry point for generating secrets bundles,
//! subscription packages, and broadcast frames.
//!
//! Synchronous by design: every `sat-crypto` operation it calls is a
//! pure, in-memory computation. There is no network or async I/O here,
//! only file reads/writes around the crypto core, implemented in
//! `sat_cli`'s library functions.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use sat_cli::{encode_frame_cmd, gen_secrets, gen_subscription};

#[derive(Parser)]
#[command(name = "satctl")]
#[command(about = "Generate keying secrets, subscriptions, and broadcast frames", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Raise logging from info to debug.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a fresh secrets bundle for the given channels.
    GenSecrets {
        /// Comma-separated channel ids (channel 0 is always included).
        #[arg(long, value_delimiter = ',')]
        channels: Vec<u32>,

        /// Output path for the secrets JSON.
        #[arg(long)]
        out: PathBuf,
    },

    /// Build a subscription package for a decoder.
    GenSubscription {
        /// Path to a secrets JSON file.
        #[arg(long)]
        secrets: PathBuf,

        /// Target decoder id.
        #[arg(long = "decoder-id")]
        decoder_id: u32,

        /// Channel to subscribe to.
        #[arg(long)]
        channel: u32,

        /// First granted timestamp, inclusive.
        #[arg(long)]
        start: u64,

        /// Last granted timestamp, inclusive.
        #[arg(long)]
        end: u64,

        /// Output path for the 3300-byte subscription package.
        #[arg(long)]
        out: PathBuf,
    },

    /// Encrypt and sign a broadcast frame.
    EncodeFrame {
        /// Path to a secrets JSON file.
        #[arg(long)]
        secrets: PathBuf,

        /// Channel the frame is broadcast on.
        #[arg(long)]
        channel: u32,

        /// Broadcast timestamp.
        #[arg(long)]
        timestamp: u64,

        /// Hex-encoded payload, up to 64 bytes.
        #[arg(long = "payload-hex")]
        payload_hex: String,

        /// Output path for the frame package.
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::GenSecrets { channels, out } => gen_secrets(&channels, &out),
        Commands::GenSubscription {
            secrets,
            decoder_id,
            channel,
            start,
            end,
            out,
        } => gen_subscription(&secrets, decoder_id, channel, start, end, &out),
        Commands::EncodeFrame {
            secrets,
            channel,
            timestamp,
            payload_hex,
            out,
        } => encode_frame_cmd(&secrets, channel, timestamp, &payload_hex, &out),
    }
}
