use clap::{Parser, Subcommand};

mod drbg_cmd;
mod fetch_cmd;
mod stream_cmd;

/// sysrand command-line tool: pool output, DRBG output, and keystream
/// generation.
#[derive(Parser)]
#[command(name = "sysrand")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch seed-grade bytes straight from the entropy pool.
    Fetch {
        /// Number of bytes (at most the pool size, 384).
        #[arg(short, long, default_value_t = 64)]
        num: usize,
    },
    /// Generate bulk pseudorandom bytes from a pool-seeded DRBG.
    Generate {
        /// Mechanism: ctr, hash, or hmac.
        #[arg(short, long, default_value = "ctr")]
        algorithm: String,
        /// Number of bytes.
        #[arg(short, long, default_value_t = 64)]
        num: usize,
        /// Optional personalization string.
        #[arg(short, long)]
        personalization: Option<String>,
    },
    /// Emit keystream bytes from the pool-reseeded stream generator.
    Stream {
        /// Number of bytes.
        #[arg(short, long, default_value_t = 64)]
        num: usize,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Fetch { num } => fetch_cmd::run(num),
        Commands::Generate {
            algorithm,
            num,
            personalization,
        } => drbg_cmd::run(&algorithm, num, personalization.as_deref()),
        Commands::Stream { num } => stream_cmd::run(num),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Hex-encode for terminal output.
pub(crate) fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
