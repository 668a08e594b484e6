use clap::{Args, Parser, Subcommand};
use carindex::archive::{CarArchive, IndexOptions};
use carindex::io_stream::DEFAULT_BUFFER_CAPACITY;
use carindex::varint::DEFAULT_VARINT_WINDOW;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "carindex", about = "Inspect and index CAR files without reading block payloads")]
struct Cli {
    #[command(flatten)]
    options: OptionArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct OptionArgs {
    /// Look-ahead bytes per varint (1-10)
    #[arg(long, global = true, default_value_t = DEFAULT_VARINT_WINDOW)]
    varint_window: usize,
    /// Look-ahead buffer size in bytes
    #[arg(long, global = true, default_value_t = DEFAULT_BUFFER_CAPACITY)]
    buffer_capacity: usize,
    /// Accept a final block that runs past the end of the file
    #[arg(long, global = true)]
    no_verify_extent: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the header for a CAR file as JSON
    Header {
        input: PathBuf,
    },
    /// Generate an index for a CAR file, print to stdout as line-delimited JSON
    Index {
        input: PathBuf,
    },
    /// Print block count and total payload bytes as JSON
    Count {
        input: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let options = IndexOptions {
        varint_window:   cli.options.varint_window,
        buffer_capacity: cli.options.buffer_capacity,
        verify_extent:   !cli.options.no_verify_extent,
        ..IndexOptions::default()
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match cli.command {

        // ── Header ───────────────────────────────────────────────────────────
        Commands::Header { input } => {
            let header = CarArchive::open(&input, options)?.header()?;
            serde_json::to_writer(&mut out, &header)?;
            writeln!(out)?;
        }

        // ── Index ────────────────────────────────────────────────────────────
        Commands::Index { input } => {
            CarArchive::open(&input, options)?.for_each_entry(|entry| {
                serde_json::to_writer(&mut out, &entry)?;
                writeln!(out)?;
                Ok::<(), Box<dyn std::error::Error + Send + Sync>>(())
            })?;
        }

        // ── Count ────────────────────────────────────────────────────────────
        Commands::Count { input } => {
            let stats = CarArchive::open(&input, options)?.stats()?;
            serde_json::to_writer(&mut out, &stats)?;
            writeln!(out)?;
        }
    }

    out.flush()?;
    Ok(())
}
