use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use qrng_console::backend::http::{ClientConfig, HttpBackend};
use qrng_console::backend::{QrngBackend, SimBackend};
use qrng_console::render::{build_histogram, format_value, NumberBase};
use qrng_console::request::RequestPolicy;
use qrng_console::session::{ServerExportFormat, Session};
use qrng_console::types::GenerationResult;

const HISTOGRAM_BAR_WIDTH: usize = 40;

#[derive(Parser, Debug)]
#[command(name = "qrng", about = "Console client for a quantum random number generator service")]
struct Args {
    /// Backend base URL.
    #[arg(long, env = "QRNG_API_BASE", default_value = "http://127.0.0.1:5000")]
    base_url: String,

    /// Transport: "http" for a real service, "sim" for the in-process simulator.
    #[arg(long, default_value = "http")]
    backend: String,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    /// Cap on samples per request (some deployments enforce 1000).
    #[arg(long, env = "QRNG_MAX_SAMPLES", default_value_t = 5000)]
    max_samples: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Request a batch and print it as a table, statistics, and histogram.
    Generate {
        #[arg(long, default_value = "8")]
        bits: String,

        #[arg(long, default_value = "10")]
        samples: String,

        /// Display base: decimal, binary, or hex.
        #[arg(long, default_value = "decimal")]
        display: String,

        /// Print the canonical result as pretty JSON instead of tables.
        #[arg(long)]
        json: bool,

        /// Also write the client-side CSV export here.
        #[arg(long)]
        csv_out: Option<PathBuf>,

        /// Also write the client-side JSON export here.
        #[arg(long)]
        json_out: Option<PathBuf>,
    },
    /// Query the service's health endpoint.
    Health,
    /// Download the server's own export of its last generation.
    Export {
        /// "json" or "csv".
        #[arg(long, default_value = "json")]
        format: String,

        /// Destination file; stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn parse_base(s: &str) -> NumberBase {
    match s.to_ascii_lowercase().as_str() {
        "binary" | "bin" => NumberBase::Binary,
        "hex" | "hexadecimal" => NumberBase::Hexadecimal,
        _ => NumberBase::Decimal,
    }
}

fn parse_export_format(s: &str) -> ServerExportFormat {
    match s.to_ascii_lowercase().as_str() {
        "csv" => ServerExportFormat::Csv,
        _ => ServerExportFormat::Json,
    }
}

fn build_backend(args: &Args) -> anyhow::Result<Arc<dyn QrngBackend>> {
    Ok(match args.backend.to_ascii_lowercase().as_str() {
        "sim" | "simulator" => Arc::new(SimBackend::default()),
        _ => {
            let config = ClientConfig::new(args.base_url.clone())
                .with_timeout(Duration::from_secs(args.timeout_secs));
            Arc::new(HttpBackend::new(config)?)
        }
    })
}

fn print_result(result: &GenerationResult, base: NumberBase) {
    println!(
        "source={} bits={} samples={}",
        result.source.label(),
        result.num_bits,
        result.numbers.len()
    );
    if let Some(version) = &result.version {
        println!("backend version: {version}");
    }
    if let Some(timestamp) = &result.timestamp {
        println!("generated at: {timestamp}");
    }

    println!("\n  idx  value");
    for (index, &n) in result.numbers.iter().enumerate() {
        match format_value(n, base, result.num_bits) {
            Ok(text) => println!("  {index:>3}  {text}"),
            Err(_) => println!("  {index:>3}  <out of range: {n}>"),
        }
    }

    let stats = &result.statistics;
    println!(
        "\nmean={:.3} std={:.3} min={} max={} range={}",
        stats.mean,
        stats.std,
        stats.min,
        stats.max,
        stats.range.unwrap_or(stats.max - stats.min)
    );
    if let Some(entropy) = result.entropy {
        println!("entropy estimate: {entropy:.4}");
    }

    let histogram = build_histogram(&result.numbers, result.num_bits);
    let peak = histogram.counts.iter().copied().max().unwrap_or(0);
    if peak == 0 {
        return;
    }
    println!();
    let label_width = histogram.labels.iter().map(String::len).max().unwrap_or(0);
    for (label, &count) in histogram.labels.iter().zip(&histogram.counts) {
        if count == 0 {
            continue;
        }
        let bar_len = ((count as usize * HISTOGRAM_BAR_WIDTH) / peak as usize).max(1);
        println!("  {label:>label_width$} | {:<4} {}", count, "#".repeat(bar_len));
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let backend = build_backend(&args)?;
    let mut session = Session::new(backend, RequestPolicy::with_max_samples(args.max_samples));

    match &args.command {
        Command::Generate {
            bits,
            samples,
            display,
            json,
            csv_out,
            json_out,
        } => {
            session.generate_from_input(bits, samples).await?;

            if *json {
                println!("{}", session.export_last_json()?);
            } else if let Some(result) = session.last() {
                print_result(result, parse_base(display));
            }

            if let Some(path) = csv_out {
                std::fs::write(path, session.export_last_csv()?)?;
                eprintln!("wrote {}", path.display());
            }
            if let Some(path) = json_out {
                std::fs::write(path, session.export_last_json()?)?;
                eprintln!("wrote {}", path.display());
            }
        }
        Command::Health => {
            let report = session.health().await?;
            println!(
                "service: {}",
                if report.live { "live" } else { "degraded" }
            );
            match report.upstream {
                Some(true) => println!("quantum upstream: available"),
                Some(false) => println!("quantum upstream: unavailable (simulator fallback)"),
                None => println!("quantum upstream: unknown"),
            }
        }
        Command::Export { format, out } => {
            let bytes = session
                .fetch_server_export(parse_export_format(format))
                .await?;
            match out {
                Some(path) => {
                    std::fs::write(path, &bytes)?;
                    eprintln!("wrote {} bytes to {}", bytes.len(), path.display());
                }
                None => print!("{}", String::from_utf8_lossy(&bytes)),
            }
        }
    }

    Ok(())
}
