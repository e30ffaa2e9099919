use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tessera_core::{Filter, Image, GAUSSIAN_3X3};
use tessera_kernels::pattern::init;
use tessera_kernels::{Team, TeamError, Variant};

mod config;

use config::{default_lanes, BenchConfig, BenchSettings};

#[derive(Parser)]
#[command(
    name = "tessera",
    about = "Tessera SPMD convolution kernels",
    long_about = "Fixed-function 2D integer convolution split across a fixed team of lanes.\n\nEvery lane runs the same kernel over a disjoint slice of the output; lanes\nmeet only at the barrier between phases.",
    version,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Show platform info and available kernel variants
    Info,
    /// Time each kernel variant on square pattern images
    Bench {
        /// Image sizes (comma-separated, square)
        #[arg(long)]
        sizes: Option<String>,
        /// Number of lanes (default: available parallelism)
        #[arg(long)]
        lanes: Option<usize>,
        /// Iterations per measurement (default: scaled by size)
        #[arg(long)]
        iters: Option<usize>,
        /// Variant name or "all"
        #[arg(long)]
        variant: Option<String>,
        /// JSON file with default settings; flags take precedence
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Run init -> convolve -> verify and report the verifier's status code
    Check {
        /// Image width in pixels
        #[arg(long, default_value = "64")]
        width: usize,
        /// Image height in pixels
        #[arg(long, default_value = "64")]
        height: usize,
        /// Number of lanes (default: available parallelism)
        #[arg(long)]
        lanes: Option<usize>,
        /// Variant name or "all"
        #[arg(long, default_value = "all")]
        variant: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info => {
            cmd_info();
            ExitCode::SUCCESS
        }
        Commands::Bench { sizes, lanes, iters, variant, config } => {
            let cfg = match config {
                Some(path) => match BenchConfig::load(&path) {
                    Ok(cfg) => cfg,
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        return ExitCode::FAILURE;
                    }
                },
                None => BenchConfig::default(),
            };
            match cfg.resolve(sizes.as_deref(), lanes, iters, variant.as_deref()) {
                Ok(settings) => cmd_bench(&settings),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Check { width, height, lanes, variant } => {
            cmd_check(width, height, lanes.unwrap_or_else(default_lanes), &variant)
        }
    }
}

fn cmd_info() {
    println!("tessera v{}\n", env!("CARGO_PKG_VERSION"));

    println!("Platform");
    println!("  OS:    {}", std::env::consts::OS);
    println!("  Arch:  {}", std::env::consts::ARCH);
    println!("  Lanes: {} (available parallelism)", default_lanes());

    println!("\nVariants");
    let notes = [
        (Variant::Direct, "any odd kernel, centered window, strided columns"),
        (Variant::Shifted, "any odd kernel, top-left window, strided columns"),
        (Variant::Unrolled3x3Block, "3x3 unrolled, block columns"),
        (Variant::Unrolled3x3Shifted, "3x3 unrolled, top-left window, strided columns"),
    ];
    for (variant, desc) in notes {
        println!("  {:<12} {}", variant.name(), desc);
    }

    println!("\nBorder pixels (kernel half-width) are never written.");
}

fn default_iters(size: usize) -> usize {
    if size <= 128 {
        200
    } else if size <= 256 {
        50
    } else if size <= 512 {
        10
    } else {
        3
    }
}

fn cmd_bench(settings: &BenchSettings) -> ExitCode {
    let team = match Team::new(settings.lanes) {
        Ok(team) => team,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let filter = Filter::from_3x3(&GAUSSIAN_3X3);
    tracing::info!(lanes = settings.lanes, sizes = ?settings.sizes, "benchmark");

    println!("=== Tessera Conv2d Benchmark ===");
    println!("Lanes: {}  Kernel: 3x3 binomial\n", settings.lanes);
    println!("{:<12} {:<12} {:>10} {:>12} {:>10}", "Size", "Variant", "Iters", "Time (ms)", "MPix/s");
    println!("{}", "-".repeat(60));

    for &size in &settings.sizes {
        let input = Image::zeros(size, size);
        let output = Image::zeros(size, size);
        team.run(|lane, _| init(&input, lane));
        let iters = settings.iters.unwrap_or_else(|| default_iters(size)).max(1);

        for &variant in &settings.variants {
            // warmup, also surfaces precondition errors once
            if let Err(e) = team.convolve(variant, &input, &filter, &output) {
                eprintln!("Error: {} at {}x{}: {}", variant, size, size, e);
                return ExitCode::FAILURE;
            }

            let start = Instant::now();
            for _ in 0..iters {
                let ran = team.run(|lane, _| variant.run(&input, &filter, &output, lane));
                if let Some(Err(e)) = ran.into_iter().find(Result::is_err) {
                    eprintln!("Error: {} at {}x{}: {}", variant, size, size, e);
                    return ExitCode::FAILURE;
                }
            }
            let secs = start.elapsed().as_secs_f64() / iters as f64;
            let mpix = (size * size) as f64 / secs / 1e6;

            println!(
                "{:<12} {:<12} {:>10} {:>10.3}ms {:>10.1}",
                format!("{}x{}", size, size),
                variant.name(),
                iters,
                secs * 1000.0,
                mpix,
            );
        }
    }
    ExitCode::SUCCESS
}

fn cmd_check(width: usize, height: usize, lanes: usize, variant: &str) -> ExitCode {
    let variants = if variant == "all" {
        Variant::ALL.to_vec()
    } else {
        match variant.parse::<Variant>() {
            Ok(v) => vec![v],
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    };
    let team = match Team::new(lanes) {
        Ok(team) => team,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(width, height, lanes, "self-check");
    println!("=== Tessera Self-Check ({}x{}, {} lanes) ===", width, height, lanes);

    let mut failed = false;
    for v in variants {
        match team.check(v, width, height) {
            Ok(()) => println!("  {:<12} ok (code 0)", v.name()),
            Err(TeamError::Verify(m)) => {
                println!("  {:<12} FAILED (code {}): {}", v.name(), m.code(), m);
                failed = true;
            }
            Err(e) => {
                println!("  {:<12} error: {}", v.name(), e);
                failed = true;
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
