use std::{any::Any, path::PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use eyre::{bail, Result};
use sysinfo::System;
use tracing_chrome::ChromeLayerBuilder;
use tracing_subscriber::{fmt::format::FmtSpan, prelude::*, EnvFilter};

use harness_core::{
    backend::Backend,
    circuits::CircuitKind,
    curves::Curve,
    pipeline::{run_benchmark, run_recursion, BenchConfig, CsvReporter, MachineInfo, Phase},
    primitives::{
        run_primitive, ArithmeticOp, CurveOp, FieldKind, Group, Primitive, PrimitiveConfig,
    },
};

/// Times SNARK circuits phase by phase and appends the results to a CSV file.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Benchmark circuits with Groth16
    Groth16(BenchArgs),
    /// Benchmark in-circuit verification of an inner Groth16 proof. `--curve`
    /// names the outer curve of a 2-chain (bw6-761 or mnt6-298).
    Recursion(BenchArgs),
    /// Time native field arithmetic
    Arithmetic(ArithmeticArgs),
    /// Time native curve operations
    CurveOps(CurveOpsArgs),
}

impl Commands {
    fn output(&self) -> &OutputArgs {
        match self {
            Commands::Groth16(args) | Commands::Recursion(args) => &args.output,
            Commands::Arithmetic(args) => &args.common.output,
            Commands::CurveOps(args) => &args.common.output,
        }
    }
}

#[derive(Args, Debug, Clone)]
struct OutputArgs {
    /// CSV file results are appended to
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Trace output formats
    #[arg(short, long, value_enum)]
    format: Option<Vec<Format>>,
}

#[derive(Args, Debug, Clone)]
struct BenchArgs {
    /// Circuits to run; every combination with `--curve` is benchmarked
    #[arg(long, value_enum, num_args = 1.., required = true)]
    circuit: Vec<CircuitKind>,

    /// Curves to run on
    #[arg(long, value_enum, num_args = 1.., default_value = "bn254")]
    curve: Vec<Curve>,

    /// Circuit size (number of squarings for `expo`)
    #[arg(short, long, default_value_t = 10)]
    size: usize,

    /// Repetitions of the measured phase
    #[arg(short, long, default_value_t = 1)]
    count: usize,

    /// Last phase to run; earlier phases run once
    #[arg(short, long, value_enum, default_value_t = Phase::Prove)]
    phase: Phase,

    /// JSON file with the circuit's input values
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Seed for setup and prover randomness
    #[arg(long)]
    seed: Option<u64>,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug, Clone)]
struct PrimitiveArgs {
    /// Curves to run on
    #[arg(long, value_enum, num_args = 1.., default_value = "bn254")]
    curve: Vec<Curve>,

    /// Repetitions of each operation; the mean is reported
    #[arg(short, long, default_value_t = 1000)]
    count: usize,

    /// JSON file with operands `X`, `Y` and exponent `E`
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Seed for random operands
    #[arg(long)]
    seed: Option<u64>,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug, Clone)]
struct ArithmeticArgs {
    /// Operations to time
    #[arg(long = "operation", value_enum, num_args = 1.., required = true)]
    operations: Vec<ArithmeticOp>,

    /// Field the operands live in
    #[arg(long, value_enum, default_value_t = FieldKind::Scalar)]
    field: FieldKind,

    #[command(flatten)]
    common: PrimitiveArgs,
}

#[derive(Args, Debug, Clone)]
struct CurveOpsArgs {
    /// Operations to time
    #[arg(long = "operation", value_enum, num_args = 1.., required = true)]
    operations: Vec<CurveOp>,

    /// Group the points live in; ignored by `pairing`
    #[arg(long, value_enum, default_value_t = Group::G1)]
    group: Group,

    #[command(flatten)]
    common: PrimitiveArgs,
}

#[derive(Debug, Clone, ValueEnum, PartialEq)]
enum Format {
    Default,
    Chrome,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = cli.command.output();
    let _guards = init_tracing(output.format.as_deref().unwrap_or_default());
    let mut reporter = CsvReporter::new(machine_info(), output.output.as_deref())?;

    let failures = match &cli.command {
        Commands::Groth16(args) => run_circuits(args, false, &mut reporter),
        Commands::Recursion(args) => run_circuits(args, true, &mut reporter),
        Commands::Arithmetic(args) => {
            let primitives = args.operations.iter().map(|&op| Primitive::Arithmetic {
                field: args.field,
                op,
            });
            run_primitives(&args.common, primitives, &mut reporter)
        }
        Commands::CurveOps(args) => {
            let primitives = args.operations.iter().map(|&op| Primitive::Curve {
                group: args.group,
                op,
            });
            run_primitives(&args.common, primitives, &mut reporter)
        }
    };

    if failures > 0 {
        bail!("{failures} benchmark configuration(s) failed");
    }
    Ok(())
}

/// Runs every circuit and curve combination; returns the number of failures.
fn run_circuits(args: &BenchArgs, recursive: bool, reporter: &mut CsvReporter) -> usize {
    let mut failures = 0;
    for &circuit in &args.circuit {
        for &curve in &args.curve {
            let config = BenchConfig {
                backend: Backend::Groth16,
                curve,
                circuit,
                size: args.size,
                count: args.count,
                phase: args.phase,
                input: args.input.clone(),
                seed: args.seed,
            };
            let outcome = if recursive {
                run_recursion(&config, reporter)
            } else {
                run_benchmark(&config, reporter)
            };
            if let Err(e) = outcome {
                tracing::error!(%circuit, %curve, "benchmark failed: {e}");
                failures += 1;
            }
        }
    }
    failures
}

fn run_primitives(
    args: &PrimitiveArgs,
    primitives: impl Iterator<Item = Primitive> + Clone,
    reporter: &mut CsvReporter,
) -> usize {
    let mut failures = 0;
    for &curve in &args.curve {
        let config = PrimitiveConfig {
            curve,
            count: args.count,
            input: args.input.clone(),
            seed: args.seed,
        };
        for primitive in primitives.clone() {
            if let Err(e) = run_primitive(&config, primitive, reporter) {
                tracing::error!(%curve, operation = %primitive.operation(), "benchmark failed: {e}");
                failures += 1;
            }
        }
    }
    failures
}

fn init_tracing(formats: &[Format]) -> Vec<Box<dyn Any>> {
    let mut layers = Vec::new();

    let log_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let log_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_filter(log_filter)
        .boxed();
    layers.push(log_layer);

    let mut guards: Vec<Box<dyn Any>> = vec![];
    if formats.contains(&Format::Default) {
        let span_layer = tracing_subscriber::fmt::layer()
            .with_span_events(FmtSpan::CLOSE)
            .compact()
            .with_target(false)
            .with_file(false)
            .with_line_number(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed();
        layers.push(span_layer);
    }
    if formats.contains(&Format::Chrome) {
        let (chrome_layer, guard) = ChromeLayerBuilder::new().include_args(true).build();
        layers.push(chrome_layer.boxed());
        guards.push(Box::new(guard));
    }

    tracing_subscriber::registry().with(layers).init();
    if formats.contains(&Format::Chrome) {
        tracing::info!("Running tracing-chrome. Files will be saved as trace-<some timestamp>.json and can be viewed in https://ui.perfetto.dev/");
    }
    guards
}

fn machine_info() -> MachineInfo {
    let mut sys = System::new();
    sys.refresh_cpu();
    MachineInfo {
        physical_cores: sys.physical_core_count().unwrap_or_default(),
        logical_cores: sys.cpus().len(),
        cpu: sys
            .cpus()
            .first()
            .map(|cpu| cpu.brand().trim().to_string())
            .unwrap_or_else(|| "unknown".to_string()),
    }
}
