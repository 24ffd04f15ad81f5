use std::fs;
use std::num::NonZeroU64;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use scheduler::{Config, InitialPass, PolicyKind, StrideConfig, STRIDE_CONSTANT};

use processor::{format_logs, format_processes, format_schedule, Options, Processor, Workload};

/// Workload used when no file is given: a CPU hog, two interactive
/// processes and a short late arrival.
const DEMO_WORKLOAD: &str = "\
# arrival tickets bursts (cpu [io cpu]...)
0 100 12
0 50  3 4 3 4 3
2 50  2 6 2
5 200 4
";

/// Simulates a workload under one of the CPU scheduling policies.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Scheduling policy: round-robin, stcf or stride.
    #[arg(short, long, default_value_t = PolicyKind::RoundRobin)]
    policy: PolicyKind,

    /// Time slice length in ticks, for the policies that use time slicing.
    #[arg(short, long, default_value_t = NonZeroU64::MIN.saturating_add(1))]
    quantum: NonZeroU64,

    /// Workload file, one process per line: `<arrival> <tickets> <cpu> [<io> <cpu>]...`.
    #[arg(short, long)]
    workload: Option<PathBuf>,

    /// Stride of a process is this constant divided by its tickets.
    #[arg(long, default_value_t = STRIDE_CONSTANT)]
    stride_constant: u64,

    /// Starting pass of new processes under stride: zero or minimum-ready.
    #[arg(long, default_value = "zero")]
    initial_pass: InitialPass,

    /// Give up after this many ticks.
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Print every simulation event.
    #[arg(short, long)]
    trace: bool,
}

fn load_workload(path: Option<&PathBuf>) -> Result<Workload> {
    let text = match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("reading workload {}", path.display()))?,
        None => DEMO_WORKLOAD.to_string(),
    };
    let workload = Workload::parse(&text).context("parsing workload")?;
    Ok(workload)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let workload = load_workload(args.workload.as_ref())?;
    let config = Config {
        policy: args.policy,
        stride: StrideConfig {
            stride_constant: args.stride_constant,
            initial_pass: args.initial_pass,
        },
    };
    let options = Options {
        quantum: args.quantum,
        max_ticks: args.max_ticks,
    };
    info!(
        "running {} processes under {} with a {} tick quantum",
        workload.processes.len(),
        config.policy,
        options.quantum
    );

    let report = Processor::run(&workload, options, |cpu| scheduler::engine(&config, cpu))
        .with_context(|| format!("simulating under {}", config.policy))?;

    if args.trace {
        println!("{}", format_logs(&report.logs));
    }
    println!("{}\n", format_schedule(&report.schedule));
    print!("{}", format_processes(&report.processes));
    println!("\n{} context switches", report.switches);
    Ok(())
}

// Do not delete this line
#[cfg(test)]
mod tests;
