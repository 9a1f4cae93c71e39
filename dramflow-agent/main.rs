use anyhow::Context;
use clap::Parser;
use std::hint::black_box;
use std::path::PathBuf;

use dramflow::{DramConfig, DramCounter};

const CACHE_LINE_WORDS: usize = 64 / std::mem::size_of::<u64>();

#[derive(Parser, Debug)]
#[command(name = "dramflow")]
#[command(about = "Measure DRAM read/write traffic of a region using Intel uncore iMC counters")]
struct Args {
    #[arg(
        long,
        default_value_t = 1024,
        help = "Size of the buffer swept by the bandwidth test, in MiB"
    )]
    buffer_mib: usize,

    #[arg(long, help = "Directory for the dram_counts.out record")]
    output_dir: Option<PathBuf>,

    #[arg(long, help = "Highest CPU index (exclusive) probed for iMC counters")]
    max_cpu: Option<u32>,

    #[arg(long, help = "Alternative perf event-source registry")]
    sysfs_root: Option<PathBuf>,

    #[arg(long, help = "Print results without writing the record")]
    no_save: bool,

    #[arg(
        short,
        long,
        help = "Enable verbose logging (shows every counter that was opened)"
    )]
    verbose: bool,
}

fn check_permissions() {
    if !nix::unistd::Uid::effective().is_root() {
        tracing::info!(
            "Not running as root; uncore counters usually need root or perf_event_paranoid <= 0"
        );
    }
}

/// A few thousand integer operations that stay in registers
fn arithmetic_kernel() -> u64 {
    const ITERS: u64 = 1_000;

    let (mut a, mut b, mut c) = (1u64, 2u64, 3u64);
    let d = black_box(5u64);
    for _ in 0..ITERS {
        a = a.wrapping_add(b);
        c = c.wrapping_sub(d);
        b = b.wrapping_mul(a);
        a = black_box(a) / c.max(1);
    }
    a ^ b ^ c
}

/// Write then read one word per cache line
fn bandwidth_sweep(buffer: &mut [u64]) -> u64 {
    for i in (0..buffer.len()).step_by(CACHE_LINE_WORDS) {
        // SAFETY: `i` is in bounds of `buffer`
        unsafe { std::ptr::write_volatile(buffer.as_mut_ptr().add(i), 0) };
    }

    let mut sum = 0u64;
    for i in (0..buffer.len()).step_by(CACHE_LINE_WORDS) {
        // SAFETY: `i` is in bounds of `buffer`
        sum = sum.wrapping_add(unsafe { std::ptr::read_volatile(buffer.as_ptr().add(i)) });
    }
    sum
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup logging based on verbose flag
    let log_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt().with_max_level(log_level).init();

    check_permissions();

    let mut config = DramConfig::auto_detect();
    if let Some(max_cpu) = args.max_cpu {
        config.max_cpu = max_cpu;
    }
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    if let Some(root) = args.sysfs_root {
        config.sysfs_root = root;
    }

    let mut dram = DramCounter::new(config).context("invalid configuration")?;

    println!("=== Arithmetic Intensity Validation Test ===");
    if !dram.init() {
        println!("Warning: DRAM counters not initialised - try sudo");
    }

    let words = args.buffer_mib * (1 << 20) / std::mem::size_of::<u64>();
    let mut buffer = vec![0u64; words];

    let result = dram.measure(arithmetic_kernel);
    println!("\n=== Arithmetic Kernel (Measured) ===");
    println!("Expected: 4 000 integer ops, <2 MiB DRAM");
    dram.print_results(false);
    black_box(result);

    println!("\n=== DRAM Bandwidth Test ===");
    let checksum = dram.measure(|| bandwidth_sweep(&mut buffer));
    dram.print_results(!args.no_save);

    println!("\nChecksum: {checksum}");
    println!("\n=== Test Complete ===");

    Ok(())
}
