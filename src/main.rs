//! segsieve: count and print primes and prime k-tuplets
//!
//! Usage: segsieve [START] STOP [OPTIONS]

use clap::Parser;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use segsieve::config;
use segsieve::{Flags, ParallelPrimeSieve, PrimeSieve, SieveError, TupletKind};

#[derive(Parser)]
#[command(name = "segsieve")]
#[command(version)]
#[command(about = "segsieve: count and print primes and prime k-tuplets with a segmented sieve of Eratosthenes", long_about = None)]
struct Cli {
    /// Start of the interval (default 0), or STOP if it is the only number
    #[arg(value_name = "START", value_parser = parse_number)]
    first: u64,

    /// End of the interval, inclusive. Numbers accept forms like 1e10,
    /// 2^32 and 2^64-1
    #[arg(value_name = "STOP", value_parser = parse_number)]
    second: Option<u64>,

    /// Count primes (1), twins (2), triplets (3) ... sextuplets (6)
    #[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u8).range(1..=6))]
    count: Vec<u8>,

    /// Print primes (1), twins (2), triplets (3) ... sextuplets (6)
    #[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u8).range(1..=6))]
    print: Option<u8>,

    /// Find the STOP-th prime >= START
    #[arg(short = 'n', long)]
    nth_prime: bool,

    /// Sieve size in KiB (1..=4096, rounded down to a power of two)
    #[arg(short, long, value_name = "KIB")]
    size: Option<usize>,

    /// Number of threads to use for counting (default: number of CPUs)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Print the progress percentage to stderr
    #[arg(long)]
    status: bool,

    /// Print the elapsed time
    #[arg(long)]
    time: bool,

    /// Print only the numbers of the results
    #[arg(short, long)]
    quiet: bool,

    /// Write printed primes or tuplets to FILE instead of stdout (needs --print)
    #[arg(short, long, value_name = "FILE", requires = "print")]
    output: Option<PathBuf>,
}

/// Parse `123`, `1e10`, `2^32`, and those forms followed by `+N` or `-N`.
fn parse_number(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let value = if let Some((lhs, rhs)) = s.rsplit_once('-').filter(|(lhs, _)| !lhs.is_empty()) {
        parse_term(lhs)?.checked_sub(parse_term(rhs)?)
    } else if let Some((lhs, rhs)) = s.rsplit_once('+').filter(|(lhs, _)| !lhs.is_empty()) {
        parse_term(lhs)?.checked_add(parse_term(rhs)?)
    } else {
        Some(parse_term(s)?)
    };
    value
        .and_then(|v| u64::try_from(v).ok())
        .ok_or_else(|| format!("number out of range: {}", s))
}

/// One term, computed in u128 so that `2^64-1` can be written.
fn parse_term(s: &str) -> Result<u128, String> {
    let digits = |t: &str| {
        t.trim()
            .parse::<u128>()
            .map_err(|_| format!("invalid number: {}", s))
    };
    let power = |base: u128, exp: u128| {
        u32::try_from(exp)
            .ok()
            .and_then(|exp| base.checked_pow(exp))
            .ok_or_else(|| format!("number out of range: {}", s))
    };

    if let Some((base, exp)) = s.split_once('^') {
        return power(digits(base)?, digits(exp)?);
    }
    if let Some((mantissa, exp)) = s.split_once(|c: char| c == 'e' || c == 'E') {
        let scale = power(10, digits(exp)?)?;
        return digits(mantissa)?
            .checked_mul(scale)
            .ok_or_else(|| format!("number out of range: {}", s));
    }
    digits(s)
}

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    if let Some(kib) = cli.size {
        config::set_sieve_size(kib);
    }
    if let Some(n) = cli.threads {
        config::set_num_threads(n);
    }

    let (start, stop) = match cli.second {
        Some(stop) => (cli.first, stop),
        None => (0, cli.first),
    };

    let result = if cli.nth_prime {
        run_nth_prime(stop, start, cli.time, cli.quiet)
    } else {
        run_sieve(&cli, start, stop)
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run_nth_prime(n: u64, start: u64, time: bool, quiet: bool) -> Result<(), SieveError> {
    let mut ps = PrimeSieve::new();
    let prime = ps.nth_prime(n, start)?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if quiet {
        writeln!(handle, "{}", prime)?;
    } else {
        writeln!(handle, "Nth prime: {}", prime)?;
    }
    if time {
        writeln!(handle, "Seconds: {:.3}", ps.seconds())?;
    }
    Ok(())
}

fn run_sieve(cli: &Cli, start: u64, stop: u64) -> Result<(), SieveError> {
    if start > stop {
        return Err(SieveError::InvalidInterval { start, stop });
    }

    let mut flags = Flags::NONE;
    for &n in &cli.count {
        if let Some(kind) = TupletKind::from_index(usize::from(n) - 1) {
            flags |= Flags::count(kind);
        }
    }
    if let Some(kind) = cli.print.and_then(|n| TupletKind::from_index(usize::from(n) - 1)) {
        flags |= Flags::print(kind);
    } else if cli.count.is_empty() {
        flags |= Flags::COUNT_PRIMES;
    }
    if cli.status {
        flags |= Flags::PRINT_STATUS;
    }

    let (counts, seconds) = if flags.any_print() {
        let mut ps = PrimeSieve::new();
        ps.set_interval(start, stop)?;
        ps.set_flags(flags)?;
        match &cli.output {
            Some(path) => {
                let mut file = File::create(path)?;
                ps.sieve_with(Some(&mut file), None, None)?;
            }
            None => {
                let stdout = io::stdout();
                let mut handle = stdout.lock();
                ps.sieve_with(Some(&mut handle), None, None)?;
            }
        }
        (*ps.counts(), ps.seconds())
    } else {
        let mut ps = ParallelPrimeSieve::new();
        ps.set_interval(start, stop)?;
        ps.set_flags(flags)?;
        ps.sieve()?;
        (*ps.counts(), ps.seconds())
    };

    if cli.status {
        eprintln!();
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    for kind in flags.count_kinds() {
        if cli.quiet {
            writeln!(handle, "{}", counts[kind])?;
        } else {
            writeln!(handle, "{}: {}", kind.label(), counts[kind])?;
        }
    }
    if cli.time || (!cli.quiet && flags.any_count()) {
        writeln!(handle, "Seconds: {:.3}", seconds)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("1000"), Ok(1000));
        assert_eq!(parse_number("1e10"), Ok(10_000_000_000));
        assert_eq!(parse_number("2^32"), Ok(1 << 32));
        assert_eq!(parse_number("2^64-1"), Ok(u64::MAX));
        assert_eq!(parse_number("1e9+7"), Ok(1_000_000_007));
        assert!(parse_number("2^64").is_err());
        assert!(parse_number("1e20").is_err());
        assert!(parse_number("abc").is_err());
        assert!(parse_number("-5").is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from(["segsieve", "100", "1e3", "-c", "1", "-c", "2"]).unwrap();
        assert_eq!(cli.first, 100);
        assert_eq!(cli.second, Some(1000));
        assert_eq!(cli.count, vec![1, 2]);
        assert!(Cli::try_parse_from(["segsieve", "10", "-p", "7"]).is_err());
    }

    #[test]
    fn test_output_requires_print() {
        assert!(Cli::try_parse_from(["segsieve", "100", "-o", "primes.txt"]).is_err());
        let cli = Cli::try_parse_from(["segsieve", "100", "-p", "1", "-o", "primes.txt"]).unwrap();
        assert_eq!(cli.output, Some(PathBuf::from("primes.txt")));
    }
}
