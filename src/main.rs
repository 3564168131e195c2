use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;

use riskmap::analysis::{self, PortfolioSummary, RiskBand};
use riskmap::config::GeneratorConfig;
use riskmap::generator::Generator;
use riskmap::property::Property;
use riskmap::tables;

#[derive(Parser)]
#[command(name = "riskmap", about = "Synthetic property risk data generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GenArgs {
    /// Number of properties per population
    #[arg(long, default_value_t = 5000)]
    count: usize,
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// JSON generator config; the built-in layout when omitted
    #[arg(long)]
    config: Option<PathBuf>,
    /// Reference date for claim histories (YYYY-MM-DD), default today (UTC)
    #[arg(long)]
    today: Option<NaiveDate>,
}

impl GenArgs {
    fn generator(&self) -> Result<Generator, Box<dyn Error + Send + Sync>> {
        let config = match &self.config {
            Some(path) => GeneratorConfig::from_json_file(path)?,
            None => GeneratorConfig::canonical(),
        };
        Ok(Generator::new(config)?)
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one population as a JSON array (or NDJSON)
    Generate {
        #[command(flatten)]
        gen_args: GenArgs,
        /// Output file; stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,
        /// One property per line instead of a single array
        #[arg(long)]
        ndjson: bool,
    },
    /// Generate independent populations for seeds seed..seed+runs in parallel
    Batch {
        #[command(flatten)]
        gen_args: GenArgs,
        #[arg(long)]
        runs: u64,
        #[arg(long)]
        output_dir: PathBuf,
    },
    /// Write the relational export: properties.ndjson and claims.ndjson
    Tables {
        #[command(flatten)]
        gen_args: GenArgs,
        #[arg(long)]
        output_dir: PathBuf,
    },
    /// Validate a population and print portfolio statistics
    Summary {
        #[command(flatten)]
        gen_args: GenArgs,
        /// JSON array or NDJSON of properties; generated when omitted
        #[arg(long)]
        input: Option<PathBuf>,
        /// Only count properties with riskScore >= this
        #[arg(long, default_value_t = 0.0)]
        min_risk: f64,
    },
}

fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { gen_args, output, ndjson } => {
            let generator = gen_args.generator()?;
            let properties = generator.generate_seeded(gen_args.count, gen_args.today(), gen_args.seed)?;
            match output {
                Some(path) => {
                    let writer = BufWriter::new(File::create(&path)?);
                    write_properties(writer, &properties, ndjson)?;
                    log::info!("{} properties → {}", properties.len(), path.display());
                }
                None => write_properties(io::stdout().lock(), &properties, ndjson)?,
            }
        }

        Commands::Batch { gen_args, runs, output_dir } => {
            std::fs::create_dir_all(&output_dir)?;
            let generator = gen_args.generator()?;
            let today = gen_args.today();
            let written = batch_seeds(gen_args.seed, runs)?
                .into_par_iter()
                .map(|seed| -> Result<usize, Box<dyn Error + Send + Sync>> {
                    let properties = generator.generate_seeded(gen_args.count, today, seed)?;
                    let path = output_dir.join(format!("properties_seed_{seed}.json"));
                    write_properties(BufWriter::new(File::create(&path)?), &properties, false)?;
                    log::info!("seed {seed}: {} properties → {}", properties.len(), path.display());
                    Ok(properties.len())
                })
                .collect::<Result<Vec<_>, _>>()?;
            println!("Wrote {} populations ({} properties)", written.len(), written.iter().sum::<usize>());
        }

        Commands::Tables { gen_args, output_dir } => {
            std::fs::create_dir_all(&output_dir)?;
            let generator = gen_args.generator()?;
            let properties = generator.generate_seeded(gen_args.count, gen_args.today(), gen_args.seed)?;
            let (property_rows, claim_rows) = tables::split(&properties);
            write_ndjson(&output_dir.join("properties.ndjson"), &property_rows)?;
            write_ndjson(&output_dir.join("claims.ndjson"), &claim_rows)?;
            println!("Properties: {}  Claims: {}", property_rows.len(), claim_rows.len());
        }

        Commands::Summary { gen_args, input, min_risk } => {
            let config = match &gen_args.config {
                Some(path) => GeneratorConfig::from_json_file(path)?,
                None => GeneratorConfig::canonical(),
            };
            let properties = match input {
                Some(path) => read_properties(&path)?,
                None => Generator::new(config.clone())?.generate_seeded(
                    gen_args.count,
                    gen_args.today(),
                    gen_args.seed,
                )?,
            };
            let violations = analysis::verify_records(&properties, &config);
            print_summary(&PortfolioSummary::from_properties(&properties, min_risk), &violations);
        }
    }

    Ok(())
}

/// Seeds `seed, seed + 1, ..` for `runs` populations.
fn batch_seeds(seed: u64, runs: u64) -> Result<Vec<u64>, String> {
    if runs == 0 {
        return Ok(Vec::new());
    }
    let last = seed
        .checked_add(runs - 1)
        .ok_or_else(|| format!("--seed {seed} with --runs {runs} runs past u64::MAX"))?;
    Ok((seed..=last).collect())
}

fn write_properties(mut w: impl Write, properties: &[Property], ndjson: bool) -> io::Result<()> {
    if ndjson {
        for p in properties {
            serde_json::to_writer(&mut w, p)?;
            writeln!(w)?;
        }
    } else {
        serde_json::to_writer(&mut w, properties)?;
        writeln!(w)?;
    }
    w.flush()
}

fn write_ndjson<T: serde::Serialize>(path: &Path, rows: &[T]) -> io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    for row in rows {
        serde_json::to_writer(&mut w, row)?;
        writeln!(w)?;
    }
    w.flush()
}

/// Accepts either a JSON array or one record per line.
fn read_properties(path: &Path) -> Result<Vec<Property>, Box<dyn Error + Send + Sync>> {
    let mut reader = BufReader::new(File::open(path)?);
    let starts_with_array = reader.fill_buf()?.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'[');
    if starts_with_array {
        return Ok(serde_json::from_reader(reader)?);
    }
    let mut properties = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let p: Property = serde_json::from_str(&line).map_err(|e| format!("{}:{}: {e}", path.display(), n + 1))?;
        properties.push(p);
    }
    Ok(properties)
}

fn print_summary(s: &PortfolioSummary, violations: &[analysis::RecordViolation]) {
    println!("\n=== Record invariants ===");
    if violations.is_empty() {
        println!("  All record invariants: PASS");
    } else {
        println!("  {} violation(s):", violations.len());
        for v in violations {
            println!("    {v}");
        }
    }

    println!("\n=== Portfolio (riskScore >= {}) ===", s.min_risk);
    println!("  Properties:           {:>10}", s.count);
    println!("  High risk (> 75):     {:>10}", s.high_risk_count);
    println!("  Total TIV (M):        {:>10.2}", s.total_tiv / 1_000_000.0);
    println!("  Average TIV:          {:>10.0}", s.avg_tiv());
    println!("  With claims:          {:>10}", s.properties_with_claims);
    println!("  Claims:               {:>10}", s.claims_count);
    println!("  Claim amount (M):     {:>10.2}", s.total_claim_amount / 1_000_000.0);

    println!("\n{:<16} | {:>8}", "City", "Count");
    println!("{}", "-".repeat(27));
    for (city, n) in &s.by_city {
        println!("{city:<16} | {n:>8}");
    }

    println!("\n{:<16} | {:>8}", "Primary risk", "Count");
    println!("{}", "-".repeat(27));
    for (risk, n) in &s.by_primary_risk {
        println!("{:<16} | {n:>8}", risk.to_string());
    }

    println!("\n{:<16} | {:>8}", "Band", "Count");
    println!("{}", "-".repeat(27));
    for band in [RiskBand::Low, RiskBand::Medium, RiskBand::High] {
        let n = s.by_band.get(&band).copied().unwrap_or(0);
        println!("{:<16} | {n:>8}", format!("{band:?}"));
    }
}
