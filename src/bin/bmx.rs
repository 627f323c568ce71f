use anyhow::{Context, Result};
use bmx_rs::{Client, DataQuery, DateRange, IncrementMode, Language, MissingPolicy};
use bmx_rs::{stats, storage};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use num_format::{Locale, ToFormattedString};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "bmx",
    version,
    about = "Fetch Banxico SIE series metadata and observations as tidy tables"
)]
struct Cli {
    /// SIE API token
    #[arg(long, env = "BANXICO_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,
    /// More log output (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch descriptive metadata for the given series.
    Meta(MetaArgs),
    /// Fetch observations (and optionally save them and print stats).
    Data(DataArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutFormat {
    Csv,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Lang {
    En,
    Es,
}

impl From<Lang> for Language {
    fn from(l: Lang) -> Self {
        match l {
            Lang::En => Language::English,
            Lang::Es => Language::Native,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Increment {
    Levels,
    /// % change against the previous observation
    Period,
    /// % change against the same period of the previous year
    Annual,
    /// % change since the end of the previous year
    Ytd,
}

impl From<Increment> for IncrementMode {
    fn from(i: Increment) -> Self {
        match i {
            Increment::Levels => IncrementMode::Levels,
            Increment::Period => IncrementMode::PeriodOverPeriod,
            Increment::Annual => IncrementMode::YearOverYear,
            Increment::Ytd => IncrementMode::SinceLastYearEnd,
        }
    }
}

#[derive(Args, Debug)]
struct MetaArgs {
    /// Series ids separated by comma or semicolon (e.g., SF43718,SF60653)
    #[arg(short, long)]
    series: String,
    #[arg(long, value_enum, default_value = "en")]
    lang: Lang,
    /// Save results to file (format inferred by --format or extension).
    #[arg(long)]
    out: Option<PathBuf>,
    #[arg(long, value_enum)]
    format: Option<OutFormat>,
}

#[derive(Args, Debug)]
struct DataArgs {
    /// Series ids separated by comma or semicolon (e.g., SF43718,SF60653)
    #[arg(short, long)]
    series: String,
    /// First date (YYYY-MM-DD); requires --end.
    #[arg(long, requires = "end")]
    start: Option<NaiveDate>,
    /// Last date (YYYY-MM-DD); requires --start.
    #[arg(long, requires = "start")]
    end: Option<NaiveDate>,
    /// Only the most recent observation. Overrides --start/--end.
    #[arg(long, default_value_t = false)]
    latest: bool,
    #[arg(long, value_enum, default_value = "levels")]
    increment: Increment,
    /// Ask the API to trim trailing zeros.
    #[arg(long, default_value_t = false)]
    decimals: bool,
    /// Drop N/E observations instead of failing.
    #[arg(long, default_value_t = false)]
    skip_missing: bool,
    #[arg(long, value_enum, default_value = "en")]
    lang: Lang,
    /// Save results to file (format inferred by --format or extension).
    #[arg(long)]
    out: Option<PathBuf>,
    #[arg(long, value_enum)]
    format: Option<OutFormat>,
    /// Print per-series statistics to stdout.
    #[arg(long, default_value_t = false)]
    stats: bool,
}

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => {
            // Format up to 4 decimals, then trim trailing zeros and trailing dot.
            let s = format!("{:.4}", x);
            s.trim_end_matches('0').trim_end_matches('.').to_string()
        }
        _ => "NA".to_string(),
    }
}

fn parse_list(s: &str) -> Vec<String> {
    s.split([',', ';'])
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

fn out_format(path: &Path, format: Option<OutFormat>) -> Result<OutFormat> {
    if let Some(f) = format {
        return Ok(f);
    }
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("csv")
        .to_ascii_lowercase();
    match ext.as_str() {
        "csv" => Ok(OutFormat::Csv),
        "json" => Ok(OutFormat::Json),
        other => anyhow::bail!("unsupported format: {}", other),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let token = cli
        .token
        .context("missing API token: pass --token or set BANXICO_TOKEN")?;
    let client = Client::try_new(token).context("build http client")?;
    match cli.cmd {
        Command::Meta(args) => cmd_meta(&client, args),
        Command::Data(args) => cmd_data(&client, args),
    }
}

fn cmd_meta(client: &Client, args: MetaArgs) -> Result<()> {
    let series = parse_list(&args.series);
    let rows = client
        .get_metadata(&series, args.lang.into())
        .context("fetch metadata")?;

    if let Some(path) = args.out.as_ref() {
        match out_format(path, args.format)? {
            OutFormat::Csv => storage::save_metadata_csv(&rows, path)?,
            OutFormat::Json => storage::save_metadata_json(&rows, path)?,
        }
        eprintln!("Saved {} rows to {}", rows.len(), path.display());
    } else {
        for m in &rows {
            println!(
                "{}  {}  [{} .. {}]  {}  {}",
                m.series_code,
                m.title,
                m.start_date.as_deref().unwrap_or("?"),
                m.end_date.as_deref().unwrap_or("?"),
                m.periodicity.as_deref().unwrap_or(""),
                m.unit.as_deref().unwrap_or("")
            );
        }
    }
    Ok(())
}

fn cmd_data(client: &Client, args: DataArgs) -> Result<()> {
    let series = parse_list(&args.series);
    let mut query = DataQuery::new()
        .latest(args.latest)
        .increment(args.increment.into())
        .decimals(args.decimals)
        .language(args.lang.into())
        .missing(if args.skip_missing {
            MissingPolicy::Skip
        } else {
            MissingPolicy::Fail
        });
    if let (Some(start), Some(end)) = (args.start, args.end) {
        query = query.range(DateRange::new(start, end)?);
    }

    let tables = client.get_data(&series, &query).context("fetch data")?;

    if let Some(path) = args.out.as_ref() {
        match out_format(path, args.format)? {
            OutFormat::Csv => storage::save_csv(&tables, path)?,
            OutFormat::Json => storage::save_json(&tables, path)?,
        }
        let rows: usize = tables.iter().map(|t| t.len()).sum();
        eprintln!("Saved {} rows to {}", rows, path.display());
    }

    if args.stats {
        for s in stats::summarize(&tables) {
            println!(
                "{}  count={} first={} last={}  min={} max={} mean={} median={}",
                s.series_code,
                s.count.to_formatted_string(&Locale::en),
                s.first.map(|d| d.to_string()).unwrap_or_else(|| "NA".into()),
                s.last.map(|d| d.to_string()).unwrap_or_else(|| "NA".into()),
                fmt_opt(s.min),
                fmt_opt(s.max),
                fmt_opt(s.mean),
                fmt_opt(s.median)
            );
        }
    } else if args.out.is_none() {
        for t in &tables {
            for o in &t.observations {
                println!("{},{},{}", o.series_code, o.iso_date(), o.value);
            }
        }
    }

    Ok(())
}
