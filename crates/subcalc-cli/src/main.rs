use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde::Serialize;
use std::sync::Arc;
use subcalc_cidr::report::{calculate, describe_address, summarize_range, Report};
use subcalc_rpc::transport::StdioTransport;
use subcalc_rpc::{RpcServer, ServerConfig};
use tracing_subscriber::EnvFilter;

mod batch;

use batch::{read_inputs, BatchProcessor};

/// IPv4/IPv6 subnet calculator and CIDR range summarizer
#[derive(Parser)]
#[command(name = "subcalc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value = "human", global = true)]
    output: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate network details for an address and prefix length or netmask
    Calc(CalcArgs),
    /// Show classification and representations of a single address
    Info(InfoArgs),
    /// Summarize an address range into a minimal list of CIDR blocks
    Summarize(SummarizeArgs),
    /// Calculate many networks from a file or stdin
    Batch(BatchArgs),
    /// Serve JSON-RPC requests on stdio
    Serve,
}

#[derive(Parser)]
struct CalcArgs {
    /// IP address, or ADDRESS/SPEC when SPEC is omitted
    #[arg(value_name = "ADDRESS")]
    address: String,

    /// Prefix length (e.g. 24) or netmask (e.g. 255.255.255.0)
    #[arg(value_name = "SPEC", default_value = "")]
    spec: String,

    /// Include the CIDR pattern and IPv4 regex
    #[arg(short, long)]
    pattern: bool,
}

#[derive(Parser)]
struct InfoArgs {
    /// IPv4 or IPv6 address
    #[arg(value_name = "ADDRESS")]
    address: String,
}

#[derive(Parser)]
struct SummarizeArgs {
    /// First address of the range
    #[arg(value_name = "FIRST")]
    first: String,

    /// Last address of the range (inclusive)
    #[arg(value_name = "LAST")]
    last: String,
}

#[derive(Parser)]
struct BatchArgs {
    /// Input file (use '-' for stdin)
    #[arg(short, long, value_name = "FILE")]
    file: Option<String>,

    /// Number of worker threads
    #[arg(short, long)]
    workers: Option<usize>,

    /// Include the CIDR pattern and IPv4 regex
    #[arg(short, long)]
    pattern: bool,
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable table output
    Human,
    /// JSON output (pretty-printed)
    Json,
    /// JSON output (compact)
    JsonCompact,
    /// CSV output
    Csv,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Calc(args) => handle_calc(args, cli.output)?,
        Commands::Info(args) => handle_info(args, cli.output)?,
        Commands::Summarize(args) => handle_summarize(args, cli.output)?,
        Commands::Batch(args) => handle_batch(args, cli.output, cli.verbose)?,
        Commands::Serve => handle_serve()?,
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn handle_calc(args: CalcArgs, format: OutputFormat) -> Result<()> {
    let report = calculate(&args.address, &args.spec, args.pattern);
    emit("Network Calculation", &report, format)
}

fn handle_info(args: InfoArgs, format: OutputFormat) -> Result<()> {
    let report = describe_address(&args.address);
    emit("Address Information", &report, format)
}

fn handle_summarize(args: SummarizeArgs, format: OutputFormat) -> Result<()> {
    let report = summarize_range(&args.first, &args.last);
    emit("Range Summary", &report, format)
}

fn handle_batch(args: BatchArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    if verbose {
        match args.file {
            Some(ref file) => eprintln!("{} Reading from: {}", "›".blue(), file),
            None => eprintln!("{} Reading from stdin", "›".blue()),
        }
    }

    let inputs = read_inputs(args.file.as_deref())?;
    let processor = BatchProcessor::new(args.workers)?;

    if verbose {
        eprintln!(
            "{} Calculating {} networks with {} workers",
            "›".blue(),
            inputs.len(),
            processor.thread_count()
        );
    }

    let results = processor.process_lines(inputs, args.pattern);

    match format {
        OutputFormat::Human => {
            for result in &results {
                match &result.result {
                    Ok(report) => println!(
                        "{:<40} {} ({} hosts)",
                        result.input,
                        format!("{}/{}", report.network_address, report.cidr).green(),
                        report.total_hosts
                    ),
                    Err(error) => println!("{:<40} {}", result.input, error.red()),
                }
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
        OutputFormat::JsonCompact => println!("{}", serde_json::to_string(&results)?),
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            wtr.write_record(["input", "network", "host_min", "host_max", "total_hosts", "error"])?;
            for result in &results {
                let record = match &result.result {
                    Ok(report) => vec![
                        result.input.clone(),
                        format!("{}/{}", report.network_address, report.cidr),
                        report.host_min.to_string(),
                        report.host_max.to_string(),
                        report.total_hosts.to_string(),
                        String::new(),
                    ],
                    Err(error) => {
                        let mut record = vec![result.input.clone()];
                        record.extend(std::iter::repeat(String::new()).take(4));
                        record.push(error.clone());
                        record
                    }
                };
                wtr.write_record(&record)?;
            }
            wtr.flush()?;
        }
    }

    Ok(())
}

fn handle_serve() -> Result<()> {
    let config = ServerConfig::from_env()?;
    let server = Arc::new(RpcServer::new(config)?);
    let transport = StdioTransport::new(server);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(transport.run())?;
    Ok(())
}

/// Print a report in the requested format; failures exit non-zero
fn emit<T: Serialize>(title: &str, report: &Report<T>, format: OutputFormat) -> Result<()> {
    let value = serde_json::to_value(report)?;

    match format {
        OutputFormat::Human => print_human(title, &value),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&value)?),
        OutputFormat::JsonCompact => println!("{}", serde_json::to_string(&value)?),
        OutputFormat::Csv => print_csv(&value)?,
    }

    match report.error() {
        Some(error) => Err(anyhow!(error.to_string())),
        None => Ok(()),
    }
}

fn print_human(title: &str, value: &serde_json::Value) {
    let Some(fields) = value.as_object() else {
        return;
    };

    println!();
    println!("{}", title.bold().cyan());
    println!("{}", "─".repeat(50).dimmed());

    if let Some(error) = fields.get("error").and_then(|e| e.as_str()) {
        println!("{:>18}: {}", "Error".bold(), error.red());
        println!();
        return;
    }

    for (key, field) in fields {
        match field {
            serde_json::Value::Array(items) => {
                println!("{:>18}:", key.bold());
                for item in items {
                    println!("{:>18}  {}", "", display_value(item).green());
                }
            }
            _ => println!("{:>18}: {}", key.bold(), display_value(field)),
        }
    }
    println!();
}

fn print_csv(value: &serde_json::Value) -> Result<()> {
    let Some(fields) = value.as_object() else {
        return Ok(());
    };

    let mut wtr = csv::Writer::from_writer(std::io::stdout());
    wtr.write_record(fields.keys())?;
    wtr.write_record(fields.values().map(display_value))?;
    wtr.flush()?;
    Ok(())
}

fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["subcalc", "calc", "192.168.1.10", "31"]);
        assert!(matches!(cli.output, OutputFormat::Human));
        if let Commands::Calc(args) = cli.command {
            assert_eq!(args.address, "192.168.1.10");
            assert_eq!(args.spec, "31");
            assert!(!args.pattern);
        } else {
            panic!("Expected Calc command");
        }
    }

    #[test]
    fn test_calc_combined_notation() {
        let cli = Cli::parse_from(["subcalc", "calc", "10.0.0.0/8", "--pattern"]);
        if let Commands::Calc(args) = cli.command {
            assert_eq!(args.spec, "");
            assert!(args.pattern);
        } else {
            panic!("Expected Calc command");
        }
    }

    #[test]
    fn test_output_format_json() {
        let cli = Cli::parse_from(["subcalc", "--output", "json", "info", "2001:db8::1"]);
        assert!(matches!(cli.output, OutputFormat::Json));
        assert!(matches!(cli.command, Commands::Info(_)));
    }

    #[test]
    fn test_summarize_command() {
        let cli = Cli::parse_from(["subcalc", "summarize", "10.0.0.1", "10.0.0.6"]);
        if let Commands::Summarize(args) = cli.command {
            assert_eq!(args.first, "10.0.0.1");
            assert_eq!(args.last, "10.0.0.6");
        } else {
            panic!("Expected Summarize command");
        }
    }

    #[test]
    fn test_batch_command() {
        let cli = Cli::parse_from(["subcalc", "batch", "--file", "nets.txt", "--workers", "5"]);
        if let Commands::Batch(args) = cli.command {
            assert_eq!(args.file, Some("nets.txt".to_string()));
            assert_eq!(args.workers, Some(5));
        } else {
            panic!("Expected Batch command");
        }
    }

    #[test]
    fn test_serve_command() {
        let cli = Cli::parse_from(["subcalc", "-v", "serve"]);
        assert!(matches!(cli.command, Commands::Serve));
        assert!(cli.verbose);
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&serde_json::json!("10.0.0.0")), "10.0.0.0");
        assert_eq!(display_value(&serde_json::json!(254)), "254");
        assert_eq!(display_value(&serde_json::json!(["a/1", "b/2"])), "a/1 b/2");
    }

    #[test]
    fn test_emit_reports_failure() {
        let report = calculate("10.0.0.1", "33", false);
        assert!(emit("Network Calculation", &report, OutputFormat::JsonCompact).is_err());

        let report = calculate("10.0.0.1", "8", false);
        assert!(emit("Network Calculation", &report, OutputFormat::JsonCompact).is_ok());
    }
}
