//! Parallel batch calculation using Rayon
//!
//! Each input line is either `ADDRESS SPEC` or `ADDRESS/SPEC`. Lines are
//! calculated independently, so one bad line never fails the batch.

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::io::{BufRead, BufReader};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use subcalc_cidr::report::{calculate, NetworkReport};
use tracing::info;

/// Batch processing result
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub input: String,
    pub result: Result<NetworkReport, String>,
}

impl Serialize for BatchResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("BatchResult", 2)?;
        state.serialize_field("input", &self.input)?;
        match &self.result {
            Ok(report) => state.serialize_field("result", report)?,
            Err(error) => state.serialize_field("error", error)?,
        }
        state.end()
    }
}

/// Batch processor with parallel execution
pub struct BatchProcessor {
    thread_pool: rayon::ThreadPool,
}

impl BatchProcessor {
    /// Create a new batch processor
    ///
    /// # Arguments
    ///
    /// * `num_threads` - Number of threads (default: CPU cores)
    pub fn new(num_threads: Option<usize>) -> Result<Self> {
        let num_threads = num_threads.unwrap_or_else(num_cpus::get);

        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()?;

        Ok(Self { thread_pool })
    }

    /// Calculate every line in parallel, preserving input order
    pub fn process_lines(&self, lines: Vec<String>, with_pattern: bool) -> Vec<BatchResult> {
        let total = lines.len();
        let processed = Arc::new(AtomicUsize::new(0));

        self.thread_pool.install(|| {
            lines
                .into_par_iter()
                .map(|line| {
                    let result = calculate_line(&line, with_pattern);

                    let count = processed.fetch_add(1, Ordering::Relaxed) + 1;
                    if count % 1000 == 0 || count == total {
                        info!(processed = count, total, "batch progress");
                    }

                    BatchResult {
                        input: line,
                        result,
                    }
                })
                .collect()
        })
    }

    /// Get thread pool info
    pub fn thread_count(&self) -> usize {
        self.thread_pool.current_num_threads()
    }
}

/// Calculate a single batch line
fn calculate_line(line: &str, with_pattern: bool) -> Result<NetworkReport, String> {
    let fields: Vec<&str> = line.split_whitespace().collect();

    let report = match fields.as_slice() {
        [combined] => calculate(combined, "", with_pattern),
        [address, spec] => calculate(address, spec, with_pattern),
        _ => return Err("Expected 'ADDRESS SPEC' or 'ADDRESS/SPEC'".to_string()),
    };

    report.into_result()
}

/// Read batch lines from a file, or stdin when `path` is `None` or `-`
///
/// Blank lines and `#` comments are skipped.
pub fn read_inputs(path: Option<&str>) -> Result<Vec<String>> {
    let reader: Box<dyn BufRead> = match path {
        None | Some("-") => Box::new(BufReader::new(std::io::stdin())),
        Some(path) => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("Failed to open input file: {}", path))?;
            Box::new(BufReader::new(file))
        }
    };

    collect_lines(reader)
}

fn collect_lines<R: BufRead>(reader: R) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        lines.push(trimmed.to_string());
    }
    Ok(lines)
}
