//! The mapping run
//!
//! Two build phases, then one streaming pass:
//! 1. Read the metadata table into an [`IdentifierIndex`]
//! 2. Scan the local mirror into a [`LocalPathIndex`]
//! 3. Resolve every JSONL record and write it back out, in input order
//!
//! Any fatal condition in phases 1 and 2 stops the run before the output
//! file is created.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use crate::config::MapperConfig;
use crate::error::{MapperError, Result};
use crate::index::{IdentifierIndex, LocalPathIndex, MetadataColumns};
use crate::resolve::{FileProbe, PassStats, Resolver};

/// Everything reported at the end of a run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub metadata_entries: usize,
    pub local_images: usize,
    pub stats: PassStats,
    /// Non-object lines skipped (only when `skip_malformed_lines` is on)
    pub malformed_skipped: usize,
    pub output_path: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Counters produced by the streaming pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StreamStats {
    pub resolved: PassStats,
    pub malformed_skipped: usize,
}

/// Run the whole mapping job described by `config`
pub fn run(config: &MapperConfig) -> Result<RunSummary> {
    config.validate()?;
    let started_at = Utc::now();

    // ==== Phase 1: URL → ImageID ====
    let columns = MetadataColumns {
        url: config.url_column.clone(),
        id: config.id_column.clone(),
        delimiter: config.delimiter_byte()?,
    };
    let ids = IdentifierIndex::from_path(&config.metadata_csv, &columns)?;
    tracing::info!("📘 Loaded {} metadata entries (URL → ImageID)", ids.len());

    // ==== Phase 2: ImageID → local file ====
    tracing::info!("📂 Scanning local images under: {}", config.image_root.display());
    let paths = LocalPathIndex::scan(&config.image_root, &config.normalized_extension())?;
    tracing::info!("📦 Indexed {} local images", paths.len());

    // ==== Phase 3: resolve records ====
    let input = File::open(&config.records_in).map_err(|e| MapperError::io(&config.records_in, e))?;
    let output = File::create(&config.records_out).map_err(|e| MapperError::io(&config.records_out, e))?;

    let resolver = Resolver::new(&ids, &paths, config.url_field.as_str(), config.path_field.as_str());
    let mut writer = BufWriter::new(output);
    let stream = map_records(
        BufReader::new(input),
        &mut writer,
        &resolver,
        config.skip_malformed_lines,
        config.progress_interval,
    )?;
    writer.flush().map_err(|e| MapperError::io(&config.records_out, e))?;

    Ok(RunSummary {
        metadata_entries: ids.len(),
        local_images: paths.len(),
        stats: stream.resolved.snapshot(),
        malformed_skipped: stream.malformed_skipped,
        output_path: config.records_out.clone(),
        started_at,
        finished_at: Utc::now(),
    })
}

/// Resolve every non-blank line of `input` and write one line per record.
///
/// Lines that are not JSON objects abort the pass unless `skip_malformed` is
/// set, in which case they are dropped and counted.
pub fn map_records<R, W, P>(
    input: R,
    output: &mut W,
    resolver: &Resolver<'_, P>,
    skip_malformed: bool,
    progress_interval: usize,
) -> Result<StreamStats>
where
    R: BufRead,
    W: Write,
    P: FileProbe,
{
    let mut stream = StreamStats::default();
    let progress_interval = progress_interval.max(1);

    for (idx, line) in input.lines().enumerate() {
        let line_number = idx + 1;
        let line = line.map_err(MapperError::ReadRecords)?;
        if line.trim().is_empty() {
            continue;
        }

        let mut record = match parse_record(&line) {
            Ok(record) => record,
            Err(reason) if skip_malformed => {
                tracing::warn!("⚠️  Skipping line {}: {}", line_number, reason);
                stream.malformed_skipped += 1;
                continue;
            }
            Err(reason) => {
                return Err(MapperError::MalformedRecord {
                    line: line_number,
                    reason,
                })
            }
        };

        let outcome = resolver.resolve(&mut record);
        stream.resolved.record(outcome);

        serde_json::to_writer(&mut *output, &record).map_err(|source| MapperError::Encode {
            line: line_number,
            source,
        })?;
        output.write_all(b"\n").map_err(MapperError::WriteRecords)?;

        let done = stream.resolved.total();
        if done % progress_interval == 0 {
            tracing::info!("⏳ Mapped {} records...", done);
        }
    }

    Ok(stream)
}

/// A line must hold exactly one JSON object
fn parse_record(line: &str) -> std::result::Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(record)) => Ok(record),
        Ok(other) => Err(format!("expected a JSON object, found {}", json_kind(&other))),
        Err(e) => Err(e.to_string()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "✅ Mapping completed.")?;
        writeln!(f, "  📘 Metadata entries loaded: {}", thousands(self.metadata_entries))?;
        writeln!(f, "  📦 Local images indexed: {}", thousands(self.local_images))?;
        writeln!(f, "  🟢 Matched successfully: {}", thousands(self.stats.matched))?;
        writeln!(f, "  🟡 URL not found in metadata: {}", thousands(self.stats.url_unresolved))?;
        writeln!(
            f,
            "  🔴 ImageID found but file missing locally: {}",
            thousands(self.stats.file_missing)
        )?;
        if self.malformed_skipped > 0 {
            writeln!(f, "  ⚠️  Malformed lines skipped: {}", thousands(self.malformed_skipped))?;
        }
        let elapsed = self.finished_at - self.started_at;
        writeln!(f, "  ⏱️  Took {:.1}s", elapsed.num_milliseconds() as f64 / 1000.0)?;
        write!(f, "Output saved to: {}", self.output_path.display())
    }
}

/// 1234567 → "1,234,567"
fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
