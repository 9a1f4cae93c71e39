// Console report and persisted key=value record of a measurement window

use std::fmt;
use std::fs;
use std::path::Path;

use crate::counters::imc::{CounterBackend, DramCounter};
use crate::error::{DramflowError, Result};
use crate::metrics::imc::{format_bytes, DramTraffic, TrafficMetric};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportNote {
    /// No counter could be opened; totals are zero
    Unavailable,
    /// At least one counter uses the built-in CAS_COUNT encoding
    LowConfidence,
}

impl ReportNote {
    fn message(&self) -> &'static str {
        match self {
            ReportNote::Unavailable => "Warning: no iMC counters available, totals are zero",
            ReportNote::LowConfidence => {
                "Note: built-in CAS_COUNT encoding in use, figures are lower confidence"
            }
        }
    }
}

/// Human-readable summary of one window
#[derive(Debug, Clone)]
pub struct DramReport {
    pub traffic: DramTraffic,
    pub note: Option<ReportNote>,
}

impl fmt::Display for DramReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== DRAM Traffic (Region) ===")?;
        writeln!(f, "Read : {}", format_bytes(self.traffic.read_bytes))?;
        writeln!(f, "Write: {}", format_bytes(self.traffic.write_bytes))?;
        write!(f, "Total: {}", format_bytes(self.traffic.total_bytes()))?;
        if let Some(note) = self.note {
            write!(f, "\n{}", note.message())?;
        }
        Ok(())
    }
}

/// Render the record file contents, one `KEY=value` line per metric
pub fn render_record(traffic: &DramTraffic) -> String {
    TrafficMetric::all()
        .into_iter()
        .map(|metric| format!("{}={}\n", metric.name(), traffic.get(metric)))
        .collect()
}

/// Write the record, creating the parent directory and replacing any old file
pub fn write_record(path: &Path, traffic: &DramTraffic) -> Result<()> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| {
            DramflowError::RecordError(format!("Failed to create {}: {}", dir.display(), e))
        })?;
    }

    fs::write(path, render_record(traffic)).map_err(|e| {
        DramflowError::RecordError(format!("Failed to write {}: {}", path.display(), e))
    })?;

    tracing::debug!("Wrote DRAM record to {}", path.display());
    Ok(())
}

/// Parse a record written by [`write_record`]; keys must appear in order
pub fn parse_record(contents: &str) -> Result<DramTraffic> {
    let mut lines = contents.lines();
    let mut values = Vec::with_capacity(3);

    for metric in TrafficMetric::all() {
        let line = lines.next().ok_or_else(|| {
            DramflowError::ParseError(format!("Missing {} line", metric.name()))
        })?;

        let value = line
            .strip_prefix(metric.name())
            .and_then(|rest| rest.strip_prefix('='))
            .ok_or_else(|| {
                DramflowError::ParseError(format!("Expected {}=, got {:?}", metric.name(), line))
            })?;

        let value: u64 = value.trim().parse().map_err(|e| {
            DramflowError::ParseError(format!("Invalid {} value {:?}: {}", metric.name(), value, e))
        })?;
        values.push(value);
    }

    let traffic = DramTraffic::new(values[0], values[1]);
    if traffic.total_bytes() != values[2] {
        return Err(DramflowError::ParseError(format!(
            "Total {} does not match read + write {}",
            values[2],
            traffic.total_bytes()
        )));
    }

    Ok(traffic)
}

pub fn read_record(path: &Path) -> Result<DramTraffic> {
    let contents = fs::read_to_string(path).map_err(|e| {
        DramflowError::RecordError(format!("Failed to read {}: {}", path.display(), e))
    })?;
    parse_record(&contents)
}

impl<B: CounterBackend> DramCounter<B> {
    pub fn report(&self) -> DramReport {
        let note = if !self.is_initialised() {
            Some(ReportNote::Unavailable)
        } else if self.uses_fallback() {
            Some(ReportNote::LowConfidence)
        } else {
            None
        };

        DramReport {
            traffic: self.traffic(),
            note,
        }
    }

    /// Print the report and, when `save` is set, persist the record
    ///
    /// A record that cannot be written is logged; the traffic is returned either way.
    pub fn print_results(&self, save: bool) -> DramTraffic {
        let report = self.report();
        println!("\n{report}");

        if save {
            if let Err(e) = write_record(&self.config().output_path(), &report.traffic) {
                tracing::warn!("DRAM record not saved: {}", e);
            }
        }

        report.traffic
    }
}
