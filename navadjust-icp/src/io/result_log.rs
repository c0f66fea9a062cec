//! Ordering-safe result output.
//!
//! Workers never share a partially written record. Each CSV row is built in
//! full and handed to the sink as one write; multi-line diagnostics are
//! collected in a [`MessageBuffer`] and emitted as one log record.

use std::fmt::{self, Write as _};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use crate::engine::pipeline::AlignmentResult;
use crate::engine::scheduler::{BatchSummary, CrossingOutcome};

/// Column names of the result CSV.
pub const CSV_COLUMNS: [&str; 30] = [
    "crossing",
    "overlap",
    "targetPoints",
    "sourcePoints",
    "milliseconds",
    "fitness_rough",
    "fitness_fine",
    "correspondenceCount",
    "Tx",
    "Ty",
    "Tz",
    "Rx",
    "Ry",
    "Rz",
    "T0",
    "T1",
    "T2",
    "T3",
    "T4",
    "T5",
    "T6",
    "T7",
    "T8",
    "T9",
    "T10",
    "T11",
    "T12",
    "T13",
    "T14",
    "T15",
];

/// Header line (no trailing newline).
pub fn csv_header() -> String {
    CSV_COLUMNS.join(", ")
}

/// One CSV row for `result` (no trailing newline).
pub fn format_row(result: &AlignmentResult) -> String {
    let r = &result.rigid;
    let mut fields: Vec<String> = Vec::with_capacity(CSV_COLUMNS.len());
    fields.push(result.crossing.to_string());
    fields.push(result.overlap.to_string());
    fields.push(result.target_points.to_string());
    fields.push(result.source_points.to_string());
    fields.push(result.milliseconds().to_string());
    fields.push(format!("{:.6}", result.fitness_rough));
    fields.push(format!("{:.6}", result.fitness_fine));
    fields.push(result.correspondence_count.to_string());
    for v in [r.tx, r.ty, r.tz] {
        fields.push(format!("{:.4}", v));
    }
    for v in [r.rx, r.ry, r.rz] {
        fields.push(format!("{:.6}", v));
    }
    for v in result.transform_row_major() {
        fields.push(format!("{:.8}", v));
    }
    fields.join(", ")
}

// ============================================================================
// Sinks
// ============================================================================

/// Destination for complete result lines.
pub trait ResultSink: Send + Sync {
    /// Write one line. Implementations must write it as a single unit.
    fn write_line(&self, line: &str) -> io::Result<()>;
}

/// Writes lines to standard output.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl ResultSink for StdoutSink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut buffer = String::with_capacity(line.len() + 1);
        buffer.push_str(line);
        buffer.push('\n');
        let mut out = io::stdout().lock();
        out.write_all(buffer.as_bytes())?;
        out.flush()
    }
}

/// Collects lines in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    /// Snapshot of the lines written so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|l| l.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl ResultSink for MemorySink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut lines = self
            .lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        lines.push(line.to_string());
        Ok(())
    }
}

// ============================================================================
// Message buffer
// ============================================================================

/// Accumulates a multi-line message and emits it as one log record.
///
/// Emitted on [`flush`](Self::flush) or when dropped, whichever comes first.
#[derive(Debug)]
pub struct MessageBuffer {
    level: log::Level,
    text: String,
}

impl MessageBuffer {
    /// Empty buffer logging at `level`.
    pub fn new(level: log::Level) -> Self {
        Self {
            level,
            text: String::new(),
        }
    }

    /// Append one line.
    pub fn line(&mut self, args: fmt::Arguments<'_>) -> &mut Self {
        if !self.text.is_empty() {
            self.text.push('\n');
        }
        // Writing into a String cannot fail
        let _ = self.text.write_fmt(args);
        self
    }

    /// Buffered text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// True if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Emit the buffered text and clear it.
    pub fn flush(&mut self) {
        if !self.text.is_empty() {
            log::log!(self.level, "{}", self.text);
            self.text.clear();
        }
    }
}

impl Drop for MessageBuffer {
    fn drop(&mut self) {
        self.flush();
    }
}

// ============================================================================
// Result log
// ============================================================================

/// Emits per-crossing records from any worker.
pub struct ResultLog {
    sink: Arc<dyn ResultSink>,
}

impl ResultLog {
    /// Log writing rows to `sink`.
    pub fn new(sink: Arc<dyn ResultSink>) -> Self {
        Self { sink }
    }

    /// Log writing rows to standard output.
    pub fn stdout() -> Self {
        Self::new(Arc::new(StdoutSink))
    }

    /// Write the CSV header.
    pub fn write_header(&self) {
        if let Err(e) = self.sink.write_line(&csv_header()) {
            log::error!("Failed to write result header: {}", e);
        }
    }

    /// Record one outcome: a CSV row for an aligned crossing, an error
    /// record for a failed one.
    pub fn report(&self, outcome: &CrossingOutcome) {
        match outcome {
            CrossingOutcome::Aligned(result) => {
                if let Err(e) = self.sink.write_line(&format_row(result)) {
                    log::error!("Failed to write result for {}: {}", result.crossing, e);
                }
                let mut msg = MessageBuffer::new(log::Level::Debug);
                msg.line(format_args!(
                    "Crossing {} aligned in {} ms, {} iterations",
                    result.crossing,
                    result.milliseconds(),
                    result.iterations
                ));
                if let (Some(before), Some(after)) =
                    (result.source_centroid, result.source_centroid_rough)
                {
                    msg.line(format_args!(
                        "  source centroid ({:.2}, {:.2}, {:.2}) -> ({:.2}, {:.2}, {:.2}) after rough alignment",
                        before.x, before.y, before.z, after.x, after.y, after.z
                    ));
                }
                if let Some(f) = result.overlap_used {
                    msg.line(format_args!("  overlap trimming at {:.2}", f));
                }
            }
            CrossingOutcome::Failed { crossing, error } => {
                let mut msg = MessageBuffer::new(log::Level::Error);
                msg.line(format_args!("Crossing {} failed", crossing));
                msg.line(format_args!("  {}", error));
            }
        }
    }

    /// Log batch totals.
    pub fn summary(&self, summary: &BatchSummary) {
        let mut msg = MessageBuffer::new(log::Level::Info);
        msg.line(format_args!(
            "Processed {} crossings: {} aligned, {} failed",
            summary.attempted, summary.succeeded, summary.failed
        ));
        msg.line(format_args!(
            "Total time: {:.3} s",
            summary.elapsed.as_secs_f64()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transform::{RigidDecomposition, translation};
    use crate::core::types::CrossingKey;
    use crate::error::AlignError;
    use std::time::Duration;

    fn sample_result() -> AlignmentResult {
        let transform = translation(1.5, -2.25, 0.125);
        AlignmentResult {
            crossing: CrossingKey::new(3, 1, 4, 0),
            overlap: 72,
            target_points: 1200,
            source_points: 980,
            correspondence_count: 640,
            overlap_used: Some(0.72),
            fitness_rough: 4.5,
            fitness_fine: 0.03,
            elapsed: Duration::from_millis(250),
            rigid: RigidDecomposition::from_matrix(&transform),
            transform,
            iterations: 12,
            termination: None,
            source_centroid: None,
            source_centroid_rough: None,
        }
    }

    #[test]
    fn test_header() {
        let header = csv_header();
        assert!(header.starts_with("crossing, overlap, targetPoints, sourcePoints, milliseconds"));
        assert!(header.ends_with("T14, T15"));
        assert_eq!(header.split(", ").count(), 30);
    }

    #[test]
    fn test_row_format() {
        let row = format_row(&sample_result());
        let fields: Vec<&str> = row.split(", ").collect();

        assert_eq!(fields.len(), 30);
        assert_eq!(fields[0], "3:1/4:0");
        assert_eq!(fields[1], "72");
        assert_eq!(fields[4], "250");
        assert_eq!(fields[7], "640");
        assert_eq!(fields[8], "1.5000");
        assert_eq!(fields[9], "-2.2500");
        // Row-major: T3 is tx, T15 is 1
        assert_eq!(fields[14 + 3], "1.50000000");
        assert_eq!(fields[14 + 15], "1.00000000");
    }

    #[test]
    fn test_report_routes_outcomes() {
        let sink = Arc::new(MemorySink::default());
        let log = ResultLog::new(sink.clone());

        log.write_header();
        log.report(&CrossingOutcome::Aligned(sample_result()));
        log.report(&CrossingOutcome::Failed {
            crossing: CrossingKey::new(0, 0, 1, 0),
            error: AlignError::Registration("no correspondences".to_string()),
        });

        let lines = sink.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], csv_header());
        assert!(lines[1].starts_with("3:1/4:0, 72"));
    }

    #[test]
    fn test_message_buffer_flush_clears() {
        let mut msg = MessageBuffer::new(log::Level::Info);
        assert!(msg.is_empty());
        msg.line(format_args!("first {}", 1)).line(format_args!("second"));
        assert_eq!(msg.as_str(), "first 1\nsecond");
        msg.flush();
        assert!(msg.is_empty());
    }
}
