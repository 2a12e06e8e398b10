//! Result reporting
//!
//! The sweep hands each phase outcome to a [`Reporter`] as soon as it is
//! known. [`TableReporter`] prints the classic tab-separated table and
//! flushes after every cell so progress is visible while a phase runs;
//! [`JsonReporter`] emits one document at the end.

use std::io::Write;
use chrono::{DateTime, Utc};
use serde::Serialize;
use crate::config::BenchmarkConfig;
use crate::models::{Direction, PhaseOutcome, SweepRow};
use crate::util::units::{format_block_size_kb, format_throughput};
use crate::{MammothError, Result, MIB};

/// Receives sweep progress
pub trait Reporter {
    /// Called once before the first block size
    fn begin(&mut self, config: &BenchmarkConfig) -> Result<()>;

    /// A new block size is about to be measured
    fn block_started(&mut self, block_size: u64) -> Result<()>;

    /// One direction finished (or was skipped)
    fn phase_finished(&mut self, direction: Direction, outcome: &PhaseOutcome) -> Result<()>;

    /// Both directions of a block size are done
    fn row_finished(&mut self, row: &SweepRow) -> Result<()>;

    /// Called once after the last block size
    fn finish(&mut self) -> Result<()>;
}

fn output_error(e: std::io::Error) -> MammothError {
    MammothError::io("write output", e)
}

/// Human-readable table
pub struct TableReporter<W: Write> {
    out: W,
}

impl<W: Write> TableReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) -> Result<()> {
        self.out.write_all(text.as_bytes()).map_err(output_error)?;
        self.out.flush().map_err(output_error)
    }
}

impl<W: Write> Reporter for TableReporter<W> {
    fn begin(&mut self, config: &BenchmarkConfig) -> Result<()> {
        let header = format!(
            "{} v{}\n\nBenchmarking {}: max {}MB or {} timeout\n\nBLKSIZE\twMB/s\trMB/s\n-------\t-----\t-----",
            crate::APP_NAME,
            env!("CARGO_PKG_VERSION"),
            config.target.display(),
            config.volume / MIB,
            humantime::format_duration(config.timeout),
        );
        self.emit(&header)
    }

    fn block_started(&mut self, block_size: u64) -> Result<()> {
        self.emit(&format!("\n{}\t", format_block_size_kb(block_size)))
    }

    fn phase_finished(&mut self, _direction: Direction, outcome: &PhaseOutcome) -> Result<()> {
        let cell = match outcome.throughput_mbps() {
            Some(mbps) => format_throughput(mbps),
            None => "skip".to_string(),
        };
        self.emit(&format!("{}\t", cell))
    }

    fn row_finished(&mut self, _row: &SweepRow) -> Result<()> {
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.emit("\n")
    }
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    tool: &'static str,
    version: &'static str,
    started_at: DateTime<Utc>,
    config: &'a BenchmarkConfig,
    rows: &'a [SweepRow],
}

/// Machine-readable report written when the sweep completes
pub struct JsonReporter<W: Write> {
    out: W,
    config: Option<BenchmarkConfig>,
    started_at: DateTime<Utc>,
    rows: Vec<SweepRow>,
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            config: None,
            started_at: Utc::now(),
            rows: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn begin(&mut self, config: &BenchmarkConfig) -> Result<()> {
        self.config = Some(config.clone());
        self.started_at = Utc::now();
        Ok(())
    }

    fn block_started(&mut self, _block_size: u64) -> Result<()> {
        Ok(())
    }

    fn phase_finished(&mut self, _direction: Direction, _outcome: &PhaseOutcome) -> Result<()> {
        Ok(())
    }

    fn row_finished(&mut self, row: &SweepRow) -> Result<()> {
        self.rows.push(row.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let config = self.config.as_ref().ok_or_else(|| {
            MammothError::TaskError("report finished before it began".to_string())
        })?;
        let report = JsonReport {
            tool: crate::APP_NAME,
            version: env!("CARGO_PKG_VERSION"),
            started_at: self.started_at,
            config,
            rows: &self.rows,
        };
        serde_json::to_writer_pretty(&mut self.out, &report)
            .map_err(|e| output_error(e.into()))?;
        self.out.write_all(b"\n").map_err(output_error)?;
        self.out.flush().map_err(output_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProbeResult;
    use std::time::Duration;

    fn config() -> BenchmarkConfig {
        BenchmarkConfig::new("/dev/sdz")
            .with_volume(64 * MIB)
            .with_timeout(Duration::from_secs(5))
    }

    fn measured(block_size: u64, blocks: u64) -> PhaseOutcome {
        PhaseOutcome::Measured(ProbeResult::new(block_size, blocks, Duration::from_secs(1)))
    }

    fn drive<R: Reporter>(reporter: &mut R, rows: &[SweepRow]) {
        reporter.begin(&config()).unwrap();
        for row in rows {
            reporter.block_started(row.block_size).unwrap();
            reporter.phase_finished(Direction::Write, &row.write).unwrap();
            reporter.phase_finished(Direction::Read, &row.read).unwrap();
            reporter.row_finished(row).unwrap();
        }
        reporter.finish().unwrap();
    }

    #[test]
    fn test_table_layout() {
        let rows = vec![
            SweepRow { block_size: 512, write: measured(512, 2048), read: measured(512, 4096) },
            SweepRow { block_size: 4096, write: PhaseOutcome::Skipped, read: measured(4096, 2560) },
        ];
        let mut reporter = TableReporter::new(Vec::new());
        drive(&mut reporter, &rows);

        let text = String::from_utf8(reporter.into_inner()).unwrap();
        assert!(text.starts_with("mammothbench v"));
        assert!(text.contains("Benchmarking /dev/sdz: max 64MB or 5s timeout"));
        assert!(text.contains("BLKSIZE\twMB/s\trMB/s\n-------\t-----\t-----"));
        assert!(text.contains("\n 0.5\t  1.0\t  2.0\t"));
        assert!(text.contains("\n   4\tskip\t 10.0\t"));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_json_document() {
        let rows = vec![SweepRow {
            block_size: 1024,
            write: measured(1024, 1024),
            read: PhaseOutcome::Skipped,
        }];
        let mut reporter = JsonReporter::new(Vec::new());
        drive(&mut reporter, &rows);

        let json: serde_json::Value = serde_json::from_slice(&reporter.into_inner()).unwrap();
        assert_eq!(json["tool"], "mammothbench");
        assert_eq!(json["config"]["target"], "/dev/sdz");
        assert_eq!(json["config"]["timeout_secs"], 5.0);
        assert_eq!(json["rows"][0]["block_size"], 1024);
        assert_eq!(json["rows"][0]["write"]["throughput_mbps"], 1.0);
        assert_eq!(json["rows"][0]["read"], "skip");
        assert!(json["started_at"].is_string());
    }

    /// Sink that rejects every write
    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_json_write_failure_is_output_error() {
        let mut reporter = JsonReporter::new(ClosedPipe);
        reporter.begin(&config()).unwrap();

        let err = reporter.finish().err().unwrap();
        assert!(matches!(err, MammothError::IoError { op: "write output", .. }), "{}", err);
    }

    #[test]
    fn test_table_write_failure_is_output_error() {
        let mut reporter = TableReporter::new(ClosedPipe);
        let err = reporter.begin(&config()).err().unwrap();
        assert!(matches!(err, MammothError::IoError { op: "write output", .. }));
    }

    #[test]
    fn test_json_finish_without_begin_fails() {
        let mut reporter = JsonReporter::new(Vec::new());
        assert!(reporter.finish().is_err());
    }
}
