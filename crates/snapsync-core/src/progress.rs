//! Transfer progress tracking and throttled reporting.
//!
//! A [`Tracker`] turns cumulative byte updates into speed/ETA snapshots; a
//! [`Printer`] rate-limits how often those snapshots reach the terminal and
//! renders them as text or NDJSON.

use std::{
    io::Write,
    time::{Duration, Instant},
};

use serde_json::json;

use crate::error::{AppError, Result};

const MIB: f64 = 1024.0 * 1024.0;

/// Point-in-time transfer metrics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    /// Cumulative bytes transferred so far.
    pub bytes_transferred: u64,
    /// Declared total byte count.
    pub bytes_total: u64,
    /// Wall time since the tracker was created.
    pub elapsed: Duration,
    /// Bytes per second over the delta since the previous update.
    pub instant_bps: f64,
    /// Bytes per second over the whole transfer.
    pub average_bps: f64,
    /// Estimated remaining time; zero when unknown or complete.
    pub eta: Duration,
}

/// Computes transfer speed and ETA from cumulative byte updates.
#[derive(Debug)]
pub struct Tracker {
    total: u64,
    start: Instant,
    last: Instant,
    last_bytes: u64,
    current: u64,
}

impl Tracker {
    /// Start tracking a transfer with a known byte total.
    #[must_use]
    pub fn new(total: u64) -> Self {
        let now = Instant::now();
        Self { total, start: now, last: now, last_bytes: 0, current: 0 }
    }

    /// Record `n` additional bytes and return a fresh snapshot.
    ///
    /// `add(0)` produces a terminal snapshot without mutating totals.
    pub fn add(&mut self, n: usize) -> Snapshot {
        let now = Instant::now();
        self.current += n as u64;

        let delta = now.duration_since(self.last);
        let delta_bytes = self.current - self.last_bytes;
        let instant_bps =
            if delta > Duration::ZERO { delta_bytes as f64 / delta.as_secs_f64() } else { 0.0 };

        let elapsed = now.duration_since(self.start);
        let average_bps =
            if elapsed > Duration::ZERO { self.current as f64 / elapsed.as_secs_f64() } else { 0.0 };

        let remaining = self.total.saturating_sub(self.current);
        let eta = if average_bps > 0.0 && remaining > 0 {
            Duration::from_secs_f64(remaining as f64 / average_bps)
        } else {
            Duration::ZERO
        };

        self.last = now;
        self.last_bytes = self.current;

        Snapshot {
            bytes_transferred: self.current,
            bytes_total: self.total,
            elapsed,
            instant_bps,
            average_bps,
            eta,
        }
    }
}

/// Writes throttled progress updates as text lines or NDJSON records.
#[derive(Debug)]
pub struct Printer<W: Write> {
    out: W,
    prefix: &'static str,
    json: bool,
    interval: Duration,
    last: Option<Instant>,
}

impl<W: Write> Printer<W> {
    /// Create a printer; `prefix` names the phase (`send` or `recv`).
    pub fn new(out: W, prefix: &'static str, json: bool) -> Self {
        Self { out, prefix, json, interval: Duration::from_millis(150), last: None }
    }

    /// Emit a progress update unless one was written within the throttle
    /// interval.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::Io`](crate::ErrorKind::Io) when the sink write fails
    pub fn print_maybe(&mut self, snapshot: &Snapshot) -> Result<()> {
        let now = Instant::now();
        if let Some(last) = self.last {
            if now.duration_since(last) < self.interval {
                return Ok(());
            }
        }
        self.last = Some(now);
        self.print(snapshot, false, None)
    }

    /// Emit the final summary line, bypassing the throttle.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::Io`](crate::ErrorKind::Io) when the sink write fails
    pub fn print_final(&mut self, snapshot: &Snapshot, output: Option<&str>) -> Result<()> {
        self.print(snapshot, true, output)
    }

    fn print(&mut self, s: &Snapshot, is_final: bool, output: Option<&str>) -> Result<()> {
        if self.json {
            let mut record = json!({
                "phase": self.prefix,
                "bytes": s.bytes_transferred,
                "total": s.bytes_total,
                "elapsed_seconds": s.elapsed.as_secs_f64(),
                "instant_bps": s.instant_bps,
                "average_bps": s.average_bps,
                "eta_seconds": s.eta.as_secs_f64(),
                "final": is_final,
                "throughput_mib_s": s.average_bps / MIB,
            });
            if let Some(path) = output {
                record["output"] = json!(path);
            }
            return writeln!(self.out, "{record}")
                .map_err(|err| AppError::io("write progress record").caused_by(err));
        }

        let eta = if s.eta > Duration::ZERO {
            format!("{}s", s.eta.as_secs_f64().round() as u64)
        } else {
            "--".to_string()
        };
        let mut line = format!(
            "{} bytes={}/{} inst={:.2} MiB/s avg={:.2} MiB/s eta={}",
            self.prefix,
            s.bytes_transferred,
            s.bytes_total,
            s.instant_bps / MIB,
            s.average_bps / MIB,
            eta,
        );
        if is_final {
            if let Some(path) = output {
                line.push_str(&format!(" output={path}"));
            }
        }
        writeln!(self.out, "{line}")
            .map_err(|err| AppError::io("write progress line").caused_by(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_accumulates_bytes() {
        let mut tracker = Tracker::new(100);
        let snapshot = tracker.add(40);
        assert_eq!(snapshot.bytes_transferred, 40);
        assert_eq!(snapshot.bytes_total, 100);

        let snapshot = tracker.add(60);
        assert_eq!(snapshot.bytes_transferred, 100);
        assert_eq!(snapshot.eta, Duration::ZERO);
    }

    #[test]
    fn terminal_snapshot_does_not_mutate() {
        let mut tracker = Tracker::new(10);
        tracker.add(10);
        let terminal = tracker.add(0);
        assert_eq!(terminal.bytes_transferred, 10);
    }

    #[test]
    fn eta_is_zero_without_throughput() {
        let mut tracker = Tracker::new(1000);
        let snapshot = tracker.add(0);
        assert_eq!(snapshot.eta, Duration::ZERO);
    }

    #[test]
    fn final_text_line_includes_output_path() {
        let mut buf = Vec::new();
        let mut tracker = Tracker::new(5);
        let snapshot = tracker.add(5);

        let mut printer = Printer::new(&mut buf, "recv", false);
        printer.print_final(&snapshot, Some("/tmp/out/sample.bin")).unwrap();

        let line = String::from_utf8(buf).unwrap();
        assert!(line.starts_with("recv bytes=5/5 "));
        assert!(line.contains("eta=--"));
        assert!(line.trim_end().ends_with("output=/tmp/out/sample.bin"));
    }

    #[test]
    fn json_record_has_expected_fields() {
        let mut buf = Vec::new();
        let mut tracker = Tracker::new(8);
        let snapshot = tracker.add(8);

        let mut printer = Printer::new(&mut buf, "send", true);
        printer.print_final(&snapshot, None).unwrap();

        let record: serde_json::Value =
            serde_json::from_slice(buf.trim_ascii_end()).unwrap();
        assert_eq!(record["phase"], "send");
        assert_eq!(record["bytes"], 8);
        assert_eq!(record["total"], 8);
        assert_eq!(record["final"], true);
        assert!(record.get("output").is_none());
        assert!(record["throughput_mib_s"].is_f64());
    }

    #[test]
    fn throttle_suppresses_rapid_updates() {
        let mut buf = Vec::new();
        let mut tracker = Tracker::new(100);

        let mut printer = Printer::new(&mut buf, "send", false);
        printer.print_maybe(&tracker.add(10)).unwrap();
        printer.print_maybe(&tracker.add(10)).unwrap();
        printer.print_maybe(&tracker.add(10)).unwrap();

        let lines = String::from_utf8(buf).unwrap();
        assert_eq!(lines.lines().count(), 1);
    }
}
