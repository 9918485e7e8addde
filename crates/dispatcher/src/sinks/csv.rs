//! CsvSink - observation log file
//!
//! One file per session, `detections_<YYYYmmdd_HHMMSS>.csv` under the
//! configured directory.

use std::collections::HashMap;
use std::fmt::Display;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use contracts::{ContractError, ObservationRecord, RecordSink};
use tracing::{debug, info, instrument};

/// Column header, written once when the file is created
pub const CSV_HEADER: &str =
    "time,vehicle_detected,confidence,side,alert_level,lane_departure,distance_m,rel_speed_mps";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Sink that appends one CSV row per observation
pub struct CsvSink {
    name: String,
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    rows: u64,
}

impl CsvSink {
    /// Create `dir` if needed and open a fresh timestamped file in it.
    pub fn new(name: impl Into<String>, dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let file_name = format!("detections_{}.csv", Local::now().format("%Y%m%d_%H%M%S"));
        let path = dir.join(file_name);
        let mut writer = BufWriter::new(File::create(&path)?);
        writeln!(writer, "{CSV_HEADER}")?;

        let name = name.into();
        info!(sink = %name, path = %path.display(), "CSV log opened");

        Ok(Self {
            name,
            path,
            writer: Some(writer),
            rows: 0,
        })
    }

    /// Create from params map; `dir` defaults to `logs`
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        let dir = params
            .get("dir")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("logs"));
        Self::new(name, dir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows written so far, header excluded
    pub fn rows(&self) -> u64 {
        self.rows
    }

    fn writer(&mut self) -> Result<&mut BufWriter<File>, ContractError> {
        let name = &self.name;
        self.writer
            .as_mut()
            .ok_or_else(|| ContractError::sink_write(name, "sink is closed"))
    }
}

/// Render one record as a CSV line (no trailing newline)
pub(crate) fn format_row(record: &ObservationRecord) -> String {
    fn opt<T: Display>(value: Option<T>) -> String {
        value.map(|v| v.to_string()).unwrap_or_default()
    }

    let fields = [
        record.recorded_at.format(TIME_FORMAT).to_string(),
        escape(record.label.as_deref().unwrap_or_default()),
        opt(record.confidence),
        opt(record.side),
        opt(record.level),
        if record.lane_departure {
            "true".to_string()
        } else {
            String::new()
        },
        opt(record.distance_m.map(|d| format!("{d:.1}"))),
        opt(record.rel_speed_mps.map(|s| format!("{s:.1}"))),
    ];
    fields.join(",")
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

impl RecordSink for CsvSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "csv_sink_write",
        skip(self, record),
        fields(sink = %self.name, kind = ?record.kind)
    )]
    async fn write(&mut self, record: &ObservationRecord) -> Result<(), ContractError> {
        let line = format_row(record);
        let name = self.name.clone();
        writeln!(self.writer()?, "{line}")
            .map_err(|e| ContractError::sink_write(name, e.to_string()))?;
        self.rows += 1;
        Ok(())
    }

    #[instrument(name = "csv_sink_flush", skip(self), fields(sink = %self.name))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        let name = self.name.clone();
        if let Some(writer) = self.writer.as_mut() {
            writer
                .flush()
                .map_err(|e| ContractError::sink_write(name, e.to_string()))?;
        }
        Ok(())
    }

    #[instrument(name = "csv_sink_close", skip(self), fields(sink = %self.name))]
    async fn close(&mut self) -> Result<(), ContractError> {
        let Some(mut writer) = self.writer.take() else {
            debug!(sink = %self.name, "CsvSink already closed");
            return Ok(());
        };
        writer
            .flush()
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        info!(
            sink = %self.name,
            rows = self.rows,
            path = %self.path.display(),
            "CSV log closed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{AlertLevel, Side};

    fn columns(line: &str) -> Vec<String> {
        line.split(',').map(str::to_string).collect()
    }

    #[test]
    fn test_detection_row() {
        let row = format_row(&ObservationRecord::detection(
            1.0,
            "car",
            0.5,
            Side::Left,
            AlertLevel::Warn,
        ));
        let cols = columns(&row);
        assert_eq!(cols.len(), 8);
        assert_eq!(&cols[1..], ["car", "0.5", "left", "warn", "", "", ""]);
    }

    #[test]
    fn test_proximity_row_one_decimal() {
        let row = format_row(&ObservationRecord::proximity(1.0, 12.345, -2.04));
        let cols = columns(&row);
        assert_eq!(&cols[1..], ["vehicle_ahead", "", "", "", "", "12.3", "-2.0"]);
    }

    #[test]
    fn test_lane_row() {
        let cols = columns(&format_row(&ObservationRecord::lane(3.0)));
        assert_eq!(&cols[1..], ["", "", "", "warn", "true", "", ""]);
    }

    #[test]
    fn test_label_escaped() {
        assert_eq!(escape("fire truck"), "fire truck");
        assert_eq!(escape("car, red"), "\"car, red\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[tokio::test]
    async fn test_csv_sink_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = CsvSink::new("detections", dir.path().join("logs")).unwrap();
        let file_name = sink.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(file_name.starts_with("detections_"));
        assert!(file_name.ends_with(".csv"));

        sink.write(&ObservationRecord::proximity(0.0, 9.96, 1.0))
            .await
            .unwrap();
        sink.write(&ObservationRecord::lane(0.1)).await.unwrap();
        sink.close().await.unwrap();
        assert_eq!(sink.rows(), 2);

        let contents = fs::read_to_string(sink.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert!(lines[1].ends_with(",vehicle_ahead,,,,,10.0,1.0"));
        assert_eq!(lines.len(), 3);
    }

    #[tokio::test]
    async fn test_write_after_close_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = CsvSink::new("detections", dir.path()).unwrap();
        sink.close().await.unwrap();
        sink.close().await.unwrap();
        assert!(sink.write(&ObservationRecord::lane(0.0)).await.is_err());
    }

    #[test]
    fn test_from_params_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("custom");
        let params = HashMap::from([(
            "dir".to_string(),
            nested.to_string_lossy().into_owned(),
        )]);
        let sink = CsvSink::from_params("x", &params).unwrap();
        assert!(sink.path().starts_with(&nested));
        assert!(sink.path().exists());
    }
}
