use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

fn append_json_line<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    serde_json::to_writer(&mut file, value)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
    file.write_all(b"\n")
}

/// One scored evaluation, written as a single JSON line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationLogEntry {
    pub metric: String,
    pub p: i64,
    pub batch_size: usize,
    pub channels: usize,
    pub height: usize,
    pub width: usize,
    pub score: f64,
    pub timestamp_ms: u128,
}

impl EvaluationLogEntry {
    /// Builds an entry for `shape = (N, C, H, W)` stamped with the current time.
    pub fn new(metric: &str, p: i64, shape: [usize; 4], score: f64) -> Self {
        Self {
            metric: metric.to_string(),
            p,
            batch_size: shape[0],
            channels: shape[1],
            height: shape[2],
            width: shape[3],
            score,
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis(),
        }
    }
}

pub fn log_evaluation<P: AsRef<Path>>(path: P, entry: &EvaluationLogEntry) -> io::Result<()> {
    append_json_line(path, entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_one_line_per_entry() {
        let path = std::env::temp_dir()
            .join(format!("pansharp-log-{}", uuid::Uuid::new_v4()))
            .join("evaluations.jsonl");

        let first = EvaluationLogEntry::new("spectral_distortion_index", 1, [4, 3, 16, 16], 0.125);
        let second = EvaluationLogEntry::new("spectral_distortion_index", 2, [2, 1, 12, 12], 0.5);
        log_evaluation(&path, &first).unwrap();
        log_evaluation(&path, &second).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let entries: Vec<EvaluationLogEntry> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(entries, vec![first, second]);

        fs::remove_dir_all(path.parent().unwrap()).ok();
    }
}
