use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Running,
    Done,
    Failed,
}

/// One input file of a batch and where its result goes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileJob {
    pub id: Uuid,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub status: JobStatus,

    #[serde(default)]
    pub overwrite: bool,

    /// Ordered processing steps (two for a two-pass encode)
    pub steps: usize,

    pub progress_pct: f64,
    pub last_error: Option<String>,
}

impl FileJob {
    /// Create a new pending job
    pub fn new(input_path: PathBuf, output_path: PathBuf, steps: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            input_path,
            output_path,
            status: JobStatus::Pending,
            overwrite: false,
            steps: steps.max(1),
            progress_pct: 0.0,
            last_error: None,
        }
    }
}

/// Parser for ffmpeg progress output (key=value format)
#[derive(Debug, Default, Clone)]
pub struct ProgressParser {
    pub out_time_us: u64,
    pub fps: Option<f64>,
    pub speed: Option<f64>,
    pub bitrate_kbps: Option<f64>,
    pub total_size: Option<u64>,
    pub is_complete: bool,
}

impl ProgressParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a single line of ffmpeg progress output
    pub fn parse_line(&mut self, line: &str) {
        let Some((key, value)) = line.split_once('=') else {
            return;
        };
        let value = value.trim();
        match key.trim() {
            // out_time_ms is microseconds too; older builds only emit that key
            "out_time_us" | "out_time_ms" => {
                if let Ok(us) = value.parse::<u64>() {
                    self.out_time_us = us;
                }
            }
            "fps" => {
                if let Ok(f) = value.parse::<f64>() {
                    self.fps = Some(f);
                }
            }
            "speed" => {
                // "1.23x"
                if let Ok(s) = value.trim_end_matches('x').parse::<f64>() {
                    self.speed = Some(s);
                }
            }
            "bitrate" => {
                // "123.4kbits/s"
                if let Ok(b) = value.trim_end_matches("kbits/s").parse::<f64>() {
                    self.bitrate_kbps = Some(b);
                }
            }
            "total_size" => {
                if let Ok(size) = value.parse::<u64>() {
                    self.total_size = Some(size);
                }
            }
            "progress" => {
                if value == "end" {
                    self.is_complete = true;
                }
            }
            _ => {}
        }
    }

    /// Get output time in seconds
    pub fn out_time_s(&self) -> f64 {
        self.out_time_us as f64 / 1_000_000.0
    }

    /// Progress of the running pass in percent. A finished stream is 100
    /// even when the duration is unknown.
    pub fn progress_pct(&self, duration_s: Option<f64>) -> f64 {
        if self.is_complete {
            return 100.0;
        }
        match duration_s {
            Some(dur) if dur > 0.0 => (self.out_time_s() / dur * 100.0).min(100.0),
            _ => 0.0,
        }
    }
}
