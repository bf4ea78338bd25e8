// src/session.rs - Per-frame CSV log of gestures and dispatches
use crate::dispatch::DispatchOutcome;
use crate::gesture::GestureLabel;
use anyhow::{Context, Result};
use chrono::Local;
use csv::Writer;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
struct SessionRecord<'a> {
    timestamp: String,
    frame: u64,
    fingers: Option<String>,
    raw_gesture: &'a str,
    stable_gesture: &'a str,
    command: Option<&'a str>,
    success: Option<bool>,
    message: Option<String>,
}

pub struct SessionRecorder {
    writer: Writer<File>,
    path: PathBuf,
    rows: u64,
}

impl SessionRecorder {
    /// Creates `<output_dir>/<session_name>/session.csv`. The session name
    /// defaults to a local timestamp.
    pub fn create(output_dir: impl AsRef<Path>, session_name: Option<String>) -> Result<Self> {
        let session_name = session_name.unwrap_or_else(|| {
            format!("session_{}", Local::now().format("%Y%m%d_%H%M%S"))
        });
        let dir = output_dir.as_ref().join(&session_name);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create session directory {}", dir.display()))?;

        let path = dir.join("session.csv");
        let file = File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;

        Ok(Self {
            writer: Writer::from_writer(file),
            path,
            rows: 0,
        })
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn record(
        &mut self,
        frame: u64,
        fingers: Option<String>,
        raw: GestureLabel,
        stable: GestureLabel,
        outcome: Option<&DispatchOutcome>,
    ) -> Result<()> {
        let record = SessionRecord {
            timestamp: Local::now().to_rfc3339(),
            frame,
            fingers,
            raw_gesture: raw.as_str(),
            stable_gesture: stable.as_str(),
            command: outcome.map(|o| o.command().as_str()),
            success: outcome.map(DispatchOutcome::is_success),
            message: outcome.map(DispatchOutcome::message),
        };
        self.writer.serialize(record)?;
        self.rows += 1;
        Ok(())
    }

    pub fn finish(mut self) -> Result<PathBuf> {
        self.writer.flush()?;
        Ok(self.path)
    }
}
