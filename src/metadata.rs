//! Per-image processing records and the JSONL log they are appended to.
//!
//! Every processed image yields exactly one [`ProcessingMetadata`], whether it
//! succeeded or failed. With a log configured, the record is serialized as a
//! single JSON object on its own line:
//!
//! ```text
//! {"src":"in/hero.png","w":37,"h":52,"kind":"pixel_art","bbox":[0,0,36,51],"trimmed":false,"dst":"out/hero.png","ok":true,"final_w":256,"final_h":256}
//! {"src":"in/broken.png","ok":false,"error":"Failed to decode image: ..."}
//! ```
//!
//! Fields that were never reached (a decode failure has no kind) are omitted
//! rather than written as `null`.

use crate::types::{BoundingBox, Kind};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// What happened to one source image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingMetadata {
    pub src: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<Kind>,
    /// Inclusive `[x0, y0, x1, y1]`; the full frame when not trimmed.
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_bbox"
    )]
    pub bbox: Option<BoundingBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trimmed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dst: Option<String>,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_w: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_h: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn serialize_bbox<S: serde::Serializer>(
    bbox: &Option<BoundingBox>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match bbox {
        Some(b) => [b.x0, b.y0, b.x1, b.y1].serialize(serializer),
        None => serializer.serialize_none(),
    }
}

impl ProcessingMetadata {
    /// An empty record for `src`, filled in as stages complete.
    pub fn started(src: &Path) -> Self {
        Self {
            src: src.display().to_string(),
            w: None,
            h: None,
            kind: None,
            bbox: None,
            trimmed: None,
            dst: None,
            ok: false,
            final_w: None,
            final_h: None,
            error: None,
        }
    }

    /// Mark the record failed with `error`.
    pub fn failed(mut self, error: &dyn std::fmt::Display) -> Self {
        self.ok = false;
        self.error = Some(error.to_string());
        self
    }

    /// Render as one JSON line, without the trailing newline.
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Append-only JSONL sink.
///
/// Appends are serialized through a mutex so records written from parallel
/// workers never interleave.
#[derive(Debug)]
pub struct MetadataLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl MetadataLog {
    /// Log to `path`. The file and its parent directories are created on the
    /// first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a single line.
    pub fn append(&self, record: &ProcessingMetadata) -> io::Result<()> {
        let mut line = record.to_json_line().map_err(io::Error::other)?;
        line.push('\n');

        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;
    use tempfile::TempDir;

    fn success() -> ProcessingMetadata {
        ProcessingMetadata {
            w: Some(37),
            h: Some(52),
            kind: Some(Kind::PixelArt),
            bbox: Some(BoundingBox::full(37, 52)),
            trimmed: Some(false),
            dst: Some("out/hero.png".to_string()),
            ok: true,
            final_w: Some(256),
            final_h: Some(256),
            ..ProcessingMetadata::started(Path::new("in/hero.png"))
        }
    }

    #[test]
    fn success_record_serializes_all_fields() {
        let line = success().to_json_line().unwrap();
        let json: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(json["src"], "in/hero.png");
        assert_eq!(json["kind"], "pixel_art");
        assert_eq!(json["bbox"], serde_json::json!([0, 0, 36, 51]));
        assert_eq!(json["trimmed"], false);
        assert_eq!(json["ok"], true);
        assert_eq!(json["final_w"], 256);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn failure_record_omits_unreached_fields() {
        let record = ProcessingMetadata::started(Path::new("in/broken.png")).failed(&"bad header");
        let line = record.to_json_line().unwrap();
        assert_eq!(
            line,
            r#"{"src":"in/broken.png","ok":false,"error":"bad header"}"#
        );
    }

    #[test]
    fn json_line_has_no_newlines() {
        let record = ProcessingMetadata::started(Path::new("a.png")).failed(&"line one\nline two");
        assert!(!record.to_json_line().unwrap().contains('\n'));
    }

    #[test]
    fn append_creates_parent_dirs_and_appends() {
        let tmp = TempDir::new().unwrap();
        let log = MetadataLog::new(tmp.path().join("logs/nested/run.jsonl"));
        log.append(&success()).unwrap();
        log.append(&success()).unwrap();

        let content = fs::read_to_string(log.path()).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn parallel_appends_do_not_interleave() {
        let tmp = TempDir::new().unwrap();
        let log = MetadataLog::new(tmp.path().join("run.jsonl"));
        (0..64).into_par_iter().for_each(|_| log.append(&success()).unwrap());

        let content = fs::read_to_string(log.path()).unwrap();
        assert_eq!(content.lines().count(), 64);
        for line in content.lines() {
            let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(parsed["ok"], true);
        }
    }
}
