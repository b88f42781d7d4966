//! JSON snapshot writer: lays the snapshot out as a static directory tree.
//!
//! ```text
//! <root>/index.json                      snapshot index
//! <root>/<family>/index.json             first list page
//! <root>/<family>/<start>-<end>/index.json
//! <root>/<family>/<id>/index.json        record detail
//! <root>/<family>/report.json            stats and match groups
//! ```

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use linkaudit_engine::sink::{FamilyReport, PageView, RecordView, SnapshotIndex, SnapshotSink};

pub struct JsonSiteWriter {
    root: PathBuf,
    pretty: bool,
    files_written: usize,
}

impl JsonSiteWriter {
    /// Create `root` if needed.
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| with_path(e, &root))?;
        Ok(Self { root, pretty: true, files_written: 0 })
    }

    /// Compact output instead of pretty-printed.
    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn files_written(&self) -> usize {
        self.files_written
    }

    /// `site_path` is a site-absolute directory such as `/event/201-400/`.
    fn write_at<T: Serialize>(&mut self, site_path: &str, value: &T) -> io::Result<()> {
        let dir = self.root.join(site_path.trim_matches('/'));
        self.write_file(&dir, "index.json", value)
    }

    fn write_file<T: Serialize>(&mut self, dir: &Path, name: &str, value: &T) -> io::Result<()> {
        fs::create_dir_all(dir).map_err(|e| with_path(e, dir))?;
        let path = dir.join(name);
        let file = File::create(&path).map_err(|e| with_path(e, &path))?;
        let mut out = BufWriter::new(file);
        if self.pretty {
            serde_json::to_writer_pretty(&mut out, value)?;
        } else {
            serde_json::to_writer(&mut out, value)?;
        }
        out.write_all(b"\n")?;
        out.flush().map_err(|e| with_path(e, &path))?;
        self.files_written += 1;
        Ok(())
    }
}

impl SnapshotSink for JsonSiteWriter {
    type Error = io::Error;

    fn record(&mut self, view: &RecordView) -> io::Result<()> {
        let path = format!("/{}/{}/", view.family.table(), view.record.id);
        self.write_at(&path, view)
    }

    fn page(&mut self, view: &PageView<'_>) -> io::Result<()> {
        self.write_at(&view.path, view)
    }

    fn family(&mut self, report: &FamilyReport) -> io::Result<()> {
        let dir = self.root.join(report.kind.table());
        self.write_file(&dir, "report.json", report)
    }

    fn finish(&mut self, index: &SnapshotIndex) -> io::Result<()> {
        let root = self.root.clone();
        self.write_file(&root, "index.json", index)?;
        log::debug!("wrote {} files under {}", self.files_written, self.root.display());
        Ok(())
    }
}

fn with_path(e: io::Error, path: &Path) -> io::Error {
    io::Error::new(e.kind(), format!("{}: {e}", path.display()))
}
