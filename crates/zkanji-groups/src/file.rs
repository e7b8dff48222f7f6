//! Atomic file replacement for group and settings files.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::Result;

/// A file that only appears at its path once everything was written.
///
/// Bytes go to a hidden sibling `.<name>.tmp.<pid>.<n>`, where `n` is unique
/// per writer. [`commit`](Self::commit) syncs it and renames it over the
/// target. Dropping an uncommitted writer deletes the sibling, so a failed
/// save never truncates an existing file.
pub struct AtomicWriter {
    target: PathBuf,
    // `None` once committed; nothing is left to clean up then.
    pending: Option<(PathBuf, BufWriter<fs::File>)>,
}

static NEXT_TEMP: AtomicU64 = AtomicU64::new(0);

fn consumed() -> io::Error {
    io::Error::other("atomic writer already committed")
}

impl AtomicWriter {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let target = path.as_ref().to_path_buf();
        let dir = match target.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let name = target
            .file_name()
            .map_or_else(|| "groups".into(), |name| name.to_string_lossy());
        let serial = NEXT_TEMP.fetch_add(1, Ordering::Relaxed);
        let temp = dir.join(format!(".{name}.tmp.{}.{serial}", std::process::id()));

        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp)?;
        Ok(Self {
            target,
            pending: Some((temp, BufWriter::new(file))),
        })
    }

    /// Opens `path`, hands the writer to `fill` and commits when `fill`
    /// returns `Ok`.
    pub fn write<F>(path: impl AsRef<Path>, fill: F) -> Result<()>
    where
        F: FnOnce(&mut AtomicWriter) -> Result<()>,
    {
        let mut writer = Self::new(path)?;
        fill(&mut writer)?;
        writer.commit()
    }

    pub fn target_path(&self) -> &Path {
        &self.target
    }

    pub fn commit(mut self) -> Result<()> {
        let (temp, mut out) = self.pending.take().ok_or_else(consumed)?;
        let synced = out.flush().and_then(|()| out.get_ref().sync_all());
        drop(out);
        let finish = synced.and_then(|()| fs::rename(&temp, &self.target));
        if finish.is_err() {
            let _ = fs::remove_file(&temp);
        }
        Ok(finish?)
    }

    fn out(&mut self) -> io::Result<&mut BufWriter<fs::File>> {
        self.pending.as_mut().map(|(_, out)| out).ok_or_else(consumed)
    }
}

impl Write for AtomicWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.out()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out()?.flush()
    }
}

impl Drop for AtomicWriter {
    fn drop(&mut self) {
        if let Some((temp, out)) = self.pending.take() {
            drop(out);
            let _ = fs::remove_file(temp);
        }
    }
}

impl std::fmt::Debug for AtomicWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtomicWriter")
            .field("target", &self.target)
            .field("pending", &self.pending.as_ref().map(|(temp, _)| temp))
            .finish()
    }
}
