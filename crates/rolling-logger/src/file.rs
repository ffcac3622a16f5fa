//! Size-rotated log file
//!
//! `<app>.log` is the live file. When it would grow past `max_bytes` it is
//! shifted to `<app>.log.1`, older files move up by one and anything past
//! `keep` is deleted.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_BYTES: u64 = 1024 * 1024;
pub const DEFAULT_KEEP: usize = 3;

#[derive(Debug)]
pub struct RollingFile {
    dir: PathBuf,
    app_name: String,
    file: File,
    size: u64,
    max_bytes: u64,
    keep: usize,
}

impl RollingFile {
    pub fn open(dir: &Path, app_name: &str) -> io::Result<Self> {
        Self::with_limits(dir, app_name, DEFAULT_MAX_BYTES, DEFAULT_KEEP)
    }

    pub fn with_limits(dir: &Path, app_name: &str, max_bytes: u64, keep: usize) -> io::Result<Self> {
        let path = dir.join(format!("{}.log", app_name));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let size = file.metadata()?.len();
        Ok(Self {
            dir: dir.to_path_buf(),
            app_name: app_name.to_string(),
            file,
            size,
            max_bytes,
            keep,
        })
    }

    fn path(&self, index: usize) -> PathBuf {
        if index == 0 {
            self.dir.join(format!("{}.log", self.app_name))
        } else {
            self.dir.join(format!("{}.log.{}", self.app_name, index))
        }
    }

    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        let len = line.len() as u64 + 1;
        if self.size > 0 && self.size + len > self.max_bytes {
            self.rotate()?;
        }
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        self.size += len;
        Ok(())
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        let oldest = self.path(self.keep);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for index in (0..self.keep).rev() {
            let from = self.path(index);
            if from.exists() {
                fs::rename(&from, self.path(index + 1))?;
            }
        }
        self.file = OpenOptions::new().create(true).append(true).open(self.path(0))?;
        self.size = 0;
        Ok(())
    }
}
