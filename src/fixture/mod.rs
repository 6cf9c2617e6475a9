use std::fs::{self, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::domain::{Device, IdentifierKind};
use crate::error::Result;

/// Writes devices as delimited rows for the load-testing tool.
///
/// Output has a `deviceSerialNumber,mac` header followed by one device per row.
#[derive(Debug, Clone)]
pub struct FixtureWriter {
    path: PathBuf,
    delimiter: char,
    append: bool,
}

impl FixtureWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            delimiter: ',',
            append: false,
        }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Keep existing rows instead of truncating the file
    pub fn appending(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> String {
        format!(
            "{}{}{}",
            IdentifierKind::SerialNumber.as_str(),
            self.delimiter,
            IdentifierKind::MacAddress.as_str()
        )
    }

    /// Write `devices`, returning the number of rows written (header excluded)
    pub fn write(&self, devices: &[Device]) -> Result<usize> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let needs_header = !self.append
            || match fs::metadata(&self.path) {
                Ok(meta) => meta.len() == 0,
                Err(e) if e.kind() == ErrorKind::NotFound => true,
                Err(e) => return Err(e.into()),
            };

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(self.append)
            .truncate(!self.append)
            .open(&self.path)?;
        let mut writer = BufWriter::new(file);

        if needs_header {
            writeln!(writer, "{}", self.header())?;
        }
        for device in devices {
            writeln!(
                writer,
                "{}{}{}",
                device.serial_number, self.delimiter, device.mac_address
            )?;
        }
        writer.flush()?;

        debug!("Wrote {} rows to {}", devices.len(), self.path.display());
        Ok(devices.len())
    }
}
