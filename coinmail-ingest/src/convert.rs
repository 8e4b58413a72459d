//! Conversion of decoded messages into dated plain-text files.

use std::fs::{self, File, FileTimes};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use coinmail_core::{Category, ValidationError};

use crate::layout::OutputLayout;

/// Everything needed to write one converted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionUnit {
    created_at: DateTime<Utc>,
    output_dir: PathBuf,
    contents: String,
    file_name: String,
}

impl ConversionUnit {
    pub fn new(
        created_at: DateTime<Utc>,
        output_dir: impl Into<PathBuf>,
        contents: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let output_dir = output_dir.into();
        let contents = contents.into();
        let file_name = file_name.into();

        if output_dir.as_os_str().is_empty() {
            return Err(ValidationError::EmptyField("outputDir"));
        }
        if contents.trim().is_empty() {
            return Err(ValidationError::EmptyField("contents"));
        }
        if file_name.trim().is_empty() {
            return Err(ValidationError::EmptyField("fileName"));
        }

        Ok(Self {
            created_at,
            output_dir,
            contents,
            file_name,
        })
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

/// `Order Filled.eml` -> `Order Filled.txt`.
pub fn text_file_name(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    Some(format!("{stem}.txt"))
}

/// Write the unit into its category bucket and stamp it with the message time.
///
/// The modification time always carries the message timestamp; on Windows the
/// creation time is set too.
pub fn write_text_file(
    layout: &OutputLayout,
    category: Category,
    unit: &ConversionUnit,
) -> std::io::Result<PathBuf> {
    let path = layout.bucket(category).join(unit.file_name());

    let mut file = File::create(&path)?;
    file.write_all(unit.contents().as_bytes())?;
    file.flush()?;

    let stamp = SystemTime::from(unit.created_at());
    let times = FileTimes::new().set_modified(stamp);
    #[cfg(windows)]
    let times = {
        use std::os::windows::fs::FileTimesExt;
        times.set_created(stamp)
    };
    file.set_times(times)?;

    Ok(path)
}

/// Read a converted file back along with its stamped timestamp.
pub fn read_text_file(path: &Path) -> std::io::Result<(String, DateTime<Utc>)> {
    let contents = fs::read_to_string(path)?;
    let modified = fs::metadata(path)?.modified()?;
    Ok((contents, DateTime::<Utc>::from(modified)))
}
