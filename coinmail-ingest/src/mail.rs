//! Mail-decoding collaborator.
//!
//! The pipeline only needs three things from an exported message: its plain
//! text body, when it was sent, and its subject. [`MessageReader`] is the seam;
//! [`EmlReader`] handles RFC 822 / MIME `.eml` exports.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use mailparse::{MailHeaderMap, ParsedMail, parse_mail};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedMessage {
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub subject: String,
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed MIME: {0}")]
    Mime(String),

    #[error("no Date header")]
    MissingDate,

    #[error("unparseable Date header {0:?}")]
    BadDate(String),

    #[error("message has no text/plain or text/html body")]
    NoTextBody,
}

pub trait MessageReader {
    fn read(&self, path: &Path) -> Result<DecodedMessage, DecodeError>;
}

/// Reads `.eml` files with `mailparse`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmlReader;

impl MessageReader for EmlReader {
    fn read(&self, path: &Path) -> Result<DecodedMessage, DecodeError> {
        let bytes = fs::read(path)?;
        decode_eml(&bytes)
    }
}

/// Decode raw `.eml` bytes.
pub fn decode_eml(bytes: &[u8]) -> Result<DecodedMessage, DecodeError> {
    let mail = parse_mail(bytes).map_err(|e| DecodeError::Mime(e.to_string()))?;

    let date = mail
        .headers
        .get_first_value("Date")
        .ok_or(DecodeError::MissingDate)?;
    let secs = mailparse::dateparse(&date).map_err(|_| DecodeError::BadDate(date.clone()))?;
    let sent_at = DateTime::from_timestamp(secs, 0).ok_or(DecodeError::BadDate(date))?;

    let subject = mail.headers.get_first_value("Subject").unwrap_or_default();
    let body = extract_text_body(&mail).ok_or(DecodeError::NoTextBody)?;

    Ok(DecodedMessage {
        body,
        sent_at,
        subject,
    })
}

/// Prefer the first `text/plain` part; fall back to `text/html`.
fn extract_text_body(mail: &ParsedMail) -> Option<String> {
    fn walk(mail: &ParsedMail, mimetype: &str) -> Option<String> {
        if mail.ctype.mimetype.eq_ignore_ascii_case(mimetype) {
            if let Ok(body) = mail.get_body() {
                return Some(body);
            }
        }
        mail.subparts.iter().find_map(|part| walk(part, mimetype))
    }

    walk(mail, "text/plain").or_else(|| walk(mail, "text/html"))
}

/// List message files directly inside `dir` whose extension matches
/// (case-insensitively), sorted by path. This is the discovery order.
pub fn discover_messages(dir: &Path, extension: &str) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(std::io::Error::other)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|s| s.eq_ignore_ascii_case(extension));
        if matches {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}
