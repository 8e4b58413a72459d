//! coinmail-ingest: reading exported notification emails and filing them as
//! plain-text messages under the output layout.

pub mod convert;
pub mod layout;
pub mod mail;

pub use convert::{ConversionUnit, read_text_file, text_file_name, write_text_file};
pub use layout::{OutputLayout, ensure_output_layout};
pub use mail::{DecodeError, DecodedMessage, EmlReader, MessageReader, discover_messages};
