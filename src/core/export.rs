//! Audit exporter - serializes the audit log to portable CSV bytes.
//!
//! Fixed five-column schema, rows in the order the caller supplies them
//! (pass [`crate::core::audit::list_all`] output for newest-first). Known
//! limitation, kept deliberately: commas inside `details` are replaced with
//! semicolons and no quoting or escaping is performed beyond that, so details
//! text does not round-trip exactly.

use crate::{entities::log_entry, errors::Result};
use csv::{QuoteStyle, WriterBuilder};

/// Column headers of the export, in order
pub const EXPORT_HEADER: [&str; 5] = [
    "Timestamp",
    "Entity Name",
    "Entity ID",
    "Operation Type",
    "Details",
];

/// Timestamp format used in exported rows
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Serializes log entries to CSV bytes, one row per entry plus the header.
pub fn export_csv(logs: &[log_entry::Model]) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .from_writer(Vec::new());

    writer.write_record(EXPORT_HEADER)?;
    for entry in logs {
        let details = entry
            .details
            .as_deref()
            .unwrap_or_default()
            .replace(',', ";");
        writer.write_record([
            entry.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            entry.entity_name.clone(),
            entry.entity_id.to_string(),
            entry.operation_type.clone(),
            details,
        ])?;
    }

    writer
        .into_inner()
        .map_err(|err| crate::errors::Error::Io(std::io::Error::other(err.to_string())))
}
