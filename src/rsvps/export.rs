use chrono::{NaiveDate, SecondsFormat, Utc};
use sea_orm::DatabaseConnection;
use tracing::info;

use super::{Rsvp, RsvpError, get_rsvps};

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

const HEADER: [&str; 7] = [
    "Guest Name",
    "Mobile Number",
    "Email",
    "Adults (7+)",
    "Kids (<7)",
    "Total Guests",
    "Submitted At",
];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Failed to load RSVPs: {0}")]
    Load(#[from] RsvpError),

    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to write CSV: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV output was not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// A finished export, ready to be sent as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub filename: String,
    pub content: String,
}

pub fn export_filename(date: NaiveDate) -> String {
    format!("rsvps_{}.csv", date.format("%Y-%m-%d"))
}

pub fn to_csv(rsvps: &[Rsvp]) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());

    writer.write_record(HEADER)?;
    for rsvp in rsvps {
        writer.write_record([
            rsvp.guest_name.as_str(),
            rsvp.mobile_number.as_str(),
            rsvp.email_id.as_deref().unwrap_or(""),
            rsvp.count_adults.to_string().as_str(),
            rsvp.count_kids.to_string().as_str(),
            rsvp.total_guests().to_string().as_str(),
            rsvp.submitted_at
                .to_rfc3339_opts(SecondsFormat::Secs, true)
                .as_str(),
        ])?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

/// Render every stored RSVP as CSV, named after today's UTC date.
pub async fn export_rsvps(db: &DatabaseConnection) -> Result<CsvExport, ExportError> {
    let rsvps = get_rsvps(db).await?;
    let content = to_csv(&rsvps)?;
    info!("Exported {} rsvps", rsvps.len());

    Ok(CsvExport {
        filename: export_filename(Utc::now().date_naive()),
        content,
    })
}
