//! Represents a file entry returned by the Drive folder listing.

use serde::{Deserialize, Serialize};

pub const GOOGLE_SHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";
pub const PDF_MIME: &str = "application/pdf";

/// One file inside the certificates folder.
///
/// Snapshot of remote state; refreshed whenever the listing cache expires.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub mime_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_view_link: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_content_link: Option<String>,

    /// Drive reports sizes as decimal strings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<String>,
}

impl DriveFile {
    pub fn is_google_sheet(&self) -> bool {
        self.mime_type == GOOGLE_SHEET_MIME
    }

    /// Google Sheets, office spreadsheets and their temp files excluded.
    pub fn is_spreadsheet(&self) -> bool {
        let lower = self.name.to_lowercase();
        let spreadsheet_like = self.is_google_sheet()
            || self.mime_type.contains("spreadsheet")
            || [".xlsx", ".xls", ".ods"].iter().any(|ext| lower.ends_with(ext));
        let temp_file = self.name.starts_with('~') || self.name.starts_with('.');

        spreadsheet_like && !temp_file
    }

    /// Images and PDFs that may hold a certificate.
    pub fn is_certificate_asset(&self) -> bool {
        let lower = self.name.to_lowercase();
        self.mime_type.starts_with("image/")
            || self.mime_type == PDF_MIME
            || [".jpg", ".jpeg", ".png", ".gif", ".webp", ".pdf", ".svg"]
                .iter()
                .any(|ext| lower.ends_with(ext))
    }
}

/// One page of the Drive `files.list` response.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct FileListPage {
    #[serde(default)]
    pub files: Vec<DriveFile>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incomplete_search: Option<bool>,
}
