//! Represents a certificate record read from the certificates spreadsheet.

use serde::{Deserialize, Serialize};

/// Classification of a matched certificate asset.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Image,
    Pdf,
    Unknown,
}

impl FileType {
    /// Classify a file by the extension of its name.
    pub fn from_file_name(name: &str) -> Self {
        let extension = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "webp" | "svg" => FileType::Image,
            "pdf" => FileType::Pdf,
            _ => FileType::Unknown,
        }
    }
}

/// A single certificate, normalized from one spreadsheet row.
///
/// Field names on the wire follow the column names the portfolio frontend
/// already consumes. The asset fields are only populated by the matching
/// pipeline and are omitted when no asset cleared the threshold.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Certificate {
    /// Deterministic identifier derived from the row content.
    pub id: String,

    #[serde(rename = "titulo")]
    pub title: String,

    /// Place or institution where the course happened (e.g. "Online").
    #[serde(rename = "local")]
    pub place: String,

    /// ISO date when recognized, raw text otherwise, empty when absent.
    #[serde(rename = "dataInicio")]
    pub start_date: String,

    #[serde(rename = "dataTermino")]
    pub end_date: String,

    #[serde(rename = "projetoReferente")]
    pub related_project: String,

    /// Free-text reference, usually the file name of the certificate asset.
    #[serde(rename = "certificado")]
    pub certificate_ref: String,

    #[serde(rename = "linkProjeto", skip_serializing_if = "Option::is_none")]
    pub project_link: Option<String>,

    #[serde(rename = "cargaHoraria", skip_serializing_if = "Option::is_none")]
    pub workload: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Certifying body, falls back to the place when the sheet has none.
    #[serde(rename = "certificadora", skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,

    #[serde(rename = "imageUrl", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(rename = "downloadUrl", skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,

    #[serde(rename = "fileName", skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    #[serde(rename = "fileType", skip_serializing_if = "Option::is_none")]
    pub file_type: Option<FileType>,
}

impl Certificate {
    /// A certificate needs a title and something to locate it by.
    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty()
            && (!self.place.trim().is_empty() || !self.certificate_ref.trim().is_empty())
    }

    pub fn has_asset(&self) -> bool {
        self.image_url.is_some()
    }
}
