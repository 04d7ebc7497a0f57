//! DriveService - reads the certificates spreadsheet and the certificate
//! assets from one Google Drive folder and reconciles the two.
//!
//! Every remote read goes through a TTL cache. Public operations never fail:
//! a broken fetch degrades to the last cached payload, then to an empty list
//! (assets) or the built-in demo dataset (certificates).

use crate::{
    models::{
        certificate::{Certificate, FileType},
        drive_file::{DriveFile, FileListPage},
    },
    services::{
        cache::TtlCache,
        matcher::Matcher,
        mock_data::mock_certificates,
        sheet_parser::SheetParser,
    },
};
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode, header};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::{collections::HashSet, fmt, str::FromStr, sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{debug, error, info, warn};

const LIST_TIMEOUT: Duration = Duration::from_secs(30);
const SHEET_TIMEOUT: Duration = Duration::from_secs(15);
const PAGE_SIZE: &str = "100";
const SHEET_RANGE: &str = "A1:Z1000";
const LIST_FIELDS: &str =
    "nextPageToken,files(id,name,mimeType,webViewLink,webContentLink,size,createdTime,modifiedTime)";

const SHEET_CACHE_KEY: &str = "certificates_sheet";
const IMAGES_CACHE_KEY: &str = "certificate_images";
const FILES_CACHE_PREFIX: &str = "files_";

#[derive(Debug, Error)]
pub enum DriveError {
    #[error("Google Drive is not configured: {0} is missing")]
    NotConfigured(&'static str),
    #[error("{service} returned HTTP {status}")]
    Status {
        service: &'static str,
        status: StatusCode,
    },
    #[error("no spreadsheet found in the certificates folder")]
    NoSpreadsheet,
    #[error("none of the spreadsheets in the folder yielded certificates")]
    NoReadableSpreadsheet,
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

pub type DriveResult<T> = Result<T, DriveError>;

/// Base URLs of the Google services involved. Overridable for tests.
#[derive(Clone, Debug)]
pub struct DriveEndpoints {
    pub drive_api: String,
    pub sheets_api: String,
    pub sheets_export: String,
    pub drive_web: String,
}

impl Default for DriveEndpoints {
    fn default() -> Self {
        Self {
            drive_api: "https://www.googleapis.com/drive/v3".into(),
            sheets_api: "https://sheets.googleapis.com/v4/spreadsheets".into(),
            sheets_export: "https://docs.google.com/spreadsheets/d".into(),
            drive_web: "https://drive.google.com".into(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DriveSettings {
    pub api_key: Option<String>,
    pub folder_id: Option<String>,
    pub cache_ttl: Duration,
    pub endpoints: DriveEndpoints,
}

/// Cached resources that can be invalidated individually.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheResource {
    Files,
    CertificatesSheet,
    CertificateImages,
}

impl CacheResource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheResource::Files => "files",
            CacheResource::CertificatesSheet => "certificates_sheet",
            CacheResource::CertificateImages => "certificate_images",
        }
    }
}

impl fmt::Display for CacheResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheResource {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "files" => Ok(CacheResource::Files),
            "certificates_sheet" => Ok(CacheResource::CertificatesSheet),
            "certificate_images" => Ok(CacheResource::CertificateImages),
            other => Err(format!("unknown cache resource `{}`", other)),
        }
    }
}

/// Outcome of a configuration probe against the Drive folder.
#[derive(Serialize, Debug)]
pub struct ConfigurationReport {
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Render a Sheets API cell as text. Unformatted numbers come back as JSON numbers.
fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Spreadsheets in the listing, most promising first: native Google Sheets,
/// then names mentioning "certificado", then the most recently modified.
pub fn discover_spreadsheets(files: &[DriveFile]) -> Vec<DriveFile> {
    let modified = |file: &DriveFile| {
        file.modified_time
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&Utc))
    };
    let named = |file: &DriveFile| file.name.to_lowercase().contains("certificado");

    let mut sheets: Vec<DriveFile> = files.iter().filter(|f| f.is_spreadsheet()).cloned().collect();
    sheets.sort_by(|a, b| {
        b.is_google_sheet()
            .cmp(&a.is_google_sheet())
            .then(named(b).cmp(&named(a)))
            .then(modified(b).cmp(&modified(a)))
    });
    sheets
}

#[derive(Clone)]
pub struct DriveService {
    client: Client,
    settings: Arc<DriveSettings>,
    parser: Arc<SheetParser>,
    matcher: Arc<Matcher>,
    pages: TtlCache<FileListPage>,
    sheet: TtlCache<Vec<Certificate>>,
    images: TtlCache<Vec<DriveFile>>,
}

impl DriveService {
    pub fn new(settings: DriveSettings, parser: SheetParser, matcher: Matcher) -> DriveResult<Self> {
        let client = Client::builder().timeout(LIST_TIMEOUT).build()?;

        let service = Self {
            client,
            settings: Arc::new(settings),
            parser: Arc::new(parser),
            matcher: Arc::new(matcher),
            pages: TtlCache::new(),
            sheet: TtlCache::new(),
            images: TtlCache::new(),
        };
        if let Some(missing) = service.missing_config() {
            warn!("{} is not set, certificates will use demo data", missing);
        }
        Ok(service)
    }

    /// Name of the first missing setting, if any.
    pub fn missing_config(&self) -> Option<&'static str> {
        if self.settings.api_key.as_deref().is_none_or(str::is_empty) {
            Some("GOOGLE_DRIVE_API_KEY")
        } else if self.settings.folder_id.as_deref().is_none_or(str::is_empty) {
            Some("GOOGLE_DRIVE_FOLDER_ID")
        } else {
            None
        }
    }

    fn credentials(&self) -> DriveResult<(&str, &str)> {
        match (self.settings.api_key.as_deref(), self.settings.folder_id.as_deref()) {
            (Some(key), Some(folder)) if !key.is_empty() && !folder.is_empty() => Ok((key, folder)),
            _ => Err(DriveError::NotConfigured(
                self.missing_config().unwrap_or("GOOGLE_DRIVE_API_KEY"),
            )),
        }
    }

    /// Drop every cached payload.
    pub fn clear_cache(&self) {
        self.pages.clear();
        self.sheet.clear();
        self.images.clear();
        info!("Google Drive cache cleared");
    }

    /// Drop one cached resource. Returns how many entries were removed.
    pub fn invalidate(&self, resource: CacheResource) -> usize {
        let removed = match resource {
            CacheResource::Files => self.pages.invalidate_prefix(FILES_CACHE_PREFIX),
            CacheResource::CertificatesSheet => usize::from(self.sheet.invalidate(SHEET_CACHE_KEY)),
            CacheResource::CertificateImages => {
                usize::from(self.images.invalidate(IMAGES_CACHE_KEY))
            }
        };
        info!("Invalidated {} cache entries for {}", removed, resource);
        removed
    }

    /// Check that the key and folder are set and the folder can be listed.
    pub async fn test_configuration(&self) -> ConfigurationReport {
        if let Some(missing) = self.missing_config() {
            return ConfigurationReport {
                success: false,
                message: format!("{} is not configured", missing),
                timestamp: Utc::now(),
                details: None,
            };
        }

        match self.get_files_from_folder(None).await {
            Ok(page) => ConfigurationReport {
                success: true,
                message: format!("Configuration OK - {} files found", page.files.len()),
                timestamp: Utc::now(),
                details: Some(json!({
                    "filesFound": page.files.len(),
                    "folderAccess": true,
                    "apiKeyValid": true,
                })),
            },
            Err(err) => {
                error!("Drive configuration test failed: {}", err);
                let status = match &err {
                    DriveError::Status { status, .. } => Some(status.as_u16()),
                    DriveError::Http(e) => e.status().map(|s| s.as_u16()),
                    _ => None,
                };
                ConfigurationReport {
                    success: false,
                    message: format!("Configuration error: {}", err),
                    timestamp: Utc::now(),
                    details: Some(json!({ "error": err.to_string(), "status": status })),
                }
            }
        }
    }

    /// One page of the folder listing, cached per page token.
    ///
    /// An unconfigured service yields an empty page. A failed fetch falls
    /// back to the last cached copy of that page when there is one.
    pub async fn get_files_from_folder(&self, page_token: Option<&str>) -> DriveResult<FileListPage> {
        let (api_key, folder_id) = match self.credentials() {
            Ok(creds) => creds,
            Err(err) => {
                warn!("{}", err);
                return Ok(FileListPage::default());
            }
        };

        let cache_key = format!("{}{}", FILES_CACHE_PREFIX, page_token.unwrap_or("first"));
        let result = self
            .pages
            .get_or_cache(&cache_key, self.settings.cache_ttl, || {
                self.fetch_files_page(api_key, folder_id, page_token)
            })
            .await;

        match result {
            Ok(page) => Ok(page),
            Err(err) => {
                error!("Failed to list Drive folder: {}", err);
                match self.pages.get_stale(&cache_key) {
                    Some(page) => {
                        warn!("Serving stale listing for {}", cache_key);
                        Ok(page)
                    }
                    None => Err(err),
                }
            }
        }
    }

    async fn fetch_files_page(
        &self,
        api_key: &str,
        folder_id: &str,
        page_token: Option<&str>,
    ) -> DriveResult<FileListPage> {
        debug!("Listing Drive folder (page {:?})", page_token);

        let query = format!("'{}' in parents and trashed = false", folder_id);
        let mut params = vec![
            ("key", api_key),
            ("q", query.as_str()),
            ("fields", LIST_FIELDS),
            ("pageSize", PAGE_SIZE),
            ("orderBy", "modifiedTime desc"),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let response = self
            .client
            .get(format!("{}/files", self.settings.endpoints.drive_api))
            .query(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DriveError::Status {
                service: "Drive files.list",
                status: response.status(),
            });
        }

        let page: FileListPage = response.json().await?;
        info!("{} files found in Drive folder", page.files.len());
        Ok(page)
    }

    /// Every file in the folder, following page tokens.
    pub async fn get_all_files(&self) -> DriveResult<Vec<DriveFile>> {
        let mut files = Vec::new();
        let mut seen_tokens = HashSet::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.get_files_from_folder(page_token.as_deref()).await?;
            files.extend(page.files);

            match page.next_page_token {
                Some(token) if seen_tokens.insert(token.clone()) => page_token = Some(token),
                Some(token) => {
                    warn!("Drive returned page token {} twice, stopping", token);
                    break;
                }
                None => break,
            }
        }

        debug!("{} files in Drive folder overall", files.len());
        Ok(files)
    }

    /// Certificates from the spreadsheet in the folder, or demo data.
    pub async fn get_certificates_sheet(&self) -> Vec<Certificate> {
        let result = self
            .sheet
            .get_or_cache(SHEET_CACHE_KEY, self.settings.cache_ttl, || {
                self.load_certificates_sheet()
            })
            .await;

        match result {
            Ok(certificates) => certificates,
            Err(err) => {
                warn!("Certificates spreadsheet unavailable: {}", err);
                if let Some(stale) = self.sheet.get_stale(SHEET_CACHE_KEY) {
                    info!("Serving {} stale certificates", stale.len());
                    return stale;
                }
                info!("Falling back to demo certificates");
                mock_certificates()
            }
        }
    }

    async fn load_certificates_sheet(&self) -> DriveResult<Vec<Certificate>> {
        let files = self.get_all_files().await?;
        let spreadsheets = discover_spreadsheets(&files);
        debug!(
            "Spreadsheet candidates: {:?}",
            spreadsheets.iter().map(|s| s.name.as_str()).collect::<Vec<_>>()
        );

        if spreadsheets.is_empty() {
            return Err(DriveError::NoSpreadsheet);
        }

        for sheet in &spreadsheets {
            match self.read_spreadsheet(sheet).await {
                Ok(certificates) if !certificates.is_empty() => {
                    info!(
                        "{} certificates loaded from spreadsheet {}",
                        certificates.len(),
                        sheet.name
                    );
                    return Ok(certificates);
                }
                Ok(_) => warn!("Spreadsheet {} has no usable rows", sheet.name),
                Err(err) => warn!("Could not read spreadsheet {}: {}", sheet.name, err),
            }
        }

        Err(DriveError::NoReadableSpreadsheet)
    }

    async fn read_spreadsheet(&self, file: &DriveFile) -> DriveResult<Vec<Certificate>> {
        if file.is_google_sheet() {
            self.read_google_sheet(&file.id).await
        } else {
            self.read_csv_export(&file.id).await
        }
    }

    /// Read the values range through the Sheets API, falling back to the
    /// CSV export when the API refuses access.
    async fn read_google_sheet(&self, file_id: &str) -> DriveResult<Vec<Certificate>> {
        let (api_key, _) = self.credentials()?;
        debug!("Reading Google Sheet {}", file_id);

        let response = self
            .client
            .get(format!(
                "{}/{}/values/{}",
                self.settings.endpoints.sheets_api, file_id, SHEET_RANGE
            ))
            .query(&[
                ("key", api_key),
                ("valueRenderOption", "UNFORMATTED_VALUE"),
                ("dateTimeRenderOption", "FORMATTED_STRING"),
            ])
            .timeout(SHEET_TIMEOUT)
            .send()
            .await?;

        match response.status() {
            StatusCode::FORBIDDEN => {
                info!("Sheets API denied {}, trying the CSV export", file_id);
                return self.read_csv_export(file_id).await;
            }
            status if !status.is_success() => {
                return Err(DriveError::Status {
                    service: "Sheets values.get",
                    status,
                });
            }
            _ => {}
        }

        let range: ValueRange = response.json().await?;
        if range.values.len() < 2 {
            warn!("Spreadsheet {} is empty or has only headers", file_id);
            return Ok(Vec::new());
        }

        let grid: Vec<Vec<String>> = range
            .values
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();
        Ok(self.parser.parse_values(&grid))
    }

    async fn read_csv_export(&self, file_id: &str) -> DriveResult<Vec<Certificate>> {
        debug!("Reading CSV export of {}", file_id);

        let response = self
            .client
            .get(format!(
                "{}/{}/export",
                self.settings.endpoints.sheets_export, file_id
            ))
            .query(&[("format", "csv")])
            .header(header::ACCEPT, "text/csv")
            .timeout(SHEET_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DriveError::Status {
                service: "Sheets CSV export",
                status: response.status(),
            });
        }

        let body = response.text().await?;
        Ok(self.parser.parse_csv(&body))
    }

    /// Images and PDFs in the folder, sorted by name.
    pub async fn get_certificate_images(&self) -> Vec<DriveFile> {
        let result = self
            .images
            .get_or_cache(IMAGES_CACHE_KEY, self.settings.cache_ttl, || async {
                let mut assets: Vec<DriveFile> = self
                    .get_all_files()
                    .await?
                    .into_iter()
                    .filter(DriveFile::is_certificate_asset)
                    .collect();
                assets.sort_by(|a, b| {
                    a.name
                        .to_lowercase()
                        .cmp(&b.name.to_lowercase())
                        .then_with(|| a.name.cmp(&b.name))
                });
                debug!(
                    "Certificate assets: {:?}",
                    assets.iter().map(|f| f.name.as_str()).collect::<Vec<_>>()
                );
                Ok::<_, DriveError>(assets)
            })
            .await;

        match result {
            Ok(assets) => assets,
            Err(err) => {
                error!("Failed to list certificate assets: {}", err);
                self.images.get_stale(IMAGES_CACHE_KEY).unwrap_or_default()
            }
        }
    }

    /// Certificates with their matching asset attached.
    pub async fn get_certificates_with_images(&self) -> Vec<Certificate> {
        let (certificates, assets) =
            tokio::join!(self.get_certificates_sheet(), self.get_certificate_images());

        info!(
            "Matching {} certificates against {} assets",
            certificates.len(),
            assets.len()
        );
        let enriched = self.enrich(certificates, &assets);

        let with_asset = enriched.iter().filter(|c| c.has_asset()).count();
        info!(
            "{} certificates with an asset, {} without",
            with_asset,
            enriched.len() - with_asset
        );
        enriched
    }

    /// Attach the best matching asset to each certificate.
    ///
    /// Certificates whose best score is under the threshold come back with
    /// every asset field cleared, so demo artwork never passes for a match.
    pub fn enrich(&self, certificates: Vec<Certificate>, assets: &[DriveFile]) -> Vec<Certificate> {
        let threshold = self.matcher.threshold();

        certificates
            .into_iter()
            .map(|mut certificate| {
                let result = self.matcher.find_best_match(
                    &certificate.certificate_ref,
                    &certificate.title,
                    assets,
                );

                match result.accepted(threshold) {
                    Some(file) => {
                        let file_type = FileType::from_file_name(&file.name);
                        info!(
                            "{}: matched {} ({:.1}%, {:?})",
                            certificate.title,
                            file.name,
                            result.score * 100.0,
                            result.strategy
                        );
                        certificate.image_url = Some(self.image_url(&file.id, file_type));
                        certificate.download_url = Some(self.download_url(&file.id));
                        certificate.file_name = Some(file.name.clone());
                        certificate.file_type = Some(file_type);
                    }
                    None => {
                        info!(
                            "{}: no asset (best {:.1}% via {:?}, minimum {:.1}%)",
                            certificate.title,
                            result.score * 100.0,
                            result.file.map(|f| f.name.as_str()),
                            threshold * 100.0
                        );
                        certificate.image_url = None;
                        certificate.download_url = None;
                        certificate.file_name = None;
                        certificate.file_type = None;
                    }
                }
                certificate
            })
            .collect()
    }

    /// PDFs are previewed through the thumbnail renderer, images directly.
    pub fn image_url(&self, file_id: &str, file_type: FileType) -> String {
        let base = &self.settings.endpoints.drive_web;
        match file_type {
            FileType::Pdf => format!("{}/thumbnail?id={}&sz=w800-h600", base, file_id),
            FileType::Image | FileType::Unknown => {
                format!("{}/uc?id={}&export=view", base, file_id)
            }
        }
    }

    pub fn download_url(&self, file_id: &str) -> String {
        format!(
            "{}/uc?id={}&export=download",
            self.settings.endpoints.drive_web, file_id
        )
    }
}
