//! Turns a grid of spreadsheet cells into [`Certificate`] records.
//!
//! Row 0 holds the headers. Columns are resolved through a [`ColumnMapping`]:
//! an explicit mapping supplied by configuration wins, otherwise the standard
//! nine-column layout is assumed for wide sheets and a synonym search over
//! the header text is used for anything narrower.

use crate::{models::certificate::Certificate, services::matcher::normalize};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::LazyLock};
use tracing::{debug, info, warn};

/// Headers at or above this width are read with [`ColumnMapping::standard_layout`].
pub const STANDARD_LAYOUT_MIN_COLUMNS: usize = 8;

static DMY_SLASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2})/(\d{2})/(\d{4})$").expect("valid date regex"));
static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"));
static DMY_DASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}-\d{2}-\d{4}$").expect("valid date regex"));
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(https?://)?([0-9a-z.-]+)\.([a-z.]{2,6})[/A-Za-z0-9_ .-]*/?$").expect("valid url regex")
});

/// Column index for each certificate field. `None` means "not in this sheet".
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ColumnMapping {
    pub title: Option<usize>,
    pub place: Option<usize>,
    pub start_date: Option<usize>,
    pub end_date: Option<usize>,
    pub related_project: Option<usize>,
    pub certificate_ref: Option<usize>,
    pub project_link: Option<usize>,
    pub workload: Option<usize>,
    pub status: Option<usize>,
    pub issuer: Option<usize>,
}

impl ColumnMapping {
    /// The layout of the certificates sheet the portfolio was built around:
    /// title, place, start, end, project, file, link, workload, status.
    pub fn standard_layout() -> Self {
        Self {
            title: Some(0),
            place: Some(1),
            start_date: Some(2),
            end_date: Some(3),
            related_project: Some(4),
            certificate_ref: Some(5),
            project_link: Some(6),
            workload: Some(7),
            status: Some(8),
            issuer: None,
        }
    }

    fn slot_mut(&mut self, field: Field) -> &mut Option<usize> {
        match field {
            Field::Title => &mut self.title,
            Field::Place => &mut self.place,
            Field::StartDate => &mut self.start_date,
            Field::EndDate => &mut self.end_date,
            Field::RelatedProject => &mut self.related_project,
            Field::CertificateRef => &mut self.certificate_ref,
            Field::ProjectLink => &mut self.project_link,
            Field::Workload => &mut self.workload,
            Field::Issuer => &mut self.issuer,
            Field::Status => &mut self.status,
        }
    }

    /// Build a mapping by searching the header row for known synonyms.
    pub fn from_headers(headers: &[String]) -> Self {
        let mut mapping = Self::default();

        for field in Field::ALL {
            let mut variations: Vec<&str> = field.synonyms().to_vec();
            // An unrecognized first column is most likely the title.
            if field == Field::Title {
                if let Some(first) = headers.first() {
                    variations.push(first.as_str());
                }
            }
            *mapping.slot_mut(field) = find_column(headers, &variations);
        }

        mapping
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field {
    Title,
    Place,
    StartDate,
    EndDate,
    RelatedProject,
    CertificateRef,
    ProjectLink,
    Workload,
    Issuer,
    Status,
}

impl Field {
    const ALL: [Field; 10] = [
        Field::Title,
        Field::Place,
        Field::StartDate,
        Field::EndDate,
        Field::RelatedProject,
        Field::CertificateRef,
        Field::ProjectLink,
        Field::Workload,
        Field::Issuer,
        Field::Status,
    ];

    fn synonyms(self) -> &'static [&'static str] {
        match self {
            Field::Title => &[
                "título", "titulo", "title", "nome", "certificado", "curso", "treinamento",
                "nome do certificado", "nome do curso", "título do certificado",
            ],
            Field::Place => &[
                "local", "instituição", "instituicao", "escola", "empresa", "plataforma",
                "provedor", "organização", "organizacao",
            ],
            Field::StartDate => &[
                "data inicio", "data início", "data de inicio", "data de início", "inicio",
                "início", "start", "começou", "comecou", "data_inicio", "data-de-inicio",
            ],
            Field::EndDate => &[
                "data termino", "data término", "data de termino", "data de término", "termino",
                "término", "fim", "end", "conclusao", "conclusão", "data_termino", "data_fim",
                "data-de-termino",
            ],
            Field::RelatedProject => &[
                "projeto", "projeto referente", "área", "area", "categoria", "tipo", "assunto",
                "tema", "especialização", "especializacao", "projeto-referente",
            ],
            Field::CertificateRef => &[
                "arquivo", "imagem", "certificado", "documento", "anexo", "referência",
                "referencia", "nome do arquivo", "filename",
            ],
            Field::ProjectLink => &[
                "link", "url", "link projeto", "link do projeto", "github", "repositório",
                "repositorio", "repo", "link-do-projeto",
            ],
            Field::Workload => &[
                "carga horária", "carga horaria", "horas", "duração", "duracao", "tempo", "ch",
                "carga-horaria", "carga-hora",
            ],
            Field::Issuer => &["certificadora", "emissor", "quem emitiu", "emitido por"],
            Field::Status => &["status", "situação", "situacao", "estado"],
        }
    }
}

/// First header matching any variation, trying variations in order:
/// exact normalized match first, then containment in either direction.
fn find_column(headers: &[String], variations: &[&str]) -> Option<usize> {
    let normalized: Vec<String> = headers.iter().map(|h| normalize(h)).collect();

    for variation in variations {
        let wanted = normalize(variation);
        if wanted.is_empty() {
            continue;
        }

        if let Some(index) = normalized.iter().position(|h| !h.is_empty() && *h == wanted) {
            return Some(index);
        }

        if let Some(index) = normalized
            .iter()
            .position(|h| !h.is_empty() && (h.contains(&wanted) || wanted.contains(h.as_str())))
        {
            return Some(index);
        }
    }

    None
}

/// Normalize a spreadsheet date to ISO `YYYY-MM-DD` when possible.
///
/// `DD/MM/YYYY` is converted after a range check; ISO and `DD-MM-YYYY` are
/// kept as-is; anything else passes through unchanged. Empty cells and the
/// `dd/mm/yyyy` placeholder become an empty string.
pub fn normalize_date(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("dd/mm/yyyy") {
        return String::new();
    }

    let clean = trimmed.replace('"', "");

    if let Some(caps) = DMY_SLASH.captures(&clean) {
        let day: u32 = caps[1].parse().unwrap_or(0);
        let month: u32 = caps[2].parse().unwrap_or(0);
        let year: u32 = caps[3].parse().unwrap_or(0);

        if (1..=31).contains(&day) && (1..=12).contains(&month) && year > 1900 {
            return format!("{:04}-{:02}-{:02}", year, month, day);
        }
        debug!("Out-of-range date kept as-is: {}", clean);
    } else if !ISO_DATE.is_match(&clean) && !DMY_DASH.is_match(&clean) {
        debug!("Unrecognized date format kept as-is: {}", clean);
    }

    clean
}

/// Accept something that looks like a web address, adding `https://` when
/// no scheme is present. Anything else is dropped.
pub fn validate_url(raw: &str) -> Option<String> {
    let clean = raw.trim();
    if clean.is_empty() || !URL_PATTERN.is_match(clean) {
        return None;
    }

    if clean.to_ascii_lowercase().starts_with("http") {
        Some(clean.to_string())
    } else {
        Some(format!("https://{}", clean))
    }
}

/// Deterministic id from the stable parts of a row.
pub fn certificate_id(title: &str, place: &str, start_date: &str, end_date: &str) -> String {
    let digest = md5::compute(format!("{}|{}|{}|{}", title, place, start_date, end_date));
    let hex = format!("{:x}", digest);
    format!("cert_{}", &hex[..16])
}

fn normalize_status(raw: &str) -> String {
    if raw.is_empty() || raw.eq_ignore_ascii_case("completo") || raw.eq_ignore_ascii_case("complete") {
        "ativo".to_string()
    } else {
        raw.to_string()
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

#[derive(Clone, Debug, Default)]
pub struct SheetParser {
    mapping: Option<ColumnMapping>,
}

impl SheetParser {
    /// `mapping` pins the column layout; `None` infers it from the headers.
    pub fn new(mapping: Option<ColumnMapping>) -> Self {
        Self { mapping }
    }

    pub fn resolve_mapping(&self, headers: &[String]) -> ColumnMapping {
        if let Some(mapping) = &self.mapping {
            return mapping.clone();
        }
        if headers.len() >= STANDARD_LAYOUT_MIN_COLUMNS {
            return ColumnMapping::standard_layout();
        }

        debug!("Narrow header row ({} columns), searching synonyms", headers.len());
        ColumnMapping::from_headers(headers)
    }

    /// Parse a header row plus data rows into the valid certificates.
    pub fn parse_values(&self, values: &[Vec<String>]) -> Vec<Certificate> {
        let Some((header_row, rows)) = values.split_first() else {
            return Vec::new();
        };
        if rows.is_empty() {
            warn!("Spreadsheet has headers but no data rows");
            return Vec::new();
        }

        let headers: Vec<String> = header_row.iter().map(|h| h.trim().to_lowercase()).collect();
        let mapping = self.resolve_mapping(&headers);
        debug!("Headers {:?} mapped to {:?}", headers, mapping);

        let mut seen_ids: HashMap<String, usize> = HashMap::new();
        let mut certificates = Vec::new();

        for (offset, row) in rows.iter().enumerate() {
            let row_number = offset + 1;
            match build_certificate(row, &mapping) {
                Some(mut certificate) => {
                    let count = seen_ids.entry(certificate.id.clone()).or_insert(0);
                    *count += 1;
                    if *count > 1 {
                        certificate.id = format!("{}_{}", certificate.id, count);
                    }
                    debug!("Row {} -> {} ({})", row_number, certificate.id, certificate.title);
                    certificates.push(certificate);
                }
                None => debug!("Row {} skipped: missing title or place/reference", row_number),
            }
        }

        info!(
            "Parsed {} valid certificates from {} rows",
            certificates.len(),
            rows.len()
        );
        certificates
    }

    /// Parse a CSV export of the sheet. Broken records are skipped.
    pub fn parse_csv(&self, data: &str) -> Vec<Certificate> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(data.as_bytes());

        let mut values: Vec<Vec<String>> = Vec::new();
        for (index, record) in reader.records().enumerate() {
            match record {
                Ok(record) => {
                    if record.iter().all(str::is_empty) {
                        continue;
                    }
                    values.push(record.iter().map(str::to_string).collect());
                }
                Err(err) => warn!("Skipping unreadable CSV record {}: {}", index, err),
            }
        }

        self.parse_values(&values)
    }
}

fn build_certificate(row: &[String], mapping: &ColumnMapping) -> Option<Certificate> {
    let get = |index: Option<usize>| -> String {
        index
            .and_then(|i| row.get(i))
            .map(|value| value.trim().to_string())
            .unwrap_or_default()
    };

    let title = get(mapping.title);
    let place = get(mapping.place);
    let certificate_ref = get(mapping.certificate_ref);

    let start_date = normalize_date(&get(mapping.start_date));
    let end_date = normalize_date(&get(mapping.end_date));
    let issuer = non_empty(get(mapping.issuer))
        .or_else(|| non_empty(place.clone()))
        .unwrap_or_else(|| "N/A".to_string());

    let mut certificate = Certificate {
        id: certificate_id(&title, &place, &start_date, &end_date),
        title,
        place,
        start_date,
        end_date,
        related_project: get(mapping.related_project),
        certificate_ref,
        project_link: validate_url(&get(mapping.project_link)),
        workload: non_empty(get(mapping.workload)),
        status: Some(normalize_status(&get(mapping.status))),
        issuer: Some(issuer),
        image_url: None,
        download_url: None,
        file_name: None,
        file_type: None,
    };

    if !certificate.is_valid() {
        return None;
    }

    if certificate.place.is_empty() {
        certificate.place = "N/A".to_string();
    }
    Some(certificate)
}
