//! Built-in certificates served when the spreadsheet cannot be read, so the
//! certificates page always has something to render.

use crate::models::certificate::{Certificate, FileType};

struct MockRow {
    id: &'static str,
    title: &'static str,
    place: &'static str,
    start_date: &'static str,
    end_date: &'static str,
    related_project: &'static str,
    certificate_ref: &'static str,
    project_link: Option<&'static str>,
    workload: Option<&'static str>,
    status: &'static str,
    asset: Option<(&'static str, &'static str, FileType)>,
}

const MOCK_ROWS: [MockRow; 7] = [
    MockRow {
        id: "real_1",
        title: "Certificado de Conclusão de Curso de Marketing Digital",
        place: "Online",
        start_date: "2024-03-01",
        end_date: "2024-06-30",
        related_project: "Lançamento de Produto X",
        certificate_ref: "teste001.png",
        project_link: Some("https://github.com/flameuss/monitoramento-sites"),
        workload: Some("30h"),
        status: "ativo",
        asset: Some((
            "https://images.unsplash.com/photo-1432888622747-4eb9a8efeb07?w=800&h=600&fit=crop&crop=center",
            "teste001.png",
            FileType::Image,
        )),
    },
    MockRow {
        id: "real_2",
        title: "Certificado de Participação em Workshop de IA",
        place: "São Paulo, Brasil",
        start_date: "2024-07-15",
        end_date: "2024-07-16",
        related_project: "Desenvolvimento de Chatbot",
        certificate_ref: "qa.pdf",
        project_link: None,
        workload: Some("30h"),
        status: "em_andamento",
        asset: Some((
            "https://images.unsplash.com/photo-1485827404703-89b55fcc595e?w=800&h=600&fit=crop&crop=center",
            "qa.pdf",
            FileType::Pdf,
        )),
    },
    MockRow {
        id: "real_3",
        title: "Certificado de Proficiência em Idioma",
        place: "Cambridge, Inglaterra",
        start_date: "2023-09-01",
        end_date: "2023-12-31",
        related_project: "Intercâmbio Cultural",
        certificate_ref: "",
        project_link: None,
        workload: Some("30h"),
        status: "em_andamento",
        asset: None,
    },
    MockRow {
        id: "real_4",
        title: "Certificado de Treinamento em Design Gráfico",
        place: "Rio de Janeiro, Brasil",
        start_date: "2025-01-10",
        end_date: "2025-02-28",
        related_project: "Criação de Identidade Visual",
        certificate_ref: "teste001.png",
        project_link: Some("https://github.com/flameuss/monitoramento-sites"),
        workload: Some("30h"),
        status: "ativo",
        asset: Some((
            "https://images.unsplash.com/photo-1626785774573-4b799315345d?w=800&h=600&fit=crop&crop=center",
            "teste001.png",
            FileType::Image,
        )),
    },
    MockRow {
        id: "real_5",
        title: "Certificado de Segurança da Informação",
        place: "Online",
        start_date: "2023-11-01",
        end_date: "2024-01-31",
        related_project: "Auditoria de Sistemas",
        certificate_ref: "security_cert.pdf",
        project_link: None,
        workload: Some("30h"),
        status: "expirado",
        asset: Some((
            "https://images.unsplash.com/photo-1563986768609-322da13575f3?w=800&h=600&fit=crop&crop=center",
            "security_cert.pdf",
            FileType::Pdf,
        )),
    },
    MockRow {
        id: "real_6",
        title: "Certificado de Especialização em Análise de Dados",
        place: "Belo Horizonte, Brasil",
        start_date: "2024-04-05",
        end_date: "2024-08-20",
        related_project: "Otimização de Processos",
        certificate_ref: "",
        project_link: None,
        workload: Some("30h"),
        status: "ativo",
        asset: None,
    },
    MockRow {
        id: "real_7",
        title: "teste0001",
        place: "Altura",
        start_date: "",
        end_date: "",
        related_project: "",
        certificate_ref: "",
        project_link: None,
        workload: None,
        status: "N/A",
        asset: Some((
            "https://images.unsplash.com/photo-1554224155-6726b3ff858f?w=800&h=600&fit=crop&crop=center",
            "teste0001.pdf",
            FileType::Pdf,
        )),
    },
];

/// The fixed demo dataset. Asset URLs point at placeholder artwork.
pub fn mock_certificates() -> Vec<Certificate> {
    MOCK_ROWS
        .iter()
        .map(|row| Certificate {
            id: row.id.to_string(),
            title: row.title.to_string(),
            place: row.place.to_string(),
            start_date: row.start_date.to_string(),
            end_date: row.end_date.to_string(),
            related_project: row.related_project.to_string(),
            certificate_ref: row.certificate_ref.to_string(),
            project_link: row.project_link.map(str::to_string),
            workload: row.workload.map(str::to_string),
            status: Some(row.status.to_string()),
            issuer: Some(row.place.to_string()),
            image_url: row.asset.map(|(url, _, _)| url.to_string()),
            download_url: row.asset.map(|(url, _, _)| url.to_string()),
            file_name: row.asset.map(|(_, name, _)| name.to_string()),
            file_type: row.asset.map(|(_, _, file_type)| file_type),
        })
        .collect()
}
