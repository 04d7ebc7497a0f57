use std::time::Duration;

use crate::common::{
    AppOptions, Fixture, GOOGLE_SHEET_MIME, Hits, SheetReply, TestApp, drive_file, routes,
};

const HEADERS: [&str; 9] = [
    "Título",
    "Local",
    "Data Início",
    "Data Término",
    "Projeto Referente",
    "Certificado",
    "Link do Projeto",
    "Carga Horária",
    "Status",
];

fn certificates_folder() -> Fixture {
    Fixture {
        files: vec![
            drive_file("sheet-1", "Certificados", GOOGLE_SHEET_MIME),
            drive_file("img-1", "teste001.png", "image/png"),
            drive_file("pdf-1", "qa.pdf", "application/pdf"),
        ],
        sheet: SheetReply::Values(vec![
            HEADERS.to_vec(),
            vec![
                "Certificado X",
                "Online",
                "01/03/2024",
                "30/06/2024",
                "Projeto Y",
                "teste001.png",
                "github.com/flameuss/x",
                "30h",
                "completo",
            ],
            vec!["Sem local nem arquivo", "", "", "", "", "", "", "", ""],
        ]),
        ..Default::default()
    }
}

mod reconciliation {
    use super::*;

    #[tokio::test]
    async fn spreadsheet_rows_are_matched_to_drive_assets() {
        let app = TestApp::spawn(certificates_folder()).await;

        let res = app.get(routes::CERTIFICATES).await;

        assert_eq!(res.status, 200, "{}", res.text);
        let certs = res.body.as_array().unwrap();
        assert_eq!(certs.len(), 1, "rows without place or reference are dropped");

        let cert = &certs[0];
        assert!(cert["id"].as_str().unwrap().starts_with("cert_"));
        assert_eq!(cert["titulo"], "Certificado X");
        assert_eq!(cert["local"], "Online");
        assert_eq!(cert["dataInicio"], "2024-03-01");
        assert_eq!(cert["dataTermino"], "2024-06-30");
        assert_eq!(cert["status"], "ativo");
        assert_eq!(cert["cargaHoraria"], "30h");
        assert_eq!(cert["certificadora"], "Online");
        assert_eq!(cert["linkProjeto"], "https://github.com/flameuss/x");
        assert_eq!(cert["fileName"], "teste001.png");
        assert_eq!(cert["fileType"], "image");
        assert_eq!(
            cert["imageUrl"],
            "https://drive.google.com/uc?id=img-1&export=view"
        );
        assert_eq!(
            cert["downloadUrl"],
            "https://drive.google.com/uc?id=img-1&export=download"
        );
    }

    #[tokio::test]
    async fn assets_listing_contains_only_images_and_pdfs() {
        let app = TestApp::spawn(certificates_folder()).await;

        let res = app.get(routes::CERTIFICATES_FILES).await;

        assert_eq!(res.status, 200);
        let names: Vec<&str> = res
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["qa.pdf", "teste001.png"]);
    }
}

mod fallbacks {
    use super::*;

    #[tokio::test]
    async fn failing_sheets_api_without_cache_serves_demo_data() {
        let fixture = Fixture {
            sheet: SheetReply::Status(500),
            ..certificates_folder()
        };
        let app = TestApp::spawn(fixture).await;

        let res = app.get(routes::CERTIFICATES_SHEET).await;

        assert_eq!(res.status, 200);
        let certs = res.body.as_array().unwrap();
        assert_eq!(certs.len(), 7);
        assert_eq!(certs[0]["id"], "real_1");
        assert_eq!(Hits::get(&app.upstream.hits.sheet_values), 1);
    }

    #[tokio::test]
    async fn forbidden_sheets_api_falls_back_to_csv_export() {
        let csv = format!(
            "{}\nCurso de Cypress,Online,10/01/2024,20/01/2024,,cypress.png,,8h,\n",
            HEADERS.join(",")
        );
        let fixture = Fixture {
            sheet: SheetReply::Status(403),
            csv,
            ..certificates_folder()
        };
        let app = TestApp::spawn(fixture).await;

        let res = app.get(routes::CERTIFICATES_SHEET).await;

        assert_eq!(res.status, 200);
        let certs = res.body.as_array().unwrap();
        assert_eq!(certs.len(), 1);
        assert_eq!(certs[0]["titulo"], "Curso de Cypress");
        assert_eq!(certs[0]["dataInicio"], "2024-01-10");
        assert_eq!(Hits::get(&app.upstream.hits.csv_export), 1);
    }

    #[tokio::test]
    async fn folder_without_spreadsheet_serves_demo_data() {
        let fixture = Fixture {
            files: vec![drive_file("img-1", "teste001.png", "image/png")],
            ..Default::default()
        };
        let app = TestApp::spawn(fixture).await;

        let res = app.get(routes::CERTIFICATES_SHEET).await;

        assert_eq!(res.body.as_array().unwrap().len(), 7);
        assert_eq!(Hits::get(&app.upstream.hits.sheet_values), 0);
    }

    #[tokio::test]
    async fn unconfigured_drive_reports_not_ready() {
        let options = AppOptions {
            drive_configured: false,
            ..Default::default()
        };
        let app = TestApp::spawn_with(certificates_folder(), options).await;

        let ready = app.get(routes::READYZ).await;
        assert_eq!(ready.status, 503);
        assert_eq!(ready.body["checks"]["google_drive"]["ok"], false);

        let status = app.get(routes::CERTIFICATES_STATUS).await;
        assert_eq!(status.body["success"], false);

        let certs = app.get(routes::CERTIFICATES).await;
        let certs = certs.body.as_array().unwrap();
        assert_eq!(certs.len(), 7);
        assert!(certs.iter().all(|c| c.get("imageUrl").is_none()));
        assert!(certs.iter().all(|c| c.get("fileType").is_none()));
        assert_eq!(Hits::get(&app.upstream.hits.files_list), 0);
    }
}

mod caching {
    use super::*;

    #[tokio::test]
    async fn repeated_reads_within_ttl_hit_the_cache() {
        let app = TestApp::spawn(certificates_folder()).await;

        app.get(routes::CERTIFICATES_FILES).await;
        app.get(routes::CERTIFICATES_FILES).await;
        app.get(routes::CERTIFICATES_SHEET).await;
        app.get(routes::CERTIFICATES_SHEET).await;

        assert_eq!(Hits::get(&app.upstream.hits.files_list), 1);
        assert_eq!(Hits::get(&app.upstream.hits.sheet_values), 1);
    }

    #[tokio::test]
    async fn expired_entries_are_fetched_again() {
        let options = AppOptions {
            cache_ttl: Duration::from_millis(200),
            ..Default::default()
        };
        let app = TestApp::spawn_with(certificates_folder(), options).await;

        app.get(routes::CERTIFICATES_SHEET).await;
        tokio::time::sleep(Duration::from_millis(300)).await;
        let res = app.get(routes::CERTIFICATES_SHEET).await;

        assert_eq!(res.body.as_array().unwrap().len(), 1);
        assert_eq!(Hits::get(&app.upstream.hits.sheet_values), 2);
    }

    #[tokio::test]
    async fn clearing_and_invalidating_force_refetches() {
        let app = TestApp::spawn(certificates_folder()).await;

        app.get(routes::CERTIFICATES_FILES).await;
        let res = app.delete(&routes::cache_resource("files")).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["resource"], "files");
        assert_eq!(res.body["removed"], 1);

        // asset list itself is still cached
        app.get(routes::CERTIFICATES_FILES).await;
        assert_eq!(Hits::get(&app.upstream.hits.files_list), 1);

        let res = app.post(routes::CACHE_CLEAR).await;
        assert_eq!(res.status, 204);
        app.get(routes::CERTIFICATES_FILES).await;
        assert_eq!(Hits::get(&app.upstream.hits.files_list), 2);
    }

    #[tokio::test]
    async fn unknown_cache_resource_is_rejected() {
        let app = TestApp::spawn(certificates_folder()).await;

        let res = app.delete(&routes::cache_resource("everything")).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["status"], 400);
        assert!(res.body["error"].as_str().unwrap().contains("everything"));
    }
}

mod status {
    use super::*;

    #[tokio::test]
    async fn configuration_probe_counts_folder_files() {
        let app = TestApp::spawn(certificates_folder()).await;

        let res = app.get(routes::CERTIFICATES_STATUS).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["success"], true);
        assert_eq!(res.body["details"]["filesFound"], 3);
        assert!(res.body["timestamp"].is_string());
    }
}
