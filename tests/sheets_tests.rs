use keyword_harvest::config::SheetConfig;
use keyword_harvest::sheets::{GoogleSheet, SheetError, SheetStore};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SHEET_ID: &str = "sheet-123";

fn sheet_for(server: &MockServer) -> GoogleSheet {
    GoogleSheet::new(&SheetConfig {
        spreadsheet_id: Some(SHEET_ID.to_string()),
        access_token: Some("token-abc".to_string()),
        api_base: server.uri(),
    })
}

fn values_path(range: &str) -> String {
    format!("/v4/spreadsheets/{SHEET_ID}/values/{range}")
}

#[cfg(test)]
mod google_sheet {
    use super::*;

    #[tokio::test]
    async fn test_read_urls_skips_header_and_blanks() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(values_path("A:A")))
            .and(header("authorization", "Bearer token-abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "range": "Sheet1!A1:A5",
                "majorDimension": "ROWS",
                "values": [["URLs"], ["https://a.example"], [], [" "], ["https://b.example"]]
            })))
            .mount(&server)
            .await;

        let urls = sheet_for(&server).read_urls().await.unwrap();
        assert_eq!(
            urls,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }

    #[tokio::test]
    async fn test_read_keyword_from_cell() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(values_path("D1")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "range": "Sheet1!D1",
                "values": [["  rust  "]]
            })))
            .mount(&server)
            .await;

        let keyword = sheet_for(&server).read_keyword().await.unwrap();
        assert_eq!(keyword.as_deref(), Some("rust"));
    }

    #[tokio::test]
    async fn test_empty_keyword_cell() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(values_path("D1")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"range": "Sheet1!D1"})))
            .mount(&server)
            .await;

        assert_eq!(sheet_for(&server).read_keyword().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_matches_clears_then_updates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(values_path("C2:C:clear")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(values_path("C2:C3")))
            .and(query_param("valueInputOption", "RAW"))
            .and(body_json(json!({
                "range": "C2:C3",
                "majorDimension": "ROWS",
                "values": [["https://a.example"], ["https://b.example"]]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        sheet_for(&server)
            .write_matches(&["https://a.example".to_string(), "https://b.example".to_string()])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_write_no_matches_only_clears() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(values_path("C2:C:clear")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        sheet_for(&server).write_matches(&[]).await.unwrap();
    }

    #[tokio::test]
    async fn test_api_error_surfaces_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("PERMISSION_DENIED"))
            .mount(&server)
            .await;

        let err = sheet_for(&server).read_urls().await.unwrap_err();
        match err {
            SheetError::Api { status, body } => {
                assert_eq!(status.as_u16(), 403);
                assert_eq!(body, "PERMISSION_DENIED");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_spreadsheet_id() {
        let sheet = GoogleSheet::new(&SheetConfig {
            spreadsheet_id: None,
            access_token: Some("token".to_string()),
            api_base: "http://127.0.0.1:1".to_string(),
        });
        let err = sheet.write_matches(&[]).await.unwrap_err();
        assert!(matches!(err, SheetError::MissingCredentials(_)));
    }
}
