//! Authentication behavior of the provider client against a scripted
//! HTTP endpoint.

use std::sync::{Arc, Mutex};

use client::{HttpPrintProvider, ProviderConfig};
use domain::{
    BindingType, BookSpecification, ExternalId, FileRole, PaperType, ShippingLevel, StagedFile,
    TrimSize,
};
use pipeline::{JobSubmission, PipelineError, PrintProvider};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// One-connection-per-request HTTP endpoint that answers from a fixed
/// script and records the request paths it saw.
struct ScriptedEndpoint {
    base_url: String,
    paths: Arc<Mutex<Vec<String>>>,
}

impl ScriptedEndpoint {
    async fn serve(responses: Vec<(u16, &'static str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let paths = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&paths);

        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().await.unwrap();

                let mut request = Vec::new();
                loop {
                    let mut chunk = [0u8; 1024];
                    let n = stream.read(&mut chunk).await.unwrap();
                    request.extend_from_slice(&chunk[..n]);
                    if n == 0 || request_complete(&request) {
                        break;
                    }
                }

                let text = String::from_utf8_lossy(&request);
                let path = text.split_whitespace().nth(1).unwrap_or("").to_string();
                recorded.lock().unwrap().push(path);

                let reason = match status {
                    200 => "OK",
                    401 => "Unauthorized",
                    _ => "Error",
                };
                let response = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    reason,
                    body.len(),
                    body
                );
                stream.write_all(response.as_bytes()).await.unwrap();
                let _ = stream.shutdown().await;
            }
        });

        Self {
            base_url: format!("http://{}", addr),
            paths,
        }
    }

    fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }
}

fn request_complete(buf: &[u8]) -> bool {
    let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
        return false;
    };
    let headers = String::from_utf8_lossy(&buf[..end]);
    let content_length = headers
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.eq_ignore_ascii_case("content-length") {
                value.trim().parse::<usize>().ok()
            } else {
                None
            }
        })
        .unwrap_or(0);
    buf.len() >= end + 4 + content_length
}

fn submission() -> JobSubmission {
    let spec = BookSpecification::new(
        TrimSize::US_TRADE,
        BindingType::PerfectBound,
        PaperType::White,
        200,
    )
    .unwrap();

    JobSubmission {
        external_id: ExternalId::new("order-1"),
        spec,
        quantity: 100,
        shipping_level: ShippingLevel::Ground,
        interior: StagedFile::new("mem://1", 100, FileRole::Interior),
        cover: StagedFile::new("mem://2", 50, FileRole::Cover),
        contact_email: "reader@example.com".to_string(),
    }
}

const TOKEN_OK: &str = r#"{"access_token":"tok","expires_in":3600}"#;
const JOB_OK: &str = r#"{"id":"PJ-1","status":"CREATED","tracking_url":null,"estimated_delivery":null}"#;

#[tokio::test]
async fn test_create_print_job_reauthenticates_once_on_401() {
    let endpoint = ScriptedEndpoint::serve(vec![
        (200, TOKEN_OK),
        (401, "{}"),
        (200, TOKEN_OK),
        (200, JOB_OK),
    ])
    .await;

    let provider =
        HttpPrintProvider::new(ProviderConfig::new(endpoint.base_url.as_str(), "id", "secret"));
    let job = provider.create_print_job(&submission()).await.unwrap();

    assert_eq!(job.id, "PJ-1");
    assert_eq!(
        endpoint.paths(),
        vec![
            "/oauth2/token".to_string(),
            "/print-jobs/".to_string(),
            "/oauth2/token".to_string(),
            "/print-jobs/".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_create_print_job_gives_up_after_second_401() {
    let endpoint = ScriptedEndpoint::serve(vec![
        (200, TOKEN_OK),
        (401, "{}"),
        (200, TOKEN_OK),
        (401, "{}"),
    ])
    .await;

    let provider =
        HttpPrintProvider::new(ProviderConfig::new(endpoint.base_url.as_str(), "id", "secret"));
    let result = provider.create_print_job(&submission()).await;

    assert!(matches!(
        result,
        Err(PipelineError::AuthenticationFailed(_))
    ));
    assert_eq!(endpoint.paths().len(), 4);
}
