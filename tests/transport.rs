mod common;
use common::credentials;

use quickfile_mcp::services::api_client::{ApiClient, ClientOptions, InvokeOptions};
use quickfile_mcp::services::logger::Logger;
use quickfile_mcp::services::transport::{HttpTransport, ReqwestTransport, TransportError};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Raw request text: request line, headers and body.
type Captured = oneshot::Receiver<String>;

fn header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|i| i + 4)
}

fn content_length(head: &str) -> usize {
    head.lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.trim()
                .eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse().ok())
                .flatten()
        })
        .unwrap_or(0)
}

/// Serves exactly one request with the given status line and body.
async fn one_shot_server(status_line: &'static str, body: String) -> (String, Captured) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.expect("read");
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = header_end(&buf) {
                let head = String::from_utf8_lossy(&buf[..end]).to_string();
                if buf.len() >= end + content_length(&head) {
                    break;
                }
            }
        }
        let _ = tx.send(String::from_utf8_lossy(&buf).to_string());
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.expect("write");
        let _ = socket.shutdown().await;
    });
    (format!("http://{}", addr), rx)
}

#[tokio::test]
async fn reqwest_transport_returns_non_2xx_as_response() {
    let (base, captured) = one_shot_server("500 Internal Server Error", "{}".to_string()).await;
    let transport = ReqwestTransport::new().expect("transport");
    let response = transport
        .post_json(&format!("{}/1_2/client/get", base), &json!({"payload": {}}))
        .await
        .expect("response");
    assert_eq!(response.status, 500);
    assert_eq!(response.status_text, "Internal Server Error");
    assert!(!response.is_success());

    let raw = captured.await.expect("captured request").to_lowercase();
    assert!(raw.starts_with("post /1_2/client/get "), "{}", raw);
    assert!(raw.contains("content-type: application/json"));
    assert!(raw.contains("accept: application/json"));
}

#[tokio::test]
async fn refused_connection_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let transport = ReqwestTransport::new().expect("transport");
    let err = transport
        .post_json(&format!("http://{}/1_2/client/get", addr), &json!({}))
        .await
        .expect_err("nothing listening");
    assert!(matches!(err, TransportError::Network(_)), "{:?}", err);
}

#[tokio::test]
async fn api_client_round_trip_over_http() {
    let body = json!({
        "Client_Get": {
            "Header": {"MessageType": "Response", "SubmissionNumber": "x"},
            "Body": {"ClientDetails": {"ClientID": 3, "CompanyName": "Acme Ltd"}}
        }
    })
    .to_string();
    let (base, captured) = one_shot_server("200 OK", body).await;
    let client = ApiClient::new(
        Logger::in_memory("test"),
        credentials(),
        Arc::new(ReqwestTransport::new().expect("transport")),
        &ClientOptions::default().with_base_url(base),
    )
    .expect("client");

    let value = client
        .invoke_value("Client_Get", &json!({"ClientID": 3}), InvokeOptions::default())
        .await
        .expect("body");
    assert_eq!(value["ClientDetails"]["CompanyName"], "Acme Ltd");

    let raw = captured.await.expect("captured request");
    let (_, sent_body) = raw.split_once("\r\n\r\n").expect("body separator");
    let sent: Value = serde_json::from_str(sent_body).expect("json body");
    assert_eq!(sent["payload"]["Body"]["ClientID"], 3);
    assert_eq!(sent["payload"]["Header"]["Authentication"]["AccNumber"], common::ACCOUNT);
}
