mod common;
use common::{
    client_with, ok_json, status, vendor_body, PendingTransport, ScriptedTransport, ACCOUNT,
    API_KEY, APP_ID, ENV_LOCK,
};

use quickfile_mcp::errors::ClientErrorKind;
use quickfile_mcp::services::api_client::{ApiClient, ClientOptions, InvokeOptions};
use quickfile_mcp::services::credentials::Credentials;
use quickfile_mcp::services::auth::hash;
use quickfile_mcp::services::logger::Logger;
use quickfile_mcp::services::transport::TransportError;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[tokio::test]
async fn successful_call_posts_envelope_and_unwraps_body() {
    let transport = ScriptedTransport::new(vec![ok_json(vendor_body(
        "Client_Get",
        json!({"ClientDetails": {"ClientID": 42, "CompanyName": "Acme Ltd"}}),
    ))]);
    let client = client_with(Logger::in_memory("test"), transport.clone(), &ClientOptions::default());

    let body = client
        .invoke_value("Client_Get", &json!({"ClientID": 42}), InvokeOptions::default())
        .await
        .expect("body");
    assert_eq!(body["ClientDetails"]["CompanyName"], "Acme Ltd");

    let request = transport.last_request();
    assert_eq!(request.url, "https://api.quickfile.co.uk/1_2/client/get");
    let header = &request.body["payload"]["Header"];
    assert_eq!(header["MessageType"], "Request");
    assert_eq!(header["Authentication"]["AccNumber"], ACCOUNT);
    assert_eq!(header["Authentication"]["ApplicationID"], APP_ID);
    assert!(header.get("TestMode").is_none());
    let submission = header["SubmissionNumber"].as_str().expect("submission number");
    assert_eq!(
        header["Authentication"]["MD5Value"],
        hash(ACCOUNT, API_KEY, submission)
    );
    assert_eq!(request.body["payload"]["Body"], json!({"ClientID": 42}));
}

#[tokio::test]
async fn typed_invoke_deserializes_the_body() {
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct Balance {
        nominal_code: u32,
        balance: f64,
    }

    let transport = ScriptedTransport::new(vec![ok_json(vendor_body(
        "Bank_GetAccountBalances",
        json!({"NominalCode": 1200, "Balance": 1520.75}),
    ))]);
    let client = client_with(Logger::in_memory("test"), transport, &ClientOptions::default());
    let balance: Balance = client
        .invoke("Bank_GetAccountBalances", &json!({}), InvokeOptions::default())
        .await
        .expect("typed body");
    assert_eq!(balance.nominal_code, 1200);
    assert!((balance.balance - 1520.75).abs() < f64::EPSILON);
}

#[tokio::test]
async fn every_call_gets_a_fresh_submission_number() {
    let transport = ScriptedTransport::new(vec![
        ok_json(vendor_body("Client_Get", json!({}))),
        ok_json(vendor_body("Client_Get", json!({}))),
    ]);
    let client = client_with(Logger::in_memory("test"), transport.clone(), &ClientOptions::default());
    for _ in 0..2 {
        client
            .invoke_value("Client_Get", &json!({}), InvokeOptions::default())
            .await
            .expect("ok");
    }
    let requests = transport.requests();
    let first = &requests[0].body["payload"]["Header"];
    let second = &requests[1].body["payload"]["Header"];
    assert_ne!(first["SubmissionNumber"], second["SubmissionNumber"]);
    assert_ne!(
        first["Authentication"]["MD5Value"],
        second["Authentication"]["MD5Value"]
    );
}

#[tokio::test]
async fn http_failure_reports_status() {
    let transport = ScriptedTransport::new(vec![status(500, "Internal Server Error", "oops")]);
    let client = client_with(Logger::in_memory("test"), transport, &ClientOptions::default());
    let err = client
        .invoke_value("Invoice_Search", &json!({}), InvokeOptions::default())
        .await
        .expect_err("500");
    assert_eq!(err.kind, ClientErrorKind::Http);
    assert_eq!(err.code, "500");
    assert_eq!(err.message, "HTTP 500: Internal Server Error");
}

#[tokio::test]
async fn vendor_errors_keep_first_code_and_all_messages() {
    let transport = ScriptedTransport::new(vec![ok_json(json!({
        "Errors": {"Error": [
            {"ErrorCode": "AUTH01", "ErrorMessage": "Invalid MD5 hash"},
            {"ErrorCode": "AUTH02", "ErrorMessage": "Submission number reused"}
        ]}
    }))]);
    let client = client_with(Logger::in_memory("test"), transport, &ClientOptions::default());
    let err = client
        .invoke_value("Client_Get", &json!({}), InvokeOptions::default())
        .await
        .expect_err("vendor error");
    assert_eq!(err.kind, ClientErrorKind::Application);
    assert_eq!(err.code, "AUTH01");
    assert_eq!(err.message, "Invalid MD5 hash; Submission number reused");
    assert_eq!(
        err.render(),
        "QuickFile API Error [AUTH01]: Invalid MD5 hash; Submission number reused"
    );
}

#[tokio::test]
async fn string_errors_get_unknown_code() {
    let transport = ScriptedTransport::new(vec![ok_json(json!({"errors": ["Account locked"]}))]);
    let client = client_with(Logger::in_memory("test"), transport, &ClientOptions::default());
    let err = client
        .invoke_value("Client_Get", &json!({}), InvokeOptions::default())
        .await
        .expect_err("vendor error");
    assert_eq!(err.code, "UNKNOWN");
    assert_eq!(err.message, "Account locked");
}

#[tokio::test]
async fn slow_transport_times_out() {
    let client = client_with(
        Logger::in_memory("test"),
        Arc::new(PendingTransport),
        &ClientOptions::default().with_timeout_ms(1),
    );
    let err = client
        .invoke_value("Report_Subscriptions", &Value::Null, InvokeOptions::omit_body())
        .await
        .expect_err("timeout");
    assert!(err.is_timeout());
    assert_eq!(err.code, "TIMEOUT");
}

#[tokio::test]
async fn transport_failures_are_classified() {
    let transport = ScriptedTransport::new(vec![
        Err(TransportError::Network("connection refused".to_string())),
        Err(TransportError::Timeout),
        Err(TransportError::Other("builder error".to_string())),
    ]);
    let client = client_with(Logger::in_memory("test"), transport, &ClientOptions::default());
    let mut codes = Vec::new();
    for _ in 0..3 {
        let err = client
            .invoke_value("Client_Get", &json!({}), InvokeOptions::default())
            .await
            .expect_err("failure");
        codes.push(err.code);
    }
    assert_eq!(codes, vec!["NETWORK_ERROR", "TIMEOUT", "UNKNOWN"]);
}

#[tokio::test]
async fn unparseable_responses_are_parse_errors() {
    let transport = ScriptedTransport::new(vec![
        status(200, "OK", "<html>maintenance</html>"),
        ok_json(json!({"Unexpected": "string"})),
        ok_json(json!(["not", "an", "object"])),
    ]);
    let client = client_with(Logger::in_memory("test"), transport, &ClientOptions::default());
    for _ in 0..3 {
        let err = client
            .invoke_value("Client_Get", &json!({}), InvokeOptions::default())
            .await
            .expect_err("parse");
        assert_eq!(err.kind, ClientErrorKind::Parse);
        assert_eq!(err.code, "PARSE_ERROR");
    }
}

#[tokio::test]
async fn alternate_response_key_is_accepted() {
    let transport = ScriptedTransport::new(vec![ok_json(json!({
        "Invoice_GetPdf": {"Header": {}, "Body": {"PdfUri": "https://example.test/inv.pdf"}}
    }))]);
    let client = client_with(Logger::in_memory("test"), transport, &ClientOptions::default());
    let body = client
        .invoke_value("Invoice_GetPDF", &json!({"InvoiceID": 1}), InvokeOptions::default())
        .await
        .expect("alt key");
    assert_eq!(body["PdfUri"], "https://example.test/inv.pdf");
}

#[tokio::test]
async fn test_mode_flag_and_per_call_override() {
    let transport = ScriptedTransport::new(vec![
        ok_json(vendor_body("Client_Create", json!({}))),
        ok_json(vendor_body("Client_Create", json!({}))),
    ]);
    let client = client_with(
        Logger::in_memory("test"),
        transport.clone(),
        &ClientOptions::default().with_test_mode(true),
    );
    assert!(client.is_test_mode());
    client
        .invoke_value("Client_Create", &json!({}), InvokeOptions::default())
        .await
        .expect("ok");
    client
        .invoke_value(
            "Client_Create",
            &json!({}),
            InvokeOptions::default().with_test_mode(Some(false)),
        )
        .await
        .expect("ok");
    let requests = transport.requests();
    assert_eq!(requests[0].body["payload"]["Header"]["TestMode"], true);
    assert!(requests[1].body["payload"]["Header"].get("TestMode").is_none());
}

#[tokio::test]
async fn omit_body_sends_header_only() {
    let transport = ScriptedTransport::new(vec![ok_json(vendor_body(
        "Report_ChartOfAccounts",
        json!({"Nominals": []}),
    ))]);
    let client = client_with(Logger::in_memory("test"), transport.clone(), &ClientOptions::default());
    client
        .invoke_value("Report_ChartOfAccounts", &Value::Null, InvokeOptions::omit_body())
        .await
        .expect("ok");
    let request = transport.last_request();
    assert_eq!(request.url, "https://api.quickfile.co.uk/1_2/report/chartofaccounts");
    let payload = request.body["payload"].as_object().expect("payload");
    assert!(payload.contains_key("Header"));
    assert!(!payload.contains_key("Body"));
}

#[tokio::test]
async fn custom_base_url_is_used() {
    let transport = ScriptedTransport::new(vec![ok_json(vendor_body("Supplier_Get", json!({})))]);
    let client = client_with(
        Logger::in_memory("test"),
        transport.clone(),
        &ClientOptions::default().with_base_url("http://127.0.0.1:8089/"),
    );
    client
        .invoke_value("Supplier_Get", &json!({}), InvokeOptions::default())
        .await
        .expect("ok");
    assert_eq!(transport.last_request().url, "http://127.0.0.1:8089/1_2/supplier/get");
}

#[tokio::test]
async fn debug_logging_redacts_credentials() {
    let _guard = ENV_LOCK.lock().await;
    std::env::set_var("QUICKFILE_DEBUG", "1");

    let logger = Logger::in_memory("test");
    let transport = ScriptedTransport::new(vec![ok_json(vendor_body(
        "System_GetAccountDetails",
        json!({"AccountDetails": {"AccountNumber": ACCOUNT, "CompanyName": "Acme Ltd"}}),
    ))]);
    let client = client_with(logger.clone(), transport.clone(), &ClientOptions::default());
    client
        .invoke_value(
            "System_GetAccountDetails",
            &json!({"AccountNumber": ACCOUNT}),
            InvokeOptions::default(),
        )
        .await
        .expect("ok");

    std::env::remove_var("QUICKFILE_DEBUG");

    let lines = logger.lines();
    let joined = lines.join("\n");
    assert!(
        lines.iter().any(|line| line.contains("POST https://api.quickfile.co.uk/1_2/system/getaccountdetails")),
        "{}",
        joined
    );
    assert!(lines.iter().any(|line| line.contains("response 200")), "{}", joined);
    assert!(joined.contains("[REDACTED]"));
    assert!(joined.contains(APP_ID), "application id stays visible");
    assert!(!joined.contains(ACCOUNT), "{}", joined);
    assert!(!joined.contains(API_KEY), "{}", joined);

    let sent = transport.last_request();
    let hash_value = sent.body["payload"]["Header"]["Authentication"]["MD5Value"]
        .as_str()
        .expect("hash sent");
    assert_eq!(hash_value.len(), 32);
    assert!(!joined.contains(hash_value), "{}", joined);
}

#[tokio::test]
async fn debug_logging_keeps_application_id_intact_for_short_account_ids() {
    let _guard = ENV_LOCK.lock().await;
    std::env::set_var("QUICKFILE_DEBUG", "1");

    let logger = Logger::in_memory("test");
    let transport = ScriptedTransport::new(vec![ok_json(vendor_body(
        "Client_Get",
        json!({"ClientDetails": {"ClientID": 42, "AccountNumber": "4"}}),
    ))]);
    let client = ApiClient::new(
        logger.clone(),
        Credentials::new("4", API_KEY, APP_ID),
        transport,
        &ClientOptions::default(),
    )
    .expect("client");
    client
        .invoke_value("Client_Get", &json!({"ClientID": 42}), InvokeOptions::default())
        .await
        .expect("ok");

    std::env::remove_var("QUICKFILE_DEBUG");

    let joined = logger.lines().join("\n");
    assert!(joined.contains(APP_ID), "{}", joined);
    assert!(joined.contains(r#""ClientID":42"#), "{}", joined);
    assert!(joined.contains(r#""AccNumber":"[REDACTED]""#), "{}", joined);
    assert!(joined.contains(r#""AccountNumber":"[REDACTED]""#), "{}", joined);
    assert!(!joined.contains(API_KEY), "{}", joined);
}

#[tokio::test]
async fn debug_off_logs_no_bodies() {
    let _guard = ENV_LOCK.lock().await;
    std::env::remove_var("QUICKFILE_DEBUG");
    std::env::remove_var("LOG_LEVEL");

    let logger = Logger::in_memory("test");
    let transport = ScriptedTransport::new(vec![ok_json(vendor_body("Client_Get", json!({})))]);
    let client = client_with(logger.clone(), transport, &ClientOptions::default());
    client
        .invoke_value("Client_Get", &json!({}), InvokeOptions::default())
        .await
        .expect("ok");
    assert!(logger.lines().iter().all(|line| !line.contains("POST ")));
}
