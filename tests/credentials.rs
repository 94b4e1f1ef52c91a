mod common;
use common::{tmp_path, write_credentials_file, ACCOUNT, API_KEY, APP_ID, ENV_LOCK};

use quickfile_mcp::errors::ConfigError;
use quickfile_mcp::services::credentials::{validate_format, CredentialStore};

#[test]
fn loads_a_complete_file() {
    let path = common::valid_credentials_file();
    let creds = CredentialStore::new(&path).load().expect("load");
    assert_eq!(creds.account_id(), ACCOUNT);
    assert_eq!(creds.api_key(), API_KEY);
    assert_eq!(creds.application_id(), APP_ID);
    assert!(validate_format(&creds));
}

#[test]
fn account_id_alias_is_accepted() {
    let path = write_credentials_file(&format!(
        r#"{{"accountId":"{}","apiKey":"{}","applicationId":"{}"}}"#,
        ACCOUNT, API_KEY, APP_ID
    ));
    let creds = CredentialStore::new(&path).load().expect("load");
    assert_eq!(creds.account_id(), ACCOUNT);
}

#[test]
fn missing_file_error_names_the_path() {
    let path = tmp_path("quickfile-none").join("credentials.json");
    let err = CredentialStore::new(&path).load().expect_err("missing");
    assert!(matches!(err, ConfigError::NotFound { .. }));
    assert!(err.to_string().contains(&path.display().to_string()));
}

#[test]
fn missing_or_blank_fields_are_named() {
    let path = write_credentials_file(&format!(
        r#"{{"accountNumber":"{}","applicationId":"{}"}}"#,
        ACCOUNT, APP_ID
    ));
    let err = CredentialStore::new(&path).load().expect_err("no api key");
    assert!(matches!(err, ConfigError::MissingField { field: "apiKey" }));

    let path = write_credentials_file(&format!(
        r#"{{"accountNumber":"   ","apiKey":"{}","applicationId":"{}"}}"#,
        API_KEY, APP_ID
    ));
    let err = CredentialStore::new(&path).load().expect_err("blank account");
    assert!(matches!(err, ConfigError::MissingField { field: "accountNumber" }));
}

#[test]
fn invalid_json_is_reported_with_path() {
    let path = write_credentials_file("{ not json");
    let err = CredentialStore::new(&path).load().expect_err("bad json");
    assert!(matches!(err, ConfigError::InvalidJson { .. }));
    assert!(err.to_string().contains(&path.display().to_string()));
}

#[test]
fn badly_formatted_values_load_but_fail_format_check() {
    let path = write_credentials_file(
        r#"{"accountNumber":"ACME","apiKey":"short","applicationId":"not-a-uuid"}"#,
    );
    let creds = CredentialStore::new(&path).load().expect("shape is fine");
    assert!(!validate_format(&creds));
}

#[tokio::test]
async fn path_can_be_overridden_from_env() {
    let _guard = ENV_LOCK.lock().await;
    let path = common::valid_credentials_file();
    std::env::set_var("QUICKFILE_CREDENTIALS_PATH", &path);
    let store = CredentialStore::from_env();
    std::env::remove_var("QUICKFILE_CREDENTIALS_PATH");

    assert_eq!(store.path(), path.as_path());
    assert!(store.load().is_ok());
}

#[tokio::test]
async fn default_path_lives_under_the_home_config_dir() {
    let _guard = ENV_LOCK.lock().await;
    std::env::remove_var("QUICKFILE_CREDENTIALS_PATH");
    let store = CredentialStore::from_env();
    assert!(store
        .path()
        .ends_with(".config/quickfile-mcp/credentials.json"));
}
