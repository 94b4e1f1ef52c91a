pub mod api {
    pub const BASE_URL: &str = "https://api.quickfile.co.uk";
    pub const VERSION: &str = "1_2";
    pub const TIMEOUT_MS: u64 = 30_000;
    pub const MESSAGE_TYPE: &str = "Request";
    pub const VENDOR_NAME: &str = "QuickFile";
}

pub mod env {
    pub const CREDENTIALS_PATH: &str = "QUICKFILE_CREDENTIALS_PATH";
    pub const DEBUG: &str = "QUICKFILE_DEBUG";
    pub const TIMEOUT_MS: &str = "QUICKFILE_TIMEOUT_MS";
    pub const TEST_MODE: &str = "QUICKFILE_TEST_MODE";
    pub const BASE_URL: &str = "QUICKFILE_API_BASE_URL";
    pub const LOG_LEVEL: &str = "LOG_LEVEL";
}

pub mod credentials {
    pub const DEFAULT_PATH: &str = "~/.config/quickfile-mcp/credentials.json";
    pub const MIN_API_KEY_LEN: usize = 10;
}

pub mod limits {
    pub const SUBMISSION_COUNTER_MODULUS: u32 = 10_000;
    pub const LOG_BODY_MAX_BYTES: usize = 8 * 1024;
    pub const DEFAULT_RETURN_COUNT: u64 = 25;
    pub const MAX_RETURN_COUNT: u64 = 200;
}

pub mod redaction {
    pub const PLACEHOLDER: &str = "[REDACTED]";
}

pub mod protocols {
    pub const ALLOWED_HTTP: &[&str] = &["http", "https"];
}
