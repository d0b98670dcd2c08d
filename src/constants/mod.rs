pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

pub const REFRESH_TOKEN_PREFIX: &str = "refresh_token:";
pub const REVOKED_TOKEN_PREFIX: &str = "revoked_token:";

pub struct Env {
    pub jwt_secret: String,
    pub access_token_expiration: u64,
    pub refresh_token_expiration: u64,
    pub access_token_renew_window: u64,
    pub cookie_secure: bool,
    pub database_url: String,
    pub redis_url: String,
    pub frontend_url: String,
    pub ip: String,
    pub port: u16,
    pub upload_folder: String,
    pub max_content_length: usize,
    pub remote: RemoteEnv,
}

/// Settings for the SFTP backend. Only read when `use_remote_storage` is set.
pub struct RemoteEnv {
    pub use_remote_storage: bool,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub upload_dir: String,
    pub timeout_secs: u64,
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

impl RemoteEnv {
    fn new() -> Self {
        let use_remote_storage = parse_bool(&var_or("USE_REMOTE_STORAGE", "false"));

        let host = var_or("REMOTE_HOST", "");
        let username = var_or("REMOTE_USERNAME", "");
        if use_remote_storage && (host.is_empty() || username.is_empty()) {
            panic!("REMOTE_HOST and REMOTE_USERNAME must be set when USE_REMOTE_STORAGE is enabled");
        }

        let port = var_or("REMOTE_PORT", "22")
            .parse::<u16>()
            .expect("REMOTE_PORT must be a valid u16 integer");
        let timeout_secs = var_or("REMOTE_TIMEOUT_SECS", "10")
            .parse::<u64>()
            .expect("REMOTE_TIMEOUT_SECS must be a valid u64 integer");

        RemoteEnv {
            use_remote_storage,
            host,
            port,
            username,
            password: var_or("REMOTE_PASSWORD", ""),
            upload_dir: var_or("REMOTE_UPLOAD_DIR", "/data/shared_documents/uploads"),
            timeout_secs,
        }
    }
}

impl Env {
    fn new() -> Self {
        let jwt_secret = std::env::var("SECRET_KEY")
            .expect("SECRET_KEY must be set in .env file or environment variable");

        let access_token_expiration = var_or("ACCESS_TOKEN_EXPIRATION", "3600")
            .parse::<u64>()
            .expect("ACCESS_TOKEN_EXPIRATION must be a valid u64 integer");
        let refresh_token_expiration = var_or("REFRESH_TOKEN_EXPIRATION", "604800")
            .parse::<u64>()
            .expect("REFRESH_TOKEN_EXPIRATION must be a valid u64 integer");
        let access_token_renew_window = var_or("ACCESS_TOKEN_RENEW_WINDOW", "1800")
            .parse::<u64>()
            .expect("ACCESS_TOKEN_RENEW_WINDOW must be a valid u64 integer");
        let cookie_secure = parse_bool(&var_or("COOKIE_SECURE", "false"));

        let database_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set in .env file or environment variable");
        let redis_url = std::env::var("REDIS_URL")
            .expect("REDIS_URL must be set in .env file or environment variable");

        let frontend_url = var_or("FRONTEND_URL", "http://localhost:5173");
        let ip = var_or("IP", "127.0.0.1");
        let port = var_or("PORT", "8080").parse::<u16>().expect("PORT must be a valid u16 integer");

        let upload_folder = var_or("UPLOAD_FOLDER", "./uploads");
        let max_content_length = var_or("MAX_CONTENT_LENGTH", "16777216")
            .parse::<usize>()
            .expect("MAX_CONTENT_LENGTH must be a valid usize integer");

        Env {
            jwt_secret,
            access_token_expiration,
            refresh_token_expiration,
            access_token_renew_window,
            cookie_secure,
            database_url,
            redis_url,
            frontend_url,
            ip,
            port,
            upload_folder,
            max_content_length,
            remote: RemoteEnv::new(),
        }
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_accepts_common_spellings() {
        assert!(parse_bool("true"));
        assert!(parse_bool("TRUE"));
        assert!(parse_bool(" 1 "));
        assert!(parse_bool("yes"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("0"));
        assert!(!parse_bool(""));
    }
}
