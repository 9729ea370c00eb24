use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    pub host: IpAddr,
    pub port: u16,
    pub password: PasswordConfig,
    pub reset_reap_interval_secs: u64,
    pub max_body_size: usize,
    pub environment: String,
    pub log_level: String,
    pub smtp: Option<SmtpConfig>,
}

/// Argon2id work factor.
#[derive(Debug, Clone, Copy)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let jwt_secret = env_required("JWT_SECRET")?;
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let token_ttl_minutes = parse_token_ttl(&env_or("REELGATE_TOKEN_TTL_MINUTES", "60"))?;

        let host: IpAddr = env_or("REELGATE_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid REELGATE_HOST: {e}"))?;

        let port: u16 = env_parse("REELGATE_PORT", "3000")?;

        let defaults = PasswordConfig::default();
        let password = PasswordConfig {
            memory_kib: env_parse("REELGATE_ARGON2_MEMORY_KIB", &defaults.memory_kib.to_string())?,
            iterations: env_parse("REELGATE_ARGON2_ITERATIONS", &defaults.iterations.to_string())?,
            parallelism: env_parse(
                "REELGATE_ARGON2_PARALLELISM",
                &defaults.parallelism.to_string(),
            )?,
        };

        let reset_reap_interval_secs: u64 = env_parse("REELGATE_RESET_REAP_INTERVAL_SECS", "0")?;
        let max_body_size: usize = env_parse("REELGATE_MAX_BODY_SIZE", "65536")?;

        let environment = env_or("REELGATE_ENV", "development");
        let log_level = env_or("REELGATE_LOG_LEVEL", "info");

        let smtp = match (
            std::env::var("REELGATE_SMTP_HOST").ok(),
            std::env::var("REELGATE_SMTP_PORT").ok(),
            std::env::var("REELGATE_SMTP_USER").ok(),
            std::env::var("REELGATE_SMTP_PASS").ok(),
            std::env::var("REELGATE_SMTP_FROM").ok(),
        ) {
            (Some(host), Some(port), Some(user), Some(pass), Some(from)) => Some(SmtpConfig {
                host,
                port: port
                    .parse()
                    .map_err(|e| format!("Invalid REELGATE_SMTP_PORT: {e}"))?,
                user,
                pass,
                from,
            }),
            _ => None,
        };

        Ok(Config {
            database_url,
            jwt_secret,
            token_ttl_minutes,
            host,
            port,
            password,
            reset_reap_interval_secs,
            max_body_size,
            environment,
            log_level,
            smtp,
        })
    }
}

/// Upper bound for the configured token lifetime, roughly a century.
pub const MAX_TOKEN_TTL_MINUTES: i64 = 60 * 24 * 366 * 100;

fn parse_token_ttl(raw: &str) -> Result<i64, String> {
    let minutes: i64 = raw
        .trim()
        .parse()
        .map_err(|e| format!("Invalid REELGATE_TOKEN_TTL_MINUTES: {e}"))?;
    if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&minutes) {
        return Err(format!(
            "Invalid REELGATE_TOKEN_TTL_MINUTES: must be between 1 and {MAX_TOKEN_TTL_MINUTES}, got {minutes}"
        ));
    }
    Ok(minutes)
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T>(key: &str, default: &str) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    env_or(key, default)
        .parse()
        .map_err(|e| format!("Invalid {key}: {e}"))
}
