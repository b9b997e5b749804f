use jsonwebtoken::Algorithm;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            algorithm: parse_algorithm(
                &std::env::var("JWT_ALGORITHM").unwrap_or_else(|_| "HS256".into()),
            )?,
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(30),
        };
        Ok(Self { database_url, jwt })
    }
}

/// Keys are built from a shared secret, so only the HMAC family is allowed.
fn parse_algorithm(name: &str) -> anyhow::Result<Algorithm> {
    let algorithm = name
        .parse::<Algorithm>()
        .map_err(|_| anyhow::anyhow!("unknown JWT_ALGORITHM {name:?}"))?;
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        other => anyhow::bail!("JWT_ALGORITHM {other:?} is not an HMAC algorithm"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hmac_algorithms() {
        assert_eq!(parse_algorithm("HS256").unwrap(), Algorithm::HS256);
        assert_eq!(parse_algorithm("HS384").unwrap(), Algorithm::HS384);
        assert_eq!(parse_algorithm("HS512").unwrap(), Algorithm::HS512);
    }

    #[test]
    fn rejects_non_hmac_algorithms() {
        assert!(parse_algorithm("RS256").is_err());
        assert!(parse_algorithm("ES256").is_err());
        assert!(parse_algorithm("none").is_err());
    }
}
