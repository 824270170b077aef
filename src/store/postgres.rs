use crate::error::Result;
use crate::store::traits::ConnectionVerifier;
use anyhow::Context;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection;
use std::str::FromStr;

/// Live connection verifier backed by the Postgres driver. Makes exactly
/// one connection attempt and closes it again; credentials override
/// whatever the URL carries.
#[derive(Debug, Default)]
pub struct PostgresConnectionVerifier;

impl PostgresConnectionVerifier {
    pub fn new() -> Self {
        Self
    }
}

/// Schema URLs arrive in JDBC form; the driver wants the bare scheme.
fn driver_url(jdbc_url: &str) -> &str {
    jdbc_url.strip_prefix("jdbc:").unwrap_or(jdbc_url)
}

#[async_trait::async_trait]
impl ConnectionVerifier for PostgresConnectionVerifier {
    async fn try_connect(&self, jdbc_url: &str, username: &str, password: &str) -> Result<()> {
        let options = PgConnectOptions::from_str(driver_url(jdbc_url))
            .with_context(|| format!("invalid connection url: {}", jdbc_url))?
            .username(username)
            .password(password);

        let connection = PgConnection::connect_with(&options)
            .await
            .context("connection attempt failed")?;
        connection.close().await.ok();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_jdbc_prefix_only() {
        assert_eq!(
            driver_url("jdbc:postgresql://db.example.com:5432/s1"),
            "postgresql://db.example.com:5432/s1"
        );
        assert_eq!(
            driver_url("postgresql://db.example.com:5432/s1"),
            "postgresql://db.example.com:5432/s1"
        );
    }
}
