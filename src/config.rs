//! 소스 데이터베이스 설정

use crate::error::{CdcError, Result};
use crate::source::ConnectionSettings;
use serde::Deserialize;
use std::env;
use std::time::Duration;

/// MySQL 연결 설정
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub hostname: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: Option<String>,
    /// 복제 클라이언트 server ID
    pub server_id: u32,
    /// 연결 타임아웃 (이벤트 대기에는 적용되지 않음)
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            hostname: "localhost".to_string(),
            port: 3306,
            username: "root".to_string(),
            password: String::new(),
            database: None,
            server_id: 1,
            timeout: Duration::from_secs(30),
        }
    }
}

impl ConnectionConfig {
    pub fn new(hostname: impl Into<String>, username: impl Into<String>) -> Self {
        ConnectionConfig {
            hostname: hostname.into(),
            username: username.into(),
            ..Default::default()
        }
    }

    /// 환경 변수에서 설정 로드 (없는 값은 기본값 사용)
    ///
    /// DB_HOST, DB_PORT, DB_USER, DB_PASSWORD, DB_NAME, DB_SERVER_ID
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ConnectionConfig::default();

        let port = match lookup("DB_PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| CdcError::ConfigError(format!("Invalid DB_PORT: {}", raw)))?,
            None => defaults.port,
        };
        let server_id = match lookup("DB_SERVER_ID") {
            Some(raw) => raw
                .parse()
                .map_err(|_| CdcError::ConfigError(format!("Invalid DB_SERVER_ID: {}", raw)))?,
            None => defaults.server_id,
        };

        Ok(ConnectionConfig {
            hostname: lookup("DB_HOST").unwrap_or(defaults.hostname),
            port,
            username: lookup("DB_USER").unwrap_or(defaults.username),
            password: lookup("DB_PASSWORD").unwrap_or(defaults.password),
            database: lookup("DB_NAME").filter(|db| !db.is_empty()),
            server_id,
            timeout: defaults.timeout,
        })
    }

    /// 원본 이벤트 소스에 넘길 연결 파라미터
    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            host: self.hostname.clone(),
            port: self.port,
            user: self.username.clone(),
            passwd: self.password.clone(),
        }
    }

    /// mysql_async 용 연결 URL
    pub fn connection_url(&self) -> String {
        match self.database {
            Some(ref db) => format!(
                "mysql://{}:{}@{}:{}/{}",
                self.username, self.password, self.hostname, self.port, db
            ),
            None => format!(
                "mysql://{}:{}@{}:{}",
                self.username, self.password, self.hostname, self.port
            ),
        }
    }
}

/// 소스 데이터베이스 목록. 스트림 리더는 첫 번째 항목만 사용합니다.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceDatabaseConfig {
    pub entries: Vec<ConnectionConfig>,
}

impl SourceDatabaseConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn primary(&self) -> Result<&ConnectionConfig> {
        self.entries
            .first()
            .ok_or_else(|| CdcError::ConfigError("No source database configured".to_string()))
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_connection_config_default() {
        let config = ConnectionConfig::default();
        assert_eq!(config.hostname, "localhost");
        assert_eq!(config.port, 3306);
        assert_eq!(config.server_id, 1);
    }

    #[test]
    fn test_connection_config_new() {
        let config = ConnectionConfig::new("127.0.0.1", "root");
        assert_eq!(config.hostname, "127.0.0.1");
        assert_eq!(config.username, "root");
        assert_eq!(config.connection_url(), "mysql://root:@127.0.0.1:3306");
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("DB_HOST", "replica-0"),
            ("DB_PORT", "3307"),
            ("DB_USER", "repl"),
            ("DB_PASSWORD", "secret"),
            ("DB_NAME", "yelp"),
        ]
        .into_iter()
        .collect();

        let config = ConnectionConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.port, 3307);
        assert_eq!(config.database.as_deref(), Some("yelp"));

        let settings = config.connection_settings();
        assert_eq!(settings.host, "replica-0");
        assert_eq!(settings.user, "repl");
        assert_eq!(settings.passwd, "secret");
    }

    #[test]
    fn test_from_lookup_rejects_bad_port() {
        let result = ConnectionConfig::from_lookup(|k| (k == "DB_PORT").then(|| "abc".to_string()));
        assert!(matches!(result, Err(CdcError::ConfigError(_))));
    }

    #[test]
    fn test_source_database_config_primary() {
        let raw = r#"{"entries": [{"hostname": "10.0.0.5", "port": 3306, "username": "repl", "password": "pw", "timeout": 5}, {"hostname": "10.0.0.6"}]}"#;
        let config = SourceDatabaseConfig::from_json_str(raw).unwrap();
        let primary = config.primary().unwrap();
        assert_eq!(primary.hostname, "10.0.0.5");
        assert_eq!(primary.timeout, Duration::from_secs(5));
        assert_eq!(config.entries[1].port, 3306);

        assert!(SourceDatabaseConfig::default().primary().is_err());
    }
}
