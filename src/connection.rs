//! MySQL 일반 연결 (binlog 상태 조회용)
//!
//! 체크포인트가 없는 호출자가 현재 binlog 끝 위치에서 시작할 때 사용합니다.

use crate::config::ConnectionConfig;
use crate::error::{CdcError, Result};
use crate::gtid::GtidSet;
use crate::position::{BinlogPosition, Position};
use mysql_async::prelude::*;
use mysql_async::{Conn, Opts, Row};
use tracing::debug;

/// MySQL 연결 래퍼
pub struct MySqlConnection {
    conn: Conn,
}

impl MySqlConnection {
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let opts = Opts::from_url(&config.connection_url())
            .map_err(|_| CdcError::ConnectionError("Failed to parse connection string".to_string()))?;

        let conn = Conn::new(opts)
            .await
            .map_err(|e| CdcError::ConnectionError(format!("Failed to connect to MySQL: {}", e)))?;

        Ok(MySqlConnection { conn })
    }

    /// Binlog 상태 조회 (8.4+ 구문을 먼저 시도하고 실패하면 이전 구문 사용)
    pub async fn binlog_status(&mut self) -> Result<BinlogStatus> {
        let rows: Vec<Row> = match self.conn.query("SHOW BINARY LOG STATUS").await {
            Ok(rows) => rows,
            Err(e) => {
                debug!("SHOW BINARY LOG STATUS failed ({}), falling back", e);
                self.conn
                    .query("SHOW MASTER STATUS")
                    .await
                    .map_err(|e| CdcError::QueryError(format!("Failed to query binlog status: {}", e)))?
            }
        };

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| CdcError::QueryError("No binlog status available (is log_bin enabled?)".to_string()))?;

        let file: String = row
            .get_opt(0)
            .and_then(|v| v.ok())
            .ok_or_else(|| CdcError::QueryError("Missing binlog file column".to_string()))?;
        let position: u64 = row
            .get_opt(1)
            .and_then(|v| v.ok())
            .ok_or_else(|| CdcError::QueryError("Missing binlog position column".to_string()))?;
        // Executed_Gtid_Set은 NULL이거나 없을 수 있음
        let executed_gtid_set: Option<String> = row.get_opt(4).and_then(|v| v.ok());

        Ok(BinlogStatus {
            file,
            position,
            executed_gtid_set: GtidSet::parse(executed_gtid_set.as_deref().unwrap_or_default())?,
        })
    }

    /// GTID 모드 활성 여부 확인
    pub async fn is_gtid_mode_enabled(&mut self) -> Result<bool> {
        let result: Vec<(String, String)> = self
            .conn
            .query("SHOW GLOBAL VARIABLES LIKE 'GTID_MODE'")
            .await
            .map_err(|e| CdcError::QueryError(format!("Failed to query GTID mode: {}", e)))?;

        Ok(result.first().map(|(_, v)| v == "ON").unwrap_or(false))
    }

    /// 현재 binlog 끝 위치. GTID 모드면 실행된 GTID 집합을 사용
    pub async fn current_position(&mut self) -> Result<Position> {
        let gtid_enabled = self.is_gtid_mode_enabled().await?;
        let status = self.binlog_status().await?;

        if gtid_enabled && !status.executed_gtid_set.is_empty() {
            Ok(Position::gtid(status.executed_gtid_set))
        } else {
            Ok(Position::Log(status.binlog_position()))
        }
    }

    pub async fn close(self) -> Result<()> {
        self.conn
            .disconnect()
            .await
            .map_err(|e| CdcError::ConnectionError(format!("Failed to disconnect: {}", e)))
    }
}

/// Binlog 상태
#[derive(Debug, Clone)]
pub struct BinlogStatus {
    pub file: String,
    pub position: u64,
    pub executed_gtid_set: GtidSet,
}

impl BinlogStatus {
    pub fn binlog_position(&self) -> BinlogPosition {
        BinlogPosition::new(self.file.clone(), self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binlog_status_position() {
        let status = BinlogStatus {
            file: "mysql-bin.000009".to_string(),
            position: 157,
            executed_gtid_set: GtidSet::new(),
        };
        assert_eq!(status.binlog_position(), BinlogPosition::new("mysql-bin.000009", 157));
    }

    #[tokio::test]
    #[ignore] // 실제 MySQL 연결 필요
    async fn test_current_position_live() -> Result<()> {
        let config = ConnectionConfig::from_env()?;
        let mut conn = MySqlConnection::connect(&config).await?;
        let position = conn.current_position().await?;
        assert!(!position.to_string().is_empty());
        conn.close().await
    }
}
