//! Binlog 재개 위치 (Position) 및 SourceInfo
//!
//! 파일명 + 바이트 위치 또는 GTID 집합으로 정확한 재시작 지점을 표현합니다.
//! 예: "mysql-bin.000003" 파일의 4097 바이트 위치

use crate::error::{CdcError, Result};
use crate::gtid::GtidSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// MySQL binlog은 4 바이트 매직 헤더 다음부터 이벤트가 시작됨
pub const BINLOG_START_POSITION: u64 = 4;

/// Binlog 파일 위치 정보
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BinlogPosition {
    /// 바이너리 로그 파일명 (e.g., "mysql-bin.000001")
    pub filename: String,
    /// 바이트 위치
    pub position: u64,
}

impl BinlogPosition {
    pub fn new(filename: impl Into<String>, position: u64) -> Self {
        BinlogPosition {
            filename: filename.into(),
            position,
        }
    }

    /// 파일명에서 시퀀스 번호 추출
    pub fn file_sequence(&self) -> Option<u64> {
        self.filename
            .rsplit('.')
            .next()
            .and_then(|s| s.parse().ok())
    }
}

impl fmt::Display for BinlogPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.filename, self.position)
    }
}

impl FromStr for BinlogPosition {
    type Err = CdcError;

    fn from_str(s: &str) -> Result<Self> {
        let (filename, position) = s
            .rsplit_once(':')
            .ok_or_else(|| CdcError::ConfigError(format!("Invalid binlog position: {}", s)))?;
        if filename.is_empty() {
            return Err(CdcError::ConfigError(format!(
                "Missing binlog filename: {}",
                s
            )));
        }
        let position = position
            .parse()
            .map_err(|_| CdcError::ConfigError(format!("Invalid binlog offset: {}", s)))?;
        Ok(BinlogPosition::new(filename, position))
    }
}

/// 스트림 재개 토큰
///
/// 이 값은 호출자가 저장하고, 스트림을 열 때 한 번 소비됩니다.
/// 두 위치의 선후 비교는 소스 서버만 할 수 있으므로 여기서는 하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Position {
    /// 파일 + 오프셋 기반
    Log(BinlogPosition),
    /// GTID auto-position 기반
    Gtid { gtid_set: GtidSet },
}

/// 소스 연결 시 사용하는 재개 파라미터
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResumeParams {
    pub log_file: Option<String>,
    pub log_pos: Option<u64>,
    pub auto_position: Option<GtidSet>,
    pub resume_stream: bool,
}

impl Position {
    pub fn log(filename: impl Into<String>, position: u64) -> Self {
        Position::Log(BinlogPosition::new(filename, position))
    }

    pub fn gtid(gtid_set: GtidSet) -> Self {
        Position::Gtid { gtid_set }
    }

    /// 소스 연결 파라미터로 변환
    pub fn to_replication_params(&self) -> ResumeParams {
        match self {
            Position::Log(pos) => ResumeParams {
                log_file: Some(pos.filename.clone()),
                log_pos: Some(pos.position),
                auto_position: None,
                resume_stream: true,
            },
            Position::Gtid { gtid_set } => ResumeParams {
                auto_position: Some(gtid_set.clone()),
                ..Default::default()
            },
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Log(pos) => write!(f, "{}", pos),
            Position::Gtid { gtid_set } => write!(f, "gtid:{}", gtid_set),
        }
    }
}

/// 현재 처리 상태 정보 (Debezium의 SourceInfo와 유사)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInfo {
    /// 복제 클라이언트 server ID
    pub server_id: u32,
    /// Binlog 파일명
    pub binlog_filename: String,
    /// Binlog 위치
    pub binlog_position: u64,
    /// 마지막으로 본 GTID
    pub gtid: Option<String>,
    /// 지금까지 실행된 GTID 집합 (auto-position 재개 시에만 의미 있음)
    pub gtid_set: GtidSet,
    /// 이벤트 타임스탬프 (초 단위)
    pub ts_sec: u32,
    /// 데이터베이스명
    pub database: Option<String>,
    /// 테이블명
    pub table: Option<String>,
}

impl SourceInfo {
    pub fn new(server_id: u32, binlog_filename: String) -> Self {
        SourceInfo {
            server_id,
            binlog_filename,
            binlog_position: BINLOG_START_POSITION,
            gtid: None,
            gtid_set: GtidSet::new(),
            ts_sec: 0,
            database: None,
            table: None,
        }
    }

    pub fn binlog_position(&self) -> BinlogPosition {
        BinlogPosition::new(self.binlog_filename.clone(), self.binlog_position)
    }

    /// 체크포인트로 저장할 위치. GTID를 선호하고 집합이 비었으면 파일 위치를 사용
    pub fn position(&self, prefer_gtid: bool) -> Position {
        if prefer_gtid && !self.gtid_set.is_empty() {
            Position::gtid(self.gtid_set.clone())
        } else {
            Position::Log(self.binlog_position())
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "server_id": self.server_id,
            "file": self.binlog_filename,
            "pos": self.binlog_position,
            "gtid": self.gtid,
            "gtid_set": self.gtid_set.to_string(),
            "ts_sec": self.ts_sec,
            "db": self.database,
            "table": self.table,
        })
    }
}

impl fmt::Display for SourceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SourceInfo {{ server_id: {}, file: {}, pos: {}, gtid: {:?} }}",
            self.server_id, self.binlog_filename, self.binlog_position, self.gtid
        )
    }
}
