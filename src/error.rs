//! Binlog 스트림 리더 에러 타입

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CdcError {
    /// 요청한 위치로 binlog 스트림을 재개할 수 없음 (예: 이미 purge된 로그 파일)
    #[error("재개할 수 없는 위치: {0}")]
    NotResumable(String),

    /// 이벤트 대기 중 연결이 끊어짐
    #[error("전송 에러: {0}")]
    Transport(String),

    /// 허용 목록 설정 오류 - 분류할 수 없는 row 이벤트 타입
    #[error("매핑되지 않은 이벤트 타입 코드: {0}")]
    UnmappedEventType(u8),

    #[error("스트림이 이미 닫혔습니다")]
    StreamClosed,

    #[error("MySQL 연결 에러: {0}")]
    ConnectionError(String),

    #[error("인증 에러: {0}")]
    AuthenticationError(String),

    #[error("Binlog 파싱 에러: {0}")]
    BinlogParseError(String),

    #[error("GTID 처리 에러: {0}")]
    GtidError(String),

    #[error("쿼리 실행 에러: {0}")]
    QueryError(String),

    #[error("설정 에러: {0}")]
    ConfigError(String),

    #[error("프로토콜 에러: {0}")]
    ProtocolError(String),

    #[error("I/O 에러: {0}")]
    IoError(String),

    #[error("직렬화 에러: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl CdcError {
    /// 같은 스트림으로 계속 진행할 수 없는 에러인지 여부.
    /// 호출자는 새 체크포인트에서 스트림을 다시 열어야 합니다.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, CdcError::QueryError(_) | CdcError::ConfigError(_))
    }
}

impl From<io::Error> for CdcError {
    fn from(err: io::Error) -> Self {
        CdcError::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CdcError>;
