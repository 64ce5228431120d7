//! MySQL Binlog 이벤트 타입 및 데이터 구조 정의
//!
//! - `RawEvent`: 소스가 넘겨주는 원본 이벤트 (메타데이터 또는 row 그룹)
//! - `ReplicationEvent`: 호출자에게 전달되는 정규화된 이벤트 (row 하나당 하나)

use crate::position::{BinlogPosition, Position};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// MySQL Binlog 이벤트 타입 (wire-level 코드)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventType {
    /// 알 수 없는 이벤트
    Unknown = 0,
    /// 쿼리 이벤트 (BEGIN, DDL 등)
    QueryEvent = 2,
    /// 로테이션 이벤트 (새 binlog 파일)
    RotateEvent = 4,
    /// Format description 이벤트
    FormatDescriptionEvent = 15,
    /// XID 이벤트 (트랜잭션 커밋)
    XidEvent = 16,
    /// 테이블 맵 이벤트 (스키마 정보)
    TableMapEvent = 19,
    /// WRITE_ROWS v1
    WriteRowsEventV1 = 23,
    /// UPDATE_ROWS v1
    UpdateRowsEventV1 = 24,
    /// DELETE_ROWS v1
    DeleteRowsEventV1 = 25,
    /// 하트비트 (replication 연결 유지용)
    HeartbeatEvent = 27,
    /// WRITE_ROWS v2 (INSERT)
    WriteRowsEventV2 = 30,
    /// UPDATE_ROWS v2 (UPDATE)
    UpdateRowsEventV2 = 31,
    /// DELETE_ROWS v2 (DELETE)
    DeleteRowsEventV2 = 32,
    /// GTID 이벤트 (Global Transaction ID)
    GtidEvent = 33,
    /// 익명 GTID 이벤트
    AnonymousGtidEvent = 34,
    /// 이전 GTID 집합
    PreviousGtidsEvent = 35,
    /// Rows Query 이벤트 (원본 쿼리)
    RowsQueryEvent = 29,
}

impl EventType {
    pub fn from_u8(val: u8) -> Self {
        match val {
            2 => EventType::QueryEvent,
            4 => EventType::RotateEvent,
            15 => EventType::FormatDescriptionEvent,
            16 => EventType::XidEvent,
            19 => EventType::TableMapEvent,
            23 => EventType::WriteRowsEventV1,
            24 => EventType::UpdateRowsEventV1,
            25 => EventType::DeleteRowsEventV1,
            27 => EventType::HeartbeatEvent,
            29 => EventType::RowsQueryEvent,
            30 => EventType::WriteRowsEventV2,
            31 => EventType::UpdateRowsEventV2,
            32 => EventType::DeleteRowsEventV2,
            33 => EventType::GtidEvent,
            34 => EventType::AnonymousGtidEvent,
            35 => EventType::PreviousGtidsEvent,
            _ => EventType::Unknown,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn is_rows_event(self) -> bool {
        matches!(
            self,
            EventType::WriteRowsEventV1
                | EventType::UpdateRowsEventV1
                | EventType::DeleteRowsEventV1
                | EventType::WriteRowsEventV2
                | EventType::UpdateRowsEventV2
                | EventType::DeleteRowsEventV2
        )
    }

    pub fn is_update_rows(self) -> bool {
        matches!(
            self,
            EventType::UpdateRowsEventV1 | EventType::UpdateRowsEventV2
        )
    }
}

/// Binlog 이벤트 헤더
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventHeader {
    /// 이벤트 타임스탬프 (초 단위)
    pub timestamp: u32,
    /// 원본 이벤트 타입 코드
    pub type_code: u8,
    /// MySQL 서버 ID
    pub server_id: u32,
    /// 이벤트 길이 (바이트)
    pub event_length: u32,
    /// 다음 이벤트 위치
    pub next_pos: u32,
    /// 이벤트 플래그
    pub flags: u16,
}

impl EventHeader {
    pub fn event_type(&self) -> EventType {
        EventType::from_u8(self.type_code)
    }
}

/// 테이블 맵 정보 (컬럼 메타데이터)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableMapData {
    /// 테이블 ID
    pub table_id: u64,
    /// 데이터베이스명
    pub database: String,
    /// 테이블명
    pub table: String,
    /// 컬럼 타입들
    pub column_types: Vec<u8>,
    /// 컬럼별 메타데이터 (타입에 따라 0~2 바이트)
    pub column_meta: Vec<u16>,
    /// nullable 비트맵
    pub nullable_bitmap: Vec<u8>,
    /// 컬럼별 UNSIGNED 여부 (SIGNEDNESS 메타데이터가 없으면 모두 false)
    #[serde(default)]
    pub unsigned_columns: Vec<bool>,
}

/// 셀 값 (다양한 MySQL 타입 지원)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Null,
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float(f32),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    DateTime(DateTime<Utc>),
    Date(String),
    Time(String),
    Decimal(String),
}

/// row 하나의 원본 페이로드 (컬럼 순서대로)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowPayload {
    /// INSERT / DELETE 행
    Values(Vec<CellValue>),
    /// UPDATE 행 (변경 전후)
    Update {
        before: Vec<CellValue>,
        after: Vec<CellValue>,
    },
}

/// GTID 이벤트 데이터
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GtidEventData {
    /// GTID 문자열 (format: uuid:sequence-number)
    pub gtid: String,
    /// commit 플래그
    pub committed: bool,
}

/// 쿼리 이벤트 데이터
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryEventData {
    /// 스레드 ID
    pub thread_id: u32,
    /// 실행 시간 (초)
    pub exec_time: u32,
    /// 데이터베이스명
    pub database: String,
    /// 쿼리 문자열
    pub query: String,
}

/// 회전 이벤트 데이터
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotateEventData {
    /// 새 바이너리 로그 파일명
    pub next_binlog_name: String,
    /// 새 파일의 시작 위치
    pub position: u64,
}

/// 여러 row 변경을 담은 row 그룹 이벤트
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowsEvent {
    /// wire-level 타입 코드 (30/31/32 = v2 write/update/delete)
    pub type_code: u8,
    pub schema: String,
    pub table: String,
    pub rows: Vec<RowPayload>,
}

/// 소스가 생성하는 원본 이벤트
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawEvent {
    Query(QueryEventData),
    Gtid(GtidEventData),
    Rows(RowsEvent),
}

/// 메타데이터 이벤트 본문
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetadataPayload {
    Query(QueryEventData),
    Gtid(GtidEventData),
}

/// 메타데이터 이벤트 + fetch 시점의 로그 위치
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEvent {
    pub event: MetadataPayload,
    pub log_file: String,
    pub log_pos: u64,
}

/// 변경 메시지 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Create,
    Update,
    Delete,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Create => "create",
            MessageType::Update => "update",
            MessageType::Delete => "delete",
        }
    }
}

/// row 하나에 대한 변경 이벤트
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataEvent {
    pub schema: String,
    pub table: String,
    pub log_pos: u64,
    pub log_file: String,
    pub row: RowPayload,
    pub message_type: MessageType,
}

/// 호출자에게 전달되는 정규화된 이벤트
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplicationEvent {
    Metadata(MetadataEvent),
    Data(DataEvent),
}

impl ReplicationEvent {
    pub fn log_file(&self) -> &str {
        match self {
            ReplicationEvent::Metadata(e) => &e.log_file,
            ReplicationEvent::Data(e) => &e.log_file,
        }
    }

    pub fn log_pos(&self) -> u64 {
        match self {
            ReplicationEvent::Metadata(e) => e.log_pos,
            ReplicationEvent::Data(e) => e.log_pos,
        }
    }

    /// 이 이벤트를 처리한 뒤 저장할 체크포인트 위치
    pub fn position(&self) -> Position {
        Position::Log(BinlogPosition::new(self.log_file(), self.log_pos()))
    }

    pub fn as_data(&self) -> Option<&DataEvent> {
        match self {
            ReplicationEvent::Data(e) => Some(e),
            ReplicationEvent::Metadata(_) => None,
        }
    }
}

/// 소스에서 가져온 원본 이벤트와 fetch 직후 소스가 보고한 로그 위치
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedEvent {
    pub event: RawEvent,
    pub position: BinlogPosition,
}

impl FetchedEvent {
    pub fn new(event: RawEvent, position: BinlogPosition) -> Self {
        FetchedEvent { event, position }
    }
}
