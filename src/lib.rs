//! 재개 가능한 MySQL Binlog 스트림 리더
//!
//! MySQL 바이너리 로그를 replica로서 읽고, 각 이벤트를 로그 좌표가 붙은
//! 메타데이터/데이터 이벤트로 정규화합니다.
//! 주요 기능:
//! - Binlog 프로토콜 파싱 및 row 이미지 디코딩
//! - 파일 위치 / GTID 기반 재개
//! - 소비하지 않고 다음 이벤트 확인 (peek) 및 순서 보장 pop

pub mod auth;
pub mod binlog;
pub mod binlog_client;
pub mod classifier;
pub mod config;
pub mod connection;
pub mod error;
pub mod events;
pub mod gtid;
pub mod normalizer;
pub mod position;
pub mod protocol;
pub mod row_decoder;
pub mod source;
pub mod stream_reader;

pub use binlog_client::{MySqlBinlogSource, MySqlConnector, StreamHandle};
pub use config::ConnectionConfig;
pub use connection::MySqlConnection;
pub use error::{CdcError, Result};
pub use events::{DataEvent, EventType, MessageType, MetadataEvent, ReplicationEvent};
pub use gtid::GtidSet;
pub use position::{BinlogPosition, Position, SourceInfo};
pub use stream_reader::BinlogStreamReaderWrapper;
