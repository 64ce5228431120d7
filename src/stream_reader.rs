//! 재개 가능한 binlog 스트림 래퍼
//!
//! 원본 이벤트 소스를 감싸서 다음을 제공합니다:
//! - 저장된 위치에서 스트림 재개
//! - 다음 이벤트를 소비하지 않고 확인 (`peek`)
//! - 다음 이벤트를 꺼내고 진행 (`pop`)
//!
//! 내부 버퍼는 비었을 때만 원본 이벤트 하나를 가져와 채우므로
//! 이벤트는 항상 binlog 순서대로 전달됩니다.

use crate::binlog_client::{MySqlBinlogSource, MySqlConnector};
use crate::config::ConnectionConfig;
use crate::error::{CdcError, Result};
use crate::events::{EventType, ReplicationEvent};
use crate::normalizer::normalize;
use crate::position::Position;
use crate::source::{RawEventSource, SourceConnector, StreamSettings};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// 소스에 요청하는 이벤트 종류: 트랜잭션 경계 메타데이터 + v2 row 이벤트
pub const ALLOWED_EVENT_TYPES: [EventType; 5] = [
    EventType::GtidEvent,
    EventType::QueryEvent,
    EventType::WriteRowsEventV2,
    EventType::UpdateRowsEventV2,
    EventType::DeleteRowsEventV2,
];

/// 래퍼 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Ready,
    Closed,
    Failed,
}

/// peek/pop 가능한 binlog 이벤트 스트림
///
/// 호출자 하나가 순서대로 사용하는 것을 전제로 합니다.
pub struct BinlogStreamReaderWrapper<S> {
    stream: S,
    current_events: VecDeque<ReplicationEvent>,
    state: StreamState,
}

impl BinlogStreamReaderWrapper<MySqlBinlogSource> {
    /// MySQL 서버에 연결하여 `position`에서 스트림을 재개
    pub async fn open(config: &ConnectionConfig, position: &Position) -> Result<Self> {
        Self::new(&MySqlConnector, config, position).await
    }
}

impl<S: RawEventSource> BinlogStreamReaderWrapper<S> {
    pub async fn new<C>(connector: &C, config: &ConnectionConfig, position: &Position) -> Result<Self>
    where
        C: SourceConnector<Source = S>,
    {
        let settings = stream_settings(config, position);

        info!("Opening binlog stream at {}", position);
        let stream = connector.connect(settings).await.map_err(|e| {
            warn!("Failed to open binlog stream at {}: {}", position, e);
            e
        })?;

        Ok(Self::from_source(stream))
    }

    /// 이미 열린 소스로 래퍼 생성
    pub fn from_source(stream: S) -> Self {
        BinlogStreamReaderWrapper {
            stream,
            current_events: VecDeque::new(),
            state: StreamState::Ready,
        }
    }

    pub fn source(&self) -> &S {
        &self.stream
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// 다음 이벤트를 소비하지 않고 반환. 연속 호출은 같은 이벤트를 반환합니다.
    pub async fn peek(&mut self) -> Result<&ReplicationEvent> {
        self.refill_current_events_if_empty().await?;
        self.current_events.front().ok_or(CdcError::StreamClosed)
    }

    /// 다음 이벤트를 꺼내서 반환. 꺼낸 이벤트는 다시 볼 수 없습니다.
    pub async fn pop(&mut self) -> Result<ReplicationEvent> {
        self.refill_current_events_if_empty().await?;
        self.current_events.pop_front().ok_or(CdcError::StreamClosed)
    }

    /// 버퍼에 남은 이벤트를 버리고 소스 연결을 닫음
    pub async fn close(&mut self) -> Result<()> {
        if self.state == StreamState::Closed {
            return Ok(());
        }
        self.current_events.clear();
        self.state = StreamState::Closed;
        self.stream.close().await
    }

    async fn refill_current_events_if_empty(&mut self) -> Result<()> {
        while self.current_events.is_empty() {
            if self.state != StreamState::Ready {
                return Err(CdcError::StreamClosed);
            }

            let events = match self.fetch_and_normalize().await {
                Ok(events) => events,
                Err(e) => {
                    self.state = StreamState::Failed;
                    return Err(e);
                }
            };

            if events.is_empty() {
                // row가 하나도 없는 row 이벤트: 다음 원본 이벤트로 넘어감
                debug!("Raw event expanded to no rows, fetching the next one");
                continue;
            }
            self.current_events.extend(events);
        }
        Ok(())
    }

    async fn fetch_and_normalize(&mut self) -> Result<Vec<ReplicationEvent>> {
        let fetched = self.stream.fetch_one().await?;
        debug!("Fetched raw event at {}", fetched.position);
        normalize(fetched.event, &fetched.position)
    }
}

fn stream_settings(config: &ConnectionConfig, position: &Position) -> StreamSettings {
    StreamSettings {
        connection: config.connection_settings(),
        server_id: config.server_id,
        blocking: true,
        only_events: ALLOWED_EVENT_TYPES.to_vec(),
        resume: position.to_replication_params(),
        connect_timeout: config.timeout,
    }
}
