//! 원본 이벤트 소스 계약
//!
//! 스트림 래퍼는 이 트레이트를 통해서만 binlog 연결을 사용합니다.
//! 실제 MySQL 구현은 `binlog_client` 모듈에 있습니다.

use crate::error::Result;
use crate::events::{EventType, FetchedEvent};
use crate::position::ResumeParams;
use std::future::Future;
use std::time::Duration;

/// 소스 연결 정보
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub passwd: String,
}

/// 소스를 열 때 필요한 모든 파라미터
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSettings {
    pub connection: ConnectionSettings,
    /// 복제 클라이언트 server ID (다른 replica와 겹치지 않아야 함)
    pub server_id: u32,
    /// true면 다음 이벤트가 생길 때까지 대기
    pub blocking: bool,
    /// 이 목록에 있는 이벤트만 반환
    pub only_events: Vec<EventType>,
    pub resume: ResumeParams,
    pub connect_timeout: Duration,
}

impl StreamSettings {
    pub fn allows(&self, event_type: EventType) -> bool {
        self.only_events.contains(&event_type)
    }
}

/// 허용된 원본 이벤트를 로그 순서대로 하나씩 반환하는 소스
pub trait RawEventSource {
    /// 다음 허용 이벤트와, 그 이벤트를 읽은 직후의 로그 위치를 반환.
    /// 연결이 끊어지거나 외부에서 닫히면 `CdcError::Transport`로 실패합니다.
    fn fetch_one(&mut self) -> impl Future<Output = Result<FetchedEvent>> + Send;

    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// `StreamSettings`로 소스를 여는 커넥터.
/// 재개 위치로 이동할 수 없으면 `CdcError::NotResumable`을 반환해야 합니다.
pub trait SourceConnector {
    type Source: RawEventSource;

    fn connect(
        &self,
        settings: StreamSettings,
    ) -> impl Future<Output = Result<Self::Source>> + Send;
}
