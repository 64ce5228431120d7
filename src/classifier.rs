//! row 이벤트 타입 코드 → 변경 메시지 종류 매핑

use crate::error::{CdcError, Result};
use crate::events::{EventType, MessageType};

/// v2 row 이벤트 코드만 인식합니다. 그 외 코드는 허용 목록 설정 오류이므로 즉시 실패합니다.
pub fn classify(type_code: u8) -> Result<MessageType> {
    match EventType::from_u8(type_code) {
        EventType::WriteRowsEventV2 => Ok(MessageType::Create),
        EventType::UpdateRowsEventV2 => Ok(MessageType::Update),
        EventType::DeleteRowsEventV2 => Ok(MessageType::Delete),
        _ => Err(CdcError::UnmappedEventType(type_code)),
    }
}
