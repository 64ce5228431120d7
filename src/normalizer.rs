//! 원본 이벤트를 row 단위 `ReplicationEvent`로 펼치기

use crate::classifier::classify;
use crate::error::Result;
use crate::events::{
    DataEvent, MetadataEvent, MetadataPayload, RawEvent, ReplicationEvent, RowsEvent,
};
use crate::position::BinlogPosition;

/// 원본 이벤트 하나를 0개 이상의 정규화 이벤트로 변환
///
/// `position`은 원본 이벤트를 fetch한 직후 소스가 보고한 위치입니다.
/// 같은 row 그룹에서 나온 모든 이벤트는 동일한 위치를 가집니다.
pub fn normalize(event: RawEvent, position: &BinlogPosition) -> Result<Vec<ReplicationEvent>> {
    match event {
        RawEvent::Query(query) => Ok(vec![metadata(MetadataPayload::Query(query), position)]),
        RawEvent::Gtid(gtid) => Ok(vec![metadata(MetadataPayload::Gtid(gtid), position)]),
        RawEvent::Rows(rows) => data_events_from_rows_event(rows, position),
    }
}

fn metadata(event: MetadataPayload, position: &BinlogPosition) -> ReplicationEvent {
    ReplicationEvent::Metadata(MetadataEvent {
        event,
        log_file: position.filename.clone(),
        log_pos: position.position,
    })
}

fn data_events_from_rows_event(
    rows_event: RowsEvent,
    position: &BinlogPosition,
) -> Result<Vec<ReplicationEvent>> {
    // row가 없어도 타입 검사는 먼저
    let message_type = classify(rows_event.type_code)?;
    let RowsEvent {
        schema,
        table,
        rows,
        ..
    } = rows_event;

    Ok(rows
        .into_iter()
        .map(|row| {
            ReplicationEvent::Data(DataEvent {
                schema: schema.clone(),
                table: table.clone(),
                log_pos: position.position,
                log_file: position.filename.clone(),
                row,
                message_type,
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CdcError;
    use crate::events::{CellValue, GtidEventData, MessageType, QueryEventData, RowPayload};

    fn row(id: i32) -> RowPayload {
        RowPayload::Values(vec![CellValue::Int32(id)])
    }

    fn rows_event(type_code: u8, rows: Vec<RowPayload>) -> RawEvent {
        RawEvent::Rows(RowsEvent {
            type_code,
            schema: "s".to_string(),
            table: "t".to_string(),
            rows,
        })
    }

    #[test]
    fn test_query_event_is_stamped() {
        let query = QueryEventData {
            thread_id: 7,
            exec_time: 0,
            database: "s".to_string(),
            query: "BEGIN".to_string(),
        };
        let events = normalize(
            RawEvent::Query(query.clone()),
            &BinlogPosition::new("bin.1", 100),
        )
        .unwrap();

        assert_eq!(
            events,
            vec![ReplicationEvent::Metadata(MetadataEvent {
                event: MetadataPayload::Query(query),
                log_file: "bin.1".to_string(),
                log_pos: 100,
            })]
        );
    }

    #[test]
    fn test_gtid_event_is_stamped() {
        let gtid = GtidEventData {
            gtid: "3e11fa47-71ca-11e1-9e33-c80aa9429562:12".to_string(),
            committed: true,
        };
        let events = normalize(RawEvent::Gtid(gtid), &BinlogPosition::new("bin.2", 4)).unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].log_file(), "bin.2");
        assert_eq!(events[0].log_pos(), 4);
    }

    #[test]
    fn test_rows_expand_in_order_with_shared_position() {
        let events = normalize(
            rows_event(31, vec![row(1), row(2), row(3)]),
            &BinlogPosition::new("bin.1", 150),
        )
        .unwrap();

        assert_eq!(events.len(), 3);
        for (i, event) in events.iter().enumerate() {
            let data = event.as_data().unwrap();
            assert_eq!(data.row, row(i as i32 + 1));
            assert_eq!(data.message_type, MessageType::Update);
            assert_eq!(data.schema, "s");
            assert_eq!(data.table, "t");
            assert_eq!(data.log_file, "bin.1");
            assert_eq!(data.log_pos, 150);
        }
    }

    #[test]
    fn test_zero_rows_expand_to_nothing() {
        let events = normalize(rows_event(32, vec![]), &BinlogPosition::new("bin.1", 9)).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_unmapped_rows_event_fails() {
        let err = normalize(rows_event(23, vec![row(1)]), &BinlogPosition::new("bin.1", 9))
            .unwrap_err();
        assert!(matches!(err, CdcError::UnmappedEventType(23)));

        let err = normalize(rows_event(25, vec![]), &BinlogPosition::new("bin.1", 9)).unwrap_err();
        assert!(matches!(err, CdcError::UnmappedEventType(25)));
    }
}
