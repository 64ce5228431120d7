//! MySQL Binlog 이벤트 파싱
//!
//! 각 이벤트:
//!   - Timestamp (4 bytes)
//!   - Type (1 byte)
//!   - Server ID (4 bytes)
//!   - Event Length (4 bytes)
//!   - Next Position (4 bytes)
//!   - Flags (2 bytes)
//!   - Event Data (variable)
//!
//! 체크섬은 연결 시 NONE으로 설정하므로 이벤트 끝에 CRC32가 없다고 가정합니다.

use crate::error::{CdcError, Result};
use crate::events::*;
use crate::row_decoder::{decode_row, read_column_meta, read_signedness};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};
use uuid::Uuid;

pub const EVENT_HEADER_SIZE: usize = 19;

/// TABLE_MAP / ROWS 이벤트의 post-header 길이 (table id 6 + flags 2)
const ROWS_POST_HEADER_SIZE: usize = 8;

/// TABLE_MAP optional metadata 필드 타입
const METADATA_SIGNEDNESS: u8 = 1;

/// Binlog 이벤트 파서
pub struct BinlogParser;

impl BinlogParser {
    /// 이벤트 헤더 파싱. 헤더와 본문(헤더 이후 바이트)을 반환
    pub fn parse_header(data: &[u8]) -> Result<(EventHeader, &[u8])> {
        if data.len() < EVENT_HEADER_SIZE {
            return Err(CdcError::BinlogParseError(
                "Invalid event header: too short".to_string(),
            ));
        }

        let mut cursor = Cursor::new(data);

        let timestamp = cursor.read_u32::<LittleEndian>()?;
        let type_code = cursor.read_u8()?;
        let server_id = cursor.read_u32::<LittleEndian>()?;
        let event_length = cursor.read_u32::<LittleEndian>()?;
        let next_pos = cursor.read_u32::<LittleEndian>()?;
        let flags = cursor.read_u16::<LittleEndian>()?;

        let header = EventHeader {
            timestamp,
            type_code,
            server_id,
            event_length,
            next_pos,
            flags,
        };

        // event_length는 헤더 포함 길이
        let end = (event_length as usize).clamp(EVENT_HEADER_SIZE, data.len());
        Ok((header, &data[EVENT_HEADER_SIZE..end]))
    }

    /// 테이블 맵 이벤트 파싱 (19)
    pub fn parse_table_map_event(data: &[u8]) -> Result<TableMapData> {
        if data.len() < ROWS_POST_HEADER_SIZE {
            return Err(CdcError::BinlogParseError(
                "Invalid table map event".to_string(),
            ));
        }

        let mut cursor = Cursor::new(data);

        let table_id = cursor.read_u48::<LittleEndian>()?;
        let _flags = cursor.read_u16::<LittleEndian>()?;

        let database = read_length_prefixed_name(&mut cursor)?;
        let table = read_length_prefixed_name(&mut cursor)?;

        let column_count = read_lcb(&mut cursor)? as usize;
        let mut column_types = vec![0u8; column_count];
        cursor.read_exact(&mut column_types)?;

        let metadata_length = read_lcb(&mut cursor)? as usize;
        let metadata_start = cursor.position() as usize;
        let metadata_end = metadata_start + metadata_length;
        if metadata_end > data.len() {
            return Err(CdcError::BinlogParseError(format!(
                "Table map metadata for {}.{} is truncated",
                database, table
            )));
        }

        let mut metadata_cursor = Cursor::new(&data[metadata_start..metadata_end]);
        let column_meta = column_types
            .iter()
            .map(|&column_type| read_column_meta(&mut metadata_cursor, column_type))
            .collect::<Result<Vec<u16>>>()?;
        cursor.set_position(metadata_end as u64);

        let mut nullable_bitmap = vec![0u8; (column_count + 7) / 8];
        cursor.read_exact(&mut nullable_bitmap)?;

        let unsigned_columns = read_unsigned_columns(&mut cursor, &column_types)?;

        Ok(TableMapData {
            table_id,
            database,
            table,
            column_types,
            column_meta,
            nullable_bitmap,
            unsigned_columns,
        })
    }

    /// row 이벤트가 참조하는 table id
    pub fn rows_event_table_id(data: &[u8]) -> Result<u64> {
        if data.len() < ROWS_POST_HEADER_SIZE {
            return Err(CdcError::BinlogParseError(
                "Invalid rows event".to_string(),
            ));
        }
        Ok(Cursor::new(data).read_u48::<LittleEndian>()?)
    }

    /// WRITE/UPDATE/DELETE_ROWS 이벤트 파싱 (v1: 23-25, v2: 30-32)
    pub fn parse_rows_event(
        data: &[u8],
        event_type: EventType,
        table_map: &TableMapData,
    ) -> Result<RowsEvent> {
        if !event_type.is_rows_event() {
            return Err(CdcError::BinlogParseError(format!(
                "Not a rows event: {:?}",
                event_type
            )));
        }
        if data.len() < ROWS_POST_HEADER_SIZE {
            return Err(CdcError::BinlogParseError(
                "Invalid rows event".to_string(),
            ));
        }

        let mut cursor = Cursor::new(data);
        let _table_id = cursor.read_u48::<LittleEndian>()?;
        let _flags = cursor.read_u16::<LittleEndian>()?;

        let is_v2 = matches!(
            event_type,
            EventType::WriteRowsEventV2 | EventType::UpdateRowsEventV2 | EventType::DeleteRowsEventV2
        );
        if is_v2 {
            // extra data 길이는 자기 자신(2 bytes)을 포함
            let extra_length = cursor.read_u16::<LittleEndian>()? as u64;
            cursor.set_position(cursor.position() + extra_length.saturating_sub(2));
        }

        let column_count = read_lcb(&mut cursor)? as usize;
        let bitmap_bytes = (column_count + 7) / 8;

        let mut columns_present = vec![0u8; bitmap_bytes];
        cursor.read_exact(&mut columns_present)?;

        let columns_after = if event_type.is_update_rows() {
            let mut bitmap = vec![0u8; bitmap_bytes];
            cursor.read_exact(&mut bitmap)?;
            Some(bitmap)
        } else {
            None
        };

        let mut rows = Vec::new();
        while (cursor.position() as usize) < data.len() {
            let values = decode_row(&mut cursor, table_map, column_count, &columns_present)?;
            let row = match &columns_after {
                Some(after_bitmap) => {
                    let after = decode_row(&mut cursor, table_map, column_count, after_bitmap)?;
                    RowPayload::Update {
                        before: values,
                        after,
                    }
                }
                None => RowPayload::Values(values),
            };
            rows.push(row);
        }

        Ok(RowsEvent {
            type_code: event_type.code(),
            schema: table_map.database.clone(),
            table: table_map.table.clone(),
            rows,
        })
    }

    /// QUERY 이벤트 파싱 (2)
    pub fn parse_query_event(data: &[u8]) -> Result<QueryEventData> {
        if data.len() < 13 {
            return Err(CdcError::BinlogParseError(
                "Invalid query event".to_string(),
            ));
        }

        let mut cursor = Cursor::new(data);

        let thread_id = cursor.read_u32::<LittleEndian>()?;
        let exec_time = cursor.read_u32::<LittleEndian>()?;
        let db_len = cursor.read_u8()? as usize;
        let _error_code = cursor.read_u16::<LittleEndian>()?;
        let status_len = cursor.read_u16::<LittleEndian>()? as u64;

        cursor.set_position(cursor.position() + status_len);

        let mut db_bytes = vec![0u8; db_len];
        cursor.read_exact(&mut db_bytes)?;
        let database = String::from_utf8_lossy(&db_bytes).to_string();

        // null terminator
        cursor.read_u8()?;

        let remaining = &data[cursor.position() as usize..];
        let query = String::from_utf8_lossy(remaining).to_string();

        Ok(QueryEventData {
            thread_id,
            exec_time,
            database,
            query,
        })
    }

    /// ROTATE 이벤트 파싱 (4)
    pub fn parse_rotate_event(data: &[u8]) -> Result<RotateEventData> {
        if data.len() < 8 {
            return Err(CdcError::BinlogParseError(
                "Invalid rotate event".to_string(),
            ));
        }

        let mut cursor = Cursor::new(data);

        let position = cursor.read_u64::<LittleEndian>()?;
        let filename_bytes = &data[cursor.position() as usize..];
        let filename = String::from_utf8_lossy(filename_bytes).to_string();

        Ok(RotateEventData {
            next_binlog_name: filename,
            position,
        })
    }

    /// GTID 이벤트 파싱 (33)
    pub fn parse_gtid_event(data: &[u8]) -> Result<GtidEventData> {
        if data.len() < 25 {
            return Err(CdcError::BinlogParseError(
                "Invalid GTID event".to_string(),
            ));
        }

        let mut cursor = Cursor::new(data);

        let flags = cursor.read_u8()?;
        let mut uuid_bytes = [0u8; 16];
        cursor.read_exact(&mut uuid_bytes)?;
        let sequence = cursor.read_u64::<LittleEndian>()?;

        Ok(GtidEventData {
            gtid: format!("{}:{}", Uuid::from_bytes(uuid_bytes).hyphenated(), sequence),
            committed: flags & 0x01 != 0,
        })
    }
}

/// optional metadata (TLV: type 1 byte, lcb 길이, 값)에서 SIGNEDNESS만 사용
fn read_unsigned_columns(cursor: &mut Cursor<&[u8]>, column_types: &[u8]) -> Result<Vec<bool>> {
    let data = *cursor.get_ref();
    let mut unsigned_columns = vec![false; column_types.len()];

    while (cursor.position() as usize) < data.len() {
        let field_type = cursor.read_u8()?;
        let length = read_lcb(cursor)? as usize;
        let start = cursor.position() as usize;
        let end = start + length;
        if end > data.len() {
            return Err(CdcError::BinlogParseError(format!(
                "Table map optional metadata field {} is truncated",
                field_type
            )));
        }

        if field_type == METADATA_SIGNEDNESS {
            unsigned_columns = read_signedness(&data[start..end], column_types);
        }
        cursor.set_position(end as u64);
    }

    Ok(unsigned_columns)
}

fn read_length_prefixed_name(cursor: &mut Cursor<&[u8]>) -> Result<String> {
    let len = cursor.read_u8()? as usize;
    let mut bytes = vec![0u8; len];
    cursor.read_exact(&mut bytes)?;
    // null terminator
    cursor.read_u8()?;
    Ok(String::from_utf8_lossy(&bytes).to_string())
}

/// LCB (Length-Coded Binary) 읽기
pub fn read_lcb(cursor: &mut Cursor<&[u8]>) -> Result<u64> {
    let byte = cursor.read_u8()?;
    match byte {
        0..=0xfa => Ok(byte as u64),
        0xfb => Ok(0),
        0xfc => Ok(cursor.read_u16::<LittleEndian>()? as u64),
        0xfd => Ok(cursor.read_u24::<LittleEndian>()? as u64),
        0xfe => Ok(cursor.read_u64::<LittleEndian>()?),
        0xff => Err(CdcError::BinlogParseError("Invalid LCB value".to_string())),
    }
}
