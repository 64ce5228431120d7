//! Row 이미지 디코딩
//!
//! TABLE_MAP 이벤트의 컬럼 타입과 메타데이터를 이용해 row 이벤트의
//! 각 컬럼 값을 `CellValue`로 읽습니다. 값의 의미 해석(문자셋, JSON 바이너리 등)은 하지 않습니다.

use crate::error::{CdcError, Result};
use crate::events::{CellValue, TableMapData};
use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use chrono::{NaiveDate, TimeZone, Utc};
use std::io::{Cursor, Read};

/// MySQL 컬럼 타입 코드
pub mod column_type {
    pub const DECIMAL: u8 = 0;
    pub const TINY: u8 = 1;
    pub const SHORT: u8 = 2;
    pub const LONG: u8 = 3;
    pub const FLOAT: u8 = 4;
    pub const DOUBLE: u8 = 5;
    pub const NULL: u8 = 6;
    pub const TIMESTAMP: u8 = 7;
    pub const LONGLONG: u8 = 8;
    pub const INT24: u8 = 9;
    pub const DATE: u8 = 10;
    pub const TIME: u8 = 11;
    pub const DATETIME: u8 = 12;
    pub const YEAR: u8 = 13;
    pub const VARCHAR: u8 = 15;
    pub const BIT: u8 = 16;
    pub const TIMESTAMP2: u8 = 17;
    pub const DATETIME2: u8 = 18;
    pub const TIME2: u8 = 19;
    pub const JSON: u8 = 245;
    pub const NEWDECIMAL: u8 = 246;
    pub const ENUM: u8 = 247;
    pub const SET: u8 = 248;
    pub const TINY_BLOB: u8 = 249;
    pub const MEDIUM_BLOB: u8 = 250;
    pub const LONG_BLOB: u8 = 251;
    pub const BLOB: u8 = 252;
    pub const VAR_STRING: u8 = 253;
    pub const STRING: u8 = 254;
    pub const GEOMETRY: u8 = 255;
}

use column_type::*;

const DIG2BYTES: [usize; 10] = [0, 1, 1, 2, 2, 3, 3, 4, 4, 4];
const DIG_PER_DEC: usize = 9;

/// TABLE_MAP 메타데이터 블록에서 컬럼 하나의 메타데이터 읽기
///
/// 2 바이트 메타데이터는 (첫 바이트 << 8) | 두번째 바이트 로 저장합니다.
/// VARCHAR 최대 길이만 little-endian u16 그대로 저장합니다.
pub fn read_column_meta(cursor: &mut Cursor<&[u8]>, column_type: u8) -> Result<u16> {
    let meta = match column_type {
        FLOAT | DOUBLE | BLOB | TINY_BLOB | MEDIUM_BLOB | LONG_BLOB | GEOMETRY | JSON
        | TIMESTAMP2 | DATETIME2 | TIME2 => cursor.read_u8()? as u16,
        VARCHAR | VAR_STRING => cursor.read_u16::<LittleEndian>()?,
        BIT | NEWDECIMAL | STRING | ENUM | SET => {
            let first = cursor.read_u8()? as u16;
            let second = cursor.read_u8()? as u16;
            (first << 8) | second
        }
        _ => 0,
    };
    Ok(meta)
}

fn bit_set(bitmap: &[u8], index: usize) -> bool {
    bitmap
        .get(index / 8)
        .map(|byte| byte & (1 << (index % 8)) != 0)
        .unwrap_or(false)
}

/// row 하나 디코딩. `present`에 없는 컬럼은 `CellValue::Null`로 채웁니다.
pub fn decode_row(
    cursor: &mut Cursor<&[u8]>,
    table: &TableMapData,
    column_count: usize,
    present: &[u8],
) -> Result<Vec<CellValue>> {
    if column_count > table.column_types.len() {
        return Err(CdcError::BinlogParseError(format!(
            "Row has {} columns but table map for {}.{} has {}",
            column_count,
            table.database,
            table.table,
            table.column_types.len()
        )));
    }

    let present_count = (0..column_count).filter(|&i| bit_set(present, i)).count();
    let mut null_bitmap = vec![0u8; (present_count + 7) / 8];
    cursor.read_exact(&mut null_bitmap)?;

    let mut row = Vec::with_capacity(column_count);
    let mut null_index = 0;
    for i in 0..column_count {
        if !bit_set(present, i) {
            row.push(CellValue::Null);
            continue;
        }

        let is_null = bit_set(&null_bitmap, null_index);
        null_index += 1;

        if is_null {
            row.push(CellValue::Null);
        } else {
            let unsigned = table.unsigned_columns.get(i).copied().unwrap_or(false);
            row.push(read_value(
                cursor,
                table.column_types[i],
                table.column_meta[i],
                unsigned,
            )?);
        }
    }

    Ok(row)
}

/// SIGNEDNESS 메타데이터 대상 컬럼인지 여부
pub fn is_numeric_column(column_type: u8) -> bool {
    matches!(
        column_type,
        DECIMAL | TINY | SHORT | INT24 | LONG | LONGLONG | FLOAT | DOUBLE | NEWDECIMAL
    )
}

/// SIGNEDNESS 비트맵(숫자 컬럼마다 1 bit, MSB 먼저)을 컬럼별 UNSIGNED 여부로 펼치기
pub fn read_signedness(bitmap: &[u8], column_types: &[u8]) -> Vec<bool> {
    let mut numeric_index = 0;
    column_types
        .iter()
        .map(|&column_type| {
            if !is_numeric_column(column_type) {
                return false;
            }
            let unsigned = bitmap
                .get(numeric_index / 8)
                .map(|byte| byte & (0x80 >> (numeric_index % 8)) != 0)
                .unwrap_or(false);
            numeric_index += 1;
            unsigned
        })
        .collect()
}

/// 컬럼 값 하나 읽기
pub fn read_value(
    cursor: &mut Cursor<&[u8]>,
    column_type: u8,
    meta: u16,
    unsigned: bool,
) -> Result<CellValue> {
    let value = match column_type {
        TINY if unsigned => CellValue::UInt8(cursor.read_u8()?),
        SHORT if unsigned => CellValue::UInt16(cursor.read_u16::<LittleEndian>()?),
        INT24 if unsigned => CellValue::UInt32(cursor.read_u24::<LittleEndian>()?),
        LONG if unsigned => CellValue::UInt32(cursor.read_u32::<LittleEndian>()?),
        LONGLONG if unsigned => CellValue::UInt64(cursor.read_u64::<LittleEndian>()?),
        TINY => CellValue::Int8(cursor.read_i8()?),
        SHORT => CellValue::Int16(cursor.read_i16::<LittleEndian>()?),
        INT24 => CellValue::Int32(cursor.read_i24::<LittleEndian>()?),
        LONG => CellValue::Int32(cursor.read_i32::<LittleEndian>()?),
        LONGLONG => CellValue::Int64(cursor.read_i64::<LittleEndian>()?),
        FLOAT => CellValue::Float(cursor.read_f32::<LittleEndian>()?),
        DOUBLE => CellValue::Double(cursor.read_f64::<LittleEndian>()?),
        NULL => CellValue::Null,
        YEAR => {
            let year = cursor.read_u8()? as u16;
            CellValue::UInt16(if year == 0 { 0 } else { 1900 + year })
        }
        NEWDECIMAL => {
            CellValue::Decimal(read_decimal(cursor, (meta >> 8) as u8, (meta & 0xff) as u8)?)
        }
        VARCHAR | VAR_STRING => {
            let length = read_string_length(cursor, meta as usize)?;
            bytes_or_string(read_bytes(cursor, length)?)
        }
        STRING => {
            let real_type = (meta >> 8) as u8;
            let second = meta & 0xff;
            match real_type {
                ENUM | SET => read_enum_or_set(cursor, real_type, second as usize)?,
                _ => {
                    let max_length = ((((meta >> 8) & 0x30) ^ 0x30) << 4) | second;
                    let length = read_string_length(cursor, max_length as usize)?;
                    bytes_or_string(read_bytes(cursor, length)?)
                }
            }
        }
        ENUM | SET => read_enum_or_set(cursor, column_type, (meta & 0xff) as usize)?,
        BLOB | TINY_BLOB | MEDIUM_BLOB | LONG_BLOB => {
            let length = read_uint_le(cursor, meta as usize)?;
            bytes_or_string(read_bytes(cursor, length)?)
        }
        JSON | GEOMETRY => {
            let length = read_uint_le(cursor, meta as usize)?;
            CellValue::Bytes(read_bytes(cursor, length)?)
        }
        BIT => {
            let bits = meta >> 8;
            let bytes = meta & 0xff;
            let length = (bytes + u16::from(bits > 0)) as usize;
            CellValue::UInt64(cursor.read_uint::<BigEndian>(length.clamp(1, 8))?)
        }
        DATE => {
            let packed = cursor.read_u24::<LittleEndian>()?;
            CellValue::Date(format!(
                "{:04}-{:02}-{:02}",
                packed >> 9,
                (packed >> 5) & 0x0f,
                packed & 0x1f
            ))
        }
        TIME => {
            let packed = cursor.read_u24::<LittleEndian>()?;
            CellValue::Time(format!(
                "{:02}:{:02}:{:02}",
                packed / 10000,
                (packed / 100) % 100,
                packed % 100
            ))
        }
        DATETIME => {
            let packed = cursor.read_u64::<LittleEndian>()?;
            let date = packed / 1_000_000;
            let time = packed % 1_000_000;
            datetime_value(
                (date / 10000) as i32,
                ((date / 100) % 100) as u32,
                (date % 100) as u32,
                (time / 10000) as u32,
                ((time / 100) % 100) as u32,
                (time % 100) as u32,
                0,
            )
        }
        TIMESTAMP => {
            let seconds = cursor.read_u32::<LittleEndian>()?;
            timestamp_value(seconds as i64, 0)
        }
        TIMESTAMP2 => {
            let seconds = cursor.read_u32::<BigEndian>()?;
            let micros = read_fraction(cursor, meta as u8)?;
            timestamp_value(seconds as i64, micros)
        }
        DATETIME2 => read_datetime2(cursor, meta as u8)?,
        TIME2 => read_time2(cursor, meta as u8)?,
        _ => {
            return Err(CdcError::BinlogParseError(format!(
                "Unsupported column type: {}",
                column_type
            )))
        }
    };
    Ok(value)
}

fn read_bytes(cursor: &mut Cursor<&[u8]>, length: usize) -> Result<Vec<u8>> {
    let remaining = cursor.get_ref().len().saturating_sub(cursor.position() as usize);
    if length > remaining {
        return Err(CdcError::BinlogParseError(format!(
            "Value length {} exceeds remaining {} bytes",
            length, remaining
        )));
    }
    let mut bytes = vec![0u8; length];
    cursor.read_exact(&mut bytes)?;
    Ok(bytes)
}

fn read_uint_le(cursor: &mut Cursor<&[u8]>, width: usize) -> Result<usize> {
    if !(1..=4).contains(&width) {
        return Err(CdcError::BinlogParseError(format!(
            "Invalid length prefix width: {}",
            width
        )));
    }
    Ok(cursor.read_uint::<LittleEndian>(width)? as usize)
}

fn read_string_length(cursor: &mut Cursor<&[u8]>, max_length: usize) -> Result<usize> {
    if max_length > 255 {
        Ok(cursor.read_u16::<LittleEndian>()? as usize)
    } else {
        Ok(cursor.read_u8()? as usize)
    }
}

fn read_enum_or_set(cursor: &mut Cursor<&[u8]>, real_type: u8, size: usize) -> Result<CellValue> {
    match (real_type, size) {
        (ENUM, 1) => Ok(CellValue::UInt16(cursor.read_u8()? as u16)),
        (ENUM, 2) => Ok(CellValue::UInt16(cursor.read_u16::<LittleEndian>()?)),
        (SET, 1..=8) => Ok(CellValue::UInt64(cursor.read_uint::<LittleEndian>(size)?)),
        _ => Err(CdcError::BinlogParseError(format!(
            "Invalid enum/set size {} for type {}",
            size, real_type
        ))),
    }
}

fn bytes_or_string(bytes: Vec<u8>) -> CellValue {
    match String::from_utf8(bytes) {
        Ok(s) => CellValue::String(s),
        Err(e) => CellValue::Bytes(e.into_bytes()),
    }
}

/// 소수 초 부분 (fsp 자리수에 따라 0~3 바이트, big-endian) → 마이크로초
fn read_fraction(cursor: &mut Cursor<&[u8]>, fsp: u8) -> Result<u32> {
    let micros = match fsp {
        0 => 0,
        1 | 2 => cursor.read_u8()? as u32 * 10_000,
        3 | 4 => cursor.read_u16::<BigEndian>()? as u32 * 100,
        _ => cursor.read_u24::<BigEndian>()?,
    };
    Ok(micros)
}

fn timestamp_value(seconds: i64, micros: u32) -> CellValue {
    match Utc.timestamp_opt(seconds, micros * 1000).single() {
        Some(dt) => CellValue::DateTime(dt),
        None => CellValue::Int64(seconds),
    }
}

fn datetime_value(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
    micros: u32,
) -> CellValue {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_micro_opt(hour, minute, second, micros))
        .map(|dt| CellValue::DateTime(dt.and_utc()))
        // '0000-00-00 00:00:00' 같은 값은 문자열 그대로
        .unwrap_or_else(|| {
            CellValue::Date(format!(
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                year, month, day, hour, minute, second
            ))
        })
}

fn read_datetime2(cursor: &mut Cursor<&[u8]>, fsp: u8) -> Result<CellValue> {
    let packed = cursor.read_uint::<BigEndian>(5)? as i64 - 0x80_0000_0000;
    let micros = read_fraction(cursor, fsp)?;

    let ymd = packed >> 17;
    let ym = ymd >> 5;
    let hms = packed % (1 << 17);

    Ok(datetime_value(
        (ym / 13) as i32,
        (ym % 13) as u32,
        (ymd % (1 << 5)) as u32,
        (hms >> 12) as u32,
        ((hms >> 6) % (1 << 6)) as u32,
        (hms % (1 << 6)) as u32,
        micros,
    ))
}

fn read_time2(cursor: &mut Cursor<&[u8]>, fsp: u8) -> Result<CellValue> {
    const TIMEF_INT_OFS: i64 = 0x80_0000;
    const TIMEF_OFS: i64 = 0x8000_0000_0000;

    let packed: i64 = match fsp {
        1 | 2 => {
            let mut int_part = cursor.read_u24::<BigEndian>()? as i64 - TIMEF_INT_OFS;
            let mut frac = cursor.read_u8()? as i64;
            if int_part < 0 && frac != 0 {
                int_part += 1;
                frac -= 0x100;
            }
            (int_part << 24) + frac * 10_000
        }
        3 | 4 => {
            let mut int_part = cursor.read_u24::<BigEndian>()? as i64 - TIMEF_INT_OFS;
            let mut frac = cursor.read_u16::<BigEndian>()? as i64;
            if int_part < 0 && frac != 0 {
                int_part += 1;
                frac -= 0x10000;
            }
            (int_part << 24) + frac * 100
        }
        5 | 6 => cursor.read_uint::<BigEndian>(6)? as i64 - TIMEF_OFS,
        _ => (cursor.read_u24::<BigEndian>()? as i64 - TIMEF_INT_OFS) << 24,
    };

    let sign = if packed < 0 { "-" } else { "" };
    let packed = packed.abs();
    let hms = packed >> 24;
    let micros = packed % (1 << 24);

    let mut text = format!(
        "{}{:02}:{:02}:{:02}",
        sign,
        (hms >> 12) % (1 << 10),
        (hms >> 6) % (1 << 6),
        hms % (1 << 6)
    );
    if fsp > 0 {
        text.push_str(&format!(".{:06}", micros));
    }
    Ok(CellValue::Time(text))
}

fn be_uint(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64)
}

/// NEWDECIMAL 바이너리 → 10진 문자열
fn read_decimal(cursor: &mut Cursor<&[u8]>, precision: u8, scale: u8) -> Result<String> {
    if scale > precision {
        return Err(CdcError::BinlogParseError(format!(
            "Invalid decimal({}, {})",
            precision, scale
        )));
    }

    let integral = (precision - scale) as usize;
    let scale = scale as usize;
    let uncomp_int = integral / DIG_PER_DEC;
    let comp_int = integral % DIG_PER_DEC;
    let uncomp_frac = scale / DIG_PER_DEC;
    let comp_frac = scale % DIG_PER_DEC;

    let size = uncomp_int * 4 + DIG2BYTES[comp_int] + uncomp_frac * 4 + DIG2BYTES[comp_frac];
    let mut buf = read_bytes(cursor, size)?;
    if buf.is_empty() {
        return Ok("0".to_string());
    }

    // 최상위 비트가 0이면 음수, 음수는 모든 비트가 반전되어 저장됨
    let negative = buf[0] & 0x80 == 0;
    buf[0] ^= 0x80;
    if negative {
        buf.iter_mut().for_each(|b| *b ^= 0xff);
    }

    let mut pos = 0;
    let mut digits = String::new();

    if comp_int > 0 {
        let width = DIG2BYTES[comp_int];
        digits.push_str(&be_uint(&buf[pos..pos + width]).to_string());
        pos += width;
    }
    for _ in 0..uncomp_int {
        digits.push_str(&format!("{:09}", be_uint(&buf[pos..pos + 4])));
        pos += 4;
    }

    let mut text = String::new();
    if negative {
        text.push('-');
    }
    let integer = digits.trim_start_matches('0');
    text.push_str(if integer.is_empty() { "0" } else { integer });

    if scale > 0 {
        text.push('.');
        for _ in 0..uncomp_frac {
            text.push_str(&format!("{:09}", be_uint(&buf[pos..pos + 4])));
            pos += 4;
        }
        if comp_frac > 0 {
            let width = DIG2BYTES[comp_frac];
            text.push_str(&format!(
                "{:0width$}",
                be_uint(&buf[pos..pos + width]),
                width = comp_frac
            ));
        }
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn table(column_types: Vec<u8>, column_meta: Vec<u16>) -> TableMapData {
        TableMapData {
            table_id: 1,
            database: "s".to_string(),
            table: "t".to_string(),
            nullable_bitmap: vec![0xff; (column_types.len() + 7) / 8],
            unsigned_columns: Vec::new(),
            column_types,
            column_meta,
        }
    }

    #[test]
    fn test_decode_row_with_nulls_and_missing_columns() {
        let table = table(vec![LONG, VARCHAR, TINY], vec![0, 100, 0]);
        // 컬럼 0, 1만 present. 그중 두번째(컬럼 1)가 NULL
        let mut data = vec![0b0000_0010];
        data.extend_from_slice(&7i32.to_le_bytes());
        let mut cursor = Cursor::new(data.as_slice());

        let row = decode_row(&mut cursor, &table, 3, &[0b0000_0011]).unwrap();
        assert_eq!(row, vec![CellValue::Int32(7), CellValue::Null, CellValue::Null]);
        assert_eq!(cursor.position() as usize, data.len());
    }

    #[test]
    fn test_read_unsigned_integers() {
        let data = [200u8];
        let mut cursor = Cursor::new(&data[..]);
        assert_eq!(read_value(&mut cursor, TINY, 0, true).unwrap(), CellValue::UInt8(200));

        let data = 4_000_000_000u32.to_le_bytes();
        let mut cursor = Cursor::new(&data[..]);
        assert_eq!(
            read_value(&mut cursor, LONG, 0, true).unwrap(),
            CellValue::UInt32(4_000_000_000)
        );

        let data = u64::MAX.to_le_bytes();
        let mut cursor = Cursor::new(&data[..]);
        assert_eq!(read_value(&mut cursor, LONGLONG, 0, true).unwrap(), CellValue::UInt64(u64::MAX));

        // 같은 바이트라도 signed 컬럼이면 음수
        let data = [200u8];
        let mut cursor = Cursor::new(&data[..]);
        assert_eq!(read_value(&mut cursor, TINY, 0, false).unwrap(), CellValue::Int8(-56));
    }

    #[test]
    fn test_read_signedness_skips_non_numeric_columns() {
        // 숫자 컬럼 3개 (TINY, LONG, DOUBLE) 중 첫째와 셋째가 UNSIGNED
        let column_types = [TINY, VARCHAR, LONG, DOUBLE];
        assert_eq!(
            read_signedness(&[0b1010_0000], &column_types),
            vec![true, false, false, true]
        );
        assert_eq!(read_signedness(&[], &column_types), vec![false; 4]);
    }

    #[test]
    fn test_read_varchar_and_blob() {
        let data = [3u8, b'a', b'b', b'c'];
        let mut cursor = Cursor::new(&data[..]);
        assert_eq!(
            read_value(&mut cursor, VARCHAR, 255, false).unwrap(),
            CellValue::String("abc".to_string())
        );

        let data = [2u8, 0, 0xff, 0xfe];
        let mut cursor = Cursor::new(&data[..]);
        assert_eq!(
            read_value(&mut cursor, BLOB, 2, false).unwrap(),
            CellValue::Bytes(vec![0xff, 0xfe])
        );
    }

    #[test]
    fn test_read_string_with_real_type() {
        // CHAR(10): real_type=STRING(0xfe), length=10 (utf8mb4 이전)
        let meta = (0xfe << 8) | 10;
        let data = [2u8, b'h', b'i'];
        let mut cursor = Cursor::new(&data[..]);
        assert_eq!(
            read_value(&mut cursor, STRING, meta, false).unwrap(),
            CellValue::String("hi".to_string())
        );

        // ENUM stored as STRING
        let meta = ((ENUM as u16) << 8) | 1;
        let data = [3u8];
        let mut cursor = Cursor::new(&data[..]);
        assert_eq!(read_value(&mut cursor, STRING, meta, false).unwrap(), CellValue::UInt16(3));
    }

    #[test]
    fn test_read_decimal() {
        let data = [0x80u8, 0x7b, 0x2d];
        let mut cursor = Cursor::new(&data[..]);
        assert_eq!(read_decimal(&mut cursor, 5, 2).unwrap(), "123.45");

        let data = [0x7fu8, 0x84, 0xd2];
        let mut cursor = Cursor::new(&data[..]);
        assert_eq!(read_decimal(&mut cursor, 5, 2).unwrap(), "-123.45");
    }

    #[test]
    fn test_read_date_and_datetime2() {
        // 2024-03-15: (2024 << 9) | (3 << 5) | 15
        let packed: u32 = (2024 << 9) | (3 << 5) | 15;
        let bytes = packed.to_le_bytes();
        let mut cursor = Cursor::new(&bytes[..3]);
        assert_eq!(
            read_value(&mut cursor, DATE, 0, false).unwrap(),
            CellValue::Date("2024-03-15".to_string())
        );

        // 2024-03-15 10:20:30
        let ym: i64 = 2024 * 13 + 3;
        let ymd = (ym << 5) | 15;
        let hms: i64 = (10 << 12) | (20 << 6) | 30;
        let packed = ((ymd << 17) | hms) + 0x80_0000_0000;
        let bytes = (packed as u64).to_be_bytes();
        let mut cursor = Cursor::new(&bytes[3..]);
        match read_value(&mut cursor, DATETIME2, 0, false).unwrap() {
            CellValue::DateTime(dt) => {
                assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 3, 15));
                assert_eq!((dt.hour(), dt.minute(), dt.second()), (10, 20, 30));
            }
            other => panic!("unexpected value {:?}", other),
        }
    }

    #[test]
    fn test_read_time2() {
        // 12:34:56, fsp 0
        let hms: i64 = (12 << 12) | (34 << 6) | 56;
        let packed = (hms + 0x80_0000) as u32;
        let bytes = packed.to_be_bytes();
        let mut cursor = Cursor::new(&bytes[1..]);
        assert_eq!(
            read_value(&mut cursor, TIME2, 0, false).unwrap(),
            CellValue::Time("12:34:56".to_string())
        );
    }

    #[test]
    fn test_read_timestamp2() {
        let mut data = 1_700_000_000u32.to_be_bytes().to_vec();
        data.extend_from_slice(&[0x01, 0xf4]); // 500 * 100 us
        let mut cursor = Cursor::new(data.as_slice());
        match read_value(&mut cursor, TIMESTAMP2, 3, false).unwrap() {
            CellValue::DateTime(dt) => {
                assert_eq!(dt.timestamp(), 1_700_000_000);
                assert_eq!(dt.timestamp_subsec_micros(), 50_000);
            }
            other => panic!("unexpected value {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_type() {
        let data = [0u8; 4];
        let mut cursor = Cursor::new(&data[..]);
        assert!(read_value(&mut cursor, DECIMAL, 0, false).is_err());
    }

    #[test]
    fn test_read_column_meta() {
        let data = [0x10u8, 0x01, 0x0a, 0x02];
        let mut cursor = Cursor::new(&data[..]);
        assert_eq!(read_column_meta(&mut cursor, VARCHAR).unwrap(), 0x0110);
        assert_eq!(read_column_meta(&mut cursor, NEWDECIMAL).unwrap(), 0x0a02);
        assert_eq!(read_column_meta(&mut cursor, LONG).unwrap(), 0);
    }
}
