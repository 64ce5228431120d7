//! GTID (Global Transaction ID) 집합
//!
//! GTID 형식: UUID:sequence-number
//! MySQL 텍스트 표기: "uuid1:1-100:200,uuid2:1-50"

use crate::error::{CdcError, Result};
use byteorder::{LittleEndian, WriteBytesExt};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::str::FromStr;
use std::sync::OnceLock;
use uuid::Uuid;

/// MySQL GTID 시퀀스 번호 상한 (서버는 signed 64-bit로 저장)
pub const MAX_SEQUENCE: u64 = i64::MAX as u64;

/// 닫힌 구간 [start, end]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct GtidRange {
    pub start: u64,
    pub end: u64,
}

impl GtidRange {
    pub fn new(start: u64, end: u64) -> Result<Self> {
        if start == 0 || start > end || end > MAX_SEQUENCE {
            return Err(CdcError::GtidError(format!(
                "Invalid range: {}-{}",
                start, end
            )));
        }
        Ok(GtidRange { start, end })
    }

    pub fn contains(&self, value: u64) -> bool {
        value >= self.start && value <= self.end
    }

    /// 겹치거나 맞닿은 구간 병합
    pub fn merge(&self, other: &GtidRange) -> Option<GtidRange> {
        if self.end.saturating_add(1) >= other.start && other.end.saturating_add(1) >= self.start {
            Some(GtidRange {
                start: self.start.min(other.start),
                end: self.end.max(other.end),
            })
        } else {
            None
        }
    }
}

impl fmt::Display for GtidRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// UUID 하나에 대한 GTID 구간들 (정렬, 병합된 상태 유지)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UuidGtidSet {
    pub uuid: Uuid,
    pub ranges: Vec<GtidRange>,
}

impl UuidGtidSet {
    pub fn new(uuid: Uuid) -> Self {
        UuidGtidSet {
            uuid,
            ranges: Vec::new(),
        }
    }

    pub fn add_range(&mut self, range: GtidRange) {
        self.ranges.push(range);
        self.ranges.sort();

        let mut merged: Vec<GtidRange> = Vec::with_capacity(self.ranges.len());
        for range in self.ranges.drain(..) {
            match merged.last_mut() {
                Some(last) => match last.merge(&range) {
                    Some(joined) => *last = joined,
                    None => merged.push(range),
                },
                None => merged.push(range),
            }
        }
        self.ranges = merged;
    }

    pub fn contains(&self, sequence: u64) -> bool {
        self.ranges.iter().any(|r| r.contains(sequence))
    }
}

/// 전체 GTID 집합 (여러 UUID)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GtidSet {
    pub sets: BTreeMap<Uuid, UuidGtidSet>,
}

fn interval_regex() -> &'static Regex {
    static INTERVAL: OnceLock<Regex> = OnceLock::new();
    INTERVAL.get_or_init(|| Regex::new(r"^(\d+)(?:-(\d+))?$").expect("valid interval regex"))
}

fn parse_uuid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|e| CdcError::GtidError(format!("Invalid server uuid {}: {}", raw, e)))
}

fn parse_sequence(raw: &str) -> Result<u64> {
    raw.parse::<u64>()
        .map_err(|_| CdcError::GtidError(format!("Invalid sequence: {}", raw)))
}

impl GtidSet {
    pub fn new() -> Self {
        GtidSet::default()
    }

    /// GTID 집합 문자열 파싱 (format: "uuid1:1-100:200,uuid2:1-50")
    pub fn parse(gtid_str: &str) -> Result<Self> {
        let mut gtid_set = GtidSet::new();
        let trimmed = gtid_str.trim();

        if trimmed.is_empty() || trimmed == "NULL" {
            return Ok(gtid_set);
        }

        for part in trimmed.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            let mut fields = part.split(':');
            let uuid = parse_uuid(fields.next().unwrap_or_default())?;
            let entry = gtid_set
                .sets
                .entry(uuid)
                .or_insert_with(|| UuidGtidSet::new(uuid));

            let mut has_interval = false;
            for interval in fields {
                let caps = interval_regex().captures(interval.trim()).ok_or_else(|| {
                    CdcError::GtidError(format!("Invalid interval: {}", interval))
                })?;
                let start = parse_sequence(&caps[1])?;
                let end = match caps.get(2) {
                    Some(end) => parse_sequence(end.as_str())?,
                    None => start,
                };
                entry.add_range(GtidRange::new(start, end)?);
                has_interval = true;
            }

            if !has_interval {
                return Err(CdcError::GtidError(format!(
                    "Missing interval for {}",
                    part
                )));
            }
        }

        Ok(gtid_set)
    }

    /// 단일 GTID 추가 (format: "uuid:sequence")
    pub fn add_gtid(&mut self, gtid: &str) -> Result<()> {
        let (uuid, sequence) = gtid
            .split_once(':')
            .ok_or_else(|| CdcError::GtidError(format!("Invalid GTID format: {}", gtid)))?;
        let uuid = parse_uuid(uuid)?;
        let sequence = parse_sequence(sequence)?;

        self.sets
            .entry(uuid)
            .or_insert_with(|| UuidGtidSet::new(uuid))
            .add_range(GtidRange::new(sequence, sequence)?);
        Ok(())
    }

    pub fn contains(&self, gtid: &str) -> bool {
        let Some((uuid, sequence)) = gtid.split_once(':') else {
            return false;
        };
        match (parse_uuid(uuid), parse_sequence(sequence)) {
            (Ok(uuid), Ok(sequence)) => self
                .sets
                .get(&uuid)
                .map(|set| set.contains(sequence))
                .unwrap_or(false),
            _ => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sets.values().all(|set| set.ranges.is_empty())
    }

    /// COM_BINLOG_DUMP_GTID 용 바이너리 인코딩
    ///
    /// n_sids(8) + [uuid(16) + n_intervals(8) + [start(8) + end_exclusive(8)]*]*
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let non_empty: Vec<&UuidGtidSet> =
            self.sets.values().filter(|s| !s.ranges.is_empty()).collect();

        buffer.write_u64::<LittleEndian>(non_empty.len() as u64)?;
        for set in non_empty {
            buffer.write_all(set.uuid.as_bytes())?;
            buffer.write_u64::<LittleEndian>(set.ranges.len() as u64)?;
            for range in &set.ranges {
                buffer.write_u64::<LittleEndian>(range.start)?;
                buffer.write_u64::<LittleEndian>(range.end + 1)?;
            }
        }

        Ok(buffer)
    }
}

impl fmt::Display for GtidSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .sets
            .values()
            .filter(|set| !set.ranges.is_empty())
            .map(|set| {
                let ranges: Vec<String> = set.ranges.iter().map(|r| r.to_string()).collect();
                format!("{}:{}", set.uuid.hyphenated(), ranges.join(":"))
            })
            .collect();
        write!(f, "{}", parts.join(","))
    }
}

impl FromStr for GtidSet {
    type Err = CdcError;

    fn from_str(s: &str) -> Result<Self> {
        GtidSet::parse(s)
    }
}

impl Serialize for GtidSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for GtidSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        GtidSet::parse(&raw).map_err(serde::de::Error::custom)
    }
}
