//! MySQL Binlog 클라이언트
//!
//! replica로 등록하여 binlog 이벤트를 한 번에 하나씩 읽어옵니다.
//! 연결 순서:
//! 1. TCP 연결 + greeting 수신
//! 2. 인증 (mysql_native_password)
//! 3. `SET @master_binlog_checksum='NONE'`
//! 4. COM_BINLOG_DUMP 또는 COM_BINLOG_DUMP_GTID 전송
//! 5. 첫 응답 확인 (1236 에러면 재개 불가)

use crate::auth;
use crate::binlog::BinlogParser;
use crate::error::{CdcError, Result};
use crate::events::{EventType, FetchedEvent, RawEvent, TableMapData};
use crate::gtid::GtidSet;
use crate::position::{BinlogPosition, SourceInfo, BINLOG_START_POSITION};
use crate::protocol::{self, ErrorPacket, PacketChannel};
use crate::source::{RawEventSource, SourceConnector, StreamSettings};
use byteorder::{LittleEndian, WriteBytesExt};
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// COM_BINLOG_DUMP 명령어 코드
const COM_BINLOG_DUMP: u8 = 0x12;

/// COM_BINLOG_DUMP_GTID 명령어 코드
const COM_BINLOG_DUMP_GTID: u8 = 0x1e;

/// 더 읽을 이벤트가 없으면 대기하지 않고 EOF 반환
const BINLOG_DUMP_NON_BLOCK: u16 = 0x01;

const BINLOG_THROUGH_GTID: u16 = 0x04;

/// ER_MASTER_FATAL_ERROR_READING_BINLOG (purge된 파일, 잘못된 위치 등)
const ER_MASTER_FATAL_ERROR_READING_BINLOG: u16 = 1236;

/// 실제 MySQL 서버용 커넥터
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlConnector;

impl SourceConnector for MySqlConnector {
    type Source = MySqlBinlogSource;

    async fn connect(&self, settings: StreamSettings) -> Result<MySqlBinlogSource> {
        let conn = &settings.connection;
        info!(
            "Connecting to {}:{} as replica server_id={}",
            conn.host, conn.port, settings.server_id
        );

        let mut channel =
            PacketChannel::connect(&conn.host, conn.port, settings.connect_timeout).await?;

        tokio::time::timeout(settings.connect_timeout, auth::authenticate(&mut channel, conn, None))
            .await
            .map_err(|_| {
                CdcError::ConnectionError(format!(
                    "Timed out authenticating to {}:{}",
                    conn.host, conn.port
                ))
            })??;

        disable_checksum(&mut channel).await?;

        let dump_command = create_dump_command(&settings)?;
        channel.write_packet(&dump_command, 0).await?;
        info!(
            "Sent binlog dump request: file={:?}, position={:?}, gtid={:?}",
            settings.resume.log_file,
            settings.resume.log_pos,
            settings.resume.auto_position.as_ref().map(|set| set.to_string())
        );

        // 재개 불가 여부는 첫 응답에서 알 수 있음
        let first = channel.read_packet().await?;
        if protocol::is_error_packet(&first) {
            let err = ErrorPacket::parse(&first)?;
            let _ = channel.shutdown().await;
            if err.code == ER_MASTER_FATAL_ERROR_READING_BINLOG {
                return Err(CdcError::NotResumable(err.to_string()));
            }
            return Err(CdcError::Transport(err.to_string()));
        }

        Ok(MySqlBinlogSource::new(channel, Some(first), EventDecoder::new(&settings)))
    }
}

async fn disable_checksum(channel: &mut PacketChannel) -> Result<()> {
    let reply = channel
        .query("SET @master_binlog_checksum='NONE'")
        .await?;

    if protocol::is_error_packet(&reply) {
        let err = ErrorPacket::parse(&reply)?;
        warn!("Failed to set binlog checksum to NONE, continuing anyway: {}", err);
    } else {
        debug!("Binlog checksum set to NONE");
    }
    Ok(())
}

fn dump_flags(blocking: bool) -> u16 {
    if blocking {
        0
    } else {
        BINLOG_DUMP_NON_BLOCK
    }
}

/// 재개 파라미터에 맞는 dump 명령 생성
pub fn create_dump_command(settings: &StreamSettings) -> Result<Vec<u8>> {
    let resume = &settings.resume;
    let flags = dump_flags(settings.blocking);

    match &resume.auto_position {
        Some(gtid_set) => create_binlog_dump_gtid_command(settings.server_id, flags, gtid_set),
        None => {
            let position = if resume.resume_stream {
                resume.log_pos.unwrap_or(BINLOG_START_POSITION)
            } else {
                BINLOG_START_POSITION
            };
            create_binlog_dump_command(
                settings.server_id,
                flags,
                resume.log_file.as_deref().unwrap_or_default(),
                position,
            )
        }
    }
}

/// COM_BINLOG_DUMP 명령어 생성
fn create_binlog_dump_command(
    server_id: u32,
    flags: u16,
    binlog_filename: &str,
    binlog_position: u64,
) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();

    buffer.write_u8(COM_BINLOG_DUMP)?;

    // Binlog position (4 bytes, little-endian)
    buffer.write_u32::<LittleEndian>(binlog_position as u32)?;
    buffer.write_u16::<LittleEndian>(flags)?;
    buffer.write_u32::<LittleEndian>(server_id)?;

    // 파일명은 패킷 끝까지 (null terminator 없음)
    buffer.write_all(binlog_filename.as_bytes())?;

    Ok(buffer)
}

/// COM_BINLOG_DUMP_GTID 명령어 생성
fn create_binlog_dump_gtid_command(server_id: u32, flags: u16, gtid_set: &GtidSet) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();

    buffer.write_u8(COM_BINLOG_DUMP_GTID)?;
    buffer.write_u16::<LittleEndian>(flags | BINLOG_THROUGH_GTID)?;
    buffer.write_u32::<LittleEndian>(server_id)?;

    // 파일명 없이 GTID 집합으로만 위치 지정
    buffer.write_u32::<LittleEndian>(0)?;
    buffer.write_u64::<LittleEndian>(BINLOG_START_POSITION)?;

    let encoded = gtid_set.encode()?;
    buffer.write_u32::<LittleEndian>(encoded.len() as u32)?;
    buffer.write_all(&encoded)?;

    Ok(buffer)
}

/// 다른 태스크에서 소스를 닫거나 상태를 조회하기 위한 핸들
#[derive(Clone)]
pub struct StreamHandle {
    close_tx: Arc<watch::Sender<bool>>,
    info: Arc<RwLock<SourceInfo>>,
}

impl StreamHandle {
    /// 연결 종료 요청. 대기 중인 fetch는 `CdcError::Transport`로 끝납니다.
    pub fn close(&self) {
        self.close_tx.send_replace(true);
    }

    pub fn is_closed(&self) -> bool {
        *self.close_tx.borrow()
    }

    pub fn source_info(&self) -> SourceInfo {
        self.info.read().clone()
    }
}

/// 패킷을 원본 이벤트로 바꾸면서 로그 좌표와 테이블 맵을 추적
struct EventDecoder {
    only_events: Vec<EventType>,
    table_maps: HashMap<u64, TableMapData>,
    current: BinlogPosition,
    info: Arc<RwLock<SourceInfo>>,
}

impl EventDecoder {
    fn new(settings: &StreamSettings) -> Self {
        let resume = &settings.resume;
        let current = BinlogPosition::new(
            resume.log_file.clone().unwrap_or_default(),
            resume.log_pos.unwrap_or(BINLOG_START_POSITION),
        );

        let mut info = SourceInfo::new(settings.server_id, current.filename.clone());
        info.binlog_position = current.position;
        if let Some(gtid_set) = &resume.auto_position {
            info.gtid_set = gtid_set.clone();
        }

        EventDecoder {
            only_events: settings.only_events.clone(),
            table_maps: HashMap::new(),
            current,
            info: Arc::new(RwLock::new(info)),
        }
    }

    /// 패킷 하나를 처리. 호출자에게 넘길 이벤트가 아니면 `None`
    fn decode(&mut self, packet: &[u8]) -> Result<Option<FetchedEvent>> {
        match packet.first() {
            None => {
                return Err(CdcError::ProtocolError("Empty binlog packet".to_string()));
            }
            Some(0xFF) => {
                let err = ErrorPacket::parse(packet)?;
                return Err(CdcError::Transport(err.to_string()));
            }
            Some(_) if protocol::is_eof_packet(packet) => {
                return Err(CdcError::Transport(
                    "Server ended the binlog stream".to_string(),
                ));
            }
            Some(0x00) => {}
            Some(other) => {
                return Err(CdcError::ProtocolError(format!(
                    "Unexpected binlog packet marker: 0x{:02x}",
                    other
                )));
            }
        }

        let (header, body) = BinlogParser::parse_header(&packet[1..])?;
        let event_type = header.event_type();

        match event_type {
            EventType::HeartbeatEvent | EventType::FormatDescriptionEvent => {
                return Ok(None);
            }
            EventType::RotateEvent => {
                let rotate = BinlogParser::parse_rotate_event(body)?;
                debug!("Rotating to {}:{}", rotate.next_binlog_name, rotate.position);
                self.current = BinlogPosition::new(rotate.next_binlog_name, rotate.position);
            }
            _ if header.next_pos != 0 => {
                self.current.position = header.next_pos as u64;
            }
            _ => {}
        }

        {
            let mut info = self.info.write();
            info.binlog_filename = self.current.filename.clone();
            info.binlog_position = self.current.position;
            info.ts_sec = header.timestamp;
        }

        let event = match event_type {
            EventType::TableMapEvent => {
                let table_map = BinlogParser::parse_table_map_event(body)?;
                self.table_maps.insert(table_map.table_id, table_map);
                return Ok(None);
            }
            EventType::GtidEvent => {
                let gtid = BinlogParser::parse_gtid_event(body)?;
                let mut info = self.info.write();
                info.gtid_set.add_gtid(&gtid.gtid)?;
                info.gtid = Some(gtid.gtid.clone());
                RawEvent::Gtid(gtid)
            }
            _ if !self.only_events.contains(&event_type) => {
                return Ok(None);
            }
            EventType::QueryEvent => RawEvent::Query(BinlogParser::parse_query_event(body)?),
            event_type if event_type.is_rows_event() => {
                let table_id = BinlogParser::rows_event_table_id(body)?;
                let Some(table_map) = self.table_maps.get(&table_id) else {
                    // 트랜잭션 중간에서 재개하면 앞선 TABLE_MAP을 받지 못함
                    warn!(
                        "Skipping rows event at {}: no table map for table id {}",
                        self.current, table_id
                    );
                    return Ok(None);
                };
                let rows = BinlogParser::parse_rows_event(body, event_type, table_map)?;

                let mut info = self.info.write();
                info.database = Some(rows.schema.clone());
                info.table = Some(rows.table.clone());
                RawEvent::Rows(rows)
            }
            other => {
                warn!("Skipping unsupported event type {:?} ({})", other, header.type_code);
                return Ok(None);
            }
        };

        if !self.only_events.contains(&event_type) {
            return Ok(None);
        }

        debug!(
            "Decoded {:?} event at {} (server_id={})",
            event_type, self.current, header.server_id
        );
        Ok(Some(FetchedEvent::new(event, self.current.clone())))
    }
}

/// MySQL 서버에서 binlog 이벤트를 읽는 원본 이벤트 소스
pub struct MySqlBinlogSource {
    channel: PacketChannel,
    /// 연결 시 미리 읽은 첫 응답
    pending: Option<Bytes>,
    decoder: EventDecoder,
    close_tx: Arc<watch::Sender<bool>>,
    close_rx: watch::Receiver<bool>,
}

impl MySqlBinlogSource {
    fn new(channel: PacketChannel, pending: Option<Bytes>, decoder: EventDecoder) -> Self {
        let (close_tx, close_rx) = watch::channel(false);
        MySqlBinlogSource {
            channel,
            pending,
            decoder,
            close_tx: Arc::new(close_tx),
            close_rx,
        }
    }

    pub fn handle(&self) -> StreamHandle {
        StreamHandle {
            close_tx: self.close_tx.clone(),
            info: self.decoder.info.clone(),
        }
    }

    /// 현재 로그 좌표 (마지막으로 처리한 이벤트 직후)
    pub fn current_position(&self) -> &BinlogPosition {
        &self.decoder.current
    }

    async fn next_packet(&mut self) -> Result<Bytes> {
        if *self.close_rx.borrow() {
            return Err(CdcError::Transport("Binlog connection was closed".to_string()));
        }
        if let Some(packet) = self.pending.take() {
            return Ok(packet);
        }

        tokio::select! {
            packet = self.channel.read_packet() => packet,
            _ = self.close_rx.changed() => {
                Err(CdcError::Transport("Binlog connection was closed".to_string()))
            }
        }
    }
}

impl RawEventSource for MySqlBinlogSource {
    async fn fetch_one(&mut self) -> Result<FetchedEvent> {
        loop {
            let packet = self.next_packet().await?;
            if let Some(fetched) = self.decoder.decode(&packet)? {
                return Ok(fetched);
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.close_tx.send_replace(true);
        if let Err(e) = self.channel.shutdown().await {
            debug!("Socket shutdown after close: {}", e);
        }
        info!("Binlog connection closed at {}", self.decoder.current);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binlog::fixtures::*;
    use crate::events::{CellValue, RowPayload};
    use crate::position::ResumeParams;
    use crate::source::ConnectionSettings;
    use crate::stream_reader::ALLOWED_EVENT_TYPES;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;
    use tokio_test::{assert_err, assert_ok};

    fn settings(resume: ResumeParams, blocking: bool) -> StreamSettings {
        StreamSettings {
            connection: ConnectionSettings {
                host: "127.0.0.1".to_string(),
                port: 3306,
                user: "repl".to_string(),
                passwd: String::new(),
            },
            server_id: 7,
            blocking,
            only_events: ALLOWED_EVENT_TYPES.to_vec(),
            resume,
            connect_timeout: Duration::from_secs(1),
        }
    }

    fn log_resume(file: &str, pos: u64) -> ResumeParams {
        ResumeParams {
            log_file: Some(file.to_string()),
            log_pos: Some(pos),
            auto_position: None,
            resume_stream: true,
        }
    }

    fn packet(type_code: EventType, body: &[u8], next_pos: u32) -> Vec<u8> {
        let mut data = vec![0x00];
        data.extend(event(type_code.code(), body, next_pos));
        data
    }

    #[test]
    fn test_create_binlog_dump_command() {
        let cmd = create_dump_command(&settings(log_resume("mysql-bin.000001", 120), true)).unwrap();

        assert_eq!(cmd[0], COM_BINLOG_DUMP);
        assert_eq!(u32::from_le_bytes([cmd[1], cmd[2], cmd[3], cmd[4]]), 120);
        assert_eq!(u16::from_le_bytes([cmd[5], cmd[6]]), 0);
        assert_eq!(u32::from_le_bytes([cmd[7], cmd[8], cmd[9], cmd[10]]), 7);
        assert_eq!(&cmd[11..], b"mysql-bin.000001");
    }

    #[test]
    fn test_dump_command_non_blocking_flag() {
        let cmd = create_dump_command(&settings(log_resume("mysql-bin.000001", 4), false)).unwrap();
        assert_eq!(u16::from_le_bytes([cmd[5], cmd[6]]), BINLOG_DUMP_NON_BLOCK);
    }

    #[test]
    fn test_create_binlog_dump_gtid_command() {
        let gtid_set = GtidSet::parse("3e11fa47-71ca-11e1-9e33-c80aa9429562:1-5").unwrap();
        let resume = ResumeParams {
            auto_position: Some(gtid_set.clone()),
            ..Default::default()
        };
        let cmd = create_dump_command(&settings(resume, true)).unwrap();

        assert_eq!(cmd[0], COM_BINLOG_DUMP_GTID);
        assert_eq!(u16::from_le_bytes([cmd[1], cmd[2]]), BINLOG_THROUGH_GTID);

        let encoded = gtid_set.encode().unwrap();
        // command(1) + flags(2) + server_id(4) + name_len(4) + pos(8) + data_len(4)
        assert_eq!(cmd.len(), 23 + encoded.len());
        assert!(cmd.ends_with(&encoded));
    }

    #[test]
    fn test_decoder_tracks_coordinates_and_rotation() {
        let mut decoder = EventDecoder::new(&settings(log_resume("mysql-bin.000001", 4), true));

        let query = packet(EventType::QueryEvent, &query_body("s", "BEGIN"), 300);
        let fetched = decoder.decode(&query).unwrap().unwrap();
        assert_eq!(fetched.position, BinlogPosition::new("mysql-bin.000001", 300));

        let rotate = packet(EventType::RotateEvent, &rotate_body("mysql-bin.000002", 4), 0);
        assert!(decoder.decode(&rotate).unwrap().is_none());
        assert_eq!(decoder.current, BinlogPosition::new("mysql-bin.000002", 4));

        let info = decoder.info.read().clone();
        assert_eq!(info.binlog_filename, "mysql-bin.000002");
        assert_eq!(info.binlog_position, 4);
    }

    #[test]
    fn test_decoder_rows_use_table_map() {
        let mut decoder = EventDecoder::new(&settings(log_resume("mysql-bin.000001", 4), true));

        let table_map = packet(EventType::TableMapEvent, &table_map_body(9), 200);
        assert!(decoder.decode(&table_map).unwrap().is_none());

        let rows = packet(EventType::WriteRowsEventV2, &rows_body(9, &[(1, "x")]), 260);
        let fetched = decoder.decode(&rows).unwrap().unwrap();

        match fetched.event {
            RawEvent::Rows(rows) => {
                assert_eq!(rows.table, "t");
                assert_eq!(
                    rows.rows,
                    vec![RowPayload::Values(vec![
                        CellValue::Int32(1),
                        CellValue::String("x".to_string())
                    ])]
                );
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(fetched.position.position, 260);
        assert_eq!(decoder.info.read().table.as_deref(), Some("t"));
    }

    #[test]
    fn test_decoder_skips_rows_without_table_map() {
        let mut decoder = EventDecoder::new(&settings(log_resume("mysql-bin.000001", 4), true));
        let rows = packet(EventType::WriteRowsEventV2, &rows_body(9, &[(1, "x")]), 260);

        assert!(decoder.decode(&rows).unwrap().is_none());
        assert_eq!(decoder.current.position, 260);
    }

    #[test]
    fn test_decoder_filters_and_tracks_gtid() {
        let mut resume_settings = settings(log_resume("mysql-bin.000001", 4), true);
        resume_settings.only_events = vec![EventType::QueryEvent];
        let mut decoder = EventDecoder::new(&resume_settings);

        let uuid = [0x11u8; 16];
        let gtid = packet(EventType::GtidEvent, &gtid_body(uuid, 3), 150);
        assert!(decoder.decode(&gtid).unwrap().is_none());

        let info = decoder.info.read().clone();
        assert!(info.gtid_set.contains("11111111-1111-1111-1111-111111111111:3"));
        assert_eq!(info.binlog_position, 150);
    }

    #[test]
    fn test_decoder_error_and_eof_packets() {
        let mut decoder = EventDecoder::new(&settings(log_resume("mysql-bin.000001", 4), true));

        let mut error = vec![0xFF];
        error.extend_from_slice(&1236u16.to_le_bytes());
        error.extend_from_slice(b"#HY000purged");
        assert!(matches!(decoder.decode(&error), Err(CdcError::Transport(_))));

        let eof = [0xFE, 0, 0, 2, 0];
        assert!(matches!(decoder.decode(&eof), Err(CdcError::Transport(_))));
    }

    #[tokio::test]
    async fn test_handle_close_interrupts_fetch() {
        let listener = assert_ok!(TcpListener::bind("127.0.0.1:0").await);
        let addr = assert_ok!(listener.local_addr());
        let server = tokio::spawn(async move { listener.accept().await });

        let channel = assert_ok!(
            PacketChannel::connect("127.0.0.1", addr.port(), Duration::from_secs(1)).await
        );
        let _peer = server.await;

        let decoder = EventDecoder::new(&settings(log_resume("mysql-bin.000001", 4), true));
        let mut source = MySqlBinlogSource::new(channel, None, decoder);
        let handle = source.handle();

        let closer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            handle.close();
        });

        let result = source.fetch_one().await;
        assert!(matches!(result, Err(CdcError::Transport(_))));
        assert_ok!(closer.await);

        assert!(source.handle().is_closed());
        assert_err!(source.fetch_one().await);
        assert_ok!(source.close().await);
    }

    async fn write_raw(stream: &mut TcpStream, sequence: u8, payload: &[u8]) {
        let mut header = (payload.len() as u32).to_le_bytes();
        header[3] = sequence;
        stream.write_all(&header).await.unwrap();
        stream.write_all(payload).await.unwrap();
    }

    async fn read_raw(stream: &mut TcpStream) -> Vec<u8> {
        let mut header = [0u8; 4];
        stream.read_exact(&mut header).await.unwrap();
        let length = u32::from_le_bytes([header[0], header[1], header[2], 0]) as usize;
        let mut payload = vec![0u8; length];
        stream.read_exact(&mut payload).await.unwrap();
        payload
    }

    fn greeting() -> Vec<u8> {
        let mut data = vec![10u8];
        data.extend_from_slice(b"8.0.36\0");
        data.extend_from_slice(&42u32.to_le_bytes());
        data.extend_from_slice(b"abcdefgh");
        data.push(0);
        data.extend_from_slice(&0xf7ffu16.to_le_bytes());
        data.push(33);
        data.extend_from_slice(&2u16.to_le_bytes());
        data.extend_from_slice(&0x81ffu16.to_le_bytes());
        data.push(21);
        data.extend_from_slice(&[0u8; 10]);
        data.extend_from_slice(b"ijklmnopqrst\0");
        data.extend_from_slice(b"mysql_native_password\0");
        data
    }

    fn error_packet(code: u16, message: &str) -> Vec<u8> {
        let mut data = vec![0xFF];
        data.extend_from_slice(&code.to_le_bytes());
        data.extend_from_slice(b"#HY000");
        data.extend_from_slice(message.as_bytes());
        data
    }

    /// greeting → OK(인증) → OK(checksum) → `dump_reply` 순서로 응답하는 서버.
    /// 클라이언트가 보낸 handshake, checksum 쿼리, dump 명령을 돌려줌
    async fn replica_server(dump_reply: Vec<u8>) -> (u16, JoinHandle<Vec<Vec<u8>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let ok = [0x00u8, 0, 0, 2, 0, 0, 0];

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();

            write_raw(&mut stream, 0, &greeting()).await;
            received.push(read_raw(&mut stream).await);
            write_raw(&mut stream, 2, &ok).await;

            received.push(read_raw(&mut stream).await);
            write_raw(&mut stream, 1, &ok).await;

            received.push(read_raw(&mut stream).await);
            write_raw(&mut stream, 1, &dump_reply).await;

            received
        });

        (port, server)
    }

    fn settings_for(port: u16, resume: ResumeParams) -> StreamSettings {
        let mut settings = settings(resume, true);
        settings.connection.port = port;
        settings
    }

    #[tokio::test]
    async fn test_connect_purged_log_is_not_resumable() {
        let (port, server) = replica_server(error_packet(
            ER_MASTER_FATAL_ERROR_READING_BINLOG,
            "Could not find first log file name in binary log index file",
        ))
        .await;

        let result = MySqlConnector
            .connect(settings_for(port, log_resume("mysql-bin.000001", 4)))
            .await;
        match result {
            Err(CdcError::NotResumable(message)) => assert!(message.contains("1236")),
            Err(other) => panic!("expected NotResumable, got {:?}", other),
            Ok(_) => panic!("expected NotResumable, stream opened"),
        }

        let received = assert_ok!(server.await);
        assert_eq!(&received[0][32..37], b"repl\0");
        assert_eq!(received[1][0], protocol::COM_QUERY);
        assert_eq!(&received[1][1..], b"SET @master_binlog_checksum='NONE'");
        assert_eq!(received[2][0], COM_BINLOG_DUMP);
        assert!(received[2].ends_with(b"mysql-bin.000001"));
    }

    #[tokio::test]
    async fn test_connect_other_server_error_is_transport() {
        let (port, server) = replica_server(error_packet(
            1227,
            "Access denied; you need the REPLICATION SLAVE privilege",
        ))
        .await;

        let result = MySqlConnector
            .connect(settings_for(port, log_resume("mysql-bin.000001", 4)))
            .await;
        match result {
            Err(CdcError::Transport(message)) => assert!(message.contains("1227")),
            Err(other) => panic!("expected Transport, got {:?}", other),
            Ok(_) => panic!("expected Transport, stream opened"),
        }
        assert_ok!(server.await);
    }

    #[tokio::test]
    async fn test_connect_returns_first_event_as_fetch() {
        let mut first_event = vec![0x00];
        first_event.extend(event(
            EventType::QueryEvent.code(),
            &query_body("s", "BEGIN"),
            100,
        ));
        let (port, server) = replica_server(first_event).await;

        let mut source = assert_ok!(
            MySqlConnector
                .connect(settings_for(port, log_resume("bin.1", 4)))
                .await
        );
        let fetched = assert_ok!(source.fetch_one().await);

        assert!(matches!(fetched.event, RawEvent::Query(ref q) if q.query == "BEGIN"));
        assert_eq!(fetched.position, BinlogPosition::new("bin.1", 100));
        assert_eq!(source.current_position(), &BinlogPosition::new("bin.1", 100));

        assert_ok!(server.await);
        assert_ok!(source.close().await);
    }
}
