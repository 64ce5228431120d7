//! MySQL 프로토콜 패킷 처리
//!
//! mysql-binlog-connector-java의 PacketChannel과 동일한 기능 제공

use crate::error::{CdcError, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use bytes::{Bytes, BytesMut};
use std::io::Read;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

/// 패킷 하나의 최대 payload 길이. 이 길이의 패킷 뒤에는 이어지는 패킷이 옴
const MAX_PACKET_LENGTH: usize = 0x00ff_ffff;

/// MySQL 패킷 채널
pub struct PacketChannel {
    stream: TcpStream,
    sequence: u8,
}

impl PacketChannel {
    /// 새 패킷 채널 생성 (TCP 연결)
    pub async fn connect(hostname: &str, port: u16, timeout: Duration) -> Result<Self> {
        let addr = format!("{}:{}", hostname, port);
        let stream = tokio::time::timeout(timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| CdcError::ConnectionError(format!("Timed out connecting to {}", addr)))?
            .map_err(|e| CdcError::ConnectionError(format!("Failed to connect to {}: {}", addr, e)))?;

        stream.set_nodelay(true)?;
        debug!("Connected to MySQL at {}", addr);

        Ok(PacketChannel {
            stream,
            sequence: 0,
        })
    }

    /// 마지막으로 읽은 패킷의 sequence 번호
    pub fn sequence(&self) -> u8 {
        self.sequence
    }

    /// 패킷 읽기 (16MB 이상으로 나뉜 패킷은 합쳐서 반환)
    pub async fn read_packet(&mut self) -> Result<Bytes> {
        let mut payload = BytesMut::new();

        loop {
            // 패킷 헤더 (3 bytes length + 1 byte sequence)
            let mut header = [0u8; 4];
            self.stream
                .read_exact(&mut header)
                .await
                .map_err(|e| CdcError::Transport(format!("Failed to read packet header: {}", e)))?;
            let length = u32::from_le_bytes([header[0], header[1], header[2], 0]) as usize;
            self.sequence = header[3];

            let start = payload.len();
            payload.resize(start + length, 0);
            self.stream
                .read_exact(&mut payload[start..])
                .await
                .map_err(|e| CdcError::Transport(format!("Failed to read packet body: {}", e)))?;

            if length < MAX_PACKET_LENGTH {
                break;
            }
        }

        Ok(payload.freeze())
    }

    /// 패킷 쓰기
    pub async fn write_packet(&mut self, data: &[u8], sequence: u8) -> Result<()> {
        let length = data.len() as u32;
        let mut header = length.to_le_bytes();
        header[3] = sequence;

        self.stream
            .write_all(&header)
            .await
            .map_err(|e| CdcError::Transport(format!("Failed to write header: {}", e)))?;
        self.stream
            .write_all(data)
            .await
            .map_err(|e| CdcError::Transport(format!("Failed to write data: {}", e)))?;
        self.stream
            .flush()
            .await
            .map_err(|e| CdcError::Transport(format!("Failed to flush: {}", e)))?;

        Ok(())
    }

    /// COM_QUERY 전송 후 응답 패킷 반환
    pub async fn query(&mut self, sql: &str) -> Result<Bytes> {
        let mut packet = Vec::with_capacity(sql.len() + 1);
        packet.push(COM_QUERY);
        packet.extend_from_slice(sql.as_bytes());

        self.write_packet(&packet, 0).await?;
        self.read_packet().await
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.stream
            .shutdown()
            .await
            .map_err(|e| CdcError::Transport(format!("Failed to shut down socket: {}", e)))
    }
}

/// COM_QUERY 명령어 코드
pub const COM_QUERY: u8 = 0x03;

/// Greeting 패킷 파싱
pub struct GreetingPacket {
    pub protocol_version: u8,
    pub server_version: String,
    pub thread_id: u32,
    pub scramble: Vec<u8>,
    pub server_capabilities: u32,
    pub server_collation: u8,
    pub server_status: u16,
    pub auth_plugin_name: Option<String>,
}

impl GreetingPacket {
    pub fn parse(data: &[u8]) -> Result<Self> {
        if is_error_packet(data) {
            let err = ErrorPacket::parse(data)?;
            return Err(CdcError::ConnectionError(format!(
                "Server refused connection: {}",
                err
            )));
        }

        let mut cursor = std::io::Cursor::new(data);

        let protocol_version = ReadBytesExt::read_u8(&mut cursor)
            .map_err(|e| CdcError::ProtocolError(format!("Failed to read protocol version: {}", e)))?;
        let server_version = read_null_terminated_string(&mut cursor)?;
        let thread_id = ReadBytesExt::read_u32::<LittleEndian>(&mut cursor)
            .map_err(|e| CdcError::ProtocolError(format!("Failed to read thread ID: {}", e)))?;

        // Auth plugin data part 1 (8 bytes)
        let mut scramble = vec![0u8; 8];
        Read::read_exact(&mut cursor, &mut scramble)
            .map_err(|e| CdcError::ProtocolError(format!("Failed to read scramble part 1: {}", e)))?;

        // Filler (1 byte, always 0x00)
        ReadBytesExt::read_u8(&mut cursor)
            .map_err(|e| CdcError::ProtocolError(format!("Failed to read filler: {}", e)))?;

        let capabilities_lower = ReadBytesExt::read_u16::<LittleEndian>(&mut cursor)
            .map_err(|e| CdcError::ProtocolError(format!("Failed to read capabilities: {}", e)))?;
        let server_collation = ReadBytesExt::read_u8(&mut cursor)
            .map_err(|e| CdcError::ProtocolError(format!("Failed to read collation: {}", e)))?;
        let server_status = ReadBytesExt::read_u16::<LittleEndian>(&mut cursor)
            .map_err(|e| CdcError::ProtocolError(format!("Failed to read status: {}", e)))?;
        let capabilities_upper = ReadBytesExt::read_u16::<LittleEndian>(&mut cursor)
            .map_err(|e| CdcError::ProtocolError(format!("Failed to read capabilities upper: {}", e)))?;

        let server_capabilities = (capabilities_upper as u32) << 16 | capabilities_lower as u32;

        let auth_data_len = ReadBytesExt::read_u8(&mut cursor)
            .map_err(|e| CdcError::ProtocolError(format!("Failed to read auth data length: {}", e)))?;

        // Reserved (10 bytes)
        let mut reserved = [0u8; 10];
        Read::read_exact(&mut cursor, &mut reserved)
            .map_err(|e| CdcError::ProtocolError(format!("Failed to read reserved: {}", e)))?;

        // Auth plugin data part 2 (최소 13 bytes, 마지막 null byte 제외)
        let scramble_len = std::cmp::max(13, auth_data_len.saturating_sub(8)) as usize;
        let mut scramble_part2 = vec![0u8; scramble_len];
        Read::read_exact(&mut cursor, &mut scramble_part2)
            .map_err(|e| CdcError::ProtocolError(format!("Failed to read scramble part 2: {}", e)))?;
        scramble.extend_from_slice(&scramble_part2[..scramble_len - 1]);

        let auth_plugin_name = read_null_terminated_string(&mut cursor).ok();

        Ok(GreetingPacket {
            protocol_version,
            server_version,
            thread_id,
            scramble,
            server_capabilities,
            server_collation,
            server_status,
            auth_plugin_name,
        })
    }
}

/// Error 패킷 (0xFF)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPacket {
    pub code: u16,
    pub sql_state: Option<String>,
    pub message: String,
}

impl ErrorPacket {
    pub fn parse(data: &[u8]) -> Result<Self> {
        if !is_error_packet(data) || data.len() < 3 {
            return Err(CdcError::ProtocolError("Not an error packet".to_string()));
        }

        let code = u16::from_le_bytes([data[1], data[2]]);
        let (sql_state, message) = if data.len() >= 9 && data[3] == b'#' {
            (
                Some(String::from_utf8_lossy(&data[4..9]).to_string()),
                &data[9..],
            )
        } else {
            (None, &data[3..])
        };

        Ok(ErrorPacket {
            code,
            sql_state,
            message: String::from_utf8_lossy(message).to_string(),
        })
    }
}

impl std::fmt::Display for ErrorPacket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.sql_state {
            Some(state) => write!(f, "[{}] ({}) {}", self.code, state, self.message),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

/// Auth switch 요청 (0xFE)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSwitchRequest {
    pub plugin_name: String,
    pub scramble: Vec<u8>,
}

impl AuthSwitchRequest {
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.first() != Some(&0xFE) {
            return Err(CdcError::ProtocolError("Not an auth switch request".to_string()));
        }

        let mut cursor = std::io::Cursor::new(&data[1..]);
        let plugin_name = read_null_terminated_string(&mut cursor)?;
        let rest = &data[1 + cursor.position() as usize..];
        let scramble = match rest.split_last() {
            Some((&0, body)) => body.to_vec(),
            _ => rest.to_vec(),
        };

        Ok(AuthSwitchRequest {
            plugin_name,
            scramble,
        })
    }
}

/// null로 끝나는 문자열 읽기
fn read_null_terminated_string<R: Read>(reader: &mut R) -> Result<String> {
    let mut bytes = Vec::new();
    loop {
        let byte = ReadBytesExt::read_u8(reader)
            .map_err(|e| CdcError::ProtocolError(format!("Failed to read string byte: {}", e)))?;
        if byte == 0 {
            break;
        }
        bytes.push(byte);
    }
    String::from_utf8(bytes)
        .map_err(|e| CdcError::ProtocolError(format!("Invalid UTF-8 in string: {}", e)))
}

/// Error 패킷 확인
pub fn is_error_packet(data: &[u8]) -> bool {
    !data.is_empty() && data[0] == 0xFF
}

/// OK 패킷 확인
pub fn is_ok_packet(data: &[u8]) -> bool {
    !data.is_empty() && data[0] == 0x00
}

/// EOF 패킷 확인 (0xFE, 9 바이트 미만)
pub fn is_eof_packet(data: &[u8]) -> bool {
    !data.is_empty() && data[0] == 0xFE && data.len() < 9
}
