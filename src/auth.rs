//! MySQL 인증 처리
//!
//! Native password authentication 구현

use crate::error::{CdcError, Result};
use crate::protocol::{self, AuthSwitchRequest, ErrorPacket, GreetingPacket, PacketChannel};
use crate::source::ConnectionSettings;
use byteorder::{LittleEndian, WriteBytesExt};
use sha1::{Digest, Sha1};
use std::io::Write;
use tracing::{debug, info};

pub const NATIVE_PASSWORD_PLUGIN: &str = "mysql_native_password";

/// Client capability flags
pub mod capabilities {
    pub const LONG_PASSWORD: u32 = 1;
    pub const LONG_FLAG: u32 = 4;
    pub const CONNECT_WITH_DB: u32 = 8;
    pub const PROTOCOL_41: u32 = 512;
    pub const TRANSACTIONS: u32 = 8192;
    pub const SECURE_CONNECTION: u32 = 32768;
    pub const MULTI_STATEMENTS: u32 = 1 << 16;
    pub const MULTI_RESULTS: u32 = 1 << 17;
    pub const PLUGIN_AUTH: u32 = 1 << 19;
}

/// Native password 인증 응답 생성
///
/// XOR(SHA1(password), SHA1(scramble + SHA1(SHA1(password))))
pub fn create_auth_response(password: &str, scramble: &[u8]) -> Vec<u8> {
    if password.is_empty() {
        return Vec::new();
    }

    let stage1 = sha1(password.as_bytes());
    let stage2 = sha1(&stage1);

    let mut combined = scramble.to_vec();
    combined.extend_from_slice(&stage2);
    let stage3 = sha1(&combined);

    stage1.iter().zip(stage3.iter()).map(|(a, b)| a ^ b).collect()
}

fn sha1(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha1::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Handshake response 패킷 생성
pub fn create_handshake_response(
    username: &str,
    password: &str,
    database: Option<&str>,
    scramble: &[u8],
    collation: u8,
) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();

    let mut flags = capabilities::LONG_PASSWORD
        | capabilities::LONG_FLAG
        | capabilities::PROTOCOL_41
        | capabilities::TRANSACTIONS
        | capabilities::SECURE_CONNECTION
        | capabilities::MULTI_STATEMENTS
        | capabilities::MULTI_RESULTS
        | capabilities::PLUGIN_AUTH;

    if database.is_some() {
        flags |= capabilities::CONNECT_WITH_DB;
    }

    buffer.write_u32::<LittleEndian>(flags)?;

    // Max packet size - 0 means default (16MB)
    buffer.write_u32::<LittleEndian>(0)?;
    buffer.write_u8(collation)?;
    buffer.write_all(&[0u8; 23])?;

    buffer.write_all(username.as_bytes())?;
    buffer.write_u8(0)?;

    let auth_response = create_auth_response(password, scramble);
    buffer.write_u8(auth_response.len() as u8)?;
    buffer.write_all(&auth_response)?;

    if let Some(db) = database {
        buffer.write_all(db.as_bytes())?;
        buffer.write_u8(0)?;
    }

    buffer.write_all(NATIVE_PASSWORD_PLUGIN.as_bytes())?;
    buffer.write_u8(0)?;

    Ok(buffer)
}

/// greeting 수신부터 인증 완료까지 수행
pub async fn authenticate(
    channel: &mut PacketChannel,
    connection: &ConnectionSettings,
    database: Option<&str>,
) -> Result<GreetingPacket> {
    let greeting_packet = channel.read_packet().await?;
    let greeting = GreetingPacket::parse(&greeting_packet)?;

    info!(
        "MySQL Server version: {}, Thread ID: {}",
        greeting.server_version, greeting.thread_id
    );

    let response = create_handshake_response(
        &connection.user,
        &connection.passwd,
        database,
        &greeting.scramble,
        greeting.server_collation,
    )?;
    channel.write_packet(&response, channel.sequence().wrapping_add(1)).await?;

    let mut result = channel.read_packet().await?;

    if result.first() == Some(&0xFE) && !protocol::is_eof_packet(&result) {
        let switch = AuthSwitchRequest::parse(&result)?;
        debug!("Server requested auth switch to {}", switch.plugin_name);

        if switch.plugin_name != NATIVE_PASSWORD_PLUGIN {
            return Err(CdcError::AuthenticationError(format!(
                "Unsupported auth plugin: {}",
                switch.plugin_name
            )));
        }

        let response = create_auth_response(&connection.passwd, &switch.scramble);
        channel.write_packet(&response, channel.sequence().wrapping_add(1)).await?;
        result = channel.read_packet().await?;
    }

    if protocol::is_error_packet(&result) {
        let err = ErrorPacket::parse(&result)?;
        return Err(CdcError::AuthenticationError(err.to_string()));
    }
    if !protocol::is_ok_packet(&result) {
        return Err(CdcError::AuthenticationError(format!(
            "Unexpected authentication reply: 0x{:02x}",
            result.first().copied().unwrap_or_default()
        )));
    }

    info!("Authentication successful");
    Ok(greeting)
}
