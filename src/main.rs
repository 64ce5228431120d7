/// binlog 스트림을 따라가며 정규화된 이벤트를 출력하는 예제
///
/// 시작 위치: BINLOG_FILE/BINLOG_POS, 또는 BINLOG_GTID_SET, 없으면 서버의 현재 위치
use mysql_binlog_stream::config::{ConnectionConfig, SourceDatabaseConfig};
use mysql_binlog_stream::connection::MySqlConnection;
use mysql_binlog_stream::error::{CdcError, Result};
use mysql_binlog_stream::gtid::GtidSet;
use mysql_binlog_stream::position::Position;
use mysql_binlog_stream::stream_reader::BinlogStreamReaderWrapper;
use std::env;
use tracing::{error, info};

async fn start_position(config: &ConnectionConfig) -> Result<Position> {
    if let Ok(file) = env::var("BINLOG_FILE") {
        let pos = match env::var("BINLOG_POS") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| CdcError::ConfigError(format!("Invalid BINLOG_POS: {}", raw)))?,
            Err(_) => 4,
        };
        return Ok(Position::log(file, pos));
    }

    if let Ok(raw) = env::var("BINLOG_GTID_SET") {
        return Ok(Position::gtid(GtidSet::parse(&raw)?));
    }

    let mut conn = MySqlConnection::connect(config).await?;
    let position = conn.current_position().await?;
    conn.close().await?;
    Ok(position)
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // 로깅 초기화
    tracing_subscriber::fmt::init();

    // SOURCE_DATABASES(JSON)가 있으면 첫 번째 항목 사용
    let config = match env::var("SOURCE_DATABASES") {
        Ok(raw) => SourceDatabaseConfig::from_json_str(&raw)?.primary()?.clone(),
        Err(_) => ConnectionConfig::from_env()?,
    };
    info!("Connecting to {}:{}", config.hostname, config.port);

    let position = start_position(&config).await?;
    let mut stream = BinlogStreamReaderWrapper::open(&config, &position).await?;

    let handle = stream.source().handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, closing binlog stream");
            handle.close();
        }
    });

    loop {
        match stream.pop().await {
            Ok(event) => info!("{}", serde_json::to_string(&event)?),
            Err(CdcError::Transport(reason)) if stream.source().handle().is_closed() => {
                info!("Stream stopped: {}", reason);
                break;
            }
            Err(e) => {
                error!("Binlog stream failed (fatal={}): {}", e.is_fatal(), e);
                stream.close().await?;
                return Err(e.into());
            }
        }
    }

    let current = stream.source().current_position();
    info!(
        "Stopped at {} (file sequence {:?})",
        current,
        current.file_sequence()
    );
    let last = stream.source().handle().source_info();
    info!("Resume from: {}", last.position(true));
    stream.close().await?;
    Ok(())
}
