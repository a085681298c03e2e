//! Common utilities shared across examples.

use bytes::BytesMut;
use fixstatus::core::Message;
use fixstatus::tagvalue::{Decoder, try_frame};
use tokio::io::AsyncReadExt;
use tokio::net::tcp::OwnedReadHalf;

/// Initializes logging for examples.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .try_init();
}

/// Formats the current time as a FIX UTCTimestamp with milliseconds.
pub fn format_timestamp() -> String {
    chrono::Utc::now().format("%Y%m%d-%H:%M:%S%.3f").to_string()
}

/// Reads the next complete frame and its decoded message, or `None` once
/// the peer closes.
pub async fn read_message(
    reader: &mut OwnedReadHalf,
    buf: &mut BytesMut,
    validate_checksum: bool,
) -> anyhow::Result<Option<(BytesMut, Message)>> {
    loop {
        if let Some(len) = try_frame(buf)? {
            let frame = buf.split_to(len);
            let message = Decoder::new(&frame)
                .with_checksum_validation(validate_checksum)
                .decode()?;
            return Ok(Some((frame, message)));
        }
        if reader.read_buf(buf).await? == 0 {
            return Ok(None);
        }
    }
}
