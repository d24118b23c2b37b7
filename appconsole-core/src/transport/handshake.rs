use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{ConsoleError, Result};

/// Version string the service writes first (ASCII, no terminator).
pub const SERVICE_HANDSHAKE: &[u8; 15] = b"APPSERVICEV0001";

/// Version string the client answers with (ASCII, no terminator).
pub const CLIENT_HANDSHAKE: &[u8; 14] = b"APPCLIENTV0001";

/// Client side of the handshake: read the service greeting, verify it
/// byte for byte, then present the client version string.
///
/// No framed message may flow before this returns `Ok`.
pub async fn connect_as_client<S>(stream: &mut S) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut greeting = [0u8; SERVICE_HANDSHAKE.len()];
    stream.read_exact(&mut greeting).await?;
    if &greeting != SERVICE_HANDSHAKE {
        return Err(ConsoleError::HandshakeFailed(Some(format!(
            "unexpected service version string {:?}",
            String::from_utf8_lossy(&greeting)
        ))));
    }

    stream.write_all(CLIENT_HANDSHAKE).await?;
    stream.flush().await?;
    Ok(())
}

/// Service side of the handshake: present the service version string, then
/// read and verify the client's answer.
pub async fn accept_as_service<S>(stream: &mut S) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(SERVICE_HANDSHAKE).await?;
    stream.flush().await?;

    let mut reply = [0u8; CLIENT_HANDSHAKE.len()];
    stream.read_exact(&mut reply).await?;
    if &reply != CLIENT_HANDSHAKE {
        return Err(ConsoleError::HandshakeFailed(Some(format!(
            "unexpected client version string {:?}",
            String::from_utf8_lossy(&reply)
        ))));
    }
    Ok(())
}
