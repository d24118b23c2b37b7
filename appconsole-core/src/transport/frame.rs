use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{ConsoleError, Result};

/// Exclusive upper bound on `payload_length`. A frame announcing this many
/// bytes or more is corrupt and the connection must be torn down.
pub const MAX_PAYLOAD_LENGTH: i32 = 10_000_000;

/// Write one frame: metadata length, metadata, payload length, payload.
///
/// The four segments are written back to back; callers that share a stream
/// between writers must serialize calls (see
/// [`super::connection::Connection`], which drains a FIFO queue from a
/// single task). A failed write leaves the stream unusable.
pub async fn write_frame<W>(writer: &mut W, metadata: &[u8], payload: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let metadata_length =
        i16::try_from(metadata.len()).map_err(|_| ConsoleError::CorruptMessage)?;
    let payload_length = i32::try_from(payload.len()).map_err(|_| ConsoleError::CorruptMessage)?;
    if payload_length >= MAX_PAYLOAD_LENGTH {
        return Err(ConsoleError::CorruptMessage);
    }

    writer.write_i16_le(metadata_length).await?;
    writer.write_all(metadata).await?;
    writer.write_i32_le(payload_length).await?;
    if !payload.is_empty() {
        writer.write_all(payload).await?;
    }
    writer.flush().await?;
    Ok(())
}

/// Read one complete frame, blocking on each segment in turn.
///
/// An out-of-range length field yields [`ConsoleError::CorruptMessage`]
/// without consuming any bytes past the length field itself. Short reads
/// surface as [`ConsoleError::Io`]; both are fatal to the connection.
pub async fn read_frame<R>(reader: &mut R) -> Result<(Vec<u8>, Vec<u8>)>
where
    R: AsyncRead + Unpin,
{
    let metadata_length = reader.read_i16_le().await?;
    if metadata_length < 0 {
        return Err(ConsoleError::CorruptMessage);
    }
    let mut metadata = vec![0u8; metadata_length as usize];
    reader.read_exact(&mut metadata).await?;

    let payload_length = reader.read_i32_le().await?;
    if !(0..MAX_PAYLOAD_LENGTH).contains(&payload_length) {
        return Err(ConsoleError::CorruptMessage);
    }
    let mut payload = vec![0u8; payload_length as usize];
    if payload_length > 0 {
        reader.read_exact(&mut payload).await?;
    }

    Ok((metadata, payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn encode(metadata: &[u8], payload: &[u8]) -> Vec<u8> {
        let mut buf = std::io::Cursor::new(Vec::new());
        write_frame(&mut buf, metadata, payload).await.unwrap();
        buf.into_inner()
    }

    #[tokio::test]
    async fn round_trip() {
        let metadata = b"{\"messageType\":\"consoleOutput\"}";
        let payload = b"hello over the wire";
        let bytes = encode(metadata, payload).await;

        let mut reader: &[u8] = &bytes;
        let (m, p) = read_frame(&mut reader).await.unwrap();
        assert_eq!(m, metadata);
        assert_eq!(p, payload);
        assert!(reader.is_empty());
    }

    #[tokio::test]
    async fn empty_payload_is_omitted() {
        let bytes = encode(&[1], &[]).await;
        // int16 + 1 metadata byte + int32, nothing after the payload length
        assert_eq!(bytes.len(), 2 + 1 + 4);

        let mut reader: &[u8] = &bytes;
        let (m, p) = read_frame(&mut reader).await.unwrap();
        assert_eq!(m, vec![1]);
        assert!(p.is_empty());
    }

    #[tokio::test]
    async fn layout_is_little_endian() {
        let bytes = encode(b"ab", b"xyz").await;
        assert_eq!(&bytes[..2], &[2, 0]);
        assert_eq!(&bytes[2..4], b"ab");
        assert_eq!(&bytes[4..8], &[3, 0, 0, 0]);
        assert_eq!(&bytes[8..], b"xyz");
    }

    #[tokio::test]
    async fn payload_at_cap_is_rejected_without_consuming_past_length() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0i16.to_le_bytes());
        bytes.extend_from_slice(&MAX_PAYLOAD_LENGTH.to_le_bytes());
        bytes.extend_from_slice(b"trailing");

        let mut reader: &[u8] = &bytes;
        let err = read_frame(&mut reader).await.unwrap_err();
        assert!(matches!(err, ConsoleError::CorruptMessage));
        assert_eq!(reader, b"trailing");
    }

    #[tokio::test]
    async fn negative_payload_length_is_rejected() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0i16.to_le_bytes());
        bytes.extend_from_slice(&(-1i32).to_le_bytes());

        let mut reader: &[u8] = &bytes;
        let err = read_frame(&mut reader).await.unwrap_err();
        assert!(matches!(err, ConsoleError::CorruptMessage));
    }

    #[tokio::test]
    async fn negative_metadata_length_is_rejected() {
        let mut reader: &[u8] = &(-1i16).to_le_bytes();
        let err = read_frame(&mut reader).await.unwrap_err();
        assert!(matches!(err, ConsoleError::CorruptMessage));
    }

    #[tokio::test]
    async fn oversized_payload_is_not_written() {
        let payload = vec![0u8; MAX_PAYLOAD_LENGTH as usize];
        let mut buf = std::io::Cursor::new(Vec::new());
        let err = write_frame(&mut buf, &[], &payload).await.unwrap_err();
        assert!(matches!(err, ConsoleError::CorruptMessage));
    }

    #[tokio::test]
    async fn short_read_is_an_io_error() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0i16.to_le_bytes());
        bytes.extend_from_slice(&100i32.to_le_bytes());
        bytes.extend_from_slice(b"only a few bytes");

        let mut reader: &[u8] = &bytes;
        let err = read_frame(&mut reader).await.unwrap_err();
        assert!(matches!(err, ConsoleError::Io(_)));
    }
}
