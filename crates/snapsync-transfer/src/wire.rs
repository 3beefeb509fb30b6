//! Async frame I/O over a connection.
//!
//! The codec itself is pure (`snapsync-proto`); this module drives it
//! against a socket: read exactly one header, validate it, and only then
//! allocate and read the payload. A hostile length field is rejected before
//! any allocation happens.

use bytes::Bytes;
use snapsync_core::{AppError, Result};
use snapsync_proto::{Frame, FrameHeader};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Read one frame: exactly [`FrameHeader::SIZE`] header bytes, then exactly
/// the declared payload length.
///
/// # Errors
///
/// - [`ErrorKind::Network`](snapsync_core::ErrorKind::Network) for socket
///   failures, including short reads
/// - [`ErrorKind::InvalidProtocol`](snapsync_core::ErrorKind::InvalidProtocol)
///   for header validation failures
pub async fn read_frame<R>(reader: &mut R) -> Result<Frame>
where
    R: AsyncRead + Unpin,
{
    let mut header_bytes = [0u8; FrameHeader::SIZE];
    reader
        .read_exact(&mut header_bytes)
        .await
        .map_err(|err| AppError::network("read frame header").caused_by(err))?;

    let header = FrameHeader::parse(&header_bytes)?;

    let payload_len = header.payload_len() as usize;
    let mut payload = vec![0u8; payload_len];
    if payload_len > 0 {
        reader
            .read_exact(&mut payload)
            .await
            .map_err(|err| AppError::network("read frame payload").caused_by(err))?;
    }

    Ok(Frame { type_code: header.type_code(), payload: Bytes::from(payload) })
}

/// Encode and write one frame. Does not flush; the caller owns buffering.
///
/// # Errors
///
/// - [`ErrorKind::InvalidProtocol`](snapsync_core::ErrorKind::InvalidProtocol)
///   when the payload exceeds the frame size limit
/// - [`ErrorKind::Network`](snapsync_core::ErrorKind::Network) for socket
///   failures
pub async fn write_frame<W>(writer: &mut W, frame: &Frame) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::with_capacity(FrameHeader::SIZE + frame.payload.len());
    frame.encode(&mut buf)?;
    writer.write_all(&buf).await.map_err(|err| AppError::network("write frame").caused_by(err))
}
