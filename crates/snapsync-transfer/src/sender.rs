//! Sender state machine.
//!
//! Dial, offer, wait for the verdict, stream the file in bounded chunks,
//! finish with DONE. Every chunk is flushed individually so the receiver
//! sees per-chunk boundaries promptly and progress stays live on both ends.

use std::{io::Write, path::PathBuf};

use bytes::Bytes;
use snapsync_core::{
    AppError, Result,
    progress::{Printer, Tracker},
};
use snapsync_proto::{Frame, FrameType, MAX_CHUNK_SIZE, Offer, decode_error_message};
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncWriteExt, BufReader, BufWriter},
    net::TcpStream,
};

use crate::wire::{read_frame, write_frame};

/// Controls sender behavior.
pub struct SendOptions {
    /// Path of the regular file to send.
    pub path: PathBuf,
    /// Receiver endpoint, `host:port` or `[ipv6]:port`.
    pub to: String,
    /// Destination filename override; the source basename when `None`.
    pub name: Option<String>,
    /// Emit progress as NDJSON instead of text.
    pub json: bool,
    /// Progress sink, typically stdout.
    pub out: Box<dyn Write + Send>,
}

/// Stream one file to a remote receiver.
///
/// # Errors
///
/// - [`ErrorKind::Usage`](snapsync_core::ErrorKind::Usage) for a missing
///   endpoint or a source that is not a regular file
/// - [`ErrorKind::Io`](snapsync_core::ErrorKind::Io) for source file faults
/// - [`ErrorKind::Network`](snapsync_core::ErrorKind::Network) for dial or
///   socket faults
/// - [`ErrorKind::Rejected`](snapsync_core::ErrorKind::Rejected) when the
///   receiver declines, carrying its message
/// - [`ErrorKind::InvalidProtocol`](snapsync_core::ErrorKind::InvalidProtocol)
///   for malformed or unexpected response frames
pub async fn send_file(options: SendOptions) -> Result<()> {
    let SendOptions { path, to, name, json, out } = options;
    if to.is_empty() {
        return Err(AppError::usage("--to is required"));
    }

    let mut file = File::open(&path)
        .await
        .map_err(|err| AppError::io(format!("open source file {}", path.display())).caused_by(err))?;
    let metadata = file
        .metadata()
        .await
        .map_err(|err| AppError::io(format!("stat source file {}", path.display())).caused_by(err))?;
    if !metadata.is_file() {
        return Err(AppError::usage(format!(
            "source path {} is not a regular file",
            path.display()
        )));
    }
    let size = metadata.len();

    let name = match name.filter(|n| !n.is_empty()) {
        Some(name) => name,
        None => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                AppError::usage(format!("cannot derive a file name from {}", path.display()))
            })?,
    };

    let stream = TcpStream::connect(&to)
        .await
        .map_err(|err| AppError::network(format!("dial {to:?}")).caused_by(err))?;
    tracing::debug!(endpoint = %to, file = %path.display(), size, "connected");

    let (read_half, write_half) = stream.into_split();
    let mut reader = BufReader::with_capacity(MAX_CHUNK_SIZE, read_half);
    let mut writer = BufWriter::with_capacity(MAX_CHUNK_SIZE, write_half);

    write_frame(&mut writer, &Frame::empty(FrameType::Hello))
        .await
        .map_err(|err| err.context("send hello"))?;
    let offer_payload = Offer { name, size }.encode()?;
    write_frame(&mut writer, &Frame::new(FrameType::Offer, offer_payload))
        .await
        .map_err(|err| err.context("send offer"))?;
    writer.flush().await.map_err(|err| AppError::network("flush offer").caused_by(err))?;

    let response =
        read_frame(&mut reader).await.map_err(|err| err.context("read offer response"))?;
    match response.frame_type() {
        Some(FrameType::Error) => {
            let message = decode_error_message(&response.payload)
                .map_err(|err| AppError::from(err).context("decode rejection"))?;
            return Err(AppError::rejected(format!("receiver rejected transfer: {message}")));
        },
        Some(FrameType::Accept) => {},
        _ => {
            return Err(AppError::invalid_protocol(format!(
                "expected ACCEPT, got type {}",
                response.type_code
            )));
        },
    }

    let mut tracker = Tracker::new(size);
    let mut printer = Printer::new(out, "send", json);
    let mut buf = vec![0u8; MAX_CHUNK_SIZE];
    loop {
        let n = file
            .read(&mut buf)
            .await
            .map_err(|err| AppError::io("read source file").caused_by(err))?;
        if n == 0 {
            break;
        }

        let frame = Frame::new(FrameType::Data, Bytes::copy_from_slice(&buf[..n]));
        write_frame(&mut writer, &frame).await.map_err(|err| err.context("write data frame"))?;
        writer.flush().await.map_err(|err| AppError::network("flush data frame").caused_by(err))?;
        printer.print_maybe(&tracker.add(n))?;
    }

    write_frame(&mut writer, &Frame::empty(FrameType::Done))
        .await
        .map_err(|err| err.context("send done"))?;
    writer.flush().await.map_err(|err| AppError::network("flush done").caused_by(err))?;
    printer.print_final(&tracker.add(0), None)?;

    Ok(())
}
