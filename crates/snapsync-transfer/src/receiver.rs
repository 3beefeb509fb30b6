//! Receiver state machine.
//!
//! Accepts exactly one connection, walks HELLO → OFFER → gate → ACCEPT →
//! DATA* → DONE, and guarantees that a failed transfer leaves no partial
//! output file behind. Both guarantees are held by drop guards, so they
//! survive early returns and panics alike.

use std::{
    io::{BufRead, Write},
    net::SocketAddr,
    path::PathBuf,
};

use snapsync_core::{
    AppError, Result,
    progress::{Printer, Tracker},
    sanitize,
};
use snapsync_proto::{
    Frame, FrameType, MAX_CHUNK_SIZE, Offer, decode_error_message, encode_error_message,
};
use tokio::{
    fs::File,
    io::{AsyncWrite, AsyncWriteExt, BufReader, BufWriter},
    net::{TcpListener, TcpStream},
};

use crate::wire::{read_frame, write_frame};

/// Cleanup handle returned by the listening callback; run on every exit
/// path of [`receive_once`].
pub type StopHandle = Box<dyn FnOnce() + Send>;

/// Invoked with the bound local address once the listener is up. The outer
/// layer uses this to start the discovery advertiser.
pub type ListeningCallback = Box<dyn FnOnce(SocketAddr) -> Result<StopHandle> + Send>;

/// Controls receiver behavior.
pub struct ReceiveOptions {
    /// Listen address, e.g. `0.0.0.0:45999`.
    pub listen: String,
    /// Directory the received file lands in; created if missing.
    pub out_dir: PathBuf,
    /// Overwrite an existing file instead of suffixing ` (N)`.
    pub overwrite: bool,
    /// Skip the interactive acceptance gate.
    pub accept_all: bool,
    /// Emit progress as NDJSON instead of text.
    pub json: bool,
    /// Source for the acceptance prompt, typically stdin.
    pub prompt: Box<dyn BufRead + Send>,
    /// Progress and prompt sink, typically stdout.
    pub out: Box<dyn Write + Send>,
    /// Optional hook invoked with the bound address.
    pub on_listening: Option<ListeningCallback>,
}

/// Runs the listening callback's stop handle exactly once, on drop.
struct StopGuard(Option<StopHandle>);

impl Drop for StopGuard {
    fn drop(&mut self) {
        if let Some(stop) = self.0.take() {
            stop();
        }
    }
}

/// Removes a partially written output file unless disarmed.
struct PartialFileGuard {
    path: PathBuf,
    armed: bool,
}

impl PartialFileGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for PartialFileGuard {
    fn drop(&mut self) {
        if self.armed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// Accept one connection and receive one file.
///
/// # Errors
///
/// - [`ErrorKind::Usage`](snapsync_core::ErrorKind::Usage) for missing
///   options
/// - [`ErrorKind::Io`](snapsync_core::ErrorKind::Io) for output directory,
///   landing, or prompt faults
/// - [`ErrorKind::Network`](snapsync_core::ErrorKind::Network) for listener
///   or socket faults, and for an ERROR frame from the sender
/// - [`ErrorKind::Rejected`](snapsync_core::ErrorKind::Rejected) when the
///   local user declines the offer
/// - [`ErrorKind::InvalidProtocol`](snapsync_core::ErrorKind::InvalidProtocol)
///   for any protocol-order or framing violation
pub async fn receive_once(mut options: ReceiveOptions) -> Result<()> {
    if options.listen.is_empty() {
        return Err(AppError::usage("--listen is required"));
    }

    tokio::fs::create_dir_all(&options.out_dir).await.map_err(|err| {
        AppError::io(format!("create output directory {}", options.out_dir.display()))
            .caused_by(err)
    })?;

    let listener = TcpListener::bind(&options.listen)
        .await
        .map_err(|err| AppError::network(format!("listen on {:?}", options.listen)).caused_by(err))?;
    let local_addr = listener
        .local_addr()
        .map_err(|err| AppError::network("resolve listen address").caused_by(err))?;

    let stop = match options.on_listening.take() {
        Some(callback) => {
            Some(callback(local_addr).map_err(|err| err.context("on listening callback"))?)
        },
        None => None,
    };
    let _stop_guard = StopGuard(stop);

    writeln!(options.out, "listening on {local_addr}")
        .map_err(|err| AppError::io("write listening line").caused_by(err))?;
    tracing::info!(%local_addr, "waiting for one connection");

    let (stream, peer_addr) = listener
        .accept()
        .await
        .map_err(|err| AppError::network("accept connection").caused_by(err))?;
    // one offer per session: no further connections are served
    drop(listener);

    receive_from_stream(stream, peer_addr, options).await
}

async fn receive_from_stream(
    stream: TcpStream,
    peer_addr: SocketAddr,
    options: ReceiveOptions,
) -> Result<()> {
    let ReceiveOptions { out_dir, overwrite, accept_all, json, mut prompt, mut out, .. } = options;

    let (read_half, write_half) = stream.into_split();
    let mut reader = BufReader::with_capacity(MAX_CHUNK_SIZE, read_half);
    let mut writer = BufWriter::with_capacity(MAX_CHUNK_SIZE, write_half);

    let hello = read_frame(&mut reader).await.map_err(|err| err.context("read hello"))?;
    if hello.frame_type() != Some(FrameType::Hello) || !hello.payload.is_empty() {
        send_protocol_error(&mut writer, "expected HELLO").await;
        return Err(AppError::invalid_protocol("expected HELLO frame"));
    }

    let offer_frame = read_frame(&mut reader).await.map_err(|err| err.context("read offer"))?;
    if offer_frame.frame_type() != Some(FrameType::Offer) {
        send_protocol_error(&mut writer, "expected OFFER").await;
        return Err(AppError::invalid_protocol("expected OFFER frame"));
    }
    let offer = match Offer::decode(&offer_frame.payload) {
        Ok(offer) => offer,
        Err(err) => {
            send_protocol_error(&mut writer, "invalid OFFER payload").await;
            return Err(AppError::from(err).context("decode offer"));
        },
    };
    tracing::debug!(name = %offer.name, size = offer.size, peer = %peer_addr, "offer received");

    if !accept_all {
        let accepted = match prompt_accept(&mut *prompt, &mut *out, &offer, peer_addr) {
            Ok(accepted) => accepted,
            Err(err) => {
                send_protocol_error(&mut writer, "prompt error").await;
                return Err(err.context("prompt for acceptance"));
            },
        };
        if !accepted {
            send_error_frame(&mut writer, "receiver rejected offer")
                .await
                .map_err(|err| err.context("send rejection"))?;
            return Err(AppError::rejected("transfer rejected by user"));
        }
    }

    let out_path = match sanitize::resolve_collision(&out_dir, &offer.name, overwrite) {
        Ok(path) => path,
        Err(err) => {
            send_protocol_error(&mut writer, "resolve output path failed").await;
            return Err(err.context("resolve output path"));
        },
    };

    // Guard declared before the file handle: on an error return the handle
    // closes first, then the guard unlinks the partial file.
    let mut partial_guard = PartialFileGuard::new(out_path.clone());
    let mut file = match File::create(&out_path).await {
        Ok(file) => file,
        Err(err) => {
            partial_guard.disarm();
            send_protocol_error(&mut writer, "open output file failed").await;
            return Err(AppError::io(format!("create output file {}", out_path.display()))
                .caused_by(err));
        },
    };

    write_frame(&mut writer, &Frame::empty(FrameType::Accept))
        .await
        .map_err(|err| err.context("send accept frame"))?;
    writer.flush().await.map_err(|err| AppError::network("flush accept frame").caused_by(err))?;

    let mut tracker = Tracker::new(offer.size);
    let mut printer = Printer::new(out, "recv", json);

    let mut remaining = offer.size;
    while remaining > 0 {
        let frame = read_frame(&mut reader).await.map_err(|err| err.context("read data frame"))?;
        match frame.frame_type() {
            Some(FrameType::Data) => {
                if frame.payload.len() as u64 > remaining {
                    send_protocol_error(&mut writer, "received more bytes than offered").await;
                    return Err(AppError::invalid_protocol(format!(
                        "received {} bytes with {remaining} remaining",
                        frame.payload.len()
                    )));
                }
                if let Err(err) = file.write_all(&frame.payload).await {
                    send_protocol_error(&mut writer, "write output failed").await;
                    return Err(AppError::io("write output data").caused_by(err));
                }
                remaining -= frame.payload.len() as u64;
                printer.print_maybe(&tracker.add(frame.payload.len()))?;
            },
            Some(FrameType::Error) => {
                let message = decode_error_message(&frame.payload)
                    .map_err(|err| AppError::from(err).context("decode sender error frame"))?;
                return Err(AppError::network(format!("sender reported error: {message}")));
            },
            Some(FrameType::Done) => {
                send_protocol_error(&mut writer, "sender finished before declared file size").await;
                return Err(AppError::invalid_protocol(format!(
                    "sender ended early with {remaining} bytes remaining"
                )));
            },
            _ => {
                send_protocol_error(&mut writer, "expected DATA").await;
                return Err(AppError::invalid_protocol(format!(
                    "unexpected frame type {} during data stream",
                    frame.type_code
                )));
            },
        }
    }

    let done = read_frame(&mut reader).await.map_err(|err| err.context("read done frame"))?;
    if done.frame_type() != Some(FrameType::Done) || !done.payload.is_empty() {
        send_protocol_error(&mut writer, "expected DONE").await;
        return Err(AppError::invalid_protocol(format!(
            "expected DONE frame, got type {}",
            done.type_code
        )));
    }

    partial_guard.disarm();
    file.shutdown().await.map_err(|err| {
        AppError::io(format!("close output file {}", out_path.display())).caused_by(err)
    })?;
    drop(file);

    printer.print_final(&tracker.add(0), Some(&out_path.display().to_string()))?;
    Ok(())
}

fn prompt_accept<R, W>(prompt: &mut R, out: &mut W, offer: &Offer, peer: SocketAddr) -> Result<bool>
where
    R: BufRead + ?Sized,
    W: Write + ?Sized,
{
    write!(out, "Accept file {} ({} bytes) from {}? [y/N] ", offer.name, offer.size, peer)
        .map_err(|err| AppError::io("write acceptance prompt").caused_by(err))?;
    out.flush().map_err(|err| AppError::io("flush acceptance prompt").caused_by(err))?;

    let mut line = String::new();
    prompt
        .read_line(&mut line)
        .map_err(|err| AppError::io("read acceptance input").caused_by(err))?;

    let response = line.trim().to_lowercase();
    Ok(response == "y" || response == "yes")
}

/// Best-effort courtesy ERROR before aborting; failures are swallowed
/// because the underlying error is already being returned.
async fn send_protocol_error<W>(writer: &mut W, message: &str)
where
    W: AsyncWrite + Unpin,
{
    let _ = send_error_frame(writer, message).await;
}

async fn send_error_frame<W>(writer: &mut W, message: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let payload = encode_error_message(message)
        .map_err(|err| AppError::from(err).context("encode protocol error message"))?;
    write_frame(writer, &Frame::new(FrameType::Error, payload))
        .await
        .map_err(|err| err.context("write error frame"))?;
    writer.flush().await.map_err(|err| AppError::network("flush error frame").caused_by(err))
}
