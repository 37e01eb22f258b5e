// Chunked JSON streaming utilities
//
// Each chunk is a 4-byte big-endian length followed by a JSON document,
// optionally Brotli-compressed on its own.
use async_compression::tokio::bufread::{BrotliDecoder, BrotliEncoder};
use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use axum::response::IntoResponse;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use futures::stream::Stream;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;

const LENGTH_PREFIX: usize = 4;
/// Upper bound on a single frame; anything larger means a corrupt stream.
pub const MAX_FRAME_LEN: usize = 1 << 20;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame of {0} bytes exceeds the {limit} byte limit", limit = MAX_FRAME_LEN)]
    TooLarge(usize),
    #[error("frame decompression failed: {0}")]
    Decompress(#[from] std::io::Error),
    #[error("frame is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Create a chunked JSON streaming response
pub async fn chunked_json_stream<S, T>(stream: S, compress: bool) -> Result<Response<Body>, StatusCode>
where
    S: Stream<Item = T> + Send + 'static,
    T: Serialize + Send + Sync + 'static,
{
    let byte_stream = stream.filter_map(move |msg| async move {
        match encode_chunk(&msg, compress).await {
            Ok(chunk) => Some(Ok::<_, std::io::Error>(chunk)),
            Err(e) => {
                tracing::warn!("Dropping event that cannot be framed: {}", e);
                None
            }
        }
    });

    let body = Body::from_stream(byte_stream);

    // No Content-Encoding: chunks are compressed individually, not the HTTP body.
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/x-ndjson-chunked")
        .header(header::TRANSFER_ENCODING, "chunked")
        .body(body)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Serialize a single message to a length-prefixed chunk
pub async fn encode_chunk<T: Serialize>(msg: &T, compress: bool) -> Result<Bytes, std::io::Error> {
    let json = serde_json::to_vec(msg).map_err(std::io::Error::other)?;

    let payload = if compress {
        let mut encoder = BrotliEncoder::new(std::io::Cursor::new(json));
        let mut compressed = Vec::new();
        encoder.read_to_end(&mut compressed).await?;
        compressed
    } else {
        json
    };

    if payload.len() > MAX_FRAME_LEN {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            FrameError::TooLarge(payload.len()),
        ));
    }

    let mut chunk = BytesMut::with_capacity(LENGTH_PREFIX + payload.len());
    chunk.put_u32(payload.len() as u32);
    chunk.put_slice(&payload);

    Ok(chunk.freeze())
}

/// Stream every event published on `rx` as chunks, skipping ones a slow reader missed
pub async fn stream_from_broadcast<T>(rx: broadcast::Receiver<T>, compress: bool) -> impl IntoResponse
where
    T: Serialize + Clone + Send + Sync + 'static,
{
    let stream = BroadcastStream::new(rx).filter_map(|item| async move {
        match item {
            Ok(msg) => Some(msg),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!("Event subscriber lagged, skipped {} events", skipped);
                None
            }
        }
    });

    match chunked_json_stream(stream, compress).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Reassembles length-prefixed frames from arbitrarily split reads.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: BytesMut,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Next complete frame payload, or `None` until more bytes arrive.
    pub fn next_frame(&mut self) -> Result<Option<Bytes>, FrameError> {
        if self.buffer.len() < LENGTH_PREFIX {
            return Ok(None);
        }

        let mut prefix = [0u8; LENGTH_PREFIX];
        prefix.copy_from_slice(&self.buffer[..LENGTH_PREFIX]);
        let len = u32::from_be_bytes(prefix) as usize;
        if len > MAX_FRAME_LEN {
            return Err(FrameError::TooLarge(len));
        }

        if self.buffer.len() < LENGTH_PREFIX + len {
            return Ok(None);
        }

        self.buffer.advance(LENGTH_PREFIX);
        Ok(Some(self.buffer.split_to(len).freeze()))
    }
}

/// Decode one frame payload produced by [`encode_chunk`].
pub async fn decode_frame<T: DeserializeOwned>(payload: &[u8], compressed: bool) -> Result<T, FrameError> {
    if compressed {
        let mut decoder = BrotliDecoder::new(payload);
        let mut json = Vec::new();
        decoder.read_to_end(&mut json).await?;
        Ok(serde_json::from_slice(&json)?)
    } else {
        Ok(serde_json::from_slice(payload)?)
    }
}
