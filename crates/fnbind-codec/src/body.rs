//! Bounded body reading.

use crate::DecodeError;
use bytes::{Bytes, BytesMut};
use http_body::Body;
use http_body_util::BodyExt;

/// Default byte ceiling for request bodies (64 KiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

/// Upper bound on bytes discarded by [`drain`].
pub const DRAIN_LIMIT: usize = 1024 * 1024;

/// Reads a whole body, failing once more than `limit` bytes arrive.
///
/// A declared length above the ceiling fails before any frame is polled.
/// Reading stops at the first frame that crosses the ceiling, so an
/// oversized body is always reported as [`DecodeError::payload_too_large`]
/// and never as a parse error.
///
/// # Example
///
/// ```rust
/// use fnbind_codec::body::read_bounded;
/// use http_body_util::Full;
/// use bytes::Bytes;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut body = Full::new(Bytes::from_static(b"0123456789"));
/// let err = read_bounded(&mut body, None, 4).await.unwrap_err();
/// assert_eq!(err.status_code(), http::StatusCode::PAYLOAD_TOO_LARGE);
/// # }
/// ```
pub async fn read_bounded<B>(
    body: &mut B,
    declared_len: Option<u64>,
    limit: usize,
) -> Result<Bytes, DecodeError>
where
    B: Body<Data = Bytes> + Unpin,
    B::Error: std::fmt::Display,
{
    if declared_len.is_some_and(|len| len > limit as u64) {
        return Err(DecodeError::payload_too_large(limit));
    }

    let mut buf = BytesMut::new();
    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(DecodeError::body_read)?;
        if let Ok(data) = frame.into_data() {
            if buf.len() + data.len() > limit {
                return Err(DecodeError::payload_too_large(limit));
            }
            buf.extend_from_slice(&data);
        }
    }

    Ok(buf.freeze())
}

/// Discards what is left of a body, up to `cap` bytes.
///
/// Returns the number of bytes discarded. Transport errors end the drain.
pub async fn drain<B>(body: &mut B, cap: usize) -> usize
where
    B: Body<Data = Bytes> + Unpin,
{
    let mut discarded = 0;
    while discarded < cap {
        match body.frame().await {
            Some(Ok(frame)) => {
                if let Some(data) = frame.data_ref() {
                    discarded += data.len();
                }
            }
            Some(Err(_)) | None => break,
        }
    }
    discarded
}
