//! Non-destructive body capture.
//!
//! # Responsibilities
//! - Drain a body frame by frame, keeping every frame
//! - Expose the data as text for a log record
//! - Rebuild an equivalent body for the real reader
//!
//! # Design Decisions
//! - Replay yields the same frames (trailers included); a stream error seen
//!   while draining is replayed at the same position
//! - Only the logged text is capped; capture and replay never are

use axum::body::{Body, Bytes};
use futures_util::stream;
use http_body::Frame;
use http_body_util::{BodyExt, StreamBody};
use thiserror::Error;

/// A body stream failed part-way through capture.
#[derive(Debug, Error)]
#[error("body stream failed after {read} bytes")]
pub struct CaptureError {
    read: usize,
    #[source]
    source: axum::Error,
}

impl CaptureError {
    /// Bytes successfully read before the failure.
    pub fn bytes_read(&self) -> usize {
        self.read
    }
}

/// Body text as placed in a log record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoggedBody {
    pub text: String,
    pub truncated: bool,
}

/// Frames drained from a body, ready to be logged and replayed.
#[derive(Debug, Default)]
pub struct BodyCapture {
    frames: Vec<Frame<Bytes>>,
    data: Vec<u8>,
    has_trailers: bool,
    error: Option<CaptureError>,
}

impl BodyCapture {
    /// Drain `body` completely.
    pub async fn read(body: Body) -> Self {
        let mut capture = Self::default();
        capture.read_from(body).await;
        capture
    }

    /// Drain `body` into this capture.
    ///
    /// Frames read so far stay in `self` even if the future is abandoned
    /// or the body panics.
    pub async fn read_from(&mut self, mut body: Body) {
        while let Some(frame) = body.frame().await {
            match frame {
                Ok(frame) => {
                    if let Some(chunk) = frame.data_ref() {
                        self.data.extend_from_slice(chunk);
                    } else if frame.is_trailers() {
                        self.has_trailers = true;
                    }
                    self.frames.push(frame);
                }
                Err(source) => {
                    self.error = Some(CaptureError {
                        read: self.data.len(),
                        source,
                    });
                    return;
                }
            }
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    pub fn error(&self) -> Option<&CaptureError> {
        self.error.as_ref()
    }

    /// Remove the stream error so replay ends cleanly after the captured bytes.
    pub fn take_error(&mut self) -> Option<CaptureError> {
        self.error.take()
    }

    /// Make replay end with `error` after the captured bytes.
    pub fn fail_with(&mut self, error: CaptureError) {
        self.error = Some(error);
    }

    /// Captured data as UTF-8 text (lossy), cut to at most `limit` bytes.
    ///
    /// A `limit` of 0 means unlimited.
    pub fn logged_text(&self, limit: usize) -> LoggedBody {
        if limit == 0 || self.data.len() <= limit {
            return LoggedBody {
                text: String::from_utf8_lossy(&self.data).into_owned(),
                truncated: false,
            };
        }

        let head = &self.data[..limit];
        let text = match std::str::from_utf8(head) {
            Ok(s) => s.to_string(),
            // Cut inside a multi-byte character: drop the partial tail.
            Err(e) if e.error_len().is_none() => {
                String::from_utf8_lossy(&head[..e.valid_up_to()]).into_owned()
            }
            Err(_) => String::from_utf8_lossy(head).into_owned(),
        };
        LoggedBody {
            text,
            truncated: true,
        }
    }

    /// Rebuild a body yielding what the original would have yielded.
    pub fn into_body(self) -> Body {
        if self.error.is_none() && !self.has_trailers {
            return Body::from(Bytes::from(self.data));
        }

        let mut items: Vec<Result<Frame<Bytes>, CaptureError>> =
            self.frames.into_iter().map(Ok).collect();
        if let Some(error) = self.error {
            items.push(Err(error));
        }
        Body::new(StreamBody::new(stream::iter(items)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;
    use std::io;

    fn failing_body(prefix: &'static str) -> Body {
        let chunks: Vec<Result<Bytes, io::Error>> = vec![
            Ok(Bytes::from_static(prefix.as_bytes())),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer reset")),
        ];
        Body::from_stream(stream::iter(chunks))
    }

    #[tokio::test]
    async fn replay_is_byte_identical() {
        let body = Body::from_stream(stream::iter(vec![
            Ok::<_, io::Error>(Bytes::from_static(b"{\"sku\":")),
            Ok(Bytes::from_static(b"\"A-1\"}")),
        ]));
        let capture = BodyCapture::read(body).await;
        assert!(capture.is_complete());
        assert_eq!(capture.logged_text(0).text, "{\"sku\":\"A-1\"}");

        let replayed = capture.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&replayed[..], b"{\"sku\":\"A-1\"}");
    }

    #[tokio::test]
    async fn stream_error_is_recorded_and_replayed() {
        let capture = BodyCapture::read(failing_body("partial")).await;
        assert!(!capture.is_complete());
        assert_eq!(capture.error().unwrap().bytes_read(), 7);
        assert_eq!(capture.logged_text(0).text, "partial");

        let mut replay = capture.into_body();
        let first = replay.frame().await.unwrap().unwrap();
        assert_eq!(first.into_data().unwrap(), Bytes::from_static(b"partial"));
        assert!(replay.frame().await.unwrap().is_err());
    }

    #[tokio::test]
    async fn taking_the_error_ends_replay_cleanly() {
        let mut capture = BodyCapture::read(failing_body("half")).await;
        assert!(capture.take_error().is_some());
        let replayed = capture.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&replayed[..], b"half");
    }

    #[tokio::test]
    async fn trailers_survive_replay() {
        let mut trailers = HeaderMap::new();
        trailers.insert("grpc-status", "0".parse().unwrap());
        let frames: Vec<Result<Frame<Bytes>, io::Error>> = vec![
            Ok(Frame::data(Bytes::from_static(b"payload"))),
            Ok(Frame::trailers(trailers)),
        ];
        let capture = BodyCapture::read(Body::new(StreamBody::new(stream::iter(frames)))).await;
        assert_eq!(capture.bytes(), b"payload");

        let collected = capture.into_body().collect().await.unwrap();
        assert_eq!(collected.trailers().unwrap()["grpc-status"], "0");
        assert_eq!(&collected.to_bytes()[..], b"payload");
    }

    #[tokio::test]
    async fn logged_text_respects_limit_and_char_boundaries() {
        let capture = BodyCapture::read(Body::from("héllo world")).await;

        let cut = capture.logged_text(2);
        assert!(cut.truncated);
        assert_eq!(cut.text, "h");

        let cut = capture.logged_text(3);
        assert_eq!(cut.text, "hé");

        let full = capture.logged_text(1024);
        assert!(!full.truncated);
        assert_eq!(full.text, "héllo world");
    }

    #[tokio::test]
    async fn empty_body_captures_nothing() {
        let capture = BodyCapture::read(Body::empty()).await;
        assert!(capture.bytes().is_empty());
        assert_eq!(capture.logged_text(10), LoggedBody::default());
    }
}
