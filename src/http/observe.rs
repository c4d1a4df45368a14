//! Response observation
//!
//! [`CountingBody`] decorates the outbound response body: it forwards every
//! frame unchanged while accumulating the number of data bytes, and emits
//! exactly one access log line once the response is complete. Completion is
//! either the end of the body stream or the body being dropped early (client
//! disconnect), so aborted transfers still get logged with the bytes that
//! actually went out.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use bytes::Bytes;
use http_body::{Frame, SizeHint};

use crate::access_log::{AccessLog, LogEntry};

/// Body decorator that counts transmitted bytes and logs on completion.
pub struct CountingBody {
    inner: Body,
    bytes: u64,
    // Taken exactly once; `None` after the line has been written.
    entry: Option<LogEntry>,
    log: Arc<AccessLog>,
}

impl CountingBody {
    pub fn new(inner: Body, entry: LogEntry, log: Arc<AccessLog>) -> Self {
        Self {
            inner,
            bytes: 0,
            entry: Some(entry),
            log,
        }
    }

    fn finish(&mut self) {
        if let Some(mut entry) = self.entry.take() {
            entry.bytes = self.bytes;
            self.log.write_entry(&entry);
        }
    }
}

impl http_body::Body for CountingBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_frame(cx) {
            Poll::Ready(Some(Ok(frame))) => {
                if let Some(data) = frame.data_ref() {
                    this.bytes += data.len() as u64;
                }
                Poll::Ready(Some(Ok(frame)))
            }
            Poll::Ready(Some(Err(err))) => {
                this.finish();
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                this.finish();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for CountingBody {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access_log::test_support::SharedBuf;
    use axum::http::{Method, StatusCode, Version};
    use chrono::Local;

    fn entry() -> LogEntry {
        LogEntry {
            remote_addr: "127.0.0.1:4000".to_string(),
            method: Method::GET,
            path: "/index.html".to_string(),
            protocol: Version::HTTP_11,
            status: StatusCode::OK,
            bytes: 0,
            start_time: Local::now(),
        }
    }

    #[tokio::test]
    async fn test_counts_bytes_and_logs_once() {
        let buf = SharedBuf::default();
        let log = Arc::new(AccessLog::from_writer(buf.clone()));
        let body = Body::new(CountingBody::new(Body::from("hello world!"), entry(), log));

        let collected = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        assert_eq!(collected.as_ref(), b"hello world!");

        let contents = buf.contents();
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.contains("\"GET /index.html HTTP/1.1\" 200 12"));
    }

    #[tokio::test]
    async fn test_empty_body_logs_zero_bytes() {
        let buf = SharedBuf::default();
        let log = Arc::new(AccessLog::from_writer(buf.clone()));
        let body = Body::new(CountingBody::new(Body::empty(), entry(), log));

        axum::body::to_bytes(body, usize::MAX).await.unwrap();
        assert!(buf.contents().contains(" 200 0"));
    }

    #[tokio::test]
    async fn test_dropped_body_still_logs() {
        let buf = SharedBuf::default();
        let log = Arc::new(AccessLog::from_writer(buf.clone()));
        let body = CountingBody::new(Body::from("never read"), entry(), log);

        drop(body);
        assert_eq!(buf.contents().lines().count(), 1);
        assert!(buf.contents().contains(" 200 0"));
    }
}
