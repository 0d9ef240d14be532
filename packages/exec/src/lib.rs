#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Background execution of request sequences with progress updates.
//!
//! [`spawn`] runs a sequence of requests on a background task, away from the
//! host's UI sequencing, and streams [`ExecUpdate`] messages back over a
//! channel: one `Request` per exchange, `Progress` while a response body is
//! consumed (see [`ProgressReader`]), and `Error` before stopping at the
//! first failure. A departed update listener never fails the exchange.

use std::{
    fmt::Display,
    pin::Pin,
    task::{Context, Poll},
};

use flume::{Receiver, Sender};
use tokio::io::{AsyncRead, ReadBuf};

/// Body bytes between two consecutive `Progress` updates.
pub const PROGRESS_STRIDE: u64 = 2048;

/// Execution status messages published to the update channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecUpdate {
    /// An exchange is about to start.
    Request { request: String },
    /// Response body consumption progressed.
    Progress {
        request: String,
        status: String,
        current: u64,
        total: Option<u64>,
    },
    /// An exchange failed; the sequence stops here.
    Error { request: String, message: String },
}

impl Display for ExecUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request { request } => write!(f, "REQUEST {request}"),
            Self::Progress {
                status,
                current,
                total,
                ..
            } => match total {
                Some(total) => write!(f, "RESPONSE {status} ({current} of {total})"),
                None => write!(f, "RESPONSE {status} ({current} of ?)"),
            },
            Self::Error { message, .. } => write!(f, "ERROR {message}"),
        }
    }
}

/// Counts bytes read from an underlying reader and publishes a `Progress`
/// update each time another [`PROGRESS_STRIDE`] worth of body has been
/// consumed, plus one initial update at offset zero.
pub struct ProgressReader<R> {
    reader: R,
    request: String,
    status: String,
    total: Option<u64>,
    current: u64,
    last_stride: u64,
    updates: Sender<ExecUpdate>,
}

impl<R> ProgressReader<R> {
    pub fn new(
        reader: R,
        request: impl Into<String>,
        status: impl Into<String>,
        total: Option<u64>,
        updates: Sender<ExecUpdate>,
    ) -> Self {
        let request = request.into();
        let status = status.into();
        let _ = updates.send(ExecUpdate::Progress {
            request: request.clone(),
            status: status.clone(),
            current: 0,
            total,
        });
        Self {
            reader,
            request,
            status,
            total,
            current: 0,
            last_stride: 0,
            updates,
        }
    }

    #[must_use]
    pub const fn bytes_read(&self) -> u64 {
        self.current
    }

    fn fire_update(&mut self) {
        let stride = self.current / PROGRESS_STRIDE;
        if stride > self.last_stride {
            self.last_stride = stride;
            let _ = self.updates.send(ExecUpdate::Progress {
                request: self.request.clone(),
                status: self.status.clone(),
                current: self.current,
                total: self.total,
            });
        }
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for ProgressReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        match Pin::new(&mut this.reader).poll_read(cx, buf) {
            Poll::Ready(Ok(())) => {
                let read = buf.filled().len() - before;
                if read > 0 {
                    this.current += read as u64;
                    this.fire_update();
                }
                Poll::Ready(Ok(()))
            }
            other => other,
        }
    }
}

/// A running execution: the background task plus its update stream.
pub struct ExecHandle<T> {
    join: tokio::task::JoinHandle<Vec<T>>,
    updates: Receiver<ExecUpdate>,
}

impl<T> ExecHandle<T> {
    #[must_use]
    pub const fn updates(&self) -> &Receiver<ExecUpdate> {
        &self.updates
    }

    /// Waits for the sequence to finish and returns the collected results.
    ///
    /// # Errors
    ///
    /// * If the background task panicked or was cancelled
    pub async fn join(self) -> Result<Vec<T>, tokio::task::JoinError> {
        self.join.await
    }
}

/// Runs `requests` in order on a background task.
///
/// `exchange` performs one request; it receives the update channel so body
/// consumption can report progress (typically through a [`ProgressReader`]).
/// Results are collected in order. The first failed exchange publishes an
/// `Error` update and stops the sequence; requests after it never start.
pub fn spawn<Req, T, E, F, Fut>(name: &str, requests: Vec<Req>, exchange: F) -> ExecHandle<T>
where
    Req: Display + Send + 'static,
    T: Send + 'static,
    E: Display + Send + 'static,
    F: FnMut(Req, Sender<ExecUpdate>) -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send,
{
    let (tx, rx) = flume::unbounded();
    log::trace!("exec start: {name}");
    let task_name = name.to_owned();
    let mut exchange = exchange;
    let join = tokio::spawn(async move {
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            let request_line = request.to_string();
            let _ = tx.send(ExecUpdate::Request {
                request: request_line.clone(),
            });
            match exchange(request, tx.clone()).await {
                Ok(result) => results.push(result),
                Err(err) => {
                    let _ = tx.send(ExecUpdate::Error {
                        request: request_line,
                        message: err.to_string(),
                    });
                    break;
                }
            }
        }
        log::trace!("exec finished: {task_name}");
        results
    });
    ExecHandle { join, updates: rx }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tokio::io::AsyncReadExt as _;

    use super::*;

    #[test_log::test(tokio::test)]
    async fn requests_run_in_order_and_results_collect() {
        let handle = spawn("uppercase", vec!["alpha", "beta"], |request, _updates| {
            let result = request.to_uppercase();
            async move { Ok::<_, std::io::Error>(result) }
        });
        let results = handle.join().await.unwrap();
        assert_eq!(results, vec!["ALPHA".to_string(), "BETA".to_string()]);
    }

    #[test_log::test(tokio::test)]
    async fn request_updates_precede_each_exchange() {
        let handle = spawn("sequence", vec!["one", "two"], |_request, _updates| async {
            Ok::<_, std::io::Error>(())
        });
        handle.join.await.unwrap();
        let updates: Vec<_> = handle.updates.drain().collect();
        assert_eq!(
            updates,
            vec![
                ExecUpdate::Request {
                    request: "one".into()
                },
                ExecUpdate::Request {
                    request: "two".into()
                },
            ]
        );
    }

    #[test_log::test(tokio::test)]
    async fn first_error_stops_the_sequence() {
        let handle = spawn("failing", vec!["ok", "bad", "never"], |request, _updates| {
            let outcome = if request == "bad" {
                Err(std::io::Error::other("exchange failed"))
            } else {
                Ok(request.len())
            };
            async move { outcome }
        });
        let results = handle.join.await.unwrap();
        assert_eq!(results, vec![2]);
        let updates: Vec<_> = handle.updates.drain().collect();
        assert_eq!(
            updates,
            vec![
                ExecUpdate::Request {
                    request: "ok".into()
                },
                ExecUpdate::Request {
                    request: "bad".into()
                },
                ExecUpdate::Error {
                    request: "bad".into(),
                    message: "exchange failed".into()
                },
            ]
        );
    }

    #[test_log::test(tokio::test)]
    async fn progress_reader_fires_on_stride_boundaries() {
        let (tx, rx) = flume::unbounded();
        let body = vec![0u8; 5000];
        let mut reader =
            ProgressReader::new(body.as_slice(), "GET /large", "200 OK", Some(5000), tx);

        let mut chunk = vec![0u8; 1000];
        for _ in 0..5 {
            reader.read_exact(&mut chunk).await.unwrap();
        }
        assert_eq!(reader.bytes_read(), 5000);
        drop(reader);

        let currents: Vec<u64> = rx
            .drain()
            .map(|update| match update {
                ExecUpdate::Progress { current, .. } => current,
                other => panic!("unexpected update: {other}"),
            })
            .collect();
        assert_eq!(currents, vec![0, 3000, 5000]);
    }

    #[test_log::test(tokio::test)]
    async fn departed_listener_does_not_fail_the_exchange() {
        let handle = spawn("lonely", vec!["only"], |request, updates| {
            drop(updates);
            async move { Ok::<_, std::io::Error>(request.len()) }
        });
        drop(handle.updates);
        let results = handle.join.await.unwrap();
        assert_eq!(results, vec![4]);
    }

    #[test_log::test]
    fn updates_render_like_status_lines() {
        assert_eq!(
            ExecUpdate::Request {
                request: "GET /".into()
            }
            .to_string(),
            "REQUEST GET /"
        );
        assert_eq!(
            ExecUpdate::Progress {
                request: "GET /".into(),
                status: "200 OK".into(),
                current: 2048,
                total: Some(4096),
            }
            .to_string(),
            "RESPONSE 200 OK (2048 of 4096)"
        );
        assert_eq!(
            ExecUpdate::Progress {
                request: "GET /".into(),
                status: "200 OK".into(),
                current: 10,
                total: None,
            }
            .to_string(),
            "RESPONSE 200 OK (10 of ?)"
        );
        assert_eq!(
            ExecUpdate::Error {
                request: "GET /".into(),
                message: "reset".into(),
            }
            .to_string(),
            "ERROR reset"
        );
    }
}
