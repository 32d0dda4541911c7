//! Log relay: many producers, one ordered consumer
//!
//! One relay lives for the duration of one deployment. Every subprocess
//! stream drainer holds a cloned [`LogSink`]; the streaming endpoint holds
//! the single [`LogStream`]. Per-producer order is preserved; interleaving
//! across concurrent producers is intentionally left non-deterministic.
//! The relay closes once every sink clone has been dropped, which the
//! pipeline arranges to happen only after the terminal record is queued.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use botdock_wire::LogResponse;

/// Create a connected sink/stream pair for one deployment
pub fn channel() -> (LogSink, LogStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (LogSink { tx }, LogStream { rx })
}

/// Producer half of the relay
#[derive(Debug, Clone)]
pub struct LogSink {
    tx: mpsc::UnboundedSender<LogResponse>,
}

impl LogSink {
    /// Push a record. If the consumer has gone away (caller disconnected)
    /// the record is dropped; producers keep running regardless.
    pub fn push(&self, record: LogResponse) {
        let _ = self.tx.send(record);
    }

    pub fn info(&self, line: impl Into<String>) {
        self.push(LogResponse::info(line));
    }

    pub fn success(&self, line: impl Into<String>) {
        self.push(LogResponse::success(line));
    }

    pub fn error(&self, line: impl Into<String>) {
        self.push(LogResponse::error(line));
    }
}

/// Consumer half of the relay
#[derive(Debug)]
pub struct LogStream {
    rx: mpsc::UnboundedReceiver<LogResponse>,
}

impl LogStream {
    /// Receive the next record; `None` once the relay has closed and every
    /// queued record has been drained.
    pub async fn recv(&mut self) -> Option<LogResponse> {
        self.rx.recv().await
    }
}

impl Stream for LogStream {
    type Item = LogResponse;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_per_producer_order_is_preserved() {
        let (sink, mut stream) = channel();
        sink.info("one");
        sink.info("two");
        sink.success("three");
        drop(sink);

        assert_eq!(stream.recv().await.unwrap().line, "one");
        assert_eq!(stream.recv().await.unwrap().line, "two");
        assert_eq!(stream.recv().await.unwrap().line, "three");
        assert!(stream.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_closes_only_after_last_sink_drops() {
        let (sink, mut stream) = channel();
        let second = sink.clone();
        drop(sink);

        second.info("still open");
        assert_eq!(stream.recv().await.unwrap().line, "still open");

        drop(second);
        assert!(stream.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_push_after_consumer_drop_is_silent() {
        let (sink, stream) = channel();
        drop(stream);
        // no panic, record dropped
        sink.info("into the void");
    }
}
