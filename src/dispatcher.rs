//! Verdict dispatcher (spec §5 "Concurrency and resource model"): buffers
//! per-case verdicts behind a lock and, on a fixed tick, drains them in
//! enqueue order into one outbound batch.
//!
//! The wire format and transport themselves -- length-prefixed zlib JSON
//! to the controller socket (spec §6) -- are explicitly out of scope; this
//! models only the buffering/ordering/flush discipline the grading core
//! owns, handing finished batches to whatever sink the caller wires up.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::judger::TestcaseResult;

/// One dispatcher per in-flight submission. Verdicts enqueued between
/// ticks accumulate into a single batch; the dispatcher never reorders
/// them, it only decides when to cut a batch (spec §5 "Ordering
/// guarantees": "the dispatcher preserves enqueue order").
pub struct Dispatcher {
    pending: Arc<Mutex<Vec<TestcaseResult>>>,
    flush_tx: mpsc::UnboundedSender<Vec<TestcaseResult>>,
    tick: JoinHandle<()>,
}

impl Dispatcher {
    /// Start the background flush loop. Returns the handle to enqueue
    /// verdicts on and the receiving end of finished batches.
    pub fn spawn(interval_ms: u64) -> (Self, mpsc::UnboundedReceiver<Vec<TestcaseResult>>) {
        let pending: Arc<Mutex<Vec<TestcaseResult>>> = Arc::new(Mutex::new(Vec::new()));
        let (flush_tx, flush_rx) = mpsc::unbounded_channel();

        let loop_pending = Arc::clone(&pending);
        let loop_tx = flush_tx.clone();
        let tick = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));
            loop {
                interval.tick().await;
                let batch = {
                    let mut guard = loop_pending.lock().await;
                    std::mem::take(&mut *guard)
                };
                if batch.is_empty() {
                    continue;
                }
                debug!("dispatcher flushing {} verdict(s)", batch.len());
                if loop_tx.send(batch).is_err() {
                    // Receiver gone; nothing left to flush to.
                    break;
                }
            }
        });

        (Dispatcher { pending, flush_tx, tick }, flush_rx)
    }

    /// Enqueue one case's verdict. The caller is responsible for calling
    /// this in increasing `position` order (spec §5) -- the dispatcher
    /// itself only preserves whatever order it's given, it does not sort.
    pub async fn enqueue(&self, result: TestcaseResult) {
        self.pending.lock().await.push(result);
    }

    /// Drain and send whatever is pending right now, independent of the
    /// tick. Used exactly once on cancellation, before the
    /// submission-aborted notice goes out (spec §5 "Cancellation").
    pub async fn flush(&self) {
        let batch = {
            let mut guard = self.pending.lock().await;
            std::mem::take(&mut *guard)
        };
        if !batch.is_empty() {
            let _ = self.flush_tx.send(batch);
        }
    }

    /// Stop the tick loop. Call `flush` first if a final pending batch
    /// must not be dropped.
    pub fn shutdown(self) {
        self.tick.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tick_flushes_pending_verdicts_in_enqueue_order() {
        let (dispatcher, mut batches) = Dispatcher::spawn(20);

        for position in 0..3 {
            dispatcher
                .enqueue(TestcaseResult {
                    position,
                    status: "AC".to_string(),
                    time: 0.1,
                    points: 10.0,
                    total_points: 10.0,
                    memory: 1024,
                    output: String::new(),
                    extended_feedback: None,
                    feedback: None,
                    voluntary_context_switches: 0,
                    involuntary_context_switches: 0,
                    runtime_version: None,
                })
                .await;
        }

        let batch = tokio::time::timeout(Duration::from_millis(500), batches.recv())
            .await
            .expect("dispatcher should flush within the timeout")
            .expect("channel should still be open");

        let positions: Vec<usize> = batch.iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);

        dispatcher.shutdown();
    }

    #[tokio::test]
    async fn flush_sends_pending_batch_immediately() {
        let (dispatcher, mut batches) = Dispatcher::spawn(60_000);

        dispatcher
            .enqueue(TestcaseResult {
                position: 0,
                status: "WA".to_string(),
                time: 0.2,
                points: 0.0,
                total_points: 10.0,
                memory: 2048,
                output: String::new(),
                extended_feedback: None,
                feedback: Some("wrong answer".to_string()),
                voluntary_context_switches: 0,
                involuntary_context_switches: 0,
                runtime_version: None,
            })
            .await;

        dispatcher.flush().await;

        let batch = tokio::time::timeout(Duration::from_millis(500), batches.recv())
            .await
            .expect("flush should deliver immediately")
            .expect("channel should still be open");

        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].status, "WA");

        dispatcher.shutdown();
    }
}
