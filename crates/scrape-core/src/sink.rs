//! Shared output stream for metric points.
//!
//! Many scrapers push into clones of one [`MetricSink`]; a single
//! [`MetricReceiver`] drains them. The channel applies its own
//! backpressure, so producers never lock or batch.

use tokio::sync::mpsc;

use crate::error::{Result, ScrapeError};
use crate::point::MetricPoint;

/// Create a bounded metric stream.
pub fn channel(capacity: usize) -> (MetricSink, MetricReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (MetricSink { tx }, MetricReceiver { rx })
}

/// Producer half. Push only; the stream ends once every clone is dropped.
#[derive(Debug, Clone)]
pub struct MetricSink {
    tx: mpsc::Sender<MetricPoint>,
}

impl MetricSink {
    /// Push one point, waiting for capacity if the consumer is behind.
    pub async fn push(&self, point: MetricPoint) -> Result<()> {
        self.tx
            .send(point)
            .await
            .map_err(|_| ScrapeError::SinkClosed)
    }
}

/// Consumer half.
#[derive(Debug)]
pub struct MetricReceiver {
    rx: mpsc::Receiver<MetricPoint>,
}

impl MetricReceiver {
    /// Receive the next point, or `None` once every producer is gone.
    pub async fn recv(&mut self) -> Option<MetricPoint> {
        self.rx.recv().await
    }

    /// Take every point that is already buffered without waiting.
    pub fn try_drain(&mut self) -> Vec<MetricPoint> {
        let mut points = Vec::new();
        while let Ok(point) = self.rx.try_recv() {
            points.push(point);
        }
        points
    }
}
