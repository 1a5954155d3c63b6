// Serialized writer for the response data stream

use tokio::sync::mpsc;

use super::part::DataStreamPart;

/// Cloneable handle appending frames to one client's response.
///
/// Every write is a whole encoded frame pushed through a single channel, so
/// concurrent writers can never interleave inside a frame. Writes never block;
/// once the client has gone away frames are dropped.
#[derive(Debug, Clone)]
pub struct DataStreamWriter {
    tx: mpsc::UnboundedSender<String>,
}

impl DataStreamWriter {
    /// Create a writer and the receiver that feeds the response body
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn write(&self, part: DataStreamPart) {
        if self.tx.send(part.encode()).is_err() {
            tracing::debug!(code = part.code(), "Stream receiver dropped, discarding frame");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
