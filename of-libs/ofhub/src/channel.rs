//! channel - the reply queue a send() caller blocks on

use crate::HubError;
use ofproto::{OfpErrorMsg, Xid};
use std::time::Duration;

/// Outcome of one message within a batch, pushed when the batch's
/// barrier is acknowledged.
#[derive(Clone, Debug)]
pub struct Reply {
    /// The caller's transaction tag, echoed back for its bookkeeping.
    pub txn_tag: String,
    pub message_xid: Xid,
    pub result: Result<(), OfpErrorMsg>,
}

impl Reply {
    pub fn ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Reply channel returned by `MessageHub::send`.  Waiting happens in the
/// caller's own task; the hub only ever pushes.  Passing the same
/// channel back into further `send` calls joins several batches onto
/// one receiver for batched waiting.
#[derive(Clone, Debug)]
pub struct MsgChannel {
    tx: async_channel::Sender<Reply>,
    rx: async_channel::Receiver<Reply>,
}

impl MsgChannel {
    pub fn new() -> Self {
        let (tx, rx) = async_channel::unbounded();
        MsgChannel { tx, rx }
    }

    /// Suspend the calling task until a reply arrives or the window
    /// elapses.  Use a window at least as large as the timeout given to
    /// `send`, so hub-side expiry wins the race against the caller.
    pub async fn get(&self, timeout: Duration) -> Result<Reply, HubError> {
        match async_std::future::timeout(timeout, self.rx.recv()).await {
            Ok(Ok(reply)) => Ok(reply),
            // Closed means every sender is gone and nothing more can
            // arrive; to the caller that is indistinguishable from a
            // reply that never came.
            Ok(Err(_closed)) => Err(HubError::ChannelTimeout),
            Err(_elapsed) => Err(HubError::ChannelTimeout),
        }
    }

    pub(crate) fn sender(&self) -> async_channel::Sender<Reply> {
        self.tx.clone()
    }
}

impl Default for MsgChannel {
    fn default() -> Self {
        Self::new()
    }
}
