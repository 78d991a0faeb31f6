//! ofhub - reliable request/reply transactions over an unreliable switch control channel

mod channel;
mod hub;
mod shutdown_handle;
mod switch;
mod transactions;

pub use channel::{MsgChannel, Reply};
pub use hub::MessageHub;
pub use shutdown_handle::ShutdownHandle;
pub use switch::Switch;

use ofproto::DatapathId;

#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// The control channel to the switch was down when we tried to
    /// transmit.  Nothing from the batch was committed.
    #[error("switch {0:#018x} disconnected")]
    SwitchDisconnected(DatapathId),

    /// No reply arrived within the caller's window.  The outcome is
    /// unknown, not failed; reconcile before retrying.
    #[error("timed out waiting for a reply")]
    ChannelTimeout,
}
