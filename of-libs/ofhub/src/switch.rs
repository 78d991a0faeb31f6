//! switch - the seam to the external datapath connection layer

use ofproto::{DatapathId, OfMessage};

/// One controlled datapath.  The connection itself is owned outside the
/// hub; the hub keeps only per-switch bookkeeping keyed by datapath id.
pub trait Switch: Send + Sync {
    fn datapath_id(&self) -> DatapathId;

    /// Hand a message to the transport.  Returns false iff the control
    /// channel is known-disconnected at the time of the call; true is
    /// not a guarantee of eventual delivery.
    fn send_raw(&self, message: &OfMessage) -> bool;
}
