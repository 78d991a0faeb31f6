//! transactions - per-switch bookkeeping of in-flight message batches

use async_channel::Sender;
use crate::channel::Reply;
use dashmap::DashMap;
use ofproto::{DatapathId, OfpErrorMsg, Xid};
use slog::{Logger, debug, warn};
use std::collections::HashMap;
use std::time::Instant;

/// One outstanding send() call, keyed by its barrier xid.  Resolved by
/// the barrier ack or destroyed by timeout, never both.
pub(crate) struct PendingRequest {
    pub txn_tag: String,
    pub message_xids: Vec<Xid>,
    pub reply_tx: Sender<Reply>,
    pub deadline: Instant,
}

/// Everything resolve_barrier hands back to the hub: per-message
/// results in batch order, plus the channel to push replies on.
pub(crate) struct ResolvedRequest {
    pub txn_tag: String,
    pub reply_tx: Sender<Reply>,
    pub results: Vec<(Xid, Option<OfpErrorMsg>)>,
}

#[derive(Default)]
struct SwitchState {
    next_xid: u32,
    requests: HashMap<Xid, PendingRequest>,
    // Message xid -> captured error, for messages of currently-open
    // requests only.  Entries are created at begin() and drained when
    // the owning request resolves or expires.
    results: HashMap<Xid, Option<OfpErrorMsg>>,
}

impl SwitchState {
    fn fresh_xid(&mut self) -> Xid {
        // Zero is reserved by convention for unsolicited messages.
        self.next_xid = self.next_xid.wrapping_add(1);
        if self.next_xid == 0 {
            self.next_xid = 1;
        }
        Xid(self.next_xid)
    }
}

/// Tracks transactions per switch.  State for a switch appears on first
/// use and is dropped explicitly when the connection layer reports the
/// switch gone; a reconnect arrives under a new datapath id.
pub(crate) struct TransactionTracker {
    switches: DashMap<DatapathId, SwitchState>,
    logger: Logger,
}

impl TransactionTracker {
    pub fn new(logger: Logger) -> Self {
        TransactionTracker {
            switches: DashMap::new(),
            logger,
        }
    }

    /// Allocate `count` xids on this switch's connection.
    pub fn fresh_xids(&self, dpid: DatapathId, count: usize) -> Vec<Xid> {
        let mut state = self.switches.entry(dpid).or_default();
        (0..count).map(|_| state.fresh_xid()).collect()
    }

    /// Store a pending request under its barrier xid.
    pub fn begin(
        &self,
        dpid: DatapathId,
        barrier_xid: Xid,
        txn_tag: &str,
        message_xids: Vec<Xid>,
        reply_tx: Sender<Reply>,
        deadline: Instant,
    ) {
        let mut state = self.switches.entry(dpid).or_default();
        for xid in &message_xids {
            state.results.insert(*xid, None);
        }
        state.requests.insert(
            barrier_xid,
            PendingRequest {
                txn_tag: txn_tag.to_string(),
                message_xids,
                reply_tx,
                deadline,
            },
        );
    }

    /// Capture an error against one message of an open request.  Stale
    /// or unknown xids are expected on a shared event stream and are
    /// not an error condition.
    pub fn record_error(&self, dpid: DatapathId, message_xid: Xid, error: OfpErrorMsg) {
        let Some(mut state) = self.switches.get_mut(&dpid) else {
            debug!(
                self.logger,
                "Error for unknown switch {dpid:#x} xid {message_xid} - ignored"
            );
            return;
        };
        match state.results.get_mut(&message_xid) {
            Some(slot) => *slot = Some(error),
            None => debug!(
                self.logger,
                "Error for unknown or settled xid {message_xid} on switch {dpid:#x} - ignored"
            ),
        }
    }

    /// Pop the request owning `barrier_xid` and return one result per
    /// message in batch order.  None for an unknown switch or barrier:
    /// other applications' barriers share the event stream.
    pub fn resolve_barrier(&self, dpid: DatapathId, barrier_xid: Xid) -> Option<ResolvedRequest> {
        let mut state = self.switches.get_mut(&dpid)?;
        let request = state.requests.remove(&barrier_xid)?;
        let results = request
            .message_xids
            .iter()
            .map(|xid| (*xid, state.results.remove(xid).flatten()))
            .collect();
        Some(ResolvedRequest {
            txn_tag: request.txn_tag,
            reply_tx: request.reply_tx,
            results,
        })
    }

    /// Drop every request whose deadline has passed, with its
    /// per-message entries, so a switch that silently swallows a
    /// barrier cannot grow our memory.  Returns the number expired.
    pub fn expire_overdue(&self, now: Instant) -> usize {
        let mut expired = 0;
        for mut entry in self.switches.iter_mut() {
            let dpid = *entry.key();
            let state = entry.value_mut();
            let overdue: Vec<Xid> = state
                .requests
                .iter()
                .filter(|(_, req)| req.deadline <= now)
                .map(|(xid, _)| *xid)
                .collect();
            for barrier_xid in overdue {
                if let Some(request) = state.requests.remove(&barrier_xid) {
                    for xid in &request.message_xids {
                        state.results.remove(xid);
                    }
                    warn!(
                        self.logger,
                        "No barrier reply from switch {dpid:#x} for transaction '{}' (barrier {barrier_xid}, {} messages) - expired",
                        request.txn_tag,
                        request.message_xids.len()
                    );
                    expired += 1;
                }
            }
        }
        expired
    }

    /// Drop all bookkeeping for a switch.  Called by the reconnect
    /// handling layer; in-flight callers time out on their channels.
    pub fn remove_switch(&self, dpid: DatapathId) {
        if self.switches.remove(&dpid).is_some() {
            debug!(self.logger, "Dropped transaction state for switch {dpid:#x}");
        }
    }
}
