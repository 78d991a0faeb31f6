//! hub - the send/receive engine for switch flow-table transactions
//!
//! A batch of flow modifications is transmitted in order, followed by a
//! barrier.  The switch's barrier reply commits the whole batch; until
//! then the hub tracks it as a pending transaction.  Waiting for the
//! outcome happens on the caller's `MsgChannel`, never inside the event
//! path that feeds `on_barrier_ack` / `on_message_error`.

use crate::channel::{MsgChannel, Reply};
use crate::shutdown_handle::ShutdownHandle;
use crate::switch::Switch;
use crate::transactions::TransactionTracker;
use crate::HubError;
use async_std::sync::Mutex;
use async_std::task;
use ofproto::{DatapathId, FlowMod, OfMessage, OfpErrorMsg, Xid};
use slog::{Logger, debug, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};
use stop_token::StopSource;
use stop_token::prelude::*;

/// How often the sweeper looks for transactions whose deadline passed.
/// Expiry may be late by up to one interval; that only delays cleanup.
const SWEEP_INTERVAL: Duration = Duration::from_millis(25);

/// Backoff between attempts in `send_single`.
const RETRY_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Clone)]
pub struct MessageHub {
    tracker: Arc<TransactionTracker>,
    sweeper: Arc<Mutex<Option<ShutdownHandle>>>,
    logger: Logger,
}

impl MessageHub {
    /// Create a hub and start its deadline sweeper task.
    pub fn new(logger: Logger) -> Self {
        let tracker = Arc::new(TransactionTracker::new(logger.clone()));
        let stop_source = StopSource::new();
        let stop_token = stop_source.token();
        let sweep_tracker = tracker.clone();
        let join_handle = task::spawn(async move {
            while task::sleep(SWEEP_INTERVAL)
                .timeout_at(stop_token.clone())
                .await
                .is_ok()
            {
                sweep_tracker.expire_overdue(Instant::now());
            }
        });
        MessageHub {
            tracker,
            sweeper: Arc::new(Mutex::new(Some(ShutdownHandle::new(
                join_handle,
                stop_source,
            )))),
            logger,
        }
    }

    /// Transmit `messages` to the switch in order, then a barrier, and
    /// register a transaction resolved by the barrier reply.
    ///
    /// An empty batch still sends the lone barrier, which callers use
    /// purely to flush; its barrier ack is answered with a single ok
    /// reply carrying the barrier xid.  Any transmit failure fails the
    /// whole call
    /// synchronously and registers nothing; everything after that is
    /// asynchronous.  The returned channel is newly created unless the
    /// caller passed one in to join several batches onto one receiver.
    pub fn send(
        &self,
        switch: &dyn Switch,
        messages: Vec<FlowMod>,
        txn_tag: &str,
        timeout: Duration,
        reply_chan: Option<MsgChannel>,
    ) -> Result<MsgChannel, HubError> {
        let dpid = switch.datapath_id();
        let mut xids = self.tracker.fresh_xids(dpid, messages.len() + 1);
        let barrier_xid = xids.pop().unwrap_or(Xid(0));
        let message_xids = xids;

        for (xid, flow) in message_xids.iter().zip(messages) {
            if !switch.send_raw(&OfMessage::flow_mod(*xid, flow)) {
                warn!(self.logger, "Switch {dpid:#x} disconnected mid-batch");
                return Err(HubError::SwitchDisconnected(dpid));
            }
        }
        if !switch.send_raw(&OfMessage::barrier_request(barrier_xid)) {
            warn!(
                self.logger,
                "Switch {dpid:#x} disconnected before the barrier"
            );
            return Err(HubError::SwitchDisconnected(dpid));
        }

        let chan = reply_chan.unwrap_or_default();
        debug!(
            self.logger,
            "Sent {} messages + barrier {barrier_xid} to switch {dpid:#x} for '{txn_tag}'",
            message_xids.len()
        );
        self.tracker.begin(
            dpid,
            barrier_xid,
            txn_tag,
            message_xids,
            chan.sender(),
            Instant::now() + timeout,
        );
        Ok(chan)
    }

    /// Fire-and-forget transmission of one message, with a small fixed
    /// retry budget against a momentarily-down control channel.  No
    /// barrier, no transaction.
    pub async fn send_single(
        &self,
        switch: &dyn Switch,
        flow: FlowMod,
        retries: u32,
    ) -> Result<(), HubError> {
        let dpid = switch.datapath_id();
        for attempt in 0..retries.max(1) {
            let xid = self.tracker.fresh_xids(dpid, 1)[0];
            if switch.send_raw(&OfMessage::flow_mod(xid, flow.clone())) {
                return Ok(());
            }
            debug!(
                self.logger,
                "Send to switch {dpid:#x} failed (attempt {})",
                attempt + 1
            );
            task::sleep(RETRY_BACKOFF).await;
        }
        Err(HubError::SwitchDisconnected(dpid))
    }

    /// Wire this to every barrier-reply event the dispatch layer sees.
    /// Unknown switches and barriers are other applications' traffic on
    /// the shared event stream, not a fault.
    pub fn on_barrier_ack(&self, dpid: DatapathId, barrier_xid: Xid) {
        let Some(resolved) = self.tracker.resolve_barrier(dpid, barrier_xid) else {
            debug!(
                self.logger,
                "Barrier reply {barrier_xid} on switch {dpid:#x} matches no transaction - ignored"
            );
            return;
        };
        debug!(
            self.logger,
            "Transaction '{}' on switch {dpid:#x} resolved ({} messages)",
            resolved.txn_tag,
            resolved.results.len()
        );
        if resolved.results.is_empty() {
            // A flush carries no messages of its own.  Answer with one
            // ok reply for the barrier so the caller can observe
            // completion.
            let reply = Reply {
                txn_tag: resolved.txn_tag,
                message_xid: barrier_xid,
                result: Ok(()),
            };
            if resolved.reply_tx.try_send(reply).is_err() {
                debug!(
                    self.logger,
                    "Flush reply for barrier {barrier_xid} on switch {dpid:#x} dropped - no receiver"
                );
            }
            return;
        }
        for (message_xid, error) in resolved.results {
            let reply = Reply {
                txn_tag: resolved.txn_tag.clone(),
                message_xid,
                result: match error {
                    Some(e) => Err(e),
                    None => Ok(()),
                },
            };
            if resolved.reply_tx.try_send(reply).is_err() {
                // Caller dropped its channel; it no longer wants the answer.
                debug!(
                    self.logger,
                    "Reply for xid {message_xid} on switch {dpid:#x} dropped - no receiver"
                );
            }
        }
    }

    /// Wire this to every error-notification event the dispatch layer
    /// sees.  The error surfaces in the reply for that one message when
    /// its barrier resolves; the rest of the batch is unaffected.
    pub fn on_message_error(&self, dpid: DatapathId, message_xid: Xid, error: OfpErrorMsg) {
        self.tracker.record_error(dpid, message_xid, error);
    }

    /// Compute the subset of `desired` not already present in
    /// `installed`, plus the installed flows nothing desired claims.
    /// Makes default-flow reinstallation on reconnect a no-op.
    pub fn reconcile(
        &self,
        switch: &dyn Switch,
        desired: Vec<FlowMod>,
        installed: &[FlowMod],
    ) -> (Vec<FlowMod>, Vec<FlowMod>) {
        let (to_send, unclaimed) = ofproto::reconcile(desired, installed);
        debug!(
            self.logger,
            "Reconciled switch {:#x}: {} flows to send, {} installed flows unclaimed",
            switch.datapath_id(),
            to_send.len(),
            unclaimed.len()
        );
        (to_send, unclaimed)
    }

    /// Drop all bookkeeping for a switch whose connection went away.
    pub fn forget_switch(&self, dpid: DatapathId) {
        self.tracker.remove_switch(dpid);
    }

    pub async fn graceful_shutdown(&self) {
        if let Some(handle) = self.sweeper.lock().await.take() {
            handle.graceful_shutdown().await;
        }
    }
}
