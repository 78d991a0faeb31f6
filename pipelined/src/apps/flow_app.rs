//! flow_app - the shape every pipeline app presents to the service

use anyhow::{Result, bail};
use async_trait::async_trait;
use ofhub::{MessageHub, Switch};
use ofproto::FlowMod;
use slog::{Logger, debug};
use std::time::Duration;

/// Extra wait on the caller side over the hub's own expiry window, so
/// that when a barrier reply never comes the hub expires first and the
/// caller times out just after.
const REPLY_WINDOW_SLACK: Duration = Duration::from_millis(250);

#[async_trait]
pub trait FlowApp: Send + Sync {
    fn name(&self) -> &'static str;
    fn hub(&self) -> &MessageHub;
    fn logger(&self) -> &Logger;
    fn response_timeout(&self) -> Duration;

    /// The flows this app needs present whenever a switch is connected.
    fn default_flows(&self) -> Vec<FlowMod>;

    /// Install whichever default flows the switch is missing.
    /// Reconciling first makes reconnects idempotent: flows that
    /// survived in the switch are not installed twice.
    async fn handle_switch_connected(
        &self,
        switch: &dyn Switch,
        installed: &[FlowMod],
    ) -> Result<()> {
        let (to_send, _unclaimed) = self
            .hub()
            .reconcile(switch, self.default_flows(), installed);
        debug!(
            self.logger(),
            "Installing {} default flows on switch {:#x}",
            to_send.len(),
            switch.datapath_id()
        );
        install_flows(
            self.hub(),
            switch,
            to_send,
            self.name(),
            self.response_timeout(),
        )
        .await
    }
}

/// Send a batch and wait for every reply.  A per-message error fails
/// the whole call; retrying is the caller's decision, after another
/// reconcile so the retry stays idempotent.
pub async fn install_flows(
    hub: &MessageHub,
    switch: &dyn Switch,
    flows: Vec<FlowMod>,
    txn_tag: &str,
    timeout: Duration,
) -> Result<()> {
    if flows.is_empty() {
        return Ok(());
    }
    let count = flows.len();
    let chan = hub.send(switch, flows, txn_tag, timeout, None)?;
    let window = timeout + REPLY_WINDOW_SLACK;
    for _ in 0..count {
        let reply = chan.get(window).await?;
        if let Err(e) = reply.result {
            bail!(
                "{txn_tag}: flow message {} rejected by switch {:#x}: {e}",
                reply.message_xid,
                switch.datapath_id()
            );
        }
    }
    Ok(())
}
