//! pipelined - assembly of the flow-table apps behind one message hub

use crate::apps::{
    AccessControl, CheckQuota, Egress, Enforcement, FlowApp, Ipfix, Ipv6Solicitation,
    access_control, check_quota, egress, enforcement, ipfix, ipv6_solicitation,
};
use crate::data::Config;
use crate::tables::TableAllocator;
use anyhow::{Result, bail};
use ofhub::{MessageHub, Switch};
use ofproto::{DatapathId, FlowMod, OfpErrorMsg, Xid};
use slog::{Logger, info, o};
use std::time::Duration;

/// The pipeline service: one message hub, one table allocator, and the
/// configured apps in table order.  The external datapath connection
/// layer drives the `on_*` event surface.
pub struct Pipelined {
    config: Config,
    hub: MessageHub,
    allocator: TableAllocator,
    apps: Vec<Box<dyn FlowApp>>,
    logger: Logger,
}

impl Pipelined {
    pub fn new(config: Config, logger: Logger) -> Result<Self> {
        let hub = MessageHub::new(logger.clone());
        let app_names: Vec<&str> = config.apps.iter().map(String::as_str).collect();
        let mut allocator = TableAllocator::new(&app_names)?;
        let timeout = Duration::from_millis(config.response_timeout_ms);

        let mut apps: Vec<Box<dyn FlowApp>> = Vec::new();
        for name in &config.apps {
            let app_logger = logger.new(o!("app" => name.clone()));
            let app: Box<dyn FlowApp> = match name.as_str() {
                access_control::APP_NAME => Box::new(AccessControl::new(
                    &allocator,
                    hub.clone(),
                    timeout,
                    app_logger,
                )?),
                check_quota::APP_NAME => Box::new(CheckQuota::new(
                    &mut allocator,
                    hub.clone(),
                    timeout,
                    app_logger,
                )?),
                enforcement::APP_NAME => Box::new(Enforcement::new(
                    &allocator,
                    hub.clone(),
                    timeout,
                    app_logger,
                )?),
                ipfix::APP_NAME => {
                    Box::new(Ipfix::new(&allocator, hub.clone(), timeout, app_logger)?)
                }
                ipv6_solicitation::APP_NAME => Box::new(Ipv6Solicitation::new(
                    &allocator,
                    hub.clone(),
                    timeout,
                    app_logger,
                )?),
                egress::APP_NAME => {
                    Box::new(Egress::new(&allocator, hub.clone(), timeout, app_logger)?)
                }
                other => bail!("Unknown pipeline app '{other}'"),
            };
            apps.push(app);
        }
        info!(logger, "Pipeline: {}", config.apps.join(" -> "));

        Ok(Pipelined {
            config,
            hub,
            allocator,
            apps,
            logger,
        })
    }

    /// Called by the connection layer with the switch's current flow
    /// dump.  Each app reconciles and installs only what is missing, so
    /// reconnects neither duplicate nor churn surviving flows.
    pub async fn on_switch_connected(
        &self,
        switch: &dyn Switch,
        installed: &[FlowMod],
    ) -> Result<()> {
        info!(
            self.logger,
            "Switch {:#x} connected, {} installed flows reported",
            switch.datapath_id(),
            installed.len()
        );
        for app in &self.apps {
            app.handle_switch_connected(switch, installed).await?;
        }
        Ok(())
    }

    /// A reconnecting switch comes back under a new datapath id; the
    /// old id's transactions are dropped here, and their callers time
    /// out on their channels.
    pub fn on_switch_disconnected(&self, dpid: DatapathId) {
        info!(self.logger, "Switch {dpid:#x} disconnected");
        self.hub.forget_switch(dpid);
    }

    // Event wiring for the dispatch layer that observes barrier replies
    // and error notifications on each switch connection.
    pub fn on_barrier_ack(&self, dpid: DatapathId, barrier_xid: Xid) {
        self.hub.on_barrier_ack(dpid, barrier_xid);
    }

    pub fn on_message_error(&self, dpid: DatapathId, message_xid: Xid, error: OfpErrorMsg) {
        self.hub.on_message_error(dpid, message_xid, error);
    }

    /// Fire-and-forget send of one message, with the configured retry
    /// budget.  No barrier; use an app's install path when the outcome
    /// matters.
    pub async fn send_single(&self, switch: &dyn Switch, flow: FlowMod) -> Result<()> {
        self.hub
            .send_single(switch, flow, self.config.send_retries)
            .await?;
        Ok(())
    }

    pub fn hub(&self) -> &MessageHub {
        &self.hub
    }

    pub fn table_allocator(&self) -> &TableAllocator {
        &self.allocator
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn graceful_shutdown(self) {
        info!(self.logger, "Shutting down");
        self.hub.graceful_shutdown().await;
    }
}
