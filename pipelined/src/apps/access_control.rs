//! access_control - IP blocklist enforcement ahead of the rest of the pipeline

use super::flow_app::{FlowApp, install_flows};
use crate::tables::TableAllocator;
use anyhow::Result;
use async_trait::async_trait;
use ofhub::{MessageHub, Switch};
use ofproto::{FlowMatch, FlowMod, MAXIMUM_PRIORITY, MINIMUM_PRIORITY};
use slog::{Logger, info};
use std::net::Ipv4Addr;
use std::time::Duration;

pub const APP_NAME: &str = "access_control";

const ETH_TYPE_IPV4: u16 = 0x0800;
const HOST_MASK: Ipv4Addr = Ipv4Addr::new(255, 255, 255, 255);

pub struct AccessControl {
    table: u8,
    next_table: u8,
    hub: MessageHub,
    response_timeout: Duration,
    logger: Logger,
}

impl AccessControl {
    pub fn new(
        allocator: &TableAllocator,
        hub: MessageHub,
        response_timeout: Duration,
        logger: Logger,
    ) -> Result<Self> {
        Ok(AccessControl {
            table: allocator.get_table_num(APP_NAME)?,
            next_table: allocator.get_next_table_num(APP_NAME)?,
            hub,
            response_timeout,
            logger,
        })
    }

    /// Drop all traffic to or from `ip`, ahead of any allow rules.
    pub async fn block_ip(&self, switch: &dyn Switch, ip: Ipv4Addr) -> Result<()> {
        info!(
            self.logger,
            "Blocking {ip} on switch {:#x}",
            switch.datapath_id()
        );
        let flows = self.blocklist_flows(ip, FlowMod::add);
        install_flows(&self.hub, switch, flows, APP_NAME, self.response_timeout).await
    }

    pub async fn unblock_ip(&self, switch: &dyn Switch, ip: Ipv4Addr) -> Result<()> {
        info!(
            self.logger,
            "Unblocking {ip} on switch {:#x}",
            switch.datapath_id()
        );
        let flows = self.blocklist_flows(ip, FlowMod::delete);
        install_flows(&self.hub, switch, flows, APP_NAME, self.response_timeout).await
    }

    fn blocklist_flows(&self, ip: Ipv4Addr, make: fn(u8) -> FlowMod) -> Vec<FlowMod> {
        // A blocked address is dropped in both directions.  An empty
        // instruction list is a drop.
        vec![
            make(self.table).priority(MAXIMUM_PRIORITY).matching(
                FlowMatch::new()
                    .eth_type(ETH_TYPE_IPV4)
                    .ipv4_dst(ip, HOST_MASK),
            ),
            make(self.table).priority(MAXIMUM_PRIORITY).matching(
                FlowMatch::new()
                    .eth_type(ETH_TYPE_IPV4)
                    .ipv4_src(ip, HOST_MASK),
            ),
        ]
    }
}

#[async_trait]
impl FlowApp for AccessControl {
    fn name(&self) -> &'static str {
        APP_NAME
    }

    fn hub(&self) -> &MessageHub {
        &self.hub
    }

    fn logger(&self) -> &Logger {
        &self.logger
    }

    fn response_timeout(&self) -> Duration {
        self.response_timeout
    }

    fn default_flows(&self) -> Vec<FlowMod> {
        vec![
            FlowMod::add(self.table)
                .priority(MINIMUM_PRIORITY)
                .resubmit_to(self.next_table),
        ]
    }
}
