//! ipfix - mirrors subscriber traffic to the IPFIX collector by sampling

use super::flow_app::{FlowApp, install_flows};
use crate::tables::TableAllocator;
use anyhow::Result;
use async_trait::async_trait;
use ofhub::{MessageHub, Switch};
use ofproto::{Action, DEFAULT_PRIORITY, FlowMatch, FlowMod, MINIMUM_PRIORITY};
use slog::{Logger, debug};
use std::time::Duration;

pub const APP_NAME: &str = "ipfix";

// Sample every packet; rate limiting happens at the collector.
const SAMPLE_PROBABILITY: u16 = 65535;
const COLLECTOR_SET_ID: u32 = 1;

pub struct Ipfix {
    table: u8,
    next_table: u8,
    hub: MessageHub,
    response_timeout: Duration,
    logger: Logger,
}

impl Ipfix {
    pub fn new(
        allocator: &TableAllocator,
        hub: MessageHub,
        response_timeout: Duration,
        logger: Logger,
    ) -> Result<Self> {
        Ok(Ipfix {
            table: allocator.get_table_num(APP_NAME)?,
            next_table: allocator.get_next_table_num(APP_NAME)?,
            hub,
            response_timeout,
            logger,
        })
    }

    // Sampling is a vendor extension; it rides through the hub and the
    // diff engine as an opaque action.
    fn sample_action(&self, obs_domain_id: u64) -> Action {
        Action::Other(format!(
            "sample(probability={SAMPLE_PROBABILITY},collector_set_id={COLLECTOR_SET_ID},obs_domain_id={obs_domain_id})"
        ))
    }

    /// Start sampling one subscriber's traffic, attributed by IMSI.
    pub async fn add_subscriber_sample_flow(
        &self,
        switch: &dyn Switch,
        imsi: u64,
    ) -> Result<()> {
        debug!(self.logger, "Sampling traffic for subscriber {imsi:#x}");
        let flow = FlowMod::add(self.table)
            .priority(DEFAULT_PRIORITY)
            .matching(FlowMatch::new().metadata(imsi))
            .apply_actions(vec![
                self.sample_action(imsi),
                Action::ResubmitTable {
                    table: self.next_table,
                },
            ]);
        install_flows(&self.hub, switch, vec![flow], APP_NAME, self.response_timeout).await
    }

    pub async fn remove_subscriber_sample_flow(
        &self,
        switch: &dyn Switch,
        imsi: u64,
    ) -> Result<()> {
        let flow = FlowMod::delete(self.table).matching(FlowMatch::new().metadata(imsi));
        install_flows(&self.hub, switch, vec![flow], APP_NAME, self.response_timeout).await
    }
}

#[async_trait]
impl FlowApp for Ipfix {
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
