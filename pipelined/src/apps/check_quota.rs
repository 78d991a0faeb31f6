//! check_quota - steers subscriber traffic through quota-state scratch tables

use super::flow_app::{FlowApp, install_flows};
use crate::tables::TableAllocator;
use anyhow::{Result, bail};
use async_trait::async_trait;
use ofhub::{MessageHub, Switch};
use ofproto::{Action, DEFAULT_PRIORITY, FlowMatch, FlowMod, MINIMUM_PRIORITY, OFPP_LOCAL};
use slog::{Logger, info};
use std::time::Duration;

pub const APP_NAME: &str = "check_quota";

const SCRATCH_TABLE_COUNT: usize = 2;

pub struct CheckQuota {
    table: u8,
    next_table: u8,
    has_quota_table: u8,
    no_quota_table: u8,
    hub: MessageHub,
    response_timeout: Duration,
    logger: Logger,
}

impl CheckQuota {
    pub fn new(
        allocator: &mut TableAllocator,
        hub: MessageHub,
        response_timeout: Duration,
        logger: Logger,
    ) -> Result<Self> {
        let scratch = allocator.allocate_scratch_tables(APP_NAME, SCRATCH_TABLE_COUNT)?;
        let &[has_quota_table, no_quota_table] = &scratch[..] else {
            bail!("Expected {SCRATCH_TABLE_COUNT} scratch tables, got {}", scratch.len());
        };
        Ok(CheckQuota {
            table: allocator.get_table_num(APP_NAME)?,
            next_table: allocator.get_next_table_num(APP_NAME)?,
            has_quota_table,
            no_quota_table,
            hub,
            response_timeout,
            logger,
        })
    }

    /// Steer a subscriber's traffic into the scratch table matching its
    /// quota state.  Re-applying with the other state replaces the flow
    /// (same table, priority and match).
    pub async fn update_subscriber_quota(
        &self,
        switch: &dyn Switch,
        imsi: u64,
        has_quota: bool,
    ) -> Result<()> {
        info!(
            self.logger,
            "Subscriber {imsi:#x} quota state: {}",
            if has_quota { "ok" } else { "exhausted" }
        );
        let scratch = if has_quota {
            self.has_quota_table
        } else {
            self.no_quota_table
        };
        let flow = FlowMod::add(self.table)
            .priority(DEFAULT_PRIORITY)
            .matching(FlowMatch::new().metadata(imsi))
            .resubmit_to(scratch);
        install_flows(&self.hub, switch, vec![flow], APP_NAME, self.response_timeout).await
    }

    pub async fn clear_subscriber_quota(&self, switch: &dyn Switch, imsi: u64) -> Result<()> {
        let flow = FlowMod::delete(self.table).matching(FlowMatch::new().metadata(imsi));
        install_flows(&self.hub, switch, vec![flow], APP_NAME, self.response_timeout).await
    }
}

#[async_trait]
impl FlowApp for CheckQuota {
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
            // Subscribers with no recorded quota state pass straight through.
            FlowMod::add(self.table)
                .priority(MINIMUM_PRIORITY)
                .resubmit_to(self.next_table),
            // Quota-ok traffic continues down the pipeline.
            FlowMod::add(self.has_quota_table)
                .priority(MINIMUM_PRIORITY)
                .resubmit_to(self.next_table),
            // Out-of-quota traffic is handed to the local stack, where
            // the captive portal redirect lives.
            FlowMod::add(self.no_quota_table)
                .priority(MINIMUM_PRIORITY)
                .apply_actions(vec![Action::Output { port: OFPP_LOCAL }]),
        ]
    }
}
