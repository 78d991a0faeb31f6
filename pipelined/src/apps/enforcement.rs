//! enforcement - per-subscriber policy-rule flows; unmatched traffic is dropped

use super::flow_app::{FlowApp, install_flows};
use crate::tables::TableAllocator;
use anyhow::Result;
use async_trait::async_trait;
use ofhub::{MessageHub, Switch};
use ofproto::{
    Action, DEFAULT_PRIORITY, FlowMatch, FlowMod, MINIMUM_PRIORITY, RULE_NUM_REG,
    RULE_VERSION_REG,
};
use slog::{Logger, info};
use std::time::Duration;

pub const APP_NAME: &str = "enforcement";

pub struct Enforcement {
    table: u8,
    next_table: u8,
    hub: MessageHub,
    response_timeout: Duration,
    logger: Logger,
}

impl Enforcement {
    pub fn new(
        allocator: &TableAllocator,
        hub: MessageHub,
        response_timeout: Duration,
        logger: Logger,
    ) -> Result<Self> {
        Ok(Enforcement {
            table: allocator.get_table_num(APP_NAME)?,
            next_table: allocator.get_next_table_num(APP_NAME)?,
            hub,
            response_timeout,
            logger,
        })
    }

    /// Install the flow for one policy rule of one subscriber.  The
    /// rule number and version ride in registers so the stats layer can
    /// attribute the traffic; the cookie lets us delete by rule later.
    pub async fn activate_rule(
        &self,
        switch: &dyn Switch,
        imsi: u64,
        rule_num: u32,
        rule_version: u32,
        match_fields: FlowMatch,
    ) -> Result<()> {
        info!(
            self.logger,
            "Activating rule {rule_num} v{rule_version} for subscriber {imsi:#x}"
        );
        let flow = FlowMod::add(self.table)
            .priority(DEFAULT_PRIORITY)
            .cookie(rule_num as u64)
            .matching(match_fields.metadata(imsi))
            .apply_actions(vec![
                Action::RegisterLoad {
                    dst: RULE_NUM_REG,
                    value: rule_num as u64,
                },
                Action::RegisterLoad {
                    dst: RULE_VERSION_REG,
                    value: rule_version as u64,
                },
                Action::ResubmitTable {
                    table: self.next_table,
                },
            ]);
        install_flows(&self.hub, switch, vec![flow], APP_NAME, self.response_timeout).await
    }

    /// Remove one rule's flows, or all of a subscriber's flows when
    /// `rule_num` is None.
    pub async fn deactivate_rule(
        &self,
        switch: &dyn Switch,
        imsi: u64,
        rule_num: Option<u32>,
    ) -> Result<()> {
        info!(
            self.logger,
            "Deactivating rule {rule_num:?} for subscriber {imsi:#x}"
        );
        let mut flow = FlowMod::delete(self.table).matching(FlowMatch::new().metadata(imsi));
        if let Some(num) = rule_num {
            flow = flow.cookie(num as u64);
        }
        install_flows(&self.hub, switch, vec![flow], APP_NAME, self.response_timeout).await
    }
}

#[async_trait]
impl FlowApp for Enforcement {
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
        // Traffic matching no policy rule is dropped.
        vec![FlowMod::add(self.table).priority(MINIMUM_PRIORITY)]
    }
}
