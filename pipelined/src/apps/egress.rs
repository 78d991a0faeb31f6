//! egress - the terminal table; hands packets to the local networking stack

use super::flow_app::FlowApp;
use crate::tables::TableAllocator;
use anyhow::Result;
use async_trait::async_trait;
use ofhub::MessageHub;
use ofproto::{Action, FlowMod, MINIMUM_PRIORITY, OFPP_LOCAL};
use slog::Logger;
use std::time::Duration;

pub const APP_NAME: &str = "egress";

pub struct Egress {
    table: u8,
    hub: MessageHub,
    response_timeout: Duration,
    logger: Logger,
}

impl Egress {
    /// Egress is last in the pipeline; it never asks for a next table.
    pub fn new(
        allocator: &TableAllocator,
        hub: MessageHub,
        response_timeout: Duration,
        logger: Logger,
    ) -> Result<Self> {
        Ok(Egress {
            table: allocator.get_table_num(APP_NAME)?,
            hub,
            response_timeout,
            logger,
        })
    }
}

#[async_trait]
impl FlowApp for Egress {
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
                .apply_actions(vec![Action::Output { port: OFPP_LOCAL }]),
        ]
    }
}
