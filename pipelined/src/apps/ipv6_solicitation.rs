//! ipv6_solicitation - punts ICMPv6 router/neighbour solicitations to the controller
//!
//! The reply crafting itself lives in the surrounding service; this app
//! only owns the flows that divert solicitations out of the dataplane.

use super::flow_app::FlowApp;
use crate::tables::TableAllocator;
use anyhow::Result;
use async_trait::async_trait;
use ofhub::MessageHub;
use ofproto::{Action, DEFAULT_PRIORITY, FlowMatch, FlowMod, MINIMUM_PRIORITY, OFPP_CONTROLLER};
use slog::Logger;
use std::time::Duration;

pub const APP_NAME: &str = "ipv6_solicitation";

const ETH_TYPE_IPV6: u16 = 0x86dd;
const IP_PROTO_ICMPV6: u8 = 58;
const ICMPV6_ROUTER_SOLICITATION: u8 = 133;
const ICMPV6_NEIGHBOUR_SOLICITATION: u8 = 135;

pub struct Ipv6Solicitation {
    table: u8,
    next_table: u8,
    hub: MessageHub,
    response_timeout: Duration,
    logger: Logger,
}

impl Ipv6Solicitation {
    pub fn new(
        allocator: &TableAllocator,
        hub: MessageHub,
        response_timeout: Duration,
        logger: Logger,
    ) -> Result<Self> {
        Ok(Ipv6Solicitation {
            table: allocator.get_table_num(APP_NAME)?,
            next_table: allocator.get_next_table_num(APP_NAME)?,
            hub,
            response_timeout,
            logger,
        })
    }

    fn punt_flow(&self, icmpv6_type: u8) -> FlowMod {
        FlowMod::add(self.table)
            .priority(DEFAULT_PRIORITY)
            .matching(
                FlowMatch::new()
                    .eth_type(ETH_TYPE_IPV6)
                    .ip_proto(IP_PROTO_ICMPV6)
                    .icmpv6_type(icmpv6_type),
            )
            .apply_actions(vec![Action::Output {
                port: OFPP_CONTROLLER,
            }])
    }
}

#[async_trait]
impl FlowApp for Ipv6Solicitation {
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
            self.punt_flow(ICMPV6_ROUTER_SOLICITATION),
            self.punt_flow(ICMPV6_NEIGHBOUR_SOLICITATION),
            FlowMod::add(self.table)
                .priority(MINIMUM_PRIORITY)
                .resubmit_to(self.next_table),
        ]
    }
}
