//! match_fields - the match predicate of a flow rule

use crate::actions::{DIRECTION_REG, Direction};
use std::collections::BTreeMap;
use std::net::{Ipv4Addr, Ipv6Addr};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatchValue {
    UInt(u64),
    Ipv4 { addr: Ipv4Addr, mask: Ipv4Addr },
    Ipv6 { addr: Ipv6Addr, mask: Ipv6Addr },
}

impl MatchValue {
    /// An all-zero address with an all-zero mask matches anything, which
    /// is the same as the field not being present at all.
    pub fn is_wildcard(&self) -> bool {
        match self {
            MatchValue::UInt(_) => false,
            MatchValue::Ipv4 { addr, mask } => addr.is_unspecified() && mask.is_unspecified(),
            MatchValue::Ipv6 { addr, mask } => addr.is_unspecified() && mask.is_unspecified(),
        }
    }
}

/// Set of match fields, keyed by OXM-style field name.  Built with the
/// typed methods below; `field` is the escape hatch for anything else.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FlowMatch {
    fields: BTreeMap<&'static str, MatchValue>,
}

impl FlowMatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &'static str, value: MatchValue) -> Self {
        self.fields.insert(name, value);
        self
    }

    pub fn in_port(self, port: u32) -> Self {
        self.field("in_port", MatchValue::UInt(port as u64))
    }

    pub fn eth_type(self, eth_type: u16) -> Self {
        self.field("eth_type", MatchValue::UInt(eth_type as u64))
    }

    pub fn vlan_vid(self, vid: u16) -> Self {
        self.field("vlan_vid", MatchValue::UInt(vid as u64))
    }

    pub fn ip_proto(self, proto: u8) -> Self {
        self.field("ip_proto", MatchValue::UInt(proto as u64))
    }

    pub fn icmpv6_type(self, icmp_type: u8) -> Self {
        self.field("icmpv6_type", MatchValue::UInt(icmp_type as u64))
    }

    pub fn ipv4_src(self, addr: Ipv4Addr, mask: Ipv4Addr) -> Self {
        self.field("ipv4_src", MatchValue::Ipv4 { addr, mask })
    }

    pub fn ipv4_dst(self, addr: Ipv4Addr, mask: Ipv4Addr) -> Self {
        self.field("ipv4_dst", MatchValue::Ipv4 { addr, mask })
    }

    pub fn ipv6_src(self, addr: Ipv6Addr, mask: Ipv6Addr) -> Self {
        self.field("ipv6_src", MatchValue::Ipv6 { addr, mask })
    }

    pub fn ipv6_dst(self, addr: Ipv6Addr, mask: Ipv6Addr) -> Self {
        self.field("ipv6_dst", MatchValue::Ipv6 { addr, mask })
    }

    pub fn tcp_src(self, port: u16) -> Self {
        self.field("tcp_src", MatchValue::UInt(port as u64))
    }

    pub fn tcp_dst(self, port: u16) -> Self {
        self.field("tcp_dst", MatchValue::UInt(port as u64))
    }

    pub fn udp_src(self, port: u16) -> Self {
        self.field("udp_src", MatchValue::UInt(port as u64))
    }

    pub fn udp_dst(self, port: u16) -> Self {
        self.field("udp_dst", MatchValue::UInt(port as u64))
    }

    pub fn metadata(self, value: u64) -> Self {
        self.field("metadata", MatchValue::UInt(value))
    }

    pub fn tun_id(self, value: u64) -> Self {
        self.field("tun_id", MatchValue::UInt(value))
    }

    pub fn reg(self, reg: &'static str, value: u64) -> Self {
        self.field(reg, MatchValue::UInt(value))
    }

    pub fn direction(self, direction: Direction) -> Self {
        self.reg(DIRECTION_REG, direction.into())
    }

    pub fn get(&self, name: &str) -> Option<&MatchValue> {
        self.fields.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &MatchValue)> {
        self.fields.iter().map(|(name, value)| (*name, value))
    }
}
