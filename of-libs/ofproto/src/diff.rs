//! diff - normalized comparison of candidate flow messages against installed flows
//!
//! Everything here is total and side-effect free.  Reconciliation runs
//! these comparisons over every installed flow in a table, potentially
//! hundreds of entries, on every reconnect.

use crate::actions::{Action, Instruction};
use crate::flow::FlowMod;
use crate::match_fields::{FlowMatch, MatchValue};
use std::collections::BTreeMap;

/// Match fields that participate in flow comparison.  Extraneous or
/// default-valued fields one representation happens to carry must not
/// cause false mismatches.
const COMPARED_FIELDS: &[&str] = &[
    "in_port",
    "eth_type",
    "eth_src",
    "eth_dst",
    "vlan_vid",
    "ip_proto",
    "icmpv6_type",
    "ipv4_src",
    "ipv4_dst",
    "ipv6_src",
    "ipv6_dst",
    "tcp_src",
    "tcp_dst",
    "udp_src",
    "udp_dst",
    "metadata",
    "tun_id",
    "reg0",
    "reg1",
    "reg2",
    "reg3",
    "reg4",
];

/// True if `candidate` would (re)install the same rule that `installed`
/// already expresses, so that sending it again is a duplicate.
pub fn flows_equivalent(installed: &FlowMod, candidate: &FlowMod) -> bool {
    installed.table_id == candidate.table_id
        && installed.priority == candidate.priority
        && matches_equivalent(&installed.match_fields, &candidate.match_fields)
        && instructions_equivalent(&installed.instructions, &candidate.instructions)
}

/// For each desired message, claim one equivalent installed flow if
/// there is one.  Returns the messages that still need sending and the
/// installed flows no desired message claimed (deletion candidates).
pub fn reconcile(desired: Vec<FlowMod>, installed: &[FlowMod]) -> (Vec<FlowMod>, Vec<FlowMod>) {
    let mut remaining: Vec<FlowMod> = installed.to_vec();
    let mut to_send = Vec::new();
    for msg in desired {
        match remaining.iter().position(|flow| flows_equivalent(flow, &msg)) {
            Some(idx) => {
                remaining.remove(idx);
            }
            None => to_send.push(msg),
        }
    }
    (to_send, remaining)
}

fn matches_equivalent(a: &FlowMatch, b: &FlowMatch) -> bool {
    normalized(a) == normalized(b)
}

fn normalized(m: &FlowMatch) -> BTreeMap<&'static str, &MatchValue> {
    m.iter()
        .filter(|(name, value)| COMPARED_FIELDS.contains(name) && !value.is_wildcard())
        .collect()
}

fn instructions_equivalent(a: &[Instruction], b: &[Instruction]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|pair| match pair {
            (Instruction::ApplyActions(x), Instruction::ApplyActions(y)) => {
                actions_equivalent(x, y)
            }
            // Only register loads, resubmits and outputs affect
            // equivalence; other instruction kinds are ignored.
            _ => true,
        })
}

fn actions_equivalent(a: &[Action], b: &[Action]) -> bool {
    register_loads(a) == register_loads(b)
        && resubmits(a) == resubmits(b)
        && outputs(a) == outputs(b)
}

fn register_loads(actions: &[Action]) -> BTreeMap<&'static str, u64> {
    actions
        .iter()
        .filter_map(|a| match a {
            Action::RegisterLoad { dst, value } => Some((*dst, *value)),
            _ => None,
        })
        .collect()
}

fn resubmits(actions: &[Action]) -> Vec<u8> {
    let mut tables: Vec<u8> = actions
        .iter()
        .filter_map(|a| match a {
            Action::ResubmitTable { table } => Some(*table),
            _ => None,
        })
        .collect();
    tables.sort_unstable();
    tables
}

fn outputs(actions: &[Action]) -> Vec<u32> {
    let mut ports: Vec<u32> = actions
        .iter()
        .filter_map(|a| match a {
            Action::Output { port } => Some(*port),
            _ => None,
        })
        .collect();
    ports.sort_unstable();
    ports
}
