use ofproto::{
    Action, DEFAULT_PRIORITY, FlowMatch, FlowMod, OFPP_LOCAL, RULE_NUM_REG, RULE_VERSION_REG,
    flows_equivalent, reconcile,
};
use std::net::Ipv4Addr;

fn subscriber_flow(table: u8, imsi: u64) -> FlowMod {
    FlowMod::add(table)
        .priority(DEFAULT_PRIORITY)
        .matching(FlowMatch::new().metadata(imsi))
        .apply_actions(vec![
            Action::RegisterLoad {
                dst: RULE_NUM_REG,
                value: 7,
            },
            Action::ResubmitTable { table: table + 1 },
        ])
}

#[test]
fn reconcile_is_idempotent() {
    let desired = vec![
        subscriber_flow(0, 1),
        subscriber_flow(0, 2),
        subscriber_flow(0, 3),
    ];
    let installed = vec![subscriber_flow(0, 2), subscriber_flow(5, 99)];

    let (to_send, _) = reconcile(desired.clone(), &installed);
    assert_eq!(to_send.len(), 2);

    // Applying to_send and reconciling again yields nothing to send.
    let mut now_installed = installed;
    now_installed.extend(to_send);
    let (second, _) = reconcile(desired, &now_installed);
    assert!(second.is_empty());
}

#[test]
fn unclaimed_installed_flows_are_returned() {
    let desired = vec![subscriber_flow(0, 1)];
    let installed = vec![subscriber_flow(0, 1), subscriber_flow(0, 2)];

    let (to_send, unclaimed) = reconcile(desired, &installed);
    assert!(to_send.is_empty());
    // The flow for subscriber 2 is a deletion candidate.
    assert_eq!(unclaimed, vec![subscriber_flow(0, 2)]);
}

#[test]
fn each_installed_flow_is_claimed_at_most_once() {
    // Two identical desired messages, one installed copy: one still
    // needs sending.
    let desired = vec![subscriber_flow(0, 1), subscriber_flow(0, 1)];
    let installed = vec![subscriber_flow(0, 1)];

    let (to_send, unclaimed) = reconcile(desired, &installed);
    assert_eq!(to_send.len(), 1);
    assert!(unclaimed.is_empty());
}

#[test]
fn wildcard_ipv4_equals_absent_field() {
    let any = Ipv4Addr::UNSPECIFIED;
    let with_wildcard = FlowMod::add(0)
        .matching(FlowMatch::new().eth_type(0x0800).ipv4_dst(any, any))
        .resubmit_to(1);
    let without_field = FlowMod::add(0)
        .matching(FlowMatch::new().eth_type(0x0800))
        .resubmit_to(1);

    assert!(flows_equivalent(&with_wildcard, &without_field));
    assert!(flows_equivalent(&without_field, &with_wildcard));
}

#[test]
fn action_order_does_not_matter() {
    let base = FlowMatch::new().metadata(1);
    let a = FlowMod::add(0).matching(base.clone()).apply_actions(vec![
        Action::RegisterLoad {
            dst: RULE_NUM_REG,
            value: 7,
        },
        Action::RegisterLoad {
            dst: RULE_VERSION_REG,
            value: 2,
        },
        Action::ResubmitTable { table: 1 },
    ]);
    let b = FlowMod::add(0).matching(base).apply_actions(vec![
        Action::ResubmitTable { table: 1 },
        Action::RegisterLoad {
            dst: RULE_VERSION_REG,
            value: 2,
        },
        Action::RegisterLoad {
            dst: RULE_NUM_REG,
            value: 7,
        },
    ]);
    assert!(flows_equivalent(&a, &b));
}

#[test]
fn unrecognized_actions_do_not_affect_equivalence() {
    let a = FlowMod::add(0).apply_actions(vec![
        Action::Other("sample(probability=65535)".to_string()),
        Action::ResubmitTable { table: 1 },
    ]);
    let b = FlowMod::add(0).apply_actions(vec![Action::ResubmitTable { table: 1 }]);
    assert!(flows_equivalent(&a, &b));
}

#[test]
fn instruction_count_must_match() {
    let a = FlowMod::add(0)
        .apply_actions(vec![Action::ResubmitTable { table: 1 }])
        .goto_table(2);
    let b = FlowMod::add(0).apply_actions(vec![Action::ResubmitTable { table: 1 }]);
    assert!(!flows_equivalent(&a, &b));
}

#[test]
fn differing_register_value_is_a_different_flow() {
    let a = FlowMod::add(0).apply_actions(vec![Action::RegisterLoad {
        dst: RULE_NUM_REG,
        value: 7,
    }]);
    let b = FlowMod::add(0).apply_actions(vec![Action::RegisterLoad {
        dst: RULE_NUM_REG,
        value: 8,
    }]);
    assert!(!flows_equivalent(&a, &b));
}

#[test]
fn differing_resubmit_target_is_a_different_flow() {
    let a = FlowMod::add(0).resubmit_to(1);
    let b = FlowMod::add(0).resubmit_to(2);
    assert!(!flows_equivalent(&a, &b));
}

#[test]
fn differing_output_port_is_a_different_flow() {
    let a = FlowMod::add(0).apply_actions(vec![Action::Output { port: 1 }]);
    let b = FlowMod::add(0).apply_actions(vec![Action::Output { port: OFPP_LOCAL }]);
    assert!(!flows_equivalent(&a, &b));
}

#[test]
fn table_and_priority_distinguish_flows() {
    let a = subscriber_flow(0, 1);
    assert!(!flows_equivalent(&a, &subscriber_flow(1, 1)));
    let higher = subscriber_flow(0, 1).priority(DEFAULT_PRIORITY + 1);
    assert!(!flows_equivalent(&a, &higher));
}

#[test]
fn multiple_instructions_compare_positionally() {
    let a = FlowMod::add(0)
        .apply_actions(vec![Action::ResubmitTable { table: 1 }])
        .apply_actions(vec![Action::Output { port: 5 }]);
    let b = FlowMod::add(0)
        .apply_actions(vec![Action::ResubmitTable { table: 1 }])
        .apply_actions(vec![Action::Output { port: 5 }]);
    assert!(flows_equivalent(&a, &b));

    let swapped = FlowMod::add(0)
        .apply_actions(vec![Action::Output { port: 5 }])
        .apply_actions(vec![Action::ResubmitTable { table: 1 }]);
    assert!(!flows_equivalent(&a, &swapped));
}

#[test]
fn goto_table_instructions_are_ignored() {
    // Instruction kinds other than action lists carry no comparable
    // content; only their count matters.
    let a = FlowMod::add(0).goto_table(1);
    let b = FlowMod::add(0).goto_table(2);
    assert!(flows_equivalent(&a, &b));
}
