use anyhow::Result;
use ofhub::{HubError, MessageHub};
use ofproto::{OFPET_FLOW_MOD_FAILED, OfPayload, OfpErrorMsg, Xid};
use pipelined_tests::{MockSwitch, framework::*};
use std::time::Duration;

const SW1: u64 = 0x00005e00c0ffee01;

#[async_std::test]
async fn batch_then_barrier_all_ok() -> Result<()> {
    let hub = MessageHub::new(init_logging());
    let sw = MockSwitch::new(SW1);

    let msgs = vec![test_flow(0, 1), test_flow(0, 2)];
    let chan = hub.send(&sw, msgs.clone(), "t1", Duration::from_millis(1000), None)?;

    // The transmitted sequence is the two messages in order, then
    // exactly one barrier.
    let sent = sw.sent();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[0].payload, OfPayload::FlowMod(msgs[0].clone()));
    assert_eq!(sent[1].payload, OfPayload::FlowMod(msgs[1].clone()));
    assert!(sent[2].is_barrier());

    hub.on_barrier_ack(SW1, sent[2].xid);
    for expected_xid in [sent[0].xid, sent[1].xid] {
        let reply = chan.get(Duration::from_millis(1000)).await?;
        assert_eq!(reply.txn_tag, "t1");
        assert_eq!(reply.message_xid, expected_xid);
        assert!(reply.ok());
    }
    Ok(())
}

#[async_std::test]
async fn per_message_error_is_isolated() -> Result<()> {
    let hub = MessageHub::new(init_logging());
    let sw = MockSwitch::new(SW1);

    let msgs = vec![test_flow(0, 1), test_flow(0, 2), test_flow(0, 3)];
    let chan = hub.send(&sw, msgs, "t1", Duration::from_millis(1000), None)?;
    let sent = sw.sent();

    // Message 2 of 3 is rejected before the barrier reply arrives.
    let error = OfpErrorMsg::new(OFPET_FLOW_MOD_FAILED, 0);
    hub.on_message_error(SW1, sent[1].xid, error.clone());
    hub.on_barrier_ack(SW1, sent[3].xid);

    let first = chan.get(Duration::from_millis(1000)).await?;
    assert!(first.ok());
    let second = chan.get(Duration::from_millis(1000)).await?;
    assert_eq!(second.result, Err(error));
    let third = chan.get(Duration::from_millis(1000)).await?;
    assert!(third.ok());
    Ok(())
}

#[async_std::test]
async fn send_to_disconnected_switch_fails_fast() -> Result<()> {
    let hub = MessageHub::new(init_logging());
    let sw = MockSwitch::new(SW1);
    sw.disconnect();

    let err = hub
        .send(&sw, vec![test_flow(0, 1)], "t1", Duration::from_millis(1000), None)
        .unwrap_err();
    assert!(matches!(err, HubError::SwitchDisconnected(SW1)));
    // Nothing was transmitted: no partial batch, no barrier.
    assert!(sw.sent().is_empty());
    Ok(())
}

#[async_std::test]
async fn reply_times_out_without_barrier_ack() -> Result<()> {
    let hub = MessageHub::new(init_logging());
    let sw = MockSwitch::new(SW1);

    let chan = hub.send(&sw, vec![test_flow(0, 1)], "t1", Duration::from_millis(50), None)?;
    let err = chan.get(Duration::from_millis(100)).await.unwrap_err();
    assert!(matches!(err, HubError::ChannelTimeout));
    Ok(())
}

#[async_std::test]
async fn barrier_resolves_only_once() -> Result<()> {
    let hub = MessageHub::new(init_logging());
    let sw = MockSwitch::new(SW1);

    let chan = hub.send(&sw, vec![test_flow(0, 1)], "t1", Duration::from_millis(1000), None)?;
    let barrier = sw.sent()[1].xid;

    hub.on_barrier_ack(SW1, barrier);
    assert!(chan.get(Duration::from_millis(1000)).await?.ok());

    // A duplicate acknowledgement of the same barrier produces nothing.
    hub.on_barrier_ack(SW1, barrier);
    let err = chan.get(Duration::from_millis(50)).await.unwrap_err();
    assert!(matches!(err, HubError::ChannelTimeout));
    Ok(())
}

#[async_std::test]
async fn expired_transaction_ignores_late_barrier() -> Result<()> {
    let hub = MessageHub::new(init_logging());
    let sw = MockSwitch::new(SW1);

    let chan = hub.send(&sw, vec![test_flow(0, 1)], "t1", Duration::from_millis(10), None)?;
    let barrier = sw.sent()[1].xid;

    // Give the deadline sweeper ample time to expire the transaction,
    // then deliver the barrier reply late.
    async_std::task::sleep(Duration::from_millis(200)).await;
    hub.on_barrier_ack(SW1, barrier);

    let err = chan.get(Duration::from_millis(50)).await.unwrap_err();
    assert!(matches!(err, HubError::ChannelTimeout));
    Ok(())
}

#[async_std::test]
async fn unknown_switch_events_are_ignored() -> Result<()> {
    let hub = MessageHub::new(init_logging());

    // Events for a switch the hub has never seen must be harmless:
    // several apps share one event stream.
    hub.on_barrier_ack(0xdead, Xid(42));
    hub.on_message_error(0xdead, Xid(43), OfpErrorMsg::new(OFPET_FLOW_MOD_FAILED, 0));

    // The hub still works normally afterwards.
    let sw = MockSwitch::new(SW1);
    let chan = hub.send(&sw, vec![test_flow(0, 1)], "t1", Duration::from_millis(1000), None)?;
    hub.on_barrier_ack(SW1, sw.sent()[1].xid);
    expect_ok_replies(&chan, 1).await
}

#[async_std::test]
async fn empty_batch_sends_lone_barrier() -> Result<()> {
    let hub = MessageHub::new(init_logging());
    let sw = MockSwitch::new(SW1);

    // Callers flush a switch by sending an empty batch.
    let chan = hub.send(&sw, vec![], "flush", Duration::from_millis(1000), None)?;
    let sent = sw.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].is_barrier());

    // The barrier itself is answered, so the flushing caller can
    // observe completion.
    hub.on_barrier_ack(SW1, sent[0].xid);
    let reply = chan.get(Duration::from_millis(1000)).await?;
    assert_eq!(reply.txn_tag, "flush");
    assert_eq!(reply.message_xid, sent[0].xid);
    assert!(reply.ok());
    Ok(())
}

#[async_std::test]
async fn batches_can_share_one_channel() -> Result<()> {
    let hub = MessageHub::new(init_logging());
    let sw = MockSwitch::new(SW1);

    let chan = hub.send(&sw, vec![test_flow(0, 1)], "a", Duration::from_millis(1000), None)?;
    let chan2 = hub.send(
        &sw,
        vec![test_flow(0, 2)],
        "b",
        Duration::from_millis(1000),
        Some(chan.clone()),
    )?;

    for barrier in sw.barrier_xids() {
        hub.on_barrier_ack(SW1, barrier);
    }
    let mut tags = vec![
        chan2.get(Duration::from_millis(1000)).await?.txn_tag,
        chan2.get(Duration::from_millis(1000)).await?.txn_tag,
    ];
    tags.sort();
    assert_eq!(tags, ["a", "b"]);
    Ok(())
}

#[async_std::test]
async fn send_single_is_fire_and_forget() -> Result<()> {
    let hub = MessageHub::new(init_logging());
    let sw = MockSwitch::new(SW1);

    hub.send_single(&sw, test_flow(0, 1), 3).await?;
    let sent = sw.sent();
    assert_eq!(sent.len(), 1);
    assert!(!sent[0].is_barrier());
    Ok(())
}

#[async_std::test]
async fn send_single_retries_then_surfaces_disconnect() -> Result<()> {
    let hub = MessageHub::new(init_logging());
    let sw = MockSwitch::new(SW1);
    sw.disconnect();

    let err = hub.send_single(&sw, test_flow(0, 1), 2).await.unwrap_err();
    assert!(matches!(err, HubError::SwitchDisconnected(SW1)));
    Ok(())
}
