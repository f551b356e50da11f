//! Handle-ownership accounting across the send and receive paths, checked
//! against the loopback engine's live-message probe.

use std::sync::Arc;

use ferrule::prelude::*;

fn session_on(engine: &LoopbackEngine) -> Session {
    Session::new(Arc::new(engine.clone())).unwrap()
}

#[test]
fn successful_send_transfers_ownership_to_the_transport() {
    let engine = LoopbackEngine::new();
    let session = session_on(&engine);

    let consumer = session.pull().unwrap();
    consumer.listen("inproc://own-send", Flags::NONE).unwrap();
    let producer = session.push().unwrap();
    producer.dial("inproc://own-send", Flags::NONE).unwrap();

    let mut msg = producer.message_with(b"moved").unwrap();
    assert_eq!(engine.live_messages(), 1);

    producer.send_msg(&mut msg, Flags::NONE).unwrap();
    assert!(!msg.has_handle());
    // Still one live message: it sits in the consumer queue, not leaked.
    assert_eq!(engine.live_messages(), 1);

    let got = consumer.recv_msg(Flags::NONE).unwrap();
    assert_eq!(&got.body()[..], b"moved");
    drop(got);
    assert_eq!(engine.live_messages(), 0);
}

#[test]
fn failed_send_leaves_the_caller_owning_the_message() {
    let engine = LoopbackEngine::new();
    let session = session_on(&engine);

    // Push socket with no peer: delivery has nowhere to go.
    let producer = session.push().unwrap();
    let mut msg = producer.message_with(b"keep me").unwrap();

    let err = producer.send_msg(&mut msg, Flags::NONE).unwrap_err();
    assert!(err.is_try_again());

    // Content intact, handle intact, nothing leaked.
    assert!(msg.has_handle());
    assert_eq!(&msg.body()[..], b"keep me");
    assert_eq!(engine.live_messages(), 1);

    drop(msg);
    assert_eq!(engine.live_messages(), 0);
}

#[test]
fn failed_raw_send_leaks_nothing() {
    let engine = LoopbackEngine::new();
    let session = session_on(&engine);

    let producer = session.push().unwrap();
    let err = producer.send(b"doomed", Flags::NONE).unwrap_err();
    assert!(err.is_try_again());
    assert_eq!(engine.live_messages(), 0);
}

#[test]
fn failed_receive_leaks_nothing() {
    let engine = LoopbackEngine::new();
    let session = session_on(&engine);

    let consumer = session.pull().unwrap();
    let mut msg = consumer.message();
    assert!(!consumer.try_recv_msg(&mut msg, Flags::NONBLOCK).unwrap());
    assert_eq!(engine.live_messages(), 0);
}

#[test]
fn receive_replaces_a_previously_held_handle_without_leaking() {
    let engine = LoopbackEngine::new();
    let session = session_on(&engine);

    let consumer = session.pull().unwrap();
    consumer.listen("inproc://own-reuse", Flags::NONE).unwrap();
    let producer = session.push().unwrap();
    producer.dial("inproc://own-reuse", Flags::NONE).unwrap();

    producer.send(b"first", Flags::NONE).unwrap();
    producer.send(b"second", Flags::NONE).unwrap();

    let mut msg = consumer.message();
    assert!(consumer.try_recv_msg(&mut msg, Flags::NONE).unwrap());
    assert_eq!(&msg.body()[..], b"first");

    // Reusing the same message for the second receive frees the first body.
    assert!(consumer.try_recv_msg(&mut msg, Flags::NONE).unwrap());
    assert_eq!(&msg.body()[..], b"second");
    assert_eq!(engine.live_messages(), 1);

    drop(msg);
    assert_eq!(engine.live_messages(), 0);
}

#[test]
fn closing_a_socket_reclaims_queued_messages() {
    let engine = LoopbackEngine::new();
    let session = session_on(&engine);

    let mut consumer = session.pull().unwrap();
    consumer.listen("inproc://own-close", Flags::NONE).unwrap();
    let producer = session.push().unwrap();
    producer.dial("inproc://own-close", Flags::NONE).unwrap();

    producer.send(b"queued 1", Flags::NONE).unwrap();
    producer.send(b"queued 2", Flags::NONE).unwrap();
    assert_eq!(engine.live_messages(), 2);

    consumer.close().unwrap();
    assert_eq!(engine.live_messages(), 0);
}
