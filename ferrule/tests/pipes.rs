use std::sync::Arc;

use ferrule::prelude::*;

fn connected_pair(addr: &str) -> (Socket, Socket) {
    let session = Session::new(Arc::new(LoopbackEngine::new())).unwrap();
    let server = session.pair().unwrap();
    server.listen(addr, Flags::NONE).unwrap();
    let client = session.pair().unwrap();
    client.dial(addr, Flags::NONE).unwrap();
    (server, client)
}

#[test]
fn received_message_carries_a_pipe_snapshot() {
    let (server, client) = connected_pair("inproc://pipe-snap");

    client.send(b"tagged", Flags::NONE).unwrap();
    let msg = server.recv_msg(Flags::NONE).unwrap();

    let pipe = msg.pipe().expect("received message should know its pipe");
    assert!(!pipe.id().is_none());

    // The snapshot is plain data; the message is still fully usable.
    assert_eq!(&msg.body()[..], b"tagged");
}

#[test]
fn locally_built_message_has_no_pipe() {
    let (_, client) = connected_pair("inproc://pipe-local");
    let msg = client.message_with(b"homemade").unwrap();
    assert!(msg.pipe().is_none());
}

#[test]
fn closing_a_pipe_disconnects_the_path() {
    let (server, client) = connected_pair("inproc://pipe-close");

    client.send(b"before", Flags::NONE).unwrap();
    let msg = server.recv_msg(Flags::NONE).unwrap();
    let pipe = msg.pipe().unwrap();

    pipe.close().unwrap();

    // Both directions ran over that pipe; with it gone the send has no peer.
    let err = client.send(b"after", Flags::NONE).unwrap_err();
    assert!(err.is_try_again());
}

#[test]
fn messages_over_the_same_connection_report_the_same_pipe() {
    let (server, client) = connected_pair("inproc://pipe-stable");

    client.send(b"one", Flags::NONE).unwrap();
    client.send(b"two", Flags::NONE).unwrap();

    let first = server.recv_msg(Flags::NONE).unwrap();
    let second = server.recv_msg(Flags::NONE).unwrap();
    assert_eq!(first.pipe().unwrap().id(), second.pipe().unwrap().id());
}

#[test]
fn reconnecting_after_a_pipe_close_yields_a_new_pipe() {
    let (server, client) = connected_pair("inproc://pipe-reconnect");

    client.send(b"first life", Flags::NONE).unwrap();
    let msg = server.recv_msg(Flags::NONE).unwrap();
    let old_pipe = msg.pipe().unwrap();
    let old_id = old_pipe.id();
    old_pipe.close().unwrap();

    client.dial("inproc://pipe-reconnect", Flags::NONE).unwrap();
    client.send(b"second life", Flags::NONE).unwrap();
    let msg = server.recv_msg(Flags::NONE).unwrap();
    assert_ne!(msg.pipe().unwrap().id(), old_id);
}

#[test]
fn a_second_dial_uses_a_distinct_pipe() {
    let session = Session::new(Arc::new(LoopbackEngine::new())).unwrap();
    let consumer = session.pull().unwrap();
    consumer.listen("inproc://pipe-redial", Flags::NONE).unwrap();

    let first = session.push().unwrap();
    first.dial("inproc://pipe-redial", Flags::NONE).unwrap();
    first.send(b"from first", Flags::NONE).unwrap();

    let second = session.push().unwrap();
    second.dial("inproc://pipe-redial", Flags::NONE).unwrap();
    second.send(b"from second", Flags::NONE).unwrap();

    let a = consumer.recv_msg(Flags::NONE).unwrap();
    let b = consumer.recv_msg(Flags::NONE).unwrap();
    assert_ne!(a.pipe().unwrap().id(), b.pipe().unwrap().id());
}
