//! Push/pull pipeline over the in-memory loopback engine.
//!
//! Run with `RUST_LOG=debug cargo run --example pipeline` to see the
//! wrapper's structured logs.

use std::sync::Arc;

use ferrule::prelude::*;

fn main() -> ferrule::Result<()> {
    ferrule::dev_tracing::init_tracing();

    let session = Session::new(Arc::new(LoopbackEngine::new()))?;

    let consumer = session.pull()?;
    let mut listener = Listener::new();
    consumer.listen_with("inproc://pipeline-*", &mut listener, Flags::NONE)?;
    println!("consumer listening at {}", listener.local_address()?);

    let producer = session.push()?;
    producer.dial(&listener.local_address()?, Flags::NONE)?;

    for n in 0..5 {
        let mut job = producer.message_with(format!("job {n}").as_bytes())?;
        producer.send_msg(&mut job, Flags::NONE)?;
    }

    loop {
        let mut msg = consumer.message();
        if !consumer.try_recv_msg(&mut msg, Flags::NONBLOCK)? {
            break;
        }
        println!("consumed: {}", String::from_utf8_lossy(&msg.body()));
    }

    Ok(())
}
