//! End-to-end relay tests over fake device and channel implementations.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{sleep, timeout};

use vport_core::envelope::EnvelopeCodec;
use vport_core::relay::Relay;
use vport_core::Error;
use vport_test_utils::{FakePort, LoopbackChannel};

/// Poll until `predicate` holds or the deadline passes.
async fn wait_for(mut predicate: impl FnMut() -> bool) {
    timeout(Duration::from_secs(5), async {
        while !predicate() {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn echoed_frames_come_back_in_order() {
    let port = FakePort::default_port();
    let channel = LoopbackChannel::echoing();
    let port_handle = port.clone();
    let channel_handle = channel.clone();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let relay = Relay::new(port, channel);
    let running = tokio::spawn(relay.run(shutdown_rx));

    let frames = vec![
        vec![0x45, 0x00, 0x00, 0x28, 0x01],
        vec![0x00, 0xFF],
        (0u8..=255).collect::<Vec<u8>>(),
    ];
    for frame in &frames {
        port_handle.inject_frame(frame.clone());
    }

    // Each frame is captured, encoded, echoed back, decoded, and injected.
    wait_for(|| port_handle.written_count() == frames.len()).await;
    assert_eq!(port_handle.written_frames(), frames);
    assert_eq!(channel_handle.sent_count(), frames.len());

    shutdown_tx.send(true).unwrap();
    let stats = running.await.unwrap().unwrap();
    assert_eq!(stats.frames_captured, 3);
    assert_eq!(stats.frames_injected, 3);
    assert_eq!(stats.frames_dropped, 0);
}

#[tokio::test]
async fn malformed_envelope_is_dropped_and_relay_continues() {
    let port = FakePort::default_port();
    let channel = LoopbackChannel::new();
    let port_handle = port.clone();
    let channel_handle = channel.clone();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let running = tokio::spawn(Relay::new(port, channel).run(shutdown_rx));

    // No payload field at all, then a valid envelope.
    channel_handle.inject_datagram(b"{\"source_mac\":\"x\"}".to_vec());
    let valid = EnvelopeCodec::encode(&[0xDE, 0xAD, 0xBE, 0xEF]).unwrap();
    channel_handle.inject_datagram(valid.into_bytes());

    wait_for(|| port_handle.written_count() == 1).await;
    assert_eq!(port_handle.written_frames(), vec![vec![0xDE, 0xAD, 0xBE, 0xEF]]);

    shutdown_tx.send(true).unwrap();
    let stats = running.await.unwrap().unwrap();
    assert_eq!(stats.frames_dropped, 1);
    assert_eq!(stats.frames_injected, 1);
}

#[tokio::test]
async fn non_utf8_datagram_is_dropped_and_relay_continues() {
    let port = FakePort::default_port();
    let channel = LoopbackChannel::new();
    let port_handle = port.clone();
    let channel_handle = channel.clone();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let running = tokio::spawn(Relay::new(port, channel).run(shutdown_rx));

    channel_handle.inject_datagram(vec![0xFF, 0xFE, 0x00]);
    let valid = EnvelopeCodec::encode(&[1, 2, 3]).unwrap();
    channel_handle.inject_datagram(valid.into_bytes());

    wait_for(|| port_handle.written_count() == 1).await;

    shutdown_tx.send(true).unwrap();
    let stats = running.await.unwrap().unwrap();
    assert_eq!(stats.frames_dropped, 1);
}

#[tokio::test]
async fn device_read_failure_is_fatal() {
    let port = FakePort::default_port();
    let channel = LoopbackChannel::new();
    let port_handle = port.clone();

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let running = tokio::spawn(Relay::new(port, channel).run(shutdown_rx));

    // Give the relay a moment to reach its readiness wait, then break the
    // device out from under it.
    sleep(Duration::from_millis(10)).await;
    port_handle.set_up(false);

    let result = timeout(Duration::from_secs(5), running)
        .await
        .expect("relay did not exit")
        .unwrap();
    assert!(matches!(result, Err(Error::Io(_))));
}

#[tokio::test]
async fn shutdown_with_no_traffic_is_clean() {
    let port = FakePort::default_port();
    let channel = LoopbackChannel::new();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let running = tokio::spawn(Relay::new(port, channel).run(shutdown_rx));

    shutdown_tx.send(true).unwrap();
    let stats = running.await.unwrap().unwrap();
    assert_eq!(stats.frames_captured, 0);
    assert_eq!(stats.frames_injected, 0);
    assert_eq!(stats.frames_dropped, 0);
}

#[tokio::test]
async fn outbound_path_preserves_frame_bytes() {
    let port = FakePort::default_port();
    let channel = LoopbackChannel::new();
    let port_handle = port.clone();
    let channel_handle = channel.clone();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let running = tokio::spawn(Relay::new(port, channel).run(shutdown_rx));

    let frame: Vec<u8> = (0u8..=255).rev().collect();
    port_handle.inject_frame(frame.clone());

    wait_for(|| channel_handle.sent_count() == 1).await;
    let sent = channel_handle.sent_datagrams().remove(0);
    let text = String::from_utf8(sent).expect("envelope is textual");
    assert_eq!(EnvelopeCodec::decode(&text).unwrap(), frame);

    shutdown_tx.send(true).unwrap();
    running.await.unwrap().unwrap();
}
