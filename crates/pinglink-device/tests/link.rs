#![cfg(unix)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::{BufMut, BytesMut};
use pinglink_device::{DropReason, Link, LinkConfig, LinkEvent};
use pinglink_frame::{encode_frame, ids, FrameReader, FrameWriter};
use pinglink_schema::SchemaTable;
use pinglink_transport::LinkStream;

const WAIT: Duration = Duration::from_secs(5);

fn open() -> (Link<LinkStream>, LinkStream) {
    let (host, device) = LinkStream::pair().expect("socket pair");
    let table = Arc::new(SchemaTable::builtin().expect("builtin definitions"));
    let config = LinkConfig {
        read_timeout: Some(Duration::from_millis(50)),
        ..LinkConfig::default()
    };
    let link = Link::open(host, table, config).expect("link should open");
    (link, device)
}

fn profile_payload() -> Vec<u8> {
    let mut buf = BytesMut::new();
    buf.put_u32_le(1500);
    buf.put_u16_le(80);
    buf.put_u16_le(200);
    buf.put_u32_le(7);
    buf.put_u32_le(100);
    buf.put_u32_le(5000);
    buf.put_u32_le(2);
    buf.put_u16_le(4);
    buf.put_slice(&[10, 20, 30, 40]);
    buf.to_vec()
}

fn wait_for(link: &Link<LinkStream>, wanted: &LinkEvent) -> Vec<LinkEvent> {
    let deadline = Instant::now() + WAIT;
    let mut seen = Vec::new();
    while Instant::now() < deadline {
        if let Some(event) = link.next_event(Duration::from_millis(50)) {
            let done = &event == wanted;
            seen.push(event);
            if done {
                return seen;
            }
        }
    }
    panic!("timed out waiting for {wanted:?}, saw {seen:?}");
}

#[test]
fn profile_end_to_end() {
    let (mut link, device) = open();
    let mut device = FrameWriter::new(device);

    assert!(link.take_profile().is_none());
    device.send(ids::PROFILE, &profile_payload()).unwrap();
    wait_for(
        &link,
        &LinkEvent::Dispatched {
            message_id: ids::PROFILE,
        },
    );

    let slot = link.profile_slot();
    assert!(slot.is_fresh());
    let report = slot.read().unwrap();
    assert!(!slot.is_fresh());

    assert_eq!(report.distance, 1500);
    assert_eq!(report.confidence, 80);
    assert_eq!(report.transmit_duration, 200);
    assert_eq!(report.ping_number, 7);
    assert_eq!(report.scan_start, 100);
    assert_eq!(report.scan_length, 5000);
    assert_eq!(report.gain_setting, 2);
    assert_eq!(report.profile_data_length, 4);
    assert_eq!(report.profile_data.as_ref(), &[10, 20, 30, 40]);

    link.stop().unwrap();
}

#[test]
fn noise_and_bad_frames_are_dropped() {
    let (mut link, device) = open();
    let mut device = FrameWriter::new(device);

    device.write_packet(&[0x00, 0x11, 0x22, 0x33]).unwrap();
    device.send(4242, &[1, 2, 3]).unwrap();

    let mut corrupt = BytesMut::new();
    encode_frame(ids::PROFILE, &profile_payload(), &mut corrupt).unwrap();
    let last = corrupt.len() - 1;
    corrupt[last] ^= 0xFF;
    device.write_packet(&corrupt).unwrap();

    device.send(ids::PROFILE, &[0u8; 10]).unwrap();
    device.send(ids::PROTOCOL_VERSION, &[1, 0, 3, 0]).unwrap();

    let seen = wait_for(
        &link,
        &LinkEvent::Dispatched {
            message_id: ids::PROTOCOL_VERSION,
        },
    );
    assert_eq!(
        seen,
        vec![
            LinkEvent::Dropped {
                message_id: Some(4242),
                reason: DropReason::UnknownMessageId
            },
            LinkEvent::Dropped {
                message_id: Some(ids::PROFILE),
                reason: DropReason::ChecksumMismatch
            },
            LinkEvent::Dropped {
                message_id: Some(ids::PROFILE),
                reason: DropReason::Decode
            },
            LinkEvent::Dispatched {
                message_id: ids::PROTOCOL_VERSION
            },
        ]
    );

    assert!(link.profile_slot().peek().is_none());
    let version = link.latest(ids::PROTOCOL_VERSION).unwrap();
    assert_eq!(version.values.len(), 4);
    assert!(link.is_running());

    link.stop().unwrap();
}

#[test]
fn commands_reach_the_device() {
    let (mut link, device) = open();
    device
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let mut device = FrameReader::new(device);

    link.send_packet(&link.commands().request_protocol_version().unwrap())
        .unwrap();
    link.send(ids::SET_RANGE, &[500u32.into(), 2000u32.into()])
        .unwrap();

    let first = device.read_frame().unwrap();
    assert_eq!(first.message_id(), ids::GENERAL_REQUEST);
    assert_eq!(first.payload.as_ref(), &[5, 0]);

    let second = device.read_frame().unwrap();
    assert_eq!(second.message_id(), ids::SET_RANGE);
    assert_eq!(second.payload.as_ref(), &[0xf4, 0x01, 0, 0, 0xd0, 0x07, 0, 0]);

    link.stop().unwrap();
}

#[test]
fn stop_joins_worker_and_rejects_sends() {
    let (mut link, _device) = open();
    assert!(link.is_running());

    link.stop().unwrap();
    assert!(!link.is_running());
    link.stop().unwrap();

    let err = link
        .send_packet(&link.commands().continuous_stop(ids::PROFILE).unwrap())
        .unwrap_err();
    assert!(matches!(err, pinglink_device::DeviceError::Stopped));
    assert!(link.take_events().contains(&LinkEvent::Closed));
}

#[test]
fn remote_close_ends_worker() {
    let (link, device) = open();
    drop(device);

    wait_for(&link, &LinkEvent::Closed);
    let deadline = Instant::now() + WAIT;
    while link.is_running() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    assert!(!link.is_running());
}

#[test]
fn full_event_queue_keeps_latest_drops() {
    let (host, device) = LinkStream::pair().expect("socket pair");
    let table = Arc::new(SchemaTable::builtin().expect("builtin definitions"));
    let config = LinkConfig {
        event_capacity: 4,
        read_timeout: Some(Duration::from_millis(50)),
        ..LinkConfig::default()
    };
    let link = Link::open(host, table, config).expect("link should open");
    let mut device = FrameWriter::new(device);

    for _ in 0..4 {
        device.send(ids::PROTOCOL_VERSION, &[1, 0, 3, 0]).unwrap();
    }
    let mut corrupt = BytesMut::new();
    encode_frame(ids::PROTOCOL_VERSION, &[1, 0, 3, 0], &mut corrupt).unwrap();
    let last = corrupt.len() - 1;
    corrupt[last] ^= 0xFF;
    device.write_packet(&corrupt).unwrap();
    drop(device);

    let deadline = Instant::now() + WAIT;
    while link.is_running() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    assert!(!link.is_running());

    let dispatched = LinkEvent::Dispatched {
        message_id: ids::PROTOCOL_VERSION,
    };
    assert_eq!(
        link.take_events(),
        vec![
            dispatched.clone(),
            dispatched,
            LinkEvent::Dropped {
                message_id: Some(ids::PROTOCOL_VERSION),
                reason: DropReason::ChecksumMismatch
            },
            LinkEvent::Closed,
        ]
    );
}
