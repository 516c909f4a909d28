#![cfg(all(unix, feature = "cli"))]

use std::os::unix::net::UnixListener;
use std::path::PathBuf;
use std::process::Command;
use std::thread;
use std::time::Duration;

use pinglink::frame::{ids, FrameReader, FrameWriter};
use pinglink::transport::{ByteStream, LinkStream};

fn unique_socket(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "pinglink-{tag}-{}-{}.sock",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ))
}

fn profile_payload(ping_number: u32) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&1500u32.to_le_bytes());
    payload.extend_from_slice(&80u16.to_le_bytes());
    payload.extend_from_slice(&200u16.to_le_bytes());
    payload.extend_from_slice(&ping_number.to_le_bytes());
    payload.extend_from_slice(&100u32.to_le_bytes());
    payload.extend_from_slice(&5000u32.to_le_bytes());
    payload.extend_from_slice(&2u32.to_le_bytes());
    payload.extend_from_slice(&4u16.to_le_bytes());
    payload.extend_from_slice(&[10, 20, 30, 40]);
    payload
}

/// Answers the setup sequence, then streams profiles until told to stop.
/// Returns the message ids it received, in order.
fn fake_device(listener: UnixListener) -> Vec<u16> {
    let (stream, _) = listener.accept().expect("accept should succeed");
    let stream = LinkStream::from_unix(stream);
    stream
        .set_read_timeout(Some(Duration::from_millis(20)))
        .expect("timeout should set");
    let mut writer = FrameWriter::new(stream.try_clone().expect("clone should succeed"));
    let mut reader = FrameReader::new(stream);

    let mut received = Vec::new();
    let mut streaming = false;
    let mut ping_number = 0u32;

    loop {
        match reader.poll_frame() {
            Ok(Some(frame)) => {
                received.push(frame.message_id());
                match frame.message_id() {
                    ids::CONTINUOUS_START => streaming = true,
                    ids::CONTINUOUS_STOP => break,
                    _ => {}
                }
            }
            Ok(None) => {}
            Err(err) if err.is_fatal() => break,
            Err(_) => {}
        }

        if streaming {
            ping_number += 1;
            // Keep reading after a failed write; the stop command may
            // already be queued.
            if writer
                .send(ids::PROFILE, &profile_payload(ping_number))
                .is_err()
            {
                streaming = false;
            }
        }
    }

    received
}

#[test]
fn ping_prints_distances_and_stops_streaming() {
    let path = unique_socket("ping");
    let listener = UnixListener::bind(&path).expect("listener should bind");
    let device = thread::spawn(move || fake_device(listener));

    let output = Command::new(env!("CARGO_BIN_EXE_pinglink"))
        .args(["--log-level", "error", "--format", "json", "ping"])
        .arg(format!("unix:{}", path.display()))
        .args(["--count", "2", "--timeout", "5s"])
        .output()
        .expect("ping should run");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    for line in lines {
        assert!(line.contains("\"distance\":1500"));
        assert!(line.contains("\"confidence\":80"));
        assert!(line.contains("\"samples\":4"));
    }

    let received = device.join().expect("device thread should finish");
    assert_eq!(
        &received[..7],
        &[
            ids::GENERAL_REQUEST,
            ids::SET_GAIN_SETTING,
            ids::SET_MODE_AUTO,
            ids::SET_RANGE,
            ids::SET_SPEED_OF_SOUND,
            ids::SET_PING_INTERVAL,
            ids::CONTINUOUS_START,
        ]
    );
    assert_eq!(received.last(), Some(&ids::CONTINUOUS_STOP));

    let _ = std::fs::remove_file(&path);
}

#[test]
fn ping_without_device_is_transport_error() {
    let path = unique_socket("missing");

    let output = Command::new(env!("CARGO_BIN_EXE_pinglink"))
        .args(["--log-level", "error", "ping"])
        .arg(format!("unix:{}", path.display()))
        .output()
        .expect("ping should run");

    assert_eq!(output.status.code(), Some(3));
}
