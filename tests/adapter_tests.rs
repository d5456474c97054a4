#![allow(dead_code, unused_imports)]
use std::collections::VecDeque;
use std::time::Duration;

use tinymovr::can::AsyncCanAdapter;
use tinymovr::can::{CanAdapter, Frame};
use tinymovr::endpoints;
use tinymovr::sim::SimulatedDevice;
use tinymovr::StreamExt;

static BULK_NUM_FRAMES_SYNC: u64 = 0x100;
static BULK_NUM_FRAMES_ASYNC: u64 = 0x1000;
static BULK_SYNC_TIMEOUT_MS: u64 = 1000;
static BULK_ASYNC_TIMEOUT_MS: u64 = 5000;

/// Sends a large number of remote frames to a "blocking" adapter, and reads back the answers.
/// This verifies the device answers every request in the order they were sent.
fn bulk_request_sync<T: CanAdapter>(adapter: &mut T) {
    let id = endpoints::resolve("device_info").unwrap().arbitration_id(1).unwrap();
    let requests: Vec<Frame> = (0..BULK_NUM_FRAMES_SYNC)
        .map(|_| Frame::remote(0, id).unwrap())
        .collect();

    let mut to_send: VecDeque<Frame> = requests.clone().into();
    while !to_send.is_empty() {
        adapter.send(&mut to_send).unwrap();
    }

    let start = std::time::Instant::now();

    let mut received: Vec<Frame> = vec![];
    while received.len() < requests.len()
        && start.elapsed() < Duration::from_millis(BULK_SYNC_TIMEOUT_MS)
    {
        let rx = adapter.recv().unwrap();
        received.extend(rx.into_iter().filter(|frame| !frame.loopback && !frame.rtr));
        std::thread::sleep(Duration::from_millis(1));
    }

    assert_eq!(requests.len(), received.len());
    assert!(received.iter().all(|frame| frame.id == id && frame.data.len() == 8));
}

/// Sends a large number of frames to the adapter, and awaits them simultaneously.
/// This tests the functionality in [`AsyncCanAdapter`] to resolve the future when the adapter accepts the frame.
async fn bulk_send(adapter: &AsyncCanAdapter) {
    let mut frames = vec![];

    for i in 0..BULK_NUM_FRAMES_ASYNC {
        frames.push(Frame::new(0, 0x123.into(), &i.to_be_bytes()).unwrap());
    }

    let r = frames.iter().map(|frame| adapter.send(frame));
    let results = tokio::time::timeout(
        Duration::from_millis(BULK_ASYNC_TIMEOUT_MS),
        futures::future::join_all(r),
    )
    .await
    .unwrap();

    assert!(results.iter().all(|r| r.is_ok()));
}

#[test]
#[serial_test::serial]
fn sim_bulk_request_sync() {
    let mut device = SimulatedDevice::new(1);
    bulk_request_sync(&mut device);
}

#[tokio::test]
#[serial_test::serial]
async fn sim_bulk_send_async() {
    let adapter = AsyncCanAdapter::new(SimulatedDevice::new(1));
    bulk_send(&adapter).await;
}

#[tokio::test]
#[serial_test::serial]
async fn sim_sent_frames_loop_back() {
    let adapter = AsyncCanAdapter::new(SimulatedDevice::new(1));
    let stream = adapter
        .recv_filter(|frame| frame.loopback)
        .timeout(Duration::from_millis(100));
    tokio::pin!(stream);

    let frame = Frame::new(0, 0x123.into(), &[0xde, 0xad]).unwrap();
    adapter.send(&frame).await.unwrap();

    let echo = stream.next().await.unwrap().unwrap();
    assert_eq!(echo.id, frame.id);
    assert_eq!(echo.data, frame.data);
}

#[cfg(all(target_os = "linux", feature = "socketcan"))]
#[test]
#[serial_test::serial]
fn socketcan_open_nonexistent() {
    let adapter = tinymovr::socketcan::SocketCan::new("doestnotexist");
    assert_eq!(adapter.err(), Some(tinymovr::Error::NotFound));
}

#[cfg(feature = "test-socketcan")]
#[tokio::test]
#[serial_test::serial]
async fn socketcan_bulk_send_async() {
    let adapter = tinymovr::socketcan::SocketCan::new_async("can0").unwrap();
    bulk_send(&adapter).await;
}

#[cfg(feature = "test-vcan")]
#[tokio::test]
#[serial_test::serial]
async fn vcan_bulk_send_async() {
    let adapter = tinymovr::socketcan::SocketCan::new_async("vcan0").unwrap();
    bulk_send(&adapter).await;
}

#[cfg(feature = "test-vcan")]
#[tokio::test]
#[serial_test::serial]
async fn vcan_frames_reach_other_socket() {
    let tx = tinymovr::socketcan::SocketCan::new_async("vcan0").unwrap();
    let rx = tinymovr::socketcan::SocketCan::new_async("vcan0").unwrap();

    let stream = rx
        .recv_filter(|frame| frame.id == 0x05a.into())
        .timeout(Duration::from_millis(100));
    tokio::pin!(stream);

    tx.send(&Frame::remote(0, 0x05a.into()).unwrap()).await.unwrap();

    let frame = stream.next().await.unwrap().unwrap();
    assert!(frame.rtr);
    assert!(!frame.loopback);
}
