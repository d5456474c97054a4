//! Async wrapper for Adapters implementing the [`CanAdapter`] trait.

use std::collections::VecDeque;

use crate::can::CanAdapter;
use crate::can::Frame;
use crate::Result;
use crate::Stream;
use async_stream::stream;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, error};

const CAN_TX_BUFFER_SIZE: usize = 128;
const CAN_RX_BUFFER_SIZE: usize = 1024;
const POLL_INTERVAL_MS: u64 = 1;

type FrameCallback = (Frame, oneshot::Sender<()>);

fn process<T: CanAdapter>(
    mut adapter: T,
    mut shutdown_receiver: oneshot::Receiver<()>,
    rx_sender: broadcast::Sender<Frame>,
    mut tx_receiver: mpsc::Receiver<FrameCallback>,
) {
    let mut buffer: VecDeque<Frame> = VecDeque::new();
    let mut callbacks: VecDeque<FrameCallback> = VecDeque::new();

    while shutdown_receiver.try_recv().is_err() {
        let frames = match adapter.recv() {
            Ok(frames) => frames,
            Err(e) => {
                error!("Adapter receive failed, stopping: {}", e);
                break;
            }
        };

        for frame in frames {
            debug!("RX {:?}", frame);
            // A send error only means nobody is listening right now
            let _ = rx_sender.send(frame);
        }

        while let Ok((frame, callback)) = tx_receiver.try_recv() {
            debug!("TX {:?}", frame);
            buffer.push_back(frame.clone());
            callbacks.push_back((frame, callback));
        }

        if !buffer.is_empty() {
            if let Err(e) = adapter.send(&mut buffer) {
                error!("Adapter send failed, stopping: {}", e);
                break;
            }

            // The adapter pops every frame it accepted, resolve those in order
            let accepted = callbacks.len() - buffer.len();
            for (mut frame, callback) in callbacks.drain(..accepted) {
                frame.loopback = true;
                let _ = rx_sender.send(frame);
                let _ = callback.send(());
            }
        }

        std::thread::sleep(std::time::Duration::from_millis(POLL_INTERVAL_MS));
    }
}

/// Async wrapper around a [`CanAdapter`]. Starts a background thread to handle sending and receiving frames. Uses tokio channels to communicate with the background thread.
pub struct AsyncCanAdapter {
    processing_handle: Option<std::thread::JoinHandle<()>>,
    recv_receiver: broadcast::Receiver<Frame>,
    send_sender: mpsc::Sender<FrameCallback>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl AsyncCanAdapter {
    pub fn new<T: CanAdapter + Send + 'static>(adapter: T) -> Self {
        let (shutdown_sender, shutdown_receiver) = oneshot::channel();
        let (send_sender, send_receiver) = mpsc::channel(CAN_TX_BUFFER_SIZE);
        let (recv_sender, recv_receiver) = broadcast::channel(CAN_RX_BUFFER_SIZE);

        let mut ret = AsyncCanAdapter {
            shutdown: Some(shutdown_sender),
            processing_handle: None,
            recv_receiver,
            send_sender,
        };

        ret.processing_handle = Some(std::thread::spawn(move || {
            process(adapter, shutdown_receiver, recv_sender, send_receiver);
        }));

        ret
    }

    /// Send a single frame. The Future will resolve once the frame has been handed over to the adapter for sending. This does not mean the message is sent out on the CAN bus yet, as this could be pending arbitration. Accepted frames are echoed to receivers with `loopback` set.
    pub async fn send(&self, frame: &Frame) -> Result<()> {
        // Create oneshot channel to signal the completion of the send operation
        let (callback_sender, callback_receiver) = oneshot::channel();
        self.send_sender
            .send((frame.clone(), callback_sender))
            .await
            .map_err(|_| crate::Error::Disconnected)?;

        callback_receiver.await.map_err(|_| crate::Error::Disconnected)
    }

    /// Receive all frames.
    pub fn recv(&self) -> impl Stream<Item = Frame> {
        self.recv_filter(|_| true)
    }

    /// Receive frames that match a filter. Useful in combination with stream adapters. The subscription starts when this function is called, so create the stream before sending a request. The stream ends when the background thread stops.
    pub fn recv_filter(&self, filter: impl Fn(&Frame) -> bool) -> impl Stream<Item = Frame> {
        let mut rx = self.recv_receiver.resubscribe();

        Box::pin(stream! {
            loop {
                match rx.recv().await {
                    Ok(frame) => {
                        if filter(&frame) {
                            yield frame
                        }
                    }
                    Err(RecvError::Lagged(n)) => debug!("Receiver lagged, skipped {} frames", n),
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

impl Drop for AsyncCanAdapter {
    fn drop(&mut self) {
        if let Some(handle) = self.processing_handle.take() {
            // Send shutdown signal to background tread. It might have stopped already after an adapter error.
            if let Some(shutdown) = self.shutdown.take() {
                let _ = shutdown.send(());
            }
            let _ = handle.join();
        }
    }
}
