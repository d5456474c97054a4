//! This module provides a [`CanAdapter`] implementation for SocketCAN interfaces.
use std::collections::VecDeque;

use tracing::{info, warn};

use crate::can::{AsyncCanAdapter, CanAdapter, Frame};
use crate::Result;

mod frame;
mod socket;

use socket::CanSocket;

/// Adapter for a raw classic CAN socket.
pub struct SocketCan {
    socket: CanSocket,
}

impl SocketCan {
    /// Open the SocketCAN interface `name` (e.g. `can0`). Returns [`crate::Error::NotFound`] if it does not exist.
    pub fn new(name: &str) -> Result<Self> {
        let socket = CanSocket::open(name)?;
        socket.set_nonblocking(true)?;
        socket.set_loopback(true)?;
        // Sent frames are echoed by the async adapter
        socket.set_recv_own_msgs(false)?;

        info!("Connected to SocketCAN interface {}", name);
        Ok(Self { socket })
    }

    pub fn new_async(name: &str) -> Result<AsyncCanAdapter> {
        let socket = SocketCan::new(name)?;
        Ok(AsyncCanAdapter::new(socket))
    }
}

impl CanAdapter for SocketCan {
    fn send(&mut self, frames: &mut VecDeque<Frame>) -> Result<()> {
        while let Some(frame) = frames.pop_front() {
            match self.socket.write_frame(&(&frame).into()) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    // Transmit queue full, retry on the next iteration
                    frames.push_front(frame);
                    break;
                }
                Err(e) => {
                    frames.push_front(frame);
                    return Err(e.into());
                }
            }
        }

        Ok(())
    }

    fn recv(&mut self) -> Result<Vec<Frame>> {
        let mut frames = vec![];
        loop {
            match self.socket.read_frame() {
                Ok(raw) => match Frame::try_from(&raw) {
                    Ok(frame) => frames.push(frame),
                    Err(e) => warn!("Dropping frame: {}", e),
                },
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(frames)
    }
}
