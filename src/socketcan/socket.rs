//! Low level SocketCAN code for classic CAN raw sockets
use std::ffi::CString;
use std::io::{self, Read};
use std::os::fd::AsRawFd;

use libc::{
    c_int, c_void, can_frame, sa_family_t, sockaddr, sockaddr_can, socklen_t, AF_CAN, CAN_RAW,
    CAN_RAW_LOOPBACK, CAN_RAW_RECV_OWN_MSGS, SOL_CAN_RAW,
};

use super::frame::can_frame_default;

const CAN_FRAME_SIZE: usize = std::mem::size_of::<can_frame>();

pub struct CanSocket(socket2::Socket);

fn as_bytes<T: Sized>(val: &T) -> &[u8] {
    let sz = std::mem::size_of::<T>();
    unsafe { std::slice::from_raw_parts::<'_, u8>(val as *const _ as *const u8, sz) }
}

fn as_bytes_mut<T: Sized>(val: &mut T) -> &mut [u8] {
    let sz = std::mem::size_of::<T>();
    unsafe { std::slice::from_raw_parts_mut(val as *mut _ as *mut u8, sz) }
}

fn if_index(ifname: &str) -> io::Result<c_int> {
    let name = CString::new(ifname).map_err(|_| io::Error::from(io::ErrorKind::InvalidInput))?;
    match unsafe { libc::if_nametoindex(name.as_ptr()) } {
        0 => Err(io::Error::from(io::ErrorKind::NotFound)),
        idx => Ok(idx as c_int),
    }
}

impl CanSocket {
    /// Open a raw CAN socket bound to `ifname`. Fails with [`io::ErrorKind::NotFound`] if the interface does not exist.
    pub fn open(ifname: &str) -> io::Result<Self> {
        let mut addr: sockaddr_can = unsafe { std::mem::zeroed() };
        addr.can_family = AF_CAN as sa_family_t;
        addr.can_ifindex = if_index(ifname)?;

        let af_can = socket2::Domain::from(AF_CAN);
        let can_raw = socket2::Protocol::from(CAN_RAW);
        let sock = socket2::Socket::new_raw(af_can, socket2::Type::RAW, Some(can_raw))?;

        let ret = unsafe {
            libc::bind(
                sock.as_raw_fd(),
                &addr as *const sockaddr_can as *const sockaddr,
                std::mem::size_of::<sockaddr_can>() as socklen_t,
            )
        };
        if ret != 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(Self(sock))
    }

    pub fn set_nonblocking(&self, nonblocking: bool) -> io::Result<()> {
        self.0.set_nonblocking(nonblocking)
    }

    pub fn set_loopback(&self, enabled: bool) -> io::Result<()> {
        let loopback = c_int::from(enabled);
        self.set_socket_option(SOL_CAN_RAW, CAN_RAW_LOOPBACK, &loopback)
    }

    /// Whether frames sent from this socket are received back
    pub fn set_recv_own_msgs(&self, enabled: bool) -> io::Result<()> {
        let recv_own = c_int::from(enabled);
        self.set_socket_option(SOL_CAN_RAW, CAN_RAW_RECV_OWN_MSGS, &recv_own)
    }

    pub fn write_frame(&self, frame: &can_frame) -> io::Result<()> {
        let written = self.0.send(as_bytes(frame))?;
        if written != CAN_FRAME_SIZE {
            return Err(io::Error::from(io::ErrorKind::WriteZero));
        }
        Ok(())
    }

    pub fn read_frame(&self) -> io::Result<can_frame> {
        let mut frame = can_frame_default();
        let read = (&self.0).read(as_bytes_mut(&mut frame))?;
        if read != CAN_FRAME_SIZE {
            return Err(io::Error::from(io::ErrorKind::InvalidData));
        }
        Ok(frame)
    }

    fn set_socket_option<T>(&self, level: c_int, name: c_int, val: &T) -> io::Result<()> {
        let ret = unsafe {
            libc::setsockopt(
                self.0.as_raw_fd(),
                level,
                name,
                val as *const _ as *const c_void,
                std::mem::size_of::<T>() as socklen_t,
            )
        };

        match ret {
            0 => Ok(()),
            _ => Err(io::Error::last_os_error()),
        }
    }
}
