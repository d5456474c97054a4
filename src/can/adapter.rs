//! Convenience functions to get a CAN adapter.

/// Convenience function to get the first available adapter on the system. Tries the SocketCAN interfaces `can0` and `vcan0` when the `socketcan` feature is enabled.
pub fn get_adapter() -> Result<crate::can::AsyncCanAdapter, crate::error::Error> {
    #[cfg(all(target_os = "linux", feature = "socketcan"))]
    {
        for iface in ["can0", "vcan0"] {
            if let Ok(socket) = crate::socketcan::SocketCan::new_async(iface) {
                return Ok(socket);
            }
        }
    }

    Err(crate::error::Error::NotFound)
}
