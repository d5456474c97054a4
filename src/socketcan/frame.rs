use libc::{can_frame, canid_t, CAN_EFF_FLAG, CAN_EFF_MASK, CAN_MAX_DLEN, CAN_RTR_FLAG, CAN_SFF_MASK};

use crate::can::{Frame, Identifier};
use crate::Error;

pub fn can_frame_default() -> can_frame {
    unsafe { std::mem::zeroed() }
}

fn id_to_canid_t(id: Identifier) -> canid_t {
    match id {
        Identifier::Standard(id) => id,
        Identifier::Extended(id) => id | CAN_EFF_FLAG,
    }
}

fn canid_t_to_id(id: canid_t) -> Identifier {
    match id & CAN_EFF_FLAG != 0 {
        true => Identifier::Extended(id & CAN_EFF_MASK),
        false => Identifier::Standard(id & CAN_SFF_MASK),
    }
}

impl TryFrom<&can_frame> for Frame {
    type Error = Error;
    fn try_from(frame: &can_frame) -> Result<Self, Self::Error> {
        let id = canid_t_to_id(frame.can_id);
        if frame.can_id & CAN_RTR_FLAG != 0 {
            return Frame::remote(0, id);
        }

        let len = frame.can_dlc as usize;
        if len > CAN_MAX_DLEN {
            return Err(Error::MalformedFrame);
        }
        Frame::new(0, id, &frame.data[..len])
    }
}

impl From<&Frame> for can_frame {
    fn from(frame: &Frame) -> can_frame {
        let len = frame.data.len().min(CAN_MAX_DLEN);

        let mut raw_frame = can_frame_default();
        raw_frame.can_id = id_to_canid_t(frame.id);
        if frame.rtr {
            raw_frame.can_id |= CAN_RTR_FLAG;
        }
        raw_frame.can_dlc = len as u8;
        raw_frame.data[..len].copy_from_slice(&frame.data[..len]);

        raw_frame
    }
}
