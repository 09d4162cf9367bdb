use crate::error::Result;
use crate::packet::Packet;

/// A typed message carried in a [`Packet`] payload.
///
/// Implementations are usually generated from dialect definitions. The codec
/// never looks inside the payload; it only calls [`pack`](Message::pack) when
/// encoding and leaves [`unpack`](Message::unpack) to the caller, typically
/// after matching on [`Packet::message_id`].
pub trait Message: Sized {
    /// Wire id of this message type.
    const MESSAGE_ID: u8;

    /// Serialize into a packet carrying `MESSAGE_ID` and the payload bytes.
    fn pack(&self) -> Result<Packet>;

    /// Deserialize from a packet payload.
    fn unpack(packet: &Packet) -> Result<Self>;
}

#[cfg(test)]
pub(crate) mod tests {
    use bytes::{Buf, BufMut, BytesMut};

    use super::*;
    use crate::error::FrameError;

    /// Minimal HEARTBEAT used across the crate's tests.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct Heartbeat {
        pub custom_mode: u32,
        pub kind: u8,
        pub autopilot: u8,
        pub base_mode: u8,
        pub system_status: u8,
        pub version: u8,
    }

    impl Heartbeat {
        pub(crate) fn rover() -> Self {
            Self {
                custom_mode: 0,
                kind: 2,
                autopilot: 3,
                base_mode: 0x51,
                system_status: 4,
                version: 3,
            }
        }
    }

    impl Message for Heartbeat {
        const MESSAGE_ID: u8 = 0;

        fn pack(&self) -> Result<Packet> {
            let mut payload = BytesMut::with_capacity(9);
            payload.put_u32_le(self.custom_mode);
            payload.put_u8(self.kind);
            payload.put_u8(self.autopilot);
            payload.put_u8(self.base_mode);
            payload.put_u8(self.system_status);
            payload.put_u8(self.version);
            Ok(Packet::new(Self::MESSAGE_ID, payload.freeze()))
        }

        fn unpack(packet: &Packet) -> Result<Self> {
            if packet.payload.len() != 9 {
                return Err(FrameError::InvalidPayload {
                    message_id: Self::MESSAGE_ID,
                    reason: format!("expected 9 bytes, got {}", packet.payload.len()),
                });
            }
            let mut buf = packet.payload.clone();
            Ok(Self {
                custom_mode: buf.get_u32_le(),
                kind: buf.get_u8(),
                autopilot: buf.get_u8(),
                base_mode: buf.get_u8(),
                system_status: buf.get_u8(),
                version: buf.get_u8(),
            })
        }
    }

    #[test]
    fn pack_then_unpack_through_packet() {
        let heartbeat = Heartbeat::rover();
        let packet = heartbeat.pack().unwrap();

        assert_eq!(packet.message_id, 0);
        assert_eq!(packet.payload.as_ref(), &[0, 0, 0, 0, 2, 3, 0x51, 4, 3]);
        assert_eq!(packet.unpack::<Heartbeat>().unwrap(), heartbeat);
    }

    #[test]
    fn unpack_rejects_other_message_ids() {
        let packet = Packet::new(33, vec![0u8; 9]);
        assert!(matches!(
            packet.unpack::<Heartbeat>(),
            Err(FrameError::MessageMismatch {
                expected: 0,
                actual: 33
            })
        ));
    }

    #[test]
    fn unpack_rejects_short_payload() {
        let packet = Packet::new(0, vec![0u8; 4]);
        assert!(matches!(
            packet.unpack::<Heartbeat>(),
            Err(FrameError::InvalidPayload { message_id: 0, .. })
        ));
    }
}
