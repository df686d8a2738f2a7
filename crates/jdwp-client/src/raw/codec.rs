use crate::raw::packet::{
    AnyRawPacket, CommandData, ErrorCode, Flags, HeaderVariableData, RawCommandPacket, RawPacket,
    RawReplyPacket, MAX_PACKET_LENGTH, MIN_PACKET_LENGTH,
};
use std::io::ErrorKind;
use tokio_util::bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

/// Codec for encoding and decoding framed jdwp packets
#[derive(Debug, Default, Copy, Clone)]
pub struct RawCodec;

impl<T: HeaderVariableData> Encoder<RawPacket<T>> for RawCodec {
    type Error = std::io::Error;

    fn encode(&mut self, item: RawPacket<T>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.header().length() as usize);
        dst.put_u32(item.header().length());
        dst.put_u32(item.header().id());
        dst.put_u8(item.header().flags().raw());
        dst.put_u16(item.header().var().to_u16());
        dst.put(item.data().clone());
        Ok(())
    }
}

impl Decoder for RawCodec {
    type Item = AnyRawPacket;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < 4 {
            // Not enough data to read the length marker.
            return Ok(None);
        }
        let length = u32::from_be_bytes(src[..4].try_into().unwrap()) as usize;
        if length < MIN_PACKET_LENGTH {
            return Err(std::io::Error::new(
                ErrorKind::InvalidData,
                format!("{length} is smaller than the mandatory packet header"),
            ));
        }
        if length > MAX_PACKET_LENGTH {
            return Err(std::io::Error::new(
                ErrorKind::InvalidData,
                format!("{length} is larger than max packet size: {MAX_PACKET_LENGTH}"),
            ));
        }
        if src.len() < length {
            trace!(
                "buffered {} of {length} bytes, waiting for the rest of the packet",
                src.len()
            );
            src.reserve(length - src.len());
            return Ok(None);
        }
        src.advance(4);

        let id = src.get_u32();
        let flag = Flags::from_raw(src.get_u8());
        let raw_var = src.get_u16();
        let data = src.split_to(length - MIN_PACKET_LENGTH).freeze();
        let packet = if flag.is_reply() {
            let error_code = ErrorCode::from_u16(raw_var);
            AnyRawPacket::Reply(RawReplyPacket::new_reply(id, error_code, data))
        } else {
            let command = CommandData::from_u16(raw_var);
            AnyRawPacket::Command(RawCommandPacket::new_command(id, command, data))
        };
        Ok(Some(packet))
    }
}
