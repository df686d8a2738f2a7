//! The value codec: big-endian primitives, width-negotiated ids, tagged values, locations and
//! array regions, layered on [bytes] buffers.
//!
//! [JdwpCodec] carries the negotiated [IdSizes]; everything else is driven off it through the
//! [JdwpEncoder]/[JdwpDecoder] pair.

use crate::id_sizes::IdSizes;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use jdwp_types::*;
use std::string::FromUtf8Error;
use thiserror::Error;

/// Carries the negotiated id widths that parameterize encoding and decoding
#[derive(Debug, Default, Copy, Clone)]
pub struct JdwpCodec {
    id_sizes: IdSizes,
}

impl JdwpCodec {
    pub fn new(id_sizes: IdSizes) -> Self {
        Self { id_sizes }
    }

    pub fn id_sizes(&self) -> IdSizes {
        self.id_sizes
    }

    pub(crate) fn id_sizes_mut(&mut self) -> &mut IdSizes {
        &mut self.id_sizes
    }
}

/// Encodable into a JDWP body
pub trait JdwpEncodable {
    /// Encodes this into a buffer
    fn encode(&self, _encoder: &mut JdwpEncoder) {}
}

/// Decodable from a JDWP body
pub trait JdwpDecodable: Sized {
    type Err: std::error::Error;

    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, Self::Err>;
}

#[derive(Debug)]
pub struct JdwpDecoder<'a> {
    pub(crate) codec: &'a JdwpCodec,
    pub(crate) data: Bytes,
}

impl<'a> JdwpDecoder<'a> {
    /// Creates a new decoder over a body with a given codec
    pub fn new(codec: &'a JdwpCodec, data: Bytes) -> Self {
        Self { codec, data }
    }

    /// Decodes the next jdwp value
    pub fn get<T: JdwpDecodable>(&mut self) -> Result<T, T::Err> {
        T::decode(self)
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.data.len()
    }

    fn need(&self, count: usize) -> Result<(), DecodeJdwpDataError> {
        if self.data.len() < count {
            Err(DecodeJdwpDataError::NotEnoughBytes)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug)]
pub struct JdwpEncoder<'a> {
    pub(crate) codec: &'a JdwpCodec,
    pub data: BytesMut,
}

impl<'a> JdwpEncoder<'a> {
    /// Creates a new encoder with a given codec
    pub fn new(codec: &'a JdwpCodec) -> Self {
        Self {
            codec,
            data: BytesMut::new(),
        }
    }

    /// Encodes the next jdwp value
    pub fn put<T: JdwpEncodable>(&mut self, to_encode: &T) {
        to_encode.encode(self)
    }
}

#[derive(Debug, Error)]
pub enum DecodeJdwpDataError {
    #[error("Not enough bytes to decode type")]
    NotEnoughBytes,
    #[error("Got negative integer {0} when only positive integers are expected")]
    UnexpectedNegativeInt(i32),
    #[error(transparent)]
    IllegalByteTag(#[from] UnknownTagError<u8>),
    #[error("Tag {0:?} is not an object kind")]
    NonObjectTag(Tag),
    #[error("Void cannot appear in an array region")]
    VoidArrayRegion,
    #[error(transparent)]
    Utf8DecodeError(#[from] FromUtf8Error),
}

impl JdwpDecodable for () {
    type Err = DecodeJdwpDataError;

    fn decode(_decoder: &mut JdwpDecoder) -> Result<Self, Self::Err> {
        Ok(())
    }
}

impl JdwpDecodable for Byte {
    type Err = DecodeJdwpDataError;

    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, Self::Err> {
        decoder.need(1)?;
        Ok(decoder.data.get_u8())
    }
}
impl JdwpEncodable for Byte {
    fn encode(&self, encoder: &mut JdwpEncoder) {
        encoder.data.put_u8(*self);
    }
}

impl JdwpDecodable for bool {
    type Err = DecodeJdwpDataError;

    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, Self::Err> {
        decoder.need(1)?;
        Ok(decoder.data.get_u8() != 0)
    }
}
impl JdwpEncodable for bool {
    fn encode(&self, encoder: &mut JdwpEncoder) {
        encoder.data.put_u8(u8::from(*self));
    }
}

impl JdwpDecodable for Int {
    type Err = DecodeJdwpDataError;

    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, Self::Err> {
        decoder.need(4)?;
        Ok(decoder.data.get_i32())
    }
}
impl JdwpEncodable for Int {
    fn encode(&self, encoder: &mut JdwpEncoder) {
        encoder.data.put_i32(*self);
    }
}

impl JdwpDecodable for Long {
    type Err = DecodeJdwpDataError;

    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, Self::Err> {
        decoder.need(8)?;
        Ok(decoder.data.get_i64())
    }
}
impl JdwpEncodable for Long {
    fn encode(&self, encoder: &mut JdwpEncoder) {
        encoder.data.put_i64(*self);
    }
}

impl JdwpDecodable for u64 {
    type Err = DecodeJdwpDataError;

    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, Self::Err> {
        decoder.need(8)?;
        Ok(decoder.data.get_u64())
    }
}
impl JdwpEncodable for u64 {
    fn encode(&self, encoder: &mut JdwpEncoder) {
        encoder.data.put_u64(*self);
    }
}

impl JdwpDecodable for RequestId {
    type Err = DecodeJdwpDataError;

    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, Self::Err> {
        Ok(RequestId::new(decoder.get::<Int>()?))
    }
}
impl JdwpEncodable for RequestId {
    fn encode(&self, encoder: &mut JdwpEncoder) {
        encoder.put(&self.get());
    }
}

impl JdwpDecodable for std::string::String {
    type Err = DecodeJdwpDataError;

    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, Self::Err> {
        let len = decoder.get::<Int>()?;
        if len < 0 {
            return Err(DecodeJdwpDataError::UnexpectedNegativeInt(len));
        }
        let len = len as usize;
        decoder.need(len)?;
        let bytes: Vec<u8> = Vec::from(&decoder.data[..len]);
        decoder.data.advance(len);
        let string = std::string::String::from_utf8(bytes)?;
        Ok(string)
    }
}

impl JdwpEncodable for std::string::String {
    fn encode(&self, encoder: &mut JdwpEncoder) {
        self.as_str().encode(encoder)
    }
}

impl JdwpEncodable for &str {
    fn encode(&self, encoder: &mut JdwpEncoder) {
        encoder.data.put_i32(self.len() as i32);
        encoder.data.put_slice(self.as_bytes());
    }
}

macro_rules! encdec_tagged {
    ($($name:ty),* $(,)?) => {
        $(
            impl JdwpDecodable for $name {
                type Err = DecodeJdwpDataError;

                fn decode(decoder: &mut JdwpDecoder) -> Result<Self, Self::Err> {
                    let raw = decoder.get::<Byte>()?;
                    Ok(<$name>::try_from(raw)?)
                }
            }

            impl JdwpEncodable for $name {
                fn encode(&self, encoder: &mut JdwpEncoder) {
                    encoder.data.put_u8(u8::from(*self));
                }
            }
        )*
    };
}

encdec_tagged!(Tag, TypeTag, EventKind, SuspendPolicy, ModifierKind);

impl JdwpDecodable for ClassStatus {
    type Err = DecodeJdwpDataError;

    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, Self::Err> {
        decoder.need(4)?;
        Ok(ClassStatus::from_bits(decoder.data.get_u32()))
    }
}

macro_rules! encdec_id {
    (
        $(
            $($id_type:ty),*: $id_size:ident
        );*
        $(;)?
    ) => {
        $(
            $(
                impl JdwpDecodable for $id_type {
                    type Err = DecodeJdwpDataError;

                    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, Self::Err> {
                        let len: usize = decoder.codec.id_sizes.$id_size();
                        let mut buffer = [0u8; 8];
                        decoder.need(len)?;
                        decoder.data.copy_to_slice(&mut buffer[(8 - len)..]);
                        let decoded = u64::from_be_bytes(buffer);
                        Ok(Id::new(decoded))
                    }
                }

                impl JdwpEncodable for $id_type {
                    fn encode(&self, encoder: &mut JdwpEncoder) {
                        let len: usize = encoder.codec.id_sizes.$id_size();
                        let to_bytes = self.get().to_be_bytes();
                        let slice = &to_bytes[(8 - len)..][..len];
                        encoder.data.extend_from_slice(slice);
                    }
                }
            )*
        )*
    };
}

encdec_id! {
    ObjectId, ThreadId, ThreadGroupId, StringId, ClassLoaderId, ClassObjectId,
        ArrayId, Id<Unknown>: object_id_size;
    ReferenceTypeId, ClassId, InterfaceId, ArrayTypeId: reference_type_id_size;
    MethodId: method_id_size;
    FieldId: field_id_size;
    FrameId: frame_id_size;
}

impl JdwpDecodable for Location {
    type Err = DecodeJdwpDataError;

    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, Self::Err> {
        Ok(Location {
            tag: decoder.get()?,
            class: decoder.get()?,
            method: decoder.get()?,
            index: decoder.get::<u64>()?,
        })
    }
}

impl JdwpEncodable for Location {
    fn encode(&self, encoder: &mut JdwpEncoder) {
        encoder.put(&self.tag);
        encoder.put(&self.class);
        encoder.put(&self.method);
        encoder.put(&self.index);
    }
}

impl JdwpDecodable for TaggedObjectId {
    type Err = DecodeJdwpDataError;

    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, Self::Err> {
        let tag = decoder.get::<Tag>()?;
        let id = decoder.get::<Id<Unknown>>()?;
        TaggedObjectId::new(tag, id).map_err(|e| DecodeJdwpDataError::NonObjectTag(e.0))
    }
}

impl JdwpEncodable for TaggedObjectId {
    fn encode(&self, encoder: &mut JdwpEncoder) {
        encoder.put(&self.tag());
        encoder.put(&self.id());
    }
}

impl JdwpDecodable for Value {
    type Err = DecodeJdwpDataError;

    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, Self::Err> {
        let tag = decoder.get::<Tag>()?;
        decoder.untagged_value(tag)
    }
}

impl JdwpEncodable for Value {
    fn encode(&self, encoder: &mut JdwpEncoder) {
        encoder.put(&self.tag());
        encoder.put_untagged_value(self);
    }
}

impl<'a> JdwpDecoder<'a> {
    /// Decodes a value body whose tag byte has already been consumed (or is implied, as in an
    /// array region). Every width branch follows the tag.
    pub fn untagged_value(&mut self, tag: Tag) -> Result<Value, DecodeJdwpDataError> {
        self.need(tag.width())?;
        let value = match tag {
            Tag::Void => Value::Void,
            Tag::Byte => Value::Byte(self.data.get_u8()),
            Tag::Boolean => Value::Boolean(self.data.get_u8() != 0),
            Tag::Char => Value::Char(self.data.get_u16()),
            Tag::Short => Value::Short(self.data.get_i16()),
            Tag::Int => Value::Int(self.data.get_i32()),
            Tag::Float => Value::Float(self.data.get_f32()),
            Tag::Long => Value::Long(self.data.get_i64()),
            Tag::Double => Value::Double(self.data.get_f64()),
            Tag::Array => Value::Array(self.get()?),
            Tag::Object => Value::Object(self.get()?),
            Tag::String => Value::String(self.get()?),
            Tag::Thread => Value::Thread(self.get()?),
            Tag::ThreadGroup => Value::ThreadGroup(self.get()?),
            Tag::ClassLoader => Value::ClassLoader(self.get()?),
            Tag::ClassObject => Value::ClassObject(self.get()?),
        };
        Ok(value)
    }
}

impl<'a> JdwpEncoder<'a> {
    /// Encodes a value body without its leading tag byte, at the minimal width its tag mandates
    pub fn put_untagged_value(&mut self, value: &Value) {
        match value {
            Value::Void => {}
            Value::Byte(v) => self.data.put_u8(*v),
            Value::Boolean(v) => self.data.put_u8(u8::from(*v)),
            Value::Char(v) => self.data.put_u16(*v),
            Value::Short(v) => self.data.put_i16(*v),
            Value::Int(v) => self.data.put_i32(*v),
            Value::Float(v) => self.data.put_f32(*v),
            Value::Long(v) => self.data.put_i64(*v),
            Value::Double(v) => self.data.put_f64(*v),
            Value::Array(id) => self.put(id),
            Value::Object(id) => self.put(id),
            Value::String(id) => self.put(id),
            Value::Thread(id) => self.put(id),
            Value::ThreadGroup(id) => self.put(id),
            Value::ClassLoader(id) => self.put(id),
            Value::ClassObject(id) => self.put(id),
        }
    }
}

/// A slice of an array's elements: one tag for the whole region, then packed untagged values
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayRegion {
    pub tag: Tag,
    pub values: Vec<Value>,
}

impl JdwpDecodable for ArrayRegion {
    type Err = DecodeJdwpDataError;

    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, Self::Err> {
        let tag = decoder.get::<Tag>()?;
        if tag == Tag::Void {
            return Err(DecodeJdwpDataError::VoidArrayRegion);
        }
        let count = decoder.get::<Int>()?;
        if count < 0 {
            return Err(DecodeJdwpDataError::UnexpectedNegativeInt(count));
        }
        let mut values = Vec::with_capacity(count as usize);
        for _ in 0..count {
            values.push(decoder.untagged_value(tag)?);
        }
        Ok(ArrayRegion { tag, values })
    }
}

impl<T: JdwpDecodable<Err = DecodeJdwpDataError>> JdwpDecodable for Vec<T> {
    type Err = DecodeJdwpDataError;

    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, Self::Err> {
        let len = decoder.get::<Int>()?;
        if len < 0 {
            return Err(DecodeJdwpDataError::UnexpectedNegativeInt(len));
        }
        let mut collect = Vec::with_capacity(len.min(4096) as usize);
        for _ in 0..len {
            let item = decoder.get::<T>()?;
            collect.push(item);
        }
        Ok(collect)
    }
}

impl<T: JdwpEncodable> JdwpEncodable for Vec<T> {
    fn encode(&self, encoder: &mut JdwpEncoder) {
        encoder.data.put_i32(self.len() as i32);
        for item in self {
            encoder.put(item);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use jdwp_types::{Id, Object, ObjectId, Tag, ThreadId, Value};

    fn round_trip(codec: &JdwpCodec, value: Value) -> (usize, Value) {
        let mut encoder = JdwpEncoder::new(codec);
        encoder.put(&value);
        let encoded = encoder.data.freeze();
        let width = encoded.len() - 1;
        let mut decoder = JdwpDecoder::new(codec, encoded);
        (width, decoder.get::<Value>().expect("value must decode"))
    }

    #[test]
    fn encode_special_ids() {
        let id: Id<Object> = Id::new(101);
        let codec = JdwpCodec::new(IdSizes::new(6, 6, 6, 6, 6));
        let mut encoder = JdwpEncoder::new(&codec);
        encoder.put(&id);
        assert_eq!(encoder.data.len(), 6);
        assert_eq!(&encoder.data[..], &[0, 0, 0, 0, 0, 101]);
        let mut decoder = JdwpDecoder::new(&codec, encoder.data.freeze());
        let decoded_id = decoder.get::<ObjectId>().expect("could not decode objectid");
        assert_eq!(decoded_id, id);
    }

    #[test]
    fn encode_special_ids_out_of_bounds() {
        let id: Id<Object> = Id::new(u64::MAX);
        let codec = JdwpCodec::new(IdSizes::new(6, 6, 6, 6, 6));
        let mut encoder = JdwpEncoder::new(&codec);
        encoder.put(&id);
        assert_eq!(encoder.data.len(), 6);
        let mut decoder = JdwpDecoder::new(&codec, encoder.data.freeze());
        let decoded_id = decoder.get::<ObjectId>().expect("could not decode objectid");
        assert_ne!(decoded_id, id);
        assert_eq!(decoded_id, Id::new(!(0xFFFF << 48)));
    }

    #[test]
    fn value_round_trips_at_mandated_width() {
        let codec = JdwpCodec::default();
        let cases = [
            Value::Void,
            Value::Byte(0x7F),
            Value::Boolean(true),
            Value::Char(0x1234),
            Value::Short(-2),
            Value::Int(-70000),
            Value::Float(1.5),
            Value::Long(1 << 40),
            Value::Double(-0.25),
            Value::Object(Id::new(0xCAFE)),
            Value::Array(Id::new(0xBEEF)),
            Value::String(Id::new(3)),
            Value::Thread(Id::new(4)),
            Value::ThreadGroup(Id::new(5)),
            Value::ClassLoader(Id::new(6)),
            Value::ClassObject(Id::new(7)),
        ];
        for value in cases {
            let (width, decoded) = round_trip(&codec, value);
            assert_eq!(width, value.tag().width(), "{value:?}");
            assert_eq!(decoded, value);
        }
    }

    #[test]
    fn string_round_trips() {
        let codec = JdwpCodec::default();
        let mut encoder = JdwpEncoder::new(&codec);
        encoder.put(&"Lsh/kau/playground/X;".to_string());
        let mut decoder = JdwpDecoder::new(&codec, encoder.data.freeze());
        assert_eq!(
            decoder.get::<std::string::String>().unwrap(),
            "Lsh/kau/playground/X;".to_string()
        );
    }

    #[test]
    fn location_round_trips() {
        let codec = JdwpCodec::default();
        let location = Location {
            tag: TypeTag::Class,
            class: Id::new(0x1001),
            method: Id::new(0x2002),
            index: 12,
        };
        let mut encoder = JdwpEncoder::new(&codec);
        encoder.put(&location);
        assert_eq!(encoder.data.len(), 1 + 8 + 8 + 8);
        let mut decoder = JdwpDecoder::new(&codec, encoder.data.freeze());
        assert_eq!(decoder.get::<Location>().unwrap(), location);
    }

    #[test]
    fn tagged_object_refuses_primitive_tags() {
        let codec = JdwpCodec::default();
        let mut encoder = JdwpEncoder::new(&codec);
        encoder.put(&Tag::Int);
        encoder.put(&(7u64));
        let mut decoder = JdwpDecoder::new(&codec, encoder.data.freeze());
        decoder
            .get::<TaggedObjectId>()
            .expect_err("Int is not an object kind");
    }

    #[test]
    fn array_region_round_trips() {
        let codec = JdwpCodec::default();
        let mut encoder = JdwpEncoder::new(&codec);
        encoder.put(&Tag::Int);
        encoder.put(&3i32);
        for v in [1i32, 2, 3] {
            encoder.data.put_i32(v);
        }
        let mut decoder = JdwpDecoder::new(&codec, encoder.data.freeze());
        let region = decoder.get::<ArrayRegion>().unwrap();
        assert_eq!(region.tag, Tag::Int);
        assert_eq!(
            region.values,
            vec![Value::Int(1), Value::Int(2), Value::Int(3)]
        );

        let mut encoder = JdwpEncoder::new(&codec);
        encoder.put(&Tag::Thread);
        encoder.put(&1i32);
        encoder.put(&ThreadId::new(0x77));
        let mut decoder = JdwpDecoder::new(&codec, encoder.data.freeze());
        let region = decoder.get::<ArrayRegion>().unwrap();
        assert_eq!(region.values, vec![Value::Thread(Id::new(0x77))]);
    }
}
