use bytes::{Bytes, BytesMut};
use prost::Message;

/// WireFormat connects a validated domain envelope to its protobuf representation.
pub trait WireFormat: Sized {
    type Proto: Message + Default;

    fn to_proto(&self) -> Self::Proto;

    fn try_from_proto(proto: Self::Proto) -> Result<Self, DecodeError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Malformed envelope: {0}")]
    Malformed(#[from] prost::DecodeError),

    #[error("Envelope does not carry a recognized service")]
    UnknownService,

    #[error("Envelope is missing required field '{0}'")]
    MissingField(&'static str),
}

pub fn encode<T: WireFormat>(message: &T) -> Bytes {
    let proto = message.to_proto();
    let mut buf = BytesMut::with_capacity(proto.encoded_len());
    proto
        .encode(&mut buf)
        .expect("BytesMut grows on demand, so encoding cannot run out of capacity");

    buf.freeze()
}

pub fn decode<T: WireFormat>(bytes: &[u8]) -> Result<T, DecodeError> {
    let proto = T::Proto::decode(bytes)?;
    T::try_from_proto(proto)
}
