//! A byte-exact Internet Key Exchange version 2 (IKEv2) message codec.
//!
//! [`decode`] turns one UDP datagram into a [`Packet`] tree and [`encode`]
//! turns the tree back into bytes. Decoding never panics on malformed input:
//! every length field is bounded by the span its parent allotted and errors
//! name the nesting level at fault. Re-encoding a decoded packet reproduces
//! the original bytes, including payloads, transforms and attributes this
//! crate has no model for.
//!
//! Only the payloads needed for an IKE_SA_INIT exchange are decoded
//! structurally; everything else, including Encrypted payloads, is carried
//! as [`Payload::Unknown`].
//!
//! The following references were used to create this module:
//!
//! [IKE v2](https://www.rfc-editor.org/rfc/rfc7296.html)
//!
//! [IKEv2 Fragmentation](https://www.rfc-editor.org/rfc/rfc7383.html)
//!
//! [Signature Authentication in IKEv2](https://www.rfc-editor.org/rfc/rfc7427.html)
//!
//! # Example
//! ```
//! use ikewire::probe::{Probe, Status};
//! use ikewire_ikev2::{decode, encode, Ikev2, Payload};
//!
//! fn inspect(datagram: &[u8]) -> ikewire::error::Result<()> {
//!     if Ikev2.probe(datagram) != Status::Recognized {
//!         return Ok(());
//!     }
//!     let packet = decode(datagram)?;
//!     for payload in &packet.payloads {
//!         if let Payload::Notify(notify) = payload {
//!             println!("notify {:?}", notify.notify_type);
//!         }
//!     }
//!     assert_eq!(encode(&packet)?, datagram);
//!     Ok(())
//! }
//! ```

#![deny(clippy::arithmetic_side_effects)]

pub mod header;
pub mod payloads;
pub mod sa;
pub mod transforms;

mod wire;

pub use header::{ExchangeType, Header, IkeFlags, Spi, HEADER_LEN};
pub use payloads::{KeyExchange, Notify, NotifyType, Payload, PayloadType};
pub use sa::{Attribute, AttributeValue, Proposal, ProtocolId, Transform, TransformType};
pub use transforms::KnownTransform;

use header::LENGTH_OFFSET;
use wire::{consumed, fail, patch_u32};

use ikewire::encoder::Encode;
use ikewire::error::{Error, Level, Result};
use ikewire::parser::Parse;
use ikewire::probe::{Probe, Status};
use ikewire::protocol::Protocol;

use tracing::{debug, trace};

/// One IKEv2 message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub header: Header,
    /// Payload chain in wire order. The chain's next-payload links and the
    /// header's total length are derived from it on encode.
    pub payloads: Vec<Payload>,
}

impl Packet {
    /// Append the wire form of this packet to `buf`.
    pub fn append_to(&self, buf: &mut Vec<u8>) -> Result<()> {
        let start = buf.len();
        self.header.append_to(self.first_payload_type(), buf);
        let successors = self
            .payloads
            .iter()
            .skip(1)
            .map(Payload::payload_type)
            .chain(std::iter::once(PayloadType::NoNextPayload));
        for (payload, next_payload) in self.payloads.iter().zip(successors) {
            payload.append_to(next_payload, buf)?;
        }
        patch_u32(buf, start, LENGTH_OFFSET, Level::Packet)?;
        trace!(length = buf.len().saturating_sub(start), "encoded packet");
        Ok(())
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.append_to(&mut buf)?;
        Ok(buf)
    }

    /// Decode exactly one message. `input` must be the whole datagram: its
    /// length has to match the header's declared length.
    pub fn parse_from(input: &[u8]) -> Result<Self> {
        Self::parse_chain(input)
            .map(|(_, packet)| packet)
            .map_err(|err| {
                let err = Error::from(err);
                debug!(level = ?err.level, kind = ?err.kind, "failed to decode packet");
                err
            })
    }

    fn parse_chain(input: &[u8]) -> wire::IResult<'_, Self> {
        let (mut rest, (header, mut next_payload, length)) = Header::parse(input)?;
        if length as usize != input.len() {
            return Err(fail(Error::length_mismatch(
                Level::Packet,
                length as usize,
                input.len(),
            )));
        }

        let mut payloads = Vec::new();
        while next_payload != PayloadType::NoNextPayload {
            if rest.is_empty() {
                return Err(fail(Error::truncated(Level::Payload)));
            }
            let (remaining, (payload, following)) = Payload::parse(rest, next_payload)?;
            payloads.push(payload);
            next_payload = following;
            rest = remaining;
        }
        if !rest.is_empty() {
            return Err(fail(Error::length_mismatch(
                Level::Packet,
                input.len(),
                consumed(input, rest),
            )));
        }

        Ok((rest, Packet { header, payloads }))
    }

    /// Type announced by the header, `NoNextPayload` for an empty chain.
    fn first_payload_type(&self) -> PayloadType {
        self.payloads
            .first()
            .map_or(PayloadType::NoNextPayload, Payload::payload_type)
    }
}

pub fn encode(packet: &Packet) -> Result<Vec<u8>> {
    packet.encode()
}

pub fn decode(input: &[u8]) -> Result<Packet> {
    Packet::parse_from(input)
}

/// Stateless handle plugging the codec into the [`ikewire`] traits.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ikev2;

impl Protocol for Ikev2 {
    type Message = Packet;

    fn name() -> &'static str {
        "ikev2"
    }
}

impl Parse for Ikev2 {
    /// Decode the message at the front of `input` using the header's
    /// declared length, returning whatever follows it.
    fn parse<'a>(&self, input: &'a [u8]) -> Result<(&'a [u8], Self::Message)> {
        let (_, length) = Header::peek_length(input)?;
        let length = length as usize;
        if length > input.len() {
            return Err(Error::truncated(Level::Packet));
        }
        let (message, rest) = input.split_at(length);
        Ok((rest, Packet::parse_from(message)?))
    }
}

impl Encode for Ikev2 {
    fn encode(&self, message: &Self::Message, buf: &mut Vec<u8>) -> Result<()> {
        message.append_to(buf)
    }
}

impl Probe for Ikev2 {
    /// `Incomplete` only when the header is cut short or declares more bytes
    /// than are present. Anything that is not a well-formed IKEv2 message is
    /// `Unrecognized`.
    fn probe(&self, input: &[u8]) -> Status {
        let length = match Header::peek_length(input) {
            Ok((_, length)) => length as usize,
            Err(_) => return Status::Incomplete,
        };
        if length > input.len() {
            return Status::Incomplete;
        }
        match self.parse(input) {
            Ok((_, packet)) if packet.header.major_version() == 2 => Status::Recognized,
            _ => Status::Unrecognized,
        }
    }
}
