use crate::payloads::PayloadType;
use crate::wire::{at, IResult};

use ikewire::error::Level;

use bitflags::bitflags;
use bytes::BufMut;

use nom::bytes::complete::take;
use nom::combinator::map;
use nom::number::complete::{be_u32, be_u8};
use nom::sequence::{preceded, tuple};

use num_enum::{FromPrimitive, IntoPrimitive};

/// Length of an IKE header
pub const HEADER_LEN: usize = 28;

/// Offset of the total length field inside the header
pub(crate) const LENGTH_OFFSET: usize = 24;

/// IKE SA Security Parameter Index, carried verbatim.
pub type Spi = [u8; 8];

#[derive(Debug, FromPrimitive, IntoPrimitive, PartialEq, Eq, Copy, Clone)]
#[repr(u8)]
pub enum ExchangeType {
    IkeSaInit = 34,
    IkeAuth = 35,
    CreateChildSa = 36,
    Informational = 37,
    IkeSessionResume = 38,
    GsaAuth = 39,
    GsaRegistration = 40,
    GsaRekey = 41,
    IkeIntermediate = 43,
    IkeFollowupKe = 44,
    #[num_enum(catch_all)]
    Unknown(u8),
}

bitflags! {
    /// Header flags. Bits without a name are kept so they survive a
    /// decode/encode round trip.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IkeFlags: u8 {
        const INITIATOR = 0b0000_1000;
        const VERSION = 0b0001_0000;
        const RESPONSE = 0b0010_0000;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub initiator_spi: Spi,
    pub responder_spi: Spi,
    pub version: u8,
    pub exchange_type: ExchangeType,
    pub flags: IkeFlags,
    pub message_id: u32,
}

impl Header {
    pub const MAJOR_VERSION_MASK: u8 = 0xF0;
    pub const MINOR_VERSION_MASK: u8 = 0x0F;

    /// Version byte for IKEv2.0
    pub const VERSION_2_0: u8 = 0x20;

    // V2 Header - RFC7296
    //                      1                   2                   3
    //  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // |                       IKE SA Initiator's SPI                  |
    // |                                                               |
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // |                       IKE SA Responder's SPI                  |
    // |                                                               |
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // |  Next Payload | MjVer | MnVer | Exchange Type |     Flags     |
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // |                          Message ID                           |
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // |                            Length                             |
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    //
    // Next Payload and Length are not stored: they describe the payload
    // chain and are derived from it when encoding.
    pub(crate) fn parse(input: &[u8]) -> IResult<'_, (Self, PayloadType, u32)> {
        let (
            input,
            (
                initiator_spi,
                responder_spi,
                next_payload,
                version,
                exchange_type,
                flags,
                message_id,
                length,
            ),
        ) = tuple((
            parse_spi,
            parse_spi,
            map(be_u8, PayloadType::from),
            be_u8,
            map(be_u8, ExchangeType::from),
            map(be_u8, IkeFlags::from_bits_retain),
            be_u32,
            be_u32,
        ))(input)
        .map_err(at(Level::Packet))?;

        Ok((
            input,
            (
                Self {
                    initiator_spi,
                    responder_spi,
                    version,
                    exchange_type,
                    flags,
                    message_id,
                },
                next_payload,
                length,
            ),
        ))
    }

    /// Read only the total length field.
    pub(crate) fn peek_length(input: &[u8]) -> IResult<'_, u32> {
        preceded(take(LENGTH_OFFSET), be_u32)(input).map_err(at(Level::Packet))
    }

    /// Append the header with a zero length placeholder at
    /// [`LENGTH_OFFSET`].
    pub(crate) fn append_to(&self, next_payload: PayloadType, buf: &mut Vec<u8>) {
        buf.put_slice(&self.initiator_spi);
        buf.put_slice(&self.responder_spi);
        buf.put_u8(next_payload.into());
        buf.put_u8(self.version);
        buf.put_u8(self.exchange_type.into());
        buf.put_u8(self.flags.bits());
        buf.put_u32(self.message_id);
        buf.put_u32(0);
    }

    pub fn major_version(&self) -> u8 {
        (self.version & Self::MAJOR_VERSION_MASK).wrapping_shr(4)
    }

    pub fn minor_version(&self) -> u8 {
        self.version & Self::MINOR_VERSION_MASK
    }

    pub fn is_initiator(&self) -> bool {
        self.flags.contains(IkeFlags::INITIATOR)
    }

    pub fn is_response(&self) -> bool {
        self.flags.contains(IkeFlags::RESPONSE)
    }
}

fn parse_spi(input: &[u8]) -> IResult<'_, Spi> {
    map(take(8usize), |bytes: &[u8]| {
        let mut spi = Spi::default();
        spi.copy_from_slice(bytes);
        spi
    })(input)
}
