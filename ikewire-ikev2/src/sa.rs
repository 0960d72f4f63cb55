//! Security Association payload substructures.
//!
//! Proposals and transforms are chained with a "last substructure" byte
//! rather than a count the decoder can trust. The in-memory model is a plain
//! ordered list; every indicator, length and count byte is derived from list
//! position and contents when encoding, and cross-checked against the span
//! the parent allotted when decoding.

use crate::wire::{at, consumed, count_u8, fail, length_u16, patch_u16, take_span, IResult};

use ikewire::error::{Error, ErrorKind, Level, Result};

use bytes::BufMut;

use nom::bytes::complete::take;
use nom::combinator::map;
use nom::number::complete::{be_u16, be_u8};
use nom::sequence::tuple;

use num_enum::{FromPrimitive, IntoPrimitive};

/// "Last substructure" value for the final proposal or transform
const LAST_SUBSTRUCTURE: u8 = 0;
/// "Last substructure" value for a proposal followed by another
const MORE_PROPOSALS: u8 = 2;
/// "Last substructure" value for a transform followed by another
const MORE_TRANSFORMS: u8 = 3;

const PROPOSAL_HEADER_LEN: usize = 8;
const TRANSFORM_HEADER_LEN: usize = 8;
const LENGTH_FIELD_OFFSET: usize = 2;

/// Attribute Format bit. Set for the fixed two byte TV form.
const ATTRIBUTE_FORMAT_TV: u16 = 0x8000;

/// Key Length attribute type, RFC7296 section 3.3.5
pub const ATTRIBUTE_KEY_LENGTH: u16 = 14;

#[derive(Debug, FromPrimitive, IntoPrimitive, PartialEq, Eq, Clone, Copy)]
#[repr(u8)]
pub enum ProtocolId {
    None = 0,
    Ike = 1,
    Ah = 2,
    Esp = 3,
    #[num_enum(catch_all)]
    Unknown(u8),
}

#[derive(Debug, FromPrimitive, IntoPrimitive, PartialEq, Eq, Clone, Copy)]
#[repr(u8)]
pub enum TransformType {
    EncryptionAlgorithm = 1,
    PseudoRandomFunction = 2,
    IntegrityAlgorithm = 3,
    DiffieHellmanGroup = 4,
    ExtendedSequenceNumbers = 5,
    AdditionalKeyExchange1 = 6,
    AdditionalKeyExchange2 = 7,
    AdditionalKeyExchange3 = 8,
    AdditionalKeyExchange4 = 9,
    AdditionalKeyExchange5 = 10,
    AdditionalKeyExchange6 = 11,
    AdditionalKeyExchange7 = 12,
    #[num_enum(catch_all)]
    Unknown(u8),
}

/// One candidate set of algorithms.
///
/// Consecutive proposals sharing a `proposal_num` are alternatives for the
/// same slot; that meaning belongs to the negotiation layer and is only
/// preserved here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub proposal_num: u8,
    pub protocol_id: ProtocolId,
    /// Empty for IKE, four bytes for AH and ESP
    pub spi: Vec<u8>,
    pub transforms: Vec<Transform>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transform {
    pub transform_type: TransformType,
    pub transform_id: u16,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// 15-bit attribute type, without the format bit
    pub attribute_type: u16,
    pub value: AttributeValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    /// TV form: the value is always exactly two bytes
    Short(u16),
    /// TLV form
    Long(Vec<u8>),
}

/// Decode the proposal list making up a Security Association payload body.
pub(crate) fn parse_proposals(input: &[u8]) -> IResult<'_, Vec<Proposal>> {
    let (rest, proposals) = parse_chain(input, Level::Proposal, Proposal::parse)?;
    if !rest.is_empty() {
        return Err(fail(Error::length_mismatch(
            Level::SecurityAssociation,
            input.len(),
            consumed(input, rest),
        )));
    }
    Ok((rest, proposals))
}

pub(crate) fn append_proposals(proposals: &[Proposal], buf: &mut Vec<u8>) -> Result<()> {
    let last = proposals.len().saturating_sub(1);
    for (index, proposal) in proposals.iter().enumerate() {
        proposal.append_to(index == last, buf)?;
    }
    Ok(())
}

/// Decode substructures until one carries the last-substructure marker.
///
/// `parse_one` returns each element along with whether another follows. An
/// empty span is an empty list.
fn parse_chain<'a, T>(
    mut input: &'a [u8],
    level: Level,
    parse_one: fn(&'a [u8]) -> IResult<'a, (T, bool)>,
) -> IResult<'a, Vec<T>> {
    let mut items = Vec::new();
    let mut more = !input.is_empty();
    while more {
        if input.is_empty() {
            return Err(fail(Error::truncated(level)));
        }
        let (rest, (item, has_next)) = parse_one(input)?;
        input = rest;
        items.push(item);
        more = has_next;
    }
    Ok((input, items))
}

fn parse_indicator(input: &[u8], more_follows: u8, level: Level) -> IResult<'_, bool> {
    let (input, indicator) = be_u8(input).map_err(at(level))?;
    match indicator {
        LAST_SUBSTRUCTURE => Ok((input, false)),
        value if value == more_follows => Ok((input, true)),
        value => Err(fail(Error::at(level, ErrorKind::InvalidIndicator(value)))),
    }
}

/// Split a substructure's body off using its declared length, which covers
/// its own fixed header.
fn parse_body<'a>(
    input: &'a [u8],
    declared: u16,
    header_len: usize,
    level: Level,
) -> IResult<'a, &'a [u8]> {
    let body_len = usize::from(declared)
        .checked_sub(header_len)
        .ok_or_else(|| fail(Error::length_mismatch(level, declared.into(), header_len)))?;
    take_span(input, body_len, level)
}

impl Proposal {
    // Proposal - RFC7296
    //                      1                   2                   3
    //  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // | Last Substruc |   RESERVED    |         Proposal Length       |
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // | Proposal Num  |  Protocol ID  |    SPI Size   |Num  Transforms|
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // ~                        SPI (variable)                         ~
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // |                                                               |
    // ~                        <Transforms>                           ~
    // |                                                               |
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    fn parse(input: &[u8]) -> IResult<'_, (Self, bool)> {
        let (input, more) = parse_indicator(input, MORE_PROPOSALS, Level::Proposal)?;
        let (input, (_reserved, proposal_length, proposal_num, protocol_id, spi_size, num_transforms)) =
            tuple((
                be_u8,
                be_u16,
                be_u8,
                map(be_u8, ProtocolId::from),
                be_u8,
                be_u8,
            ))(input)
            .map_err(at(Level::Proposal))?;
        let (input, body) =
            parse_body(input, proposal_length, PROPOSAL_HEADER_LEN, Level::Proposal)?;

        let (body, spi) = take(spi_size)(body).map_err(at(Level::Proposal))?;
        let (leftover, transforms) = parse_chain(body, Level::Transform, Transform::parse)?;
        if !leftover.is_empty() {
            return Err(fail(Error::length_mismatch(
                Level::Proposal,
                body.len(),
                consumed(body, leftover),
            )));
        }
        if transforms.len() != usize::from(num_transforms) {
            return Err(fail(Error::length_mismatch(
                Level::Proposal,
                num_transforms.into(),
                transforms.len(),
            )));
        }

        Ok((
            input,
            (
                Self {
                    proposal_num,
                    protocol_id,
                    spi: spi.to_vec(),
                    transforms,
                },
                more,
            ),
        ))
    }

    fn append_to(&self, last: bool, buf: &mut Vec<u8>) -> Result<()> {
        let start = buf.len();
        buf.put_u8(if last {
            LAST_SUBSTRUCTURE
        } else {
            MORE_PROPOSALS
        });
        buf.put_u8(0);
        buf.put_u16(0);
        buf.put_u8(self.proposal_num);
        buf.put_u8(self.protocol_id.into());
        buf.put_u8(count_u8(self.spi.len(), Level::Proposal)?);
        buf.put_u8(count_u8(self.transforms.len(), Level::Proposal)?);
        buf.put_slice(&self.spi);
        let last = self.transforms.len().saturating_sub(1);
        for (index, transform) in self.transforms.iter().enumerate() {
            transform.append_to(index == last, buf)?;
        }
        patch_u16(buf, start, LENGTH_FIELD_OFFSET, Level::Proposal)
    }
}

impl Transform {
    pub fn new(transform_type: TransformType, transform_id: u16) -> Self {
        Self {
            transform_type,
            transform_id,
            attributes: Vec::new(),
        }
    }

    /// Key length in bits, if a Key Length attribute is present.
    pub fn key_length(&self) -> Option<u16> {
        self.attributes.iter().find_map(|attribute| match attribute {
            Attribute {
                attribute_type: ATTRIBUTE_KEY_LENGTH,
                value: AttributeValue::Short(bits),
            } => Some(*bits),
            _ => None,
        })
    }

    // Transform - RFC7296
    //                      1                   2                   3
    //  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // | Last Substruc |   RESERVED    |        Transform Length       |
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // |Transform Type |   RESERVED    |          Transform ID         |
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // |                                                               |
    // ~                      Transform Attributes                     ~
    // |                                                               |
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    fn parse(input: &[u8]) -> IResult<'_, (Self, bool)> {
        let (input, more) = parse_indicator(input, MORE_TRANSFORMS, Level::Transform)?;
        let (input, (_reserved, transform_length, transform_type, _reserved2, transform_id)) =
            tuple((
                be_u8,
                be_u16,
                map(be_u8, TransformType::from),
                be_u8,
                be_u16,
            ))(input)
            .map_err(at(Level::Transform))?;
        let (input, mut body) =
            parse_body(input, transform_length, TRANSFORM_HEADER_LEN, Level::Transform)?;

        let mut attributes = Vec::new();
        while !body.is_empty() {
            let (rest, attribute) = Attribute::parse(body).map_err(at(Level::Transform))?;
            body = rest;
            attributes.push(attribute);
        }

        Ok((
            input,
            (
                Self {
                    transform_type,
                    transform_id,
                    attributes,
                },
                more,
            ),
        ))
    }

    fn append_to(&self, last: bool, buf: &mut Vec<u8>) -> Result<()> {
        let start = buf.len();
        buf.put_u8(if last {
            LAST_SUBSTRUCTURE
        } else {
            MORE_TRANSFORMS
        });
        buf.put_u8(0);
        buf.put_u16(0);
        buf.put_u8(self.transform_type.into());
        buf.put_u8(0);
        buf.put_u16(self.transform_id);
        for attribute in &self.attributes {
            attribute.append_to(buf)?;
        }
        patch_u16(buf, start, LENGTH_FIELD_OFFSET, Level::Transform)
    }
}

impl Attribute {
    /// Key Length attribute in its short form.
    pub fn key_length(bits: u16) -> Self {
        Self {
            attribute_type: ATTRIBUTE_KEY_LENGTH,
            value: AttributeValue::Short(bits),
        }
    }

    // Data Attribute - RFC7296
    //                      1                   2                   3
    //  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // |A|       Attribute Type        |    AF=0  Attribute Length     |
    // |F|                             |    AF=1  Attribute Value      |
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // |                   AF=0  Attribute Value                       |
    // |                   AF=1  Not Transmitted                       |
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    pub fn parse(input: &[u8]) -> IResult<'_, Self> {
        let (input, raw_type) = be_u16(input).map_err(at(Level::Attribute))?;
        let attribute_type = raw_type & !ATTRIBUTE_FORMAT_TV;

        if raw_type & ATTRIBUTE_FORMAT_TV != 0 {
            let (input, value) = be_u16(input).map_err(at(Level::Attribute))?;
            return Ok((
                input,
                Self {
                    attribute_type,
                    value: AttributeValue::Short(value),
                },
            ));
        }

        let (input, length) = be_u16(input).map_err(at(Level::Attribute))?;
        if usize::from(length) > input.len() {
            return Err(fail(Error::at(
                Level::Attribute,
                ErrorKind::InvalidAttributeFormat,
            )));
        }
        let (value, input) = input.split_at(usize::from(length));
        Ok((
            input,
            Self {
                attribute_type,
                value: AttributeValue::Long(value.to_vec()),
            },
        ))
    }

    fn append_to(&self, buf: &mut Vec<u8>) -> Result<()> {
        if self.attribute_type & ATTRIBUTE_FORMAT_TV != 0 {
            return Err(Error::at(
                Level::Attribute,
                ErrorKind::InvalidAttributeFormat,
            ));
        }
        match &self.value {
            AttributeValue::Short(value) => {
                buf.put_u16(self.attribute_type | ATTRIBUTE_FORMAT_TV);
                buf.put_u16(*value);
            }
            AttributeValue::Long(value) => {
                buf.put_u16(self.attribute_type);
                buf.put_u16(length_u16(value.len(), Level::Attribute)?);
                buf.put_slice(value);
            }
        }
        Ok(())
    }
}
