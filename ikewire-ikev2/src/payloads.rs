use crate::sa::{append_proposals, parse_proposals, Proposal, ProtocolId};
use crate::wire::{at, count_u8, fail, patch_u16, take_span, IResult};

use ikewire::error::{Error, ErrorKind, Level, Result};

use bytes::BufMut;

use nom::bytes::complete::take;
use nom::combinator::{map, rest};
use nom::number::complete::{be_u16, be_u8};
use nom::sequence::tuple;

use num_enum::{FromPrimitive, IntoPrimitive};

use tracing::{debug, trace};

const GENERIC_PAYLOAD_HEADER_LEN: u16 = 4;
const PAYLOAD_LENGTH_OFFSET: usize = 2;
const CRITICAL_BIT: u8 = 0x80;

#[derive(Debug, FromPrimitive, IntoPrimitive, PartialEq, Eq, Clone, Copy)]
#[repr(u8)]
pub enum PayloadType {
    NoNextPayload = 0,
    SecurityAssociation = 33,
    KeyExchange = 34,
    IdentificationInitiator = 35,
    IdentificationResponder = 36,
    Certificate = 37,
    CertificateRequest = 38,
    Authentication = 39,
    Nonce = 40,
    Notify = 41,
    Delete = 42,
    VendorID = 43,
    TrafficSelectorInitiator = 44,
    TrafficSelectorResponder = 45,
    EncryptedAndAuthenticated = 46,
    Configuration = 47,
    ExtensibleAuthenticationProtocol = 48,
    GenericSecurePasswordMethod = 49,
    GroupIdentification = 50,
    GroupSecurityAssociation = 51,
    KeyDownload = 52,
    EncryptedAndAuthenticatedFragment = 53,
    PuzzleSolution = 54,
    #[num_enum(catch_all)]
    Unknown(u8),
}

#[derive(Debug, FromPrimitive, IntoPrimitive, PartialEq, Eq, Clone, Copy)]
#[repr(u16)]
pub enum NotifyType {
    // Error types
    UnsupportedCriticalPayload = 1,
    InvalidIkeSpi = 4,
    InvalidMajorVersion = 5,
    InvalidSyntax = 7,
    InvalidMessageId = 9,
    InvalidSpi = 11,
    NoProposalChosen = 14,
    InvalidKePayload = 17,
    AuthenticationFailed = 24,
    SinglePairRequired = 34,
    NoAdditionalSas = 35,
    InternalAddressFailure = 36,
    FailedCpRequired = 37,
    TsUnacceptable = 38,
    InvalidSelectors = 39,
    TemporaryFailure = 43,
    ChildSaNotFound = 44,
    // Status types
    InitialContact = 16384,
    SetWindowSize = 16385,
    AdditionalTsPossible = 16386,
    IpcompSupported = 16387,
    NatDetectionSourceIp = 16388,
    NatDetectionDestinationIp = 16389,
    Cookie = 16390,
    UseTransportMode = 16391,
    HttpCertLookupSupported = 16392,
    RekeySa = 16393,
    EspTfcPaddingNotSupported = 16394,
    NonFirstFragmentsAlso = 16395,
    MobikeSupported = 16396,
    RedirectSupported = 16406,
    Redirect = 16407,
    RedirectedFrom = 16408,
    Ikev2FragmentationSupported = 16430,
    SignatureHashAlgorithms = 16431,
    #[num_enum(catch_all)]
    Unknown(u16),
}

/// One payload in a message's payload chain.
///
/// The wire-level "next payload" link is not stored; it is the position of
/// the payload in [`crate::Packet::payloads`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    SecurityAssociation(Vec<Proposal>),
    KeyExchange(KeyExchange),
    Nonce(Vec<u8>),
    Notify(Notify),
    /// Any payload type without a decoder here, kept verbatim so it
    /// re-encodes byte for byte. `flags` is the whole byte following the
    /// next-payload field, critical bit and reserved bits included.
    ///
    /// Encoding fails with `InvalidPayloadType` if `payload_type` is
    /// [`PayloadType::NoNextPayload`] or a type with its own variant above.
    Unknown {
        payload_type: u8,
        flags: u8,
        data: Vec<u8>,
    },
}

impl PayloadType {
    /// Chain terminator or a type decoded into its own [`Payload`] variant.
    fn has_variant(self) -> bool {
        matches!(
            self,
            PayloadType::NoNextPayload
                | PayloadType::SecurityAssociation
                | PayloadType::KeyExchange
                | PayloadType::Nonce
                | PayloadType::Notify
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyExchange {
    pub dh_group: u16,
    /// Public value exactly as sent; its size is implied by the group and is
    /// left to the cryptographic layer to check.
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notify {
    pub protocol_id: ProtocolId,
    pub spi: Vec<u8>,
    pub notify_type: NotifyType,
    pub data: Vec<u8>,
}

impl Notify {
    /// Notify without SPI or data, such as IKEV2_FRAGMENTATION_SUPPORTED.
    pub fn new(notify_type: NotifyType) -> Self {
        Self::with_data(notify_type, Vec::new())
    }

    pub fn with_data(notify_type: NotifyType, data: Vec<u8>) -> Self {
        Self {
            protocol_id: ProtocolId::None,
            spi: Vec::new(),
            notify_type,
            data,
        }
    }

    /// Types below 16384 report errors, the rest report status.
    pub fn is_error(&self) -> bool {
        u16::from(self.notify_type) < 16384
    }

    /// Hash algorithm ids announced in a SIGNATURE_HASH_ALGORITHMS notify
    /// (RFC7427). `None` for other notify types or an odd-length list.
    pub fn signature_hash_algorithms(&self) -> Option<Vec<u16>> {
        let ids = self.data.chunks_exact(2);
        if self.notify_type != NotifyType::SignatureHashAlgorithms || !ids.remainder().is_empty() {
            return None;
        }
        Some(ids.map(|id| u16::from_be_bytes([id[0], id[1]])).collect())
    }
}

impl Payload {
    /// Type code this payload is announced with by its predecessor.
    pub fn payload_type(&self) -> PayloadType {
        match self {
            Payload::SecurityAssociation(_) => PayloadType::SecurityAssociation,
            Payload::KeyExchange(_) => PayloadType::KeyExchange,
            Payload::Nonce(_) => PayloadType::Nonce,
            Payload::Notify(_) => PayloadType::Notify,
            Payload::Unknown { payload_type, .. } => PayloadType::from(*payload_type),
        }
    }

    /// Critical bit of the envelope. Only kept for [`Payload::Unknown`];
    /// every other variant is written with it clear.
    pub fn is_critical(&self) -> bool {
        match self {
            Payload::Unknown { flags, .. } => flags & CRITICAL_BIT != 0,
            _ => false,
        }
    }

    /* V2 Generic Payload - RFC7296
     *                       1                   2                   3
     *   0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
     *  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
     *  | Next Payload  |C|  RESERVED   |         Payload Length        |
     *  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
     *
     * `payload_type` is the type announced by the previous payload (or the
     * packet header). Returns the payload and the type announced for its
     * successor. The flags byte only matters for types we cannot decode,
     * so it is dropped for the others as RFC7296 section 3.2 requires.
     */
    pub fn parse(input: &[u8], payload_type: PayloadType) -> IResult<'_, (Self, PayloadType)> {
        let (input, (next_payload, flags, payload_length)) =
            tuple((map(be_u8, PayloadType::from), be_u8, be_u16))(input)
                .map_err(at(Level::Payload))?;
        let body_len = payload_length
            .checked_sub(GENERIC_PAYLOAD_HEADER_LEN)
            .ok_or_else(|| {
                fail(Error::at(
                    Level::Payload,
                    ErrorKind::InvalidPayloadLength(payload_length),
                ))
            })?;
        let (input, body) = take_span(input, usize::from(body_len), Level::Payload)?;

        let (_, payload) =
            Self::parse_body(body, payload_type, flags).map_err(at(Level::Payload))?;
        trace!(?payload_type, payload_length, "decoded payload");

        Ok((input, (payload, next_payload)))
    }

    fn parse_body(input: &[u8], payload_type: PayloadType, flags: u8) -> IResult<'_, Self> {
        match payload_type {
            PayloadType::SecurityAssociation => {
                map(parse_proposals, Payload::SecurityAssociation)(input)
            }
            PayloadType::KeyExchange => Self::parse_ke(input),
            PayloadType::Nonce => map(rest, |data: &[u8]| Payload::Nonce(data.to_vec()))(input),
            PayloadType::Notify => Self::parse_notify(input),
            other => {
                debug!(payload_type = ?other, flags, "preserving opaque payload");
                map(rest, |data: &[u8]| Payload::Unknown {
                    payload_type: other.into(),
                    flags,
                    data: data.to_vec(),
                })(input)
            }
        }
    }

    // Key Exchange - RFC7296
    //                      1                   2                   3
    //  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // |   Diffie-Hellman Group Num    |           RESERVED            |
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // |                                                               |
    // ~                       Key Exchange Data                       ~
    // |                                                               |
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    fn parse_ke(input: &[u8]) -> IResult<'_, Self> {
        map(
            tuple((be_u16, be_u16, rest)),
            |(dh_group, _reserved, data): (u16, u16, &[u8])| {
                Payload::KeyExchange(KeyExchange {
                    dh_group,
                    data: data.to_vec(),
                })
            },
        )(input)
    }

    // Notify - RFC7296
    //                      1                   2                   3
    //  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // |  Protocol ID  |   SPI Size    |      Notify Message Type      |
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // |                                                               |
    // ~                Security Parameter Index (SPI)                 ~
    // |                                                               |
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // |                                                               |
    // ~                       Notification Data                       ~
    // |                                                               |
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    fn parse_notify(input: &[u8]) -> IResult<'_, Self> {
        let (input, (protocol_id, spi_size, notify_type)) = tuple((
            map(be_u8, ProtocolId::from),
            be_u8,
            map(be_u16, NotifyType::from),
        ))(input)?;
        let (input, spi) = take(spi_size)(input)?;
        let (input, data) = rest(input)?;
        Ok((
            input,
            Payload::Notify(Notify {
                protocol_id,
                spi: spi.to_vec(),
                notify_type,
                data: data.to_vec(),
            }),
        ))
    }

    /// Append this payload, announcing `next_payload` as its successor.
    pub(crate) fn append_to(&self, next_payload: PayloadType, buf: &mut Vec<u8>) -> Result<()> {
        let flags = match self {
            Payload::Unknown {
                payload_type,
                flags,
                ..
            } => {
                if PayloadType::from(*payload_type).has_variant() {
                    return Err(Error::at(
                        Level::Payload,
                        ErrorKind::InvalidPayloadType(*payload_type),
                    ));
                }
                *flags
            }
            _ => 0,
        };
        let start = buf.len();
        buf.put_u8(next_payload.into());
        buf.put_u8(flags);
        buf.put_u16(0);

        match self {
            Payload::SecurityAssociation(proposals) => append_proposals(proposals, buf)?,
            Payload::KeyExchange(ke) => {
                buf.put_u16(ke.dh_group);
                buf.put_u16(0);
                buf.put_slice(&ke.data);
            }
            Payload::Nonce(data) => buf.put_slice(data),
            Payload::Notify(notify) => {
                buf.put_u8(notify.protocol_id.into());
                buf.put_u8(count_u8(notify.spi.len(), Level::Payload)?);
                buf.put_u16(notify.notify_type.into());
                buf.put_slice(&notify.spi);
                buf.put_slice(&notify.data);
            }
            Payload::Unknown { data, .. } => buf.put_slice(data),
        }

        patch_u16(buf, start, PAYLOAD_LENGTH_OFFSET, Level::Payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest(input, ptype, expected,
        case::ke(
            &[0x00, 0x13, 0x00, 0x00, 0x01, 0x02, 0x03],
            PayloadType::KeyExchange,
            Ok(Payload::KeyExchange(KeyExchange { dh_group: 19, data: vec![1, 2, 3] }))
        ),
        case::ke_truncated(&[0x00, 0x13, 0x00], PayloadType::KeyExchange, Err(Error::new(ErrorKind::TruncatedInput))),
        case::nonce(&[0xaa, 0xbb], PayloadType::Nonce, Ok(Payload::Nonce(vec![0xaa, 0xbb]))),
        case::notify_no_data(
            &[0x00, 0x00, 0x40, 0x2e],
            PayloadType::Notify,
            Ok(Payload::Notify(Notify::new(NotifyType::Ikev2FragmentationSupported)))
        ),
        case::notify_with_spi(
            &[0x03, 0x04, 0x00, 0x0b, 0x01, 0x02, 0x03, 0x04, 0xff],
            PayloadType::Notify,
            Ok(Payload::Notify(Notify {
                protocol_id: ProtocolId::Esp,
                spi: vec![1, 2, 3, 4],
                notify_type: NotifyType::InvalidSpi,
                data: vec![0xff],
            }))
        ),
        case::notify_spi_overrun(
            &[0x03, 0x04, 0x00, 0x0b, 0x01, 0x02],
            PayloadType::Notify,
            Err(Error::new(ErrorKind::TruncatedInput))
        ),
        case::vendor_id(
            &[0x01, 0x02],
            PayloadType::VendorID,
            Ok(Payload::Unknown { payload_type: 43, flags: 0, data: vec![1, 2] })
        ),
    )]
    fn payload_body_parse(input: &[u8], ptype: PayloadType, expected: std::result::Result<Payload, Error>) {
        assert_eq!(
            Payload::parse_body(input, ptype, 0)
                .map(|(_, payload)| payload)
                .map_err(Error::from),
            expected
        );
    }

    #[rstest(input, expected,
        case::length_below_header(
            &[0x00, 0x00, 0x00, 0x03],
            Err(Error::at(Level::Payload, ErrorKind::InvalidPayloadLength(3)))
        ),
        case::length_past_end(
            &[0x00, 0x00, 0x00, 0x09, 0x01, 0x02],
            Err(Error::truncated(Level::Payload))
        ),
        case::body_error_is_tagged(
            &[0x00, 0x00, 0x00, 0x06, 0x00, 0x13],
            Err(Error::truncated(Level::Payload))
        ),
        case::empty_nonce(
            &[0x29, 0x00, 0x00, 0x04, 0xff],
            Ok((1, (Payload::Nonce(Vec::new()), PayloadType::Notify)))
        ),
    )]
    fn envelope_parse(input: &[u8], expected: std::result::Result<(usize, (Payload, PayloadType)), Error>) {
        let ptype = if input[0] == 0x29 {
            PayloadType::Nonce
        } else {
            PayloadType::KeyExchange
        };
        assert_eq!(
            Payload::parse(input, ptype)
                .map(|(rest, parsed)| (rest.len(), parsed))
                .map_err(Error::from),
            expected
        );
    }

    #[test]
    fn critical_bit_kept_for_unknown_only() {
        let unknown = Payload::Unknown {
            payload_type: 200,
            flags: CRITICAL_BIT,
            data: vec![0x01],
        };
        let mut buf = Vec::new();
        unknown.append_to(PayloadType::NoNextPayload, &mut buf).unwrap();
        assert_eq!(buf, vec![0x00, 0x80, 0x00, 0x05, 0x01]);

        let (_, (parsed, _)) = Payload::parse(&buf, PayloadType::Unknown(200)).unwrap();
        assert_eq!(parsed, unknown);
        assert!(parsed.is_critical());

        // a known type with the bit set decodes and re-encodes with it clear
        let (_, (nonce, _)) =
            Payload::parse(&[0x00, 0x80, 0x00, 0x05, 0x01], PayloadType::Nonce).unwrap();
        let mut buf = Vec::new();
        nonce.append_to(PayloadType::NoNextPayload, &mut buf).unwrap();
        assert_eq!(buf, vec![0x00, 0x00, 0x00, 0x05, 0x01]);
        assert!(!nonce.is_critical());
    }

    #[rstest(envelope,
        case::reserved_bit(&[0x00, 0x01, 0x00, 0x05, 0xaa]),
        case::all_flag_bits(&[0x00, 0xff, 0x00, 0x05, 0xaa]),
        case::critical_and_reserved(&[0x00, 0x81, 0x00, 0x04]),
    )]
    fn unknown_flags_reencode_verbatim(envelope: &[u8]) {
        let (rest, (parsed, _)) = Payload::parse(envelope, PayloadType::Unknown(200)).unwrap();
        assert!(rest.is_empty());
        assert_eq!(parsed.is_critical(), envelope[1] & CRITICAL_BIT != 0);

        let mut buf = Vec::new();
        parsed.append_to(PayloadType::NoNextPayload, &mut buf).unwrap();
        assert_eq!(buf, envelope);
    }

    #[rstest(payload_type,
        case::no_next_payload(0),
        case::security_association(33),
        case::key_exchange(34),
        case::nonce(40),
        case::notify(41),
    )]
    fn unknown_cannot_claim_modelled_type(payload_type: u8) {
        let unknown = Payload::Unknown {
            payload_type,
            flags: 0,
            data: vec![0x00, 0x00, 0x40, 0x2e],
        };
        let mut buf = Vec::new();
        assert_eq!(
            unknown.append_to(PayloadType::NoNextPayload, &mut buf),
            Err(Error::at(
                Level::Payload,
                ErrorKind::InvalidPayloadType(payload_type)
            ))
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn unknown_may_use_unmodelled_named_type() {
        let vendor_id = Payload::Unknown {
            payload_type: 43,
            flags: 0,
            data: vec![0x01],
        };
        let mut buf = Vec::new();
        vendor_id.append_to(PayloadType::NoNextPayload, &mut buf).unwrap();
        assert_eq!(buf, vec![0x00, 0x00, 0x00, 0x05, 0x01]);
    }

    #[test]
    fn signature_hash_algorithms() {
        let notify = Notify::with_data(
            NotifyType::SignatureHashAlgorithms,
            vec![0x00, 0x02, 0x00, 0x03, 0x00, 0x04, 0x00, 0x05],
        );
        assert_eq!(notify.signature_hash_algorithms(), Some(vec![2, 3, 4, 5]));
        assert!(!notify.is_error());

        let odd = Notify::with_data(NotifyType::SignatureHashAlgorithms, vec![0x00]);
        assert_eq!(odd.signature_hash_algorithms(), None);
        assert!(Notify::new(NotifyType::NoProposalChosen).is_error());
    }
}
