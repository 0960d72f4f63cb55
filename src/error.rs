use nom::error::ErrorKind as NomErrorKind;
use nom::InputLength;

pub type Result<T> = std::result::Result<T, Error>;

/// Nesting level of a message at which an error was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Packet,
    Payload,
    SecurityAssociation,
    Proposal,
    Transform,
    Attribute,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            Level::Packet => "packet",
            Level::Payload => "payload",
            Level::SecurityAssociation => "security association",
            Level::Proposal => "proposal",
            Level::Transform => "transform",
            Level::Attribute => "attribute",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Fewer bytes were available than a fixed or declared-length field requires
    TruncatedInput,
    /// A declared length or count disagrees with what was actually present
    LengthMismatch { declared: usize, actual: usize },
    /// A "more follows" marker held a value outside its two legal codes
    InvalidIndicator(u8),
    /// A long-form attribute overran its transform, or an attribute type
    /// does not fit in 15 bits
    InvalidAttributeFormat,
    /// A generic payload header declared a length shorter than itself
    InvalidPayloadLength(u16),
    /// An opaque payload claims the chain terminator or a type that has its
    /// own decoder, so it would not decode back to itself
    InvalidPayloadType(u8),
    /// A container is too large for its length field
    Oversized { limit: usize, actual: usize },
    /// Any other parser failure. Only carries a description with the
    /// `verbose` feature.
    ParseError(Option<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
    pub level: Option<Level>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, level: None }
    }

    /// Error raised at a known nesting level.
    pub fn at(level: Level, kind: ErrorKind) -> Self {
        Self {
            kind,
            level: Some(level),
        }
    }

    pub fn truncated(level: Level) -> Self {
        Self::at(level, ErrorKind::TruncatedInput)
    }

    pub fn length_mismatch(level: Level, declared: usize, actual: usize) -> Self {
        Self::at(level, ErrorKind::LengthMismatch { declared, actual })
    }

    pub fn parse(msg: Option<String>) -> Self {
        Self::new(ErrorKind::ParseError(msg))
    }

    /// Tag the error with `level` unless a deeper level already claimed it.
    #[must_use]
    pub fn or_level(mut self, level: Level) -> Self {
        if self.level.is_none() {
            self.level = Some(level);
        }
        self
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if let Some(level) = self.level {
            write!(f, "{}: ", level)?;
        }
        match &self.kind {
            ErrorKind::TruncatedInput => write!(f, "truncated input"),
            ErrorKind::LengthMismatch { declared, actual } => {
                write!(f, "length mismatch: declared {} actual {}", declared, actual)
            }
            ErrorKind::InvalidIndicator(value) => write!(f, "invalid indicator {}", value),
            ErrorKind::InvalidAttributeFormat => write!(f, "invalid attribute format"),
            ErrorKind::InvalidPayloadLength(length) => {
                write!(f, "invalid payload length {}", length)
            }
            ErrorKind::InvalidPayloadType(code) => write!(f, "invalid payload type {}", code),
            ErrorKind::Oversized { limit, actual } => {
                write!(f, "{} bytes exceeds limit of {}", actual, limit)
            }
            ErrorKind::ParseError(Some(msg)) => write!(f, "parse error: {}", msg),
            ErrorKind::ParseError(None) => write!(f, "parse error"),
        }
    }
}

impl std::error::Error for Error {}

impl<I: InputLength> nom::error::ParseError<I> for Error {
    fn from_error_kind(input: I, kind: NomErrorKind) -> Self {
        match kind {
            NomErrorKind::Eof => Error::new(ErrorKind::TruncatedInput),
            _ => {
                #[cfg(feature = "verbose")]
                return Error::parse(Some(format!(
                    "{:?} with {} bytes remaining",
                    kind,
                    input.input_len()
                )));
                #[cfg(not(feature = "verbose"))]
                {
                    let _ = input;
                    Error::parse(None)
                }
            }
        }
    }

    fn append(_: I, _: NomErrorKind, other: Self) -> Self {
        other
    }
}

impl From<nom::Err<Error>> for Error {
    fn from(nom_err: nom::Err<Error>) -> Self {
        match nom_err {
            nom::Err::Incomplete(_) => Error::new(ErrorKind::TruncatedInput),
            nom::Err::Error(err) | nom::Err::Failure(err) => err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nom::number::complete::be_u16;
    use rstest::rstest;

    #[rstest(input, expected,
        case::empty(b"", Error::new(ErrorKind::TruncatedInput)),
        case::one_byte(b"\x01", Error::new(ErrorKind::TruncatedInput)),
    )]
    fn nom_eof_is_truncation(input: &[u8], expected: Error) {
        let result: nom::IResult<&[u8], u16, Error> = be_u16(input);
        assert_eq!(result.map_err(Error::from), Err(expected));
    }

    #[test]
    fn innermost_level_wins() {
        let err = Error::truncated(Level::Attribute)
            .or_level(Level::Transform)
            .or_level(Level::Proposal);
        assert_eq!(err.level, Some(Level::Attribute));

        let err = Error::new(ErrorKind::TruncatedInput).or_level(Level::Transform);
        assert_eq!(err.level, Some(Level::Transform));
    }

    #[test]
    fn display_names_level() {
        let err = Error::at(Level::Proposal, ErrorKind::InvalidIndicator(7));
        assert_eq!(err.to_string(), "proposal: invalid indicator 7");

        let err = Error::at(Level::Payload, ErrorKind::InvalidPayloadType(41));
        assert_eq!(err.to_string(), "payload: invalid payload type 41");
    }
}
