use crate::error::{Error, ErrorKind};
use crate::parser::Parse;

/// Result of probing the underlying bytes.
#[derive(Debug, PartialEq, Eq)]
pub enum Status {
    /// Data matches this protocol
    Recognized,
    /// Data does not match this protocol
    Unrecognized,
    /// More data is needed to make a decision
    Incomplete,
}

pub trait Probe: Parse {
    /// Probes the input to recognize if the underlying bytes likely match this
    /// protocol.
    ///
    /// The default implementation attempts a full parse and treats any
    /// truncation as a request for more data. Protocols that can tell a short
    /// read from a corrupt one should override it.
    fn probe(&self, input: &[u8]) -> Status {
        match self.parse(input) {
            Ok(_) => Status::Recognized,
            Err(Error {
                kind: ErrorKind::TruncatedInput,
                ..
            }) => Status::Incomplete,
            Err(_) => Status::Unrecognized,
        }
    }
}
