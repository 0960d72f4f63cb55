use crate::error::Result;
use crate::protocol::Protocol;

pub trait Parse: Protocol {
    /// Parse one complete message from the front of `input`.
    ///
    /// Returns the bytes left over after the message and the parsed message.
    /// Malformed input is reported as an error; no partial message is ever
    /// returned.
    fn parse<'a>(&self, input: &'a [u8]) -> Result<(&'a [u8], Self::Message)>;
}
