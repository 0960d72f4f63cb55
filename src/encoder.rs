use crate::error::Result;
use crate::protocol::Protocol;

pub trait Encode: Protocol {
    /// Append the wire representation of `message` to `buf`.
    ///
    /// Every length and count field is computed from the message itself. On
    /// error `buf` may hold a partially written message and should be
    /// discarded.
    fn encode(&self, message: &Self::Message, buf: &mut Vec<u8>) -> Result<()>;

    /// Encode `message` into a freshly allocated buffer.
    fn to_bytes(&self, message: &Self::Message) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.encode(message, &mut buf)?;
        Ok(buf)
    }
}
