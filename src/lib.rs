/*!
# ikewire: byte-exact IKE wire codecs

This library contains encoders and decoders for the IKE family of key
exchange protocols, intended for IPsec implementations and for network
sensors that need to inspect or rewrite handshakes.

The base library contains the common error type and the traits shared by
the protocol crates. Each protocol is implemented in a separate package
inside this workspace:
- [IKEv2](/ikewire-ikev2)

Decoders treat their input as hostile: every length field is bounded by
the span its parent allotted, and failures are reported as a typed
[`error::Error`] naming the nesting level at fault rather than a panic.
*/

/// Return common errors
pub mod error;

/// Parse Messages
pub mod parser;

/// Encode Messages
pub mod encoder;

/// Probe Bytes
pub mod probe;

/// Describe a Protocol
pub mod protocol;
