/// Represents the basic elements of a protocol
pub trait Protocol {
    /// Type of message returned when parsing and accepted when encoding
    type Message;

    /// Protocol name string
    fn name() -> &'static str;
}
