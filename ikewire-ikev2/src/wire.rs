//! Cursor and length-patching helpers shared by every nesting level.

use ikewire::error::{Error, ErrorKind, Level, Result};

use byteorder::{BigEndian, ByteOrder};

pub(crate) type IResult<'a, O> = nom::IResult<&'a [u8], O, Error>;

/// Tag any untagged error raised below this point with `level`.
pub(crate) fn at(level: Level) -> impl Fn(nom::Err<Error>) -> nom::Err<Error> {
    move |err| err.map(|e| e.or_level(level))
}

/// Structural failures are never recoverable, so they are raised as
/// `Failure` to stop any enclosing nom combinator from backtracking.
pub(crate) fn fail(err: Error) -> nom::Err<Error> {
    nom::Err::Failure(err)
}

/// Split off exactly `len` bytes, failing at `level` if the parent span is
/// shorter.
pub(crate) fn take_span(input: &[u8], len: usize, level: Level) -> IResult<'_, &[u8]> {
    if len > input.len() {
        return Err(fail(Error::truncated(level)));
    }
    let (span, rest) = input.split_at(len);
    Ok((rest, span))
}

/// Bytes of `span` a parser used, given the `rest` it left over.
pub(crate) fn consumed(span: &[u8], rest: &[u8]) -> usize {
    span.len().saturating_sub(rest.len())
}

pub(crate) fn count_u8(count: usize, level: Level) -> Result<u8> {
    u8::try_from(count).map_err(|_| {
        Error::at(
            level,
            ErrorKind::Oversized {
                limit: usize::from(u8::MAX),
                actual: count,
            },
        )
    })
}

pub(crate) fn length_u16(length: usize, level: Level) -> Result<u16> {
    u16::try_from(length).map_err(|_| {
        Error::at(
            level,
            ErrorKind::Oversized {
                limit: usize::from(u16::MAX),
                actual: length,
            },
        )
    })
}

/// Backpatch the 16-bit length field at `start + offset` with the number of
/// bytes written since `start`.
pub(crate) fn patch_u16(buf: &mut [u8], start: usize, offset: usize, level: Level) -> Result<()> {
    let length = length_u16(buf.len().saturating_sub(start), level)?;
    let field = start.saturating_add(offset);
    BigEndian::write_u16(&mut buf[field..field.saturating_add(2)], length);
    Ok(())
}

/// Backpatch the 32-bit length field at `start + offset` with the number of
/// bytes written since `start`.
pub(crate) fn patch_u32(buf: &mut [u8], start: usize, offset: usize, level: Level) -> Result<()> {
    let written = buf.len().saturating_sub(start);
    let length = u32::try_from(written).map_err(|_| {
        Error::at(
            level,
            ErrorKind::Oversized {
                limit: u32::MAX as usize,
                actual: written,
            },
        )
    })?;
    let field = start.saturating_add(offset);
    BigEndian::write_u32(&mut buf[field..field.saturating_add(4)], length);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patches_length_since_start() {
        let mut buf = vec![0xaa, 0x00, 0x00, 0x00, 0x00, 0x01, 0x02];
        patch_u16(&mut buf, 1, 2, Level::Payload).unwrap();
        assert_eq!(buf, vec![0xaa, 0x00, 0x00, 0x00, 0x06, 0x01, 0x02]);
    }

    #[test]
    fn oversized_length_is_rejected() {
        let mut buf = vec![0u8; 0x1_0000];
        assert_eq!(
            patch_u16(&mut buf, 0, 0, Level::Proposal),
            Err(Error::at(
                Level::Proposal,
                ErrorKind::Oversized {
                    limit: 65535,
                    actual: 65536
                }
            ))
        );
    }

    #[test]
    fn consumed_counts_used_prefix() {
        let span = [1u8, 2, 3, 4];
        assert_eq!(consumed(&span, &span[3..]), 3);
        assert_eq!(consumed(&span, &span[4..]), 4);
        // a rest longer than the span never underflows
        assert_eq!(consumed(&span[..1], &span), 0);
    }

    #[test]
    fn take_span_is_bounded() {
        assert_eq!(
            take_span(&[1, 2, 3], 4, Level::Transform),
            Err(fail(Error::truncated(Level::Transform)))
        );
        assert_eq!(
            take_span(&[1, 2, 3], 2, Level::Transform),
            Ok((&[3u8][..], &[1u8, 2][..]))
        );
    }
}
