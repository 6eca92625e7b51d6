use std::io::{self, Read};

/// An unsigned LEB128 value fits in 10 bytes.
const MAX_VARINT_LEN: usize = 10;

/// Reads an unsigned LEB128 varint.
///
/// Returns `Ok(None)` when the input ends before the first byte, and an
/// `UnexpectedEof` error when it ends in the middle of a varint.
pub fn read_uvarint<R: Read>(reader: &mut R) -> io::Result<Option<u64>> {
    let mut result: u64 = 0;
    let mut byte = [0u8; 1];

    for i in 0..MAX_VARINT_LEN {
        // read_exact retries on Interrupted
        match reader.read_exact(&mut byte) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof && i == 0 => return Ok(None),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "truncated varint",
                ))
            }
            Err(e) => return Err(e),
        }
        let b = byte[0];
        if i == MAX_VARINT_LEN - 1 && b > 0x01 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "varint overflows 64 bits",
            ));
        }
        result |= ((b & 0x7F) as u64) << (7 * i);
        if b & 0x80 == 0 {
            return Ok(Some(result));
        }
    }

    Err(io::Error::new(
        io::ErrorKind::InvalidData,
        "varint longer than 10 bytes",
    ))
}

/// Appends `value` as an unsigned LEB128 varint.
pub fn write_uvarint(
    buf: &mut Vec<u8>,
    mut value: u64,
) {
    while value >= 0x80 {
        buf.push((value as u8 & 0x7F) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}
