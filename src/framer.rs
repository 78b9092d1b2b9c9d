use bytes::{Bytes, BytesMut};

pub const TERMINATOR: &[u8; 2] = b"\r\n";

#[derive(Debug, PartialEq)]
pub enum Extracted {
    Found { payload: Bytes, consumed_len: usize },
    NeedMoreData,
}

pub fn find(buffer: &[u8], terminator: &[u8]) -> Option<usize> {
    if terminator.is_empty() {
        return None;
    }
    buffer
        .windows(terminator.len())
        .position(|window| window == terminator)
}

/// Extracts one message from the front of `buffer`. Empty payloads are returned as is.
pub fn extract(buffer: &mut BytesMut, terminator: &[u8]) -> Extracted {
    let Some(offset) = find(buffer, terminator) else {
        return Extracted::NeedMoreData;
    };

    let consumed_len = offset + terminator.len();
    let mut message = buffer.split_to(consumed_len);
    message.truncate(offset);

    Extracted::Found {
        payload: message.freeze(),
        consumed_len,
    }
}
