use bytes::{Bytes, BytesMut};
use std::io;
use thiserror::Error as ThisError;
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, warn};

use crate::framer::{self, Extracted, TERMINATOR};
use crate::reply::Reply;

#[derive(Debug, ThisError)]
pub enum CodecError {
    #[error("transport error: {0}")]
    Io(#[from] io::Error),
    /// The receive buffer filled up without a terminator in sight.
    #[error("no message terminator within {max} buffered bytes")]
    CapacityExceeded { max: usize },
}

/// Splits the inbound byte stream into CRLF-terminated message payloads and writes replies with
/// their terminator.
///
/// Decoding only frames; payloads are handed out unparsed so that a malformed message turns into
/// an error reply instead of ending the stream.
#[derive(Debug, Clone)]
pub struct MessageCodec {
    max_message_size: usize,
}

impl MessageCodec {
    pub fn new(max_message_size: usize) -> Self {
        Self { max_message_size }
    }
}

impl Decoder for MessageCodec {
    type Item = Bytes;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match framer::extract(src, TERMINATOR) {
            Extracted::Found { consumed_len, .. } if consumed_len > self.max_message_size => {
                Err(CodecError::CapacityExceeded {
                    max: self.max_message_size,
                })
            }
            Extracted::Found {
                payload,
                consumed_len,
            } => {
                debug!(consumed_len, remaining = src.len(), "extracted message");
                Ok(Some(payload))
            }
            Extracted::NeedMoreData if src.len() >= self.max_message_size => {
                Err(CodecError::CapacityExceeded {
                    max: self.max_message_size,
                })
            }
            Extracted::NeedMoreData => {
                // Never ask the transport for more than the remaining capacity.
                src.reserve(self.max_message_size - src.len());
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(message) => Ok(Some(message)),
            None => {
                if !src.is_empty() {
                    warn!(len = src.len(), "discarding unterminated message at end of stream");
                    src.clear();
                }
                Ok(None)
            }
        }
    }
}

impl Encoder<Reply> for MessageCodec {
    type Error = CodecError;

    fn encode(&mut self, reply: Reply, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let text = reply.to_string();
        dst.reserve(text.len() + TERMINATOR.len());
        dst.extend_from_slice(text.as_bytes());
        dst.extend_from_slice(TERMINATOR);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::Outcome;

    #[test]
    fn decode_yields_payloads_one_at_a_time() {
        let mut codec = MessageCodec::new(64);
        let mut src = BytesMut::from(&b"{\"id\":1}\r\n{\"id\":2}\r\n{\"id\""[..]);

        assert_eq!(
            codec.decode(&mut src).unwrap(),
            Some(Bytes::from("{\"id\":1}"))
        );
        assert_eq!(
            codec.decode(&mut src).unwrap(),
            Some(Bytes::from("{\"id\":2}"))
        );
        assert_eq!(codec.decode(&mut src).unwrap(), None);
        assert_eq!(&src[..], b"{\"id\"");
    }

    #[test]
    fn decode_rejects_unterminated_overflow() {
        let mut codec = MessageCodec::new(8);
        let mut src = BytesMut::from(&b"0123456789"[..]);

        assert!(matches!(
            codec.decode(&mut src),
            Err(CodecError::CapacityExceeded { max: 8 })
        ));
    }

    #[test]
    fn decode_serves_complete_message_in_full_buffer() {
        let mut codec = MessageCodec::new(8);
        let mut src = BytesMut::from(&b"012345\r\n"[..]);

        assert_eq!(codec.decode(&mut src).unwrap(), Some(Bytes::from("012345")));
    }

    #[test]
    fn decode_rejects_oversized_terminated_message() {
        let mut codec = MessageCodec::new(8);
        let mut src = BytesMut::from(&b"0123456789\r\n"[..]);

        assert!(matches!(
            codec.decode(&mut src),
            Err(CodecError::CapacityExceeded { max: 8 })
        ));
    }

    #[test]
    fn decode_eof_discards_partial_message() {
        let mut codec = MessageCodec::new(64);
        let mut src = BytesMut::from(&b"{\"id\":1}\r\n{\"exec"[..]);

        assert_eq!(
            codec.decode_eof(&mut src).unwrap(),
            Some(Bytes::from("{\"id\":1}"))
        );
        assert_eq!(codec.decode_eof(&mut src).unwrap(), None);
        assert!(src.is_empty());
    }

    #[test]
    fn encode_appends_terminator() {
        let mut codec = MessageCodec::new(64);
        let mut dst = BytesMut::new();

        codec
            .encode(Reply::new(9, Outcome::Integer(32902)), &mut dst)
            .unwrap();

        assert_eq!(&dst[..], b"{\"return\":32902,\"id\":9}\r\n");
    }
}
