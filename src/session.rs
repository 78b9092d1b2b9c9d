use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;
use tracing::{debug, error, warn};

use crate::backend::Backend;
use crate::codec::{CodecError, MessageCodec};
use crate::commands;
use crate::config::Config;
use crate::document::Document;
use crate::framer::{self, TERMINATOR};
use crate::reply::Reply;

pub const UNKNOWN_ID: i64 = 0;

pub fn handle_message(message: &[u8], backend: &dyn Backend) -> Reply {
    let document = match Document::parse(message) {
        Ok(document) => document,
        Err(err) => {
            warn!(error = %err, len = message.len(), "failed to parse message");
            return Reply::error(UNKNOWN_ID);
        }
    };

    let (id, command) = match commands::dispatch(&document) {
        Ok(request) => request,
        Err(err) => {
            let id = commands::request_id(&document).unwrap_or(UNKNOWN_ID);
            warn!(id, error = %err, "rejected request");
            return Reply::error(id);
        }
    };

    debug!(id, command = %command.name(), "executing command");
    let reply = Reply::new(id, command.execute(backend));
    debug!(id, error = reply.is_error(), "command done");

    reply
}

/// Serves requests one at a time until the peer closes `stream`.
pub async fn run<T, B>(stream: T, backend: &B, config: &Config) -> Result<(), CodecError>
where
    T: AsyncRead + AsyncWrite + Unpin,
    B: Backend,
{
    let codec = MessageCodec::new(config.max_message_size);
    let mut framed = Framed::with_capacity(stream, codec, config.max_message_size);

    while let Some(message) = framed.next().await {
        let message = match message {
            Ok(message) => message,
            Err(err) => {
                error!(error = %err, "closing connection");
                let _ = SinkExt::<Reply>::flush(&mut framed).await;
                return Err(err);
            }
        };

        debug!(len = message.len(), "received message");
        let reply = handle_message(&message, backend);
        framed.feed(reply).await?;

        let drained = framer::find(framed.read_buffer(), TERMINATOR).is_none();
        if drained || framed.write_buffer().len() >= config.max_outbound {
            SinkExt::<Reply>::flush(&mut framed).await?;
        }
    }

    debug!("peer closed the stream");
    if let Err(err) = SinkExt::<Reply>::flush(&mut framed).await {
        warn!(error = %err, "failed to flush pending replies");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::FakeBackend;

    #[test]
    fn empty_message_is_an_error() {
        assert_eq!(
            handle_message(b"", &FakeBackend::default()).to_string(),
            r#"{"error":[],"id":0}"#
        );
    }

    #[test]
    fn malformed_message_is_an_error() {
        assert_eq!(
            handle_message(br#"{"execute":"list","id":4"#, &FakeBackend::default()),
            Reply::error(UNKNOWN_ID)
        );
    }

    #[test]
    fn unknown_command_keeps_the_id() {
        assert_eq!(
            handle_message(br#"{"execute":"frobnicate","id":7}"#, &FakeBackend::default())
                .to_string(),
            r#"{"error":[],"id":7}"#
        );
    }

    #[test]
    fn list_replies_with_entries() {
        let backend = FakeBackend::default()
            .with_dir("/sys/bus/pci/devices", &["0000:00:01.0", "0000:00:02.0"]);

        let reply = handle_message(
            br#"{"execute":"list","arguments":{"dir_id":"pci_dev"},"id":2}"#,
            &backend,
        );

        assert_eq!(
            reply.to_string(),
            r#"{"return":["0000:00:01.0","0000:00:02.0"],"id":2}"#
        );
    }

    #[test]
    fn list_without_directory_is_an_error() {
        let reply = handle_message(
            br#"{"execute":"list","arguments":{"dir_id":"pciback_driver"},"id":3}"#,
            &FakeBackend::default(),
        );

        assert_eq!(reply.to_string(), r#"{"error":[],"id":3}"#);
    }

    #[test]
    fn read_hex_replies_with_integer() {
        let backend = FakeBackend::default()
            .with_file("/sys/bus/pci/devices/0000:00:01.0/vendor", "0x8086\n");

        let reply = handle_message(
            br#"{"execute":"read_hex","arguments":{"dir_id":"pci_dev","pci_info":"/0000:00:01.0/vendor"},"id":9}"#,
            &backend,
        );

        assert_eq!(reply.to_string(), r#"{"return":32902,"id":9}"#);
    }

    #[test]
    fn exists_reports_absence() {
        let reply = handle_message(
            br#"{"execute":"exists","arguments":{"dir_id":"pciback_driver","pci_info":"/0000:00:01.0"},"id":5}"#,
            &FakeBackend::default(),
        );

        assert_eq!(reply.to_string(), r#"{"return":"nolstat","id":5}"#);
    }
}
