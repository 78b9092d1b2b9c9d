use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::backend::Sysfs;
use crate::codec::CodecError;
use crate::config::Config;
use crate::session;
use crate::Error;

/// Accepts connections and serves them one after the other.
///
/// Only one client is expected at a time, so a connection is served to completion before the
/// next one is accepted. Returns when accepting fails or a connection hits a transport fault.
pub async fn run(config: Config) -> Result<(), Error> {
    let _ = tracing_subscriber::fmt()
        .try_init()
        .map_err(|e| debug!("Failed to initialize global tracing: {}", e));

    let backend = Sysfs::new(&config.sysfs_root);
    info!("Serving PCI sysfs tree at {}", backend.root().display());

    #[cfg(unix)]
    if let Some(path) = &config.socket {
        return run_unix(path, &backend, &config).await;
    }

    let listener = TcpListener::bind(("127.0.0.1", config.port)).await?;
    info!("pcid listening on {}", listener.local_addr()?);

    loop {
        let (socket, client_address) = listener.accept().await?;
        info!("Accepted connection from {:?}", client_address);

        handle_connection(socket, client_address.to_string(), &backend, &config).await?;
    }
}

#[cfg(unix)]
async fn run_unix(path: &std::path::Path, backend: &Sysfs, config: &Config) -> Result<(), Error> {
    use std::os::unix::fs::FileTypeExt;
    use tokio::net::UnixListener;

    // A socket left behind by a previous run would make bind fail.
    if let Ok(metadata) = std::fs::symlink_metadata(path) {
        if metadata.file_type().is_socket() {
            std::fs::remove_file(path)?;
        }
    }

    let listener = UnixListener::bind(path)?;
    info!("pcid listening on {}", path.display());

    loop {
        let (socket, _) = listener.accept().await?;
        info!("Accepted connection on {}", path.display());

        handle_connection(socket, path.display().to_string(), backend, config).await?;
    }
}

#[instrument(
    name = "connection",
    skip(stream, backend, config),
    fields(connection_id, client_address)
)]
async fn handle_connection<T>(
    stream: T,
    client_address: String,
    backend: &Sysfs,
    config: &Config,
) -> Result<(), Error>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    tracing::Span::current()
        .record("connection_id", Uuid::new_v4().to_string())
        .record("client_address", &client_address);

    match session::run(stream, backend, config).await {
        Ok(()) => {
            info!("Connection closed");
            Ok(())
        }
        // The peer misbehaved; the next client may not.
        Err(err @ CodecError::CapacityExceeded { .. }) => {
            error!("Dropped connection: {}", err);
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}
