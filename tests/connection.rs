use std::fs;

use pcid::backend::Sysfs;
use pcid::codec::CodecError;
use pcid::config::Config;
use pcid::session;
use tempfile::TempDir;
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};

fn sysfs_tree() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let device = dir.path().join("devices/0000:00:01.0");
    fs::create_dir_all(&device).unwrap();
    fs::create_dir_all(dir.path().join("devices/0000:00:02.0")).unwrap();
    fs::write(device.join("vendor"), "0x8086\n").unwrap();
    dir
}

/// Feeds `chunks` to a session one write at a time, closes the client side and returns whatever
/// the session replied along with how it ended.
async fn exchange(
    chunks: &[&[u8]],
    sysfs: &Sysfs,
    config: &Config,
) -> (Result<(), CodecError>, String) {
    let (mut client, server) = duplex(64 * 1024);

    let client_side = async move {
        for chunk in chunks {
            // The session may hang up first, e.g. on an oversized message.
            if client.write_all(chunk).await.is_err() {
                break;
            }
        }
        let _ = client.shutdown().await;

        let mut replies = Vec::new();
        client.read_to_end(&mut replies).await.unwrap();
        String::from_utf8(replies).unwrap()
    };

    tokio::join!(session::run(server, sysfs, config), client_side)
}

#[tokio::test]
async fn test_single_request() {
    let tree = sysfs_tree();
    let sysfs = Sysfs::new(tree.path());

    let (result, replies) = exchange(
        &[b"{\"execute\":\"read_hex\",\"arguments\":{\"dir_id\":\"pci_dev\",\"pci_info\":\"/0000:00:01.0/vendor\"},\"id\":1}\r\n"],
        &sysfs,
        &Config::default(),
    )
    .await;

    assert!(result.is_ok());
    assert_eq!(replies, "{\"return\":32902,\"id\":1}\r\n");
}

#[tokio::test]
async fn test_fragmented_request() {
    let tree = sysfs_tree();
    let sysfs = Sysfs::new(tree.path());

    let (result, replies) = exchange(
        &[
            b"{\"execute\":\"exi",
            b"sts\",\"arguments\":{\"dir_id\":\"pci_dev\",",
            b"\"pci_info\":\"/0000:00:09.0\"},\"id\":2}\r",
            b"\n",
        ],
        &sysfs,
        &Config::default(),
    )
    .await;

    assert!(result.is_ok());
    assert_eq!(replies, "{\"return\":\"nolstat\",\"id\":2}\r\n");
}

#[tokio::test]
async fn test_queued_requests_are_served_in_order() {
    let tree = sysfs_tree();
    let sysfs = Sysfs::new(tree.path());

    let (result, replies) = exchange(
        &[b"{\"execute\":\"frobnicate\",\"id\":7}\r\n\r\n{\"execute\":\"read_hex\",\"arguments\":{\"dir_id\":\"pci_dev\",\"pci_info\":\"/0000:00:01.0/vendor\"},\"id\":8}\r\n"],
        &sysfs,
        &Config::default(),
    )
    .await;

    assert!(result.is_ok());
    assert_eq!(
        replies,
        "{\"error\":[],\"id\":7}\r\n{\"error\":[],\"id\":0}\r\n{\"return\":32902,\"id\":8}\r\n"
    );
}

#[tokio::test]
async fn test_empty_message() {
    let tree = sysfs_tree();
    let sysfs = Sysfs::new(tree.path());

    let (result, replies) = exchange(&[b"\r\n"], &sysfs, &Config::default()).await;

    assert!(result.is_ok());
    assert_eq!(replies, "{\"error\":[],\"id\":0}\r\n");
}

#[tokio::test]
async fn test_trailing_partial_message_is_dropped() {
    let tree = sysfs_tree();
    let sysfs = Sysfs::new(tree.path());

    let (result, replies) = exchange(
        &[b"{\"execute\":\"frobnicate\",\"id\":3}\r\n{\"execute\":\"li"],
        &sysfs,
        &Config::default(),
    )
    .await;

    assert!(result.is_ok());
    assert_eq!(replies, "{\"error\":[],\"id\":3}\r\n");
}

#[tokio::test]
async fn test_list_devices() {
    let tree = sysfs_tree();
    let sysfs = Sysfs::new(tree.path());

    let (result, replies) = exchange(
        &[b"{\"execute\":\"list\",\"arguments\":{\"dir_id\":\"pci_dev\"},\"id\":4}\r\n"],
        &sysfs,
        &Config::default(),
    )
    .await;

    assert!(result.is_ok());
    // Directory enumeration order is up to the filesystem.
    let first = "{\"return\":[\"0000:00:01.0\",\"0000:00:02.0\"],\"id\":4}\r\n";
    let second = "{\"return\":[\"0000:00:02.0\",\"0000:00:01.0\"],\"id\":4}\r\n";
    assert!(replies == first || replies == second, "{replies}");
}

#[tokio::test]
async fn test_oversized_message_ends_session() {
    let tree = sysfs_tree();
    let sysfs = Sysfs::new(tree.path());
    let config = Config {
        max_message_size: 64,
        ..Config::default()
    };
    let oversized = vec![b'x'; 200];

    let (result, replies) = exchange(
        &[b"{\"execute\":\"frobnicate\",\"id\":1}\r\n", oversized.as_slice()],
        &sysfs,
        &config,
    )
    .await;

    assert!(matches!(
        result,
        Err(CodecError::CapacityExceeded { max: 64 })
    ));
    assert_eq!(replies, "{\"error\":[],\"id\":1}\r\n");
}

#[tokio::test]
async fn test_small_outbound_bound_still_delivers_every_reply() {
    let tree = sysfs_tree();
    let sysfs = Sysfs::new(tree.path());
    let config = Config {
        max_outbound: 1,
        ..Config::default()
    };
    let requests: Vec<u8> = (0..20)
        .flat_map(|id| format!("{{\"execute\":\"frobnicate\",\"id\":{id}}}\r\n").into_bytes())
        .collect();

    let (result, replies) = exchange(&[requests.as_slice()], &sysfs, &config).await;

    assert!(result.is_ok());
    let expected: String = (0..20)
        .map(|id| format!("{{\"error\":[],\"id\":{id}}}\r\n"))
        .collect();
    assert_eq!(replies, expected);
}
