use clap::builder::RangedU64ValueParser;
use clap::Parser;
use std::path::PathBuf;

use crate::framer::TERMINATOR;

pub const PORT: u16 = 7000;
pub const SYSFS_ROOT: &str = "/sys/bus/pci";
pub const MAX_MESSAGE_SIZE: usize = 5000;
pub const MAX_OUTBOUND: usize = 5000;

// Room for the terminator and at least one payload byte.
const MIN_MESSAGE_SIZE: u64 = TERMINATOR.len() as u64 + 1;

#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "pcid", version, about = "PCI passthrough helper daemon")]
pub struct Config {
    /// The TCP port to listen on, on the loopback interface
    #[arg(short, long, env = "PCID_PORT", default_value_t = PORT)]
    pub port: u16,

    /// Listen on this Unix domain socket instead of TCP
    #[arg(long, env = "PCID_SOCKET")]
    pub socket: Option<PathBuf>,

    /// Directory holding the PCI bus `devices` and `drivers` trees
    #[arg(long, env = "PCID_SYSFS_ROOT", default_value = SYSFS_ROOT)]
    pub sysfs_root: PathBuf,

    /// Largest request, terminator included, the daemon buffers before giving up on a connection
    #[arg(
        long,
        env = "PCID_MAX_MESSAGE_SIZE",
        default_value_t = MAX_MESSAGE_SIZE,
        value_parser = RangedU64ValueParser::<usize>::new().range(MIN_MESSAGE_SIZE..)
    )]
    pub max_message_size: usize,

    /// Pending reply bytes after which input is paused until they are written out
    #[arg(long, env = "PCID_MAX_OUTBOUND", default_value_t = MAX_OUTBOUND)]
    pub max_outbound: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: PORT,
            socket: None,
            sysfs_root: PathBuf::from(SYSFS_ROOT),
            max_message_size: MAX_MESSAGE_SIZE,
            max_outbound: MAX_OUTBOUND,
        }
    }
}
