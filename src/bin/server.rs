use clap::Parser;
use pcid::config::Config;
use pcid::{server, Error};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    let config = Config::parse();

    server::run(config).await
}
