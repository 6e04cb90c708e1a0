//! connects to a hosting peer and plays until either side leaves

use clap::Parser;
use rpslink::libpeer::{
    config::{init_logging, PeerArgs},
    play, socket,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Join a rock/paper/scissors table", long_about = None)]
struct Args {
    /// Websocket address of the hosting peer.
    #[arg(long, default_value = "ws://127.0.0.1:8080/")]
    url: url::Url,

    #[command(flatten)]
    peer: PeerArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Args::parse();
    let (url, name) = (args.url, args.peer.name.clone());
    play(&args.peer, move |slot, events| {
        socket::join(url, name, slot, events)
    })
    .await
}
