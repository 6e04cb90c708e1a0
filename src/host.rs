//! hosts a table and accepts one peer at a time
//! both sides then run the same round engine
//! a new peer can join once the previous one leaves

use clap::Parser;
use rpslink::libpeer::{
    config::{init_logging, PeerArgs},
    play, socket,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Host a rock/paper/scissors table", long_about = None)]
struct Args {
    /// Address to accept the peer on.
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: String,

    #[command(flatten)]
    peer: PeerArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Args::parse();
    let (listen, name) = (args.listen, args.peer.name.clone());
    play(&args.peer, move |slot, events| {
        socket::host(listen, name, slot, events)
    })
    .await
}
