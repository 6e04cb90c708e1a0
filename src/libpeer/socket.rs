//! Websocket connection session.
//!
//! Right after the websocket handshake each side sends its display name as a single text frame.
//! Everything after that is round messages, one binary frame each. A peer gets `HELLO_TIMEOUT`
//! to finish the handshake and say hello before it is dropped.

use crate::libpeer::link::PeerSlot;
use crate::libround::{engine::Input, state::PeerState};
use anyhow::{bail, Context};
use futures_channel::mpsc::unbounded;
use futures_util::{future, pin_mut, SinkExt, StreamExt, TryStreamExt};
use log::{info, warn};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::{TcpListener, TcpStream},
    sync::mpsc::UnboundedSender,
    task::JoinHandle,
    time::{self, Duration},
};
use tokio_tungstenite::{accept_async, connect_async, WebSocketStream};
use tungstenite::protocol::Message;

type Events = UnboundedSender<Input>;

pub const HELLO_TIMEOUT: Duration = Duration::from_secs(5);

fn report(events: &Events, peer: PeerState) {
    // The driver only goes away when the program is shutting down.
    let _ = events.send(Input::PeerState(peer));
}

/// Accepts peers on `addr`, one at a time. Connections arriving while a peer is already
/// connected are dropped right away.
pub async fn host(
    addr: String,
    name: String,
    slot: PeerSlot,
    events: Events,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Waiting for a peer on {}", addr);
    accept_peers(listener, name, slot, events, HELLO_TIMEOUT).await
}

async fn accept_peers(
    listener: TcpListener,
    name: String,
    slot: PeerSlot,
    events: Events,
    hello_timeout: Duration,
) -> anyhow::Result<()> {
    let mut current: Option<JoinHandle<()>> = None;
    loop {
        let (stream, peer_addr) = listener.accept().await?;
        if current.as_ref().map_or(false, |task| !task.is_finished()) {
            info!("Turning away {}: a peer is already connected", peer_addr);
            continue;
        }
        info!("Incoming TCP connection from: {}", peer_addr);
        current = Some(tokio::spawn(serve(
            stream,
            name.clone(),
            slot.clone(),
            events.clone(),
            hello_timeout,
        )));
    }
}

async fn serve(
    stream: TcpStream,
    name: String,
    slot: PeerSlot,
    events: Events,
    hello_timeout: Duration,
) {
    report(&events, PeerState::Connecting);
    match time::timeout(hello_timeout, accept_async(stream)).await {
        Ok(Ok(ws)) => {
            if let Err(err) = play_over(ws, &name, &slot, &events, hello_timeout).await {
                warn!("Peer session ended: {:#}", err);
            }
        }
        Ok(Err(err)) => warn!("Error during the websocket handshake: {}", err),
        Err(_) => warn!("Websocket handshake took longer than {:?}", hello_timeout),
    }
    report(&events, PeerState::NotConnected);
}

/// Connects to a hosting peer and plays until the connection ends.
pub async fn join(
    url: url::Url,
    name: String,
    slot: PeerSlot,
    events: Events,
) -> anyhow::Result<()> {
    report(&events, PeerState::Connecting);
    let result = match connect_async(url.clone()).await {
        Ok((ws, _)) => play_over(ws, &name, &slot, &events, HELLO_TIMEOUT).await,
        Err(err) => Err(err).with_context(|| format!("failed to connect to {}", url)),
    };
    report(&events, PeerState::NotConnected);
    result
}

async fn play_over<S>(
    ws: WebSocketStream<S>,
    name: &str,
    slot: &PeerSlot,
    events: &Events,
    hello_timeout: Duration,
) -> anyhow::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (mut outgoing, mut incoming) = ws.split();
    outgoing.send(Message::Text(name.to_string())).await?;

    let peer_name = time::timeout(hello_timeout, read_hello(&mut incoming))
        .await
        .with_context(|| format!("peer did not say hello within {:?}", hello_timeout))??;

    let (tx, rx) = unbounded();
    if !slot.attach(tx.clone()) {
        bail!("{} tried to join, but a peer is already connected", peer_name);
    }
    report(
        events,
        PeerState::Connected {
            name: peer_name.clone(),
        },
    );

    let handle_incoming = incoming.try_for_each(|msg| {
        match msg {
            Message::Binary(payload) => {
                let _ = events.send(Input::Received(payload));
            }
            Message::Text(text) => warn!("Unexpected text from {}: {}", peer_name, text),
            _ => (),
        }
        future::ok(())
    });
    let send_to_peer = rx.map(Ok).forward(outgoing);

    pin_mut!(handle_incoming, send_to_peer);
    future::select(handle_incoming, send_to_peer).await;
    slot.detach(&tx);
    info!("{} disconnected", peer_name);
    Ok(())
}

async fn read_hello<S>(incoming: &mut S) -> anyhow::Result<String>
where
    S: futures_util::Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    loop {
        match incoming.next().await {
            Some(Ok(Message::Text(peer_name))) => return Ok(peer_name),
            Some(Ok(Message::Close(_))) | None => bail!("peer left before saying hello"),
            Some(Ok(_)) => continue,
            Some(Err(err)) => return Err(err.into()),
        }
    }
}
