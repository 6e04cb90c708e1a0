pub mod autoplay;
pub mod config;
pub mod console;
pub mod driver;
pub mod link;
pub mod socket;

use crate::libpeer::{config::PeerArgs, driver::RoundDriver, link::PeerSlot};
use crate::libround::engine::Input;
use std::future::Future;
use tokio::sync::mpsc::UnboundedSender;

/// Starts the round driver, the terminal and the given connection session, and runs until the
/// session ends or the player quits.
pub async fn play<F, Fut>(args: &PeerArgs, connect: F) -> anyhow::Result<()>
where
    F: FnOnce(PeerSlot, UnboundedSender<Input>) -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let timing = args.timing()?;
    let slot = PeerSlot::new();
    let (driver, handle) = RoundDriver::new(timing, slot.clone());
    tokio::spawn(driver.run());
    tokio::spawn(console::render_updates(handle.view()));

    let session = connect(slot, handle.events());
    if args.auto {
        tokio::spawn(autoplay::autoplay(handle.events(), handle.view()));
        tokio::select! {
            result = session => result,
            result = tokio::signal::ctrl_c() => Ok(result?),
        }
    } else {
        tokio::select! {
            result = session => result,
            () = console::read_commands(handle.events()) => Ok(()),
        }
    }
}
