//! Remote Tetris display (default binary).
//!
//! Listens for an authority on a WebSocket, mirrors its board in the
//! terminal and sends back one player command per board. Logs go to stderr;
//! redirect it (`2>display.log`) to keep the screen clean.

use std::sync::Arc;

use anyhow::Result;

use remote_tetris::adapter::NetworkBridge;
use remote_tetris::input::InputQueue;
use remote_tetris::term::TerminalSurface;
use remote_tetris::{DisplayConfig, Scheduler};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = DisplayConfig::from_env();
    let queue = Arc::new(InputQueue::with_repeat_capacity(config.repeat_capacity));
    let bridge = NetworkBridge::start(config.server.clone(), Arc::clone(&queue))?;
    log::info!("waiting for an authority on ws://{}", bridge.local_addr());

    let mut term = TerminalSurface::new();
    if let Err(e) = term.enter() {
        let _ = term.exit();
        bridge.shutdown();
        return Err(e);
    }

    let mut scheduler = Scheduler::new(term, bridge, queue, &config);
    let result = scheduler.run();

    // Always try to restore terminal state.
    let (mut term, bridge) = scheduler.into_parts();
    let _ = term.exit();
    bridge.shutdown();
    result
}
