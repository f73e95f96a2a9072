//! Terminal setup and teardown, and the event source for the main loop.

use anyhow::{Context, Result};
use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyEvent, KeyEventKind,
        MouseEvent,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stderr};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

pub type Tui = Terminal<CrosstermBackend<Stderr>>;

/// The loop only collects a finished request when an event arrives, so this
/// also bounds how long a response waits before it is shown.
pub const TICK_RATE: Duration = Duration::from_millis(300);

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    /// Advances the "Analyzing" dots and polls the in-flight request
    Tick,
}

pub struct EventHandler {
    events: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    pub fn new() -> Self {
        Self::with_tick_rate(TICK_RATE)
    }

    pub fn with_tick_rate(tick_rate: Duration) -> Self {
        let (tx, events) = mpsc::unbounded_channel();
        tokio::spawn(forward_terminal_events(tx.clone()));
        tokio::spawn(send_ticks(tx, tick_rate));
        Self { events }
    }

    pub async fn next(&mut self) -> Option<AppEvent> {
        self.events.recv().await
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

async fn forward_terminal_events(tx: mpsc::UnboundedSender<AppEvent>) {
    let mut reader = EventStream::new();
    while let Some(event) = reader.next().await {
        let Some(event) = event.ok().and_then(to_app_event) else {
            continue;
        };
        if tx.send(event).is_err() {
            break;
        }
    }
}

async fn send_ticks(tx: mpsc::UnboundedSender<AppEvent>, tick_rate: Duration) {
    let mut interval = tokio::time::interval(tick_rate);
    // A slow draw should not be followed by a burst of polls
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        interval.tick().await;
        if tx.send(AppEvent::Tick).is_err() {
            break;
        }
    }
}

fn to_app_event(event: Event) -> Option<AppEvent> {
    match event {
        // Presses only; some terminals also report releases
        Event::Key(key) if key.kind == KeyEventKind::Press => Some(AppEvent::Key(key)),
        Event::Mouse(mouse) => Some(AppEvent::Mouse(mouse)),
        Event::Resize(w, h) => Some(AppEvent::Resize(w, h)),
        _ => None,
    }
}

pub fn init() -> Result<Tui> {
    enable_raw_mode().context("Could not enable raw mode")?;
    let terminal = execute!(io::stderr(), EnterAlternateScreen, EnableMouseCapture)
        .map_err(anyhow::Error::from)
        .and_then(|()| Ok(Terminal::new(CrosstermBackend::new(io::stderr()))?));
    if terminal.is_err() {
        // Raw mode is already on; hand the shell back before bailing
        let _ = restore();
    }
    terminal.context("Could not set up the terminal")
}

pub fn restore() -> Result<()> {
    execute!(io::stderr(), DisableMouseCapture, LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}

/// Runs `teardown` and returns the loop's outcome. A loop error is reported
/// ahead of a teardown error.
pub fn finish<T>(result: Result<T>, teardown: impl FnOnce() -> Result<()>) -> Result<T> {
    let restored = teardown();
    let value = result?;
    restored?;
    Ok(value)
}

/// Install panic hook to restore terminal on panic
pub fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore();
        previous(panic_info);
    }));
}
