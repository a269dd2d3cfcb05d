use std::time::Duration;

use crossterm::event::{self, Event as TermEvent, KeyEvent, MouseEvent};
use tokio::sync::mpsc;

use crate::error::{AppError, Result};
use crate::fs::engine::FetchOutcome;

/// Everything the main loop reacts to.
#[derive(Debug)]
pub enum Event {
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// Redraw heartbeat, emitted when the terminal stays quiet for one tick
    /// interval.
    Tick,
    Resize(u16, u16),
    /// A background fetch finished and wants to merge.
    Fetch(FetchOutcome),
}

/// Multiplexes terminal input and fetch completions into one stream.
///
/// A blocking task polls crossterm; fetch tasks clone the sender and push
/// their outcomes into the same channel, so the main loop is the single
/// consumer of every event source.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    tx: mpsc::UnboundedSender<Event>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let input_tx = tx.clone();
        tokio::task::spawn_blocking(move || poll_input(input_tx, tick_rate));
        Self { rx, tx }
    }

    /// Sender for fetch tasks to report their completions.
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.tx.clone()
    }

    /// Next event; fails only when every sender is gone.
    pub async fn next(&mut self) -> Result<Event> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| AppError::Terminal("event channel closed".into()))
    }
}

/// Blocking crossterm poll loop. Ends when the receiver is dropped.
fn poll_input(tx: mpsc::UnboundedSender<Event>, tick_rate: Duration) {
    loop {
        let event = if event::poll(tick_rate).unwrap_or(false) {
            match event::read() {
                Ok(TermEvent::Key(key)) => Event::Key(key),
                Ok(TermEvent::Mouse(mouse)) => Event::Mouse(mouse),
                Ok(TermEvent::Resize(width, height)) => Event::Resize(width, height),
                _ => continue,
            }
        } else {
            Event::Tick
        };
        if tx.send(event).is_err() {
            break;
        }
    }
}
