use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind, MouseEvent};
use tokio::sync::mpsc;

use crate::error::Result;
use crate::sync::{Outcome, WriteStatus};
use crate::tree::Snapshot;

/// A settled call to the document store, delivered back to the UI loop.
///
/// Each variant names the path the call was issued for; by the time it
/// arrives the tree may have changed, so handlers re-resolve by path.
#[derive(Debug)]
pub enum SyncEvent {
    TreeLoaded(Outcome<Option<Snapshot>>),
    FileLoaded {
        path: String,
        result: Outcome<String>,
    },
    FileWritten {
        path: String,
        result: Outcome<WriteStatus>,
    },
    Renamed {
        path: String,
        result: Outcome<Snapshot>,
    },
    Deleted {
        path: String,
        result: Outcome<()>,
    },
}

/// Application events.
#[derive(Debug)]
pub enum Event {
    /// A key press event.
    Key(KeyEvent),
    /// A mouse event.
    Mouse(MouseEvent),
    /// A periodic tick for rendering.
    Tick,
    /// Terminal resize event.
    Resize(u16, u16),
    /// A sync call finished.
    Sync(SyncEvent),
}

/// Async event handler that polls crossterm events and forwards them via a channel.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    tx: mpsc::UnboundedSender<Event>,
}

impl EventHandler {
    /// Create a new EventHandler with the given tick rate.
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let event_tx = tx.clone();

        // crossterm's poll blocks, so it gets a blocking thread of its own.
        tokio::task::spawn_blocking(move || loop {
            let next = if event::poll(tick_rate).unwrap_or(false) {
                match event::read() {
                    Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                        Event::Key(key)
                    }
                    Ok(CrosstermEvent::Mouse(mouse)) => Event::Mouse(mouse),
                    Ok(CrosstermEvent::Resize(w, h)) => Event::Resize(w, h),
                    _ => continue,
                }
            } else {
                Event::Tick
            };
            if event_tx.send(next).is_err() {
                break;
            }
        });

        Self { rx, tx }
    }

    /// Get a sender clone for sync tasks to report completion.
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.tx.clone()
    }

    /// Receive the next event (blocks until available).
    pub async fn next(&mut self) -> Result<Event> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| crate::error::AppError::Terminal("Event channel closed".into()))
    }
}
