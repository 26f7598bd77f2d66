use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};

/// Tick period of the input thread; question timers are checked this often.
pub const TICK_RATE: Duration = Duration::from_millis(100);

pub enum AppEvent {
    Key(KeyEvent),
    /// No input arrived within one tick period.
    Tick(Instant),
    Resize,
}

/// Reads terminal input on a background thread and forwards it, with a tick
/// whenever the terminal stays quiet.
pub struct EventHandler {
    rx: mpsc::Receiver<AppEvent>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            loop {
                let event = match event::poll(tick_rate) {
                    Ok(true) => match event::read() {
                        Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => {
                            AppEvent::Key(key)
                        }
                        Ok(Event::Resize(_, _)) => AppEvent::Resize,
                        _ => continue,
                    },
                    Ok(false) => AppEvent::Tick(Instant::now()),
                    Err(_) => return,
                };
                if tx.send(event).is_err() {
                    return;
                }
            }
        });

        Self { rx }
    }

    pub fn next(&self) -> anyhow::Result<AppEvent> {
        Ok(self.rx.recv()?)
    }
}
