//! Asynchronous key listener.
//!
//! A background thread reads discrete key-down/key-up events from the
//! terminal (key release reporting enabled through the keyboard enhancement
//! protocol), translates them into [`KeyCode`]s and sends them over a bounded
//! channel. The main loop owns the key records: each poll ages them and then
//! applies whatever messages arrived since the previous poll.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{
    self, Event, KeyCode as TermKey, KeyEventKind, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::QueueableCommand;
use tracing::{debug, error, info};

use super::keymap;
use super::keys::{KeyCode, KeyStates};
use super::source::KeySource;
use crate::config::ListenerConfig;
use crate::error::{Error, Result};
use crate::ui::backend;

/// One translated key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyMessage {
    pub key: KeyCode,
    pub down: bool,
}

impl KeyMessage {
    pub fn down(key: KeyCode) -> Self {
        Self { key, down: true }
    }

    pub fn up(key: KeyCode) -> Self {
        Self { key, down: false }
    }
}

/// Translate a terminal event. Repeats, modifier changes and keys without a
/// mapping produce nothing.
pub fn message_for(event: &Event) -> Option<KeyMessage> {
    let Event::Key(key) = event else {
        return None;
    };

    let down = match key.kind {
        KeyEventKind::Press => true,
        KeyEventKind::Release => false,
        KeyEventKind::Repeat => return None,
    };

    if let TermKey::Modifier(modifier) = key.code {
        debug!("Modifier change {:?} (down={}) not tracked", modifier, down);
        return None;
    }

    match keymap::translate(key.code) {
        Some(code) => Some(KeyMessage { key: code, down }),
        None => {
            debug!("Dropping unmapped key {:?}", key.code);
            None
        }
    }
}

/// Key source fed by a listener thread
pub struct ListenerSource {
    config: ListenerConfig,
    rx: Option<Receiver<KeyMessage>>,
    /// Running flag shared with the listener thread
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    /// Releases held back one poll so a press in the same drain stays visible
    deferred: Vec<KeyCode>,
    flags_pushed: bool,
}

impl ListenerSource {
    /// Create a source; the thread starts on [`attach`](KeySource::attach).
    pub fn new(config: ListenerConfig) -> Self {
        Self {
            config,
            rx: None,
            running: Arc::new(AtomicBool::new(false)),
            thread: None,
            deferred: Vec::new(),
            flags_pushed: false,
        }
    }

    /// Create a source fed by an existing channel instead of the terminal.
    pub fn from_channel(rx: Receiver<KeyMessage>) -> Self {
        let mut source = Self::new(ListenerConfig::default());
        source.rx = Some(rx);
        source
    }

    fn spawn(&mut self) -> Result<()> {
        self.spawn_with(read_terminal_event)
    }

    /// Start the listener thread on an arbitrary event reader.
    fn spawn_with<F>(&mut self, next_event: F) -> Result<()>
    where
        F: FnMut(Duration) -> io::Result<Option<Event>> + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(self.config.channel_capacity.max(1));
        let interval = Duration::from_millis(self.config.poll_interval_ms.max(1));

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();
        let thread = thread::Builder::new()
            .name("termcanvas-keys".to_string())
            .spawn(move || listen(tx, running, interval, next_event))
            .map_err(|e| Error::Listener(format!("Failed to spawn listener thread: {}", e)))?;

        self.rx = Some(rx);
        self.thread = Some(thread);
        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        // Dropping the receiver unblocks a listener stuck on a full channel.
        self.rx = None;
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Key listener thread panicked");
            }
        }
    }
}

/// Wait up to `interval` for the next terminal event.
fn read_terminal_event(interval: Duration) -> io::Result<Option<Event>> {
    if event::poll(interval)? {
        event::read().map(Some)
    } else {
        Ok(None)
    }
}

fn listen<F>(
    tx: SyncSender<KeyMessage>,
    running: Arc<AtomicBool>,
    interval: Duration,
    mut next_event: F,
) where
    F: FnMut(Duration) -> io::Result<Option<Event>>,
{
    while running.load(Ordering::SeqCst) {
        let event = match next_event(interval) {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(e) => {
                error!("Key listener failed to read: {}", e);
                break;
            }
        };

        if let Some(message) = message_for(&event) {
            if tx.send(message).is_err() {
                break;
            }
        }
    }
    running.store(false, Ordering::SeqCst);
    debug!("Key listener exiting");
}

impl KeySource for ListenerSource {
    fn attach(&mut self, out: &mut dyn Write) -> Result<()> {
        keymap::validate_table()?;

        if !crossterm::terminal::supports_keyboard_enhancement().unwrap_or(false) {
            return Err(Error::Listener(
                "terminal does not report key release events".to_string(),
            ));
        }

        out.queue(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))?;
        out.flush()?;
        self.flags_pushed = true;
        backend::mark_keyboard_flags_pushed(true);

        self.spawn()?;
        info!("Key listener started");
        Ok(())
    }

    fn poll(&mut self, keys: &mut KeyStates) -> Result<()> {
        keys.decay();
        for key in self.deferred.drain(..) {
            keys.release(key);
        }

        let Some(rx) = self.rx.as_ref() else {
            return Err(Error::Listener("key listener is not attached".to_string()));
        };

        loop {
            match rx.try_recv() {
                Ok(KeyMessage { key, down: true }) => keys.press(key),
                Ok(KeyMessage { key, down: false }) => {
                    if keys.is_pressed(key) {
                        self.deferred.push(key);
                    } else {
                        keys.release(key);
                    }
                }
                Err(TryRecvError::Empty) => return Ok(()),
                Err(TryRecvError::Disconnected) => {
                    return Err(Error::Listener("key listener has stopped".to_string()));
                }
            }
        }
    }

    fn detach(&mut self, out: &mut dyn Write) {
        self.stop();

        if std::mem::take(&mut self.flags_pushed) {
            let popped = out
                .queue(PopKeyboardEnhancementFlags)
                .and_then(|out| out.flush());
            if let Err(e) = popped {
                error!("Failed to restore keyboard flags: {}", e);
            }
            backend::mark_keyboard_flags_pushed(false);
        }
        info!("Key listener stopped");
    }

    fn name(&self) -> &'static str {
        "listener"
    }
}

impl Drop for ListenerSource {
    fn drop(&mut self) {
        self.stop();
    }
}
