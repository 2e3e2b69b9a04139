//! Terminal session: owns the terminal for the lifetime of a canvas.
//!
//! ```text
//! prepare ──► { poll_events ──► draw_* ──► render ──► clear }* ──► restore
//! ```
//!
//! `prepare` queries the geometry once, allocates the frame buffer, switches
//! the terminal to raw mode and the alternate screen, hides the cursor and
//! attaches the key source. `restore` (or dropping the session) undoes all of
//! it, best effort.

use std::io::Write;

use crossterm::cursor::{Hide, Show};
use crossterm::queue;
use crossterm::terminal::{
    BeginSynchronizedUpdate, EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
};
use tracing::{error, info};

use super::backend::{self, Backend, CrosstermBackend};
use crate::config::Config;
use crate::core::{FrameBuffer, Rect, Vector};
use crate::error::{Error, Result};
use crate::input::{self, KeyCode, KeySource, KeyState, KeyStates};
use crate::logging::{self, LogLevel};

/// A prepared terminal with its frame buffer and key state
pub struct Session<B: Backend = CrosstermBackend> {
    backend: B,
    buffer: FrameBuffer,
    keys: KeyStates,
    source: Box<dyn KeySource>,
    /// Cached canvas size in cells
    width: u16,
    height: u16,
    log_level: LogLevel,
    synchronized_output: bool,
    restored: bool,
}

impl Session<CrosstermBackend> {
    /// Take over the controlling terminal.
    pub fn prepare(config: &Config) -> Result<Self> {
        backend::install_panic_hook();
        Self::prepare_with(CrosstermBackend::new(), input::source_for(config), config)
    }
}

impl<B: Backend> Session<B> {
    /// Take over the terminal behind `backend`, reading keys from `source`.
    pub fn prepare_with(
        mut backend: B,
        source: Box<dyn KeySource>,
        config: &Config,
    ) -> Result<Self> {
        let (cols, rows) = backend.size().map_err(|e| {
            error!("Failed to read size of terminal: {}", e);
            Error::Geometry(e)
        })?;
        let width = cols;
        let height = if config.reserve_status_line {
            rows.saturating_sub(1)
        } else {
            rows
        };
        if width == 0 || height == 0 {
            error!("Terminal has no drawable cells: {}x{}", width, height);
            return Err(Error::EmptyGeometry { width, height });
        }

        let buffer = FrameBuffer::new(width, height).map_err(|e| {
            error!("{}", e);
            e
        })?;

        backend.enable_raw_mode().map_err(|e| {
            error!("Failed to enable raw mode: {}", e);
            Error::RawMode(e)
        })?;

        let mut session = Self {
            backend,
            buffer,
            keys: KeyStates::new(),
            source,
            width,
            height,
            log_level: config.log_level,
            synchronized_output: config.synchronized_output,
            restored: false,
        };

        if let Err(e) = session.enter() {
            error!("Failed to prepare terminal: {}", e);
            session.shutdown();
            return Err(e);
        }

        info!(
            "Terminal prepared: {}x{} cells, {} key source",
            width,
            height,
            session.source.name()
        );
        Ok(session)
    }

    fn enter(&mut self) -> Result<()> {
        let out = self.backend.writer();
        queue!(out, EnterAlternateScreen, Hide)?;
        out.flush()?;
        self.source.attach(self.backend.writer())
    }

    /// Best-effort restoration; runs at most once.
    fn shutdown(&mut self) {
        if std::mem::replace(&mut self.restored, true) {
            return;
        }

        self.source.detach(self.backend.writer());

        let out = self.backend.writer();
        let screen = queue!(out, LeaveAlternateScreen, Show).and_then(|()| out.flush());
        if let Err(e) = screen {
            error!("Failed to leave alternate screen: {}", e);
        }

        if let Err(e) = self.backend.disable_raw_mode() {
            error!("Failed to restore terminal mode: {}", e);
        }

        self.buffer.release();
        info!("Terminal restored");
    }

    /// Give the terminal back. Never fails; problems are logged.
    pub fn restore(mut self) {
        self.shutdown();
    }

    /// Canvas width in cells
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Canvas height in cells
    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn buffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Advance key states by one poll.
    pub fn poll_events(&mut self) -> Result<()> {
        self.source.poll(&mut self.keys)
    }

    pub fn keys(&self) -> &KeyStates {
        &self.keys
    }

    pub fn key_state(&self, key: KeyCode) -> KeyState {
        self.keys.get(key)
    }

    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys.is_pressed(key)
    }

    pub fn is_key_held(&self, key: KeyCode) -> bool {
        self.keys.is_held(key)
    }

    pub fn is_key_released(&self, key: KeyCode) -> bool {
        self.keys.is_released(key)
    }

    /// Keys pressed during the last poll, in ascending code order.
    pub fn pressed_keys(&self) -> impl Iterator<Item = KeyCode> + '_ {
        self.keys.pressed()
    }

    pub fn draw_rect(&mut self, rect: Rect) {
        self.buffer.draw_rect(rect);
    }

    pub fn fill_rect(&mut self, rect: Rect) {
        self.buffer.fill_rect(rect);
    }

    pub fn draw_text(&mut self, text: &str, pos: Vector) {
        self.buffer.draw_text(text, pos);
    }

    pub fn draw_char(&mut self, codepoint: u32, pos: Vector) {
        self.buffer.draw_char(codepoint, pos);
    }

    /// Write the frame to the terminal.
    pub fn render(&mut self) -> Result<()> {
        let out = self.backend.writer();
        if self.synchronized_output {
            queue!(out, BeginSynchronizedUpdate)?;
        }
        self.buffer.render_to(out)?;
        if self.synchronized_output {
            queue!(out, EndSynchronizedUpdate)?;
        }
        out.flush()?;
        Ok(())
    }

    /// Empty the frame buffer for the next frame.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    pub fn set_log_level(&mut self, level: LogLevel) {
        self.log_level = level;
        if let Err(e) = logging::set_level(level) {
            error!("{}", e);
        }
    }
}

impl<B: Backend> Drop for Session<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::keys::DownSet;
    use crate::ui::backend::MemoryBackend;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Key source replaying prepared snapshots, recording attach/detach.
    #[derive(Default)]
    struct ScriptedSource {
        polls: VecDeque<Vec<KeyCode>>,
        events: Arc<Mutex<Vec<&'static str>>>,
        fail_attach: bool,
    }

    impl KeySource for ScriptedSource {
        fn attach(&mut self, _out: &mut dyn Write) -> Result<()> {
            self.events.lock().unwrap().push("attach");
            if self.fail_attach {
                return Err(Error::Listener("no listener".to_string()));
            }
            Ok(())
        }

        fn poll(&mut self, keys: &mut KeyStates) -> Result<()> {
            let down: DownSet = self.polls.pop_front().unwrap_or_default().into_iter().collect();
            keys.advance(&down);
            Ok(())
        }

        fn detach(&mut self, _out: &mut dyn Write) {
            self.events.lock().unwrap().push("detach");
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    fn scripted(polls: Vec<Vec<KeyCode>>) -> Box<dyn KeySource> {
        Box::new(ScriptedSource {
            polls: polls.into(),
            ..Default::default()
        })
    }

    fn config() -> Config {
        Config {
            synchronized_output: false,
            ..Config::default()
        }
    }

    #[test]
    fn test_prepare_reserves_status_line() {
        let backend = MemoryBackend::new(80, 24);
        let session = Session::prepare_with(backend.clone(), scripted(vec![]), &config()).unwrap();

        assert_eq!(session.width(), 80);
        assert_eq!(session.height(), 23);
        assert_eq!(session.buffer().len(), 80 * 23);
        assert!(backend.is_raw());

        let out = backend.output().to_string_lossy();
        assert!(out.contains("\x1b[?1049h"), "alternate screen: {:?}", out);
        assert!(out.contains("\x1b[?25l"), "hidden cursor: {:?}", out);
    }

    #[test]
    fn test_full_height_without_status_line() {
        let config = Config {
            reserve_status_line: false,
            ..config()
        };
        let session =
            Session::prepare_with(MemoryBackend::new(10, 5), scripted(vec![]), &config).unwrap();
        assert_eq!(session.height(), 5);
    }

    #[test]
    fn test_restore_gives_terminal_back() {
        let backend = MemoryBackend::new(10, 5);
        let session = Session::prepare_with(backend.clone(), scripted(vec![]), &config()).unwrap();
        backend.output().take();

        session.restore();

        assert!(!backend.is_raw());
        let out = backend.output().to_string_lossy();
        assert!(out.contains("\x1b[?1049l"), "left alternate screen: {:?}", out);
        assert!(out.contains("\x1b[?25h"), "cursor shown: {:?}", out);
    }

    #[test]
    fn test_drop_restores_once() {
        let backend = MemoryBackend::new(10, 5);
        let events = Arc::new(Mutex::new(Vec::new()));
        let source = Box::new(ScriptedSource {
            events: events.clone(),
            ..Default::default()
        });

        {
            let _session = Session::prepare_with(backend.clone(), source, &config()).unwrap();
        }

        assert!(!backend.is_raw());
        assert_eq!(*events.lock().unwrap(), vec!["attach", "detach"]);
    }

    #[test]
    fn test_geometry_failure() {
        let backend = MemoryBackend::without_size();
        let result = Session::prepare_with(backend.clone(), scripted(vec![]), &config());
        assert!(matches!(result, Err(Error::Geometry(_))));
        assert!(!backend.is_raw());
        assert!(backend.output().take().is_empty());
    }

    #[test]
    fn test_single_row_terminal_has_no_canvas() {
        let result = Session::prepare_with(MemoryBackend::new(80, 1), scripted(vec![]), &config());
        assert!(matches!(
            result,
            Err(Error::EmptyGeometry {
                width: 80,
                height: 0
            })
        ));
    }

    #[test]
    fn test_raw_mode_failure() {
        let backend = MemoryBackend::new(10, 5).with_failing_raw_mode();
        let result = Session::prepare_with(backend.clone(), scripted(vec![]), &config());
        assert!(matches!(result, Err(Error::RawMode(_))));
        assert!(backend.output().take().is_empty());
    }

    #[test]
    fn test_attach_failure_rolls_back() {
        let backend = MemoryBackend::new(10, 5);
        let events = Arc::new(Mutex::new(Vec::new()));
        let source = Box::new(ScriptedSource {
            events: events.clone(),
            fail_attach: true,
            ..Default::default()
        });

        let result = Session::prepare_with(backend.clone(), source, &config());
        assert!(matches!(result, Err(Error::Listener(_))));
        assert!(!backend.is_raw());
        assert!(backend.output().to_string_lossy().ends_with("\x1b[?1049l\x1b[?25h"));
        assert_eq!(*events.lock().unwrap(), vec!["attach", "detach"]);
    }

    #[test]
    fn test_frame_lifecycle() {
        let backend = MemoryBackend::new(6, 4);
        let esc = KeyCode::ESC;
        let mut session = Session::prepare_with(
            backend.clone(),
            scripted(vec![vec![esc], vec![esc], vec![]]),
            &config(),
        )
        .unwrap();
        backend.output().take();

        session.poll_events().unwrap();
        assert!(session.is_key_pressed(esc));
        assert_eq!(session.pressed_keys().collect::<Vec<_>>(), vec![esc]);

        session.draw_rect(Rect::new(Vector::xy(0.0, 0.0), Vector::xy(3.0, 2.0)));
        session.draw_text("ok", Vector::new(1.0, 1.0, 1.0));
        session.render().unwrap();
        assert_eq!(
            backend.output().take(),
            "\x1b[1;1H┌──┐  \r\n│ok│  \r\n└──┘  \r\n".as_bytes()
        );

        session.clear();
        session.poll_events().unwrap();
        assert!(session.is_key_held(esc));
        session.render().unwrap();
        assert_eq!(
            backend.output().take(),
            "\x1b[1;1H      \r\n      \r\n      \r\n".as_bytes()
        );

        session.poll_events().unwrap();
        assert!(session.is_key_released(esc));
        assert_eq!(session.key_state(esc), KeyState::RELEASED);
    }

    #[test]
    fn test_synchronized_output_wraps_frame() {
        let backend = MemoryBackend::new(2, 2);
        let config = Config {
            synchronized_output: true,
            ..Config::default()
        };
        let mut session = Session::prepare_with(backend.clone(), scripted(vec![]), &config).unwrap();
        backend.output().take();

        session.render().unwrap();
        assert_eq!(
            backend.output().to_string_lossy(),
            "\x1b[?2026h\x1b[1;1H  \r\n\x1b[?2026l"
        );
    }

    #[test]
    fn test_encoding_failure_keeps_session_usable() {
        let backend = MemoryBackend::new(3, 2);
        let mut session = Session::prepare_with(backend.clone(), scripted(vec![]), &config()).unwrap();
        backend.output().take();

        session.draw_char(0x110000, Vector::xy(0.0, 0.0));
        session.render().unwrap();
        assert!(backend.output().take().is_empty());
        assert_eq!(session.buffer().get(0, 0), None);

        session.draw_char('x' as u32, Vector::xy(0.0, 0.0));
        session.render().unwrap();
        assert_eq!(backend.output().take(), b"\x1b[1;1Hx  \r\n".to_vec());
    }

    #[test]
    fn test_log_level_is_tracked() {
        let mut session =
            Session::prepare_with(MemoryBackend::new(4, 4), scripted(vec![]), &config()).unwrap();
        assert_eq!(session.log_level(), LogLevel::Error);
        session.set_log_level(LogLevel::Debug);
        assert_eq!(session.log_level(), LogLevel::Debug);
    }
}
