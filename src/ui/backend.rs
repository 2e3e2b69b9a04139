//! Terminal control: geometry, raw mode and the output stream.
//!
//! [`CrosstermBackend`] drives the real terminal through crossterm, which also
//! keeps the original terminal attributes for restoration. [`MemoryBackend`]
//! records everything in memory for headless use.

use std::io::{self, Stdout, Write};
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Once};

use crossterm::cursor::Show;
use crossterm::event::PopKeyboardEnhancementFlags;
use crossterm::{execute, queue};
use crossterm::terminal::{self, LeaveAlternateScreen};

/// The terminal-control collaborator a session runs on
pub trait Backend {
    type Writer: Write;

    /// Terminal size as `(columns, rows)`.
    fn size(&self) -> io::Result<(u16, u16)>;

    /// Deliver input bytes immediately and unechoed.
    fn enable_raw_mode(&mut self) -> io::Result<()>;

    /// Restore the terminal attributes saved by `enable_raw_mode`.
    fn disable_raw_mode(&mut self) -> io::Result<()>;

    /// Stream that escape sequences and frames are written to.
    fn writer(&mut self) -> &mut Self::Writer;
}

/// Set while a crossterm backend holds the terminal in raw mode.
static RAW_MODE_ACTIVE: AtomicBool = AtomicBool::new(false);
/// Set while keyboard enhancement flags are pushed on the terminal.
static KEYBOARD_FLAGS_PUSHED: AtomicBool = AtomicBool::new(false);
static PANIC_HOOK: Once = Once::new();

/// Record whether keyboard enhancement flags need popping on a crash.
pub(crate) fn mark_keyboard_flags_pushed(pushed: bool) {
    KEYBOARD_FLAGS_PUSHED.store(pushed, Ordering::SeqCst);
}

/// Undo the terminal modes a session switched on.
fn write_crash_restore<W: Write>(out: &mut W) -> io::Result<()> {
    if KEYBOARD_FLAGS_PUSHED.swap(false, Ordering::SeqCst) {
        queue!(out, PopKeyboardEnhancementFlags)?;
    }
    execute!(out, LeaveAlternateScreen, Show)
}

/// Install (once per process) a panic hook that puts the terminal back
/// before the panic message is printed.
pub(crate) fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let original_hook = panic::take_hook();
        panic::set_hook(Box::new(move |panic_info| {
            if RAW_MODE_ACTIVE.swap(false, Ordering::SeqCst) {
                let _ = write_crash_restore(&mut io::stdout());
                let _ = terminal::disable_raw_mode();
            }
            original_hook(panic_info);
        }));
    });
}

/// Backend for the process's controlling terminal
pub struct CrosstermBackend {
    out: Stdout,
}

impl Default for CrosstermBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CrosstermBackend {
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }
}

impl Backend for CrosstermBackend {
    type Writer = Stdout;

    fn size(&self) -> io::Result<(u16, u16)> {
        terminal::size()
    }

    fn enable_raw_mode(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        RAW_MODE_ACTIVE.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn disable_raw_mode(&mut self) -> io::Result<()> {
        RAW_MODE_ACTIVE.store(false, Ordering::SeqCst);
        terminal::disable_raw_mode()
    }

    fn writer(&mut self) -> &mut Stdout {
        &mut self.out
    }
}

/// Output buffer shared between a [`MemoryBackend`] and its clones
#[derive(Debug, Clone, Default)]
pub struct SharedOutput(Arc<Mutex<Vec<u8>>>);

impl SharedOutput {
    /// Take everything written so far.
    pub fn take(&self) -> Vec<u8> {
        self.0
            .lock()
            .map(|mut out| std::mem::take(&mut *out))
            .unwrap_or_default()
    }

    /// Everything written so far, lossily decoded.
    pub fn to_string_lossy(&self) -> String {
        self.0
            .lock()
            .map(|out| String::from_utf8_lossy(&out).into_owned())
            .unwrap_or_default()
    }
}

impl Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut out = self
            .0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "output buffer poisoned"))?;
        out.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// In-memory terminal with a fixed size
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    size: Option<(u16, u16)>,
    raw_mode: Arc<AtomicBool>,
    raw_mode_fails: bool,
    output: SharedOutput,
}

impl MemoryBackend {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            size: Some((cols, rows)),
            raw_mode: Arc::new(AtomicBool::new(false)),
            raw_mode_fails: false,
            output: SharedOutput::default(),
        }
    }

    /// A terminal whose size cannot be queried.
    pub fn without_size() -> Self {
        Self {
            size: None,
            ..Self::new(0, 0)
        }
    }

    /// Make `enable_raw_mode` fail.
    pub fn with_failing_raw_mode(mut self) -> Self {
        self.raw_mode_fails = true;
        self
    }

    pub fn output(&self) -> &SharedOutput {
        &self.output
    }

    pub fn is_raw(&self) -> bool {
        self.raw_mode.load(Ordering::SeqCst)
    }
}

impl Backend for MemoryBackend {
    type Writer = SharedOutput;

    fn size(&self) -> io::Result<(u16, u16)> {
        self.size
            .ok_or_else(|| io::Error::new(io::ErrorKind::Unsupported, "no terminal size"))
    }

    fn enable_raw_mode(&mut self) -> io::Result<()> {
        if self.raw_mode_fails {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "not a tty"));
        }
        self.raw_mode.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn disable_raw_mode(&mut self) -> io::Result<()> {
        self.raw_mode.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn writer(&mut self) -> &mut SharedOutput {
        &mut self.output
    }
}
