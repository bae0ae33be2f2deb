//! System color-scheme signals.
//!
//! The manager only asks one question of its host: does the system
//! currently prefer a dark color scheme?

use std::cell::Cell;
use std::rc::Rc;

/// Source of the OS-level color-scheme preference.
pub trait ColorSchemeSignal {
    fn prefers_dark(&self) -> bool;
}

impl<T: ColorSchemeSignal + ?Sized> ColorSchemeSignal for Box<T> {
    fn prefers_dark(&self) -> bool {
        (**self).prefers_dark()
    }
}

/// A signal fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedScheme {
    pub dark: bool,
}

impl ColorSchemeSignal for FixedScheme {
    fn prefers_dark(&self) -> bool {
        self.dark
    }
}

/// A signal the host flips at runtime; clones share state.
#[derive(Debug, Default, Clone)]
pub struct SchemeSwitch {
    dark: Rc<Cell<bool>>,
}

impl SchemeSwitch {
    pub fn new(dark: bool) -> Self {
        Self {
            dark: Rc::new(Cell::new(dark)),
        }
    }

    pub fn set_dark(&self, dark: bool) {
        self.dark.set(dark);
    }
}

impl ColorSchemeSignal for SchemeSwitch {
    fn prefers_dark(&self) -> bool {
        self.dark.get()
    }
}

/// The terminal's background, queried once at construction.
///
/// Tries an OSC 11 query first and falls back to `COLORFGBG`. When both
/// are unavailable the terminal is treated as light.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalScheme {
    dark: Option<bool>,
}

impl TerminalScheme {
    pub fn detect() -> Self {
        let from_query = detect_osc11().map(|(r, g, b)| !is_light_rgb(r, g, b));
        let dark = from_query.or_else(|| {
            dark_from_colorfgbg(std::env::var("COLORFGBG").ok().as_deref())
        });
        tracing::debug!(?dark, "terminal color scheme detected");
        Self { dark }
    }

    /// Whether detection produced an answer at all.
    pub const fn detected(&self) -> Option<bool> {
        self.dark
    }
}

impl ColorSchemeSignal for TerminalScheme {
    fn prefers_dark(&self) -> bool {
        self.dark.unwrap_or(false)
    }
}

fn is_light_rgb(r: u8, g: u8, b: u8) -> bool {
    let luma = 0.0722f32.mul_add(
        f32::from(b),
        0.2126f32.mul_add(f32::from(r), 0.7152 * f32::from(g)),
    );
    luma >= 140.0
}

/// `COLORFGBG` is `fg;bg` (sometimes `fg;default;bg`); bg >= 7 is light.
fn dark_from_colorfgbg(value: Option<&str>) -> Option<bool> {
    let value = value?;
    let bg = value.rsplit(';').next()?.parse::<u8>().ok()?;
    Some(bg < 7)
}

fn detect_osc11() -> Option<(u8, u8, u8)> {
    use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

    let raw = enable_raw_mode();
    let result = query_terminal_background();
    if raw.is_ok() {
        let _ = disable_raw_mode();
    }
    result.ok().flatten()
}

#[cfg(not(unix))]
fn query_terminal_background() -> std::io::Result<Option<(u8, u8, u8)>> {
    Ok(None)
}

// Talk to /dev/tty so the terminal answers even when stdout is piped.
#[cfg(unix)]
fn query_terminal_background() -> std::io::Result<Option<(u8, u8, u8)>> {
    use std::io::{Read, Write};
    use std::sync::mpsc;
    use std::time::Duration;

    let (tx, rx) = mpsc::channel();

    let mut io = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open("/dev/tty")?;
    let reader = io.try_clone()?;

    // OSC 11 query: ESC ] 11 ; ? BEL
    io.write_all(b"\x1b]11;?\x07")?;
    io.flush()?;

    std::thread::spawn(move || {
        let mut reader = reader;
        let mut buf = [0u8; 256];
        let mut collected: Vec<u8> = Vec::new();
        loop {
            match reader.read(&mut buf) {
                Ok(0) => continue,
                Ok(n) => {
                    collected.extend_from_slice(&buf[..n]);
                    if collected.contains(&b'\x07')
                        || collected.windows(2).any(|w| w == b"\x1b\\")
                    {
                        let _ = tx.send(collected);
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });

    let Ok(collected) = rx.recv_timeout(Duration::from_millis(75)) else {
        return Ok(None);
    };
    Ok(parse_osc11_reply(&String::from_utf8_lossy(&collected)))
}

fn parse_osc11_reply(reply: &str) -> Option<(u8, u8, u8)> {
    // ESC ] 11 ; rgb:RRRR/GGGG/BBBB terminated by BEL or ST
    let start = reply.find("rgb:")?;
    let data = &reply[start + 4..];
    let mut parts = data.split(['/', '\x07', '\x1b']);
    let r = parts.next()?;
    let g = parts.next()?;
    let b = parts.next()?;
    Some((
        parse_osc_component(r)?,
        parse_osc_component(g)?,
        parse_osc_component(b)?,
    ))
}

fn parse_osc_component(s: &str) -> Option<u8> {
    let hex = s.trim();
    if hex.len() >= 4 {
        let v = u16::from_str_radix(&hex[..4], 16).ok()?;
        u8::try_from(v >> 8).ok()
    } else if hex.len() == 2 {
        u8::from_str_radix(hex, 16).ok()
    } else {
        None
    }
}
