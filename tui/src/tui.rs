use std::io::Result;
use std::io::Stdout;
use std::io::stdout;

use crossterm::cursor;
use crossterm::event::DisableBracketedPaste;
use crossterm::event::DisableMouseCapture;
use crossterm::event::EnableBracketedPaste;
use crossterm::event::EnableMouseCapture;
use crossterm::event::Event;
use crossterm::event::EventStream;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::MouseEvent;
use crossterm::execute;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use ratatui::backend::CrosstermBackend;
use tokio_stream::Stream;
use tokio_stream::StreamExt;

/// A type alias for the terminal type used in this application
pub type Terminal = ratatui::Terminal<CrosstermBackend<Stdout>>;

pub fn set_modes() -> Result<()> {
    execute!(
        stdout(),
        EnterAlternateScreen,
        EnableBracketedPaste,
        EnableMouseCapture
    )?;
    enable_raw_mode()?;
    Ok(())
}

/// Restore the terminal to its original state.
/// Inverse of `set_modes`.
pub fn restore() -> Result<()> {
    execute!(
        stdout(),
        DisableMouseCapture,
        DisableBracketedPaste,
        LeaveAlternateScreen
    )?;
    disable_raw_mode()?;
    let _ = execute!(stdout(), cursor::Show);
    Ok(())
}

/// Initialize the terminal (alternate screen, full-screen viewport).
pub fn init() -> Result<Terminal> {
    set_modes()?;
    set_panic_hook();
    ratatui::Terminal::new(CrosstermBackend::new(stdout()))
}

fn set_panic_hook() {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        tracing::error!("panic: {panic_info}");
        let _ = restore(); // ignore any errors as we are already failing
        hook(panic_info);
    }));
}

#[derive(Debug)]
pub(crate) enum TuiEvent {
    Key(KeyEvent),
    Paste(String),
    Mouse(MouseEvent),
    Draw,
}

/// Terminal input mapped to [`TuiEvent`]s. Key releases are dropped.
pub(crate) fn event_stream() -> impl Stream<Item = TuiEvent> {
    EventStream::new().filter_map(|event| match event {
        Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => Some(TuiEvent::Key(key)),
        Ok(Event::Paste(pasted)) => Some(TuiEvent::Paste(pasted)),
        Ok(Event::Mouse(mouse)) => Some(TuiEvent::Mouse(mouse)),
        Ok(Event::Resize(_, _)) => Some(TuiEvent::Draw),
        Ok(_) => None,
        Err(e) => {
            tracing::error!("failed to read terminal event: {e}");
            None
        }
    })
}
