//! Interactive terminal front end for watching the tracker work.
//!
//! Feature-gated behind `tui`. Launch with `--tui` on the CLI.

mod controls;
mod layout;
/// Simulation runner and application state.
pub mod runtime;
mod style;

use std::io::{self, Stdout};

use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use runtime::App;

type Screen = Terminal<CrosstermBackend<Stdout>>;

/// Runs an interactive tracking session until the user quits.
///
/// Every due tick executes one MPPT iteration; the power trace, I-V curve
/// and operating-point charts are redrawn after each key press or
/// iteration. A finished run stays on screen so it can be restarted or
/// swapped for another preset.
///
/// # Errors
///
/// Returns an `io::Error` if the screen cannot be claimed or drawn. The
/// terminal is handed back to the shell in either case.
pub fn run(mut app: App) -> io::Result<()> {
    let mut screen = claim_screen()?;
    let outcome = drive(&mut screen, &mut app);
    release_screen(&mut screen);
    outcome
}

fn claim_screen() -> io::Result<Screen> {
    enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen)
        .and_then(|()| Terminal::new(CrosstermBackend::new(io::stdout())))
        .inspect_err(|_| {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            let _ = disable_raw_mode();
        })
}

fn release_screen(screen: &mut Screen) {
    let _ = disable_raw_mode();
    let _ = execute!(screen.backend_mut(), LeaveAlternateScreen);
    let _ = screen.show_cursor();
}

/// Redraws, waits for a key or the next tick, then steps the tracker.
fn drive(screen: &mut Screen, app: &mut App) -> io::Result<()> {
    while !app.quit {
        screen.draw(|frame| layout::render(frame, app))?;

        if event::poll(app.until_next_tick())? {
            if let Event::Key(key) = event::read()? {
                controls::handle_key(app, key);
            }
        }
        app.tick_if_due();
    }
    Ok(())
}
