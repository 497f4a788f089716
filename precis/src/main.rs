use anyhow::{Context, Result};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use crossterm::{
    clipboard::CopyToClipboard,
    event::{self, DisableFocusChange, EnableFocusChange, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tokio::runtime::Runtime;
use tracing::{error, info, warn};

use precis::alert::{AlertChannel, DesktopAlert, SilentAlert};
use precis::config::load_config;
use precis::ipc;
use precis::logging;
use precis::notes::NotesStore;
use precis::summarizer::HttpSummarizer;
use precis::{spawn_session, SessionCommand, SessionHandle};
use precis_ipc::SOCKET_PATH;

mod app;
mod ui;

use app::{Action, App};

fn main() -> Result<()> {
    let config = load_config()?;
    let log_file = logging::init()?;
    let settings = config.session_settings()?;

    let rt = Runtime::new().context("Failed to start async runtime")?;
    let summarizer = HttpSummarizer::new(&config.backend_url(), config.request_timeout())?;
    if let Some(path) = log_file {
        info!(path = %path.display(), "Logging to file");
    }
    info!(endpoint = %summarizer.endpoint(), "Summarization backend");
    let alerts: Box<dyn AlertChannel> = if config.focus.desktop_alerts {
        Box::new(DesktopAlert::new("Precis"))
    } else {
        Box::new(SilentAlert)
    };

    let handle = {
        let _guard = rt.enter();
        spawn_session(settings, Arc::new(summarizer), alerts)
    };

    let notes = NotesStore::open_default()
        .map_err(|e| warn!(error = %e, "Scratch notes are unavailable"))
        .ok();
    if let Some(store) = notes.clone() {
        let session = handle.clone();
        rt.spawn(async move {
            if let Err(e) = ipc::server::start(SOCKET_PATH, session, store).await {
                error!("IPC server stopped: {}", e);
            }
        });
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let app = App::new(config, handle.view(), notes);
    let res = run_app(&mut terminal, app, &rt, &handle);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableFocusChange
    )?;
    terminal.show_cursor()?;

    let _ = std::fs::remove_file(SOCKET_PATH);
    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    rt: &Runtime,
    session: &SessionHandle,
) -> Result<()> {
    loop {
        app.view = session.view();
        terminal.draw(|f| ui::draw(f, &app))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let action = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => app.on_key(key),
            Event::FocusLost => Some(SessionCommand::FocusLost.into()),
            Event::FocusGained => Some(SessionCommand::FocusGained.into()),
            _ => None,
        };
        match action {
            Some(Action::Session(command)) => app.view = rt.block_on(session.send(command))?,
            Some(Action::Copy(text)) => {
                // OSC 52 escape, handled by the terminal emulator.
                if let Err(e) = execute!(io::stdout(), CopyToClipboard::to_clipboard_from(text)) {
                    warn!(error = %e, "Could not copy to clipboard");
                }
            }
            None => {}
        }
        if app.should_quit {
            return Ok(());
        }
    }
}
