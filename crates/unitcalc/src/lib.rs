//! Terminal front end for a stateful units-of-measure calculator
//!
//! Provides a single-pane terminal interface with:
//! - Live preview and completion chips while typing
//! - A persistent history that is replayed into the engine on startup
//! - Click to reuse a result, hold to edit an earlier input
//!
//! The calculator itself is an external engine process (see [`engine`]).

pub mod app;
pub mod commit;
pub mod completion;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod gesture;
pub mod history;
pub mod keys;
pub mod live;
pub mod replay;
pub mod schedule;
pub mod store;
pub mod ui;
pub mod word;

use crate::app::{App, AppSettings};
use crate::config::Config;
use crate::engine::{Engine, ProcessEngine};
use crate::event::AppEvent;
use crate::history::HistoryStore;
use crate::store::{FileStore, KeyValueStore, MemoryStore};
use crossterm::{
    event::{
        DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
        Event, EventStream, KeyEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, Stdout, stdout};
use std::rc::Rc;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::LocalSet;
use tracing::info;

/// Startup choices that are not part of the configuration file.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Start from an empty history instead of replaying the stored one.
    pub fresh: bool,
}

/// Run the calculator until the user quits
pub fn run(config: Config, options: Options) -> Result<(), String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start runtime: {}", e))?;

    LocalSet::new().block_on(&runtime, session(config, options))
}

async fn session(config: Config, options: Options) -> Result<(), String> {
    let engine = ProcessEngine::spawn(&config.engine.command)
        .map_err(|e| format!("Failed to start engine: {}", e))?;
    let engine = Rc::new(engine);

    let result = if config.storage.persist {
        let store = FileStore::open_in(&config.data_dir()).await;
        info!(path = %store.path().display(), "using history store");
        drive(Rc::clone(&engine), store, &config, &options).await
    } else {
        info!("history persistence disabled");
        drive(Rc::clone(&engine), MemoryStore::new(), &config, &options).await
    };

    // Tasks still in flight keep a reference; the child is then killed on drop.
    if let Ok(engine) = Rc::try_unwrap(engine) {
        engine.shutdown().await;
    }

    result
}

async fn drive<E, S>(
    engine: Rc<E>,
    store: S,
    config: &Config,
    options: &Options,
) -> Result<(), String>
where
    E: Engine + 'static,
    S: KeyValueStore,
{
    let (events, mut receiver) = mpsc::unbounded_channel();
    let history = HistoryStore::with_key(store, config.storage.history_key.as_str());
    let mut app = App::new(engine, history, events, AppSettings::from_config(config));

    // Replay finishes before the terminal takes input.
    app.start(options.fresh).await;

    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, &mut app, &mut receiver).await;
    restore_terminal(&mut terminal);

    result.map_err(|e| format!("Application error: {}", e))
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, String> {
    enable_raw_mode().map_err(|e| format!("Failed to enable raw mode: {}", e))?;
    let mut stdout = stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )
    .map_err(|e| format!("Failed to enter alternate screen: {}", e))?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| format!("Failed to create terminal: {}", e))
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) {
    let _ = disable_raw_mode();
    let _ = execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        DisableMouseCapture,
        LeaveAlternateScreen
    );
    let _ = terminal.show_cursor();
}

/// Internal run loop: terminal input and background results, one at a time
async fn run_app<E, S>(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App<E, S>,
    receiver: &mut UnboundedReceiver<AppEvent>,
) -> io::Result<()>
where
    E: Engine + 'static,
    S: KeyValueStore,
{
    let mut input = EventStream::new();

    loop {
        terminal.draw(|frame| app.render(frame))?;

        tokio::select! {
            event = input.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    app.handle_key(key).await;
                }
                Some(Ok(Event::Mouse(mouse))) => app.handle_mouse(mouse),
                Some(Ok(Event::Paste(text))) => app.handle_paste(&text),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e),
                None => break,
            },
            Some(event) = receiver.recv() => app.handle_event(event),
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
