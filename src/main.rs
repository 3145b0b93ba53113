mod app;
mod data;
mod geo;
mod geocode;
mod map;
mod ui;

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use app::{App, Focus, SUGGESTIONS};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use geocode::GeocodeClient;
use map::{TerminalSurface, ViewController, DEFAULT_CENTER, DEFAULT_ZOOM};
use ratatui::DefaultTerminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so the alternate screen stays intact.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geoscope=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut terminal = ratatui::init();
    terminal.clear()?;

    let result = run(&mut terminal).await;

    ratatui::restore();
    result
}

async fn run(terminal: &mut DefaultTerminal) -> Result<()> {
    let size = terminal.size()?;
    let (dot_w, dot_h) = app::map_area_dots(size.width, size.height);

    let mut basemap = data::load_basemap(Path::new("data"));
    if basemap.is_empty() {
        basemap = data::builtin_world();
    }

    let surface = TerminalSurface::new(basemap, DEFAULT_CENTER, DEFAULT_ZOOM, dot_w, dot_h);
    let controller = ViewController::mount(Some(surface), DEFAULT_ZOOM);
    let mut app = App::new(controller, GeocodeClient::new()?);

    loop {
        app.tick(Instant::now());
        terminal.draw(|frame| ui::render(frame, &app))?;

        // ~60fps event poll, same cadence the animations are drawn at.
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    handle_key(&mut app, key.code);
                }
                Event::Resize(width, height) => {
                    app.resize(width, height);
                }
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    app.controller.unmount();
    Ok(())
}

fn handle_key(app: &mut App, code: KeyCode) {
    match app.focus {
        Focus::Search => match code {
            KeyCode::Enter => app.submit_search(),
            KeyCode::Esc => app.focus = Focus::Map,
            KeyCode::Backspace => {
                app.search_input.pop();
            }
            KeyCode::Char(c) => app.search_input.push(c),
            _ => {}
        },
        Focus::Map => match code {
            KeyCode::Char('q') => app.quit(),
            KeyCode::Char('/') => app.focus = Focus::Search,

            KeyCode::Char('+') | KeyCode::Char('=') => app.controller.zoom_in(),
            KeyCode::Char('-') | KeyCode::Char('_') => app.controller.zoom_out(),

            KeyCode::Char('r') | KeyCode::Char('0') => app.controller.reset_view(),
            KeyCode::Esc | KeyCode::Char('x') => app.clear_selection(),

            // Quick-search chips.
            KeyCode::Char(c @ '1'..='4') => {
                let idx = (c as usize) - ('1' as usize);
                app.search(SUGGESTIONS[idx]);
            }
            _ => {}
        },
    }
}
