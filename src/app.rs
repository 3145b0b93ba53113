use std::time::Instant;

use tokio::sync::mpsc;
use tracing::warn;

use crate::geocode::{GeocodeClient, GeocodeError};
use crate::map::{LocationSelection, TerminalSurface, ViewController};

/// Quick-search chips shown under the search bar.
pub const SUGGESTIONS: [&str; 4] = ["Toronto", "Vancouver", "Montreal", "Calgary"];

/// Which panel receives keystrokes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    Map,
    Search,
}

type GeocodeOutcome = Result<LocationSelection, GeocodeError>;

/// Host application state: owns the view controller, the search field, and
/// the channel geocode results arrive on.
pub struct App {
    pub controller: ViewController<TerminalSurface>,
    geocoder: GeocodeClient,
    pub search_input: String,
    pub focus: Focus,
    /// One-line alert surfaced to the user (lookup failures, hints).
    pub status: Option<String>,
    pub should_quit: bool,
    results_tx: mpsc::UnboundedSender<GeocodeOutcome>,
    results_rx: mpsc::UnboundedReceiver<GeocodeOutcome>,
}

impl App {
    pub fn new(controller: ViewController<TerminalSurface>, geocoder: GeocodeClient) -> Self {
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        Self {
            controller,
            geocoder,
            search_input: String::new(),
            focus: Focus::Map,
            status: None,
            should_quit: false,
            results_tx,
            results_rx,
        }
    }

    /// Terminal resized; forward the new map area to the controller in
    /// canvas dots (2 per column, 4 per row, minus panel chrome).
    pub fn resize(&mut self, width: u16, height: u16) {
        let (dot_w, dot_h) = map_area_dots(width, height);
        self.controller.on_viewport_resized(dot_w, dot_h);
    }

    /// Fire a geocode lookup for the current input. Blank input is ignored
    /// without issuing a request.
    pub fn submit_search(&mut self) {
        let query = std::mem::take(&mut self.search_input);
        self.focus = Focus::Map;
        self.search(&query);
    }

    pub fn search(&mut self, query: &str) {
        if query.trim().is_empty() {
            return;
        }
        self.status = Some(format!("Searching for \"{}\"...", query.trim()));

        let geocoder = self.geocoder.clone();
        let tx = self.results_tx.clone();
        let query = query.to_string();
        tokio::spawn(async move {
            // Receiver dropping just means the app is shutting down.
            let _ = tx.send(geocoder.geocode(&query).await);
        });
    }

    /// Per-frame pump: apply geocode outcomes (last-write-wins when several
    /// raced in) and advance the controller's animation clock.
    pub fn tick(&mut self, now: Instant) {
        let mut latest: Option<GeocodeOutcome> = None;
        while let Ok(outcome) = self.results_rx.try_recv() {
            latest = Some(outcome);
        }

        match latest {
            Some(Ok(selection)) => {
                self.status = None;
                self.controller.select_location(Some(selection));
            }
            Some(Err(GeocodeError::NotFound)) => {
                self.status = Some("Location not found in Canada. Try another search.".into());
            }
            Some(Err(GeocodeError::Transport(reason))) => {
                warn!(%reason, "geocoding failed");
                self.status = Some("Search failed. Please try again.".into());
            }
            None => {}
        }

        self.controller.tick(now);
    }

    pub fn clear_selection(&mut self) {
        self.controller.select_location(None);
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}

/// Canvas dot dimensions of the map panel for a terminal of `width` x
/// `height` cells: search bar (3 rows), status line (1), panel border (2).
pub fn map_area_dots(width: u16, height: u16) -> (usize, usize) {
    let inner_w = (width as usize).saturating_sub(2);
    let inner_h = (height as usize).saturating_sub(3 + 1 + 2);
    (inner_w.max(1) * 2, inner_h.max(1) * 4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_area_accounts_for_chrome() {
        let (w, h) = map_area_dots(80, 24);
        assert_eq!(w, 78 * 2);
        assert_eq!(h, 18 * 4);
    }

    #[test]
    fn map_area_never_zero() {
        let (w, h) = map_area_dots(0, 0);
        assert!(w >= 2 && h >= 4);
    }
}
