mod canvas;
mod controller;
mod overlay;
mod surface;
mod terminal;
mod viewport;

pub use canvas::DotCanvas;
pub use controller::{LocationSelection, ViewController, DEFAULT_CENTER, DEFAULT_ZOOM};
pub use terminal::TerminalSurface;
