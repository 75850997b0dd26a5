//! Presentation boundary: sprites, the sink trait and the shared screen buffer.
//!
//! The simulation thread writes cell changes through a [`PresentationSink`];
//! a presenter on another thread reads a [`Screen`] and draws it.

mod screen;
mod sink;
mod sprite;

pub use screen::{Screen, ScreenBuffer};
pub use sink::{LeagueStatus, NullSink, PresentationSink, Status};
pub use sprite::{Rgb, Sprite, SpriteId, SpriteSheet};
