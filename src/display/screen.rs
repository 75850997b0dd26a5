//! Shared visual buffer written by the simulation and read by a presenter.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use crate::display::{PresentationSink, SpriteId, Status};
use crate::game::Coord;

/// What each cell shows, plus the latest status.
#[derive(Debug, Clone)]
pub struct ScreenBuffer {
    width: u16,
    height: u16,
    cells: Vec<SpriteId>,
    status: Status,
}

impl ScreenBuffer {
    /// A blank buffer.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![SpriteId::BACKGROUND; usize::from(width) * usize::from(height)],
            status: Status::default(),
        }
    }

    /// Width in cells.
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Height in cells.
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Sprite shown at `coord`; background outside the buffer.
    #[must_use]
    pub fn get(&self, coord: Coord) -> SpriteId {
        if coord.x >= self.width || coord.y >= self.height {
            return SpriteId::BACKGROUND;
        }
        let idx = usize::from(coord.y) * usize::from(self.width) + usize::from(coord.x);
        self.cells[idx]
    }

    fn set(&mut self, coord: Coord, sprite: SpriteId) {
        if coord.x < self.width && coord.y < self.height {
            let idx = usize::from(coord.y) * usize::from(self.width) + usize::from(coord.x);
            self.cells[idx] = sprite;
        }
    }

    /// Latest status received.
    #[must_use]
    pub const fn status(&self) -> &Status {
        &self.status
    }

    /// Iterate over rows of sprites, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[SpriteId]> {
        self.cells.chunks(usize::from(self.width.max(1)))
    }
}

/// A [`PresentationSink`] that writes into a shared [`ScreenBuffer`].
///
/// Clones share the same buffer.
#[derive(Debug, Clone)]
pub struct Screen {
    buffer: Arc<RwLock<ScreenBuffer>>,
}

impl Screen {
    /// A screen with a blank buffer.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            buffer: Arc::new(RwLock::new(ScreenBuffer::new(width, height))),
        }
    }

    /// Lock the buffer for reading.
    ///
    /// A panic on the writing side does not make the buffer unreadable.
    pub fn read(&self) -> RwLockReadGuard<'_, ScreenBuffer> {
        self.buffer.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current buffer.
    #[must_use]
    pub fn snapshot(&self) -> ScreenBuffer {
        self.read().clone()
    }
}

impl PresentationSink for Screen {
    fn on_cell_changed(&mut self, coord: Coord, sprite: SpriteId) {
        self.buffer
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set(coord, sprite);
    }

    fn on_status(&mut self, status: &Status) {
        self.buffer
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .status = status.clone();
    }
}
