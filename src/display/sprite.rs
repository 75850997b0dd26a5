//! Sprites and the registry that hands out sprite ids.

use std::path::{Path, PathBuf};

use rand::Rng;

/// Opaque handle of a registered sprite. Id 0 is the background.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpriteId(u32);

impl SpriteId {
    /// The empty-cell sprite.
    pub const BACKGROUND: SpriteId = SpriteId(0);

    /// Wrap a raw id.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw id.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Whether this is the background sprite.
    #[must_use]
    pub const fn is_background(self) -> bool {
        self.0 == 0
    }
}

/// A 24-bit colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Create a colour.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB`.
    #[must_use]
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// A uniformly random colour.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::new(rng.random(), rng.random(), rng.random())
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// What to draw on a unit's cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Sprite {
    /// A solid square.
    Color(Rgb),
    /// An image file.
    Image(PathBuf),
}

impl Sprite {
    /// Interpret a sprite string: `#RRGGBB` is a colour, anything else an
    /// image path relative to `base`.
    ///
    /// Returns `None` for a string that starts with `#` but is not a colour.
    #[must_use]
    pub fn parse(s: &str, base: &Path) -> Option<Self> {
        if s.starts_with('#') {
            Rgb::from_hex(s).map(Sprite::Color)
        } else if s.is_empty() {
            None
        } else {
            Some(Sprite::Image(base.join(s)))
        }
    }

    /// Colour used where images cannot be drawn.
    ///
    /// Images get a stable colour derived from their path.
    #[must_use]
    pub fn swatch(&self) -> Rgb {
        match self {
            Sprite::Color(rgb) => *rgb,
            Sprite::Image(path) => {
                // FNV-1a over the path bytes.
                let hash = path
                    .to_string_lossy()
                    .bytes()
                    .fold(0x811c_9dc5_u32, |h, b| {
                        (h ^ u32::from(b)).wrapping_mul(0x0100_0193)
                    });
                let [r, g, b, _] = hash.to_le_bytes();
                Rgb::new(r | 0x40, g | 0x40, b | 0x40)
            }
        }
    }
}

/// Registry of sprites. Equal sprites share one id.
#[derive(Debug, Clone, Default)]
pub struct SpriteSheet {
    /// Registered sprites; index `i` has id `i + 1`.
    sprites: Vec<Sprite>,
}

impl SpriteSheet {
    /// Create an empty sheet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sprite and return its id.
    pub fn register(&mut self, sprite: Sprite) -> SpriteId {
        let index = match self.sprites.iter().position(|s| *s == sprite) {
            Some(index) => index,
            None => {
                self.sprites.push(sprite);
                self.sprites.len() - 1
            }
        };
        #[allow(clippy::cast_possible_truncation)]
        SpriteId::new(index as u32 + 1)
    }

    /// Look up a sprite. The background has no sprite.
    #[must_use]
    pub fn get(&self, id: SpriteId) -> Option<&Sprite> {
        let index = usize::try_from(id.raw()).ok()?.checked_sub(1)?;
        self.sprites.get(index)
    }

    /// Number of registered sprites.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    /// True if nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_parsing() {
        assert_eq!(Rgb::from_hex("#FF8000"), Some(Rgb::new(255, 128, 0)));
        assert_eq!(Rgb::from_hex("#ff8000"), Some(Rgb::new(255, 128, 0)));
        assert_eq!(Rgb::from_hex("FF8000"), None);
        assert_eq!(Rgb::from_hex("#FF80"), None);
        assert_eq!(Rgb::from_hex("#GG0000"), None);
        assert_eq!(Rgb::from_hex("#ééé"), None);
        assert_eq!(Rgb::new(1, 2, 255).to_string(), "#0102FF");
    }

    #[test]
    fn test_sprite_parse() {
        let base = Path::new("leagues/red");
        assert_eq!(
            Sprite::parse("#000000", base),
            Some(Sprite::Color(Rgb::new(0, 0, 0)))
        );
        assert_eq!(
            Sprite::parse("unit.bmp", base),
            Some(Sprite::Image(PathBuf::from("leagues/red/unit.bmp")))
        );
        assert_eq!(Sprite::parse("#nope", base), None);
        assert_eq!(Sprite::parse("", base), None);
    }

    #[test]
    fn test_sheet_ids_start_at_one_and_dedupe() {
        let mut sheet = SpriteSheet::new();
        let red = sheet.register(Sprite::Color(Rgb::new(255, 0, 0)));
        let blue = sheet.register(Sprite::Color(Rgb::new(0, 0, 255)));
        let red_again = sheet.register(Sprite::Color(Rgb::new(255, 0, 0)));

        assert_eq!(red, SpriteId::new(1));
        assert_eq!(blue, SpriteId::new(2));
        assert_eq!(red, red_again);
        assert_eq!(sheet.len(), 2);
        assert_eq!(sheet.get(SpriteId::BACKGROUND), None);
        assert_eq!(sheet.get(blue), Some(&Sprite::Color(Rgb::new(0, 0, 255))));
    }

    #[test]
    fn test_image_swatch_is_stable() {
        let a = Sprite::Image(PathBuf::from("a.png"));
        assert_eq!(a.swatch(), a.clone().swatch());
        assert_eq!(Sprite::Color(Rgb::new(1, 2, 3)).swatch(), Rgb::new(1, 2, 3));
    }
}
