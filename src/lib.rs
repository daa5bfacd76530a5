//! Pixel-format-independent software blitting for tile-based 2D rendering.
//!
//! The crate is built around three pieces:
//!
//! - [`Blitter`]: a strategy for one colour depth and storage layout. It
//!   encodes loader sprites into its native format, composites them onto
//!   destination buffers, and creates [`Surface`]s over caller-owned memory.
//! - [`Surface`]: an owned canvas in backend-native encoding with low-level
//!   primitives (pixels, lines, fills, recolouring, scrolling, palette
//!   animation, region capture/restore, stable row export).
//! - [`BlitterRegistry`]: selects and owns the single active backend,
//!   falling back to autodetection for unknown names.
//!
//! Everything here runs on the render thread; no operation is safe to call
//! concurrently on the same surface without external synchronization, and
//! backend switches must happen while the pipeline is idle.

pub mod blitter;
pub mod config;
pub mod palette;
pub mod sprite;
pub mod surface;
pub mod util;
pub mod video;

pub use blitter::{
    Blitter, BlitterMode, BlitterParams, BlitterRegistry, Indexed8Blitter, NullBlitter,
    PaletteAnimation, Rgba32AnimBlitter, Rgba32Blitter,
};
pub use config::DisplayConfig;
pub use palette::{Colour, Palette, PaletteId, RecolourTable};
pub use sprite::{
    CacheAllocator, HeapAllocator, Sprite, SpriteAllocator, SpriteColour, SpriteData, SpriteFrame,
    ZoomLevel,
};
pub use surface::{PixelView, Rect, Surface};
