//! Blitter backend contract and the concrete pixel-format implementations.
//!
//! A blitter is a strategy for one specific colour depth and storage layout:
//! it encodes loader sprites into its native format, composites them onto
//! destination buffers, and creates surfaces over caller-owned memory. The
//! registry owns exactly one active backend at a time; switching backends is
//! a stop-the-world event for the render pipeline.

mod indexed8;
mod null;
mod registry;
mod rgba32;
mod rgba32_anim;

pub use indexed8::Indexed8Blitter;
pub use null::NullBlitter;
pub use registry::{BlitterInfo, BlitterRegistry};
pub use rgba32::Rgba32Blitter;
pub use rgba32_anim::Rgba32AnimBlitter;

use crate::palette::RecolourTable;
use crate::sprite::{Sprite, SpriteAllocator, SpriteData, ZoomLevel};
use crate::surface::{PixelView, Surface};

/// The modes of blitting we can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlitterMode {
    /// Simple blitting, respecting source transparency.
    Normal,
    /// Remap source colours through the caller-supplied table.
    ColourRemap,
    /// Darken the destination beneath the sprite footprint.
    Transparent,
    /// Remap to the fixed wreck/greyscale table.
    CrashRemap,
    /// Remap to a completely blackened silhouette.
    BlackRemap,
}

/// Who is responsible for cycling animated palette entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteAnimation {
    /// No palette animation at all.
    None,
    /// The video backend cycles the hardware palette (8bpp only).
    VideoBackend,
    /// The blitter tracks animated pixels itself; surfaces recolour them in
    /// `palette_animate`.
    Blitter,
}

/// Parameters for one blit operation. Transient: built on the stack for a
/// single `draw` call, never persisted.
pub struct BlitterParams<'a> {
    /// The sprite, however the encoder stored it.
    pub sprite: &'a Sprite,
    /// Remap table for `ColourRemap` mode.
    pub remap: Option<&'a RecolourTable>,

    /// Source pixels to skip on the left (in destination zoom).
    pub skip_left: i32,
    /// Source pixels to skip on the top.
    pub skip_top: i32,
    /// Width in pixels to draw.
    pub width: i32,
    /// Height in pixels to draw.
    pub height: i32,
    /// Left offset in the destination to start drawing.
    pub left: i32,
    /// Top offset in the destination to start drawing.
    pub top: i32,
}

/// How all blitters should look like.
///
/// The destination of `draw` travels as a [`PixelView`] rather than inside
/// the params: the view carries pitch and extent, and the geometry in
/// `BlitterParams` must fit inside it. That is a caller contract, not a
/// checked error.
pub trait Blitter {
    /// Registry name of this backend.
    fn name(&self) -> &'static str;

    /// One-line descriptor for diagnostics listings.
    fn description(&self) -> &'static str;

    /// Screen depth this blitter works for: 8, 16, 24 or 32 (0 for the null
    /// backend).
    fn screen_depth(&self) -> u8;

    /// Bytes needed to store one pixel. Always `screen_depth() / 8`.
    fn bytes_per_pixel(&self) -> usize;

    /// Whether and where palette animation happens for this backend.
    fn palette_animation(&self) -> PaletteAnimation;

    /// Bytes needed for a video buffer of this size under this backend's
    /// storage layout. Monotone in both arguments; callers size allocations
    /// with it before `create_surface`.
    fn buffer_size(&self, width: u32, height: u32) -> usize;

    /// Convert a loader sprite to this backend's own format. Storage comes
    /// from `allocator`; the backend never picks its own allocation strategy.
    /// Font sprites get a narrower encoding with only the base zoom level.
    fn encode(
        &self,
        sprite: &SpriteData,
        is_font: bool,
        allocator: &mut dyn SpriteAllocator,
    ) -> Sprite;

    /// Composite a sprite onto `dst` according to `params`, `mode` and the
    /// requested zoom level (nearest available level is sampled).
    fn draw(&self, dst: PixelView<'_>, params: &BlitterParams<'_>, mode: BlitterMode, zoom: ZoomLevel);

    /// Wrap caller-allocated memory in a surface for this backend. `buf` must
    /// hold at least `buffer_size(pitch, height)` bytes; the surface never
    /// reallocates it.
    fn create_surface(&self, buf: Vec<u8>, width: u32, height: u32, pitch: u32)
        -> Box<dyn Surface>;
}
