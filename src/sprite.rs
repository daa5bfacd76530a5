//! Loader-side and encoded sprite representations.
//!
//! `SpriteData` is the universal format produced by sprite decoding: raw RGBA
//! plus a remap channel, one frame per zoom level. Backends turn it into an
//! opaque [`Sprite`] via `Blitter::encode`, using a caller-supplied
//! [`SpriteAllocator`] so sprite caches control their own memory accounting.

/// Pre-rendered resolution variants of a sprite, coarsest last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoomLevel {
    Normal,
    Out2x,
    Out4x,
    Out8x,
}

impl ZoomLevel {
    pub const COUNT: usize = 4;
    pub const ALL: [ZoomLevel; Self::COUNT] = [
        ZoomLevel::Normal,
        ZoomLevel::Out2x,
        ZoomLevel::Out4x,
        ZoomLevel::Out8x,
    ];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            ZoomLevel::Normal => 0,
            ZoomLevel::Out2x => 1,
            ZoomLevel::Out4x => 2,
            ZoomLevel::Out8x => 3,
        }
    }
}

/// One pixel of a loader sprite: colour, alpha, and the remap channel.
///
/// `m` is the palette index used for colour remapping (team liveries, crash
/// recolouring); 0 means the pixel is not remappable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpriteColour {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
    pub m: u8,
}

/// One zoom level of a loader sprite.
#[derive(Debug, Clone)]
pub struct SpriteFrame {
    pub width: u32,
    pub height: u32,
    pub x_offs: i32,
    pub y_offs: i32,
    pub pixels: Vec<SpriteColour>,
}

impl SpriteFrame {
    pub fn new(width: u32, height: u32, x_offs: i32, y_offs: i32) -> Self {
        Self {
            width,
            height,
            x_offs,
            y_offs,
            pixels: vec![SpriteColour::default(); (width * height) as usize],
        }
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> SpriteColour {
        self.pixels[(y * self.width + x) as usize]
    }

    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, colour: SpriteColour) {
        self.pixels[(y * self.width + x) as usize] = colour;
    }

    /// Produce the next coarser zoom level by nearest sampling.
    pub fn scaled_down(&self) -> SpriteFrame {
        let width = (self.width / 2).max(1);
        let height = (self.height / 2).max(1);
        let mut out = SpriteFrame::new(width, height, self.x_offs / 2, self.y_offs / 2);
        for y in 0..height {
            for x in 0..width {
                out.set_pixel(x, y, self.pixel((x * 2).min(self.width - 1), (y * 2).min(self.height - 1)));
            }
        }
        out
    }
}

/// A loader sprite: per-zoom frames, base level always present.
#[derive(Clone)]
pub struct SpriteData {
    frames: [Option<SpriteFrame>; ZoomLevel::COUNT],
}

impl SpriteData {
    /// Sprite with only the base zoom level.
    pub fn new(base: SpriteFrame) -> Self {
        let mut frames: [Option<SpriteFrame>; ZoomLevel::COUNT] = Default::default();
        frames[0] = Some(base);
        Self { frames }
    }

    /// Sprite with all coarser levels generated from the base by nearest
    /// sampling, the way a loader without pre-drawn zoom art fills them in.
    pub fn with_mipmaps(base: SpriteFrame) -> Self {
        let mut data = Self::new(base);
        for i in 1..ZoomLevel::COUNT {
            let prev = data.frames[i - 1].as_ref().unwrap();
            data.frames[i] = Some(prev.scaled_down());
        }
        data
    }

    pub fn set_frame(&mut self, zoom: ZoomLevel, frame: SpriteFrame) {
        self.frames[zoom.index()] = Some(frame);
    }

    pub fn frame(&self, zoom: ZoomLevel) -> Option<&SpriteFrame> {
        self.frames[zoom.index()].as_ref()
    }

    pub fn base(&self) -> &SpriteFrame {
        self.frames[0].as_ref().unwrap()
    }

    /// Frames present, in zoom order. At least the base level.
    pub fn present_frames(&self) -> impl Iterator<Item = (ZoomLevel, &SpriteFrame)> {
        ZoomLevel::ALL
            .iter()
            .filter_map(move |&zoom| self.frames[zoom.index()].as_ref().map(|f| (zoom, f)))
    }
}

// ============================================================================
// Allocation
// ============================================================================

/// Allocation capability handed to `Blitter::encode`.
///
/// The backend never chooses its own allocation strategy; whoever owns the
/// sprite cache decides where encoded payloads live. The contract is
/// infallible: implementations return a zeroed buffer of exactly `len` bytes.
pub trait SpriteAllocator {
    fn alloc(&mut self, len: usize) -> Box<[u8]>;
}

/// Plain heap allocation, no accounting.
pub struct HeapAllocator;

impl SpriteAllocator for HeapAllocator {
    fn alloc(&mut self, len: usize) -> Box<[u8]> {
        vec![0u8; len].into_boxed_slice()
    }
}

/// Heap allocation with running byte accounting, for cache budgeting.
#[derive(Default)]
pub struct CacheAllocator {
    total: usize,
}

impl CacheAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total bytes handed out so far.
    pub fn total_allocated(&self) -> usize {
        self.total
    }
}

impl SpriteAllocator for CacheAllocator {
    fn alloc(&mut self, len: usize) -> Box<[u8]> {
        self.total += len;
        vec![0u8; len].into_boxed_slice()
    }
}

// ============================================================================
// Encoded sprite
// ============================================================================

/// Geometry and payload location of one encoded zoom level.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SpriteLevel {
    pub zoom: ZoomLevel,
    pub width: u32,
    pub height: u32,
    pub offset: usize,
}

/// A sprite in backend-native storage.
///
/// Metadata (draw anchor, base dimensions) is public; the payload layout is
/// private to the backend that encoded it. Immutable once encoded.
pub struct Sprite {
    pub width: u32,
    pub height: u32,
    pub x_offs: i32,
    pub y_offs: i32,
    levels: Vec<SpriteLevel>,
    data: Box<[u8]>,
}

impl Sprite {
    pub(crate) fn from_parts(
        base: &SpriteFrame,
        levels: Vec<SpriteLevel>,
        data: Box<[u8]>,
    ) -> Self {
        Self {
            width: base.width,
            height: base.height,
            x_offs: base.x_offs,
            y_offs: base.y_offs,
            levels,
            data,
        }
    }

    pub(crate) fn payload(&self) -> &[u8] {
        &self.data
    }

    /// The requested level, or the nearest coarser one present, or the base
    /// level as a last resort. Sampling is nearest-level, never interpolated.
    pub(crate) fn level_or_nearest(&self, zoom: ZoomLevel) -> &SpriteLevel {
        self.levels
            .iter()
            .find(|l| l.zoom == zoom)
            .or_else(|| self.levels.iter().find(|l| l.zoom.index() > zoom.index()))
            .unwrap_or(&self.levels[0])
    }

    /// Dimensions of the level `draw` would sample for `zoom`.
    pub fn zoom_dimensions(&self, zoom: ZoomLevel) -> (u32, u32) {
        let level = self.level_or_nearest(zoom);
        (level.width, level.height)
    }
}

/// Lay out an encoded sprite: compute level offsets from per-level payload
/// sizes and allocate the whole payload in one go. The backend fills the
/// payload and seals it with [`Sprite::from_parts`].
///
/// The generic factory counterpart of hand-rolled per-backend allocation:
/// `bytes_per_pixel_encoded` is the backend's native per-pixel payload size.
pub(crate) fn allocate_sprite(
    data: &SpriteData,
    bytes_per_pixel_encoded: usize,
    only_base: bool,
    allocator: &mut dyn SpriteAllocator,
) -> (Vec<SpriteLevel>, Box<[u8]>) {
    let mut levels = Vec::new();
    let mut offset = 0usize;
    for (zoom, frame) in data.present_frames() {
        levels.push(SpriteLevel {
            zoom,
            width: frame.width,
            height: frame.height,
            offset,
        });
        offset += frame.width as usize * frame.height as usize * bytes_per_pixel_encoded;
        if only_base {
            break;
        }
    }
    (levels, allocator.alloc(offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn solid_frame(width: u32, height: u32) -> SpriteFrame {
        let mut frame = SpriteFrame::new(width, height, 0, 0);
        for y in 0..height {
            for x in 0..width {
                frame.set_pixel(
                    x,
                    y,
                    SpriteColour {
                        r: x as u8,
                        g: y as u8,
                        b: 0,
                        a: 255,
                        m: 0,
                    },
                );
            }
        }
        frame
    }

    #[test]
    fn test_mipmaps_halve_dimensions() {
        let data = SpriteData::with_mipmaps(solid_frame(16, 8));
        assert_eq!(data.frame(ZoomLevel::Out2x).unwrap().width, 8);
        assert_eq!(data.frame(ZoomLevel::Out4x).unwrap().width, 4);
        assert_eq!(data.frame(ZoomLevel::Out8x).unwrap().height, 1);
    }

    #[test]
    fn test_scaled_down_never_degenerates() {
        let frame = solid_frame(1, 1);
        let down = frame.scaled_down();
        assert_eq!((down.width, down.height), (1, 1));
    }

    #[test]
    fn test_cache_allocator_accounts_bytes() {
        let mut allocator = CacheAllocator::new();
        let a = allocator.alloc(64);
        let b = allocator.alloc(16);
        assert_eq!(a.len(), 64);
        assert_eq!(b.len(), 16);
        assert_eq!(allocator.total_allocated(), 80);
    }

    #[test]
    fn test_level_fallback_prefers_coarser() {
        let mut data = SpriteData::new(solid_frame(8, 8));
        data.set_frame(ZoomLevel::Out4x, solid_frame(2, 2));
        let (levels, payload) = allocate_sprite(&data, 1, false, &mut HeapAllocator);
        let sprite = Sprite::from_parts(data.base(), levels, payload);

        // Exact match
        assert_eq!(sprite.zoom_dimensions(ZoomLevel::Out4x), (2, 2));
        // Missing level falls back to the nearest coarser one present
        assert_eq!(sprite.zoom_dimensions(ZoomLevel::Out2x), (2, 2));
        // Coarser than everything present falls back to base
        assert_eq!(sprite.zoom_dimensions(ZoomLevel::Out8x), (8, 8));
    }
}
