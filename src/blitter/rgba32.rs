//! 32bpp truecolour blitter without palette animation.
//!
//! Pixels are packed RGBA bytes. Encoded sprites keep a colour plane plus a
//! remap-index plane per zoom level; remap modes resolve indices through the
//! game palette at draw time. Animated palette entries render with their base
//! colours and stay static; use the anim variant when that matters.

use crate::blitter::{Blitter, BlitterMode, BlitterParams, PaletteAnimation};
use crate::palette::{Colour, Palette, PaletteId, CRASH_TABLE};
use crate::sprite::{allocate_sprite, Sprite, SpriteAllocator, SpriteData, ZoomLevel};
use crate::surface::{clamp_rect, scroll_plane, PixelView, Rect, Surface};

/// Alpha blend a single colour channel.
/// Fast approximation: (x + 1 + (x >> 8)) >> 8 instead of x / 255.
#[inline]
pub(crate) fn blend_channel(src: u8, dst: u8, alpha: u16) -> u8 {
    let result = src as u16 * alpha + dst as u16 * (255 - alpha);
    ((result + 1 + (result >> 8)) >> 8) as u8
}

/// Write an opaque RGBA pixel.
#[inline]
pub(crate) fn put_pixel(dst: &mut [u8], off: usize, c: Colour) {
    dst[off] = c.r;
    dst[off + 1] = c.g;
    dst[off + 2] = c.b;
    dst[off + 3] = 255;
}

/// Blend an RGBA pixel over the destination with the given source alpha.
#[inline]
pub(crate) fn blend_pixel(dst: &mut [u8], off: usize, c: Colour, alpha: u8) {
    let a = alpha as u16;
    dst[off] = blend_channel(c.r, dst[off], a);
    dst[off + 1] = blend_channel(c.g, dst[off + 1], a);
    dst[off + 2] = blend_channel(c.b, dst[off + 2], a);
    dst[off + 3] = 255;
}

/// Darken a destination pixel in place, the truecolour counterpart of the
/// 8bpp transparency table: three quarters of each channel.
#[inline]
pub(crate) fn darken_pixel(dst: &mut [u8], off: usize) {
    for i in 0..3 {
        let v = dst[off + i];
        dst[off + i] = v - (v >> 2);
    }
    dst[off + 3] = 255;
}

/// Per-level payload layout shared by the 32bpp backends: a colour plane
/// (4 bytes per pixel) followed by a remap-index plane (1 byte per pixel).
pub(crate) const RGBA_ENCODED_BPP: usize = 5;

/// Encode a loader sprite into the shared 32bpp layout.
///
/// Remappable pixels are normalized to their palette colour so remap modes
/// and plain drawing agree on what the sprite looks like.
pub(crate) fn encode_rgba(
    sprite: &SpriteData,
    is_font: bool,
    allocator: &mut dyn SpriteAllocator,
    palette: &Palette,
) -> Sprite {
    let (levels, mut payload) = allocate_sprite(sprite, RGBA_ENCODED_BPP, is_font, allocator);
    for level in &levels {
        let frame = sprite.frame(level.zoom).unwrap();
        let count = frame.pixels.len();
        let (colours, anims) =
            payload[level.offset..level.offset + count * RGBA_ENCODED_BPP].split_at_mut(count * 4);
        for (i, px) in frame.pixels.iter().enumerate() {
            if px.a == 0 {
                continue; // planes are pre-zeroed
            }
            let c = if px.m != 0 {
                palette.entries[px.m as usize]
            } else {
                Colour::rgb(px.r, px.g, px.b)
            };
            colours[i * 4] = c.r;
            colours[i * 4 + 1] = c.g;
            colours[i * 4 + 2] = c.b;
            colours[i * 4 + 3] = px.a;
            anims[i] = px.m;
        }
    }
    Sprite::from_parts(sprite.base(), levels, payload)
}

/// The shared compositing loop for both 32bpp backends.
///
/// `track_anim` selects whether the destination carries a remap-index plane
/// (at `pitch * height * 4`) that must be kept in sync with every write.
pub(crate) fn draw_rgba(
    dst: PixelView<'_>,
    params: &BlitterParams<'_>,
    mode: BlitterMode,
    zoom: ZoomLevel,
    palette: &Palette,
    track_anim: bool,
) {
    let level = params.sprite.level_or_nearest(zoom);
    let lw = level.width as usize;
    let count = lw * level.height as usize;
    let payload = params.sprite.payload();
    let colours = &payload[level.offset..level.offset + count * 4];
    let anims = &payload[level.offset + count * 4..level.offset + count * RGBA_ENCODED_BPP];

    debug_assert!(params.skip_left >= 0 && params.skip_top >= 0);
    debug_assert!(params.skip_left + params.width <= level.width as i32);
    debug_assert!(params.skip_top + params.height <= level.height as i32);

    let PixelView { data, pitch, height } = dst;
    let anim_offset = pitch * height * 4;
    let (colour_dst, anim_dst): (&mut [u8], &mut [u8]) = if track_anim {
        data.split_at_mut(anim_offset)
    } else {
        (data, &mut [])
    };

    for y in 0..params.height {
        let sy = (params.skip_top + y) as usize;
        let dy = (params.top + y) as usize;
        for x in 0..params.width {
            let sx = (params.skip_left + x) as usize;
            let si = sy * lw + sx;
            let alpha = colours[si * 4 + 3];
            if alpha == 0 {
                continue;
            }
            let src = Colour::rgb(colours[si * 4], colours[si * 4 + 1], colours[si * 4 + 2]);
            let m = anims[si];

            let di = dy * pitch + (params.left + x) as usize;
            let off = di * 4;

            // (colour, anim index) actually written, None to skip the pixel
            let resolved: Option<(Colour, u8)> = match mode {
                BlitterMode::Normal => Some((src, m)),
                BlitterMode::ColourRemap => {
                    if m == 0 {
                        Some((src, 0))
                    } else {
                        let remapped = params.remap.map_or(m, |remap| remap[m as usize]);
                        if remapped == 0 {
                            None
                        } else {
                            Some((palette.entries[remapped as usize], remapped))
                        }
                    }
                }
                BlitterMode::Transparent => {
                    darken_pixel(colour_dst, off);
                    if track_anim {
                        anim_dst[di] = 0;
                    }
                    None
                }
                BlitterMode::CrashRemap => {
                    if m == 0 {
                        let lum = src.luminance();
                        Some((Colour::rgb(lum, lum, lum), 0))
                    } else {
                        let remapped = CRASH_TABLE[m as usize];
                        if remapped == 0 {
                            None
                        } else {
                            Some((palette.entries[remapped as usize], remapped))
                        }
                    }
                }
                BlitterMode::BlackRemap => Some((Colour::rgb(0, 0, 0), 0)),
            };

            let Some((colour, anim)) = resolved else {
                continue;
            };

            if alpha == 255 {
                put_pixel(colour_dst, off, colour);
            } else {
                blend_pixel(colour_dst, off, colour, alpha);
            }
            if track_anim {
                // Blended pixels are no longer a pure palette colour
                anim_dst[di] = if alpha == 255 { anim } else { 0 };
            }
        }
    }
}

pub struct Rgba32Blitter {
    palette: Palette,
}

impl Rgba32Blitter {
    pub fn new() -> Self {
        Self {
            palette: Palette::game_default(),
        }
    }
}

impl Default for Rgba32Blitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Blitter for Rgba32Blitter {
    fn name(&self) -> &'static str {
        "32bpp-simple"
    }

    fn description(&self) -> &'static str {
        "32bpp RGBA blitter (no palette animation)"
    }

    fn screen_depth(&self) -> u8 {
        32
    }

    fn bytes_per_pixel(&self) -> usize {
        4
    }

    fn palette_animation(&self) -> PaletteAnimation {
        PaletteAnimation::None
    }

    fn buffer_size(&self, width: u32, height: u32) -> usize {
        width as usize * height as usize * 4
    }

    fn encode(
        &self,
        sprite: &SpriteData,
        is_font: bool,
        allocator: &mut dyn SpriteAllocator,
    ) -> Sprite {
        encode_rgba(sprite, is_font, allocator, &self.palette)
    }

    fn draw(
        &self,
        dst: PixelView<'_>,
        params: &BlitterParams<'_>,
        mode: BlitterMode,
        zoom: ZoomLevel,
    ) {
        draw_rgba(dst, params, mode, zoom, &self.palette, false);
    }

    fn create_surface(
        &self,
        buf: Vec<u8>,
        width: u32,
        height: u32,
        pitch: u32,
    ) -> Box<dyn Surface> {
        assert!(pitch >= width);
        assert!(buf.len() >= self.buffer_size(pitch, height));
        Box::new(Rgba32Surface {
            data: buf,
            width,
            height,
            pitch,
            palette: self.palette.clone(),
        })
    }
}

/// Surface over a packed RGBA buffer.
pub struct Rgba32Surface {
    data: Vec<u8>,
    width: u32,
    height: u32,
    pitch: u32,
    palette: Palette,
}

impl Rgba32Surface {
    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && (x as u32) < self.width && y >= 0 && (y as u32) < self.height
    }
}

impl Surface for Rgba32Surface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pitch(&self) -> u32 {
        self.pitch
    }

    fn bytes_per_pixel(&self) -> usize {
        4
    }

    fn view(&mut self) -> PixelView<'_> {
        PixelView {
            data: &mut self.data,
            pitch: self.pitch as usize,
            height: self.height as usize,
        }
    }

    fn set_pixel(&mut self, x: i32, y: i32, colour: u8) {
        if self.in_bounds(x, y) {
            let off = self.pixel_offset(x, y);
            let c = self.palette.entries[colour as usize];
            put_pixel(&mut self.data, off, c);
        }
    }

    fn draw_rect(&mut self, x: i32, y: i32, width: i32, height: i32, colour: u8) {
        let Some((x, y, w, h)) = clamp_rect(self.width, self.height, x, y, width, height) else {
            return;
        };
        let c = self.palette.entries[colour as usize];
        for row in y..y + h {
            for col in x..x + w {
                let off = ((row * self.pitch + col) * 4) as usize;
                put_pixel(&mut self.data, off, c);
            }
        }
    }

    fn recolour_rect(&mut self, x: i32, y: i32, width: i32, height: i32, pal: PaletteId) {
        let Some((x, y, w, h)) = clamp_rect(self.width, self.height, x, y, width, height) else {
            return;
        };
        let table = pal.table();
        for row in y..y + h {
            for col in x..x + w {
                let off = ((row * self.pitch + col) * 4) as usize;
                let current = Colour::rgb(self.data[off], self.data[off + 1], self.data[off + 2]);
                let idx = self.palette.nearest_index(current);
                let mapped = table[idx as usize];
                if mapped != 0 {
                    put_pixel(&mut self.data, off, self.palette.entries[mapped as usize]);
                }
            }
        }
    }

    fn scroll(&mut self, rect: &mut Rect, scroll_x: i32, scroll_y: i32) {
        scroll_plane(&mut self.data, self.pitch as usize, 4, rect, scroll_x, scroll_y);
    }

    fn copy(&self, x: i32, y: i32, width: i32, height: i32) -> Vec<u8> {
        debug_assert!(self.in_bounds(x, y));
        let mut out = Vec::with_capacity((width * height * 4) as usize);
        for row in 0..height {
            let start = self.pixel_offset(x, y + row);
            out.extend_from_slice(&self.data[start..start + width as usize * 4]);
        }
        out
    }

    fn paste(&mut self, src: &[u8], x: i32, y: i32, width: i32, height: i32) {
        debug_assert_eq!(src.len(), (width * height * 4) as usize);
        let row_len = width as usize * 4;
        for row in 0..height {
            let start = self.pixel_offset(x, y + row);
            let src_start = row as usize * row_len;
            self.data[start..start + row_len].copy_from_slice(&src[src_start..src_start + row_len]);
        }
    }

    fn export_lines(&self, dst: &mut [u8], dst_pitch: usize, y: u32, height: u32) {
        debug_assert!(dst_pitch >= self.width as usize * 4);
        debug_assert!(y + height <= self.height);
        let row_len = self.width as usize * 4;
        for row in 0..height as usize {
            let src_start = (y as usize + row) * self.pitch as usize * 4;
            let out = &mut dst[row * dst_pitch..(row + 1) * dst_pitch];
            out[..row_len].copy_from_slice(&self.data[src_start..src_start + row_len]);
            out[row_len..].fill(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::identity_table;
    use crate::sprite::{HeapAllocator, SpriteColour, SpriteFrame};
    use pretty_assertions::assert_eq;

    fn rgb_frame(width: u32, height: u32) -> SpriteFrame {
        let mut frame = SpriteFrame::new(width, height, 0, 0);
        for y in 0..height {
            for x in 0..width {
                frame.set_pixel(
                    x,
                    y,
                    SpriteColour {
                        r: (x * 30) as u8,
                        g: (y * 40) as u8,
                        b: 200,
                        a: 255,
                        m: 0,
                    },
                );
            }
        }
        frame
    }

    fn remappable_frame(width: u32, height: u32, base_index: u8) -> SpriteFrame {
        let mut frame = SpriteFrame::new(width, height, 0, 0);
        for y in 0..height {
            for x in 0..width {
                frame.set_pixel(
                    x,
                    y,
                    SpriteColour {
                        r: 0,
                        g: 0,
                        b: 0,
                        a: 255,
                        m: base_index + ((x + y) % 4) as u8,
                    },
                );
            }
        }
        frame
    }

    fn blank_surface(blitter: &Rgba32Blitter, width: u32, height: u32) -> Box<dyn Surface> {
        let buf = vec![0u8; blitter.buffer_size(width, height)];
        blitter.create_surface(buf, width, height, width)
    }

    fn draw_full(
        blitter: &Rgba32Blitter,
        surface: &mut dyn Surface,
        sprite: &Sprite,
        mode: BlitterMode,
        remap: Option<&crate::palette::RecolourTable>,
    ) {
        let params = BlitterParams {
            sprite,
            remap,
            skip_left: 0,
            skip_top: 0,
            width: sprite.width as i32,
            height: sprite.height as i32,
            left: 0,
            top: 0,
        };
        blitter.draw(surface.view(), &params, mode, ZoomLevel::Normal);
    }

    fn export(surface: &dyn Surface, width: u32, height: u32) -> Vec<u8> {
        let mut out = vec![0u8; (width * height * 4) as usize];
        surface.export_lines(&mut out, width as usize * 4, 0, height);
        out
    }

    #[test]
    fn test_depth_matches_bytes_per_pixel() {
        let blitter = Rgba32Blitter::new();
        assert_eq!(blitter.bytes_per_pixel() * 8, blitter.screen_depth() as usize);
    }

    #[test]
    fn test_encode_draw_roundtrip_opaque() {
        let blitter = Rgba32Blitter::new();
        let frame = rgb_frame(5, 3);
        let data = SpriteData::new(frame.clone());
        let sprite = blitter.encode(&data, false, &mut HeapAllocator);

        let mut surface = blank_surface(&blitter, 5, 3);
        draw_full(&blitter, surface.as_mut(), &sprite, BlitterMode::Normal, None);

        let out = export(surface.as_ref(), 5, 3);
        for y in 0..3 {
            for x in 0..5 {
                let px = frame.pixel(x, y);
                let off = ((y * 5 + x) * 4) as usize;
                assert_eq!(&out[off..off + 4], &[px.r, px.g, px.b, 255]);
            }
        }
    }

    #[test]
    fn test_identity_remap_matches_normal() {
        let blitter = Rgba32Blitter::new();
        let data = SpriteData::new(remappable_frame(6, 4, 80));
        let sprite = blitter.encode(&data, false, &mut HeapAllocator);
        let identity = identity_table();

        let mut normal = blank_surface(&blitter, 6, 4);
        let mut remapped = blank_surface(&blitter, 6, 4);
        draw_full(&blitter, normal.as_mut(), &sprite, BlitterMode::Normal, None);
        draw_full(
            &blitter,
            remapped.as_mut(),
            &sprite,
            BlitterMode::ColourRemap,
            Some(&identity),
        );

        assert_eq!(export(normal.as_ref(), 6, 4), export(remapped.as_ref(), 6, 4));
    }

    #[test]
    fn test_semi_transparent_blends() {
        let blitter = Rgba32Blitter::new();
        let mut frame = SpriteFrame::new(1, 1, 0, 0);
        frame.set_pixel(
            0,
            0,
            SpriteColour {
                r: 255,
                g: 0,
                b: 0,
                a: 128,
                m: 0,
            },
        );
        let sprite = blitter.encode(&SpriteData::new(frame), false, &mut HeapAllocator);

        let mut surface = blank_surface(&blitter, 1, 1);
        surface.draw_rect(0, 0, 1, 1, crate::palette::BLACK_INDEX);
        draw_full(&blitter, surface.as_mut(), &sprite, BlitterMode::Normal, None);

        let out = export(surface.as_ref(), 1, 1);
        // Half red over black: red channel near the midpoint, rest dark
        assert!(out[0] > 120 && out[0] < 136, "r = {}", out[0]);
        assert_eq!(out[1], 0);
        assert_eq!(out[3], 255);
    }

    #[test]
    fn test_transparent_mode_darkens_destination() {
        let blitter = Rgba32Blitter::new();
        let data = SpriteData::new(remappable_frame(2, 2, 60));
        let sprite = blitter.encode(&data, false, &mut HeapAllocator);

        let mut surface = blank_surface(&blitter, 2, 2);
        surface.draw_rect(0, 0, 2, 2, 248); // white
        draw_full(&blitter, surface.as_mut(), &sprite, BlitterMode::Transparent, None);

        let out = export(surface.as_ref(), 2, 2);
        // 255 - 255/4 = 192 on every channel
        assert_eq!(&out[..4], &[192, 192, 192, 255]);
    }

    #[test]
    fn test_black_remap_silhouette() {
        let blitter = Rgba32Blitter::new();
        let data = SpriteData::new(rgb_frame(3, 3));
        let sprite = blitter.encode(&data, false, &mut HeapAllocator);

        let mut surface = blank_surface(&blitter, 3, 3);
        draw_full(&blitter, surface.as_mut(), &sprite, BlitterMode::BlackRemap, None);

        let out = export(surface.as_ref(), 3, 3);
        for px in out.chunks_exact(4) {
            assert_eq!(px, &[0, 0, 0, 255]);
        }
    }

    #[test]
    fn test_copy_paste_roundtrip() {
        let blitter = Rgba32Blitter::new();
        let data = SpriteData::new(rgb_frame(6, 6));
        let sprite = blitter.encode(&data, false, &mut HeapAllocator);

        let mut surface = blank_surface(&blitter, 6, 6);
        draw_full(&blitter, surface.as_mut(), &sprite, BlitterMode::Normal, None);

        let before = export(surface.as_ref(), 6, 6);
        let saved = surface.copy(2, 2, 3, 3);
        surface.draw_rect(2, 2, 3, 3, 249);
        surface.paste(&saved, 2, 2, 3, 3);
        assert_eq!(before, export(surface.as_ref(), 6, 6));
    }

    #[test]
    fn test_export_lines_length_contract() {
        let blitter = Rgba32Blitter::new();
        let mut surface = blank_surface(&blitter, 3, 4);
        surface.draw_rect(0, 0, 3, 4, 250);

        let dst_pitch = 3 * 4 + 4;
        let mut out = vec![0xAAu8; 2 * dst_pitch];
        surface.export_lines(&mut out, dst_pitch, 1, 2);
        // Padding bytes are written too
        assert_eq!(&out[12..16], &[0, 0, 0, 0]);
        let green = &out[..4];
        assert_eq!(green, &[0, 255, 0, 255]);
    }

    #[test]
    fn test_zoomed_draw_uses_smaller_level() {
        let blitter = Rgba32Blitter::new();
        let data = SpriteData::with_mipmaps(rgb_frame(8, 8));
        let sprite = blitter.encode(&data, false, &mut HeapAllocator);

        let (w, h) = sprite.zoom_dimensions(ZoomLevel::Out2x);
        assert_eq!((w, h), (4, 4));

        let mut surface = blank_surface(&blitter, 4, 4);
        let params = BlitterParams {
            sprite: &sprite,
            remap: None,
            skip_left: 0,
            skip_top: 0,
            width: 4,
            height: 4,
            left: 0,
            top: 0,
        };
        blitter.draw(surface.view(), &params, BlitterMode::Normal, ZoomLevel::Out2x);

        let out = export(surface.as_ref(), 4, 4);
        // Zoomed pixel (1,1) samples base pixel (2,2)
        let base = data.base().pixel(2, 2);
        assert_eq!(&out[(4 + 1) * 4..(4 + 1) * 4 + 4], &[base.r, base.g, base.b, 255]);
    }
}
