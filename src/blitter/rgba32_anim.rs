//! 32bpp truecolour blitter with blitter-side palette animation.
//!
//! Same encoding and compositing as the simple 32bpp backend, but every
//! surface carries a parallel remap-index plane: one byte per pixel recording
//! which palette entry the pixel was drawn with (0 for static pixels). When
//! the palette cycles, `palette_animate` rewrites exactly the pixels whose
//! recorded index falls in the dirty range. The caller-allocated buffer holds
//! the colour plane followed by the index plane, which is why `buffer_size`
//! is five bytes per pixel.

use crate::blitter::rgba32::{draw_rgba, encode_rgba, put_pixel, RGBA_ENCODED_BPP};
use crate::blitter::{Blitter, BlitterMode, BlitterParams, PaletteAnimation};
use crate::palette::{Colour, Palette, PaletteId};
use crate::sprite::{Sprite, SpriteAllocator, SpriteData, ZoomLevel};
use crate::surface::{clamp_rect, scroll_plane, PixelView, Rect, Surface};

pub struct Rgba32AnimBlitter {
    palette: Palette,
}

impl Rgba32AnimBlitter {
    pub fn new() -> Self {
        Self {
            palette: Palette::game_default(),
        }
    }
}

impl Default for Rgba32AnimBlitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Blitter for Rgba32AnimBlitter {
    fn name(&self) -> &'static str {
        "32bpp-anim"
    }

    fn description(&self) -> &'static str {
        "32bpp RGBA blitter with palette animation"
    }

    fn screen_depth(&self) -> u8 {
        32
    }

    fn bytes_per_pixel(&self) -> usize {
        4
    }

    fn palette_animation(&self) -> PaletteAnimation {
        PaletteAnimation::Blitter
    }

    fn buffer_size(&self, width: u32, height: u32) -> usize {
        // Colour plane plus the remap-index plane
        width as usize * height as usize * RGBA_ENCODED_BPP
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
        draw_rgba(dst, params, mode, zoom, &self.palette, true);
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
        Box::new(Rgba32AnimSurface {
            data: buf,
            width,
            height,
            pitch,
            palette: self.palette.clone(),
        })
    }
}

/// Surface over a colour plane plus remap-index plane.
pub struct Rgba32AnimSurface {
    data: Vec<u8>,
    width: u32,
    height: u32,
    pitch: u32,
    palette: Palette,
}

impl Rgba32AnimSurface {
    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && (x as u32) < self.width && y >= 0 && (y as u32) < self.height
    }

    #[inline]
    fn anim_offset(&self) -> usize {
        self.pitch as usize * self.height as usize * 4
    }

    /// Write colour and record the palette index it came from.
    fn put_indexed(&mut self, x: u32, y: u32, index: u8) {
        let anim_offset = self.anim_offset();
        let pi = (y * self.pitch + x) as usize;
        let c = self.palette.entries[index as usize];
        put_pixel(&mut self.data, pi * 4, c);
        self.data[anim_offset + pi] = index;
    }
}

impl Surface for Rgba32AnimSurface {
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
            self.put_indexed(x as u32, y as u32, colour);
        }
    }

    fn draw_rect(&mut self, x: i32, y: i32, width: i32, height: i32, colour: u8) {
        let Some((x, y, w, h)) = clamp_rect(self.width, self.height, x, y, width, height) else {
            return;
        };
        for row in y..y + h {
            for col in x..x + w {
                self.put_indexed(col, row, colour);
            }
        }
    }

    fn recolour_rect(&mut self, x: i32, y: i32, width: i32, height: i32, pal: PaletteId) {
        let Some((x, y, w, h)) = clamp_rect(self.width, self.height, x, y, width, height) else {
            return;
        };
        let table = pal.table();
        let anim_offset = self.anim_offset();
        for row in y..y + h {
            for col in x..x + w {
                let pi = (row * self.pitch + col) as usize;
                let index = self.data[anim_offset + pi];
                if index != 0 {
                    // Pure palette pixel: remap through its recorded index
                    let mapped = table[index as usize];
                    if mapped != 0 {
                        self.put_indexed(col, row, mapped);
                    }
                } else {
                    let off = pi * 4;
                    let current =
                        Colour::rgb(self.data[off], self.data[off + 1], self.data[off + 2]);
                    let idx = self.palette.nearest_index(current);
                    let mapped = table[idx as usize];
                    if mapped != 0 {
                        put_pixel(&mut self.data, off, self.palette.entries[mapped as usize]);
                    }
                }
            }
        }
    }

    fn scroll(&mut self, rect: &mut Rect, scroll_x: i32, scroll_y: i32) {
        let anim_offset = self.anim_offset();
        let pitch = self.pitch as usize;
        let (colours, anims) = self.data.split_at_mut(anim_offset);
        // Both planes move identically; the rect adjustment is the same
        let mut colour_rect = *rect;
        scroll_plane(colours, pitch, 4, &mut colour_rect, scroll_x, scroll_y);
        scroll_plane(anims, pitch, 1, rect, scroll_x, scroll_y);
        debug_assert_eq!(*rect, colour_rect);
    }

    fn palette_animate(&mut self, palette: &Palette) -> bool {
        self.palette = palette.clone();
        let range = palette.dirty_range();
        if range.is_empty() {
            return false;
        }

        let anim_offset = self.anim_offset();
        let (colours, anims) = self.data.split_at_mut(anim_offset);
        let mut changed = false;
        for y in 0..self.height as usize {
            for x in 0..self.width as usize {
                let pi = y * self.pitch as usize + x;
                let index = anims[pi] as usize;
                if index == 0 || !range.contains(&index) {
                    continue;
                }
                let c = palette.entries[index];
                let off = pi * 4;
                if colours[off] != c.r || colours[off + 1] != c.g || colours[off + 2] != c.b {
                    put_pixel(colours, off, c);
                    changed = true;
                }
            }
        }
        changed
    }

    fn copy(&self, x: i32, y: i32, width: i32, height: i32) -> Vec<u8> {
        debug_assert!(self.in_bounds(x, y));
        let anim_offset = self.anim_offset();
        // Backend-private format: colour rows, then index rows
        let mut out = Vec::with_capacity((width * height * 5) as usize);
        for row in 0..height {
            let start = self.pixel_offset(x, y + row);
            out.extend_from_slice(&self.data[start..start + width as usize * 4]);
        }
        for row in 0..height {
            let start = anim_offset + ((y + row) * self.pitch as i32 + x) as usize;
            out.extend_from_slice(&self.data[start..start + width as usize]);
        }
        out
    }

    fn paste(&mut self, src: &[u8], x: i32, y: i32, width: i32, height: i32) {
        debug_assert_eq!(src.len(), (width * height * 5) as usize);
        let anim_offset = self.anim_offset();
        let colour_len = (width * height * 4) as usize;
        let row_len = width as usize * 4;
        for row in 0..height {
            let start = self.pixel_offset(x, y + row);
            let src_start = row as usize * row_len;
            self.data[start..start + row_len].copy_from_slice(&src[src_start..src_start + row_len]);
        }
        for row in 0..height {
            let start = anim_offset + ((y + row) * self.pitch as i32 + x) as usize;
            let src_start = colour_len + (row * width) as usize;
            self.data[start..start + width as usize]
                .copy_from_slice(&src[src_start..src_start + width as usize]);
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
    use crate::palette::{ANIM_COUNT, ANIM_START};
    use crate::sprite::{HeapAllocator, SpriteColour, SpriteFrame};
    use pretty_assertions::assert_eq;

    fn water_frame(width: u32, height: u32) -> SpriteFrame {
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
                        m: (ANIM_START + ((x + y) as usize % ANIM_COUNT)) as u8,
                    },
                );
            }
        }
        frame
    }

    fn blank_surface(blitter: &Rgba32AnimBlitter, width: u32, height: u32) -> Box<dyn Surface> {
        let buf = vec![0u8; blitter.buffer_size(width, height)];
        blitter.create_surface(buf, width, height, width)
    }

    fn draw_full(blitter: &Rgba32AnimBlitter, surface: &mut dyn Surface, sprite: &Sprite) {
        let params = BlitterParams {
            sprite,
            remap: None,
            skip_left: 0,
            skip_top: 0,
            width: sprite.width as i32,
            height: sprite.height as i32,
            left: 0,
            top: 0,
        };
        blitter.draw(surface.view(), &params, BlitterMode::Normal, ZoomLevel::Normal);
    }

    fn export(surface: &dyn Surface, width: u32, height: u32) -> Vec<u8> {
        let mut out = vec![0u8; (width * height * 4) as usize];
        surface.export_lines(&mut out, width as usize * 4, 0, height);
        out
    }

    #[test]
    fn test_buffer_size_covers_both_planes() {
        let blitter = Rgba32AnimBlitter::new();
        assert_eq!(blitter.buffer_size(10, 10), 500);
        assert_eq!(blitter.bytes_per_pixel() * 8, blitter.screen_depth() as usize);
    }

    #[test]
    fn test_palette_animate_recolours_dirty_pixels() {
        let blitter = Rgba32AnimBlitter::new();
        let data = SpriteData::new(water_frame(4, 4));
        let sprite = blitter.encode(&data, false, &mut HeapAllocator);

        let mut surface = blank_surface(&blitter, 4, 4);
        draw_full(&blitter, surface.as_mut(), &sprite);

        let before = export(surface.as_ref(), 4, 4);

        let mut palette = Palette::game_default();
        palette.cycle_animated(1);
        assert!(surface.palette_animate(&palette));

        let after = export(surface.as_ref(), 4, 4);
        assert_ne!(before, after);

        // Every pixel now shows the cycled palette colour for its index
        let frame = data.base();
        for y in 0..4u32 {
            for x in 0..4u32 {
                let c = palette.entries[frame.pixel(x, y).m as usize];
                let off = ((y * 4 + x) * 4) as usize;
                assert_eq!(&after[off..off + 4], &[c.r, c.g, c.b, 255]);
            }
        }
    }

    #[test]
    fn test_palette_animate_clean_palette_is_noop() {
        let blitter = Rgba32AnimBlitter::new();
        let data = SpriteData::new(water_frame(2, 2));
        let sprite = blitter.encode(&data, false, &mut HeapAllocator);

        let mut surface = blank_surface(&blitter, 2, 2);
        draw_full(&blitter, surface.as_mut(), &sprite);

        let mut palette = Palette::game_default();
        palette.mark_clean();
        assert!(!surface.palette_animate(&palette));
    }

    #[test]
    fn test_palette_animate_ignores_static_pixels() {
        let blitter = Rgba32AnimBlitter::new();
        let mut surface = blank_surface(&blitter, 3, 3);
        surface.draw_rect(0, 0, 3, 3, 100); // static cube entry

        let mut palette = Palette::game_default();
        palette.cycle_animated(5);
        // No pixel uses an animated index, nothing to redraw
        assert!(!surface.palette_animate(&palette));
    }

    #[test]
    fn test_copy_paste_preserves_animation_tracking() {
        let blitter = Rgba32AnimBlitter::new();
        let data = SpriteData::new(water_frame(4, 2));
        let sprite = blitter.encode(&data, false, &mut HeapAllocator);

        let mut surface = blank_surface(&blitter, 4, 2);
        draw_full(&blitter, surface.as_mut(), &sprite);

        let saved = surface.copy(0, 0, 4, 2);
        surface.draw_rect(0, 0, 4, 2, 100);
        surface.paste(&saved, 0, 0, 4, 2);

        // The restored pixels animate again: the index plane came back too
        let mut palette = Palette::game_default();
        palette.cycle_animated(2);
        assert!(surface.palette_animate(&palette));
    }

    #[test]
    fn test_scroll_moves_index_plane() {
        let blitter = Rgba32AnimBlitter::new();
        let mut surface = blank_surface(&blitter, 6, 6);
        // One animated pixel at (1,1)
        surface.set_pixel(1, 1, ANIM_START as u8);

        let mut rect = Rect::new(0, 0, 6, 6);
        surface.scroll(&mut rect, 2, 2);

        let mut palette = Palette::game_default();
        palette.cycle_animated(3);
        assert!(surface.palette_animate(&palette));

        // The moved pixel at (3,3) shows the cycled colour
        let out = export(surface.as_ref(), 6, 6);
        let c = palette.entries[ANIM_START];
        let off = (3 * 6 + 3) * 4;
        assert_eq!(&out[off..off + 4], &[c.r, c.g, c.b, 255]);
    }

    #[test]
    fn test_export_is_colour_plane_only() {
        let blitter = Rgba32AnimBlitter::new();
        let mut surface = blank_surface(&blitter, 2, 1);
        surface.set_pixel(0, 0, 249); // red accent

        let mut out = vec![0u8; 8];
        surface.export_lines(&mut out, 8, 0, 1);
        assert_eq!(&out[..4], &[255, 0, 0, 255]);
    }
}
