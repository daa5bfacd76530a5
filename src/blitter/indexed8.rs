//! 8bpp indexed blitter: one palette index per pixel, no blending.
//!
//! The simplest real backend. Sprites encode to their remap channel, drawing
//! is index moves through remap tables, and palette animation is left to the
//! video backend (cycling the hardware palette recolours the whole screen
//! for free).

use crate::blitter::{Blitter, BlitterMode, BlitterParams, PaletteAnimation};
use crate::palette::{Palette, PaletteId, BLACK_INDEX, TRANSPARENCY_TABLE, CRASH_TABLE};
use crate::sprite::{allocate_sprite, Sprite, SpriteAllocator, SpriteData, ZoomLevel};
use crate::surface::{clamp_rect, scroll_plane, PixelView, Rect, Surface};

pub struct Indexed8Blitter {
    palette: Palette,
}

impl Indexed8Blitter {
    pub fn new() -> Self {
        Self {
            palette: Palette::game_default(),
        }
    }
}

impl Default for Indexed8Blitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Blitter for Indexed8Blitter {
    fn name(&self) -> &'static str {
        "8bpp-simple"
    }

    fn description(&self) -> &'static str {
        "8bpp indexed blitter (palette animation in the video backend)"
    }

    fn screen_depth(&self) -> u8 {
        8
    }

    fn bytes_per_pixel(&self) -> usize {
        1
    }

    fn palette_animation(&self) -> PaletteAnimation {
        PaletteAnimation::VideoBackend
    }

    fn buffer_size(&self, width: u32, height: u32) -> usize {
        width as usize * height as usize
    }

    fn encode(
        &self,
        sprite: &SpriteData,
        is_font: bool,
        allocator: &mut dyn SpriteAllocator,
    ) -> Sprite {
        let (levels, mut payload) = allocate_sprite(sprite, 1, is_font, allocator);
        for level in &levels {
            let frame = sprite.frame(level.zoom).unwrap();
            let out = &mut payload[level.offset..level.offset + frame.pixels.len()];
            for (dst, px) in out.iter_mut().zip(&frame.pixels) {
                *dst = if px.a == 0 {
                    0
                } else if px.m != 0 {
                    px.m
                } else {
                    // Truecolour-only art on an indexed target: nearest entry
                    self.palette.nearest_index(crate::palette::Colour::rgba(
                        px.r, px.g, px.b, px.a,
                    ))
                };
            }
        }
        Sprite::from_parts(sprite.base(), levels, payload)
    }

    fn draw(
        &self,
        dst: PixelView<'_>,
        params: &BlitterParams<'_>,
        mode: BlitterMode,
        zoom: ZoomLevel,
    ) {
        let level = params.sprite.level_or_nearest(zoom);
        let lw = level.width as usize;
        let src =
            &params.sprite.payload()[level.offset..level.offset + lw * level.height as usize];

        debug_assert!(params.skip_left >= 0 && params.skip_top >= 0);
        debug_assert!(params.skip_left + params.width <= level.width as i32);
        debug_assert!(params.skip_top + params.height <= level.height as i32);

        let data = dst.data;
        for y in 0..params.height {
            let sy = (params.skip_top + y) as usize;
            let src_start = sy * lw + params.skip_left as usize;
            let src_row = &src[src_start..src_start + params.width as usize];

            let dst_start = (params.top + y) as usize * dst.pitch + params.left as usize;
            let dst_row = &mut data[dst_start..dst_start + params.width as usize];

            for (d, &m) in dst_row.iter_mut().zip(src_row) {
                if m == 0 {
                    continue;
                }
                match mode {
                    BlitterMode::Normal => *d = m,
                    BlitterMode::ColourRemap => {
                        let remapped = params.remap.map_or(m, |remap| remap[m as usize]);
                        if remapped != 0 {
                            *d = remapped;
                        }
                    }
                    BlitterMode::Transparent => *d = TRANSPARENCY_TABLE[*d as usize],
                    BlitterMode::CrashRemap => {
                        let remapped = CRASH_TABLE[m as usize];
                        if remapped != 0 {
                            *d = remapped;
                        }
                    }
                    BlitterMode::BlackRemap => *d = BLACK_INDEX,
                }
            }
        }
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
        Box::new(Indexed8Surface {
            data: buf,
            width,
            height,
            pitch,
        })
    }
}

/// Surface over an index-per-pixel buffer.
pub struct Indexed8Surface {
    data: Vec<u8>,
    width: u32,
    height: u32,
    pitch: u32,
}

impl Indexed8Surface {
    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && (x as u32) < self.width && y >= 0 && (y as u32) < self.height
    }
}

impl Surface for Indexed8Surface {
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
        1
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
            let idx = self.pixel_offset(x, y);
            self.data[idx] = colour;
        }
    }

    fn draw_rect(&mut self, x: i32, y: i32, width: i32, height: i32, colour: u8) {
        let Some((x, y, w, h)) = clamp_rect(self.width, self.height, x, y, width, height) else {
            return;
        };
        for row in y..y + h {
            let start = (row * self.pitch + x) as usize;
            self.data[start..start + w as usize].fill(colour);
        }
    }

    fn recolour_rect(&mut self, x: i32, y: i32, width: i32, height: i32, pal: PaletteId) {
        let Some((x, y, w, h)) = clamp_rect(self.width, self.height, x, y, width, height) else {
            return;
        };
        let table = pal.table();
        for row in y..y + h {
            let start = (row * self.pitch + x) as usize;
            for px in &mut self.data[start..start + w as usize] {
                *px = table[*px as usize];
            }
        }
    }

    fn scroll(&mut self, rect: &mut Rect, scroll_x: i32, scroll_y: i32) {
        scroll_plane(&mut self.data, self.pitch as usize, 1, rect, scroll_x, scroll_y);
    }

    fn copy(&self, x: i32, y: i32, width: i32, height: i32) -> Vec<u8> {
        debug_assert!(self.in_bounds(x, y));
        let mut out = Vec::with_capacity((width * height) as usize);
        for row in 0..height {
            let start = self.pixel_offset(x, y + row);
            out.extend_from_slice(&self.data[start..start + width as usize]);
        }
        out
    }

    fn paste(&mut self, src: &[u8], x: i32, y: i32, width: i32, height: i32) {
        debug_assert_eq!(src.len(), (width * height) as usize);
        for row in 0..height {
            let start = self.pixel_offset(x, y + row);
            let src_start = (row * width) as usize;
            self.data[start..start + width as usize]
                .copy_from_slice(&src[src_start..src_start + width as usize]);
        }
    }

    fn export_lines(&self, dst: &mut [u8], dst_pitch: usize, y: u32, height: u32) {
        debug_assert!(dst_pitch >= self.width as usize);
        debug_assert!(y + height <= self.height);
        for row in 0..height as usize {
            let src_start = ((y as usize + row) * self.pitch as usize) as usize;
            let out = &mut dst[row * dst_pitch..(row + 1) * dst_pitch];
            out[..self.width as usize]
                .copy_from_slice(&self.data[src_start..src_start + self.width as usize]);
            out[self.width as usize..].fill(0);
        }
    }
}
