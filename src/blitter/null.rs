//! The null blitter: no video output at all.
//!
//! Last-resort backend for headless runs and dedicated servers. Encoding
//! keeps only sprite metadata, drawing is a no-op, surfaces swallow every
//! operation.

use crate::blitter::{Blitter, BlitterMode, BlitterParams, PaletteAnimation};
use crate::palette::PaletteId;
use crate::sprite::{allocate_sprite, Sprite, SpriteAllocator, SpriteData, ZoomLevel};
use crate::surface::{PixelView, Rect, Surface};

pub struct NullBlitter;

impl Blitter for NullBlitter {
    fn name(&self) -> &'static str {
        "null"
    }

    fn description(&self) -> &'static str {
        "null blitter (no output)"
    }

    fn screen_depth(&self) -> u8 {
        0
    }

    fn bytes_per_pixel(&self) -> usize {
        0
    }

    fn palette_animation(&self) -> PaletteAnimation {
        PaletteAnimation::None
    }

    fn buffer_size(&self, _width: u32, _height: u32) -> usize {
        0
    }

    fn encode(
        &self,
        sprite: &SpriteData,
        is_font: bool,
        allocator: &mut dyn SpriteAllocator,
    ) -> Sprite {
        // Metadata only; the payload is empty
        let (levels, payload) = allocate_sprite(sprite, 0, is_font, allocator);
        Sprite::from_parts(sprite.base(), levels, payload)
    }

    fn draw(
        &self,
        _dst: PixelView<'_>,
        _params: &BlitterParams<'_>,
        _mode: BlitterMode,
        _zoom: ZoomLevel,
    ) {
    }

    fn create_surface(
        &self,
        _buf: Vec<u8>,
        width: u32,
        height: u32,
        pitch: u32,
    ) -> Box<dyn Surface> {
        Box::new(NullSurface {
            width,
            height,
            pitch,
            empty: Vec::new(),
        })
    }
}

struct NullSurface {
    width: u32,
    height: u32,
    pitch: u32,
    empty: Vec<u8>,
}

impl Surface for NullSurface {
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
        0
    }

    fn view(&mut self) -> PixelView<'_> {
        PixelView {
            data: &mut self.empty,
            pitch: self.pitch as usize,
            height: self.height as usize,
        }
    }

    fn set_pixel(&mut self, _x: i32, _y: i32, _colour: u8) {}

    fn draw_rect(&mut self, _x: i32, _y: i32, _width: i32, _height: i32, _colour: u8) {}

    fn recolour_rect(&mut self, _x: i32, _y: i32, _width: i32, _height: i32, _pal: PaletteId) {}

    fn scroll(&mut self, rect: &mut Rect, _scroll_x: i32, _scroll_y: i32) {
        rect.width = 0;
        rect.height = 0;
    }

    fn copy(&self, _x: i32, _y: i32, _width: i32, _height: i32) -> Vec<u8> {
        Vec::new()
    }

    fn paste(&mut self, _src: &[u8], _x: i32, _y: i32, _width: i32, _height: i32) {}

    fn export_lines(&self, dst: &mut [u8], dst_pitch: usize, _y: u32, height: u32) {
        // Honour the length contract even with nothing to show
        dst[..height as usize * dst_pitch].fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite::{HeapAllocator, SpriteFrame};

    #[test]
    fn test_null_blitter_swallows_everything() {
        let blitter = NullBlitter;
        assert_eq!(blitter.bytes_per_pixel() * 8, blitter.screen_depth() as usize);
        assert_eq!(blitter.buffer_size(640, 480), 0);

        let data = SpriteData::new(SpriteFrame::new(4, 4, 0, 0));
        let sprite = blitter.encode(&data, false, &mut HeapAllocator);
        assert_eq!(sprite.width, 4);

        let mut surface = blitter.create_surface(Vec::new(), 640, 480, 640);
        surface.set_pixel(10, 10, 5);
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
        blitter.draw(surface.view(), &params, BlitterMode::Normal, ZoomLevel::Normal);

        let mut out = vec![0xAAu8; 20];
        surface.export_lines(&mut out, 10, 0, 2);
        assert!(out.iter().all(|&b| b == 0));
    }
}
