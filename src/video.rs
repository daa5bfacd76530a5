//! SDL2 presentation layer.
//!
//! The video layer owns the window and the streaming texture; the blitter
//! layer owns pixel content. The two meet in `present`, which pulls rows out
//! of a surface through `export_lines` (the one stable export format) and
//! uploads them as packed RGBA, expanding palette indices for 8bpp backends.

use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::pixels::PixelFormatEnum;
use sdl2::render::{Canvas, Texture, TextureCreator};
use sdl2::video::{Window, WindowContext};
use sdl2::EventPump;

use crate::palette::Palette;
use crate::surface::Surface;

pub struct Display {
    canvas: Canvas<Window>,
    event_pump: EventPump,
    width: u32,
    height: u32,
}

pub struct RenderTarget<'a> {
    texture: Texture<'a>,
    /// Raw `export_lines` output, indices or RGBA depending on the backend.
    export: Vec<u8>,
    /// Packed RGBA bytes uploaded to the texture.
    staging: Vec<u8>,
    width: u32,
    height: u32,
}

#[derive(Debug, Clone)]
pub enum InputEvent {
    Quit,
    KeyDown(Keycode),
}

impl Display {
    /// Create display with custom resolution and VSync settings
    pub fn with_options(
        title: &str,
        width: u32,
        height: u32,
        vsync: bool,
    ) -> Result<(Self, TextureCreator<WindowContext>), String> {
        let sdl_context = sdl2::init()?;
        let video_subsystem = sdl_context.video()?;

        let window = video_subsystem
            .window(title, width, height)
            .position_centered()
            .build()
            .map_err(|e| e.to_string())?;

        let mut canvas_builder = window.into_canvas().accelerated();
        if vsync {
            canvas_builder = canvas_builder.present_vsync();
        }
        let canvas = canvas_builder.build().map_err(|e| e.to_string())?;

        let texture_creator = canvas.texture_creator();
        let event_pump = sdl_context.event_pump()?;

        Ok((
            Self {
                canvas,
                event_pump,
                width,
                height,
            },
            texture_creator,
        ))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Upload a surface's content and show it.
    ///
    /// 8bpp surfaces export palette indices which are expanded through
    /// `palette` here; this is also where video-backend palette animation
    /// lands, since re-expanding with a cycled palette recolours the whole
    /// frame without the surface changing.
    pub fn present(
        &mut self,
        target: &mut RenderTarget,
        surface: &dyn Surface,
        palette: &Palette,
    ) -> Result<(), String> {
        let width = target.width;
        let height = target.height;

        match surface.bytes_per_pixel() {
            4 => {
                surface.export_lines(&mut target.staging, width as usize * 4, 0, height);
            }
            1 => {
                surface.export_lines(&mut target.export, width as usize, 0, height);
                for (dst, &index) in target
                    .staging
                    .chunks_exact_mut(4)
                    .zip(target.export.iter())
                {
                    let c = palette.entries[index as usize];
                    dst[0] = c.r;
                    dst[1] = c.g;
                    dst[2] = c.b;
                    dst[3] = 255;
                }
            }
            _ => {
                // Null backend: present black
                target.staging.fill(0);
            }
        }

        target
            .texture
            .update(None, &target.staging, (width * 4) as usize)
            .map_err(|e| e.to_string())?;

        self.canvas.copy(&target.texture, None, None)?;
        self.canvas.present();
        Ok(())
    }

    pub fn poll_events(&mut self) -> Vec<InputEvent> {
        let mut events = Vec::new();

        for event in self.event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => events.push(InputEvent::Quit),
                Event::KeyDown {
                    keycode: Some(k), ..
                } => events.push(InputEvent::KeyDown(k)),
                _ => {}
            }
        }

        events
    }
}

impl<'a> RenderTarget<'a> {
    /// Create render target with custom resolution
    pub fn with_size(
        texture_creator: &'a TextureCreator<WindowContext>,
        width: u32,
        height: u32,
    ) -> Result<Self, String> {
        let texture = texture_creator
            .create_texture_streaming(PixelFormatEnum::ABGR8888, width, height)
            .map_err(|e| e.to_string())?;
        Ok(Self {
            texture,
            export: vec![0; (width * height) as usize],
            staging: vec![0; (width * height * 4) as usize],
            width,
            height,
        })
    }
}
