use log::{debug, info};
use sdl2::keyboard::Keycode;

use tileblit::blitter::{BlitterMode, BlitterParams, BlitterRegistry};
use tileblit::config::DisplayConfig;
use tileblit::palette::{self, Palette, PaletteId, RecolourTable};
use tileblit::sprite::{CacheAllocator, Sprite, SpriteColour, SpriteData, SpriteFrame, ZoomLevel};
use tileblit::surface::{Rect, Surface};
use tileblit::util::{FpsCounter, Rng};
use tileblit::video::{Display, InputEvent, RenderTarget};

const CONFIG_FILE: &str = "display.json";

/// Parse command line arguments on top of the persisted config
fn parse_args(config: &mut DisplayConfig) {
    let args: Vec<String> = std::env::args().collect();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--no-vsync" => config.vsync = false,
            "--blitter" | "-b" => {
                if i + 1 < args.len() {
                    config.blitter = args[i + 1].clone();
                    i += 1;
                }
            }
            "--width" | "-w" => {
                if i + 1 < args.len() {
                    if let Ok(w) = args[i + 1].parse::<u32>() {
                        config.width = w;
                    }
                    i += 1;
                }
            }
            "--height" | "-h" => {
                if i + 1 < args.len() {
                    if let Ok(h) = args[i + 1].parse::<u32>() {
                        config.height = h;
                    }
                    i += 1;
                }
            }
            "--resolution" | "-r" => {
                if i + 1 < args.len() {
                    // Parse WxH format (e.g., 1920x1080)
                    let parts: Vec<&str> = args[i + 1].split('x').collect();
                    if parts.len() == 2 {
                        if let (Ok(w), Ok(h)) = (parts[0].parse::<u32>(), parts[1].parse::<u32>()) {
                            config.width = w;
                            config.height = h;
                        }
                    }
                    i += 1;
                }
            }
            "--list-blitters" => {
                let mut buf = String::new();
                BlitterRegistry::list(&mut buf);
                print!("{}", buf);
                std::process::exit(0);
            }
            "--help" => {
                println!("Usage: tileblit [OPTIONS]");
                println!();
                println!("Options:");
                println!("  --blitter NAME, -b NAME   Select blitter backend (see --list-blitters)");
                println!("  --width W, -w W           Set window width");
                println!("  --height H, -h H          Set window height");
                println!("  --resolution WxH, -r WxH  Set resolution (e.g., 1920x1080)");
                println!("  --no-vsync                Disable VSync for uncapped framerate");
                println!("  --list-blitters           List available blitter backends");
                println!("  --help                    Show this help message");
                std::process::exit(0);
            }
            _ => {}
        }
        i += 1;
    }
}

/// A procedurally generated tile sprite: grass top, earth-ramp slope for the
/// livery remap demo, water fringe using the animated palette entries.
fn make_tile(rng: &mut Rng, size: u32) -> SpriteData {
    let mut frame = SpriteFrame::new(size, size, -(size as i32) / 2, -(size as i32) / 2);
    let half = size as i32 / 2;
    for y in 0..size {
        for x in 0..size {
            // Diamond footprint
            let dx = (x as i32 - half).abs();
            let dy = (y as i32 - half).abs();
            if dx + dy > half {
                continue;
            }
            let m = if dy > half / 2 {
                // Water fringe: animated entries
                (palette::ANIM_START + (x as usize + y as usize) % palette::ANIM_COUNT) as u8
            } else if dx > half / 2 {
                // Slope: remappable earth ramp
                232 + rng.range_i32(0, 7) as u8
            } else {
                // Grass top: greens from the colour cube
                16 + 6 * rng.range_i32(2, 4) as u8
            };
            frame.set_pixel(x, y, SpriteColour { r: 0, g: 0, b: 0, a: 255, m });
        }
    }
    SpriteData::with_mipmaps(frame)
}

/// A soft truecolour blob with no remap channel.
fn make_blob(rng: &mut Rng, size: u32) -> SpriteData {
    let mut frame = SpriteFrame::new(size, size, 0, 0);
    let centre = size as f32 / 2.0;
    let base_r = rng.range_i32(120, 255) as u8;
    let base_g = rng.range_i32(60, 200) as u8;
    for y in 0..size {
        for x in 0..size {
            let dx = x as f32 - centre;
            let dy = y as f32 - centre;
            let dist = (dx * dx + dy * dy).sqrt() / centre;
            if dist >= 1.0 {
                continue;
            }
            let a = ((1.0 - dist) * 320.0).min(255.0) as u8;
            frame.set_pixel(
                x,
                y,
                SpriteColour {
                    r: base_r,
                    g: base_g,
                    b: 90,
                    a,
                    m: 0,
                },
            );
        }
    }
    SpriteData::with_mipmaps(frame)
}

/// Livery remap: earth-ramp indices move to a company colour ramp.
fn livery_remap(company_base: u8) -> RecolourTable {
    let mut table = palette::identity_table();
    for i in 0..8u8 {
        table[(232 + i) as usize] = company_base + i % 6;
    }
    table
}

/// Clip a sprite draw against the surface and issue it. The blitter itself
/// trusts the geometry, so the clipping lives with the caller.
fn draw_sprite(
    registry: &BlitterRegistry,
    surface: &mut dyn Surface,
    sprite: &Sprite,
    x: i32,
    y: i32,
    mode: BlitterMode,
    remap: Option<&RecolourTable>,
    zoom: ZoomLevel,
) {
    let (sw, sh) = sprite.zoom_dimensions(zoom);
    let mut left = x;
    let mut top = y;
    let mut skip_left = 0;
    let mut skip_top = 0;
    let mut width = sw as i32;
    let mut height = sh as i32;

    if left < 0 {
        skip_left = -left;
        width -= skip_left;
        left = 0;
    }
    if top < 0 {
        skip_top = -top;
        height -= skip_top;
        top = 0;
    }
    if left + width > surface.width() as i32 {
        width = surface.width() as i32 - left;
    }
    if top + height > surface.height() as i32 {
        height = surface.height() as i32 - top;
    }
    if width <= 0 || height <= 0 {
        return;
    }

    let params = BlitterParams {
        sprite,
        remap,
        skip_left,
        skip_top,
        width,
        height,
        left,
        top,
    };
    registry.get().draw(surface.view(), &params, mode, zoom);
}

struct Mover {
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
}

fn main() -> Result<(), String> {
    env_logger::init();

    let mut config = DisplayConfig::load(CONFIG_FILE).unwrap_or_default();
    parse_args(&mut config);
    let width = config.width;
    let height = config.height;

    let registry = BlitterRegistry::select(&config.blitter);
    let blitter = registry.get();
    if registry.autodetected() {
        config.blitter = registry.name().to_string();
    }
    if let Err(e) = config.save(CONFIG_FILE) {
        debug!("could not save {}: {}", CONFIG_FILE, e);
    }

    let (mut display, texture_creator) =
        Display::with_options("tileblit", width, height, config.vsync)?;
    let mut target = RenderTarget::with_size(&texture_creator, width, height)?;

    // Caller-owned video memory, sized through the backend
    let buffer = vec![0u8; blitter.buffer_size(width, height)];
    let mut surface = blitter.create_surface(buffer, width, height, width);

    // Encode the demo sprites through the active backend
    let mut rng = Rng::new(0x7175);
    let mut allocator = CacheAllocator::new();
    let tile = blitter.encode(&make_tile(&mut rng, 48), false, &mut allocator);
    let blobs: Vec<Sprite> = (0..6)
        .map(|_| blitter.encode(&make_blob(&mut rng, 40), false, &mut allocator))
        .collect();
    info!(
        "encoded {} sprites, {} bytes of sprite cache",
        blobs.len() + 1,
        allocator.total_allocated()
    );

    let mut movers: Vec<Mover> = blobs
        .iter()
        .map(|_| Mover {
            x: rng.range_f32(0.0, width as f32),
            y: rng.range_f32(0.0, height as f32),
            vx: rng.range_f32(-90.0, 90.0),
            vy: rng.range_f32(-90.0, 90.0),
        })
        .collect();

    let company_remap = livery_remap(17); // towards the blue ramp of the cube

    let mut palette = Palette::game_default();
    let mut fps_counter = FpsCounter::new(60);
    let mut mode = BlitterMode::Normal;
    let mut zoom = ZoomLevel::Normal;
    let mut tick: u32 = 0;

    println!("=== tileblit ===");
    println!("Blitter: {} ({})", registry.name(), blitter.description());
    println!("Resolution: {}x{}", width, height);
    println!("Controls:");
    println!("  1-5        - Blit mode (normal, remap, transparent, crash, black)");
    println!("  Z          - Cycle zoom level");
    println!("  Escape     - Quit");

    'main: loop {
        let (dt, avg_fps) = fps_counter.tick();

        for event in display.poll_events() {
            match event {
                InputEvent::Quit => break 'main,
                InputEvent::KeyDown(key) => match key {
                    Keycode::Escape => break 'main,
                    Keycode::Num1 => mode = BlitterMode::Normal,
                    Keycode::Num2 => mode = BlitterMode::ColourRemap,
                    Keycode::Num3 => mode = BlitterMode::Transparent,
                    Keycode::Num4 => mode = BlitterMode::CrashRemap,
                    Keycode::Num5 => mode = BlitterMode::BlackRemap,
                    Keycode::Z => {
                        zoom = match zoom {
                            ZoomLevel::Normal => ZoomLevel::Out2x,
                            ZoomLevel::Out2x => ZoomLevel::Out4x,
                            ZoomLevel::Out4x => ZoomLevel::Out8x,
                            ZoomLevel::Out8x => ZoomLevel::Normal,
                        };
                    }
                    _ => {}
                },
            }
        }

        // Ground
        surface.draw_rect(0, 0, width as i32, height as i32, 16 + 6 * 2 + 1);

        // Tile field drawn through the active blitter
        let (tw, th) = tile.zoom_dimensions(zoom);
        let mut row = 0;
        let mut y = 0i32;
        while y < height as i32 / 2 {
            let offset = if row % 2 == 0 { 0 } else { tw as i32 / 2 };
            let mut x = -(tw as i32) + offset;
            while x < width as i32 {
                draw_sprite(
                    &registry,
                    surface.as_mut(),
                    &tile,
                    x,
                    y,
                    mode,
                    Some(&company_remap),
                    zoom,
                );
                x += tw as i32;
            }
            y += th as i32 / 2;
            row += 1;
        }

        // Bouncing blobs on top
        for (mover, sprite) in movers.iter_mut().zip(&blobs) {
            mover.x += mover.vx * dt;
            mover.y += mover.vy * dt;
            let (sw, sh) = sprite.zoom_dimensions(zoom);
            if mover.x < -(sw as f32) {
                mover.x = width as f32;
            }
            if mover.x > width as f32 {
                mover.x = -(sw as f32);
            }
            if mover.y < -(sh as f32) {
                mover.y = height as f32;
            }
            if mover.y > height as f32 {
                mover.y = -(sh as f32);
            }
            draw_sprite(
                &registry,
                surface.as_mut(),
                sprite,
                mover.x as i32,
                mover.y as i32,
                mode,
                Some(&company_remap),
                zoom,
            );
        }

        // Surface primitives: dashed crosshair and a darkened HUD strip
        surface.draw_line(0, height as i32 / 2, width as i32 - 1, height as i32 / 2, 248, 1, 4);
        surface.draw_line(width as i32 / 2, 0, width as i32 / 2, height as i32 - 1, 248, 1, 4);
        surface.recolour_rect(8, 8, 120, 24, PaletteId::Transparency);

        // Scrolling marquee strip along the bottom
        let mut strip = Rect::new(0, height as i32 - 20, width as i32, 20);
        surface.scroll(&mut strip, -2, 0);
        surface.draw_rect(
            width as i32 - 2,
            height as i32 - 20,
            2,
            20,
            if tick % 16 < 8 { 252 } else { 251 },
        );

        // Palette animation: the blitter handles it for anim backends, the
        // present path handles it for 8bpp via palette expansion
        if tick % 4 == 0 {
            palette.cycle_animated(tick / 4);
            surface.palette_animate(&palette);
        }

        display.present(&mut target, surface.as_ref(), &palette)?;

        tick = tick.wrapping_add(1);
        if tick % 300 == 0 {
            debug!(
                "fps {:.1} ({:.2} ms/frame)",
                avg_fps,
                fps_counter.avg_frame_time_ms()
            );
        }
    }

    Ok(())
}
