//! Backend selection and listing.
//!
//! The registry is the context object the render pipeline is constructed
//! with: it owns exactly one active backend, chosen once at startup (or again
//! on an explicit video-driver change, while the pipeline is idle). There is
//! no way to obtain a registry without selecting, so "get before select"
//! cannot happen.

use std::fmt::Write as _;

use log::{info, warn};

use crate::blitter::{
    Blitter, Indexed8Blitter, NullBlitter, Rgba32AnimBlitter, Rgba32Blitter,
};

/// A registered backend variant.
pub struct BlitterInfo {
    pub name: &'static str,
    pub description: &'static str,
    create: fn() -> Box<dyn Blitter>,
    /// Whether the backend can run in this build/environment.
    usable: fn() -> bool,
}

/// Every known backend, in autodetection preference order. The null backend
/// is last and only ever autodetected when nothing else is usable.
const BLITTERS: &[BlitterInfo] = &[
    BlitterInfo {
        name: "32bpp-anim",
        description: "32bpp RGBA blitter with palette animation",
        create: || Box::new(Rgba32AnimBlitter::new()),
        usable: || true,
    },
    BlitterInfo {
        name: "32bpp-simple",
        description: "32bpp RGBA blitter (no palette animation)",
        create: || Box::new(Rgba32Blitter::new()),
        usable: || true,
    },
    BlitterInfo {
        name: "8bpp-simple",
        description: "8bpp indexed blitter (palette animation in the video backend)",
        create: || Box::new(Indexed8Blitter::new()),
        usable: || true,
    },
    BlitterInfo {
        name: "null",
        description: "null blitter (no output)",
        create: || Box::new(NullBlitter),
        usable: || true,
    },
];

/// Owner of the single active blitter backend.
pub struct BlitterRegistry {
    current: Box<dyn Blitter>,
    autodetected: bool,
}

impl BlitterRegistry {
    /// Select a backend by exact name. An unknown name falls back to
    /// autodetection; the result is always usable.
    pub fn select(name: &str) -> Self {
        if let Some(info) = BLITTERS.iter().find(|info| info.name == name) {
            info!("selected blitter '{}' ({})", info.name, info.description);
            return Self {
                current: (info.create)(),
                autodetected: false,
            };
        }
        warn!("no blitter named '{}', autodetecting", name);
        Self::autodetect()
    }

    /// Pick the best available backend.
    pub fn autodetect() -> Self {
        let info = BLITTERS
            .iter()
            .filter(|info| info.name != "null")
            .find(|info| (info.usable)())
            .unwrap_or(&BLITTERS[BLITTERS.len() - 1]);
        info!("autodetected blitter '{}'", info.name);
        Self {
            current: (info.create)(),
            autodetected: true,
        }
    }

    /// The currently active backend.
    pub fn get(&self) -> &dyn Blitter {
        self.current.as_ref()
    }

    /// Name of the currently active backend.
    pub fn name(&self) -> &'static str {
        self.current.name()
    }

    /// Whether the active backend came from autodetection rather than an
    /// exact name match.
    pub fn autodetected(&self) -> bool {
        self.autodetected
    }

    /// Append every known backend's name and descriptor to `buf`.
    pub fn list(buf: &mut String) {
        let _ = writeln!(buf, "List of blitters:");
        for info in BLITTERS {
            let _ = writeln!(buf, "  {:>14}: {}", info.name, info.description);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_invariant_for_all_backends() {
        for info in BLITTERS {
            let blitter = (info.create)();
            assert_eq!(
                blitter.bytes_per_pixel() * 8,
                blitter.screen_depth() as usize,
                "{}",
                info.name
            );
        }
    }

    #[test]
    fn test_buffer_size_monotone() {
        for info in BLITTERS {
            let blitter = (info.create)();
            let mut prev = 0;
            for w in 1..16u32 {
                let size = blitter.buffer_size(w, 1);
                assert!(size >= prev, "{} width", info.name);
                prev = size;
            }
            let mut prev = 0;
            for h in 1..16u32 {
                let size = blitter.buffer_size(7, h);
                assert!(size >= prev, "{} height", info.name);
                prev = size;
            }
        }
    }

    #[test]
    fn test_select_by_exact_name() {
        for info in BLITTERS {
            let registry = BlitterRegistry::select(info.name);
            assert_eq!(registry.name(), info.name);
            assert!(!registry.autodetected());
        }
    }

    #[test]
    fn test_unknown_name_falls_back() {
        let registry = BlitterRegistry::select("nonexistent-name");
        assert!(registry.autodetected());
        // Still a fully usable backend
        assert_ne!(registry.name(), "");
        assert_ne!(registry.name(), "null");
        let _surface = registry.get().create_surface(
            vec![0u8; registry.get().buffer_size(4, 4)],
            4,
            4,
            4,
        );
    }

    #[test]
    fn test_list_names_all_backends() {
        let mut buf = String::new();
        BlitterRegistry::list(&mut buf);
        for info in BLITTERS {
            assert!(buf.contains(info.name));
            assert!(buf.contains(info.description));
        }
    }
}
