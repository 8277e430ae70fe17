//! Texture handling for the rendering pipeline.
//!
//! Provides the depth buffer and the terrain texture atlas. The atlas is
//! decoded from a PNG on disk; if that fails the renderer logs the error
//! and continues with a generated placeholder pattern rather than
//! aborting.

use std::path::Path;

use thiserror::Error;

use crate::meshing::{ATLAS_COLS, ATLAS_ROWS};

/// Where the terrain atlas is loaded from at startup.
pub const ATLAS_PATH: &str = "assets/textures/atlas.png";

/// Pixel edge of one generated placeholder atlas cell.
const FALLBACK_CELL_PIXELS: u32 = 16;

/// Errors from decoding the texture atlas.
#[derive(Debug, Error)]
pub enum AtlasError {
    /// The atlas file could not be read.
    #[error("failed to read atlas file: {0}")]
    Io(#[from] std::io::Error),
    /// The atlas file could not be decoded as an image.
    #[error("failed to decode atlas image: {0}")]
    Image(#[from] image::ImageError),
}

/// A GPU texture with its view and sampler.
pub struct Texture {
    /// The underlying texture resource.
    #[allow(dead_code)]
    pub texture: wgpu::Texture,
    /// The view used for binding the texture to the pipeline.
    pub view: wgpu::TextureView,
    /// The sampler used for filtering and addressing.
    pub sampler: wgpu::Sampler,
}

impl Texture {
    /// The texture format used for depth buffers.
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Creates a depth texture matching the surface configuration.
    pub fn create_depth_texture(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Creates the terrain atlas texture, falling back to a generated
    /// pattern when the file is missing or unreadable.
    pub fn create_atlas_texture(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let (pixels, width, height) = match load_atlas_rgba(Path::new(ATLAS_PATH)) {
            Ok(decoded) => decoded,
            Err(error) => {
                log::error!("{error}; rendering with placeholder atlas");
                fallback_atlas()
            }
        };

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("terrain atlas"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Repeat addressing: merged quads run their UVs past the cell edge
        // so the tile repeats across the surface.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }
}

fn load_atlas_rgba(path: &Path) -> Result<(Vec<u8>, u32, u32), AtlasError> {
    let bytes = std::fs::read(path)?;
    let decoded = image::load_from_memory(&bytes)?.to_rgba8();
    let (width, height) = decoded.dimensions();
    Ok((decoded.into_raw(), width, height))
}

/// A deterministic stand-in atlas: one dithered two-tone pattern per cell.
fn fallback_atlas() -> (Vec<u8>, u32, u32) {
    let width = ATLAS_COLS * FALLBACK_CELL_PIXELS;
    let height = ATLAS_ROWS * FALLBACK_CELL_PIXELS;
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);

    for y in 0..height {
        for x in 0..width {
            let cell = (x / FALLBACK_CELL_PIXELS + y / FALLBACK_CELL_PIXELS) % 2;
            let checker = (x / 2 + y / 2) % 2;
            let value = match (cell, checker) {
                (0, 0) => 96,
                (0, _) => 128,
                (_, 0) => 160,
                _ => 192,
            };
            pixels.extend_from_slice(&[value, value, value, 255]);
        }
    }

    (pixels, width, height)
}
