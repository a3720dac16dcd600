// SPDX-License-Identifier: CEPL-1.0
use std::fs;
use std::io;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use ash::vk;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AppCfg {
    #[serde(default)]
    pub device: DeviceCfg,
    #[serde(default)]
    pub gamma: Option<GammaCfg>,
    #[serde(default = "demo_frames")]
    pub frames: Vec<FrameCfg>,
}

impl Default for AppCfg {
    fn default() -> Self {
        AppCfg {
            device: DeviceCfg::default(),
            gamma: None,
            frames: demo_frames(),
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone, Copy)]
pub struct DeviceCfg {
    #[serde(default)]
    pub amd_shader_fragment_mask: bool,
    /// Largest single allocation the device accepts, in MiB. Unlimited if unset.
    #[serde(default)]
    pub max_allocation_mb: Option<u64>,
}

/// Power-curve ramp applied by the presenter. `points = 0` turns it off.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct GammaCfg {
    #[serde(default = "default_exponent")]
    pub exponent: f32,
    #[serde(default = "default_points")]
    pub points: u32,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ImageCfg {
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_samples")]
    pub samples: u32,
    #[serde(default)]
    pub format: FormatCfg,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct RectCfg {
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct FrameCfg {
    pub source: ImageCfg,
    pub destination: ImageCfg,
    /// Zero-sized rects cover the whole image.
    #[serde(default)]
    pub src_rect: RectCfg,
    #[serde(default)]
    pub dst_rect: RectCfg,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FormatCfg {
    #[default]
    Bgra8Unorm,
    Bgra8Srgb,
    Rgba8Unorm,
    Rgba8Srgb,
    Rgb10a2Unorm,
    Rgba16Float,
    Rgba32Float,
}

impl FormatCfg {
    pub fn to_vk(self) -> vk::Format {
        match self {
            FormatCfg::Bgra8Unorm => vk::Format::B8G8R8A8_UNORM,
            FormatCfg::Bgra8Srgb => vk::Format::B8G8R8A8_SRGB,
            FormatCfg::Rgba8Unorm => vk::Format::R8G8B8A8_UNORM,
            FormatCfg::Rgba8Srgb => vk::Format::R8G8B8A8_SRGB,
            FormatCfg::Rgb10a2Unorm => vk::Format::A2B10G10R10_UNORM_PACK32,
            FormatCfg::Rgba16Float => vk::Format::R16G16B16A16_SFLOAT,
            FormatCfg::Rgba32Float => vk::Format::R32G32B32A32_SFLOAT,
        }
    }
}

impl ImageCfg {
    pub fn extent(&self) -> vk::Extent2D {
        vk::Extent2D {
            width: self.width,
            height: self.height,
        }
    }

    pub fn sample_count(&self) -> vk::SampleCountFlags {
        vk::SampleCountFlags::from_raw(self.samples)
    }
}

impl RectCfg {
    pub fn to_vk(self) -> vk::Rect2D {
        vk::Rect2D {
            offset: vk::Offset2D {
                x: self.x,
                y: self.y,
            },
            extent: vk::Extent2D {
                width: self.width,
                height: self.height,
            },
        }
    }
}

fn default_exponent() -> f32 {
    2.2
}
fn default_points() -> u32 {
    256
}
fn default_samples() -> u32 {
    1
}
fn default_repeat() -> u32 {
    1
}

fn image(width: u32, height: u32, samples: u32) -> ImageCfg {
    ImageCfg {
        width,
        height,
        samples,
        format: FormatCfg::default(),
    }
}

/// One frame per present path, against a 1920x1080 swapchain.
fn demo_frames() -> Vec<FrameCfg> {
    let swapchain = image(1920, 1080, 1);
    let frame = |source: ImageCfg| FrameCfg {
        source,
        destination: swapchain,
        src_rect: RectCfg::default(),
        dst_rect: RectCfg::default(),
        repeat: 2,
    };
    vec![
        frame(image(1920, 1080, 1)),
        frame(image(1280, 720, 1)),
        frame(image(1920, 1080, 8)),
        FrameCfg {
            dst_rect: RectCfg {
                x: 320,
                y: 180,
                width: 1280,
                height: 720,
            },
            ..frame(image(1920, 1080, 8))
        },
    ]
}

/// Reads `path`. A missing file yields the built-in demo; anything else that
/// goes wrong is an error.
pub fn load_cfg(path: &Path) -> Result<AppCfg> {
    match fs::read_to_string(path) {
        Ok(s) => parse_cfg(&s).with_context(|| format!("parse {}", path.display())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(AppCfg::default()),
        Err(e) => Err(e).with_context(|| format!("read {}", path.display())),
    }
}

pub fn parse_cfg(s: &str) -> Result<AppCfg> {
    let cfg = toml::from_str::<AppCfg>(s)?;
    cfg.validate()?;
    Ok(cfg)
}

impl AppCfg {
    fn validate(&self) -> Result<()> {
        for (i, frame) in self.frames.iter().enumerate() {
            frame
                .source
                .validate()
                .with_context(|| format!("frames[{i}].source"))?;
            frame
                .destination
                .validate()
                .with_context(|| format!("frames[{i}].destination"))?;
        }
        Ok(())
    }
}

impl ImageCfg {
    fn validate(&self) -> Result<()> {
        if !(1..=64).contains(&self.samples) || !self.samples.is_power_of_two() {
            bail!(
                "samples = {} is not a Vulkan sample count (1, 2, 4, 8, 16, 32 or 64)",
                self.samples
            );
        }
        Ok(())
    }
}

impl DeviceCfg {
    /// `max_allocation_mb` in bytes.
    pub fn allocation_limit(&self) -> Result<Option<u64>> {
        self.max_allocation_mb
            .map(|mb| {
                mb.checked_mul(1 << 20)
                    .ok_or_else(|| anyhow!("max_allocation_mb = {mb} overflows a byte count"))
            })
            .transpose()
    }
}
