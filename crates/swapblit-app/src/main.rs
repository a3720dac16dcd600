// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Parser;
use swapblit_core::init_tracing;
use swapblit_present::{power_ramp, PresentPath, SwapchainBlitter};
use swapblit_render::recording::{RecordingContext, RecordingDevice};
use swapblit_render::{DeviceFeatures, ImageView};
use tracing::{debug, info};

mod config;

use config::{load_cfg, AppCfg, ImageCfg};

/// Replays a list of present operations against the headless recording
/// backend and reports what the presenter recorded.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scene file; the built-in demo runs if it does not exist
    #[arg(long, default_value = "swapblit.toml")]
    config: PathBuf,

    /// Overrides the per-frame repeat count
    #[arg(long)]
    repeat: Option<u32>,

    /// Pretend the device supports VK_AMD_shader_fragment_mask
    #[arg(long)]
    amd_fragment_mask: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let cfg = load_cfg(&args.config)?;
    info!(
        "config = {} ({} frames)",
        args.config.display(),
        cfg.frames.len()
    );

    run(&args, &cfg)
}

fn run(args: &Args, cfg: &AppCfg) -> Result<()> {
    let features = DeviceFeatures {
        amd_shader_fragment_mask: cfg.device.amd_shader_fragment_mask || args.amd_fragment_mask,
    };
    let mut device = RecordingDevice::new(features);
    if let Some(bytes) = cfg.device.allocation_limit()? {
        device = device.with_allocation_limit(bytes);
    }
    let device = Rc::new(device);

    let mut blitter = SwapchainBlitter::new(device.clone()).context("create swapchain blitter")?;
    info!("resolve variant = {:?}", blitter.resolve_variant());

    if let Some(gamma) = cfg.gamma {
        blitter
            .set_gamma_ramp(&power_ramp(gamma.exponent, gamma.points))
            .context("set gamma ramp")?;
        info!("gamma: exponent {} over {} points", gamma.exponent, gamma.points);
    }

    let mut ctx = RecordingContext::new();
    let mut paths: BTreeMap<String, u32> = BTreeMap::new();

    for (i, frame) in cfg.frames.iter().enumerate() {
        let dst = color_target(&device, &frame.destination)
            .with_context(|| format!("frame {i}: create destination"))?;
        let src = color_target(&device, &frame.source)
            .with_context(|| format!("frame {i}: create source"))?;

        let repeat = args.repeat.unwrap_or(frame.repeat);
        for _ in 0..repeat {
            let path = blitter
                .present(
                    &mut ctx,
                    &dst,
                    frame.dst_rect.to_vk(),
                    &src,
                    frame.src_rect.to_vk(),
                )
                .with_context(|| format!("frame {i}: present"))?;
            *paths.entry(format!("{path:?}")).or_default() += 1;
            log_frame(i, path, &ctx);

            let retired = ctx.retire();
            debug!("frame {i}: retired {retired} commands");
        }
    }

    for (path, n) in &paths {
        info!("{path}: {n}");
    }
    let stats = device.stats();
    info!(
        "device: images={} views={} buffers={} slices={} samplers={} shaders={}",
        stats.images,
        stats.image_views,
        stats.buffers,
        stats.buffer_slices,
        stats.samplers,
        stats.shaders
    );
    info!(
        "gamma uploads={} rebuilds={}, resolve image cached={}",
        blitter.gamma().uploads(),
        blitter.gamma().rebuilds(),
        blitter.resolve_target().is_some()
    );
    Ok(())
}

fn color_target(device: &RecordingDevice, image: &ImageCfg) -> Result<Rc<ImageView>> {
    Ok(device.color_target(image.extent(), image.format.to_vk(), image.sample_count())?)
}

fn log_frame(i: usize, path: PresentPath, ctx: &RecordingContext) {
    info!("frame {i}: {path:?}, {} commands", ctx.commands().len());
    for cmd in ctx.commands() {
        debug!("  {cmd:?}");
    }
}
