// SPDX-License-Identifier: CEPL-1.0
use std::rc::Rc;

use anyhow::{Context, Result};
use ash::vk;
use swapblit_render::{BindingInfo, Device, DeviceFeatures, Shader, ShaderInfo};
use tracing::debug;

use crate::args::PresenterArgs;

/// Slot of the presented image (combined image sampler, 2D).
pub const IMAGE_BINDING: u32 = 0;
/// Slot of the gamma lookup texture (combined image sampler, 1D).
pub const GAMMA_BINDING: u32 = 1;

pub(crate) const PRESENT_VERT: &str = "present.vert";
pub(crate) const PRESENT_FRAG_COPY: &str = "present.frag";
pub(crate) const PRESENT_FRAG_BLIT: &str = "present_blit.frag";
pub(crate) const PRESENT_FRAG_MS: &str = "present_ms.frag";
pub(crate) const PRESENT_FRAG_MS_AMD: &str = "present_ms_amd.frag";

/// Fragment shader a present draw runs with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FragmentVariant {
    Copy,
    Blit,
    Resolve,
}

/// Implementation backing [`FragmentVariant::Resolve`], fixed per device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResolveVariant {
    /// Averages every sample with `texelFetch`.
    Generic,
    /// Reads only the distinct fragments through the AMD fragment mask.
    AmdFragmentMask,
}

impl ResolveVariant {
    pub fn select(features: DeviceFeatures) -> Self {
        if features.amd_shader_fragment_mask {
            Self::AmdFragmentMask
        } else {
            Self::Generic
        }
    }

    fn module(self) -> &'static str {
        match self {
            Self::Generic => PRESENT_FRAG_MS,
            Self::AmdFragmentMask => PRESENT_FRAG_MS_AMD,
        }
    }
}

pub struct PresentShaders {
    pub vs: Rc<Shader>,
    pub fs_copy: Rc<Shader>,
    pub fs_blit: Rc<Shader>,
    pub fs_resolve: Rc<Shader>,
    resolve_variant: ResolveVariant,
}

impl PresentShaders {
    pub fn create(device: &dyn Device) -> Result<Self> {
        let resolve_variant = ResolveVariant::select(device.features());
        debug!("present shaders: resolve variant {:?}", resolve_variant);

        let fs_bindings = vec![
            BindingInfo {
                descriptor_type: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                slot: IMAGE_BINDING,
                view_type: vk::ImageViewType::TYPE_2D,
                stages: vk::ShaderStageFlags::FRAGMENT,
                access: vk::AccessFlags::SHADER_READ,
            },
            BindingInfo {
                descriptor_type: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                slot: GAMMA_BINDING,
                view_type: vk::ImageViewType::TYPE_1D,
                stages: vk::ShaderStageFlags::FRAGMENT,
                access: vk::AccessFlags::SHADER_READ,
            },
        ];

        let vs = device
            .create_shader(ShaderInfo {
                stage: vk::ShaderStageFlags::VERTEX,
                module: PRESENT_VERT,
                bindings: Vec::new(),
                push_const_stages: vk::ShaderStageFlags::FRAGMENT,
                push_const_size: PresenterArgs::SIZE,
                input_mask: 0,
                output_mask: 0x1,
            })
            .context("create present vertex shader")?;

        let fs_info = |module: &'static str, input_mask: u32| ShaderInfo {
            stage: vk::ShaderStageFlags::FRAGMENT,
            module,
            bindings: fs_bindings.clone(),
            push_const_stages: vk::ShaderStageFlags::FRAGMENT,
            push_const_size: PresenterArgs::SIZE,
            input_mask,
            output_mask: 0x1,
        };

        // Only the blit shader consumes the interpolated coordinate.
        let fs_blit = device
            .create_shader(fs_info(PRESENT_FRAG_BLIT, 0x1))
            .context("create blit shader")?;
        let fs_copy = device
            .create_shader(fs_info(PRESENT_FRAG_COPY, 0))
            .context("create copy shader")?;
        let fs_resolve = device
            .create_shader(fs_info(resolve_variant.module(), 0))
            .context("create resolve shader")?;

        Ok(Self {
            vs,
            fs_copy,
            fs_blit,
            fs_resolve,
            resolve_variant,
        })
    }

    pub fn fragment(&self, variant: FragmentVariant) -> &Rc<Shader> {
        match variant {
            FragmentVariant::Copy => &self.fs_copy,
            FragmentVariant::Blit => &self.fs_blit,
            FragmentVariant::Resolve => &self.fs_resolve,
        }
    }

    pub fn resolve_variant(&self) -> ResolveVariant {
        self.resolve_variant
    }
}
