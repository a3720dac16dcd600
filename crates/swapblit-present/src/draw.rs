// SPDX-License-Identifier: CEPL-1.0
//! The single fullscreen-triangle draw every present path ends with.

use std::rc::Rc;

use anyhow::{Context, Result};
use ash::vk;
use swapblit_render::{
    BlendMode, DepthStencilState, Device, GraphicsContext, ImageView, InputAssemblyState,
    LogicOpState, MultisampleState, RasterizerState, Sampler, SamplerInfo,
};

use crate::args::{PresentTransform, PresenterArgs};
use crate::shaders::{FragmentVariant, PresentShaders, GAMMA_BINDING, IMAGE_BINDING};

const SPEC_SAMPLE_COUNT: u32 = 0;
const SPEC_GAMMA: u32 = 1;

pub(crate) struct PresentSamplers {
    pub present: Rc<Sampler>,
    pub gamma: Rc<Sampler>,
}

impl PresentSamplers {
    pub fn create(device: &dyn Device) -> Result<Self> {
        let mut info = SamplerInfo::default();
        info.set_filter(
            vk::Filter::LINEAR,
            vk::Filter::LINEAR,
            vk::SamplerMipmapMode::NEAREST,
        )
        .set_address_modes(
            vk::SamplerAddressMode::CLAMP_TO_BORDER,
            vk::SamplerAddressMode::CLAMP_TO_BORDER,
            vk::SamplerAddressMode::CLAMP_TO_BORDER,
        )
        .set_use_pixel_coordinates(true);
        let present = device
            .create_sampler(&info)
            .context("create present sampler")?;

        info.set_address_modes(
            vk::SamplerAddressMode::CLAMP_TO_EDGE,
            vk::SamplerAddressMode::CLAMP_TO_EDGE,
            vk::SamplerAddressMode::CLAMP_TO_EDGE,
        )
        .set_use_pixel_coordinates(false);
        let gamma = device.create_sampler(&info).context("create gamma sampler")?;

        Ok(Self { present, gamma })
    }
}

fn input_assembly_state() -> InputAssemblyState {
    InputAssemblyState {
        primitive_topology: vk::PrimitiveTopology::TRIANGLE_STRIP,
        primitive_restart: false,
        patch_vertex_count: 0,
    }
}

fn rasterizer_state() -> RasterizerState {
    RasterizerState {
        polygon_mode: vk::PolygonMode::FILL,
        cull_mode: vk::CullModeFlags::BACK,
        front_face: vk::FrontFace::COUNTER_CLOCKWISE,
        depth_clip_enable: false,
        depth_bias_enable: false,
        sample_count: vk::SampleCountFlags::TYPE_1,
        flat_shading: false,
    }
}

fn multisample_state() -> MultisampleState {
    MultisampleState {
        sample_mask: 0xffff_ffff,
        enable_alpha_to_coverage: false,
    }
}

fn depth_stencil_state() -> DepthStencilState {
    let keep = vk::StencilOpState {
        fail_op: vk::StencilOp::KEEP,
        pass_op: vk::StencilOp::KEEP,
        depth_fail_op: vk::StencilOp::KEEP,
        compare_op: vk::CompareOp::ALWAYS,
        compare_mask: 0xffff_ffff,
        write_mask: 0xffff_ffff,
        reference: 0,
    };
    DepthStencilState {
        enable_depth_test: false,
        enable_depth_write: false,
        enable_stencil_test: false,
        depth_compare_op: vk::CompareOp::ALWAYS,
        stencil_op_front: keep,
        stencil_op_back: keep,
    }
}

fn logic_op_state() -> LogicOpState {
    LogicOpState {
        enable_logic_op: false,
        logic_op: vk::LogicOp::NO_OP,
    }
}

fn blend_mode() -> BlendMode {
    BlendMode {
        enable_blending: false,
        color_src_factor: vk::BlendFactor::ONE,
        color_dst_factor: vk::BlendFactor::ONE_MINUS_SRC_ALPHA,
        color_blend_op: vk::BlendOp::ADD,
        alpha_src_factor: vk::BlendFactor::ONE,
        alpha_dst_factor: vk::BlendFactor::ONE_MINUS_SRC_ALPHA,
        alpha_blend_op: vk::BlendOp::ADD,
        write_mask: vk::ColorComponentFlags::RGBA,
    }
}

/// Everything a present draw reads besides its rectangles.
pub(crate) struct DrawResources<'a> {
    pub shaders: &'a PresentShaders,
    pub samplers: &'a PresentSamplers,
    pub gamma: Option<&'a Rc<ImageView>>,
}

/// Records state, bindings and the draw that maps `src_rect` of `src_view`
/// onto `dst_rect` of `dst_view`. Pixels of `dst_view` outside `dst_rect` are
/// cleared unless the rect spans the whole image.
pub(crate) fn draw(
    ctx: &mut dyn GraphicsContext,
    res: &DrawResources<'_>,
    variant: FragmentVariant,
    dst_view: &Rc<ImageView>,
    dst_rect: vk::Rect2D,
    src_view: &Rc<ImageView>,
    src_rect: vk::Rect2D,
) {
    ctx.set_input_assembly_state(input_assembly_state());
    ctx.set_input_layout(&[], &[]);
    ctx.set_rasterizer_state(rasterizer_state());
    ctx.set_multisample_state(multisample_state());
    ctx.set_depth_stencil_state(depth_stencil_state());
    ctx.set_logic_op_state(logic_op_state());
    ctx.set_blend_mode(0, blend_mode());

    let viewport = vk::Viewport {
        x: dst_rect.offset.x as f32,
        y: dst_rect.offset.y as f32,
        width: dst_rect.extent.width as f32,
        height: dst_rect.extent.height as f32,
        min_depth: 0.0,
        max_depth: 1.0,
    };
    ctx.set_viewport(viewport, dst_rect);

    ctx.bind_render_target(dst_view, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);

    if dst_rect.extent == dst_view.image().info().extent_2d() {
        ctx.discard_image_view(dst_view, vk::ImageAspectFlags::COLOR);
    } else {
        ctx.clear_render_target(dst_view, vk::ImageAspectFlags::COLOR, [0.0; 4]);
    }

    let fs_stage = vk::ShaderStageFlags::FRAGMENT;
    ctx.bind_sampler(fs_stage, IMAGE_BINDING, &res.samplers.present);
    ctx.bind_sampler(fs_stage, GAMMA_BINDING, &res.samplers.gamma);
    ctx.bind_image_view(fs_stage, IMAGE_BINDING, Some(src_view));
    ctx.bind_image_view(fs_stage, GAMMA_BINDING, res.gamma);

    ctx.bind_shader(vk::ShaderStageFlags::VERTEX, &res.shaders.vs);
    ctx.bind_shader(fs_stage, res.shaders.fragment(variant));

    let args = PresenterArgs::new(
        src_rect.offset,
        PresentTransform::between(dst_rect, src_rect),
    );
    ctx.push_constants(0, bytemuck::bytes_of(&args));

    let bind_point = vk::PipelineBindPoint::GRAPHICS;
    ctx.set_spec_constant(
        bind_point,
        SPEC_SAMPLE_COUNT,
        src_view.image().info().sample_count.as_raw(),
    );
    ctx.set_spec_constant(bind_point, SPEC_GAMMA, u32::from(res.gamma.is_some()));

    // Fullscreen triangle generated in the vertex shader.
    ctx.draw(3, 1, 0, 0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use swapblit_render::recording::{Command, RecordingContext, RecordingDevice};
    use swapblit_render::DeviceFeatures;

    fn rect(x: i32, y: i32, width: u32, height: u32) -> vk::Rect2D {
        vk::Rect2D {
            offset: vk::Offset2D { x, y },
            extent: vk::Extent2D { width, height },
        }
    }

    struct Fixture {
        device: RecordingDevice,
        shaders: PresentShaders,
        samplers: PresentSamplers,
    }

    impl Fixture {
        fn new() -> Self {
            let device = RecordingDevice::new(DeviceFeatures::default());
            let shaders = PresentShaders::create(&device).unwrap();
            let samplers = PresentSamplers::create(&device).unwrap();
            Self {
                device,
                shaders,
                samplers,
            }
        }

        fn target(&self, width: u32, height: u32) -> Rc<ImageView> {
            self.device
                .color_target(
                    vk::Extent2D { width, height },
                    vk::Format::B8G8R8A8_UNORM,
                    vk::SampleCountFlags::TYPE_1,
                )
                .unwrap()
        }

        fn draw(
            &self,
            ctx: &mut RecordingContext,
            dst: &Rc<ImageView>,
            dst_rect: vk::Rect2D,
            src: &Rc<ImageView>,
            src_rect: vk::Rect2D,
        ) {
            let res = DrawResources {
                shaders: &self.shaders,
                samplers: &self.samplers,
                gamma: None,
            };
            draw(ctx, &res, FragmentVariant::Blit, dst, dst_rect, src, src_rect);
        }
    }

    #[test]
    fn samplers_differ_in_addressing_and_coordinates() {
        let fx = Fixture::new();
        let present = fx.samplers.present.info();
        let gamma = fx.samplers.gamma.info();
        assert_eq!(present.mag_filter, vk::Filter::LINEAR);
        assert_eq!(
            present.address_modes,
            [vk::SamplerAddressMode::CLAMP_TO_BORDER; 3]
        );
        assert!(present.use_pixel_coordinates);
        assert_eq!(gamma.min_filter, vk::Filter::LINEAR);
        assert_eq!(gamma.address_modes, [vk::SamplerAddressMode::CLAMP_TO_EDGE; 3]);
        assert!(!gamma.use_pixel_coordinates);
    }

    #[test]
    fn full_rect_discards_and_draws_one_triangle() {
        let fx = Fixture::new();
        let mut ctx = RecordingContext::new();
        let dst = fx.target(1920, 1080);
        let src = fx.target(1280, 720);
        fx.draw(&mut ctx, &dst, rect(0, 0, 1920, 1080), &src, rect(0, 0, 1280, 720));

        assert_eq!(ctx.count(|c| matches!(c, Command::DiscardImageView { .. })), 1);
        assert_eq!(ctx.count(|c| matches!(c, Command::ClearRenderTarget { .. })), 0);
        let draws: Vec<_> = ctx
            .commands()
            .iter()
            .filter_map(|c| match c {
                Command::Draw {
                    vertex_count,
                    instance_count,
                    ..
                } => Some((*vertex_count, *instance_count)),
                _ => None,
            })
            .collect();
        assert_eq!(draws, vec![(3, 1)]);
        assert!(matches!(ctx.commands().last(), Some(Command::Draw { .. })));
    }

    #[test]
    fn partial_rect_clears_and_limits_viewport() {
        let fx = Fixture::new();
        let mut ctx = RecordingContext::new();
        let dst = fx.target(1920, 1080);
        let src = fx.target(1280, 720);
        let dst_rect = rect(320, 180, 1280, 720);
        fx.draw(&mut ctx, &dst, dst_rect, &src, rect(0, 0, 1280, 720));

        assert_eq!(ctx.count(|c| matches!(c, Command::ClearRenderTarget { .. })), 1);
        assert_eq!(ctx.count(|c| matches!(c, Command::DiscardImageView { .. })), 0);
        let (viewport, scissor) = ctx
            .commands()
            .iter()
            .find_map(|c| match c {
                Command::SetViewport { viewport, scissor } => Some((*viewport, *scissor)),
                _ => None,
            })
            .unwrap();
        assert_eq!(scissor, dst_rect);
        assert_eq!((viewport.x, viewport.y), (320.0, 180.0));
        assert_eq!((viewport.width, viewport.height), (1280.0, 720.0));
        assert_eq!((viewport.min_depth, viewport.max_depth), (0.0, 1.0));
    }

    #[test]
    fn fixed_state_is_fullscreen_triangle_friendly() {
        let fx = Fixture::new();
        let mut ctx = RecordingContext::new();
        let dst = fx.target(64, 64);
        fx.draw(&mut ctx, &dst, rect(0, 0, 64, 64), &dst, rect(0, 0, 64, 64));

        for cmd in ctx.commands() {
            match cmd {
                Command::SetInputAssemblyState(ia) => {
                    assert_eq!(ia.primitive_topology, vk::PrimitiveTopology::TRIANGLE_STRIP);
                    assert!(!ia.primitive_restart);
                }
                Command::SetInputLayout {
                    attributes,
                    bindings,
                } => assert_eq!((*attributes, *bindings), (0, 0)),
                Command::SetRasterizerState(rs) => {
                    assert_eq!(rs.cull_mode, vk::CullModeFlags::BACK);
                    assert_eq!(rs.front_face, vk::FrontFace::COUNTER_CLOCKWISE);
                    assert!(!rs.depth_clip_enable && !rs.depth_bias_enable);
                }
                Command::SetDepthStencilState(ds) => {
                    assert!(!ds.enable_depth_test && !ds.enable_stencil_test);
                }
                Command::SetLogicOpState(lo) => assert!(!lo.enable_logic_op),
                Command::SetBlendMode { mode, .. } => {
                    assert!(!mode.enable_blending);
                    assert_eq!(mode.write_mask, vk::ColorComponentFlags::RGBA);
                }
                _ => {}
            }
        }
    }

    #[test]
    fn push_constants_and_spec_constants() {
        let fx = Fixture::new();
        let mut ctx = RecordingContext::new();
        let dst = fx.target(1920, 1080);
        let src = fx.target(1280, 720);
        fx.draw(&mut ctx, &dst, rect(0, 0, 1920, 1080), &src, rect(16, 8, 1280, 720));

        let data = ctx
            .commands()
            .iter()
            .find_map(|c| match c {
                Command::PushConstants { offset: 0, data } => Some(data.clone()),
                _ => None,
            })
            .unwrap();
        let args: PresenterArgs = bytemuck::pod_read_unaligned(&data);
        assert_eq!(args.src_offset, [16, 8]);
        assert_eq!(args.slot, [1280, 720]);

        assert_eq!(ctx.spec_constant(SPEC_SAMPLE_COUNT), Some(1));
        assert_eq!(ctx.spec_constant(SPEC_GAMMA), Some(0));
        let gamma_binding = ctx.commands().iter().find_map(|c| match c {
            Command::BindImageView { slot, view, .. } if *slot == GAMMA_BINDING => {
                Some(view.is_none())
            }
            _ => None,
        });
        assert_eq!(gamma_binding, Some(true));
    }
}
