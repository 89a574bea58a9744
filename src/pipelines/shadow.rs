use crate::{
    data_structures::{
        instance::InstanceRaw,
        model::{self, Vertex},
    },
    pipelines::basic::{depth_state, mk_render_pipeline},
};

/// Depth-only pass from the light's shadow camera into the shadow map.
///
/// Both faces are rasterized so thin geometry like the floor plane still
/// occludes, and a slope-scaled bias keeps lit faces from shadowing themselves.
pub fn mk_shadow_pipeline(
    device: &wgpu::Device,
    shadow_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Shadow Pipeline Layout"),
        bind_group_layouts: &[shadow_bind_group_layout],
        push_constant_ranges: &[],
    });

    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Shadow Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("shadow.wgsl").into()),
    };

    mk_render_pipeline(
        device,
        &layout,
        None,
        Some(depth_state(wgpu::DepthBiasState {
            constant: 2,
            slope_scale: 2.0,
            clamp: 0.0,
        })),
        &[model::ModelVertex::desc(), InstanceRaw::desc()],
        shader,
        1,
        None,
    )
}
