use crate::{
    data_structures::model::{PointVertex, Vertex},
    pipelines::basic::{depth_state, mk_render_pipeline},
};

/// Point clouds: [`PointsUniform`](crate::data_structures::material::PointsUniform)
/// at group 0, camera at group 1. Six vertices per point instance.
pub fn mk_points_pipeline(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    sample_count: u32,
    material_bind_group_layout: &wgpu::BindGroupLayout,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Points Pipeline Layout"),
        bind_group_layouts: &[material_bind_group_layout, camera_bind_group_layout],
        push_constant_ranges: &[],
    });

    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Points Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("points.wgsl").into()),
    };

    mk_render_pipeline(
        device,
        &layout,
        Some(wgpu::ColorTargetState {
            format: color_format,
            blend: Some(wgpu::BlendState::REPLACE),
            write_mask: wgpu::ColorWrites::ALL,
        }),
        Some(depth_state(wgpu::DepthBiasState::default())),
        &[PointVertex::desc()],
        shader,
        sample_count,
        None,
    )
}
