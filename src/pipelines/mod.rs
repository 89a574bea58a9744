//! Render pipelines and the GPU-side light.
//!
//! - `basic` is the lit standard-material pipeline plus the shared pipeline builder
//! - `light` owns the light uniform, the shadow map and their bind groups
//! - `points` draws point clouds as camera-facing quads
//! - `shadow` renders shadow casters into the shadow map

pub mod basic;
pub mod light;
pub mod points;
pub mod shadow;

/// Every pipeline a frame needs, built once per [`Context`](crate::context::Context).
#[derive(Debug)]
pub struct Pipelines {
    pub basic: wgpu::RenderPipeline,
    pub shadow: wgpu::RenderPipeline,
    pub points: wgpu::RenderPipeline,
}
