//! Surface descriptions and their uniform buffers.

use wgpu::util::DeviceExt;

use crate::data_structures::color::Color;

/// How a node's surface is shaded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Material {
    /// Diffuse surface lit by the scene's directional light.
    Standard { color: Color },
    /// Unlit square sprites of `size` world units, one per point.
    Points { color: Color, size: f32 },
}

impl Material {
    pub fn standard(color: Color) -> Self {
        Material::Standard { color }
    }

    pub fn points(color: Color, size: f32) -> Self {
        Material::Points { color, size }
    }

    pub fn color(&self) -> Color {
        match self {
            Material::Standard { color } | Material::Points { color, .. } => *color,
        }
    }

    pub fn to_uniform(&self) -> MaterialUniform {
        let size = match self {
            Material::Standard { .. } => 0.0,
            Material::Points { size, .. } => *size,
        };
        MaterialUniform {
            color: self.color().to_linear(),
            size,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    /// Linear rgb.
    pub color: [f32; 3],
    /// Sprite edge length, unused by meshes. Doubles as padding to 16 bytes.
    pub size: f32,
}

/// Group 0 of the points pipeline. Points are drawn one instance per point,
/// so the node's model matrix travels here instead of in an instance buffer.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointsUniform {
    pub model: [[f32; 4]; 4],
    pub material: MaterialUniform,
}

/// A material uniform uploaded to the GPU, bound at group 0.
#[derive(Debug)]
pub struct MaterialResources {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl MaterialResources {
    pub fn new<U: bytemuck::Pod>(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        uniform: &U,
    ) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Material Buffer"),
            contents: bytemuck::bytes_of(uniform),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("material_bind_group"),
        });
        Self { buffer, bind_group }
    }

    pub fn write<U: bytemuck::Pod>(&self, queue: &wgpu::Queue, uniform: &U) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(uniform));
    }
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("material_bind_group_layout"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_is_linear_and_carries_point_size() {
        let points = Material::points(Color::from_hex(0xffff00), 0.05).to_uniform();
        assert_eq!(points.color, [1.0, 1.0, 0.0]);
        assert_eq!(points.size, 0.05);

        let grey = Material::standard(Color::from_hex(0xbbbbbb)).to_uniform();
        assert!(grey.color[0] < 0xbb as f32 / 255.0);
        assert_eq!(grey.size, 0.0);
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 16);
        assert_eq!(std::mem::size_of::<PointsUniform>(), 80);
    }
}
