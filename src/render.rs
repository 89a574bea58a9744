//! Render composition and pipeline batching.
//!
//! Scene nodes describe what they want drawn as a [`Render`]. Before a frame
//! is encoded the render tree is flattened by [`Render::set_pipelines`] into
//! one batch per pipeline, so each pipeline is bound once per pass.
//!
//! # Key types
//!
//! - [`Drawable<'a>`] is a lit triangle mesh with its instance buffer and material
//! - [`Sprites<'a>`] is a point cloud drawn as camera-facing quads

use crate::data_structures::model::Mesh;

/// A mesh drawn with the standard pipeline and, if it casts shadows, into the shadow map.
pub struct Drawable<'a> {
    pub mesh: &'a Mesh,
    pub instance: &'a wgpu::Buffer,
    pub material: &'a wgpu::BindGroup,
    pub cast_shadow: bool,
}

/// A point cloud: one quad per point of `points`.
pub struct Sprites<'a> {
    pub points: &'a wgpu::Buffer,
    pub amount: u32,
    pub material: &'a wgpu::BindGroup,
}

/// Specifies how a scene object should be rendered.
///
/// - `None` renders nothing, e.g. lights or nodes not uploaded yet
/// - `Mesh(Drawable)` renders a lit mesh
/// - `Points(Sprites)` renders a point cloud
/// - `Composed(Vec<Render>)` recursively renders a composition of renders
pub enum Render<'a> {
    None,
    Mesh(Drawable<'a>),
    Points(Sprites<'a>),
    Composed(Vec<Render<'a>>),
}

impl<'a> Render<'a> {
    pub(crate) fn set_pipelines(self, meshes: &mut Vec<Drawable<'a>>, sprites: &mut Vec<Sprites<'a>>) {
        match self {
            Render::Mesh(drawable) => meshes.push(drawable),
            Render::Points(points) => sprites.push(points),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.set_pipelines(meshes, sprites)),
            Render::None => (),
        }
    }

    /// Number of draw calls this render expands to.
    pub fn len(&self) -> usize {
        match self {
            Render::None => 0,
            Render::Mesh(_) | Render::Points(_) => 1,
            Render::Composed(renders) => renders.iter().map(Render::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
