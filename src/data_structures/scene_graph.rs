//! Scene graph and hierarchical scene organization.
//!
//! A scene is a tree of [`SceneNode`]s. Every node holds a pair of
//! transforms: the local one it was placed with and the world one derived
//! from its parent (`world = parent * local`). Renderable nodes keep their
//! CPU-side geometry and create the matching GPU buffers lazily the first
//! time [`SceneNode::write_to_buffers`] runs.

use log::debug;
use wgpu::util::DeviceExt;

use crate::{
    context::Context,
    data_structures::{
        geometry::Geometry,
        instance::{Instance, InstanceRaw},
        light::DirectionalLight,
        material::{Material, MaterialResources, PointsUniform},
        model::{Mesh, PointVertex},
        points::PointBuffer,
    },
    render::{Drawable, Render, Sprites},
};

pub trait SceneNode {
    fn name(&self) -> &str;

    fn get_local_transform(&self) -> &Instance;

    fn set_local_transform(&mut self, instance: Instance);

    fn get_world_transform(&self) -> &Instance;

    /// Recomputes this node's world transform from `parent` and recurses into the children.
    fn update_world_transforms(&mut self, parent: &Instance);

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>>;

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>>;

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.get_children_mut().push(child);
    }

    fn cast_shadow(&self) -> bool {
        false
    }

    fn receive_shadow(&self) -> bool {
        false
    }

    fn geometry(&self) -> Option<&Geometry> {
        None
    }

    fn material(&self) -> Option<&Material> {
        None
    }

    fn point_buffer(&self) -> Option<&PointBuffer> {
        None
    }

    fn light(&self) -> Option<&DirectionalLight> {
        None
    }

    /// Uploads the node (creating its buffers on first use) and its children.
    fn write_to_buffers(&mut self, ctx: &Context);

    fn get_render(&self) -> Render<'_>;
}

fn render_children(children: &[Box<dyn SceneNode>]) -> Vec<Render<'_>> {
    children.iter().map(|child| child.get_render()).collect()
}

/// A node that only groups and transforms its children.
pub struct ContainerNode {
    name: String,
    children: Vec<Box<dyn SceneNode>>,
    transform: (Instance, Instance),
}

impl ContainerNode {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            children: vec![],
            transform: (Instance::default(), Instance::default()),
        }
    }
}

impl SceneNode for ContainerNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_local_transform(&self) -> &Instance {
        &self.transform.0
    }

    fn set_local_transform(&mut self, instance: Instance) {
        self.transform.0 = instance;
    }

    fn get_world_transform(&self) -> &Instance {
        &self.transform.1
    }

    fn update_world_transforms(&mut self, parent: &Instance) {
        let (local, world) = &mut self.transform;
        *world = parent * &*local;
        for child in self.children.iter_mut() {
            child.update_world_transforms(world);
        }
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn write_to_buffers(&mut self, ctx: &Context) {
        self.children
            .iter_mut()
            .for_each(|child| child.write_to_buffers(ctx));
    }

    fn get_render(&self) -> Render<'_> {
        Render::Composed(render_children(&self.children))
    }
}

struct MeshGpu {
    mesh: Mesh,
    instance_buffer: wgpu::Buffer,
    material: MaterialResources,
}

/// A triangle mesh with a standard material.
pub struct MeshNode {
    name: String,
    children: Vec<Box<dyn SceneNode>>,
    transform: (Instance, Instance),
    geometry: Geometry,
    material: Material,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    gpu: Option<MeshGpu>,
}

impl MeshNode {
    pub fn new(name: &str, geometry: Geometry, material: Material) -> Self {
        Self {
            name: name.to_string(),
            children: vec![],
            transform: (Instance::default(), Instance::default()),
            geometry,
            material,
            cast_shadow: false,
            receive_shadow: false,
            gpu: None,
        }
    }

    pub fn with_transform(mut self, instance: Instance) -> Self {
        self.transform.0 = instance;
        self
    }

    pub fn with_shadows(mut self, cast: bool, receive: bool) -> Self {
        self.cast_shadow = cast;
        self.receive_shadow = receive;
        self
    }
}

impl SceneNode for MeshNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_local_transform(&self) -> &Instance {
        &self.transform.0
    }

    fn set_local_transform(&mut self, instance: Instance) {
        self.transform.0 = instance;
    }

    fn get_world_transform(&self) -> &Instance {
        &self.transform.1
    }

    fn update_world_transforms(&mut self, parent: &Instance) {
        let (local, world) = &mut self.transform;
        *world = parent * &*local;
        for child in self.children.iter_mut() {
            child.update_world_transforms(world);
        }
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn cast_shadow(&self) -> bool {
        self.cast_shadow
    }

    fn receive_shadow(&self) -> bool {
        self.receive_shadow
    }

    fn geometry(&self) -> Option<&Geometry> {
        Some(&self.geometry)
    }

    fn material(&self) -> Option<&Material> {
        Some(&self.material)
    }

    fn write_to_buffers(&mut self, ctx: &Context) {
        let raw: InstanceRaw = self.transform.1.to_raw(self.receive_shadow);
        match &self.gpu {
            Some(gpu) => {
                ctx.queue
                    .write_buffer(&gpu.instance_buffer, 0, bytemuck::cast_slice(&[raw]));
            }
            None => {
                debug!(
                    "uploading {} ({} vertices, {} triangles)",
                    self.name,
                    self.geometry.vertex_count(),
                    self.geometry.triangle_count()
                );
                let instance_buffer =
                    ctx.device
                        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                            label: Some(&format!("{:?} Instance Buffer", self.name)),
                            contents: bytemuck::cast_slice(&[raw]),
                            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                        });
                self.gpu = Some(MeshGpu {
                    mesh: Mesh::from_geometry(&ctx.device, &self.name, &self.geometry),
                    instance_buffer,
                    material: MaterialResources::new(
                        &ctx.device,
                        &ctx.material_layout,
                        &self.material.to_uniform(),
                    ),
                });
            }
        }
        self.children
            .iter_mut()
            .for_each(|child| child.write_to_buffers(ctx));
    }

    fn get_render(&self) -> Render<'_> {
        let mut renders = render_children(&self.children);
        if let Some(gpu) = &self.gpu {
            renders.push(Render::Mesh(Drawable {
                mesh: &gpu.mesh,
                instance: &gpu.instance_buffer,
                material: &gpu.material.bind_group,
                cast_shadow: self.cast_shadow,
            }));
        }
        Render::Composed(renders)
    }
}

struct PointsGpu {
    points: wgpu::Buffer,
    material: MaterialResources,
}

/// A point cloud drawn as unlit square sprites.
pub struct PointsNode {
    name: String,
    children: Vec<Box<dyn SceneNode>>,
    transform: (Instance, Instance),
    points: PointBuffer,
    material: Material,
    gpu: Option<PointsGpu>,
}

impl PointsNode {
    pub fn new(name: &str, points: PointBuffer, material: Material) -> Self {
        Self {
            name: name.to_string(),
            children: vec![],
            transform: (Instance::default(), Instance::default()),
            points,
            material,
            gpu: None,
        }
    }

    pub fn with_transform(mut self, instance: Instance) -> Self {
        self.transform.0 = instance;
        self
    }

    fn uniform(&self) -> PointsUniform {
        PointsUniform {
            model: self.transform.1.to_matrix().into(),
            material: self.material.to_uniform(),
        }
    }
}

impl SceneNode for PointsNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_local_transform(&self) -> &Instance {
        &self.transform.0
    }

    fn set_local_transform(&mut self, instance: Instance) {
        self.transform.0 = instance;
    }

    fn get_world_transform(&self) -> &Instance {
        &self.transform.1
    }

    fn update_world_transforms(&mut self, parent: &Instance) {
        let (local, world) = &mut self.transform;
        *world = parent * &*local;
        for child in self.children.iter_mut() {
            child.update_world_transforms(world);
        }
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn material(&self) -> Option<&Material> {
        Some(&self.material)
    }

    fn point_buffer(&self) -> Option<&PointBuffer> {
        Some(&self.points)
    }

    fn write_to_buffers(&mut self, ctx: &Context) {
        let uniform = self.uniform();
        match &self.gpu {
            Some(gpu) => gpu.material.write(&ctx.queue, &uniform),
            None if self.points.is_empty() => (),
            None => {
                debug!("uploading {} ({} points)", self.name, self.points.len());
                let vertices: Vec<PointVertex> = self
                    .points
                    .iter()
                    .map(|position| PointVertex { position })
                    .collect();
                let points = ctx
                    .device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(&format!("{:?} Point Buffer", self.name)),
                        contents: bytemuck::cast_slice(&vertices),
                        usage: wgpu::BufferUsages::VERTEX,
                    });
                self.gpu = Some(PointsGpu {
                    points,
                    material: MaterialResources::new(&ctx.device, &ctx.material_layout, &uniform),
                });
            }
        }
        self.children
            .iter_mut()
            .for_each(|child| child.write_to_buffers(ctx));
    }

    fn get_render(&self) -> Render<'_> {
        let mut renders = render_children(&self.children);
        if let Some(gpu) = &self.gpu {
            renders.push(Render::Points(Sprites {
                points: &gpu.points,
                amount: self.points.len() as u32,
                material: &gpu.material.bind_group,
            }));
        }
        Render::Composed(renders)
    }
}

/// Holds a directional light. The light's position is the node's translation.
pub struct LightNode {
    name: String,
    children: Vec<Box<dyn SceneNode>>,
    transform: (Instance, Instance),
    light: DirectionalLight,
    world_light: DirectionalLight,
}

impl LightNode {
    pub fn new(name: &str, light: DirectionalLight) -> Self {
        let local = Instance::from(cgmath::Vector3::new(
            light.position.x,
            light.position.y,
            light.position.z,
        ));
        Self {
            name: name.to_string(),
            children: vec![],
            transform: (local.clone(), local),
            world_light: light.clone(),
            light,
        }
    }
}

impl SceneNode for LightNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_local_transform(&self) -> &Instance {
        &self.transform.0
    }

    fn set_local_transform(&mut self, instance: Instance) {
        self.light.position = cgmath::Point3::new(
            instance.position.x,
            instance.position.y,
            instance.position.z,
        );
        self.transform.0 = instance;
    }

    fn get_world_transform(&self) -> &Instance {
        &self.transform.1
    }

    fn update_world_transforms(&mut self, parent: &Instance) {
        let (local, world) = &mut self.transform;
        *world = parent * &*local;
        let p = world.position;
        self.world_light.position = cgmath::Point3::new(p.x, p.y, p.z);
        for child in self.children.iter_mut() {
            child.update_world_transforms(world);
        }
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn cast_shadow(&self) -> bool {
        self.light.cast_shadow
    }

    /// The light in world space.
    fn light(&self) -> Option<&DirectionalLight> {
        Some(&self.world_light)
    }

    fn write_to_buffers(&mut self, ctx: &Context) {
        self.children
            .iter_mut()
            .for_each(|child| child.write_to_buffers(ctx));
    }

    fn get_render(&self) -> Render<'_> {
        Render::Composed(render_children(&self.children))
    }
}

/// The root of a scene graph.
pub struct Scene {
    root: ContainerNode,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            root: ContainerNode::new("scene"),
        }
    }

    pub fn add(&mut self, child: Box<dyn SceneNode>) {
        self.root.add_child(child);
    }

    /// The direct children of the root, in insertion order.
    pub fn children(&self) -> &[Box<dyn SceneNode>] {
        self.root.get_children()
    }

    /// Depth-first search by name.
    pub fn find(&self, name: &str) -> Option<&dyn SceneNode> {
        fn walk<'a>(nodes: &'a [Box<dyn SceneNode>], name: &str) -> Option<&'a dyn SceneNode> {
            nodes.iter().find_map(|node| {
                if node.name() == name {
                    Some(node.as_ref())
                } else {
                    walk(node.get_children(), name)
                }
            })
        }
        walk(self.children(), name)
    }

    /// The first light in the scene, in world space.
    pub fn light(&self) -> Option<&DirectionalLight> {
        fn walk(nodes: &[Box<dyn SceneNode>]) -> Option<&DirectionalLight> {
            nodes
                .iter()
                .find_map(|node| node.light().or_else(|| walk(node.get_children())))
        }
        walk(self.children())
    }

    pub fn update_world_transforms(&mut self) {
        self.root.update_world_transforms(&Instance::default());
    }

    pub fn write_to_buffers(&mut self, ctx: &Context) {
        self.root.write_to_buffers(ctx);
    }

    pub fn get_render(&self) -> Render<'_> {
        self.root.get_render()
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{InnerSpace, Point3, Vector3};

    use super::*;
    use crate::data_structures::{color::Color, geometry::box_geometry};

    fn cube(name: &str) -> MeshNode {
        MeshNode::new(
            name,
            box_geometry(1.0, 1.0, 1.0),
            Material::standard(Color::from_hex(0xff0000)),
        )
    }

    #[test]
    fn world_transform_composes_with_parents() {
        let mut group = ContainerNode::new("group");
        group.set_local_transform(Instance::at(1.0, 0.0, 0.0));
        group.add_child(Box::new(cube("child").with_transform(Instance::at(0.0, 2.0, 0.0))));
        let mut scene = Scene::new();
        scene.add(Box::new(group));
        scene.update_world_transforms();

        let child = scene.find("child").unwrap();
        assert_eq!(child.get_world_transform().position, Vector3::new(1.0, 2.0, 0.0));
        assert_eq!(child.get_local_transform().position, Vector3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn nodes_report_their_shadow_flags_and_data() {
        let node = cube("box").with_shadows(true, false);
        assert!(node.cast_shadow());
        assert!(!node.receive_shadow());
        assert!(node.geometry().is_some());
        assert!(node.point_buffer().is_none());

        let points = PointsNode::new(
            "points",
            PointBuffer::from_positions(vec![0.0; 6]),
            Material::points(Color::WHITE, 0.1),
        );
        assert!(!points.cast_shadow() && !points.receive_shadow());
        assert_eq!(points.point_buffer().map(PointBuffer::len), Some(2));
    }

    #[test]
    fn light_follows_its_node() {
        let mut light = DirectionalLight::new(Color::WHITE, 5.0);
        light.position = Point3::new(3.0, 4.0, 5.0);
        light.cast_shadow = true;
        let mut scene = Scene::new();
        scene.add(Box::new(LightNode::new("light", light)));
        scene.update_world_transforms();

        let light = scene.light().unwrap();
        assert_eq!(light.position, Point3::new(3.0, 4.0, 5.0));
        assert!((light.direction() - Vector3::new(-3.0, -4.0, -5.0).normalize()).magnitude() < 1e-6);
        assert!(scene.find("light").unwrap().cast_shadow());
    }

    #[test]
    fn nothing_renders_before_upload() {
        let mut scene = Scene::new();
        scene.add(Box::new(cube("a")));
        scene.add(Box::new(cube("b")));
        assert_eq!(scene.children().len(), 2);
        assert!(scene.get_render().is_empty());
    }
}
