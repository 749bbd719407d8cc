use anyhow::{Context, Result};
use glam::{Mat4, Quat, Vec3};
use gltf::camera::Projection;
use gltf::khr_lights_punctual::Kind as GltfLightKind;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(usize);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self { translation: Vec3::ZERO, rotation: Quat::IDENTITY, scale: Vec3::ONE }
    }
}

impl NodeTransform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self { translation, ..Self::default() }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialKind {
    Standard,
    Unlit,
    ShadowOnly,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub kind: MaterialKind,
    pub color: Vec3,
    pub opacity: f32,
    pub transparent: bool,
    pub depth_write: bool,
    pub double_sided: bool,
    pub tone_mapped: bool,
    pub wireframe: bool,
}

impl Material {
    pub fn standard(name: impl Into<String>, color: Vec3) -> Self {
        Self {
            name: name.into(),
            kind: MaterialKind::Standard,
            color,
            opacity: 1.0,
            transparent: false,
            depth_write: true,
            double_sided: false,
            tone_mapped: true,
            wireframe: false,
        }
    }

    pub fn unlit(name: impl Into<String>, color: Vec3) -> Self {
        Self { kind: MaterialKind::Unlit, tone_mapped: false, ..Self::standard(name, color) }
    }

    /// Invisible except where shadows land on it.
    pub fn shadow_only(name: impl Into<String>, opacity: f32) -> Self {
        Self {
            kind: MaterialKind::ShadowOnly,
            opacity: opacity.clamp(0.0, 1.0),
            transparent: true,
            ..Self::standard(name, Vec3::ZERO)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshNode {
    /// One material slot per primitive.
    pub materials: Vec<MaterialId>,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl MeshNode {
    pub fn new(materials: Vec<MaterialId>) -> Self {
        Self { materials, cast_shadow: false, receive_shadow: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    Directional,
    Point,
    Spot,
    Ambient,
}

impl LightKind {
    pub fn casts_shadows(self) -> bool {
        matches!(self, LightKind::Directional | LightKind::Point | LightKind::Spot)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowParams {
    pub map_size: u32,
    pub bias: f32,
    pub normal_bias: f32,
}

impl Default for ShadowParams {
    fn default() -> Self {
        Self { map_size: 512, bias: 0.0, normal_bias: 0.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotParams {
    pub angle: f32,
    pub penumbra: f32,
    pub decay: f32,
    pub distance: f32,
}

impl Default for SpotParams {
    fn default() -> Self {
        Self { angle: std::f32::consts::FRAC_PI_3, penumbra: 0.0, decay: 2.0, distance: 0.0 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LightNode {
    pub kind: LightKind,
    pub color: Vec3,
    pub intensity: f32,
    pub range: Option<f32>,
    pub cast_shadow: bool,
    pub shadow: ShadowParams,
    pub spot: Option<SpotParams>,
    /// Node the light is aimed at (spot and directional lights).
    pub target: Option<NodeId>,
}

impl LightNode {
    pub fn new(kind: LightKind, intensity: f32) -> Self {
        Self {
            kind,
            color: Vec3::ONE,
            intensity,
            range: None,
            cast_shadow: false,
            shadow: ShadowParams::default(),
            spot: (kind == LightKind::Spot).then(SpotParams::default),
            target: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraNode {
    pub fov_y_radians: f32,
    pub near: f32,
    pub far: f32,
    pub aspect: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Empty,
    Mesh(MeshNode),
    Light(LightNode),
    Camera(CameraNode),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: Option<String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub transform: NodeTransform,
    pub visible: bool,
    pub kind: NodeKind,
}

/// Arena scene graph: named nodes with TRS transforms plus a shared material table.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    materials: Vec<Material>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(
        &mut self,
        name: &str,
        parent: Option<NodeId>,
        transform: NodeTransform,
        kind: NodeKind,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        let parent = parent.filter(|p| p.0 < self.nodes.len());
        let name = (!name.is_empty()).then(|| name.to_string());
        self.nodes.push(Node { name, parent, children: Vec::new(), transform, visible: true, kind });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|node| node.name.as_deref() == Some(name)).map(NodeId)
    }

    /// First node matching any of the candidate names, in candidate order.
    pub fn find_first(&self, candidates: &[&str]) -> Option<NodeId> {
        candidates.iter().find_map(|name| self.find_by_name(name))
    }

    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut cursor = Some(id);
        // Depth bound guards against malformed parent cycles.
        for _ in 0..=self.nodes.len() {
            let Some(node) = cursor.and_then(|current| self.node(current)) else {
                break;
            };
            matrix = node.transform.matrix() * matrix;
            cursor = node.parent;
        }
        matrix
    }

    pub fn world_position(&self, id: NodeId) -> Vec3 {
        self.world_matrix(id).transform_point3(Vec3::ZERO)
    }

    pub fn world_rotation(&self, id: NodeId) -> Quat {
        let (_, rotation, _) = self.world_matrix(id).to_scale_rotation_translation();
        rotation.normalize()
    }

    /// Converts a world-space point into the local space of `parent` (scene root when `None`).
    pub fn world_to_local(&self, parent: Option<NodeId>, point: Vec3) -> Vec3 {
        match parent {
            Some(parent) => self.world_matrix(parent).inverse().transform_point3(point),
            None => point,
        }
    }

    pub fn local_translation(&self, id: NodeId) -> Option<Vec3> {
        self.node(id).map(|node| node.transform.translation)
    }

    pub fn set_local_translation(&mut self, id: NodeId, translation: Vec3) {
        if let Some(node) = self.node_mut(id) {
            node.transform.translation = translation;
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|node| node.parent)
    }

    /// The node itself followed by its subtree, depth first.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.node(current) else {
                continue;
            };
            if out.len() > self.nodes.len() {
                break;
            }
            out.push(current);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    pub fn mesh_ids(&self) -> Vec<NodeId> {
        self.node_ids().filter(|id| self.mesh(*id).is_some()).collect()
    }

    pub fn mesh(&self, id: NodeId) -> Option<&MeshNode> {
        match self.node(id).map(|node| &node.kind) {
            Some(NodeKind::Mesh(mesh)) => Some(mesh),
            _ => None,
        }
    }

    pub fn mesh_mut(&mut self, id: NodeId) -> Option<&mut MeshNode> {
        match self.node_mut(id).map(|node| &mut node.kind) {
            Some(NodeKind::Mesh(mesh)) => Some(mesh),
            _ => None,
        }
    }

    pub fn light(&self, id: NodeId) -> Option<&LightNode> {
        match self.node(id).map(|node| &node.kind) {
            Some(NodeKind::Light(light)) => Some(light),
            _ => None,
        }
    }

    pub fn light_mut(&mut self, id: NodeId) -> Option<&mut LightNode> {
        match self.node_mut(id).map(|node| &mut node.kind) {
            Some(NodeKind::Light(light)) => Some(light),
            _ => None,
        }
    }

    pub fn camera(&self, id: NodeId) -> Option<&CameraNode> {
        match self.node(id).map(|node| &node.kind) {
            Some(NodeKind::Camera(camera)) => Some(camera),
            _ => None,
        }
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0)
    }

    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(id.0)
    }

    pub fn materials_mut(&mut self) -> impl Iterator<Item = &mut Material> {
        self.materials.iter_mut()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    /// Reads a `.gltf` or `.glb` file. Only the node hierarchy, lights, cameras and material
    /// names are kept; geometry stays with the renderer.
    pub fn load_gltf(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        let gltf = gltf::Gltf::open(path_ref)
            .with_context(|| format!("Failed to import glTF scene from {}", path_ref.display()))?;
        Ok(Self::from_gltf_document(&gltf.document))
    }

    pub fn from_gltf_slice(bytes: &[u8]) -> Result<Self> {
        let gltf = gltf::Gltf::from_slice(bytes).context("Failed to parse glTF scene bytes")?;
        Ok(Self::from_gltf_document(&gltf.document))
    }

    pub fn from_gltf_document(document: &gltf::Document) -> Self {
        let mut graph = SceneGraph::new();

        let mut material_map: HashMap<usize, MaterialId> = HashMap::new();
        for (index, material) in document.materials().enumerate() {
            let name = material.name().map(str::to_string).unwrap_or_else(|| format!("material_{index}"));
            let [r, g, b, _] = material.pbr_metallic_roughness().base_color_factor();
            let id = graph.add_material(Material::standard(name, Vec3::new(r, g, b)));
            material_map.insert(material.index().unwrap_or(index), id);
        }
        let mut default_material = None;

        for node in document.nodes() {
            let (t, r, s) = node.transform().decomposed();
            let transform = NodeTransform {
                translation: Vec3::from_array(t),
                rotation: Quat::from_xyzw(r[0], r[1], r[2], r[3]).normalize(),
                scale: Vec3::from_array(s),
            };
            let kind = if let Some(light) = node.light() {
                NodeKind::Light(import_light(&light))
            } else if let Some(camera) = node.camera() {
                match camera.projection() {
                    Projection::Perspective(perspective) => NodeKind::Camera(CameraNode {
                        fov_y_radians: perspective.yfov(),
                        near: perspective.znear(),
                        far: perspective.zfar().unwrap_or(2000.0),
                        aspect: perspective.aspect_ratio(),
                    }),
                    Projection::Orthographic(_) => {
                        log::warn!(
                            "[scene] Orthographic camera on node {} ignored",
                            node.name().unwrap_or("<unnamed>")
                        );
                        NodeKind::Empty
                    }
                }
            } else if let Some(mesh) = node.mesh() {
                let materials = mesh
                    .primitives()
                    .map(|primitive| {
                        primitive.material().index().and_then(|idx| material_map.get(&idx).copied()).unwrap_or_else(
                            || {
                                *default_material.get_or_insert_with(|| {
                                    graph.add_material(Material::standard("Default", Vec3::ONE))
                                })
                            },
                        )
                    })
                    .collect();
                NodeKind::Mesh(MeshNode::new(materials))
            } else {
                NodeKind::Empty
            };
            // glTF node indices are dense, so NodeId mirrors the document index.
            graph.add_node(node.name().unwrap_or(""), None, transform, kind);
        }

        for node in document.nodes() {
            let parent = NodeId(node.index());
            for child in node.children() {
                let child_id = NodeId(child.index());
                if let Some(entry) = graph.nodes.get_mut(child_id.0) {
                    entry.parent = Some(parent);
                }
                graph.nodes[parent.0].children.push(child_id);
            }
        }
        graph
    }
}

fn import_light(light: &gltf::khr_lights_punctual::Light<'_>) -> LightNode {
    let kind = match light.kind() {
        GltfLightKind::Directional => LightKind::Directional,
        GltfLightKind::Point => LightKind::Point,
        GltfLightKind::Spot { .. } => LightKind::Spot,
    };
    let mut node = LightNode::new(kind, light.intensity());
    node.color = Vec3::from_array(light.color());
    node.range = light.range();
    if let GltfLightKind::Spot { inner_cone_angle, outer_cone_angle } = light.kind() {
        let penumbra =
            if outer_cone_angle > f32::EPSILON { (1.0 - inner_cone_angle / outer_cone_angle).clamp(0.0, 1.0) } else { 0.0 };
        node.spot = Some(SpotParams {
            angle: outer_cone_angle,
            penumbra,
            decay: 2.0,
            distance: light.range().unwrap_or(0.0),
        });
    }
    node
}
