//! Material passes run over the imported scene: ground, subject and overlay preparation plus the
//! debug toggles.

use crate::scene_graph::{Material, MaterialId, NodeId, SceneGraph};
use glam::Vec3;

pub const GROUND: &str = "Ground";
pub const GROUND_SHADOW_ONLY: &str = "Ground_Std_White";
pub const SUBJECT_UNLIT: &str = "Dog_Unlit";
pub const SHADOW_SHAPE_UNLIT: &str = "ShadowShape_Unlit";

fn material_named(graph: &SceneGraph, id: MaterialId, name: &str) -> bool {
    graph.material(id).map(|material| material.name == name).unwrap_or(false)
}

fn meshes_under(graph: &SceneGraph, root: NodeId) -> Vec<NodeId> {
    graph.descendants(root).into_iter().filter(|id| graph.mesh(*id).is_some()).collect()
}

/// Points every "Ground" slot at one shared shadow-only material. Returns the number of slots swapped.
pub fn replace_ground_materials(graph: &mut SceneGraph) -> usize {
    let mut shadow_only = None;
    let mut replaced = 0;
    for id in graph.mesh_ids() {
        let slots: Vec<usize> = match graph.mesh(id) {
            Some(mesh) => mesh
                .materials
                .iter()
                .enumerate()
                .filter(|(_, material)| material_named(graph, **material, GROUND))
                .map(|(slot, _)| slot)
                .collect(),
            None => continue,
        };
        if slots.is_empty() {
            continue;
        }
        let ground = *shadow_only.get_or_insert_with(|| graph.add_material(Material::shadow_only(GROUND_SHADOW_ONLY, 1.0)));
        if let Some(mesh) = graph.mesh_mut(id) {
            for slot in slots {
                mesh.materials[slot] = ground;
                replaced += 1;
            }
            mesh.cast_shadow = false;
            mesh.receive_shadow = true;
        }
    }
    if replaced > 0 {
        log::info!("[scene] Replaced Ground materials: {replaced}");
    }
    replaced
}

/// The subject casts without receiving; ground meshes receive without casting.
pub fn configure_subject_shadows(graph: &mut SceneGraph, subject: Option<NodeId>) -> usize {
    let ground: Vec<NodeId> = graph
        .mesh_ids()
        .into_iter()
        .filter(|id| {
            graph.mesh(*id).map_or(false, |mesh| {
                mesh.materials.iter().any(|material| {
                    material_named(graph, *material, GROUND) || material_named(graph, *material, GROUND_SHADOW_ONLY)
                })
            })
        })
        .collect();
    if let Some(subject) = subject {
        for id in meshes_under(graph, subject) {
            if let Some(mesh) = graph.mesh_mut(id) {
                mesh.cast_shadow = true;
                mesh.receive_shadow = false;
            }
        }
    }
    for id in &ground {
        if let Some(mesh) = graph.mesh_mut(*id) {
            mesh.cast_shadow = false;
            mesh.receive_shadow = true;
        }
    }
    ground.len()
}

/// Returns whether the casting flag changed on any subject mesh.
pub fn set_subject_cast_shadow(graph: &mut SceneGraph, subject: Option<NodeId>, cast: bool) -> bool {
    let Some(subject) = subject else {
        return false;
    };
    let mut changed = false;
    for id in meshes_under(graph, subject) {
        if let Some(mesh) = graph.mesh_mut(id) {
            changed |= mesh.cast_shadow != cast;
            mesh.cast_shadow = cast;
        }
    }
    changed
}

pub fn subject_casts_shadow(graph: &SceneGraph, subject: Option<NodeId>) -> bool {
    subject
        .map(|subject| meshes_under(graph, subject).iter().any(|id| graph.mesh(*id).map_or(false, |mesh| mesh.cast_shadow)))
        .unwrap_or(false)
}

/// Gives every overlay mesh its own unlit, transparent black material and keeps it out of the
/// shadow passes. Returns the materials the fader should drive.
pub fn prepare_shadow_shape(graph: &mut SceneGraph, root: NodeId, opacity: f32) -> Vec<MaterialId> {
    let mut materials = Vec::new();
    for id in meshes_under(graph, root) {
        let material = graph.add_material(Material {
            opacity: opacity.clamp(0.0, 1.0),
            transparent: true,
            depth_write: false,
            double_sided: true,
            ..Material::unlit(SHADOW_SHAPE_UNLIT, Vec3::ZERO)
        });
        if let Some(mesh) = graph.mesh_mut(id) {
            mesh.materials.iter_mut().for_each(|slot| *slot = material);
            mesh.cast_shadow = false;
            mesh.receive_shadow = false;
        }
        materials.push(material);
    }
    materials
}

/// Flips wireframe on every material. Returns how many were touched.
pub fn toggle_wireframe(graph: &mut SceneGraph) -> usize {
    let mut touched = 0;
    for material in graph.materials_mut() {
        material.wireframe = !material.wireframe;
        touched += 1;
    }
    touched
}

/// Remembers the subject's imported materials so an unlit black stand-in can be swapped in and out.
#[derive(Debug, Clone, Default)]
pub struct SubjectMaterials {
    originals: Vec<(NodeId, Vec<MaterialId>)>,
    unlit: Option<MaterialId>,
    using_original: bool,
}

impl SubjectMaterials {
    pub fn cache(graph: &SceneGraph, subject: Option<NodeId>) -> Self {
        let originals = subject
            .map(|subject| {
                meshes_under(graph, subject)
                    .into_iter()
                    .filter_map(|id| graph.mesh(id).map(|mesh| (id, mesh.materials.clone())))
                    .collect()
            })
            .unwrap_or_default();
        Self { originals, unlit: None, using_original: true }
    }

    pub fn using_original(&self) -> bool {
        self.using_original
    }

    pub fn is_empty(&self) -> bool {
        self.originals.is_empty()
    }

    /// Returns true when the originals are active after the toggle.
    pub fn toggle(&mut self, graph: &mut SceneGraph) -> bool {
        if self.using_original {
            self.apply_unlit(graph);
        } else {
            self.restore(graph);
        }
        self.using_original
    }

    pub fn apply_unlit(&mut self, graph: &mut SceneGraph) {
        if self.originals.is_empty() {
            return;
        }
        let unlit = *self.unlit.get_or_insert_with(|| graph.add_material(Material::unlit(SUBJECT_UNLIT, Vec3::ZERO)));
        for (id, _) in &self.originals {
            if let Some(mesh) = graph.mesh_mut(*id) {
                mesh.materials.iter_mut().for_each(|slot| *slot = unlit);
            }
        }
        self.using_original = false;
        log::info!("[scene] Subject switched to unlit material");
    }

    pub fn restore(&mut self, graph: &mut SceneGraph) {
        for (id, materials) in &self.originals {
            if let Some(mesh) = graph.mesh_mut(*id) {
                mesh.materials = materials.clone();
            }
        }
        self.using_original = true;
        log::info!("[scene] Subject original materials restored");
    }
}
