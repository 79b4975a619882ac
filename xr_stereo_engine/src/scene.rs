/// Scene input for the eye render driver
///
/// The engine does not build or animate geometry. The application fills a
/// `Scene` with model transforms and colors; every eye draws all objects in
/// order with the same per-object inputs.

use glam::{Mat4, Quat, Vec3};

/// One drawable: model transform and flat color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneObject {
    pub model: Mat4,
    pub color: Vec3,
}

impl SceneObject {
    pub fn new(model: Mat4, color: Vec3) -> Self {
        Self { model, color }
    }

    /// Object placed with translation, rotation and uniform scale
    pub fn from_transform(translation: Vec3, rotation: Quat, scale: f32, color: Vec3) -> Self {
        Self {
            model: Mat4::from_scale_rotation_translation(Vec3::splat(scale), rotation, translation),
            color,
        }
    }
}

impl Default for SceneObject {
    fn default() -> Self {
        Self {
            model: Mat4::IDENTITY,
            color: Vec3::ONE,
        }
    }
}

/// Ordered list of objects drawn for every eye
#[derive(Debug, Clone, Default)]
pub struct Scene {
    objects: Vec<SceneObject>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_object(&mut self, object: SceneObject) -> usize {
        self.objects.push(object);
        self.objects.len() - 1
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn object_mut(&mut self, index: usize) -> Option<&mut SceneObject> {
        self.objects.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn clear(&mut self) {
        self.objects.clear();
    }
}

impl FromIterator<SceneObject> for Scene {
    fn from_iter<I: IntoIterator<Item = SceneObject>>(iter: I) -> Self {
        Self { objects: iter.into_iter().collect() }
    }
}

#[cfg(test)]
#[path = "scene_tests.rs"]
mod tests;
