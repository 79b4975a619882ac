/// Eye matrices - projection from an asymmetric FOV, view from a pose
///
/// All matrices are column-major `glam::Mat4`.

use glam::{Mat4, Vec3};
use crate::compositor::{Fov, Pose, View};
use crate::config::GraphicsApi;
use crate::graphics_device::ViewUniforms;

/// Asymmetric perspective projection for one eye
///
/// OpenGL ES: clip depth in [-1, 1], Y up. Vulkan: clip depth in [0, 1], Y down.
/// `far_z <= near_z` is not supported.
pub fn projection_from_fov(fov: &Fov, near_z: f32, far_z: f32, api: GraphicsApi) -> Mat4 {
    let tan_left = fov.angle_left.tan();
    let tan_right = fov.angle_right.tan();
    let tan_down = fov.angle_down.tan();
    let tan_up = fov.angle_up.tan();

    let tan_width = tan_right - tan_left;
    let (tan_height, offset_z) = match api {
        GraphicsApi::Vulkan => (tan_down - tan_up, 0.0),
        GraphicsApi::OpenGlEs => (tan_up - tan_down, near_z),
    };

    let mut m = [0.0f32; 16];
    m[0] = 2.0 / tan_width;
    m[5] = 2.0 / tan_height;
    m[8] = (tan_right + tan_left) / tan_width;
    m[9] = (tan_up + tan_down) / tan_height;
    m[10] = -(far_z + offset_z) / (far_z - near_z);
    m[11] = -1.0;
    m[14] = -(far_z * (near_z + offset_z)) / (far_z - near_z);

    Mat4::from_cols_array(&m)
}

/// View matrix: inverse of the eye transform (translation then rotation)
pub fn view_from_pose(pose: &Pose) -> Mat4 {
    (Mat4::from_translation(pose.position) * Mat4::from_quat(pose.orientation)).inverse()
}

/// Eye position shader input: negated translation column of the view matrix
pub fn eye_position(view: &Mat4) -> Vec3 {
    -view.w_axis.truncate()
}

/// Shader inputs for one located eye
pub fn eye_view_uniforms(view: &View, near_z: f32, far_z: f32, api: GraphicsApi) -> ViewUniforms {
    let view_matrix = view_from_pose(&view.pose);
    ViewUniforms {
        projection: projection_from_fov(&view.fov, near_z, far_z, api),
        view: view_matrix,
        eye_position: eye_position(&view_matrix),
    }
}

#[cfg(test)]
#[path = "eye_matrices_tests.rs"]
mod tests;
