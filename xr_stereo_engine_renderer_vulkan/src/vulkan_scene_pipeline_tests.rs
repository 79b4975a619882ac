//! Unit tests for scene push constants
//!
//! These tests don't require a GPU.

use super::*;

#[test]
fn test_push_constants_fit_guaranteed_limit() {
    assert_eq!(std::mem::size_of::<ScenePushConstants>(), 96);
    assert!(ScenePushConstants::range().size <= 128);
}

#[test]
fn test_push_constant_range_stages() {
    let range = ScenePushConstants::range();
    assert_eq!(range.offset, 0);
    assert!(range.stage_flags.contains(vk::ShaderStageFlags::VERTEX));
    assert!(range.stage_flags.contains(vk::ShaderStageFlags::FRAGMENT));
}

#[test]
fn test_mvp_is_view_projection_times_model() {
    let view_projection = Mat4::perspective_rh(1.0, 1.0, 0.05, 100.0);
    let model = Mat4::from_translation(Vec3::new(0.0, 0.0, -2.0));

    let constants = ScenePushConstants::new(view_projection, model, Vec3::ONE, Vec3::ZERO);

    assert_eq!(Mat4::from_cols_array_2d(&constants.mvp), view_projection * model);
}

#[test]
fn test_color_and_eye_position_padding() {
    let constants = ScenePushConstants::new(
        Mat4::IDENTITY,
        Mat4::IDENTITY,
        Vec3::new(0.2, 0.4, 0.6),
        Vec3::new(0.032, 1.6, 0.0),
    );

    assert_eq!(constants.color, [0.2, 0.4, 0.6, 1.0]);
    assert_eq!(constants.eye_position, [0.032, 1.6, 0.0, 0.0]);
}

#[test]
fn test_push_constants_as_bytes() {
    let constants = ScenePushConstants::new(Mat4::IDENTITY, Mat4::IDENTITY, Vec3::ONE, Vec3::ZERO);
    let bytes = bytemuck::bytes_of(&constants);

    assert_eq!(bytes.len(), 96);
    // mvp[0][0] == 1.0
    assert_eq!(&bytes[0..4], &1.0f32.to_ne_bytes());
}
