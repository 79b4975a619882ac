use super::*;

// ============================================================================
// Defaults
// ============================================================================

#[test]
fn test_session_config_defaults() {
    let config = SessionConfig::default();
    assert_eq!(config.requested_sample_count, 4);
    assert_eq!(config.resolution_divisor, 4);
    assert_eq!(config.near_z, 0.05);
    assert_eq!(config.far_z, 100.0);
    assert_eq!(config.image_wait_timeout, Duration::from_nanos(1000));
    assert_eq!(config.clear_color, [0.1, 0.1, 0.1, 0.0]);
    assert_eq!(config.blend_mode, EnvironmentBlendMode::AlphaBlend);
    assert!(config.layer_flags.contains(LayerFlags::CORRECT_CHROMATIC_ABERRATION));
    assert!(config.layer_flags.contains(LayerFlags::BLEND_TEXTURE_SOURCE_ALPHA));
    assert_eq!(config.graphics_api, GraphicsApi::OpenGlEs);
}

// ============================================================================
// ViewConfiguration
// ============================================================================

#[test]
fn test_render_extent_divides_recommended_rect() {
    let views = ViewConfiguration::stereo(2560, 1920);
    assert_eq!(views.view_count, 2);
    assert_eq!(views.render_extent(4), (640, 480));
    assert_eq!(views.render_extent(1), (2560, 1920));
}

#[test]
fn test_render_extent_never_below_one_pixel() {
    let views = ViewConfiguration::stereo(3, 2);
    assert_eq!(views.render_extent(4), (1, 1));
    assert_eq!(views.render_extent(0), (3, 2));
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_validate_accepts_defaults() {
    let config = SessionConfig::default();
    assert!(config.validate(&ViewConfiguration::stereo(2560, 1920)).is_ok());
}

#[test]
fn test_validate_rejects_zero_samples() {
    let config = SessionConfig { requested_sample_count: 0, ..Default::default() };
    let result = config.validate(&ViewConfiguration::stereo(2560, 1920));
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
fn test_validate_rejects_zero_divisor() {
    let config = SessionConfig { resolution_divisor: 0, ..Default::default() };
    let result = config.validate(&ViewConfiguration::stereo(2560, 1920));
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
fn test_validate_rejects_bad_clip_planes() {
    let config = SessionConfig { near_z: 10.0, far_z: 1.0, ..Default::default() };
    let result = config.validate(&ViewConfiguration::stereo(2560, 1920));
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
fn test_validate_rejects_zero_views() {
    let config = SessionConfig::default();
    let views = ViewConfiguration { recommended_width: 100, recommended_height: 100, view_count: 0 };
    assert!(matches!(config.validate(&views), Err(Error::InvalidResource(_))));
}

#[test]
fn test_validate_rejects_empty_rect() {
    let config = SessionConfig::default();
    let views = ViewConfiguration::stereo(0, 100);
    assert!(matches!(config.validate(&views), Err(Error::InvalidResource(_))));
}
