/// Tests for SwapchainRegistry
///
/// These tests validate ensure/get/insert, the at-most-one-entry-per-sample-count
/// rule, capability gating, and best-effort teardown.

use super::*;
use crate::compositor::mock_compositor::MockCompositor;
use crate::error::CompositorCall;
use crate::graphics_device::mock_graphics_device::MockGraphicsDevice;

fn setup() -> (SwapchainRegistry, MockCompositor, MockGraphicsDevice) {
    (SwapchainRegistry::new(), MockCompositor::new(), MockGraphicsDevice::new())
}

// ============================================================================
// Tests: Registry Creation
// ============================================================================

#[test]
fn test_registry_new_is_empty() {
    let registry = SwapchainRegistry::new();
    assert!(registry.is_empty());
    assert_eq!(registry.len(), 0);
    assert!(registry.sample_counts().is_empty());
}

// ============================================================================
// Tests: ensure / get
// ============================================================================

#[test]
fn test_ensure_then_get_returns_full_stereo_swapchain() {
    let (mut registry, mut compositor, mut device) = setup();

    registry.ensure(&mut compositor, &mut device, 4, 2, 640, 480).unwrap();

    let stereo = registry.get(4).unwrap();
    assert_eq!(stereo.eyes().len(), 2);
    for eye in stereo.eyes() {
        assert!(eye.image_count() >= 1);
        for target in eye.targets() {
            assert!(device.framebuffer_status(target.framebuffer()).is_complete());
        }
    }
}

#[test]
fn test_ensure_twice_is_idempotent() {
    let (mut registry, mut compositor, mut device) = setup();

    registry.ensure(&mut compositor, &mut device, 4, 2, 640, 480).unwrap();
    let allocations = device.allocation_count();
    let creates = compositor.count_calls("create_swapchain");
    let first_handle = registry.get(4).unwrap().eye(0).unwrap().handle();

    registry.ensure(&mut compositor, &mut device, 4, 2, 640, 480).unwrap();

    assert_eq!(device.allocation_count(), allocations);
    assert_eq!(compositor.count_calls("create_swapchain"), creates);
    assert_eq!(registry.get(4).unwrap().eye(0).unwrap().handle(), first_handle);
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_distinct_sample_counts_are_independent() {
    let (mut registry, mut compositor, mut device) = setup();

    registry.ensure(&mut compositor, &mut device, 1, 2, 640, 480).unwrap();
    registry.ensure(&mut compositor, &mut device, 4, 2, 640, 480).unwrap();

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.sample_counts(), vec![1, 4]);
    assert!(registry.contains(1));
    assert!(registry.contains(4));

    let low = registry.get(1).unwrap();
    let high = registry.get(4).unwrap();
    assert_eq!(low.sample_count(), 1);
    assert_eq!(high.sample_count(), 4);
    assert_ne!(low.eye(0).unwrap().handle(), high.eye(0).unwrap().handle());
    assert_eq!(compositor.live_swapchain_count(), 4);
}

#[test]
fn test_ensure_registers_under_requested_sample_count() {
    let (mut registry, mut compositor, mut device) = setup();

    registry.ensure(&mut compositor, &mut device, 2, 2, 64, 64).unwrap();

    assert_eq!(registry.sample_counts(), vec![2]);
    assert_eq!(registry.get(2).unwrap().sample_count(), 2);
    assert_eq!(compositor.live_swapchain_count(), 2);
    assert_eq!(compositor.count_calls("destroy_swapchain"), 0);
}

#[test]
fn test_get_missing_is_protocol_violation() {
    let registry = SwapchainRegistry::new();
    assert!(matches!(registry.get(4), Err(Error::ProtocolViolation(_))));
}

#[test]
fn test_multisample_extension_resolved_once() {
    let (mut registry, mut compositor, mut device) = setup();

    registry.ensure(&mut compositor, &mut device, 1, 2, 64, 64).unwrap();
    registry.ensure(&mut compositor, &mut device, 2, 2, 64, 64).unwrap();
    registry.ensure(&mut compositor, &mut device, 4, 2, 64, 64).unwrap();

    assert_eq!(device.extension_load_count, 1);
}

// ============================================================================
// Tests: ensure failures (all-or-nothing)
// ============================================================================

#[test]
fn test_missing_multisample_extension_aborts_before_any_creation() {
    let (mut registry, mut compositor, mut device) = setup();
    device.multisample_extension_missing = true;

    let result = registry.ensure(&mut compositor, &mut device, 4, 2, 640, 480);

    assert!(matches!(result, Err(Error::DriverCapabilityMissing(_))));
    assert!(registry.is_empty());
    assert!(compositor.calls.is_empty());
    assert_eq!(device.allocation_count(), 0);
}

#[test]
fn test_incomplete_framebuffer_on_eye_one_inserts_nothing() {
    let (mut registry, mut compositor, mut device) = setup();
    device.incomplete_framebuffer_at = Some(compositor.image_count);

    let result = registry.ensure(&mut compositor, &mut device, 4, 2, 640, 480);

    assert!(matches!(result, Err(Error::FramebufferIncomplete { eye: 1, .. })));
    assert!(!registry.contains(4));
    assert!(device.is_clean());
    assert_eq!(compositor.live_swapchain_count(), 0);
}

#[test]
fn test_compositor_rejection_inserts_nothing() {
    let (mut registry, mut compositor, mut device) = setup();
    compositor.fail_create_at = Some(0);

    let result = registry.ensure(&mut compositor, &mut device, 4, 2, 640, 480);

    assert!(matches!(
        result,
        Err(Error::CompositorRejected { call: CompositorCall::CreateSwapchain, .. })
    ));
    assert!(registry.is_empty());

    // A later attempt can still succeed
    compositor.fail_create_at = None;
    registry.ensure(&mut compositor, &mut device, 4, 2, 640, 480).unwrap();
    assert!(registry.contains(4));
}

// ============================================================================
// Tests: insert
// ============================================================================

#[test]
fn test_insert_duplicate_returns_swapchain_to_caller() {
    let (mut registry, mut compositor, mut device) = setup();
    registry.ensure(&mut compositor, &mut device, 2, 2, 64, 64).unwrap();

    let duplicate = StereoSwapchainBuilder::new(2, 2, 64, 64)
        .build(&mut compositor, &mut device)
        .unwrap();
    let rejected = registry.insert(duplicate).unwrap_err();
    assert_eq!(registry.len(), 1);

    rejected.release(&mut compositor, &mut device).unwrap();
    assert_eq!(compositor.live_swapchain_count(), 2);
}

// ============================================================================
// Tests: teardown_all
// ============================================================================

#[test]
fn test_teardown_all_releases_everything() {
    let (mut registry, mut compositor, mut device) = setup();
    registry.ensure(&mut compositor, &mut device, 1, 2, 640, 480).unwrap();
    registry.ensure(&mut compositor, &mut device, 4, 2, 640, 480).unwrap();

    registry.teardown_all(&mut compositor, &mut device).unwrap();

    assert!(registry.is_empty());
    assert!(device.is_clean());
    assert_eq!(compositor.live_swapchain_count(), 0);
    assert_eq!(compositor.destroyed.len(), 4);
}

#[test]
fn test_teardown_releases_render_targets_before_swapchain() {
    let (mut registry, mut compositor, mut device) = setup();
    registry.ensure(&mut compositor, &mut device, 4, 1, 64, 64).unwrap();
    let handle = registry.get(4).unwrap().eye(0).unwrap().handle();

    // A failing destroy leaves the swapchain live, so render targets must already be gone
    compositor.fail_destroy = vec![0];
    let result = registry.teardown_all(&mut compositor, &mut device);

    assert!(result.is_err());
    assert!(device.is_clean());
    assert!(compositor.is_live(handle));
    assert!(registry.is_empty());
}

#[test]
fn test_teardown_twice_is_noop() {
    let (mut registry, mut compositor, mut device) = setup();
    registry.ensure(&mut compositor, &mut device, 4, 2, 640, 480).unwrap();

    registry.teardown_all(&mut compositor, &mut device).unwrap();
    let calls = compositor.calls.len();

    assert!(registry.teardown_all(&mut compositor, &mut device).is_ok());
    assert_eq!(compositor.calls.len(), calls);
    assert_eq!(compositor.order_violations, 0);
}

#[test]
fn test_teardown_continues_past_failures() {
    let (mut registry, mut compositor, mut device) = setup();
    registry.ensure(&mut compositor, &mut device, 4, 2, 640, 480).unwrap();
    device.fail_destroy_framebuffer = true;

    let result = registry.teardown_all(&mut compositor, &mut device);

    assert!(matches!(result, Err(Error::BackendError(_))));
    assert!(device.is_clean());
    assert_eq!(compositor.live_swapchain_count(), 0);
    assert!(registry.is_empty());
}
