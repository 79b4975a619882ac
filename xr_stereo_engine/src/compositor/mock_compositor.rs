/// Mock compositor for unit tests (no headset or runtime required)
///
/// Records every call, enforces the ordering contract of `CompositorSession`
/// (out-of-order calls are refused and counted) and lets tests inject a
/// failure into any call.

use std::collections::HashMap;
use std::time::Duration;
use glam::{Quat, Vec3};
use crate::error::{CompositorCall, Error, Result};
use super::compositor_session::CompositorSession;
use super::compositor_types::{
    DisplayTime, EnvironmentBlendMode, Fov, FrameTiming, ImageHandle, LayerDescriptor,
    Pose, SwapchainDesc, SwapchainHandle, View,
};

// ============================================================================
// Recorded data
// ============================================================================

/// One `end_frame` call as received
#[derive(Debug, Clone)]
pub struct SubmittedFrame {
    pub display_time: DisplayTime,
    pub blend_mode: EnvironmentBlendMode,
    pub layers: Vec<LayerDescriptor>,
}

#[derive(Debug)]
struct MockSwapchain {
    desc: SwapchainDesc,
    images: Vec<ImageHandle>,
    next_image: usize,
    acquired: Option<u32>,
}

// ============================================================================
// Mock Compositor
// ============================================================================

#[derive(Debug)]
pub struct MockCompositor {
    /// Every call, in order ("begin_frame", "acquire_image(view=1)", ...)
    pub calls: Vec<String>,

    /// Images per swapchain returned by enumerate_images
    pub image_count: usize,
    pub display_period: Duration,
    pub should_render: bool,
    /// Views returned by locate_views
    pub views: Vec<View>,

    // ===== FAILURE INJECTION =====
    /// Zero-based ordinal of the create_swapchain call to refuse
    pub fail_create_at: Option<usize>,
    pub fail_enumerate: bool,
    pub fail_wait_frame: bool,
    pub fail_begin_frame: bool,
    pub fail_locate: bool,
    /// Return only this many views from locate_views
    pub partial_locate: Option<usize>,
    /// View indices whose swapchain refuses the call
    pub fail_acquire: Vec<usize>,
    pub timeout_wait: Vec<usize>,
    pub fail_wait: Vec<usize>,
    pub fail_release: Vec<usize>,
    pub fail_destroy: Vec<usize>,
    pub fail_end_frame: bool,

    // ===== COUNTERS =====
    pub wait_frame_count: usize,
    pub begin_count: usize,
    pub end_count: usize,
    /// Calls refused because they broke the ordering contract
    pub order_violations: usize,
    pub submitted: Vec<SubmittedFrame>,
    pub destroyed: Vec<SwapchainHandle>,

    swapchains: HashMap<SwapchainHandle, MockSwapchain>,
    next_handle: u64,
    create_calls: usize,
    frame_waited: bool,
    in_frame: bool,
    time: i64,
}

impl MockCompositor {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            image_count: 3,
            display_period: Duration::from_nanos(11_111_111),
            should_render: true,
            views: vec![
                View::new(Pose::new(Vec3::new(-0.032, 1.6, 0.0), Quat::IDENTITY), Fov::default()),
                View::new(Pose::new(Vec3::new(0.032, 1.6, 0.0), Quat::IDENTITY), Fov::default()),
            ],
            fail_create_at: None,
            fail_enumerate: false,
            fail_wait_frame: false,
            fail_begin_frame: false,
            fail_locate: false,
            partial_locate: None,
            fail_acquire: Vec::new(),
            timeout_wait: Vec::new(),
            fail_wait: Vec::new(),
            fail_release: Vec::new(),
            fail_destroy: Vec::new(),
            fail_end_frame: false,
            wait_frame_count: 0,
            begin_count: 0,
            end_count: 0,
            order_violations: 0,
            submitted: Vec::new(),
            destroyed: Vec::new(),
            swapchains: HashMap::new(),
            next_handle: 1,
            create_calls: 0,
            frame_waited: false,
            in_frame: false,
            time: 0,
        }
    }

    pub fn live_swapchain_count(&self) -> usize {
        self.swapchains.len()
    }

    pub fn is_live(&self, swapchain: SwapchainHandle) -> bool {
        self.swapchains.contains_key(&swapchain)
    }

    pub fn desc_of(&self, swapchain: SwapchainHandle) -> Option<SwapchainDesc> {
        self.swapchains.get(&swapchain).map(|s| s.desc)
    }

    pub fn in_frame(&self) -> bool {
        self.in_frame
    }

    /// Number of recorded calls starting with `prefix`
    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls.iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn view_index(&self, swapchain: SwapchainHandle) -> Option<usize> {
        self.swapchains.get(&swapchain).map(|s| s.desc.view_index)
    }

    fn violation(&mut self, call: CompositorCall) -> Error {
        self.order_violations += 1;
        Error::rejected(call, "XR_ERROR_CALL_ORDER_INVALID")
    }
}

impl CompositorSession for MockCompositor {
    fn create_swapchain(&mut self, desc: &SwapchainDesc) -> Result<SwapchainHandle> {
        self.calls.push(format!(
            "create_swapchain(view={}, samples={}, {}x{})",
            desc.view_index, desc.sample_count, desc.width, desc.height
        ));
        let ordinal = self.create_calls;
        self.create_calls += 1;
        if self.fail_create_at == Some(ordinal) {
            return Err(Error::rejected(CompositorCall::CreateSwapchain, "XR_ERROR_LIMIT_REACHED"));
        }

        let handle = SwapchainHandle(self.next_handle);
        self.next_handle += 1;
        let images = (0..self.image_count)
            .map(|i| ImageHandle(handle.0 * 100 + i as u64))
            .collect();
        self.swapchains.insert(handle, MockSwapchain {
            desc: *desc,
            images,
            next_image: 0,
            acquired: None,
        });
        Ok(handle)
    }

    fn enumerate_images(&mut self, swapchain: SwapchainHandle) -> Result<Vec<ImageHandle>> {
        self.calls.push(format!("enumerate_images({})", swapchain.0));
        if self.fail_enumerate {
            return Err(Error::rejected(CompositorCall::EnumerateImages, "XR_ERROR_RUNTIME_FAILURE"));
        }
        match self.swapchains.get(&swapchain) {
            Some(s) => Ok(s.images.clone()),
            None => Err(Error::rejected(CompositorCall::EnumerateImages, "XR_ERROR_HANDLE_INVALID")),
        }
    }

    fn destroy_swapchain(&mut self, swapchain: SwapchainHandle) -> Result<()> {
        self.calls.push(format!("destroy_swapchain({})", swapchain.0));
        let Some(view) = self.view_index(swapchain) else {
            return Err(self.violation(CompositorCall::DestroySwapchain));
        };
        if self.fail_destroy.contains(&view) {
            return Err(Error::rejected(CompositorCall::DestroySwapchain, "XR_ERROR_RUNTIME_FAILURE"));
        }
        self.swapchains.remove(&swapchain);
        self.destroyed.push(swapchain);
        Ok(())
    }

    fn wait_frame(&mut self) -> Result<FrameTiming> {
        self.calls.push("wait_frame".to_string());
        self.wait_frame_count += 1;
        if self.fail_wait_frame {
            return Err(Error::rejected(CompositorCall::WaitFrame, "XR_ERROR_SESSION_NOT_RUNNING"));
        }
        self.frame_waited = true;
        self.time += self.display_period.as_nanos() as i64;
        Ok(FrameTiming {
            predicted_display_time: DisplayTime(self.time),
            predicted_display_period: self.display_period,
            should_render: self.should_render,
        })
    }

    fn begin_frame(&mut self) -> Result<()> {
        self.calls.push("begin_frame".to_string());
        if !self.frame_waited || self.in_frame {
            return Err(self.violation(CompositorCall::BeginFrame));
        }
        self.frame_waited = false;
        if self.fail_begin_frame {
            return Err(Error::rejected(CompositorCall::BeginFrame, "XR_ERROR_SESSION_LOST"));
        }
        self.in_frame = true;
        self.begin_count += 1;
        Ok(())
    }

    fn locate_views(&mut self, _display_time: DisplayTime, view_count: usize) -> Result<Vec<View>> {
        self.calls.push("locate_views".to_string());
        if self.fail_locate {
            return Err(Error::rejected(CompositorCall::LocateViews, "XR_ERROR_TIME_INVALID"));
        }
        let count = self.partial_locate.unwrap_or(view_count).min(view_count);
        Ok(self.views.iter().take(count).copied().collect())
    }

    fn acquire_image(&mut self, swapchain: SwapchainHandle) -> Result<u32> {
        let Some(view) = self.view_index(swapchain) else {
            return Err(Error::rejected(CompositorCall::AcquireImage, "XR_ERROR_HANDLE_INVALID"));
        };
        self.calls.push(format!("acquire_image(view={})", view));
        if !self.in_frame {
            return Err(self.violation(CompositorCall::AcquireImage));
        }
        if self.fail_acquire.contains(&view) {
            return Err(Error::rejected(CompositorCall::AcquireImage, "XR_ERROR_RUNTIME_FAILURE"));
        }
        let already_acquired = self.swapchains.get(&swapchain).is_some_and(|s| s.acquired.is_some());
        if already_acquired {
            return Err(self.violation(CompositorCall::AcquireImage));
        }

        let Some(state) = self.swapchains.get_mut(&swapchain) else {
            return Err(Error::rejected(CompositorCall::AcquireImage, "XR_ERROR_HANDLE_INVALID"));
        };
        let index = (state.next_image % state.images.len()) as u32;
        state.next_image += 1;
        state.acquired = Some(index);
        Ok(index)
    }

    fn wait_image(&mut self, swapchain: SwapchainHandle, _timeout: Duration) -> Result<()> {
        let Some(view) = self.view_index(swapchain) else {
            return Err(Error::rejected(CompositorCall::WaitImage, "XR_ERROR_HANDLE_INVALID"));
        };
        self.calls.push(format!("wait_image(view={})", view));
        let acquired = self.swapchains.get(&swapchain).is_some_and(|s| s.acquired.is_some());
        if !acquired {
            return Err(self.violation(CompositorCall::WaitImage));
        }
        if self.timeout_wait.contains(&view) {
            return Err(Error::ImageTimeout);
        }
        if self.fail_wait.contains(&view) {
            return Err(Error::rejected(CompositorCall::WaitImage, "XR_ERROR_RUNTIME_FAILURE"));
        }
        Ok(())
    }

    fn release_image(&mut self, swapchain: SwapchainHandle) -> Result<()> {
        let Some(view) = self.view_index(swapchain) else {
            return Err(Error::rejected(CompositorCall::ReleaseImage, "XR_ERROR_HANDLE_INVALID"));
        };
        self.calls.push(format!("release_image(view={})", view));
        let acquired = self.swapchains.get(&swapchain).is_some_and(|s| s.acquired.is_some());
        if !acquired {
            return Err(self.violation(CompositorCall::ReleaseImage));
        }
        if let Some(state) = self.swapchains.get_mut(&swapchain) {
            state.acquired = None;
        }
        if self.fail_release.contains(&view) {
            return Err(Error::rejected(CompositorCall::ReleaseImage, "XR_ERROR_RUNTIME_FAILURE"));
        }
        Ok(())
    }

    fn end_frame(
        &mut self,
        display_time: DisplayTime,
        blend_mode: EnvironmentBlendMode,
        layers: &[LayerDescriptor],
    ) -> Result<()> {
        self.calls.push(format!("end_frame(layers={})", layers.len()));
        if !self.in_frame {
            return Err(self.violation(CompositorCall::EndFrame));
        }
        self.in_frame = false;
        self.end_count += 1;
        self.submitted.push(SubmittedFrame {
            display_time,
            blend_mode,
            layers: layers.to_vec(),
        });
        if self.fail_end_frame {
            return Err(Error::rejected(CompositorCall::EndFrame, "XR_ERROR_LAYER_INVALID"));
        }
        Ok(())
    }
}

#[path = "mock_compositor_tests.rs"]
mod tests;
