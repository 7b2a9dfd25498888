//! Camera gateway: acquires, tracks and releases the single active stream.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, info, instrument, warn};

use super::{CameraPlatform, MediaConstraints, MediaStream};
use crate::error::{CameraError, CameraErrorKind, CameraResult};

/// Identifies one successful acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamId(pub u64);

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stream-{}", self.0)
    }
}

/// The live capture. Dropping it stops every track.
struct ActiveStream {
    id: StreamId,
    stream: Box<dyn MediaStream>,
}

impl Drop for ActiveStream {
    fn drop(&mut self) {
        self.stream.stop_tracks();
        debug!(stream_id = self.id.0, "Camera tracks stopped");
    }
}

/// Wraps the platform camera API.
///
/// At most one stream is live at a time. A newer acquisition releases the
/// previous stream; a failed acquisition leaves it alone.
pub struct CameraGateway {
    platform: Rc<dyn CameraPlatform>,
    constraints: MediaConstraints,
    active: RefCell<Option<ActiveStream>>,
    next_id: Cell<u64>,
}

impl CameraGateway {
    pub fn new(platform: Rc<dyn CameraPlatform>, constraints: MediaConstraints) -> Self {
        Self {
            platform,
            constraints,
            active: RefCell::new(None),
            next_id: Cell::new(1),
        }
    }

    /// Request camera access and make the new stream the active one.
    #[instrument(level = "debug", skip(self), fields(facing = self.constraints.facing_mode.as_str()))]
    pub async fn request_access(&self) -> CameraResult<StreamId> {
        if !self.platform.is_available() {
            warn!("Camera API not available");
            return Err(CameraError::of_kind(CameraErrorKind::NotSupported));
        }

        let stream = self
            .platform
            .request(&self.constraints)
            .await
            .map_err(|e| {
                let err = CameraError::from(e);
                warn!(kind = %err.kind, message = %err.message, "Camera request failed");
                err
            })?;

        let id = StreamId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        let previous = self.active.borrow_mut().replace(ActiveStream { id, stream });
        if let Some(previous) = previous {
            info!(
                superseded = previous.id.0,
                stream_id = id.0,
                "Releasing superseded camera stream"
            );
        }

        info!(stream_id = id.0, "Camera stream acquired");
        Ok(id)
    }

    /// Release the active stream, if any. Returns whether one was released.
    pub fn stop(&self) -> bool {
        let taken = self.active.borrow_mut().take();
        match taken {
            Some(stream) => {
                info!(stream_id = stream.id.0, "Camera stream stopped");
                true
            }
            None => false,
        }
    }

    /// Release the active stream only if it is still `id`.
    pub fn stop_if(&self, id: StreamId) -> bool {
        if self.active_id() == Some(id) {
            self.stop()
        } else {
            debug!(stream_id = id.0, "Stream already released or superseded");
            false
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.borrow().is_some()
    }

    pub fn active_id(&self) -> Option<StreamId> {
        self.active.borrow().as_ref().map(|s| s.id)
    }
}

impl fmt::Debug for CameraGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraGateway")
            .field("constraints", &self.constraints)
            .field("active", &self.active_id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{MockCamera, MockCameraOutcome};
    use crate::error::PlatformError;

    fn gateway(camera: &Rc<MockCamera>) -> CameraGateway {
        CameraGateway::new(camera.clone(), MediaConstraints::default())
    }

    #[test]
    fn test_stop_without_stream_is_noop() {
        let camera = Rc::new(MockCamera::new());
        let gw = gateway(&camera);

        assert!(!gw.stop());
        assert!(!gw.stop());
        assert!(!gw.is_active());
        assert_eq!(camera.request_count(), 0);
    }

    #[tokio::test]
    async fn test_request_then_stop() {
        let camera = Rc::new(MockCamera::new());
        let gw = gateway(&camera);

        let id = gw.request_access().await.unwrap();
        assert!(gw.is_active());
        assert_eq!(gw.active_id(), Some(id));
        assert_eq!(camera.live_streams(), 1);

        assert!(gw.stop());
        assert!(!gw.is_active());
        assert_eq!(camera.live_streams(), 0);
    }

    #[tokio::test]
    async fn test_new_stream_supersedes_previous() {
        let camera = Rc::new(MockCamera::new());
        let gw = gateway(&camera);

        let first = gw.request_access().await.unwrap();
        let second = gw.request_access().await.unwrap();

        assert_ne!(first, second);
        assert_eq!(gw.active_id(), Some(second));
        assert_eq!(camera.live_streams(), 1, "superseded stream must be released");
    }

    #[tokio::test]
    async fn test_failed_request_keeps_previous_stream() {
        let camera = Rc::new(MockCamera::new());
        let gw = gateway(&camera);

        let id = gw.request_access().await.unwrap();
        camera.push_outcome(MockCameraOutcome::Fail(PlatformError::new(
            "NotReadableError",
            "Could not start video source",
        )));

        let err = gw.request_access().await.unwrap_err();
        assert_eq!(err.kind, CameraErrorKind::InUse);
        assert_eq!(gw.active_id(), Some(id));
        assert_eq!(camera.live_streams(), 1);
    }

    #[tokio::test]
    async fn test_missing_api_is_not_supported() {
        let camera = Rc::new(MockCamera::unavailable());
        let gw = gateway(&camera);

        let err = gw.request_access().await.unwrap_err();
        assert_eq!(err.kind, CameraErrorKind::NotSupported);
        assert_eq!(camera.request_count(), 0);
    }

    #[tokio::test]
    async fn test_stop_if_ignores_stale_id() {
        let camera = Rc::new(MockCamera::new());
        let gw = gateway(&camera);

        let first = gw.request_access().await.unwrap();
        let second = gw.request_access().await.unwrap();

        assert!(!gw.stop_if(first));
        assert!(gw.is_active());
        assert!(gw.stop_if(second));
        assert!(!gw.is_active());
    }

    #[tokio::test]
    async fn test_requested_constraints_are_forwarded() {
        let camera = Rc::new(MockCamera::new());
        let gw = gateway(&camera);

        gw.request_access().await.unwrap();
        assert_eq!(camera.last_constraints(), Some(MediaConstraints::default()));
    }
}
