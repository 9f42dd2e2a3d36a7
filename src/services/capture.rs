//! Scoped lease for the live-capture device.
//!
//! The capture hardware admits one user at a time. Activation hands out a
//! `CaptureSession` guard; the slot is released when the guard drops, on
//! every exit path including teardown, never by a separate call that can
//! be forgotten.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use uuid::Uuid;

/// Handle to the single capture device.
#[derive(Clone)]
pub struct CaptureDevice {
    slot: Arc<Semaphore>,
}

/// An exclusive, scoped activation of the capture device.
#[derive(Debug)]
pub struct CaptureSession {
    id: Uuid,
    opened_at: DateTime<Utc>,
    _permit: OwnedSemaphorePermit,
}

impl CaptureDevice {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Semaphore::new(1)),
        }
    }

    /// Activate the device. Fails immediately when another session holds
    /// it; there is no queueing.
    pub fn try_activate(&self) -> Option<CaptureSession> {
        let permit = self.slot.clone().try_acquire_owned().ok()?;
        let session = CaptureSession {
            id: Uuid::new_v4(),
            opened_at: Utc::now(),
            _permit: permit,
        };

        tracing::info!(session_id = %session.id, "Capture device activated");

        Some(session)
    }

    pub fn is_available(&self) -> bool {
        self.slot.available_permits() > 0
    }
}

impl CaptureSession {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        tracing::info!(session_id = %self.id, "Capture device released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_is_exclusive_while_held() {
        let device = CaptureDevice::new();

        let session = device.try_activate().expect("first activation succeeds");
        assert!(!device.is_available());
        assert!(device.try_activate().is_none());

        drop(session);
    }

    #[test]
    fn dropping_the_session_releases_the_device() {
        let device = CaptureDevice::new();

        let session = device.try_activate().unwrap();
        let first_id = session.id();
        drop(session);

        assert!(device.is_available());
        let session = device.try_activate().expect("device free after drop");
        assert_ne!(session.id(), first_id);
    }

    #[test]
    fn clones_share_the_same_device() {
        let device = CaptureDevice::new();
        let other = device.clone();

        let _session = device.try_activate().unwrap();
        assert!(other.try_activate().is_none());
    }
}
