//! In-process stand-ins for the repeater service.
//!
//! The CLI has no running repeater service to bind to. The `[group]` table
//! of the config file describes one instead, and [`StaticBinder`] serves it
//! through the same `RepeaterBinder` surface the service would.

use std::sync::Mutex;

use tokio::sync::watch;
use tracing::debug;

use repeater_config::GroupProfile;
use repeater_core::{Cancelled, GroupSnapshot, MacAddress, Notifier, RepeaterBinder, ServiceStatus};

/// Something the CLI asked the service to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceRequest {
    InvalidateGroup,
    Wps { pin: Option<String> },
    Shutdown,
}

/// Binder over a group captured in the config file.
///
/// An active profile starts `Active` with the group published. An inactive
/// one starts `Idle` with the group only reachable as the persistent group.
pub struct StaticBinder {
    status: watch::Sender<ServiceStatus>,
    group: watch::Sender<Option<GroupSnapshot>>,
    persistent: GroupSnapshot,
    device_address: Option<MacAddress>,
    requests: Mutex<Vec<ServiceRequest>>,
}

impl StaticBinder {
    pub fn new(profile: &GroupProfile) -> Self {
        let snapshot = profile.snapshot();
        let (status, group) = if profile.active {
            (ServiceStatus::Active, Some(snapshot.clone()))
        } else {
            (ServiceStatus::Idle, None)
        };
        Self {
            status: watch::Sender::new(status),
            group: watch::Sender::new(group),
            persistent: snapshot,
            device_address: profile.device_address,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<ServiceRequest> {
        self.requests
            .lock()
            .map_or_else(|poisoned| poisoned.into_inner().clone(), |r| r.clone())
    }

    fn record(&self, request: ServiceRequest) {
        debug!(?request, "repeater service request");
        match self.requests.lock() {
            Ok(mut requests) => requests.push(request),
            Err(poisoned) => poisoned.into_inner().push(request),
        }
    }
}

impl RepeaterBinder for StaticBinder {
    fn status(&self) -> watch::Receiver<ServiceStatus> {
        self.status.subscribe()
    }

    fn group(&self) -> watch::Receiver<Option<GroupSnapshot>> {
        self.group.subscribe()
    }

    fn invalidate_group(&self) {
        self.record(ServiceRequest::InvalidateGroup);
        self.group.send_replace(None);
    }

    async fn fetch_persistent_group(&self) {
        self.group.send_if_modified(|group| {
            if group.is_some() {
                return false;
            }
            *group = Some(self.persistent.clone());
            true
        });
    }

    async fn obtain_device_address(&self) -> Result<Option<MacAddress>, Cancelled> {
        Ok(self.device_address)
    }

    fn start_wps(&self, pin: Option<String>) {
        self.record(ServiceRequest::Wps { pin });
    }

    fn shutdown(&self) {
        self.record(ServiceRequest::Shutdown);
        self.status.send_replace(ServiceStatus::Idle);
        self.group.send_replace(None);
    }
}

/// Collects notifications so a command can report them once it finishes.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    messages: Mutex<Vec<String>>,
}

impl CollectingNotifier {
    pub fn take(&self) -> Vec<String> {
        match self.messages.lock() {
            Ok(mut messages) => std::mem::take(&mut *messages),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, message: &str) {
        match self.messages.lock() {
            Ok(mut messages) => messages.push(message.to_owned()),
            Err(poisoned) => poisoned.into_inner().push(message.to_owned()),
        }
    }
}
