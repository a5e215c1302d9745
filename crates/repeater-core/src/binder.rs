// ── Live system collaborators ──
//
// The repeater service, the notification surface and the edit surface
// are owned by the embedding application. Core only sees these traits.

use std::future::Future;

use serde::Serialize;
use strum::Display;
use tokio::sync::watch;

use crate::model::{ApConfiguration, GroupSnapshot, MacAddress};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ServiceStatus {
    #[default]
    Idle,
    Starting,
    Active,
    Destroyed,
}

/// The user aborted an interactive step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

/// Handle to the running repeater service.
///
/// Status and group changes are published through `watch` channels; the
/// session subscribes on connect and drops the receivers on disconnect.
pub trait RepeaterBinder: Send + Sync + 'static {
    fn status(&self) -> watch::Receiver<ServiceStatus>;

    fn group(&self) -> watch::Receiver<Option<GroupSnapshot>>;

    /// Forget the cached group so the next read fetches fresh state.
    fn invalidate_group(&self);

    /// Best-effort refresh of the persistent group; read back via [`group`](Self::group).
    fn fetch_persistent_group(&self) -> impl Future<Output = ()> + Send;

    /// The device's own P2P address. May prompt the user.
    fn obtain_device_address(
        &self,
    ) -> impl Future<Output = Result<Option<MacAddress>, Cancelled>> + Send;

    fn start_wps(&self, pin: Option<String>);

    fn shutdown(&self);

    fn current_group(&self) -> Option<GroupSnapshot> {
        self.group().borrow().clone()
    }

    fn is_active(&self) -> bool {
        *self.status().borrow() == ServiceStatus::Active
    }
}

/// Transient user-visible messages. Must not block.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// The dialog that edits a resolved configuration.
pub trait EditSurface: Send + Sync {
    /// `None` when the user dismissed the surface.
    fn edit(
        &self,
        config: ApConfiguration,
        read_only: bool,
    ) -> impl Future<Output = Option<ApConfiguration>> + Send;
}
