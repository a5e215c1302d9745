// ── Repeater manager ──
//
// Owns the connection to the repeater service, the derived view state and
// the configure cycle (resolve → edit → reconcile) for one repeater entry.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::binder::{EditSurface, Notifier, RepeaterBinder, ServiceStatus};
use crate::capability::{Capability, PlatformCapabilities};
use crate::error::CoreError;
use crate::features::{P2pFeatureProbe, describe_features};
use crate::model::{GroupSnapshot, MacAddress, frequency_to_channel};
use crate::reconciler::ConfigurationReconciler;
use crate::resolver::{ConfigurationResolver, Resolution};
use crate::settings::SettingsStore;
use crate::supplicant::SupplicantChannel;

/// Shown when neither safe-mode settings nor a live group are available.
pub const CONFIGURE_FAILURE: &str = "Failed to obtain repeater configuration";

// ── View state ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RepeaterTitle {
    #[default]
    Repeater,
    Channel {
        frequency_mhz: u32,
        channel: Option<u16>,
    },
}

impl fmt::Display for RepeaterTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Repeater => f.write_str("Repeater"),
            Self::Channel {
                frequency_mhz,
                channel: Some(channel),
            } => write!(f, "Repeater ({frequency_mhz} MHz, channel {channel})"),
            Self::Channel {
                frequency_mhz,
                channel: None,
            } => write!(f, "Repeater ({frequency_mhz} MHz)"),
        }
    }
}

/// Everything a repeater entry displays. `status` is `None` while no
/// service is connected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepeaterView {
    pub status: Option<ServiceStatus>,
    pub switch_enabled: bool,
    pub service_started: bool,
    pub title: RepeaterTitle,
    /// Comma-separated supported optional features, empty if none.
    pub features: String,
    pub interface: Option<String>,
    pub interface_address: Option<MacAddress>,
}

/// State of the surface that owns the configure cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LifecycleState {
    #[default]
    Created,
    Started,
    Destroyed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The service is idle; the embedder must start it.
    StartRequested,
    ShutdownRequested,
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigureOutcome {
    Applied { read_only: bool },
    Dismissed,
    /// Another cycle is already in flight.
    Busy,
    Cancelled,
    Unavailable,
}

// ── RepeaterManager ──────────────────────────────────────────────

/// Session and configure-cycle owner for the repeater entry.
///
/// Cheaply cloneable. The service binder is handed over in
/// [`on_service_connected`](Self::on_service_connected) and released in
/// [`on_service_disconnected`](Self::on_service_disconnected); between the
/// two a background task keeps [`RepeaterView`] in sync with the binder's
/// status and group.
pub struct RepeaterManager<B, C> {
    inner: Arc<ManagerInner<B, C>>,
}

impl<B, C> Clone for RepeaterManager<B, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ManagerInner<B, C> {
    settings: Arc<dyn SettingsStore>,
    notifier: Arc<dyn Notifier>,
    caps: Arc<PlatformCapabilities>,
    channel: Arc<C>,
    view: Arc<ViewPublisher>,
    session: Mutex<Option<Session<B>>>,
    configuring: AtomicBool,
    cancel: CancellationToken,
}

impl<B, C> Drop for ManagerInner<B, C> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Session<B> {
    binder: Arc<B>,
    /// Child of the manager token, cancelled on disconnect.
    cancel: CancellationToken,
    watcher: JoinHandle<()>,
}

impl<B: RepeaterBinder, C: SupplicantChannel> RepeaterManager<B, C> {
    /// Build a manager with no service connected. Feature detection runs
    /// once here.
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        notifier: Arc<dyn Notifier>,
        caps: Arc<PlatformCapabilities>,
        channel: Arc<C>,
        probe: Option<&dyn P2pFeatureProbe>,
    ) -> Self {
        let features = describe_features(probe, &caps);
        let view = Arc::new(ViewPublisher::new(Arc::clone(&caps), features));
        Self {
            inner: Arc::new(ManagerInner {
                settings,
                notifier,
                caps,
                channel,
                view,
                session: Mutex::new(None),
                configuring: AtomicBool::new(false),
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Subscribe to view updates.
    pub fn subscribe(&self) -> watch::Receiver<RepeaterView> {
        self.inner.view.tx.subscribe()
    }

    pub fn view(&self) -> RepeaterView {
        self.inner.view.tx.borrow().clone()
    }

    pub fn is_configuring(&self) -> bool {
        self.inner.configuring.load(Ordering::Acquire)
    }

    async fn binder(&self) -> Option<Arc<B>> {
        self.inner
            .session
            .lock()
            .await
            .as_ref()
            .map(|s| Arc::clone(&s.binder))
    }

    // ── Session lifecycle ────────────────────────────────────────

    /// Take ownership of a connected service binder and start following
    /// its status and group.
    pub async fn on_service_connected(&self, binder: Arc<B>) {
        let mut session = self.inner.session.lock().await;
        if let Some(previous) = session.take() {
            previous.cancel.cancel();
            let _ = previous.watcher.await;
        }

        // Subscribe before the first render so no change slips in between.
        let status = binder.status();
        let group = binder.group();
        self.inner.view.refresh(Some(binder.as_ref()));
        let cancel = self.inner.cancel.child_token();
        let watcher = tokio::spawn(watch_session(
            Arc::clone(&self.inner.view),
            Arc::clone(&binder),
            (status, group),
            cancel.clone(),
        ));
        *session = Some(Session {
            binder,
            cancel,
            watcher,
        });
        info!("repeater service connected");
    }

    /// Release the binder. No-op when nothing is connected.
    pub async fn on_service_disconnected(&self) {
        let Some(session) = self.inner.session.lock().await.take() else {
            return;
        };
        session.cancel.cancel();
        if let Err(e) = session.watcher.await {
            warn!(error = %e, "repeater session watcher failed");
        }
        self.inner.view.refresh::<B>(None);
        info!("repeater service disconnected");
    }

    // ── Actions ──────────────────────────────────────────────────

    pub async fn toggle(&self) -> ToggleOutcome {
        let Some(binder) = self.binder().await else {
            return ToggleOutcome::Ignored;
        };
        let status = *binder.status().borrow();
        match status {
            ServiceStatus::Idle => ToggleOutcome::StartRequested,
            ServiceStatus::Active => {
                binder.shutdown();
                ToggleOutcome::ShutdownRequested
            }
            ServiceStatus::Starting | ServiceStatus::Destroyed => ToggleOutcome::Ignored,
        }
    }

    /// Start WPS with a PIN, or push-button mode when `pin` is `None`.
    /// Returns whether the request reached an active service.
    pub async fn wps(&self, pin: Option<String>) -> bool {
        match self.binder().await {
            Some(binder) if binder.is_active() => {
                binder.start_wps(pin);
                true
            }
            _ => false,
        }
    }

    // ── Configure cycle ──────────────────────────────────────────

    /// Run one configure cycle.
    ///
    /// The edit surface is only shown once `lifecycle` reaches
    /// [`LifecycleState::Started`]. Cancelling `cancel` before the surface
    /// returns commits nothing. Only a caller-contract violation in the
    /// edited configuration is returned as an error.
    pub async fn configure<E: EditSurface>(
        &self,
        surface: &E,
        mut lifecycle: watch::Receiver<LifecycleState>,
        cancel: &CancellationToken,
    ) -> Result<ConfigureOutcome, CoreError> {
        let Some(in_flight) = InFlight::acquire(&self.inner.configuring) else {
            debug!("configure cycle already in flight");
            return Ok(ConfigureOutcome::Busy);
        };

        let binder = self.binder().await;
        let inner = &self.inner;
        let resolver = ConfigurationResolver::new(
            inner.settings.as_ref(),
            &inner.caps,
            binder.as_deref(),
            &inner.channel,
        );
        let resolved = tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(ConfigureOutcome::Cancelled),
            resolved = resolver.resolve() => resolved,
        };
        let Resolution {
            config,
            read_only,
            bridge,
        } = match resolved {
            Ok(resolution) => resolution,
            Err(e) if e.is_cancelled() => return Ok(ConfigureOutcome::Cancelled),
            Err(e) => {
                debug!(error = %e, "repeater configuration unavailable");
                inner.notifier.notify(CONFIGURE_FAILURE);
                return Ok(ConfigureOutcome::Unavailable);
            }
        };

        let started = tokio::select! {
            biased;
            () = cancel.cancelled() => false,
            state = lifecycle.wait_for(|s| *s != LifecycleState::Created) => {
                matches!(state.as_deref(), Ok(LifecycleState::Started))
            }
        };
        if !started {
            debug!("owner went away before the edit surface could be shown");
            return Ok(ConfigureOutcome::Cancelled);
        }

        drop(in_flight);
        let edited = tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(ConfigureOutcome::Cancelled),
            edited = surface.edit(config, read_only) => edited,
        };
        let Some(edited) = edited else {
            return Ok(ConfigureOutcome::Dismissed);
        };
        if cancel.is_cancelled() {
            return Ok(ConfigureOutcome::Cancelled);
        }

        ConfigurationReconciler::new(
            inner.settings.as_ref(),
            inner.notifier.as_ref(),
            binder.as_deref(),
        )
        .reconcile(edited, bridge)
        .await?;
        Ok(ConfigureOutcome::Applied { read_only })
    }
}

/// Resets the in-flight flag on every exit path.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ── View publishing ──────────────────────────────────────────────

struct ViewPublisher {
    tx: watch::Sender<RepeaterView>,
    caps: Arc<PlatformCapabilities>,
    features: String,
}

impl ViewPublisher {
    fn new(caps: Arc<PlatformCapabilities>, features: String) -> Self {
        let view = RepeaterView {
            features: features.clone(),
            ..RepeaterView::default()
        };
        Self {
            tx: watch::Sender::new(view),
            caps,
            features,
        }
    }

    fn refresh<B: RepeaterBinder>(&self, binder: Option<&B>) {
        let next = self.render(binder);
        self.tx.send_if_modified(|view| {
            if *view == next {
                return false;
            }
            *view = next;
            true
        });
    }

    fn render<B: RepeaterBinder>(&self, binder: Option<&B>) -> RepeaterView {
        let status = binder.map(|b| *b.status().borrow());
        let group = binder.and_then(B::current_group);
        let title = group
            .as_ref()
            .filter(|g| self.caps.has(Capability::GroupFrequency) && g.frequency_mhz != 0)
            .map_or(RepeaterTitle::Repeater, |g| RepeaterTitle::Channel {
                frequency_mhz: g.frequency_mhz,
                channel: frequency_to_channel(g.frequency_mhz),
            });
        let interface_address = group
            .as_ref()
            .filter(|_| self.caps.has(Capability::InterfaceAddress))
            .and_then(|g| g.interface_address);
        RepeaterView {
            status,
            switch_enabled: matches!(status, Some(ServiceStatus::Idle | ServiceStatus::Active)),
            service_started: matches!(
                status,
                Some(ServiceStatus::Starting | ServiceStatus::Active)
            ),
            title,
            features: self.features.clone(),
            interface: group.map(|g| g.interface_name),
            interface_address,
        }
    }
}

/// Forward status and group changes into the view until cancelled.
async fn watch_session<B: RepeaterBinder>(
    view: Arc<ViewPublisher>,
    binder: Arc<B>,
    (mut status, mut group): (
        watch::Receiver<ServiceStatus>,
        watch::Receiver<Option<GroupSnapshot>>,
    ),
    cancel: CancellationToken,
) {
    loop {
        let changed = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            changed = status.changed() => changed,
            changed = group.changed() => changed,
        };
        if changed.is_err() {
            debug!("repeater service dropped its state channels");
            break;
        }
        view.refresh(Some(binder.as_ref()));
    }
}
