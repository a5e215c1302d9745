// ── Test doubles shared by the unit tests ──

#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use crate::binder::{Cancelled, EditSurface, Notifier, RepeaterBinder, ServiceStatus};
use crate::model::{ApConfiguration, GroupSnapshot, MacAddress, SecurityType};
use crate::supplicant::{BridgeError, SupplicantChannel};

pub(crate) const GROUP_CONF: &str = "\
update_config=1
network={
\tssid=\"DIRECT-rp-Repeater\"
\tbssid=02:11:22:33:44:55
\tpsk=\"supplicant-pass\"
\tmode=3
\tdisabled=2
}
";

pub(crate) fn group() -> GroupSnapshot {
    GroupSnapshot {
        network_name: "DIRECT-rp-Repeater".into(),
        passphrase: Some("system-pass".into()),
        owner_address: Some(MacAddress::parse("06:11:22:33:44:55").unwrap()),
        security_type: SecurityType::Wpa3SaeTransition,
        frequency_mhz: 2437,
        interface_name: "p2p-wlan0-0".into(),
        interface_address: Some(MacAddress::parse("06:11:22:33:44:56").unwrap()),
    }
}

// ── Supplicant channel ──────────────────────────────────────────────

/// In-memory channel; `None` contents means the channel is unavailable.
#[derive(Debug, Default)]
pub(crate) struct MemoryChannel {
    pub(crate) contents: Mutex<Option<String>>,
    pub(crate) writes: Mutex<u32>,
}

impl MemoryChannel {
    pub(crate) fn with(contents: &str) -> Self {
        Self {
            contents: Mutex::new(Some(contents.to_owned())),
            writes: Mutex::new(0),
        }
    }

    pub(crate) fn contents(&self) -> Option<String> {
        self.contents.lock().unwrap().clone()
    }

    pub(crate) fn writes(&self) -> u32 {
        *self.writes.lock().unwrap()
    }
}

impl SupplicantChannel for MemoryChannel {
    async fn read_config(&self) -> Result<String, BridgeError> {
        self.contents().ok_or_else(|| BridgeError::Unavailable {
            reason: "no root".into(),
        })
    }

    async fn write_config(&self, contents: String) -> Result<(), BridgeError> {
        *self.contents.lock().unwrap() = Some(contents);
        *self.writes.lock().unwrap() += 1;
        Ok(())
    }
}

// ── Repeater binder ─────────────────────────────────────────────────

pub(crate) struct FakeBinder {
    status: watch::Sender<ServiceStatus>,
    group: watch::Sender<Option<GroupSnapshot>>,
    /// Loaded into `group` by `fetch_persistent_group`.
    pub(crate) persistent: Mutex<Option<GroupSnapshot>>,
    pub(crate) device_address: Mutex<Result<Option<MacAddress>, Cancelled>>,
    pub(crate) fetches: AtomicU32,
    pub(crate) invalidations: AtomicU32,
    pub(crate) shutdowns: AtomicU32,
    pub(crate) wps: Mutex<Vec<Option<String>>>,
}

impl FakeBinder {
    pub(crate) fn new(status: ServiceStatus, group: Option<GroupSnapshot>) -> Self {
        Self {
            status: watch::Sender::new(status),
            group: watch::Sender::new(group),
            persistent: Mutex::new(None),
            device_address: Mutex::new(Ok(None)),
            fetches: AtomicU32::new(0),
            invalidations: AtomicU32::new(0),
            shutdowns: AtomicU32::new(0),
            wps: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn set_status(&self, status: ServiceStatus) {
        self.status.send_replace(status);
    }

    pub(crate) fn set_group(&self, group: Option<GroupSnapshot>) {
        self.group.send_replace(group);
    }
}

impl RepeaterBinder for FakeBinder {
    fn status(&self) -> watch::Receiver<ServiceStatus> {
        self.status.subscribe()
    }

    fn group(&self) -> watch::Receiver<Option<GroupSnapshot>> {
        self.group.subscribe()
    }

    fn invalidate_group(&self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        self.group.send_replace(None);
    }

    async fn fetch_persistent_group(&self) {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let persistent = self.persistent.lock().unwrap().clone();
        if persistent.is_some() {
            self.group.send_replace(persistent);
        }
    }

    async fn obtain_device_address(&self) -> Result<Option<MacAddress>, Cancelled> {
        *self.device_address.lock().unwrap()
    }

    fn start_wps(&self, pin: Option<String>) {
        self.wps.lock().unwrap().push(pin);
    }

    fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

// ── Notifier / edit surface ─────────────────────────────────────────

#[derive(Debug, Default)]
pub(crate) struct RecordingNotifier {
    pub(crate) messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub(crate) fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_owned());
    }
}

/// Applies a closure to whatever it is shown, or dismisses when `None`.
pub(crate) struct ScriptedSurface {
    edit: Option<Box<dyn Fn(&mut ApConfiguration) + Send + Sync>>,
    pub(crate) shown: Mutex<Vec<(ApConfiguration, bool)>>,
}

impl ScriptedSurface {
    pub(crate) fn editing(f: impl Fn(&mut ApConfiguration) + Send + Sync + 'static) -> Self {
        Self {
            edit: Some(Box::new(f)),
            shown: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn dismissing() -> Self {
        Self {
            edit: None,
            shown: Mutex::new(Vec::new()),
        }
    }
}

impl EditSurface for ScriptedSurface {
    async fn edit(&self, mut config: ApConfiguration, read_only: bool) -> Option<ApConfiguration> {
        self.shown.lock().unwrap().push((config.clone(), read_only));
        let edit = self.edit.as_ref()?;
        edit(&mut config);
        Some(config)
    }
}

// ── Log capture ─────────────────────────────────────────────────────

/// Counts WARN events seen on the current thread's dispatcher.
#[derive(Clone, Default)]
pub(crate) struct WarnCounter {
    warnings: Arc<AtomicUsize>,
}

impl WarnCounter {
    pub(crate) fn count(&self) -> usize {
        self.warnings.load(Ordering::SeqCst)
    }
}

impl<S: Subscriber> Layer<S> for WarnCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            self.warnings.fetch_add(1, Ordering::SeqCst);
        }
    }
}

pub(crate) fn capture_warnings() -> (WarnCounter, tracing::subscriber::DefaultGuard) {
    let counter = WarnCounter::default();
    let subscriber = tracing_subscriber::registry().with(counter.clone());
    let guard = tracing::subscriber::set_default(subscriber);
    (counter, guard)
}
