//! Command coordinator
//!
//! Turns host commands into SDK calls, channel registrations and scanner
//! references. Readiness checks that only read SDK state run on the calling
//! thread and fail synchronously; everything that touches the registry, the
//! scanner or a UI-affine SDK call is marshalled onto the UI worker. Token
//! application runs on its own background thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use beeper_api::{
    DeviceStatusListener, LocationListener, LockerSdk, Lockers, LogListener, Payload, Platform,
    RadioStateListener, ResultSink, SdkError, SearchFilter, Token, TokenResult,
};
use beeper_event_manager::{
    block_on_worker, Channel, ChannelRegistry, CommandContext, Consumer, Dispatcher,
    EventManagerError, ListenerHandle, ScannerLifecycle,
};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::commands::{self, Command};
use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::payload::{self, DeviceStatus};
use crate::translator::EventTranslator;

const INIT_SUCCESS: &str = "SDK initialized successfully";

/// Bridge between a host's command channel and the locker SDK
///
/// # Example
///
/// ```rust,ignore
/// use beeper_bridge::BeeperBridge;
/// use beeper_event_manager::queue_sink;
///
/// let bridge = BeeperBridge::new(sdk, platform)?;
///
/// let (sink, results) = queue_sink();
/// bridge.execute("initSDK", &[r#"["Demo","app-token","service"]"#.into()], sink);
///
/// for result in results.drain(std::time::Duration::from_secs(1)) {
///     println!("{:?}", result);
/// }
/// ```
pub struct BeeperBridge {
    core: Arc<Core>,
}

struct Core {
    sdk: Arc<dyn LockerSdk>,
    platform: Arc<dyn Platform>,
    config: BridgeConfig,

    dispatcher: Dispatcher,
    registry: Arc<ChannelRegistry>,
    lifecycle: ScannerLifecycle,

    translator: Arc<EventTranslator>,
    device_listener: Arc<dyn DeviceStatusListener>,
    location_listener: Arc<dyn LocationListener>,
    radio_listener: Arc<dyn RadioStateListener>,
    log_listener: Arc<dyn LogListener>,

    /// Lockers capability captured by `enableBeeper`
    lockers: Mutex<Option<Arc<dyn Lockers>>>,

    closed: AtomicBool,
}

impl BeeperBridge {
    /// Create a bridge with default configuration
    pub fn new(sdk: Arc<dyn LockerSdk>, platform: Arc<dyn Platform>) -> Result<Self> {
        Self::builder(sdk, platform).build()
    }

    pub fn builder(sdk: Arc<dyn LockerSdk>, platform: Arc<dyn Platform>) -> BeeperBridgeBuilder {
        BeeperBridgeBuilder {
            sdk,
            platform,
            config: BridgeConfig::default(),
        }
    }

    /// Entry point for the host transport
    ///
    /// Returns `false` for unknown actions, in which case nothing is ever
    /// delivered to `sink`.
    pub fn execute(&self, action: &str, args: &[String], sink: Arc<dyn ResultSink>) -> bool {
        debug!("execute action -> {}", action);

        match Command::parse(action, args) {
            Some(command) => {
                self.handle(command, CommandContext::new(action, sink));
                true
            }
            None => {
                warn!("Unknown action '{}'", action);
                false
            }
        }
    }

    /// Run an already parsed command
    pub fn handle(&self, command: Command, ctx: CommandContext) {
        if self.core.closed.load(Ordering::SeqCst) {
            ctx.error(BridgeError::Runtime(EventManagerError::DispatcherDisconnected).to_string());
            return;
        }

        match command {
            Command::InitSdk(raw) => self.init_sdk(&raw, ctx),
            Command::InitWithOfflineConfig(raw) => self.init_with_offline_config(&raw, ctx),
            Command::SearchDevices(raw) => self.search_devices(&raw, ctx),
            Command::StopSearching(msg) => self.stop_searching(msg, ctx),
            Command::ApplyToken(raw) => self.apply_token(&raw, ctx),
            Command::IsPermissionGranted => self.is_permission_granted(ctx),
            Command::RequestPermissions => self.request_permissions(ctx),
            Command::EnableBeeper => self.enable_beeper(ctx),
            Command::SubscribeToLocations => self.subscribe_to_locations(ctx),
            Command::UnsubscribeFromLocations => self.unsubscribe_from_locations(ctx),
            Command::GetEnteredShops => self.get_entered_shops(ctx),
            Command::GetNearbyDevices => self.get_nearby_devices(ctx),
            Command::BluetoothState => self.bluetooth_state(ctx),
            Command::SubscribeBluetoothEvents => self.subscribe_bluetooth_events(ctx),
            Command::UnsubscribeBluetoothEvents => self.unsubscribe_bluetooth_events(ctx),
            Command::EnableBluetooth => self.enable_bluetooth(ctx),
            Command::SubscribeLogEvents => self.subscribe_log_events(ctx),
            Command::UnsubscribeLogEvents => self.unsubscribe_log_events(ctx),
            Command::GpsState => self.gps_state(ctx),
        }
    }

    // ========================================================================
    // SDK setup
    // ========================================================================

    /// `initSDK`: `[appName, appToken, serviceId]`
    pub fn init_sdk(&self, raw: &str, ctx: CommandContext) {
        let params = match commands::parse_init_args(raw) {
            Ok(params) => params,
            Err(e) => return ctx.error(e.to_string()),
        };

        self.on_ui(ctx, move |core, ctx| {
            info!("Initializing SDK for service {}", params.service_id());
            match core.sdk.init(&params) {
                Ok(()) => {
                    core.sdk.try_sync();
                    info!("SDK initialized");
                    ctx.success(Payload::text(INIT_SUCCESS));
                }
                Err(e) => {
                    warn!("SDK init failed: {}", e);
                    ctx.error(BridgeError::InitFailed.to_string());
                }
            }
        });
    }

    /// `initWithOfflineConfig`: `[serviceId, offlineConfigJson]`
    pub fn init_with_offline_config(&self, raw: &str, ctx: CommandContext) {
        let params = match commands::parse_offline_args(raw) {
            Ok(params) => params,
            Err(e) => return ctx.error(e.to_string()),
        };

        self.on_ui(ctx, move |core, ctx| {
            info!("Initializing SDK offline for service {}", params.service_id());
            match core.sdk.init(&params) {
                Ok(()) => {
                    core.sdk.try_sync();
                    info!("SDK initialized from offline config");
                    ctx.success(Payload::text(INIT_SUCCESS));
                }
                Err(e) => {
                    warn!("Offline SDK init failed: {}", e);
                    ctx.error(BridgeError::OfflineInitFailed(e).to_string());
                }
            }
        });
    }

    /// `enableBeeper`: turn on background mode and capture the lockers capability
    pub fn enable_beeper(&self, ctx: CommandContext) {
        self.on_ui(ctx, |core, ctx| {
            if !core.platform.bluetooth_permissions_granted() {
                return ctx.error(BridgeError::NoPermissions.to_string());
            }
            if !core.sdk.is_initialized() {
                return ctx.error(BridgeError::NotInitialized.to_string());
            }

            if !core.sdk.is_background_active() {
                if let Err(e) = core.sdk.enable_background() {
                    warn!("Failed to enable background mode: {}", e);
                    return ctx.error(BridgeError::from(e).to_string());
                }
                debug!("Background mode enabled");
            }

            match core.sdk.lockers() {
                Ok(lockers) => {
                    *core.lockers.lock() = Some(lockers);
                    info!("Beeper enabled");
                    ctx.success(Payload::Empty);
                }
                Err(e) => ctx.error(BridgeError::from(e).to_string()),
            }
        });
    }

    // ========================================================================
    // Device search
    // ========================================================================

    /// `searchDevices`: JSON array of token strings
    ///
    /// Opens the device channel. The new listener first receives one
    /// `DeviceDetected` event per device that is already visible.
    pub fn search_devices(&self, raw: &str, ctx: CommandContext) {
        if let Err(e) = self.require_initialized() {
            return ctx.error(e.to_string());
        }
        if raw.is_empty() {
            return ctx.error(BridgeError::EmptyMessage.to_string());
        }

        let raw = raw.to_string();
        self.on_ui(ctx, move |core, ctx| {
            let filter = match commands::parse_search_filter(&raw) {
                Ok(filter) => filter,
                Err(e) => return ctx.error(e.to_string()),
            };
            let Some(lockers) = core.lockers() else {
                return ctx.error(BridgeError::LockersUnavailable.to_string());
            };
            core.start_search(lockers, filter, ctx);
        });
    }

    /// `stopSearching`: close the device channel, answering with `msg`
    pub fn stop_searching(&self, msg: String, ctx: CommandContext) {
        if let Err(e) = self.require_initialized() {
            return ctx.error(e.to_string());
        }

        self.on_ui(ctx, move |core, ctx| {
            core.stop_search();
            ctx.success(Payload::Text(msg));
        });
    }

    /// `applyToken`: runs on a background thread, answers exactly once
    pub fn apply_token(&self, raw: &str, ctx: CommandContext) {
        if let Err(e) = self.require_initialized() {
            return ctx.error(e.to_string());
        }
        let token = match commands::parse_token(raw) {
            Ok(token) => token,
            Err(e) => return ctx.error(e.to_string()),
        };
        let Some(lockers) = self.core.lockers() else {
            return ctx.error(BridgeError::LockersUnavailable.to_string());
        };

        // Shared so the spawn failure path can still answer.
        let slot = Arc::new(Mutex::new(Some(ctx)));
        let job_slot = Arc::clone(&slot);

        let spawned = self.core.dispatcher.run_in_background(move || {
            let ctx = job_slot.lock().take();
            if let Some(ctx) = ctx {
                apply_on_worker(lockers, token, ctx);
            }
        });

        if let Err(e) = spawned {
            warn!("Could not start token worker: {}", e);
            if let Some(ctx) = slot.lock().take() {
                ctx.error(BridgeError::from(e).to_string());
            }
        }
    }

    /// `getNearbyDevices`: JSON array of visible devices, without status
    pub fn get_nearby_devices(&self, ctx: CommandContext) {
        if let Err(e) = self.require_initialized() {
            return ctx.error(e.to_string());
        }

        self.on_ui(ctx, |core, ctx| match core.sdk.lockers() {
            Ok(lockers) => {
                let devices = lockers.visible_devices();
                debug!("Nearby devices: {}", devices.len());
                ctx.success(payload::device_snapshots(&devices));
            }
            Err(e) => ctx.error(BridgeError::from(e).to_string()),
        });
    }

    // ========================================================================
    // Locations
    // ========================================================================

    pub fn subscribe_to_locations(&self, ctx: CommandContext) {
        if let Err(e) = self.require_initialized() {
            return ctx.error(e.to_string());
        }

        self.on_ui(ctx, |core, ctx| {
            if !core.lifecycle.is_held(Consumer::LocationSubscription) {
                core.sdk
                    .locations()
                    .subscribe(Arc::clone(&core.location_listener));
                core.lifecycle.acquire(Consumer::LocationSubscription);
            }

            let handle = ctx.into_listener(Channel::LocationEvents);
            let replaced = core.registry.register(Channel::LocationEvents, handle);
            core.retire(replaced);
        });
    }

    pub fn unsubscribe_from_locations(&self, ctx: CommandContext) {
        if let Err(e) = self.require_initialized() {
            return ctx.error(e.to_string());
        }

        self.on_ui(ctx, |core, ctx| {
            core.sdk.locations().unsubscribe(&core.location_listener);
            core.registry.unregister(Channel::LocationEvents);
            if core.lifecycle.is_held(Consumer::LocationSubscription) {
                core.lifecycle.release(Consumer::LocationSubscription);
            }
            ctx.success(Payload::Empty);
        });
    }

    /// `getEnteredShops`: JSON array of `{shopId, shopName}`
    pub fn get_entered_shops(&self, ctx: CommandContext) {
        if let Err(e) = self.require_initialized() {
            return ctx.error(e.to_string());
        }

        self.on_ui(ctx, |core, ctx| match core.sdk.locations().entered_shops() {
            Ok(shops) => ctx.success(payload::shops(&shops)),
            Err(e) => ctx.error(BridgeError::from(e).to_string()),
        });
    }

    // ========================================================================
    // Permissions and radio
    // ========================================================================

    /// `isPermissionGranted`: `{isBtReady, isLocationGranted}`
    pub fn is_permission_granted(&self, ctx: CommandContext) {
        let platform = &self.core.platform;
        let bt = platform.bluetooth_permissions_granted();
        let location = (platform.bluetooth_implies_location() && bt)
            || platform.location_permissions_granted();

        debug!("isPermissionGranted, bt = {}, location = {}", bt, location);
        ctx.success(payload::permissions(bt, location));
    }

    /// `requestPermissions`: shows the OS prompt, never answers
    pub fn request_permissions(&self, ctx: CommandContext) {
        self.on_ui(ctx, |core, ctx| {
            core.platform.request_permissions();
            debug!("{}: permission prompt shown, no result", ctx.action());
        });
    }

    pub fn bluetooth_state(&self, ctx: CommandContext) {
        self.on_ui(ctx, |core, ctx| {
            ctx.success(payload::radio_state(core.platform.is_bluetooth_enabled()));
        });
    }

    pub fn subscribe_bluetooth_events(&self, ctx: CommandContext) {
        self.on_ui(ctx, |core, ctx| {
            let first = !core.registry.is_subscribed(Channel::BluetoothStateEvents);

            let snapshot = if core.config.emit_radio_state_on_subscribe {
                vec![payload::radio_state(core.platform.is_bluetooth_enabled())]
            } else {
                Vec::new()
            };

            let handle = ctx.into_listener(Channel::BluetoothStateEvents);
            let replaced = core
                .registry
                .register_with(Channel::BluetoothStateEvents, handle, snapshot);
            core.retire(replaced);

            if first {
                core.platform
                    .register_radio_receiver(Arc::clone(&core.radio_listener));
            }
        });
    }

    pub fn unsubscribe_bluetooth_events(&self, ctx: CommandContext) {
        self.on_ui(ctx, |core, ctx| {
            core.registry.unregister(Channel::BluetoothStateEvents);
            core.platform.unregister_radio_receiver(&core.radio_listener);
            ctx.success(Payload::Empty);
        });
    }

    /// `enableBluetooth`: shows the OS prompt
    pub fn enable_bluetooth(&self, ctx: CommandContext) {
        self.on_ui(ctx, |core, ctx| match core.platform.request_enable_bluetooth() {
            Ok(()) => ctx.success(Payload::Empty),
            Err(SdkError::Platform(reason)) => {
                ctx.error(BridgeError::PermissionDenied(reason).to_string())
            }
            Err(e) => ctx.error(BridgeError::from(e).to_string()),
        });
    }

    /// `gpsState`: `{isGpsEnabled}`
    pub fn gps_state(&self, ctx: CommandContext) {
        self.on_ui(ctx, |core, ctx| {
            ctx.success(payload::gps_state(core.platform.is_location_enabled()));
        });
    }

    // ========================================================================
    // Logs
    // ========================================================================

    pub fn subscribe_log_events(&self, ctx: CommandContext) {
        if let Err(e) = self.require_initialized() {
            return ctx.error(e.to_string());
        }

        self.on_ui(ctx, |core, ctx| {
            let first = !core.registry.is_subscribed(Channel::LogEvents);

            let handle = ctx.into_listener(Channel::LogEvents);
            let replaced = core.registry.register(Channel::LogEvents, handle);
            core.retire(replaced);

            let logger = core.sdk.logger();
            logger.set_remote_logging(true);
            core.translator.set_remote_logging(true);
            if first {
                logger.subscribe(Arc::clone(&core.log_listener));
            }
        });
    }

    pub fn unsubscribe_log_events(&self, ctx: CommandContext) {
        if let Err(e) = self.require_initialized() {
            return ctx.error(e.to_string());
        }

        self.on_ui(ctx, |core, ctx| {
            core.registry.unregister(Channel::LogEvents);

            let logger = core.sdk.logger();
            logger.unsubscribe(&core.log_listener);
            if core.config.disable_remote_logging_on_unsubscribe {
                logger.set_remote_logging(false);
                core.translator.set_remote_logging(false);
            }
            ctx.success(Payload::Empty);
        });
    }

    // ========================================================================
    // Introspection and teardown
    // ========================================================================

    /// Outstanding scanner references
    pub fn ref_count(&self) -> usize {
        self.core.lifecycle.ref_count()
    }

    pub fn is_subscribed(&self, channel: Channel) -> bool {
        self.core.registry.is_subscribed(channel)
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.core.config
    }

    /// Wait until every command submitted so far has run on the UI thread
    pub fn flush(&self) -> Result<()> {
        self.core.dispatcher.flush().map_err(BridgeError::from)
    }

    /// Close every channel, stop the scanner and stop the UI worker
    ///
    /// The device listener receives its terminal status; other listeners are
    /// dropped. Commands issued afterwards fail immediately.
    pub fn shutdown(&self) {
        if self.core.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("Shutting down bridge");

        let core = Arc::clone(&self.core);
        let teardown = self.core.dispatcher.run_on_ui_blocking(move || core.teardown());
        if let Err(e) = teardown {
            warn!("Bridge teardown did not complete: {}", e);
        }
        self.core.dispatcher.shutdown();
    }

    fn require_initialized(&self) -> Result<()> {
        if self.core.sdk.is_initialized() {
            Ok(())
        } else {
            Err(BridgeError::NotInitialized)
        }
    }

    /// Run `job` on the UI thread with the command's context
    ///
    /// If the job never runs, because the worker is gone or stopped before
    /// reaching it, the host still gets an error.
    fn on_ui<F>(&self, ctx: CommandContext, job: F)
    where
        F: FnOnce(&Core, CommandContext) + Send + 'static,
    {
        let core = Arc::clone(&self.core);
        let action = ctx.action().to_string();
        let mut pending = PendingCommand(Some(ctx));

        let submitted = self.core.dispatcher.run_on_ui(move || {
            if let Some(ctx) = pending.0.take() {
                job(&*core, ctx);
            }
        });
        if let Err(e) = submitted {
            warn!("{} not scheduled: {}", action, e);
        }
    }
}

/// Context travelling with a UI job; answers with an error if dropped unused
struct PendingCommand(Option<CommandContext>);

impl Drop for PendingCommand {
    fn drop(&mut self) {
        if let Some(ctx) = self.0.take() {
            ctx.error(BridgeError::Runtime(EventManagerError::DispatcherDisconnected).to_string());
        }
    }
}

impl Drop for BeeperBridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Core {
    fn lockers(&self) -> Option<Arc<dyn Lockers>> {
        self.lockers.lock().clone()
    }

    fn start_search(&self, lockers: Arc<dyn Lockers>, filter: SearchFilter, ctx: CommandContext) {
        // A search replacing a running one keeps its SDK listener and scanner
        // reference.
        if !self.lifecycle.is_held(Consumer::DeviceSearch) {
            lockers.subscribe(Arc::clone(&self.device_listener));
            self.lifecycle.acquire(Consumer::DeviceSearch);
        }

        let snapshot: Vec<Payload> = lockers
            .visible_devices()
            .iter()
            .map(|d| payload::device_event(d, DeviceStatus::DeviceDetected))
            .collect();

        let handle = ctx.into_listener(Channel::DeviceEvents);
        let replaced = self
            .registry
            .register_with(Channel::DeviceEvents, handle, snapshot);
        self.retire(replaced);

        match lockers.start_search(&filter) {
            Ok(()) => info!("Search started ({} tokens)", filter.tokens().len()),
            Err(e) => {
                warn!("Search failed to start: {}", e);
                lockers.unsubscribe(&self.device_listener);
                if let Some(handle) = self.registry.unregister(Channel::DeviceEvents) {
                    handle.fail(BridgeError::from(e).to_string());
                }
                self.lifecycle.release(Consumer::DeviceSearch);
            }
        }
    }

    fn stop_search(&self) {
        if let Some(lockers) = self.lockers() {
            lockers.stop_search();
            lockers.unsubscribe(&self.device_listener);
        }
        if let Some(handle) = self.registry.unregister(Channel::DeviceEvents) {
            handle.finish();
        }
        if self.lifecycle.is_held(Consumer::DeviceSearch) {
            self.lifecycle.release(Consumer::DeviceSearch);
        }
        debug!("Search stopped");
    }

    /// Dispose of a listener that lost its channel to a newer subscriber
    fn retire(&self, replaced: Option<ListenerHandle>) {
        let Some(old) = replaced else { return };
        if self.config.terminate_replaced_listeners {
            old.finish();
        } else {
            debug!("{} replaced silently", old.id());
        }
    }

    fn teardown(&self) {
        if self.registry.is_subscribed(Channel::DeviceEvents) {
            self.stop_search();
        }
        if self.lifecycle.is_held(Consumer::LocationSubscription) {
            self.sdk.locations().unsubscribe(&self.location_listener);
            self.registry.unregister(Channel::LocationEvents);
            self.lifecycle.release(Consumer::LocationSubscription);
        }
        if self.registry.unregister(Channel::BluetoothStateEvents).is_some() {
            self.platform.unregister_radio_receiver(&self.radio_listener);
        }
        if self.registry.unregister(Channel::LogEvents).is_some() {
            let logger = self.sdk.logger();
            logger.unsubscribe(&self.log_listener);
            if self.config.disable_remote_logging_on_unsubscribe {
                logger.set_remote_logging(false);
                self.translator.set_remote_logging(false);
            }
        }
        debug!("Bridge teardown complete");
    }
}

fn apply_on_worker(lockers: Arc<dyn Lockers>, token: Token, ctx: CommandContext) {
    debug!("Applying {:?}", token);
    match block_on_worker(lockers.apply(token)) {
        Ok(Ok(TokenResult::Applied)) => {
            info!("Token applied");
            ctx.success(Payload::Empty);
        }
        Ok(Ok(TokenResult::Rejected(reason))) => {
            info!("Token rejected: {}", reason);
            ctx.error(reason);
        }
        Ok(Err(e)) => {
            warn!("Error to apply: {}", e);
            ctx.error(BridgeError::from(e).to_string());
        }
        Err(e) => ctx.error(BridgeError::from(e).to_string()),
    }
}

// ============================================================================
// BeeperBridgeBuilder
// ============================================================================

/// Builder for [`BeeperBridge`]
pub struct BeeperBridgeBuilder {
    sdk: Arc<dyn LockerSdk>,
    platform: Arc<dyn Platform>,
    config: BridgeConfig,
}

impl BeeperBridgeBuilder {
    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate the configuration, spawn the UI worker and wire the listeners
    pub fn build(self) -> Result<BeeperBridge> {
        self.config.validate()?;

        let dispatcher = Dispatcher::new(
            &self.config.ui_thread_name,
            &self.config.worker_thread_name,
            self.config.ui_call_timeout,
        )?;

        let registry = Arc::new(ChannelRegistry::new());
        let translator = Arc::new(EventTranslator::new(Arc::clone(&registry)));
        let lifecycle = ScannerLifecycle::new(self.sdk.scanner());

        let device_listener: Arc<dyn DeviceStatusListener> = translator.clone();
        let location_listener: Arc<dyn LocationListener> = translator.clone();
        let radio_listener: Arc<dyn RadioStateListener> = translator.clone();
        let log_listener: Arc<dyn LogListener> = translator.clone();

        info!("BeeperBridge created (UI thread '{}')", self.config.ui_thread_name);

        Ok(BeeperBridge {
            core: Arc::new(Core {
                sdk: self.sdk,
                platform: self.platform,
                config: self.config,
                dispatcher,
                registry,
                lifecycle,
                translator,
                device_listener,
                location_listener,
                radio_listener,
                log_listener,
                lockers: Mutex::new(None),
                closed: AtomicBool::new(false),
            }),
        })
    }
}
