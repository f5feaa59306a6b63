//! In-memory collaborators for tests and demos
//!
//! Each mock records the calls it receives and exposes `raise_*` helpers that
//! play the role of the native SDK firing callbacks. Callbacks are invoked on
//! the calling thread, outside of any internal lock.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{SdkError, SdkResult};
use crate::listener::{DeviceStatusListener, LocationListener, LogListener, RadioStateListener};
use crate::model::{
    DeviceRecord, InitParams, LogLine, Merchant, RadioState, SearchFilter, Shop, Token,
    TokenResult,
};
use crate::sdk::{same_listener, ForegroundScanner, LockerSdk, Lockers, Locations, Platform, SdkLogger};

/// Listener set with identity-based removal
struct Listeners<T: ?Sized> {
    inner: Mutex<Vec<Arc<T>>>,
}

impl<T: ?Sized> Listeners<T> {
    fn new() -> Self {
        Self {
            inner: Mutex::new(Vec::new()),
        }
    }

    fn add(&self, listener: Arc<T>) {
        let mut inner = self.inner.lock();
        if !inner.iter().any(|l| same_listener(l, &listener)) {
            inner.push(listener);
        }
    }

    fn remove(&self, listener: &Arc<T>) {
        self.inner.lock().retain(|l| !same_listener(l, listener));
    }

    fn snapshot(&self) -> Vec<Arc<T>> {
        self.inner.lock().clone()
    }

    fn len(&self) -> usize {
        self.inner.lock().len()
    }
}

// ============================================================================
// Scanner
// ============================================================================

#[derive(Default)]
pub struct MockScanner {
    started: AtomicBool,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl MockScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    /// Flip the running flag behind the bridge's back
    pub fn force_started(&self, started: bool) {
        self.started.store(started, Ordering::SeqCst);
    }
}

impl ForegroundScanner for MockScanner {
    fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    fn start(&self) {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.started.store(true, Ordering::SeqCst);
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.started.store(false, Ordering::SeqCst);
    }
}

// ============================================================================
// Lockers
// ============================================================================

pub struct MockLockers {
    listeners: Listeners<dyn DeviceStatusListener>,
    visible: Mutex<Vec<DeviceRecord>>,
    searches: Mutex<Vec<SearchFilter>>,
    stop_searches: AtomicUsize,
    search_error: Mutex<Option<SdkError>>,
    apply_outcome: Mutex<SdkResult<TokenResult>>,
    applied: Mutex<Vec<(Token, Option<String>)>>,
}

impl Default for MockLockers {
    fn default() -> Self {
        Self {
            listeners: Listeners::new(),
            visible: Mutex::new(Vec::new()),
            searches: Mutex::new(Vec::new()),
            stop_searches: AtomicUsize::new(0),
            search_error: Mutex::new(None),
            apply_outcome: Mutex::new(Ok(TokenResult::Applied)),
            applied: Mutex::new(Vec::new()),
        }
    }
}

impl MockLockers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_visible(&self, devices: Vec<DeviceRecord>) {
        *self.visible.lock() = devices;
    }

    pub fn set_search_error(&self, error: Option<SdkError>) {
        *self.search_error.lock() = error;
    }

    pub fn set_apply_outcome(&self, outcome: SdkResult<TokenResult>) {
        *self.apply_outcome.lock() = outcome;
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn searches(&self) -> Vec<SearchFilter> {
        self.searches.lock().clone()
    }

    pub fn stop_search_count(&self) -> usize {
        self.stop_searches.load(Ordering::SeqCst)
    }

    /// Tokens applied so far, with the name of the thread that applied them
    pub fn applied(&self) -> Vec<(Token, Option<String>)> {
        self.applied.lock().clone()
    }

    pub fn raise_detected(&self, device: DeviceRecord) {
        for l in self.listeners.snapshot() {
            l.on_device_detected(device.clone());
        }
    }

    pub fn raise_status_changed(&self, devices: Vec<DeviceRecord>) {
        for l in self.listeners.snapshot() {
            l.on_device_status_changed(devices.clone());
        }
    }

    pub fn raise_lock_state_changed(&self, device: DeviceRecord) {
        for l in self.listeners.snapshot() {
            l.on_device_lock_state_changed(device.clone());
        }
    }

    pub fn raise_lost(&self, device: DeviceRecord) {
        for l in self.listeners.snapshot() {
            l.on_device_lost(device.clone());
        }
    }
}

#[async_trait]
impl Lockers for MockLockers {
    fn subscribe(&self, listener: Arc<dyn DeviceStatusListener>) {
        self.listeners.add(listener);
    }

    fn unsubscribe(&self, listener: &Arc<dyn DeviceStatusListener>) {
        self.listeners.remove(listener);
    }

    fn visible_devices(&self) -> Vec<DeviceRecord> {
        self.visible.lock().clone()
    }

    fn start_search(&self, filter: &SearchFilter) -> SdkResult<()> {
        if let Some(err) = self.search_error.lock().clone() {
            return Err(err);
        }
        self.searches.lock().push(filter.clone());
        Ok(())
    }

    fn stop_search(&self) {
        self.stop_searches.fetch_add(1, Ordering::SeqCst);
    }

    async fn apply(&self, token: Token) -> SdkResult<TokenResult> {
        let thread = std::thread::current().name().map(str::to_owned);
        self.applied.lock().push((token, thread));
        self.apply_outcome.lock().clone()
    }
}

// ============================================================================
// Locations
// ============================================================================

pub struct MockLocations {
    listeners: Listeners<dyn LocationListener>,
    entered: Mutex<SdkResult<Vec<Shop>>>,
}

impl Default for MockLocations {
    fn default() -> Self {
        Self {
            listeners: Listeners::new(),
            entered: Mutex::new(Ok(Vec::new())),
        }
    }
}

impl MockLocations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_entered_shops(&self, shops: SdkResult<Vec<Shop>>) {
        *self.entered.lock() = shops;
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn raise_shop_entered(&self, shop: Shop) {
        for l in self.listeners.snapshot() {
            l.on_shop_entered(shop.clone());
        }
    }

    pub fn raise_shop_exit(&self, shop: Shop) {
        for l in self.listeners.snapshot() {
            l.on_shop_exit(shop.clone());
        }
    }

    pub fn raise_merchant_entered(&self, merchant: Merchant, shop: Shop) {
        for l in self.listeners.snapshot() {
            l.on_merchant_entered(merchant.clone(), shop.clone());
        }
    }

    pub fn raise_merchant_exit(&self, merchant: Merchant) {
        for l in self.listeners.snapshot() {
            l.on_merchant_exit(merchant.clone());
        }
    }
}

impl Locations for MockLocations {
    fn subscribe(&self, listener: Arc<dyn LocationListener>) {
        self.listeners.add(listener);
    }

    fn unsubscribe(&self, listener: &Arc<dyn LocationListener>) {
        self.listeners.remove(listener);
    }

    fn entered_shops(&self) -> SdkResult<Vec<Shop>> {
        self.entered.lock().clone()
    }
}

// ============================================================================
// Logger
// ============================================================================

pub struct MockLogger {
    listeners: Listeners<dyn LogListener>,
    remote: AtomicBool,
}

impl Default for MockLogger {
    fn default() -> Self {
        Self {
            listeners: Listeners::new(),
            remote: AtomicBool::new(false),
        }
    }
}

impl MockLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remote_logging(&self) -> bool {
        self.remote.load(Ordering::SeqCst)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn raise_line(&self, line: LogLine) {
        for l in self.listeners.snapshot() {
            l.on_log_line(line.clone());
        }
    }
}

impl SdkLogger for MockLogger {
    fn set_remote_logging(&self, enabled: bool) {
        self.remote.store(enabled, Ordering::SeqCst);
    }

    fn subscribe(&self, listener: Arc<dyn LogListener>) {
        self.listeners.add(listener);
    }

    fn unsubscribe(&self, listener: &Arc<dyn LogListener>) {
        self.listeners.remove(listener);
    }
}

// ============================================================================
// SDK
// ============================================================================

pub struct MockSdk {
    pub lockers: Arc<MockLockers>,
    pub locations: Arc<MockLocations>,
    pub scanner: Arc<MockScanner>,
    pub logger: Arc<MockLogger>,
    initialized: AtomicBool,
    background: AtomicBool,
    init_error: Mutex<Option<SdkError>>,
    last_init: Mutex<Option<InitParams>>,
    syncs: AtomicUsize,
}

impl Default for MockSdk {
    fn default() -> Self {
        Self {
            lockers: Arc::new(MockLockers::new()),
            locations: Arc::new(MockLocations::new()),
            scanner: Arc::new(MockScanner::new()),
            logger: Arc::new(MockLogger::new()),
            initialized: AtomicBool::new(false),
            background: AtomicBool::new(false),
            init_error: Mutex::new(None),
            last_init: Mutex::new(None),
            syncs: AtomicUsize::new(0),
        }
    }
}

impl MockSdk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock that already went through `init`
    pub fn initialized() -> Self {
        let sdk = Self::default();
        sdk.initialized.store(true, Ordering::SeqCst);
        sdk
    }

    pub fn set_init_error(&self, error: Option<SdkError>) {
        *self.init_error.lock() = error;
    }

    pub fn last_init(&self) -> Option<InitParams> {
        self.last_init.lock().clone()
    }

    pub fn sync_count(&self) -> usize {
        self.syncs.load(Ordering::SeqCst)
    }
}

impl LockerSdk for MockSdk {
    fn init(&self, params: &InitParams) -> SdkResult<()> {
        if let Some(err) = self.init_error.lock().clone() {
            return Err(err);
        }
        *self.last_init.lock() = Some(params.clone());
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    fn try_sync(&self) {
        self.syncs.fetch_add(1, Ordering::SeqCst);
    }

    fn is_background_active(&self) -> bool {
        self.background.load(Ordering::SeqCst)
    }

    fn enable_background(&self) -> SdkResult<()> {
        self.background.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn lockers(&self) -> SdkResult<Arc<dyn Lockers>> {
        if !self.is_initialized() {
            return Err(SdkError::NotInitialized);
        }
        let lockers: Arc<dyn Lockers> = self.lockers.clone();
        Ok(lockers)
    }

    fn locations(&self) -> Arc<dyn Locations> {
        self.locations.clone()
    }

    fn scanner(&self) -> Arc<dyn ForegroundScanner> {
        self.scanner.clone()
    }

    fn logger(&self) -> Arc<dyn SdkLogger> {
        self.logger.clone()
    }
}

// ============================================================================
// Platform
// ============================================================================

pub struct MockPlatform {
    pub bluetooth_granted: AtomicBool,
    pub location_granted: AtomicBool,
    pub bluetooth_covers_location: AtomicBool,
    pub bluetooth_enabled: AtomicBool,
    pub location_enabled: AtomicBool,
    permission_requests: AtomicUsize,
    enable_requests: AtomicUsize,
    enable_error: Mutex<Option<SdkError>>,
    receivers: Listeners<dyn RadioStateListener>,
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self {
            bluetooth_granted: AtomicBool::new(true),
            location_granted: AtomicBool::new(true),
            bluetooth_covers_location: AtomicBool::new(false),
            bluetooth_enabled: AtomicBool::new(true),
            location_enabled: AtomicBool::new(true),
            permission_requests: AtomicUsize::new(0),
            enable_requests: AtomicUsize::new(0),
            enable_error: Mutex::new(None),
            receivers: Listeners::new(),
        }
    }
}

impl MockPlatform {
    /// Platform with every permission granted and the radio on
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_enable_error(&self, error: Option<SdkError>) {
        *self.enable_error.lock() = error;
    }

    pub fn permission_request_count(&self) -> usize {
        self.permission_requests.load(Ordering::SeqCst)
    }

    pub fn enable_request_count(&self) -> usize {
        self.enable_requests.load(Ordering::SeqCst)
    }

    pub fn receiver_count(&self) -> usize {
        self.receivers.len()
    }

    /// Broadcast an adapter state change, updating the enabled flag for
    /// settled states
    pub fn raise_radio(&self, state: RadioState) {
        if let Some(enabled) = state.settled() {
            self.bluetooth_enabled.store(enabled, Ordering::SeqCst);
        }
        for r in self.receivers.snapshot() {
            r.on_radio_state_changed(state);
        }
    }
}

impl Platform for MockPlatform {
    fn bluetooth_permissions_granted(&self) -> bool {
        self.bluetooth_granted.load(Ordering::SeqCst)
    }

    fn location_permissions_granted(&self) -> bool {
        self.location_granted.load(Ordering::SeqCst)
    }

    fn bluetooth_implies_location(&self) -> bool {
        self.bluetooth_covers_location.load(Ordering::SeqCst)
    }

    fn request_permissions(&self) {
        self.permission_requests.fetch_add(1, Ordering::SeqCst);
    }

    fn is_bluetooth_enabled(&self) -> bool {
        self.bluetooth_enabled.load(Ordering::SeqCst)
    }

    fn is_location_enabled(&self) -> bool {
        self.location_enabled.load(Ordering::SeqCst)
    }

    fn request_enable_bluetooth(&self) -> SdkResult<()> {
        if let Some(err) = self.enable_error.lock().clone() {
            return Err(err);
        }
        self.enable_requests.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn register_radio_receiver(&self, listener: Arc<dyn RadioStateListener>) {
        self.receivers.add(listener);
    }

    fn unregister_radio_receiver(&self, listener: &Arc<dyn RadioStateListener>) {
        self.receivers.remove(listener);
    }
}
