//! Domain types shared between the SDK collaborator and the bridge

use std::fmt;

use serde::Serialize;

/// State of a single lock slot reported by a locker device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LockStatus {
    Opened,
    Closed,
    Unknown,
}

impl LockStatus {
    /// Name of the status as the host sees it
    pub fn name(&self) -> &'static str {
        match self {
            LockStatus::Opened => "Opened",
            LockStatus::Closed => "Closed",
            LockStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for LockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A locker device as seen by the SDK
///
/// Produced by the SDK for every discovered device. Only the bridge's payload
/// module knows how to turn it into host JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    /// SDK device identifier
    pub device_id: String,
    /// Human readable name (the shop the device belongs to)
    pub display_name: String,
    /// Whether the device currently accepts connections
    pub is_connectable: bool,
    /// Opaque user data advertised by the device, expected to be UTF-8
    pub user_data: Option<Vec<u8>>,
    /// Per-slot lock states, in slot order
    pub lock_statuses: Vec<LockStatus>,
}

impl DeviceRecord {
    pub fn new(device_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            display_name: display_name.into(),
            is_connectable: false,
            user_data: None,
            lock_statuses: Vec::new(),
        }
    }

    pub fn connectable(mut self, connectable: bool) -> Self {
        self.is_connectable = connectable;
        self
    }

    pub fn with_user_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.user_data = Some(data.into());
        self
    }

    pub fn with_lock_statuses(mut self, statuses: Vec<LockStatus>) -> Self {
        self.lock_statuses = statuses;
        self
    }

    /// User data decoded as UTF-8, empty when the device advertises none
    ///
    /// Invalid sequences are replaced rather than rejected.
    pub fn user_data_utf8(&self) -> String {
        self.user_data
            .as_deref()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default()
    }
}

/// A shop known to the location engine
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shop {
    pub id: i64,
    pub name: String,
}

impl Shop {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A merchant owning one or more shops
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Merchant {
    pub id: i64,
    pub name: String,
}

impl Merchant {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// One line of the SDK's internal log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub tag: String,
    pub message: String,
}

impl LogLine {
    pub fn new(tag: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.tag, self.message)
    }
}

/// Bluetooth adapter state as reported by the OS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RadioState {
    Off,
    TurningOn,
    On,
    TurningOff,
}

impl RadioState {
    /// `Some(enabled)` for settled states, `None` while the radio is transitioning
    pub fn settled(&self) -> Option<bool> {
        match self {
            RadioState::On => Some(true),
            RadioState::Off => Some(false),
            RadioState::TurningOn | RadioState::TurningOff => None,
        }
    }
}

/// An opaque authorization token for a locker
///
/// The bridge never looks inside a token; validation and cryptography belong
/// to the SDK.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    // Tokens are credentials, keep them out of logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({} chars)", self.0.len())
    }
}

/// Token filter for a device search
///
/// An empty filter matches every visible device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    tokens: Vec<Token>,
}

impl SearchFilter {
    /// Filter that matches every visible device
    pub fn match_all() -> Self {
        Self::default()
    }

    /// Build a filter from raw token strings, skipping empty entries
    pub fn from_raw<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tokens = raw
            .into_iter()
            .filter(|s| !s.as_ref().is_empty())
            .map(|s| Token::new(s.as_ref()))
            .collect();
        Self { tokens }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn is_match_all(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Outcome of applying a token to a locker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenResult {
    /// The locker accepted the token
    Applied,
    /// The locker refused the token, with the SDK's reason
    Rejected(String),
}

/// Parameters for initializing the SDK
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitParams {
    /// Online registration with application credentials
    Credentials {
        app_name: String,
        app_token: String,
        service_id: String,
    },
    /// Offline mode driven by a JSON configuration blob
    Offline {
        service_id: String,
        config_json: String,
    },
}

impl InitParams {
    pub fn service_id(&self) -> &str {
        match self {
            InitParams::Credentials { service_id, .. } => service_id,
            InitParams::Offline { service_id, .. } => service_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_data_utf8() {
        let record = DeviceRecord::new("1", "Shop").with_user_data(b"cell-4".to_vec());
        assert_eq!(record.user_data_utf8(), "cell-4");

        let empty = DeviceRecord::new("2", "Shop");
        assert_eq!(empty.user_data_utf8(), "");

        let broken = DeviceRecord::new("3", "Shop").with_user_data(vec![0x66, 0xff, 0x6f]);
        assert_eq!(broken.user_data_utf8(), "f\u{fffd}o");
    }

    #[test]
    fn test_radio_state_settled() {
        assert_eq!(RadioState::On.settled(), Some(true));
        assert_eq!(RadioState::Off.settled(), Some(false));
        assert_eq!(RadioState::TurningOn.settled(), None);
        assert_eq!(RadioState::TurningOff.settled(), None);
    }

    #[test]
    fn test_search_filter_skips_empty_tokens() {
        let filter = SearchFilter::from_raw(["", "abc", "", "def"]);
        assert_eq!(filter.tokens().len(), 2);
        assert_eq!(filter.tokens()[0].as_str(), "abc");
        assert!(!filter.is_match_all());

        let all = SearchFilter::from_raw(["", ""]);
        assert!(all.is_match_all());
        assert_eq!(all, SearchFilter::match_all());
    }

    #[test]
    fn test_token_debug_hides_value() {
        let token = Token::new("deadbeef");
        assert_eq!(format!("{:?}", token), "Token(8 chars)");
    }

    #[test]
    fn test_log_line_display() {
        assert_eq!(LogLine::new("BleScanner", "started").to_string(), "BleScanner: started");
    }
}
