//! Host command vocabulary and argument parsing
//!
//! The host always sends one raw string per command. Commands with several
//! parameters carry a JSON array inside that string. Argument contents are
//! parsed lazily by the coordinator so that readiness checks keep their order
//! (an uninitialized SDK is reported before a malformed argument).

use beeper_api::{InitParams, SearchFilter, Token};

use crate::error::{BridgeError, Result};

/// A command the host can invoke, with its raw argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    InitSdk(String),
    InitWithOfflineConfig(String),
    SearchDevices(String),
    StopSearching(String),
    ApplyToken(String),
    IsPermissionGranted,
    RequestPermissions,
    EnableBeeper,
    SubscribeToLocations,
    UnsubscribeFromLocations,
    GetEnteredShops,
    GetNearbyDevices,
    BluetoothState,
    SubscribeBluetoothEvents,
    UnsubscribeBluetoothEvents,
    EnableBluetooth,
    SubscribeLogEvents,
    UnsubscribeLogEvents,
    GpsState,
}

impl Command {
    /// Resolve `action` to a command
    ///
    /// Only the first argument is used; a missing one reads as an empty
    /// string. Returns `None` for unknown actions.
    pub fn parse(action: &str, args: &[String]) -> Option<Command> {
        let raw = || args.first().cloned().unwrap_or_default();

        let command = match action {
            "initSDK" => Command::InitSdk(raw()),
            "initWithOfflineConfig" => Command::InitWithOfflineConfig(raw()),
            "searchDevices" => Command::SearchDevices(raw()),
            "stopSearching" => Command::StopSearching(raw()),
            "applyToken" => Command::ApplyToken(raw()),
            "isPermissionGranted" => Command::IsPermissionGranted,
            "requestPermissions" => Command::RequestPermissions,
            "enableBeeper" => Command::EnableBeeper,
            "subscribeToLocations" => Command::SubscribeToLocations,
            "unsubscribeFromLocations" => Command::UnsubscribeFromLocations,
            "getEnteredShops" => Command::GetEnteredShops,
            "getNearbyDevices" => Command::GetNearbyDevices,
            "bluetoothState" => Command::BluetoothState,
            "subscribeBluetoothEvents" => Command::SubscribeBluetoothEvents,
            "unsubscribeBluetoothEvents" => Command::UnsubscribeBluetoothEvents,
            "enableBluetooth" => Command::EnableBluetooth,
            "subscribeLogEvents" => Command::SubscribeLogEvents,
            "unsubscribeLogEvents" => Command::UnsubscribeLogEvents,
            "gpsState" => Command::GpsState,
            _ => return None,
        };
        Some(command)
    }

    /// Action name as the host spells it
    pub fn action(&self) -> &'static str {
        match self {
            Command::InitSdk(_) => "initSDK",
            Command::InitWithOfflineConfig(_) => "initWithOfflineConfig",
            Command::SearchDevices(_) => "searchDevices",
            Command::StopSearching(_) => "stopSearching",
            Command::ApplyToken(_) => "applyToken",
            Command::IsPermissionGranted => "isPermissionGranted",
            Command::RequestPermissions => "requestPermissions",
            Command::EnableBeeper => "enableBeeper",
            Command::SubscribeToLocations => "subscribeToLocations",
            Command::UnsubscribeFromLocations => "unsubscribeFromLocations",
            Command::GetEnteredShops => "getEnteredShops",
            Command::GetNearbyDevices => "getNearbyDevices",
            Command::BluetoothState => "bluetoothState",
            Command::SubscribeBluetoothEvents => "subscribeBluetoothEvents",
            Command::UnsubscribeBluetoothEvents => "unsubscribeBluetoothEvents",
            Command::EnableBluetooth => "enableBluetooth",
            Command::SubscribeLogEvents => "subscribeLogEvents",
            Command::UnsubscribeLogEvents => "unsubscribeLogEvents",
            Command::GpsState => "gpsState",
        }
    }
}

/// Parse a JSON array of strings, requiring at least `min_len` entries
fn string_array(raw: &str, min_len: usize) -> std::result::Result<Vec<String>, String> {
    let values: Vec<String> = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    if values.len() < min_len {
        return Err(format!(
            "expected {} parameters, got {}",
            min_len,
            values.len()
        ));
    }
    Ok(values)
}

/// `[appName, appToken, serviceId]`
pub fn parse_init_args(raw: &str) -> Result<InitParams> {
    if raw.is_empty() {
        return Err(BridgeError::EmptyMessage);
    }

    let mut values = string_array(raw, 3).map_err(|reason| {
        tracing::warn!("Rejecting initSDK arguments: {}", reason);
        BridgeError::InitFailed
    })?;
    let service_id = values.swap_remove(2);
    let app_token = values.swap_remove(1);
    let app_name = values.swap_remove(0);

    Ok(InitParams::Credentials {
        app_name,
        app_token,
        service_id,
    })
}

/// `[serviceId, offlineConfigJson]`
pub fn parse_offline_args(raw: &str) -> Result<InitParams> {
    if raw.is_empty() {
        return Err(BridgeError::EmptyMessage);
    }

    let mut values = string_array(raw, 2).map_err(|reason| {
        tracing::warn!("Rejecting initWithOfflineConfig arguments: {}", reason);
        BridgeError::InitFailed
    })?;
    let config_json = values.swap_remove(1);
    let service_id = values.swap_remove(0);

    Ok(InitParams::Offline {
        service_id,
        config_json,
    })
}

/// JSON array of token strings; empty entries are skipped
pub fn parse_search_filter(raw: &str) -> Result<SearchFilter> {
    if raw.is_empty() {
        return Err(BridgeError::EmptyMessage);
    }

    let tokens = string_array(raw, 0).map_err(BridgeError::InvalidArgument)?;
    Ok(SearchFilter::from_raw(tokens))
}

pub fn parse_token(raw: &str) -> Result<Token> {
    if raw.is_empty() {
        return Err(BridgeError::EmptyMessage);
    }
    Ok(Token::new(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rstest::rstest;

    fn args(raw: &str) -> Vec<String> {
        vec![raw.to_string()]
    }

    #[rstest]
    #[case("initSDK", Command::InitSdk("x".into()))]
    #[case("initWithOfflineConfig", Command::InitWithOfflineConfig("x".into()))]
    #[case("searchDevices", Command::SearchDevices("x".into()))]
    #[case("stopSearching", Command::StopSearching("x".into()))]
    #[case("applyToken", Command::ApplyToken("x".into()))]
    #[case("isPermissionGranted", Command::IsPermissionGranted)]
    #[case("requestPermissions", Command::RequestPermissions)]
    #[case("enableBeeper", Command::EnableBeeper)]
    #[case("subscribeToLocations", Command::SubscribeToLocations)]
    #[case("unsubscribeFromLocations", Command::UnsubscribeFromLocations)]
    #[case("getEnteredShops", Command::GetEnteredShops)]
    #[case("getNearbyDevices", Command::GetNearbyDevices)]
    #[case("bluetoothState", Command::BluetoothState)]
    #[case("subscribeBluetoothEvents", Command::SubscribeBluetoothEvents)]
    #[case("unsubscribeBluetoothEvents", Command::UnsubscribeBluetoothEvents)]
    #[case("enableBluetooth", Command::EnableBluetooth)]
    #[case("subscribeLogEvents", Command::SubscribeLogEvents)]
    #[case("unsubscribeLogEvents", Command::UnsubscribeLogEvents)]
    #[case("gpsState", Command::GpsState)]
    fn test_known_actions(#[case] action: &str, #[case] expected: Command) {
        let command = Command::parse(action, &args("x")).unwrap();
        assert_eq!(command, expected);
        assert_eq!(command.action(), action);
    }

    #[rstest]
    #[case("")]
    #[case("initSdk")]
    #[case("SEARCHDEVICES")]
    #[case("subscribeGpsEvents")]
    fn test_unknown_actions(#[case] action: &str) {
        assert!(Command::parse(action, &args("x")).is_none());
    }

    #[test]
    fn test_missing_argument_reads_as_empty() {
        assert_eq!(
            Command::parse("applyToken", &[]),
            Some(Command::ApplyToken(String::new()))
        );
    }

    #[test]
    fn test_init_args() {
        let params = parse_init_args(r#"["Demo","secret","svc-1"]"#).unwrap();
        assert_eq!(
            params,
            InitParams::Credentials {
                app_name: "Demo".into(),
                app_token: "secret".into(),
                service_id: "svc-1".into(),
            }
        );
    }

    #[rstest]
    #[case("", "Empty message!")]
    #[case("not json", "Failed to init sdk")]
    #[case(r#"["Demo","secret"]"#, "Failed to init sdk")]
    #[case(r#"["Demo", 1, "svc"]"#, "Failed to init sdk")]
    fn test_init_args_rejected(#[case] raw: &str, #[case] message: &str) {
        assert_eq!(parse_init_args(raw).unwrap_err().to_string(), message);
    }

    #[test]
    fn test_offline_args() {
        let params = parse_offline_args(r#"["svc-2","{\"shops\":[]}"]"#).unwrap();
        assert_eq!(params.service_id(), "svc-2");
        match params {
            InitParams::Offline { config_json, .. } => assert_eq!(config_json, r#"{"shops":[]}"#),
            other => panic!("unexpected params: {:?}", other),
        }

        assert!(matches!(
            parse_offline_args(""),
            Err(BridgeError::EmptyMessage)
        ));
        assert!(matches!(
            parse_offline_args(r#"["svc-2"]"#),
            Err(BridgeError::InitFailed)
        ));
    }

    #[rstest]
    #[case(r#"["tokenA"]"#, 1)]
    #[case(r#"["tokenA","","tokenB"]"#, 2)]
    #[case(r#"[]"#, 0)]
    #[case(r#"["",""]"#, 0)]
    fn test_search_filter(#[case] raw: &str, #[case] tokens: usize) {
        let filter = parse_search_filter(raw).unwrap();
        assert_eq!(filter.tokens().len(), tokens);
        assert_eq!(filter.is_match_all(), tokens == 0);
    }

    #[test]
    fn test_search_filter_rejected() {
        assert!(matches!(
            parse_search_filter(""),
            Err(BridgeError::EmptyMessage)
        ));

        let err = parse_search_filter("{\"token\":1}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_token() {
        assert_eq!(parse_token("00ff").unwrap().as_str(), "00ff");
        assert!(matches!(parse_token(""), Err(BridgeError::EmptyMessage)));
    }
}
