//! JSON shapes the host receives
//!
//! Every outgoing object is a serde struct here; the rest of the bridge only
//! sees [`Payload`].

use beeper_api::{DeviceRecord, LockStatus, Payload, Shop};
use serde::Serialize;

/// Status tag of a device event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DeviceStatus {
    DeviceDetected,
    DeviceStateChanged,
    DeviceLost,
    DeviceLockStateChanged,
}

/// A locker device as the host sees it
///
/// `status`, `userData` and `lockStatuses` are only present on pushed events,
/// never on snapshot queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DevicePayload {
    pub device_id: String,
    pub device_name: String,
    /// `"true"` or `"false"`
    pub is_connectable: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DeviceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_statuses: Option<Vec<LockStatus>>,
}

impl DevicePayload {
    /// Pushed event for `record`
    pub fn event(record: &DeviceRecord, status: DeviceStatus) -> Self {
        Self {
            status: Some(status),
            user_data: Some(record.user_data_utf8()),
            lock_statuses: Some(record.lock_statuses.clone()),
            ..Self::snapshot(record)
        }
    }

    /// Snapshot entry for `record`, without status
    pub fn snapshot(record: &DeviceRecord) -> Self {
        Self {
            device_id: record.device_id.clone(),
            device_name: record.display_name.clone(),
            is_connectable: record.is_connectable.to_string(),
            status: None,
            user_data: None,
            lock_statuses: None,
        }
    }
}

/// Kind of a location event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LocationEvent {
    OnShopEntered,
    OnShopExit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopPayload {
    pub shop_id: i64,
    pub shop_name: String,
}

impl From<&Shop> for ShopPayload {
    fn from(shop: &Shop) -> Self {
        Self {
            shop_id: shop.id,
            shop_name: shop.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationPayload {
    pub event: LocationEvent,
    pub shop: ShopPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RadioPayload {
    /// `"enabled"` or `"disabled"`
    pub bluetooth: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionPayload {
    pub is_bt_ready: bool,
    pub is_location_granted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GpsPayload {
    pub is_gps_enabled: &'static str,
}

fn enabled_str(enabled: bool) -> &'static str {
    if enabled {
        "enabled"
    } else {
        "disabled"
    }
}

fn to_payload<T: Serialize>(value: &T) -> Payload {
    match serde_json::to_value(value) {
        Ok(json) => Payload::Json(json),
        Err(e) => {
            tracing::error!("Failed to serialize payload: {}", e);
            Payload::Empty
        }
    }
}

pub fn device_event(record: &DeviceRecord, status: DeviceStatus) -> Payload {
    to_payload(&DevicePayload::event(record, status))
}

/// JSON array of snapshot entries
pub fn device_snapshots(records: &[DeviceRecord]) -> Payload {
    let entries: Vec<DevicePayload> = records.iter().map(DevicePayload::snapshot).collect();
    to_payload(&entries)
}

pub fn location_event(event: LocationEvent, shop: &Shop) -> Payload {
    to_payload(&LocationPayload {
        event,
        shop: shop.into(),
    })
}

/// JSON array of `{shopId, shopName}`
pub fn shops(shops: &[Shop]) -> Payload {
    let entries: Vec<ShopPayload> = shops.iter().map(ShopPayload::from).collect();
    to_payload(&entries)
}

pub fn radio_state(enabled: bool) -> Payload {
    to_payload(&RadioPayload {
        bluetooth: enabled_str(enabled),
    })
}

pub fn permissions(is_bt_ready: bool, is_location_granted: bool) -> Payload {
    to_payload(&PermissionPayload {
        is_bt_ready,
        is_location_granted,
    })
}

pub fn gps_state(enabled: bool) -> Payload {
    to_payload(&GpsPayload {
        is_gps_enabled: enabled_str(enabled),
    })
}
