//! Framework-neutral WASM <-> JavaScript bridge over the booking logic.

use chrono::{Local, NaiveDateTime};
use clinic_core::{
    is_valid_phone_number, partition_appointments, tag_cancelled, Appointment,
};
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

fn parse_now(now: Option<String>) -> Result<NaiveDateTime, JsValue> {
    match now {
        Some(text) => NaiveDateTime::parse_from_str(&text, "%Y-%m-%dT%H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S"))
            .map_err(|err| JsValue::from_str(&format!("Unreadable timestamp: {err}"))),
        None => Ok(Local::now().naive_local()),
    }
}

fn decode_appointments(appointments: JsValue) -> Result<Vec<Appointment>, JsValue> {
    from_value(appointments)
        .map_err(|err| JsValue::from_str(&format!("Unreadable appointment list: {err}")))
}

/// Partition an appointment list into `{upcoming, previous}` around
/// `now` (`YYYY-MM-DDTHH:MM:SS`, defaulting to the current local time).
#[wasm_bindgen]
pub fn classify_appointments(
    appointments: JsValue,
    now: Option<String>,
) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let appointments = decode_appointments(appointments)?;
    let now = parse_now(now)?;
    let buckets = partition_appointments(&appointments, now);
    to_value(&buckets).map_err(|err| JsValue::from_str(&format!("Could not serialize: {err}")))
}

/// Tag a fetched cancelled list with the cancelled status code,
/// whatever each row reported.
#[wasm_bindgen]
pub fn tag_cancelled_appointments(appointments: JsValue) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let appointments = decode_appointments(appointments)?;
    to_value(&tag_cancelled(appointments))
        .map_err(|err| JsValue::from_str(&format!("Could not serialize: {err}")))
}

/// Ten-digit phone check shared with the booking form validation.
#[wasm_bindgen]
pub fn validate_phone(phone: &str) -> bool {
    is_valid_phone_number(phone)
}
