//! `/api/state/*` and `/api/settings/*` routes — persistence round-trip and
//! the global tier/language settings.
//!
//! The store never writes localStorage itself. After a batch of mutations
//! the page calls `POST /api/state/persist` and stores the returned `state`
//! string under the returned `key`; on load it hands that string back to
//! `POST /api/state/restore`.

use serde_json::json;

use crate::calc::model::{Language, STORAGE_KEY};
use crate::calc::session::{with_store, with_store_mut};
use crate::calc::valuation::parse_tier;
use crate::routes::util::{error_json, get_param, parse_form_body, to_json};

/// Accept either a raw JSON body or a form-encoded `state=` field.
fn state_blob(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.starts_with('{') || trimmed.is_empty() {
        return trimmed.to_string();
    }
    let params = parse_form_body(body);
    get_param(&params, "state").unwrap_or(trimmed).to_string()
}

// ── GET /api/state ─────────────────────────────────────────────────

/// Full calculator state as JSON.
pub fn handle_state_get(_query: &str) -> String {
    with_store(|store| store.serialize())
}

// ── POST /api/state/persist ────────────────────────────────────────

/// Returns `{"key": "...", "state": "<serialized state>"}` for the page to
/// write into localStorage.
pub fn handle_persist_post(_body: &str) -> String {
    let state = with_store(|store| store.serialize());
    json!({ "key": STORAGE_KEY, "state": state }).to_string()
}

// ── POST /api/state/restore ────────────────────────────────────────

/// Page-load restore. Never fails: a corrupt or missing blob loads the
/// empty default state.
pub fn handle_restore_post(body: &str) -> String {
    let blob = state_blob(body);
    let zones = with_store_mut(|store| {
        store.deserialize(&blob);
        store.zones().len()
    });
    json!({ "ok": true, "zones": zones }).to_string()
}

// ── POST /api/state/import ─────────────────────────────────────────

/// Explicit import of a previously exported state. Unlike restore, a bad
/// blob is reported and the current state is kept.
pub fn handle_import_post(body: &str) -> String {
    let blob = state_blob(body);
    match with_store_mut(|store| store.try_deserialize(&blob).map(|_| store.zones().len())) {
        Ok(zones) => json!({ "ok": true, "zones": zones }).to_string(),
        Err(e) => error_json(&e.to_string()),
    }
}

// ── POST /api/settings/tier ────────────────────────────────────────

/// Body: tier={n}. An unparseable tier is stored as 0, which caps every
/// zone at the default 30. Returns all zone totals under the new tier.
pub fn handle_tier_post(body: &str) -> String {
    let params = parse_form_body(body);
    let tier = get_param(&params, "tier").and_then(parse_tier).unwrap_or(0);
    let totals = with_store_mut(|store| {
        store.set_tier(tier);
        store.totals()
    });
    to_json(&totals)
}

// ── POST /api/settings/lang ────────────────────────────────────────

/// Body: lang=th|en
pub fn handle_lang_post(body: &str) -> String {
    let params = parse_form_body(body);
    let code = get_param(&params, "lang").unwrap_or("");
    match Language::from_code(code) {
        Some(language) => {
            with_store_mut(|store| store.set_language(language));
            json!({ "language": language }).to_string()
        }
        None => error_json(&format!("Unknown language: {}", code)),
    }
}
