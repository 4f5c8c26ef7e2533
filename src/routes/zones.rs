//! `/api/zones/*` and `/api/cards/*` routes — zone and card mutations plus
//! per-zone valuation.
//!
//! Unknown zone or card ids answer `null` / `{"removed":false}` instead of
//! an error: UI handlers can fire against a zone deleted a moment earlier.
//! Unknown category, kind or field names are caller bugs and answer an
//! error body.

use log::debug;
use serde_json::json;

use crate::calc::model::{CardCategory, CardKind};
use crate::calc::session::{with_store, with_store_mut};
use crate::calc::store::Step;
use crate::error::StoreError;
use crate::routes::util::{error_json, get_param, parse_count, parse_form_body, parse_query, to_json};

fn parse_category(params: &[(String, String)]) -> Result<CardCategory, StoreError> {
    get_param(params, "category").unwrap_or("").parse()
}

fn parse_card_id(params: &[(String, String)]) -> Option<u64> {
    get_param(params, "card").and_then(|s| s.trim().parse().ok())
}

// ── POST /api/zones/create ─────────────────────────────────────────

/// Returns the new zone, or `null` once zone ids are exhausted.
pub fn handle_create_post(_body: &str) -> String {
    let zone = with_store_mut(|store| store.create_zone());
    to_json(&zone)
}

// ── POST /api/zones/remove ─────────────────────────────────────────

/// Body: zone={id}
pub fn handle_remove_post(body: &str) -> String {
    let params = parse_form_body(body);
    let zone = get_param(&params, "zone").unwrap_or("");
    let removed = with_store_mut(|store| store.remove_zone(zone));
    json!({ "removed": removed }).to_string()
}

// ── POST /api/zones/clear ──────────────────────────────────────────

pub fn handle_clear_post(_body: &str) -> String {
    with_store_mut(|store| store.clear_all());
    json!({ "ok": true }).to_string()
}

// ── POST /api/zones/character ──────────────────────────────────────

/// Body: zone={id}&name={character}. A missing or empty name clears the slot.
/// Returns the updated zone, or `null` for an unknown zone.
pub fn handle_character_post(body: &str) -> String {
    let params = parse_form_body(body);
    let zone_id = get_param(&params, "zone").unwrap_or("");
    let name = get_param(&params, "name");
    with_store_mut(|store| {
        store.set_character(zone_id, name);
        to_json(&store.zone(zone_id))
    })
}

// ── POST /api/zones/input ──────────────────────────────────────────

/// Body params:
///   - zone={id}&field={name}&value={n}      → set a count
///   - zone={id}&field={name}&step=plus|minus → stepper press
///
/// Returns the zone total after the change (`null` for an unknown zone).
pub fn handle_input_post(body: &str) -> String {
    let params = parse_form_body(body);
    let zone_id = get_param(&params, "zone").unwrap_or("");
    let field = get_param(&params, "field").unwrap_or("");

    let result = with_store_mut(|store| {
        let outcome = match get_param(&params, "step") {
            Some("plus") => store.step_input(zone_id, field, Step::Increment),
            Some("minus") => store.step_input(zone_id, field, Step::Decrement),
            _ => {
                let value = get_param(&params, "value").map_or(0, parse_count);
                store.set_input(zone_id, field, i64::from(value))
            }
        };
        outcome.map(|_| store.compute(zone_id))
    });

    match result {
        Ok(total) => to_json(&total),
        Err(e) => error_json(&e.to_string()),
    }
}

// ── GET /api/zones/total ───────────────────────────────────────────

/// Handle GET /api/zones/total?zone={id}
pub fn handle_total_get(query: &str) -> String {
    let params = parse_query(query);
    let zone_id = get_param(&params, "zone").unwrap_or("");
    to_json(&with_store(|store| store.compute(zone_id)))
}

// ── GET /api/zones/totals ──────────────────────────────────────────

pub fn handle_totals_get(_query: &str) -> String {
    to_json(&with_store(|store| store.totals()))
}

// ── POST /api/cards/add ────────────────────────────────────────────

/// Body: zone={id}&category=neutral|monster
pub fn handle_card_add_post(body: &str) -> String {
    let params = parse_form_body(body);
    let zone_id = get_param(&params, "zone").unwrap_or("");
    let category = match parse_category(&params) {
        Ok(c) => c,
        Err(e) => return error_json(&e.to_string()),
    };
    let card = with_store_mut(|store| store.add_card(zone_id, category));
    if card.is_none() {
        debug!("add card ignored for unknown zone {}", zone_id);
    }
    to_json(&card)
}

// ── POST /api/cards/remove ─────────────────────────────────────────

/// Body: zone={id}&category=neutral|monster&card={card id}
pub fn handle_card_remove_post(body: &str) -> String {
    let params = parse_form_body(body);
    let zone_id = get_param(&params, "zone").unwrap_or("");
    let category = match parse_category(&params) {
        Ok(c) => c,
        Err(e) => return error_json(&e.to_string()),
    };
    let removed = match parse_card_id(&params) {
        Some(card_id) => with_store_mut(|store| store.remove_card(zone_id, category, card_id)),
        None => false,
    };
    json!({ "removed": removed }).to_string()
}

// ── POST /api/cards/kind ───────────────────────────────────────────

/// Body: zone={id}&category=neutral|monster&card={card id}&kind=none|normal|divine
/// Returns the zone total after the change.
pub fn handle_card_kind_post(body: &str) -> String {
    let params = parse_form_body(body);
    let zone_id = get_param(&params, "zone").unwrap_or("");
    let category = match parse_category(&params) {
        Ok(c) => c,
        Err(e) => return error_json(&e.to_string()),
    };
    let kind: CardKind = match get_param(&params, "kind").unwrap_or("").parse() {
        Ok(k) => k,
        Err(e) => return error_json(&e.to_string()),
    };
    with_store_mut(|store| {
        if let Some(card_id) = parse_card_id(&params) {
            store.set_card_kind(zone_id, category, card_id, kind);
        }
        to_json(&store.compute(zone_id))
    })
}
