//! CZN save-data value calculator, in-browser WASM core.
//!
//! Exports `handle_request(method, path, query, body)` for the Web Worker
//! bridge to call. Uses `matchit` for URL routing. The page keeps rendering,
//! translations and drag-and-drop; this module owns the zone/card state and
//! the point valuation, and answers every request with JSON.

use wasm_bindgen::prelude::*;

pub mod calc;
pub mod error;
pub mod routes;

pub use calc::model::STORAGE_KEY;

/// Process an HTTP-like request and return a JSON body.
///
/// Called from JavaScript (Web Worker) via wasm-bindgen.
///
/// # Arguments
/// * `method` — HTTP method ("GET" or "POST")
/// * `path`   — URL path (e.g., "/api/zones/total")
/// * `query`  — Query string (e.g., "?zone=zone-1")
/// * `body`   — Request body (form data or a state blob). Empty for GET.
#[wasm_bindgen]
pub fn handle_request(method: &str, path: &str, query: &str, body: &str) -> String {
    let mut router = matchit::Router::new();

    router.insert("/api/state", "state").ok();
    router.insert("/api/state/persist", "state_persist").ok();
    router.insert("/api/state/restore", "state_restore").ok();
    router.insert("/api/state/import", "state_import").ok();
    router.insert("/api/settings/tier", "settings_tier").ok();
    router.insert("/api/settings/lang", "settings_lang").ok();

    router.insert("/api/zones/create", "zone_create").ok();
    router.insert("/api/zones/remove", "zone_remove").ok();
    router.insert("/api/zones/clear", "zone_clear").ok();
    router.insert("/api/zones/character", "zone_character").ok();
    router.insert("/api/zones/input", "zone_input").ok();
    router.insert("/api/zones/total", "zone_total").ok();
    router.insert("/api/zones/totals", "zone_totals").ok();

    router.insert("/api/cards/add", "card_add").ok();
    router.insert("/api/cards/remove", "card_remove").ok();
    router.insert("/api/cards/kind", "card_kind").ok();

    match router.at(path) {
        Ok(matched) => match (*matched.value, method) {
            ("state", "GET") => routes::state::handle_state_get(query),
            ("state_persist", "POST") => routes::state::handle_persist_post(body),
            ("state_restore", "POST") => routes::state::handle_restore_post(body),
            ("state_import", "POST") => routes::state::handle_import_post(body),
            ("settings_tier", "POST") => routes::state::handle_tier_post(body),
            ("settings_lang", "POST") => routes::state::handle_lang_post(body),

            ("zone_create", "POST") => routes::zones::handle_create_post(body),
            ("zone_remove", "POST") => routes::zones::handle_remove_post(body),
            ("zone_clear", "POST") => routes::zones::handle_clear_post(body),
            ("zone_character", "POST") => routes::zones::handle_character_post(body),
            ("zone_input", "POST") => routes::zones::handle_input_post(body),
            ("zone_total", "GET") => routes::zones::handle_total_get(query),
            ("zone_totals", "GET") => routes::zones::handle_totals_get(query),

            ("card_add", "POST") => routes::zones::handle_card_add_post(body),
            ("card_remove", "POST") => routes::zones::handle_card_remove_post(body),
            ("card_kind", "POST") => routes::zones::handle_card_kind_post(body),

            _ => method_not_allowed(),
        },
        Err(_) => not_found(),
    }
}

fn not_found() -> String {
    routes::util::error_json("404 — route not found")
}

fn method_not_allowed() -> String {
    routes::util::error_json("405 — method not allowed")
}
