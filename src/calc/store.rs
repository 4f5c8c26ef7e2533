//! Zone store — the single owner of the calculator state.
//!
//! Every mutation is synchronous and immediately visible to the next query.
//! Stale zone or card ids (a UI handler firing after its zone was deleted)
//! are no-ops rather than errors. Persistence is not triggered from here:
//! callers `serialize()` when they decide to persist.

use log::{debug, warn};

use crate::calc::model::{AppState, Card, CardCategory, CardKind, InputField, Language, Zone};
use crate::calc::valuation::{ZoneTotal, compute_zone_total};
use crate::error::StoreError;

/// Direction of a ± stepper press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Increment,
    Decrement,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneStore {
    state: AppState,
    /// Next card id to hand out. Never reset, so ids stay unique for the
    /// whole session even across `clear_all`.
    next_card_id: u64,
}

impl Default for ZoneStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ZoneStore {
    pub fn new() -> Self {
        Self {
            state: AppState::default(),
            next_card_id: 1,
        }
    }

    /// Wrap an existing state, repairing its counters so new ids cannot
    /// collide with ids already present. A state whose zone counter or card
    /// ids are already at `u64::MAX` has no fresh ids left and is rejected.
    pub fn from_state(mut state: AppState) -> Result<Self, StoreError> {
        let highest_zone = state.zones.iter().filter_map(Zone::sequence).max().unwrap_or(0);
        if state.zone_counter < highest_zone {
            debug!(
                "raising zoneCounter from {} to {}",
                state.zone_counter, highest_zone
            );
            state.zone_counter = highest_zone;
        }
        let highest_card = state
            .zones
            .iter()
            .flat_map(|z| z.neutral_cards.iter().chain(z.monster_cards.iter()))
            .map(|c| c.id)
            .max()
            .unwrap_or(0);
        if state.zone_counter == u64::MAX {
            return Err(StoreError::Decode("zoneCounter exhausted".to_string()));
        }
        let next_card_id = highest_card
            .checked_add(1)
            .ok_or_else(|| StoreError::Decode("card ids exhausted".to_string()))?;
        Ok(Self {
            state,
            next_card_id,
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn zones(&self) -> &[Zone] {
        &self.state.zones
    }

    pub fn zone(&self, zone_id: &str) -> Option<&Zone> {
        self.state.zones.iter().find(|z| z.id == zone_id)
    }

    fn zone_mut(&mut self, zone_id: &str) -> Option<&mut Zone> {
        self.state.zones.iter_mut().find(|z| z.id == zone_id)
    }

    // ── Zone lifecycle ─────────────────────────────────────────────

    /// Append a new empty zone with id `zone-{n}`. `None` once the counter
    /// cannot advance.
    pub fn create_zone(&mut self) -> Option<Zone> {
        let Some(counter) = self.state.zone_counter.checked_add(1) else {
            warn!("zone counter exhausted, zone not created");
            return None;
        };
        self.state.zone_counter = counter;
        let zone = Zone::new(format!("zone-{}", counter));
        debug!("created {}", zone.id);
        self.state.zones.push(zone.clone());
        Some(zone)
    }

    /// Remove a zone. Returns whether anything was removed.
    pub fn remove_zone(&mut self, zone_id: &str) -> bool {
        let before = self.state.zones.len();
        self.state.zones.retain(|z| z.id != zone_id);
        let removed = self.state.zones.len() != before;
        if removed {
            debug!("removed {}", zone_id);
        }
        removed
    }

    /// Drop every zone and restart zone numbering. Tier and language stay.
    pub fn clear_all(&mut self) {
        self.state.zones.clear();
        self.state.zone_counter = 0;
        debug!("cleared all zones");
    }

    /// Set or clear the zone's character. A blank name clears it.
    pub fn set_character(&mut self, zone_id: &str, name: Option<&str>) -> bool {
        let Some(zone) = self.zone_mut(zone_id) else {
            return false;
        };
        zone.character_name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        true
    }

    // ── Cards ──────────────────────────────────────────────────────

    /// Append a card with no epiphany. `None` if the zone is unknown or the
    /// card id counter cannot advance.
    pub fn add_card(&mut self, zone_id: &str, category: CardCategory) -> Option<Card> {
        let id = self.next_card_id;
        let next_id = id.checked_add(1)?;
        let zone = self.zone_mut(zone_id)?;
        let card = Card {
            id,
            kind: CardKind::None,
        };
        zone.cards_mut(category).push(card.clone());
        self.next_card_id = next_id;
        debug!("added {:?} card {} to {}", category, id, zone_id);
        Some(card)
    }

    /// Remove a card, keeping the order of the rest.
    pub fn remove_card(&mut self, zone_id: &str, category: CardCategory, card_id: u64) -> bool {
        let Some(zone) = self.zone_mut(zone_id) else {
            return false;
        };
        let cards = zone.cards_mut(category);
        match cards.iter().position(|c| c.id == card_id) {
            Some(idx) => {
                cards.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn set_card_kind(
        &mut self,
        zone_id: &str,
        category: CardCategory,
        card_id: u64,
        kind: CardKind,
    ) -> bool {
        let Some(zone) = self.zone_mut(zone_id) else {
            return false;
        };
        match zone.cards_mut(category).iter_mut().find(|c| c.id == card_id) {
            Some(card) => {
                card.kind = kind;
                true
            }
            None => false,
        }
    }

    // ── Inputs ─────────────────────────────────────────────────────

    /// Store a count for one of the four input fields.
    ///
    /// Negative values and values past `u32::MAX` are stored as 0. An
    /// unrecognized field name is rejected with `StoreError::UnknownField`
    /// even when the zone is unknown. `Ok(false)` means the zone was not found.
    pub fn set_input(&mut self, zone_id: &str, field: &str, value: i64) -> Result<bool, StoreError> {
        let field: InputField = field.parse()?;
        let count = u32::try_from(value).unwrap_or(0);
        let Some(zone) = self.zone_mut(zone_id) else {
            return Ok(false);
        };
        zone.inputs.set(field, count);
        debug!("{} {} = {}", zone_id, field, count);
        Ok(true)
    }

    /// Apply a ± stepper press. Decrement stops at 0.
    pub fn step_input(&mut self, zone_id: &str, field: &str, step: Step) -> Result<bool, StoreError> {
        let field: InputField = field.parse()?;
        let Some(zone) = self.zone_mut(zone_id) else {
            return Ok(false);
        };
        let current = zone.inputs.get(field);
        let next = match step {
            Step::Increment => current.saturating_add(1),
            Step::Decrement => current.saturating_sub(1),
        };
        zone.inputs.set(field, next);
        Ok(true)
    }

    // ── Settings ───────────────────────────────────────────────────

    pub fn tier(&self) -> i64 {
        self.state.tier
    }

    /// Store the tier as given. Out-of-range tiers are kept; the cap
    /// formula decides what they mean.
    pub fn set_tier(&mut self, tier: i64) {
        self.state.tier = tier;
    }

    pub fn language(&self) -> Language {
        self.state.language
    }

    pub fn set_language(&mut self, language: Language) {
        self.state.language = language;
    }

    // ── Valuation ──────────────────────────────────────────────────

    pub fn compute(&self, zone_id: &str) -> Option<ZoneTotal> {
        self.zone(zone_id)
            .map(|zone| compute_zone_total(zone, self.state.tier))
    }

    /// Totals for every zone, in display order.
    pub fn totals(&self) -> Vec<ZoneTotal> {
        self.state
            .zones
            .iter()
            .map(|zone| compute_zone_total(zone, self.state.tier))
            .collect()
    }

    // ── Persistence ────────────────────────────────────────────────

    pub fn serialize(&self) -> String {
        // AppState only holds strings, integers and enums, which always encode.
        serde_json::to_string(&self.state).unwrap_or_else(|_| "{}".to_string())
    }

    /// Replace the state with a persisted blob. Malformed or empty input
    /// loads the default state instead of failing.
    pub fn deserialize(&mut self, blob: &str) {
        if let Err(e) = self.try_deserialize(blob) {
            warn!("discarding persisted calculator state: {}", e);
            *self = ZoneStore::new();
        }
    }

    /// Strict variant of `deserialize`: on error the current state is kept.
    pub fn try_deserialize(&mut self, blob: &str) -> Result<(), StoreError> {
        if blob.trim().is_empty() {
            return Err(StoreError::Decode("empty state".to_string()));
        }
        let state: AppState = serde_json::from_str(blob)?;
        *self = ZoneStore::from_state(state)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::valuation::DEFAULT_TIER;

    #[test]
    fn create_zone_numbers_sequentially() {
        let mut store = ZoneStore::new();
        assert_eq!(store.create_zone().unwrap().id, "zone-1");
        assert_eq!(store.create_zone().unwrap().id, "zone-2");
        let zone = store.zone("zone-2").unwrap();
        assert!(zone.character_name.is_none());
        assert!(zone.neutral_cards.is_empty());
        assert_eq!(zone.inputs.removal, 0);
    }

    #[test]
    fn deleted_zone_ids_are_not_reused() {
        let mut store = ZoneStore::new();
        store.create_zone().unwrap();
        let second = store.create_zone().unwrap();
        assert!(store.remove_zone(&second.id));
        assert_eq!(store.create_zone().unwrap().id, "zone-3");
    }

    #[test]
    fn create_then_remove_restores_zones() {
        let mut store = ZoneStore::new();
        store.create_zone().unwrap();
        store.add_card("zone-1", CardCategory::Monster);
        let before = store.zones().to_vec();

        let zone = store.create_zone().unwrap();
        assert!(store.remove_zone(&zone.id));
        assert_eq!(store.zones(), before.as_slice());
    }

    #[test]
    fn remove_unknown_zone_is_noop() {
        let mut store = ZoneStore::new();
        store.create_zone().unwrap();
        assert!(!store.remove_zone("zone-9"));
        assert_eq!(store.zones().len(), 1);
    }

    #[test]
    fn clear_all_resets_counter_keeps_settings() {
        let mut store = ZoneStore::new();
        store.set_tier(4);
        store.set_language(Language::En);
        for _ in 0..3 {
            store.create_zone().unwrap();
        }
        store.clear_all();
        assert!(store.zones().is_empty());
        assert_eq!(store.state().zone_counter, 0);
        assert_eq!(store.tier(), 4);
        assert_eq!(store.language(), Language::En);
        assert_eq!(store.create_zone().unwrap().id, "zone-1");
    }

    #[test]
    fn character_set_and_cleared() {
        let mut store = ZoneStore::new();
        let zone = store.create_zone().unwrap();
        assert!(store.set_character(&zone.id, Some("Mei Lin")));
        assert_eq!(store.zone(&zone.id).unwrap().character_name.as_deref(), Some("Mei Lin"));
        assert!(store.set_character(&zone.id, Some("  ")));
        assert!(store.zone(&zone.id).unwrap().character_name.is_none());
        assert!(store.set_character(&zone.id, Some("Rei")));
        assert!(store.set_character(&zone.id, None));
        assert!(store.zone(&zone.id).unwrap().character_name.is_none());
        assert!(!store.set_character("zone-404", Some("Rei")));
    }

    #[test]
    fn cards_keep_insertion_order() {
        let mut store = ZoneStore::new();
        let zone = store.create_zone().unwrap();
        let a = store.add_card(&zone.id, CardCategory::Neutral).unwrap();
        let b = store.add_card(&zone.id, CardCategory::Neutral).unwrap();
        let c = store.add_card(&zone.id, CardCategory::Neutral).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.kind, CardKind::None);

        assert!(store.remove_card(&zone.id, CardCategory::Neutral, b.id));
        let ids: Vec<u64> = store.zone(&zone.id).unwrap().neutral_cards.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![a.id, c.id]);
    }

    #[test]
    fn remove_card_twice_is_safe() {
        let mut store = ZoneStore::new();
        let zone = store.create_zone().unwrap();
        let card = store.add_card(&zone.id, CardCategory::Monster).unwrap();
        assert!(store.remove_card(&zone.id, CardCategory::Monster, card.id));
        assert!(!store.remove_card(&zone.id, CardCategory::Monster, card.id));
        assert!(store.zone(&zone.id).unwrap().monster_cards.is_empty());
    }

    #[test]
    fn card_lookup_respects_category() {
        let mut store = ZoneStore::new();
        let zone = store.create_zone().unwrap();
        let card = store.add_card(&zone.id, CardCategory::Neutral).unwrap();
        assert!(!store.remove_card(&zone.id, CardCategory::Monster, card.id));
        assert!(!store.set_card_kind(&zone.id, CardCategory::Monster, card.id, CardKind::DivineEpiphany));
        assert_eq!(store.zone(&zone.id).unwrap().neutral_cards.len(), 1);
    }

    #[test]
    fn add_card_to_unknown_zone() {
        let mut store = ZoneStore::new();
        assert!(store.add_card("zone-1", CardCategory::Neutral).is_none());
    }

    #[test]
    fn card_ids_unique_across_zones_and_clear() {
        let mut store = ZoneStore::new();
        let z1 = store.create_zone().unwrap();
        let z2 = store.create_zone().unwrap();
        let a = store.add_card(&z1.id, CardCategory::Neutral).unwrap();
        let b = store.add_card(&z2.id, CardCategory::Neutral).unwrap();
        store.clear_all();
        let z = store.create_zone().unwrap();
        let c = store.add_card(&z.id, CardCategory::Neutral).unwrap();
        assert!(a.id != b.id && b.id != c.id && a.id != c.id);
    }

    #[test]
    fn set_card_kind_updates_in_place() {
        let mut store = ZoneStore::new();
        let zone = store.create_zone().unwrap();
        let card = store.add_card(&zone.id, CardCategory::Monster).unwrap();
        assert!(store.set_card_kind(&zone.id, CardCategory::Monster, card.id, CardKind::NormalEpiphany));
        assert_eq!(store.compute(&zone.id).unwrap().monster_total, 90);
        assert!(!store.set_card_kind(&zone.id, CardCategory::Monster, 999, CardKind::DivineEpiphany));
    }

    #[test]
    fn set_input_normalizes_values() {
        let mut store = ZoneStore::new();
        let zone = store.create_zone().unwrap();
        assert_eq!(store.set_input(&zone.id, "removal", 3), Ok(true));
        assert_eq!(store.zone(&zone.id).unwrap().inputs.removal, 3);
        store.set_input(&zone.id, "removal", -5).unwrap();
        assert_eq!(store.zone(&zone.id).unwrap().inputs.removal, 0);
        store.set_input(&zone.id, "conversion", i64::from(u32::MAX) + 1).unwrap();
        assert_eq!(store.zone(&zone.id).unwrap().inputs.conversion, 0);
    }

    #[test]
    fn set_input_rejects_unknown_field() {
        let mut store = ZoneStore::new();
        let zone = store.create_zone().unwrap();
        assert_eq!(
            store.set_input(&zone.id, "removals", 1),
            Err(StoreError::UnknownField("removals".to_string()))
        );
        assert!(store.set_input("zone-404", "bogus", 1).is_err());
        assert_eq!(store.set_input("zone-404", "removal", 1), Ok(false));
    }

    #[test]
    fn input_change_visible_to_next_valuation() {
        let mut store = ZoneStore::new();
        let zone = store.create_zone().unwrap();
        store.set_input(&zone.id, "duplication", 2).unwrap();
        assert_eq!(store.compute(&zone.id).unwrap().duplication_value, 10);
        store.set_input(&zone.id, "duplication", 4).unwrap();
        assert_eq!(store.compute(&zone.id).unwrap().duplication_value, 90);
    }

    #[test]
    fn stepper_stops_at_zero() {
        let mut store = ZoneStore::new();
        let zone = store.create_zone().unwrap();
        store.step_input(&zone.id, "removal_base", Step::Increment).unwrap();
        store.step_input(&zone.id, "removal_base", Step::Increment).unwrap();
        assert_eq!(store.zone(&zone.id).unwrap().inputs.removal_base, 2);
        for _ in 0..3 {
            store.step_input(&zone.id, "removal_base", Step::Decrement).unwrap();
        }
        assert_eq!(store.zone(&zone.id).unwrap().inputs.removal_base, 0);
    }

    #[test]
    fn totals_follow_tier() {
        let mut store = ZoneStore::new();
        store.create_zone().unwrap();
        store.create_zone().unwrap();
        store.set_tier(2);
        let totals = store.totals();
        assert_eq!(totals.len(), 2);
        assert!(totals.iter().all(|t| t.cap == 40));
        assert_eq!(totals[1].zone_id, "zone-2");
    }

    #[test]
    fn serialize_roundtrip() {
        let mut store = ZoneStore::new();
        let z1 = store.create_zone().unwrap();
        store.create_zone().unwrap();
        store.set_character(&z1.id, Some("Haru"));
        let card = store.add_card(&z1.id, CardCategory::Neutral).unwrap();
        store.set_card_kind(&z1.id, CardCategory::Neutral, card.id, CardKind::DivineEpiphany);
        store.add_card(&z1.id, CardCategory::Monster);
        store.set_input(&z1.id, "removal", 4).unwrap();
        store.set_input(&z1.id, "removal_base", 1).unwrap();
        store.set_tier(9);
        store.set_language(Language::En);

        let blob = store.serialize();
        let mut restored = ZoneStore::new();
        restored.deserialize(&blob);
        assert_eq!(restored.state(), store.state());
        assert_eq!(restored, store);
    }

    #[test]
    fn empty_state_roundtrip() {
        let store = ZoneStore::new();
        let mut restored = ZoneStore::new();
        restored.create_zone().unwrap();
        restored.deserialize(&store.serialize());
        assert_eq!(restored.state(), store.state());
    }

    #[test]
    fn malformed_blob_falls_back_to_default() {
        let mut store = ZoneStore::new();
        store.create_zone().unwrap();
        store.set_tier(3);
        store.deserialize("not valid json {{{");
        assert!(store.zones().is_empty());
        assert_eq!(store.state().zone_counter, 0);
        assert_eq!(store.tier(), DEFAULT_TIER);
        assert_eq!(store.language(), Language::Th);

        store.create_zone().unwrap();
        store.deserialize("");
        assert_eq!(store.state(), &AppState::default());

        store.deserialize(r#"{"zones": 5}"#);
        assert_eq!(store.state(), &AppState::default());
    }

    #[test]
    fn both_language_keys_load_default_state() {
        let mut store = ZoneStore::new();
        store.create_zone().unwrap();
        store.deserialize(r#"{"zones":[{"id":"zone-1"}],"zoneCounter":1,"language":"en","lang":"en"}"#);
        assert_eq!(store.state(), &AppState::default());
    }

    #[test]
    fn exhausted_card_ids_reject_blob() {
        let blob = r#"{"zones":[{"id":"zone-1","neutralCards":[{"id":18446744073709551615,"kind":"none"}]}],"zoneCounter":1}"#;
        let mut store = ZoneStore::new();
        assert!(matches!(store.try_deserialize(blob), Err(StoreError::Decode(_))));

        store.deserialize(blob);
        assert_eq!(store.state(), &AppState::default());
        let zone = store.create_zone().unwrap();
        assert_eq!(store.add_card(&zone.id, CardCategory::Neutral).unwrap().id, 1);
    }

    #[test]
    fn exhausted_zone_counter_rejects_blob() {
        let mut store = ZoneStore::new();
        store.deserialize(r#"{"zoneCounter":18446744073709551615}"#);
        assert_eq!(store.state().zone_counter, 0);
        assert_eq!(store.create_zone().unwrap().id, "zone-1");

        store.deserialize(r#"{"zones":[{"id":"zone-18446744073709551615"}],"zoneCounter":1}"#);
        assert_eq!(store.state(), &AppState::default());
    }

    #[test]
    fn counters_at_last_id_stop_without_reuse() {
        let mut store = ZoneStore::new();
        store
            .try_deserialize(
                r#"{"zones":[{"id":"zone-1","neutralCards":[{"id":18446744073709551614,"kind":"none"}]}],"zoneCounter":18446744073709551614}"#,
            )
            .unwrap();

        let last = store.create_zone().unwrap();
        assert_eq!(last.id, "zone-18446744073709551615");
        assert!(store.create_zone().is_none());
        assert_eq!(store.zones().len(), 2);

        let card = store.add_card("zone-1", CardCategory::Monster);
        assert!(card.is_none());
        assert!(store.zone("zone-1").unwrap().monster_cards.is_empty());
    }

    #[test]
    fn try_deserialize_keeps_state_on_error() {
        let mut store = ZoneStore::new();
        store.create_zone().unwrap();
        assert!(matches!(store.try_deserialize("[1,2"), Err(StoreError::Decode(_))));
        assert_eq!(store.zones().len(), 1);
    }

    #[test]
    fn load_repairs_counters() {
        let mut store = ZoneStore::new();
        store.deserialize(
            r#"{"zones":[{"id":"zone-7","neutralCards":[{"id":1731571200000,"kind":"none"}]}],"zoneCounter":2}"#,
        );
        assert_eq!(store.state().zone_counter, 7);
        assert_eq!(store.create_zone().unwrap().id, "zone-8");
        let card = store.add_card("zone-8", CardCategory::Neutral).unwrap();
        assert_eq!(card.id, 1731571200001);
    }
}
