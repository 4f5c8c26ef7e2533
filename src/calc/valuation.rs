//! Point valuation for a zone.
//!
//! Pure functions: a zone snapshot and the global tier go in, a `ZoneTotal`
//! comes out. Counts reaching this module are already normalized to
//! non-negative integers by the store.

use serde::Serialize;

use crate::calc::model::{Card, CardCategory, CardKind, Zone};

pub const NEUTRAL_BASE_COST: u64 = 20;
pub const MONSTER_BASE_COST: u64 = 80;
pub const NORMAL_EPIPHANY_BONUS: u64 = 10;
pub const DIVINE_EPIPHANY_BONUS: u64 = 20;
pub const CONVERSION_COST: u64 = 10;
/// Extra penalty per removed base/starting card.
pub const BASE_REMOVAL_PENALTY: u64 = 20;

pub const DEFAULT_TIER: i64 = 13;
/// Cap used when the tier is unparseable or below 1.
pub const DEFAULT_MEMORY_CAP: u64 = 30;
const CAP_BASE: u64 = 20;
const CAP_PER_TIER: u64 = 10;

fn epiphany_bonus(kind: CardKind) -> u64 {
    match kind {
        CardKind::None => 0,
        CardKind::NormalEpiphany => NORMAL_EPIPHANY_BONUS,
        CardKind::DivineEpiphany => DIVINE_EPIPHANY_BONUS,
    }
}

/// Value of a card list: `base_cost` per card plus each card's epiphany bonus.
pub fn card_collection_value(cards: &[Card], base_cost: u64) -> u64 {
    cards
        .iter()
        .map(|card| base_cost.saturating_add(epiphany_bonus(card.kind)))
        .fold(0, u64::saturating_add)
}

/// Cost of `count` removals (or duplications).
///
/// The first action is free, the second costs 10, and the i-th action
/// (i >= 3) costs `10 + (i - 2) * 20`. Summed step by step.
pub fn progressive_action_value(count: u32) -> u64 {
    if count <= 1 {
        return 0;
    }
    let mut total: u64 = 10;
    for i in 3..=u64::from(count) {
        total = total.saturating_add(10 + (i - 2) * 20);
    }
    total
}

/// Memory cap for a tier. No upper clamp: tiers above 13 keep growing.
pub fn memory_cap(tier: i64) -> u64 {
    if tier < 1 {
        return DEFAULT_MEMORY_CAP;
    }
    (tier as u64)
        .saturating_mul(CAP_PER_TIER)
        .saturating_add(CAP_BASE)
}

/// Memory cap for a raw form value such as `"7"` or `"abc"`.
pub fn memory_cap_from_str(raw: &str) -> u64 {
    parse_tier(raw).map_or(DEFAULT_MEMORY_CAP, memory_cap)
}

/// Parse a tier the way a lenient form field does: `" 7 "`, `"7th"` and
/// `"+7"` all read as 7. `None` if no leading integer is present.
pub fn parse_tier(raw: &str) -> Option<i64> {
    parse_leading_int(raw)
}

/// Leading optional sign and digits, ignoring surrounding whitespace and
/// anything after the digits. `None` on no digits or i64 overflow.
pub(crate) fn parse_leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let mut value: i64 = 0;
    for b in digits[..end].bytes() {
        value = value.checked_mul(10)?.checked_add(i64::from(b - b'0'))?;
    }
    Some(if negative { -value } else { value })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CapacityStatus {
    Safe,
    Warning,
}

/// Breakdown of a zone's value against the tier cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneTotal {
    pub zone_id: String,
    pub neutral_total: u64,
    pub monster_total: u64,
    pub conversion_value: u64,
    pub removal_value: u64,
    pub duplication_value: u64,
    pub removal_penalty: u64,
    pub total: u64,
    pub cap: u64,
    pub is_over_capacity: bool,
    pub status: CapacityStatus,
}

pub fn compute_zone_total(zone: &Zone, tier: i64) -> ZoneTotal {
    let inputs = &zone.inputs;
    let neutral_total = card_collection_value(zone.cards(CardCategory::Neutral), NEUTRAL_BASE_COST);
    let monster_total = card_collection_value(zone.cards(CardCategory::Monster), MONSTER_BASE_COST);
    let conversion_value = u64::from(inputs.conversion) * CONVERSION_COST;
    let removal_value = progressive_action_value(inputs.removal);
    let duplication_value = progressive_action_value(inputs.duplication);
    let removal_penalty = u64::from(inputs.removal_base) * BASE_REMOVAL_PENALTY;

    let total = [
        neutral_total,
        monster_total,
        conversion_value,
        removal_value,
        duplication_value,
        removal_penalty,
    ]
    .into_iter()
    .fold(0, u64::saturating_add);
    let cap = memory_cap(tier);
    let is_over_capacity = total > cap;

    ZoneTotal {
        zone_id: zone.id.clone(),
        neutral_total,
        monster_total,
        conversion_value,
        removal_value,
        duplication_value,
        removal_penalty,
        total,
        cap,
        is_over_capacity,
        status: if is_over_capacity {
            CapacityStatus::Warning
        } else {
            CapacityStatus::Safe
        },
    }
}
