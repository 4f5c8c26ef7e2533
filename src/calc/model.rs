//! Calculator data model and its persisted JSON encoding.
//!
//! ```text
//! AppState
//! ├── zones: [Zone]            — display order
//! │   ├── id: "zone-N"
//! │   ├── characterName: String | null
//! │   ├── neutralCards: [Card]  — "Card N" order
//! │   ├── monsterCards: [Card]
//! │   └── inputs: { conversion, removal, removal_base, duplication }
//! ├── zoneCounter: last issued N
//! ├── tier: i64
//! └── language: "th" | "en"
//! ```
//!
//! Blobs written by the older JavaScript calculator used `character`, `type`
//! and `lang` as key names and stored the tier as a string; those are
//! accepted on load and written back in the current shape.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::calc::valuation::{DEFAULT_TIER, parse_tier};
use crate::error::StoreError;

/// localStorage key the JS side persists the state under.
pub const STORAGE_KEY: &str = "cznCalculatorState";

/// Upgrade applied to a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CardKind {
    #[default]
    #[serde(rename = "none")]
    None,
    #[serde(rename = "normal")]
    NormalEpiphany,
    #[serde(rename = "divine")]
    DivineEpiphany,
}

impl CardKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CardKind::None => "none",
            CardKind::NormalEpiphany => "normal",
            CardKind::DivineEpiphany => "divine",
        }
    }
}

impl FromStr for CardKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(CardKind::None),
            "normal" => Ok(CardKind::NormalEpiphany),
            "divine" => Ok(CardKind::DivineEpiphany),
            other => Err(StoreError::UnknownKind(other.to_string())),
        }
    }
}

/// Which of a zone's two card lists a card lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardCategory {
    Neutral,
    Monster,
}

impl FromStr for CardCategory {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "neutral" => Ok(CardCategory::Neutral),
            "monster" => Ok(CardCategory::Monster),
            other => Err(StoreError::UnknownCategory(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: u64,
    #[serde(alias = "type", default)]
    pub kind: CardKind,
}

/// Per-zone action counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Inputs {
    pub conversion: u32,
    pub removal: u32,
    pub removal_base: u32,
    pub duplication: u32,
}

impl Inputs {
    pub fn get(&self, field: InputField) -> u32 {
        match field {
            InputField::Conversion => self.conversion,
            InputField::Removal => self.removal,
            InputField::RemovalBase => self.removal_base,
            InputField::Duplication => self.duplication,
        }
    }

    pub fn set(&mut self, field: InputField, value: u32) {
        let slot = match field {
            InputField::Conversion => &mut self.conversion,
            InputField::Removal => &mut self.removal,
            InputField::RemovalBase => &mut self.removal_base,
            InputField::Duplication => &mut self.duplication,
        };
        *slot = value;
    }
}

/// The four recognized input field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    Conversion,
    Removal,
    RemovalBase,
    Duplication,
}

impl FromStr for InputField {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "conversion" => Ok(InputField::Conversion),
            "removal" => Ok(InputField::Removal),
            "removal_base" => Ok(InputField::RemovalBase),
            "duplication" => Ok(InputField::Duplication),
            other => Err(StoreError::UnknownField(other.to_string())),
        }
    }
}

impl fmt::Display for InputField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InputField::Conversion => "conversion",
            InputField::Removal => "removal",
            InputField::RemovalBase => "removal_base",
            InputField::Duplication => "duplication",
        };
        f.write_str(name)
    }
}

/// One character loadout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub id: String,
    #[serde(alias = "character", default)]
    pub character_name: Option<String>,
    #[serde(default)]
    pub neutral_cards: Vec<Card>,
    #[serde(default)]
    pub monster_cards: Vec<Card>,
    #[serde(default)]
    pub inputs: Inputs,
}

impl Zone {
    pub fn new(id: String) -> Self {
        Self {
            id,
            character_name: None,
            neutral_cards: Vec::new(),
            monster_cards: Vec::new(),
            inputs: Inputs::default(),
        }
    }

    pub fn cards(&self, category: CardCategory) -> &[Card] {
        match category {
            CardCategory::Neutral => &self.neutral_cards,
            CardCategory::Monster => &self.monster_cards,
        }
    }

    pub fn cards_mut(&mut self, category: CardCategory) -> &mut Vec<Card> {
        match category {
            CardCategory::Neutral => &mut self.neutral_cards,
            CardCategory::Monster => &mut self.monster_cards,
        }
    }

    /// Numeric suffix of a `zone-N` id, if it has one.
    pub fn sequence(&self) -> Option<u64> {
        self.id.strip_prefix("zone-")?.parse().ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Th,
    En,
}

impl Language {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "th" => Some(Language::Th),
            "en" => Some(Language::En),
            _ => None,
        }
    }
}

/// Persisted root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppState {
    pub zones: Vec<Zone>,
    pub zone_counter: u64,
    #[serde(deserialize_with = "deserialize_tier")]
    pub tier: i64,
    /// Older blobs call this `lang`. A blob carrying both `lang` and
    /// `language` is a duplicate-field error and loads as the default state.
    #[serde(alias = "lang")]
    pub language: Language,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            zones: Vec::new(),
            zone_counter: 0,
            tier: DEFAULT_TIER,
            language: Language::Th,
        }
    }
}

/// Accepts an integer or a numeric string; anything else loads as the default tier.
fn deserialize_tier<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let tier = match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        serde_json::Value::String(s) => parse_tier(&s),
        _ => None,
    };
    Ok(tier.unwrap_or(DEFAULT_TIER))
}
