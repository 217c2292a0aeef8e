//! Static attribute tables.
//!
//! Attribute ids come from the game catalog; names are the English labels the
//! optimizer reports in breakdowns. Classification into basic and special
//! attributes is by name and decides which power table a tier is looked up in.

use serde::{Deserialize, Serialize};

use crate::errors::OptResult;

/// Numeric attribute identifier as carried by a module part.
pub type AttrId = i32;

/// Which tier power table an attribute uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeKind {
    Basic,
    Special,
}

impl AttributeKind {
    /// Classify an attribute by its name. Anything not in the special list is basic.
    pub fn of_name(name: &str) -> Self {
        if SPECIAL_ATTRIBUTE_NAMES.contains(&name) {
            Self::Special
        } else {
            Self::Basic
        }
    }
}

/// Known attribute ids and their labels.
pub const KNOWN_ATTRIBUTES: &[(AttrId, &str)] = &[
    (1110, "Strength Boost"),
    (1111, "Agility Boost"),
    (1112, "Intelligence Boost"),
    (1113, "Special Attack Damage"),
    (1114, "Elite Strike"),
    (1205, "Special Healing Boost"),
    (1206, "Expert Healing Boost"),
    (1307, "Magic Resistance"),
    (1308, "Physical Resistance"),
    (1407, "Casting Focus"),
    (1408, "Attack Speed Focus"),
    (1409, "Critical Focus"),
    (1410, "Luck Focus"),
];

/// Attribute names scored with the special power table.
pub const SPECIAL_ATTRIBUTE_NAMES: &[&str] = &[
    "Extreme Damage Stack",
    "Extreme Agility",
    "Extreme Life Condense",
    "Extreme First Aid",
    "Extreme Life Wave",
    "Extreme Life Drain",
    "Extreme Team Crit",
    "Extreme Desperate Guard",
];

/// Label for a known attribute id.
pub fn attribute_name(id: AttrId) -> Option<&'static str> {
    KNOWN_ATTRIBUTES
        .iter()
        .find(|(known, _)| *known == id)
        .map(|(_, name)| *name)
}

/// Reverse lookup, case-insensitive.
pub fn attribute_id(name: &str) -> Option<AttrId> {
    KNOWN_ATTRIBUTES
        .iter()
        .find(|(_, known)| known.eq_ignore_ascii_case(name.trim()))
        .map(|(id, _)| *id)
}

/// Parse a comma-separated list of attribute ids or known names.
///
/// Blank entries are skipped; an empty string yields an empty list.
pub fn parse_attribute_list(raw: &str) -> OptResult<Vec<AttrId>> {
    let mut ids = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let id = match entry.parse::<AttrId>() {
            Ok(id) => id,
            Err(_) => attribute_id(entry)
                .ok_or_else(|| crate::validation_error!("unknown attribute: {}", entry))?,
        };
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}
