use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::attributes::AttrId;
use crate::errors::OptError;

/// Stable identity of a module across runs.
///
/// Every set, map and deduplication step keys on this value, never on the
/// structural contents of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(pub u64);

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single attribute part carried by a module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributePart {
    pub id: AttrId,
    pub name: String,
    pub value: i32,
}

impl AttributePart {
    pub fn new(id: AttrId, name: impl Into<String>, value: i32) -> Self {
        Self {
            id,
            name: name.into(),
            value,
        }
    }
}

/// Module category used to filter the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Attack,
    Guardian,
    Support,
    /// No filter
    All,
}

impl Category {
    /// Resolve a module config id to its category. Unmapped ids are Attack.
    pub fn from_config_id(config_id: i32) -> Self {
        MODULE_KINDS
            .iter()
            .find(|kind| kind.config_id == config_id)
            .map(|kind| kind.category)
            .unwrap_or(Category::Attack)
    }

    /// Whether a module of category `other` passes this filter.
    pub fn admits(&self, other: Category) -> bool {
        *self == Category::All || *self == other
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Attack => "Attack",
            Self::Guardian => "Guardian",
            Self::Support => "Support",
            Self::All => "All",
        };
        f.write_str(label)
    }
}

impl FromStr for Category {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "attack" => Ok(Self::Attack),
            "guardian" => Ok(Self::Guardian),
            "support" => Ok(Self::Support),
            "all" | "" => Ok(Self::All),
            other => Err(crate::validation_error!("unknown module category: {}", other)),
        }
    }
}

/// Static description of a module kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleKind {
    pub config_id: i32,
    pub name: &'static str,
    pub category: Category,
}

pub const MODULE_KINDS: &[ModuleKind] = &[
    ModuleKind { config_id: 5500101, name: "Basic Attack", category: Category::Attack },
    ModuleKind { config_id: 5500102, name: "High-Performance Attack", category: Category::Attack },
    ModuleKind { config_id: 5500201, name: "Basic Healing", category: Category::Support },
    ModuleKind { config_id: 5500202, name: "High-Performance Healing", category: Category::Support },
    ModuleKind { config_id: 5500301, name: "Basic Protection", category: Category::Guardian },
    ModuleKind { config_id: 5500302, name: "High-Performance Protection", category: Category::Guardian },
];

/// Display name for a module config id.
pub fn module_kind_name(config_id: i32) -> Option<&'static str> {
    MODULE_KINDS
        .iter()
        .find(|kind| kind.config_id == config_id)
        .map(|kind| kind.name)
}

/// Catalog record as produced by the capture layer.
#[derive(Debug, Clone, Deserialize)]
struct ModuleRecord {
    name: String,
    config_id: i32,
    id: ModuleId,
    #[serde(default)]
    quality: i32,
    #[serde(default)]
    parts: Vec<AttributePart>,
}

impl From<ModuleRecord> for Module {
    fn from(record: ModuleRecord) -> Self {
        Module::new(record.name, record.config_id, record.id, record.quality, record.parts)
    }
}

/// An equippable module. Category is resolved once at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ModuleRecord")]
pub struct Module {
    pub name: String,
    pub config_id: i32,
    pub id: ModuleId,
    pub quality: i32,
    pub parts: Vec<AttributePart>,
    pub category: Category,
}

impl Module {
    pub fn new(
        name: impl Into<String>,
        config_id: i32,
        id: ModuleId,
        quality: i32,
        parts: Vec<AttributePart>,
    ) -> Self {
        Self {
            name: name.into(),
            config_id,
            id,
            quality,
            parts,
            category: Category::from_config_id(config_id),
        }
    }

    /// Sum of every part value on this module.
    pub fn total_value(&self) -> i32 {
        self.parts.iter().map(|p| p.value).sum()
    }

    /// Summed value of parts with the given attribute id.
    pub fn value_of(&self, attr: AttrId) -> i32 {
        self.parts
            .iter()
            .filter(|p| p.id == attr)
            .map(|p| p.value)
            .sum()
    }

    /// Summed value of parts with the given attribute name.
    pub fn value_named(&self, name: &str) -> i32 {
        self.parts
            .iter()
            .filter(|p| p.name == name)
            .map(|p| p.value)
            .sum()
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (quality {}) - ", self.name, self.quality)?;
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}+{}", part.name, part.value)?;
        }
        Ok(())
    }
}
