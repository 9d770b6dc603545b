//! The seven-plate Earth scene
//!
//! Static data for the major tectonic plates and the shells that replace
//! them once assembled.

use crate::error::Result;
use crate::math::Vec3;
use crate::registry::{EntityDef, EntityKind, EntityMeta, EntityRegistry};

/// Catalog entry for one tectonic plate
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlateInfo {
    pub id: &'static str,
    pub name: &'static str,
    /// Vietnamese caption shown in the legend
    pub label: &'static str,
    /// Swatch colour for legends
    pub color: &'static str,
    /// Offset from the assembled globe while separated
    pub dispersed: Vec3,
}

pub const PLATES: [PlateInfo; 7] = [
    PlateInfo {
        id: "pacific",
        name: "Pacific",
        label: "Thái Bình Dương",
        color: "#3498db",
        dispersed: Vec3::new(-6.0, 0.0, -2.0),
    },
    PlateInfo {
        id: "north-american",
        name: "North American",
        label: "Bắc Mỹ",
        color: "#e74c3c",
        dispersed: Vec3::new(-4.0, 3.0, 2.0),
    },
    PlateInfo {
        id: "south-american",
        name: "South American",
        label: "Nam Mỹ",
        color: "#2ecc71",
        dispersed: Vec3::new(-3.0, -4.0, 1.0),
    },
    PlateInfo {
        id: "african",
        name: "African",
        label: "Phi",
        color: "#f39c12",
        dispersed: Vec3::new(2.0, -2.0, 3.0),
    },
    PlateInfo {
        id: "eurasian",
        name: "Eurasian",
        label: "Âu-Á",
        color: "#9b59b6",
        dispersed: Vec3::new(3.0, 4.0, -2.0),
    },
    PlateInfo {
        id: "indo-australian",
        name: "Indo-Australian",
        label: "Ấn Độ-Úc",
        color: "#1abc9c",
        dispersed: Vec3::new(4.0, -3.0, -3.0),
    },
    PlateInfo {
        id: "antarctic",
        name: "Antarctic",
        label: "Nam Cực",
        color: "#ecf0f1",
        dispersed: Vec3::new(0.0, -5.0, 0.0),
    },
];

pub const GLOBE_ID: &str = "earth";
pub const ATMOSPHERE_ID: &str = "atmosphere";
pub const CLOUDS_ID: &str = "clouds";

impl PlateInfo {
    pub fn meta(&self) -> EntityMeta {
        EntityMeta {
            name: Some(self.name.to_string()),
            label: Some(self.label.to_string()),
            color: Some(self.color.to_string()),
        }
    }

    pub fn to_def(&self) -> EntityDef {
        EntityDef::plate(self.id, Vec3::ZERO, self.dispersed).with_meta(self.meta())
    }
}

/// Globe, atmosphere and cloud shells
pub fn shell_defs() -> [EntityDef; 3] {
    [
        EntityDef::shell(GLOBE_ID, EntityKind::Globe),
        EntityDef::shell(ATMOSPHERE_ID, EntityKind::Atmosphere),
        EntityDef::shell(CLOUDS_ID, EntityKind::Clouds),
    ]
}

/// Registry with all seven plates followed by the three shells
pub fn default_registry() -> Result<EntityRegistry> {
    EntityRegistry::from_defs(PLATES.iter().map(PlateInfo::to_def).chain(shell_defs()))
}
