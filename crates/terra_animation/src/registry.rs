//! Entity registry
//!
//! A plain data table of everything the timeline animates. The interpolation
//! policy is the only writer; renderers read positions, opacity and
//! visibility after each tick.

use std::borrow::Borrow;
use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

use crate::error::{Result, TimelineError};
use crate::math::Vec3;

new_key_type! {
    /// Handle to a registered entity
    pub struct EntityKey;
}

/// Stable, user-facing identifier of an entity
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// What an entity is in the scene
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Plate,
    Globe,
    Atmosphere,
    Clouds,
}

/// Which pieces of render state the policy may drive for a kind
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    pub positionable: bool,
    pub fadeable: bool,
    pub toggleable: bool,
}

impl EntityKind {
    pub const fn capabilities(self) -> Capabilities {
        match self {
            EntityKind::Plate => Capabilities {
                positionable: true,
                fadeable: true,
                toggleable: true,
            },
            EntityKind::Globe | EntityKind::Atmosphere | EntityKind::Clouds => Capabilities {
                positionable: false,
                fadeable: true,
                toggleable: true,
            },
        }
    }
}

/// Material-level values the renderer forwards to its shaders
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Uniforms {
    /// Material needs alpha blending this frame
    pub transparent: bool,
    /// Light direction for the atmosphere glow, only set once the globe is complete
    pub sun_direction: Option<Vec3>,
}

/// Presentation data passed through to snapshots untouched
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EntityMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Localized caption, preferred over `name` in legends
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// CSS-style colour, e.g. `#3498db`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl EntityMeta {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.label.is_none() && self.color.is_none()
    }

    /// Label if set, otherwise name
    pub fn caption(&self) -> Option<&str> {
        self.label.as_deref().or(self.name.as_deref())
    }
}

/// Static description of an entity, supplied once at scene construction
#[derive(Clone, Debug, PartialEq)]
pub struct EntityDef {
    pub id: EntityId,
    pub kind: EntityKind,
    pub rest_position: Vec3,
    pub dispersed_position: Vec3,
    pub meta: EntityMeta,
}

impl EntityDef {
    /// A plate that converges from `dispersed` to `rest`
    pub fn plate(id: impl Into<String>, rest: Vec3, dispersed: Vec3) -> Self {
        Self {
            id: EntityId::new(id),
            kind: EntityKind::Plate,
            rest_position: rest,
            dispersed_position: dispersed,
            meta: EntityMeta::default(),
        }
    }

    /// A non-moving shell (globe, atmosphere, clouds) centred at the origin
    pub fn shell(id: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            id: EntityId::new(id),
            kind,
            rest_position: Vec3::ZERO,
            dispersed_position: Vec3::ZERO,
            meta: EntityMeta::default(),
        }
    }

    pub fn with_meta(mut self, meta: EntityMeta) -> Self {
        self.meta = meta;
        self
    }
}

/// A registered entity with its current render state
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    id: EntityId,
    kind: EntityKind,
    rest_position: Vec3,
    dispersed_position: Vec3,
    meta: EntityMeta,
    pub(crate) position: Vec3,
    pub(crate) opacity: f32,
    pub(crate) visible: bool,
    pub(crate) uniforms: Uniforms,
}

impl Entity {
    fn from_def(def: EntityDef) -> Self {
        Self {
            position: def.rest_position,
            opacity: 0.0,
            visible: false,
            uniforms: Uniforms::default(),
            id: def.id,
            kind: def.kind,
            rest_position: def.rest_position,
            dispersed_position: def.dispersed_position,
            meta: def.meta,
        }
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn capabilities(&self) -> Capabilities {
        self.kind.capabilities()
    }

    pub fn rest_position(&self) -> Vec3 {
        self.rest_position
    }

    pub fn dispersed_position(&self) -> Vec3 {
        self.dispersed_position
    }

    pub fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn uniforms(&self) -> Uniforms {
        self.uniforms
    }

    pub fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot {
            id: self.id.clone(),
            kind: self.kind,
            position: self.position,
            opacity: self.opacity,
            visible: self.visible,
            uniforms: self.uniforms,
            meta: self.meta.clone(),
        }
    }
}

/// Read-only copy of an entity's render state
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub kind: EntityKind,
    pub position: Vec3,
    pub opacity: f32,
    pub visible: bool,
    pub uniforms: Uniforms,
    #[serde(flatten)]
    pub meta: EntityMeta,
}

/// Registration-ordered table of entities
#[derive(Clone, Debug, Default)]
pub struct EntityRegistry {
    entities: SlotMap<EntityKey, Entity>,
    by_id: FxHashMap<EntityId, EntityKey>,
    order: Vec<EntityKey>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from definitions, failing on the first bad one
    pub fn from_defs(defs: impl IntoIterator<Item = EntityDef>) -> Result<Self> {
        let mut registry = Self::new();
        for def in defs {
            registry.register(def)?;
        }
        Ok(registry)
    }

    /// Add an entity
    pub fn register(&mut self, def: EntityDef) -> Result<EntityKey> {
        if self.by_id.contains_key(&def.id) {
            return Err(TimelineError::DuplicateId(def.id.to_string()));
        }

        if !def.kind.capabilities().positionable && def.rest_position != def.dispersed_position {
            return Err(TimelineError::MissingCapability {
                id: def.id.to_string(),
                capability: "positionable",
            });
        }

        let id = def.id.clone();
        let key = self.entities.insert(Entity::from_def(def));
        self.by_id.insert(id, key);
        self.order.push(key);
        Ok(key)
    }

    /// Look up an entity by id
    pub fn get(&self, id: &str) -> Result<&Entity> {
        self.key_of(id).map(|key| &self.entities[key])
    }

    /// Look up the handle for an id
    pub fn key_of(&self, id: &str) -> Result<EntityKey> {
        self.by_id
            .get(id)
            .copied()
            .ok_or_else(|| TimelineError::NotFound(id.to_string()))
    }

    /// Look up an entity by handle
    pub fn entity(&self, key: EntityKey) -> Option<&Entity> {
        self.entities.get(key)
    }

    /// All entities in registration order
    pub fn all(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.order.iter().map(move |key| &self.entities[*key])
    }

    pub(crate) fn all_mut(&mut self) -> impl Iterator<Item = &mut Entity> + '_ {
        // Write order is irrelevant, apply touches every entity once.
        self.entities.values_mut()
    }

    /// Snapshot of every entity in registration order
    pub fn snapshot(&self) -> Vec<EntitySnapshot> {
        self.all().map(Entity::snapshot).collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plate(id: &str) -> EntityDef {
        EntityDef::plate(id, Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0))
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = EntityRegistry::new();
        let key = registry.register(plate("pacific")).unwrap();

        let entity = registry.get("pacific").unwrap();
        assert_eq!(entity.kind(), EntityKind::Plate);
        assert_eq!(entity.dispersed_position(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(registry.key_of("pacific").unwrap(), key);
        assert_eq!(registry.entity(key).unwrap().id().as_str(), "pacific");
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut registry = EntityRegistry::new();
        registry.register(plate("africa")).unwrap();

        let err = registry.register(plate("africa")).unwrap_err();
        assert_eq!(err, TimelineError::DuplicateId("africa".into()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_missing_id_is_not_found() {
        let registry = EntityRegistry::new();
        assert_eq!(
            registry.get("eurasia").unwrap_err(),
            TimelineError::NotFound("eurasia".into())
        );
    }

    #[test]
    fn test_iteration_follows_registration_order() {
        let ids = ["pacific", "antarctic", "africa", "eurasia"];
        let registry = EntityRegistry::from_defs(ids.iter().map(|id| plate(id))).unwrap();

        let seen: Vec<_> = registry.all().map(|e| e.id().as_str()).collect();
        assert_eq!(seen, ids);

        let snapshot_ids: Vec<_> = registry
            .snapshot()
            .into_iter()
            .map(|s| s.id.to_string())
            .collect();
        assert_eq!(snapshot_ids, ids);
    }

    #[test]
    fn test_meta_reaches_snapshot() {
        let def = plate("pacific").with_meta(EntityMeta {
            name: Some("Pacific".into()),
            label: None,
            color: Some("#3498db".into()),
        });
        let registry = EntityRegistry::from_defs([def, plate("antarctic")]).unwrap();

        let snapshot = registry.snapshot();
        assert_eq!(snapshot[0].meta.caption(), Some("Pacific"));
        assert_eq!(snapshot[0].meta.color.as_deref(), Some("#3498db"));
        assert!(snapshot[1].meta.is_empty());
        assert_eq!(snapshot[1].meta.caption(), None);
    }

    #[test]
    fn test_shell_cannot_move() {
        let def = EntityDef {
            dispersed_position: Vec3::new(0.0, 5.0, 0.0),
            ..EntityDef::shell("globe", EntityKind::Globe)
        };

        let err = EntityRegistry::from_defs([def]).unwrap_err();
        assert!(matches!(
            err,
            TimelineError::MissingCapability {
                capability: "positionable",
                ..
            }
        ));
    }

    #[test]
    fn test_capabilities_per_kind() {
        assert!(EntityKind::Plate.capabilities().positionable);
        for kind in [EntityKind::Globe, EntityKind::Atmosphere, EntityKind::Clouds] {
            let caps = kind.capabilities();
            assert!(!caps.positionable);
            assert!(caps.fadeable && caps.toggleable);
        }
    }
}
