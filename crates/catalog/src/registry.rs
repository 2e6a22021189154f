use crate::entities;
use anyhow::{bail, Context};
use motley_core::{Capability, EffectEntity, HandKind, Rank, Suit, Trigger};
use serde::Deserialize;
use std::collections::HashMap;

const REGISTRY_JSON: &str = include_str!("../assets/registry.json");

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Legendary,
}

/// Constants a binding body reads. One shared shape across bindings;
/// each binding validates the params it actually needs at load time.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BindingParams {
    pub chips: i64,
    pub mult: f64,
    pub mul_mult: f64,
    pub money: i64,
    pub tarots: u8,
    pub planets: u8,
    pub spectrals: u8,
    pub hands: i64,
    pub discards: i64,
    pub hand_size: i64,
    pub sell_value: i64,
    pub flags: Vec<String>,
    pub hand: Option<HandKind>,
    pub suit: Option<Suit>,
    pub rank: Option<Rank>,
    pub field: String,
    pub step: f64,
    pub unit: f64,
    pub start: f64,
    pub threshold: i64,
    pub chance: f64,
    pub max: i64,
    pub message: Option<String>,
}

impl Default for BindingParams {
    fn default() -> Self {
        Self {
            chips: 0,
            mult: 0.0,
            mul_mult: 1.0,
            money: 0,
            tarots: 0,
            planets: 0,
            spectrals: 0,
            hands: 0,
            discards: 0,
            hand_size: 0,
            sell_value: 0,
            flags: Vec::new(),
            hand: None,
            suit: None,
            rank: None,
            field: "mult".to_string(),
            step: 0.0,
            unit: 1.0,
            start: 0.0,
            threshold: 0,
            chance: 0.0,
            max: 0,
            message: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntitySpec {
    pub id: String,
    pub name: String,
    pub trigger: Trigger,
    pub binding: String,
    #[serde(default)]
    pub rarity: Rarity,
    #[serde(default = "default_true")]
    pub copyable: bool,
    #[serde(default)]
    pub probability: bool,
    #[serde(default)]
    pub params: BindingParams,
}

fn default_true() -> bool {
    true
}

struct Entry {
    spec: EntitySpec,
    capability: Option<Capability>,
}

/// The built-in entity registry: specs parsed from the embedded JSON,
/// validated and bound once. `get` hands out fresh clones so two
/// instances of the same entity never share state.
pub struct Catalog {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<&str> = self.entries.iter().map(|e| e.spec.id.as_str()).collect();
        f.debug_struct("Catalog").field("entries", &ids).finish()
    }
}

impl Catalog {
    pub fn builtin() -> anyhow::Result<Self> {
        Self::from_json(REGISTRY_JSON).context("load builtin entity registry")
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let specs: Vec<EntitySpec> =
            serde_json::from_str(text).context("parse entity registry")?;
        let mut entries = Vec::with_capacity(specs.len());
        let mut index = HashMap::new();
        for spec in specs {
            if spec.id.is_empty() {
                bail!("entity `{}` has an empty id", spec.name);
            }
            let capability = entities::bind(&spec.binding, &spec.params)
                .with_context(|| format!("bind entity `{}`", spec.id))?;
            if index.insert(spec.id.clone(), entries.len()).is_some() {
                bail!("duplicate entity id `{}`", spec.id);
            }
            entries.push(Entry { spec, capability });
        }
        Ok(Self { entries, index })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.spec.id.as_str())
    }

    pub fn spec(&self, id: &str) -> Option<&EntitySpec> {
        self.index.get(id).map(|&i| &self.entries[i].spec)
    }

    /// A fresh instance of the entity, its capability bound on its
    /// primary trigger and its state bag empty.
    pub fn get(&self, id: &str) -> Option<EffectEntity> {
        let entry = &self.entries[*self.index.get(id)?];
        let spec = &entry.spec;
        let mut entity = EffectEntity::new(&spec.id, &spec.name, spec.trigger);
        if !spec.copyable {
            entity = entity.non_copyable();
        }
        if spec.probability {
            entity = entity.probabilistic();
        }
        if let Some(capability) = &entry.capability {
            entity.capabilities.set(spec.trigger, capability.clone());
        }
        Some(entity)
    }
}
