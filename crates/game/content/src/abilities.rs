//! Ability definitions and the catalog that indexes them.

use std::collections::BTreeMap;

use cast_core::{AbilityId, Tag, TagSet};

/// Static description of one grantable ability.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilityDefinition {
    pub id: AbilityId,
    pub name: String,
    /// Cooldown in seconds applied on commit. Zero means no cooldown effect.
    pub cooldown: f32,
    /// Tag carried by the cooldown effect.
    pub cooldown_tag: Tag,
    /// Seconds between activation and commit. Zero commits on activation.
    #[cfg_attr(feature = "serde", serde(default))]
    pub cast_time: f32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub mana_cost: f32,
}

impl AbilityDefinition {
    pub fn new(id: AbilityId, name: impl Into<String>, cooldown: f32) -> Self {
        let name = name.into();
        Self {
            id,
            cooldown_tag: Tag::new(format!("Cooldown.Spell.{}", name.replace(' ', ""))),
            name,
            cooldown,
            cast_time: 0.0,
            mana_cost: 0.0,
        }
    }

    pub fn with_cast_time(mut self, cast_time: f32) -> Self {
        self.cast_time = cast_time;
        self
    }

    pub fn with_mana_cost(mut self, mana_cost: f32) -> Self {
        self.mana_cost = mana_cost;
        self
    }

    pub fn has_cooldown(&self) -> bool {
        self.cooldown > 0.0
    }

    pub fn cooldown_tags(&self) -> TagSet {
        TagSet::single(self.cooldown_tag.clone())
    }
}

/// Lookup table of ability definitions keyed by [`AbilityId`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AbilityCatalog {
    abilities: BTreeMap<AbilityId, AbilityDefinition>,
}

impl AbilityCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a definition. Returns the previous definition with the same id.
    pub fn insert(&mut self, definition: AbilityDefinition) -> Option<AbilityDefinition> {
        self.abilities.insert(definition.id, definition)
    }

    pub fn get(&self, id: AbilityId) -> Option<&AbilityDefinition> {
        self.abilities.get(&id)
    }

    pub fn contains(&self, id: AbilityId) -> bool {
        self.abilities.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AbilityDefinition> {
        self.abilities.values()
    }

    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }
}

impl FromIterator<AbilityDefinition> for AbilityCatalog {
    fn from_iter<I: IntoIterator<Item = AbilityDefinition>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for definition in iter {
            catalog.insert(definition);
        }
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cooldown_tag_is_derived_from_name() {
        let definition = AbilityDefinition::new(AbilityId(3), "Fire Bolt", 2.0);
        assert_eq!(definition.cooldown_tag.as_str(), "Cooldown.Spell.FireBolt");
        assert!(definition.has_cooldown());
        assert!(!AbilityDefinition::new(AbilityId(4), "Jab", 0.0).has_cooldown());
    }

    #[test]
    fn later_insert_replaces_earlier() {
        let mut catalog = AbilityCatalog::new();
        catalog.insert(AbilityDefinition::new(AbilityId(1), "Jab", 0.0));
        let previous = catalog.insert(AbilityDefinition::new(AbilityId(1), "Jab", 1.0));

        assert_eq!(previous.map(|d| d.cooldown), Some(0.0));
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(AbilityId(1)).map(|d| d.cooldown), Some(1.0));
    }
}
