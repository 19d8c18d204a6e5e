//! Hero templates: starting attributes and the abilities granted at spawn.

use cast_core::{AbilityId, Attribute};

/// Starting attribute values of a hero.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeroAttributes {
    pub health: f32,
    pub max_health: f32,
    pub mana: f32,
    pub max_mana: f32,
    pub move_speed: f32,
}

impl HeroAttributes {
    pub fn get(&self, attribute: Attribute) -> f32 {
        match attribute {
            Attribute::Health => self.health,
            Attribute::MaxHealth => self.max_health,
            Attribute::Mana => self.mana,
            Attribute::MaxMana => self.max_mana,
            Attribute::MoveSpeed => self.move_speed,
        }
    }

    pub fn set(&mut self, attribute: Attribute, value: f32) {
        let slot = match attribute {
            Attribute::Health => &mut self.health,
            Attribute::MaxHealth => &mut self.max_health,
            Attribute::Mana => &mut self.mana,
            Attribute::MaxMana => &mut self.max_mana,
            Attribute::MoveSpeed => &mut self.move_speed,
        };
        *slot = value;
    }
}

impl Default for HeroAttributes {
    fn default() -> Self {
        Self {
            health: 100.0,
            max_health: 100.0,
            mana: 100.0,
            max_mana: 100.0,
            move_speed: 600.0,
        }
    }
}

/// Hero spawn template.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeroTemplate {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default = "default_level"))]
    pub level: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub attributes: HeroAttributes,
    /// Abilities granted to slots, in slot order.
    pub spells: Vec<AbilityId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub weapon: Option<AbilityId>,
}

#[cfg(feature = "serde")]
fn default_level() -> u32 {
    1
}

impl HeroTemplate {
    pub fn new(name: impl Into<String>, spells: Vec<AbilityId>) -> Self {
        Self {
            name: name.into(),
            level: 1,
            attributes: HeroAttributes::default(),
            spells,
            weapon: None,
        }
    }

    pub fn with_weapon(mut self, weapon: AbilityId) -> Self {
        self.weapon = Some(weapon);
        self
    }

    pub fn with_attributes(mut self, attributes: HeroAttributes) -> Self {
        self.attributes = attributes;
        self
    }
}
