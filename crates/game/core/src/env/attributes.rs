/// Attributes readable through an [`AttributeStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Attribute {
    Health,
    MaxHealth,
    Mana,
    MaxMana,
    MoveSpeed,
}

/// External attribute storage. Values are passed through untouched.
pub trait AttributeStore {
    fn attribute(&self, attribute: Attribute) -> f32;

    /// Current health, 0 if dead.
    fn health(&self) -> f32 {
        self.attribute(Attribute::Health)
    }

    fn max_health(&self) -> f32 {
        self.attribute(Attribute::MaxHealth)
    }

    fn mana(&self) -> f32 {
        self.attribute(Attribute::Mana)
    }

    fn max_mana(&self) -> f32 {
        self.attribute(Attribute::MaxMana)
    }

    fn move_speed(&self) -> f32 {
        self.attribute(Attribute::MoveSpeed)
    }
}
