//! # Metatile Attributes
//!
//! Per-metatile behaviour and layer metadata. The on-disk packing differs
//! between the Ruby/Emerald engines (2 bytes) and FireRed (4 bytes), so the
//! enums stay closed and the pack routines are exhaustive.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetBaseGame {
    Emerald,
    Firered,
    Ruby,
}

impl std::fmt::Display for TargetBaseGame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetBaseGame::Emerald => write!(f, "pokeemerald"),
            TargetBaseGame::Firered => write!(f, "pokefirered"),
            TargetBaseGame::Ruby => write!(f, "pokeruby"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TerrainType {
    #[default]
    Normal,
    Grass,
    Water,
    Waterlog,
}

impl TerrainType {
    pub fn value(&self) -> u32 {
        match self {
            TerrainType::Normal => 0,
            TerrainType::Grass => 1,
            TerrainType::Water => 2,
            TerrainType::Waterlog => 3,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "normal" => Some(TerrainType::Normal),
            "grass" => Some(TerrainType::Grass),
            "water" => Some(TerrainType::Water),
            "waterlog" => Some(TerrainType::Waterlog),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EncounterType {
    #[default]
    None,
    Land,
    Water,
}

impl EncounterType {
    pub fn value(&self) -> u32 {
        match self {
            EncounterType::None => 0,
            EncounterType::Land => 1,
            EncounterType::Water => 2,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "none" => Some(EncounterType::None),
            "land" => Some(EncounterType::Land),
            "water" => Some(EncounterType::Water),
            _ => None,
        }
    }
}

/// Which layers of a metatile carry content; drives the subtile pack order
/// in metatiles.bin and the draw order in game.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LayerType {
    #[default]
    Normal,
    Covered,
    Split,
    Triple,
}

impl LayerType {
    pub fn value(&self) -> u32 {
        match self {
            LayerType::Normal => 0,
            LayerType::Covered => 1,
            LayerType::Split => 2,
            LayerType::Triple => 3,
        }
    }

    /// Subtiles a metatile of this type contributes to the compiled stream.
    pub fn tiles_per_metatile(&self) -> usize {
        match self {
            LayerType::Triple => 12,
            _ => 8,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attributes {
    /// Behaviour id resolved from the behaviours header. FireRed packs 9
    /// bits, the other targets 8.
    pub metatile_behavior: u16,
    pub terrain_type: TerrainType,
    pub encounter_type: EncounterType,
    pub layer_type: LayerType,
    pub base_game: TargetBaseGame,
}

impl Attributes {
    pub fn defaults_for(base_game: TargetBaseGame) -> Self {
        Attributes {
            metatile_behavior: 0,
            terrain_type: TerrainType::Normal,
            encounter_type: EncounterType::None,
            layer_type: LayerType::Normal,
            base_game,
        }
    }

    /// Ruby/Emerald record: behaviour in bits 0-7, layer type in bits 8-11,
    /// bits 12-15 reserved.
    pub fn pack_ruby_emerald(&self) -> u16 {
        (self.metatile_behavior & 0xFF) | (((self.layer_type.value() as u16) & 0xF) << 8)
    }

    /// FireRed record: behaviour bits 0-8, terrain 9-13, encounter 24-26,
    /// layer type 29-30.
    pub fn pack_firered(&self) -> u32 {
        ((self.metatile_behavior as u32) & 0x1FF)
            | ((self.terrain_type.value() & 0x1F) << 9)
            | ((self.encounter_type.value() & 0x7) << 24)
            | ((self.layer_type.value() & 0x3) << 29)
    }

    /// Size in bytes of one packed attribute record for the target.
    pub fn packed_size(base_game: TargetBaseGame) -> usize {
        match base_game {
            TargetBaseGame::Emerald | TargetBaseGame::Ruby => 2,
            TargetBaseGame::Firered => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ruby_emerald_packing() {
        let mut attrs = Attributes::defaults_for(TargetBaseGame::Emerald);
        attrs.metatile_behavior = 0x21;
        attrs.layer_type = LayerType::Covered;
        assert_eq!(attrs.pack_ruby_emerald(), 0x0121);
    }

    #[test]
    fn firered_packing() {
        let mut attrs = Attributes::defaults_for(TargetBaseGame::Firered);
        attrs.metatile_behavior = 0x101;
        attrs.terrain_type = TerrainType::Water;
        attrs.encounter_type = EncounterType::Water;
        attrs.layer_type = LayerType::Split;
        let packed = attrs.pack_firered();
        assert_eq!(packed & 0x1FF, 0x101);
        assert_eq!((packed >> 9) & 0x1F, 2);
        assert_eq!((packed >> 24) & 0x7, 2);
        assert_eq!((packed >> 29) & 0x3, 2);
    }

    #[test]
    fn terrain_and_encounter_names_parse_case_insensitively() {
        assert_eq!(TerrainType::from_name("GRASS"), Some(TerrainType::Grass));
        assert_eq!(TerrainType::from_name("swamp"), None);
        assert_eq!(EncounterType::from_name("Land"), Some(EncounterType::Land));
    }
}
