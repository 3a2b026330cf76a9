//! # Compiler Configuration
//!
//! Fieldmap caps come from the target base game and can be overridden
//! individually on the command line. The caps bound every downstream
//! phase: tile counts, palette counts, metatile counts, and the global
//! colour budget.

use crate::errors::CompileError;
use crate::tileset::attributes::TargetBaseGame;
use crate::tileset::colour::{Rgba32, RGBA_MAGENTA};
use crate::tileset::palette::PAL_SIZE;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompilerMode {
    Primary,
    Secondary,
    Freestanding,
}

impl std::fmt::Display for CompilerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompilerMode::Primary => write!(f, "primary"),
            CompilerMode::Secondary => write!(f, "secondary"),
            CompilerMode::Freestanding => write!(f, "freestanding"),
        }
    }
}

/// Engine limits for the target game. Totals cover primary plus secondary
/// together, so the secondary's share is the difference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldmapConfig {
    pub num_tiles_in_primary: usize,
    pub num_tiles_total: usize,
    pub num_metatiles_in_primary: usize,
    pub num_metatiles_total: usize,
    pub num_palettes_in_primary: usize,
    pub num_palettes_total: usize,
    pub num_tiles_per_metatile: usize,
}

impl FieldmapConfig {
    pub fn emerald_defaults() -> Self {
        FieldmapConfig {
            num_tiles_in_primary: 512,
            num_tiles_total: 1024,
            num_metatiles_in_primary: 512,
            num_metatiles_total: 1024,
            num_palettes_in_primary: 6,
            num_palettes_total: 13,
            num_tiles_per_metatile: 8,
        }
    }

    pub fn firered_defaults() -> Self {
        FieldmapConfig {
            num_tiles_in_primary: 640,
            num_tiles_total: 1024,
            num_metatiles_in_primary: 640,
            num_metatiles_total: 1024,
            num_palettes_in_primary: 7,
            num_palettes_total: 13,
            num_tiles_per_metatile: 8,
        }
    }

    pub fn ruby_defaults() -> Self {
        FieldmapConfig {
            num_tiles_in_primary: 512,
            num_tiles_total: 1024,
            num_metatiles_in_primary: 512,
            num_metatiles_total: 1024,
            num_palettes_in_primary: 6,
            num_palettes_total: 12,
            num_tiles_per_metatile: 8,
        }
    }

    pub fn defaults_for(base_game: TargetBaseGame) -> Self {
        match base_game {
            TargetBaseGame::Emerald => Self::emerald_defaults(),
            TargetBaseGame::Firered => Self::firered_defaults(),
            TargetBaseGame::Ruby => Self::ruby_defaults(),
        }
    }

    pub fn num_tiles_in_secondary(&self) -> usize {
        self.num_tiles_total - self.num_tiles_in_primary
    }

    pub fn num_metatiles_in_secondary(&self) -> usize {
        self.num_metatiles_total - self.num_metatiles_in_primary
    }

    pub fn num_palettes_in_secondary(&self) -> usize {
        self.num_palettes_total - self.num_palettes_in_primary
    }
}

pub const DEFAULT_MAX_RECURSES: usize = 2_000_000;

#[derive(Clone, Debug)]
pub struct CompilerConfig {
    pub mode: CompilerMode,
    pub base_game: TargetBaseGame,
    pub fieldmap: FieldmapConfig,
    pub transparency_colour: Rgba32,
    pub triple_layer: bool,
    pub true_colour: bool,
    pub max_recurse_count: usize,
}

impl CompilerConfig {
    pub fn new(mode: CompilerMode, base_game: TargetBaseGame) -> Self {
        CompilerConfig {
            mode,
            base_game,
            fieldmap: FieldmapConfig::defaults_for(base_game),
            transparency_colour: RGBA_MAGENTA,
            triple_layer: false,
            true_colour: false,
            max_recurse_count: DEFAULT_MAX_RECURSES,
        }
    }

    /// Tile budget for the mode being compiled.
    pub fn max_tiles(&self) -> usize {
        match self.mode {
            CompilerMode::Secondary => self.fieldmap.num_tiles_in_secondary(),
            _ => self.fieldmap.num_tiles_in_primary,
        }
    }

    /// Metatile budget for the mode being compiled.
    pub fn max_metatiles(&self) -> usize {
        match self.mode {
            CompilerMode::Secondary => self.fieldmap.num_metatiles_in_secondary(),
            _ => self.fieldmap.num_metatiles_in_primary,
        }
    }

    /// Hardware palettes this compile may fill itself.
    pub fn palettes_to_allocate(&self) -> usize {
        match self.mode {
            CompilerMode::Secondary => self.fieldmap.num_palettes_in_secondary(),
            _ => self.fieldmap.num_palettes_in_primary,
        }
    }

    /// Cap on distinct colours in the global index. Secondary compiles
    /// count the seeded primary colours against the whole-map budget.
    pub fn colour_budget(&self) -> usize {
        let palettes = match self.mode {
            CompilerMode::Secondary => self.fieldmap.num_palettes_total,
            _ => self.fieldmap.num_palettes_in_primary,
        };
        (PAL_SIZE - 1) * palettes
    }

    pub fn validate(&self) -> Result<(), CompileError> {
        let fm = &self.fieldmap;
        if fm.num_tiles_in_primary >= fm.num_tiles_total {
            return Err(CompileError::User(format!(
                "numTilesInPrimary {} must be less than numTilesTotal {}",
                fm.num_tiles_in_primary, fm.num_tiles_total
            )));
        }
        if fm.num_metatiles_in_primary >= fm.num_metatiles_total {
            return Err(CompileError::User(format!(
                "numMetatilesInPrimary {} must be less than numMetatilesTotal {}",
                fm.num_metatiles_in_primary, fm.num_metatiles_total
            )));
        }
        if fm.num_palettes_in_primary > fm.num_palettes_total {
            return Err(CompileError::User(format!(
                "numPalettesInPrimary {} must not exceed numPalettesTotal {}",
                fm.num_palettes_in_primary, fm.num_palettes_total
            )));
        }
        if fm.num_tiles_per_metatile != 8 && fm.num_tiles_per_metatile != 12 {
            return Err(CompileError::User(format!(
                "numTilesPerMetatile must be 8 or 12, got {}",
                fm.num_tiles_per_metatile
            )));
        }
        let expected = if self.triple_layer { 12 } else { 8 };
        if fm.num_tiles_per_metatile != expected {
            return Err(CompileError::User(format!(
                "numTilesPerMetatile {} does not match {} layer mode",
                fm.num_tiles_per_metatile,
                if self.triple_layer { "triple" } else { "dual" }
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_game_defaults() {
        let emerald = FieldmapConfig::emerald_defaults();
        assert_eq!(emerald.num_palettes_in_primary, 6);
        assert_eq!(emerald.num_palettes_total, 13);
        assert_eq!(emerald.num_tiles_in_secondary(), 512);

        let firered = FieldmapConfig::firered_defaults();
        assert_eq!(firered.num_tiles_in_primary, 640);
        assert_eq!(firered.num_palettes_in_primary, 7);

        let ruby = FieldmapConfig::ruby_defaults();
        assert_eq!(ruby.num_palettes_total, 12);
    }

    #[test]
    fn colour_budget_tracks_mode() {
        let mut config = CompilerConfig::new(CompilerMode::Primary, TargetBaseGame::Emerald);
        assert_eq!(config.colour_budget(), 90);
        config.mode = CompilerMode::Secondary;
        assert_eq!(config.colour_budget(), 195);
    }

    #[test]
    fn validate_rejects_mismatched_layer_mode() {
        let mut config = CompilerConfig::new(CompilerMode::Primary, TargetBaseGame::Emerald);
        config.triple_layer = true;
        assert!(config.validate().is_err());
        config.fieldmap.num_tiles_per_metatile = 12;
        assert!(config.validate().is_ok());
    }
}
