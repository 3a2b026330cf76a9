//! Parses attributes.csv into per-metatile attribute records. Ruby and
//! Emerald sheets carry `id,behavior`; FireRed sheets add terrain and
//! encounter columns. Errors accumulate so one run reports every bad row;
//! the caller checks the phase afterwards.

use std::collections::HashMap;

use crate::config::CompilerConfig;
use crate::diagnostics::{Diagnostics, Warning};
use crate::tileset::attributes::{
    Attributes, EncounterType, TargetBaseGame, TerrainType,
};

use super::behaviors::{parse_int, BehaviourMap};

const BASIC_HEADER: [&str; 2] = ["id", "behavior"];
const FIRERED_HEADER: [&str; 4] = ["id", "behavior", "terrainType", "encounterType"];

pub fn parse_attributes_csv(
    config: &CompilerConfig,
    diags: &mut Diagnostics,
    text: &str,
    behaviours: &BehaviourMap,
) -> HashMap<usize, Attributes> {
    let mut rows = HashMap::new();
    let mut lines = text.lines().enumerate();

    let Some((_, header)) = lines.next() else {
        diags.user_error("attributes.csv: missing header row");
        return rows;
    };
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();
    let firered_columns = if columns == FIRERED_HEADER {
        true
    } else if columns == BASIC_HEADER {
        false
    } else {
        diags.user_error(&format!("attributes.csv: unrecognised header '{}'", header));
        return rows;
    };

    let target_wants_firered = config.base_game == TargetBaseGame::Firered;
    if firered_columns != target_wants_firered {
        diags.warn(
            Warning::AttributeFormatMismatch,
            &format!(
                "attributes.csv header is for {}, but the target is {}",
                if firered_columns {
                    "pokefirered"
                } else {
                    "pokeemerald/pokeruby"
                },
                config.base_game
            ),
        );
    }

    for (line_index, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != columns.len() {
            diags.user_error(&format!(
                "attributes.csv line {}: expected {} fields, found {}",
                line_index + 1,
                columns.len(),
                fields.len()
            ));
            continue;
        }

        let Ok(id) = fields[0].parse::<usize>() else {
            diags.user_error(&format!(
                "attributes.csv line {}: invalid metatile id '{}'",
                line_index + 1,
                fields[0]
            ));
            continue;
        };
        if rows.contains_key(&id) {
            diags.user_error(&format!(
                "attributes.csv line {}: duplicate row for metatile {}",
                line_index + 1,
                id
            ));
            continue;
        }

        let behaviour = behaviours
            .get(fields[1])
            .copied()
            .or_else(|| parse_int(fields[1]));
        let Some(behaviour) = behaviour else {
            diags.user_error(&format!(
                "attributes.csv line {}: unknown metatile behavior '{}'",
                line_index + 1,
                fields[1]
            ));
            continue;
        };

        let mut attributes = Attributes::defaults_for(config.base_game);
        attributes.metatile_behavior = behaviour;

        if firered_columns {
            match TerrainType::from_name(fields[2]) {
                Some(terrain) => attributes.terrain_type = terrain,
                None => {
                    diags.user_error(&format!(
                        "attributes.csv line {}: unknown terrain type '{}'",
                        line_index + 1,
                        fields[2]
                    ));
                    continue;
                }
            }
            match EncounterType::from_name(fields[3]) {
                Some(encounter) => attributes.encounter_type = encounter,
                None => {
                    diags.user_error(&format!(
                        "attributes.csv line {}: unknown encounter type '{}'",
                        line_index + 1,
                        fields[3]
                    ));
                    continue;
                }
            }
        }

        rows.insert(id, attributes);
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompilerMode;
    use crate::diagnostics::WarningMode;

    fn behaviours() -> BehaviourMap {
        let mut map = BehaviourMap::new();
        map.insert("MB_NORMAL".to_string(), 0);
        map.insert("MB_TALL_GRASS".to_string(), 2);
        map
    }

    #[test]
    fn basic_rows_parse_with_symbolic_and_numeric_behaviours() {
        let config = CompilerConfig::new(CompilerMode::Primary, TargetBaseGame::Emerald);
        let mut diags = Diagnostics::new();
        let text = "id,behavior\n0,MB_NORMAL\n3,MB_TALL_GRASS\n7,0x21\n";
        let rows = parse_attributes_csv(&config, &mut diags, text, &behaviours());

        assert_eq!(diags.err_count(), 0);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[&0].metatile_behavior, 0);
        assert_eq!(rows[&3].metatile_behavior, 2);
        assert_eq!(rows[&7].metatile_behavior, 0x21);
    }

    #[test]
    fn firered_rows_carry_terrain_and_encounter() {
        let config = CompilerConfig::new(CompilerMode::Primary, TargetBaseGame::Firered);
        let mut diags = Diagnostics::new();
        let text = "id,behavior,terrainType,encounterType\n2,MB_NORMAL,water,land\n";
        let rows = parse_attributes_csv(&config, &mut diags, text, &behaviours());

        assert_eq!(diags.err_count(), 0);
        assert_eq!(rows[&2].terrain_type, TerrainType::Water);
        assert_eq!(rows[&2].encounter_type, EncounterType::Land);
    }

    #[test]
    fn header_mismatch_raises_the_format_warning() {
        let config = CompilerConfig::new(CompilerMode::Primary, TargetBaseGame::Emerald);
        let mut diags = Diagnostics::new();
        diags.set(Warning::AttributeFormatMismatch, WarningMode::Warn);
        let text = "id,behavior,terrainType,encounterType\n0,MB_NORMAL,normal,none\n";
        let rows = parse_attributes_csv(&config, &mut diags, text, &behaviours());

        assert_eq!(diags.warn_count(), 1);
        // The extra columns still parse; they just will not pack.
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn bad_rows_accumulate_errors_without_stopping() {
        let config = CompilerConfig::new(CompilerMode::Primary, TargetBaseGame::Emerald);
        let mut diags = Diagnostics::new();
        let text = "id,behavior\nx,MB_NORMAL\n1,MB_UNKNOWN\n1,MB_NORMAL\n2,MB_NORMAL\n2,MB_NORMAL\n";
        let rows = parse_attributes_csv(&config, &mut diags, text, &behaviours());

        // Bad id, unknown behaviour, and one duplicate of metatile 2.
        assert_eq!(diags.err_count(), 3);
        assert_eq!(rows.len(), 2);
        assert!(diags.check_phase("attributes parse").is_err());
    }
}
