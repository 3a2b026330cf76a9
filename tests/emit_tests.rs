//! Emit-side checks: the artifacts land on disk in the documented formats
//! and the binary records read back to the values that produced them.

use std::io::Cursor;

use tileset_compiler::binary_utils::{read_u16_le, read_u32_le};
use tileset_compiler::compiler::{self, CompileCtx};
use tileset_compiler::config::{CompilerConfig, CompilerMode};
use tileset_compiler::diagnostics::Diagnostics;
use tileset_compiler::emitter;
use tileset_compiler::tileset::attributes::{
    Attributes, LayerType, TargetBaseGame, TerrainType,
};
use tileset_compiler::tileset::colour::*;
use tileset_compiler::tileset::tile::{RgbaTile, TileSource, TILE_DIM};
use tileset_compiler::tileset::{Assignment, CompiledTileset, DecompiledTileset};

fn solid_tile(index: usize, colour: Rgba32) -> RgbaTile {
    let mut tile = RgbaTile::new(TileSource::Freestanding { index });
    for p in tile.pixels.iter_mut() {
        *p = colour;
    }
    tile
}

fn small_config() -> CompilerConfig {
    let mut config = CompilerConfig::new(CompilerMode::Primary, TargetBaseGame::Emerald);
    config.fieldmap.num_tiles_in_primary = 8;
    config.fieldmap.num_tiles_total = 16;
    config.fieldmap.num_palettes_in_primary = 2;
    config.fieldmap.num_palettes_total = 4;
    config
}

fn compile_small() -> (CompilerConfig, CompiledTileset) {
    let config = small_config();
    let mut attributes = Attributes::defaults_for(TargetBaseGame::Emerald);
    attributes.metatile_behavior = 0x21;
    attributes.layer_type = LayerType::Covered;
    let decompiled = DecompiledTileset {
        tiles: vec![
            solid_tile(0, RGBA_RED),
            solid_tile(1, RGBA_BLUE),
            solid_tile(2, RGBA_RED),
        ],
        attributes: vec![attributes],
        anims: Vec::new(),
    };
    let mut diags = Diagnostics::new();
    let mut ctx = CompileCtx::new(&config, &mut diags);
    let compiled = compiler::compile(&mut ctx, &decompiled, None).unwrap();
    (config, compiled)
}

fn emit_to_tempdir(config: &CompilerConfig, compiled: &CompiledTileset) -> tempfile::TempDir {
    let dir = tempfile::TempDir::new().unwrap();
    let mut diags = Diagnostics::new();
    emitter::emit(config, &mut diags, compiled, dir.path()).unwrap();
    dir
}

#[test]
fn emitted_artifacts_exist() {
    let (config, compiled) = compile_small();
    let dir = emit_to_tempdir(&config, &compiled);

    assert!(dir.path().join("tiles.png").is_file());
    assert!(dir.path().join("palettes/00.pal").is_file());
    assert!(dir.path().join("palettes/01.pal").is_file());
    assert!(!dir.path().join("palettes/02.pal").exists());
    assert!(dir.path().join("metatiles.bin").is_file());
    assert!(dir.path().join("metatile_attributes.bin").is_file());
    assert!(dir.path().join("tileset.json").is_file());
}

#[test]
fn tile_sheet_has_the_documented_geometry() {
    let (config, compiled) = compile_small();
    let dir = emit_to_tempdir(&config, &compiled);

    let sheet = image::open(dir.path().join("tiles.png")).unwrap().to_rgba8();
    assert_eq!(sheet.width(), 128);
    // Three tiles round up to one 8-pixel row.
    assert_eq!(sheet.height(), TILE_DIM as u32);
}

#[test]
fn metatile_records_read_back_to_their_assignments() {
    let (config, compiled) = compile_small();
    let dir = emit_to_tempdir(&config, &compiled);

    let bytes = std::fs::read(dir.path().join("metatiles.bin")).unwrap();
    assert_eq!(bytes.len(), compiled.assignments.len() * 2);

    let mut cursor = Cursor::new(bytes.as_slice());
    for expected in &compiled.assignments {
        let record = Assignment::from_u16(read_u16_le(&mut cursor).unwrap());
        assert_eq!(record, *expected);
    }
}

#[test]
fn ruby_emerald_attributes_pack_two_bytes() {
    let (config, compiled) = compile_small();
    let dir = emit_to_tempdir(&config, &compiled);

    let bytes = std::fs::read(dir.path().join("metatile_attributes.bin")).unwrap();
    assert_eq!(bytes.len(), 2);
    let mut cursor = Cursor::new(bytes.as_slice());
    let record = read_u16_le(&mut cursor).unwrap();
    assert_eq!(record & 0xFF, 0x21);
    assert_eq!((record >> 8) & 0xF, LayerType::Covered.value() as u16);
}

#[test]
fn firered_attributes_pack_four_bytes() {
    let mut config = small_config();
    config.base_game = TargetBaseGame::Firered;

    let mut attributes = Attributes::defaults_for(TargetBaseGame::Firered);
    attributes.metatile_behavior = 2;
    attributes.terrain_type = TerrainType::Grass;
    let decompiled = DecompiledTileset {
        tiles: vec![solid_tile(0, RGBA_GREEN)],
        attributes: vec![attributes],
        anims: Vec::new(),
    };
    let mut diags = Diagnostics::new();
    let mut ctx = CompileCtx::new(&config, &mut diags);
    let compiled = compiler::compile(&mut ctx, &decompiled, None).unwrap();
    let dir = emit_to_tempdir(&config, &compiled);

    let bytes = std::fs::read(dir.path().join("metatile_attributes.bin")).unwrap();
    assert_eq!(bytes.len(), 4);
    let mut cursor = Cursor::new(bytes.as_slice());
    let record = read_u32_le(&mut cursor).unwrap();
    assert_eq!(record & 0x1FF, 2);
    assert_eq!((record >> 9) & 0x1F, TerrainType::Grass.value());
}

#[test]
fn palette_files_are_jasc_with_expanded_channels() {
    let (config, compiled) = compile_small();
    let dir = emit_to_tempdir(&config, &compiled);

    let text = std::fs::read_to_string(dir.path().join("palettes/00.pal")).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "JASC-PAL");
    assert_eq!(lines[1], "0100");
    assert_eq!(lines[2], "16");
    assert_eq!(lines.len(), 19);
    // Slot 0 is the transparency colour.
    assert_eq!(lines[3], "248 0 248");
    for line in &lines[3..] {
        let channels: Vec<u8> = line
            .split_whitespace()
            .map(|c| c.parse().unwrap())
            .collect();
        assert_eq!(channels.len(), 3);
        // Low three bits are zero after BGR15 expansion.
        assert!(channels.iter().all(|c| c % 8 == 0));
    }
}

#[test]
fn metadata_summarises_the_compile() {
    let (config, compiled) = compile_small();
    let dir = emit_to_tempdir(&config, &compiled);

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("tileset.json")).unwrap())
            .unwrap();
    assert_eq!(json["mode"], "primary");
    assert_eq!(json["base_game"], "pokeemerald");
    assert_eq!(json["tile_count"], compiled.tiles.len());
    assert_eq!(json["palette_count"], 2);
    assert_eq!(json["metatile_count"], 1);
}

#[test]
fn animation_frames_emit_one_png_per_numbered_frame() {
    use tileset_compiler::tileset::{AnimFrame, DecompiledAnimation};

    let config = small_config();
    let frame = |name: &str, colour: Rgba32| AnimFrame {
        name: name.to_string(),
        tiles: vec![solid_tile(0, colour)],
        width_tiles: 1,
        height_tiles: 1,
    };
    let decompiled = DecompiledTileset {
        tiles: vec![solid_tile(0, RGBA_CYAN)],
        anims: vec![DecompiledAnimation {
            name: "water".to_string(),
            key: frame("key", RGBA_CYAN),
            frames: vec![frame("00", RGBA_BLUE), frame("01", RGBA_GREEN)],
        }],
        ..Default::default()
    };
    let mut diags = Diagnostics::new();
    let mut ctx = CompileCtx::new(&config, &mut diags);
    let compiled = compiler::compile(&mut ctx, &decompiled, None).unwrap();
    let dir = emit_to_tempdir(&config, &compiled);

    let anim_dir = dir.path().join("anims/water");
    assert!(anim_dir.join("00.png").is_file());
    assert!(anim_dir.join("01.png").is_file());
    assert!(!anim_dir.join("key.png").exists());

    let frame_png = image::open(anim_dir.join("00.png")).unwrap().to_rgba8();
    assert_eq!(frame_png.width(), 8);
    assert_eq!(frame_png.height(), 8);
}
