//! # Tileset Data Model
//!
//! Value types flowing through the compile pipeline. A `DecompiledTileset`
//! is what the importer produces from the layer sheets; a `CompiledTileset`
//! is the finished hardware representation the emitter serialises. Nothing
//! here touches the filesystem.

pub mod attributes;
pub mod colour;
pub mod colour_set;
pub mod palette;
pub mod tile;

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use twox_hash::XxHash64;

use self::attributes::Attributes;
use self::colour::Bgr15;
use self::palette::GbaPalette;
use self::tile::{GbaTile, RgbaTile};

/// One frame of animation artwork, cut into tiles left-to-right,
/// top-to-bottom.
#[derive(Clone, Debug)]
pub struct AnimFrame {
    pub name: String,
    pub tiles: Vec<RgbaTile>,
    pub width_tiles: usize,
    pub height_tiles: usize,
}

/// An imported animation: the artist-facing key frame plus the numbered
/// frames the game actually cycles through.
#[derive(Clone, Debug)]
pub struct DecompiledAnimation {
    pub name: String,
    pub key: AnimFrame,
    pub frames: Vec<AnimFrame>,
}

impl DecompiledAnimation {
    /// Tile slots this animation reserves in the compiled sheet.
    pub fn slot_count(&self) -> usize {
        self.key.tiles.len()
    }
}

/// Importer output: subtiles in metatile-major order (pack order decided by
/// each metatile's layer type), one attribute record per metatile, plus any
/// animations found under anims/.
#[derive(Clone, Debug, Default)]
pub struct DecompiledTileset {
    pub tiles: Vec<RgbaTile>,
    pub attributes: Vec<Attributes>,
    pub anims: Vec<DecompiledAnimation>,
}

impl DecompiledTileset {
    pub fn metatile_count(&self) -> usize {
        self.attributes.len()
    }
}

/// Final placement of one subtile: which hardware tile, which palette, and
/// the flips that recover the source orientation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Assignment {
    pub tile_index: u16,
    pub palette_index: u8,
    pub h_flip: bool,
    pub v_flip: bool,
}

impl Assignment {
    /// Pack into the hardware tilemap entry: tile index in bits 0-9, hFlip
    /// bit 10, vFlip bit 11, palette in bits 12-15.
    pub fn to_u16(&self) -> u16 {
        (self.tile_index & 0x3FF)
            | ((self.h_flip as u16) << 10)
            | ((self.v_flip as u16) << 11)
            | (((self.palette_index as u16) & 0xF) << 12)
    }

    pub fn from_u16(value: u16) -> Self {
        Assignment {
            tile_index: value & 0x3FF,
            h_flip: (value & 0x400) != 0,
            v_flip: (value & 0x800) != 0,
            palette_index: ((value >> 12) & 0xF) as u8,
        }
    }
}

/// A compiled animation: reserved slot range, per-slot palettes, and every
/// numbered frame translated to hardware tiles.
#[derive(Clone, Debug)]
pub struct CompiledAnimation {
    pub name: String,
    /// First reserved tile index (already includes the secondary VRAM
    /// offset when compiled in secondary mode).
    pub start_tile: u16,
    pub slot_palettes: Vec<u8>,
    pub frames: Vec<CompiledAnimFrame>,
}

#[derive(Clone, Debug)]
pub struct CompiledAnimFrame {
    pub name: String,
    pub tiles: Vec<GbaTile>,
    pub width_tiles: usize,
    pub height_tiles: usize,
}

/// The compiled tileset. The only value that escapes a compile invocation;
/// a secondary compile reads its paired primary exclusively through this
/// shape.
#[derive(Clone, Debug, Default)]
pub struct CompiledTileset {
    pub tiles: Vec<GbaTile>,
    pub palette_indexes_of_tile: Vec<u8>,
    pub palettes: Vec<GbaPalette>,
    pub assignments: Vec<Assignment>,
    pub attributes: Vec<Attributes>,
    pub anims: Vec<CompiledAnimation>,
    /// Global colour index built during this compile (seeded from the
    /// paired primary in secondary mode).
    pub colour_index_map: HashMap<Bgr15, usize>,
    /// Content hash of each deduplicated tile to its position(s) in
    /// `tiles`. Animation slots are excluded: a look-alike layer tile must
    /// not silently start animating.
    tile_indexes: HashMap<u64, Vec<u16>>,
}

impl CompiledTileset {
    fn hash_tile(tile: &GbaTile) -> u64 {
        let mut hasher = XxHash64::default();
        tile.pixels.hash(&mut hasher);
        hasher.finish()
    }

    /// Position of a content-identical tile, verifying candidates against
    /// the stored pixels to survive hash collisions.
    pub fn find_tile(&self, tile: &GbaTile) -> Option<u16> {
        let hash = Self::hash_tile(tile);
        self.tile_indexes.get(&hash).and_then(|candidates| {
            candidates
                .iter()
                .copied()
                .find(|&i| self.tiles[i as usize] == *tile)
        })
    }

    /// Append a tile and register it for deduplication. Capacity checks are
    /// the caller's responsibility.
    pub fn insert_tile(&mut self, tile: GbaTile, palette_index: u8) -> u16 {
        let index = self.tiles.len() as u16;
        self.tile_indexes
            .entry(Self::hash_tile(&tile))
            .or_default()
            .push(index);
        self.tiles.push(tile);
        self.palette_indexes_of_tile.push(palette_index);
        index
    }

    /// Append a reserved animation tile without registering it for
    /// deduplication.
    pub fn insert_anim_tile(&mut self, tile: GbaTile, palette_index: u8) -> u16 {
        let index = self.tiles.len() as u16;
        self.tiles.push(tile);
        self.palette_indexes_of_tile.push(palette_index);
        index
    }
}
