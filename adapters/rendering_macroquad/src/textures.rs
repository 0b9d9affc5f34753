use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use glam::Vec2;
use macroquad::{
    math::Vec2 as MacroquadVec2,
    texture::{self, DrawTextureParams, Texture2D},
};

use gridvale_core::{ObjectKind, StructureKind, TerrainKind};
use gridvale_rendering::{Color, TextureKey};

use crate::to_macroquad_color;

const SUPPORTED_MANIFEST_VERSION: u32 = 1;

/// Parameters describing how a texture should be drawn on screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawParams {
    /// Position in screen-space pixels where the texture's top-left corner is placed.
    pub position: Vec2,
    /// Desired size in screen-space pixels.
    pub size: Vec2,
    /// Rotation applied around the texture center, in radians.
    pub rotation_radians: f32,
    /// Tint applied to the texture.
    pub tint: Color,
}

impl DrawParams {
    /// Creates draw parameters anchored at the provided position and size.
    #[must_use]
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self {
            position,
            size,
            rotation_radians: 0.0,
            tint: Color::new(1.0, 1.0, 1.0, 1.0),
        }
    }

    /// Overrides the rotation applied when drawing the texture.
    #[must_use]
    pub fn with_rotation(mut self, rotation_radians: f32) -> Self {
        self.rotation_radians = rotation_radians;
        self
    }

    /// Overrides the tint colour used when drawing the texture.
    #[must_use]
    pub fn with_tint(mut self, tint: Color) -> Self {
        self.tint = tint;
        self
    }
}

/// Cache of textures loaded from the texture manifest.
///
/// Unlike a strict sprite atlas, the catalog accepts any subset of the known
/// keys; callers fall back to procedural drawing for absent entries, so a
/// repository without art assets still runs.
#[derive(Debug, Default)]
pub struct TextureCatalog {
    textures: HashMap<TextureKey, Texture2D>,
}

impl TextureCatalog {
    /// Returns the default manifest path relative to the repository root.
    #[must_use]
    pub fn default_manifest_path() -> PathBuf {
        PathBuf::from("assets/manifest.toml")
    }

    /// Creates an empty catalog; every lookup falls back.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads the default manifest, yielding an empty catalog when the
    /// manifest file does not exist.
    pub fn load_or_empty() -> Result<Self> {
        let path = Self::default_manifest_path();
        if !path.exists() {
            return Ok(Self::empty());
        }
        Self::from_manifest_path(path)
    }

    /// Loads textures from the manifest located at the provided path.
    pub fn from_manifest_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_manifest_with_loader(path, default_loader)
    }

    /// Draws the requested texture, reporting whether an entry existed.
    ///
    /// Returns `false` when the key is absent so the caller can fall back.
    pub fn draw(&self, key: TextureKey, params: DrawParams) -> bool {
        let Some(texture) = self.textures.get(&key) else {
            return false;
        };

        let dest_size = MacroquadVec2::new(params.size.x, params.size.y);
        let pivot = MacroquadVec2::new(
            params.position.x + dest_size.x * 0.5,
            params.position.y + dest_size.y * 0.5,
        );
        let draw_params = DrawTextureParams {
            dest_size: Some(dest_size),
            rotation: params.rotation_radians,
            pivot: Some(pivot),
            ..DrawTextureParams::default()
        };

        texture::draw_texture_ex(
            *texture,
            params.position.x,
            params.position.y,
            to_macroquad_color(params.tint),
            draw_params,
        );

        true
    }

    /// Returns whether the catalog contains the provided key.
    #[must_use]
    pub fn contains(&self, key: TextureKey) -> bool {
        self.textures.contains_key(&key)
    }

    /// Returns the number of textures stored in the catalog.
    #[must_use]
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    fn from_manifest_with_loader(
        path: impl AsRef<Path>,
        mut loader: impl FnMut(TextureKey, &Path) -> Result<Texture2D>,
    ) -> Result<Self> {
        let manifest_path = path.as_ref();
        let contents = fs::read_to_string(manifest_path).with_context(|| {
            format!(
                "failed to read texture manifest at {}",
                manifest_path.display()
            )
        })?;
        let base = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let entries = parse_manifest(&contents, &base)?;
        Self::from_entries(entries, &mut loader)
    }

    fn from_entries(
        entries: Vec<(TextureKey, PathBuf)>,
        loader: &mut impl FnMut(TextureKey, &Path) -> Result<Texture2D>,
    ) -> Result<Self> {
        let mut textures = HashMap::with_capacity(entries.len());
        for (key, path) in entries {
            let texture = loader(key, &path).with_context(|| {
                format!("failed to load texture {key:?} from {}", path.display())
            })?;
            if textures.insert(key, texture).is_some() {
                bail!("duplicate texture entry for {key:?}");
            }
        }
        Ok(Self { textures })
    }
}

fn default_loader(_key: TextureKey, path: &Path) -> Result<Texture2D> {
    let bytes = fs::read(path)
        .with_context(|| format!("failed to read texture asset at {}", path.display()))?;
    Ok(Texture2D::from_file_with_format(&bytes, None))
}

#[derive(Debug, serde::Deserialize)]
struct Manifest {
    version: u32,
    textures: HashMap<String, String>,
}

fn parse_manifest(contents: &str, base_path: &Path) -> Result<Vec<(TextureKey, PathBuf)>> {
    let manifest: Manifest =
        toml::from_str(contents).context("failed to parse texture manifest toml contents")?;
    if manifest.version != SUPPORTED_MANIFEST_VERSION {
        bail!(
            "unsupported texture manifest version {}; expected {}",
            manifest.version,
            SUPPORTED_MANIFEST_VERSION
        );
    }

    let mut entries: Vec<(TextureKey, PathBuf)> = Vec::with_capacity(manifest.textures.len());
    for (name, relative_path) in manifest.textures {
        let key = parse_texture_key(&name)
            .with_context(|| format!("unknown texture key `{name}` in manifest"))?;
        if entries.iter().any(|(existing, _)| *existing == key) {
            bail!("texture manifest contains duplicate entry for {key:?}");
        }
        entries.push((key, base_path.join(relative_path)));
    }
    entries.sort_by_key(|(key, _)| format!("{key:?}"));
    Ok(entries)
}

fn parse_texture_key(name: &str) -> Result<TextureKey> {
    if let Some((terrain, variant)) = parse_terrain_name(name) {
        return Ok(TextureKey::Terrain {
            kind: terrain,
            variant,
        });
    }

    let key = match name {
        "tree_simple" => TextureKey::Object(ObjectKind::TreeSimple),
        "tree_pine" => TextureKey::Object(ObjectKind::TreePine),
        "tree_fruit" => TextureKey::Object(ObjectKind::TreeFruit),
        "tree_autumn" => TextureKey::Object(ObjectKind::TreeAutumn),
        "rock_small" => TextureKey::Object(ObjectKind::RockSmall),
        "rock_medium" => TextureKey::Object(ObjectKind::RockMedium),
        "rock_big" => TextureKey::Object(ObjectKind::RockBig),
        "house" => TextureKey::Structure(StructureKind::House),
        "factory" => TextureKey::Structure(StructureKind::Factory),
        "farm" => TextureKey::Structure(StructureKind::Farm),
        "tower" => TextureKey::Structure(StructureKind::Tower),
        "water_well" => TextureKey::Structure(StructureKind::WaterWell),
        "windmill" => TextureKey::Structure(StructureKind::Windmill),
        "farmer_house" => TextureKey::Structure(StructureKind::FarmerHouse),
        "fisherman_house" => TextureKey::Structure(StructureKind::FishermanHouse),
        "lumberjack_house" => TextureKey::Structure(StructureKind::LumberjackHouse),
        "miner_house" => TextureKey::Structure(StructureKind::MinerHouse),
        "silo" => TextureKey::Structure(StructureKind::Silo),
        _ => bail!("unknown texture key `{name}`"),
    };
    Ok(key)
}

fn parse_terrain_name(name: &str) -> Option<(TerrainKind, u8)> {
    match name {
        "water" => return Some((TerrainKind::Water, 1)),
        "mountain" => return Some((TerrainKind::Mountain, 1)),
        "sand" => return Some((TerrainKind::Sand, 1)),
        _ => {}
    }

    let (base, variant) = name.rsplit_once('_')?;
    let variant: u8 = variant.parse().ok()?;
    if !(1..=4).contains(&variant) {
        return None;
    }
    let kind = match base {
        "grass" => TerrainKind::Grass,
        "forest" => TerrainKind::Forest,
        _ => return None,
    };
    Some((kind, variant))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn manifest_accepts_a_subset_of_known_keys() {
        let manifest = r#"
            version = 1

            [textures]
            grass_1 = "terrain/grass_1.png"
            house = "structures/house.png"
        "#;

        let parsed = parse_manifest(manifest, Path::new("assets")).expect("subset should parse");
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn manifest_rejects_unknown_keys() {
        let manifest = r#"
            version = 1

            [textures]
            grass_1 = "terrain/grass_1.png"
            castle = "structures/castle.png"
        "#;

        assert!(parse_manifest(manifest, Path::new("assets")).is_err());
    }

    #[test]
    fn manifest_rejects_unsupported_versions() {
        let manifest = r#"
            version = 2

            [textures]
            water = "terrain/water.png"
        "#;

        assert!(parse_manifest(manifest, Path::new("assets")).is_err());
    }

    #[test]
    fn manifest_resolves_paths_relative_to_base_directory() {
        let manifest = r#"
            version = 1

            [textures]
            water = "terrain/water.png"
        "#;

        let parsed = parse_manifest(manifest, Path::new("root")).expect("manifest should parse");
        assert_eq!(
            parsed,
            vec![(
                TextureKey::Terrain {
                    kind: TerrainKind::Water,
                    variant: 1
                },
                PathBuf::from("root/terrain/water.png")
            )]
        );
    }

    #[test]
    fn terrain_variants_parse_within_range() {
        assert_eq!(
            parse_terrain_name("grass_4"),
            Some((TerrainKind::Grass, 4))
        );
        assert_eq!(
            parse_terrain_name("forest_2"),
            Some((TerrainKind::Forest, 2))
        );
        assert_eq!(parse_terrain_name("grass_5"), None);
        assert_eq!(parse_terrain_name("swamp_1"), None);
    }

    #[test]
    fn catalog_loads_each_texture_once() {
        let manifest = r#"
            version = 1

            [textures]
            tree_pine = "objects/tree_pine.png"
            rock_big = "objects/rock_big.png"
        "#;
        let entries = parse_manifest(manifest, Path::new("assets")).expect("manifest parses");
        let load_counts = RefCell::new(HashMap::new());
        let catalog = TextureCatalog::from_entries(entries, &mut |key, _| {
            *load_counts.borrow_mut().entry(key).or_insert(0) += 1;
            Ok(Texture2D::empty())
        })
        .expect("catalog should load");

        assert_eq!(catalog.texture_count(), 2);
        assert!(catalog.contains(TextureKey::Object(ObjectKind::TreePine)));
        assert!(!catalog.contains(TextureKey::Object(ObjectKind::TreeSimple)));
        for count in load_counts.into_inner().into_values() {
            assert_eq!(count, 1);
        }
    }
}
