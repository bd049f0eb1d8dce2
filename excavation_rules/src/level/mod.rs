//! Level configuration - everything loaded once at level start.
//!
//! A level file describes the soil grid, the fossil tuning, the catalog of
//! fossils the spawner picks from and the tool profiles. It can be written as
//! TOML or JSON; nothing in it changes during play.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::ConfigError;
use crate::geometry::Aabb;
use crate::mechanics::ToolTable;

/// Soil grid layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Cells along X.
    pub width: u32,
    /// Cells along Z.
    pub length: u32,
    /// Cells along Y.
    pub height: u32,
    /// Distance between block centers, also the block edge length.
    pub spacing: f32,
    /// World-space center of block (0, 0, 0).
    pub origin: Vec3,
    pub density: f32,
    pub moisture: f32,
    /// Cells that start as embedded fossil fragments.
    pub fossil_cells: Vec<[i32; 3]>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 10,
            length: 10,
            height: 10,
            spacing: 0.1,
            origin: Vec3::ZERO,
            density: 1.0,
            moisture: 0.5,
            fossil_cells: Vec::new(),
        }
    }
}

impl GridConfig {
    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        self.width as usize * self.length as usize * self.height as usize
    }

    /// World-space volume covered by the blocks.
    pub fn bounds(&self) -> Aabb {
        let half = Vec3::splat(self.spacing * 0.5);
        let last = Vec3::new(
            self.width.saturating_sub(1) as f32,
            self.height.saturating_sub(1) as f32,
            self.length.saturating_sub(1) as f32,
        ) * self.spacing;
        Aabb::new(self.origin - half, self.origin + last + half)
    }

    fn contains_cell(&self, cell: [i32; 3]) -> bool {
        let [x, y, z] = cell;
        (0..self.width as i32).contains(&x)
            && (0..self.height as i32).contains(&y)
            && (0..self.length as i32).contains(&z)
    }
}

/// Fossil tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FossilConfig {
    /// Where the spawner places the fossil.
    pub spawn_point: Vec3,
    /// Half-size of the collision volume.
    pub half_extents: Vec3,
    pub max_durability: f32,
    /// Blocks whose center is within this distance of the fossil are NearFossil.
    pub detection_radius: f32,
    /// Blocks whose center is within this distance of the spawn point are
    /// removed at spawn. Zero disables the clear.
    pub clear_radius: f32,
    /// Radius around the fossil checked for remaining NearFossil soil.
    pub surround_check_radius: f32,
    /// Seconds the broken fossil stays visible before fading.
    pub fade_hold: f32,
    /// Seconds the fade takes.
    pub fade_duration: f32,
    /// Seconds the fossil must stay still to count as landed.
    pub settle_window: f32,
    /// Per-tick vertical movement below which the fossil counts as still.
    pub settle_epsilon: f32,
    pub gravity: f32,
    pub linear_damping: f32,
}

impl Default for FossilConfig {
    fn default() -> Self {
        Self {
            spawn_point: Vec3::splat(0.5),
            half_extents: Vec3::new(0.15, 0.08, 0.15),
            max_durability: 100.0,
            detection_radius: 0.15,
            clear_radius: 0.1,
            surround_check_radius: 1.0,
            fade_hold: 0.5,
            fade_duration: 1.0,
            settle_window: 0.5,
            settle_epsilon: 0.01,
            gravity: 9.81,
            linear_damping: 1.0,
        }
    }
}

/// One collectible fossil the spawner can pick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub fossil_id: u32,
    /// Selects the visual/collectible variant.
    pub model_id: u32,
    pub name: String,
}

/// The fossils a level can spawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct FossilCatalog {
    entries: Vec<CatalogEntry>,
}

impl FossilCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&CatalogEntry> {
        self.entries.get(index)
    }

    /// Find an entry by fossil id.
    pub fn find(&self, fossil_id: u32) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.fossil_id == fossil_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Complete configuration of one level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LevelConfig {
    /// Seed for catalog selection; random when absent.
    pub seed: Option<u64>,
    pub grid: GridConfig,
    pub fossil: FossilConfig,
    pub catalog: FossilCatalog,
    pub tools: ToolTable,
}

impl LevelConfig {
    /// Parse and validate a TOML level description.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: LevelConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON level description.
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        let config: LevelConfig = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a level file, picking the format from its extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;

        let result = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&source),
            Some("json") => Self::from_json_str(&source),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        };

        match &result {
            Ok(config) => log::info!(
                "Loaded level config from {} ({} cells, {} fossils)",
                path.display(),
                config.grid.cell_count(),
                config.catalog.len()
            ),
            Err(err) => log::error!("Rejected level config {}: {}", path.display(), err),
        }
        result
    }

    /// Check every value the simulation divides by or relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let grid = &self.grid;
        for (name, value) in [
            ("grid.width", grid.width),
            ("grid.length", grid.length),
            ("grid.height", grid.height),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroDimension { name });
            }
        }

        let fossil = &self.fossil;
        for (name, value) in [
            ("grid.spacing", grid.spacing),
            ("grid.density", grid.density),
            ("fossil.max_durability", fossil.max_durability),
            ("fossil.detection_radius", fossil.detection_radius),
            ("fossil.surround_check_radius", fossil.surround_check_radius),
            ("fossil.settle_window", fossil.settle_window),
            ("fossil.settle_epsilon", fossil.settle_epsilon),
            ("fossil.gravity", fossil.gravity),
        ] {
            // Written this way so NaN is rejected too
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive { name, value });
            }
        }

        for (name, value) in [
            ("fossil.clear_radius", fossil.clear_radius),
            ("fossil.fade_hold", fossil.fade_hold),
            ("fossil.fade_duration", fossil.fade_duration),
            ("fossil.linear_damping", fossil.linear_damping),
        ] {
            if !(value >= 0.0) {
                return Err(ConfigError::Negative { name, value });
            }
        }

        let tools = &self.tools;
        for (tool, profile) in [
            ("chisel_hammer", &tools.chisel_hammer),
            ("drill", &tools.drill),
            ("brush", &tools.brush),
            ("glue", &tools.glue),
        ] {
            if let Some((field, value)) = profile.fields().into_iter().find(|(_, v)| !(*v >= 0.0)) {
                return Err(ConfigError::NegativeToolValue { tool, field, value });
            }
        }

        if !(0.0..=1.0).contains(&grid.moisture) {
            return Err(ConfigError::OutOfUnitRange {
                name: "grid.moisture",
                value: grid.moisture,
            });
        }

        if let Some(cell) = grid.fossil_cells.iter().find(|c| !grid.contains_cell(**c)) {
            return Err(ConfigError::CellOutOfBounds(*cell));
        }

        if !grid.bounds().contains_point(fossil.spawn_point) {
            return Err(ConfigError::SpawnOutOfBounds(fossil.spawn_point.to_array()));
        }

        if self.catalog.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        let mut seen = HashSet::new();
        for entry in self.catalog.entries() {
            if !seen.insert(entry.fossil_id) {
                return Err(ConfigError::DuplicateFossilId(entry.fossil_id));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEVEL_TOML: &str = r#"
        seed = 42

        [grid]
        width = 5
        length = 5
        height = 1
        spacing = 1.0
        fossil_cells = [[0, 0, 0]]

        [fossil]
        spawn_point = [2.0, 0.0, 2.0]
        half_extents = [0.4, 0.4, 0.4]
        detection_radius = 1.0
        clear_radius = 0.0

        [[catalog]]
        fossil_id = 1
        model_id = 10
        name = "Trilobite"

        [[catalog]]
        fossil_id = 2
        model_id = 20
        name = "Ammonite"

        [tools.drill]
        base_damage = 0.6
    "#;

    fn catalog() -> FossilCatalog {
        FossilCatalog::new(vec![CatalogEntry {
            fossil_id: 1,
            model_id: 1,
            name: "Raptor claw".to_string(),
        }])
    }

    #[test]
    fn test_parse_toml() {
        let config = LevelConfig::from_toml_str(LEVEL_TOML).unwrap();

        assert_eq!(config.seed, Some(42));
        assert_eq!(config.grid.width, 5);
        assert_eq!(config.grid.cell_count(), 25);
        assert_eq!(config.grid.fossil_cells, vec![[0, 0, 0]]);
        assert_eq!(config.fossil.spawn_point, Vec3::new(2.0, 0.0, 2.0));
        assert_eq!(config.catalog.len(), 2);
        assert_eq!(config.catalog.find(2).unwrap().name, "Ammonite");

        // Unspecified values fall back to defaults
        assert_eq!(config.fossil.max_durability, 100.0);
        assert!((config.tools.drill.base_damage - 0.6).abs() < 0.001);
        assert!((config.tools.chisel_hammer.base_damage - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_json_matches_toml() {
        let from_toml = LevelConfig::from_toml_str(LEVEL_TOML).unwrap();
        let json = serde_json::to_string(&from_toml).unwrap();
        let from_json = LevelConfig::from_json_str(&json).unwrap();

        assert_eq!(from_toml, from_json);
    }

    #[test]
    fn test_empty_catalog_rejected() {
        let config = LevelConfig::default();
        assert!(matches!(config.validate(), Err(ConfigError::EmptyCatalog)));
    }

    #[test]
    fn test_duplicate_fossil_id_rejected() {
        let mut config = LevelConfig {
            catalog: catalog(),
            ..Default::default()
        };
        config.catalog.entries.push(config.catalog.entries[0].clone());

        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateFossilId(1))
        ));
    }

    #[test]
    fn test_non_positive_density_rejected() {
        let mut config = LevelConfig {
            catalog: catalog(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        config.grid.density = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive {
                name: "grid.density",
                ..
            })
        ));

        config.grid.density = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let mut config = LevelConfig {
            catalog: catalog(),
            ..Default::default()
        };
        config.grid.height = 0;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroDimension { name: "grid.height" })
        ));
    }

    #[test]
    fn test_fossil_cell_out_of_bounds() {
        let mut config = LevelConfig {
            catalog: catalog(),
            ..Default::default()
        };
        config.grid.fossil_cells.push([10, 0, 0]);

        assert!(matches!(
            config.validate(),
            Err(ConfigError::CellOutOfBounds([10, 0, 0]))
        ));
    }

    #[test]
    fn test_negative_tuning_rejected() {
        let mut config = LevelConfig {
            catalog: catalog(),
            ..Default::default()
        };
        config.fossil.clear_radius = 0.0;
        config.fossil.fade_hold = 0.0;
        assert!(config.validate().is_ok());

        config.fossil.fade_duration = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Negative {
                name: "fossil.fade_duration",
                ..
            })
        ));

        config.fossil.fade_duration = 1.0;
        config.tools.drill.reach = -0.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NegativeToolValue {
                tool: "drill",
                field: "reach",
                ..
            })
        ));
    }

    #[test]
    fn test_spawn_point_outside_grid() {
        let mut config = LevelConfig {
            catalog: catalog(),
            ..Default::default()
        };
        // Default grid spans -0.05..0.95 on every axis
        config.fossil.spawn_point = Vec3::new(0.9, 0.9, 0.9);
        assert!(config.validate().is_ok());

        config.fossil.spawn_point = Vec3::new(0.5, 0.5, 3.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SpawnOutOfBounds([_, _, z])) if z == 3.0
        ));
    }

    #[test]
    fn test_unsupported_extension() {
        let path = std::env::temp_dir().join("excavation_level_test.yaml");
        std::fs::write(&path, "grid: {}").unwrap();

        let result = LevelConfig::load(&path);
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(ext)) if ext == "yaml"));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_toml_file() {
        let path = std::env::temp_dir().join("excavation_level_test.toml");
        std::fs::write(&path, LEVEL_TOML).unwrap();

        let config = LevelConfig::load(&path).unwrap();
        assert_eq!(config.catalog.len(), 2);

        std::fs::remove_file(&path).ok();
    }
}
