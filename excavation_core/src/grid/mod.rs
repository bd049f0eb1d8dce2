//! Soil grid - owner of every soil block, keyed by grid coordinate.

use glam::Vec3;
use std::collections::HashMap;

use excavation_rules::{
    Aabb, ConfigError, FossilEntity, GridConfig, GridCoord, Ray, Shape, SoilBlock, SoilType,
};

/// How a block relates to the fossil's volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Proximity {
    /// The block shares volume with the fossil and must go.
    Overlaps,
    /// Within detection radius. `promoted` is set when this call turned a
    /// Normal block into NearFossil.
    Near { promoted: bool },
    /// Out of range, or no such block.
    Clear,
}

/// The destructible medium.
///
/// Blocks are only reachable by coordinate. Any lookup made before a
/// mutating call must be repeated after it.
#[derive(Debug, Clone)]
pub struct SoilGrid {
    blocks: HashMap<GridCoord, SoilBlock>,
    origin: Vec3,
    spacing: f32,
    /// Cells along X, Y and Z.
    dimensions: [u32; 3],
}

impl SoilGrid {
    /// Fill the whole width x height x length box with intact blocks.
    pub fn generate(config: &GridConfig) -> Result<Self, ConfigError> {
        for (name, value) in [
            ("grid.width", config.width),
            ("grid.length", config.length),
            ("grid.height", config.height),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroDimension { name });
            }
        }
        for (name, value) in [("grid.spacing", config.spacing), ("grid.density", config.density)] {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive { name, value });
            }
        }

        let mut grid = Self {
            blocks: HashMap::with_capacity(config.cell_count()),
            origin: config.origin,
            spacing: config.spacing,
            dimensions: [config.width, config.height, config.length],
        };

        for x in 0..config.width as i32 {
            for z in 0..config.length as i32 {
                for y in 0..config.height as i32 {
                    let coord = GridCoord::new(x, y, z);
                    let soil_type = if config.fossil_cells.contains(&[x, y, z]) {
                        SoilType::Fossil
                    } else {
                        SoilType::Normal
                    };
                    let block = SoilBlock::new(
                        coord,
                        grid.coord_to_world(coord),
                        config.spacing,
                        config.density,
                    )
                    .with_moisture(config.moisture)
                    .with_soil_type(soil_type);
                    grid.blocks.insert(coord, block);
                }
            }
        }

        log::info!(
            "Generated soil grid {}x{}x{} ({} blocks, spacing {})",
            config.width,
            config.height,
            config.length,
            grid.blocks.len(),
            config.spacing
        );
        Ok(grid)
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    pub fn dimensions(&self) -> [u32; 3] {
        self.dimensions
    }

    /// World-space center of a cell.
    pub fn coord_to_world(&self, coord: GridCoord) -> Vec3 {
        self.origin + Vec3::new(coord.x as f32, coord.y as f32, coord.z as f32) * self.spacing
    }

    /// Cell containing a world-space point.
    pub fn world_to_coord(&self, point: Vec3) -> GridCoord {
        let local = ((point - self.origin) / self.spacing).round();
        GridCoord::new(local.x as i32, local.y as i32, local.z as i32)
    }

    /// Height of the bottom face of the lowest layer.
    pub fn floor_height(&self) -> f32 {
        self.origin.y - self.spacing * 0.5
    }

    pub fn get(&self, coord: GridCoord) -> Option<&SoilBlock> {
        self.blocks.get(&coord)
    }

    pub fn get_mut(&mut self, coord: GridCoord) -> Option<&mut SoilBlock> {
        self.blocks.get_mut(&coord)
    }

    pub fn contains(&self, coord: GridCoord) -> bool {
        self.blocks.contains_key(&coord)
    }

    /// Take a block out of the grid. Removing a missing block returns `None`.
    pub fn remove(&mut self, coord: GridCoord) -> Option<SoilBlock> {
        self.blocks.remove(&coord)
    }

    /// Number of live blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Iterate over all live blocks.
    pub fn blocks(&self) -> impl Iterator<Item = &SoilBlock> {
        self.blocks.values()
    }

    /// All live coordinates, sorted.
    pub fn coords(&self) -> Vec<GridCoord> {
        let mut coords: Vec<_> = self.blocks.keys().copied().collect();
        coords.sort();
        coords
    }

    /// Count live blocks of one classification.
    pub fn count_of(&self, soil_type: SoilType) -> usize {
        self.blocks
            .values()
            .filter(|b| b.soil_type() == soil_type)
            .count()
    }

    /// Live coordinates whose block volume touches the shape, sorted.
    pub fn blocks_in(&self, shape: &Shape) -> Vec<GridCoord> {
        let mut coords: Vec<_> = self
            .coords_around(&shape.bounds())
            .filter(|c| {
                self.blocks
                    .get(c)
                    .is_some_and(|b| shape.intersects_aabb(&b.bounds()))
            })
            .collect();
        coords.sort();
        coords
    }

    /// Live coordinates whose block center lies within `radius` of `center`, sorted.
    pub fn coords_in_sphere(&self, center: Vec3, radius: f32) -> Vec<GridCoord> {
        if !(radius > 0.0) {
            return Vec::new();
        }
        let bounds = Aabb::from_center_half_extent(center, Vec3::splat(radius));
        let mut coords: Vec<_> = self
            .coords_around(&bounds)
            .filter(|c| {
                self.blocks
                    .get(c)
                    .is_some_and(|b| b.center().distance(center) <= radius)
            })
            .collect();
        coords.sort();
        coords
    }

    /// Live neighbours of a cell (face, edge and corner).
    pub fn neighbors(&self, coord: GridCoord) -> Vec<GridCoord> {
        coord.neighbors().filter(|c| self.contains(*c)).collect()
    }

    /// First block hit by a ray within `max_distance`.
    pub fn raycast(&self, ray: &Ray, max_distance: f32) -> Option<(GridCoord, f32)> {
        let end = ray.at(max_distance);
        let bounds = Aabb::new(ray.origin.min(end), ray.origin.max(end));

        self.coords_around(&bounds)
            .filter_map(|c| {
                let block = self.blocks.get(&c)?;
                let t = ray.intersects_aabb(&block.bounds())?;
                (t <= max_distance).then_some((c, t))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)))
    }

    /// Classify one block against a fossil, promoting Normal to NearFossil.
    pub fn classify(
        &mut self,
        coord: GridCoord,
        fossil: &FossilEntity,
        detection_radius: f32,
    ) -> Proximity {
        let Some(block) = self.blocks.get_mut(&coord) else {
            return Proximity::Clear;
        };

        let volume = fossil.bounds();
        if volume.overlaps(&block.bounds()) {
            return Proximity::Overlaps;
        }
        if volume.intersects_sphere(block.center(), detection_radius) {
            return Proximity::Near {
                promoted: block.mark_near_fossil(fossil.id()),
            };
        }
        Proximity::Clear
    }

    /// Height the bottom of a falling volume comes to rest at.
    ///
    /// This is the top of the highest live block under the footprint that is
    /// not above the volume's bottom, or the grid floor.
    pub fn support_height(&self, volume: &Aabb) -> f32 {
        let floor = self.floor_height();
        let column = Aabb::new(
            Vec3::new(volume.min.x, floor, volume.min.z),
            Vec3::new(volume.max.x, volume.min.y, volume.max.z),
        );
        let tolerance = self.spacing * 1e-3;

        self.coords_around(&column)
            .filter_map(|c| self.blocks.get(&c))
            .map(|b| b.bounds())
            .filter(|b| b.overlaps_footprint(volume) && b.max.y <= volume.min.y + tolerance)
            .map(|b| b.max.y)
            .fold(floor, f32::max)
    }

    /// Cells of the grid box that could touch `bounds`, padded by one cell.
    fn coords_around(&self, bounds: &Aabb) -> impl Iterator<Item = GridCoord> {
        let lo = self.world_to_coord(bounds.min);
        let hi = self.world_to_coord(bounds.max);
        let [width, height, length] = self.dimensions;

        let span = |lo: i32, hi: i32, cells: u32| {
            lo.saturating_sub(1).max(0)..=hi.saturating_add(1).min(cells as i32 - 1)
        };
        let x_range = span(lo.x, hi.x, width);
        let y_range = span(lo.y, hi.y, height);
        let z_range = span(lo.z, hi.z, length);

        x_range.flat_map(move |x| {
            let z_range = z_range.clone();
            y_range
                .clone()
                .flat_map(move |y| z_range.clone().map(move |z| GridCoord::new(x, y, z)))
        })
    }
}
