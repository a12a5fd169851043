//! Tile-indexed polygon region.
//!
//! A uniform grid is laid over the polygon's bounding box and every cell is
//! classified once at construction. Queries answer from the cell when it is
//! fully inside or fully outside, and fall back to the exact polygon test
//! only for cells the boundary passes through.

use geo::coordinate_position::{CoordPos, CoordinatePosition};
use geo::{Area, BoundingRect, Coord, LineString, Polygon, Rect};
use rayon::prelude::*;
use tracing::{debug, trace};

use super::geometry::{rect_contains_coord, Ring};
use crate::config::{GridConfig, MAX_GRANULARITY};
use crate::error::RegionError;

/// Classification of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileClass {
    /// Every point of the cell is inside the region.
    In,
    /// Every point of the cell is outside the region.
    Out,
    /// The region boundary passes through the cell.
    Either,
}

/// A polygon region with a precomputed tile index.
///
/// Immutable after construction, so shared references can be queried from
/// any number of threads.
#[derive(Debug, Clone)]
pub struct TileIndexedRegion {
    granularity: u32,
    shape: Shape,
}

#[derive(Debug, Clone)]
enum Shape {
    /// Degenerate input. Contains no point.
    Empty,
    Indexed(TileGrid),
}

#[derive(Debug, Clone)]
struct TileGrid {
    polygon: Polygon<f64>,
    bounds: Rect<f64>,
    cell_width: f64,
    cell_height: f64,
    min_tile_x: i64,
    min_tile_y: i64,
    cols: usize,
    rows: usize,
    /// Row-major, indexed relative to the minimum tile.
    tiles: Vec<TileClass>,
}

impl TileIndexedRegion {
    /// Build a region from a boundary ring using the default grid config.
    pub fn new<I, C>(vertices: I) -> Result<Self, RegionError>
    where
        I: IntoIterator<Item = C>,
        C: Into<Coord<f64>>,
    {
        Self::build(vertices, GridConfig::default())
    }

    /// Build a region from a boundary ring. The ring is closed implicitly.
    pub fn build<I, C>(vertices: I, config: GridConfig) -> Result<Self, RegionError>
    where
        I: IntoIterator<Item = C>,
        C: Into<Coord<f64>>,
    {
        let exterior: Vec<Coord<f64>> = vertices.into_iter().map(Into::into).collect();
        Self::from_polygon(Polygon::new(LineString::new(exterior), vec![]), config)
    }

    /// Build a region from a polygon whose interior rings are excluded holes.
    pub fn from_polygon(polygon: Polygon<f64>, config: GridConfig) -> Result<Self, RegionError> {
        if config.granularity == 0 {
            return Err(RegionError::InvalidGranularity(config.granularity));
        }
        if config.granularity > MAX_GRANULARITY {
            return Err(RegionError::GranularityTooLarge {
                granularity: config.granularity,
                max: MAX_GRANULARITY,
            });
        }

        let non_finite = polygon
            .exterior()
            .coords()
            .chain(polygon.interiors().iter().flat_map(|ring| ring.coords()))
            .find(|c| !c.x.is_finite() || !c.y.is_finite());
        if let Some(c) = non_finite {
            return Err(RegionError::NonFiniteCoordinate { x: c.x, y: c.y });
        }

        let shape = match TileGrid::build(polygon, &config) {
            Some(grid) => Shape::Indexed(grid),
            None => Shape::Empty,
        };

        Ok(Self {
            granularity: config.granularity,
            shape,
        })
    }

    /// Whether the region contains `point`. Boundary points are inside.
    pub fn contains(&self, point: impl Into<Coord<f64>>) -> bool {
        match &self.shape {
            Shape::Empty => false,
            Shape::Indexed(grid) => grid.contains(point.into()),
        }
    }

    /// The exact polygon test, bypassing the tile index.
    pub fn contains_exact(&self, point: impl Into<Coord<f64>>) -> bool {
        match &self.shape {
            Shape::Empty => false,
            Shape::Indexed(grid) => grid.contains_exact(point.into()),
        }
    }

    /// True for degenerate input (no vertices, zero width/height, or zero area).
    pub fn is_empty(&self) -> bool {
        matches!(self.shape, Shape::Empty)
    }

    pub fn granularity(&self) -> u32 {
        self.granularity
    }

    /// Exterior ring vertices, without the closing duplicate. Empty for a
    /// degenerate region.
    pub fn vertices(&self) -> &[Coord<f64>] {
        match self.grid() {
            Some(grid) => {
                let coords = &grid.polygon.exterior().0;
                &coords[..coords.len().saturating_sub(1)]
            }
            None => &[],
        }
    }

    pub fn polygon(&self) -> Option<&Polygon<f64>> {
        self.grid().map(|grid| &grid.polygon)
    }

    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.grid().map(|grid| grid.bounds)
    }

    /// Cell width and height.
    pub fn cell_size(&self) -> Option<(f64, f64)> {
        self.grid().map(|grid| (grid.cell_width, grid.cell_height))
    }

    /// Classification of the cell at integer tile coordinates, or `None`
    /// when the cell lies outside the grid.
    pub fn tile_class(&self, tile_x: i64, tile_y: i64) -> Option<TileClass> {
        self.grid()?.class_at(tile_x, tile_y)
    }

    /// Rectangle covered by the cell at integer tile coordinates.
    pub fn cell_rect(&self, tile_x: i64, tile_y: i64) -> Option<Rect<f64>> {
        let grid = self.grid()?;
        grid.class_at(tile_x, tile_y)?;
        Some(grid.cell_rect(tile_x, tile_y))
    }

    /// Every classified cell as `(tile_x, tile_y, class)`.
    pub fn tiles(&self) -> impl Iterator<Item = (i64, i64, TileClass)> + '_ {
        self.grid().into_iter().flat_map(|grid| {
            grid.tiles.iter().enumerate().map(move |(i, class)| {
                let (tile_x, tile_y) = grid.tile_coords(i);
                (tile_x, tile_y, *class)
            })
        })
    }

    fn grid(&self) -> Option<&TileGrid> {
        match &self.shape {
            Shape::Empty => None,
            Shape::Indexed(grid) => Some(grid),
        }
    }
}

/// Integer tile coordinate of `coord` along one axis.
fn project(coord: f64, cell_size: f64) -> i64 {
    (coord / cell_size).floor() as i64
}

/// Number of tiles between two inclusive tile coordinates. `None` when the
/// span is not what a grid of `granularity` cells can produce, which only
/// happens when the coordinates are too large for the cell size.
fn tile_span(min_tile: i64, max_tile: i64, granularity: u32) -> Option<usize> {
    let span = max_tile.checked_sub(min_tile)?.checked_add(1)?;
    if span < 1 || span > i64::from(granularity) + 2 {
        return None;
    }
    usize::try_from(span).ok()
}

impl TileGrid {
    fn build(polygon: Polygon<f64>, config: &GridConfig) -> Option<Self> {
        let Some(bounds) = polygon.exterior().bounding_rect() else {
            debug!("Region has no vertices, treating as empty");
            return None;
        };

        let (width, height) = (bounds.width(), bounds.height());
        if !(width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite()) {
            debug!(
                "Region bounds are degenerate ({} x {}), treating as empty",
                width, height
            );
            return None;
        }

        if polygon.unsigned_area() <= 0.0 {
            debug!("Region has zero area, treating as empty");
            return None;
        }

        let granularity = f64::from(config.granularity);
        let cell_width = width / granularity;
        let cell_height = height / granularity;
        if !(cell_width > 0.0 && cell_height > 0.0) {
            debug!(
                "Cell size underflows for granularity {}, treating as empty",
                config.granularity
            );
            return None;
        }

        let min_tile_x = project(bounds.min().x, cell_width);
        let min_tile_y = project(bounds.min().y, cell_height);
        let max_tile_x = project(bounds.max().x, cell_width);
        let max_tile_y = project(bounds.max().y, cell_height);

        let (cols, rows) = match (
            tile_span(min_tile_x, max_tile_x, config.granularity),
            tile_span(min_tile_y, max_tile_y, config.granularity),
        ) {
            (Some(cols), Some(rows)) => (cols, rows),
            _ => {
                debug!("Tile coordinates out of range, every query uses the exact test");
                (0, 0)
            }
        };

        let mut grid = Self {
            polygon,
            bounds,
            cell_width,
            cell_height,
            min_tile_x,
            min_tile_y,
            cols,
            rows,
            tiles: Vec::new(),
        };
        grid.tiles = grid.classify_tiles(config.parallel_threshold);

        let count = |class: TileClass| grid.tiles.iter().filter(|c| **c == class).count();
        debug!(
            "Built {}x{} tile grid: {} in, {} out, {} either",
            grid.cols,
            grid.rows,
            count(TileClass::In),
            count(TileClass::Out),
            count(TileClass::Either)
        );

        Some(grid)
    }

    fn classify_tiles(&self, parallel_threshold: usize) -> Vec<TileClass> {
        let exterior = Ring::from_line_string(self.polygon.exterior().clone());
        let holes: Vec<Ring> = self
            .polygon
            .interiors()
            .iter()
            .cloned()
            .map(Ring::from_line_string)
            .collect();

        let classify = |i: usize| {
            let (tile_x, tile_y) = self.tile_coords(i);
            classify_cell(&exterior, &holes, &self.cell_rect(tile_x, tile_y))
        };

        let cells = self.cols * self.rows;
        if cells >= parallel_threshold {
            (0..cells).into_par_iter().map(classify).collect()
        } else {
            (0..cells).map(classify).collect()
        }
    }

    fn tile_coords(&self, index: usize) -> (i64, i64) {
        let col = (index % self.cols) as i64;
        let row = (index / self.cols) as i64;
        (self.min_tile_x + col, self.min_tile_y + row)
    }

    fn cell_rect(&self, tile_x: i64, tile_y: i64) -> Rect<f64> {
        let (x, y) = (tile_x as f64, tile_y as f64);
        Rect::new(
            Coord {
                x: x * self.cell_width,
                y: y * self.cell_height,
            },
            Coord {
                x: (x + 1.0) * self.cell_width,
                y: (y + 1.0) * self.cell_height,
            },
        )
    }

    fn class_at(&self, tile_x: i64, tile_y: i64) -> Option<TileClass> {
        let col = usize::try_from(tile_x.checked_sub(self.min_tile_x)?).ok()?;
        let row = usize::try_from(tile_y.checked_sub(self.min_tile_y)?).ok()?;
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.tiles.get(row * self.cols + col).copied()
    }

    fn contains(&self, coord: Coord<f64>) -> bool {
        // Also rejects NaN coordinates
        if !rect_contains_coord(&self.bounds, coord) {
            return false;
        }

        let tile_x = project(coord.x, self.cell_width);
        let tile_y = project(coord.y, self.cell_height);

        // A cell missing from the grid can only come from rounding, so it
        // gets the exact test
        match self.class_at(tile_x, tile_y).unwrap_or(TileClass::Either) {
            TileClass::In => true,
            TileClass::Out => false,
            TileClass::Either => {
                trace!("Tile ({}, {}) straddles the boundary", tile_x, tile_y);
                self.contains_exact(coord)
            }
        }
    }

    fn contains_exact(&self, coord: Coord<f64>) -> bool {
        self.polygon.coordinate_position(&coord) != CoordPos::Outside
    }
}

/// How one ring relates to one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellRelation {
    /// The ring's boundary touches the cell, or a ring vertex lies in it.
    Straddles,
    /// The cell lies entirely inside the ring.
    Covers,
    Disjoint,
}

impl CellRelation {
    fn of(ring: &Ring, cell: &Ring, rect: &Rect<f64>) -> Self {
        // Straddling is checked first: the corner-only containment test
        // below is only sound once no edge passes through the cell
        let vertex_inside = ring.vertices().iter().any(|v| rect_contains_coord(rect, *v));
        if vertex_inside || ring.intersects(cell) {
            CellRelation::Straddles
        } else if ring.contains_ring(cell) {
            CellRelation::Covers
        } else {
            CellRelation::Disjoint
        }
    }
}

fn classify_cell(exterior: &Ring, holes: &[Ring], rect: &Rect<f64>) -> TileClass {
    let cell = Ring::from_rect(rect);

    let mut straddles = match CellRelation::of(exterior, &cell, rect) {
        CellRelation::Disjoint => return TileClass::Out,
        CellRelation::Straddles => true,
        CellRelation::Covers => false,
    };

    let mut in_hole = false;
    for hole in holes {
        match CellRelation::of(hole, &cell, rect) {
            CellRelation::Straddles => straddles = true,
            CellRelation::Covers => in_hole = true,
            CellRelation::Disjoint => {}
        }
    }

    if straddles {
        TileClass::Either
    } else if in_hole {
        TileClass::Out
    } else {
        TileClass::In
    }
}
