//! Generic grid over the map plane

use std::ops::RangeInclusive;

use crate::core::types::Vec2;

/// Dense 2D grid of square cells anchored at the map origin
#[derive(Debug, Clone)]
pub struct Grid<T: Clone + Default> {
    pub cols: usize,
    pub rows: usize,
    pub cell_size: f32,
    data: Vec<T>,
}

impl<T: Clone + Default> Grid<T> {
    /// Grid covering a `map_width` × `map_height` area
    ///
    /// Partial cells at the right and bottom edges count as whole cells.
    pub fn covering(map_width: f32, map_height: f32, cell_size: f32) -> Self {
        debug_assert!(cell_size > 0.0, "cell size must be positive");
        let cols = ((map_width / cell_size).ceil() as usize).max(1);
        let rows = ((map_height / cell_size).ceil() as usize).max(1);
        Self {
            cols,
            rows,
            cell_size,
            data: vec![T::default(); cols * rows],
        }
    }

    #[inline]
    pub fn get(&self, col: usize, row: usize) -> Option<&T> {
        if col < self.cols && row < self.rows {
            Some(&self.data[row * self.cols + col])
        } else {
            None
        }
    }

    #[inline]
    pub fn get_mut(&mut self, col: usize, row: usize) -> Option<&mut T> {
        if col < self.cols && row < self.rows {
            Some(&mut self.data[row * self.cols + col])
        } else {
            None
        }
    }

    /// Convert world position to cell coordinates, clamped to the grid
    #[inline]
    pub fn world_to_cell(&self, pos: Vec2) -> (usize, usize) {
        (
            Self::clamp_axis(pos.x / self.cell_size, self.cols),
            Self::clamp_axis(pos.y / self.cell_size, self.rows),
        )
    }

    #[inline]
    fn clamp_axis(scaled: f32, len: usize) -> usize {
        (scaled.floor() as i64).clamp(0, len as i64 - 1) as usize
    }

    /// Cell at a world position
    pub fn at(&self, pos: Vec2) -> &T {
        let (col, row) = self.world_to_cell(pos);
        &self.data[row * self.cols + col]
    }

    pub fn at_mut(&mut self, pos: Vec2) -> &mut T {
        let (col, row) = self.world_to_cell(pos);
        let cols = self.cols;
        &mut self.data[row * cols + col]
    }

    /// Column and row ranges of the cells overlapping a circle's bounding box
    pub fn cells_overlapping(
        &self,
        center: Vec2,
        radius: f32,
    ) -> (RangeInclusive<usize>, RangeInclusive<usize>) {
        let (c0, r0) = self.world_to_cell(Vec2::new(center.x - radius, center.y - radius));
        let (c1, r1) = self.world_to_cell(Vec2::new(center.x + radius, center.y + radius));
        (c0..=c1, r0..=r1)
    }

    /// Cell center in world coordinates
    pub fn cell_center(&self, col: usize, row: usize) -> Vec2 {
        Vec2::new(
            (col as f32 + 0.5) * self.cell_size,
            (row as f32 + 0.5) * self.cell_size,
        )
    }

    /// All cells with their coordinates, row by row
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &T)> {
        let cols = self.cols;
        self.data
            .iter()
            .enumerate()
            .map(move |(i, cell)| ((i % cols, i / cols), cell))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.data.iter_mut()
    }
}
