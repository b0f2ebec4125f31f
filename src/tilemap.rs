use serde::{Deserialize, Serialize};

use crate::error::{CityGenError, Result};

/// A bounded 2D grid stored row-major (`y * width + x`).
///
/// Unlike a world map, the city grid does not wrap at its edges: every
/// rectangle query is clipped to the grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tilemap<T> {
    pub width: usize,
    pub height: usize,
    data: Vec<T>,
}

impl<T: Clone + Default> Tilemap<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![T::default(); width * height],
        }
    }
}

impl<T: Clone> Tilemap<T> {
    pub fn new_with(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height, "({x}, {y}) out of bounds");
        y * self.width + x
    }

    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.data[self.index(x, y)]
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    /// True if the signed coordinate lies inside the grid.
    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as u64) < self.width as u64 && (y as u64) < self.height as u64
    }

    /// Read query: out-of-bounds coordinates yield `None`.
    pub fn get_checked(&self, x: i64, y: i64) -> Option<&T> {
        if self.in_bounds(x, y) {
            Some(self.get(x as usize, y as usize))
        } else {
            None
        }
    }

    /// Direct mutation: out-of-bounds coordinates are an error.
    pub fn set_checked(&mut self, x: i64, y: i64, value: T) -> Result<()> {
        if !self.in_bounds(x, y) {
            return Err(CityGenError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        self.set(x as usize, y as usize, value);
        Ok(())
    }

    /// Stage inputs must share the grid they are combined with.
    pub fn ensure_size(&self, name: &'static str, width: usize, height: usize) -> Result<()> {
        if self.width != width || self.height != height {
            return Err(CityGenError::invalid(
                name,
                format!("expected {}x{}, got {}x{}", width, height, self.width, self.height),
            ));
        }
        Ok(())
    }

    /// Fill the entire map with a value.
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Raw row-major cell storage.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Iterate over all cells with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let width = self.width;
        self.data.iter().enumerate().map(move |(idx, val)| {
            let x = idx % width;
            let y = idx / width;
            (x, y, val)
        })
    }

    /// Iterate mutably over all cells with their coordinates.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, usize, &mut T)> {
        let width = self.width;
        self.data.iter_mut().enumerate().map(move |(idx, val)| {
            let x = idx % width;
            let y = idx / width;
            (x, y, val)
        })
    }

    /// Number of cells matching a predicate.
    pub fn count(&self, pred: impl Fn(&T) -> bool) -> usize {
        self.data.iter().filter(|v| pred(v)).count()
    }

    // Rectangle helpers take a signed origin and clip to the grid, like
    // slicing `grid[y0..y0+h, x0..x0+w]`. A rectangle entirely outside the
    // grid covers no cells.

    fn clip_rect(&self, x: i64, y: i64, w: usize, h: usize) -> (usize, usize, usize, usize) {
        let x0 = x.clamp(0, self.width as i64) as usize;
        let y0 = y.clamp(0, self.height as i64) as usize;
        let x1 = (x + w as i64).clamp(0, self.width as i64) as usize;
        let y1 = (y + h as i64).clamp(0, self.height as i64) as usize;
        (x0, y0, x1.max(x0), y1.max(y0))
    }

    /// Set every cell of the clipped rectangle to `value`.
    pub fn fill_rect(&mut self, x: i64, y: i64, w: usize, h: usize, value: T) {
        let (x0, y0, x1, y1) = self.clip_rect(x, y, w, h);
        for yy in y0..y1 {
            for xx in x0..x1 {
                self.set(xx, yy, value.clone());
            }
        }
    }

    /// True if any cell of the clipped rectangle matches.
    pub fn any_in_rect(&self, x: i64, y: i64, w: usize, h: usize, pred: impl Fn(&T) -> bool) -> bool {
        let (x0, y0, x1, y1) = self.clip_rect(x, y, w, h);
        (y0..y1).any(|yy| (x0..x1).any(|xx| pred(self.get(xx, yy))))
    }

    /// True if every cell of the clipped rectangle matches (vacuously true if empty).
    pub fn all_in_rect(&self, x: i64, y: i64, w: usize, h: usize, pred: impl Fn(&T) -> bool) -> bool {
        let (x0, y0, x1, y1) = self.clip_rect(x, y, w, h);
        (y0..y1).all(|yy| (x0..x1).all(|xx| pred(self.get(xx, yy))))
    }
}

impl Tilemap<f32> {
    /// Minimum and maximum value over the grid.
    pub fn min_max(&self) -> (f32, f32) {
        let mut min_val = f32::MAX;
        let mut max_val = f32::MIN;
        for &val in &self.data {
            if val < min_val {
                min_val = val;
            }
            if val > max_val {
                max_val = val;
            }
        }
        (min_val, max_val)
    }
}
