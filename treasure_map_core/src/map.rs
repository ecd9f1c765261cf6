use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::Position;

/// Represents errors that can occur within the grid operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("Coordinates ({x}, {y}) are out of bounds for grid size ({width}, {height})")]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
    #[error("Grid size ({width}, {height}) overflows the address space")]
    TooLarge { width: usize, height: usize },
}

/// A dense 2D grid.
///
/// Stores elements of type `T` in a flat vector using row-major order.
/// `(0, 0)` is the top-left corner and `y` grows downwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Creates a new grid with the specified dimensions, filled with default values.
    pub fn new(width: usize, height: usize) -> Result<Self, GridError>
    where
        T: Default + Clone,
    {
        let size = width
            .checked_mul(height)
            .ok_or(GridError::TooLarge { width, height })?;
        Ok(Grid {
            width,
            height,
            cells: vec![T::default(); size],
        })
    }

    /// Returns the width of the grid.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the height of the grid.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn index_of(&self, position: Position) -> Option<usize> {
        if self.contains(position) {
            Some(position.y * self.width + position.x)
        } else {
            None
        }
    }

    /// Checks if the position is within the grid boundaries.
    #[inline]
    pub fn contains(&self, position: Position) -> bool {
        position.x < self.width && position.y < self.height
    }

    /// Gets a reference to the cell at the given position.
    ///
    /// Returns `None` if the position is out of bounds.
    pub fn get(&self, position: Position) -> Option<&T> {
        self.index_of(position).map(|index| &self.cells[index])
    }

    /// Sets the value of the cell at the given position.
    pub fn set(&mut self, position: Position, value: T) -> Result<(), GridError> {
        let index = self.index_of(position).ok_or(GridError::OutOfBounds {
            x: position.x,
            y: position.y,
            width: self.width,
            height: self.height,
        })?;
        self.cells[index] = value;
        Ok(())
    }

    /// Returns an iterator over the rows of the grid, top first.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        // `chunks` refuses a zero size; an empty grid has no row anyway.
        self.cells.chunks(self.width.max(1))
    }
}

/// Indexing using Position coordinates for access
impl<T> Index<Position> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, position: Position) -> &Self::Output {
        match self.index_of(position) {
            Some(index) => &self.cells[index],
            None => panic!(
                "Grid index ({}, {}) out of bounds for grid size ({}, {})",
                position.x, position.y, self.width, self.height
            ),
        }
    }
}
