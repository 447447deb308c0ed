//! The shared board: a fixed-size matrix of cell ownership values.
//!
//! The grid has no interior locking. It is owned by the game state and only
//! mutated from the simulation loop; renderers borrow it read-only between
//! ticks.

use crate::config::{validate_dimensions, ConfigError};
use shared::Heading;

/// Slot id of a connected player, handed out by the id pool. Never zero.
pub type PlayerId = u16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Wall,
    Owned(PlayerId),
}

impl Cell {
    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }
}

#[derive(Debug, Clone)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Builds a board with a wall border and an empty interior.
    pub fn new(width: usize, height: usize) -> Result<Self, ConfigError> {
        validate_dimensions(width, height)?;

        let mut grid = Grid {
            width,
            height,
            cells: vec![Cell::Empty; width * height],
        };
        for x in 0..width {
            grid.set(x, 0, Cell::Wall);
            grid.set(x, height - 1, Cell::Wall);
        }
        for y in 0..height {
            grid.set(0, y, Cell::Wall);
            grid.set(width - 1, y, Cell::Wall);
        }
        Ok(grid)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Cell> {
        self.index(x, y).map(|i| self.cells[i])
    }

    /// Writes a cell. Out-of-range coordinates are ignored.
    pub fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = cell;
        }
    }

    /// The neighbouring coordinate one step along `heading`, if on the board.
    pub fn step(&self, x: usize, y: usize, heading: Heading) -> Option<(usize, usize)> {
        let (dx, dy) = heading.delta();
        let nx = x.checked_add_signed(dx)?;
        let ny = y.checked_add_signed(dy)?;
        self.index(nx, ny).map(|_| (nx, ny))
    }

    /// Empties every cell owned by `id`, returning how many were cleared.
    pub fn clear_owner(&mut self, id: PlayerId) -> usize {
        let mut cleared = 0;
        for cell in self.cells.iter_mut() {
            if *cell == Cell::Owned(id) {
                *cell = Cell::Empty;
                cleared += 1;
            }
        }
        cleared
    }

    pub fn count_owned(&self, id: PlayerId) -> usize {
        self.cells.iter().filter(|c| **c == Cell::Owned(id)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_border(grid: &Grid, x: usize, y: usize) -> bool {
        x == 0 || y == 0 || x == grid.width() - 1 || y == grid.height() - 1
    }

    #[test]
    fn test_new_grid_has_wall_border_and_empty_interior() {
        for (w, h) in [(32, 32), (60, 60), (32, 100), (254, 40)] {
            let grid = Grid::new(w, h).unwrap();
            assert_eq!(grid.width(), w);
            assert_eq!(grid.height(), h);
            for x in 0..w {
                for y in 0..h {
                    let expected = if is_border(&grid, x, y) {
                        Cell::Wall
                    } else {
                        Cell::Empty
                    };
                    assert_eq!(grid.get(x, y), Some(expected), "cell {},{}", x, y);
                }
            }
        }
    }

    #[test]
    fn test_odd_dimensions_rejected() {
        for (w, h) in [(33, 32), (32, 33), (61, 61)] {
            assert_eq!(
                Grid::new(w, h).unwrap_err(),
                ConfigError::InvalidDimensions {
                    width: w,
                    height: h
                }
            );
        }
    }

    #[test]
    fn test_small_dimensions_rejected() {
        assert!(Grid::new(30, 60).is_err());
        assert!(Grid::new(60, 2).is_err());
    }

    #[test]
    fn test_get_out_of_range() {
        let grid = Grid::new(32, 32).unwrap();
        assert_eq!(grid.get(32, 0), None);
        assert_eq!(grid.get(0, 32), None);
    }

    #[test]
    fn test_step_stays_on_board() {
        let grid = Grid::new(32, 32).unwrap();
        assert_eq!(grid.step(0, 0, Heading::Up), None);
        assert_eq!(grid.step(0, 0, Heading::Left), None);
        assert_eq!(grid.step(31, 5, Heading::Right), None);
        assert_eq!(grid.step(5, 5, Heading::Down), Some((5, 6)));
        assert_eq!(grid.step(5, 5, Heading::Left), Some((4, 5)));
    }

    #[test]
    fn test_clear_owner_only_touches_that_owner() {
        let mut grid = Grid::new(32, 32).unwrap();
        grid.set(3, 3, Cell::Owned(1));
        grid.set(4, 3, Cell::Owned(1));
        grid.set(5, 3, Cell::Owned(2));

        assert_eq!(grid.count_owned(1), 2);
        assert_eq!(grid.clear_owner(1), 2);
        assert_eq!(grid.count_owned(1), 0);
        assert_eq!(grid.get(5, 3), Some(Cell::Owned(2)));
        assert_eq!(grid.get(0, 0), Some(Cell::Wall));
    }
}
