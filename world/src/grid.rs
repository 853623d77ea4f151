use sundial_core::{CellCoord, Direction, OccupancyView, Occupant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Terrain {
    Ground,
    Void,
}

/// Dense occupancy grid. Each cell holds at most one occupant; empty cells are ground
/// unless the terrain layer marks them as void.
#[derive(Clone, Debug)]
pub(crate) struct GridWorld {
    width: u32,
    height: u32,
    cells: Vec<Option<Occupant>>,
    terrain: Vec<Terrain>,
}

impl GridWorld {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        let capacity_u64 = u64::from(width) * u64::from(height);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            width,
            height,
            cells: vec![None; capacity],
            terrain: vec![Terrain::Ground; capacity],
        }
    }

    pub(crate) fn in_bounds(&self, cell: CellCoord) -> bool {
        self.index(cell).is_some()
    }

    pub(crate) fn neighbor(&self, cell: CellCoord, direction: Direction) -> CellCoord {
        cell.neighbor(direction)
    }

    pub(crate) fn get(&self, cell: CellCoord) -> Option<Occupant> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    pub(crate) fn set(&mut self, cell: CellCoord, occupant: Option<Occupant>) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.cells.get_mut(index) {
                *slot = occupant;
            }
        }
    }

    /// Moves whatever occupies `from` into `to`, replacing any occupant of `to`.
    pub(crate) fn relocate(&mut self, from: CellCoord, to: CellCoord) {
        let occupant = self.get(from);
        self.set(from, None);
        self.set(to, occupant);
    }

    pub(crate) fn is_void(&self, cell: CellCoord) -> bool {
        self.index(cell)
            .and_then(|index| self.terrain.get(index))
            .map_or(false, |terrain| *terrain == Terrain::Void)
    }

    pub(crate) fn set_terrain(&mut self, cell: CellCoord, terrain: Terrain) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.terrain.get_mut(index) {
                *slot = terrain;
            }
        }
    }

    /// Reports whether the cell is in bounds, unoccupied and plain ground.
    pub(crate) fn is_open_ground(&self, cell: CellCoord) -> bool {
        self.in_bounds(cell) && self.get(cell).is_none() && !self.is_void(cell)
    }

    pub(crate) fn view(&self) -> OccupancyView<'_> {
        OccupancyView::new(&self.cells, self.width, self.height)
    }

    pub(crate) fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        let x = u32::try_from(cell.x()).ok()?;
        let y = u32::try_from(cell.y()).ok()?;
        if x < self.width && y < self.height {
            let row = usize::try_from(y).ok()?;
            let column = usize::try_from(x).ok()?;
            let width = usize::try_from(self.width).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sundial_core::{EntityId, GridObjectKind};

    fn wall(id: u32) -> Occupant {
        Occupant {
            id: EntityId::new(id),
            kind: GridObjectKind::Wall,
        }
    }

    #[test]
    fn out_of_bounds_reads_are_empty_and_writes_are_ignored() {
        let mut grid = GridWorld::new(3, 2);
        let outside = CellCoord::new(3, 0);

        grid.set(outside, Some(wall(1)));

        assert!(!grid.in_bounds(outside));
        assert!(!grid.in_bounds(CellCoord::new(-1, 1)));
        assert_eq!(grid.get(outside), None);
        assert!(grid.view().iter().all(|cell| cell.is_none()));
    }

    #[test]
    fn relocate_keeps_a_single_occupant() {
        let mut grid = GridWorld::new(3, 3);
        let from = CellCoord::new(0, 0);
        let to = CellCoord::new(0, 1);
        grid.set(from, Some(wall(4)));

        grid.relocate(from, to);

        assert_eq!(grid.get(from), None);
        assert_eq!(grid.get(to), Some(wall(4)));
        assert_eq!(grid.view().iter().flatten().count(), 1);
    }

    #[test]
    fn void_cells_are_not_open_ground() {
        let mut grid = GridWorld::new(2, 2);
        let hole = CellCoord::new(1, 1);
        grid.set_terrain(hole, Terrain::Void);

        assert!(grid.is_void(hole));
        assert!(!grid.is_open_ground(hole));
        assert!(grid.is_open_ground(CellCoord::new(0, 1)));
        assert!(!grid.is_open_ground(CellCoord::new(2, 1)));
    }

    #[test]
    fn neighbor_may_leave_the_grid() {
        let grid = GridWorld::new(2, 2);
        let edge = grid.neighbor(CellCoord::new(0, 0), Direction::Left);
        assert_eq!(edge, CellCoord::new(-1, 0));
        assert!(!grid.in_bounds(edge));
    }
}
