use core::fmt;
use grid_util::grid::{BoolGrid, ValueGrid};
use grid_util::point::Point;
use log::{info, warn};
use petgraph::unionfind::UnionFind;
use rand::Rng;

/// [OccupancyGrid] stores which cells of a fixed-size map are blocked ([true]) or free ([false])
/// in a [BoolGrid], and tracks 8-connected components of the free cells using a [UnionFind]
/// structure. Coordinates outside the map are always blocked.
#[derive(Clone, Debug)]
pub struct OccupancyGrid {
    pub grid: BoolGrid,
    pub components: UnionFind<usize>,
    pub components_dirty: bool,
}

impl Default for OccupancyGrid {
    fn default() -> OccupancyGrid {
        OccupancyGrid::new(0, 0)
    }
}

impl OccupancyGrid {
    /// Creates a fully free grid of the given size.
    pub fn new(width: usize, height: usize) -> OccupancyGrid {
        let mut occupancy_grid = OccupancyGrid {
            grid: BoolGrid::new(width, height, false),
            components: UnionFind::new(width * height),
            components_dirty: false,
        };
        occupancy_grid.generate_components();
        occupancy_grid
    }
    pub fn width(&self) -> usize {
        self.grid.width()
    }
    pub fn height(&self) -> usize {
        self.grid.height()
    }
    /// Bounds check only.
    pub fn is_valid(&self, x: i32, y: i32) -> bool {
        self.grid.index_in_bounds(x, y)
    }
    /// False for out-of-bounds or blocked cells.
    pub fn is_free(&self, x: i32, y: i32) -> bool {
        self.is_valid(x, y) && !self.grid.get(x, y)
    }
    pub fn is_free_point(&self, point: &Point) -> bool {
        self.grid.point_in_bounds(*point) && !self.grid.get_point(*point)
    }
    fn block(&mut self, x: i32, y: i32) {
        if !self.grid.get(x, y) {
            // Blocking a cell can split a component in two.
            self.components_dirty = true;
            self.grid.set(x, y, true);
        }
    }
    /// Marks a single cell as blocked. Out-of-bounds coordinates are ignored.
    pub fn add_obstacle(&mut self, x: i32, y: i32) {
        if self.is_valid(x, y) {
            self.block(x, y);
        }
    }
    /// Blocks every cell in `[min(x1, x2), max(x1, x2)) × [min(y1, y2), max(y1, y2))`
    /// intersected with the grid.
    pub fn add_rectangle(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        let x_lo = x1.min(x2).max(0);
        let x_hi = x1.max(x2).min(self.width() as i32);
        let y_lo = y1.min(y2).max(0);
        let y_hi = y1.max(y2).min(self.height() as i32);
        for y in y_lo..y_hi {
            for x in x_lo..x_hi {
                self.block(x, y);
            }
        }
    }
    /// Places `count` blocked `size × size` squares at uniformly random positions where they fit
    /// entirely inside the grid.
    pub fn add_random_obstacles<R: Rng>(&mut self, count: usize, size: usize, rng: &mut R) {
        if size > self.width() || size > self.height() {
            warn!(
                "Obstacles of size {} do not fit into a {}x{} grid, none were placed",
                size,
                self.width(),
                self.height()
            );
            return;
        }
        for _ in 0..count {
            let x = rng.gen_range(0..=self.width() - size) as i32;
            let y = rng.gen_range(0..=self.height() - size) as i32;
            self.add_rectangle(x, y, x + size as i32, y + size as i32);
        }
    }
    /// A `height × width` copy of the cell states, indexed as `cells[y][x]`. [true] marks a
    /// blocked cell.
    pub fn cells(&self) -> Vec<Vec<bool>> {
        (0..self.height() as i32)
            .map(|y| {
                (0..self.width() as i32)
                    .map(|x| self.grid.get(x, y))
                    .collect()
            })
            .collect()
    }
    pub fn blocked_count(&self) -> usize {
        self.cells().iter().flatten().filter(|&&b| b).count()
    }

    /// Retrieves the component id a given [Point] belongs to, [None] outside the grid.
    pub fn get_component(&self, point: &Point) -> Option<usize> {
        self.grid
            .point_in_bounds(*point)
            .then(|| self.components.find(self.grid.get_ix_point(point)))
    }
    /// Checks if start and goal are on the same component.
    pub fn reachable(&self, start: &Point, goal: &Point) -> bool {
        !self.unreachable(start, goal)
    }
    /// Checks if start and goal are not on the same component. Free cells of different
    /// components cannot be connected by any path, diagonal or not.
    pub fn unreachable(&self, start: &Point, goal: &Point) -> bool {
        if self.is_free_point(start) && self.is_free_point(goal) {
            let start_ix = self.grid.get_ix_point(start);
            let goal_ix = self.grid.get_ix_point(goal);
            !self.components.equiv(start_ix, goal_ix)
        } else {
            true
        }
    }
    /// Regenerates the components if they are marked as dirty.
    pub fn update(&mut self) {
        if self.components_dirty {
            info!("Components are dirty: regenerating components");
            self.generate_components();
        }
    }
    /// Generates a new [UnionFind] structure and links up free 8-connected cells to the same
    /// components.
    pub fn generate_components(&mut self) {
        let w = self.width();
        let h = self.height();
        self.components = UnionFind::new(w * h);
        self.components_dirty = false;
        for x in 0..w as i32 {
            for y in 0..h as i32 {
                if self.grid.get(x, y) {
                    continue;
                }
                let point = Point::new(x, y);
                let parent_ix = self.grid.compute_ix(x, y);
                // Half of the Moore neighbourhood, so each 8-connected pair is linked once.
                for p in [
                    Point::new(point.x + 1, point.y),
                    Point::new(point.x, point.y + 1),
                    Point::new(point.x + 1, point.y + 1),
                    Point::new(point.x + 1, point.y - 1),
                ] {
                    if self.is_free_point(&p) {
                        let ix = self.grid.get_ix_point(&p);
                        self.components.union(parent_ix, ix);
                    }
                }
            }
        }
    }
}

impl fmt::Display for OccupancyGrid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Grid:")?;
        for row in self.cells() {
            let values = row.into_iter().map(|b| b as i32).collect::<Vec<i32>>();
            writeln!(f, "{:?}", values)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn out_of_bounds_is_blocked_and_invalid() {
        let grid = OccupancyGrid::new(4, 3);
        for (x, y) in [(-1, 0), (0, -1), (4, 0), (0, 3), (4, 3), (i32::MIN, i32::MAX)] {
            assert!(!grid.is_valid(x, y));
            assert!(!grid.is_free(x, y));
        }
        assert!(grid.is_valid(3, 2));
        assert!(grid.is_free(3, 2));
    }

    #[test]
    fn single_obstacle() {
        let mut grid = OccupancyGrid::new(20, 20);
        grid.add_obstacle(5, 5);
        grid.add_obstacle(25, 5);
        grid.add_obstacle(-1, 3);
        assert!(!grid.is_free(5, 5));
        assert!(grid.is_valid(5, 5));
        assert!(grid.is_free(10, 10));
        assert_eq!(grid.blocked_count(), 1);
    }

    /// The corners are normalized and the rectangle is clipped to the grid.
    #[test]
    fn rectangle_is_normalized_and_clamped() {
        let mut grid = OccupancyGrid::new(10, 8);
        grid.add_rectangle(12, 6, 7, -3);
        let cells = grid.cells();
        for (y, row) in cells.iter().enumerate() {
            for (x, &blocked) in row.iter().enumerate() {
                let inside = (7..10).contains(&x) && (0..6).contains(&y);
                assert_eq!(blocked, inside, "cell ({x}, {y})");
            }
        }
    }

    #[test]
    fn empty_rectangle_blocks_nothing() {
        let mut grid = OccupancyGrid::new(5, 5);
        grid.add_rectangle(2, 2, 2, 4);
        assert_eq!(grid.blocked_count(), 0);
        assert!(!grid.components_dirty);
    }

    #[test]
    fn random_obstacles_fit_inside() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut grid = OccupancyGrid::new(12, 9);
        grid.add_random_obstacles(5, 3, &mut rng);
        let blocked = grid.blocked_count();
        assert!((9..=45).contains(&blocked));

        let mut tiny = OccupancyGrid::new(2, 2);
        tiny.add_random_obstacles(3, 3, &mut rng);
        assert_eq!(tiny.blocked_count(), 0);

        let mut exact = OccupancyGrid::new(3, 3);
        exact.add_random_obstacles(1, 3, &mut rng);
        assert_eq!(exact.blocked_count(), 9);
    }

    #[test]
    fn cells_snapshot_is_height_by_width() {
        let mut grid = OccupancyGrid::new(3, 2);
        grid.add_obstacle(2, 1);
        let cells = grid.cells();
        assert_eq!(cells.len(), 2);
        assert!(cells.iter().all(|row| row.len() == 3));
        assert!(cells[1][2]);
        assert_eq!(format!("{grid}"), "Grid:\n[0, 0, 0]\n[0, 0, 1]\n");
    }

    /// Tests whether points are correctly mapped to different connected components
    #[test]
    fn test_component_generation() {
        // Corresponds to the following 3x2 grid:
        //  ___
        // | # |
        // | # |
        //  ___
        let mut grid = OccupancyGrid::new(3, 2);
        grid.add_obstacle(1, 0);
        grid.add_obstacle(1, 1);
        assert!(grid.components_dirty);
        grid.update();
        assert!(!grid.components_dirty);
        let p1 = Point::new(0, 0);
        let p2 = Point::new(1, 1);
        let p3 = Point::new(0, 1);
        let p4 = Point::new(2, 0);
        assert!(grid.unreachable(&p1, &p2));
        assert!(grid.reachable(&p1, &p3));
        assert!(grid.unreachable(&p1, &p4));
        assert_eq!(grid.get_component(&p1), grid.get_component(&p3));
        assert!(grid.get_component(&p1).is_some());
        assert_eq!(grid.get_component(&Point::new(3, 0)), None);
        assert_eq!(grid.get_component(&Point::new(0, -1)), None);
    }

    /// Diagonal neighbours share a component even if both orthogonal cells are blocked.
    #[test]
    fn diagonal_cells_are_connected() {
        //  __
        // | #|
        // |# |
        //  __
        let mut grid = OccupancyGrid::new(2, 2);
        grid.add_obstacle(1, 0);
        grid.add_obstacle(0, 1);
        grid.update();
        assert!(grid.reachable(&Point::new(0, 0), &Point::new(1, 1)));
        grid.add_obstacle(1, 1);
        grid.update();
        assert!(grid.unreachable(&Point::new(0, 0), &Point::new(1, 1)));
    }
}
