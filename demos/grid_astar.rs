use grid_util::point::Point;
use log::info;
use route_planning::{grid_path_length, GridSearchPlanner, OccupancyGrid};

// In this example a path is found on a 30x30 grid split by a wall
//  ______________
// |      #       |
// |  S   #    G  |
// |      #       |
//  ______________
// where the wall at x = 15 leaves gaps along the top and bottom five rows.
// The raw 8-connected A* path is then shortened by line-of-sight smoothing.
//
// Run with RUST_LOG=debug to see the planner's own log output.

fn main() {
    env_logger::init();
    let mut grid = OccupancyGrid::new(30, 30);
    grid.add_rectangle(15, 5, 16, 25);
    grid.update();
    println!("{}", grid);

    let planner = GridSearchPlanner::new(&grid, true);
    let start = Point::new(5, 15);
    let goal = Point::new(25, 15);
    let path = planner.plan(start, goal);
    if path.is_empty() {
        println!("No path found");
        return;
    }
    let smoothed = planner.smooth_path(&path);
    info!(
        "Raw path: {} waypoints, length {:.2}",
        path.len(),
        grid_path_length(&path)
    );
    info!(
        "Smoothed path: {} waypoints, length {:.2}",
        smoothed.len(),
        grid_path_length(&smoothed)
    );
    println!("Smoothed path:");
    for p in smoothed {
        println!("{:?}", p);
    }
}
