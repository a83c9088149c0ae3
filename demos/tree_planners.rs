use log::info;
use nalgebra::Point2;
use route_planning::tree::DEFAULT_GOAL_THRESHOLD;
use route_planning::{path_length, OptimalTreePlanner, TreePlanner, TreePlannerConfig};

// In this example RRT and RRT* plan around the same set of circles in a 50x50 workspace,
// from the same seed, and the resulting path lengths are compared.
//
// Run with RUST_LOG=debug to see the planners' own log output.

const SEED: u64 = 4;

fn main() {
    env_logger::init();
    let config = TreePlannerConfig::new(50.0, 50.0, 3.0, 2000, 0.1);
    let start = Point2::new(5.0, 5.0);
    let goal = Point2::new(40.0, 40.0);

    let mut rrt = match TreePlanner::seeded(config.clone(), SEED) {
        Ok(planner) => planner,
        Err(e) => {
            eprintln!("{e}");
            return;
        }
    };
    rrt.add_obstacle(25.0, 25.0, 10.0);
    rrt.add_obstacle(10.0, 30.0, 5.0);
    let rrt_path = rrt.plan(start, goal, DEFAULT_GOAL_THRESHOLD);
    info!(
        "RRT: {} waypoints, length {:.2}, {} tree nodes",
        rrt_path.len(),
        path_length(&rrt_path),
        rrt.tree().len()
    );

    let mut rrt_star = match OptimalTreePlanner::seeded(config, 15.0, SEED) {
        Ok(planner) => planner,
        Err(e) => {
            eprintln!("{e}");
            return;
        }
    };
    for circle in rrt.obstacles() {
        rrt_star.add_obstacle(circle.x, circle.y, circle.radius);
    }
    let rrt_star_path = rrt_star.plan(start, goal, DEFAULT_GOAL_THRESHOLD);
    info!(
        "RRT*: {} waypoints, length {:.2}, {} tree nodes, {} edges",
        rrt_star_path.len(),
        path_length(&rrt_star_path),
        rrt_star.tree().len(),
        rrt_star.tree().edges().count()
    );

    println!("RRT* path:");
    for p in rrt_star_path {
        println!("({:.2}, {:.2})", p.x, p.y);
    }
}
