use ::sledge::*;
use glam::DVec2;

const PLAYER: Group = 0;
const WALLS: Group = 1;

fn main() {
    let mut grid = CellGrid::new(GridConfig::with_cell_size(1.0), &[(PLAYER, WALLS)], SimClock::new())
        .expect("valid config")
        .with_debug_sink(Box::new(Vec::<DebugMark>::new()));

    grid.add_sledge_in_group(Sledge::new(DVec2::new(2.0, 0.0), DVec2::ZERO, DVec2::splat(0.5), 0.0, f64::INFINITY), WALLS);
    grid.add_sledge_in_group(Sledge::new(DVec2::new(4.0, 0.0), DVec2::ZERO, DVec2::splat(0.5), 0.0, f64::INFINITY), WALLS);

    let mut ray = RayScan::new(DVec2::ZERO, DVec2::new(100.0, 0.0));
    if grid.ray_scan(&mut ray, PLAYER) {
        let pos = ray.hit_pos().unwrap_or_default();
        println!("Ray hit id={:?} t={:.3} axis={:?} at ({:.2},{:.2})", ray.hit_sledge, ray.hit_time.unwrap_or(1.0), ray.hit_axis, pos.x, pos.y);
    } else {
        println!("No hit");
    }

    let mut thick = RayScan::thick(DVec2::new(0.0, 0.8), DVec2::new(10.0, 0.8), DVec2::splat(0.4));
    println!("Thick probe hit: {}", grid.ray_scan(&mut thick, PLAYER));
}
