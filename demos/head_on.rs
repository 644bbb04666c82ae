use ::sledge::*;
use glam::DVec2;

/// A box drifting along x that reports its hits.
struct Crate {
    id: SpriteId,
    start: DVec2,
    vel: DVec2,
}

impl Sprite for Crate {
    fn id(&self) -> SpriteId {
        self.id
    }

    fn group(&self) -> Group {
        0
    }

    fn create_sledge(&self, now: f64) -> Option<Sledge> {
        Some(Sledge::new(self.start + self.vel * now, self.vel, DVec2::splat(5.0), now, f64::INFINITY))
    }

    fn on_sprite_hit(&mut self, other: SpriteId, hit: &SpriteHit, physics: &mut Physics<Self>) {
        println!("{:?} hit {:?} at t={:.3} (x={:?}, y={:?})", self.id, other, hit.time, hit.x_time, hit.y_time);
        // Bounce back.
        let pos = self.start + self.vel * hit.time;
        self.vel = -self.vel;
        self.start = pos - self.vel * hit.time;
        physics.mark_dirty(self.id);
    }

    fn on_timeout(&mut self, timeout: &Timeout, physics: &mut Physics<Self>) {
        println!("{:?} timeout tag={} at t={:.3} (now {:.3})", self.id, timeout.tag, timeout.time, physics.now());
    }
}

fn main() -> Result<()> {
    let mut physics = Physics::new(GridConfig::with_cell_size(128.0), &[(0, 0)], SimClock::new())?;
    let a = physics.add_sprite(Crate { id: SpriteId(1), start: DVec2::ZERO, vel: DVec2::new(1.0, 0.0) })?;
    physics.add_sprite(Crate { id: SpriteId(2), start: DVec2::new(100.0, 0.0), vel: DVec2::new(-1.0, 0.0) })?;
    physics.add_timeout(a, 30.0, 1)?;

    physics.clock(60.0)?;
    println!("clock at {:.3}, stats {:?}", physics.now(), physics.grid().stats());
    Ok(())
}
