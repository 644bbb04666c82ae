//! Vector math and cell-coordinate helpers.
//!
//! Points and vectors are `glam::DVec2`: plain `Copy` values on the stack, so
//! the hot path needs no vector pool at all.

pub use glam::{DVec2, IVec2};

use crate::types::Axis;

/// Column/row index containing coordinate `x`.
#[inline]
pub fn cell_of(x: f64, cell_size: f64) -> i32 {
    (x / cell_size).floor() as i32
}

/// Pack a cell coordinate into the grid's single hash key.
#[inline]
pub fn pack_cell_key(cell: IVec2) -> u64 {
    ((cell.x as u32 as u64) << 32) | cell.y as u32 as u64
}

#[inline]
pub fn unpack_cell_key(key: u64) -> IVec2 {
    IVec2::new((key >> 32) as u32 as i32, key as u32 as i32)
}

/// Inclusive rectangle of cell coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CellRange {
    pub min: IVec2,
    pub max: IVec2,
}

impl CellRange {
    /// Cells overlapped by the box `center ± half_extents`, grown by `padding` on every side.
    pub fn from_box(center: DVec2, half_extents: DVec2, cell_size: f64, padding: f64) -> Self {
        let pad = half_extents + DVec2::splat(padding);
        Self::from_bounds(center - pad, center + pad, cell_size)
    }

    pub fn from_bounds(min: DVec2, max: DVec2, cell_size: f64) -> Self {
        Self {
            min: IVec2::new(cell_of(min.x, cell_size), cell_of(min.y, cell_size)),
            max: IVec2::new(cell_of(max.x, cell_size), cell_of(max.y, cell_size)),
        }
    }

    /// Row-major walk over every cell in the range.
    pub fn iter(self) -> impl Iterator<Item = IVec2> {
        (self.min.y..=self.max.y)
            .flat_map(move |iy| (self.min.x..=self.max.x).map(move |ix| IVec2::new(ix, iy)))
    }
}

/// Unit step (-1, 0 or 1) in the direction of `v`.
#[inline]
pub fn step_of(v: f64) -> i32 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

/// Earliest tangency of two boxes in relative motion.
///
/// `rel_pos`/`rel_vel` are the second box relative to the first; `radius` is
/// the sum of half-extents. Returns the delay until contact, the separating
/// axis, and whether the pair was already interpenetrating (in which case the
/// delay is `overlap_lead`). A touching pair still closing is treated as
/// interpenetrating. Both axes qualifying at the same delay resolves to X.
pub(crate) fn solve_sweep(
    rel_pos: DVec2,
    rel_vel: DVec2,
    radius: DVec2,
    overlap_lead: f64,
) -> Option<(f64, Axis, bool)> {
    // Mirror so the relative position is non-negative on both axes.
    let mut p = rel_pos;
    let mut v = rel_vel;
    if p.x < 0.0 {
        p.x = -p.x;
        v.x = -v.x;
    }
    if p.y < 0.0 {
        p.y = -p.y;
        v.y = -v.y;
    }

    let x_time = (v.x < 0.0 && p.x > radius.x)
        .then(|| (radius.x - p.x) / v.x)
        .filter(|&t| (p.y + v.y * t).abs() < radius.y);
    let y_time = (v.y < 0.0 && p.y > radius.y)
        .then(|| (radius.y - p.y) / v.y)
        .filter(|&t| (p.x + v.x * t).abs() < radius.x);

    match (x_time, y_time) {
        (Some(tx), Some(ty)) if ty < tx => Some((ty, Axis::Y, false)),
        (Some(tx), _) => Some((tx, Axis::X, false)),
        (None, Some(ty)) => Some((ty, Axis::Y, false)),
        (None, None) => {
            if p.x > radius.x || p.y > radius.y {
                None
            } else if p.x == radius.x || p.y == radius.y {
                // Touching: still pushing in gets the lead, never a hit due `now`.
                if p.x == radius.x && v.x < 0.0 {
                    Some((overlap_lead, Axis::X, true))
                } else if p.y == radius.y && v.y < 0.0 {
                    Some((overlap_lead, Axis::Y, true))
                } else {
                    None
                }
            } else if v.x != 0.0 {
                Some((overlap_lead, Axis::X, true))
            } else if v.y != 0.0 {
                Some((overlap_lead, Axis::Y, true))
            } else {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_key_round_trip_negative() {
        for c in [IVec2::new(-3, 7), IVec2::new(i32::MIN, i32::MAX), IVec2::ZERO] {
            assert_eq!(unpack_cell_key(pack_cell_key(c)), c);
        }
        assert_ne!(pack_cell_key(IVec2::new(1, 0)), pack_cell_key(IVec2::new(0, 1)));
    }

    #[test]
    fn test_padding_registers_both_sides_of_wall() {
        // Right edge sits exactly on the wall at x = 10.
        let r = CellRange::from_box(DVec2::new(5.0, 5.0), DVec2::splat(5.0), 10.0, 0.01);
        assert_eq!(r.min, IVec2::new(-1, -1));
        assert_eq!(r.max, IVec2::new(1, 1));
        let unpadded = CellRange::from_box(DVec2::new(5.0, 5.0), DVec2::splat(4.0), 10.0, 0.0);
        assert_eq!(unpadded.min, IVec2::ZERO);
        assert_eq!(unpadded.max, IVec2::ZERO);
        assert_eq!(r.iter().count(), 9);
    }

    #[test]
    fn test_solve_sweep_head_on() {
        let (t, axis, overlapping) =
            solve_sweep(DVec2::new(100.0, 0.0), DVec2::new(-2.0, 0.0), DVec2::splat(10.0), 0.1).unwrap();
        assert_eq!(t, 45.0);
        assert_eq!(axis, Axis::X);
        assert!(!overlapping);
    }

    #[test]
    fn test_solve_sweep_mirrored_from_negative_side() {
        let (t, axis, _) =
            solve_sweep(DVec2::new(0.0, -30.0), DVec2::new(0.0, 4.0), DVec2::splat(10.0), 0.1).unwrap();
        assert_eq!(t, 5.0);
        assert_eq!(axis, Axis::Y);
    }

    #[test]
    fn test_solve_sweep_grazing_miss() {
        // Perpendicular offset equals the combined radius: corners only touch.
        assert!(solve_sweep(DVec2::new(50.0, 10.0), DVec2::new(-1.0, 0.0), DVec2::splat(10.0), 0.1).is_none());
        // Receding.
        assert!(solve_sweep(DVec2::new(50.0, 0.0), DVec2::new(1.0, 0.0), DVec2::splat(10.0), 0.1).is_none());
    }

    #[test]
    fn test_solve_sweep_overlapping_pair() {
        let hit = solve_sweep(DVec2::new(1.0, 1.0), DVec2::new(0.0, 3.0), DVec2::splat(10.0), 0.25);
        assert_eq!(hit, Some((0.25, Axis::Y, true)));
        assert!(solve_sweep(DVec2::new(1.0, 1.0), DVec2::ZERO, DVec2::splat(10.0), 0.25).is_none());
    }

    #[test]
    fn test_solve_sweep_touching_and_closing_is_not_due_now() {
        // Exactly tangent on x and still pushing in.
        let hit = solve_sweep(DVec2::new(10.0, 0.0), DVec2::new(-1.0, 0.0), DVec2::splat(10.0), 0.25);
        assert_eq!(hit, Some((0.25, Axis::X, true)));
        // Tangent and at rest relative to each other.
        assert!(solve_sweep(DVec2::new(10.0, 0.0), DVec2::ZERO, DVec2::splat(10.0), 0.25).is_none());
        // Tangent and separating, or sliding along the contact face.
        assert!(solve_sweep(DVec2::new(10.0, 0.0), DVec2::new(1.0, 0.0), DVec2::splat(10.0), 0.25).is_none());
        assert!(solve_sweep(DVec2::new(10.0, 0.0), DVec2::new(0.0, 2.0), DVec2::splat(10.0), 0.25).is_none());
    }

    #[test]
    fn test_solve_sweep_diagonal_approach() {
        let hit = solve_sweep(DVec2::new(20.0, 20.0), DVec2::new(-1.0, -1.0), DVec2::splat(10.0), 0.1);
        // Perfect corner-to-corner approach: the perpendicular check is strict.
        assert!(hit.is_none());
        let hit = solve_sweep(DVec2::new(20.0, 19.0), DVec2::new(-1.0, -1.0), DVec2::splat(10.0), 0.1);
        assert_eq!(hit, Some((10.0, Axis::X, false)));
    }
}
