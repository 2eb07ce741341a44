use crate::{Offset, Point};

/// Deforms an edge's point sequence under displacements of its endpoints.
///
/// The shift blends linearly from fully the source displacement at the first
/// point to fully the target displacement at the last, so intermediate curve
/// geometry stretches instead of translating rigidly. Sequences with fewer
/// than two points are returned unchanged.
pub fn deform_path(points: &[Point], source: Offset, target: Offset) -> Vec<Point> {
    if points.len() < 2 {
        return points.to_vec();
    }

    let last = (points.len() - 1) as f32;
    points
        .iter()
        .enumerate()
        .map(|(index, point)| {
            let t = index as f32 / last;
            Point {
                x: round_coord(point.x + source.dx * (1.0 - t) + target.dx * t),
                y: round_coord(point.y + source.dy * (1.0 - t) + target.dy * t),
            }
        })
        .collect()
}

/// Rounds to two decimal places for stable, compact serialization.
pub fn round_coord(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_take_their_own_displacement() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(50.0, 10.0),
            Point::new(100.0, 0.0),
        ];
        let deformed = deform_path(&points, Offset::new(20.0, 8.0), Offset::ZERO);

        assert_eq!(deformed[0], Point::new(20.0, 8.0));
        assert_eq!(deformed[1], Point::new(60.0, 14.0));
        assert_eq!(deformed[2], Point::new(100.0, 0.0));
    }

    #[test]
    fn blends_toward_target_displacement() {
        let points = vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)];
        let deformed = deform_path(&points, Offset::ZERO, Offset::new(-30.0, 12.0));

        assert_eq!(deformed[0], Point::new(0.0, 0.0));
        assert_eq!(deformed[1], Point::new(70.0, 12.0));
    }

    #[test]
    fn short_sequences_pass_through() {
        let single = vec![Point::new(3.0, 4.0)];
        assert_eq!(
            deform_path(&single, Offset::new(10.0, 10.0), Offset::new(10.0, 10.0)),
            single
        );
        assert!(deform_path(&[], Offset::ZERO, Offset::ZERO).is_empty());
    }

    #[test]
    fn coordinates_are_rounded() {
        let points = vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0), Point::new(2.0, 2.0)];
        let deformed = deform_path(&points, Offset::new(0.333, 0.0), Offset::ZERO);

        assert_eq!(deformed[0].x, 0.33);
        assert_eq!(deformed[1].x, 1.17);
    }
}
