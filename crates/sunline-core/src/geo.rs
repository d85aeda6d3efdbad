// ── Planar geo helpers ──
//
// LV95 is a projected grid, so distances and bearings over the short
// ranges webcams cover are plain Euclidean geometry.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::model::ChCoord;

/// Straight-line distance between two grid points, in kilometres.
pub fn planar_distance_km(a: ChCoord, b: ChCoord) -> f64 {
    (b.e - a.e).hypot(b.n - a.n) / 1000.0
}

/// Bearing from `a` to `b` in degrees, clockwise from grid north, in `[0, 360)`.
pub fn planar_bearing_deg(a: ChCoord, b: ChCoord) -> f64 {
    let degrees = (b.e - a.e).atan2(b.n - a.n).to_degrees();
    if degrees >= 0.0 { degrees } else { degrees + 360.0 }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Compass8 {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

const COMPASS_8: [Compass8; 8] = [
    Compass8::N,
    Compass8::NE,
    Compass8::E,
    Compass8::SE,
    Compass8::S,
    Compass8::SW,
    Compass8::W,
    Compass8::NW,
];

/// Nearest 8-point compass label for a bearing. Any finite angle is accepted.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::as_conversions)]
pub fn compass8_from_bearing(bearing_deg: f64) -> Compass8 {
    let normalized = bearing_deg.rem_euclid(360.0);
    let index = ((normalized / 45.0).round() as usize) % COMPASS_8.len();
    COMPASS_8[index]
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: ChCoord = ChCoord {
        e: 2_600_000.0,
        n: 1_200_000.0,
    };

    fn offset(de: f64, dn: f64) -> ChCoord {
        ChCoord::new(ORIGIN.e + de, ORIGIN.n + dn)
    }

    #[test]
    fn distance_is_in_kilometres() {
        let d = planar_distance_km(ORIGIN, offset(3000.0, 4000.0));
        assert!((d - 5.0).abs() < 1e-9);
    }

    #[test]
    fn bearing_is_clockwise_from_north() {
        assert!((planar_bearing_deg(ORIGIN, offset(0.0, 100.0)) - 0.0).abs() < 1e-9);
        assert!((planar_bearing_deg(ORIGIN, offset(100.0, 0.0)) - 90.0).abs() < 1e-9);
        assert!((planar_bearing_deg(ORIGIN, offset(0.0, -100.0)) - 180.0).abs() < 1e-9);
        assert!((planar_bearing_deg(ORIGIN, offset(-100.0, 0.0)) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn compass_rounds_to_nearest_point() {
        assert_eq!(compass8_from_bearing(0.0), Compass8::N);
        assert_eq!(compass8_from_bearing(22.4), Compass8::N);
        assert_eq!(compass8_from_bearing(22.6), Compass8::NE);
        assert_eq!(compass8_from_bearing(225.0), Compass8::SW);
        assert_eq!(compass8_from_bearing(350.0), Compass8::N);
        assert_eq!(compass8_from_bearing(-90.0), Compass8::W);
        assert_eq!(compass8_from_bearing(720.0 + 135.0), Compass8::SE);
    }
}
