//! Real towns in coastal Andhra Pradesh for realistic test fixtures.
//!
//! Coordinates sourced from OpenStreetMap, longitude first.

use tour_planner::Location;

/// A named town with coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Town {
    pub name: &'static str,
    pub lon: f64,
    pub lat: f64,
}

impl Town {
    pub const fn new(name: &'static str, lon: f64, lat: f64) -> Self {
        Self { name, lon, lat }
    }

    pub fn location(&self) -> Location {
        Location::new(self.name, self.lon, self.lat)
    }
}

pub const TOWNS: &[Town] = &[
    Town::new("Tadepalligudem", 81.5270, 16.8138),
    Town::new("Vijayawada", 80.6480, 16.5062),
    Town::new("Bhimavaram", 81.5212, 16.5449),
    Town::new("Eluru", 81.0952, 16.7107),
    Town::new("Rajahmundry", 81.8040, 17.0005),
    Town::new("Kakinada", 82.2475, 16.9891),
    Town::new("Guntur", 80.4365, 16.3067),
    Town::new("Machilipatnam", 81.1386, 16.1875),
    Town::new("Tanuku", 81.6817, 16.7566),
    Town::new("Narsapur", 81.6986, 16.4346),
];

/// The first `n` towns as locations.
pub fn towns(n: usize) -> Vec<Location> {
    TOWNS.iter().take(n).map(Town::location).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_town_names_unique() {
        let mut names: Vec<_> = TOWNS.iter().map(|t| t.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), TOWNS.len());
    }

    #[test]
    fn test_coordinates_in_delta_area() {
        for town in TOWNS {
            assert!(town.lat > 16.0 && town.lat < 17.2, "{} lat out of range: {}", town.name, town.lat);
            assert!(town.lon > 80.3 && town.lon < 82.4, "{} lon out of range: {}", town.name, town.lon);
        }
    }
}
