//! Great-circle distance and nearest-office selection.

use crate::offices::Office;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two WGS84 points, in kilometres.
#[must_use]
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Office closest to the user, together with the distance to it.
///
/// Scans in list order and only replaces the current best on a strictly
/// smaller distance, so ties go to the earlier office. `None` only when
/// `offices` is empty.
#[must_use]
pub fn nearest_with_distance(
    user_lat: f64,
    user_lng: f64,
    offices: &[Office],
) -> Option<(&Office, f64)> {
    let mut best: Option<(&Office, f64)> = None;

    for office in offices {
        let d = distance_km(
            user_lat,
            user_lng,
            office.coordinates.lat,
            office.coordinates.lng,
        );
        match best {
            Some((_, min)) if d >= min => {}
            _ => best = Some((office, d)),
        }
    }

    best
}

/// Office closest to the user. See [`nearest_with_distance`].
#[must_use]
pub fn nearest_office(user_lat: f64, user_lng: f64, offices: &[Office]) -> Option<&Office> {
    nearest_with_distance(user_lat, user_lng, offices).map(|(office, _)| office)
}

/// Short human label: metres below one kilometre, otherwise one decimal of km.
#[must_use]
pub fn format_distance(km: f64) -> String {
    if km < 1.0 {
        format!("{:.0}m away", (km * 1000.0).round())
    } else {
        format!("{km:.1}km away")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offices::{Contact, Coordinates};

    const HEAD: (f64, f64) = (17.433_523_6, 78.490_871);
    const BRANCH: (f64, f64) = (17.434_892_8, 78.490_521_4);
    const BALANAGAR: (f64, f64) = (17.465_346_7, 78.448_686_8);

    fn office(id: &str, (lat, lng): (f64, f64)) -> Office {
        Office {
            id: id.to_string(),
            name: id.to_string(),
            contacts: vec![Contact {
                name: "Desk".to_string(),
                phone: "1".to_string(),
                is_primary: false,
            }],
            maps_url: String::new(),
            coordinates: Coordinates::new(lat, lng),
        }
    }

    fn fixed_offices() -> Vec<Office> {
        vec![
            office("head-office", HEAD),
            office("branch-office", BRANCH),
            office("balanagar-branch", BALANAGAR),
        ]
    }

    fn brute_force_nearest(lat: f64, lng: f64, offices: &[Office]) -> &Office {
        let mut best = &offices[0];
        for o in offices {
            if distance_km(lat, lng, o.coordinates.lat, o.coordinates.lng)
                < distance_km(lat, lng, best.coordinates.lat, best.coordinates.lng)
            {
                best = o;
            }
        }
        best
    }

    #[test]
    fn distance_is_symmetric() {
        let pairs = [
            (HEAD, BRANCH),
            (HEAD, BALANAGAR),
            ((51.5074, -0.1278), (40.7128, -74.0060)),
            ((-33.8688, 151.2093), (35.6762, 139.6503)),
        ];
        for (a, b) in pairs {
            let ab = distance_km(a.0, a.1, b.0, b.1);
            let ba = distance_km(b.0, b.1, a.0, a.1);
            assert!((ab - ba).abs() <= 1e-9 * ab.max(1.0), "{ab} vs {ba}");
        }
    }

    #[test]
    fn self_distance_is_zero() {
        for (lat, lng) in [HEAD, BRANCH, (0.0, 0.0), (-89.9, 179.9)] {
            assert_eq!(distance_km(lat, lng, lat, lng), 0.0);
        }
    }

    #[test]
    fn head_to_branch_known_value() {
        let d = distance_km(HEAD.0, HEAD.1, BRANCH.0, BRANCH.1);
        assert!((d - 0.153).abs() <= 0.01, "got {d}");
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let d = distance_km(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111.19).abs() < 0.01, "got {d}");
    }

    #[test]
    fn nearest_matches_brute_force() {
        let offices = fixed_offices();
        let samples = [
            (17.434, 78.4907),
            (17.4352, 78.4904),
            (17.47, 78.44),
            (17.3850, 78.4867),
            (28.6139, 77.2090),
            (17.4500, 78.4700),
        ];
        for (lat, lng) in samples {
            let got = nearest_office(lat, lng, &offices).expect("non-empty");
            let want = brute_force_nearest(lat, lng, &offices);
            assert_eq!(got.id, want.id, "sample ({lat}, {lng})");
        }
    }

    #[test]
    fn nearest_tie_goes_to_first_office() {
        let offices = vec![office("east", (0.0, 1.0)), office("west", (0.0, -1.0))];
        let got = nearest_office(0.0, 0.0, &offices).unwrap();
        assert_eq!(got.id, "east");

        let reversed = vec![office("west", (0.0, -1.0)), office("east", (0.0, 1.0))];
        let got = nearest_office(0.0, 0.0, &reversed).unwrap();
        assert_eq!(got.id, "west");
    }

    #[test]
    fn nearest_of_empty_list_is_none() {
        assert!(nearest_office(17.0, 78.0, &[]).is_none());
        assert!(nearest_with_distance(17.0, 78.0, &[]).is_none());
    }

    #[test]
    fn nearest_with_distance_reports_distance_to_winner() {
        let offices = fixed_offices();
        let (o, d) = nearest_with_distance(17.434, 78.4907, &offices).unwrap();
        assert_eq!(o.id, "head-office");
        assert!((d - 0.06).abs() < 0.01, "got {d}");
    }

    #[test]
    fn format_distance_uses_metres_below_one_km() {
        assert_eq!(format_distance(0.153), "153m away");
        assert_eq!(format_distance(0.0), "0m away");
    }

    #[test]
    fn format_distance_uses_km_with_one_decimal() {
        assert_eq!(format_distance(1.0), "1.0km away");
        assert_eq!(format_distance(12.345), "12.3km away");
    }
}
