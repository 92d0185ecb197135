use crate::constants::EARTH_RADIUS_M;

/// Great circle distance in metres between two points
/// in decimal degrees, using the haversine formula.
pub fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.).sin().powi(2);

    2. * EARTH_RADIUS_M * a.sqrt().min(1.).asin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn one_degree_latitude() {
        // 2 * pi * r / 360
        assert_relative_eq!(haversine(0., 0., 1., 0.), 111_195.08, epsilon = 0.01);
        assert_eq!(haversine(55.7, 13.2, 55.7, 13.2), 0.);
    }

    #[test]
    fn symmetric() {
        let a = haversine(55.70, 13.19, 59.33, 18.07);
        let b = haversine(59.33, 18.07, 55.70, 13.19);
        assert_relative_eq!(a, b, epsilon = 1e-6);
        // Lund - Stockholm, roughly 500 km
        assert!(a > 450_000. && a < 550_000.);
    }
}
