//! Distância de grande círculo.

/// Raio médio da Terra em metros.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Distância em metros entre dois pontos (graus decimais), pela fórmula de haversine.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_point_is_zero() {
        assert_eq!(haversine_distance(-8.05, -34.9, -8.05, -34.9), 0.0);
    }

    #[test]
    fn test_one_degree_latitude() {
        // 1° de latitude ≈ 111.195 km numa esfera de 6371 km
        let d = haversine_distance(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111_195.0).abs() < 1.0);
    }

    #[test]
    fn test_recife_olinda() {
        // Marco Zero (Recife) até Alto da Sé (Olinda): ~6 km
        let d = haversine_distance(-8.0631, -34.8711, -8.0146, -34.8457);
        assert!(d > 5_500.0 && d < 6_500.0, "distance was {}", d);
    }

    #[test]
    fn test_symmetric() {
        let a = haversine_distance(-23.55, -46.63, -22.90, -43.17);
        let b = haversine_distance(-22.90, -43.17, -23.55, -46.63);
        assert!((a - b).abs() < 1e-6);
    }
}
