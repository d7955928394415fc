//! Amostras de posição.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::distance::haversine_distance;
use crate::{GuiaError, GuiaResult};

/// Qualidade da precisão reportada pelo GPS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyQuality {
    /// Até 10 m.
    Excellent,
    /// Até 30 m.
    Good,
    /// Até 100 m.
    Medium,
    /// Até 200 m.
    Bad,
    /// Acima de 200 m.
    VeryBad,
}

impl AccuracyQuality {
    /// Classifica uma precisão em metros.
    pub fn from_accuracy(meters: f64) -> Self {
        if meters <= 10.0 {
            AccuracyQuality::Excellent
        } else if meters <= 30.0 {
            AccuracyQuality::Good
        } else if meters <= 100.0 {
            AccuracyQuality::Medium
        } else if meters <= 200.0 {
            AccuracyQuality::Bad
        } else {
            AccuracyQuality::VeryBad
        }
    }
}

impl std::fmt::Display for AccuracyQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccuracyQuality::Excellent => write!(f, "excellent"),
            AccuracyQuality::Good => write!(f, "good"),
            AccuracyQuality::Medium => write!(f, "medium"),
            AccuracyQuality::Bad => write!(f, "bad"),
            AccuracyQuality::VeryBad => write!(f, "very_bad"),
        }
    }
}

/// Coordenadas como chegam da fonte de posição, sem validação.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCoords {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

/// Posição bruta (formato do Geolocation API: `coords` + `timestamp` em ms).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPosition {
    pub coords: Option<RawCoords>,
    pub timestamp: Option<i64>,
}

impl RawPosition {
    /// Cria uma posição bruta completa.
    pub fn new(latitude: f64, longitude: f64, accuracy: f64, timestamp_ms: i64) -> Self {
        Self {
            coords: Some(RawCoords {
                latitude: Some(latitude),
                longitude: Some(longitude),
                accuracy: Some(accuracy),
                ..RawCoords::default()
            }),
            timestamp: Some(timestamp_ms),
        }
    }
}

/// Amostra de posição validada. Imutável após a construção.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionSample {
    latitude: f64,
    longitude: f64,
    accuracy: f64,
    accuracy_quality: AccuracyQuality,
    altitude: Option<f64>,
    heading: Option<f64>,
    speed: Option<f64>,
    timestamp: DateTime<Utc>,
}

impl PositionSample {
    /// Cria uma amostra validando coordenadas e precisão.
    pub fn new(
        latitude: f64,
        longitude: f64,
        accuracy: f64,
        timestamp: DateTime<Utc>,
    ) -> GuiaResult<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(GuiaError::invalid_position(format!(
                "latitude fora do intervalo: {}",
                latitude
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(GuiaError::invalid_position(format!(
                "longitude fora do intervalo: {}",
                longitude
            )));
        }
        if !accuracy.is_finite() || accuracy < 0.0 {
            return Err(GuiaError::invalid_position(format!(
                "precisão inválida: {}",
                accuracy
            )));
        }

        Ok(Self {
            latitude,
            longitude,
            accuracy,
            accuracy_quality: AccuracyQuality::from_accuracy(accuracy),
            altitude: None,
            heading: None,
            speed: None,
            timestamp,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    pub fn accuracy_quality(&self) -> AccuracyQuality {
        self.accuracy_quality
    }

    pub fn altitude(&self) -> Option<f64> {
        self.altitude
    }

    pub fn heading(&self) -> Option<f64> {
        self.heading
    }

    pub fn speed(&self) -> Option<f64> {
        self.speed
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Distância em metros até outra amostra.
    pub fn distance_to(&self, other: &PositionSample) -> f64 {
        haversine_distance(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

impl TryFrom<&RawPosition> for PositionSample {
    type Error = GuiaError;

    fn try_from(raw: &RawPosition) -> GuiaResult<Self> {
        let coords = raw
            .coords
            .as_ref()
            .ok_or_else(|| GuiaError::invalid_position("coords ausente"))?;
        let latitude = coords
            .latitude
            .ok_or_else(|| GuiaError::invalid_position("latitude ausente"))?;
        let longitude = coords
            .longitude
            .ok_or_else(|| GuiaError::invalid_position("longitude ausente"))?;
        let accuracy = coords
            .accuracy
            .ok_or_else(|| GuiaError::invalid_position("precisão ausente"))?;
        let millis = raw
            .timestamp
            .ok_or_else(|| GuiaError::invalid_position("timestamp ausente"))?;
        let timestamp = DateTime::<Utc>::from_timestamp_millis(millis)
            .ok_or_else(|| GuiaError::invalid_position(format!("timestamp inválido: {}", millis)))?;

        let mut sample = PositionSample::new(latitude, longitude, accuracy, timestamp)?;
        sample.altitude = coords.altitude;
        sample.heading = coords.heading;
        sample.speed = coords.speed;
        Ok(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_quality_thresholds() {
        assert_eq!(AccuracyQuality::from_accuracy(5.0), AccuracyQuality::Excellent);
        assert_eq!(AccuracyQuality::from_accuracy(10.0), AccuracyQuality::Excellent);
        assert_eq!(AccuracyQuality::from_accuracy(25.0), AccuracyQuality::Good);
        assert_eq!(AccuracyQuality::from_accuracy(80.0), AccuracyQuality::Medium);
        assert_eq!(AccuracyQuality::from_accuracy(150.0), AccuracyQuality::Bad);
        assert_eq!(AccuracyQuality::from_accuracy(500.0), AccuracyQuality::VeryBad);
    }

    #[test]
    fn test_accuracy_quality_display() {
        assert_eq!(format!("{}", AccuracyQuality::VeryBad), "very_bad");
        assert_eq!(format!("{}", AccuracyQuality::Excellent), "excellent");
    }

    #[test]
    fn test_sample_rejects_out_of_range() {
        let now = Utc::now();
        assert!(PositionSample::new(91.0, 0.0, 5.0, now).is_err());
        assert!(PositionSample::new(0.0, -181.0, 5.0, now).is_err());
        assert!(PositionSample::new(0.0, 0.0, -1.0, now).is_err());
        assert!(PositionSample::new(f64::NAN, 0.0, 5.0, now).is_err());
    }

    #[test]
    fn test_try_from_raw_position() {
        let mut raw = RawPosition::new(-8.0476, -34.8770, 8.0, 1_700_000_000_000);
        if let Some(coords) = raw.coords.as_mut() {
            coords.speed = Some(1.5);
        }

        let sample = PositionSample::try_from(&raw).unwrap();

        assert_eq!(sample.latitude(), -8.0476);
        assert_eq!(sample.accuracy_quality(), AccuracyQuality::Excellent);
        assert_eq!(sample.speed(), Some(1.5));
        assert_eq!(sample.timestamp().timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_try_from_missing_fields() {
        let raw = RawPosition::default();
        assert!(matches!(
            PositionSample::try_from(&raw),
            Err(GuiaError::InvalidPosition(_))
        ));

        let mut raw = RawPosition::new(-8.0, -34.0, 5.0, 0);
        raw.timestamp = None;
        assert!(PositionSample::try_from(&raw).is_err());
    }

    #[test]
    fn test_raw_position_from_geolocation_json() {
        let json = r#"{
            "coords": { "latitude": -18.4696091, "longitude": -43.4953982, "accuracy": 10.0, "altitudeAccuracy": null },
            "timestamp": 1700000000000
        }"#;
        let raw: RawPosition = serde_json::from_str(json).unwrap();
        let sample = PositionSample::try_from(&raw).unwrap();
        assert_eq!(sample.longitude(), -43.4953982);
        assert!(sample.altitude().is_none());
    }
}
