//! Posições e filtro de admissão.
//!
//! ## Regra de admissão
//!
//! Uma amostra substitui a posição rastreada quando:
//!
//! - a qualidade da precisão não está no conjunto rejeitado, **e**
//! - `distância ≥ min_distance_meters` **ou** `decorrido ≥ min_time_ms`
//!
//! Aceitas com `decorrido < immediate_threshold_ms` são classificadas como
//! [`Classification::Immediate`].

mod distance;
mod filter;
mod sample;

pub use distance::{haversine_distance, EARTH_RADIUS_METERS};
pub use filter::{AdmissionReason, AdmissionResult, Classification, PositionAdmissionFilter};
pub use sample::{AccuracyQuality, PositionSample, RawCoords, RawPosition};
