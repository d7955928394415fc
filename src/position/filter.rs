//! Filtro de admissão de posições.
//!
//! Decide se uma nova amostra substitui a posição rastreada. Uma amostra é
//! aceita somente se a qualidade da precisão não estiver no conjunto
//! rejeitado e se ela se afastou o suficiente ou chegou tarde o suficiente.

use std::time::Duration;

use serde::Serialize;

use super::sample::{PositionSample, RawPosition};
use crate::cache::elapsed_between;
use crate::types::config::PositionConfig;

/// Classificação de uma atualização de posição.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Classification {
    /// Aceita após o intervalo regular.
    Updated,
    /// Rejeitada; a posição rastreada não mudou.
    NotUpdated,
    /// Aceita antes do intervalo regular (deslocamento relevante).
    Immediate,
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Classification::Updated => write!(f, "PositionUpdate"),
            Classification::NotUpdated => write!(f, "PositionNotUpdate"),
            Classification::Immediate => write!(f, "ImmediateAddressUpdate"),
        }
    }
}

/// Motivo da decisão do filtro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionReason {
    /// Nenhuma posição rastreada ainda.
    FirstSample,
    /// Deslocamento acima do mínimo.
    Moved,
    /// Tempo decorrido acima do mínimo.
    TimeElapsed,
    /// Amostra estruturalmente inválida.
    Invalid,
    /// Qualidade da precisão rejeitada.
    AccuracyRejected,
    /// Perto demais e cedo demais.
    InsufficientChange,
    /// Amostra mais antiga que a rastreada.
    Stale,
}

/// Resultado do filtro de admissão.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AdmissionResult {
    /// Se a amostra substituiu a posição rastreada.
    pub accepted: bool,

    /// Classificação da atualização.
    pub classification: Classification,

    /// Motivo da decisão.
    pub reason: AdmissionReason,

    /// Distância até a posição rastreada, quando havia uma.
    pub distance_meters: Option<f64>,

    /// Tempo desde a posição rastreada, quando havia uma.
    pub elapsed: Option<Duration>,
}

impl AdmissionResult {
    fn rejected(reason: AdmissionReason) -> Self {
        Self {
            accepted: false,
            classification: Classification::NotUpdated,
            reason,
            distance_meters: None,
            elapsed: None,
        }
    }
}

/// Filtro de admissão com a posição rastreada.
#[derive(Debug, Clone)]
pub struct PositionAdmissionFilter {
    config: PositionConfig,
    tracked: Option<PositionSample>,
}

impl PositionAdmissionFilter {
    /// Cria um filtro sem posição rastreada.
    pub fn new(config: PositionConfig) -> Self {
        Self {
            config,
            tracked: None,
        }
    }

    /// Avalia uma posição bruta. Amostras malformadas são rejeitadas sem erro.
    pub fn update(&mut self, raw: &RawPosition) -> AdmissionResult {
        match PositionSample::try_from(raw) {
            Ok(sample) => self.update_sample(sample),
            Err(err) => {
                tracing::warn!(error = %err, "Ignoring malformed position sample");
                AdmissionResult::rejected(AdmissionReason::Invalid)
            }
        }
    }

    /// Avalia uma amostra já validada.
    pub fn update_sample(&mut self, sample: PositionSample) -> AdmissionResult {
        let quality = sample.accuracy_quality();
        if self.config.rejected_qualities.contains(&quality) {
            tracing::debug!(
                accuracy = sample.accuracy(),
                quality = %quality,
                "Position rejected by accuracy gate"
            );
            return AdmissionResult::rejected(AdmissionReason::AccuracyRejected);
        }

        let Some(tracked) = self.tracked.as_ref() else {
            tracing::info!(
                latitude = sample.latitude(),
                longitude = sample.longitude(),
                "First position accepted"
            );
            self.tracked = Some(sample);
            return AdmissionResult {
                accepted: true,
                classification: Classification::Updated,
                reason: AdmissionReason::FirstSample,
                distance_meters: None,
                elapsed: None,
            };
        };

        if sample.timestamp() < tracked.timestamp() {
            tracing::debug!("Position rejected: older than tracked position");
            return AdmissionResult::rejected(AdmissionReason::Stale);
        }

        let distance = tracked.distance_to(&sample);
        let elapsed = elapsed_between(tracked.timestamp(), sample.timestamp());
        let moved = distance >= self.config.min_distance_meters;
        let waited = elapsed >= self.config.min_time();

        if !moved && !waited {
            tracing::trace!(
                distance_meters = distance,
                elapsed_ms = elapsed.as_millis() as u64,
                "Position rejected: insufficient change"
            );
            return AdmissionResult {
                distance_meters: Some(distance),
                elapsed: Some(elapsed),
                ..AdmissionResult::rejected(AdmissionReason::InsufficientChange)
            };
        }

        let classification = if elapsed < self.config.immediate_threshold() {
            Classification::Immediate
        } else {
            Classification::Updated
        };
        let reason = if moved {
            AdmissionReason::Moved
        } else {
            AdmissionReason::TimeElapsed
        };

        tracing::info!(
            latitude = sample.latitude(),
            longitude = sample.longitude(),
            distance_meters = distance,
            elapsed_ms = elapsed.as_millis() as u64,
            classification = %classification,
            "Position accepted"
        );
        self.tracked = Some(sample);

        AdmissionResult {
            accepted: true,
            classification,
            reason,
            distance_meters: Some(distance),
            elapsed: Some(elapsed),
        }
    }

    /// Posição rastreada atual.
    pub fn tracked(&self) -> Option<&PositionSample> {
        self.tracked.as_ref()
    }

    /// Esquece a posição rastreada.
    pub fn reset(&mut self) {
        self.tracked = None;
    }

    /// Configuração em uso.
    pub fn config(&self) -> &PositionConfig {
        &self.config
    }
}

impl Default for PositionAdmissionFilter {
    fn default() -> Self {
        Self::new(PositionConfig::default())
    }
}
