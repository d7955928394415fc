//! Observers padrão do Guia.
//!
//! - `LoggingObserver`: Registra mudanças de endereço no log
//! - `MetricsObserver`: Conta mudanças por tipo

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::address::{AddressChangeEvent, ChangeType};
use crate::GuiaResult;

use super::{Observer, ObserverSubject};

// ═══════════════════════════════════════════════════════════════════════════
// LoggingObserver
// ═══════════════════════════════════════════════════════════════════════════

/// Observer que registra mudanças de endereço no log (tracing).
#[derive(Debug, Default)]
pub struct LoggingObserver;

impl LoggingObserver {
    /// Cria um novo LoggingObserver.
    pub fn new() -> Self {
        Self
    }
}

impl Observer<AddressChangeEvent> for LoggingObserver {
    fn name(&self) -> &str {
        "logging"
    }

    fn update(
        &self,
        _subject: &ObserverSubject<AddressChangeEvent>,
        event: &AddressChangeEvent,
    ) -> GuiaResult<()> {
        tracing::info!(
            change_type = %event.change_type,
            previous = event.change.previous.as_deref().unwrap_or("-"),
            current = event.change.current.as_deref().unwrap_or("-"),
            timestamp = event.details.timestamp.timestamp_millis(),
            "Address change"
        );

        // Troca de município é o evento mais relevante para o usuário
        if event.change_type == ChangeType::MunicipioChanged {
            if let Some(uf) = event.details.current.sigla_uf.as_deref() {
                tracing::info!(uf = uf, "Entered municipality");
            }
        }

        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// MetricsObserver
// ═══════════════════════════════════════════════════════════════════════════

/// Observer que conta mudanças por tipo.
#[derive(Debug, Default)]
pub struct MetricsObserver {
    logradouro: AtomicU64,
    bairro: AtomicU64,
    municipio: AtomicU64,
}

impl MetricsObserver {
    /// Cria um novo MetricsObserver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total de mudanças de um tipo.
    pub fn count(&self, change_type: ChangeType) -> u64 {
        self.counter(change_type).load(Ordering::Relaxed)
    }

    /// Total de mudanças de todos os tipos.
    pub fn total(&self) -> u64 {
        self.count(ChangeType::LogradouroChanged)
            + self.count(ChangeType::BairroChanged)
            + self.count(ChangeType::MunicipioChanged)
    }

    /// Retorna as métricas em formato estruturado.
    pub fn metrics(&self) -> ChangeMetrics {
        ChangeMetrics {
            logradouro_changes: self.count(ChangeType::LogradouroChanged),
            bairro_changes: self.count(ChangeType::BairroChanged),
            municipio_changes: self.count(ChangeType::MunicipioChanged),
            total: self.total(),
        }
    }

    fn counter(&self, change_type: ChangeType) -> &AtomicU64 {
        match change_type {
            ChangeType::LogradouroChanged => &self.logradouro,
            ChangeType::BairroChanged => &self.bairro,
            ChangeType::MunicipioChanged => &self.municipio,
        }
    }
}

/// Métricas coletadas pelo MetricsObserver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeMetrics {
    pub logradouro_changes: u64,
    pub bairro_changes: u64,
    pub municipio_changes: u64,
    pub total: u64,
}

impl Observer<AddressChangeEvent> for MetricsObserver {
    fn name(&self) -> &str {
        "metrics"
    }

    fn update(
        &self,
        _subject: &ObserverSubject<AddressChangeEvent>,
        event: &AddressChangeEvent,
    ) -> GuiaResult<()> {
        self.counter(event.change_type).fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
