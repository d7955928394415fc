//! Pipeline de rastreamento.
//!
//! Amostra bruta → filtro de admissão → resolvedor de endereço (externo) →
//! [`AddressCache`] → observers (com capacidade e de função) com a
//! atualização completa.
//!
//! Cada amostra é processada até o fim, incluindo todos os observers, antes
//! da próxima.

use std::sync::Arc;

use serde::Serialize;

use crate::address::{AddressCache, AddressSnapshot, ChangeDetails, RawAddress};
use crate::observer::ObserverSubject;
use crate::position::{AdmissionResult, PositionAdmissionFilter, PositionSample, RawPosition};
use crate::types::config::PositionConfig;
use crate::GuiaResult;

/// Resolvedor de endereço: geocodificação reversa fora deste crate.
///
/// Retorna `Ok(None)` quando a posição não tem endereço conhecido.
pub trait AddressResolver: Send + Sync {
    fn resolve(&self, position: &PositionSample) -> GuiaResult<Option<RawAddress>>;
}

impl<F> AddressResolver for F
where
    F: Fn(&PositionSample) -> GuiaResult<Option<RawAddress>> + Send + Sync,
{
    fn resolve(&self, position: &PositionSample) -> GuiaResult<Option<RawAddress>> {
        self(position)
    }
}

/// Atualização entregue aos observers de função.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionUpdate {
    /// Posição aceita.
    pub position: PositionSample,

    /// Registro bruto do resolvedor.
    pub raw_address: Option<RawAddress>,

    /// Endereço padronizado.
    pub address: Option<AddressSnapshot>,

    /// Mudanças de campo notificadas nesta atualização.
    pub changes: Vec<ChangeDetails>,
}

/// Resultado do processamento de uma amostra.
#[derive(Debug, Clone)]
pub struct TrackOutcome {
    /// Decisão do filtro de admissão.
    pub admission: AdmissionResult,

    /// Endereço resolvido, se a amostra foi aceita e resolvida.
    pub address: Option<AddressSnapshot>,

    /// Mudanças notificadas.
    pub changes: Vec<ChangeDetails>,

    /// Falha do resolvedor, se houve.
    pub resolver_error: Option<String>,
}

impl TrackOutcome {
    fn rejected(admission: AdmissionResult) -> Self {
        Self {
            admission,
            address: None,
            changes: Vec::new(),
            resolver_error: None,
        }
    }
}

/// Rastreador de posição e endereço.
pub struct GeolocationTracker {
    filter: PositionAdmissionFilter,
    resolver: Box<dyn AddressResolver>,
    cache: Arc<AddressCache>,
    updates: Arc<ObserverSubject<PositionUpdate>>,
}

impl GeolocationTracker {
    /// Cria um rastreador.
    pub fn new(
        config: PositionConfig,
        cache: Arc<AddressCache>,
        resolver: impl AddressResolver + 'static,
    ) -> Self {
        Self {
            filter: PositionAdmissionFilter::new(config),
            resolver: Box::new(resolver),
            cache,
            updates: Arc::new(ObserverSubject::new()),
        }
    }

    /// Processa uma posição bruta.
    ///
    /// Falhas do resolvedor não interrompem o rastreamento: a posição
    /// aceita continua rastreada e a falha aparece no resultado.
    pub fn process(&mut self, raw: &RawPosition) -> TrackOutcome {
        let admission = self.filter.update(raw);
        if !admission.accepted {
            return TrackOutcome::rejected(admission);
        }

        let Some(position) = self.filter.tracked().cloned() else {
            return TrackOutcome::rejected(admission);
        };

        let raw_address = match self.resolver.resolve(&position) {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!(
                    latitude = position.latitude(),
                    longitude = position.longitude(),
                    error = %err,
                    "Address resolution failed"
                );
                return TrackOutcome {
                    resolver_error: Some(err.to_string()),
                    ..TrackOutcome::rejected(admission)
                };
            }
        };

        let (address, changes) = match raw_address.as_ref() {
            Some(raw) => {
                let (snapshot, changes) = self.cache.resolve_with_changes(raw);
                (Some(snapshot), changes)
            }
            None => {
                tracing::debug!("Resolver returned no address for position");
                (None, Vec::new())
            }
        };

        let update = PositionUpdate {
            position,
            raw_address,
            address: address.clone(),
            changes: changes.clone(),
        };
        self.updates.notify_all(&update);

        TrackOutcome {
            admission,
            address,
            changes,
            resolver_error: None,
        }
    }

    /// Subject das atualizações de posição (observers com capacidade e de função).
    pub fn updates(&self) -> Arc<ObserverSubject<PositionUpdate>> {
        self.updates.clone()
    }

    /// Cache de endereços em uso.
    pub fn cache(&self) -> &Arc<AddressCache> {
        &self.cache
    }

    /// Posição rastreada atual.
    pub fn tracked(&self) -> Option<&PositionSample> {
        self.filter.tracked()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::RawAddressFields;
    use crate::position::Classification;
    use crate::GuiaError;
    use std::sync::Mutex;
    use std::time::Duration;

    const T0: i64 = 1_700_000_000_000;

    fn city_resolver(position: &PositionSample) -> GuiaResult<Option<RawAddress>> {
        // Norte de -8.04 é Olinda, sul é Recife
        let city = if position.latitude() > -8.04 { "Olinda" } else { "Recife" };
        Ok(Some(RawAddress::from_fields(RawAddressFields {
            city: Some(city.to_string()),
            ..RawAddressFields::default()
        })))
    }

    fn create_tracker(resolver: impl AddressResolver + 'static) -> GeolocationTracker {
        let cache = Arc::new(AddressCache::new(10, Duration::from_secs(300)));
        GeolocationTracker::new(PositionConfig::default(), cache, resolver)
    }

    #[test]
    fn test_accepted_sample_is_resolved() {
        let mut tracker = create_tracker(city_resolver);

        let outcome = tracker.process(&RawPosition::new(-8.0631, -34.8711, 5.0, T0));

        assert!(outcome.admission.accepted);
        assert_eq!(outcome.address.unwrap().municipio(), Some("Recife"));
        assert_eq!(outcome.changes.len(), 1);
    }

    #[test]
    fn test_rejected_sample_skips_resolver() {
        let calls = Arc::new(Mutex::new(0));
        let counter = calls.clone();
        let mut tracker = create_tracker(move |p: &PositionSample| {
            *counter.lock().unwrap() += 1;
            city_resolver(p)
        });

        tracker.process(&RawPosition::new(-8.0631, -34.8711, 5.0, T0));
        let outcome = tracker.process(&RawPosition::new(-8.0631, -34.8711, 5.0, T0 + 1_000));

        assert_eq!(outcome.admission.classification, Classification::NotUpdated);
        assert!(outcome.address.is_none());
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn test_resolver_error_is_reported() {
        let mut tracker = create_tracker(|_: &PositionSample| -> GuiaResult<Option<RawAddress>> {
            Err(GuiaError::Resolver("HTTP 503".to_string()))
        });

        let outcome = tracker.process(&RawPosition::new(-8.0631, -34.8711, 5.0, T0));

        assert!(outcome.admission.accepted);
        assert!(outcome.resolver_error.unwrap().contains("503"));
        assert!(tracker.tracked().is_some());
    }

    struct AddressRecorder {
        seen: Mutex<Vec<Option<String>>>,
    }

    impl crate::observer::Observer<PositionUpdate> for AddressRecorder {
        fn name(&self) -> &str {
            "address-recorder"
        }

        fn update(&self, _subject: &ObserverSubject<PositionUpdate>, update: &PositionUpdate) -> GuiaResult<()> {
            let city = update
                .address
                .as_ref()
                .and_then(|a| a.municipio())
                .map(str::to_string);
            self.seen.lock().unwrap().push(city);
            Ok(())
        }
    }

    #[test]
    fn test_capability_observers_receive_updates() {
        let mut tracker = create_tracker(city_resolver);
        let recorder = Arc::new(AddressRecorder {
            seen: Mutex::new(Vec::new()),
        });
        tracker.updates().subscribe(recorder.clone());

        tracker.process(&RawPosition::new(-8.0631, -34.8711, 5.0, T0));
        tracker.process(&RawPosition::new(-8.0146, -34.8457, 5.0, T0 + 120_000));

        assert_eq!(
            *recorder.seen.lock().unwrap(),
            vec![Some("Recife".to_string()), Some("Olinda".to_string())]
        );
    }

    #[test]
    fn test_function_observers_receive_updates() {
        let mut tracker = create_tracker(city_resolver);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        tracker.updates().subscribe_function(move |update: &PositionUpdate| {
            sink.lock().unwrap().push(update.changes.len());
            Ok(())
        });

        tracker.process(&RawPosition::new(-8.0631, -34.8711, 5.0, T0));
        tracker.process(&RawPosition::new(-8.0146, -34.8457, 5.0, T0 + 120_000));

        assert_eq!(*seen.lock().unwrap(), vec![1, 1]);
    }
}
