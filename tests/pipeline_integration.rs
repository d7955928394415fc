//! Testes de integração do pipeline posição → endereço → observers.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use guia::address::{AddressCache, AddressChangeEvent, ChangeType, RawAddress, RawAddressFields};
use guia::cache::ManualClock;
use guia::coordinator::{ChangeDetectionCoordinator, ChangeSubject};
use guia::observer::{MetricsObserver, Observer};
use guia::position::{Classification, PositionSample, RawPosition};
use guia::tracker::{GeolocationTracker, PositionUpdate};
use guia::types::config::PositionConfig;
use guia::{GuiaError, GuiaResult};

const T0: i64 = 1_700_000_000_000;

fn recife() -> RawAddress {
    RawAddress::from_fields(RawAddressFields {
        road: Some("Rua da Aurora".to_string()),
        suburb: Some("Boa Vista".to_string()),
        city: Some("Recife".to_string()),
        state: Some("Pernambuco".to_string()),
        ..RawAddressFields::default()
    })
}

fn olinda() -> RawAddress {
    RawAddress::from_fields(RawAddressFields {
        road: Some("Rua do Amparo".to_string()),
        suburb: Some("Carmo".to_string()),
        city: Some("Olinda".to_string()),
        state: Some("Pernambuco".to_string()),
        ..RawAddressFields::default()
    })
}

fn paulista() -> RawAddress {
    RawAddress::from_fields(RawAddressFields {
        road: Some("Avenida Beira Mar".to_string()),
        suburb: Some("Janga".to_string()),
        city: Some("Paulista".to_string()),
        state: Some("Pernambuco".to_string()),
        ..RawAddressFields::default()
    })
}

struct FailingObserver;

impl Observer<AddressChangeEvent> for FailingObserver {
    fn name(&self) -> &str {
        "failing"
    }

    fn update(&self, _subject: &ChangeSubject, _event: &AddressChangeEvent) -> GuiaResult<()> {
        Err(GuiaError::other("observer down"))
    }
}

struct PanickingObserver;

impl Observer<AddressChangeEvent> for PanickingObserver {
    fn name(&self) -> &str {
        "panicking"
    }

    fn update(&self, _subject: &ChangeSubject, _event: &AddressChangeEvent) -> GuiaResult<()> {
        panic!("observer exploded");
    }
}

#[test]
fn test_recife_to_olinda_municipality_change() {
    let cache = Arc::new(AddressCache::new(2, Duration::from_secs(300)));
    let subject = Arc::new(ChangeSubject::new());
    let metrics = Arc::new(MetricsObserver::new());
    subject.subscribe(metrics.clone());

    let mut coordinator = ChangeDetectionCoordinator::new();
    coordinator.wire(cache.clone(), subject.clone()).unwrap();

    let first = cache.resolve(&recife());
    let second = cache.resolve(&olinda());

    assert_eq!(first.municipio(), Some("Recife"));
    assert_eq!(first.sigla_uf(), Some("PE"));
    assert_eq!(second.municipio(), Some("Olinda"));
    assert_eq!(cache.previous_address().unwrap().municipio(), Some("Recife"));
    assert_eq!(metrics.count(ChangeType::MunicipioChanged), 2);
    assert_eq!(metrics.count(ChangeType::BairroChanged), 2);
    assert_eq!(metrics.count(ChangeType::LogradouroChanged), 2);

    // Mesmo endereço de novo: nenhuma notificação nova
    cache.resolve(&olinda());
    assert_eq!(metrics.total(), 6);
}

#[test]
fn test_third_address_evicts_least_recent() {
    let cache = AddressCache::new(2, Duration::from_secs(300));
    let recife_key = AddressCache::cache_key(&recife()).unwrap();
    let olinda_key = AddressCache::cache_key(&olinda()).unwrap();
    let paulista_key = AddressCache::cache_key(&paulista()).unwrap();

    cache.resolve(&recife());
    cache.resolve(&olinda());
    cache.resolve(&paulista());

    assert_eq!(cache.len(), 2);
    assert!(!cache.contains_key(&recife_key));
    assert!(cache.contains_key(&olinda_key));
    assert!(cache.contains_key(&paulista_key));
    assert_eq!(cache.stats().evictions, 1);
}

#[test]
fn test_entries_expire_with_clock() {
    let clock = Arc::new(ManualClock::new(Utc.timestamp_millis_opt(T0).unwrap()));
    let cache = AddressCache::with_clock(10, Duration::from_secs(300), clock.clone());
    let key = AddressCache::cache_key(&recife()).unwrap();

    cache.resolve(&recife());
    clock.advance(Duration::from_secs(301));

    assert_eq!(cache.clean_expired(), 1);
    assert!(!cache.contains_key(&key));
}

#[test]
fn test_failing_observers_are_isolated() {
    let cache = Arc::new(AddressCache::new(10, Duration::from_secs(300)));
    let subject = Arc::new(ChangeSubject::new());
    let metrics = Arc::new(MetricsObserver::new());
    subject.subscribe(Arc::new(FailingObserver));
    subject.subscribe(Arc::new(PanickingObserver));
    subject.subscribe(metrics.clone());

    let mut coordinator = ChangeDetectionCoordinator::new();
    coordinator.wire(cache.clone(), subject).unwrap();

    cache.resolve(&recife());
    cache.resolve(&olinda());

    assert_eq!(metrics.count(ChangeType::MunicipioChanged), 2);
    assert_eq!(cache.current_address().unwrap().municipio(), Some("Olinda"));
}

#[test]
fn test_tracker_end_to_end() {
    let cache = Arc::new(AddressCache::new(2, Duration::from_secs(300)));
    let subject = Arc::new(ChangeSubject::new());
    let municipalities = Arc::new(Mutex::new(Vec::new()));
    let sink = municipalities.clone();
    subject.subscribe_function(move |event: &AddressChangeEvent| {
        if event.change_type == ChangeType::MunicipioChanged {
            sink.lock().unwrap().push(event.change.current.clone());
        }
        Ok(())
    });

    let mut coordinator = ChangeDetectionCoordinator::new();
    coordinator.wire(cache.clone(), subject).unwrap();

    let mut tracker = GeolocationTracker::new(
        PositionConfig::default(),
        cache.clone(),
        |position: &PositionSample| -> GuiaResult<Option<RawAddress>> {
            Ok(Some(if position.latitude() > -8.04 { olinda() } else { recife() }))
        },
    );

    let updates = tracker.updates();
    let accepted = Arc::new(Mutex::new(0));
    let counter = accepted.clone();
    updates.subscribe_function(move |_: &PositionUpdate| {
        *counter.lock().unwrap() += 1;
        Ok(())
    });

    let first = tracker.process(&RawPosition::new(-8.0631, -34.8711, 5.0, T0));
    let noise = tracker.process(&RawPosition::new(-8.0631, -34.8711, 150.0, T0 + 5_000));
    let moved = tracker.process(&RawPosition::new(-8.0146, -34.8457, 5.0, T0 + 10_000));

    assert_eq!(first.admission.classification, Classification::Updated);
    assert_eq!(noise.admission.classification, Classification::NotUpdated);
    assert_eq!(moved.admission.classification, Classification::Immediate);
    assert_eq!(moved.changes.len(), 3);
    assert_eq!(*accepted.lock().unwrap(), 2);
    assert_eq!(
        *municipalities.lock().unwrap(),
        vec![Some("Recife".to_string()), Some("Olinda".to_string())]
    );
}
