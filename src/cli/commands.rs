//! Implementação dos comandos CLI do Guia.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::address::{AddressCache, RawAddress};
use crate::cache::{CacheStats, ManualClock};
use crate::coordinator::{ChangeDetectionCoordinator, ChangeSubject};
use crate::observer::{ChangeMetrics, LoggingObserver, MetricsObserver};
use crate::position::{haversine_distance, Classification, PositionSample, RawPosition};
use crate::tracker::GeolocationTracker;
use crate::types::config::Config;
use crate::GuiaResult;

/// Initializes configuration in the specified directory.
pub async fn init(path: Option<PathBuf>) -> GuiaResult<()> {
    let target_dir = path.unwrap_or_else(|| PathBuf::from("."));

    // Create directory if it doesn't exist
    if !target_dir.exists() {
        tokio::fs::create_dir_all(&target_dir).await?;
        tracing::info!("Directory created: {}", target_dir.display());
    }

    let config_path = target_dir.join("guia.toml");

    if config_path.exists() {
        println!("Configuration already exists at: {}", config_path.display());
        return Ok(());
    }

    let config = Config::default_config();
    config.save(&config_path)?;

    println!("Guia initialized successfully!");
    println!("Configuration created at: {}", config_path.display());
    println!();
    println!("Next steps:");
    println!("  1. Adjust [position] and [cache] in guia.toml");
    println!("  2. Replay a recorded track: guia replay track.json");

    Ok(())
}

/// Ponto de um trajeto gravado.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackPoint {
    /// Posição bruta.
    pub position: RawPosition,

    /// Resposta do geocodificador para a posição, se houver.
    #[serde(default)]
    pub address: Option<RawAddress>,
}

/// Resumo de um replay.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplaySummary {
    pub samples: usize,
    pub accepted: usize,
    pub immediate: usize,
    pub rejected: usize,
    pub resolver_failures: usize,
    pub changes: ChangeMetrics,
    pub cache: CacheStats,
}

/// Reproduz um trajeto pelo pipeline completo.
///
/// O relógio do cache acompanha os timestamps das amostras, então a
/// expiração segue o tempo do trajeto e não o tempo de parede.
pub fn replay_track(points: &[TrackPoint], config: &Config) -> GuiaResult<ReplaySummary> {
    let clock = Arc::new(ManualClock::starting_now());
    let cache = Arc::new(AddressCache::with_clock(
        config.cache.max_size,
        config.cache.ttl(),
        clock.clone(),
    ));

    let subject = Arc::new(ChangeSubject::new());
    let metrics = Arc::new(MetricsObserver::new());
    subject.subscribe(Arc::new(LoggingObserver::new()));
    subject.subscribe(metrics.clone());

    let mut coordinator = ChangeDetectionCoordinator::new();
    coordinator.wire(cache.clone(), subject)?;

    // O resolvedor devolve o endereço gravado junto com a amostra atual
    let slot: Arc<Mutex<Option<RawAddress>>> = Arc::new(Mutex::new(None));
    let resolver_slot = slot.clone();
    let mut tracker = GeolocationTracker::new(
        config.position.clone(),
        cache.clone(),
        move |_: &PositionSample| -> GuiaResult<Option<RawAddress>> {
            Ok(resolver_slot
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .take())
        },
    );

    let mut summary = ReplaySummary::default();
    for point in points {
        if let Some(instant) = point.position.timestamp.and_then(DateTime::<Utc>::from_timestamp_millis) {
            clock.set(instant);
        }
        *slot.lock().unwrap_or_else(|e| e.into_inner()) = point.address.clone();

        let outcome = tracker.process(&point.position);
        summary.samples += 1;
        match outcome.admission.classification {
            Classification::NotUpdated => summary.rejected += 1,
            Classification::Immediate => {
                summary.accepted += 1;
                summary.immediate += 1;
            }
            Classification::Updated => summary.accepted += 1,
        }
        if outcome.resolver_error.is_some() {
            summary.resolver_failures += 1;
        }
    }

    coordinator.teardown();
    summary.changes = metrics.metrics();
    summary.cache = cache.stats();
    Ok(summary)
}

/// Lê um trajeto gravado em JSON.
pub async fn load_track(path: &Path) -> GuiaResult<Vec<TrackPoint>> {
    let content = tokio::fs::read_to_string(path).await?;
    let points: Vec<TrackPoint> = serde_json::from_str(&content)?;
    Ok(points)
}

/// Reproduz um trajeto gravado e imprime o resumo.
pub async fn replay(file: &Path, json: bool, config: &Config) -> GuiaResult<()> {
    let points = load_track(file).await?;
    tracing::debug!(points = points.len(), "Track loaded from {}", file.display());

    let summary = replay_track(&points, config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Replay: {}", file.display());
    println!(
        "  Samples: {} (accepted {}, immediate {}, rejected {})",
        summary.samples, summary.accepted, summary.immediate, summary.rejected
    );
    if summary.resolver_failures > 0 {
        println!("  Resolver failures: {}", summary.resolver_failures);
    }
    println!(
        "  Changes: logradouro {}, bairro {}, municipio {}",
        summary.changes.logradouro_changes,
        summary.changes.bairro_changes,
        summary.changes.municipio_changes
    );
    println!(
        "  Cache: {}/{} entries, hit rate {:.0}%, {} evicted, {} expired",
        summary.cache.size,
        summary.cache.capacity,
        summary.cache.hit_rate() * 100.0,
        summary.cache.evictions,
        summary.cache.expirations
    );

    Ok(())
}

/// Imprime a distância entre dois pontos.
pub fn distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) {
    let meters = haversine_distance(lat1, lon1, lat2, lon2);
    println!("{:.1} m", meters);
}

/// Mostra versão.
pub fn version() {
    println!("guia {}", env!("CARGO_PKG_VERSION"));
}
