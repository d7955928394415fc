//! Cache de endereços com detecção de mudanças.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::change::ChangeDetails;
use super::extractor::{AddressExtractor, NominatimExtractor};
use super::raw::RawAddress;
use super::snapshot::{AddressField, AddressSnapshot};
use crate::cache::{BoundedCache, CacheStats, Clock, SystemClock};
use crate::observer::panic_message;
use crate::types::config::CacheConfig;

/// Callback de mudança de um campo.
pub type FieldChangeCallback = Arc<dyn Fn(&ChangeDetails) + Send + Sync>;

struct ChangeState {
    current: Option<AddressSnapshot>,
    previous: Option<AddressSnapshot>,
    last_notified: HashMap<AddressField, (Option<String>, Option<String>)>,
}

impl ChangeState {
    fn new() -> Self {
        Self {
            current: None,
            previous: None,
            last_notified: HashMap::new(),
        }
    }

    /// Compara `snapshot` com o último endereço resolvido e avança o estado.
    ///
    /// Retorna as mudanças cuja assinatura difere da última notificada.
    fn advance(&mut self, snapshot: &AddressSnapshot, now: DateTime<Utc>) -> Vec<ChangeDetails> {
        let mut pending = Vec::new();

        for field in AddressField::ALL {
            let details = ChangeDetails::compare(field, self.current.as_ref(), snapshot, now);
            if !details.has_changed {
                continue;
            }

            let transition = details.transition();
            if self.last_notified.get(&field) == Some(&transition) {
                tracing::debug!(
                    field = %field,
                    signature = %details.signature(),
                    "Suppressing repeated address transition"
                );
                continue;
            }

            self.last_notified.insert(field, transition);
            pending.push(details);
        }

        self.previous = self.current.replace(snapshot.clone());
        pending
    }
}

struct Inner {
    entries: BoundedCache<String, AddressSnapshot>,
    changes: ChangeState,
}

/// Cache de endereços padronizados.
///
/// Mantém os endereços resolvidos num [`BoundedCache`] indexado pela chave
/// derivada do registro bruto, rastreia o endereço atual e o anterior e
/// dispara um callback por campo quando logradouro, bairro ou município muda.
///
/// Os callbacks são chamados depois que o estado interno é liberado, cada um
/// isolado: um panic num callback é registrado e não afeta os demais.
pub struct AddressCache {
    inner: Mutex<Inner>,
    callbacks: RwLock<HashMap<AddressField, FieldChangeCallback>>,
    extractor: Box<dyn AddressExtractor>,
    clock: Arc<dyn Clock>,
}

impl AddressCache {
    /// Cria um cache com o relógio do sistema e o extrator Nominatim.
    pub fn new(max_size: usize, expiration: Duration) -> Self {
        Self::with_clock(max_size, expiration, Arc::new(SystemClock))
    }

    /// Cria um cache a partir da configuração.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_size, config.ttl())
    }

    /// Cria um cache com um relógio injetado.
    pub fn with_clock(max_size: usize, expiration: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: BoundedCache::with_clock(max_size, expiration, clock.clone()),
                changes: ChangeState::new(),
            }),
            callbacks: RwLock::new(HashMap::new()),
            extractor: Box::new(NominatimExtractor),
            clock,
        }
    }

    /// Substitui o extrator de endereços.
    pub fn with_extractor(mut self, extractor: impl AddressExtractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    /// Gera a chave de cache de um registro bruto.
    ///
    /// Formato: `logradouro|número|bairro|município|cep|país`, normalizados;
    /// `|` e `\` dentro dos valores são escapados com `\`.
    /// Retorna `None` sem objeto de endereço ou sem nenhum campo de identidade.
    pub fn cache_key(raw: &RawAddress) -> Option<String> {
        let fields = raw.address.as_ref()?;
        let parts = [
            fields.street_name(),
            fields.house_number.as_deref(),
            fields.neighborhood_name(),
            fields.municipality_name(),
            fields.postcode.as_deref(),
            fields.country_code.as_deref(),
        ]
        .map(|part| part.map(normalize).unwrap_or_default());

        if parts.iter().all(String::is_empty) {
            return None;
        }
        Some(parts.join("|"))
    }

    /// Resolve um registro bruto em endereço padronizado.
    ///
    /// Usa o cache quando possível, atualiza o endereço atual/anterior e
    /// dispara os callbacks dos campos que mudaram.
    pub fn resolve(&self, raw: &RawAddress) -> AddressSnapshot {
        self.resolve_with_changes(raw).0
    }

    /// Igual a [`resolve`](Self::resolve), retornando também as mudanças notificadas.
    pub fn resolve_with_changes(&self, raw: &RawAddress) -> (AddressSnapshot, Vec<ChangeDetails>) {
        let now = self.clock.now();
        let key = Self::cache_key(raw);

        // O extrator roda fora do lock: pode consultar o próprio cache
        let cached = key
            .as_deref()
            .and_then(|key| self.lock().entries.get(key).cloned());

        let snapshot = match (&key, cached) {
            (Some(key), Some(hit)) => {
                tracing::debug!(key = %key, "Address cache hit");
                hit
            }
            (Some(key), None) => {
                let extracted = self.extractor.extract(raw);
                tracing::debug!(key = %key, "Address cache miss; stored");
                self.lock().entries.set(key.clone(), extracted.clone());
                extracted
            }
            (None, _) => {
                tracing::debug!("Address has no identity; resolving without cache");
                self.extractor.extract(raw)
            }
        };

        let pending = self.lock().changes.advance(&snapshot, now);

        for details in &pending {
            self.dispatch(details);
        }

        (snapshot, pending)
    }

    /// Registra (ou remove, com `None`) o callback de mudança de um campo.
    pub fn set_field_change_callback(&self, field: AddressField, callback: Option<FieldChangeCallback>) {
        let mut callbacks = self.callbacks.write().unwrap_or_else(|e| e.into_inner());
        match callback {
            Some(callback) => {
                tracing::debug!(field = %field, "Field change callback registered");
                callbacks.insert(field, callback);
            }
            None => {
                if callbacks.remove(&field).is_some() {
                    tracing::debug!(field = %field, "Field change callback removed");
                }
            }
        }
    }

    /// Registra o callback somente se o campo ainda não tiver um.
    ///
    /// Retorna `false`, sem alterar nada, quando o campo já está ocupado.
    pub fn try_set_field_change_callback(&self, field: AddressField, callback: FieldChangeCallback) -> bool {
        let mut callbacks = self.callbacks.write().unwrap_or_else(|e| e.into_inner());
        if callbacks.contains_key(&field) {
            return false;
        }
        tracing::debug!(field = %field, "Field change callback registered");
        callbacks.insert(field, callback);
        true
    }

    /// Remove o callback do campo somente se for exatamente `callback`.
    pub fn remove_field_change_callback_if(&self, field: AddressField, callback: &FieldChangeCallback) -> bool {
        let mut callbacks = self.callbacks.write().unwrap_or_else(|e| e.into_inner());
        let matches = callbacks
            .get(&field)
            .is_some_and(|registered| same_callback(registered, callback));
        if matches {
            callbacks.remove(&field);
            tracing::debug!(field = %field, "Field change callback removed");
        }
        matches
    }

    /// Verifica se há callback registrado para o campo.
    pub fn has_field_change_callback(&self, field: AddressField) -> bool {
        self.callbacks
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&field)
    }

    /// Último endereço resolvido.
    pub fn current_address(&self) -> Option<AddressSnapshot> {
        self.lock().changes.current.clone()
    }

    /// Endereço resolvido antes do atual.
    pub fn previous_address(&self) -> Option<AddressSnapshot> {
        self.lock().changes.previous.clone()
    }

    /// Verifica se a chave está no cache (sem checar expiração).
    pub fn contains_key(&self, key: &str) -> bool {
        self.lock().entries.has(key)
    }

    /// Remove entradas expiradas.
    pub fn clean_expired(&self) -> usize {
        self.lock().entries.clean_expired()
    }

    /// Limpa o cache e o estado de detecção de mudanças.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.changes = ChangeState::new();
    }

    /// Número de endereços em cache.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Verifica se o cache está vazio.
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Estatísticas do cache.
    pub fn stats(&self) -> CacheStats {
        self.lock().entries.stats()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn dispatch(&self, details: &ChangeDetails) {
        tracing::info!(
            field = %details.field,
            previous = details.previous_value().unwrap_or("-"),
            current = details.current_value().unwrap_or("-"),
            "Address field changed"
        );

        let callback = self
            .callbacks
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&details.field)
            .cloned();

        let Some(callback) = callback else {
            return;
        };

        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback(details))) {
            tracing::error!(
                field = %details.field,
                panic = %panic_message(payload.as_ref()),
                "Field change callback panicked"
            );
        }
    }
}

impl std::fmt::Debug for AddressCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressCache")
            .field("entries", &self.len())
            .finish()
    }
}

fn same_callback(a: &FieldChangeCallback, b: &FieldChangeCallback) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

/// Normaliza um campo de identidade: espaços colapsados, minúsculas,
/// separador escapado.
fn normalize(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('|', "\\|")
}
