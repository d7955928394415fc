//! Cache LRU com expiração por tempo.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use lru::LruCache;
use serde::Serialize;

use super::clock::{elapsed_between, Clock, SystemClock};

/// Capacidade usada quando o chamador informa zero.
pub const DEFAULT_MAX_SIZE: usize = 50;

/// Tempo de vida padrão das entradas (5 minutos).
pub const DEFAULT_EXPIRATION: Duration = Duration::from_secs(300);

/// Entrada armazenada no cache.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// Valor armazenado.
    pub value: V,

    /// Momento da inserção.
    pub created_at: DateTime<Utc>,

    /// Último acesso via `get`.
    pub last_accessed_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    /// Cria uma entrada nova.
    pub fn new(value: V, now: DateTime<Utc>) -> Self {
        Self {
            value,
            created_at: now,
            last_accessed_at: now,
        }
    }

    /// Verifica se a entrada expirou.
    pub fn is_expired(&self, now: DateTime<Utc>, expiration: Duration) -> bool {
        elapsed_between(self.created_at, now) > expiration
    }
}

/// Estatísticas do cache.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Número atual de entradas.
    pub size: usize,

    /// Capacidade máxima.
    pub capacity: usize,

    /// Número de acertos (cache hits).
    pub hits: u64,

    /// Número de erros (cache misses), incluindo entradas expiradas.
    pub misses: u64,

    /// Entradas removidas por falta de espaço.
    pub evictions: u64,

    /// Entradas removidas por expiração.
    pub expirations: u64,
}

impl CacheStats {
    /// Calcula a taxa de acerto.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Cache chave/valor limitado em tamanho e em tempo.
///
/// - Capacidade: ao inserir uma chave nova com o cache cheio, a entrada
///   menos recentemente acessada é removida *antes* da inserção.
/// - Tempo: entradas com mais de `expiration` desde a criação são removidas
///   preguiçosamente no `get` ou em lote por [`clean_expired`](Self::clean_expired).
pub struct BoundedCache<K, V> {
    entries: LruCache<K, CacheEntry<V>>,
    expiration: Duration,
    clock: Arc<dyn Clock>,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
}

impl<K: Hash + Eq + Clone, V> BoundedCache<K, V> {
    /// Cria um novo cache usando o relógio do sistema.
    ///
    /// # Argumentos
    /// - `max_size`: Número máximo de entradas (zero usa [`DEFAULT_MAX_SIZE`])
    /// - `expiration`: Tempo de vida das entradas
    pub fn new(max_size: usize, expiration: Duration) -> Self {
        Self::with_clock(max_size, expiration, Arc::new(SystemClock))
    }

    /// Cria um novo cache com um relógio injetado.
    pub fn with_clock(max_size: usize, expiration: Duration, clock: Arc<dyn Clock>) -> Self {
        let cap = NonZeroUsize::new(max_size)
            .or(NonZeroUsize::new(DEFAULT_MAX_SIZE))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(cap),
            expiration,
            clock,
            hits: 0,
            misses: 0,
            evictions: 0,
            expirations: 0,
        }
    }

    /// Cria um cache com configuração padrão.
    pub fn default_config() -> Self {
        Self::new(DEFAULT_MAX_SIZE, DEFAULT_EXPIRATION)
    }

    /// Busca no cache.
    ///
    /// Retorna `None` se não encontrado ou se expirado; entradas expiradas
    /// são removidas nesta leitura.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.clock.now();
        let is_expired = self
            .entries
            .peek(key)
            .map(|entry| entry.is_expired(now, self.expiration));

        match is_expired {
            Some(true) => {
                self.entries.pop(key);
                self.expirations += 1;
                self.misses += 1;
                tracing::trace!(size = self.entries.len(), "Cache entry expired on read");
                None
            }
            Some(false) => {
                self.hits += 1;
                self.entries.get_mut(key).map(|entry| {
                    entry.last_accessed_at = now;
                    &entry.value
                })
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Insere no cache, removendo a entrada LRU se estiver cheio.
    pub fn set(&mut self, key: K, value: V) {
        let now = self.clock.now();

        if !self.entries.contains(&key) && self.entries.len() >= self.capacity() {
            if self.entries.pop_lru().is_some() {
                self.evictions += 1;
                tracing::debug!(
                    capacity = self.capacity(),
                    evictions = self.evictions,
                    "Evicted least recently used cache entry"
                );
            }
        }

        self.entries.put(key, CacheEntry::new(value, now));
    }

    /// Verifica se a chave existe, sem checar expiração nem alterar a ordem LRU.
    pub fn has<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains(key)
    }

    /// Remove uma entrada específica.
    pub fn delete<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.pop(key).is_some()
    }

    /// Limpa todo o cache.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Remove entradas expiradas e retorna quantas foram removidas.
    pub fn clean_expired(&mut self) -> usize {
        let now = self.clock.now();

        // Coleta chaves expiradas
        let expired_keys: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now, self.expiration))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.entries.pop(key);
        }

        let removed = expired_keys.len();
        self.expirations += removed as u64;
        if removed > 0 {
            tracing::debug!(removed, remaining = self.entries.len(), "Expired cache entries removed");
        }
        removed
    }

    /// Número atual de entradas (inclui expiradas ainda não removidas).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Verifica se o cache está vazio.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Capacidade máxima.
    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// Tempo de vida das entradas.
    pub fn expiration(&self) -> Duration {
        self.expiration
    }

    /// Retorna a entrada sem alterar a ordem LRU nem checar expiração.
    pub fn entry<Q>(&self, key: &Q) -> Option<&CacheEntry<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.peek(key)
    }

    /// Chaves da mais recente para a menos recentemente usada.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(key, _)| key)
    }

    /// Retorna estatísticas do cache.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.len(),
            capacity: self.capacity(),
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            expirations: self.expirations,
        }
    }
}

impl<K: Hash + Eq, V> fmt::Debug for BoundedCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedCache")
            .field("len", &self.entries.len())
            .field("capacity", &self.entries.cap())
            .field("expiration", &self.expiration)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;

    fn create_test_cache(max_size: usize, expiration: Duration) -> (BoundedCache<String, u32>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        let cache = BoundedCache::with_clock(max_size, expiration, clock.clone());
        (cache, clock)
    }

    #[test]
    fn test_cache_hit() {
        let (mut cache, _) = create_test_cache(10, Duration::from_secs(60));

        cache.set("k".to_string(), 7);

        assert_eq!(cache.get("k"), Some(&7));
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn test_cache_miss() {
        let (mut cache, _) = create_test_cache(10, Duration::from_secs(60));

        assert!(cache.get("nonexistent").is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_lru_eviction_order() {
        let (mut cache, _) = create_test_cache(3, Duration::from_secs(60));

        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        cache.set("c".to_string(), 3);
        cache.set("d".to_string(), 4); // Deve evictar a

        assert!(!cache.has("a"));
        assert_eq!(cache.len(), 3);

        // Acessar b o torna o mais recente; c passa a ser o LRU
        assert_eq!(cache.get("b"), Some(&2));
        cache.set("e".to_string(), 5);

        assert!(!cache.has("c"));
        assert!(cache.has("b"));
        assert!(cache.has("d"));
        assert!(cache.has("e"));
        assert_eq!(cache.stats().evictions, 2);
    }

    #[test]
    fn test_reset_existing_key_does_not_evict() {
        let (mut cache, _) = create_test_cache(2, Duration::from_secs(60));

        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        cache.set("a".to_string(), 10);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), Some(&10));
        assert_eq!(cache.get("b"), Some(&2));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_size_never_exceeds_capacity() {
        let (mut cache, _) = create_test_cache(4, Duration::from_secs(60));

        for i in 0..20u32 {
            cache.set(format!("key{}", i), i);
            assert!(cache.len() <= 4);
        }
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn test_expiration_on_get() {
        let (mut cache, clock) = create_test_cache(10, Duration::from_millis(100));

        cache.set("k".to_string(), 1);
        clock.advance(Duration::from_millis(150));

        assert!(cache.get("k").is_none());
        // Já removida pelo get anterior
        assert_eq!(cache.clean_expired(), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_not_expired_at_exact_boundary() {
        let (mut cache, clock) = create_test_cache(10, Duration::from_millis(100));

        cache.set("k".to_string(), 1);
        clock.advance(Duration::from_millis(100));

        assert_eq!(cache.get("k"), Some(&1));
    }

    #[test]
    fn test_get_updates_last_accessed() {
        let (mut cache, clock) = create_test_cache(10, Duration::from_secs(60));

        cache.set("k".to_string(), 1);
        clock.advance(Duration::from_secs(5));
        cache.get("k");

        let entry = cache.entry("k").unwrap();
        assert!(entry.last_accessed_at > entry.created_at);
    }

    #[test]
    fn test_has_ignores_expiration_and_order() {
        let (mut cache, clock) = create_test_cache(2, Duration::from_millis(100));

        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        clock.advance(Duration::from_millis(150));

        // has não remove nem promove
        assert!(cache.has("a"));
        assert_eq!(cache.len(), 2);

        cache.set("c".to_string(), 3);
        assert!(!cache.has("a"));
    }

    #[test]
    fn test_clean_expired_counts() {
        let (mut cache, clock) = create_test_cache(10, Duration::from_millis(100));

        cache.set("old1".to_string(), 1);
        cache.set("old2".to_string(), 2);
        clock.advance(Duration::from_millis(80));
        cache.set("fresh".to_string(), 3);
        clock.advance(Duration::from_millis(50));

        assert_eq!(cache.clean_expired(), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.has("fresh"));
        assert_eq!(cache.stats().expirations, 2);
    }

    #[test]
    fn test_delete_and_clear() {
        let (mut cache, _) = create_test_cache(10, Duration::from_secs(60));

        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);

        assert!(cache.delete("a"));
        assert!(!cache.delete("a"));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_capacity_falls_back_to_default() {
        let cache: BoundedCache<String, u32> = BoundedCache::new(0, DEFAULT_EXPIRATION);
        assert_eq!(cache.capacity(), DEFAULT_MAX_SIZE);
    }

    #[test]
    fn test_keys_most_recent_first() {
        let (mut cache, _) = create_test_cache(3, Duration::from_secs(60));

        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        cache.get("a");

        let keys: Vec<&String> = cache.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_debug_shows_size() {
        let (mut cache, _) = create_test_cache(3, Duration::from_secs(60));
        cache.set("a".to_string(), 1);

        let debug = format!("{:?}", cache);

        assert!(debug.contains("BoundedCache"));
        assert!(debug.contains("len: 1"));
    }

    #[test]
    fn test_stats_hit_rate() {
        let (mut cache, _) = create_test_cache(10, Duration::from_secs(60));

        cache.set("key1".to_string(), 1);
        cache.get("key1"); // Hit
        cache.get("key2"); // Miss
        cache.get("key1"); // Hit

        let stats = cache.stats();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.capacity, 10);
        assert!((stats.hit_rate() - 0.666).abs() < 0.01);
    }
}
