//! Cache genérico limitado por tamanho (LRU) e por tempo (TTL).
//!
//! Este módulo implementa o armazenamento chave/valor usado pelo cache de
//! endereços. Capacidade e expiração são aplicadas juntas: um cache pode
//! estar cheio de entradas válidas (dispara remoção LRU) ou conter entradas
//! velhas que só são removidas no acesso ou via `clean_expired`.

mod bounded;
mod clock;

pub use bounded::{BoundedCache, CacheEntry, CacheStats, DEFAULT_EXPIRATION, DEFAULT_MAX_SIZE};
pub use clock::{Clock, ManualClock, SystemClock};
pub(crate) use clock::elapsed_between;
