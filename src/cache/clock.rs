//! Fontes de tempo para o cache.
//!
//! O cache nunca lê o relógio do sistema diretamente: recebe um [`Clock`]
//! no construtor. Em produção usa-se [`SystemClock`]; em testes e no
//! replay de trajetos usa-se [`ManualClock`], avançado explicitamente.

use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Fonte de tempo injetável.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Instante atual.
    fn now(&self) -> DateTime<Utc>;
}

/// Relógio de parede (UTC).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Relógio controlado manualmente.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Cria um relógio parado no instante informado.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Cria um relógio parado no instante atual.
    pub fn starting_now() -> Self {
        Self::new(Utc::now())
    }

    /// Avança o relógio.
    pub fn advance(&self, by: Duration) {
        let Ok(delta) = chrono::Duration::from_std(by) else {
            return;
        };
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(next) = now.checked_add_signed(delta) {
            *now = next;
        }
    }

    /// Posiciona o relógio num instante absoluto.
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = instant;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Tempo decorrido entre dois instantes; intervalos negativos contam como zero.
pub(crate) fn elapsed_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> Duration {
    later
        .signed_duration_since(earlier)
        .to_std()
        .unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::starting_now();
        let start = clock.now();

        clock.advance(Duration::from_millis(150));

        assert_eq!(elapsed_between(start, clock.now()), Duration::from_millis(150));
    }

    #[test]
    fn test_manual_clock_set() {
        let clock = ManualClock::starting_now();
        let target = DateTime::<Utc>::from_timestamp_millis(1_700_000_000_000).unwrap();

        clock.set(target);

        assert_eq!(clock.now(), target);
    }

    #[test]
    fn test_elapsed_between_negative_is_zero() {
        let now = Utc::now();
        let earlier = now - chrono::Duration::seconds(5);

        assert_eq!(elapsed_between(now, earlier), Duration::ZERO);
    }
}
