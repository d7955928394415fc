//! Publish/subscribe genérico do Guia.
//!
//! Um [`ObserverSubject`] aceita dois tipos de inscritos:
//!
//! - observers com capacidade (`Observer::update`), notificados por `notify`
//! - funções simples, notificadas por `notify_function`
//!
//! A lista de inscrições é um snapshot imutável: `subscribe`/`unsubscribe`
//! publicam uma lista nova, então uma rodada de notificação em andamento não
//! é afetada por inscrições feitas de dentro de um handler.
//!
//! Cada chamada a um observer roda na sua própria fronteira de falha: um
//! `Err` ou um panic é registrado no log e a entrega continua para os demais.

mod builtin;

pub use builtin::{ChangeMetrics, LoggingObserver, MetricsObserver};

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, RwLock};

use uuid::Uuid;

use crate::GuiaResult;

// ═══════════════════════════════════════════════════════════════════════════
// Tipos de observer
// ═══════════════════════════════════════════════════════════════════════════

/// Observer com capacidade de receber eventos do tipo `E`.
pub trait Observer<E>: Send + Sync {
    /// Nome do observer (usado no log).
    fn name(&self) -> &str;

    /// Recebe um evento. O `subject` permite (des)inscrições reentrantes.
    fn update(&self, subject: &ObserverSubject<E>, event: &E) -> GuiaResult<()>;
}

/// Função observadora.
pub type ObserverFn<E> = dyn Fn(&E) -> GuiaResult<()> + Send + Sync;

/// Os dois tipos de inscrito, despachados explicitamente.
pub enum ObserverVariant<E> {
    /// Objeto que implementa [`Observer`].
    Capability(Arc<dyn Observer<E>>),

    /// Função simples.
    Callback(Arc<ObserverFn<E>>),
}

impl<E> ObserverVariant<E> {
    /// Nome usado no log.
    pub fn name(&self) -> &str {
        match self {
            ObserverVariant::Capability(observer) => observer.name(),
            ObserverVariant::Callback(_) => "function",
        }
    }

    fn is_capability(&self) -> bool {
        matches!(self, ObserverVariant::Capability(_))
    }
}

impl<E> Clone for ObserverVariant<E> {
    fn clone(&self) -> Self {
        match self {
            ObserverVariant::Capability(observer) => ObserverVariant::Capability(observer.clone()),
            ObserverVariant::Callback(callback) => ObserverVariant::Callback(callback.clone()),
        }
    }
}

/// Identificador de uma inscrição.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct Subscription<E> {
    id: SubscriptionId,
    observer: ObserverVariant<E>,
}

impl<E> Clone for Subscription<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            observer: self.observer.clone(),
        }
    }
}

/// Resultado de uma rodada de notificação.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifyReport {
    /// Observers que receberam o evento sem falhar.
    pub delivered: usize,

    /// Observers que retornaram erro ou entraram em panic.
    pub failed: usize,
}

impl NotifyReport {
    fn record(&mut self, ok: bool) {
        if ok {
            self.delivered += 1;
        } else {
            self.failed += 1;
        }
    }

    fn merge(self, other: NotifyReport) -> NotifyReport {
        NotifyReport {
            delivered: self.delivered + other.delivered,
            failed: self.failed + other.failed,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Subject
// ═══════════════════════════════════════════════════════════════════════════

/// Subject observável com lista de inscrições copy-on-write.
pub struct ObserverSubject<E> {
    subscriptions: RwLock<Arc<Vec<Subscription<E>>>>,
}

impl<E> ObserverSubject<E> {
    /// Cria um subject sem inscritos.
    pub fn new() -> Self {
        Self {
            subscriptions: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Inscreve um observer com capacidade.
    pub fn subscribe(&self, observer: Arc<dyn Observer<E>>) -> SubscriptionId {
        self.add(ObserverVariant::Capability(observer))
    }

    /// Remove um observer com capacidade. Retorna `false` se o id não existir.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.remove(id, true)
    }

    /// Inscreve uma função.
    pub fn subscribe_function<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&E) -> GuiaResult<()> + Send + Sync + 'static,
    {
        self.add(ObserverVariant::Callback(Arc::new(callback)))
    }

    /// Remove uma função. Retorna `false` se o id não existir.
    pub fn unsubscribe_function(&self, id: SubscriptionId) -> bool {
        self.remove(id, false)
    }

    /// Notifica os observers com capacidade.
    pub fn notify(&self, event: &E) -> NotifyReport {
        let snapshot = self.snapshot();
        let mut report = NotifyReport::default();

        for subscription in snapshot.iter() {
            if let ObserverVariant::Capability(observer) = &subscription.observer {
                let ok = deliver(subscription.id, observer.name(), || observer.update(self, event));
                report.record(ok);
            }
        }

        report
    }

    /// Notifica as funções inscritas.
    pub fn notify_function(&self, event: &E) -> NotifyReport {
        let snapshot = self.snapshot();
        let mut report = NotifyReport::default();

        for subscription in snapshot.iter() {
            if let ObserverVariant::Callback(callback) = &subscription.observer {
                let ok = deliver(subscription.id, "function", || callback(event));
                report.record(ok);
            }
        }

        report
    }

    /// Notifica os dois tipos de inscrito, observers primeiro.
    pub fn notify_all(&self, event: &E) -> NotifyReport {
        self.notify(event).merge(self.notify_function(event))
    }

    /// Número de observers com capacidade.
    pub fn observer_count(&self) -> usize {
        self.snapshot()
            .iter()
            .filter(|s| s.observer.is_capability())
            .count()
    }

    /// Número de funções inscritas.
    pub fn function_count(&self) -> usize {
        self.snapshot()
            .iter()
            .filter(|s| !s.observer.is_capability())
            .count()
    }

    /// Número total de inscrições.
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Verifica se não há inscritos.
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Remove todas as inscrições.
    pub fn clear(&self) {
        self.publish(Vec::new());
    }

    fn snapshot(&self) -> Arc<Vec<Subscription<E>>> {
        self.subscriptions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn publish(&self, next: Vec<Subscription<E>>) {
        *self.subscriptions.write().unwrap_or_else(|e| e.into_inner()) = Arc::new(next);
    }

    fn add(&self, observer: ObserverVariant<E>) -> SubscriptionId {
        let id = SubscriptionId::new();
        tracing::debug!(
            observer = observer.name(),
            subscription = %id,
            "Subscribing observer"
        );

        let mut guard = self.subscriptions.write().unwrap_or_else(|e| e.into_inner());
        let mut next: Vec<Subscription<E>> = guard.as_ref().clone();
        next.push(Subscription { id, observer });
        *guard = Arc::new(next);
        id
    }

    fn remove(&self, id: SubscriptionId, capability: bool) -> bool {
        let mut guard = self.subscriptions.write().unwrap_or_else(|e| e.into_inner());
        let position = guard
            .iter()
            .position(|s| s.id == id && s.observer.is_capability() == capability);

        match position {
            Some(index) => {
                let mut next: Vec<Subscription<E>> = guard.as_ref().clone();
                next.remove(index);
                *guard = Arc::new(next);
                tracing::debug!(subscription = %id, "Observer unsubscribed");
                true
            }
            None => false,
        }
    }
}

impl<E> Default for ObserverSubject<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for ObserverSubject<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverSubject")
            .field("subscriptions", &self.len())
            .finish()
    }
}

/// Executa uma entrega isolada, absorvendo erros e panics.
fn deliver<F>(id: SubscriptionId, name: &str, call: F) -> bool
where
    F: FnOnce() -> GuiaResult<()>,
{
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(())) => true,
        Ok(Err(err)) => {
            tracing::warn!(
                observer = name,
                subscription = %id,
                error = %err,
                "Observer failed; continuing notification"
            );
            false
        }
        Err(payload) => {
            tracing::error!(
                observer = name,
                subscription = %id,
                panic = %panic_message(payload.as_ref()),
                "Observer panicked; continuing notification"
            );
            false
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
