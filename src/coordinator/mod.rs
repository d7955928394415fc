//! Coordenador de detecção de mudanças.
//!
//! Conecta os callbacks por campo do [`AddressCache`] a um
//! [`ObserverSubject`], transformando cada [`ChangeDetails`] num
//! [`AddressChangeEvent`] tipado.
//!
//! Estados: `Unwired → Wired` (em `wire`) `→ Unwired` (em `teardown`).
//! Chamar `wire` já conectado, ou sobre um cache que já tem callbacks de
//! campo, é erro: faça `teardown` antes.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::address::{AddressCache, AddressChangeEvent, AddressField, ChangeDetails, FieldChangeCallback};
use crate::observer::{panic_message, ObserverSubject};
use crate::{GuiaError, GuiaResult};

/// Subject dos eventos de mudança de endereço.
pub type ChangeSubject = ObserverSubject<AddressChangeEvent>;

enum WiringState {
    Unwired,
    Wired {
        cache: Arc<AddressCache>,
        callbacks: Vec<(AddressField, FieldChangeCallback)>,
    },
}

/// Liga a detecção de mudanças do cache aos observers.
pub struct ChangeDetectionCoordinator {
    state: WiringState,
}

impl ChangeDetectionCoordinator {
    /// Cria um coordenador desconectado.
    pub fn new() -> Self {
        Self {
            state: WiringState::Unwired,
        }
    }

    /// Registra os três callbacks de campo no cache.
    ///
    /// Retorna [`GuiaError::AlreadyWired`] se este coordenador já estiver
    /// conectado ou se o cache já tiver algum callback de campo (de outro
    /// coordenador, por exemplo); nesses casos nada é alterado.
    pub fn wire(&mut self, cache: Arc<AddressCache>, subject: Arc<ChangeSubject>) -> GuiaResult<()> {
        if self.is_wired() || AddressField::ALL.iter().any(|f| cache.has_field_change_callback(*f)) {
            return Err(GuiaError::AlreadyWired);
        }

        let mut registered: Vec<(AddressField, FieldChangeCallback)> = Vec::with_capacity(3);
        for field in AddressField::ALL {
            let subject = subject.clone();
            let callback: FieldChangeCallback =
                Arc::new(move |details: &ChangeDetails| forward(&subject, details));

            if !cache.try_set_field_change_callback(field, callback.clone()) {
                // Outro registro chegou entre a verificação e a inserção
                for (field, callback) in &registered {
                    cache.remove_field_change_callback_if(*field, callback);
                }
                return Err(GuiaError::AlreadyWired);
            }
            registered.push((field, callback));
        }

        tracing::debug!("Change detection coordinator wired");
        self.state = WiringState::Wired {
            cache,
            callbacks: registered,
        };
        Ok(())
    }

    /// Remove os callbacks registrados por este coordenador. Idempotente.
    ///
    /// Callbacks de campo que não foram instalados por ele ficam intactos.
    pub fn teardown(&mut self) {
        if let WiringState::Wired { cache, callbacks } =
            std::mem::replace(&mut self.state, WiringState::Unwired)
        {
            for (field, callback) in &callbacks {
                cache.remove_field_change_callback_if(*field, callback);
            }
            tracing::debug!("Change detection coordinator torn down");
        }
    }

    /// Verifica se está conectado.
    pub fn is_wired(&self) -> bool {
        matches!(self.state, WiringState::Wired { .. })
    }
}

impl Default for ChangeDetectionCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ChangeDetectionCoordinator {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Entrega um evento aos observers, isolando qualquer falha.
fn forward(subject: &ChangeSubject, details: &ChangeDetails) {
    let event = AddressChangeEvent::from_details(details);

    match panic::catch_unwind(AssertUnwindSafe(|| subject.notify_all(&event))) {
        Ok(report) => {
            tracing::debug!(
                change_type = %event.change_type,
                delivered = report.delivered,
                failed = report.failed,
                "Address change event dispatched"
            );
        }
        Err(payload) => {
            tracing::error!(
                change_type = %event.change_type,
                panic = %panic_message(payload.as_ref()),
                "Address change dispatch failed"
            );
        }
    }
}
