//! Tipos de erro do Guia.

use thiserror::Error;

/// Tipo de resultado padrão do Guia.
pub type GuiaResult<T> = Result<T, GuiaError>;

/// Erros possíveis no Guia.
#[derive(Error, Debug)]
pub enum GuiaError {
    #[error("Erro de configuração: {0}")]
    Config(String),

    #[error("Erro de IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("Erro ao parsear TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Erro ao serializar TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Erro de JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Posição inválida: {0}")]
    InvalidPosition(String),

    #[error("Coordenador já conectado; chame teardown() antes de wire()")]
    AlreadyWired,

    #[error("Observer '{0}' falhou: {1}")]
    ObserverFailed(String, String),

    #[error("Falha ao resolver endereço: {0}")]
    Resolver(String),

    #[error("{0}")]
    Other(String),
}

impl GuiaError {
    /// Cria um erro genérico.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }

    /// Cria um erro de configuração.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Cria um erro de posição inválida.
    pub fn invalid_position<S: Into<String>>(msg: S) -> Self {
        Self::InvalidPosition(msg.into())
    }

    /// Cria um erro de observer.
    pub fn observer<N: Into<String>, S: Into<String>>(name: N, msg: S) -> Self {
        Self::ObserverFailed(name.into(), msg.into())
    }
}
