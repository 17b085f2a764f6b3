use thiserror::Error;

#[derive(Debug, Error)]
/// Ошибки клиентской библиотеки `echo-client`.
pub enum EchoClientError {
    /// Ошибка HTTP-транспорта (`reqwest`).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Не удалось определить, от чьего имени выполняется действие.
    #[error("no session: log in or set a username first")]
    MissingActor,

    /// Сервер не принял учётные данные или токен.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Действие запрещено (бан, чужой пост, нет прав администратора).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Запрошенный ресурс не найден.
    #[error("not found: {0}")]
    NotFound(String),

    /// Некорректный запрос или ошибка валидации.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Прочие ответы сервера с кодом ошибки.
    #[error("server error {status}: {message}")]
    Server {
        /// HTTP-статус ответа.
        status: u16,
        /// Сообщение из тела ответа.
        message: String,
    },
}

/// Результат операций `echo-client`.
pub type EchoClientResult<T> = Result<T, EchoClientError>;

impl EchoClientError {
    pub(crate) fn from_http_status(status: reqwest::StatusCode, message: Option<String>) -> Self {
        let message = message.unwrap_or_else(|| format!("http status {status}"));
        match status {
            reqwest::StatusCode::BAD_REQUEST => Self::InvalidRequest(message),
            reqwest::StatusCode::UNAUTHORIZED => Self::Unauthorized(message),
            reqwest::StatusCode::FORBIDDEN => Self::Forbidden(message),
            reqwest::StatusCode::NOT_FOUND => Self::NotFound(message),
            _ => Self::Server {
                status: status.as_u16(),
                message,
            },
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::from_http_status(status, None);
        }
        Self::Http(err)
    }
}
