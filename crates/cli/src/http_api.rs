use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Response as HttpResponse, StatusCode},
    response::{IntoResponse, Response},
};
use context_gateway::{GatewayError, API_KEY_ENV};
use context_protocol::{serialize_json, ErrorEnvelope, ErrorKind};
use context_scanner::ScanError;
use context_session::SessionError;
use serde::Serialize;

pub(crate) const fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidRequest
        | ErrorKind::InvalidPath
        | ErrorKind::EmptyPrompt
        | ErrorKind::EmptySelection => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound | ErrorKind::UnknownSession => StatusCode::NOT_FOUND,
        ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
        ErrorKind::Busy => StatusCode::CONFLICT,
        ErrorKind::Decode => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::GatewayNotConfigured => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Remote | ErrorKind::MalformedResponse => StatusCode::BAD_GATEWAY,
        ErrorKind::FileRead | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn hint_for(kind: ErrorKind) -> Option<String> {
    let hint = match kind {
        ErrorKind::InvalidRequest => {
            "Verify the request body is valid JSON with the documented fields."
        }
        ErrorKind::InvalidPath => "Use a path relative to the served root, without '..'.",
        ErrorKind::GatewayNotConfigured => {
            return Some(format!("Set {API_KEY_ENV} and restart the server."))
        }
        ErrorKind::UnknownSession => "Create a new session with POST /api/sessions.",
        ErrorKind::Busy => "Wait for the running submission to finish.",
        _ => return None,
    };
    Some(hint.to_string())
}

/// A failed request: an HTTP status plus the [`ErrorEnvelope`] body.
#[derive(Debug)]
pub(crate) struct ApiError {
    status: StatusCode,
    envelope: ErrorEnvelope,
}

impl ApiError {
    pub(crate) fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let mut envelope = ErrorEnvelope::new(kind, message);
        envelope.hint = hint_for(kind);
        Self {
            status: status_for(kind),
            envelope,
        }
    }

    pub(crate) fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest, message)
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Listing failures are always a server-side error, whatever their kind.
    pub(crate) fn listing(err: ScanError) -> Self {
        let mut error = Self::new(err.kind(), format!("Failed to list files: {err}"));
        error.status = StatusCode::INTERNAL_SERVER_ERROR;
        error
    }

    pub(crate) fn read(err: ScanError) -> Self {
        Self::new(err.kind(), format!("Failed to read file: {err}"))
    }

    pub(crate) fn gateway(err: GatewayError) -> Self {
        let kind = err.kind();
        let mut error = Self::new(kind, err.to_string());
        if let GatewayError::Remote {
            status: Some(code), ..
        } = err
        {
            error.envelope.details = Some(serde_json::json!({ "upstream_status": code }));
        }
        error
    }

    pub(crate) fn kind(&self) -> ErrorKind {
        self.envelope.code
    }

    pub(crate) fn message(&self) -> &str {
        &self.envelope.error
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.envelope.code.as_str();
        if self.status.is_server_error() {
            log::error!("{} {code}: {}", self.status.as_u16(), self.envelope.error);
        } else {
            log::debug!("{} {code}: {}", self.status.as_u16(), self.envelope.error);
        }
        build_response(self.status, &self.envelope)
    }
}

pub(crate) fn build_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    let bytes = match serialize_json(body) {
        Ok(text) => text.into_bytes(),
        Err(err) => {
            log::error!("Failed to serialize response body: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    HttpResponse::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(bytes))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
