use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::fmt;

use reqwest::{Method, StatusCode};

/// Broad category of a failed call.
///
/// None of these are retried by the client; retry policy belongs to the caller.
#[non_exhaustive]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Kind {
    /// Network failure or a non-success HTTP status from the gateway.
    Transport,
    /// Malformed XML in either direction, or a body that is not UTF-8.
    Encoding,
    /// The digest carried by a response or notification does not match the
    /// one recomputed with the merchant's API key.
    SignatureMismatch,
    /// Invalid merchant configuration.
    Validation,
}

#[derive(Debug)]
pub struct Error {
    kind: Kind,
    backtrace: Backtrace,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl Error {
    pub fn with_source<S: StdError + Send + Sync + 'static>(kind: Kind, source: S) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
            backtrace: Backtrace::capture(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    #[must_use]
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    #[must_use]
    pub fn inner(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    #[must_use]
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        let e = self.source.as_deref()?;
        e.downcast_ref::<E>()
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Validation {
            reason: message.into(),
        }
        .into()
    }

    pub fn encoding<S: Into<String>>(message: S) -> Self {
        Encoding {
            reason: message.into(),
        }
        .into()
    }

    pub fn status<S: Into<String>>(
        status_code: StatusCode,
        method: Method,
        path: String,
        message: S,
    ) -> Self {
        Status {
            status_code,
            method,
            path,
            message: message.into(),
        }
        .into()
    }

    pub fn signature_mismatch<S: Into<String>>(message: &'static str, received: S) -> Self {
        SignatureMismatch {
            message,
            received: received.into(),
        }
        .into()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(src) => write!(f, "{:?}: {}", self.kind, src),
            None => write!(f, "{:?}", self.kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

/// Non-success HTTP status returned by the gateway.
#[non_exhaustive]
#[derive(Debug)]
pub struct Status {
    pub status_code: StatusCode,
    pub method: Method,
    pub path: String,
    pub message: String,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "error({}) making {} call to {} with {}",
            self.status_code, self.method, self.path, self.message
        )
    }
}

impl StdError for Status {}

/// Digest verification failure for one message shape.
///
/// Only the digest that arrived on the wire is kept; the recomputed one is
/// derived from the API key and stays out of error reports.
#[non_exhaustive]
#[derive(Debug)]
pub struct SignatureMismatch {
    pub message: &'static str,
    pub received: String,
}

impl fmt::Display for SignatureMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.received.is_empty() {
            write!(f, "{} carries no signature", self.message)
        } else {
            write!(
                f,
                "{} signature {} does not match the recomputed digest",
                self.message, self.received
            )
        }
    }
}

impl StdError for SignatureMismatch {}

#[non_exhaustive]
#[derive(Debug)]
pub struct Validation {
    pub reason: String,
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid: {}", self.reason)
    }
}

impl StdError for Validation {}

#[non_exhaustive]
#[derive(Debug)]
pub struct Encoding {
    pub reason: String,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed payload: {}", self.reason)
    }
}

impl StdError for Encoding {}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::with_source(Kind::Transport, e)
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::with_source(Kind::Validation, e)
    }
}

impl From<quick_xml::DeError> for Error {
    fn from(e: quick_xml::DeError) -> Self {
        Error::with_source(Kind::Encoding, e)
    }
}

impl From<quick_xml::Error> for Error {
    fn from(e: quick_xml::Error) -> Self {
        Error::with_source(Kind::Encoding, e)
    }
}

impl From<quick_xml::SeError> for Error {
    fn from(e: quick_xml::SeError) -> Self {
        Error::with_source(Kind::Encoding, e)
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(e: std::str::Utf8Error) -> Self {
        Error::with_source(Kind::Encoding, e)
    }
}

#[cfg(feature = "tracing")]
impl From<serde_path_to_error::Error<quick_xml::DeError>> for Error {
    fn from(e: serde_path_to_error::Error<quick_xml::DeError>) -> Self {
        Error::with_source(Kind::Encoding, e)
    }
}

impl From<Status> for Error {
    fn from(err: Status) -> Self {
        Error::with_source(Kind::Transport, err)
    }
}

impl From<SignatureMismatch> for Error {
    fn from(err: SignatureMismatch) -> Self {
        Error::with_source(Kind::SignatureMismatch, err)
    }
}

impl From<Validation> for Error {
    fn from(err: Validation) -> Self {
        Error::with_source(Kind::Validation, err)
    }
}

impl From<Encoding> for Error {
    fn from(err: Encoding) -> Self {
        Error::with_source(Kind::Encoding, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_is_distinct_from_encoding() {
        let err = Error::signature_mismatch("contract order response", "ABC");

        assert_eq!(err.kind(), Kind::SignatureMismatch);
        assert_ne!(err.kind(), Kind::Encoding);
        let inner = err
            .downcast_ref::<SignatureMismatch>()
            .expect("source should be a SignatureMismatch");
        assert_eq!(inner.received, "ABC");
        assert_eq!(
            err.to_string(),
            "SignatureMismatch: contract order response signature ABC does not match the recomputed digest"
        );
    }

    #[test]
    fn status_display_names_the_call() {
        let err = Error::status(
            StatusCode::BAD_GATEWAY,
            Method::POST,
            "/pay/pappayapply".to_owned(),
            "upstream down",
        );

        assert_eq!(err.kind(), Kind::Transport);
        assert_eq!(
            err.to_string(),
            "Transport: error(502 Bad Gateway) making POST call to /pay/pappayapply with upstream down"
        );
    }

    #[test]
    fn validation_has_reason() {
        let err = Error::validation("app_id must not be empty");

        assert_eq!(err.kind(), Kind::Validation);
        assert_eq!(err.to_string(), "Validation: invalid: app_id must not be empty");
        assert!(err.inner().is_some(), "validation errors carry a source");
    }
}
