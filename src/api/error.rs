use rocket::http::{ContentType, RawStr, Status};
use rocket::request::Request;
use rocket::response::{self, Responder, Response};
use std::fmt;
use std::io::Cursor;

/// Ordered steps of the login sequence, used to report where a login failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStep {
    Bootstrap,
    CredentialSubmit,
    RedirectFollow,
    TokenCapture,
    AccountResolve,
}

impl fmt::Display for LoginStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoginStep::Bootstrap => "bootstrap",
            LoginStep::CredentialSubmit => "credential submit",
            LoginStep::RedirectFollow => "redirect follow",
            LoginStep::TokenCapture => "token capture",
            LoginStep::AccountResolve => "account resolve",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Network failure or timeout; the request may be retried.
    #[error("transport error: {0}")]
    Transport(String),
    /// Expected marker absent from a served page.
    #[error("extraction error: {0}")]
    Extraction(String),
    /// The login sequence was aborted; the whole session must be rebuilt.
    #[error("login failed at {step}: {source}")]
    LoginFailed { step: LoginStep, source: Box<Error> },
    /// An authenticated call was rejected; log in again.
    #[error("session expired: {0}")]
    SessionExpired(String),
    /// The portal flagged a problem with this one call.
    #[error("remote warning: {0}")]
    RemoteWarning(String),
    /// Response did not have the expected shape. Holds the reason and the offending body.
    #[error("invalid response: {0}")]
    Decode(String, String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub(crate) fn login_failed(step: LoginStep, source: Error) -> Self {
        Error::LoginFailed {
            step,
            source: Box::new(source),
        }
    }

    /// Whether repeating the same call could succeed without intervention.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(_) => true,
            Error::LoginFailed { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}

fn html_response(status: Status, title: &str, detail: String) -> response::Result<'static> {
    let error = format!(
        "<html><body><h3>{}</h3>Downstream portal: <code>{}</code></body></html>",
        title,
        RawStr::new(&detail).html_escape()
    );
    Response::build()
        .status(status)
        .sized_body(error.len(), Cursor::new(error))
        .header(ContentType::new("text", "html"))
        .ok()
}

impl<'r> Responder<'r, 'static> for Error {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        match self {
            Error::LoginFailed { .. } => {
                html_response(Status::Forbidden, "403 Forbidden", self.to_string())
            }
            Error::SessionExpired(_) => {
                html_response(Status::Unauthorized, "401 Unauthorized", self.to_string())
            }
            Error::Transport(_) => {
                html_response(Status::GatewayTimeout, "504 Gateway Timeout", self.to_string())
            }
            _ => html_response(
                Status::InternalServerError,
                "Unknown exception",
                format!("{:?}", self),
            ),
        }
    }
}
