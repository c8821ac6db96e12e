//! Login sequence.
//!
//! Every step consumes the state produced by the previous one and performs exactly one request.
//! A failing step aborts the whole sequence with `Error::LoginFailed`; nothing is retried and
//! no partial session escapes.

use super::response::get_login_info::GetLoginInfo;
use super::response::login::LoginResponse;
use super::transport::Transport;
use super::{action, endpoint, extract, AuraContext, Error, LoginStep};
use crate::model::{self, BearerToken, LoggedInApi, LoginInfo, SessionDescriptor};
use http::HeaderMap;
use reqwest::Url;

enum State {
    Bootstrap,
    CredentialSubmit {
        descriptor: SessionDescriptor,
    },
    RedirectFollow {
        descriptor: SessionDescriptor,
        redirect: Url,
    },
    TokenCapture {
        descriptor: SessionDescriptor,
    },
    AccountResolve {
        descriptor: SessionDescriptor,
        token: BearerToken,
    },
    Authenticated {
        descriptor: SessionDescriptor,
        token: BearerToken,
        login_info: LoginInfo,
    },
}

impl State {
    /// Step that runs when leaving this state.
    fn login_step(&self) -> LoginStep {
        match self {
            State::Bootstrap => LoginStep::Bootstrap,
            State::CredentialSubmit { .. } => LoginStep::CredentialSubmit,
            State::RedirectFollow { .. } => LoginStep::RedirectFollow,
            State::TokenCapture { .. } => LoginStep::TokenCapture,
            State::AccountResolve { .. } | State::Authenticated { .. } => {
                LoginStep::AccountResolve
            }
        }
    }
}

struct Login<'a> {
    api: &'a model::Api,
    transport: Transport,
}

impl<'a> Login<'a> {
    fn url(&self, endpoint: &endpoint::Endpoint) -> String {
        format!("{}{}", self.api.base_url, endpoint)
    }

    /// Resolve the redirect target of the login response, which may be relative to the portal.
    fn redirect_url(&self, url: &str) -> Result<Url, Error> {
        if url.trim().is_empty() {
            return Err(Error::Decode(
                "login event carries no redirect url".to_string(),
                url.to_string(),
            ));
        }
        Url::parse(&self.api.base_url)
            .and_then(|base| base.join(url))
            .map_err(|e| Error::Decode(format!("invalid redirect url: {}", e), url.to_string()))
    }

    async fn advance(&self, state: State) -> Result<State, Error> {
        match state {
            State::Bootstrap => {
                let response = self.transport.get(&self.url(endpoint::LOGIN_PAGE)).await?;
                let descriptor = extract::session_descriptor(&response.body)?;
                log::debug!("session descriptor captured (fwuid {})", descriptor.fwuid());
                Ok(State::CredentialSubmit { descriptor })
            }
            State::CredentialSubmit { descriptor } => {
                let login = action::login(&self.api.username, &self.api.password, endpoint::START_URL);
                let form = action::encode(endpoint::LOGIN_PAGE_URI, None, &descriptor, &[login])?;
                let response = self
                    .transport
                    .post(&self.url(endpoint::LOGIN_ACTION), &form, HeaderMap::new())
                    .await?;

                let login_response: LoginResponse = serde_json::from_str(&response.body)
                    .map_err(|e| Error::Decode(e.to_string(), response.body.clone()))?;
                let event = login_response.events.into_iter().next().ok_or_else(|| {
                    Error::Decode("invalid login response".to_string(), response.body.clone())
                })?;
                log::debug!("login event {}", event.descriptor);

                let redirect = self.redirect_url(&event.attributes.values.url)?;
                Ok(State::RedirectFollow {
                    descriptor,
                    redirect,
                })
            }
            State::RedirectFollow {
                descriptor,
                redirect,
            } => {
                /* Only the cookies set along the way matter */
                self.transport.get(redirect.as_str()).await?;
                Ok(State::TokenCapture { descriptor })
            }
            State::TokenCapture { descriptor } => {
                let response = self.transport.get(&self.url(endpoint::LANDING_PAGE)).await?;
                let token = extract::bearer_token(&response.body)?;
                Ok(State::AccountResolve { descriptor, token })
            }
            State::AccountResolve { descriptor, token } => {
                let context = AuraContext::new(&descriptor, &token)?;
                let value = super::post(
                    &self.transport,
                    &self.api.base_url,
                    &context,
                    action::get_login_info(),
                )
                .await?
                .into_return_value()?;
                let login_info = LoginInfo::from(super::from_return_value::<GetLoginInfo>(value)?);

                if login_info.account_id.as_str().is_empty() {
                    return Err(Error::Decode(
                        "login info carries no account id".to_string(),
                        login_info.user_id,
                    ));
                }

                Ok(State::Authenticated {
                    descriptor,
                    token,
                    login_info,
                })
            }
            authenticated @ State::Authenticated { .. } => Ok(authenticated),
        }
    }
}

/// Run the full login sequence against a fresh cookie store.
pub async fn login(api: &model::Api) -> Result<LoggedInApi, Error> {
    let transport =
        Transport::new(api.timeout).map_err(|e| Error::login_failed(LoginStep::Bootstrap, e))?;
    let machine = Login { api, transport };
    let mut state = State::Bootstrap;

    loop {
        state = match state {
            State::Authenticated {
                descriptor,
                token,
                login_info,
            } => {
                log::info!("Logged in as {} ({})", login_info.name, login_info.account_id.as_str());
                return Ok(LoggedInApi {
                    base_url: api.base_url.to_owned(),
                    transport: machine.transport,
                    descriptor,
                    token,
                    login_info,
                });
            }
            state => {
                let step = state.login_step();
                log::debug!("login step: {}", step);
                machine
                    .advance(state)
                    .await
                    .map_err(|e| Error::login_failed(step, e))?
            }
        };
    }
}
