use std::{io::Read, time::Duration};

use serde::Deserialize;
use serde_json::Value;

use crate::{
    auth::{AuthorizationId, Credentials},
    error::{Error, Result, Step},
};

pub const DEFAULT_BASE_URL: &str = "https://api2.dff-edb.dk/lystrup";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// URLs of the three provider calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Prefix of the token request, the user id is appended.
    pub token: String,
    /// Prefix of the login request, the user id is appended.
    pub login: String,
    pub data: String,
}

impl Endpoints {
    /// Endpoints of a provider installation rooted at `base`.
    pub fn under(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            token: format!("{base}/system/getsecuritytoken/project/app/consumer/"),
            login: format!("{base}/system/login/project/app/consumer/"),
            data: format!("{base}/api/getaflaestilregneark"),
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::under(DEFAULT_BASE_URL)
    }
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub credentials: Credentials,
    pub endpoints: Endpoints,
    /// Applied to every request.
    pub timeout: Duration,
}

impl ProviderConfig {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            endpoints: Endpoints::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(rename = "Token", default)]
    token: Option<String>,
}

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(rename = "Result", default)]
    result: Value,
}

/// Blocking client for the provider's consumer API.
pub struct Provider {
    agent: ureq::Agent,
    config: ProviderConfig,
}

impl Provider {
    pub fn new(config: ProviderConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Self { agent, config }
    }

    fn user_id(&self) -> &str {
        self.config.credentials.user_id()
    }

    /// The user id as a URL path segment. Only ASCII letters, digits, `-` and
    /// `_` are let through unescaped, anything else is refused.
    fn path_user_id(&self) -> Result<&str> {
        let user_id = self.user_id();
        if !user_id.is_empty()
            && user_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            Ok(user_id)
        } else {
            Err(Error::UnsafeUserId(user_id.to_string()))
        }
    }

    /// Runs the token and login handshake.
    pub fn obtain_authorization(&self) -> Result<AuthorizationId> {
        let token = self.session_token()?;
        let id = AuthorizationId::derive(self.config.credentials.password(), &token);
        self.login(&id)?;
        tracing::info!("authorized");
        Ok(id)
    }

    /// Downloads the raw report for an authorized session.
    pub fn fetch_report(&self, id: &AuthorizationId) -> Result<String> {
        let request = self
            .agent
            .get(&self.config.endpoints.data)
            .query("id", id.as_str())
            .query("unr", self.user_id());
        let response = self.call(Step::Report, request)?;
        let raw = decode_body(response)?;
        tracing::info!(bytes = raw.len(), "raw report obtained");
        Ok(raw)
    }

    /// Authorizes and downloads the raw report.
    pub fn retrieve(&self) -> Result<String> {
        let id = self.obtain_authorization()?;
        self.fetch_report(&id)
    }

    fn session_token(&self) -> Result<String> {
        let url = format!("{}{}", self.config.endpoints.token, self.path_user_id()?);
        let response: TokenResponse = self.call_json(Step::Token, &url)?;
        match response.token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(Error::InvalidUser),
        }
    }

    fn login(&self, id: &AuthorizationId) -> Result<()> {
        let url = format!(
            "{}{}/installation/1/id/{}",
            self.config.endpoints.login,
            self.path_user_id()?,
            id
        );
        let response: LoginResponse = self.call_json(Step::Login, &url)?;
        if is_truthy(&response.result) {
            Ok(())
        } else {
            Err(Error::InvalidPassword)
        }
    }

    fn call_json<T: serde::de::DeserializeOwned>(&self, step: Step, url: &str) -> Result<T> {
        let response = self.call(step, self.agent.get(url))?;
        response
            .into_json()
            .map_err(|source| Error::Decode { step, source })
    }

    /// Sends `request`, anything but a 200 is an error.
    fn call(&self, step: Step, request: ureq::Request) -> Result<ureq::Response> {
        tracing::debug!(%step, url = request.url(), "sending request");
        let status = match request.call() {
            Ok(response) if response.status() == 200 => return Ok(response),
            Ok(response) => response.status(),
            Err(ureq::Error::Status(status, _)) => status,
            Err(ureq::Error::Transport(source)) => {
                return Err(Error::Transport {
                    step,
                    source: Box::new(source),
                })
            }
        };
        match step {
            Step::Report => Err(Error::Fetch(status)),
            step => Err(Error::Status { step, status }),
        }
    }
}

/// Reads the whole body and decodes it with the charset of its Content-Type,
/// UTF-8 when none is declared or the label is unknown.
fn decode_body(response: ureq::Response) -> Result<String> {
    let encoding = encoding_rs::Encoding::for_label(response.charset().as_bytes())
        .unwrap_or(encoding_rs::UTF_8);

    let mut bytes = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut bytes)
        .map_err(|source| Error::Decode {
            step: Step::Report,
            source,
        })?;

    let (text, used, malformed) = encoding.decode(&bytes);
    if malformed {
        tracing::warn!(encoding = used.name(), "report holds malformed characters");
    }
    Ok(text.into_owned())
}

/// Truthiness of a JSON value, as loosely typed clients see it.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
