use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

use crate::report::ParseError;
use crate::store::StoreError;

/// The provider request an error happened on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Token,
    Login,
    Report,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Token => f.write_str("session token"),
            Step::Login => f.write_str("login"),
            Step::Report => f.write_str("report"),
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Invalid user id: the provider issued no session token")]
    #[diagnostic(code(fjernvarme::invalid_user), help("check the value of FJERN_USERID"))]
    InvalidUser,

    #[error("Wrong password: the provider rejected the authorization id")]
    #[diagnostic(code(fjernvarme::invalid_password), help("check the value of FJERN_PW"))]
    InvalidPassword,

    #[error("Report request failed with status {0}")]
    #[diagnostic(code(fjernvarme::fetch))]
    Fetch(u16),

    #[error("The {step} request failed with status {status}")]
    #[diagnostic(code(fjernvarme::status))]
    Status { step: Step, status: u16 },

    #[error("Could not reach the provider during the {step} request")]
    #[diagnostic(code(fjernvarme::transport))]
    Transport {
        step: Step,
        #[source]
        source: Box<ureq::Transport>,
    },

    #[error("Unexpected {step} response body")]
    #[diagnostic(code(fjernvarme::decode))]
    Decode {
        step: Step,
        #[source]
        source: std::io::Error,
    },

    #[error("User id `{0}` cannot be sent to the provider")]
    #[diagnostic(
        code(fjernvarme::user_id),
        help("user ids may only hold ASCII letters, digits, `-` and `_`")
    )]
    UnsafeUserId(String),

    #[error("Missing environment variable {0}")]
    #[diagnostic(
        code(fjernvarme::config),
        help("export it, pass it as a flag, or use --load with a saved file")
    )]
    MissingEnv(&'static str),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error("Could not draw chart `{title}`: {message}")]
    #[diagnostic(code(fjernvarme::chart))]
    Chart { title: String, message: String },

    #[error(transparent)]
    #[diagnostic(code(fjernvarme::io))]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
