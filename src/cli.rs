use std::{path::PathBuf, time::Duration};

use clap::Parser;

use crate::{
    auth::Credentials,
    error::{Error, Result},
    provider::{Endpoints, ProviderConfig, DEFAULT_BASE_URL},
    reading::SETTLEMENT_MARKER,
    select::HoursBand,
};

pub const USER_ID_ENV: &str = "FJERN_USERID";
pub const PASSWORD_ENV: &str = "FJERN_PW";

/// Download district heating readings and chart the usage
#[derive(Parser, Debug, Clone)]
#[command(name = "fjernvarme", version)]
pub struct Cli {
    /// Customer number at the provider
    #[arg(long, env = USER_ID_ENV)]
    pub user_id: Option<String>,

    /// Provider password
    #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
    pub password: Option<String>,

    /// Root URL of the provider API
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Timeout of each provider request, in seconds
    #[arg(long, default_value = "30")]
    pub timeout_secs: u64,

    /// Read readings from a saved file instead of the provider
    #[arg(long)]
    pub load: Option<PathBuf>,

    /// Save the parsed readings
    #[arg(long)]
    pub save: bool,

    /// Where to save the readings, defaults to fjernvarmedata_<date>.csv
    #[arg(long, requires = "save")]
    pub save_path: Option<PathBuf>,

    /// HTML page to write
    #[arg(short, long, default_value = "index.html")]
    pub output: PathBuf,

    /// Description of the readings that are charted and summed
    #[arg(long, default_value = SETTLEMENT_MARKER)]
    pub marker: String,

    /// Smallest number of hours for a reading to count as a full day
    #[arg(long, default_value_t = HoursBand::default().lo)]
    pub min_hours: i64,

    /// Largest number of hours for a reading to count as a full day
    #[arg(long, default_value_t = HoursBand::default().hi)]
    pub max_hours: i64,

    /// Log filter, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    pub fn credentials(&self) -> Result<Credentials> {
        let user_id = self.user_id.clone().ok_or(Error::MissingEnv(USER_ID_ENV))?;
        let password = self.password.clone().ok_or(Error::MissingEnv(PASSWORD_ENV))?;
        Ok(Credentials::new(user_id, password))
    }

    pub fn provider_config(&self) -> Result<ProviderConfig> {
        Ok(ProviderConfig {
            credentials: self.credentials()?,
            endpoints: Endpoints::under(&self.base_url),
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }

    pub fn hours_band(&self) -> HoursBand {
        HoursBand::new(self.min_hours, self.max_hours)
    }
}
