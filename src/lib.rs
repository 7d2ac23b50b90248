//! Heat-meter readings from a district heating provider: the login
//! handshake, the report download, parsing, monthly sums and usage charts.

pub mod aggregate;
pub mod auth;
pub mod chart;
pub mod cli;
pub mod error;
pub mod provider;
pub mod reading;
pub mod report;
pub mod select;
pub mod store;

pub use aggregate::{aggregate_monthly, YearMonth};
pub use auth::{AuthorizationId, Credentials};
pub use error::{Error, Result};
pub use provider::{Endpoints, Provider, ProviderConfig};
pub use reading::{Reading, SETTLEMENT_MARKER};
pub use report::{Metadata, ParseError, Report};
pub use select::{select, DateRange, HoursBand};
