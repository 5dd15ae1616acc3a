//! Output format of the serving process logs.
//!
//! Selected with `--log-format` or `PONZU_LOG_FORMAT`; the CLI forwards the
//! resolved value to the server it spawns, so the spelling produced by
//! `Display` must parse back.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How `ponzu-server` renders its log lines on stderr.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event, for log shippers.
    Json,
    /// Single-line text for an operator watching `ponzu run`.
    #[default]
    Compact,
}

impl LogFormat {
    /// Returns `true` for [`LogFormat::Json`].
    #[must_use]
    pub fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Error returned when `--log-format` names an unknown format.
pub type LogFormatParseError = strum::ParseError;
