//! Capture phases and their file naming tables.

use crate::error::CaptureError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the three recognized capture contexts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Signin,
    Search,
    Application,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Signin, Phase::Search, Phase::Application];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Signin => "signin",
            Phase::Search => "search",
            Phase::Application => "application",
        }
    }

    /// Reference document holding the known values for this phase
    pub fn reference_file(&self) -> &'static str {
        match self {
            Phase::Signin => "applicant_credentials.json",
            Phase::Search => "applicant_preferences.json",
            Phase::Application => "applicant_data.json",
        }
    }

    pub fn output_suffix(&self) -> &'static str {
        match self {
            Phase::Signin => "credentials",
            Phase::Search => "preferences",
            Phase::Application => "data",
        }
    }

    /// File name of the reconstructed document exported on stop
    pub fn output_file(&self) -> String {
        format!("applicant_{}.json", self.output_suffix())
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phase::ALL
            .into_iter()
            .find(|phase| phase.as_str() == s)
            .ok_or_else(|| CaptureError::UnknownPhase(s.to_string()))
    }
}
