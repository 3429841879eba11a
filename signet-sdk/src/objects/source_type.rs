use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Kind of identity signal carried by a submission
pub enum SourceType {
    /// W3C Verifiable Credential
    #[serde(rename = "VC")]
    VerifiableCredential,
    /// Claims taken from an OIDC ID token
    #[serde(rename = "OIDC")]
    Oidc,
    /// Manually entered identity data
    #[serde(rename = "MANUAL")]
    Manual,
}

impl SourceType {
    pub const ALL: [SourceType; 3] = [
        SourceType::VerifiableCredential,
        SourceType::Oidc,
        SourceType::Manual,
    ];

    /// Wire and database representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            SourceType::VerifiableCredential => "VC",
            SourceType::Oidc => "OIDC",
            SourceType::Manual => "MANUAL",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown source type {0:?}, expected one of VC, OIDC, MANUAL")]
pub struct UnknownSourceType(pub String);

impl FromStr for SourceType {
    type Err = UnknownSourceType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownSourceType(s.to_owned()))
    }
}
