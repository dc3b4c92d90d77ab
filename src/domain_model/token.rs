use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique id of a single token issuance (`jti` claim).
#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TokenId(pub uuid::Uuid);

impl TokenId {
    pub fn generate() -> Self {
        TokenId(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TokenId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::from_str(s).map(TokenId)
    }
}

/// Groups every refresh token descended from one login (`fid` claim).
/// Created once per login, constant across rotations.
#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct FamilyId(pub uuid::Uuid);

impl FamilyId {
    pub fn generate() -> Self {
        FamilyId(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for FamilyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for FamilyId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::from_str(s).map(FamilyId)
    }
}

/// Fixed audience tags. A token encoded for one audience must be rejected
/// wherever another audience is expected.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Audience {
    ApiAccess,
    ApiRefresh,
    PasswordReset,
}

impl Audience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::ApiAccess => "api:access",
            Audience::ApiRefresh => "api:refresh",
            Audience::PasswordReset => "password:reset",
        }
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessToken(pub String);

#[derive(Debug, Clone, Serialize)]
pub struct RefreshToken(pub String);

#[derive(Debug, Clone, Serialize)]
pub struct ResetToken(pub String);
