use crate::application_port::{
    AccessClaimsView, RefreshClaimsView, TokenCodec, TokenError,
};
use crate::domain_model::{
    AccessToken, Audience, FamilyId, RefreshToken, ResetToken, TokenId, UserId,
};
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub reset_ttl: Duration,
    pub signing_key: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AccessClaims {
    uid: String,
    exp: i64,
    iat: i64,
    iss: String,
    aud: String,
    jti: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct RefreshClaims {
    uid: String,
    exp: i64,
    iat: i64,
    iss: String,
    aud: String,
    jti: String,
    fid: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ResetClaims {
    uid: String,
    exp: i64,
    iat: i64,
    iss: String,
    aud: String,
}

fn map_decode_err(e: jsonwebtoken::errors::Error) -> TokenError {
    match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        ErrorKind::InvalidAudience => TokenError::AudienceMismatch,
        _ => TokenError::Malformed,
    }
}

fn map_encode_err(e: jsonwebtoken::errors::Error) -> TokenError {
    TokenError::InternalError(e.to_string())
}

fn parse_uid(uid: &str) -> Result<UserId, TokenError> {
    uid.parse::<UserId>().map_err(|_| TokenError::Malformed)
}

pub struct JwtHs256Codec {
    cfg: JwtConfig,
}

impl JwtHs256Codec {
    pub fn new(cfg: JwtConfig) -> Self {
        JwtHs256Codec { cfg }
    }

    fn window(&self, ttl: Duration) -> (DateTime<Utc>, DateTime<Utc>) {
        let iat = Utc::now();
        (iat, iat + ttl)
    }

    /// Strict validation for one audience. Leeway is zeroed so short-lived
    /// tokens expire exactly on schedule.
    fn validation(&self, audience: Audience) -> Validation {
        let mut v = Validation::new(Algorithm::HS256);
        v.leeway = 0;
        v.validate_exp = true;
        v.set_audience(&[audience.as_str()]);
        v.set_issuer(&[self.cfg.issuer.clone()]);
        v
    }
}

#[async_trait::async_trait]
impl TokenCodec for JwtHs256Codec {
    async fn issue_access_token(
        &self,
        user: UserId,
        jti: Option<TokenId>,
    ) -> Result<(AccessToken, DateTime<Utc>), TokenError> {
        let jti = jti.unwrap_or_else(TokenId::generate);
        let (iat, exp) = self.window(self.cfg.access_ttl);
        let claims = AccessClaims {
            uid: user.to_string(),
            exp: exp.timestamp(),
            iat: iat.timestamp(),
            iss: self.cfg.issuer.clone(),
            aud: Audience::ApiAccess.as_str().to_string(),
            jti: jti.to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.cfg.signing_key),
        )
        .map_err(map_encode_err)?;
        Ok((AccessToken(token), exp))
    }

    async fn issue_refresh_token(
        &self,
        user: UserId,
        jti: TokenId,
        fid: FamilyId,
    ) -> Result<(RefreshToken, DateTime<Utc>), TokenError> {
        let (iat, exp) = self.window(self.cfg.refresh_ttl);
        let claims = RefreshClaims {
            uid: user.to_string(),
            exp: exp.timestamp(),
            iat: iat.timestamp(),
            iss: self.cfg.issuer.clone(),
            aud: Audience::ApiRefresh.as_str().to_string(),
            jti: jti.to_string(),
            fid: fid.to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.cfg.signing_key),
        )
        .map_err(map_encode_err)?;
        Ok((RefreshToken(token), exp))
    }

    async fn issue_reset_token(
        &self,
        user: UserId,
        secret: &[u8],
    ) -> Result<(ResetToken, DateTime<Utc>), TokenError> {
        let (iat, exp) = self.window(self.cfg.reset_ttl);
        let claims = ResetClaims {
            uid: user.to_string(),
            exp: exp.timestamp(),
            iat: iat.timestamp(),
            iss: self.cfg.issuer.clone(),
            aud: Audience::PasswordReset.as_str().to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret),
        )
        .map_err(map_encode_err)?;
        Ok((ResetToken(token), exp))
    }

    async fn verify_access_token(
        &self,
        token: &AccessToken,
    ) -> Result<AccessClaimsView, TokenError> {
        let data = decode::<AccessClaims>(
            &token.0,
            &DecodingKey::from_secret(&self.cfg.signing_key),
            &self.validation(Audience::ApiAccess),
        )
        .map_err(map_decode_err)?;
        Ok(AccessClaimsView {
            user_id: parse_uid(&data.claims.uid)?,
            jti: data.claims.jti.parse().map_err(|_| TokenError::Malformed)?,
        })
    }

    async fn verify_refresh_token(
        &self,
        token: &RefreshToken,
    ) -> Result<RefreshClaimsView, TokenError> {
        let data = decode::<RefreshClaims>(
            &token.0,
            &DecodingKey::from_secret(&self.cfg.signing_key),
            &self.validation(Audience::ApiRefresh),
        )
        .map_err(map_decode_err)?;
        Ok(RefreshClaimsView {
            user_id: parse_uid(&data.claims.uid)?,
            jti: data.claims.jti.parse().map_err(|_| TokenError::Malformed)?,
            fid: data.claims.fid.parse().map_err(|_| TokenError::Malformed)?,
        })
    }

    async fn peek_reset_subject(&self, token: &ResetToken) -> Result<UserId, TokenError> {
        // Signature deliberately unchecked: the claim only tells us whose
        // current password hash to derive the real verification secret from.
        let mut v = self.validation(Audience::PasswordReset);
        v.insecure_disable_signature_validation();
        let data = decode::<ResetClaims>(&token.0, &DecodingKey::from_secret(&[]), &v)
            .map_err(map_decode_err)?;
        parse_uid(&data.claims.uid)
    }

    async fn verify_reset_token(
        &self,
        token: &ResetToken,
        secret: &[u8],
    ) -> Result<UserId, TokenError> {
        let data = decode::<ResetClaims>(
            &token.0,
            &DecodingKey::from_secret(secret),
            &self.validation(Audience::PasswordReset),
        )
        .map_err(map_decode_err)?;
        parse_uid(&data.claims.uid)
    }
}
