use super::error::*;
use crate::application_port::{
    AuthService, LoginInput, LogoutScope, PasswordResetService, TokenPair,
};
use crate::domain_model::UserId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: UserId,
    pub auth_tokens: TokenPair,
}

pub async fn login(
    body: LoginRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let login_input = LoginInput {
        email: body.email,
        password: body.password,
    };
    let login_result = auth_service
        .login(login_input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let login_response = LoginResponse {
        user_id: login_result.user_id,
        auth_tokens: login_result.tokens,
    };

    Ok(warp::reply::json(&ApiResponse::ok(login_response)))
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

pub async fn refresh_token(
    body: RefreshRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let tokens = auth_service
        .refresh(&body.refresh_token)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(tokens)))
}

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: String,
    #[serde(default)]
    pub scope: LogoutScopeRequest,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogoutScopeRequest {
    #[default]
    Single,
    Family,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: &'static str,
}

pub async fn logout(
    body: LogoutRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let scope = match body.scope {
        LogoutScopeRequest::Single => LogoutScope::Single,
        LogoutScopeRequest::Family => LogoutScope::Family,
    };

    auth_service
        .logout(&body.refresh_token, scope)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(LogoutResponse {
        message: "You were successfully logged out",
    })))
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct PasswordResetResponse {
    pub message: &'static str,
}

/// The response is identical whether or not the email belongs to a user, and
/// the token never appears in it; delivery happens over an external channel.
pub async fn request_password_reset(
    body: PasswordResetRequest,
    password_reset_service: Arc<dyn PasswordResetService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let _token = password_reset_service
        .request(&body.email)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(PasswordResetResponse {
        message: "If the address exists, reset instructions were sent",
    })))
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user_id: UserId,
}

pub async fn me(user_id: UserId) -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::json(&ApiResponse::ok(MeResponse { user_id })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_carries_data_xor_error() {
        let ok = serde_json::to_value(ApiResponse::ok(LogoutResponse {
            message: "bye",
        }))
        .unwrap();
        assert_eq!(ok["success"], true);
        assert_eq!(ok["data"]["message"], "bye");
        assert!(ok["error"].is_null());

        let err = serde_json::to_value(ApiResponse::<()>::err(
            ApiErrorCode::Unauthorized,
            "Unauthorized",
        ))
        .unwrap();
        assert_eq!(err["success"], false);
        assert!(err["data"].is_null());
        assert_eq!(err["error"]["message"], "Unauthorized");
    }

    #[test]
    fn logout_scope_defaults_to_single() {
        let body: LogoutRequest =
            serde_json::from_str(r#"{"refresh_token":"rt"}"#).unwrap();
        assert!(matches!(body.scope, LogoutScopeRequest::Single));

        let body: LogoutRequest =
            serde_json::from_str(r#"{"refresh_token":"rt","scope":"family"}"#).unwrap();
        assert!(matches!(body.scope, LogoutScopeRequest::Family));
    }
}
