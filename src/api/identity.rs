//! 请求身份提取
//!
//! 认证由上游身份层完成，到达本服务的请求带 `x-user-id` 头。
//! 这里只负责提取；缺头即 401。

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::utils::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller, as asserted by the upstream identity layer
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: String,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(AppError::Unauthorized)?;

        Ok(CurrentUser {
            user_id: user_id.to_string(),
        })
    }
}
