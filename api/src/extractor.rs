use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use kernel::model::{id::UserId, role::Role};
use shared::error::AppError;

// 認証プロバイダ（このリポジトリの外側）がゲートウェイで検証済みの
// 利用者情報をヘッダで引き渡してくる前提の抽出器
pub struct AuthorizedUser {
    pub user_id: UserId,
    pub role: Role,
}

impl AuthorizedUser {
    pub fn id(&self) -> UserId {
        self.user_id
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }

    pub fn is_teacher(&self) -> bool {
        matches!(self.role, Role::Teacher)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthorizedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::UnauthenticatedError)?
            .parse::<UserId>()?;
        let role = parts
            .headers
            .get("x-user-role")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::UnauthenticatedError)?
            .parse::<Role>()?;
        Ok(Self { user_id, role })
    }
}
