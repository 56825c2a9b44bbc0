use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::model::role::Role;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data};
use futures::future::{Ready, ready};

#[derive(Clone, Debug)]
pub struct AuthUser {
    pub workspace_id: u64,
    pub role: Role,

    /// Present only if the caller is a workspace member
    pub member_id: Option<u64>,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Set by the auth middleware on protected scopes.
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(
                    actix_web::error::ErrorInternalServerError("Config missing"),
                ))
            }
        };

        let claims = match verify_token(token, &config.jwt_secret) {
            Ok(c) => c,
            Err(_) => return ready(Err(ErrorUnauthorized("Invalid token"))),
        };

        let role = match Role::from_id(claims.role) {
            Some(r) => r,
            None => return ready(Err(ErrorUnauthorized("Invalid role"))),
        };

        ready(Ok(AuthUser {
            workspace_id: claims.workspace_id,
            role,
            member_id: claims.member_id,
        }))
    }
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admins and managers see every request of the workspace.
    pub fn sees_workspace(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Manager | Role::System)
    }

    pub fn require_admin(&self) -> actix_web::Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Admin only"))
        }
    }

    pub fn require_member(&self) -> actix_web::Result<u64> {
        self.member_id
            .ok_or_else(|| actix_web::error::ErrorForbidden("No member profile"))
    }

    /// Members may act on their own records, admins on everyone's.
    pub fn require_self_or_admin(&self, member_id: u64) -> actix_web::Result<()> {
        if self.is_admin() || self.member_id == Some(member_id) {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Not allowed for this member"))
        }
    }
}
