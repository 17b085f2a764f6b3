use std::sync::Arc;

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        rand_core::OsRng,
    },
};
use chrono::Utc;
use tracing::{info, warn};

use crate::data::user_repository::{NewUser, UserRepository};
use crate::domain::error::DomainError;
use crate::domain::user::{LoginRequest, RegisterRequest, User};
use crate::infrastructure::jwt::JwtService;
use crate::infrastructure::presence::PresenceRegistry;

#[derive(Debug, Clone)]
pub(crate) struct AuthResult {
    pub(crate) user: User,
    pub(crate) access_token: String,
}

pub(crate) struct AuthService<R: UserRepository> {
    repo: R,
    jwt: Arc<JwtService>,
    presence: Arc<PresenceRegistry>,
}

impl<R: UserRepository> AuthService<R> {
    const DUMMY_PASSWORD_HASH: &'static str = "$argon2id$v=19$m=19456,t=2,p=1$MDEyMzQ1Njc4OWFiY2RlZg$gwN6hT1sNdk9kI95f7n2Gl3fL0qRmBf2Ffkj2r90/0M";

    pub(crate) fn new(repo: R, jwt: Arc<JwtService>, presence: Arc<PresenceRegistry>) -> Self {
        Self {
            repo,
            jwt,
            presence,
        }
    }

    pub(crate) async fn register(&self, req: RegisterRequest) -> Result<User, DomainError> {
        let req = req.validate()?;
        let password_hash = self.hash_password(&req.password)?;

        let user = self
            .repo
            .create_user(NewUser {
                username: req.username,
                password_hash,
                is_admin: false,
            })
            .await?;

        info!(username = %user.username, "user registered");
        Ok(user)
    }

    pub(crate) async fn login(&self, req: LoginRequest) -> Result<AuthResult, DomainError> {
        let req = req.validate()?;

        let user_creds = match self.repo.find_by_username(&req.username).await? {
            Some(user_creds) => user_creds,
            None => {
                // стремимся к одинаковому времени проверки если user не найден
                match self.verify_password(&req.password, Self::DUMMY_PASSWORD_HASH) {
                    Ok(()) | Err(DomainError::InvalidCredentials) => {}
                    Err(err) => return Err(err),
                }
                return Err(DomainError::InvalidCredentials);
            }
        };

        self.verify_password(&req.password, &user_creds.password_hash)?;

        if user_creds.user.banned {
            warn!(username = %user_creds.user.username, "banned user tried to log in");
            return Err(DomainError::PermissionDenied("user is banned"));
        }

        let now = Utc::now();
        let user = self
            .repo
            .update_user(
                &user_creds.user.username,
                Box::new(move |user: &mut User| {
                    user.last_seen = Some(now);
                    Ok(())
                }),
            )
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("user {}", user_creds.user.username)))?;

        self.presence.mark_online(&user.username);

        let access_token = self
            .jwt
            .generate_token(&user.username, user.is_admin)
            .map_err(|err| DomainError::Unexpected(err.to_string()))?;

        info!(username = %user.username, "user logged in");
        Ok(AuthResult { user, access_token })
    }

    pub(crate) async fn logout(&self, username: &str) -> Result<(), DomainError> {
        let user = self
            .repo
            .get_user(username)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("user {username}")))?;

        self.presence.mark_offline(&user.username);
        info!(username = %user.username, "user logged out");
        Ok(())
    }

    /// Creates the configured admin account unless a user with that name exists.
    pub(crate) async fn bootstrap_admin(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, DomainError> {
        if self.repo.find_by_username(username).await?.is_some() {
            return Ok(None);
        }

        let req = RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
        .validate()?;
        let password_hash = self.hash_password(&req.password)?;

        let user = self
            .repo
            .create_user(NewUser {
                username: req.username,
                password_hash,
                is_admin: true,
            })
            .await?;

        info!(username = %user.username, "admin account created");
        Ok(Some(user))
    }

    pub(crate) fn hash_password(&self, raw_password: &str) -> Result<String, DomainError> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Self::argon2()?
            .hash_password(raw_password.as_bytes(), &salt)
            .map_err(|err| DomainError::Unexpected(err.to_string()))?;
        Ok(password_hash.to_string())
    }

    pub(crate) fn verify_password(
        &self,
        raw_password: &str,
        password_hash: &str,
    ) -> Result<(), DomainError> {
        let parsed_hash = PasswordHash::new(password_hash)
            .map_err(|err| DomainError::Unexpected(err.to_string()))?;
        Self::argon2()?
            .verify_password(raw_password.as_bytes(), &parsed_hash)
            .map_err(|err| match err {
                PasswordHashError::Password => DomainError::InvalidCredentials,
                _ => DomainError::Unexpected(err.to_string()),
            })
    }

    fn argon2() -> Result<Argon2<'static>, DomainError> {
        let params = Params::new(19 * 1024, 2, 1, None)
            .map_err(|err| DomainError::Unexpected(err.to_string()))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::AuthService;
    use crate::application::test_support;
    use crate::data::repositories::json::user_repository::JsonUserRepository;
    use crate::data::user_repository::UserRepository;
    use crate::domain::error::DomainError;
    use crate::domain::user::{LoginRequest, RegisterRequest};
    use crate::infrastructure::jwt::JwtService;
    use crate::infrastructure::presence::PresenceRegistry;

    struct Fixture {
        service: AuthService<JsonUserRepository>,
        users: JsonUserRepository,
        jwt: Arc<JwtService>,
        presence: Arc<PresenceRegistry>,
    }

    fn fixture() -> Fixture {
        let (_, users) = test_support::repos();
        let jwt = Arc::new(JwtService::new("0123456789abcdef0123456789abcdef", 3600));
        let presence = Arc::new(PresenceRegistry::new(Duration::from_secs(600)));
        Fixture {
            service: AuthService::new(users.clone(), jwt.clone(), presence.clone()),
            users,
            jwt,
            presence,
        }
    }

    fn register_req(username: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    fn login_req(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn register_stores_hashed_password() {
        let f = fixture();

        let user = f
            .service
            .register(register_req("  valid_user  ", "secret"))
            .await
            .expect("register must succeed");
        assert_eq!(user.username, "valid_user");
        assert!(!user.is_admin);

        let creds = f
            .users
            .find_by_username("valid_user")
            .await
            .expect("find")
            .expect("user stored");
        assert_ne!(creds.password_hash, "secret");
        assert!(creds.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn register_rejects_taken_username_ignoring_case() {
        let f = fixture();
        f.service
            .register(register_req("alice", "secret"))
            .await
            .expect("first register");

        let err = f
            .service
            .register(register_req("ALICE", "secret"))
            .await
            .expect_err("duplicate");
        assert!(matches!(err, DomainError::DuplicateUser(_)));
    }

    #[tokio::test]
    async fn login_issues_token_and_marks_user_online() {
        let f = fixture();
        f.service
            .register(register_req("Alice", "secret"))
            .await
            .expect("register");

        let result = f
            .service
            .login(login_req("alice", "secret"))
            .await
            .expect("login must succeed");

        assert_eq!(result.user.username, "Alice");
        assert!(result.user.last_seen.is_some());
        let claims = f.jwt.verify_token(&result.access_token).expect("valid token");
        assert_eq!(claims.username, "Alice");
        assert_eq!(f.presence.online_users(), ["Alice"]);

        f.service.logout("alice").await.expect("logout");
        assert!(f.presence.online_users().is_empty());
    }

    #[tokio::test]
    async fn login_returns_invalid_credentials_for_missing_user() {
        let f = fixture();

        let err = f
            .service
            .login(login_req("ghost", "whatever"))
            .await
            .expect_err("login must fail");
        assert!(matches!(err, DomainError::InvalidCredentials));
    }

    #[tokio::test]
    async fn login_returns_invalid_credentials_for_wrong_password() {
        let f = fixture();
        f.service
            .register(register_req("alice", "correct"))
            .await
            .expect("register");

        let err = f
            .service
            .login(login_req("alice", "wrong"))
            .await
            .expect_err("login must fail");
        assert!(matches!(err, DomainError::InvalidCredentials));
    }

    #[tokio::test]
    async fn banned_user_cannot_log_in() {
        let f = fixture();
        f.service
            .register(register_req("alice", "secret"))
            .await
            .expect("register");
        test_support::ban(&f.users, "alice").await;

        let err = f
            .service
            .login(login_req("alice", "secret"))
            .await
            .expect_err("login must fail");
        assert!(matches!(err, DomainError::PermissionDenied(_)));
        assert!(f.presence.online_users().is_empty());
    }

    #[tokio::test]
    async fn bootstrap_admin_runs_once() {
        let f = fixture();

        let created = f
            .service
            .bootstrap_admin("admin", "admin")
            .await
            .expect("bootstrap");
        assert!(created.expect("admin created").is_admin);

        let again = f
            .service
            .bootstrap_admin("ADMIN", "admin")
            .await
            .expect("bootstrap");
        assert!(again.is_none());

        let login = f
            .service
            .login(login_req("admin", "admin"))
            .await
            .expect("admin login");
        assert!(login.user.is_admin);
    }
}
