use std::sync::Arc;

use crate::application::auth_service::AuthService;
use crate::application::feed_service::FeedService;
use crate::application::moderation_service::ModerationService;
use crate::application::user_service::UserService;
use crate::data::repositories::json::post_repository::JsonPostRepository;
use crate::data::repositories::json::store::FeedStore;
use crate::data::repositories::json::user_repository::JsonUserRepository;
use crate::infrastructure::jwt::JwtService;
use crate::infrastructure::presence::PresenceRegistry;

pub(crate) mod http;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) auth_service: Arc<AuthService<JsonUserRepository>>,
    pub(crate) feed_service: Arc<FeedService<JsonPostRepository, JsonUserRepository>>,
    pub(crate) user_service: Arc<UserService<JsonUserRepository>>,
    pub(crate) moderation_service: Arc<ModerationService<JsonUserRepository>>,
    pub(crate) jwt: Arc<JwtService>,
}

impl AppState {
    /// Wires every service onto one shared store.
    pub(crate) fn new(
        store: Arc<FeedStore>,
        jwt: Arc<JwtService>,
        presence: Arc<PresenceRegistry>,
    ) -> Self {
        let posts = JsonPostRepository::new(store.clone());
        let users = JsonUserRepository::new(store);

        Self {
            auth_service: Arc::new(AuthService::new(
                users.clone(),
                jwt.clone(),
                presence.clone(),
            )),
            feed_service: Arc::new(FeedService::new(posts, users.clone(), presence.clone())),
            user_service: Arc::new(UserService::new(users.clone(), presence)),
            moderation_service: Arc::new(ModerationService::new(users)),
            jwt,
        }
    }
}
