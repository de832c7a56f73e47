use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers;
use crate::middleware::{admin_middleware, auth_middleware};
use crate::state::AppState;
use crate::websocket::websocket_handler;

pub fn create_routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Authentication routes
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        // Push channel authenticates with a query token
        .route("/ws", get(websocket_handler));

    let admin = Router::new()
        .route("/api/admin/stats", get(handlers::admin_stats))
        .route("/api/admin/users", get(handlers::admin_list_users))
        .route("/api/admin/users/:user_id/ban", put(handlers::ban_user))
        .route("/api/admin/users/:user_id/unban", put(handlers::unban_user))
        .route("/api/admin/users/:user_id/admin", put(handlers::set_user_admin))
        .route("/api/admin/swaps", get(handlers::admin_list_swaps))
        .route(
            "/api/admin/messages",
            post(handlers::create_admin_message).get(handlers::list_admin_messages),
        )
        .route(
            "/api/admin/messages/:message_id",
            put(handlers::update_admin_message).delete(handlers::delete_admin_message),
        )
        .route_layer(middleware::from_fn(admin_middleware));

    let protected = Router::new()
        .route("/api/auth/me", get(handlers::get_current_user))
        .route("/api/auth/logout", post(handlers::logout))
        // Profile management routes
        .route(
            "/api/profile",
            get(handlers::get_current_user).put(handlers::update_profile),
        )
        .route("/api/profile/skills/:list", post(handlers::add_skill))
        .route("/api/profile/skills/:list/:skill", delete(handlers::remove_skill))
        // Directory routes
        .route("/api/users", get(handlers::search_users))
        .route("/api/users/matches", get(handlers::get_matches))
        .route("/api/users/:user_id", get(handlers::get_user_profile))
        // Swap routes
        .route("/api/swaps", post(handlers::create_swap).get(handlers::list_swaps))
        .route("/api/swaps/stats", get(handlers::swap_stats))
        .route(
            "/api/swaps/:swap_id",
            get(handlers::get_swap).delete(handlers::cancel_swap),
        )
        .route("/api/swaps/:swap_id/accept", put(handlers::accept_swap))
        .route("/api/swaps/:swap_id/reject", put(handlers::reject_swap))
        .route("/api/swaps/:swap_id/complete", put(handlers::complete_swap))
        .route("/api/swaps/:swap_id/feedback", post(handlers::submit_feedback))
        // Notification routes
        .route("/api/notifications", get(handlers::list_notifications))
        .route("/api/notifications/unread-count", get(handlers::unread_count))
        .route("/api/notifications/read-all", put(handlers::mark_all_notifications_read))
        .route("/api/notifications/:notification_id/read", put(handlers::mark_notification_read))
        .route("/api/notifications/:notification_id", delete(handlers::delete_notification))
        .route("/api/messages/active", get(handlers::active_messages))
        .merge(admin)
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    public.merge(protected)
}
