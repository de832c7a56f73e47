use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;

use skillswap_common::{ApiResponse, AppError, Page, SkillList};
use skillswap_database::{AdminMessage, Notification, SwapRequest, SwapStatusCounts, User};

use crate::admin_service::AdminService;
use crate::extract::{CurrentUser, ValidatedJson};
use crate::feedback::FeedbackService;
use crate::matching::MatchService;
use crate::models::*;
use crate::notification_service::NotificationService;
use crate::state::AppState;
use crate::swap_service::{SwapAction, SwapService};
use crate::user_service::UserService;

type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

fn ok_with<T>(message: &str, data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success_with_message(message, data)))
}

// Health check
pub async fn health_check() -> Json<ApiResponse<String>> {
    Json(ApiResponse::success("SkillSwap marketplace is healthy".to_string()))
}

pub async fn handler_404() -> (StatusCode, Json<ApiResponse<()>>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::error("Endpoint not found".to_string())),
    )
}

// Authentication

pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), AppError> {
    let response = UserService::new(&state).register(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message("Registration successful", response)),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<AuthResponse> {
    let response = UserService::new(&state).login(request).await?;
    ok_with("Login successful", response)
}

pub async fn logout(CurrentUser(user): CurrentUser) -> ApiResult<()> {
    // Tokens are stateless; the client discards its copy
    tracing::info!(user_id = %user.id, "User logged out");
    Ok(Json(ApiResponse::success_with_message("Logged out successfully", ())))
}

pub async fn get_current_user(CurrentUser(user): CurrentUser) -> ApiResult<User> {
    ok(user)
}

// Profile

pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(request): ValidatedJson<UpdateProfileRequest>,
) -> ApiResult<User> {
    let updated = UserService::new(&state).update_profile(&user, request).await?;
    ok_with("Profile updated", updated)
}

pub async fn add_skill(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(list): Path<SkillList>,
    ValidatedJson(request): ValidatedJson<SkillRequest>,
) -> ApiResult<User> {
    let updated = UserService::new(&state)
        .add_skill(&user, list, &request.skill)
        .await?;
    ok(updated)
}

pub async fn remove_skill(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((list, skill)): Path<(SkillList, String)>,
) -> ApiResult<User> {
    let updated = UserService::new(&state).remove_skill(&user, list, &skill).await?;
    ok(updated)
}

// Directory

pub async fn search_users(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<UserQuery>,
) -> ApiResult<Page<PublicProfile>> {
    let page = state.page(query.page, query.limit);
    let results = UserService::new(&state).search(&user, query, page).await?;
    ok(results)
}

pub async fn get_matches(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<PageQuery>,
) -> ApiResult<Page<SkillMatch>> {
    let page = state.page(query.page, query.limit);
    let matches = MatchService::new(&state).matches_for(&user, page).await?;
    ok(matches)
}

pub async fn get_user_profile(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<ProfileView> {
    let profile = UserService::new(&state).view_profile(&viewer, user_id).await?;
    ok(profile)
}

// Swaps

pub async fn create_swap(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(request): ValidatedJson<CreateSwapRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SwapRequest>>), AppError> {
    let swap = SwapService::new(&state).create(&user, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message("Swap request sent", swap)),
    ))
}

pub async fn list_swaps(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<SwapQuery>,
) -> ApiResult<Page<SwapRequest>> {
    let page = state.page(query.page, query.limit);
    let swaps = SwapService::new(&state)
        .list_for_user(&user, query.status, query.direction.unwrap_or_default(), page)
        .await?;
    ok(swaps)
}

pub async fn swap_stats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<SwapStatusCounts> {
    let stats = SwapService::new(&state).stats_for_user(&user).await?;
    ok(stats)
}

pub async fn get_swap(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(swap_id): Path<Uuid>,
) -> ApiResult<SwapRequest> {
    let swap = SwapService::new(&state).get(&user, swap_id).await?;
    ok(swap)
}

async fn transition(state: &AppState, user: &User, swap_id: Uuid, action: SwapAction) -> ApiResult<SwapRequest> {
    let swap = SwapService::new(state).apply(user, swap_id, action).await?;
    ok_with(&format!("Swap request {}", swap.status), swap)
}

pub async fn accept_swap(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(swap_id): Path<Uuid>,
) -> ApiResult<SwapRequest> {
    transition(&state, &user, swap_id, SwapAction::Accept).await
}

pub async fn reject_swap(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(swap_id): Path<Uuid>,
) -> ApiResult<SwapRequest> {
    transition(&state, &user, swap_id, SwapAction::Reject).await
}

pub async fn complete_swap(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(swap_id): Path<Uuid>,
) -> ApiResult<SwapRequest> {
    transition(&state, &user, swap_id, SwapAction::Complete).await
}

pub async fn cancel_swap(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(swap_id): Path<Uuid>,
) -> ApiResult<SwapRequest> {
    transition(&state, &user, swap_id, SwapAction::Cancel).await
}

pub async fn submit_feedback(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(swap_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<FeedbackRequest>,
) -> ApiResult<FeedbackResponse> {
    let response = FeedbackService::new(&state).submit(&user, swap_id, request).await?;
    ok_with("Feedback submitted", response)
}

// Notifications

pub async fn list_notifications(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<NotificationQuery>,
) -> ApiResult<Page<Notification>> {
    let page = state.page(query.page, query.limit);
    let notifications = NotificationService::new(&state)
        .list(user.id, query.unread_only, page)
        .await?;
    ok(notifications)
}

pub async fn unread_count(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<CountResponse> {
    let count = NotificationService::new(&state).unread_count(user.id).await?;
    ok(CountResponse { count })
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(notification_id): Path<Uuid>,
) -> ApiResult<()> {
    NotificationService::new(&state)
        .mark_read(user.id, notification_id)
        .await?;
    ok_with("Notification marked as read", ())
}

pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<CountResponse> {
    let count = NotificationService::new(&state).mark_all_read(user.id).await?;
    ok_with("All notifications marked as read", CountResponse { count })
}

pub async fn delete_notification(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(notification_id): Path<Uuid>,
) -> ApiResult<()> {
    NotificationService::new(&state)
        .delete(user.id, notification_id)
        .await?;
    ok_with("Notification deleted", ())
}

pub async fn active_messages(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Vec<AdminMessage>> {
    let messages = NotificationService::new(&state).active_messages(user.id).await?;
    ok(messages)
}

// Admin

pub async fn admin_stats(State(state): State<AppState>) -> ApiResult<DashboardStats> {
    let stats = AdminService::new(&state).dashboard().await?;
    ok(stats)
}

pub async fn admin_list_users(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Page<User>> {
    let page = state.page(query.page, query.limit);
    let users = AdminService::new(&state).list_users(query, page).await?;
    ok(users)
}

pub async fn ban_user(
    State(state): State<AppState>,
    CurrentUser(admin): CurrentUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<User> {
    let user = AdminService::new(&state).ban(&admin, user_id).await?;
    ok_with("User banned", user)
}

pub async fn unban_user(
    State(state): State<AppState>,
    CurrentUser(admin): CurrentUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<User> {
    let user = AdminService::new(&state).unban(&admin, user_id).await?;
    ok_with("User unbanned", user)
}

pub async fn set_user_admin(
    State(state): State<AppState>,
    CurrentUser(admin): CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(request): Json<SetAdminRequest>,
) -> ApiResult<User> {
    let user = AdminService::new(&state)
        .set_admin(&admin, user_id, request.is_admin)
        .await?;
    ok_with("Administrator access updated", user)
}

pub async fn admin_list_swaps(
    State(state): State<AppState>,
    Query(query): Query<AdminSwapQuery>,
) -> ApiResult<Page<SwapRequest>> {
    let page = state.page(query.page, query.limit);
    let swaps = SwapService::new(&state)
        .list_all(query.user_id, query.status, page)
        .await?;
    ok(swaps)
}

pub async fn create_admin_message(
    State(state): State<AppState>,
    CurrentUser(admin): CurrentUser,
    ValidatedJson(request): ValidatedJson<CreateAdminMessageRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AdminMessageCreated>>), AppError> {
    let created = AdminService::new(&state).create_message(&admin, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message("Admin message created", created)),
    ))
}

pub async fn list_admin_messages(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Page<AdminMessage>> {
    let page = state.page(query.page, query.limit);
    let messages = AdminService::new(&state).list_messages(page).await?;
    ok(messages)
}

pub async fn update_admin_message(
    State(state): State<AppState>,
    CurrentUser(admin): CurrentUser,
    Path(message_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateAdminMessageRequest>,
) -> ApiResult<AdminMessage> {
    let message = AdminService::new(&state)
        .update_message(&admin, message_id, request)
        .await?;
    ok_with("Admin message updated", message)
}

pub async fn delete_admin_message(
    State(state): State<AppState>,
    CurrentUser(admin): CurrentUser,
    Path(message_id): Path<Uuid>,
) -> ApiResult<()> {
    AdminService::new(&state).delete_message(&admin, message_id).await?;
    ok_with("Admin message deleted", ())
}
