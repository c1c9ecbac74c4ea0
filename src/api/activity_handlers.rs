use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Json as RequestJson,
};

use crate::api::dto::{ActivityDto, ActivityPropertiesDto, RowVersionDto};
use crate::api::handlers::{ApiResult, AppState};
use crate::logic::concurrency::require_token;
use crate::logic::guard::require;
use crate::model::{ActivityInstance, Id, Permission, UserContext};
use crate::repository::ActivityRepository;
use crate::store::Store;

/// GET /activities/{id}
pub async fn get_activity<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path(id): Path<Id>,
) -> ApiResult<Json<ActivityDto>> {
    require(&user, Permission::ActivityView)?;
    let activity = ActivityRepository::new(state.scope(&user)).get(id).await?;
    Ok(Json(activity.into()))
}

/// POST /activities
pub async fn add_activity<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    RequestJson(dto): RequestJson<ActivityDto>,
) -> ApiResult<(StatusCode, Json<ActivityDto>)> {
    require(&user, Permission::ActivityAdd)?;
    let activity = ActivityRepository::new(state.scope(&user))
        .add(ActivityInstance::from(dto))
        .await?;
    Ok((StatusCode::CREATED, Json(activity.into())))
}

/// PUT /activities/{id}
pub async fn update_activity<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path(id): Path<Id>,
    RequestJson(dto): RequestJson<ActivityDto>,
) -> ApiResult<Json<ActivityDto>> {
    require(&user, Permission::ActivityEdit)?;
    let submitted = require_token(dto.row_version)?;
    let mut activity = ActivityInstance::from(dto);
    activity.id = id;
    let activity = ActivityRepository::new(state.scope(&user))
        .update(activity, submitted)
        .await?;
    Ok(Json(activity.into()))
}

/// PUT /activities/{id}/properties
pub async fn update_activity_properties<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path(id): Path<Id>,
    RequestJson(body): RequestJson<ActivityPropertiesDto>,
) -> ApiResult<Json<ActivityDto>> {
    require(&user, Permission::ActivityEdit)?;
    let submitted = require_token(body.row_version)?;
    let activity = ActivityRepository::new(state.scope(&user))
        .update_properties(id, submitted, body.research_property_ids)
        .await?;
    Ok(Json(activity.into()))
}

/// DELETE /activities/{id}
pub async fn delete_activity<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path(id): Path<Id>,
    RequestJson(body): RequestJson<RowVersionDto>,
) -> ApiResult<StatusCode> {
    require(&user, Permission::ActivityDelete)?;
    ActivityRepository::new(state.scope(&user))
        .delete(id, body.token()?)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
