use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    Json as RequestJson,
};

use crate::api::dto::{
    guard_into_model, ActivityDto, PageDto, ParentGuardDto, PropertyResearchFileDto,
    ResearchFileDto, ResearchFilePropertiesDto, ResearchFileQuery,
};
use crate::api::handlers::{ApiResult, AppState};
use crate::logic::concurrency::require_token;
use crate::logic::guard::require;
use crate::model::{
    FileKind, Id, Permission, PropertyResearchFile, ResearchFile, UserContext,
};
use crate::repository::{ActivityRepository, ResearchFileRepository};
use crate::service::ResearchFileService;
use crate::store::Store;

/// GET /researchFiles
pub async fn list_research_files<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Query(query): Query<ResearchFileQuery>,
) -> ApiResult<Json<PageDto<ResearchFileDto>>> {
    require(&user, Permission::ResearchFileView)?;
    let (filter, page) = query.into_parts();
    let page = ResearchFileRepository::new(state.scope(&user))
        .get_page(&filter, page)
        .await?;
    Ok(Json(PageDto::from_page(page, ResearchFileDto::from)))
}

/// GET /researchFiles/{id}
pub async fn get_research_file<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path(id): Path<Id>,
) -> ApiResult<Json<ResearchFileDto>> {
    require(&user, Permission::ResearchFileView)?;
    let file = ResearchFileRepository::new(state.scope(&user)).get(id).await?;
    Ok(Json(file.into()))
}

/// POST /researchFiles
pub async fn add_research_file<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    RequestJson(dto): RequestJson<ResearchFileDto>,
) -> ApiResult<(StatusCode, Json<ResearchFileDto>)> {
    require(&user, Permission::ResearchFileAdd)?;
    let file = ResearchFile::try_from(dto)?;
    let file = ResearchFileService::new(state.scope(&user)).add(file).await?;
    Ok((StatusCode::CREATED, Json(file.into())))
}

/// PUT /researchFiles/{id}
pub async fn update_research_file<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path(id): Path<Id>,
    RequestJson(dto): RequestJson<ResearchFileDto>,
) -> ApiResult<Json<ResearchFileDto>> {
    require(&user, Permission::ResearchFileEdit)?;
    let submitted = require_token(dto.row_version)?;
    let mut file = ResearchFile::try_from(dto)?;
    file.id = id;
    let file = ResearchFileService::new(state.scope(&user))
        .update(file, submitted)
        .await?;
    Ok(Json(file.into()))
}

/// PUT /researchFiles/{id}/properties
pub async fn update_research_file_properties<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path(id): Path<Id>,
    RequestJson(body): RequestJson<ResearchFilePropertiesDto>,
) -> ApiResult<Json<ResearchFileDto>> {
    require(&user, Permission::ResearchFileEdit)?;
    let properties = body.properties.into_iter().map(Into::into).collect();
    let file = ResearchFileService::new(state.scope(&user))
        .update_properties(id, require_token(body.row_version)?, properties)
        .await?;
    Ok(Json(file.into()))
}

/// PUT /researchFiles/{id}/properties/{property_file_id}
/// Edit one property link under the research file's version
pub async fn update_research_file_property<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path((id, property_file_id)): Path<(Id, Id)>,
    RequestJson(guard): RequestJson<ParentGuardDto<PropertyResearchFileDto>>,
) -> ApiResult<Json<ResearchFileDto>> {
    require(&user, Permission::ResearchFileEdit)?;
    let mut guard = guard_into_model(guard, |dto| Ok(PropertyResearchFile::from(dto)))?;
    guard.payload.id = property_file_id;
    let file = ResearchFileService::new(state.scope(&user))
        .update_property(id, guard)
        .await?;
    Ok(Json(file.into()))
}

/// GET /researchFiles/{id}/activities
pub async fn list_research_file_activities<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path(id): Path<Id>,
) -> ApiResult<Json<Vec<ActivityDto>>> {
    require(&user, Permission::ActivityView)?;
    let activities = ActivityRepository::new(state.scope(&user))
        .list_for_file(FileKind::Research, id)
        .await?;
    Ok(Json(activities.into_iter().map(Into::into).collect()))
}
