use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Json as RequestJson,
};
use uuid::Uuid;

use crate::api::dto::{
    ClaimDto, PageDto, PageQuery, RemovedCountDto, RoleDto, RoleKeepDto, RowVersionDto, TenantDto,
};
use crate::api::handlers::{ApiResult, AppState};
use crate::logic::concurrency::require_token;
use crate::logic::guard::{require, require_or_service_account};
use crate::model::{Claim, Permission, Role, Tenant, UserContext};
use crate::repository::{ClaimRepository, RoleRepository, TenantRepository};
use crate::store::Store;

// Claims

/// GET /admin/claims
pub async fn list_claims<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<PageDto<ClaimDto>>> {
    require(&user, Permission::SystemAdmin)?;
    let page = ClaimRepository::new(state.scope(&user))
        .get_page(query.request(), query.name.as_deref())
        .await?;
    Ok(Json(PageDto::from_page(page, ClaimDto::from)))
}

/// GET /admin/claims/{key}
pub async fn get_claim<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path(key): Path<Uuid>,
) -> ApiResult<Json<ClaimDto>> {
    require(&user, Permission::SystemAdmin)?;
    let claim = ClaimRepository::new(state.scope(&user)).get(key).await?;
    Ok(Json(claim.into()))
}

/// POST /admin/claims
pub async fn add_claim<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    RequestJson(dto): RequestJson<ClaimDto>,
) -> ApiResult<(StatusCode, Json<ClaimDto>)> {
    require(&user, Permission::SystemAdmin)?;
    let claim = ClaimRepository::new(state.scope(&user))
        .add(Claim::from(dto))
        .await?;
    Ok((StatusCode::CREATED, Json(claim.into())))
}

/// PUT /admin/claims/{key}
pub async fn update_claim<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path(key): Path<Uuid>,
    RequestJson(dto): RequestJson<ClaimDto>,
) -> ApiResult<Json<ClaimDto>> {
    require(&user, Permission::SystemAdmin)?;
    let submitted = require_token(dto.row_version)?;
    let mut claim = Claim::from(dto);
    claim.key = key;
    let claim = ClaimRepository::new(state.scope(&user))
        .update(claim, submitted)
        .await?;
    Ok(Json(claim.into()))
}

/// DELETE /admin/claims/{key}
pub async fn delete_claim<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path(key): Path<Uuid>,
    RequestJson(body): RequestJson<RowVersionDto>,
) -> ApiResult<StatusCode> {
    require(&user, Permission::SystemAdmin)?;
    ClaimRepository::new(state.scope(&user))
        .delete(key, body.token()?)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// Roles

/// GET /admin/roles
pub async fn list_roles<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<PageDto<RoleDto>>> {
    require_or_service_account(&user, Permission::AdminRoles, &state.config.auth)?;
    let page = RoleRepository::new(state.scope(&user))
        .get_page(query.request(), query.name.as_deref())
        .await?;
    Ok(Json(PageDto::from_page(page, RoleDto::from)))
}

/// GET /admin/roles/{key}
pub async fn get_role<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path(key): Path<Uuid>,
) -> ApiResult<Json<RoleDto>> {
    require(&user, Permission::AdminRoles)?;
    let role = RoleRepository::new(state.scope(&user)).get(key).await?;
    Ok(Json(role.into()))
}

/// GET /admin/roles/name/{name}
pub async fn get_role_by_name<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path(name): Path<String>,
) -> ApiResult<Json<RoleDto>> {
    require_or_service_account(&user, Permission::AdminRoles, &state.config.auth)?;
    let role = RoleRepository::new(state.scope(&user))
        .get_by_name(&name)
        .await?;
    Ok(Json(role.into()))
}

/// GET /admin/roles/group/{group_id}
pub async fn get_role_by_group<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path(group_id): Path<Uuid>,
) -> ApiResult<Json<RoleDto>> {
    require_or_service_account(&user, Permission::AdminRoles, &state.config.auth)?;
    let role = RoleRepository::new(state.scope(&user))
        .get_by_keycloak_id(group_id)
        .await?;
    Ok(Json(role.into()))
}

/// POST /admin/roles
pub async fn add_role<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    RequestJson(dto): RequestJson<RoleDto>,
) -> ApiResult<(StatusCode, Json<RoleDto>)> {
    require(&user, Permission::AdminRoles)?;
    let role = RoleRepository::new(state.scope(&user))
        .add(Role::from(dto))
        .await?;
    Ok((StatusCode::CREATED, Json(role.into())))
}

/// PUT /admin/roles/{key}
pub async fn update_role<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path(key): Path<Uuid>,
    RequestJson(dto): RequestJson<RoleDto>,
) -> ApiResult<Json<RoleDto>> {
    require_or_service_account(&user, Permission::AdminRoles, &state.config.auth)?;
    let submitted = require_token(dto.row_version)?;
    let mut role = Role::from(dto);
    role.key = key;
    let role = RoleRepository::new(state.scope(&user))
        .update(role, submitted)
        .await?;
    Ok(Json(role.into()))
}

/// DELETE /admin/roles/{key}
pub async fn delete_role<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path(key): Path<Uuid>,
    RequestJson(body): RequestJson<RowVersionDto>,
) -> ApiResult<StatusCode> {
    require(&user, Permission::AdminRoles)?;
    RoleRepository::new(state.scope(&user))
        .delete(key, body.token()?)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /admin/roles/sync
/// Remove every role not named in the keep list
pub async fn sync_roles<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    RequestJson(body): RequestJson<RoleKeepDto>,
) -> ApiResult<Json<RemovedCountDto>> {
    require_or_service_account(&user, Permission::AdminRoles, &state.config.auth)?;
    let removed = RoleRepository::new(state.scope(&user))
        .remove_all_except(&body.keep)
        .await?;
    Ok(Json(RemovedCountDto { removed }))
}

// Tenants

/// GET /tenants
/// Settings of the configured tenant, or 204 when there is none
pub async fn get_tenant<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
) -> ApiResult<Response> {
    let tenant = TenantRepository::new(state.scope(&user))
        .get_configured(state.config.pims.tenant.as_deref())
        .await?;
    Ok(match tenant {
        Some(tenant) => Json(TenantDto::from(tenant)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

/// PUT /tenants/{code}
pub async fn update_tenant<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path(code): Path<String>,
    RequestJson(dto): RequestJson<TenantDto>,
) -> ApiResult<Json<TenantDto>> {
    require(&user, Permission::SystemAdmin)?;
    let submitted = require_token(dto.row_version)?;
    let mut tenant = Tenant::from(dto);
    tenant.code = code;
    let tenant = TenantRepository::new(state.scope(&user))
        .update(tenant, submitted)
        .await?;
    Ok(Json(tenant.into()))
}
