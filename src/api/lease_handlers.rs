use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    Json as RequestJson,
};

use crate::api::dto::{
    guard_into_model, tenants_into_model, ActivityDto, LeaseDto, LeaseImprovementsDto,
    LeaseInsurancesDto, LeasePaymentDto, LeaseQuery, LeaseTenantsDto, LeaseTermDto, PageDto,
    ParentGuardDto,
};
use crate::api::handlers::{ApiResult, AppState};
use crate::logic::concurrency::require_token;
use crate::logic::guard::require;
use crate::model::{
    FileKind, Id, Lease, LeasePayment, LeaseTerm, Permission, UserContext,
};
use crate::repository::{ActivityRepository, LeaseRepository};
use crate::service::LeaseService;
use crate::store::Store;

/// Lease body with tenant display names filled in
async fn lease_response<S: Store>(repository: &LeaseRepository<'_, S>, lease: Lease) -> ApiResult<LeaseDto> {
    let parties: Vec<_> = lease.tenants.iter().map(|t| t.party.clone()).collect();
    let mut dto = LeaseDto::from(lease);
    for (tenant, party) in dto.tenants.iter_mut().zip(parties.iter()) {
        tenant.name = repository.party_name(party).await?;
    }
    Ok(dto)
}

/// GET /leases
pub async fn list_leases<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Query(query): Query<LeaseQuery>,
) -> ApiResult<Json<PageDto<LeaseDto>>> {
    require(&user, Permission::LeaseView)?;
    let (filter, page) = query.into_parts();
    let page = LeaseRepository::new(state.scope(&user))
        .get_page(&filter, page)
        .await?;
    Ok(Json(PageDto::from_page(page, LeaseDto::from)))
}

/// GET /leases/{id}
pub async fn get_lease<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path(id): Path<Id>,
) -> ApiResult<Json<LeaseDto>> {
    require(&user, Permission::LeaseView)?;
    let repository = LeaseRepository::new(state.scope(&user));
    let lease = repository.get(id).await?;
    Ok(Json(lease_response(&repository, lease).await?))
}

/// POST /leases
pub async fn add_lease<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    RequestJson(dto): RequestJson<LeaseDto>,
) -> ApiResult<(StatusCode, Json<LeaseDto>)> {
    require(&user, Permission::LeaseAdd)?;
    let lease = LeaseService::new(state.scope(&user))
        .add(Lease::try_from(dto)?)
        .await?;
    let repository = LeaseRepository::new(state.scope(&user));
    Ok((StatusCode::CREATED, Json(lease_response(&repository, lease).await?)))
}

/// PUT /leases/{id}
/// Header fields and properties; the other collections have their own routes
pub async fn update_lease<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path(id): Path<Id>,
    RequestJson(dto): RequestJson<LeaseDto>,
) -> ApiResult<Json<LeaseDto>> {
    require(&user, Permission::LeaseEdit)?;
    let submitted = require_token(dto.row_version)?;
    let mut lease = Lease::try_from(dto)?;
    lease.id = id;
    let lease = LeaseService::new(state.scope(&user))
        .update(lease, submitted)
        .await?;
    let repository = LeaseRepository::new(state.scope(&user));
    Ok(Json(lease_response(&repository, lease).await?))
}

/// PUT /leases/{id}/tenants
pub async fn update_lease_tenants<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path(id): Path<Id>,
    RequestJson(body): RequestJson<LeaseTenantsDto>,
) -> ApiResult<Json<LeaseDto>> {
    require(&user, Permission::LeaseEdit)?;
    let tenants = tenants_into_model(body.tenants)?;
    let lease = LeaseService::new(state.scope(&user))
        .update_tenants(id, require_token(body.row_version)?, tenants)
        .await?;
    let repository = LeaseRepository::new(state.scope(&user));
    Ok(Json(lease_response(&repository, lease).await?))
}

/// PUT /leases/{id}/improvements
pub async fn update_lease_improvements<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path(id): Path<Id>,
    RequestJson(body): RequestJson<LeaseImprovementsDto>,
) -> ApiResult<Json<LeaseDto>> {
    require(&user, Permission::LeaseEdit)?;
    let improvements = body.improvements.into_iter().map(Into::into).collect();
    let lease = LeaseService::new(state.scope(&user))
        .update_improvements(id, require_token(body.row_version)?, improvements)
        .await?;
    let repository = LeaseRepository::new(state.scope(&user));
    Ok(Json(lease_response(&repository, lease).await?))
}

/// PUT /leases/{id}/insurances
pub async fn update_lease_insurances<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path(id): Path<Id>,
    RequestJson(body): RequestJson<LeaseInsurancesDto>,
) -> ApiResult<Json<LeaseDto>> {
    require(&user, Permission::LeaseEdit)?;
    let insurances = body.insurances.into_iter().map(Into::into).collect();
    let lease = LeaseService::new(state.scope(&user))
        .update_insurances(id, require_token(body.row_version)?, insurances)
        .await?;
    let repository = LeaseRepository::new(state.scope(&user));
    Ok(Json(lease_response(&repository, lease).await?))
}

/// POST /leases/{id}/terms
pub async fn add_lease_term<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path(id): Path<Id>,
    RequestJson(guard): RequestJson<ParentGuardDto<LeaseTermDto>>,
) -> ApiResult<(StatusCode, Json<LeaseDto>)> {
    require(&user, Permission::LeaseEdit)?;
    let guard = guard_into_model(guard, |dto| Ok(LeaseTerm::from(dto)))?;
    let lease = LeaseService::new(state.scope(&user))
        .add_term(id, guard)
        .await?;
    let repository = LeaseRepository::new(state.scope(&user));
    Ok((StatusCode::CREATED, Json(lease_response(&repository, lease).await?)))
}

/// PUT /leases/{id}/terms/{term_id}
pub async fn update_lease_term<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path((id, term_id)): Path<(Id, Id)>,
    RequestJson(guard): RequestJson<ParentGuardDto<LeaseTermDto>>,
) -> ApiResult<Json<LeaseDto>> {
    require(&user, Permission::LeaseEdit)?;
    let mut guard = guard_into_model(guard, |dto| Ok(LeaseTerm::from(dto)))?;
    guard.payload.id = term_id;
    let lease = LeaseService::new(state.scope(&user))
        .update_term(id, guard)
        .await?;
    let repository = LeaseRepository::new(state.scope(&user));
    Ok(Json(lease_response(&repository, lease).await?))
}

/// DELETE /leases/{id}/terms/{term_id}
pub async fn delete_lease_term<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path((id, term_id)): Path<(Id, Id)>,
    RequestJson(guard): RequestJson<ParentGuardDto<LeaseTermDto>>,
) -> ApiResult<Json<LeaseDto>> {
    require(&user, Permission::LeaseEdit)?;
    let mut guard = guard_into_model(guard, |dto| Ok(LeaseTerm::from(dto)))?;
    guard.payload.id = term_id;
    let lease = LeaseService::new(state.scope(&user))
        .delete_term(id, guard)
        .await?;
    let repository = LeaseRepository::new(state.scope(&user));
    Ok(Json(lease_response(&repository, lease).await?))
}

/// POST /leases/{id}/terms/{term_id}/payments
pub async fn add_lease_payment<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path((id, term_id)): Path<(Id, Id)>,
    RequestJson(guard): RequestJson<ParentGuardDto<LeasePaymentDto>>,
) -> ApiResult<(StatusCode, Json<LeaseDto>)> {
    require(&user, Permission::LeaseEdit)?;
    let guard = guard_into_model(guard, |dto| Ok(LeasePayment::from(dto)))?;
    let lease = LeaseService::new(state.scope(&user))
        .add_payment(id, term_id, guard)
        .await?;
    let repository = LeaseRepository::new(state.scope(&user));
    Ok((StatusCode::CREATED, Json(lease_response(&repository, lease).await?)))
}

/// PUT /leases/{id}/terms/{term_id}/payments/{payment_id}
pub async fn update_lease_payment<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path((id, term_id, payment_id)): Path<(Id, Id, Id)>,
    RequestJson(guard): RequestJson<ParentGuardDto<LeasePaymentDto>>,
) -> ApiResult<Json<LeaseDto>> {
    require(&user, Permission::LeaseEdit)?;
    let mut guard = guard_into_model(guard, |dto| Ok(LeasePayment::from(dto)))?;
    guard.payload.id = payment_id;
    let lease = LeaseService::new(state.scope(&user))
        .update_payment(id, term_id, guard)
        .await?;
    let repository = LeaseRepository::new(state.scope(&user));
    Ok(Json(lease_response(&repository, lease).await?))
}

/// DELETE /leases/{id}/terms/{term_id}/payments/{payment_id}
pub async fn delete_lease_payment<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path((id, term_id, payment_id)): Path<(Id, Id, Id)>,
    RequestJson(guard): RequestJson<ParentGuardDto<LeasePaymentDto>>,
) -> ApiResult<Json<LeaseDto>> {
    require(&user, Permission::LeaseEdit)?;
    let mut guard = guard_into_model(guard, |dto| Ok(LeasePayment::from(dto)))?;
    guard.payload.id = payment_id;
    let lease = LeaseService::new(state.scope(&user))
        .delete_payment(id, term_id, guard)
        .await?;
    let repository = LeaseRepository::new(state.scope(&user));
    Ok(Json(lease_response(&repository, lease).await?))
}

/// GET /leases/{id}/activities
pub async fn list_lease_activities<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path(id): Path<Id>,
) -> ApiResult<Json<Vec<ActivityDto>>> {
    require(&user, Permission::ActivityView)?;
    let activities = ActivityRepository::new(state.scope(&user))
        .list_for_file(FileKind::Lease, id)
        .await?;
    Ok(Json(activities.into_iter().map(Into::into).collect()))
}
