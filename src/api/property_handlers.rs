use axum::{
    extract::{Path, Query, State},
    response::Json,
    Json as RequestJson,
};

use crate::api::dto::{PageDto, PropertyAssociationsDto, PropertyDto, PropertyQuery};
use crate::api::handlers::{ApiResult, AppState};
use crate::logic::concurrency::require_token;
use crate::logic::guard::require;
use crate::model::{Id, Permission, Property, UserContext};
use crate::repository::PropertyRepository;
use crate::store::Store;

/// GET /properties
pub async fn list_properties<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Query(query): Query<PropertyQuery>,
) -> ApiResult<Json<PageDto<PropertyDto>>> {
    require(&user, Permission::PropertyView)?;
    let (filter, page) = query.into_parts();
    let page = PropertyRepository::new(state.scope(&user))
        .get_page(&filter, page)
        .await?;
    Ok(Json(PageDto::from_page(page, PropertyDto::from)))
}

/// GET /properties/{id}
pub async fn get_property<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path(id): Path<Id>,
) -> ApiResult<Json<PropertyDto>> {
    require(&user, Permission::PropertyView)?;
    let property = PropertyRepository::new(state.scope(&user)).get(id).await?;
    Ok(Json(property.into()))
}

/// GET /properties/{id}/associations
pub async fn get_property_associations<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path(id): Path<Id>,
) -> ApiResult<Json<PropertyAssociationsDto>> {
    require(&user, Permission::PropertyView)?;
    let associations = PropertyRepository::new(state.scope(&user))
        .get_associations(id)
        .await?;
    Ok(Json(associations.into()))
}

/// PUT /properties/{id}
pub async fn update_property<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path(id): Path<Id>,
    RequestJson(dto): RequestJson<PropertyDto>,
) -> ApiResult<Json<PropertyDto>> {
    require(&user, Permission::PropertyEdit)?;
    let submitted = require_token(dto.row_version)?;
    let mut property = Property::from(dto);
    property.id = id;
    let property = PropertyRepository::new(state.scope(&user))
        .update(property, submitted)
        .await?;
    Ok(Json(property.into()))
}
