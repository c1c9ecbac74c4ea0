use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::Deserialize;

use crate::api::handlers::{ApiResult, AppState};
use crate::external::LtsaOrders;
use crate::logic::guard::require;
use crate::model::{Permission, UserContext};
use crate::service::LtsaService;
use crate::store::Store;

#[derive(Debug, Deserialize)]
pub struct PidQuery {
    pub pid: String,
}

/// GET /tools/ltsa/all?pid=
pub async fn get_ltsa_orders<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Query(query): Query<PidQuery>,
) -> ApiResult<Json<LtsaOrders>> {
    require(&user, Permission::PropertyView)?;
    let orders = LtsaService::new(state.ltsa.as_ref(), &user)
        .get_orders(&query.pid)
        .await?;
    Ok(Json(orders))
}
