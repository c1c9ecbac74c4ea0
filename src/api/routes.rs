use axum::{
    routing::{get, post, put},
    Router,
};

use crate::api::{
    activity_handlers, admin_handlers, document_handlers, handlers, lease_handlers,
    property_handlers, research_file_handlers, tool_handlers, AppState,
};
use crate::store::traits::Store;

/// Every API route, served both under `/v1` and unversioned.
pub fn create_router<S: Store + 'static>() -> Router<AppState<S>> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_routes::<S>())
        .merge(api_routes::<S>())
}

fn api_routes<S: Store + 'static>() -> Router<AppState<S>> {
    Router::new()
        // Claims
        .route(
            "/admin/claims",
            get(admin_handlers::list_claims::<S>).post(admin_handlers::add_claim::<S>),
        )
        .route(
            "/admin/claims/:key",
            get(admin_handlers::get_claim::<S>)
                .put(admin_handlers::update_claim::<S>)
                .delete(admin_handlers::delete_claim::<S>),
        )
        // Roles
        .route(
            "/admin/roles",
            get(admin_handlers::list_roles::<S>).post(admin_handlers::add_role::<S>),
        )
        .route("/admin/roles/sync", post(admin_handlers::sync_roles::<S>))
        .route(
            "/admin/roles/name/:name",
            get(admin_handlers::get_role_by_name::<S>),
        )
        .route(
            "/admin/roles/group/:group_id",
            get(admin_handlers::get_role_by_group::<S>),
        )
        .route(
            "/admin/roles/:key",
            get(admin_handlers::get_role::<S>)
                .put(admin_handlers::update_role::<S>)
                .delete(admin_handlers::delete_role::<S>),
        )
        // Tenants
        .route("/tenants", get(admin_handlers::get_tenant::<S>))
        .route("/tenants/:code", put(admin_handlers::update_tenant::<S>))
        // Properties
        .route("/properties", get(property_handlers::list_properties::<S>))
        .route(
            "/properties/:id",
            get(property_handlers::get_property::<S>).put(property_handlers::update_property::<S>),
        )
        .route(
            "/properties/:id/associations",
            get(property_handlers::get_property_associations::<S>),
        )
        // Research files
        .route(
            "/researchFiles",
            get(research_file_handlers::list_research_files::<S>)
                .post(research_file_handlers::add_research_file::<S>),
        )
        .route(
            "/researchFiles/:id",
            get(research_file_handlers::get_research_file::<S>)
                .put(research_file_handlers::update_research_file::<S>),
        )
        .route(
            "/researchFiles/:id/properties",
            put(research_file_handlers::update_research_file_properties::<S>),
        )
        .route(
            "/researchFiles/:id/properties/:property_file_id",
            put(research_file_handlers::update_research_file_property::<S>),
        )
        .route(
            "/researchFiles/:id/activities",
            get(research_file_handlers::list_research_file_activities::<S>),
        )
        // Leases
        .route(
            "/leases",
            get(lease_handlers::list_leases::<S>).post(lease_handlers::add_lease::<S>),
        )
        .route(
            "/leases/:id",
            get(lease_handlers::get_lease::<S>).put(lease_handlers::update_lease::<S>),
        )
        .route("/leases/:id/tenants", put(lease_handlers::update_lease_tenants::<S>))
        .route(
            "/leases/:id/improvements",
            put(lease_handlers::update_lease_improvements::<S>),
        )
        .route(
            "/leases/:id/insurances",
            put(lease_handlers::update_lease_insurances::<S>),
        )
        .route("/leases/:id/terms", post(lease_handlers::add_lease_term::<S>))
        .route(
            "/leases/:id/terms/:term_id",
            put(lease_handlers::update_lease_term::<S>).delete(lease_handlers::delete_lease_term::<S>),
        )
        .route(
            "/leases/:id/terms/:term_id/payments",
            post(lease_handlers::add_lease_payment::<S>),
        )
        .route(
            "/leases/:id/terms/:term_id/payments/:payment_id",
            put(lease_handlers::update_lease_payment::<S>)
                .delete(lease_handlers::delete_lease_payment::<S>),
        )
        .route(
            "/leases/:id/activities",
            get(lease_handlers::list_lease_activities::<S>),
        )
        // Activities
        .route("/activities", post(activity_handlers::add_activity::<S>))
        .route(
            "/activities/:id",
            get(activity_handlers::get_activity::<S>)
                .put(activity_handlers::update_activity::<S>)
                .delete(activity_handlers::delete_activity::<S>),
        )
        .route(
            "/activities/:id/properties",
            put(activity_handlers::update_activity_properties::<S>),
        )
        // Documents
        .route("/documents/types", get(document_handlers::list_document_types::<S>))
        .route(
            "/documents/upload/:kind/:parent_id",
            post(document_handlers::upload_document::<S>),
        )
        .route(
            "/documents/metadata/:document_id",
            put(document_handlers::update_document::<S>),
        )
        .route(
            "/documents/storage/types/:mayan_type_id/metadata",
            get(document_handlers::get_storage_type_metadata::<S>),
        )
        .route(
            "/documents/storage/:mayan_document_id/metadata",
            get(document_handlers::get_storage_document_metadata::<S>),
        )
        .route(
            "/documents/storage/:mayan_document_id/download",
            get(document_handlers::download_latest_storage_file::<S>),
        )
        .route(
            "/documents/storage/:mayan_document_id/files/:file_id/download",
            get(document_handlers::download_storage_file::<S>),
        )
        .route(
            "/documents/:kind",
            axum::routing::delete(document_handlers::delete_document_relationship::<S>),
        )
        .route(
            "/documents/:kind/:parent_id",
            get(document_handlers::list_document_relationships::<S>),
        )
        // Tools
        .route("/tools/ltsa/all", get(tool_handlers::get_ltsa_orders::<S>))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::config::AppConfig;
    use crate::store::MemoryStore;

    fn app() -> axum::Router {
        let state = crate::build_state(Arc::new(MemoryStore::new()), AppConfig::default()).unwrap();
        crate::build_app(state)
    }

    async fn status_of(request: Request<Body>) -> StatusCode {
        app().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn health_is_unversioned_only() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        assert_eq!(status_of(request).await, StatusCode::OK);

        let request = Request::builder().uri("/v1/health").body(Body::empty()).unwrap();
        assert_eq!(status_of(request).await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn api_routes_answer_with_and_without_version_prefix() {
        for uri in ["/properties", "/v1/properties"] {
            let request = Request::builder()
                .uri(uri)
                .header("x-user-id", "jdoe")
                .header("x-user-permissions", "property-view")
                .body(Body::empty())
                .unwrap();
            assert_eq!(status_of(request).await, StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn unknown_document_kind_is_rejected() {
        let request = Request::builder()
            .uri("/documents/acquisition/1")
            .header("x-user-id", "jdoe")
            .header("x-user-permissions", "document-view")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::BAD_REQUEST);
    }
}
