use std::sync::Arc;

use parking_lot::Mutex;
use pims_api::config::AppConfig;
use pims_api::external::ltsa::{LtsaClient, LtsaOrder, TitleSummary};
use pims_api::external::mayan::{
    DocumentMetadata, DocumentStorageClient, DocumentTypeMetadataType, FileDownload, Label, QueryResult,
    StorageDocument,
};
use pims_api::external::HttpClientRequestError;
use pims_api::model::{DocumentType, Organization, Person, Tenant};
use pims_api::store::{DocumentStore, LeaseStore, MemoryStore, TenantStore};
use pims_api::{build_app, AppState};
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};
use tokio::net::TcpListener;

const EVERYTHING: &str = "system-admin,admin-roles,property-view,property-edit,lease-view,lease-add,\
lease-edit,researchfile-view,researchfile-add,researchfile-edit,activity-view,activity-add,\
activity-edit,activity-delete,document-view,document-add,document-delete,document-admin";

// Test client wrapper for making API calls as one principal
struct TestClient {
    client: Client,
    base_url: String,
    user_id: String,
    permissions: String,
}

impl TestClient {
    fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            user_id: "jdoe".to_string(),
            permissions: EVERYTHING.to_string(),
        }
    }

    fn as_user(&self, user_id: &str, permissions: &str) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            user_id: user_id.to_string(),
            permissions: permissions.to_string(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header("x-user-id", &self.user_id)
            .header("x-user-name", "Jane Doe")
            .header("x-user-permissions", &self.permissions)
    }

    async fn get(&self, path: &str) -> Response {
        self.request(reqwest::Method::GET, path).send().await.unwrap()
    }

    async fn post(&self, path: &str, json: Value) -> Response {
        self.request(reqwest::Method::POST, path)
            .json(&json)
            .send()
            .await
            .unwrap()
    }

    async fn put(&self, path: &str, json: Value) -> Response {
        self.request(reqwest::Method::PUT, path)
            .json(&json)
            .send()
            .await
            .unwrap()
    }

    async fn delete(&self, path: &str, json: Value) -> Response {
        self.request(reqwest::Method::DELETE, path)
            .json(&json)
            .send()
            .await
            .unwrap()
    }
}

async fn body(response: Response) -> Value {
    response.json().await.unwrap()
}

/// Registry stub: one registered title per PID, or a canned failure
struct StubLtsa {
    fail_with: Option<u16>,
}

#[async_trait::async_trait]
impl LtsaClient for StubLtsa {
    async fn get_title_summaries(&self, pid: &str) -> Result<Vec<TitleSummary>, HttpClientRequestError> {
        if let Some(status) = self.fail_with {
            return Err(HttpClientRequestError {
                url: "http://ltsa.test/titleSummaries".to_string(),
                status: Some(status),
                body: Some("{\"errorMessages\":[\"unavailable\"]}".to_string()),
                message: format!("upstream responded with {}", status),
            });
        }
        Ok(vec![
            TitleSummary {
                title_number: "OLD1".to_string(),
                land_title_district: None,
                land_title_district_code: "VA".to_string(),
                parcel_identifier: Some(pid.to_string()),
                status: "CANCELLED".to_string(),
                first_owner: None,
            },
            TitleSummary {
                title_number: "CA1234567".to_string(),
                land_title_district: Some("VANCOUVER".to_string()),
                land_title_district_code: "VA".to_string(),
                parcel_identifier: Some(pid.to_string()),
                status: "REGISTERED".to_string(),
                first_owner: None,
            },
        ])
    }

    async fn post_title_order(
        &self,
        title_number: &str,
        land_title_district_code: &str,
    ) -> Result<LtsaOrder, HttpClientRequestError> {
        Ok(LtsaOrder {
            order_id: Some("T-1".to_string()),
            product_type: "title".to_string(),
            status: Some("Processing".to_string()),
            product_order_parameters: json!({
                "titleNumber": title_number,
                "landTitleDistrictCode": land_title_district_code,
            }),
            order_response: Value::Null,
        })
    }

    async fn post_parcel_info_order(&self, pid: &str) -> Result<LtsaOrder, HttpClientRequestError> {
        Ok(LtsaOrder {
            order_id: Some("P-1".to_string()),
            product_type: "parcelInfo".to_string(),
            status: Some("Completed".to_string()),
            product_order_parameters: json!({ "parcelIdentifier": pid }),
            order_response: Value::Null,
        })
    }
}

/// What the storage stub was asked to do
#[derive(Default)]
struct StorageLog {
    uploaded: Mutex<Vec<String>>,
    deleted: Mutex<Vec<i64>>,
    metadata: Mutex<Vec<(i64, i64, String)>>,
}

struct StubStorage {
    log: Arc<StorageLog>,
}

fn storage_unavailable(url: &str) -> HttpClientRequestError {
    HttpClientRequestError {
        url: url.to_string(),
        status: Some(503),
        body: Some("storage offline".to_string()),
        message: "upstream responded with 503".to_string(),
    }
}

#[async_trait::async_trait]
impl DocumentStorageClient for StubStorage {
    async fn upload_document(
        &self,
        document_type_id: i64,
        file_name: &str,
        _contents: Vec<u8>,
    ) -> Result<StorageDocument, HttpClientRequestError> {
        let id = {
            let mut uploaded = self.log.uploaded.lock();
            uploaded.push(file_name.to_string());
            500 + uploaded.len() as i64
        };
        Ok(StorageDocument {
            id,
            label: file_name.to_string(),
            document_type: Label {
                id: document_type_id,
                label: "Survey plan".to_string(),
            },
            file_latest: None,
        })
    }

    async fn delete_document(&self, document_id: i64) -> Result<(), HttpClientRequestError> {
        self.log.deleted.lock().push(document_id);
        Ok(())
    }

    async fn get_document_type_metadata(
        &self,
        _document_type_id: i64,
    ) -> Result<QueryResult<DocumentTypeMetadataType>, HttpClientRequestError> {
        Err(storage_unavailable("http://storage.test/document_types/1/metadata_types/"))
    }

    async fn get_document_metadata(
        &self,
        _document_id: i64,
    ) -> Result<QueryResult<DocumentMetadata>, HttpClientRequestError> {
        Ok(QueryResult {
            count: 0,
            next: None,
            previous: None,
            results: vec![],
        })
    }

    async fn add_document_metadata(
        &self,
        document_id: i64,
        metadata_type_id: i64,
        value: &str,
    ) -> Result<DocumentMetadata, HttpClientRequestError> {
        self.log
            .metadata
            .lock()
            .push((document_id, metadata_type_id, value.to_string()));
        Err(storage_unavailable("http://storage.test/documents/1/metadata/"))
    }

    async fn download_file(&self, _document_id: i64, _file_id: i64) -> Result<FileDownload, HttpClientRequestError> {
        Ok(FileDownload::new("survey.pdf".to_string(), Some("application/pdf".to_string()), b"%PDF"))
    }

    async fn download_latest_file(&self, document_id: i64) -> Result<FileDownload, HttpClientRequestError> {
        self.download_file(document_id, 1).await
    }
}

struct TestApp {
    client: TestClient,
    store: Arc<MemoryStore>,
    storage: Arc<StorageLog>,
}

async fn spawn_app_with(tenant: Option<&str>, ltsa: StubLtsa) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let storage = Arc::new(StorageLog::default());

    let mut config = AppConfig::default();
    config.pims.tenant = tenant.map(str::to_string);
    config.auth.client_id = "pims-api".to_string();

    let state = AppState::new(
        store.clone(),
        config,
        Arc::new(ltsa),
        Arc::new(StubStorage { log: storage.clone() }),
    );
    let app = build_app(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        client: TestClient::new(format!("http://{}", address)),
        store,
        storage,
    }
}

async fn spawn_app() -> TestApp {
    spawn_app_with(None, StubLtsa { fail_with: None }).await
}

#[tokio::test]
async fn health_is_public() {
    let app = spawn_app().await;
    let response = app.client.as_user("anyone", "").get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body(response).await["status"], "healthy");
}

#[tokio::test]
async fn created_role_is_fetched_by_key_with_first_version() {
    let app = spawn_app().await;

    let response = app.client.post("/v1/admin/roles", json!({ "name": "role1" })).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body(response).await;
    let key = created["key"].as_str().unwrap().to_string();

    let fetched = body(app.client.get(&format!("/v1/admin/roles/{}", key)).await).await;
    assert_eq!(fetched["name"], "role1");
    assert_eq!(fetched["rowVersion"], 1);

    let by_name = app.client.get("/admin/roles/name/role1").await;
    assert_eq!(by_name.status(), StatusCode::OK);
    assert_eq!(body(by_name).await["key"], key.as_str());
}

#[tokio::test]
async fn stale_role_update_is_a_conflict_and_changes_nothing() {
    let app = spawn_app().await;
    let created = body(app.client.post("/admin/roles", json!({ "name": "role1" })).await).await;
    let key = created["key"].as_str().unwrap().to_string();
    let path = format!("/admin/roles/{}", key);

    let updated = app
        .client
        .put(&path, json!({ "name": "role1-renamed", "rowVersion": 1 }))
        .await;
    assert_eq!(updated.status(), StatusCode::OK);
    let updated = body(updated).await;
    assert_eq!(updated["rowVersion"], 2);

    let stale = app
        .client
        .put(&path, json!({ "name": "lost update", "rowVersion": 1 }))
        .await;
    assert_eq!(stale.status(), StatusCode::CONFLICT);
    let error = body(stale).await;
    assert_eq!(error["code"], "CONCURRENCY_CONFLICT");
    assert_eq!(error["details"]["currentRowVersion"], 2);

    let current = body(app.client.get(&path).await).await;
    assert_eq!(current["name"], "role1-renamed");
    assert_eq!(current["rowVersion"], 2);
}

#[tokio::test]
async fn role_page_quantity_is_clamped() {
    let app = spawn_app().await;
    for i in 0..3 {
        app.client
            .post("/admin/roles", json!({ "name": format!("role{}", i) }))
            .await;
    }

    let page = body(app.client.get("/admin/roles?page=1&quantity=51").await).await;
    assert_eq!(page["quantity"], 50);
    assert_eq!(page["page"], 1);
    assert_eq!(page["total"], 3);
    assert_eq!(page["items"].as_array().unwrap().len(), 3);

    let page = body(app.client.get("/admin/roles?page=0&quantity=2&name=ROLE").await).await;
    assert_eq!(page["page"], 1);
    assert_eq!(page["items"].as_array().unwrap().len(), 2);
    assert_eq!(page["total"], 3);
}

#[tokio::test]
async fn missing_capability_is_forbidden() {
    let app = spawn_app().await;
    let viewer = app.client.as_user("viewer", "property-view");

    let response = viewer.post("/admin/roles", json!({ "name": "role1" })).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body(response).await["code"], "FORBIDDEN");

    let anonymous = app.client.as_user("", "");
    assert_eq!(
        anonymous.get("/properties").await.status(),
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn service_account_may_list_roles_without_admin_roles() {
    let app = spawn_app().await;
    let service = app.client.as_user("service-account-pims-api", "");
    assert_eq!(service.get("/admin/roles").await.status(), StatusCode::OK);
    assert_eq!(
        service.post("/admin/roles", json!({ "name": "x" })).await.status(),
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn configured_tenant_settings_are_returned() {
    let app = spawn_app_with(Some("MOTI"), StubLtsa { fail_with: None }).await;
    app.store
        .insert_tenant(Tenant {
            id: 0,
            code: "MOTI".to_string(),
            name: "Ministry".to_string(),
            description: None,
            settings: json!({ "help": { "email": "help@example.gov" } }),
            row_version: 0,
        })
        .await
        .unwrap();

    let response = app.client.as_user("anyone", "").get("/tenants").await;
    assert_eq!(response.status(), StatusCode::OK);
    let tenant = body(response).await;
    assert_eq!(tenant["code"], "MOTI");
    assert_eq!(tenant["settings"]["help"]["email"], "help@example.gov");
}

#[tokio::test]
async fn unconfigured_or_absent_tenant_is_no_content() {
    let app = spawn_app().await;
    assert_eq!(app.client.get("/tenants").await.status(), StatusCode::NO_CONTENT);

    let app = spawn_app_with(Some("NOPE"), StubLtsa { fail_with: None }).await;
    assert_eq!(app.client.get("/v1/tenants").await.status(), StatusCode::NO_CONTENT);
}

async fn create_lease(app: &TestApp) -> Value {
    let response = app
        .client
        .post(
            "/leases",
            json!({
                "status": "ACTIVE",
                "purpose": "Parking",
                "properties": [{ "pid": 1505360 }]
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body(response).await
}

#[tokio::test]
async fn lease_tenant_update_adds_person_and_organization() {
    let app = spawn_app().await;
    let person = app
        .store
        .insert_person(Person {
            id: 0,
            first_name: "Jane".to_string(),
            surname: "Smith".to_string(),
        })
        .await
        .unwrap();
    let organization = app
        .store
        .insert_organization(Organization {
            id: 0,
            name: "Coastal Holdings".to_string(),
        })
        .await
        .unwrap();

    let lease = create_lease(&app).await;
    let id = lease["id"].as_i64().unwrap();
    let version = lease["rowVersion"].as_i64().unwrap();
    assert!(lease["lFileNo"].as_str().unwrap().starts_with("L-"));

    let response = app
        .client
        .put(
            &format!("/leases/{}/tenants", id),
            json!({
                "rowVersion": version,
                "tenants": [
                    { "personId": person.id },
                    { "organizationId": organization.id }
                ]
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body(response).await;
    let tenants = updated["tenants"].as_array().unwrap();
    assert_eq!(tenants.len(), 2);
    assert_eq!(tenants[0]["personId"], person.id);
    assert_eq!(tenants[0]["name"], "Jane Smith");
    assert_eq!(tenants[1]["organizationId"], organization.id);
    assert!(tenants.iter().all(|t| t["id"].as_i64().unwrap() > 0));
    assert_ne!(updated["rowVersion"], version);

    let filtered = body(app.client.get("/leases?tenantName=coastal").await).await;
    assert_eq!(filtered["total"], 1);
}

#[tokio::test]
async fn tenant_with_both_parties_is_rejected() {
    let app = spawn_app().await;
    let lease = create_lease(&app).await;
    let id = lease["id"].as_i64().unwrap();

    let response = app
        .client
        .put(
            &format!("/leases/{}/tenants", id),
            json!({
                "rowVersion": lease["rowVersion"],
                "tenants": [{ "personId": 1, "organizationId": 1 }]
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn term_with_payments_cannot_be_deleted() {
    let app = spawn_app().await;
    let lease = create_lease(&app).await;
    let id = lease["id"].as_i64().unwrap();
    let term = json!({ "startDate": "2024-01-01", "status": "ACTIVE" });

    let with_term = body(
        app.client
            .post(
                &format!("/leases/{}/terms", id),
                json!({ "payload": term, "parentId": id, "parentRowVersion": lease["rowVersion"] }),
            )
            .await,
    )
    .await;
    let term_id = with_term["terms"][0]["id"].as_i64().unwrap();

    let with_payment = app
        .client
        .post(
            &format!("/leases/{}/terms/{}/payments", id, term_id),
            json!({
                "payload": {
                    "receivedDate": "2024-02-01",
                    "amountTotal": 1500.0,
                    "paymentMethod": "CHEQUE"
                },
                "parentId": id,
                "parentRowVersion": with_term["rowVersion"]
            }),
        )
        .await;
    assert_eq!(with_payment.status(), StatusCode::CREATED);
    let with_payment = body(with_payment).await;
    assert_eq!(with_payment["terms"][0]["payments"].as_array().unwrap().len(), 1);

    let refused = app
        .client
        .delete(
            &format!("/leases/{}/terms/{}", id, term_id),
            json!({ "payload": term, "parentId": id, "parentRowVersion": with_payment["rowVersion"] }),
        )
        .await;
    assert_eq!(refused.status(), StatusCode::BAD_REQUEST);

    let stale = app
        .client
        .post(
            &format!("/leases/{}/terms", id),
            json!({ "payload": term, "parentId": id, "parentRowVersion": lease["rowVersion"] }),
        )
        .await;
    assert_eq!(stale.status(), StatusCode::CONFLICT);

    let mismatched = app
        .client
        .post(
            &format!("/leases/{}/terms", id),
            json!({ "payload": term, "parentId": id + 1, "parentRowVersion": with_payment["rowVersion"] }),
        )
        .await;
    assert_eq!(mismatched.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn research_file_links_new_parcels_into_the_inventory() {
    let app = spawn_app().await;
    let response = app
        .client
        .post(
            "/researchFiles",
            json!({
                "name": "Highway 1 widening",
                "roadName": "Trans-Canada",
                "properties": [{ "pid": 1505360, "propertyName": "Lot 1" }]
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let file = body(response).await;
    let id = file["id"].as_i64().unwrap();
    assert_eq!(file["fileNumber"], format!("R-{}", id));
    assert_eq!(file["status"], "ACTIVE");
    let property_id = file["properties"][0]["propertyId"].as_i64().unwrap();

    let properties = body(app.client.get("/properties?pid=001-505-360").await).await;
    assert_eq!(properties["total"], 1);
    assert_eq!(properties["items"][0]["pidFormatted"], "001-505-360");

    let associations = body(
        app.client
            .get(&format!("/properties/{}/associations", property_id))
            .await,
    )
    .await;
    assert_eq!(associations["researchAssociations"][0]["id"], id);

    let found = body(app.client.get("/researchFiles?roadOrAlias=trans").await).await;
    assert_eq!(found["total"], 1);
}

#[tokio::test]
async fn activity_properties_must_belong_to_the_research_file() {
    let app = spawn_app().await;
    let file = body(
        app.client
            .post(
                "/researchFiles",
                json!({ "name": "File", "properties": [{ "pid": 111 }] }),
            )
            .await,
    )
    .await;
    let file_id = file["id"].as_i64().unwrap();
    let link_id = file["properties"][0]["id"].as_i64().unwrap();

    let response = app
        .client
        .post(
            "/activities",
            json!({
                "templateCode": "GEN",
                "status": "NOSTART",
                "fileKind": "research",
                "fileId": file_id,
                "researchPropertyIds": [link_id]
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let activity = body(response).await;
    let activity_id = activity["id"].as_i64().unwrap();

    let rejected = app
        .client
        .put(
            &format!("/activities/{}/properties", activity_id),
            json!({ "rowVersion": activity["rowVersion"], "researchPropertyIds": [link_id + 1000] }),
        )
        .await;
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);

    let listed = body(
        app.client
            .get(&format!("/researchFiles/{}/activities", file_id))
            .await,
    )
    .await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let deleted = app
        .client
        .delete(
            &format!("/activities/{}", activity_id),
            json!({ "rowVersion": activity["rowVersion"] }),
        )
        .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        app.client
            .get(&format!("/activities/{}", activity_id))
            .await
            .status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn ltsa_orders_title_for_the_active_title() {
    let app = spawn_app().await;
    let response = app.client.get("/v1/tools/ltsa/all?pid=1-505-360").await;
    assert_eq!(response.status(), StatusCode::OK);
    let orders = body(response).await;
    let titles = orders["titleOrders"].as_array().unwrap();
    assert_eq!(titles.len(), 1);
    assert_eq!(titles[0]["productOrderParameters"]["titleNumber"], "CA1234567");
    assert_eq!(
        orders["parcelInfo"]["productOrderParameters"]["parcelIdentifier"],
        "001505360"
    );
}

#[tokio::test]
async fn ltsa_failure_surfaces_as_bad_gateway() {
    let app = spawn_app_with(None, StubLtsa { fail_with: Some(503) }).await;
    let response = app.client.get("/tools/ltsa/all?pid=001505360").await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let error = body(response).await;
    assert_eq!(error["code"], "UPSTREAM_REQUEST_FAILED");
    assert_eq!(error["details"]["status"], 503);

    let invalid = app.client.get("/tools/ltsa/all?pid=abc").await;
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn uploaded_document_is_linked_and_removed_with_its_last_link() {
    let app = spawn_app().await;
    let document_type = app
        .store
        .insert_document_type(DocumentType {
            id: 0,
            code: "SURVEY".to_string(),
            description: "Survey plan".to_string(),
            mayan_id: 1,
        })
        .await
        .unwrap();
    let lease = create_lease(&app).await;
    let lease_id = lease["id"].as_i64().unwrap();

    let form = reqwest::multipart::Form::new()
        .text("documentTypeId", document_type.id.to_string())
        .text("documentTypeMayanId", "1")
        .text("documentStatusCode", "FINAL")
        .text("DocumentMetadata[0].MetadataTypeId", "7")
        .text("DocumentMetadata[0].Value", "Jane")
        .part(
            "file",
            reqwest::multipart::Part::bytes(b"%PDF-1.4".to_vec()).file_name("survey.pdf"),
        );
    let response = app
        .client
        .request(
            reqwest::Method::POST,
            &format!("/documents/upload/lease/{}", lease_id),
        )
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let uploaded = body(response).await;
    let relationship = &uploaded["documentRelationship"];
    assert_eq!(relationship["document"]["fileName"], "survey.pdf");
    assert_eq!(relationship["document"]["statusCode"], "FINAL");
    assert_eq!(
        relationship["document"]["checksum"].as_str().unwrap().len(),
        64
    );
    // The stub refuses metadata; the upload still succeeds
    assert_eq!(uploaded["documentMetadataErrors"].as_array().unwrap().len(), 1);
    assert_eq!(app.storage.metadata.lock().len(), 1);

    let listed = body(app.client.get(&format!("/documents/lease/{}", lease_id)).await).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let deleted = app
        .client
        .delete("/documents/lease", json!({ "id": relationship["id"] }))
        .await;
    assert_eq!(deleted.status(), StatusCode::OK);
    assert_eq!(body(deleted).await["deleted"], true);
    assert_eq!(app.storage.deleted.lock().len(), 1);

    let listed = body(app.client.get(&format!("/documents/lease/{}", lease_id)).await).await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn storage_proxy_failures_are_reported_in_band() {
    let app = spawn_app().await;
    let response = app.client.get("/documents/storage/types/1/metadata").await;
    assert_eq!(response.status(), StatusCode::OK);
    let result = body(response).await;
    assert_eq!(result["status"], "Error");
    assert_eq!(result["message"], "storage offline");

    let download = body(app.client.get("/documents/storage/501/download").await).await;
    assert_eq!(download["status"], "Success");
    assert_eq!(download["payload"]["filePdfBase64"], "JVBERg==");
}

#[tokio::test]
async fn delete_without_row_version_is_rejected() {
    let app = spawn_app().await;
    let created = body(app.client.post("/admin/roles", json!({ "name": "role1" })).await).await;
    let path = format!("/admin/roles/{}", created["key"].as_str().unwrap());

    let response = app.client.delete(&path, json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.client.get(&path).await.status(), StatusCode::OK);

    let response = app.client.delete(&path, json!({ "rowVersion": 1 })).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(app.client.get(&path).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stale_file_writes_add_no_parcels() {
    let app = spawn_app().await;
    let lease = create_lease(&app).await;
    let before = body(app.client.get("/properties").await).await["total"].clone();

    let response = app
        .client
        .put(
            &format!("/leases/{}", lease["id"]),
            json!({
                "status": "ACTIVE",
                "rowVersion": 99,
                "properties": [{ "pid": 999888777 }]
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let file = body(
        app.client
            .post("/researchFiles", json!({ "name": "Highway 1 widening" }))
            .await,
    )
    .await;
    let response = app
        .client
        .put(
            &format!("/researchFiles/{}/properties", file["id"]),
            json!({ "rowVersion": 99, "properties": [{ "pin": 4242 }] }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let after = body(app.client.get("/properties").await).await;
    assert_eq!(after["total"], before);

    let response = app
        .client
        .put(
            &format!("/leases/{}", lease["id"]),
            json!({
                "status": "ACTIVE",
                "rowVersion": lease["rowVersion"],
                "properties": [{ "pid": 999888777 }]
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let found = body(app.client.get("/properties?pid=999-888-777").await).await;
    assert_eq!(found["total"], 1);
}

#[tokio::test]
async fn update_without_row_version_is_rejected() {
    let app = spawn_app().await;
    let lease = create_lease(&app).await;
    let id = lease["id"].as_i64().unwrap();

    let response = app
        .client
        .put(&format!("/leases/{}", id), json!({ "status": "INACTIVE" }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(response).await["code"], "VALIDATION_ERROR");

    let response = app
        .client
        .put(&format!("/leases/{}/tenants", id), json!({ "tenants": [] }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let stored = body(app.client.get(&format!("/leases/{}", id)).await).await;
    assert_eq!(stored["status"], "ACTIVE");
    assert_eq!(stored["rowVersion"], lease["rowVersion"]);
}

#[tokio::test]
async fn pid_longer_than_nine_digits_is_rejected() {
    let app = spawn_app().await;
    let response = app
        .client
        .post(
            "/leases",
            json!({ "status": "ACTIVE", "properties": [{ "pid": 1234567890 }] }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(response).await["code"], "VALIDATION_ERROR");
    assert_eq!(body(app.client.get("/properties").await).await["total"], 0);
}

#[tokio::test]
async fn duplicate_claim_or_role_key_is_rejected() {
    let app = spawn_app().await;
    let key = "7c9e6679-7425-40de-944b-e07fc1f90ae7";

    let first = app.client.post("/admin/claims", json!({ "key": key, "name": "claim1" })).await;
    assert_eq!(first.status(), StatusCode::CREATED);
    let second = app.client.post("/admin/claims", json!({ "key": key, "name": "claim2" })).await;
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(second).await["code"], "VALIDATION_ERROR");

    let first = app.client.post("/admin/roles", json!({ "key": key, "name": "role1" })).await;
    assert_eq!(first.status(), StatusCode::CREATED);
    let second = app.client.post("/admin/roles", json!({ "key": key, "name": "role2" })).await;
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);

    let stored = body(app.client.get(&format!("/admin/claims/{}", key)).await).await;
    assert_eq!(stored["name"], "claim1");
}
