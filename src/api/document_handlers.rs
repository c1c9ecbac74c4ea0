use std::collections::BTreeMap;

use axum::{
    extract::{Multipart, Path, State},
    response::Json,
    Json as RequestJson,
};
use serde::Deserialize;

use crate::api::dto::{
    DeletedDto, DocumentRelationshipDto, DocumentTypeDto, DocumentUpdateDto, DocumentUpdateResponseDto,
    DocumentUploadResponseDto,
};
use crate::api::handlers::{ApiResult, AppState};
use crate::error::{PimsError, PimsResult};
use crate::external::mayan::{DocumentMetadata, DocumentTypeMetadataType, FileDownload, QueryResult};
use crate::external::ExternalResult;
use crate::logic::concurrency::require_token;
use crate::logic::guard::require;
use crate::model::{FileKind, Id, Permission, UserContext};
use crate::repository::DocumentRepository;
use crate::service::{DocumentService, DocumentUploadRequest, MetadataValue};
use crate::store::Store;

fn parse_kind(kind: &str) -> PimsResult<FileKind> {
    FileKind::parse(kind).ok_or_else(|| PimsError::validation(format!("Unknown file kind '{}'", kind)))
}

fn document_service<'a, S: Store>(state: &'a AppState<S>, user: &'a UserContext) -> DocumentService<'a, S> {
    DocumentService::new(state.scope(user), state.storage.as_ref())
}

/// GET /documents/types
pub async fn list_document_types<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
) -> ApiResult<Json<Vec<DocumentTypeDto>>> {
    require(&user, Permission::DocumentView)?;
    let types = DocumentRepository::new(state.scope(&user)).get_types().await?;
    Ok(Json(types.into_iter().map(Into::into).collect()))
}

/// GET /documents/{kind}/{parent_id}
pub async fn list_document_relationships<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path((kind, parent_id)): Path<(String, Id)>,
) -> ApiResult<Json<Vec<DocumentRelationshipDto>>> {
    require(&user, Permission::DocumentView)?;
    let relationships = DocumentRepository::new(state.scope(&user))
        .get_relationships(parse_kind(&kind)?, parent_id)
        .await?;
    Ok(Json(relationships.into_iter().map(Into::into).collect()))
}

/// Multipart field names sent by the upload form
#[derive(Default)]
struct UploadForm {
    file_name: Option<String>,
    contents: Vec<u8>,
    document_type_id: Option<Id>,
    document_type_mayan_id: Option<i64>,
    status_code: Option<String>,
    metadata: BTreeMap<usize, (Option<i64>, Option<String>)>,
}

fn parse_number(field: &str, value: &str) -> PimsResult<i64> {
    value
        .trim()
        .parse()
        .map_err(|_| PimsError::validation(format!("'{}' must be a number", field)))
}

/// `DocumentMetadata[3].Value` -> (3, "Value")
fn metadata_field(name: &str) -> Option<(usize, &str)> {
    let rest = name.strip_prefix("DocumentMetadata[")?;
    let (index, field) = rest.split_once("].")?;
    Some((index.parse().ok()?, field))
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> PimsResult<Self> {
        let mut form = UploadForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| PimsError::validation(format!("Malformed upload: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "file" {
                form.file_name = field.file_name().map(str::to_string);
                form.contents = field
                    .bytes()
                    .await
                    .map_err(|e| PimsError::validation(format!("Malformed upload: {}", e)))?
                    .to_vec();
                continue;
            }
            let value = field
                .text()
                .await
                .map_err(|e| PimsError::validation(format!("Malformed upload: {}", e)))?;
            match name.as_str() {
                "documentTypeId" => form.document_type_id = Some(parse_number(&name, &value)?),
                "documentTypeMayanId" => form.document_type_mayan_id = Some(parse_number(&name, &value)?),
                "documentStatusCode" => form.status_code = Some(value),
                other => match metadata_field(other) {
                    Some((index, "MetadataTypeId")) => {
                        form.metadata.entry(index).or_default().0 = Some(parse_number(other, &value)?);
                    }
                    Some((index, "Value")) => {
                        form.metadata.entry(index).or_default().1 = Some(value);
                    }
                    _ => log::debug!("Ignoring upload field '{}'", other),
                },
            }
        }
        Ok(form)
    }

    fn into_request(self) -> PimsResult<DocumentUploadRequest> {
        let document_type_id = self
            .document_type_id
            .ok_or_else(|| PimsError::validation("documentTypeId is required"))?;
        let file_name = self
            .file_name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| PimsError::validation("An uploaded file is required"))?;
        let metadata = self
            .metadata
            .into_values()
            .filter_map(|(type_id, value)| match (type_id, value) {
                (Some(metadata_type_id), Some(value)) => Some(MetadataValue {
                    metadata_type_id,
                    value,
                }),
                _ => None,
            })
            .collect();
        Ok(DocumentUploadRequest {
            file_name,
            contents: self.contents,
            document_type_id,
            document_type_mayan_id: self.document_type_mayan_id,
            status_code: self.status_code.unwrap_or_else(|| "AMEND".to_string()),
            metadata,
        })
    }
}

/// POST /documents/upload/{kind}/{parent_id}
pub async fn upload_document<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path((kind, parent_id)): Path<(String, Id)>,
    multipart: Multipart,
) -> ApiResult<Json<DocumentUploadResponseDto>> {
    require(&user, Permission::DocumentAdd)?;
    let kind = parse_kind(&kind)?;
    let request = UploadForm::read(multipart).await?.into_request()?;
    let response = document_service(&state, &user)
        .upload(kind, parent_id, request)
        .await?;
    Ok(Json(response.into()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipRef {
    pub id: Id,
}

/// DELETE /documents/{kind}
/// Body names the relationship to remove
pub async fn delete_document_relationship<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path(kind): Path<String>,
    RequestJson(body): RequestJson<RelationshipRef>,
) -> ApiResult<Json<DeletedDto>> {
    require(&user, Permission::DocumentDelete)?;
    let deleted = document_service(&state, &user)
        .delete_relationship(parse_kind(&kind)?, body.id)
        .await?;
    Ok(Json(DeletedDto { deleted }))
}

/// PUT /documents/metadata/{document_id}
pub async fn update_document<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path(document_id): Path<Id>,
    RequestJson(body): RequestJson<DocumentUpdateDto>,
) -> ApiResult<Json<DocumentUpdateResponseDto>> {
    require(&user, Permission::DocumentAdmin)?;
    let submitted = require_token(body.row_version)?;
    let metadata = body.document_metadata.into_iter().map(Into::into).collect();
    let response = document_service(&state, &user)
        .update(document_id, submitted, body.document_status_code, metadata)
        .await?;
    Ok(Json(response.into()))
}

/// GET /documents/storage/types/{mayan_type_id}/metadata
pub async fn get_storage_type_metadata<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path(mayan_type_id): Path<i64>,
) -> ApiResult<Json<ExternalResult<QueryResult<DocumentTypeMetadataType>>>> {
    require(&user, Permission::DocumentView)?;
    let result = document_service(&state, &user)
        .get_storage_type_metadata(mayan_type_id)
        .await?;
    Ok(Json(result))
}

/// GET /documents/storage/{mayan_document_id}/metadata
pub async fn get_storage_document_metadata<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path(mayan_document_id): Path<i64>,
) -> ApiResult<Json<ExternalResult<QueryResult<DocumentMetadata>>>> {
    require(&user, Permission::DocumentView)?;
    let result = document_service(&state, &user)
        .get_storage_document_metadata(mayan_document_id)
        .await?;
    Ok(Json(result))
}

/// GET /documents/storage/{mayan_document_id}/files/{file_id}/download
pub async fn download_storage_file<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path((mayan_document_id, file_id)): Path<(i64, i64)>,
) -> ApiResult<Json<ExternalResult<FileDownload>>> {
    require(&user, Permission::DocumentView)?;
    let result = document_service(&state, &user)
        .download_file(mayan_document_id, file_id)
        .await?;
    Ok(Json(result))
}

/// GET /documents/storage/{mayan_document_id}/download
pub async fn download_latest_storage_file<S: Store>(
    State(state): State<AppState<S>>,
    user: UserContext,
    Path(mayan_document_id): Path<i64>,
) -> ApiResult<Json<ExternalResult<FileDownload>>> {
    require(&user, Permission::DocumentView)?;
    let result = document_service(&state, &user)
        .download_latest_file(mayan_document_id)
        .await?;
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_field_names_are_indexed() {
        assert_eq!(metadata_field("DocumentMetadata[0].MetadataTypeId"), Some((0, "MetadataTypeId")));
        assert_eq!(metadata_field("DocumentMetadata[12].Value"), Some((12, "Value")));
        assert_eq!(metadata_field("DocumentMetadata[x].Value"), None);
        assert_eq!(metadata_field("documentTypeId"), None);
    }

    #[test]
    fn incomplete_metadata_pairs_are_dropped() {
        let mut form = UploadForm {
            file_name: Some("survey.pdf".to_string()),
            contents: b"%PDF".to_vec(),
            document_type_id: Some(3),
            ..Default::default()
        };
        form.metadata.insert(0, (Some(7), Some("Jane".to_string())));
        form.metadata.insert(1, (Some(8), None));
        let request = form.into_request().unwrap();
        assert_eq!(
            request.metadata,
            vec![MetadataValue {
                metadata_type_id: 7,
                value: "Jane".to_string()
            }]
        );
        assert_eq!(request.status_code, "AMEND");
    }

    #[test]
    fn document_type_is_required() {
        let form = UploadForm {
            file_name: Some("survey.pdf".to_string()),
            contents: b"%PDF".to_vec(),
            ..Default::default()
        };
        assert!(matches!(form.into_request(), Err(PimsError::Validation(_))));
    }
}
