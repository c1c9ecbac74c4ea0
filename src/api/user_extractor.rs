use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, StatusCode},
};
use crate::model::{Permission, UserContext};

/// Axum extractor for UserContext from request headers
///
/// Tokens are validated by the gateway in front of this service, which
/// forwards the principal as headers:
/// - X-User-Id: user identifier
/// - X-User-Email: optional email
/// - X-User-Name: optional display name
/// - X-User-Permissions: comma-separated capability tags
///
/// Without X-User-Id the caller is anonymous and holds no capabilities.
#[async_trait]
impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let headers = &parts.headers;

        let Some(user_id) = extract_header_value(headers, "x-user-id") else {
            return Ok(UserContext::anonymous());
        };
        let user_email = extract_header_value(headers, "x-user-email");
        let user_name = extract_header_value(headers, "x-user-name");
        let permissions = extract_header_value(headers, "x-user-permissions")
            .map(|raw| parse_permissions(&raw))
            .unwrap_or_default();

        Ok(UserContext::with_details(user_id, user_email, user_name).with_permissions(permissions))
    }
}

/// Extract header value as string
fn extract_header_value(headers: &HeaderMap, header_name: &str) -> Option<String> {
    headers
        .get(header_name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Unknown tags are ignored
fn parse_permissions(raw: &str) -> Vec<Permission> {
    raw.split(',')
        .filter_map(|tag| {
            let parsed = Permission::parse(tag);
            if parsed.is_none() && !tag.trim().is_empty() {
                log::debug!("Ignoring unknown capability '{}'", tag.trim());
            }
            parsed
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderName, HeaderValue, Request};

    #[test]
    fn test_extract_header_value() {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-user-id"),
            HeaderValue::from_static("test-user-123"),
        );
        headers.insert(
            HeaderName::from_static("x-user-email"),
            HeaderValue::from_static("  "),
        );

        assert_eq!(
            extract_header_value(&headers, "x-user-id"),
            Some("test-user-123".to_string())
        );
        assert_eq!(extract_header_value(&headers, "x-user-email"), None);
    }

    #[test]
    fn test_parse_permissions_skips_unknown_tags() {
        let parsed = parse_permissions("lease-view, lease-edit,,not-a-thing");
        assert_eq!(parsed, vec![Permission::LeaseView, Permission::LeaseEdit]);
    }

    #[tokio::test]
    async fn test_extracts_principal_with_permissions() {
        let request = Request::builder()
            .header("x-user-id", "jdoe")
            .header("x-user-name", "Jane Doe")
            .header("x-user-permissions", "property-view,admin-roles")
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();

        let user = UserContext::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(user.user_id, "jdoe");
        assert_eq!(user.audit_name(), "Jane Doe");
        assert!(user.has_permission(Permission::AdminRoles));
        assert!(!user.has_permission(Permission::SystemAdmin));
    }

    #[tokio::test]
    async fn test_missing_user_is_anonymous() {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        let user = UserContext::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(user, UserContext::anonymous());
    }
}
