use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Claim, Id, Role, RoleClaim, RowVersion, Tenant};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimDto {
    #[serde(default)]
    pub id: Id,
    #[serde(default)]
    pub key: Uuid,
    pub name: String,
    pub keycloak_role_id: Option<Uuid>,
    pub description: Option<String>,
    #[serde(default)]
    pub is_disabled: bool,
    #[serde(default)]
    pub row_version: Option<RowVersion>,
}

impl From<Claim> for ClaimDto {
    fn from(claim: Claim) -> Self {
        Self {
            id: claim.id,
            key: claim.key,
            name: claim.name,
            keycloak_role_id: claim.keycloak_role_id,
            description: claim.description,
            is_disabled: claim.is_disabled,
            row_version: Some(claim.row_version),
        }
    }
}

impl From<ClaimDto> for Claim {
    fn from(dto: ClaimDto) -> Self {
        Self {
            id: dto.id,
            key: dto.key,
            name: dto.name,
            keycloak_role_id: dto.keycloak_role_id,
            description: dto.description,
            is_disabled: dto.is_disabled,
            row_version: dto.row_version.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleClaimDto {
    pub claim_key: Uuid,
    #[serde(default)]
    pub claim_name: String,
    #[serde(default)]
    pub is_disabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleDto {
    #[serde(default)]
    pub id: Id,
    #[serde(default)]
    pub key: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub is_disabled: bool,
    #[serde(default)]
    pub sort_order: i32,
    pub keycloak_group_id: Option<Uuid>,
    #[serde(default)]
    pub claims: Vec<RoleClaimDto>,
    #[serde(default)]
    pub row_version: Option<RowVersion>,
}

impl From<Role> for RoleDto {
    fn from(role: Role) -> Self {
        Self {
            id: role.id,
            key: role.key,
            name: role.name,
            description: role.description,
            is_public: role.is_public,
            is_disabled: role.is_disabled,
            sort_order: role.sort_order,
            keycloak_group_id: role.keycloak_group_id,
            claims: role
                .claims
                .into_iter()
                .map(|c| RoleClaimDto {
                    claim_key: c.claim_key,
                    claim_name: c.claim_name,
                    is_disabled: c.is_disabled,
                })
                .collect(),
            row_version: Some(role.row_version),
        }
    }
}

impl From<RoleDto> for Role {
    fn from(dto: RoleDto) -> Self {
        Self {
            id: dto.id,
            key: dto.key,
            name: dto.name,
            description: dto.description,
            is_public: dto.is_public,
            is_disabled: dto.is_disabled,
            sort_order: dto.sort_order,
            keycloak_group_id: dto.keycloak_group_id,
            claims: dto
                .claims
                .into_iter()
                .map(|c| RoleClaim {
                    claim_key: c.claim_key,
                    claim_name: c.claim_name,
                    is_disabled: c.is_disabled,
                })
                .collect(),
            row_version: dto.row_version.unwrap_or_default(),
        }
    }
}

/// Body of the role synchronisation call
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleKeepDto {
    pub keep: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedCountDto {
    pub removed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantDto {
    #[serde(default)]
    pub id: Id,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub settings: serde_json::Value,
    #[serde(default)]
    pub row_version: Option<RowVersion>,
}

impl From<Tenant> for TenantDto {
    fn from(tenant: Tenant) -> Self {
        Self {
            id: tenant.id,
            code: tenant.code,
            name: tenant.name,
            description: tenant.description,
            settings: tenant.settings,
            row_version: Some(tenant.row_version),
        }
    }
}

impl From<TenantDto> for Tenant {
    fn from(dto: TenantDto) -> Self {
        Self {
            id: dto.id,
            code: dto.code,
            name: dto.name,
            description: dto.description,
            settings: dto.settings,
            row_version: dto.row_version.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_role_body_needs_only_a_name() {
        let dto: RoleDto = serde_json::from_str(r#"{"name":"role1","description":null,"keycloakGroupId":null}"#).unwrap();
        let role = Role::from(dto);
        assert!(role.key.is_nil());
        assert_eq!(role.row_version, 0);
        assert!(role.claims.is_empty());
    }

    #[test]
    fn role_serializes_camel_case() {
        let dto = RoleDto {
            id: 1,
            key: Uuid::nil(),
            name: "role1".to_string(),
            description: None,
            is_public: true,
            is_disabled: false,
            sort_order: 2,
            keycloak_group_id: None,
            claims: vec![],
            row_version: Some(1),
        };
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["isPublic"], true);
        assert_eq!(json["rowVersion"], 1);
    }
}
