use crate::model::{
    generate_key, Claim, DocumentType, Organization, Permission, Person, Property, Role, RoleClaim,
    Tenant,
};
use crate::store::traits::Store;
use anyhow::Result;
use serde_json::json;

/// Tenant code the seed data is loaded under
pub const SEED_TENANT: &str = "MOTI";

/// Load reference data for local development. Skipped when the seed tenant
/// already exists.
pub async fn load_seed_data<S: Store>(store: &S) -> Result<()> {
    if store.get_tenant(SEED_TENANT).await?.is_some() {
        log::info!("Seed tenant '{}' exists, skipping seed data", SEED_TENANT);
        return Ok(());
    }

    load_tenant(store).await?;
    let claims = load_claims(store).await?;
    load_roles(store, &claims).await?;
    load_document_types(store).await?;
    load_parties(store).await?;
    load_properties(store).await?;

    log::info!("Seed data loaded");
    Ok(())
}

async fn load_tenant<S: Store>(store: &S) -> Result<()> {
    store
        .insert_tenant(Tenant {
            id: 0,
            code: SEED_TENANT.to_string(),
            name: "Ministry of Transportation and Infrastructure".to_string(),
            description: Some("Development tenant".to_string()),
            settings: json!({
                "help": { "mailto": { "email": "pims@example.gov", "subject": "PIMS help request" } },
                "propertyDetails": { "showSensitive": false },
            }),
            row_version: 0,
        })
        .await?;
    Ok(())
}

/// One claim per capability tag
async fn load_claims<S: Store>(store: &S) -> Result<Vec<Claim>> {
    let mut claims = Vec::with_capacity(Permission::ALL.len());
    for permission in Permission::ALL {
        let claim = store
            .insert_claim(Claim {
                id: 0,
                key: generate_key(),
                name: permission.as_str().to_string(),
                keycloak_role_id: None,
                description: None,
                is_disabled: false,
                row_version: 0,
            })
            .await?;
        claims.push(claim);
    }
    Ok(claims)
}

fn role_claims(claims: &[Claim], predicate: impl Fn(Permission) -> bool) -> Vec<RoleClaim> {
    claims
        .iter()
        .filter(|c| Permission::parse(&c.name).map_or(false, &predicate))
        .map(|c| RoleClaim {
            claim_key: c.key,
            claim_name: c.name.clone(),
            is_disabled: false,
        })
        .collect()
}

async fn load_roles<S: Store>(store: &S, claims: &[Claim]) -> Result<()> {
    let roles = [
        ("System Administrator", "Full access", 1, role_claims(claims, |_| true)),
        (
            "Viewer",
            "Read-only access",
            2,
            role_claims(claims, |p| p.as_str().ends_with("-view")),
        ),
        (
            "Lease Functional",
            "Manage leases and their documents",
            3,
            role_claims(claims, |p| {
                p.as_str().starts_with("lease-") || p.as_str().starts_with("document-") || p == Permission::PropertyView
            }),
        ),
    ];
    for (name, description, sort_order, claims) in roles {
        store
            .insert_role(Role {
                id: 0,
                key: generate_key(),
                name: name.to_string(),
                description: Some(description.to_string()),
                is_public: sort_order != 1,
                is_disabled: false,
                sort_order,
                keycloak_group_id: None,
                claims,
                row_version: 0,
            })
            .await?;
    }
    Ok(())
}

async fn load_document_types<S: Store>(store: &S) -> Result<()> {
    let types = [
        ("SURVEY", "Survey plan", 1),
        ("TITLE", "Land title search", 2),
        ("LICENSE", "License agreement", 3),
        ("CORRESPONDENCE", "Correspondence", 4),
    ];
    for (code, description, mayan_id) in types {
        store
            .insert_document_type(DocumentType {
                id: 0,
                code: code.to_string(),
                description: description.to_string(),
                mayan_id,
            })
            .await?;
    }
    Ok(())
}

async fn load_parties<S: Store>(store: &S) -> Result<()> {
    for (first_name, surname) in [("Jane", "Smith"), ("Ravi", "Patel")] {
        store
            .insert_person(Person {
                id: 0,
                first_name: first_name.to_string(),
                surname: surname.to_string(),
            })
            .await?;
    }
    store
        .insert_organization(Organization {
            id: 0,
            name: "Coastal Holdings Ltd.".to_string(),
        })
        .await?;
    Ok(())
}

async fn load_properties<S: Store>(store: &S) -> Result<()> {
    let mut property = Property::from_identifiers(Some(1505360), None);
    property.address = Some("1818 Cornwall St, Vancouver".to_string());
    property.land_area = Some(1200.0);
    property.area_unit = Some("M2".to_string());
    store.insert_property(property).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PageRequest;
    use crate::store::{DocumentStore, MemoryStore, RoleStore, TenantStore};

    #[tokio::test]
    async fn seeding_twice_is_a_no_op() {
        let store = MemoryStore::new();
        load_seed_data(&store).await.unwrap();
        load_seed_data(&store).await.unwrap();

        let roles = store.list_roles(PageRequest::default(), None).await.unwrap();
        assert_eq!(roles.total, 3);
        assert!(store.get_tenant(SEED_TENANT).await.unwrap().is_some());
        assert_eq!(store.list_document_types().await.unwrap().len(), 4);
    }
}
