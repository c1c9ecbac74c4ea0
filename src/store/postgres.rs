use anyhow::{Context, Result};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool, Row};
use uuid::Uuid;

use crate::model::{
    assign_child_ids, ActivityInstance, AssociationSummary, Claim, Document, DocumentRelationship,
    DocumentType, FileKind, Id, Lease, LeaseCollection, LeaseFilter, Organization, PageRequest,
    Paged, ParcelLink, Person, Property, PropertyAssociations, PropertyFilter, PropertyResearchFile,
    ResearchFile, ResearchFileFilter, ResearchFileStatus, Role, RowVersion, Tenant, TenantParty,
    WriteOutcome,
};
use crate::store::traits::{
    ActivityStore, ClaimStore, DocumentStore, LeaseStore, PropertyStore, ResearchFileStore,
    RoleStore, TenantStore,
};

const CLAIM_COLUMNS: &str = "id, key, name, keycloak_role_id, description, is_disabled, row_version";
const ROLE_COLUMNS: &str = "id, key, name, description, is_public, is_disabled, sort_order, keycloak_group_id, claims, row_version";
const TENANT_COLUMNS: &str = "id, code, name, description, settings, row_version";
const PROPERTY_COLUMNS: &str =
    "id, pid, pin, address, legal_description, land_area, area_unit, is_sensitive, row_version";
const RESEARCH_FILE_COLUMNS: &str = "id, file_number, name, status, road_name, road_alias, request_date, request_description, requestor, result_date, result_description, expropriation, expropriation_notes, properties, created_by, created_at, updated_by, updated_at, row_version";
const LEASE_COLUMNS: &str = "id, l_file_no, purpose, status, payment_frequency, start_date, expiry_date, amount, note, tenants, properties, improvements, insurances, terms, created_by, created_at, updated_by, updated_at, row_version";
const ACTIVITY_COLUMNS: &str = "id, template_code, status, description, file_kind, file_id, activity_data, research_property_ids, created_by, created_at, row_version";
const DOCUMENT_COLUMNS: &str = "id, mayan_document_id, document_type_id, status_code, file_name, checksum, created_by, created_at, row_version";

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Reserve `count` ids for child records
    async fn next_child_ids(&self, count: usize) -> Result<Vec<Id>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let rows = sqlx::query("SELECT nextval('child_record_id_seq') AS id FROM generate_series(1, $1)")
            .bind(count as i64)
            .fetch_all(&self.pool)
            .await
            .context("Failed to reserve child record ids")?;
        Ok(rows.iter().map(|row| row.get::<i64, _>("id")).collect())
    }

    async fn version_by_id(&self, table: &'static str, id: Id) -> Result<Option<RowVersion>> {
        let row = sqlx::query(&format!("SELECT row_version FROM {} WHERE id = $1", table))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to read row version from {}", table))?;
        Ok(row.map(|r| r.get("row_version")))
    }

    async fn version_by_key(&self, table: &'static str, key: Uuid) -> Result<Option<RowVersion>> {
        let row = sqlx::query(&format!("SELECT row_version FROM {} WHERE key = $1", table))
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to read row version from {}", table))?;
        Ok(row.map(|r| r.get("row_version")))
    }

    async fn tenant_names(&self, lease: &Lease) -> Result<Vec<String>> {
        let mut names = Vec::with_capacity(lease.tenants.len());
        for tenant in &lease.tenants {
            let name = match tenant.party {
                TenantParty::Person { person_id } => self.get_person(person_id).await?.map(|p| p.full_name()),
                TenantParty::Organization { organization_id } => {
                    self.get_organization(organization_id).await?.map(|o| o.name)
                }
            };
            names.extend(name);
        }
        Ok(names)
    }
}

/// Row version read under a row lock held until the transaction ends
async fn locked_version(conn: &mut PgConnection, table: &'static str, id: Id) -> Result<Option<RowVersion>> {
    let row = sqlx::query(&format!("SELECT row_version FROM {} WHERE id = $1 FOR UPDATE", table))
        .bind(id)
        .fetch_optional(conn)
        .await
        .with_context(|| format!("Failed to lock row in {}", table))?;
    Ok(row.map(|r| r.get("row_version")))
}

async fn find_parcel(conn: &mut PgConnection, column: &'static str, value: i32) -> Result<Option<Property>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM properties WHERE {} = $1 ORDER BY id LIMIT 1",
        PROPERTY_COLUMNS, column
    ))
    .bind(value)
    .fetch_optional(conn)
    .await
    .with_context(|| format!("Failed to find property by {}", column))?;
    Ok(row.as_ref().map(property_from_row))
}

/// Link unlinked parcels to the inventory, adding the ones not found.
async fn link_parcels<L: ParcelLink>(conn: &mut PgConnection, links: &mut [L]) -> Result<()> {
    for link in links.iter_mut().filter(|l| !l.is_linked()) {
        let mut found = None;
        if let Some(pid) = link.pid() {
            found = find_parcel(&mut *conn, "pid", pid).await?;
        }
        if let (None, Some(pin)) = (&found, link.pin()) {
            found = find_parcel(&mut *conn, "pin", pin).await?;
        }
        let property = match found {
            Some(property) => property,
            None => {
                let row = sqlx::query(&format!(
                    "INSERT INTO properties (pid, pin, is_sensitive, row_version) VALUES ($1, $2, FALSE, 1) RETURNING {}",
                    PROPERTY_COLUMNS
                ))
                .bind(link.pid())
                .bind(link.pin())
                .fetch_one(&mut *conn)
                .await
                .context("Failed to add property")?;
                property_from_row(&row)
            }
        };
        link.link_to(&property);
    }
    Ok(())
}

/// The guarded UPDATE matched nothing: tell a missing row from a stale token.
fn missed_write<T>(current: Option<RowVersion>, submitted: RowVersion) -> WriteOutcome<T> {
    match current {
        Some(current) => WriteOutcome::Conflict { submitted, current },
        None => WriteOutcome::NotFound,
    }
}

fn claim_from_row(row: &PgRow) -> Claim {
    Claim {
        id: row.get("id"),
        key: row.get("key"),
        name: row.get("name"),
        keycloak_role_id: row.get("keycloak_role_id"),
        description: row.get("description"),
        is_disabled: row.get("is_disabled"),
        row_version: row.get("row_version"),
    }
}

fn role_from_row(row: &PgRow) -> Result<Role> {
    let claims: Json<Vec<crate::model::RoleClaim>> =
        row.try_get("claims").context("Failed to decode role claims")?;
    Ok(Role {
        id: row.get("id"),
        key: row.get("key"),
        name: row.get("name"),
        description: row.get("description"),
        is_public: row.get("is_public"),
        is_disabled: row.get("is_disabled"),
        sort_order: row.get("sort_order"),
        keycloak_group_id: row.get("keycloak_group_id"),
        claims: claims.0,
        row_version: row.get("row_version"),
    })
}

fn tenant_from_row(row: &PgRow) -> Tenant {
    Tenant {
        id: row.get("id"),
        code: row.get("code"),
        name: row.get("name"),
        description: row.get("description"),
        settings: row.get("settings"),
        row_version: row.get("row_version"),
    }
}

fn property_from_row(row: &PgRow) -> Property {
    Property {
        id: row.get("id"),
        pid: row.get("pid"),
        pin: row.get("pin"),
        address: row.get("address"),
        legal_description: row.get("legal_description"),
        land_area: row.get("land_area"),
        area_unit: row.get("area_unit"),
        is_sensitive: row.get("is_sensitive"),
        row_version: row.get("row_version"),
    }
}

fn research_file_from_row(row: &PgRow) -> Result<ResearchFile> {
    let status: String = row.get("status");
    let status = ResearchFileStatus::parse(&status)
        .ok_or_else(|| anyhow::anyhow!("Unknown research file status '{}'", status))?;
    let properties: Json<Vec<PropertyResearchFile>> = row
        .try_get("properties")
        .context("Failed to decode research file properties")?;
    Ok(ResearchFile {
        id: row.get("id"),
        file_number: row.get("file_number"),
        name: row.get("name"),
        status,
        road_name: row.get("road_name"),
        road_alias: row.get("road_alias"),
        request_date: row.get("request_date"),
        request_description: row.get("request_description"),
        requestor: row.get("requestor"),
        result_date: row.get("result_date"),
        result_description: row.get("result_description"),
        expropriation: row.get("expropriation"),
        expropriation_notes: row.get("expropriation_notes"),
        properties: properties.0,
        created_by: row.get("created_by"),
        created_at: row.get("created_at"),
        updated_by: row.get("updated_by"),
        updated_at: row.get("updated_at"),
        row_version: row.get("row_version"),
    })
}

fn lease_from_row(row: &PgRow) -> Result<Lease> {
    fn children<T: serde::de::DeserializeOwned>(row: &PgRow, column: &str) -> Result<Vec<T>> {
        let value: Json<Vec<T>> = row
            .try_get(column)
            .with_context(|| format!("Failed to decode lease {}", column))?;
        Ok(value.0)
    }

    Ok(Lease {
        id: row.get("id"),
        l_file_no: row.get("l_file_no"),
        purpose: row.get("purpose"),
        status: row.get("status"),
        payment_frequency: row.get("payment_frequency"),
        start_date: row.get("start_date"),
        expiry_date: row.get("expiry_date"),
        amount: row.get("amount"),
        note: row.get("note"),
        tenants: children(row, "tenants")?,
        properties: children(row, "properties")?,
        improvements: children(row, "improvements")?,
        insurances: children(row, "insurances")?,
        terms: children(row, "terms")?,
        created_by: row.get("created_by"),
        created_at: row.get("created_at"),
        updated_by: row.get("updated_by"),
        updated_at: row.get("updated_at"),
        row_version: row.get("row_version"),
    })
}

fn parse_file_kind(value: &str) -> Result<FileKind> {
    FileKind::parse(value).ok_or_else(|| anyhow::anyhow!("Unknown file kind '{}'", value))
}

fn activity_from_row(row: &PgRow) -> Result<ActivityInstance> {
    let file_kind: String = row.get("file_kind");
    let property_ids: Json<Vec<Id>> = row
        .try_get("research_property_ids")
        .context("Failed to decode activity property links")?;
    Ok(ActivityInstance {
        id: row.get("id"),
        template_code: row.get("template_code"),
        status: row.get("status"),
        description: row.get("description"),
        file_kind: parse_file_kind(&file_kind)?,
        file_id: row.get("file_id"),
        activity_data: row.get("activity_data"),
        research_property_ids: property_ids.0,
        created_by: row.get("created_by"),
        created_at: row.get("created_at"),
        row_version: row.get("row_version"),
    })
}

fn document_from_row(row: &PgRow) -> Document {
    Document {
        id: row.get("id"),
        mayan_document_id: row.get("mayan_document_id"),
        document_type_id: row.get("document_type_id"),
        status_code: row.get("status_code"),
        file_name: row.get("file_name"),
        checksum: row.get("checksum"),
        created_by: row.get("created_by"),
        created_at: row.get("created_at"),
        row_version: row.get("row_version"),
    }
}

fn document_type_from_row(row: &PgRow) -> DocumentType {
    DocumentType {
        id: row.get("id"),
        code: row.get("code"),
        description: row.get("description"),
        mayan_id: row.get("mayan_id"),
    }
}

fn collection_json(collection: &LeaseCollection) -> Result<serde_json::Value> {
    let value = match collection {
        LeaseCollection::Tenants(v) => serde_json::to_value(v),
        LeaseCollection::Properties(v) => serde_json::to_value(v),
        LeaseCollection::Improvements(v) => serde_json::to_value(v),
        LeaseCollection::Insurances(v) => serde_json::to_value(v),
        LeaseCollection::Terms(v) => serde_json::to_value(v),
    };
    value.with_context(|| format!("Failed to encode lease {}", collection.name()))
}

#[async_trait::async_trait]
impl ClaimStore for PostgresStore {
    async fn list_claims(&self, page: PageRequest, name: Option<&str>) -> Result<Paged<Claim>> {
        let pattern = format!("%{}%", name.map(str::trim).unwrap_or(""));
        let total: i64 = sqlx::query("SELECT COUNT(*) AS total FROM claims WHERE name ILIKE $1")
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count claims")?
            .get("total");

        let rows = sqlx::query(&format!(
            "SELECT {} FROM claims WHERE name ILIKE $1 ORDER BY name, id LIMIT $2 OFFSET $3",
            CLAIM_COLUMNS
        ))
        .bind(&pattern)
        .bind(page.quantity())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list claims")?;

        Ok(Paged::new(rows.iter().map(claim_from_row).collect(), page, total))
    }

    async fn get_claim(&self, key: Uuid) -> Result<Option<Claim>> {
        let row = sqlx::query(&format!("SELECT {} FROM claims WHERE key = $1", CLAIM_COLUMNS))
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch claim")?;
        Ok(row.as_ref().map(claim_from_row))
    }

    async fn insert_claim(&self, claim: Claim) -> Result<Claim> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO claims (key, name, keycloak_role_id, description, is_disabled, row_version)
            VALUES ($1, $2, $3, $4, $5, 1)
            RETURNING {}
            "#,
            CLAIM_COLUMNS
        ))
        .bind(claim.key)
        .bind(&claim.name)
        .bind(claim.keycloak_role_id)
        .bind(&claim.description)
        .bind(claim.is_disabled)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert claim")?;
        Ok(claim_from_row(&row))
    }

    async fn update_claim(&self, claim: Claim, submitted: RowVersion) -> Result<WriteOutcome<Claim>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE claims SET
                name = $2, keycloak_role_id = $3, description = $4, is_disabled = $5,
                row_version = row_version + 1
            WHERE key = $1 AND row_version = $6
            RETURNING {}
            "#,
            CLAIM_COLUMNS
        ))
        .bind(claim.key)
        .bind(&claim.name)
        .bind(claim.keycloak_role_id)
        .bind(&claim.description)
        .bind(claim.is_disabled)
        .bind(submitted)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to update claim")?;

        match row {
            Some(row) => Ok(WriteOutcome::Written(claim_from_row(&row))),
            None => Ok(missed_write(self.version_by_key("claims", claim.key).await?, submitted)),
        }
    }

    async fn delete_claim(&self, key: Uuid, submitted: RowVersion) -> Result<WriteOutcome<()>> {
        let result = sqlx::query("DELETE FROM claims WHERE key = $1 AND row_version = $2")
            .bind(key)
            .bind(submitted)
            .execute(&self.pool)
            .await
            .context("Failed to delete claim")?;

        if result.rows_affected() > 0 {
            return Ok(WriteOutcome::Written(()));
        }
        Ok(missed_write(self.version_by_key("claims", key).await?, submitted))
    }
}

#[async_trait::async_trait]
impl RoleStore for PostgresStore {
    async fn list_roles(&self, page: PageRequest, name: Option<&str>) -> Result<Paged<Role>> {
        let pattern = format!("%{}%", name.map(str::trim).unwrap_or(""));
        let total: i64 = sqlx::query("SELECT COUNT(*) AS total FROM roles WHERE name ILIKE $1")
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count roles")?
            .get("total");

        let rows = sqlx::query(&format!(
            "SELECT {} FROM roles WHERE name ILIKE $1 ORDER BY name, id LIMIT $2 OFFSET $3",
            ROLE_COLUMNS
        ))
        .bind(&pattern)
        .bind(page.quantity())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list roles")?;

        let roles = rows.iter().map(role_from_row).collect::<Result<Vec<_>>>()?;
        Ok(Paged::new(roles, page, total))
    }

    async fn get_role(&self, key: Uuid) -> Result<Option<Role>> {
        let row = sqlx::query(&format!("SELECT {} FROM roles WHERE key = $1", ROLE_COLUMNS))
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch role")?;
        row.as_ref().map(role_from_row).transpose()
    }

    async fn get_role_by_name(&self, name: &str) -> Result<Option<Role>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM roles WHERE lower(name) = lower($1) ORDER BY id LIMIT 1",
            ROLE_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch role by name")?;
        row.as_ref().map(role_from_row).transpose()
    }

    async fn get_role_by_keycloak_id(&self, group_id: Uuid) -> Result<Option<Role>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM roles WHERE keycloak_group_id = $1 ORDER BY id LIMIT 1",
            ROLE_COLUMNS
        ))
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch role by keycloak group")?;
        row.as_ref().map(role_from_row).transpose()
    }

    async fn insert_role(&self, role: Role) -> Result<Role> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO roles (key, name, description, is_public, is_disabled, sort_order, keycloak_group_id, claims, row_version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 1)
            RETURNING {}
            "#,
            ROLE_COLUMNS
        ))
        .bind(role.key)
        .bind(&role.name)
        .bind(&role.description)
        .bind(role.is_public)
        .bind(role.is_disabled)
        .bind(role.sort_order)
        .bind(role.keycloak_group_id)
        .bind(Json(&role.claims))
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert role")?;
        role_from_row(&row)
    }

    async fn update_role(&self, role: Role, submitted: RowVersion) -> Result<WriteOutcome<Role>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE roles SET
                name = $2, description = $3, is_public = $4, is_disabled = $5,
                sort_order = $6, keycloak_group_id = $7, claims = $8,
                row_version = row_version + 1
            WHERE key = $1 AND row_version = $9
            RETURNING {}
            "#,
            ROLE_COLUMNS
        ))
        .bind(role.key)
        .bind(&role.name)
        .bind(&role.description)
        .bind(role.is_public)
        .bind(role.is_disabled)
        .bind(role.sort_order)
        .bind(role.keycloak_group_id)
        .bind(Json(&role.claims))
        .bind(submitted)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to update role")?;

        match row {
            Some(row) => Ok(WriteOutcome::Written(role_from_row(&row)?)),
            None => Ok(missed_write(self.version_by_key("roles", role.key).await?, submitted)),
        }
    }

    async fn delete_role(&self, key: Uuid, submitted: RowVersion) -> Result<WriteOutcome<()>> {
        let result = sqlx::query("DELETE FROM roles WHERE key = $1 AND row_version = $2")
            .bind(key)
            .bind(submitted)
            .execute(&self.pool)
            .await
            .context("Failed to delete role")?;

        if result.rows_affected() > 0 {
            return Ok(WriteOutcome::Written(()));
        }
        Ok(missed_write(self.version_by_key("roles", key).await?, submitted))
    }

    async fn remove_roles_except(&self, keep: &[Uuid]) -> Result<u64> {
        let result = sqlx::query("DELETE FROM roles WHERE NOT (key = ANY($1))")
            .bind(keep)
            .execute(&self.pool)
            .await
            .context("Failed to remove roles")?;
        Ok(result.rows_affected())
    }
}

#[async_trait::async_trait]
impl TenantStore for PostgresStore {
    async fn get_tenant(&self, code: &str) -> Result<Option<Tenant>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM tenants WHERE lower(code) = lower($1)",
            TENANT_COLUMNS
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch tenant")?;
        Ok(row.as_ref().map(tenant_from_row))
    }

    async fn insert_tenant(&self, tenant: Tenant) -> Result<Tenant> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO tenants (code, name, description, settings, row_version)
            VALUES ($1, $2, $3, $4, 1)
            RETURNING {}
            "#,
            TENANT_COLUMNS
        ))
        .bind(&tenant.code)
        .bind(&tenant.name)
        .bind(&tenant.description)
        .bind(&tenant.settings)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert tenant")?;
        Ok(tenant_from_row(&row))
    }

    async fn update_tenant(&self, tenant: Tenant, submitted: RowVersion) -> Result<WriteOutcome<Tenant>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE tenants SET
                name = $2, description = $3, settings = $4,
                row_version = row_version + 1
            WHERE lower(code) = lower($1) AND row_version = $5
            RETURNING {}
            "#,
            TENANT_COLUMNS
        ))
        .bind(&tenant.code)
        .bind(&tenant.name)
        .bind(&tenant.description)
        .bind(&tenant.settings)
        .bind(submitted)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to update tenant")?;

        if let Some(row) = row {
            return Ok(WriteOutcome::Written(tenant_from_row(&row)));
        }
        let current = self.get_tenant(&tenant.code).await?.map(|t| t.row_version);
        Ok(missed_write(current, submitted))
    }
}

#[async_trait::async_trait]
impl PropertyStore for PostgresStore {
    async fn list_properties(&self, filter: &PropertyFilter, page: PageRequest) -> Result<Paged<Property>> {
        let rows = sqlx::query(&format!("SELECT {} FROM properties ORDER BY id", PROPERTY_COLUMNS))
            .fetch_all(&self.pool)
            .await
            .context("Failed to list properties")?;

        let properties: Vec<Property> = rows
            .iter()
            .map(property_from_row)
            .filter(|p| filter.matches(p))
            .collect();
        Ok(page.slice(&properties))
    }

    async fn get_property(&self, id: Id) -> Result<Option<Property>> {
        let row = sqlx::query(&format!("SELECT {} FROM properties WHERE id = $1", PROPERTY_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch property")?;
        Ok(row.as_ref().map(property_from_row))
    }

    async fn find_property(&self, pid: Option<i32>, pin: Option<i32>) -> Result<Option<Property>> {
        if let Some(pid) = pid {
            let row = sqlx::query(&format!(
                "SELECT {} FROM properties WHERE pid = $1 ORDER BY id LIMIT 1",
                PROPERTY_COLUMNS
            ))
            .bind(pid)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to find property by PID")?;
            if let Some(row) = row {
                return Ok(Some(property_from_row(&row)));
            }
        }
        let Some(pin) = pin else {
            return Ok(None);
        };
        let row = sqlx::query(&format!(
            "SELECT {} FROM properties WHERE pin = $1 ORDER BY id LIMIT 1",
            PROPERTY_COLUMNS
        ))
        .bind(pin)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find property by PIN")?;
        Ok(row.as_ref().map(property_from_row))
    }

    async fn insert_property(&self, property: Property) -> Result<Property> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO properties (pid, pin, address, legal_description, land_area, area_unit, is_sensitive, row_version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 1)
            RETURNING {}
            "#,
            PROPERTY_COLUMNS
        ))
        .bind(property.pid)
        .bind(property.pin)
        .bind(&property.address)
        .bind(&property.legal_description)
        .bind(property.land_area)
        .bind(&property.area_unit)
        .bind(property.is_sensitive)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert property")?;
        Ok(property_from_row(&row))
    }

    async fn update_property(&self, property: Property, submitted: RowVersion) -> Result<WriteOutcome<Property>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE properties SET
                pid = $2, pin = $3, address = $4, legal_description = $5,
                land_area = $6, area_unit = $7, is_sensitive = $8,
                row_version = row_version + 1
            WHERE id = $1 AND row_version = $9
            RETURNING {}
            "#,
            PROPERTY_COLUMNS
        ))
        .bind(property.id)
        .bind(property.pid)
        .bind(property.pin)
        .bind(&property.address)
        .bind(&property.legal_description)
        .bind(property.land_area)
        .bind(&property.area_unit)
        .bind(property.is_sensitive)
        .bind(submitted)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to update property")?;

        match row {
            Some(row) => Ok(WriteOutcome::Written(property_from_row(&row))),
            None => Ok(missed_write(self.version_by_id("properties", property.id).await?, submitted)),
        }
    }

    async fn get_property_associations(&self, id: Id) -> Result<Option<PropertyAssociations>> {
        let Some(property) = self.get_property(id).await? else {
            return Ok(None);
        };
        let link = serde_json::json!([{ "property_id": id }]);

        let lease_rows = sqlx::query(
            r#"
            SELECT id, l_file_no, purpose, status, created_by, created_at
            FROM leases WHERE properties @> $1 ORDER BY id
            "#,
        )
        .bind(&link)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch lease associations")?;

        let research_rows = sqlx::query(
            r#"
            SELECT id, file_number, name, status, created_by, created_at
            FROM research_files WHERE properties @> $1 ORDER BY id
            "#,
        )
        .bind(&link)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch research file associations")?;

        Ok(Some(PropertyAssociations {
            id,
            pid: property.pid,
            leases: lease_rows
                .iter()
                .map(|row| AssociationSummary {
                    id: row.get("id"),
                    file_number: row.get("l_file_no"),
                    file_name: row.get("purpose"),
                    status: row.get("status"),
                    created_by: row.get("created_by"),
                    created_at: row.get("created_at"),
                })
                .collect(),
            research_files: research_rows
                .iter()
                .map(|row| AssociationSummary {
                    id: row.get("id"),
                    file_number: row.get("file_number"),
                    file_name: row.get("name"),
                    status: row.get("status"),
                    created_by: row.get("created_by"),
                    created_at: row.get("created_at"),
                })
                .collect(),
        }))
    }
}

#[async_trait::async_trait]
impl ResearchFileStore for PostgresStore {
    async fn list_research_files(
        &self,
        filter: &ResearchFileFilter,
        page: PageRequest,
    ) -> Result<Paged<ResearchFile>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM research_files ORDER BY id",
            RESEARCH_FILE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list research files")?;

        let mut files = Vec::with_capacity(rows.len());
        for row in &rows {
            let file = research_file_from_row(row)?;
            if filter.matches(&file) {
                files.push(file);
            }
        }
        Ok(page.slice(&files))
    }

    async fn get_research_file(&self, id: Id) -> Result<Option<ResearchFile>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM research_files WHERE id = $1",
            RESEARCH_FILE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch research file")?;
        row.as_ref().map(research_file_from_row).transpose()
    }

    async fn insert_research_file(&self, mut file: ResearchFile) -> Result<ResearchFile> {
        let ids = self.next_child_ids(file.properties.len()).await?;
        let mut ids = ids.into_iter();
        assign_child_ids(&mut file.properties, &mut || ids.next().unwrap_or_default());

        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        link_parcels(&mut tx, &mut file.properties).await?;
        let row = sqlx::query(
            r#"
            INSERT INTO research_files (
                name, status, road_name, road_alias, request_date, request_description,
                requestor, result_date, result_description, expropriation, expropriation_notes,
                properties, created_by, created_at, updated_by, updated_at, row_version
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, 1)
            RETURNING id
            "#,
        )
        .bind(&file.name)
        .bind(file.status.as_str())
        .bind(&file.road_name)
        .bind(&file.road_alias)
        .bind(file.request_date)
        .bind(&file.request_description)
        .bind(&file.requestor)
        .bind(file.result_date)
        .bind(&file.result_description)
        .bind(file.expropriation)
        .bind(&file.expropriation_notes)
        .bind(Json(&file.properties))
        .bind(&file.created_by)
        .bind(file.created_at)
        .bind(&file.updated_by)
        .bind(file.updated_at)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to insert research file")?;
        let id: Id = row.get("id");

        let row = sqlx::query(&format!(
            "UPDATE research_files SET file_number = 'R-' || id WHERE id = $1 RETURNING {}",
            RESEARCH_FILE_COLUMNS
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to assign research file number")?;
        tx.commit().await.context("Failed to commit research file")?;

        research_file_from_row(&row)
    }

    async fn update_research_file(
        &self,
        file: ResearchFile,
        submitted: RowVersion,
    ) -> Result<WriteOutcome<ResearchFile>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE research_files SET
                name = $2, status = $3, road_name = $4, road_alias = $5,
                request_date = $6, request_description = $7, requestor = $8,
                result_date = $9, result_description = $10, expropriation = $11,
                expropriation_notes = $12, updated_by = $13, updated_at = $14,
                row_version = row_version + 1
            WHERE id = $1 AND row_version = $15
            RETURNING {}
            "#,
            RESEARCH_FILE_COLUMNS
        ))
        .bind(file.id)
        .bind(&file.name)
        .bind(file.status.as_str())
        .bind(&file.road_name)
        .bind(&file.road_alias)
        .bind(file.request_date)
        .bind(&file.request_description)
        .bind(&file.requestor)
        .bind(file.result_date)
        .bind(&file.result_description)
        .bind(file.expropriation)
        .bind(&file.expropriation_notes)
        .bind(&file.updated_by)
        .bind(file.updated_at)
        .bind(submitted)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to update research file")?;

        match row {
            Some(row) => Ok(WriteOutcome::Written(research_file_from_row(&row)?)),
            None => Ok(missed_write(self.version_by_id("research_files", file.id).await?, submitted)),
        }
    }

    async fn replace_research_file_properties(
        &self,
        id: Id,
        submitted: RowVersion,
        mut properties: Vec<PropertyResearchFile>,
    ) -> Result<WriteOutcome<ResearchFile>> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        let current = locked_version(&mut tx, "research_files", id).await?;
        if current != Some(submitted) {
            return Ok(missed_write(current, submitted));
        }
        link_parcels(&mut tx, &mut properties).await?;

        let unsaved = properties.iter().filter(|p| p.id <= 0).count();
        let ids = self.next_child_ids(unsaved).await?;
        let mut ids = ids.into_iter();
        assign_child_ids(&mut properties, &mut || ids.next().unwrap_or_default());

        let row = sqlx::query(&format!(
            r#"
            UPDATE research_files SET
                properties = $2, updated_at = NOW(), row_version = row_version + 1
            WHERE id = $1 AND row_version = $3
            RETURNING {}
            "#,
            RESEARCH_FILE_COLUMNS
        ))
        .bind(id)
        .bind(Json(&properties))
        .bind(submitted)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to replace research file properties")?;
        tx.commit().await.context("Failed to commit research file properties")?;

        Ok(WriteOutcome::Written(research_file_from_row(&row)?))
    }
}

#[async_trait::async_trait]
impl LeaseStore for PostgresStore {
    async fn list_leases(&self, filter: &LeaseFilter, page: PageRequest) -> Result<Paged<Lease>> {
        let rows = sqlx::query(&format!("SELECT {} FROM leases ORDER BY id", LEASE_COLUMNS))
            .fetch_all(&self.pool)
            .await
            .context("Failed to list leases")?;

        let mut leases = Vec::with_capacity(rows.len());
        for row in &rows {
            let lease = lease_from_row(row)?;
            let names = if filter.tenant_name.is_some() {
                self.tenant_names(&lease).await?
            } else {
                Vec::new()
            };
            if filter.matches(&lease, &names) {
                leases.push(lease);
            }
        }
        Ok(page.slice(&leases))
    }

    async fn get_lease(&self, id: Id) -> Result<Option<Lease>> {
        let row = sqlx::query(&format!("SELECT {} FROM leases WHERE id = $1", LEASE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch lease")?;
        row.as_ref().map(lease_from_row).transpose()
    }

    async fn insert_lease(&self, mut lease: Lease) -> Result<Lease> {
        let collections = [
            LeaseCollection::Tenants(std::mem::take(&mut lease.tenants)),
            LeaseCollection::Properties(std::mem::take(&mut lease.properties)),
            LeaseCollection::Improvements(std::mem::take(&mut lease.improvements)),
            LeaseCollection::Insurances(std::mem::take(&mut lease.insurances)),
            LeaseCollection::Terms(std::mem::take(&mut lease.terms)),
        ];
        let unsaved = collections.iter().map(LeaseCollection::unsaved_count).sum();
        let ids = self.next_child_ids(unsaved).await?;
        let mut ids = ids.into_iter();
        for mut collection in collections {
            collection.assign_ids(&mut || ids.next().unwrap_or_default());
            collection.apply_to(&mut lease);
        }

        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        link_parcels(&mut tx, &mut lease.properties).await?;
        let row = sqlx::query(
            r#"
            INSERT INTO leases (
                purpose, status, payment_frequency, start_date, expiry_date, amount, note,
                tenants, properties, improvements, insurances, terms,
                created_by, created_at, updated_by, updated_at, row_version
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, 1)
            RETURNING id
            "#,
        )
        .bind(&lease.purpose)
        .bind(&lease.status)
        .bind(&lease.payment_frequency)
        .bind(lease.start_date)
        .bind(lease.expiry_date)
        .bind(lease.amount)
        .bind(&lease.note)
        .bind(Json(&lease.tenants))
        .bind(Json(&lease.properties))
        .bind(Json(&lease.improvements))
        .bind(Json(&lease.insurances))
        .bind(Json(&lease.terms))
        .bind(&lease.created_by)
        .bind(lease.created_at)
        .bind(&lease.updated_by)
        .bind(lease.updated_at)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to insert lease")?;
        let id: Id = row.get("id");

        let row = sqlx::query(&format!(
            "UPDATE leases SET l_file_no = 'L-' || id WHERE id = $1 RETURNING {}",
            LEASE_COLUMNS
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to assign lease file number")?;
        tx.commit().await.context("Failed to commit lease")?;

        lease_from_row(&row)
    }

    async fn update_lease(&self, mut lease: Lease, submitted: RowVersion) -> Result<WriteOutcome<Lease>> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        let current = locked_version(&mut tx, "leases", lease.id).await?;
        if current != Some(submitted) {
            return Ok(missed_write(current, submitted));
        }
        link_parcels(&mut tx, &mut lease.properties).await?;

        let unsaved = lease.properties.iter().filter(|p| p.id <= 0).count();
        let ids = self.next_child_ids(unsaved).await?;
        let mut ids = ids.into_iter();
        assign_child_ids(&mut lease.properties, &mut || ids.next().unwrap_or_default());

        let row = sqlx::query(&format!(
            r#"
            UPDATE leases SET
                purpose = $2, status = $3, payment_frequency = $4, start_date = $5,
                expiry_date = $6, amount = $7, note = $8, properties = $9,
                updated_by = $10, updated_at = $11,
                row_version = row_version + 1
            WHERE id = $1 AND row_version = $12
            RETURNING {}
            "#,
            LEASE_COLUMNS
        ))
        .bind(lease.id)
        .bind(&lease.purpose)
        .bind(&lease.status)
        .bind(&lease.payment_frequency)
        .bind(lease.start_date)
        .bind(lease.expiry_date)
        .bind(lease.amount)
        .bind(&lease.note)
        .bind(Json(&lease.properties))
        .bind(&lease.updated_by)
        .bind(lease.updated_at)
        .bind(submitted)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to update lease")?;
        tx.commit().await.context("Failed to commit lease")?;

        Ok(WriteOutcome::Written(lease_from_row(&row)?))
    }

    async fn replace_lease_collection(
        &self,
        id: Id,
        submitted: RowVersion,
        mut collection: LeaseCollection,
    ) -> Result<WriteOutcome<Lease>> {
        let ids = self.next_child_ids(collection.unsaved_count()).await?;
        let mut ids = ids.into_iter();
        collection.assign_ids(&mut || ids.next().unwrap_or_default());

        // Column names come from a closed set, never from input
        let row = sqlx::query(&format!(
            r#"
            UPDATE leases SET
                {} = $2, updated_at = NOW(), row_version = row_version + 1
            WHERE id = $1 AND row_version = $3
            RETURNING {}
            "#,
            collection.name(),
            LEASE_COLUMNS
        ))
        .bind(id)
        .bind(collection_json(&collection)?)
        .bind(submitted)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to replace lease {}", collection.name()))?;

        match row {
            Some(row) => Ok(WriteOutcome::Written(lease_from_row(&row)?)),
            None => Ok(missed_write(self.version_by_id("leases", id).await?, submitted)),
        }
    }

    async fn get_person(&self, id: Id) -> Result<Option<Person>> {
        let row = sqlx::query("SELECT id, first_name, surname FROM persons WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch person")?;
        Ok(row.map(|row| Person {
            id: row.get("id"),
            first_name: row.get("first_name"),
            surname: row.get("surname"),
        }))
    }

    async fn get_organization(&self, id: Id) -> Result<Option<Organization>> {
        let row = sqlx::query("SELECT id, name FROM organizations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch organization")?;
        Ok(row.map(|row| Organization {
            id: row.get("id"),
            name: row.get("name"),
        }))
    }

    async fn insert_person(&self, person: Person) -> Result<Person> {
        let row = sqlx::query("INSERT INTO persons (first_name, surname) VALUES ($1, $2) RETURNING id")
            .bind(&person.first_name)
            .bind(&person.surname)
            .fetch_one(&self.pool)
            .await
            .context("Failed to insert person")?;
        Ok(Person {
            id: row.get("id"),
            ..person
        })
    }

    async fn insert_organization(&self, organization: Organization) -> Result<Organization> {
        let row = sqlx::query("INSERT INTO organizations (name) VALUES ($1) RETURNING id")
            .bind(&organization.name)
            .fetch_one(&self.pool)
            .await
            .context("Failed to insert organization")?;
        Ok(Organization {
            id: row.get("id"),
            ..organization
        })
    }
}

#[async_trait::async_trait]
impl ActivityStore for PostgresStore {
    async fn get_activity(&self, id: Id) -> Result<Option<ActivityInstance>> {
        let row = sqlx::query(&format!("SELECT {} FROM activities WHERE id = $1", ACTIVITY_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch activity")?;
        row.as_ref().map(activity_from_row).transpose()
    }

    async fn get_activity_row_version(&self, id: Id) -> Result<Option<RowVersion>> {
        self.version_by_id("activities", id).await
    }

    async fn list_activities(&self, kind: FileKind, file_id: Id) -> Result<Vec<ActivityInstance>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM activities WHERE file_kind = $1 AND file_id = $2 ORDER BY id",
            ACTIVITY_COLUMNS
        ))
        .bind(kind.as_str())
        .bind(file_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list activities")?;
        rows.iter().map(activity_from_row).collect()
    }

    async fn insert_activity(&self, activity: ActivityInstance) -> Result<ActivityInstance> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO activities (
                template_code, status, description, file_kind, file_id, activity_data,
                research_property_ids, created_by, created_at, row_version
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 1)
            RETURNING {}
            "#,
            ACTIVITY_COLUMNS
        ))
        .bind(&activity.template_code)
        .bind(&activity.status)
        .bind(&activity.description)
        .bind(activity.file_kind.as_str())
        .bind(activity.file_id)
        .bind(&activity.activity_data)
        .bind(Json(&activity.research_property_ids))
        .bind(&activity.created_by)
        .bind(activity.created_at)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert activity")?;
        activity_from_row(&row)
    }

    async fn update_activity(
        &self,
        activity: ActivityInstance,
        submitted: RowVersion,
    ) -> Result<WriteOutcome<ActivityInstance>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE activities SET
                template_code = $2, status = $3, description = $4, activity_data = $5,
                row_version = row_version + 1
            WHERE id = $1 AND row_version = $6
            RETURNING {}
            "#,
            ACTIVITY_COLUMNS
        ))
        .bind(activity.id)
        .bind(&activity.template_code)
        .bind(&activity.status)
        .bind(&activity.description)
        .bind(&activity.activity_data)
        .bind(submitted)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to update activity")?;

        match row {
            Some(row) => Ok(WriteOutcome::Written(activity_from_row(&row)?)),
            None => Ok(missed_write(self.version_by_id("activities", activity.id).await?, submitted)),
        }
    }

    async fn replace_activity_properties(
        &self,
        id: Id,
        submitted: RowVersion,
        research_property_ids: Vec<Id>,
    ) -> Result<WriteOutcome<ActivityInstance>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE activities SET
                research_property_ids = $2, row_version = row_version + 1
            WHERE id = $1 AND row_version = $3
            RETURNING {}
            "#,
            ACTIVITY_COLUMNS
        ))
        .bind(id)
        .bind(Json(&research_property_ids))
        .bind(submitted)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to replace activity properties")?;

        match row {
            Some(row) => Ok(WriteOutcome::Written(activity_from_row(&row)?)),
            None => Ok(missed_write(self.version_by_id("activities", id).await?, submitted)),
        }
    }

    async fn delete_activity(&self, id: Id, submitted: RowVersion) -> Result<WriteOutcome<()>> {
        let result = sqlx::query("DELETE FROM activities WHERE id = $1 AND row_version = $2")
            .bind(id)
            .bind(submitted)
            .execute(&self.pool)
            .await
            .context("Failed to delete activity")?;

        if result.rows_affected() > 0 {
            return Ok(WriteOutcome::Written(()));
        }
        Ok(missed_write(self.version_by_id("activities", id).await?, submitted))
    }
}

#[async_trait::async_trait]
impl DocumentStore for PostgresStore {
    async fn list_document_types(&self) -> Result<Vec<DocumentType>> {
        let rows = sqlx::query("SELECT id, code, description, mayan_id FROM document_types ORDER BY description")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list document types")?;
        Ok(rows.iter().map(document_type_from_row).collect())
    }

    async fn get_document_type(&self, id: Id) -> Result<Option<DocumentType>> {
        let row = sqlx::query("SELECT id, code, description, mayan_id FROM document_types WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch document type")?;
        Ok(row.as_ref().map(document_type_from_row))
    }

    async fn insert_document_type(&self, document_type: DocumentType) -> Result<DocumentType> {
        let row = sqlx::query(
            r#"
            INSERT INTO document_types (code, description, mayan_id)
            VALUES ($1, $2, $3)
            RETURNING id, code, description, mayan_id
            "#,
        )
        .bind(&document_type.code)
        .bind(&document_type.description)
        .bind(document_type.mayan_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert document type")?;
        Ok(document_type_from_row(&row))
    }

    async fn get_document(&self, id: Id) -> Result<Option<Document>> {
        let row = sqlx::query(&format!("SELECT {} FROM documents WHERE id = $1", DOCUMENT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch document")?;
        Ok(row.as_ref().map(document_from_row))
    }

    async fn update_document(&self, document: Document, submitted: RowVersion) -> Result<WriteOutcome<Document>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE documents SET
                document_type_id = $2, status_code = $3, row_version = row_version + 1
            WHERE id = $1 AND row_version = $4
            RETURNING {}
            "#,
            DOCUMENT_COLUMNS
        ))
        .bind(document.id)
        .bind(document.document_type_id)
        .bind(&document.status_code)
        .bind(submitted)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to update document")?;

        match row {
            Some(row) => Ok(WriteOutcome::Written(document_from_row(&row))),
            None => Ok(missed_write(self.version_by_id("documents", document.id).await?, submitted)),
        }
    }

    async fn list_document_relationships(&self, kind: FileKind, parent_id: Id) -> Result<Vec<DocumentRelationship>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT r.id AS relationship_id, r.parent_kind, r.parent_id, {}
            FROM document_relationships r
            JOIN documents d ON d.id = r.document_id
            WHERE r.parent_kind = $1 AND r.parent_id = $2
            ORDER BY r.id
            "#,
            qualified_document_columns()
        ))
        .bind(kind.as_str())
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list document relationships")?;
        rows.iter().map(relationship_from_row).collect()
    }

    async fn get_document_relationship(&self, id: Id) -> Result<Option<DocumentRelationship>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT r.id AS relationship_id, r.parent_kind, r.parent_id, {}
            FROM document_relationships r
            JOIN documents d ON d.id = r.document_id
            WHERE r.id = $1
            "#,
            qualified_document_columns()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch document relationship")?;
        row.as_ref().map(relationship_from_row).transpose()
    }

    async fn insert_document_relationship(
        &self,
        kind: FileKind,
        parent_id: Id,
        document: Document,
    ) -> Result<DocumentRelationship> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO documents (
                mayan_document_id, document_type_id, status_code, file_name, checksum,
                created_by, created_at, row_version
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, 1)
            RETURNING {}
            "#,
            DOCUMENT_COLUMNS
        ))
        .bind(document.mayan_document_id)
        .bind(document.document_type_id)
        .bind(&document.status_code)
        .bind(&document.file_name)
        .bind(&document.checksum)
        .bind(&document.created_by)
        .bind(document.created_at)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to insert document")?;
        let document = document_from_row(&row);

        let row = sqlx::query(
            r#"
            INSERT INTO document_relationships (parent_kind, parent_id, document_id)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(kind.as_str())
        .bind(parent_id)
        .bind(document.id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to insert document relationship")?;
        tx.commit().await.context("Failed to commit document")?;

        Ok(DocumentRelationship {
            id: row.get("id"),
            parent_kind: kind,
            parent_id,
            document,
        })
    }

    async fn delete_document_relationship(&self, id: Id) -> Result<Option<(DocumentRelationship, bool)>> {
        let Some(relationship) = self.get_document_relationship(id).await? else {
            return Ok(None);
        };

        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        sqlx::query("DELETE FROM document_relationships WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete document relationship")?;

        let remaining: i64 = sqlx::query("SELECT COUNT(*) AS remaining FROM document_relationships WHERE document_id = $1")
            .bind(relationship.document.id)
            .fetch_one(&mut *tx)
            .await
            .context("Failed to count document relationships")?
            .get("remaining");

        let document_removed = remaining == 0;
        if document_removed {
            sqlx::query("DELETE FROM documents WHERE id = $1")
                .bind(relationship.document.id)
                .execute(&mut *tx)
                .await
                .context("Failed to delete document")?;
        }
        tx.commit().await.context("Failed to commit document removal")?;

        Ok(Some((relationship, document_removed)))
    }
}

fn qualified_document_columns() -> String {
    DOCUMENT_COLUMNS
        .split(", ")
        .map(|column| format!("d.{}", column))
        .collect::<Vec<_>>()
        .join(", ")
}

fn relationship_from_row(row: &PgRow) -> Result<DocumentRelationship> {
    let parent_kind: String = row.get("parent_kind");
    Ok(DocumentRelationship {
        id: row.get("relationship_id"),
        parent_kind: parse_file_kind(&parent_kind)?,
        parent_id: row.get("parent_id"),
        document: document_from_row(row),
    })
}
