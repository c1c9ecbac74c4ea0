use crate::model::{
    ActivityInstance, Claim, Document, DocumentRelationship, DocumentType, FileKind, Id, Lease,
    LeaseCollection, LeaseFilter, Organization, PageRequest, Paged, Person, Property,
    PropertyAssociations, PropertyFilter, PropertyResearchFile, ResearchFile, ResearchFileFilter,
    Role, RowVersion, Tenant, WriteOutcome,
};
use anyhow::Result;
use uuid::Uuid;

// Every versioned write compares the submitted token with the stored one and
// bumps it in the same atomic step. Inserts stamp INITIAL_ROW_VERSION.

#[async_trait::async_trait]
pub trait ClaimStore: Send + Sync {
    async fn list_claims(&self, page: PageRequest, name: Option<&str>) -> Result<Paged<Claim>>;
    async fn get_claim(&self, key: Uuid) -> Result<Option<Claim>>;
    async fn insert_claim(&self, claim: Claim) -> Result<Claim>;
    async fn update_claim(&self, claim: Claim, submitted: RowVersion) -> Result<WriteOutcome<Claim>>;
    async fn delete_claim(&self, key: Uuid, submitted: RowVersion) -> Result<WriteOutcome<()>>;
}

#[async_trait::async_trait]
pub trait RoleStore: Send + Sync {
    async fn list_roles(&self, page: PageRequest, name: Option<&str>) -> Result<Paged<Role>>;
    async fn get_role(&self, key: Uuid) -> Result<Option<Role>>;
    async fn get_role_by_name(&self, name: &str) -> Result<Option<Role>>;
    async fn get_role_by_keycloak_id(&self, group_id: Uuid) -> Result<Option<Role>>;
    async fn insert_role(&self, role: Role) -> Result<Role>;
    async fn update_role(&self, role: Role, submitted: RowVersion) -> Result<WriteOutcome<Role>>;
    async fn delete_role(&self, key: Uuid, submitted: RowVersion) -> Result<WriteOutcome<()>>;
    /// Remove every role whose key is not in `keep`; returns the number removed
    async fn remove_roles_except(&self, keep: &[Uuid]) -> Result<u64>;
}

#[async_trait::async_trait]
pub trait TenantStore: Send + Sync {
    async fn get_tenant(&self, code: &str) -> Result<Option<Tenant>>;
    async fn insert_tenant(&self, tenant: Tenant) -> Result<Tenant>;
    async fn update_tenant(&self, tenant: Tenant, submitted: RowVersion) -> Result<WriteOutcome<Tenant>>;
}

#[async_trait::async_trait]
pub trait PropertyStore: Send + Sync {
    async fn list_properties(&self, filter: &PropertyFilter, page: PageRequest) -> Result<Paged<Property>>;
    async fn get_property(&self, id: Id) -> Result<Option<Property>>;
    /// Look a property up by PID, falling back to PIN
    async fn find_property(&self, pid: Option<i32>, pin: Option<i32>) -> Result<Option<Property>>;
    async fn insert_property(&self, property: Property) -> Result<Property>;
    async fn update_property(&self, property: Property, submitted: RowVersion) -> Result<WriteOutcome<Property>>;
    async fn get_property_associations(&self, id: Id) -> Result<Option<PropertyAssociations>>;
}

#[async_trait::async_trait]
pub trait ResearchFileStore: Send + Sync {
    async fn list_research_files(
        &self,
        filter: &ResearchFileFilter,
        page: PageRequest,
    ) -> Result<Paged<ResearchFile>>;
    async fn get_research_file(&self, id: Id) -> Result<Option<ResearchFile>>;
    /// Assigns the id and `R-` file number
    async fn insert_research_file(&self, file: ResearchFile) -> Result<ResearchFile>;
    /// Header fields only; the property collection is left as stored
    async fn update_research_file(
        &self,
        file: ResearchFile,
        submitted: RowVersion,
    ) -> Result<WriteOutcome<ResearchFile>>;
    async fn replace_research_file_properties(
        &self,
        id: Id,
        submitted: RowVersion,
        properties: Vec<PropertyResearchFile>,
    ) -> Result<WriteOutcome<ResearchFile>>;
}

#[async_trait::async_trait]
pub trait LeaseStore: Send + Sync {
    async fn list_leases(&self, filter: &LeaseFilter, page: PageRequest) -> Result<Paged<Lease>>;
    async fn get_lease(&self, id: Id) -> Result<Option<Lease>>;
    /// Assigns the id and `L-` file number
    async fn insert_lease(&self, lease: Lease) -> Result<Lease>;
    /// Header fields and the property collection
    async fn update_lease(&self, lease: Lease, submitted: RowVersion) -> Result<WriteOutcome<Lease>>;
    async fn replace_lease_collection(
        &self,
        id: Id,
        submitted: RowVersion,
        collection: LeaseCollection,
    ) -> Result<WriteOutcome<Lease>>;
    async fn get_person(&self, id: Id) -> Result<Option<Person>>;
    async fn get_organization(&self, id: Id) -> Result<Option<Organization>>;
    async fn insert_person(&self, person: Person) -> Result<Person>;
    async fn insert_organization(&self, organization: Organization) -> Result<Organization>;
}

#[async_trait::async_trait]
pub trait ActivityStore: Send + Sync {
    async fn get_activity(&self, id: Id) -> Result<Option<ActivityInstance>>;
    async fn get_activity_row_version(&self, id: Id) -> Result<Option<RowVersion>>;
    async fn list_activities(&self, kind: FileKind, file_id: Id) -> Result<Vec<ActivityInstance>>;
    async fn insert_activity(&self, activity: ActivityInstance) -> Result<ActivityInstance>;
    async fn update_activity(
        &self,
        activity: ActivityInstance,
        submitted: RowVersion,
    ) -> Result<WriteOutcome<ActivityInstance>>;
    async fn replace_activity_properties(
        &self,
        id: Id,
        submitted: RowVersion,
        research_property_ids: Vec<Id>,
    ) -> Result<WriteOutcome<ActivityInstance>>;
    async fn delete_activity(&self, id: Id, submitted: RowVersion) -> Result<WriteOutcome<()>>;
}

#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_document_types(&self) -> Result<Vec<DocumentType>>;
    async fn get_document_type(&self, id: Id) -> Result<Option<DocumentType>>;
    async fn insert_document_type(&self, document_type: DocumentType) -> Result<DocumentType>;
    async fn get_document(&self, id: Id) -> Result<Option<Document>>;
    async fn update_document(&self, document: Document, submitted: RowVersion) -> Result<WriteOutcome<Document>>;
    async fn list_document_relationships(&self, kind: FileKind, parent_id: Id) -> Result<Vec<DocumentRelationship>>;
    async fn get_document_relationship(&self, id: Id) -> Result<Option<DocumentRelationship>>;
    /// Insert the document and its link to the parent file in one unit of work
    async fn insert_document_relationship(
        &self,
        kind: FileKind,
        parent_id: Id,
        document: Document,
    ) -> Result<DocumentRelationship>;
    /// Removes the link, and the document itself when nothing else links to it.
    /// Returns the removed relationship and whether the document went with it.
    async fn delete_document_relationship(&self, id: Id) -> Result<Option<(DocumentRelationship, bool)>>;
}

pub trait Store:
    ClaimStore
    + RoleStore
    + TenantStore
    + PropertyStore
    + ResearchFileStore
    + LeaseStore
    + ActivityStore
    + DocumentStore
    + Send
    + Sync
{
}

impl<T> Store for T where
    T: ClaimStore
        + RoleStore
        + TenantStore
        + PropertyStore
        + ResearchFileStore
        + LeaseStore
        + ActivityStore
        + DocumentStore
        + Send
        + Sync
{
}
