use anyhow::Result;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::logic::concurrency::{apply_update, check_delete, replace_children, stamp_new};
use crate::model::{
    assign_child_ids, name_matches, ActivityInstance, AssociationSummary, Claim, Document,
    DocumentRelationship, DocumentType, FileKind, Id, Lease, LeaseCollection, LeaseFilter,
    Organization, PageRequest, Paged, ParcelLink, Person, Property, PropertyAssociations, PropertyFilter,
    PropertyResearchFile, ResearchFile, ResearchFileFilter, Role, RowVersion, TenantParty, Tenant,
    WriteOutcome,
};
use crate::store::traits::{
    ActivityStore, ClaimStore, DocumentStore, LeaseStore, PropertyStore, ResearchFileStore,
    RoleStore, TenantStore,
};

/// Rows of one table, keyed and ordered by id
#[derive(Debug)]
struct Table<T> {
    rows: BTreeMap<Id, T>,
    next_id: Id,
}

impl<T> Table<T> {
    fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }

    fn allocate(&mut self) -> Id {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn get(&self, id: Id) -> Option<&T> {
        self.rows.get(&id)
    }
}

#[derive(Debug)]
struct MemoryState {
    claims: Table<Claim>,
    roles: Table<Role>,
    tenants: Table<Tenant>,
    properties: Table<Property>,
    research_files: Table<ResearchFile>,
    leases: Table<Lease>,
    persons: Table<Person>,
    organizations: Table<Organization>,
    activities: Table<ActivityInstance>,
    document_types: Table<DocumentType>,
    documents: Table<Document>,
    relationships: Table<DocumentRelationship>,
    /// Shared id sequence for child records of every aggregate
    next_child_id: Id,
}

impl MemoryState {
    fn new() -> Self {
        Self {
            claims: Table::new(),
            roles: Table::new(),
            tenants: Table::new(),
            properties: Table::new(),
            research_files: Table::new(),
            leases: Table::new(),
            persons: Table::new(),
            organizations: Table::new(),
            activities: Table::new(),
            document_types: Table::new(),
            documents: Table::new(),
            relationships: Table::new(),
            next_child_id: 1,
        }
    }

    fn child_sequence(&mut self) -> impl FnMut() -> Id + '_ {
        move || {
            let id = self.next_child_id;
            self.next_child_id += 1;
            id
        }
    }

    /// Link unlinked parcels to the inventory, adding the ones not found.
    fn link_parcels<L: ParcelLink>(&mut self, links: &mut [L]) {
        for link in links.iter_mut().filter(|l| !l.is_linked()) {
            let rows = &self.properties.rows;
            let found = link
                .pid()
                .and_then(|pid| rows.values().find(|p| p.pid == Some(pid)))
                .or_else(|| link.pin().and_then(|pin| rows.values().find(|p| p.pin == Some(pin))))
                .cloned();
            let property = match found {
                Some(property) => property,
                None => {
                    let mut property = Property::from_identifiers(link.pid(), link.pin());
                    property.id = self.properties.allocate();
                    stamp_new(&mut property);
                    self.properties.rows.insert(property.id, property.clone());
                    property
                }
            };
            link.link_to(&property);
        }
    }

    fn tenant_names(&self, lease: &Lease) -> Vec<String> {
        lease
            .tenants
            .iter()
            .filter_map(|t| match t.party {
                TenantParty::Person { person_id } => {
                    self.persons.get(person_id).map(Person::full_name)
                }
                TenantParty::Organization { organization_id } => {
                    self.organizations.get(organization_id).map(|o| o.name.clone())
                }
            })
            .collect()
    }

    fn claim_id_by_key(&self, key: Uuid) -> Option<Id> {
        self.claims.rows.values().find(|c| c.key == key).map(|c| c.id)
    }

    fn role_id_by_key(&self, key: Uuid) -> Option<Id> {
        self.roles.rows.values().find(|r| r.key == key).map(|r| r.id)
    }

    fn tenant_id_by_code(&self, code: &str) -> Option<Id> {
        self.tenants
            .rows
            .values()
            .find(|t| t.code.eq_ignore_ascii_case(code))
            .map(|t| t.id)
    }
}

/// Store kept entirely in process memory. Used by the test suite and for
/// running the API locally without PostgreSQL.
///
/// Every write holds the lock for its whole compare-and-write step, so two
/// writers racing on the same token cannot both succeed.
#[derive(Debug)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ClaimStore for MemoryStore {
    async fn list_claims(&self, page: PageRequest, name: Option<&str>) -> Result<Paged<Claim>> {
        let state = self.state.read();
        let mut claims: Vec<Claim> = state
            .claims
            .rows
            .values()
            .filter(|c| name_matches(&c.name, name))
            .cloned()
            .collect();
        claims.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(page.slice(&claims))
    }

    async fn get_claim(&self, key: Uuid) -> Result<Option<Claim>> {
        let state = self.state.read();
        Ok(state.claims.rows.values().find(|c| c.key == key).cloned())
    }

    async fn insert_claim(&self, mut claim: Claim) -> Result<Claim> {
        let mut state = self.state.write();
        if state.claim_id_by_key(claim.key).is_some() {
            anyhow::bail!("Claim with key {} already exists", claim.key);
        }
        claim.id = state.claims.allocate();
        stamp_new(&mut claim);
        state.claims.rows.insert(claim.id, claim.clone());
        Ok(claim)
    }

    async fn update_claim(&self, mut claim: Claim, submitted: RowVersion) -> Result<WriteOutcome<Claim>> {
        let mut state = self.state.write();
        let Some(id) = state.claim_id_by_key(claim.key) else {
            return Ok(WriteOutcome::NotFound);
        };
        claim.id = id;
        let outcome = apply_update(state.claims.get(id), submitted, claim);
        if let WriteOutcome::Written(updated) = &outcome {
            state.claims.rows.insert(id, updated.clone());
        }
        Ok(outcome)
    }

    async fn delete_claim(&self, key: Uuid, submitted: RowVersion) -> Result<WriteOutcome<()>> {
        let mut state = self.state.write();
        let Some(id) = state.claim_id_by_key(key) else {
            return Ok(WriteOutcome::NotFound);
        };
        let outcome = check_delete(state.claims.get(id), submitted);
        if outcome.is_written() {
            state.claims.rows.remove(&id);
        }
        Ok(outcome)
    }
}

#[async_trait::async_trait]
impl RoleStore for MemoryStore {
    async fn list_roles(&self, page: PageRequest, name: Option<&str>) -> Result<Paged<Role>> {
        let state = self.state.read();
        let mut roles: Vec<Role> = state
            .roles
            .rows
            .values()
            .filter(|r| name_matches(&r.name, name))
            .cloned()
            .collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(page.slice(&roles))
    }

    async fn get_role(&self, key: Uuid) -> Result<Option<Role>> {
        let state = self.state.read();
        Ok(state.roles.rows.values().find(|r| r.key == key).cloned())
    }

    async fn get_role_by_name(&self, name: &str) -> Result<Option<Role>> {
        let state = self.state.read();
        Ok(state
            .roles
            .rows
            .values()
            .find(|r| r.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn get_role_by_keycloak_id(&self, group_id: Uuid) -> Result<Option<Role>> {
        let state = self.state.read();
        Ok(state
            .roles
            .rows
            .values()
            .find(|r| r.keycloak_group_id == Some(group_id))
            .cloned())
    }

    async fn insert_role(&self, mut role: Role) -> Result<Role> {
        let mut state = self.state.write();
        if state.role_id_by_key(role.key).is_some() {
            anyhow::bail!("Role with key {} already exists", role.key);
        }
        role.id = state.roles.allocate();
        stamp_new(&mut role);
        state.roles.rows.insert(role.id, role.clone());
        Ok(role)
    }

    async fn update_role(&self, mut role: Role, submitted: RowVersion) -> Result<WriteOutcome<Role>> {
        let mut state = self.state.write();
        let Some(id) = state.role_id_by_key(role.key) else {
            return Ok(WriteOutcome::NotFound);
        };
        role.id = id;
        let outcome = apply_update(state.roles.get(id), submitted, role);
        if let WriteOutcome::Written(updated) = &outcome {
            state.roles.rows.insert(id, updated.clone());
        }
        Ok(outcome)
    }

    async fn delete_role(&self, key: Uuid, submitted: RowVersion) -> Result<WriteOutcome<()>> {
        let mut state = self.state.write();
        let Some(id) = state.role_id_by_key(key) else {
            return Ok(WriteOutcome::NotFound);
        };
        let outcome = check_delete(state.roles.get(id), submitted);
        if outcome.is_written() {
            state.roles.rows.remove(&id);
        }
        Ok(outcome)
    }

    async fn remove_roles_except(&self, keep: &[Uuid]) -> Result<u64> {
        let mut state = self.state.write();
        let before = state.roles.rows.len();
        state.roles.rows.retain(|_, r| keep.contains(&r.key));
        Ok((before - state.roles.rows.len()) as u64)
    }
}

#[async_trait::async_trait]
impl TenantStore for MemoryStore {
    async fn get_tenant(&self, code: &str) -> Result<Option<Tenant>> {
        let state = self.state.read();
        Ok(state
            .tenant_id_by_code(code)
            .and_then(|id| state.tenants.get(id))
            .cloned())
    }

    async fn insert_tenant(&self, mut tenant: Tenant) -> Result<Tenant> {
        let mut state = self.state.write();
        if state.tenant_id_by_code(&tenant.code).is_some() {
            anyhow::bail!("Tenant with code {} already exists", tenant.code);
        }
        tenant.id = state.tenants.allocate();
        stamp_new(&mut tenant);
        state.tenants.rows.insert(tenant.id, tenant.clone());
        Ok(tenant)
    }

    async fn update_tenant(&self, mut tenant: Tenant, submitted: RowVersion) -> Result<WriteOutcome<Tenant>> {
        let mut state = self.state.write();
        let Some(id) = state.tenant_id_by_code(&tenant.code) else {
            return Ok(WriteOutcome::NotFound);
        };
        tenant.id = id;
        let outcome = apply_update(state.tenants.get(id), submitted, tenant);
        if let WriteOutcome::Written(updated) = &outcome {
            state.tenants.rows.insert(id, updated.clone());
        }
        Ok(outcome)
    }
}

#[async_trait::async_trait]
impl PropertyStore for MemoryStore {
    async fn list_properties(&self, filter: &PropertyFilter, page: PageRequest) -> Result<Paged<Property>> {
        let state = self.state.read();
        let properties: Vec<Property> = state
            .properties
            .rows
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        Ok(page.slice(&properties))
    }

    async fn get_property(&self, id: Id) -> Result<Option<Property>> {
        Ok(self.state.read().properties.get(id).cloned())
    }

    async fn find_property(&self, pid: Option<i32>, pin: Option<i32>) -> Result<Option<Property>> {
        let state = self.state.read();
        let rows = &state.properties.rows;
        let by_pid = pid.and_then(|pid| rows.values().find(|p| p.pid == Some(pid)));
        let found = by_pid.or_else(|| pin.and_then(|pin| rows.values().find(|p| p.pin == Some(pin))));
        Ok(found.cloned())
    }

    async fn insert_property(&self, mut property: Property) -> Result<Property> {
        let mut state = self.state.write();
        property.id = state.properties.allocate();
        stamp_new(&mut property);
        state.properties.rows.insert(property.id, property.clone());
        Ok(property)
    }

    async fn update_property(&self, property: Property, submitted: RowVersion) -> Result<WriteOutcome<Property>> {
        let mut state = self.state.write();
        let id = property.id;
        let outcome = apply_update(state.properties.get(id), submitted, property);
        if let WriteOutcome::Written(updated) = &outcome {
            state.properties.rows.insert(id, updated.clone());
        }
        Ok(outcome)
    }

    async fn get_property_associations(&self, id: Id) -> Result<Option<PropertyAssociations>> {
        let state = self.state.read();
        let Some(property) = state.properties.get(id) else {
            return Ok(None);
        };
        let leases = state
            .leases
            .rows
            .values()
            .filter(|l| l.properties.iter().any(|p| p.property_id == id))
            .map(|l| AssociationSummary {
                id: l.id,
                file_number: l.l_file_no.clone(),
                file_name: l.purpose.clone(),
                status: l.status.clone(),
                created_by: l.created_by.clone(),
                created_at: l.created_at,
            })
            .collect();
        let research_files = state
            .research_files
            .rows
            .values()
            .filter(|f| f.properties.iter().any(|p| p.property_id == id))
            .map(|f| AssociationSummary {
                id: f.id,
                file_number: f.file_number.clone(),
                file_name: Some(f.name.clone()),
                status: f.status.as_str().to_string(),
                created_by: f.created_by.clone(),
                created_at: f.created_at,
            })
            .collect();
        Ok(Some(PropertyAssociations {
            id,
            pid: property.pid,
            leases,
            research_files,
        }))
    }
}

#[async_trait::async_trait]
impl ResearchFileStore for MemoryStore {
    async fn list_research_files(
        &self,
        filter: &ResearchFileFilter,
        page: PageRequest,
    ) -> Result<Paged<ResearchFile>> {
        let state = self.state.read();
        let files: Vec<ResearchFile> = state
            .research_files
            .rows
            .values()
            .filter(|f| filter.matches(f))
            .cloned()
            .collect();
        Ok(page.slice(&files))
    }

    async fn get_research_file(&self, id: Id) -> Result<Option<ResearchFile>> {
        Ok(self.state.read().research_files.get(id).cloned())
    }

    async fn insert_research_file(&self, mut file: ResearchFile) -> Result<ResearchFile> {
        let mut state = self.state.write();
        file.id = state.research_files.allocate();
        file.file_number = format!("R-{}", file.id);
        stamp_new(&mut file);
        state.link_parcels(&mut file.properties);
        assign_child_ids(&mut file.properties, &mut state.child_sequence());
        state.research_files.rows.insert(file.id, file.clone());
        Ok(file)
    }

    async fn update_research_file(
        &self,
        mut file: ResearchFile,
        submitted: RowVersion,
    ) -> Result<WriteOutcome<ResearchFile>> {
        let mut state = self.state.write();
        let id = file.id;
        let Some(current) = state.research_files.get(id) else {
            return Ok(WriteOutcome::NotFound);
        };
        file.file_number = current.file_number.clone();
        file.properties = current.properties.clone();
        file.created_by = current.created_by.clone();
        file.created_at = current.created_at;
        let outcome = apply_update(Some(current), submitted, file);
        if let WriteOutcome::Written(updated) = &outcome {
            state.research_files.rows.insert(id, updated.clone());
        }
        Ok(outcome)
    }

    async fn replace_research_file_properties(
        &self,
        id: Id,
        submitted: RowVersion,
        mut properties: Vec<PropertyResearchFile>,
    ) -> Result<WriteOutcome<ResearchFile>> {
        let mut state = self.state.write();
        if state.research_files.get(id).is_none() {
            return Ok(WriteOutcome::NotFound);
        }
        if state.research_files.get(id).map(|f| f.row_version) == Some(submitted) {
            state.link_parcels(&mut properties);
            assign_child_ids(&mut properties, &mut state.child_sequence());
        }
        let outcome = replace_children(state.research_files.get(id), submitted, properties, |f, p| {
            f.properties = p;
            f.updated_at = Utc::now();
        });
        if let WriteOutcome::Written(updated) = &outcome {
            state.research_files.rows.insert(id, updated.clone());
        }
        Ok(outcome)
    }
}

#[async_trait::async_trait]
impl LeaseStore for MemoryStore {
    async fn list_leases(&self, filter: &LeaseFilter, page: PageRequest) -> Result<Paged<Lease>> {
        let state = self.state.read();
        let leases: Vec<Lease> = state
            .leases
            .rows
            .values()
            .filter(|l| filter.matches(l, &state.tenant_names(l)))
            .cloned()
            .collect();
        Ok(page.slice(&leases))
    }

    async fn get_lease(&self, id: Id) -> Result<Option<Lease>> {
        Ok(self.state.read().leases.get(id).cloned())
    }

    async fn insert_lease(&self, mut lease: Lease) -> Result<Lease> {
        let mut state = self.state.write();
        lease.id = state.leases.allocate();
        lease.l_file_no = format!("L-{}", lease.id);
        stamp_new(&mut lease);
        state.link_parcels(&mut lease.properties);
        {
            let mut next = state.child_sequence();
            assign_child_ids(&mut lease.tenants, &mut next);
            assign_child_ids(&mut lease.properties, &mut next);
            assign_child_ids(&mut lease.improvements, &mut next);
            assign_child_ids(&mut lease.insurances, &mut next);
            assign_child_ids(&mut lease.terms, &mut next);
            for term in lease.terms.iter_mut() {
                assign_child_ids(&mut term.payments, &mut next);
            }
        }
        state.leases.rows.insert(lease.id, lease.clone());
        Ok(lease)
    }

    async fn update_lease(&self, mut lease: Lease, submitted: RowVersion) -> Result<WriteOutcome<Lease>> {
        let mut state = self.state.write();
        let id = lease.id;
        let Some(current) = state.leases.get(id).cloned() else {
            return Ok(WriteOutcome::NotFound);
        };
        if current.row_version == submitted {
            state.link_parcels(&mut lease.properties);
            assign_child_ids(&mut lease.properties, &mut state.child_sequence());
        }
        lease.l_file_no = current.l_file_no.clone();
        lease.tenants = current.tenants.clone();
        lease.improvements = current.improvements.clone();
        lease.insurances = current.insurances.clone();
        lease.terms = current.terms.clone();
        lease.created_by = current.created_by.clone();
        lease.created_at = current.created_at;
        let outcome = apply_update(Some(&current), submitted, lease);
        if let WriteOutcome::Written(updated) = &outcome {
            state.leases.rows.insert(id, updated.clone());
        }
        Ok(outcome)
    }

    async fn replace_lease_collection(
        &self,
        id: Id,
        submitted: RowVersion,
        mut collection: LeaseCollection,
    ) -> Result<WriteOutcome<Lease>> {
        let mut state = self.state.write();
        let Some(current) = state.leases.get(id).cloned() else {
            return Ok(WriteOutcome::NotFound);
        };
        if current.row_version == submitted {
            collection.assign_ids(&mut state.child_sequence());
        }
        let outcome = replace_children(Some(&current), submitted, collection, |lease, c| {
            c.apply_to(lease);
            lease.updated_at = Utc::now();
        });
        if let WriteOutcome::Written(updated) = &outcome {
            state.leases.rows.insert(id, updated.clone());
        }
        Ok(outcome)
    }

    async fn get_person(&self, id: Id) -> Result<Option<Person>> {
        Ok(self.state.read().persons.get(id).cloned())
    }

    async fn get_organization(&self, id: Id) -> Result<Option<Organization>> {
        Ok(self.state.read().organizations.get(id).cloned())
    }

    async fn insert_person(&self, mut person: Person) -> Result<Person> {
        let mut state = self.state.write();
        person.id = state.persons.allocate();
        state.persons.rows.insert(person.id, person.clone());
        Ok(person)
    }

    async fn insert_organization(&self, mut organization: Organization) -> Result<Organization> {
        let mut state = self.state.write();
        organization.id = state.organizations.allocate();
        state.organizations.rows.insert(organization.id, organization.clone());
        Ok(organization)
    }
}

#[async_trait::async_trait]
impl ActivityStore for MemoryStore {
    async fn get_activity(&self, id: Id) -> Result<Option<ActivityInstance>> {
        Ok(self.state.read().activities.get(id).cloned())
    }

    async fn get_activity_row_version(&self, id: Id) -> Result<Option<RowVersion>> {
        Ok(self.state.read().activities.get(id).map(|a| a.row_version))
    }

    async fn list_activities(&self, kind: FileKind, file_id: Id) -> Result<Vec<ActivityInstance>> {
        let state = self.state.read();
        Ok(state
            .activities
            .rows
            .values()
            .filter(|a| a.file_kind == kind && a.file_id == file_id)
            .cloned()
            .collect())
    }

    async fn insert_activity(&self, mut activity: ActivityInstance) -> Result<ActivityInstance> {
        let mut state = self.state.write();
        activity.id = state.activities.allocate();
        stamp_new(&mut activity);
        state.activities.rows.insert(activity.id, activity.clone());
        Ok(activity)
    }

    async fn update_activity(
        &self,
        mut activity: ActivityInstance,
        submitted: RowVersion,
    ) -> Result<WriteOutcome<ActivityInstance>> {
        let mut state = self.state.write();
        let id = activity.id;
        let Some(current) = state.activities.get(id) else {
            return Ok(WriteOutcome::NotFound);
        };
        // The parent file and linked properties are not changed by a plain update
        activity.file_kind = current.file_kind;
        activity.file_id = current.file_id;
        activity.research_property_ids = current.research_property_ids.clone();
        activity.created_by = current.created_by.clone();
        activity.created_at = current.created_at;
        let outcome = apply_update(Some(current), submitted, activity);
        if let WriteOutcome::Written(updated) = &outcome {
            state.activities.rows.insert(id, updated.clone());
        }
        Ok(outcome)
    }

    async fn replace_activity_properties(
        &self,
        id: Id,
        submitted: RowVersion,
        research_property_ids: Vec<Id>,
    ) -> Result<WriteOutcome<ActivityInstance>> {
        let mut state = self.state.write();
        let outcome = replace_children(state.activities.get(id), submitted, research_property_ids, |a, ids| {
            a.research_property_ids = ids;
        });
        if let WriteOutcome::Written(updated) = &outcome {
            state.activities.rows.insert(id, updated.clone());
        }
        Ok(outcome)
    }

    async fn delete_activity(&self, id: Id, submitted: RowVersion) -> Result<WriteOutcome<()>> {
        let mut state = self.state.write();
        let outcome = check_delete(state.activities.get(id), submitted);
        if outcome.is_written() {
            state.activities.rows.remove(&id);
        }
        Ok(outcome)
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn list_document_types(&self) -> Result<Vec<DocumentType>> {
        let state = self.state.read();
        let mut types: Vec<DocumentType> = state.document_types.rows.values().cloned().collect();
        types.sort_by(|a, b| a.description.cmp(&b.description));
        Ok(types)
    }

    async fn get_document_type(&self, id: Id) -> Result<Option<DocumentType>> {
        Ok(self.state.read().document_types.get(id).cloned())
    }

    async fn insert_document_type(&self, mut document_type: DocumentType) -> Result<DocumentType> {
        let mut state = self.state.write();
        document_type.id = state.document_types.allocate();
        state
            .document_types
            .rows
            .insert(document_type.id, document_type.clone());
        Ok(document_type)
    }

    async fn get_document(&self, id: Id) -> Result<Option<Document>> {
        Ok(self.state.read().documents.get(id).cloned())
    }

    async fn update_document(&self, document: Document, submitted: RowVersion) -> Result<WriteOutcome<Document>> {
        let mut state = self.state.write();
        let id = document.id;
        let outcome = apply_update(state.documents.get(id), submitted, document);
        if let WriteOutcome::Written(updated) = &outcome {
            state.documents.rows.insert(id, updated.clone());
            // Relationships embed a snapshot of the document
            for relationship in state.relationships.rows.values_mut() {
                if relationship.document.id == id {
                    relationship.document = updated.clone();
                }
            }
        }
        Ok(outcome)
    }

    async fn list_document_relationships(&self, kind: FileKind, parent_id: Id) -> Result<Vec<DocumentRelationship>> {
        let state = self.state.read();
        Ok(state
            .relationships
            .rows
            .values()
            .filter(|r| r.parent_kind == kind && r.parent_id == parent_id)
            .cloned()
            .collect())
    }

    async fn get_document_relationship(&self, id: Id) -> Result<Option<DocumentRelationship>> {
        Ok(self.state.read().relationships.get(id).cloned())
    }

    async fn insert_document_relationship(
        &self,
        kind: FileKind,
        parent_id: Id,
        mut document: Document,
    ) -> Result<DocumentRelationship> {
        let mut state = self.state.write();
        document.id = state.documents.allocate();
        stamp_new(&mut document);
        state.documents.rows.insert(document.id, document.clone());

        let relationship = DocumentRelationship {
            id: state.relationships.allocate(),
            parent_kind: kind,
            parent_id,
            document,
        };
        state
            .relationships
            .rows
            .insert(relationship.id, relationship.clone());
        Ok(relationship)
    }

    async fn delete_document_relationship(&self, id: Id) -> Result<Option<(DocumentRelationship, bool)>> {
        let mut state = self.state.write();
        let Some(relationship) = state.relationships.rows.remove(&id) else {
            return Ok(None);
        };
        let document_id = relationship.document.id;
        let still_linked = state
            .relationships
            .rows
            .values()
            .any(|r| r.document.id == document_id);
        if !still_linked {
            state.documents.rows.remove(&document_id);
        }
        Ok(Some((relationship, !still_linked)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LeaseTenant, PropertyLease, ResearchFileStatus};

    fn role(name: &str) -> Role {
        Role {
            id: 0,
            key: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            is_public: false,
            is_disabled: false,
            sort_order: 0,
            keycloak_group_id: None,
            claims: Vec::new(),
            row_version: 0,
        }
    }

    fn lease() -> Lease {
        let now = Utc::now();
        Lease {
            id: 0,
            l_file_no: String::new(),
            purpose: None,
            status: "ACTIVE".to_string(),
            payment_frequency: None,
            start_date: None,
            expiry_date: None,
            amount: None,
            note: None,
            tenants: Vec::new(),
            properties: Vec::new(),
            improvements: Vec::new(),
            insurances: Vec::new(),
            terms: Vec::new(),
            created_by: "test".to_string(),
            created_at: now,
            updated_by: "test".to_string(),
            updated_at: now,
            row_version: 0,
        }
    }

    #[tokio::test]
    async fn insert_stamps_initial_version() {
        let store = MemoryStore::new();
        let mut r = role("role1");
        r.row_version = 42;
        let created = store.insert_role(r).await.unwrap();
        assert_eq!(created.row_version, 1);

        let fetched = store.get_role(created.key).await.unwrap().unwrap();
        assert_eq!(fetched.name, "role1");
        assert_eq!(fetched.row_version, 1);
    }

    #[tokio::test]
    async fn stale_update_leaves_role_unchanged() {
        let store = MemoryStore::new();
        let created = store.insert_role(role("role1")).await.unwrap();

        let mut renamed = created.clone();
        renamed.name = "renamed".to_string();
        let first = store.update_role(renamed.clone(), 1).await.unwrap();
        assert!(matches!(first, WriteOutcome::Written(ref r) if r.row_version == 2));

        renamed.name = "lost update".to_string();
        let second = store.update_role(renamed, 1).await.unwrap();
        assert_eq!(
            second,
            WriteOutcome::Conflict {
                submitted: 1,
                current: 2
            }
        );
        let stored = store.get_role(created.key).await.unwrap().unwrap();
        assert_eq!(stored.name, "renamed");
    }

    #[tokio::test]
    async fn remove_roles_except_keeps_listed_keys() {
        let store = MemoryStore::new();
        let keep = store.insert_role(role("keep")).await.unwrap();
        store.insert_role(role("drop-a")).await.unwrap();
        store.insert_role(role("drop-b")).await.unwrap();

        let removed = store.remove_roles_except(&[keep.key]).await.unwrap();
        assert_eq!(removed, 2);
        let page = store.list_roles(PageRequest::default(), None).await.unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn lease_collection_replace_assigns_ids_and_advances_token() {
        let store = MemoryStore::new();
        let person = store
            .insert_person(Person {
                id: 0,
                first_name: "Jane".to_string(),
                surname: "Doe".to_string(),
            })
            .await
            .unwrap();
        let created = store.insert_lease(lease()).await.unwrap();
        assert_eq!(created.l_file_no, format!("L-{}", created.id));

        let tenants = vec![LeaseTenant {
            id: 0,
            party: TenantParty::Person {
                person_id: person.id,
            },
            lessee_type: None,
            note: None,
        }];
        let outcome = store
            .replace_lease_collection(created.id, 1, LeaseCollection::Tenants(tenants))
            .await
            .unwrap();
        let WriteOutcome::Written(updated) = outcome else {
            panic!("expected write");
        };
        assert_eq!(updated.row_version, 2);
        assert!(updated.tenants[0].id > 0);

        let filter = LeaseFilter {
            tenant_name: Some("doe".to_string()),
            ..Default::default()
        };
        let page = store.list_leases(&filter, PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 1);
    }

    fn unlinked_parcel(pid: i32) -> PropertyLease {
        PropertyLease {
            id: 0,
            property_id: 0,
            pid: Some(pid),
            pin: None,
            lease_area: None,
            area_unit: None,
        }
    }

    #[tokio::test]
    async fn stale_lease_update_adds_no_parcels() {
        let store = MemoryStore::new();
        let created = store.insert_lease(lease()).await.unwrap();

        let mut stale = created.clone();
        stale.properties = vec![unlinked_parcel(999_888_777)];
        let outcome = store.update_lease(stale, 7).await.unwrap();
        assert_eq!(
            outcome,
            WriteOutcome::Conflict {
                submitted: 7,
                current: 1
            }
        );
        assert!(store.find_property(Some(999_888_777), None).await.unwrap().is_none());

        let mut fresh = created;
        fresh.properties = vec![unlinked_parcel(999_888_777), unlinked_parcel(999_888_777)];
        let WriteOutcome::Written(updated) = store.update_lease(fresh, 1).await.unwrap() else {
            panic!("expected write");
        };
        let parcel = store.find_property(Some(999_888_777), None).await.unwrap().unwrap();
        assert!(updated.properties.iter().all(|p| p.property_id == parcel.id));
        let page = store
            .list_properties(&PropertyFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn research_file_numbers_follow_ids() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let file = ResearchFile {
            id: 0,
            file_number: String::new(),
            name: "Highway 1 widening".to_string(),
            status: ResearchFileStatus::Active,
            road_name: None,
            road_alias: None,
            request_date: None,
            request_description: None,
            requestor: None,
            result_date: None,
            result_description: None,
            expropriation: false,
            expropriation_notes: None,
            properties: Vec::new(),
            created_by: "test".to_string(),
            created_at: now,
            updated_by: "test".to_string(),
            updated_at: now,
            row_version: 0,
        };
        let created = store.insert_research_file(file).await.unwrap();
        assert_eq!(created.file_number, format!("R-{}", created.id));
        assert_eq!(
            store
                .replace_research_file_properties(created.id + 100, 1, Vec::new())
                .await
                .unwrap(),
            WriteOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn deleting_last_relationship_removes_document() {
        let store = MemoryStore::new();
        let document = Document {
            id: 0,
            mayan_document_id: 77,
            document_type_id: 1,
            status_code: "AMEND".to_string(),
            file_name: "survey.pdf".to_string(),
            checksum: String::new(),
            created_by: "test".to_string(),
            created_at: Utc::now(),
            row_version: 0,
        };
        let relationship = store
            .insert_document_relationship(FileKind::Lease, 9, document)
            .await
            .unwrap();
        let (removed, document_removed) = store
            .delete_document_relationship(relationship.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(removed.parent_id, 9);
        assert!(document_removed);
        assert!(store.get_document(relationship.document.id).await.unwrap().is_none());
    }
}
