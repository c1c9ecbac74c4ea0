use chrono::Utc;

use crate::error::{resolve_outcome, PimsError, PimsResult};
use crate::logic::guard::require;
use crate::logic::validate::{validate_insurances, validate_lease_tenants, validate_term};
use crate::model::{
    Id, Lease, LeaseCollection, LeaseFilter, PageRequest, Paged, Permission, RowVersion,
    TenantParty,
};
use crate::repository::RepositoryScope;
use crate::store::Store;

pub struct LeaseRepository<'a, S> {
    scope: RepositoryScope<'a, S>,
}

impl<'a, S: Store> LeaseRepository<'a, S> {
    pub fn new(scope: RepositoryScope<'a, S>) -> Self {
        Self { scope }
    }

    pub async fn get_page(&self, filter: &LeaseFilter, page: PageRequest) -> PimsResult<Paged<Lease>> {
        require(self.scope.user, Permission::LeaseView)?;
        Ok(self.scope.store.list_leases(filter, page).await?)
    }

    pub async fn get(&self, id: Id) -> PimsResult<Lease> {
        require(self.scope.user, Permission::LeaseView)?;
        self.scope
            .store
            .get_lease(id)
            .await?
            .ok_or_else(|| PimsError::not_found("lease", id))
    }

    pub async fn add(&self, mut lease: Lease) -> PimsResult<Lease> {
        require(self.scope.user, Permission::LeaseAdd)?;
        validate_lease_tenants(&lease.tenants)?;
        validate_insurances(&lease.insurances)?;
        for term in &lease.terms {
            validate_term(term)?;
        }
        self.check_parties(&lease.tenants.iter().map(|t| t.party.clone()).collect::<Vec<_>>())
            .await?;
        let now = Utc::now();
        lease.created_by = self.scope.user.audit_name();
        lease.created_at = now;
        lease.updated_by = lease.created_by.clone();
        lease.updated_at = now;
        let created = self.scope.store.insert_lease(lease).await?;
        log::info!("Added lease {}", created.l_file_no);
        Ok(created)
    }

    /// Header fields and the property collection
    pub async fn update(&self, mut lease: Lease, submitted: RowVersion) -> PimsResult<Lease> {
        require(self.scope.user, Permission::LeaseEdit)?;
        lease.updated_by = self.scope.user.audit_name();
        lease.updated_at = Utc::now();
        let id = lease.id;
        let outcome = self.scope.store.update_lease(lease, submitted).await?;
        let updated = resolve_outcome(outcome, "lease", id)?;
        log::info!("Updated lease {} to version {}", id, updated.row_version);
        Ok(updated)
    }

    /// Replace one child collection wholesale under the lease's version.
    pub async fn replace_collection(
        &self,
        id: Id,
        submitted: RowVersion,
        collection: LeaseCollection,
    ) -> PimsResult<Lease> {
        require(self.scope.user, Permission::LeaseEdit)?;
        match &collection {
            LeaseCollection::Tenants(tenants) => {
                validate_lease_tenants(tenants)?;
                self.check_parties(&tenants.iter().map(|t| t.party.clone()).collect::<Vec<_>>())
                    .await?;
            }
            LeaseCollection::Insurances(insurances) => validate_insurances(insurances)?,
            LeaseCollection::Terms(terms) => {
                for term in terms {
                    validate_term(term)?;
                }
            }
            LeaseCollection::Properties(_) | LeaseCollection::Improvements(_) => {}
        }
        let name = collection.name();
        let count = collection.len();
        let outcome = self
            .scope
            .store
            .replace_lease_collection(id, submitted, collection)
            .await?;
        let updated = resolve_outcome(outcome, "lease", id)?;
        log::info!(
            "Replaced {} {} on lease {}, now version {}",
            count,
            name,
            id,
            updated.row_version
        );
        Ok(updated)
    }

    /// Display name of a tenant party, if the backing record exists
    pub async fn party_name(&self, party: &TenantParty) -> PimsResult<Option<String>> {
        let name = match party {
            TenantParty::Person { person_id } => {
                self.scope.store.get_person(*person_id).await?.map(|p| p.full_name())
            }
            TenantParty::Organization { organization_id } => self
                .scope
                .store
                .get_organization(*organization_id)
                .await?
                .map(|o| o.name),
        };
        Ok(name)
    }

    async fn check_parties(&self, parties: &[TenantParty]) -> PimsResult<()> {
        for party in parties {
            if self.party_name(party).await?.is_none() {
                return Err(match party {
                    TenantParty::Person { person_id } => PimsError::validation(format!(
                        "Tenant person {} does not exist",
                        person_id
                    )),
                    TenantParty::Organization { organization_id } => PimsError::validation(
                        format!("Tenant organization {} does not exist", organization_id),
                    ),
                });
            }
        }
        Ok(())
    }
}
