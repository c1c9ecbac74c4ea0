use crate::error::{resolve_outcome, PimsError, PimsResult};
use crate::logic::guard::require;
use crate::logic::validate::validate_parcel_ids;
use crate::model::{
    Id, PageRequest, Paged, ParcelLink, Permission, Property, PropertyAssociations, PropertyFilter,
    RowVersion,
};
use crate::repository::RepositoryScope;
use crate::store::Store;

pub struct PropertyRepository<'a, S> {
    scope: RepositoryScope<'a, S>,
}

impl<'a, S: Store> PropertyRepository<'a, S> {
    pub fn new(scope: RepositoryScope<'a, S>) -> Self {
        Self { scope }
    }

    pub async fn get_page(&self, filter: &PropertyFilter, page: PageRequest) -> PimsResult<Paged<Property>> {
        require(self.scope.user, Permission::PropertyView)?;
        Ok(self.scope.store.list_properties(filter, page).await?)
    }

    pub async fn get(&self, id: Id) -> PimsResult<Property> {
        require(self.scope.user, Permission::PropertyView)?;
        self.scope
            .store
            .get_property(id)
            .await?
            .ok_or_else(|| PimsError::not_found("property", id))
    }

    pub async fn get_associations(&self, id: Id) -> PimsResult<PropertyAssociations> {
        require(self.scope.user, Permission::PropertyView)?;
        self.scope
            .store
            .get_property_associations(id)
            .await?
            .ok_or_else(|| PimsError::not_found("property", id))
    }

    pub async fn update(&self, property: Property, submitted: RowVersion) -> PimsResult<Property> {
        require(self.scope.user, Permission::PropertyEdit)?;
        validate_parcel_ids(property.pid, property.pin)?;
        let id = property.id;
        let outcome = self.scope.store.update_property(property, submitted).await?;
        let updated = resolve_outcome(outcome, "property", id)?;
        log::info!("Updated property {} to version {}", id, updated.row_version);
        Ok(updated)
    }

    /// Point each link at an existing inventory record, by id, then PID,
    /// then PIN. Unknown parcels stay unlinked; the store adds them in the
    /// same write that stores the file. Callers have already checked the
    /// capability for the file being written.
    pub(crate) async fn link_existing<L: ParcelLink>(&self, links: &mut [L]) -> PimsResult<()> {
        for link in links.iter_mut() {
            validate_parcel_ids(link.pid(), link.pin())?;
            if link.is_linked() {
                let id = link.property_id();
                let property = self
                    .scope
                    .store
                    .get_property(id)
                    .await?
                    .ok_or_else(|| PimsError::not_found("property", id))?;
                link.link_to(&property);
                continue;
            }
            if link.pid().is_none() && link.pin().is_none() {
                return Err(PimsError::validation("A property must have a PID or PIN"));
            }
            if let Some(existing) = self.scope.store.find_property(link.pid(), link.pin()).await? {
                link.link_to(&existing);
            }
        }
        Ok(())
    }
}
