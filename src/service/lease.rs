use crate::error::{PimsError, PimsResult};
use crate::logic::guard::require;
use crate::model::{
    Id, Insurance, Lease, LeaseCollection, LeasePayment, LeaseTenant, LeaseTerm,
    ParentConcurrencyGuard, Permission, PropertyImprovement, PropertyLease, RowVersion,
};
use crate::repository::{LeaseRepository, PropertyRepository, RepositoryScope};
use crate::service::check_guard_parent;
use crate::store::Store;

pub struct LeaseService<'a, S> {
    scope: RepositoryScope<'a, S>,
}

impl<'a, S: Store> LeaseService<'a, S> {
    pub fn new(scope: RepositoryScope<'a, S>) -> Self {
        Self { scope }
    }

    fn leases(&self) -> LeaseRepository<'a, S> {
        LeaseRepository::new(self.scope)
    }

    /// Lease properties are matched by id, then PID or PIN.
    async fn resolve_properties(&self, properties: &mut [PropertyLease]) -> PimsResult<()> {
        PropertyRepository::new(self.scope).link_existing(properties).await
    }

    pub async fn add(&self, mut lease: Lease) -> PimsResult<Lease> {
        require(self.scope.user, Permission::LeaseAdd)?;
        self.resolve_properties(&mut lease.properties).await?;
        self.leases().add(lease).await
    }

    pub async fn update(&self, mut lease: Lease, submitted: RowVersion) -> PimsResult<Lease> {
        require(self.scope.user, Permission::LeaseEdit)?;
        self.resolve_properties(&mut lease.properties).await?;
        self.leases().update(lease, submitted).await
    }

    pub async fn update_tenants(&self, id: Id, submitted: RowVersion, tenants: Vec<LeaseTenant>) -> PimsResult<Lease> {
        self.leases()
            .replace_collection(id, submitted, LeaseCollection::Tenants(tenants))
            .await
    }

    pub async fn update_improvements(
        &self,
        id: Id,
        submitted: RowVersion,
        improvements: Vec<PropertyImprovement>,
    ) -> PimsResult<Lease> {
        self.leases()
            .replace_collection(id, submitted, LeaseCollection::Improvements(improvements))
            .await
    }

    pub async fn update_insurances(
        &self,
        id: Id,
        submitted: RowVersion,
        insurances: Vec<Insurance>,
    ) -> PimsResult<Lease> {
        self.leases()
            .replace_collection(id, submitted, LeaseCollection::Insurances(insurances))
            .await
    }

    /// Load the lease a guarded edit targets and hand back its terms
    async fn guarded_terms<T>(&self, lease_id: Id, guard: &ParentConcurrencyGuard<T>) -> PimsResult<Vec<LeaseTerm>> {
        require(self.scope.user, Permission::LeaseEdit)?;
        check_guard_parent(guard, lease_id)?;
        Ok(self.leases().get(lease_id).await?.terms)
    }

    async fn save_terms(&self, lease_id: Id, submitted: RowVersion, terms: Vec<LeaseTerm>) -> PimsResult<Lease> {
        self.leases()
            .replace_collection(lease_id, submitted, LeaseCollection::Terms(terms))
            .await
    }

    pub async fn add_term(&self, lease_id: Id, guard: ParentConcurrencyGuard<LeaseTerm>) -> PimsResult<Lease> {
        let mut terms = self.guarded_terms(lease_id, &guard).await?;
        let mut term = guard.payload;
        term.id = 0;
        for payment in term.payments.iter_mut() {
            payment.id = 0;
        }
        terms.push(term);
        self.save_terms(lease_id, guard.parent_row_version, terms).await
    }

    /// Term fields only; its payments are edited through the payment operations.
    pub async fn update_term(&self, lease_id: Id, guard: ParentConcurrencyGuard<LeaseTerm>) -> PimsResult<Lease> {
        let mut terms = self.guarded_terms(lease_id, &guard).await?;
        let mut term = guard.payload;
        let Some(slot) = terms.iter_mut().find(|t| t.id == term.id) else {
            return Err(PimsError::not_found("lease term", term.id));
        };
        term.payments = std::mem::take(&mut slot.payments);
        *slot = term;
        self.save_terms(lease_id, guard.parent_row_version, terms).await
    }

    pub async fn delete_term(&self, lease_id: Id, guard: ParentConcurrencyGuard<LeaseTerm>) -> PimsResult<Lease> {
        let mut terms = self.guarded_terms(lease_id, &guard).await?;
        let term_id = guard.payload.id;
        let Some(index) = terms.iter().position(|t| t.id == term_id) else {
            return Err(PimsError::not_found("lease term", term_id));
        };
        if !terms[index].payments.is_empty() {
            return Err(PimsError::validation(
                "A term with payments cannot be deleted; remove its payments first",
            ));
        }
        terms.remove(index);
        self.save_terms(lease_id, guard.parent_row_version, terms).await
    }

    fn term_mut(terms: &mut [LeaseTerm], term_id: Id) -> PimsResult<&mut LeaseTerm> {
        terms
            .iter_mut()
            .find(|t| t.id == term_id)
            .ok_or_else(|| PimsError::not_found("lease term", term_id))
    }

    pub async fn add_payment(
        &self,
        lease_id: Id,
        term_id: Id,
        guard: ParentConcurrencyGuard<LeasePayment>,
    ) -> PimsResult<Lease> {
        let mut terms = self.guarded_terms(lease_id, &guard).await?;
        let mut payment = guard.payload;
        payment.id = 0;
        Self::term_mut(&mut terms, term_id)?.payments.push(payment);
        self.save_terms(lease_id, guard.parent_row_version, terms).await
    }

    pub async fn update_payment(
        &self,
        lease_id: Id,
        term_id: Id,
        guard: ParentConcurrencyGuard<LeasePayment>,
    ) -> PimsResult<Lease> {
        let mut terms = self.guarded_terms(lease_id, &guard).await?;
        let payment = guard.payload;
        let term = Self::term_mut(&mut terms, term_id)?;
        let Some(slot) = term.payments.iter_mut().find(|p| p.id == payment.id) else {
            return Err(PimsError::not_found("lease payment", payment.id));
        };
        *slot = payment;
        self.save_terms(lease_id, guard.parent_row_version, terms).await
    }

    pub async fn delete_payment(
        &self,
        lease_id: Id,
        term_id: Id,
        guard: ParentConcurrencyGuard<LeasePayment>,
    ) -> PimsResult<Lease> {
        let mut terms = self.guarded_terms(lease_id, &guard).await?;
        let payment_id = guard.payload.id;
        let term = Self::term_mut(&mut terms, term_id)?;
        let before = term.payments.len();
        term.payments.retain(|p| p.id != payment_id);
        if term.payments.len() == before {
            return Err(PimsError::not_found("lease payment", payment_id));
        }
        self.save_terms(lease_id, guard.parent_row_version, terms).await
    }
}
