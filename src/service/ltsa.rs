use crate::error::{PimsError, PimsResult};
use crate::external::ltsa::{LtsaClient, LtsaOrders};
use crate::logic::guard::require;
use crate::model::{normalize_pid, Permission, UserContext};

pub struct LtsaService<'a> {
    client: &'a dyn LtsaClient,
    user: &'a UserContext,
}

impl<'a> LtsaService<'a> {
    pub fn new(client: &'a dyn LtsaClient, user: &'a UserContext) -> Self {
        Self { client, user }
    }

    /// Title orders for the parcel's active title plus a parcel-info order.
    /// Any upstream failure is returned as-is; nothing is retried.
    pub async fn get_orders(&self, pid: &str) -> PimsResult<LtsaOrders> {
        require(self.user, Permission::PropertyView)?;
        let pid = normalize_pid(pid)
            .ok_or_else(|| PimsError::validation(format!("'{}' is not a valid PID", pid)))?;

        let summaries = self.client.get_title_summaries(&pid).await?;
        let mut title_orders = Vec::new();
        if let Some(title) = summaries.iter().find(|s| s.is_active()) {
            log::debug!("Ordering title {} for PID {}", title.title_number, pid);
            title_orders.push(
                self.client
                    .post_title_order(&title.title_number, &title.land_title_district_code)
                    .await?,
            );
        }
        let parcel_info = self.client.post_parcel_info_order(&pid).await?;

        Ok(LtsaOrders {
            title_orders,
            parcel_info: Some(parcel_info),
        })
    }
}
