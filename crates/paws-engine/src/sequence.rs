//! Per-day registration sequence numbers

use std::sync::Arc;

use chrono::NaiveDate;
use paws_core::incumbent::format_reg_id;
use paws_core::{
    DispositionAction, Error, RegionContext, RegistrationDisposition, Result, SequenceState,
};

use crate::ports::RegistryStore;

/// Attempts before a lost compare-and-swap race is reported as contention
const MAX_SWAP_ATTEMPTS: usize = 64;

/// Issues strictly increasing sequence numbers per region and day.
///
/// The counter lives in the registry store; concurrent callers are serialized
/// by compare-and-swap on the stored state, so no two callers in the same
/// region can be handed the same number.
#[derive(Clone)]
pub struct SequenceGenerator {
    store: Arc<dyn RegistryStore>,
}

impl SequenceGenerator {
    pub fn new(store: Arc<dyn RegistryStore>) -> Self {
        Self { store }
    }

    pub async fn next_sequence(&self, ctx: &RegionContext) -> Result<(NaiveDate, u32)> {
        let today = ctx.today();
        for attempt in 1..=MAX_SWAP_ATTEMPTS {
            let current = self.store.sequence_state(&ctx.region_key).await?;
            let next = SequenceState::advance(current.as_ref(), today);
            if self
                .store
                .compare_and_swap_sequence(&ctx.region_key, current, next)
                .await?
            {
                return Ok((next.date, next.counter));
            }
            tracing::debug!(region = %ctx.region_key, attempt, "Sequence swap lost, retrying");
        }
        Err(Error::Contention(ctx.region_key.clone()))
    }

    /// Allocate a registration id and wrap it in a disposition
    pub async fn next_disposition(
        &self,
        ctx: &RegionContext,
        action: DispositionAction,
    ) -> Result<RegistrationDisposition> {
        let (date, sequence) = self.next_sequence(ctx).await?;
        Ok(RegistrationDisposition {
            reg_id: format_reg_id(date, &ctx.org_code, sequence),
            reg_date: ctx.now,
            action,
        })
    }
}
