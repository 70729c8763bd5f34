use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::capacity::model::{GroupSession, Slot};

/// Read/seed access to the capacity store.
///
/// All capacity *mutation* happens inside `BookingRepository` transactions;
/// this trait only covers lookups and schedule-generation inserts.
#[async_trait]
pub trait CapacityRepository: Send + Sync {
    async fn fetch_slot(&self, slot_id: &Uuid) -> Result<Option<Slot>>;

    async fn fetch_group_session(&self, session_id: &Uuid) -> Result<Option<GroupSession>>;

    async fn insert_slot(&self, slot: &Slot) -> Result<()>;

    async fn insert_group_session(&self, session: &GroupSession) -> Result<()>;
}
