use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use shared::{
    domain::{CallId, CallStateChange, OperatorId, RegistryStatus, TicketId},
    error::ApiError,
    protocol::CallRecord,
};
use tokio::sync::RwLock;
use tracing::info;

const MAX_ORIGIN_NUMBER_LEN: usize = 32;

#[derive(Default)]
struct CallTable {
    next_id: i64,
    calls: HashMap<CallId, CallRecord>,
}

/// In-memory call registry shared by every route handler.
#[derive(Clone, Default)]
pub struct ApiContext {
    calls: Arc<RwLock<CallTable>>,
}

impl ApiContext {
    pub fn new() -> Self {
        Self::default()
    }
}

pub async fn create_call(
    ctx: &ApiContext,
    operator_id: OperatorId,
    origin_number: &str,
) -> Result<CallRecord, ApiError> {
    let origin_number = origin_number.trim();
    if origin_number.is_empty() {
        return Err(ApiError::validation("origin number cannot be empty"));
    }
    if origin_number.len() > MAX_ORIGIN_NUMBER_LEN {
        return Err(ApiError::validation("origin number is too long"));
    }

    let mut table = ctx.calls.write().await;
    table.next_id += 1;
    let now = Utc::now();
    let record = CallRecord {
        id: CallId(table.next_id),
        operator_id,
        origin_number: origin_number.to_string(),
        status: RegistryStatus::Ringing,
        duration_seconds: None,
        ticket_id: None,
        created_at: now,
        updated_at: now,
    };
    table.calls.insert(record.id, record.clone());
    info!(call_id = %record.id, %operator_id, origin_number, "call created");
    Ok(record)
}

pub async fn change_call_state(
    ctx: &ApiContext,
    call_id: CallId,
    state: CallStateChange,
) -> Result<CallRecord, ApiError> {
    let mut table = ctx.calls.write().await;
    let record = lookup_mut(&mut table, call_id)?;
    if record.status != RegistryStatus::Ringing {
        return Err(ApiError::conflict(format!(
            "call {call_id} is {} and can no longer change state",
            record.status.as_str()
        )));
    }
    record.status = state.into();
    record.updated_at = Utc::now();
    info!(%call_id, status = record.status.as_str(), "call state changed");
    Ok(record.clone())
}

pub async fn finalize_call(
    ctx: &ApiContext,
    call_id: CallId,
    duration_seconds: u64,
) -> Result<CallRecord, ApiError> {
    let mut table = ctx.calls.write().await;
    let record = lookup_mut(&mut table, call_id)?;
    if record.status != RegistryStatus::Accepted {
        return Err(ApiError::conflict(format!(
            "call {call_id} is {} and cannot be finalized",
            record.status.as_str()
        )));
    }
    record.status = RegistryStatus::Finalized;
    record.duration_seconds = Some(duration_seconds);
    record.updated_at = Utc::now();
    info!(%call_id, duration_seconds, "call finalized");
    Ok(record.clone())
}

pub async fn associate_ticket(
    ctx: &ApiContext,
    call_id: CallId,
    ticket_id: TicketId,
) -> Result<CallRecord, ApiError> {
    let mut table = ctx.calls.write().await;
    let record = lookup_mut(&mut table, call_id)?;
    if !matches!(
        record.status,
        RegistryStatus::Accepted | RegistryStatus::Finalized
    ) {
        return Err(ApiError::conflict(format!(
            "call {call_id} was never answered; tickets attach to answered calls only"
        )));
    }
    record.ticket_id = Some(ticket_id);
    record.updated_at = Utc::now();
    info!(%call_id, %ticket_id, "ticket associated with call");
    Ok(record.clone())
}

pub async fn get_call(ctx: &ApiContext, call_id: CallId) -> Result<CallRecord, ApiError> {
    let table = ctx.calls.read().await;
    table
        .calls
        .get(&call_id)
        .cloned()
        .ok_or_else(|| not_found(call_id))
}

pub async fn list_calls(ctx: &ApiContext, operator_id: Option<OperatorId>) -> Vec<CallRecord> {
    let table = ctx.calls.read().await;
    let mut calls = table
        .calls
        .values()
        .filter(|call| operator_id.map_or(true, |id| call.operator_id == id))
        .cloned()
        .collect::<Vec<_>>();
    calls.sort_by_key(|call| call.id.0);
    calls
}

fn lookup_mut(table: &mut CallTable, call_id: CallId) -> Result<&mut CallRecord, ApiError> {
    table.calls.get_mut(&call_id).ok_or_else(|| not_found(call_id))
}

fn not_found(call_id: CallId) -> ApiError {
    ApiError::not_found(format!("call {call_id} not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorCode;

    async fn setup() -> (ApiContext, CallRecord) {
        let ctx = ApiContext::new();
        let call = create_call(&ctx, OperatorId(7), "+51 912 345 678")
            .await
            .expect("call");
        (ctx, call)
    }

    #[tokio::test]
    async fn created_calls_start_ringing_with_sequential_ids() {
        let (ctx, first) = setup().await;
        let second = create_call(&ctx, OperatorId(7), "+51 987 654 321")
            .await
            .expect("call");
        assert_eq!(first.status, RegistryStatus::Ringing);
        assert_eq!(first.id, CallId(1));
        assert_eq!(second.id, CallId(2));
    }

    #[tokio::test]
    async fn empty_origin_number_is_rejected() {
        let ctx = ApiContext::new();
        let err = create_call(&ctx, OperatorId(7), "  ")
            .await
            .expect_err("should fail");
        assert_eq!(err.code, ErrorCode::Validation);
    }

    #[tokio::test]
    async fn declined_call_cannot_be_accepted_afterwards() {
        let (ctx, call) = setup().await;
        let declined = change_call_state(&ctx, call.id, CallStateChange::Declined)
            .await
            .expect("decline");
        assert_eq!(declined.status, RegistryStatus::Declined);

        let err = change_call_state(&ctx, call.id, CallStateChange::Accepted)
            .await
            .expect_err("should fail");
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn finalize_requires_accepted_call_and_records_duration() {
        let (ctx, call) = setup().await;
        let err = finalize_call(&ctx, call.id, 10)
            .await
            .expect_err("ringing call cannot be finalized");
        assert_eq!(err.code, ErrorCode::Conflict);

        change_call_state(&ctx, call.id, CallStateChange::Accepted)
            .await
            .expect("accept");
        let finalized = finalize_call(&ctx, call.id, 125).await.expect("finalize");
        assert_eq!(finalized.status, RegistryStatus::Finalized);
        assert_eq!(finalized.duration_seconds, Some(125));
    }

    #[tokio::test]
    async fn ticket_attaches_only_to_answered_calls() {
        let (ctx, call) = setup().await;
        let err = associate_ticket(&ctx, call.id, TicketId(3))
            .await
            .expect_err("ringing call has no ticket");
        assert_eq!(err.code, ErrorCode::Conflict);

        change_call_state(&ctx, call.id, CallStateChange::Accepted)
            .await
            .expect("accept");
        let linked = associate_ticket(&ctx, call.id, TicketId(3))
            .await
            .expect("associate");
        assert_eq!(linked.ticket_id, Some(TicketId(3)));
    }

    #[tokio::test]
    async fn unknown_call_is_not_found() {
        let ctx = ApiContext::new();
        let err = get_call(&ctx, CallId(99)).await.expect_err("missing");
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn list_filters_by_operator() {
        let (ctx, _) = setup().await;
        create_call(&ctx, OperatorId(8), "+51 900 000 000")
            .await
            .expect("call");
        assert_eq!(list_calls(&ctx, None).await.len(), 2);
        let mine = list_calls(&ctx, Some(OperatorId(8))).await;
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].operator_id, OperatorId(8));
    }
}
