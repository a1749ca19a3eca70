//! In-memory LeaveApi for tests: scripted responses, recorded calls.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use contracts::usecases::u101_apply_leave::{ApplyLeaveRequest, ApplyResponse, ForceApplyRequest};
use contracts::usecases::u102_capacity::{CapacityQuery, CapacityResponse, DriversResponse};
use contracts::usecases::u103_leave_notification::{ChatSendPayload, ScreenshotResponse};
use serde_json::Value;

use crate::shared::api_client::{ApiError, LeaveApi};

#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    Drivers,
    Capacity(CapacityQuery),
    Apply(ApplyLeaveRequest),
    ApplyForce3(ForceApplyRequest),
    Screenshot(String),
    SendChat(ChatSendPayload),
}

type Scripted<T> = Mutex<VecDeque<Result<T, ApiError>>>;

#[derive(Default)]
pub struct FakeLeaveApi {
    calls: Mutex<Vec<ApiCall>>,
    drivers: Scripted<DriversResponse>,
    capacity: Scripted<CapacityResponse>,
    apply: Scripted<ApplyResponse>,
    apply_force3: Scripted<ApplyResponse>,
    screenshot: Scripted<ScreenshotResponse>,
    send_chat: Scripted<Value>,
}

fn push<T>(queue: &Scripted<T>, result: Result<T, ApiError>) {
    queue.lock().unwrap().push_back(result);
}

fn pop<T: Default>(queue: &Scripted<T>) -> Result<T, ApiError> {
    queue.lock().unwrap().pop_front().unwrap_or_else(|| Ok(T::default()))
}

impl FakeLeaveApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent_chats(&self) -> Vec<ChatSendPayload> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ApiCall::SendChat(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&ApiCall) -> bool) -> usize {
        self.calls().iter().filter(|c| predicate(c)).count()
    }

    pub fn push_drivers(&self, result: Result<DriversResponse, ApiError>) {
        push(&self.drivers, result);
    }

    pub fn push_capacity(&self, result: Result<CapacityResponse, ApiError>) {
        push(&self.capacity, result);
    }

    pub fn push_apply(&self, result: Result<ApplyResponse, ApiError>) {
        push(&self.apply, result);
    }

    pub fn push_apply_force3(&self, result: Result<ApplyResponse, ApiError>) {
        push(&self.apply_force3, result);
    }

    pub fn push_screenshot(&self, result: Result<ScreenshotResponse, ApiError>) {
        push(&self.screenshot, result);
    }

    pub fn push_send_chat(&self, result: Result<Value, ApiError>) {
        push(&self.send_chat, result);
    }

    fn record(&self, call: ApiCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl LeaveApi for FakeLeaveApi {
    async fn fetch_drivers(&self) -> Result<DriversResponse, ApiError> {
        self.record(ApiCall::Drivers);
        pop(&self.drivers)
    }

    async fn fetch_capacity(&self, query: CapacityQuery) -> Result<CapacityResponse, ApiError> {
        self.record(ApiCall::Capacity(query));
        pop(&self.capacity)
    }

    async fn apply(&self, request: &ApplyLeaveRequest) -> Result<ApplyResponse, ApiError> {
        self.record(ApiCall::Apply(request.clone()));
        pop(&self.apply)
    }

    async fn apply_force3(&self, request: &ForceApplyRequest) -> Result<ApplyResponse, ApiError> {
        self.record(ApiCall::ApplyForce3(request.clone()));
        pop(&self.apply_force3)
    }

    async fn calendar_screenshot(&self, month: &str) -> Result<ScreenshotResponse, ApiError> {
        self.record(ApiCall::Screenshot(month.to_string()));
        pop(&self.screenshot)
    }

    async fn send_chat(&self, payload: &ChatSendPayload) -> Result<Value, ApiError> {
        self.record(ApiCall::SendChat(payload.clone()));
        pop(&self.send_chat)
    }
}
