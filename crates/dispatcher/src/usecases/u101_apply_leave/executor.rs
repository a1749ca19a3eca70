use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use contracts::domain::a001_driver::Driver;
use contracts::usecases::u101_apply_leave::{
    ApplyLeaveRequest, ForceApplyRequest, LeaveStateView, LeaveWorkflowState, SubmitLeaveRequest,
};
use contracts::usecases::u102_capacity::{CapacityQuery, DriverListView};
use contracts::usecases::u103_leave_notification::NotificationDescriptor;

use super::context::{PendingForce, WorkflowContext};
use super::errors::WorkflowError;
use crate::domain::category::{
    normalize_category_key, resolve_effective_category_group, CapacityFilterState, ChannelConfig,
    ChannelDirectory, FilterSources,
};
use crate::shared::api_client::LeaveApi;
use crate::shared::config::Config;
use crate::shared::dates::{self, SelectedRange};
use crate::shared::json_value::first_positive;
use crate::usecases::u102_capacity::{effective_max_per_day, evaluate_capacity};
use crate::usecases::u103_leave_notification::{
    send_leave_notification_with_snapshot, DispatchReport, NotificationSettings,
};

const MSG_PICK_DRIVER: &str = "Sila pilih pemandu";
const MSG_PICK_DATES: &str = "Sila pilih tarikh mula dan tamat";
const MSG_PICK_RANGE: &str = "Sila pilih julat tarikh untuk melihat kapasiti.";
const MSG_PICK_END: &str = "Sila pilih tarikh tamat untuk melihat kapasiti.";
const MSG_SUBMITTING: &str = "Sedang dihantar...";
const MSG_SUBMIT_FAILED: &str = "Penghantaran gagal.";
const MSG_LOADING_CAPACITY: &str = "Memuat kapasiti...";
const MSG_CAPACITY_FAILED: &str = "Gagal memuat kapasiti.";
const MSG_FORCE_PROMPT: &str =
    "Tarikh pilihan penuh. Sahkan permohonan paksa dalam tetingkap pengesahan.";
const MSG_FORCE_MISSING_START: &str =
    "Tidak dapat mengenal pasti tarikh mula untuk permohonan paksa. Sila pilih semula julat tarikh.";
const MSG_NO_PENDING_FORCE: &str = "Tiada permohonan paksa yang belum selesai.";
const MSG_FORCE_CONFIRMED: &str = "Permohonan paksa 3 hari bekerja disahkan.";
const MSG_SUBMIT_DEFAULT_ERROR: &str = "Failed to submit leave.";
const PLACEHOLDER_DRIVERS: &str = "Pilih nama";
const PLACEHOLDER_NO_DRIVERS: &str = "Tiada pemandu tersedia untuk kategori ini";

const FALLBACK_WEEKEND_DAYS: [u8; 2] = [6, 0];

/// Applied dates and what happened to the notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedLeave {
    pub applied_dates: Vec<NaiveDate>,
    pub notification: DispatchReport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Applied(AppliedLeave),
    /// Limit reached; a force apply from `start` awaits confirmation
    CapacityConflict { driver_id: String, start: NaiveDate },
}

/// Конечный автомат подачи заявки на отпуск
///
/// `Idle -> Submitting -> {Applied | CapacityConflictPending | Failed}`,
/// `CapacityConflictPending -> ConfirmingForce -> {Applied | CapacityConflictPending}`,
/// cancel returns to `Idle`.
pub struct LeaveWorkflow<A: LeaveApi + ?Sized> {
    api: Arc<A>,
    ctx: WorkflowContext,
    channels: ChannelDirectory,
    notification: NotificationSettings,
    timezone: Tz,
}

impl<A: LeaveApi + ?Sized> LeaveWorkflow<A> {
    pub fn new(api: Arc<A>, config: &Config) -> Self {
        Self {
            api,
            ctx: WorkflowContext::new(config.workflow.max_per_day, config.workflow.weekend_days.clone()),
            channels: ChannelDirectory::new(config.channels.clone(), &config.workflow.default_channel_id),
            notification: NotificationSettings::from_config(config),
            timezone: dates::parse_timezone(&config.workflow.timezone),
        }
    }

    pub fn context(&self) -> &WorkflowContext {
        &self.ctx
    }

    pub fn state_view(&self, filter: &FilterSources) -> LeaveStateView {
        self.ctx.to_view(&filter.collect(&self.ctx.categories))
    }

    pub fn select_driver(&mut self, driver_id: Option<&str>) {
        self.ctx.select_driver(driver_id);
    }

    fn channel_for(&self, filter: &CapacityFilterState, driver: Option<&Driver>) -> ChannelConfig {
        let group = resolve_effective_category_group(
            &self.ctx.categories,
            filter,
            driver,
            self.channels.default_id(),
        );
        self.channels.get(&group)
    }

    /// Справочник водителей, затем пересчёт загрузки
    pub async fn load_drivers(&mut self, filter: &FilterSources) -> Result<(), WorkflowError> {
        self.reload_driver_directory().await?;
        self.refresh_capacity(filter).await
    }

    async fn reload_driver_directory(&mut self) -> Result<(), WorkflowError> {
        let data = match self.api.fetch_drivers().await {
            Ok(data) => data,
            Err(e) => {
                tracing::error!("Failed to load drivers: {}", e);
                self.ctx.status = format!("Gagal memuat pemandu: {}", e);
                return Err(e.into());
            }
        };

        self.ctx.drivers = data.drivers;
        self.ctx.weekend_days = data
            .weekend_days
            .unwrap_or_else(|| FALLBACK_WEEKEND_DAYS.to_vec());
        if let Some(groups) = data.category_groups.filter(|g| !g.is_empty()) {
            self.ctx.categories.set_category_groups(&groups);
        }
        if let Some(max) = first_positive(&[data.max_per_category.as_ref(), data.max_per_day.as_ref()]) {
            self.ctx.max_per_day = max;
        }
        tracing::info!(
            "Loaded {} drivers (max {} per day)",
            self.ctx.drivers.len(),
            self.ctx.max_per_day
        );
        Ok(())
    }

    /// refreshCapacityHints
    ///
    /// The active group is the filter's group, else the selected driver's.
    pub async fn refresh_capacity(&mut self, filter: &FilterSources) -> Result<(), WorkflowError> {
        let selected = dates::collect_selected_dates(&self.ctx.selected);
        self.ctx.has_full_day = false;
        let (Some(from), Some(to)) = (selected.first().copied(), selected.last().copied()) else {
            self.ctx.last_capacity = None;
            self.ctx.status = MSG_PICK_RANGE.to_string();
            return Ok(());
        };

        self.ctx.status = MSG_LOADING_CAPACITY.to_string();
        let data = match self.api.fetch_capacity(CapacityQuery { from, to }).await {
            Ok(data) => data,
            Err(e) => {
                tracing::error!("Failed to load capacity {}..{}: {}", from, to, e);
                self.ctx.last_capacity = None;
                self.ctx.status = MSG_CAPACITY_FAILED.to_string();
                return Err(e.into());
            }
        };

        if let Some(groups) = data.category_groups.as_ref().filter(|g| !g.is_empty()) {
            self.ctx.categories.set_category_groups(groups);
        }
        self.ctx.max_per_day = effective_max_per_day(&data, self.ctx.max_per_day);

        let registry = &self.ctx.categories;
        let filter_state = filter.collect(registry);
        let driver_group = self
            .ctx
            .selected_driver()
            .map(|d| registry.resolve_category_group_id(&d.category))
            .unwrap_or_default();
        let active_group =
            normalize_category_key(&filter_state.filtered_group(registry).unwrap_or(driver_group));

        let mut view = evaluate_capacity(
            &selected,
            &data,
            (!active_group.is_empty()).then_some(active_group.as_str()),
            self.ctx.max_per_day,
            &self.ctx.weekend_days,
        );
        view.active_group_label = view
            .active_group
            .as_deref()
            .map(|g| registry.format_category_group_label(g));

        tracing::debug!(
            "Capacity {}..{} group={} full={}",
            from,
            to,
            active_group,
            view.has_full_day
        );
        self.ctx.has_full_day = view.has_full_day;
        self.ctx.last_capacity = Some(view);
        self.ctx.status.clear();
        Ok(())
    }

    /// Picker change (and close); capacity is refreshed once the range is complete
    pub async fn set_date_range(
        &mut self,
        picked: &[NaiveDate],
        closed: bool,
        filter: &FilterSources,
    ) -> Result<(), WorkflowError> {
        self.ctx.selected.apply_picker_change(picked);
        if closed {
            self.ctx.selected.apply_picker_close(picked);
        }

        if self.ctx.selected.is_complete() {
            return self.refresh_capacity(filter).await;
        }
        self.ctx.has_full_day = false;
        self.ctx.last_capacity = None;
        self.ctx.status = if self.ctx.selected.start.is_some() { MSG_PICK_END } else { MSG_PICK_RANGE }
            .to_string();
        Ok(())
    }

    /// Picker instants, read as calendar dates in the dispatcher timezone
    pub async fn set_picker_instants(
        &mut self,
        instants: &[DateTime<Utc>],
        closed: bool,
        filter: &FilterSources,
    ) -> Result<(), WorkflowError> {
        let picked = dates::dates_in_tz(instants, self.timezone);
        self.set_date_range(&picked, closed, filter).await
    }

    /// Active drivers matching the category filter
    pub fn driver_list(&self, filter: &FilterSources) -> DriverListView {
        let state = filter.collect(&self.ctx.categories);
        let drivers: Vec<Driver> = self
            .ctx
            .drivers
            .iter()
            .filter(|d| state.matches_driver(d))
            .cloned()
            .collect();
        let placeholder = if drivers.is_empty() {
            PLACEHOLDER_NO_DRIVERS
        } else {
            PLACEHOLDER_DRIVERS
        };
        DriverListView {
            placeholder: placeholder.to_string(),
            drivers,
            active_category_filter: state.categories.join(","),
        }
    }

    /// Подача заявки
    pub async fn submit(
        &mut self,
        request: &SubmitLeaveRequest,
        filter: &FilterSources,
    ) -> Result<SubmitOutcome, WorkflowError> {
        // a pending force survives until the backend answers this submit
        self.ctx.select_driver(request.driver_id.as_deref());
        if let (Some(start), Some(end)) = (request.start_date, request.end_date) {
            self.ctx.selected = SelectedRange::new(start, end);
        }

        let Some(driver_id) = self.ctx.selected_driver_id.clone() else {
            self.ctx.status = MSG_PICK_DRIVER.to_string();
            return Err(WorkflowError::Validation(MSG_PICK_DRIVER.to_string()));
        };
        let (Some(start), Some(end)) = (self.ctx.selected.start, self.ctx.selected.end) else {
            self.ctx.status = MSG_PICK_DATES.to_string();
            return Err(WorkflowError::Validation(MSG_PICK_DATES.to_string()));
        };

        let previous = self.ctx.state;
        self.ctx.state = LeaveWorkflowState::Submitting;
        self.ctx.status = MSG_SUBMITTING.to_string();

        let driver = self.ctx.driver_by_id(&driver_id).cloned();
        let filter_state = filter.collect(&self.ctx.categories);
        let channel = self.channel_for(&filter_state, driver.as_ref());
        let apply = ApplyLeaveRequest {
            driver_id: driver_id.clone(),
            start_date: start,
            end_date: end,
            routing: channel.routing(),
        };
        tracing::info!(
            "Submitting leave for {} {}..{} via channel {}",
            driver_id,
            start,
            end,
            channel.id
        );

        let response = match self.api.apply(&apply).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Leave submit failed: {}", e);
                self.ctx.state = previous;
                self.ctx.status = MSG_SUBMIT_FAILED.to_string();
                return Err(e.into());
            }
        };

        if response.ok {
            self.ctx.state = LeaveWorkflowState::Applied;
            tracing::info!("Leave applied for {} ({} days)", driver_id, response.applied_dates.len());
            let notification = self
                .after_applied(
                    &response.applied_dates,
                    driver,
                    &driver_id,
                    response.notification,
                    &channel,
                    filter,
                )
                .await;
            self.ctx.reset_pending_force();
            return Ok(SubmitOutcome::Applied(AppliedLeave {
                applied_dates: response.applied_dates,
                notification,
            }));
        }

        if response.is_capacity_conflict() {
            let pending_start = response
                .full_error()
                .and_then(|e| e.parsed_date())
                .or(self.ctx.selected.start);

            let Some(pending_start) = pending_start else {
                self.ctx.reset_pending_force();
                self.ctx.state = LeaveWorkflowState::Failed;
                self.ctx.status = MSG_FORCE_MISSING_START.to_string();
                return Err(WorkflowError::Validation(MSG_FORCE_MISSING_START.to_string()));
            };

            tracing::info!(
                "Capacity full for {} at {}, force apply awaits confirmation",
                driver_id,
                pending_start
            );
            self.ctx.pending_force = Some(PendingForce {
                driver_id: driver_id.clone(),
                start: pending_start,
                notification: response.notification,
            });
            self.ctx.state = LeaveWorkflowState::CapacityConflictPending;
            self.ctx.status = MSG_FORCE_PROMPT.to_string();
            return Ok(SubmitOutcome::CapacityConflict {
                driver_id,
                start: pending_start,
            });
        }

        self.ctx.reset_pending_force();
        let message = response
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| MSG_SUBMIT_DEFAULT_ERROR.to_string());
        tracing::warn!("Leave submit rejected for {}: {}", driver_id, message);
        self.ctx.state = LeaveWorkflowState::Failed;

        // already logged; the rejection is what gets reported
        let _ = self.refresh_capacity(filter).await;
        self.ctx.status = message.clone();
        Err(WorkflowError::Business(message))
    }

    /// Подтверждение принудительной заявки (3 рабочих дня от pending start)
    pub async fn confirm_force(&mut self, filter: &FilterSources) -> Result<AppliedLeave, WorkflowError> {
        let Some(pending) = self.ctx.pending_force.clone() else {
            self.ctx.status = MSG_NO_PENDING_FORCE.to_string();
            return Err(WorkflowError::Validation(MSG_NO_PENDING_FORCE.to_string()));
        };

        self.ctx.state = LeaveWorkflowState::ConfirmingForce;
        let driver = self.ctx.driver_by_id(&pending.driver_id).cloned();
        let filter_state = filter.collect(&self.ctx.categories);
        let channel = self.channel_for(&filter_state, driver.as_ref());
        let request = ForceApplyRequest {
            driver_id: pending.driver_id.clone(),
            start_date: pending.start,
            routing: channel.routing(),
        };
        tracing::info!("Confirming force apply for {} from {}", pending.driver_id, pending.start);

        let response = match self.api.apply_force3(&request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Force apply failed: {}", e);
                self.ctx.state = LeaveWorkflowState::CapacityConflictPending;
                self.ctx.status = format!("Permohonan paksa gagal: {}", e);
                return Err(e.into());
            }
        };

        if !response.ok {
            let message = response.message.unwrap_or_default();
            tracing::warn!("Force apply rejected for {}: {}", pending.driver_id, message);
            self.ctx.state = LeaveWorkflowState::CapacityConflictPending;
            self.ctx.status = format!("Permohonan paksa gagal: {}", message).trim().to_string();
            return Err(WorkflowError::Business(message));
        }

        self.ctx.state = LeaveWorkflowState::Applied;
        let descriptor = response.notification.or(pending.notification);
        let notification = self
            .after_applied(
                &response.applied_dates,
                driver,
                &pending.driver_id,
                descriptor,
                &channel,
                filter,
            )
            .await;
        self.ctx.reset_pending_force();
        self.ctx.status = MSG_FORCE_CONFIRMED.to_string();

        Ok(AppliedLeave {
            applied_dates: response.applied_dates,
            notification,
        })
    }

    pub fn cancel_force(&mut self) {
        if let Some(pending) = self.ctx.pending_force.take() {
            tracing::info!("Force apply for {} from {} cancelled", pending.driver_id, pending.start);
        }
        self.ctx.state = LeaveWorkflowState::Idle;
        self.ctx.status.clear();
    }

    /// Notify, reload drivers, then refresh capacity once
    async fn after_applied(
        &mut self,
        applied: &[NaiveDate],
        driver: Option<Driver>,
        driver_id: &str,
        descriptor: Option<NotificationDescriptor>,
        channel: &ChannelConfig,
        filter: &FilterSources,
    ) -> DispatchReport {
        let driver = driver.or_else(|| self.ctx.driver_by_id(driver_id).cloned());

        let report = match descriptor {
            Some(mut descriptor) => {
                send_leave_notification_with_snapshot(
                    &*self.api,
                    &mut descriptor,
                    applied,
                    driver.as_ref(),
                    channel,
                    &self.notification,
                )
                .await
            }
            None => DispatchReport::default(),
        };

        // a stale directory still gets fresh capacity; both failures are logged
        let _ = self.reload_driver_directory().await;
        let _ = self.refresh_capacity(filter).await;
        self.ctx.status = format!("Penghantaran terakhir: {} hari diluluskan.", applied.len());
        report
    }
}
