use crate::core::payment::{self, format_native_amount, format_quote_amount, NATIVE_SYMBOL};
use crate::core::PaymentSubmitter;
use crate::domain::model::{
    AttemptId, BookingRecord, BookingState, MenuItem, PaymentFailure, PaymentOutcome,
    PaymentQuote, PaymentReceipt, Schedule, Selection, Venue, WalletAddress,
};
use crate::domain::ports::{CatalogProvider, Clock, ReservationSink, SystemClock, WalletSession};
use crate::utils::error::{BookingError, Result};
use crate::utils::validation::{ensure_not_past, parse_schedule};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::Mutex;

/// User intents, consumed one at a time by [`BookingWorkflow::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingEvent {
    OpenBooking { venue_id: u32 },
    ToggleItem { name: String },
    SubmitPayment,
    SetSchedule { date: String, time: String },
    Commit,
    Cancel,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    Opened(AttemptId),
    SelectionUpdated(SelectionUpdate),
    PaymentConfirmed(PaymentReceipt),
    ScheduleSet(Schedule),
    Committed(BookingRecord),
    Cancelled(Option<AttemptId>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionUpdate {
    pub item: String,
    pub selected: bool,
    pub total: Decimal,
}

/// Read-only view of the live attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptView {
    pub id: AttemptId,
    pub state: BookingState,
    pub venue: Venue,
    pub items: Vec<MenuItem>,
    pub total: Decimal,
    pub schedule: Option<Schedule>,
}

#[derive(Debug, Clone)]
struct PaidSnapshot {
    items: Selection,
    quote: PaymentQuote,
    signature: String,
}

#[derive(Debug, Clone)]
enum PaymentStatus {
    Unpaid,
    InFlight { items: Selection, quote: PaymentQuote },
    Confirmed(PaidSnapshot),
}

#[derive(Debug, Clone)]
struct BookingAttempt {
    id: AttemptId,
    venue: Venue,
    selection: Selection,
    schedule: Option<Schedule>,
    payment: PaymentStatus,
    committing: bool,
}

impl BookingAttempt {
    fn new(id: AttemptId, venue: Venue) -> Self {
        Self {
            id,
            venue,
            selection: Selection::new(),
            schedule: None,
            payment: PaymentStatus::Unpaid,
            committing: false,
        }
    }

    fn state(&self) -> BookingState {
        match self.payment {
            PaymentStatus::Unpaid => BookingState::SelectingMenu,
            PaymentStatus::InFlight { .. } => BookingState::AwaitingPayment,
            PaymentStatus::Confirmed(_) => BookingState::PaymentConfirmed,
        }
    }

    /// 付款或預約提交進行中時，拒絕其他會改變狀態的事件
    fn ensure_not_busy(&self) -> Result<()> {
        if self.committing || matches!(self.payment, PaymentStatus::InFlight { .. }) {
            tracing::warn!("Booking {} busy ({}), rejecting event", self.id, self.state());
            return Err(BookingError::OperationInProgress);
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct WorkflowInner {
    last_attempt: u64,
    attempt: Option<BookingAttempt>,
}

impl WorkflowInner {
    fn live_mut(&mut self, event: &'static str) -> Result<&mut BookingAttempt> {
        self.attempt
            .as_mut()
            .ok_or(BookingError::InvalidTransition {
                state: BookingState::Idle,
                event,
            })
    }

    fn current_mut(&mut self, id: AttemptId) -> Option<&mut BookingAttempt> {
        self.attempt.as_mut().filter(|attempt| attempt.id == id)
    }
}

fn log_transition(id: AttemptId, from: BookingState, to: BookingState) {
    tracing::info!("🔄 Booking {}: {} -> {}", id, from, to);
}

/// Coordinates one booking attempt at a time: menu selection, payment through
/// the wallet, then the reservation commit. The state lock is never held while
/// waiting on the wallet or the sink.
pub struct BookingWorkflow<C: CatalogProvider, W: WalletSession, S: ReservationSink> {
    catalog: C,
    submitter: PaymentSubmitter<W>,
    sink: S,
    destination: WalletAddress,
    clock: Arc<dyn Clock>,
    inner: Mutex<WorkflowInner>,
}

impl<C: CatalogProvider, W: WalletSession, S: ReservationSink> BookingWorkflow<C, W, S> {
    pub fn new(
        catalog: C,
        submitter: PaymentSubmitter<W>,
        sink: S,
        destination: WalletAddress,
    ) -> Self {
        Self {
            catalog,
            submitter,
            sink,
            destination,
            clock: Arc::new(SystemClock),
            inner: Mutex::new(WorkflowInner::default()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn wallet(&self) -> &Arc<W> {
        self.submitter.wallet()
    }

    pub fn venues(&self) -> Result<Vec<Venue>> {
        self.catalog.list_venues()
    }

    pub async fn dispatch(&self, event: BookingEvent) -> Result<EventOutcome> {
        tracing::debug!("Dispatching {:?}", event);
        match event {
            BookingEvent::OpenBooking { venue_id } => {
                self.open_booking(venue_id).await.map(EventOutcome::Opened)
            }
            BookingEvent::ToggleItem { name } => self
                .toggle_item(&name)
                .await
                .map(EventOutcome::SelectionUpdated),
            BookingEvent::SubmitPayment => self
                .submit_payment()
                .await
                .map(EventOutcome::PaymentConfirmed),
            BookingEvent::SetSchedule { date, time } => self
                .set_schedule(&date, &time)
                .await
                .map(EventOutcome::ScheduleSet),
            BookingEvent::Commit => self.commit().await.map(EventOutcome::Committed),
            BookingEvent::Cancel => Ok(EventOutcome::Cancelled(self.cancel().await)),
        }
    }

    pub async fn state(&self) -> BookingState {
        let inner = self.inner.lock().await;
        inner
            .attempt
            .as_ref()
            .map(BookingAttempt::state)
            .unwrap_or(BookingState::Idle)
    }

    pub async fn current_attempt(&self) -> Option<AttemptView> {
        let inner = self.inner.lock().await;
        inner.attempt.as_ref().map(|attempt| AttemptView {
            id: attempt.id,
            state: attempt.state(),
            venue: attempt.venue.clone(),
            items: attempt.selection.in_menu_order(&attempt.venue),
            total: attempt.selection.total(),
            schedule: attempt.schedule,
        })
    }

    /// Amount the current selection would cost, for display before paying.
    pub async fn current_quote(&self) -> Result<PaymentQuote> {
        let mut inner = self.inner.lock().await;
        let attempt = inner.live_mut("quote")?;
        payment::quote(attempt.selection.total())
    }

    pub async fn open_booking(&self, venue_id: u32) -> Result<AttemptId> {
        let venue = self
            .catalog
            .list_venues()?
            .into_iter()
            .find(|venue| venue.id == venue_id)
            .ok_or(BookingError::UnknownVenue { venue_id })?;

        let mut inner = self.inner.lock().await;
        if let Some(attempt) = &inner.attempt {
            return Err(BookingError::InvalidTransition {
                state: attempt.state(),
                event: "open booking",
            });
        }

        inner.last_attempt += 1;
        let id = AttemptId(inner.last_attempt);
        tracing::info!("📖 Opened booking {} at {}", id, venue.name);
        inner.attempt = Some(BookingAttempt::new(id, venue));
        log_transition(id, BookingState::Idle, BookingState::SelectingMenu);
        Ok(id)
    }

    pub async fn toggle_item(&self, name: &str) -> Result<SelectionUpdate> {
        let mut inner = self.inner.lock().await;
        let attempt = inner.live_mut("toggle item")?;
        attempt.ensure_not_busy()?;

        let item = attempt
            .venue
            .menu_item(name)
            .cloned()
            .ok_or_else(|| BookingError::UnknownMenuItem {
                venue: attempt.venue.name.clone(),
                item: name.to_string(),
            })?;

        let selected = attempt.selection.toggle(&item);
        if let PaymentStatus::Confirmed(paid) = &attempt.payment {
            tracing::warn!(
                "Selection changed after payment {}; confirmation revoked",
                paid.signature
            );
            attempt.payment = PaymentStatus::Unpaid;
            log_transition(
                attempt.id,
                BookingState::PaymentConfirmed,
                BookingState::SelectingMenu,
            );
        }

        let total = attempt.selection.total();
        tracing::debug!(
            "{} {} -> total {}",
            if selected { "Selected" } else { "Removed" },
            item.name,
            format_quote_amount(total)
        );

        Ok(SelectionUpdate {
            item: item.name,
            selected,
            total,
        })
    }

    pub async fn submit_payment(&self) -> Result<PaymentReceipt> {
        let (id, quote) = {
            let mut inner = self.inner.lock().await;
            let attempt = inner.live_mut("submit payment")?;
            attempt.ensure_not_busy()?;

            if let PaymentStatus::Confirmed(_) = attempt.payment {
                return Err(BookingError::InvalidTransition {
                    state: BookingState::PaymentConfirmed,
                    event: "submit payment",
                });
            }
            if !self.submitter.wallet().is_connected() {
                tracing::warn!("Payment for booking {} rejected: wallet not connected", attempt.id);
                return Err(BookingError::WalletNotConnected);
            }
            if attempt.selection.is_empty() {
                return Err(BookingError::EmptySelection);
            }

            let quote = payment::quote(attempt.selection.total())?;
            attempt.payment = PaymentStatus::InFlight {
                items: attempt.selection.clone(),
                quote,
            };
            log_transition(
                attempt.id,
                BookingState::SelectingMenu,
                BookingState::AwaitingPayment,
            );
            (attempt.id, quote)
        };

        tracing::info!(
            "Paying {} {} for booking {} ({} {})",
            format_native_amount(quote.lamports),
            NATIVE_SYMBOL,
            id,
            payment::QUOTE_CURRENCY,
            format_quote_amount(quote.quote_total)
        );

        let outcome = self.submitter.submit(&quote, &self.destination).await;
        self.settle_payment(id, outcome).await
    }

    /// Applies a payment result, dropping it when the attempt it was issued
    /// for is gone.
    async fn settle_payment(&self, id: AttemptId, outcome: PaymentOutcome) -> Result<PaymentReceipt> {
        let mut inner = self.inner.lock().await;
        let Some(attempt) = inner.current_mut(id) else {
            tracing::warn!("Dropping payment result for stale booking {}: {:?}", id, outcome);
            return Err(BookingError::StaleAttempt { attempt: id });
        };

        let PaymentStatus::InFlight { items, quote } =
            std::mem::replace(&mut attempt.payment, PaymentStatus::Unpaid)
        else {
            tracing::warn!("Booking {} has no payment in flight", id);
            return Err(BookingError::StaleAttempt { attempt: id });
        };

        let reason = match outcome {
            PaymentOutcome::Confirmed(handle) => {
                attempt.payment = PaymentStatus::Confirmed(PaidSnapshot {
                    items,
                    quote,
                    signature: handle.signature.clone(),
                });
                log_transition(id, BookingState::AwaitingPayment, BookingState::PaymentConfirmed);
                return Ok(PaymentReceipt {
                    attempt: id,
                    quote,
                    signature: handle.signature,
                });
            }
            PaymentOutcome::Rejected(reason) => reason,
            PaymentOutcome::Cancelled => PaymentFailure::UserRejected,
        };

        tracing::warn!("❌ Payment for booking {} failed: {}", id, reason);
        log_transition(id, BookingState::AwaitingPayment, BookingState::SelectingMenu);
        Err(BookingError::PaymentFailed { reason })
    }

    pub async fn set_schedule(&self, date: &str, time: &str) -> Result<Schedule> {
        let mut inner = self.inner.lock().await;
        let attempt = inner.live_mut("set schedule")?;
        attempt.ensure_not_busy()?;

        let schedule = parse_schedule(date, time, self.clock.now())?;
        attempt.schedule = Some(schedule);
        tracing::debug!("Booking {} scheduled for {} {}", attempt.id, date, time);
        Ok(schedule)
    }

    pub async fn commit(&self) -> Result<BookingRecord> {
        let (id, record) = {
            let mut inner = self.inner.lock().await;
            let attempt = inner.live_mut("commit")?;
            attempt.ensure_not_busy()?;

            let PaymentStatus::Confirmed(paid) = &attempt.payment else {
                return Err(BookingError::InvalidTransition {
                    state: attempt.state(),
                    event: "commit",
                });
            };
            let schedule = attempt.schedule.ok_or(BookingError::ScheduleNotSet)?;
            if paid.items != attempt.selection {
                return Err(BookingError::SelectionChanged);
            }
            ensure_not_past(&schedule, self.clock.now())?;

            let record = BookingRecord {
                attempt: attempt.id,
                venue_id: attempt.venue.id,
                venue_name: attempt.venue.name.clone(),
                date: schedule.date,
                time: schedule.time,
                items: paid.items.in_menu_order(&attempt.venue),
                total: paid.quote.quote_total,
                lamports: paid.quote.lamports,
                signature: paid.signature.clone(),
            };
            attempt.committing = true;
            (attempt.id, record)
        };

        let result = self.sink.commit(&record).await;

        let mut inner = self.inner.lock().await;
        match result {
            Ok(ack) => {
                if inner.current_mut(id).is_none() {
                    tracing::warn!(
                        "Booking {} was cancelled while the sink recorded it (reference: {:?}, signature: {})",
                        id,
                        ack.reference,
                        record.signature
                    );
                    return Err(BookingError::StaleAttempt { attempt: id });
                }

                inner.attempt = None;
                log_transition(id, BookingState::PaymentConfirmed, BookingState::Committed);
                log_transition(id, BookingState::Committed, BookingState::Idle);
                if let Some(reference) = ack.reference {
                    tracing::info!("Reservation reference: {}", reference);
                }
                Ok(record)
            }
            Err(e) => {
                if let Some(attempt) = inner.current_mut(id) {
                    attempt.committing = false;
                }
                tracing::warn!("❌ Reservation commit for booking {} failed: {}", id, e);
                Err(match e {
                    BookingError::ReservationCommitFailed { .. } => e,
                    other => BookingError::ReservationCommitFailed {
                        message: other.to_string(),
                    },
                })
            }
        }
    }

    /// Discards the live attempt. A transfer that was already sent is not
    /// refunded.
    pub async fn cancel(&self) -> Option<AttemptId> {
        let mut inner = self.inner.lock().await;
        let attempt = inner.attempt.take()?;
        let state = attempt.state();

        match &attempt.payment {
            PaymentStatus::InFlight { .. } => {
                tracing::warn!("Booking {} cancelled with a payment in flight", attempt.id)
            }
            PaymentStatus::Confirmed(paid) => tracing::warn!(
                "Booking {} cancelled after payment {}; no refund is issued",
                attempt.id,
                paid.signature
            ),
            PaymentStatus::Unpaid => {}
        }

        log_transition(attempt.id, state, BookingState::Cancelled);
        log_transition(attempt.id, BookingState::Cancelled, BookingState::Idle);
        Some(attempt.id)
    }
}
