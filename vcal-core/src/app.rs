//! Application controller: current month plus the in-memory event collection.

use std::sync::Arc;

use chrono::{Local, Months, NaiveDate};
use tracing::debug;

use crate::error::{VcalError, VcalResult};
use crate::event::{Event, EventDraft};
use crate::grid::{MonthGrid, build_grid, month_bounds};
use crate::occurrence::occurrences_on;
use crate::store::EventStore;

/// What the views render from.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    /// Always the first day of the displayed month.
    pub current_month: NaiveDate,
    pub events: Vec<Event>,
}

impl AppState {
    pub fn new(month: NaiveDate) -> Self {
        AppState {
            current_month: month_bounds(month).0,
            events: Vec::new(),
        }
    }
}

/// Orchestrates the store, the state and the grid.
pub struct CalendarApp {
    store: Arc<dyn EventStore>,
    state: AppState,
}

impl CalendarApp {
    pub fn new(store: Arc<dyn EventStore>, month: NaiveDate) -> Self {
        CalendarApp {
            store,
            state: AppState::new(month),
        }
    }

    /// Create the controller and load the collection once.
    pub async fn load(store: Arc<dyn EventStore>, month: NaiveDate) -> VcalResult<Self> {
        let mut app = CalendarApp::new(store, month);
        app.refresh().await?;
        Ok(app)
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn store(&self) -> &Arc<dyn EventStore> {
        &self.store
    }

    pub fn events(&self) -> &[Event] {
        &self.state.events
    }

    pub fn current_month(&self) -> NaiveDate {
        self.state.current_month
    }

    /// Re-fetch the whole collection from the store.
    pub async fn refresh(&mut self) -> VcalResult<()> {
        self.state.events = self.store.list_events().await?;
        debug!("Loaded {} events", self.state.events.len());
        Ok(())
    }

    /// Replace the collection with a snapshot pushed by the store.
    pub fn apply_snapshot(&mut self, events: Vec<Event>) {
        self.state.events = events;
    }

    /// Save a form submission: update `id` when given, otherwise create.
    pub async fn save(&mut self, id: Option<&str>, draft: EventDraft) -> VcalResult<Event> {
        let saved = match id {
            Some(id) => {
                let event = Event::from_draft(id, draft);
                self.store.update_event(event).await?
            }
            None => self.store.create_event(draft).await?,
        };

        self.refresh().await?;
        Ok(saved)
    }

    pub async fn delete(&mut self, id: &str) -> VcalResult<()> {
        self.store.delete_event(id).await?;
        self.refresh().await
    }

    pub fn find(&self, id: &str) -> Option<&Event> {
        self.state.events.iter().find(|e| e.id == id)
    }

    pub fn get(&self, id: &str) -> VcalResult<&Event> {
        self.find(id).ok_or_else(|| VcalError::NotFound(id.to_string()))
    }

    /// Move the displayed month by `delta` months (negative goes back).
    pub fn change_month(&mut self, delta: i32) {
        let months = Months::new(delta.unsigned_abs());
        let moved = if delta >= 0 {
            self.state.current_month.checked_add_months(months)
        } else {
            self.state.current_month.checked_sub_months(months)
        };

        if let Some(month) = moved {
            self.state.current_month = month;
        }
    }

    pub fn go_to_today(&mut self) {
        self.go_to(Local::now().date_naive());
    }

    pub fn go_to(&mut self, date: NaiveDate) {
        self.state.current_month = month_bounds(date).0;
    }

    /// The grid for the displayed month.
    pub fn grid(&self) -> MonthGrid<'_> {
        build_grid(self.state.current_month, &self.state.events)
    }

    pub fn grid_with_today(&self, today: NaiveDate) -> MonthGrid<'_> {
        MonthGrid::build(self.state.current_month, today, &self.state.events)
    }

    /// Occurrences on one date, in display order.
    pub fn events_on(&self, date: NaiveDate) -> Vec<&Event> {
        let mut events = occurrences_on(date, &self.state.events);
        events.sort_by(|a, b| a.sort_key().cmp(b.sort_key()));
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::RecurrenceRule;
    use crate::store::LocalStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn temp_app(month: NaiveDate) -> (tempfile::TempDir, CalendarApp) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path().join("events.json")).await.unwrap();
        let app = CalendarApp::load(Arc::new(store), month).await.unwrap();
        (dir, app)
    }

    #[tokio::test]
    async fn month_navigation_does_not_overflow() {
        let (_dir, mut app) = temp_app(date(2024, 1, 31)).await;
        assert_eq!(app.current_month(), date(2024, 1, 1));

        app.change_month(1);
        assert_eq!(app.current_month(), date(2024, 2, 1));
        assert_eq!(app.grid().month_label(), "February 2024");

        app.change_month(-2);
        assert_eq!(app.current_month(), date(2023, 12, 1));

        app.change_month(13);
        assert_eq!(app.current_month(), date(2025, 1, 1));

        app.go_to(date(2024, 7, 19));
        assert_eq!(app.current_month(), date(2024, 7, 1));
    }

    #[tokio::test]
    async fn go_to_today_shows_the_current_month() {
        let (_dir, mut app) = temp_app(date(2001, 5, 20)).await;
        app.go_to_today();

        let today = Local::now().date_naive();
        assert_eq!(app.current_month(), month_bounds(today).0);

        let grid = app.grid();
        assert!(grid.cells.iter().filter(|c| c.is_today).count() <= 1);
        assert!(grid.cells.iter().any(|c| c.date == today && c.is_current_month));
    }

    #[tokio::test]
    async fn save_creates_then_updates() {
        let (_dir, mut app) = temp_app(date(2024, 3, 1)).await;

        let created = app
            .save(None, EventDraft::new("Standup", date(2024, 3, 4)))
            .await
            .unwrap();
        assert_eq!(app.events().len(), 1);

        let mut draft = created.to_draft();
        draft.recurrence.rule = RecurrenceRule::Weekly;
        app.save(Some(&created.id), draft).await.unwrap();

        assert_eq!(app.events().len(), 1);
        assert!(app.get(&created.id).unwrap().is_recurring());
        assert_eq!(app.events_on(date(2024, 3, 11)).len(), 1);
    }

    #[tokio::test]
    async fn save_with_unknown_id_is_not_found() {
        let (_dir, mut app) = temp_app(date(2024, 3, 1)).await;

        let err = app
            .save(Some("ghost"), EventDraft::new("Ghost", date(2024, 3, 4)))
            .await
            .unwrap_err();
        assert!(matches!(err, VcalError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_refreshes_collection() {
        let (_dir, mut app) = temp_app(date(2024, 3, 1)).await;
        let created = app
            .save(None, EventDraft::new("Lunch", date(2024, 3, 5)))
            .await
            .unwrap();

        app.delete(&created.id).await.unwrap();
        assert!(app.events().is_empty());
        assert!(app.find(&created.id).is_none());
    }

    #[tokio::test]
    async fn snapshot_replaces_collection_and_grid() {
        let (_dir, mut app) = temp_app(date(2024, 2, 15)).await;
        let event = Event::from_draft("x", EventDraft::new("Pushed", date(2024, 2, 14)));

        app.apply_snapshot(vec![event]);

        let grid = app.grid_with_today(date(2024, 2, 1));
        let cell = grid.cells.iter().find(|c| c.date == date(2024, 2, 14)).unwrap();
        assert_eq!(cell.occurrences[0].title, "Pushed");
    }

    #[tokio::test]
    async fn events_on_sorts_by_start_time() {
        let (_dir, mut app) = temp_app(date(2024, 3, 1)).await;
        let day = date(2024, 3, 6);

        let mut late = EventDraft::new("Late", day);
        late.start_time = Some("17:00".into());
        let mut early = EventDraft::new("Early", day);
        early.start_time = Some("08:30".into());

        app.save(None, late).await.unwrap();
        app.save(None, early).await.unwrap();
        app.save(None, EventDraft::new("All day", day)).await.unwrap();

        let titles: Vec<_> = app.events_on(day).iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["All day", "Early", "Late"]);
    }
}
