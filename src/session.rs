//! Drives a [`Synchronizer`]: performs its effects against the location, the
//! calendar viewport and the API, and routes fetch results back into it.
//!
//! Fetches run as tokio tasks. Their results arrive on the channel passed to
//! [`Session::new`] as [`SessionEvent`]s and must be handed to
//! [`Session::handle`] by whoever owns the session (the UI loop).
use crate::calendar::{CalendarView, SenderFilter};
use crate::client::{NewsApi, fetch_detail, fetch_entries};
use crate::config::Config;
use crate::error::ApiError;
use crate::location::{MemoryLocation, SearchParams};
use crate::model::CalendarEntry;
use crate::state::{DateRange, Detail, DetailKind, DisplayMode, NavigationState};
use crate::sync::{DetailRequest, Effect, RangeOutcome, RangeRequest, Synchronizer, Token};
use chrono::NaiveDate;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug)]
pub enum SessionEvent {
    RangeLoaded {
        token: Token,
        entries: Vec<CalendarEntry>,
    },
    DetailLoaded {
        token: Token,
        result: Result<Detail, ApiError>,
    },
}

pub struct Session<A: NewsApi> {
    api: A,
    sync: Synchronizer,
    location: MemoryLocation,
    calendar: CalendarView,
    filter: SenderFilter,
    default_display: DisplayMode,
    today: NaiveDate,
    /// Range and mode of the last request made for the viewport.
    requested: Option<(DateRange, DisplayMode)>,
    tx: UnboundedSender<SessionEvent>,
}

impl<A: NewsApi> Session<A> {
    pub fn new(
        api: A,
        config: &Config,
        initial: SearchParams,
        today: NaiveDate,
        tx: UnboundedSender<SessionEvent>,
    ) -> Self {
        let display = match initial.get(crate::location::DISPLAY) {
            Some(_) => NavigationState::from_search(&initial).display_mode,
            None => config.default_display,
        };
        Self {
            api,
            sync: Synchronizer::new(display),
            location: MemoryLocation::new(initial),
            calendar: CalendarView::new(today, config.narrow_width),
            filter: SenderFilter::all(),
            default_display: config.default_display,
            today,
            requested: None,
            tx,
        }
    }

    pub fn sync(&self) -> &Synchronizer {
        &self.sync
    }

    pub fn location(&self) -> &MemoryLocation {
        &self.location
    }

    pub fn calendar(&self) -> &CalendarView {
        &self.calendar
    }

    pub fn filter(&self) -> &SenderFilter {
        &self.filter
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.sync.display_mode()
    }

    pub fn dialog(&self) -> Option<&Detail> {
        self.sync.dialog()
    }

    /// First render of the viewport.
    pub fn start(&mut self) {
        self.render();
    }

    /// The viewport settled: let the synchronizer look at it, then load it.
    pub fn render(&mut self) {
        let effects = self
            .sync
            .on_viewport_rendered(self.calendar.visible_range(), &self.location.search());
        self.apply(effects);
        self.load_visible(false);
    }

    /// Delivers pending location changes. Returns whether there were any.
    pub fn pump_location(&mut self) -> bool {
        let mut changed = false;
        while let Some(search) = self.location.take_change() {
            changed = true;
            tracing::debug!(query = %search, "Route update");
            let effects = self.sync.on_route_update(&search);
            self.apply(effects);
        }
        changed
    }

    pub fn handle(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::RangeLoaded { token, entries } => match self.sync.range_resolved(token) {
                RangeOutcome::Apply => self.calendar.set_entries(entries),
                RangeOutcome::Superseded(next) => self.spawn_range(next),
                RangeOutcome::Stale => {}
            },
            SessionEvent::DetailLoaded { token, result } => {
                let effects = self
                    .sync
                    .detail_resolved(token, result, &self.location.search());
                self.apply(effects);
            }
        }
    }

    pub fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::GotoDate(date) => {
                    if self.calendar.goto_date(date) {
                        self.render();
                    } else {
                        self.load_visible(false);
                    }
                }
                Effect::RefetchEvents => self.load_visible(true),
                Effect::Reload => self.reload(),
                Effect::WriteSearch(params) => self.location.set_search(params),
                Effect::FetchDetail(req) => self.spawn_detail(req),
            }
        }
    }

    fn reload(&mut self) {
        tracing::info!("Reloading view");
        let display = match self.location.search().get(crate::location::DISPLAY) {
            Some(_) => NavigationState::from_search(&self.location.search()).display_mode,
            None => self.default_display,
        };
        self.sync.reset(display);
        self.calendar.goto_date(self.today);
        self.calendar.clear_entries();
        self.requested = None;
        self.render();
    }

    /// Requests the visible range unless it is already loaded (or loading)
    /// under the current mode.
    fn load_visible(&mut self, force: bool) {
        let key = (self.calendar.visible_range(), self.sync.display_mode());
        if !force && self.requested == Some(key) {
            return;
        }
        self.requested = Some(key);
        if let Some(req) = self.sync.request_range(key.0) {
            self.spawn_range(req);
        }
    }

    fn spawn_range(&self, req: RangeRequest) {
        let api = self.api.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let entries = fetch_entries(&api, req.range, req.mode).await;
            let _ = tx.send(SessionEvent::RangeLoaded {
                token: req.token,
                entries,
            });
        });
    }

    fn spawn_detail(&self, req: DetailRequest) {
        let api = self.api.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = fetch_detail(&api, req.kind, &req.id).await;
            let _ = tx.send(SessionEvent::DetailLoaded {
                token: req.token,
                result,
            });
        });
    }

    // --- User actions ---

    /// Opens the `index`-th visible entry of `day`, as an alert or an event
    /// depending on the display mode.
    pub fn open_entry(&mut self, day: NaiveDate, index: usize) -> bool {
        let Some(id) = self
            .calendar
            .entries_on(day, &self.filter)
            .get(index)
            .map(|e| e.obj_id.clone())
        else {
            return false;
        };
        let kind = self.sync.display_mode().detail_kind();
        self.open_detail(kind, &id);
        true
    }

    pub fn open_detail(&mut self, kind: DetailKind, id: &str) {
        let effects = self.sync.open_detail(kind, id);
        self.apply(effects);
    }

    /// Closes the visible dialog, if any.
    pub fn close_dialog(&mut self) {
        if let Some(kind) = self.sync.dialog().map(Detail::kind) {
            let effects = self.sync.close_detail(kind, &self.location.search());
            self.apply(effects);
        }
    }

    pub fn set_display(&mut self, mode: DisplayMode) {
        let effects = self.sync.change_display_mode(mode, &self.location.search());
        self.apply(effects);
    }

    pub fn toggle_display(&mut self) {
        self.set_display(self.sync.display_mode().toggled());
    }

    pub fn next(&mut self) {
        if self.calendar.next() {
            self.render();
        }
    }

    pub fn prev(&mut self) {
        if self.calendar.prev() {
            self.render();
        }
    }

    pub fn go_today(&mut self) {
        if self.calendar.today(self.today) {
            self.render();
        }
    }

    /// Terminal resized; narrow terminals switch to the day view.
    pub fn resize(&mut self, columns: u16) {
        if self.calendar.fit_width(columns) {
            self.render();
        }
    }

    pub fn back(&mut self) -> bool {
        self.location.back()
    }

    pub fn forward(&mut self) -> bool {
        self.location.forward()
    }

    /// Follows a link given as a query string.
    pub fn follow_link(&mut self, query: &str) {
        self.location.navigate(SearchParams::parse(query));
    }

    /// Steps through "all senders" and each sender seen in the loaded entries.
    pub fn cycle_filter(&mut self) {
        let senders: Vec<String> = self.calendar.senders().into_keys().collect();
        let next = match self.filter.class() {
            None => senders.first().cloned(),
            Some(current) => senders
                .iter()
                .position(|s| s == current)
                .and_then(|i| senders.get(i + 1).cloned()),
        };
        self.filter = match next {
            Some(class) => SenderFilter::only(class),
            None => SenderFilter::all(),
        };
    }
}
