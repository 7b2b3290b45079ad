//! Keeps the URL query, the calendar viewport, the display mode and the detail
//! dialogs consistent with each other.
//!
//! [`Synchronizer`] is a pure state machine: every operation takes the inputs
//! it needs (usually the current [`SearchParams`]) and returns the [`Effect`]s
//! the caller must perform. Fetch results come back through
//! [`Synchronizer::range_resolved`] and [`Synchronizer::detail_resolved`],
//! keyed by the [`Token`] handed out with the request, so late or superseded
//! responses can be told apart from current ones.
use crate::error::ApiError;
use crate::location::{DISPLAY, END, START, SearchParams};
use crate::state::{
    DateRange, Detail, DetailKind, DialogKind, DisplayMode, NavigationState, parse_ymd,
};
use chrono::NaiveDate;

/// Monotonic request identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeRequest {
    pub token: Token,
    pub range: DateRange,
    pub mode: DisplayMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRequest {
    pub token: Token,
    pub kind: DetailKind,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Move the calendar viewport so that it shows this date.
    GotoDate(NaiveDate),
    /// Re-request the visible range under the current display mode.
    RefetchEvents,
    /// Throw the view away and start over from defaults.
    Reload,
    /// Replace the URL query.
    WriteSearch(SearchParams),
    FetchDetail(DetailRequest),
}

/// What to do with a range fetch result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeOutcome {
    Apply,
    /// Discard the result and issue the queued request instead.
    Superseded(RangeRequest),
    /// Not the in-flight request; discard.
    Stale,
}

#[derive(Debug)]
struct PendingDetail {
    id: String,
    token: Token,
    /// Started by a URL change rather than by the user. Only these are
    /// cancelled when the URL stops naming them.
    from_url: bool,
}

#[derive(Debug, Default)]
struct DetailSlot {
    pending: Option<PendingDetail>,
    payload: Option<Detail>,
}

#[derive(Debug, Default)]
struct RangeFetch {
    in_flight: Option<RangeRequest>,
    queued: Option<RangeRequest>,
}

#[derive(Debug)]
pub struct Synchronizer {
    current: NavigationState,
    alert: DetailSlot,
    event: DetailSlot,
    ranges: RangeFetch,
    next_token: u64,
}

impl Synchronizer {
    pub fn new(display_mode: DisplayMode) -> Self {
        Self {
            current: NavigationState {
                display_mode,
                ..NavigationState::default()
            },
            alert: DetailSlot::default(),
            event: DetailSlot::default(),
            ranges: RangeFetch::default(),
            next_token: 0,
        }
    }

    /// Forgets everything except the token counter, so responses to requests
    /// issued before the reset stay stale.
    pub fn reset(&mut self, display_mode: DisplayMode) {
        let next_token = self.next_token;
        *self = Self::new(display_mode);
        self.next_token = next_token;
    }

    /// The recorded navigation state.
    pub fn navigation(&self) -> &NavigationState {
        &self.current
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.current.display_mode
    }

    /// The visible dialog. An alert is stacked above an event.
    pub fn dialog(&self) -> Option<&Detail> {
        self.alert.payload.as_ref().or(self.event.payload.as_ref())
    }

    pub fn dialog_kind(&self) -> DialogKind {
        self.dialog()
            .map(|d| DialogKind::from(d.kind()))
            .unwrap_or_default()
    }

    pub fn is_loading(&self, kind: DetailKind) -> bool {
        self.slot(kind).pending.is_some()
    }

    pub fn range_in_flight(&self) -> Option<&RangeRequest> {
        self.ranges.in_flight.as_ref()
    }

    fn slot(&self, kind: DetailKind) -> &DetailSlot {
        match kind {
            DetailKind::Alert => &self.alert,
            DetailKind::Event => &self.event,
        }
    }

    fn slot_mut(&mut self, kind: DetailKind) -> &mut DetailSlot {
        match kind {
            DetailKind::Alert => &mut self.alert,
            DetailKind::Event => &mut self.event,
        }
    }

    fn token(&mut self) -> Token {
        self.next_token += 1;
        Token(self.next_token)
    }

    /// The identifier this kind is tracking: the one loading, else the open one.
    fn tracked_id(&self, kind: DetailKind) -> Option<&str> {
        self.slot(kind)
            .pending
            .as_ref()
            .map(|p| p.id.as_str())
            .or_else(|| self.current.open_id(kind))
    }

    // --- URL -> view ---

    /// Handles a change of the URL query, whoever made it.
    pub fn on_route_update(&mut self, search: &SearchParams) -> Vec<Effect> {
        let next = NavigationState::from_search(search);
        let mut effects = Vec::new();

        let range_changed =
            next.start_date != self.current.start_date || next.end_date != self.current.end_date;
        let display_changed = next.display_mode != self.current.display_mode;

        match &next.start_date {
            None if self.current.start_date.is_some() => {
                tracing::debug!("No start date in the URL; reloading");
                self.reset(next.display_mode);
                effects.push(Effect::Reload);
                return effects;
            }
            Some(start) if range_changed => {
                if display_changed {
                    self.current.display_mode = next.display_mode;
                }
                if let Some(date) = parse_date_param(start) {
                    effects.push(Effect::GotoDate(date));
                }
            }
            _ if display_changed => {
                // Same window, different data: keep the viewport where it is.
                self.current.display_mode = next.display_mode;
                effects.push(Effect::RefetchEvents);
            }
            _ => {}
        }

        for kind in DetailKind::ALL {
            effects.extend(self.reconcile(kind, next.open_id(kind)));
        }
        effects
    }

    /// Brings one detail slot in line with the URL. A fetch the user started
    /// is not in the URL until it succeeds, so it only counts as tracked
    /// when the URL names the same id.
    fn reconcile(&mut self, kind: DetailKind, wanted: Option<&str>) -> Vec<Effect> {
        let slot = self.slot(kind);
        let pending_id = slot.pending.as_ref().map(|p| p.id.as_str());
        let url_pending = slot
            .pending
            .as_ref()
            .filter(|p| p.from_url)
            .map(|p| p.id.as_str());
        let tracked = url_pending.or_else(|| self.current.open_id(kind));
        let settled = match wanted {
            Some(_) => wanted == tracked || wanted == pending_id,
            None => tracked.is_none(),
        };
        if settled {
            return Vec::new();
        }

        match wanted {
            Some(id) => self.start_fetch(kind, id, true),
            None => {
                // The parameter is already gone, so there is nothing to write.
                let slot = self.slot_mut(kind);
                if slot.pending.as_ref().is_some_and(|p| p.from_url) {
                    slot.pending = None;
                }
                slot.payload = None;
                self.current.set_open_id(kind, None);
                Vec::new()
            }
        }
    }

    // --- view -> URL ---

    /// Handles the calendar settling on a visible range.
    pub fn on_viewport_rendered(&mut self, visible: DateRange, search: &SearchParams) -> Vec<Effect> {
        let url = NavigationState::from_search(search);
        let mut effects = Vec::new();

        if self.current.start_date.is_none()
            && let Some(start) = url.start_date.clone()
        {
            // First render of a deep link: the URL wins.
            self.current.start_date = Some(start.clone());
            self.current.end_date = url.end_date.clone().or_else(|| Some(visible.end_str()));
            self.current.display_mode = url.display_mode;

            for kind in DetailKind::ALL {
                effects.extend(self.reconcile(kind, url.open_id(kind)));
            }
            if let Some(date) = parse_date_param(&start) {
                effects.push(Effect::GotoDate(date));
            }
            return effects;
        }

        let start = visible.start_str();
        let end = visible.end_str();
        if self.current.start_date.as_deref() != Some(start.as_str())
            || self.current.end_date.as_deref() != Some(end.as_str())
        {
            self.current.start_date = Some(start.clone());
            self.current.end_date = Some(end.clone());
            let params = search
                .clone()
                .with(START, start)
                .with(END, end)
                .with(DISPLAY, self.current.display_mode.as_str());
            effects.push(Effect::WriteSearch(params));
        }
        effects
    }

    /// Switches between alerts and events. A no-op when the URL already says so.
    pub fn change_display_mode(&mut self, mode: DisplayMode, search: &SearchParams) -> Vec<Effect> {
        self.current.display_mode = mode;
        if NavigationState::from_search(search).display_mode == mode
            && search.get(DISPLAY).is_some()
        {
            return Vec::new();
        }
        vec![
            Effect::WriteSearch(search.clone().with(DISPLAY, mode.as_str())),
            Effect::RefetchEvents,
        ]
    }

    // --- Detail dialogs ---

    /// Starts fetching a detail. The dialog opens, and the URL records the id,
    /// once [`Synchronizer::detail_resolved`] reports success.
    pub fn open_detail(&mut self, kind: DetailKind, id: &str) -> Vec<Effect> {
        if self.tracked_id(kind) == Some(id) {
            return Vec::new();
        }
        self.start_fetch(kind, id, false)
    }

    fn start_fetch(&mut self, kind: DetailKind, id: &str, from_url: bool) -> Vec<Effect> {
        let token = self.token();
        self.slot_mut(kind).pending = Some(PendingDetail {
            id: id.to_string(),
            token,
            from_url,
        });
        tracing::debug!(%kind, id, from_url, "Fetching detail");
        vec![Effect::FetchDetail(DetailRequest {
            token,
            kind,
            id: id.to_string(),
        })]
    }

    /// Closes a dialog and clears its identifier from the URL if still there.
    pub fn close_detail(&mut self, kind: DetailKind, search: &SearchParams) -> Vec<Effect> {
        let slot = self.slot_mut(kind);
        slot.pending = None;
        slot.payload = None;
        self.current.set_open_id(kind, None);

        if search.contains(kind.param()) {
            vec![Effect::WriteSearch(search.clone().without(kind.param()))]
        } else {
            Vec::new()
        }
    }

    pub fn detail_resolved(
        &mut self,
        token: Token,
        result: Result<Detail, ApiError>,
        search: &SearchParams,
    ) -> Vec<Effect> {
        let Some(kind) = DetailKind::ALL
            .into_iter()
            .find(|k| matches!(&self.slot(*k).pending, Some(p) if p.token == token))
        else {
            tracing::debug!(?token, "Discarding stale detail response");
            return Vec::new();
        };

        let Some(PendingDetail { id, .. }) = self.slot_mut(kind).pending.take() else {
            return Vec::new();
        };

        match result {
            Ok(detail) if detail.kind() == kind => {
                self.slot_mut(kind).payload = Some(detail);
                self.current.set_open_id(kind, Some(id.clone()));
                if search.get(kind.param()) == Some(id.as_str()) {
                    Vec::new()
                } else {
                    vec![Effect::WriteSearch(search.clone().with(kind.param(), id))]
                }
            }
            Ok(detail) => {
                tracing::error!(%kind, got = %detail.kind(), id = %id, "Detail of the wrong kind");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(%kind, id = %id, "Failed getting {}: {}", kind, e);
                Vec::new()
            }
        }
    }

    // --- Range fetches ---

    /// The calendar asks for the entries of a range. Returns the request to
    /// issue, or `None` when one is already in flight; the new request is then
    /// queued and replaces the in-flight one once that resolves.
    pub fn request_range(&mut self, range: DateRange) -> Option<RangeRequest> {
        let request = RangeRequest {
            token: self.token(),
            range,
            mode: self.current.display_mode,
        };
        if self.ranges.in_flight.is_some() {
            tracing::debug!(%range, "Range fetch in flight; queueing");
            self.ranges.queued = Some(request);
            None
        } else {
            self.ranges.in_flight = Some(request);
            Some(request)
        }
    }

    pub fn range_resolved(&mut self, token: Token) -> RangeOutcome {
        match self.ranges.in_flight {
            Some(req) if req.token == token => {}
            _ => return RangeOutcome::Stale,
        }
        match self.ranges.queued.take() {
            Some(next) => {
                self.ranges.in_flight = Some(next);
                RangeOutcome::Superseded(next)
            }
            None => {
                self.ranges.in_flight = None;
                RangeOutcome::Apply
            }
        }
    }
}

fn parse_date_param(raw: &str) -> Option<NaiveDate> {
    match parse_ymd(raw) {
        Ok(date) => Some(date),
        Err(e) => {
            tracing::warn!("Skipping navigation: {}", e);
            None
        }
    }
}
