//! Chart session: one ticker's chart with a switchable interval.
//!
//! The session owns the selected `(ticker, interval)` and the redraw loop.
//! A load observes the chart query for the interval selected when it starts,
//! and only draws if that interval is still selected when the response
//! arrives. Switching intervals quickly therefore never shows the older
//! interval's data, whatever order the responses come back in.

use super::wire::{CandleSample, ChartResponse};
use super::Interval;
use crate::chart::{ChartRenderer, ContainerSize, RedrawLoop};
use crate::error::QueryError;
use crate::query::{QueryClient, QueryKey, QueryObserver, QueryOptions, QueryStatus};
use crate::shared::Ticker;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Builds the chart query for a `(ticker, interval)` pair.
pub type ChartOptionsFn = Rc<dyn Fn(&Ticker, Interval) -> QueryOptions<ChartResponse, Vec<CandleSample>>>;

/// How a [`ChartSession::load`] ended.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The chart was redrawn with the response. `dropped` counts samples
    /// rejected by normalization.
    Drawn { dropped: usize },
    /// The interval changed while the request was pending; nothing was drawn.
    Superseded,
    /// The query failed. Any data kept from an earlier success was still drawn.
    Failed(QueryError),
}

pub struct ChartSession<R> {
    queries: QueryClient,
    options_for: ChartOptionsFn,
    ticker: Ticker,
    interval: Cell<Interval>,
    observer: RefCell<Option<QueryObserver<ChartResponse, Vec<CandleSample>>>>,
    chart: RefCell<RedrawLoop<R>>,
}

impl<R: ChartRenderer> ChartSession<R> {
    pub fn new(
        queries: QueryClient,
        options_for: ChartOptionsFn,
        ticker: Ticker,
        interval: Interval,
        renderer: R,
    ) -> Self {
        Self {
            queries,
            options_for,
            ticker,
            interval: Cell::new(interval),
            observer: RefCell::new(None),
            chart: RefCell::new(RedrawLoop::new(renderer)),
        }
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    pub fn interval(&self) -> Interval {
        self.interval.get()
    }

    /// Key of the currently selected interval's chart.
    pub fn active_key(&self) -> QueryKey {
        (self.options_for)(&self.ticker, self.interval.get()).key
    }

    /// Select another interval. Returns whether the selection changed; call
    /// [`load`](Self::load) afterwards to fetch and draw it.
    pub fn set_interval(&self, interval: Interval) -> bool {
        if self.interval.replace(interval) == interval {
            return false;
        }
        tracing::debug!(ticker = %self.ticker, interval = %interval, "Chart interval changed");
        true
    }

    /// Forward a container size to the redraw loop.
    pub fn resize(&self, size: ContainerSize) -> bool {
        self.chart.borrow_mut().resize(size)
    }

    /// Inspect the renderer (e.g. to read what it produced).
    pub fn with_renderer<T>(&self, f: impl FnOnce(&R) -> T) -> T {
        f(self.chart.borrow().renderer())
    }

    pub fn draw_count(&self) -> u64 {
        self.chart.borrow().draw_count()
    }

    /// Fetch (or reuse) the selected interval's chart and draw it, unless the
    /// selection changed meanwhile.
    ///
    /// The renderer runs inside this call and must not call back into the
    /// session.
    pub async fn load(&self) -> LoadOutcome {
        let options = (self.options_for)(&self.ticker, self.interval.get());
        let issued = options.key.clone();

        let observer = self.queries.subscribe(options);
        let pending = observer.fetch();
        // The previous interval's observer is released here; its fetch still
        // completes into the cache.
        self.observer.replace(Some(observer));

        let result = pending.await;

        let active = self.active_key();
        if active != issued {
            tracing::debug!(issued = %issued, active = %active, "Discarding chart response for inactive interval");
            return LoadOutcome::Superseded;
        }

        let dropped = match &result.data {
            Some(samples) => self.chart.borrow_mut().set_samples(Some(samples.as_slice())),
            None if result.status == QueryStatus::Error => 0,
            None => self.chart.borrow_mut().set_samples(None),
        };

        match (result.status, result.error) {
            (QueryStatus::Error, Some(err)) => LoadOutcome::Failed(err),
            _ => LoadOutcome::Drawn { dropped },
        }
    }
}
