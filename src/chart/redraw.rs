//! Resize-reactive redraw loop.
//!
//! The loop keeps the latest container size and the latest points and draws
//! whenever either changes (the first size included). Scales are rebuilt from
//! scratch on every draw. Size changes are delivered explicitly, typically by
//! a [`ResizeObserver`] wired to the host's layout events.

use super::normalize::{normalize, PlotPoint};
use super::scale::{self, ChartScales};
use crate::domain::candle::wire::CandleSample;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::fmt::Write as _;
use std::rc::Rc;

/// Width and height of the chart container, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerSize {
    pub width: f64,
    pub height: f64,
}

impl ContainerSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Input to [`RedrawLoop::handle`].
#[derive(Debug, Clone, PartialEq)]
pub enum ChartEvent {
    Resized(ContainerSize),
    DataChanged(Vec<PlotPoint>),
}

/// Everything a renderer needs for one draw.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartFrame<'a> {
    pub size: ContainerSize,
    pub points: &'a [PlotPoint],
    /// `None` when there are no points to plot.
    pub scales: Option<ChartScales>,
    /// Points projected to pixel space, in input order.
    pub path: Vec<(f64, f64)>,
}

impl ChartFrame<'_> {
    /// The line as an SVG path `d` attribute.
    pub fn svg_path(&self) -> String {
        svg_path(&self.path)
    }
}

/// Draws frames onto some surface (SVG string, canvas, terminal...).
pub trait ChartRenderer {
    fn draw(&mut self, frame: &ChartFrame<'_>);
}

impl<F> ChartRenderer for F
where
    F: FnMut(&ChartFrame<'_>),
{
    fn draw(&mut self, frame: &ChartFrame<'_>) {
        self(frame)
    }
}

// ─── RedrawLoop ──────────────────────────────────────────────────────────────

pub struct RedrawLoop<R> {
    renderer: R,
    size: Option<ContainerSize>,
    points: Vec<PlotPoint>,
    draws: u64,
}

impl<R: ChartRenderer> RedrawLoop<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            size: None,
            points: Vec::new(),
            draws: 0,
        }
    }

    /// Apply one event. Returns whether a frame was drawn.
    pub fn handle(&mut self, event: ChartEvent) -> bool {
        match event {
            ChartEvent::Resized(size) => self.resize(size),
            ChartEvent::DataChanged(points) => self.set_points(points),
        }
    }

    /// Record a new container size and redraw, unless it is the size already
    /// drawn at.
    pub fn resize(&mut self, size: ContainerSize) -> bool {
        if self.size == Some(size) {
            return false;
        }
        tracing::debug!(width = size.width, height = size.height, "Chart resized");
        self.size = Some(size);
        self.redraw()
    }

    /// Replace the plotted points. Draws only once a size is known.
    pub fn set_points(&mut self, points: Vec<PlotPoint>) -> bool {
        self.points = points;
        self.redraw()
    }

    /// Normalize raw samples and plot them. Returns how many samples were
    /// dropped as unparsable.
    pub fn set_samples(&mut self, samples: Option<&[CandleSample]>) -> usize {
        let normalized = normalize(samples);
        self.set_points(normalized.points);
        normalized.dropped
    }

    /// Draw the current state at the current size.
    pub fn redraw(&mut self) -> bool {
        let Some(size) = self.size else {
            return false;
        };
        let scales = scale::build(&self.points, size.width, size.height);
        let path = match &scales {
            Some(scales) => line_path(&self.points, scales),
            None => Vec::new(),
        };
        let frame = ChartFrame {
            size,
            points: &self.points,
            scales,
            path,
        };
        self.renderer.draw(&frame);
        self.draws += 1;
        true
    }

    pub fn size(&self) -> Option<ContainerSize> {
        self.size
    }

    pub fn points(&self) -> &[PlotPoint] {
        &self.points
    }

    pub fn draw_count(&self) -> u64 {
        self.draws
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }
}

/// Project `points` to pixel space.
pub fn line_path(points: &[PlotPoint], scales: &ChartScales) -> Vec<(f64, f64)> {
    points.iter().map(|p| scales.project(p)).collect()
}

/// `M x,y L x,y ...` with two decimals; empty for no points.
pub fn svg_path(path: &[(f64, f64)]) -> String {
    let mut d = String::with_capacity(path.len() * 16);
    for (i, (x, y)) in path.iter().enumerate() {
        let cmd = if i == 0 { 'M' } else { 'L' };
        if i > 0 {
            d.push(' ');
        }
        let _ = write!(d, "{cmd}{x:.2},{y:.2}");
    }
    d
}

// ─── ResizeObserver ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResizeSubscription(u64);

type ResizeListener = Rc<dyn Fn(ContainerSize)>;

/// Delivers container sizes to listeners, skipping repeats of the last size.
#[derive(Default)]
pub struct ResizeObserver {
    listeners: RefCell<Vec<(ResizeSubscription, ResizeListener)>>,
    last: Cell<Option<ContainerSize>>,
    next_id: Cell<u64>,
}

impl ResizeObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: impl Fn(ContainerSize) + 'static) -> ResizeSubscription {
        let id = ResizeSubscription(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: ResizeSubscription) {
        self.listeners.borrow_mut().retain(|(sub, _)| *sub != id);
    }

    /// Report the container's current size. Returns whether it was delivered.
    pub fn notify(&self, size: ContainerSize) -> bool {
        if self.last.get() == Some(size) {
            return false;
        }
        self.last.set(Some(size));
        let listeners: Vec<ResizeListener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener(size);
        }
        true
    }

    pub fn last_size(&self) -> Option<ContainerSize> {
        self.last.get()
    }
}
