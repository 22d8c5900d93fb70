//! Chart pipeline: raw samples → plot points → scales → frames.

pub mod normalize;
pub mod redraw;
pub mod scale;

pub use normalize::{normalize, Normalized, PlotPoint};
pub use redraw::{
    line_path, svg_path, ChartEvent, ChartFrame, ChartRenderer, ContainerSize, RedrawLoop,
    ResizeObserver, ResizeSubscription,
};
pub use scale::{build, extent, ChartScales, LinearScale, Margin, TimeScale, CHART_MARGIN};
