//! Chart rendering surfaces and the slot that owns their bindings.

use std::{error::Error, io::Cursor};

use image::{ImageFormat, RgbImage};
use plotters::{coord::Shift, prelude::*};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use tracing::{debug, warn};

use crate::{
    comparison::{BreakdownSeries, OverlaySeries, Rgb},
    error::SurfaceError,
};

const MIN_SIDE: u32 = 120;
const DASH_SIZE: u32 = 8;
const DASH_GAP: u32 = 5;
/// Fraction of a period left empty on each side of a bar.
const BAR_INSET: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartDefinition {
    /// Balance and cumulative interest, optionally overlaid with custom series.
    Line(OverlaySeries),
    /// Stacked principal/interest per period.
    StackedBar(BreakdownSeries),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingId(pub u64);

/// A target that holds at most one bound chart at a time.
pub trait ChartSurface: Send {
    fn name(&self) -> &str;
    fn bind(&mut self, chart: &ChartDefinition) -> Result<BindingId, SurfaceError>;
    fn release(&mut self, binding: BindingId) -> Result<(), SurfaceError>;
    fn active_bindings(&self) -> usize;
    fn snapshot_png(&self) -> Result<Vec<u8>, SurfaceError>;
}

/// Sole owner of a surface's binding. Every rebind releases the previous
/// binding first, and dropping the slot releases whatever is still bound.
pub struct SurfaceSlot {
    surface: Box<dyn ChartSurface>,
    binding: Option<BindingId>,
}

impl SurfaceSlot {
    pub fn new(surface: Box<dyn ChartSurface>) -> Self {
        Self {
            surface,
            binding: None,
        }
    }

    pub fn replace(&mut self, chart: &ChartDefinition) -> Result<BindingId, SurfaceError> {
        self.clear()?;
        let binding = self.surface.bind(chart)?;
        debug!(surface = self.surface.name(), binding = binding.0, "chart bound");
        self.binding = Some(binding);
        Ok(binding)
    }

    pub fn clear(&mut self) -> Result<(), SurfaceError> {
        if let Some(binding) = self.binding.take() {
            self.surface.release(binding)?;
            debug!(surface = self.surface.name(), binding = binding.0, "chart released");
        }
        Ok(())
    }

    pub fn surface(&self) -> &dyn ChartSurface {
        self.surface.as_ref()
    }

    pub fn snapshot_png(&self) -> Result<Vec<u8>, SurfaceError> {
        if self.binding.is_none() {
            return Err(SurfaceError::NothingRendered {
                surface: self.surface.name().to_string(),
            });
        }
        self.surface.snapshot_png()
    }
}

impl Drop for SurfaceSlot {
    fn drop(&mut self) {
        if let Err(err) = self.clear() {
            warn!(surface = self.surface.name(), "failed to release chart on drop: {err}");
        }
    }
}

/// Draws charts with `plotters` into an in-memory RGB buffer and keeps the
/// result until the binding is released.
pub struct RasterSurface {
    name: String,
    width: u32,
    height: u32,
    next_binding: u64,
    bound: Option<(BindingId, RgbImage)>,
}

impl RasterSurface {
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width: width.max(MIN_SIDE),
            height: height.max(MIN_SIDE),
            next_binding: 1,
            bound: None,
        }
    }

    pub fn image(&self) -> Option<&RgbImage> {
        self.bound.as_ref().map(|(_, image)| image)
    }

    fn render(&self, chart: &ChartDefinition) -> Result<RgbImage, SurfaceError> {
        let mut buffer = vec![0u8; self.width as usize * self.height as usize * 3];
        draw_chart(chart, &mut buffer, (self.width, self.height)).map_err(|err| {
            SurfaceError::Draw {
                surface: self.name.clone(),
                reason: err.to_string(),
            }
        })?;
        RgbImage::from_raw(self.width, self.height, buffer).ok_or_else(|| SurfaceError::Draw {
            surface: self.name.clone(),
            reason: "pixel buffer does not match surface size".into(),
        })
    }
}

impl ChartSurface for RasterSurface {
    fn name(&self) -> &str {
        &self.name
    }

    fn bind(&mut self, chart: &ChartDefinition) -> Result<BindingId, SurfaceError> {
        if self.bound.is_some() {
            return Err(SurfaceError::AlreadyBound {
                surface: self.name.clone(),
            });
        }
        let image = self.render(chart)?;
        let binding = BindingId(self.next_binding);
        self.next_binding += 1;
        self.bound = Some((binding, image));
        Ok(binding)
    }

    fn release(&mut self, binding: BindingId) -> Result<(), SurfaceError> {
        match &self.bound {
            Some((current, _)) if *current == binding => {
                self.bound = None;
                Ok(())
            }
            _ => Err(SurfaceError::UnknownBinding {
                surface: self.name.clone(),
                binding: binding.0,
            }),
        }
    }

    fn active_bindings(&self) -> usize {
        usize::from(self.bound.is_some())
    }

    fn snapshot_png(&self) -> Result<Vec<u8>, SurfaceError> {
        let (_, image) = self
            .bound
            .as_ref()
            .ok_or_else(|| SurfaceError::NothingRendered {
                surface: self.name.clone(),
            })?;
        let mut bytes = Cursor::new(Vec::new());
        image
            .write_to(&mut bytes, ImageFormat::Png)
            .map_err(|err| SurfaceError::Encode {
                surface: self.name.clone(),
                reason: err.to_string(),
            })?;
        Ok(bytes.into_inner())
    }
}

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

fn draw_chart(
    chart: &ChartDefinition,
    buffer: &mut [u8],
    size: (u32, u32),
) -> Result<(), Box<dyn Error>> {
    let root = BitMapBackend::with_buffer(buffer, size).into_drawing_area();
    root.fill(&WHITE)?;
    match chart {
        ChartDefinition::Line(overlay) => draw_overlay(&root, overlay)?,
        ChartDefinition::StackedBar(breakdown) => draw_breakdown(&root, breakdown)?,
    }
    root.present()?;
    Ok(())
}

fn draw_overlay(area: &Area<'_>, overlay: &OverlaySeries) -> Result<(), Box<dyn Error>> {
    let max_x = overlay
        .series
        .iter()
        .flat_map(|series| series.points.iter().map(|point| point.payment_number))
        .max()
        .unwrap_or(1);
    let max_y = overlay
        .series
        .iter()
        .flat_map(|series| series.points.iter().map(|point| to_f64(point.value)))
        .fold(0.0, f64::max);

    let mut chart = ChartBuilder::on(area)
        .margin(12)
        .set_label_area_size(LabelAreaPosition::Left, 70)
        .set_label_area_size(LabelAreaPosition::Bottom, 30)
        .build_cartesian_2d(1.0..f64::from(max_x.max(2)), 0.0..upper_bound(max_y))?;
    chart
        .configure_mesh()
        .x_desc("Payment")
        .x_label_formatter(&|v| format!("{v:.0}"))
        .y_label_formatter(&|v| format!("{v:.0}"))
        .draw()?;

    for series in &overlay.series {
        let style = series.style();
        let shape = ShapeStyle {
            color: to_color(style.color).to_rgba(),
            filled: false,
            stroke_width: 2,
        };
        let points: Vec<(f64, f64)> = series
            .points
            .iter()
            .map(|point| (f64::from(point.payment_number), to_f64(point.value)))
            .collect();
        let drawn = if style.dashed {
            chart.draw_series(DashedLineSeries::new(points, DASH_SIZE, DASH_GAP, shape))?
        } else {
            chart.draw_series(LineSeries::new(points, shape))?
        };
        drawn
            .label(series.label())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 24, y)], shape));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK.mix(0.3))
        .position(SeriesLabelPosition::UpperRight)
        .draw()?;
    Ok(())
}

fn draw_breakdown(area: &Area<'_>, breakdown: &BreakdownSeries) -> Result<(), Box<dyn Error>> {
    let max_total = breakdown
        .principal
        .iter()
        .zip(&breakdown.interest)
        .map(|(principal, interest)| to_f64(*principal + *interest))
        .fold(0.0, f64::max);

    let mut chart = ChartBuilder::on(area)
        .margin(12)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 30)
        .build_cartesian_2d(0.0..breakdown.len().max(1) as f64, 0.0..upper_bound(max_total))?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Payment")
        .x_label_formatter(&|v| format!("{:.0}", v + 1.0))
        .y_label_formatter(&|v| format!("{v:.0}"))
        .draw()?;

    let principal_color = to_color(BreakdownSeries::PRINCIPAL_STYLE.color);
    let interest_color = to_color(BreakdownSeries::INTEREST_STYLE.color);
    let columns: Vec<(f64, f64, f64)> = breakdown
        .principal
        .iter()
        .zip(&breakdown.interest)
        .enumerate()
        .map(|(index, (principal, interest))| {
            let principal = to_f64(*principal);
            (index as f64, principal, principal + to_f64(*interest))
        })
        .collect();

    chart
        .draw_series(columns.iter().map(|(x, principal, _)| {
            Rectangle::new(
                [(x + BAR_INSET, 0.0), (x + 1.0 - BAR_INSET, *principal)],
                principal_color.filled(),
            )
        }))?
        .label(BreakdownSeries::PRINCIPAL_LABEL)
        .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], principal_color.filled()));
    chart
        .draw_series(columns.iter().map(|(x, principal, total)| {
            Rectangle::new(
                [(x + BAR_INSET, *principal), (x + 1.0 - BAR_INSET, *total)],
                interest_color.filled(),
            )
        }))?
        .label(BreakdownSeries::INTEREST_LABEL)
        .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], interest_color.filled()));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK.mix(0.3))
        .position(SeriesLabelPosition::UpperRight)
        .draw()?;
    Ok(())
}

fn upper_bound(max: f64) -> f64 {
    if max > 0.0 {
        max * 1.05
    } else {
        1.0
    }
}

fn to_color(rgb: Rgb) -> RGBColor {
    RGBColor(rgb.0, rgb.1, rgb.2)
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}
