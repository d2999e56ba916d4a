//! Progress chart drawing and hover hit-testing.
//!
//! Drawing goes through the small [`Canvas`] trait so the layout math can be
//! exercised without a window; [`PainterCanvas`] adapts it to an egui painter.

use egui::{Align2, Color32, FontId, Pos2, Stroke, Vec2, pos2};

use crate::progress::{ProgressData, ProgressPoint};

pub const PADDING: f32 = 40.0;
/// Pointer distance (px) within which a point counts as hovered.
pub const HIT_RADIUS: f32 = 20.0;
const GRID_ROWS: usize = 4;
const MAX_X_LABELS: usize = 5;
const POINT_RADIUS: f32 = 3.0;
const LINE_WIDTH: f32 = 2.0;

const BACKGROUND: Color32 = Color32::WHITE;
const GRID_COLOR: Color32 = Color32::from_rgb(0xe5, 0xe7, 0xeb);
const TEXT_COLOR: Color32 = Color32::from_rgb(0x6b, 0x72, 0x80);

/// Minimal 2D drawing surface in chart-local pixel coordinates.
pub trait Canvas {
    fn fill(&mut self, color: Color32);
    fn polyline(&mut self, points: &[Pos2], width: f32, color: Color32);
    fn circle(&mut self, center: Pos2, radius: f32, color: Color32);
    /// Text with `pos` at the left end of its baseline.
    fn text(&mut self, pos: Pos2, text: &str, color: Color32);
    /// Text rotated a quarter turn counter-clockwise, centered on `center`.
    fn vertical_text(&mut self, center: Pos2, text: &str, color: Color32);
}

/// Linear data-to-pixel mapping for one chart frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartLayout {
    pub width: f32,
    pub height: f32,
    pub padding: f32,
    pub label_count: usize,
    pub y_max: f64,
}

impl ChartLayout {
    pub fn new(size: Vec2, data: &ProgressData) -> Self {
        Self {
            width: size.x,
            height: size.y,
            padding: PADDING,
            label_count: data.labels.len(),
            y_max: y_max(data.max_visible_weight()),
        }
    }

    /// Pixel x for a (possibly offset) workout index. With a single label
    /// everything sits at the left edge.
    pub fn x_px(&self, x: f64) -> f32 {
        if self.label_count <= 1 {
            return self.padding;
        }
        let span = (self.width - self.padding * 2.0) as f64;
        self.padding + (x * span / (self.label_count - 1) as f64) as f32
    }

    pub fn y_px(&self, weight: f64) -> f32 {
        let span = (self.height - self.padding * 2.0) as f64;
        self.padding + (span * (1.0 - weight / self.y_max)) as f32
    }

    pub fn point_px(&self, p: &ProgressPoint) -> Pos2 {
        pos2(self.x_px(p.x()), self.y_px(p.weight_lb))
    }

    fn grid_y(&self, row: usize) -> f32 {
        self.padding + (self.height - self.padding * 2.0) * row as f32 / GRID_ROWS as f32
    }
}

/// Upper bound of the y axis: 20% headroom over the data, at least 10.
pub fn y_max(max_weight: Option<f64>) -> f64 {
    (max_weight.unwrap_or(0.0).max(0.0) * 1.2).max(10.0)
}

/// Step between labelled x categories so that at most five are shown.
pub fn label_stride(count: usize) -> usize {
    count.div_ceil(MAX_X_LABELS).max(1)
}

fn draw_axes(canvas: &mut dyn Canvas, layout: &ChartLayout, labels: &[String]) {
    let left = layout.padding;
    let right = layout.width - layout.padding;
    for row in 0..=GRID_ROWS {
        let y = layout.grid_y(row);
        canvas.polyline(&[pos2(left, y), pos2(right, y)], 1.0, GRID_COLOR);
    }
    for row in 0..=GRID_ROWS {
        let value = (layout.y_max * (1.0 - row as f64 / GRID_ROWS as f64)).round();
        let y = layout.grid_y(row) + 4.0;
        canvas.text(pos2(left - 30.0, y), &format!("{value}"), TEXT_COLOR);
    }
    canvas.vertical_text(pos2(12.0, layout.height / 2.0), "Weight (lb)", TEXT_COLOR);

    let stride = label_stride(labels.len());
    for (i, label) in labels.iter().enumerate().step_by(stride) {
        let x = layout.x_px(i as f64);
        canvas.text(
            pos2(x - 16.0, layout.height - layout.padding + 14.0),
            label,
            TEXT_COLOR,
        );
    }
}

/// Draw the whole chart for `data` on a surface of `size` pixels.
pub fn render(canvas: &mut dyn Canvas, data: &ProgressData, size: Vec2) -> ChartLayout {
    let layout = ChartLayout::new(size, data);
    canvas.fill(BACKGROUND);
    draw_axes(canvas, &layout, &data.labels);

    for series in data.series.iter().filter(|s| s.visible && !s.points.is_empty()) {
        let points: Vec<Pos2> = series.points.iter().map(|p| layout.point_px(p)).collect();
        canvas.polyline(&points, LINE_WIDTH, series.color);
        for p in &points {
            canvas.circle(*p, POINT_RADIUS, series.color);
        }
    }
    layout
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub series: usize,
    pub point: usize,
    pub distance_sq: f32,
}

/// Closest point of a visible series to `pos`, if within [`HIT_RADIUS`].
pub fn hit_test(layout: &ChartLayout, data: &ProgressData, pos: Pos2) -> Option<Hit> {
    if data.labels.is_empty() {
        return None;
    }
    let mut best: Option<Hit> = None;
    for (si, series) in data.series.iter().enumerate() {
        if !series.visible {
            continue;
        }
        for (pi, point) in series.points.iter().enumerate() {
            let d2 = (layout.point_px(point) - pos).length_sq();
            if best.map_or(true, |b| d2 < b.distance_sq) {
                best = Some(Hit {
                    series: si,
                    point: pi,
                    distance_sq: d2,
                });
            }
        }
    }
    best.filter(|b| b.distance_sq < HIT_RADIUS * HIT_RADIUS)
}

/// Tooltip body for a hovered point.
pub fn tooltip_text(data: &ProgressData, hit: &Hit) -> Option<String> {
    let series = data.series.get(hit.series)?;
    let point = series.points.get(hit.point)?;
    let label = data
        .labels
        .get(point.workout_index)
        .map(String::as_str)
        .unwrap_or("");
    Some(format!(
        "{}\n{} - {:.1} lb • {} reps",
        series.label, label, point.weight_lb, point.reps
    ))
}

/// [`Canvas`] over an egui painter, translating chart-local coordinates.
pub struct PainterCanvas<'a> {
    painter: &'a egui::Painter,
    origin: Pos2,
    size: Vec2,
}

impl<'a> PainterCanvas<'a> {
    pub fn new(painter: &'a egui::Painter, rect: egui::Rect) -> Self {
        Self {
            painter,
            origin: rect.min,
            size: rect.size(),
        }
    }

    fn at(&self, p: Pos2) -> Pos2 {
        self.origin + p.to_vec2()
    }
}

impl Canvas for PainterCanvas<'_> {
    fn fill(&mut self, color: Color32) {
        let rect = egui::Rect::from_min_size(self.origin, self.size);
        self.painter.rect_filled(rect, 0.0, color);
    }

    fn polyline(&mut self, points: &[Pos2], width: f32, color: Color32) {
        let points: Vec<Pos2> = points.iter().map(|p| self.at(*p)).collect();
        self.painter
            .add(egui::Shape::line(points, Stroke::new(width, color)));
    }

    fn circle(&mut self, center: Pos2, radius: f32, color: Color32) {
        self.painter.circle_filled(self.at(center), radius, color);
    }

    fn text(&mut self, pos: Pos2, text: &str, color: Color32) {
        self.painter.text(
            self.at(pos),
            Align2::LEFT_BOTTOM,
            text,
            FontId::proportional(12.0),
            color,
        );
    }

    fn vertical_text(&mut self, center: Pos2, text: &str, color: Color32) {
        let galley = self
            .painter
            .layout_no_wrap(text.to_owned(), FontId::proportional(12.0), color);
        let size = galley.size();
        let c = self.at(center);
        let mut shape =
            egui::epaint::TextShape::new(pos2(c.x - size.y / 2.0, c.y + size.x / 2.0), galley, color);
        shape.angle = -std::f32::consts::FRAC_PI_2;
        self.painter.add(shape);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{AxisDomain, ProgressSeries};
    use chrono::Utc;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Fill,
        Polyline(Vec<Pos2>, Color32),
        Circle(Pos2, Color32),
        Text(Pos2, String),
        VerticalText(String),
    }

    #[derive(Default)]
    struct Recorder {
        ops: Vec<Op>,
    }

    impl Canvas for Recorder {
        fn fill(&mut self, _color: Color32) {
            self.ops.push(Op::Fill);
        }
        fn polyline(&mut self, points: &[Pos2], _width: f32, color: Color32) {
            self.ops.push(Op::Polyline(points.to_vec(), color));
        }
        fn circle(&mut self, center: Pos2, _radius: f32, color: Color32) {
            self.ops.push(Op::Circle(center, color));
        }
        fn text(&mut self, pos: Pos2, text: &str, _color: Color32) {
            self.ops.push(Op::Text(pos, text.to_string()));
        }
        fn vertical_text(&mut self, _center: Pos2, text: &str, _color: Color32) {
            self.ops.push(Op::VerticalText(text.to_string()));
        }
    }

    fn point(workout_index: usize, weight_lb: f64) -> ProgressPoint {
        ProgressPoint {
            workout_index,
            lateral_offset: 0.0,
            weight_lb,
            reps: 5,
            date: Utc::now(),
            workout_name: "W".into(),
            set_number: 1,
        }
    }

    fn data(labels: usize, series: Vec<Vec<ProgressPoint>>) -> ProgressData {
        ProgressData {
            labels: (0..labels).map(|i| format!("L{i}")).collect(),
            series: series
                .into_iter()
                .enumerate()
                .map(|(i, points)| ProgressSeries {
                    label: format!("Set {}", i + 1),
                    color: crate::progress::SERIES_COLORS[i],
                    points,
                    visible: true,
                })
                .collect(),
            domain: AxisDomain::default(),
        }
    }

    const SIZE: Vec2 = Vec2::new(440.0, 280.0);

    #[test]
    fn y_axis_has_floor_and_headroom() {
        assert_eq!(y_max(None), 10.0);
        assert_eq!(y_max(Some(5.0)), 10.0);
        assert!((y_max(Some(200.0)) - 240.0).abs() < 1e-9);
    }

    #[test]
    fn scales_map_to_padded_area() {
        let layout = ChartLayout::new(SIZE, &data(3, vec![vec![point(0, 100.0)]]));
        assert_eq!(layout.x_px(0.0), PADDING);
        assert_eq!(layout.x_px(2.0), SIZE.x - PADDING);
        assert_eq!(layout.y_px(0.0), SIZE.y - PADDING);
        assert!((layout.y_px(layout.y_max) - PADDING).abs() < 1e-4);
    }

    #[test]
    fn single_label_sits_on_left_edge() {
        let layout = ChartLayout::new(SIZE, &data(1, vec![vec![point(0, 100.0)]]));
        assert_eq!(layout.x_px(0.0), PADDING);
        assert_eq!(layout.x_px(0.12), PADDING);
    }

    #[test]
    fn hit_exact_point_and_miss_far_away() {
        let d = data(2, vec![vec![point(0, 100.0), point(1, 120.0)]]);
        let layout = ChartLayout::new(SIZE, &d);
        let target = layout.point_px(&d.series[0].points[1]);

        let hit = hit_test(&layout, &d, target).unwrap();
        assert_eq!((hit.series, hit.point), (0, 1));
        assert_eq!(hit.distance_sq, 0.0);

        assert!(hit_test(&layout, &d, target + Vec2::new(1000.0, 0.0)).is_none());
    }

    #[test]
    fn hidden_series_are_not_hit() {
        let mut d = data(2, vec![vec![point(0, 100.0)], vec![point(0, 101.0)]]);
        let layout = ChartLayout::new(SIZE, &d);
        let target = layout.point_px(&d.series[0].points[0]);
        d.toggle(0);
        let hit = hit_test(&layout, &d, target).unwrap();
        assert_eq!(hit.series, 1);
    }

    #[test]
    fn empty_chart_never_hits() {
        let d = ProgressData::default();
        let layout = ChartLayout::new(SIZE, &d);
        assert!(hit_test(&layout, &d, pos2(PADDING, SIZE.y - PADDING)).is_none());
    }

    #[test]
    fn tooltip_mentions_date_weight_and_reps() {
        let d = data(2, vec![vec![point(0, 100.0), point(1, 110.2311)]]);
        let hit = Hit {
            series: 0,
            point: 1,
            distance_sq: 0.0,
        };
        assert_eq!(
            tooltip_text(&d, &hit).unwrap(),
            "Set 1\nL1 - 110.2 lb • 5 reps"
        );
    }

    #[test]
    fn render_draws_visible_series_only() {
        let mut d = data(
            3,
            vec![
                vec![point(0, 100.0), point(1, 105.0), point(2, 110.0)],
                vec![point(0, 90.0)],
            ],
        );
        d.toggle(1);
        let mut rec = Recorder::default();
        render(&mut rec, &d, SIZE);

        assert_eq!(rec.ops[0], Op::Fill);
        let series_lines: Vec<&Op> = rec
            .ops
            .iter()
            .filter(|op| matches!(op, Op::Polyline(_, c) if *c == d.series[0].color))
            .collect();
        assert_eq!(series_lines.len(), 1);
        let circles = rec.ops.iter().filter(|op| matches!(op, Op::Circle(..))).count();
        assert_eq!(circles, 3);
        assert!(rec.ops.contains(&Op::VerticalText("Weight (lb)".into())));
        // Gridlines plus one line for the visible series.
        let lines = rec.ops.iter().filter(|op| matches!(op, Op::Polyline(..))).count();
        assert_eq!(lines, GRID_ROWS + 2);
    }

    #[test]
    fn x_labels_are_thinned() {
        let d = data(12, vec![]);
        let mut rec = Recorder::default();
        render(&mut rec, &d, SIZE);
        let x_labels: Vec<String> = rec
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::Text(_, t) if t.starts_with('L') => Some(t.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(x_labels, vec!["L0", "L3", "L6", "L9"]);
        assert_eq!(label_stride(3), 1);
        assert_eq!(label_stride(0), 1);
    }

    #[test]
    fn at_most_five_x_labels_for_any_count() {
        for count in 1..=40 {
            let shown = (0..count).step_by(label_stride(count)).count();
            assert!(shown <= MAX_X_LABELS, "{count} labels showed {shown}");
            assert!(shown >= count.min(3), "{count} labels showed {shown}");
        }
        assert_eq!((0..9).step_by(label_stride(9)).count(), 5);
    }

    #[test]
    fn y_labels_are_evenly_spaced() {
        let d = data(2, vec![vec![point(0, 100.0)]]);
        let mut rec = Recorder::default();
        render(&mut rec, &d, SIZE);
        let values: Vec<String> = rec
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::Text(_, t) if !t.starts_with('L') => Some(t.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(values, vec!["120", "90", "60", "30", "0"]);
    }
}
