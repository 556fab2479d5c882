mod batch;
mod snap;

pub use batch::{simplify_buildings, write_records, BatchConfig, BatchReport};

use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::building::{BuildingLayer, BuildingTree, LayerCosts, LayerId};
use crate::error::{GeometryError, MassingError, Result, SimplificationError};
use crate::geometry::Polygon;
use crate::operations::query::{combined_cost, layer_cost};
use crate::operations::simplify::{Algorithm, AlgorithmSpec, DouglasPeucker, Strategy, StrategyContext};

use snap::snap_to_parent;

/// Douglas–Peucker tolerance of the baseline that normalizes primitive counts.
pub const BASELINE_EPSILON: f64 = 0.5;

/// Douglas–Peucker tolerance tried when no strategy yields a valid polygon.
pub const FALLBACK_EPSILON: f64 = 2.0;

/// Parameters shared by every node of a building simplification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimplificationParams {
    /// Weight of accuracy against simplicity, in `[0, 1]`.
    pub alpha: f64,
    /// Maximum distance for snapping a child's vertices onto its parent's.
    /// Zero disables snapping.
    pub snapping_threshold: f64,
    /// Principal orientation of the building in radians.
    pub orientation: f64,
    /// Holes smaller than this fraction of their contour are dropped.
    pub min_hole_ratio: f64,
    /// Wall-clock budget for one building.
    pub deadline: Option<Duration>,
}

impl Default for SimplificationParams {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            snapping_threshold: 0.0,
            orientation: 0.0,
            min_hole_ratio: 0.02,
            deadline: None,
        }
    }
}

impl SimplificationParams {
    fn context(&self) -> StrategyContext {
        StrategyContext {
            orientation: self.orientation,
            min_hole_ratio: self.min_hole_ratio,
        }
    }
}

/// Statistics of one simplified contour, taken after snapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimplificationRecord {
    pub error_ratio: f64,
    pub primitive_count: usize,
    pub algorithm: Algorithm,
}

/// A simplified building tree with the statistics of its contours in
/// depth-first order.
#[derive(Debug, Clone)]
pub struct SimplifiedBuilding {
    pub tree: BuildingTree,
    pub records: Vec<SimplificationRecord>,
}

#[derive(Debug, Clone)]
enum Mode {
    /// Pick the cheapest valid result among the strategies, falling back to
    /// coarse Douglas–Peucker.
    Arbitrate(AlgorithmSpec),
    /// Apply one strategy as is.
    Single(Strategy),
}

/// Simplifies every layer of a building tree.
#[derive(Debug, Clone)]
pub struct BuildingSimplification {
    mode: Mode,
    params: SimplificationParams,
}

struct Candidate {
    polygon: Polygon,
    costs: LayerCosts,
    cost: f64,
    algorithm: Algorithm,
}

/// A simplified layer before it is placed in the output arena.
struct SimplifiedNode {
    layer: BuildingLayer,
    children: Vec<SimplifiedNode>,
}

struct Run<'a> {
    tree: &'a BuildingTree,
    strategies: Vec<Strategy>,
    started: Instant,
    records: Vec<SimplificationRecord>,
}

impl BuildingSimplification {
    /// Arbitrates among the strategies enabled in `spec`.
    #[must_use]
    pub fn new(spec: AlgorithmSpec) -> Self {
        Self {
            mode: Mode::Arbitrate(spec),
            params: SimplificationParams::default(),
        }
    }

    /// Applies `strategy` to every contour without arbitration or fallback.
    #[must_use]
    pub fn single(strategy: Strategy) -> Self {
        Self {
            mode: Mode::Single(strategy),
            params: SimplificationParams::default(),
        }
    }

    /// Sets the simplification parameters.
    #[must_use]
    pub fn with_params(mut self, params: SimplificationParams) -> Self {
        self.params = params;
        self
    }

    /// Executes the simplification.
    ///
    /// Contours and child layers that fail are logged and left out.
    ///
    /// # Errors
    ///
    /// Returns an error if `alpha` is outside `[0, 1]`, if a strategy's
    /// parameters are malformed, if the root layer keeps neither a contour
    /// nor a child, or if the deadline passes.
    pub fn execute(&self, tree: &BuildingTree) -> Result<SimplifiedBuilding> {
        self.execute_from(tree, Instant::now())
    }

    /// Executes the simplification with the deadline measured from
    /// `started`, so the trees of one building share a single budget.
    pub(crate) fn execute_from(&self, tree: &BuildingTree, started: Instant) -> Result<SimplifiedBuilding> {
        let alpha = self.params.alpha;
        if !(0.0..=1.0).contains(&alpha) {
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "alpha",
                value: alpha,
                min: 0.0,
                max: 1.0,
            }
            .into());
        }
        let strategies = match &self.mode {
            Mode::Arbitrate(spec) => spec.strategies()?,
            Mode::Single(strategy) => vec![*strategy],
        };

        let mut run = Run {
            tree,
            strategies,
            started,
            records: Vec::new(),
        };
        let root = self
            .simplify_layer(&mut run, tree.root(), None)?
            .ok_or(SimplificationError::NoContours)?;

        let mut out = BuildingTree::new(root.layer);
        let mut stack: Vec<(LayerId, Vec<SimplifiedNode>)> = vec![(out.root(), root.children)];
        while let Some((parent, children)) = stack.pop() {
            for child in children {
                let id = out.add_child(parent, child.layer)?;
                stack.push((id, child.children));
            }
        }

        Ok(SimplifiedBuilding {
            tree: out,
            records: run.records,
        })
    }

    fn simplify_layer(
        &self,
        run: &mut Run<'_>,
        id: LayerId,
        parent: Option<&[Polygon]>,
    ) -> Result<Option<SimplifiedNode>> {
        if let Some(deadline) = self.params.deadline {
            if run.started.elapsed() >= deadline {
                return Err(SimplificationError::TimedOut.into());
            }
        }

        let tree = run.tree;
        let layer = tree.layer(id)?;
        let mut footprint = Vec::with_capacity(layer.footprint.len());
        let mut costs = LayerCosts::default();
        for (k, contour) in layer.footprint.iter().enumerate() {
            let chosen = match &self.mode {
                Mode::Arbitrate(_) => self.arbitrate(&run.strategies, layer, contour),
                Mode::Single(strategy) => self.evaluate(strategy, layer, contour, baseline(contour, &self.params)),
            };
            let Some(mut chosen) = chosen else {
                let err = SimplificationError::Exhausted {
                    layer_bottom: layer.bottom_height,
                    contour: k,
                };
                warn!(building = layer.building_id, error = %err, "dropping contour");
                continue;
            };

            if let Some(snapped) = parent
                .and_then(|p| snap_to_parent(&chosen.polygon, p, self.params.snapping_threshold))
            {
                chosen.costs = layer_cost(&snapped, &layer.raw_footprints, contour, layer.height());
                chosen.polygon = snapped;
            }
            run.records.push(SimplificationRecord {
                error_ratio: chosen.costs.error_ratio(),
                primitive_count: chosen.costs.primitive_count,
                algorithm: chosen.algorithm,
            });
            costs = costs.combined(chosen.costs);
            footprint.push(chosen.polygon);
        }

        if footprint.is_empty() && matches!(self.mode, Mode::Single(_)) {
            return Ok(None);
        }

        let mut children = Vec::with_capacity(layer.children.len());
        for &child in &layer.children {
            match self.simplify_layer(run, child, Some(footprint.as_slice())) {
                Ok(Some(node)) => children.push(node),
                Ok(None) => {}
                Err(MassingError::Simplification(SimplificationError::TimedOut)) => {
                    return Err(SimplificationError::TimedOut.into());
                }
                Err(e) => warn!(building = layer.building_id, error = %e, "dropping child layer"),
            }
        }

        if footprint.is_empty() && children.is_empty() {
            return Ok(None);
        }

        let simplified = BuildingLayer::new(
            layer.building_id,
            layer.bottom_height,
            layer.top_height,
            footprint,
            layer.raw_footprints.clone(),
        )
        .with_costs(costs);
        Ok(Some(SimplifiedNode {
            layer: simplified,
            children,
        }))
    }

    /// Evaluates every strategy concurrently and keeps the cheapest valid
    /// result; earlier strategies win ties. Falls back to coarse
    /// Douglas–Peucker when none is valid.
    fn arbitrate(&self, strategies: &[Strategy], layer: &BuildingLayer, contour: &Polygon) -> Option<Candidate> {
        let baseline = baseline(contour, &self.params);
        let candidates: Vec<Option<Candidate>> = strategies
            .par_iter()
            .map(|s| self.evaluate(s, layer, contour, baseline))
            .collect();

        let best = candidates
            .into_iter()
            .flatten()
            .fold(None, |best: Option<Candidate>, c| match best {
                Some(b) if b.cost <= c.cost => Some(b),
                _ => Some(c),
            });
        if let Some(best) = best {
            debug!(
                building = layer.building_id,
                layer = layer.bottom_height,
                algorithm = %best.algorithm,
                cost = best.cost,
                "selected strategy"
            );
            return Some(best);
        }

        let fallback = Strategy::DouglasPeucker(DouglasPeucker::new(FALLBACK_EPSILON));
        let result = self.evaluate(&fallback, layer, contour, baseline);
        if result.is_some() {
            debug!(building = layer.building_id, layer = layer.bottom_height, "fell back to coarse DP");
        }
        result
    }

    /// Runs one strategy, checks that its result is a valid footprint and
    /// prices it.
    fn evaluate(
        &self,
        strategy: &Strategy,
        layer: &BuildingLayer,
        contour: &Polygon,
        baseline: usize,
    ) -> Option<Candidate> {
        let polygon = match strategy
            .simplify(contour, &self.params.context())
            .and_then(check_footprint)
        {
            Ok(p) => p,
            Err(e) => {
                debug!(algorithm = %strategy.algorithm(), error = %e, "strategy failed");
                return None;
            }
        };
        let costs = layer_cost(&polygon, &layer.raw_footprints, contour, layer.height());
        let cost = combined_cost(self.params.alpha, &costs, baseline).ok()?;
        Some(Candidate {
            polygon,
            costs,
            cost,
            algorithm: strategy.algorithm(),
        })
    }
}

/// Primitive count of the contour simplified by Douglas–Peucker at
/// `BASELINE_EPSILON`, or of the contour itself if that degenerates.
fn baseline(contour: &Polygon, params: &SimplificationParams) -> usize {
    DouglasPeucker::new(BASELINE_EPSILON)
        .execute(contour, &params.context())
        .map_or(contour.primitive_count(), |p| p.primitive_count())
}

/// Strategies do not guarantee a simple outline; every result passes here
/// before it is priced.
fn check_footprint(polygon: Polygon) -> Result<Polygon> {
    if polygon.contour().len() < 3 {
        return Err(GeometryError::Degenerate("contour has fewer than 3 vertices".to_owned()).into());
    }
    if !polygon.is_simple() {
        return Err(GeometryError::SelfIntersecting.into());
    }
    Ok(polygon)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::f64::consts::TAU;

    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::math::Point2;
    use crate::operations::simplify::{Curve, RightAngle};

    fn rect(x0: f64, y0: f64, w: f64, h: f64) -> Polygon {
        Polygon::new(
            vec![
                Point2::new(x0, y0),
                Point2::new(x0 + w, y0),
                Point2::new(x0 + w, y0 + h),
                Point2::new(x0, y0 + h),
            ],
            vec![],
        )
    }

    fn circle(n: u32, r: f64) -> Polygon {
        let pts = (0..n)
            .map(|i| {
                let a = TAU * f64::from(i) / f64::from(n);
                Point2::new(r * a.cos(), r * a.sin())
            })
            .collect();
        Polygon::new(pts, vec![])
    }

    fn layer(bottom: usize, top: usize, footprint: Vec<Polygon>) -> BuildingLayer {
        let raw = vec![footprint.clone(); top - bottom];
        BuildingLayer::new(0, bottom, top, footprint, raw)
    }

    fn all_algorithms() -> AlgorithmSpec {
        AlgorithmSpec::new()
            .with(Algorithm::DouglasPeucker, vec![1.0])
            .with(Algorithm::RightAngle, vec![4.0])
            .with(Algorithm::Curve, vec![1.0, 1.0])
            .with(Algorithm::CurveRightAngle, vec![1.0, 1.0, 0.1])
    }

    #[test]
    fn square_is_kept_exact_for_accuracy_only() {
        let tree = BuildingTree::new(layer(0, 3, vec![rect(0.0, 0.0, 10.0, 10.0)]));
        let params = SimplificationParams {
            alpha: 1.0,
            ..SimplificationParams::default()
        };
        let out = BuildingSimplification::single(Strategy::RightAngle(RightAngle::new(4.0)))
            .with_params(params)
            .execute(&tree)
            .unwrap();
        let root = out.tree.root_layer().unwrap();
        assert_abs_diff_eq!(root.costs.accuracy_cost, 0.0, epsilon = 1e-9);
        assert_eq!(root.footprint[0].contour().len(), 4);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].algorithm, Algorithm::RightAngle);
    }

    #[test]
    fn circle_prefers_curve() {
        let tree = BuildingTree::new(layer(0, 3, vec![circle(360, 50.0)]));
        let out = BuildingSimplification::new(all_algorithms()).execute(&tree).unwrap();
        let record = out.records[0];
        assert!(matches!(record.algorithm, Algorithm::Curve | Algorithm::CurveRightAngle));
        assert!(record.primitive_count <= 10);
        assert!(record.error_ratio < 0.05);
    }

    #[test]
    fn arbitration_picks_minimum_cost() {
        let contour = circle(120, 30.0);
        let lay = layer(0, 4, vec![contour.clone()]);
        let sim = BuildingSimplification::new(all_algorithms());
        let strategies = all_algorithms().strategies().unwrap();
        let base = baseline(&contour, &sim.params);

        let best = sim.arbitrate(&strategies, &lay, &contour).unwrap();
        for s in &strategies {
            if let Some(c) = sim.evaluate(s, &lay, &contour, base) {
                assert!(best.cost <= c.cost + 1e-12);
            }
        }
    }

    #[test]
    fn ties_go_to_the_earlier_strategy() {
        // Two identical strategies with different tags cannot both win; the
        // first in evaluation order does.
        let contour = rect(0.0, 0.0, 10.0, 10.0);
        let lay = layer(0, 3, vec![contour.clone()]);
        let sim = BuildingSimplification::new(AlgorithmSpec::new());
        let strategies = vec![
            Strategy::DouglasPeucker(DouglasPeucker::new(0.5)),
            Strategy::Curve(Curve::new(0.5, 1.0)),
        ];
        let best = sim.arbitrate(&strategies, &lay, &contour).unwrap();
        assert_eq!(best.algorithm, Algorithm::DouglasPeucker);
    }

    #[test]
    fn degenerate_contour_is_dropped_and_siblings_survive() {
        let point = Polygon::new(vec![Point2::new(100.0, 100.0)], vec![]);
        let mut tree = BuildingTree::new(layer(0, 3, vec![rect(0.0, 0.0, 20.0, 20.0), point.clone()]));
        let root = tree.root();
        tree.add_child(root, layer(3, 6, vec![point])).unwrap();
        tree.add_child(root, layer(3, 7, vec![rect(0.0, 0.0, 8.0, 8.0)])).unwrap();

        let out = BuildingSimplification::new(all_algorithms()).execute(&tree).unwrap();
        let root = out.tree.root_layer().unwrap();
        assert_eq!(root.footprint.len(), 1);
        assert_eq!(root.children.len(), 1);
        let child = out.tree.layer(root.children[0]).unwrap();
        assert_eq!(child.top_height, 7);
        assert_eq!(out.records.len(), 2);
    }

    #[test]
    fn failed_layer_with_children_keeps_empty_footprint() {
        let point = Polygon::new(vec![Point2::new(1.0, 1.0)], vec![]);
        let mut tree = BuildingTree::new(layer(0, 3, vec![point]));
        let root = tree.root();
        tree.add_child(root, layer(3, 6, vec![rect(0.0, 0.0, 8.0, 8.0)])).unwrap();

        let out = BuildingSimplification::new(all_algorithms()).execute(&tree).unwrap();
        assert!(out.tree.root_layer().unwrap().footprint.is_empty());
        assert_eq!(out.tree.len(), 2);

        let single = BuildingSimplification::single(Strategy::DouglasPeucker(DouglasPeucker::new(1.0)));
        assert!(single.execute(&tree).is_err());
    }

    #[test]
    fn every_result_is_simple_with_bounded_cost() {
        let mut tree = BuildingTree::new(layer(0, 4, vec![circle(90, 40.0)]));
        let root = tree.root();
        tree.add_child(root, layer(4, 9, vec![rect(-10.0, -10.0, 20.0, 25.0)])).unwrap();
        let out = BuildingSimplification::new(all_algorithms()).execute(&tree).unwrap();
        for l in out.tree.layers() {
            assert!(l.costs.primitive_count >= 1);
            assert!(l.costs.accuracy_cost >= 0.0);
            assert!(l.costs.accuracy_cost <= l.costs.reference_area + 1e-9);
            for p in &l.footprint {
                assert!(p.is_simple());
                assert!(p.contour().len() >= 3);
            }
        }
    }

    #[test]
    fn alpha_out_of_range_is_rejected() {
        let tree = BuildingTree::new(layer(0, 3, vec![rect(0.0, 0.0, 1.0, 1.0)]));
        let params = SimplificationParams {
            alpha: 2.0,
            ..SimplificationParams::default()
        };
        assert!(BuildingSimplification::new(all_algorithms())
            .with_params(params)
            .execute(&tree)
            .is_err());
    }

    #[test]
    fn expired_deadline_times_out() {
        let tree = BuildingTree::new(layer(0, 3, vec![rect(0.0, 0.0, 1.0, 1.0)]));
        let params = SimplificationParams {
            deadline: Some(Duration::ZERO),
            ..SimplificationParams::default()
        };
        let result = BuildingSimplification::new(all_algorithms())
            .with_params(params)
            .execute(&tree);
        assert!(matches!(
            result,
            Err(MassingError::Simplification(SimplificationError::TimedOut))
        ));
    }

    #[test]
    fn child_snaps_to_parent() {
        let mut tree = BuildingTree::new(layer(0, 3, vec![rect(0.0, 0.0, 20.0, 20.0)]));
        let root = tree.root();
        tree.add_child(root, layer(3, 6, vec![rect(0.2, 0.2, 10.0, 10.0)])).unwrap();
        let params = SimplificationParams {
            snapping_threshold: 0.5,
            ..SimplificationParams::default()
        };
        let out = BuildingSimplification::single(Strategy::DouglasPeucker(DouglasPeucker::new(0.1)))
            .with_params(params)
            .execute(&tree)
            .unwrap();
        let root = out.tree.root_layer().unwrap();
        let child = out.tree.layer(root.children[0]).unwrap();
        assert!(child.footprint[0].contour().contains(&Point2::new(0.0, 0.0)));
        assert_eq!(out.records.len(), 2);
        assert_abs_diff_eq!(out.records[1].error_ratio, child.costs.error_ratio(), epsilon = 1e-12);
        assert_eq!(out.records[1].primitive_count, child.costs.primitive_count);
    }

    /// A simple contour whose bottom notch crosses the flattened bottom edge
    /// once Douglas–Peucker drops the dip at `(5, -1.5)`.
    fn notched_contour() -> Polygon {
        Polygon::new(
            vec![
                Point2::new(0.0, 0.0),
                Point2::new(5.0, -1.5),
                Point2::new(10.0, 0.0),
                Point2::new(10.0, 10.0),
                Point2::new(5.5, 10.0),
                Point2::new(5.2, -1.0),
                Point2::new(4.8, -1.0),
                Point2::new(4.5, 10.0),
                Point2::new(0.0, 10.0),
            ],
            vec![],
        )
    }

    #[test]
    fn single_strategy_drops_self_intersecting_result() {
        let contour = notched_contour();
        assert!(contour.is_simple());
        let tree = BuildingTree::new(layer(0, 3, vec![contour, rect(30.0, 0.0, 10.0, 10.0)]));
        let out = BuildingSimplification::single(Strategy::DouglasPeucker(DouglasPeucker::new(2.0)))
            .execute(&tree)
            .unwrap();
        let root = out.tree.root_layer().unwrap();
        assert_eq!(root.footprint.len(), 1);
        assert!(root.footprint.iter().all(Polygon::is_simple));
        assert_eq!(out.records.len(), 1);
    }

    #[test]
    fn footprint_check_reports_failure_kind() {
        let crossing = Polygon::new(
            vec![
                Point2::new(0.0, 0.0),
                Point2::new(10.0, 0.0),
                Point2::new(10.0, 10.0),
                Point2::new(5.5, 10.0),
                Point2::new(5.2, -1.0),
                Point2::new(4.5, 10.0),
                Point2::new(0.0, 10.0),
            ],
            vec![],
        );
        assert!(matches!(
            check_footprint(crossing),
            Err(MassingError::Geometry(GeometryError::SelfIntersecting))
        ));
        let sliver = Polygon::new(vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)], vec![]);
        assert!(matches!(
            check_footprint(sliver),
            Err(MassingError::Geometry(GeometryError::Degenerate(_)))
        ));
        assert!(check_footprint(rect(0.0, 0.0, 2.0, 2.0)).is_ok());
    }

    #[test]
    fn deadline_counts_from_building_start() {
        let tree = BuildingTree::new(layer(0, 3, vec![rect(0.0, 0.0, 1.0, 1.0)]));
        let params = SimplificationParams {
            deadline: Some(Duration::from_secs(1)),
            ..SimplificationParams::default()
        };
        let sim = BuildingSimplification::new(all_algorithms()).with_params(params);
        assert!(sim.execute(&tree).is_ok());

        let started = Instant::now().checked_sub(Duration::from_secs(5)).unwrap();
        assert!(matches!(
            sim.execute_from(&tree, started),
            Err(MassingError::Simplification(SimplificationError::TimedOut))
        ));
    }
}
