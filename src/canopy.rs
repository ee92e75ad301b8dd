//! One pass over the tree that yields both the draw list and the cuttable
//! segment list. No render backend is needed to produce either.

use serde::{Deserialize, Serialize};

use crate::{
    tree::{BranchNode, Rgb},
    world::{LifeStage, Viewport},
};

const DRY_BARK: Rgb = Rgb(112, 100, 88);
const LEAF_GREEN: Rgb = Rgb(76, 142, 64);
const LEAF_DRY: Rgb = Rgb(168, 122, 62);
const BUD_COLOR: Rgb = Rgb(132, 170, 92);
const SWAY: f64 = 0.07;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector for an angle measured from straight up, y pointing down.
    pub fn heading(angle: f64) -> Self {
        Self::new(angle.sin(), -angle.cos())
    }

    pub fn offset(self, direction: Point, distance: f64) -> Self {
        Self::new(self.x + direction.x * distance, self.y + direction.y * distance)
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Closest point to `self` on the segment `a`-`b`.
    pub fn closest_on_segment(self, a: Point, b: Point) -> Point {
        let (dx, dy) = (b.x - a.x, b.y - a.y);
        let len_sq = dx * dx + dy * dy;
        if len_sq <= f64::EPSILON {
            return a;
        }
        let t = (((self.x - a.x) * dx + (self.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
        Point::new(a.x + dx * t, a.y + dy * t)
    }

    pub fn distance_to_segment(self, a: Point, b: Point) -> f64 {
        self.distance(self.closest_on_segment(a, b))
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// A rendered branch span, tagged with the branch that owns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub branch_id: u64,
    pub depth: u32,
    pub pruned: bool,
    pub from: Point,
    pub to: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawCommand {
    Branch {
        from: Point,
        to: Point,
        width: f64,
        color: Rgb,
    },
    Bud {
        at: Point,
        radius: f64,
        color: Rgb,
    },
    Leaf {
        at: Point,
        angle: f64,
        size: f64,
        color: Rgb,
    },
    Fruit {
        at: Point,
        radius: f64,
        ripeness: f64,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub draws: Vec<DrawCommand>,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, Copy)]
pub struct CanopyParams {
    pub growth: f64,
    pub wind: f64,
    pub season: f64,
    pub stage: LifeStage,
    pub viewport: Viewport,
    pub max_depth: u32,
}

/// Fraction of a branch at `depth` that has grown in; zero means the branch
/// is not drawn and cannot be cut.
pub fn reveal(growth: f64, depth: u32, max_depth: u32) -> f64 {
    (growth * (max_depth + 1) as f64 - depth as f64).clamp(0.0, 1.0)
}

pub fn trace(root: &BranchNode, params: &CanopyParams) -> Trace {
    let mut out = Trace::default();
    let tint = params.stage.decline_tint(params.growth);
    let walker = Walker {
        params,
        tint,
        scale: params.viewport.branch_scale() * (0.45 + 0.55 * params.growth.clamp(0.0, 1.0)),
        width_scale: 0.5 + 0.5 * params.growth.clamp(0.0, 1.0),
    };
    walker.walk(root, params.viewport.trunk_base(), 0.0, &mut out);
    out
}

struct Walker<'a> {
    params: &'a CanopyParams,
    tint: f64,
    scale: f64,
    width_scale: f64,
}

impl Walker<'_> {
    fn walk(&self, node: &BranchNode, start: Point, parent_angle: f64, out: &mut Trace) {
        let p = self.params;
        let grown = reveal(p.growth, node.depth, p.max_depth);
        if grown <= 0.0 {
            return;
        }

        let tip_weight = (node.depth as f64 + 1.0) / (p.max_depth as f64 + 1.0);
        let flutter = (p.season * 40.0 + node.seed).sin() * 0.015;
        let angle = parent_angle + node.angle + (p.wind * SWAY + flutter) * tip_weight;
        let heading = Point::heading(angle);
        let width = node.base_width * self.width_scale;
        let color = node.color.mix(DRY_BARK, self.tint * 0.6);

        if node.pruned {
            let end = start.offset(heading, node.prune_length * self.scale);
            out.draws.push(DrawCommand::Branch { from: start, to: end, width, color });
            out.draws.push(DrawCommand::Bud {
                at: end,
                radius: (width * 0.6).max(1.5),
                color: BUD_COLOR,
            });
            out.segments.push(Segment {
                branch_id: node.id,
                depth: node.depth,
                pruned: true,
                from: start,
                to: end,
            });
            return;
        }

        let length = node.length * self.scale * grown;
        let end = start.offset(heading, length);
        out.draws.push(DrawCommand::Branch { from: start, to: end, width, color });
        out.segments.push(Segment {
            branch_id: node.id,
            depth: node.depth,
            pruned: false,
            from: start,
            to: end,
        });

        if p.stage.shows_leaves() && node.depth + 1 >= p.max_depth {
            out.draws.push(DrawCommand::Leaf {
                at: end,
                angle: angle + flutter * 8.0,
                size: 3.0 + 4.0 * grown,
                color: LEAF_GREEN.mix(LEAF_DRY, self.tint),
            });
        }

        if p.stage.shows_fruit() {
            if let Some(fruits) = &node.fruits {
                let normal = Point::new(-heading.y, heading.x);
                for fruit in fruits {
                    let along = start.offset(heading, length * fruit.offset);
                    out.draws.push(DrawCommand::Fruit {
                        at: along.offset(normal, fruit.angle_offset * 6.0),
                        radius: 2.5 + fruit.ripeness * 2.0,
                        ripeness: fruit.ripeness,
                    });
                }
            }
        }

        for child in &node.children {
            self.walk(child, end, angle, out);
        }
    }
}
