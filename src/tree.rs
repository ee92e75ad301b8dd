//! Recursive branch tree and its seeded generator.
//!
//! A tree is a single owned [`BranchNode`] root; every child is owned by its
//! parent. Shape is fixed at generation time. Only the pruning flags and the
//! lazily created fruit lists change afterwards.

use serde::{Deserialize, Serialize};

use crate::hash::{seeded, seeded_range, seeded_signed};

pub const ROOT_LENGTH: f64 = 1.0;
pub const MAX_RIPENESS: f64 = 1.2;

const CHILD_SEED_FACTOR: f64 = 1.71;
const SPREAD_MIN: f64 = 0.25;
const SPREAD_MAX: f64 = 0.60;
const LEAN_MAX: f64 = 0.09;
const LEN_FACTOR_MIN: f64 = 0.68;
const LEN_FACTOR_MAX: f64 = 0.78;
const THIRD_CHILD_CHANCE: f64 = 0.42;
const THIRD_CHILD_LENGTH: f64 = 0.9;
const THIRD_CHILD_VARIANCE: f64 = 0.12;

const BARK_DARK: Rgb = Rgb(78, 52, 34);
const BARK_LIGHT: Rgb = Rgb(128, 96, 58);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Linear blend toward `other`; `t` is clamped to `[0, 1]`.
    pub fn mix(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb(lerp(self.0, other.0), lerp(self.1, other.1), lerp(self.2, other.2))
    }

    fn jitter(self, amount: f64) -> Rgb {
        let shift = |c: u8| (c as f64 + amount).round().clamp(0.0, 255.0) as u8;
        Rgb(shift(self.0), shift(self.1), shift(self.2))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fruit {
    /// Fraction along the owning branch.
    pub offset: f64,
    pub angle_offset: f64,
    pub ripeness: f64,
    pub counted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchNode {
    pub id: u64,
    pub depth: u32,
    pub length: f64,
    pub angle: f64,
    pub seed: f64,
    pub base_width: f64,
    pub prune_length: f64,
    pub color: Rgb,
    pub pruned: bool,
    pub regrow_at: f64,
    pub fruits: Option<Vec<Fruit>>,
    pub children: Vec<BranchNode>,
}

impl BranchNode {
    fn new(id: u64, depth: u32, max_depth: u32, length: f64, angle: f64, seed: f64) -> Self {
        let t = depth as f64 / max_depth.max(1) as f64;
        let color = BARK_DARK
            .mix(BARK_LIGHT, t)
            .jitter(seeded(seed * 17.1 + 0.9) * 14.0 - 7.0);
        Self {
            id,
            depth,
            length,
            angle,
            seed,
            base_width: 1.5 + max_depth.saturating_sub(depth) as f64 * 1.9,
            prune_length: length * seeded_range(seed * 19.3 + 0.7, 0.18, 0.3),
            color,
            pruned: false,
            regrow_at: 0.0,
            fruits: None,
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn prune(&mut self, regrow_at: f64) {
        self.pruned = true;
        self.regrow_at = regrow_at;
    }

    /// Clears the pruned flag once `now` has passed the regrow deadline.
    pub fn regrow_if_due(&mut self, now: f64) -> bool {
        if self.pruned && now > self.regrow_at {
            self.pruned = false;
            true
        } else {
            false
        }
    }

    /// Runs [`regrow_if_due`](Self::regrow_if_due) over the whole tree,
    /// including subtrees hidden under a pruned ancestor.
    pub fn regrow_due(&mut self, now: f64) -> Vec<u64> {
        let mut regrown = Vec::new();
        self.visit_mut(&mut |node| {
            if node.regrow_if_due(now) {
                regrown.push(node.id);
            }
        });
        regrown
    }

    /// Fruit list for this node, created from the node seed on first access.
    pub fn fruits_mut(&mut self) -> &mut Vec<Fruit> {
        let seed = self.seed;
        self.fruits.get_or_insert_with(|| {
            let count = 1 + (seeded(seed * 23.9 + 1.3) * 3.0).floor() as usize;
            (0..count)
                .map(|i| {
                    let i = i as f64;
                    Fruit {
                        offset: seeded_range(seed * 29.1 + i, 0.35, 0.95),
                        angle_offset: seeded_signed(seed * 31.7 + i) * 0.9,
                        ripeness: 0.0,
                        counted: false,
                    }
                })
                .collect()
        })
    }

    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a BranchNode)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }

    pub fn visit_mut(&mut self, f: &mut impl FnMut(&mut BranchNode)) {
        f(self);
        for child in &mut self.children {
            child.visit_mut(f);
        }
    }

    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(BranchNode::node_count).sum::<usize>()
    }

    pub fn deepest(&self) -> u32 {
        self.children
            .iter()
            .map(BranchNode::deepest)
            .max()
            .unwrap_or(self.depth)
    }

    pub fn find(&self, id: u64) -> Option<&BranchNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    pub fn find_mut(&mut self, id: u64) -> Option<&mut BranchNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(id))
    }

    pub fn ids(&self) -> Vec<u64> {
        let mut ids = Vec::with_capacity(self.node_count());
        self.visit(&mut |node| ids.push(node.id));
        ids
    }
}

/// Builds trees while handing out ids from one running sequence, so trees
/// built by the same generator never share a node id.
#[derive(Debug, Clone, Default)]
pub struct BranchGenerator {
    next_id: u64,
}

impl BranchGenerator {
    pub fn new(first_id: u64) -> Self {
        Self { next_id: first_id }
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn generate(&mut self, root_seed: f64, max_depth: u32) -> BranchNode {
        self.build(root_seed, 0, max_depth, ROOT_LENGTH, 0.0)
    }

    fn build(&mut self, seed: f64, depth: u32, max_depth: u32, length: f64, angle: f64) -> BranchNode {
        let id = self.next_id;
        self.next_id += 1;
        let mut node = BranchNode::new(id, depth, max_depth, length, angle, seed);
        if depth >= max_depth {
            return node;
        }

        let spread = seeded_range(seed * 3.1 + 1.7, SPREAD_MIN, SPREAD_MAX);
        let lean = seeded_signed(seed * 5.3 + 2.9) * LEAN_MAX;
        let len_factor = (LEN_FACTOR_MAX
            - seeded(seed * 7.7 + 0.3) * 0.06
            - depth as f64 * 0.006)
            .clamp(LEN_FACTOR_MIN, LEN_FACTOR_MAX);
        let child_seed = |index: u32| seed * CHILD_SEED_FACTOR + index as f64;

        let mut children = Vec::with_capacity(3);
        children.push(self.build(child_seed(1), depth + 1, max_depth, length * len_factor, lean - spread));
        children.push(self.build(child_seed(2), depth + 1, max_depth, length * len_factor, lean + spread));
        if depth > 1 && seeded(seed * 11.3 + 4.1) < THIRD_CHILD_CHANCE {
            let variance = seeded_signed(seed * 13.7 + 5.5) * THIRD_CHILD_VARIANCE;
            children.push(self.build(
                child_seed(3),
                depth + 1,
                max_depth,
                length * len_factor * THIRD_CHILD_LENGTH,
                lean + variance,
            ));
        }
        node.children = children;
        node
    }
}

/// Generates a tree with ids starting at zero.
pub fn generate(root_seed: f64, max_depth: u32) -> BranchNode {
    BranchGenerator::new(0).generate(root_seed, max_depth)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(node: &BranchNode) -> Vec<(u32, u64, u64, Rgb, usize)> {
        let mut out = Vec::new();
        node.visit(&mut |n| {
            out.push((n.depth, n.angle.to_bits(), n.length.to_bits(), n.color, n.children.len()))
        });
        out
    }

    #[test]
    fn same_seed_same_tree() {
        for seed in [0.0, 1.0, 42.0, -3.5, 917.25, 123_456.0] {
            let a = generate(seed, 7);
            let b = generate(seed, 7);
            assert_eq!(a.node_count(), b.node_count());
            assert_eq!(shape(&a), shape(&b));
            assert_eq!(a, b);
        }
    }

    #[test]
    fn depth_bound_holds() {
        for seed in 0..40 {
            let max_depth = 1 + seed % 8;
            let tree = generate(seed as f64 * 1.37, max_depth);
            assert_eq!(tree.deepest(), max_depth);
            tree.visit(&mut |node| {
                assert!(node.depth <= max_depth);
                if node.depth == max_depth {
                    assert!(node.children.is_empty());
                } else {
                    assert!(matches!(node.children.len(), 2 | 3), "got {}", node.children.len());
                }
            });
        }
    }

    #[test]
    fn seed_42_root_branches() {
        let root = generate(42.0, 7);
        assert_eq!(root.depth, 0);
        assert!(matches!(root.children.len(), 2 | 3));
    }

    #[test]
    fn third_child_only_below_depth_one() {
        let tree = generate(7.0, 8);
        let mut saw_triple = false;
        tree.visit(&mut |node| {
            if node.children.len() == 3 {
                assert!(node.depth > 1);
                saw_triple = true;
            }
        });
        assert!(saw_triple, "a deep tree should contain some triple forks");
    }

    #[test]
    fn child_geometry_in_range() {
        let tree = generate(42.0, 7);
        tree.visit(&mut |node| {
            for child in &node.children[..2.min(node.children.len())] {
                let factor = child.length / node.length;
                assert!((LEN_FACTOR_MIN - 1e-9..=LEN_FACTOR_MAX + 1e-9).contains(&factor));
                assert!(child.angle.abs() <= SPREAD_MAX + LEAN_MAX + 1e-9);
            }
            assert!(node.prune_length > 0.0 && node.prune_length < node.length);
        });
        assert_eq!(
            tree.children[0].seed,
            tree.seed * CHILD_SEED_FACTOR + 1.0
        );
    }

    #[test]
    fn degenerate_seeds_build_finite_trees() {
        for seed in [0.0, -1.0, -250.5, f64::MIN_POSITIVE] {
            let tree = generate(seed, 6);
            tree.visit(&mut |node| {
                assert!(node.length.is_finite() && node.length > 0.0);
                assert!(node.angle.is_finite());
            });
            assert_eq!(tree.deepest(), 6);
        }
    }

    #[test]
    fn ids_follow_creation_order_and_never_repeat() {
        let mut generator = BranchGenerator::new(0);
        let first = generator.generate(3.0, 5);
        let ids = first.ids();
        assert_eq!(ids, (0..ids.len() as u64).collect::<Vec<_>>());
        let second = generator.generate(3.0, 5);
        assert!(second.ids().iter().all(|id| *id >= ids.len() as u64));
        assert_eq!(generator.next_id(), (ids.len() * 2) as u64);
    }

    #[test]
    fn zero_depth_is_a_single_leaf() {
        let tree = generate(9.0, 0);
        assert!(tree.is_leaf());
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn regrow_only_after_deadline() {
        let mut tree = generate(5.0, 4);
        let id = tree.children[1].id;
        tree.find_mut(id).unwrap().prune(1_000.0);
        assert!(tree.regrow_due(1_000.0).is_empty());
        assert!(tree.find(id).unwrap().pruned);
        assert_eq!(tree.regrow_due(1_000.5), vec![id]);
        assert!(!tree.find(id).unwrap().pruned);
    }

    #[test]
    fn fruits_created_once() {
        let mut tree = generate(11.0, 3);
        assert!(tree.fruits.is_none());
        let count = tree.fruits_mut().len();
        assert!((1..=3).contains(&count));
        tree.fruits_mut()[0].ripeness = 0.5;
        assert_eq!(tree.fruits_mut()[0].ripeness, 0.5);
        assert_eq!(tree.fruits.as_ref().map(Vec::len), Some(count));
    }
}
