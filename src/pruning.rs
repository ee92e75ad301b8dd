//! Saw hit-testing and the cut decision.

use rand::Rng;
use thiserror::Error;

use crate::{
    canopy::{Point, Segment},
    scenario::Tuning,
    tree::BranchNode,
    world::SawState,
};

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CutRejected {
    #[error("saw is cooling down ({remaining_ms:.0} ms left)")]
    CoolingDown { remaining_ms: f64 },
    #[error("no branch within {radius} px of the saw")]
    OutOfReach { radius: f64 },
    #[error("branch {0} is not part of the current tree")]
    UnknownBranch(u64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cut {
    pub branch_id: u64,
    pub depth: u32,
    pub contact: Point,
    pub regrow_at: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SawRules {
    pub cooldown_ms: f64,
    pub radius: f64,
    pub regrow_min_ms: f64,
    pub regrow_max_ms: f64,
}

impl From<&Tuning> for SawRules {
    fn from(tuning: &Tuning) -> Self {
        Self {
            cooldown_ms: tuning.cut_cooldown_ms,
            radius: tuning.cut_radius,
            regrow_min_ms: tuning.regrow_min_ms,
            regrow_max_ms: tuning.regrow_max_ms,
        }
    }
}

/// Nearest cuttable segment with its distance and contact point. The trunk
/// and stubs of already pruned branches are never candidates.
pub fn nearest_segment(pointer: Point, segments: &[Segment]) -> Option<(&Segment, f64, Point)> {
    segments
        .iter()
        .filter(|segment| segment.depth > 0 && !segment.pruned)
        .map(|segment| {
            let contact = pointer.closest_on_segment(segment.from, segment.to);
            (segment, pointer.distance(contact), contact)
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

pub fn try_cut(
    saw: &mut SawState,
    root: &mut BranchNode,
    segments: &[Segment],
    pointer: Point,
    now: f64,
    rules: &SawRules,
    rng: &mut impl Rng,
) -> Result<Cut, CutRejected> {
    if let Some(last) = saw.last_cut {
        let since = now - last;
        if since < rules.cooldown_ms {
            return Err(CutRejected::CoolingDown {
                remaining_ms: rules.cooldown_ms - since,
            });
        }
    }

    let (segment, distance, contact) =
        nearest_segment(pointer, segments).ok_or(CutRejected::OutOfReach { radius: rules.radius })?;
    if distance > rules.radius {
        return Err(CutRejected::OutOfReach { radius: rules.radius });
    }

    let branch = root
        .find_mut(segment.branch_id)
        .ok_or(CutRejected::UnknownBranch(segment.branch_id))?;
    let regrow_at = if rules.regrow_max_ms > rules.regrow_min_ms {
        now + rng.gen_range(rules.regrow_min_ms..rules.regrow_max_ms)
    } else {
        now + rules.regrow_min_ms
    };
    branch.prune(regrow_at);
    saw.last_cut = Some(now);

    Ok(Cut {
        branch_id: branch.id,
        depth: branch.depth,
        contact,
        regrow_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::generate;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rules() -> SawRules {
        SawRules::from(&Tuning::default())
    }

    fn segment(id: u64, depth: u32, from: (f64, f64), to: (f64, f64)) -> Segment {
        Segment {
            branch_id: id,
            depth,
            pruned: false,
            from: Point::new(from.0, from.1),
            to: Point::new(to.0, to.1),
        }
    }

    fn fixture() -> (BranchNode, Vec<Segment>) {
        let tree = generate(42.0, 3);
        let left = tree.children[0].id;
        let right = tree.children[1].id;
        let segments = vec![
            segment(tree.id, 0, (100.0, 200.0), (100.0, 100.0)),
            segment(left, 1, (100.0, 100.0), (60.0, 40.0)),
            segment(right, 1, (100.0, 100.0), (140.0, 40.0)),
        ];
        (tree, segments)
    }

    #[test]
    fn cuts_nearest_branch() {
        let (mut tree, segments) = fixture();
        let mut saw = SawState::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let cut = try_cut(&mut saw, &mut tree, &segments, Point::new(135.0, 50.0), 500.0, &rules(), &mut rng)
            .expect("branch in reach");
        assert_eq!(cut.branch_id, tree.children[1].id);
        assert!(tree.children[1].pruned);
        assert!((18_500.0..32_500.0).contains(&cut.regrow_at));
        assert_eq!(saw.last_cut, Some(500.0));
    }

    #[test]
    fn trunk_is_never_cut() {
        let (mut tree, segments) = fixture();
        let mut saw = SawState::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let result = try_cut(&mut saw, &mut tree, &segments, Point::new(100.0, 190.0), 0.0, &rules(), &mut rng);
        assert_eq!(result, Err(CutRejected::OutOfReach { radius: 28.0 }));
        assert!(!tree.pruned);
        assert_eq!(saw.last_cut, None);
    }

    #[test]
    fn cooldown_blocks_second_cut() {
        let (mut tree, segments) = fixture();
        let mut saw = SawState::default();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        try_cut(&mut saw, &mut tree, &segments, Point::new(62.0, 44.0), 1_000.0, &rules(), &mut rng).unwrap();
        let second = try_cut(&mut saw, &mut tree, &segments, Point::new(138.0, 44.0), 1_100.0, &rules(), &mut rng);
        assert!(matches!(second, Err(CutRejected::CoolingDown { .. })));
        assert!(!tree.children[1].pruned);
        assert_eq!(saw.last_cut, Some(1_000.0));

        let third = try_cut(&mut saw, &mut tree, &segments, Point::new(138.0, 44.0), 1_140.0, &rules(), &mut rng);
        assert!(third.is_ok());
    }

    #[test]
    fn pruned_segments_are_skipped() {
        let (mut tree, mut segments) = fixture();
        segments[2].pruned = true;
        let mut saw = SawState::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let result = try_cut(&mut saw, &mut tree, &segments, Point::new(140.0, 40.0), 0.0, &rules(), &mut rng);
        assert!(matches!(result, Err(CutRejected::OutOfReach { .. })));
    }

    #[test]
    fn far_pointer_is_not_an_error_condition() {
        let (mut tree, segments) = fixture();
        let mut saw = SawState::default();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let result = try_cut(&mut saw, &mut tree, &segments, Point::new(-5_000.0, 9_000.0), 0.0, &rules(), &mut rng);
        assert!(matches!(result, Err(CutRejected::OutOfReach { .. })));
    }
}
