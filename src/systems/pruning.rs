use anyhow::Result;

use crate::{
    engine::{System, SystemContext},
    pruning::{try_cut, CutRejected, SawRules},
    rng::SystemRng,
    world::{Feedback, World},
};

use super::particles::sawdust_burst;

const FEEDBACK_MS: f64 = 1_800.0;

/// Restores pruned branches whose regrow deadline has passed.
pub struct RegrowthSystem;

impl RegrowthSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RegrowthSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for RegrowthSystem {
    fn name(&self) -> &str {
        "regrowth"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let regrown = world.tree.regrow_due(ctx.now_ms);
        if !regrown.is_empty() {
            log::debug!("branches regrown: {regrown:?}");
        }
        Ok(())
    }
}

/// Cuts the branch under an active saw, against the segments traced this
/// frame.
pub struct SawSystem;

impl SawSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SawSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for SawSystem {
    fn name(&self) -> &str {
        "saw"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        if !world.saw.active && !world.saw.pending_cut {
            return Ok(());
        }
        world.saw.pending_cut = false;
        let rules = SawRules::from(ctx.tuning);
        let pointer = world.saw.position;
        match try_cut(
            &mut world.saw,
            &mut world.tree,
            &world.trace.segments,
            pointer,
            ctx.now_ms,
            &rules,
            rng,
        ) {
            Ok(cut) => {
                world.particles.sawdust.extend(sawdust_burst(cut.contact, rng));
                world.feedback = Some(Feedback {
                    text: "Snip! That branch will regrow in time".into(),
                    expires_at: ctx.now_ms + FEEDBACK_MS,
                });
                log::debug!(
                    "cut branch {} at depth {}, regrows at {:.0} ms",
                    cut.branch_id,
                    cut.depth,
                    cut.regrow_at
                );
            }
            Err(CutRejected::UnknownBranch(id)) => {
                log::warn!("saw hit stale segment for branch {id}");
            }
            Err(_) => {}
        }
        Ok(())
    }
}
