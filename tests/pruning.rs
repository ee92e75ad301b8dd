use arbor::{
    canopy::Point,
    engine::{Engine, EngineBuilder},
    scenario::ScenarioLoader,
    world::{InputEvent, LifeStage, World},
};

fn garden() -> (Engine, World) {
    let mut scenario = ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"))
        .load("scenarios/default_garden.yaml")
        .expect("scenario should load");
    scenario.max_depth = 5;
    let mut world = scenario.build_world().expect("valid viewport");
    world.stage_clock_mut().enter(LifeStage::Mature);
    world.climate_mut().growth = 1.0;
    world.climate_mut().target_growth = 1.0;
    let engine = EngineBuilder::new(scenario.engine_settings(Some(0), "unused"))
        .with_garden_systems()
        .build();
    (engine, world)
}

fn midpoint(world: &World, depth: u32) -> Point {
    let segment = world
        .segments()
        .iter()
        .find(|s| s.depth == depth && !s.pruned)
        .expect("segment at depth");
    Point::new(
        (segment.from.x + segment.to.x) / 2.0,
        (segment.from.y + segment.to.y) / 2.0,
    )
}

fn pruned_ids(world: &World) -> Vec<u64> {
    let mut ids = Vec::new();
    world.tree().visit(&mut |node| {
        if node.pruned {
            ids.push(node.id);
        }
    });
    ids
}

#[test]
fn saw_cuts_and_branch_regrows() {
    let (mut engine, mut world) = garden();
    engine.frame(&mut world, 16.0).expect("frame runs");
    let target = midpoint(&world, 1);

    world.queue_input(InputEvent::PointerDown { x: target.x, y: target.y });
    engine.frame(&mut world, 16.0).expect("frame runs");
    world.queue_input(InputEvent::PointerUp);
    engine.frame(&mut world, 16.0).expect("frame runs");

    let pruned = pruned_ids(&world);
    assert_eq!(pruned.len(), 1);
    let cut = world.tree().find(pruned[0]).expect("pruned branch").clone();
    assert!(cut.depth > 0);
    assert!(!world.particles().sawdust.is_empty());
    assert!(world.hud().hint.contains("regrow"));

    let stub = world
        .segments()
        .iter()
        .find(|s| s.branch_id == cut.id)
        .expect("stub is still traced");
    assert!(stub.pruned);
    let hidden = cut.ids();
    assert!(world
        .segments()
        .iter()
        .all(|s| s.branch_id == cut.id || !hidden.contains(&s.branch_id)));

    // regrow deadlines fall within 32 s of the cut
    for _ in 0..330 {
        engine.frame(&mut world, 100.0).expect("frame runs");
    }
    assert!(pruned_ids(&world).is_empty());
    assert!(world
        .segments()
        .iter()
        .any(|s| s.branch_id == cut.id && !s.pruned));
}

#[test]
fn trunk_cannot_be_cut() {
    let (mut engine, mut world) = garden();
    engine.frame(&mut world, 16.0).expect("frame runs");
    let base = world.viewport().trunk_base();

    world.queue_input(InputEvent::PointerDown { x: base.x, y: base.y - 2.0 });
    engine.frame(&mut world, 16.0).expect("frame runs");

    assert!(pruned_ids(&world).is_empty());
    assert!(world.particles().sawdust.is_empty());
    assert!(world.saw().last_cut.is_none());
}

#[test]
fn holding_the_saw_respects_the_cooldown() {
    let (mut engine, mut world) = garden();
    engine.frame(&mut world, 16.0).expect("frame runs");
    let target = midpoint(&world, 2);
    world.queue_input(InputEvent::PointerDown { x: target.x, y: target.y });

    let mut cuts = Vec::new();
    for _ in 0..20 {
        engine.frame(&mut world, 16.0).expect("frame runs");
        if let Some(at) = world.saw().last_cut {
            if cuts.last() != Some(&at) {
                cuts.push(at);
            }
        }
    }
    assert!(!cuts.is_empty());
    for pair in cuts.windows(2) {
        assert!(pair[1] - pair[0] >= 140.0);
    }
    assert!(world.saw().active);
}

#[test]
fn quick_tap_within_one_frame_still_cuts() {
    let (mut engine, mut world) = garden();
    engine.frame(&mut world, 16.0).expect("frame runs");
    let target = midpoint(&world, 1);

    world.queue_input(InputEvent::PointerDown { x: target.x, y: target.y });
    world.queue_input(InputEvent::PointerUp);
    engine.frame(&mut world, 16.0).expect("frame runs");

    assert_eq!(pruned_ids(&world).len(), 1);
    assert!(!world.saw().active);
    assert!(!world.saw().pending_cut);
    assert!(world.saw().last_cut.is_some());

    engine.frame(&mut world, 16.0).expect("frame runs");
    assert_eq!(pruned_ids(&world).len(), 1);
}
