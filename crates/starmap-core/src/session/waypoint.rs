//! Next-waypoint selection.

use rand::prelude::*;

use crate::edge::EdgeSet;
use crate::world::{ObjectId, World};

/// Picks the next waypoint after visiting `from`.
///
/// Preference order: an unvisited tool linked to `from` or to its owning
/// category, then any unvisited tool, then nothing. Each tier is sampled
/// uniformly.
pub fn pick_next_waypoint<R: Rng + ?Sized>(
    from: &str,
    world: &World,
    edges: &EdgeSet,
    visited: &[ObjectId],
    rng: &mut R,
) -> Option<ObjectId> {
    let open = |id: &ObjectId| {
        id != from && !visited.contains(id) && world.get(id.as_str()).is_some_and(|o| o.is_tool())
    };

    let mut linked: Vec<&ObjectId> = edges.neighbors(from);
    if let Some(category) = world.get(from).and_then(|o| o.category_id.as_ref()) {
        linked.extend(edges.neighbors(category.as_str()));
    }
    linked.sort();
    linked.dedup();
    linked.retain(|id| open(*id));
    if let Some(next) = linked.choose(rng) {
        return Some((*next).clone());
    }

    let remaining: Vec<&ObjectId> = world.tools().map(|o| &o.id).filter(|id| open(*id)).collect();
    remaining.choose(rng).map(|id| (*id).clone())
}

/// Draws up to `count` distinct unvisited tools.
pub fn random_unvisited<R: Rng + ?Sized>(
    world: &World,
    visited: &[ObjectId],
    count: usize,
    rng: &mut R,
) -> Vec<ObjectId> {
    let pool: Vec<&ObjectId> = world
        .tools()
        .map(|o| &o.id)
        .filter(|id| !visited.contains(id))
        .collect();
    pool.choose_multiple(rng, count).map(|id| (*id).clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::graph::fixtures::sample_graph;
    use proptest::prelude::*;
    use rand_chacha::ChaCha8Rng;

    fn setup() -> (World, EdgeSet) {
        let graph = sample_graph();
        let world = World::build(&graph, &LayoutConfig::default());
        let edges = EdgeSet::build(&graph, &world);
        (world, edges)
    }

    #[test]
    fn test_prefers_linked_tools() {
        let (world, edges) = setup();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        // rust links to postgres directly and to go/zig through "lang"
        for _ in 0..50 {
            let next = pick_next_waypoint("rust", &world, &edges, &["rust".into()], &mut rng).unwrap();
            assert!(["postgres", "go", "zig"].contains(&next.as_str()), "{next}");
        }
    }

    #[test]
    fn test_falls_back_to_any_unvisited_tool() {
        let (world, edges) = setup();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let visited: Vec<ObjectId> = ["rust", "go", "zig", "postgres"].map(ObjectId::from).to_vec();
        let next = pick_next_waypoint("rust", &world, &edges, &visited, &mut rng).unwrap();
        assert!(["redis", "docker"].contains(&next.as_str()));
    }

    #[test]
    fn test_exhausted_route() {
        let (world, edges) = setup();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let visited: Vec<ObjectId> = world.tools().map(|o| o.id.clone()).collect();
        assert!(pick_next_waypoint("rust", &world, &edges, &visited, &mut rng).is_none());
    }

    #[test]
    fn test_random_unvisited_is_distinct() {
        let (world, _) = setup();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let picked = random_unvisited(&world, &["rust".into()], 3, &mut rng);
        assert_eq!(picked.len(), 3);
        assert!(!picked.contains(&"rust".into()));
        let mut sorted = picked.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), 3);
    }

    proptest! {
        #[test]
        fn prop_waypoint_never_repeats(seed in any::<u64>(), visits in 1usize..6) {
            let (world, edges) = setup();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut visited: Vec<ObjectId> = vec!["rust".into()];
            for _ in 0..visits {
                let last = visited.last().unwrap().clone();
                match pick_next_waypoint(last.as_str(), &world, &edges, &visited, &mut rng) {
                    Some(next) => {
                        prop_assert!(!visited.contains(&next));
                        visited.push(next);
                    }
                    None => break,
                }
            }
        }
    }
}
