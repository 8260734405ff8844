//! Deterministic fitness ordering.
//!
//! Agents are ranked by points (most first), then by generation (oldest
//! first), then by program size (smallest first). The sort is stable, so
//! agents that tie on all three keep their roster order.

use core::cmp::Ordering;

use preygent_world::Agent;

/// Compare two agents by fitness; `Less` means `a` ranks higher.
pub fn compare(a: &Agent, b: &Agent) -> Ordering {
    b.points()
        .cmp(&a.points())
        .then_with(|| a.generation().cmp(&b.generation()))
        .then_with(|| a.size().cmp(&b.size()))
}

/// Sort `roster` best first.
pub fn rank(roster: &mut [Agent]) {
    roster.sort_by(compare);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use preygent_program::{InterpreterOptions, MutationSettings};
    use preygent_world::{BodySettings, Spawner};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn agent(spawner: &Spawner, text: &str, points: u64, generation: u64) -> Agent {
        let mut rng = SmallRng::seed_from_u64(0);
        let program = spawner.parse(text).unwrap();
        let mut agent = Agent::from_program(spawner, &mut rng, program, generation);
        agent.state_mut().points = points;
        agent
    }

    fn spawner() -> Spawner {
        Spawner::new(
            InterpreterOptions::default(),
            MutationSettings::default(),
            BodySettings::default(),
            20,
        )
    }

    #[test]
    fn points_then_generation_then_size() {
        let s = spawner();
        let mut roster = vec![
            agent(&s, "( 1 2 3 )", 5, 1),
            agent(&s, "( 1 )", 5, 1),
            agent(&s, "( 1 2 3 )", 5, 0),
            agent(&s, "( )", 9, 4),
        ];
        let ids: Vec<_> = roster.iter().map(Agent::id).collect();
        rank(&mut roster);
        let ranked: Vec<_> = roster.iter().map(Agent::id).collect();
        let expected: Vec<_> = [3, 2, 1, 0].iter().map(|&i| *ids.get(i).unwrap()).collect();
        assert_eq!(ranked, expected);
    }

    #[test]
    fn full_ties_keep_roster_order() {
        let s = spawner();
        let mut roster = vec![
            agent(&s, "( 1 )", 3, 2),
            agent(&s, "( 2 )", 3, 2),
            agent(&s, "( 3 )", 3, 2),
        ];
        let before: Vec<_> = roster.iter().map(Agent::id).collect();
        rank(&mut roster);
        let after: Vec<_> = roster.iter().map(Agent::id).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn ranking_is_reproducible() {
        let s = spawner();
        let mut rng = SmallRng::seed_from_u64(17);
        let mut roster: Vec<Agent> = (0..40)
            .map(|i| {
                let mut a = Agent::random(&s, &mut rng, i % 3);
                a.state_mut().points = i % 7;
                a
            })
            .collect();
        rank(&mut roster);
        let first: Vec<_> = roster.iter().map(Agent::id).collect();
        rank(&mut roster);
        let second: Vec<_> = roster.iter().map(Agent::id).collect();
        assert_eq!(first, second);
        for pair in roster.windows(2) {
            let [a, b] = pair else { continue };
            assert_ne!(compare(a, b), Ordering::Greater);
        }
    }
}
