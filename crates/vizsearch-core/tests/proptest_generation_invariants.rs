//! Property-based invariant tests for trial generation.
//!
//! 1. Sampled locations keep their distance from fixation and each other
//! 2. Sampled locations stay inside the region and under the quadrant cap
//! 3. Slot partitions have the right size and never reuse a slot
//! 4. Same seed, same trial file; every generated file checks clean against
//!    its layout, orientations included

use proptest::prelude::*;
use vizsearch_core::partition::partition_positions;
use vizsearch_core::{
    ConditionTable, FactorSchema, GenerationError, Region, RunConfig, SamplerConstraints,
    TrialFile, TrialRng, generate, sample_locations,
};

const TABLE: &str = "block\ttargetName\ttargetPic\tdistractorName\tdistractorPic\n\
    L\tT\tT_1\tL\tL_1\n\
    L\tT\tT_2\tL\tL_2\n\
    R\tT\tT_1\tO\tO_1\n";

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn sampled_locations_respect_min_distance(
        seed in any::<u64>(),
        count in 1usize..12,
        min_distance in 0.5f64..2.0,
    ) {
        let region = Region::centered_square(8.0).expect("region");
        let constraints = SamplerConstraints::new(region, min_distance)
            .expect("constraints")
            .with_max_attempts(20_000);
        let mut rng = TrialRng::from_u64(seed);

        match sample_locations(count, &constraints, &mut rng) {
            Ok(locs) => {
                prop_assert_eq!(locs.len(), count);
                for (i, a) in locs.iter().enumerate() {
                    prop_assert!(a.norm() >= min_distance);
                    prop_assert!(region.contains(a));
                    for b in &locs[i + 1..] {
                        prop_assert!(a.distance(b) >= min_distance);
                    }
                }
            }
            Err(GenerationError::GenerationTimeout { placed, .. }) => {
                prop_assert!(placed < count);
            }
            Err(other) => prop_assert!(false, "unexpected error: {other}"),
        }
    }

    #[test]
    fn quadrant_cap_is_never_exceeded(seed in any::<u64>(), cap in 1usize..4) {
        let region = Region::centered_square(10.0).expect("region");
        let constraints = SamplerConstraints::new(region, 1.0)
            .expect("constraints")
            .with_max_per_quadrant(Some(cap))
            .with_max_attempts(50_000);
        let mut rng = TrialRng::from_u64(seed);
        let locs = sample_locations(cap * 4, &constraints, &mut rng).expect("feasible");

        let mut counts = [0usize; 4];
        for loc in &locs {
            counts[loc.quadrant().index()] += 1;
        }
        prop_assert!(counts.iter().all(|&n| n == cap));
    }

    #[test]
    fn slot_partitions_are_disjoint_and_sized(
        seed in any::<u64>(),
        half in 2usize..8,
        target_pick in any::<usize>(),
        present in any::<bool>(),
    ) {
        let num_positions = half * 2;
        let set_size = if present { num_positions } else { half * 2 - 2 };
        let target = present.then_some(target_pick % num_positions);
        let mut rng = TrialRng::from_u64(seed);
        let partition = partition_positions(num_positions, set_size, target, &mut rng)
            .expect("feasible partition");

        let distractors = partition.distractors();
        let expected = if present { set_size - 1 } else { set_size };
        prop_assert_eq!(distractors.len(), expected);
        for (i, slot) in distractors.iter().enumerate() {
            prop_assert!(*slot < num_positions);
            prop_assert!(!distractors[..i].contains(slot));
            prop_assert!(Some(*slot) != target);
        }
    }

    #[test]
    fn generation_is_a_function_of_the_seed(seed in -1_000_000i64..1_000_000) {
        let table = ConditionTable::parse(TABLE).expect("table");
        let config = RunConfig::new("s1", seed.to_string(), "e", "RL");
        let schema = FactorSchema::blocked_slots();

        let first = generate(&config, &schema, &table).expect("generate").render();
        let second = generate(&config, &schema, &table).expect("generate").render();
        prop_assert_eq!(&first, &second);

        let summary = TrialFile::parse(&first)
            .expect("parse")
            .summarize_for(Some(&schema.layout));
        prop_assert!(summary.is_clean(), "violations: {:?}", summary.violations);
        // L crosses two target pictures with two distractor pictures.
        prop_assert_eq!(summary.trials, 5 * 72);
        prop_assert_eq!(summary.blocks[0].label.as_str(), "R");
    }
}

#[test]
fn scattered_file_reads_back_clean() {
    let table = ConditionTable::parse(TABLE).expect("table");
    let config = RunConfig::new("s2", "7", "e", "LR");
    let schema = FactorSchema::scattered(6.0, 2.0).expect("schema");
    let text = generate(&config, &schema, &table).expect("generate").render();

    let file = TrialFile::parse(&text).expect("parse");
    assert_eq!(file.config_fields, vec!["subjCode", "seed", "lang", "blockOrder"]);
    let summary = file.summarize_for(Some(&schema.layout));
    assert!(summary.is_clean(), "violations: {:?}", summary.violations);
    assert_eq!(summary.trials, 5 * 10);
    assert!(summary.blocks.iter().all(|block| block.absent == 0));
    for trial in &file.trials {
        let orientation = trial.target_orientation.expect("target orientation");
        assert_eq!(trial.response_key, orientation.response_key());
        assert_eq!(trial.distractor_orientations.len(), trial.set_size - 1);
    }
}
