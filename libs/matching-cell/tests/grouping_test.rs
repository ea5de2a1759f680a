use uuid::Uuid;

use matching_cell::models::{Coordinate, GeoCandidate, TravelConstraint};
use matching_cell::services::grouping::DEFAULT_SIGNATURE;
use matching_cell::ConstraintGrouper;

fn candidate(constraints: Vec<TravelConstraint>) -> GeoCandidate {
    GeoCandidate {
        id: Uuid::new_v4(),
        anchor: Coordinate::new(-6.2, 106.8),
        constraint_profile: constraints,
    }
}

#[test]
fn signature_is_order_independent() {
    let forward = vec![
        TravelConstraint::distance(5000),
        TravelConstraint::duration(1800),
    ];
    let reversed = vec![
        TravelConstraint::duration(1800),
        TravelConstraint::distance(5000),
    ];

    assert_eq!(
        ConstraintGrouper::signature(&forward),
        ConstraintGrouper::signature(&reversed)
    );
    assert_eq!(ConstraintGrouper::signature(&forward), "0-1800|5000-0");
}

#[test]
fn equal_profiles_in_different_order_share_one_group() {
    let groups = ConstraintGrouper.group(vec![
        candidate(vec![
            TravelConstraint::distance(5000),
            TravelConstraint::duration(1800),
        ]),
        candidate(vec![
            TravelConstraint::duration(1800),
            TravelConstraint::distance(5000),
        ]),
    ]);

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].members.len(), 2);
}

#[test]
fn empty_profile_maps_to_the_default_signature() {
    assert_eq!(ConstraintGrouper::signature(&[]), DEFAULT_SIGNATURE);

    let groups = ConstraintGrouper.group(vec![candidate(vec![])]);
    assert_eq!(groups[0].signature, DEFAULT_SIGNATURE);
    assert!(groups[0].constraints.is_empty());
}

#[test]
fn zero_valued_entries_are_dropped_with_default_fallback() {
    // A malformed profile collapses to the default signature instead of
    // failing the group.
    let malformed = vec![TravelConstraint::distance(0), TravelConstraint::default()];
    assert_eq!(ConstraintGrouper::signature(&malformed), DEFAULT_SIGNATURE);

    // A zero entry next to a real one only loses the zero entry.
    let partial = vec![TravelConstraint::distance(0), TravelConstraint::duration(1800)];
    assert_eq!(ConstraintGrouper::signature(&partial), "0-1800");
}

#[test]
fn duplicate_entries_collapse_during_normalization() {
    let profile = vec![
        TravelConstraint::distance(5000),
        TravelConstraint::distance(5000),
    ];
    assert_eq!(ConstraintGrouper::normalize(&profile).len(), 1);
}

#[test]
fn distinct_profiles_produce_distinct_groups() {
    let groups = ConstraintGrouper.group(vec![
        candidate(vec![TravelConstraint::distance(5000)]),
        candidate(vec![TravelConstraint::distance(8000)]),
        candidate(vec![]),
    ]);

    assert_eq!(groups.len(), 3);
    let signatures: Vec<&str> = groups.iter().map(|g| g.signature.as_str()).collect();
    assert!(signatures.contains(&"5000-0"));
    assert!(signatures.contains(&"8000-0"));
    assert!(signatures.contains(&DEFAULT_SIGNATURE));
}
