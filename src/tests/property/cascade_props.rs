//! Property-based tests for the geo cascade loader
//!
//! Tests invariants:
//! - Only the newest fetch of a level is ever applied
//! - Changing a parent clears every descendant
//! - Applied options are sorted by name
//! - A selection never holds a child without its parent

use proptest::prelude::*;

use crate::core::geo::{GeoCascade, GeoError, GeoLevel, GeoOption, GeoRequest, GeoResponse, LevelState};
use crate::core::profile::LocationSelection;

// ============================================================================
// Strategies for generating test inputs
// ============================================================================

fn arb_code() -> impl Strategy<Value = String> {
    "[A-Z]{2}"
}

fn arb_optional_part() -> impl Strategy<Value = String> {
    prop_oneof![Just(String::new()), "[A-Za-z ]{1,12}"]
}

fn arb_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[A-Za-z]{1,12}", 0..20)
}

fn respond(request: &GeoRequest, names: &[String]) -> GeoResponse {
    GeoResponse {
        request: request.clone(),
        result: Ok(names
            .iter()
            .enumerate()
            .map(|(i, name)| GeoOption::new(i.to_string(), name.clone()))
            .collect()),
    }
}

/// A cascade with countries, states of `country` and cities of `state` loaded.
fn loaded_cascade(country: &str, state: &str) -> (GeoCascade, LocationSelection) {
    let mut cascade = GeoCascade::new();
    let mut selection = LocationSelection::new();

    for request in cascade.open(&selection) {
        cascade.apply(respond(&request, &["Chile".to_string()]));
    }
    selection.set_country(country);
    if let Some(request) = cascade.country_changed(&selection) {
        cascade.apply(respond(&request, &["Utah".to_string()]));
    }
    selection.set_state(state);
    if let Some(request) = cascade.state_changed(&selection) {
        cascade.apply(respond(&request, &["Provo".to_string()]));
    }
    (cascade, selection)
}

// ============================================================================
// Staleness
// ============================================================================

proptest! {
    #[test]
    fn prop_only_newest_country_fetch_applies(
        countries in prop::collection::vec(arb_code(), 1..6),
        reverse in any::<bool>(),
    ) {
        let mut cascade = GeoCascade::new();
        let mut selection = LocationSelection::new();

        let mut requests = Vec::new();
        for country in &countries {
            selection.set_country(country);
            let request = cascade.country_changed(&selection);
            prop_assert!(request.is_some());
            requests.extend(request);
        }

        let newest = requests.len() - 1;
        let mut order: Vec<usize> = (0..requests.len()).collect();
        if reverse {
            order.reverse();
        }

        for i in order {
            let names = vec![format!("State of {}", countries[i])];
            let applied = cascade.apply(respond(&requests[i], &names));
            prop_assert_eq!(applied, i == newest);
        }

        let expected = format!("State of {}", countries[newest]);
        prop_assert_eq!(cascade.states().len(), 1);
        prop_assert_eq!(&cascade.states()[0].name, &expected);
    }

    #[test]
    fn prop_responses_never_apply_twice(names in arb_names()) {
        let mut cascade = GeoCascade::new();
        let requests = cascade.open(&LocationSelection::new());
        prop_assert_eq!(requests.len(), 1);

        prop_assert!(cascade.apply(respond(&requests[0], &names)));
        prop_assert!(!cascade.apply(respond(&requests[0], &names)));
    }

    #[test]
    fn prop_tickets_unique_across_cascades(count in 2usize..8) {
        let mut tickets: Vec<u64> = (0..count)
            .flat_map(|_| GeoCascade::new().open(&LocationSelection::new()))
            .map(|request| request.ticket)
            .collect();
        tickets.sort_unstable();
        tickets.dedup();
        prop_assert_eq!(tickets.len(), count);
    }
}

// ============================================================================
// Descendant clearing
// ============================================================================

proptest! {
    #[test]
    fn prop_country_change_clears_descendants(
        country in arb_code(),
        state in arb_code(),
        next in prop_oneof![Just(String::new()), arb_code()],
    ) {
        let (mut cascade, mut selection) = loaded_cascade(&country, &state);
        prop_assert!(!cascade.cities().is_empty());

        selection.set_country(&next);
        let request = cascade.country_changed(&selection);

        prop_assert!(cascade.states().is_empty());
        prop_assert!(cascade.cities().is_empty());
        prop_assert_eq!(cascade.level(GeoLevel::City), &LevelState::NotRequested);
        prop_assert_eq!(request.is_some(), !next.is_empty());
        prop_assert_eq!(selection.state(), "");
        prop_assert_eq!(selection.city(), "");
    }

    #[test]
    fn prop_state_change_keeps_states_clears_cities(
        country in arb_code(),
        state in arb_code(),
        next in arb_code(),
    ) {
        let (mut cascade, mut selection) = loaded_cascade(&country, &state);

        selection.set_state(&next);
        let request = cascade.state_changed(&selection);

        prop_assert_eq!(cascade.states().len(), 1);
        prop_assert!(cascade.cities().is_empty());
        prop_assert!(cascade.level(GeoLevel::City).is_loading());
        prop_assert!(request.is_some());
    }

    #[test]
    fn prop_failures_degrade_to_empty(country in arb_code()) {
        let mut cascade = GeoCascade::new();
        let selection = LocationSelection::from_parts(&country, "", "");
        let request = cascade.country_changed(&selection);
        prop_assert!(request.is_some());

        if let Some(request) = request {
            let applied = cascade.apply(GeoResponse {
                request,
                result: Err(GeoError::Http("connection refused".to_string())),
            });
            prop_assert!(applied);
        }
        prop_assert_eq!(cascade.level(GeoLevel::State), &LevelState::Loaded(Vec::new()));
    }
}

// ============================================================================
// Ordering and selection shape
// ============================================================================

proptest! {
    #[test]
    fn prop_applied_options_sorted(names in arb_names()) {
        let mut cascade = GeoCascade::new();
        let requests = cascade.open(&LocationSelection::new());
        cascade.apply(respond(&requests[0], &names));

        let applied: Vec<&str> = cascade.countries().iter().map(|o| o.name.as_str()).collect();
        let mut sorted = applied.clone();
        sorted.sort_unstable();
        prop_assert_eq!(applied, sorted);
        prop_assert_eq!(cascade.countries().len(), names.len());
    }

    #[test]
    fn prop_selection_never_orphans_children(
        country in arb_optional_part(),
        state in arb_optional_part(),
        city in arb_optional_part(),
    ) {
        let selection = LocationSelection::from_parts(&country, &state, &city);
        if selection.country().is_empty() {
            prop_assert!(selection.state().is_empty());
        }
        if selection.state().is_empty() {
            prop_assert!(selection.city().is_empty());
        }
        prop_assert_eq!(selection.is_complete(), !country.is_empty() && !state.is_empty() && !city.is_empty());
    }
}
