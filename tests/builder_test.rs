//! Tests for TreeBuilder

use rstest::rstest;

use featuretree::application::{Catalog, EncodingPolicy, RawFeatureRecord};
use featuretree::domain::{build_tree, Diagnostic, DomainError, FeatureTree, TreeBuilder};
use featuretree::util::testing;

fn catalog_with(entries: &[(i64, Option<&str>)], policy: EncodingPolicy) -> Catalog {
    testing::init_test_setup();
    let raw = entries
        .iter()
        .map(|&(id, order)| RawFeatureRecord::new(id, &format!("feature {id}"), order))
        .collect();
    Catalog::from_raw(raw, policy).expect("valid catalog")
}

fn catalog_of(entries: &[(i64, Option<&str>)]) -> Catalog {
    catalog_with(entries, EncodingPolicy::Strict)
}

fn children(tree: &FeatureTree, id: Option<u32>) -> Vec<u32> {
    let idx = match id {
        None => tree.root(),
        Some(id) => tree.find(id).expect("node exists"),
    };
    tree.children_of(idx).filter_map(|n| n.id()).collect()
}

#[test]
fn given_mixed_catalog_when_building_then_links_by_second_to_last_token() {
    // Arrange
    let catalog = catalog_of(&[(1, Some("31-1")), (31, Some("31")), (30, None)]);

    // Act
    let tree = build_tree(catalog.records()).unwrap();

    // Assert
    assert_eq!(children(&tree, None), vec![31, 30]);
    assert_eq!(children(&tree, Some(31)), vec![1]);
    assert!(children(&tree, Some(30)).is_empty());
}

#[test]
fn given_child_before_parent_when_building_then_forward_reference_resolves() {
    let catalog = catalog_of(&[(2, Some("1-2")), (1, None)]);

    let tree = build_tree(catalog.records()).unwrap();

    assert_eq!(children(&tree, Some(1)), vec![2]);
    assert_eq!(children(&tree, None), vec![1]);
}

#[test]
fn given_comma_separated_order_when_building_then_only_first_alternative_counts() {
    // first alternative "12" is a single token
    let catalog = catalog_of(&[(12, Some("12")), (13, Some("12,14,16,17,19-13"))]);

    let output = TreeBuilder::new().build(catalog.records()).unwrap();

    assert_eq!(children(&output.tree, None), vec![12, 13]);
    assert!(output.fallbacks().next().is_none());
}

#[test]
fn given_dangling_parent_when_building_then_attaches_to_root_with_diagnostic() {
    let catalog = catalog_of(&[(5, Some("99-5")), (6, None)]);

    let output = TreeBuilder::new().build(catalog.records()).unwrap();

    assert_eq!(children(&output.tree, None), vec![5, 6]);
    assert_eq!(
        output.diagnostics,
        vec![Diagnostic::DanglingParent { id: 5, parent: 99 }]
    );
}

#[test]
fn given_siblings_when_building_then_catalog_order_is_kept() {
    let catalog = catalog_of(&[
        (3, Some("1-3")),
        (1, None),
        (2, Some("1-2")),
        (4, Some("1-4")),
    ]);

    let tree = build_tree(catalog.records()).unwrap();

    assert_eq!(children(&tree, Some(1)), vec![3, 2, 4]);
}

#[test]
fn given_absent_order_when_building_then_parent_is_root() {
    let catalog = catalog_of(&[(1, None), (2, None), (3, Some("1-3"))]);

    let tree = build_tree(catalog.records()).unwrap();

    for id in [1, 2] {
        let parent = tree.parent_of(id).unwrap();
        assert_eq!(parent.id(), None, "feature {id} should hang off the root");
    }
}

#[test]
fn given_duplicate_ids_when_building_then_no_tree_is_returned() {
    // Bypass catalog ingestion, which rejects duplicates on its own
    let mut records = catalog_of(&[(1, None), (2, Some("1-2"))]).records().to_vec();
    records.push(records[0].clone());

    let result = TreeBuilder::new().build(&records);

    assert_eq!(result.unwrap_err(), DomainError::DuplicateId { id: 1 });
}

#[test]
fn given_same_catalog_when_building_twice_then_shapes_are_identical() {
    let catalog = catalog_of(&[
        (2, Some("1-2")),
        (1, None),
        (3, Some("1-2-3")),
        (4, Some("7-4")),
        (5, Some("2-5")),
    ]);

    let first = build_tree(catalog.records()).unwrap();
    let second = build_tree(catalog.records()).unwrap();

    assert_eq!(first.shape(), second.shape());
}

#[rstest]
#[case(vec![(1, None), (2, Some("1-2")), (3, Some("2-3"))])]
#[case(vec![(3, Some("2-3")), (2, Some("1-2")), (1, None)])]
#[case(vec![(1, Some("3-1")), (2, Some("1-2")), (3, Some("2-3"))])]
#[case(vec![(1, Some("1-1")), (2, Some("42-2")), (3, None)])]
fn given_any_unique_catalog_when_building_then_every_record_appears_once(
    #[case] entries: Vec<(i64, Option<&'static str>)>,
) {
    let catalog = catalog_of(&entries);

    let tree = build_tree(catalog.records()).unwrap();

    let mut seen: Vec<u32> = tree.iter().filter_map(|(_, n)| n.id()).collect();
    seen.sort_unstable();
    let mut expected: Vec<u32> = catalog.records().iter().map(|r| r.id).collect();
    expected.sort_unstable();
    assert_eq!(seen, expected);
    assert_eq!(tree.len(), catalog.len());
}

#[test]
fn given_three_node_cycle_when_building_then_cycle_is_broken_at_root() {
    let catalog = catalog_of(&[(1, Some("3-1")), (2, Some("1-2")), (3, Some("2-3"))]);

    let output = TreeBuilder::new().build(catalog.records()).unwrap();

    // 1 -> 3 and 2 -> 1 link; 3 -> 2 would close the loop
    assert_eq!(children(&output.tree, None), vec![3]);
    assert_eq!(children(&output.tree, Some(3)), vec![1]);
    assert_eq!(children(&output.tree, Some(1)), vec![2]);
    assert_eq!(
        output.diagnostics,
        vec![Diagnostic::CycleBroken { id: 3, parent: 2 }]
    );
}

#[test]
fn given_lenient_catalog_with_malformed_order_when_building_then_node_hangs_off_root() {
    let raw = vec![
        RawFeatureRecord::new(1, "Parent", None),
        RawFeatureRecord::new(2, "Broken", Some("1-x-2")),
    ];
    let catalog = Catalog::from_raw(raw, EncodingPolicy::Lenient).unwrap();

    let output = TreeBuilder::new().build(catalog.records()).unwrap();

    assert_eq!(children(&output.tree, None), vec![1, 2]);
    assert!(matches!(
        output.diagnostics.as_slice(),
        [Diagnostic::MalformedEncoding { id: 2, .. }]
    ));
}

#[test]
fn given_foreign_single_token_when_building_then_flags_data_quality_only() {
    let catalog = catalog_of(&[(7, Some("8")), (8, None)]);

    let output = TreeBuilder::new().build(catalog.records()).unwrap();

    assert_eq!(children(&output.tree, None), vec![7, 8]);
    assert_eq!(
        output.diagnostics,
        vec![Diagnostic::TrailingTokenMismatch { id: 7, token: 8 }]
    );
    assert_eq!(output.fallbacks().count(), 0);
}

#[rstest]
#[case("01-2")]
#[case(" 1-2")]
#[case("+1-2")]
#[case("1 -2")]
fn given_non_canonical_parent_token_when_building_then_node_hangs_off_root(#[case] order: &str) {
    let catalog = catalog_with(&[(1, None), (2, Some(order))], EncodingPolicy::Lenient);

    let output = TreeBuilder::new().build(catalog.records()).unwrap();

    assert_eq!(children(&output.tree, None), vec![1, 2]);
    assert!(children(&output.tree, Some(1)).is_empty());
    assert!(matches!(
        output.diagnostics.as_slice(),
        [Diagnostic::MalformedEncoding { id: 2, .. }]
    ));
}

#[rstest]
#[case("01-2")]
#[case(" 1-2")]
fn given_non_canonical_parent_token_when_strict_then_ingestion_fails(#[case] order: &str) {
    let raw = vec![
        RawFeatureRecord::new(1, "Parent", None),
        RawFeatureRecord::new(2, "Child", Some(order)),
    ];

    let result = Catalog::from_raw(raw, EncodingPolicy::Strict);

    assert!(matches!(result, Err(DomainError::InvalidEncoding { id: 2, .. })));
}

#[rstest]
#[case("x-1-2", "x")]
#[case("1-2,abc", "abc")]
#[case("1-2,", "")]
fn given_bad_token_outside_parent_position_when_building_then_parent_still_links(
    #[case] order: &str,
    #[case] ignored: &str,
) {
    let catalog = catalog_with(&[(1, None), (2, Some(order))], EncodingPolicy::Lenient);

    let output = TreeBuilder::new().build(catalog.records()).unwrap();

    assert_eq!(children(&output.tree, Some(1)), vec![2]);
    assert!(output
        .diagnostics
        .contains(&Diagnostic::IgnoredToken { id: 2, token: ignored.to_string() }));
    assert_eq!(output.fallbacks().count(), 0);
}

#[test]
fn given_trailing_hyphen_when_building_then_last_id_before_it_is_the_parent() {
    // "1-2-" splits into ["1", "2", ""]: the parent token is "2"
    let catalog = catalog_with(
        &[(1, None), (2, Some("1-2")), (3, Some("1-2-"))],
        EncodingPolicy::Lenient,
    );

    let output = TreeBuilder::new().build(catalog.records()).unwrap();

    assert_eq!(children(&output.tree, Some(1)), vec![2]);
    assert_eq!(children(&output.tree, Some(2)), vec![3]);
    assert_eq!(
        output.diagnostics,
        vec![Diagnostic::IgnoredToken { id: 3, token: String::new() }]
    );
}

#[test]
fn given_trailing_hyphen_naming_itself_when_building_then_cycle_is_broken_to_root() {
    let catalog = catalog_with(&[(1, None), (2, Some("1-2-"))], EncodingPolicy::Lenient);

    let output = TreeBuilder::new().build(catalog.records()).unwrap();

    assert_eq!(children(&output.tree, None), vec![1, 2]);
    assert!(output
        .diagnostics
        .contains(&Diagnostic::CycleBroken { id: 2, parent: 2 }));
}
