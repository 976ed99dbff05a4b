use super::{check_section_counts, map_sections, normalize_sections, MappingMethod};
use crate::config::AlignerConfig;
use crate::error::AlignmentError;
use crate::types::{Draft, Section};

fn draft(id: &str, bodies: &[&str]) -> Draft {
    Draft::new(
        id,
        bodies
            .iter()
            .enumerate()
            .map(|(idx, body)| Section::new(idx as u32 + 1, *body))
            .collect(),
    )
}

fn bodies(draft: &Draft) -> Vec<&str> {
    draft
        .sections
        .iter()
        .map(|section| section.body.as_str())
        .collect()
}

fn non_whitespace(draft: &Draft) -> String {
    draft
        .sections
        .iter()
        .flat_map(|section| section.text().chars().collect::<Vec<_>>())
        .filter(|c| !c.is_whitespace())
        .collect()
}

fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

#[test]
fn empty_input_is_empty_output() {
    let out = normalize_sections(&[], &AlignerConfig::default()).expect("normalize");
    assert!(out.is_empty());
}

#[test]
fn equal_counts_pass_through_untouched() {
    let drafts = vec![
        draft("a", &["one", "two"]),
        draft("b", &["uno", "dos"]),
    ];
    let out = normalize_sections(&drafts, &AlignerConfig::default()).expect("normalize");
    assert_eq!(out, drafts);
}

#[test]
fn merged_sections_split_where_target_sections_begin() {
    let drafts = vec![
        draft(
            "target",
            &[
                "Section 1. Beginning at the corner thence north",
                "Section 2. The west half of lot 4",
            ],
        ),
        draft(
            "merged",
            &["Section 1. Beginning at the corner thence north Section 2. The west half of lot 4"],
        ),
    ];
    let out = normalize_sections(&drafts, &AlignerConfig::default()).expect("normalize");
    assert_eq!(
        bodies(&out[1]),
        [
            "Section 1. Beginning at the corner thence north ",
            "Section 2. The west half of lot 4",
        ]
    );
    let ids: Vec<u32> = out[1].sections.iter().map(|section| section.id).collect();
    assert_eq!(ids, [1, 2]);
}

#[test]
fn split_tolerates_ocr_noise() {
    let drafts = vec![
        draft(
            "target",
            &[
                "Beginning at the NE corner of Section 12",
                "thence South 89 degrees West 1,638 feet",
                "to the point of beginning",
            ],
        ),
        draft(
            "noisy",
            &["Beginnlng at the N.E. corner of Sectlon 12 thence S. 89 deg. West 1638 feet to the polnt of beginning"],
        ),
    ];
    let out = normalize_sections(&drafts, &AlignerConfig::default()).expect("normalize");
    let noisy = bodies(&out[1]);
    assert_eq!(noisy.len(), 3);
    assert!(noisy[1].starts_with("thence"), "got {noisy:?}");
    assert!(noisy[2].starts_with("to the"), "got {noisy:?}");
    assert_eq!(non_whitespace(&out[1]), non_whitespace(&drafts[1]));
}

#[test]
fn unmatched_section_merges_into_previous_piece() {
    let target = texts(&["alpha beta", "gamma delta epsilon", "zeta", "eta theta"]);
    let current = texts(&["alpha beta gamma delta", "epsilon", "zeta eta theta"]);
    let mapping = map_sections(&target, &current, &AlignerConfig::default());
    assert_eq!(mapping.method, MappingMethod::Aligned);
    assert_eq!(mapping.current_to_targets(), vec![vec![0, 1], vec![], vec![2, 3]]);

    let drafts = vec![
        draft("target", &["alpha beta", "gamma delta epsilon", "zeta", "eta theta"]),
        draft("current", &["alpha beta gamma delta", "epsilon", "zeta eta theta"]),
    ];
    let out = normalize_sections(&drafts, &AlignerConfig::default()).expect("normalize");
    assert_eq!(
        bodies(&out[1]),
        ["alpha beta ", "gamma delta\nepsilon", "zeta ", "eta theta"]
    );
}

#[test]
fn dissimilar_content_splits_proportionally() {
    let drafts = vec![
        draft("target", &["aaa bbb", "ccc ddd", "eee fff", "ggg hhh"]),
        draft("other", &["one two three four five six seven eight"]),
    ];
    let config = AlignerConfig::default();
    let mapping = map_sections(
        &texts(&["aaa bbb", "ccc ddd", "eee fff", "ggg hhh"]),
        &texts(&["one two three four five six seven eight"]),
        &config,
    );
    assert_eq!(mapping.method, MappingMethod::Proportional);
    assert!(mapping.similarity < config.section_similarity_threshold);

    let out = normalize_sections(&drafts, &config).expect("normalize");
    let pieces = bodies(&out[1]);
    assert_eq!(pieces.len(), 4);
    assert!(pieces[0].starts_with("one"));
    assert_eq!(pieces.concat(), "one two three four five six seven eight");
}

#[test]
fn zero_section_draft_becomes_empty_sections() {
    let drafts = vec![
        draft("a", &["first part", "second part", "third part"]),
        Draft::new("empty", Vec::new()),
    ];
    let out = normalize_sections(&drafts, &AlignerConfig::default()).expect("normalize");
    assert_eq!(out[1].sections.len(), 3);
    assert!(out[1].sections.iter().all(|section| section.body.is_empty()));
}

#[test]
fn first_draft_with_most_sections_is_target() {
    let drafts = vec![
        draft("a", &["x y", "z w v"]),
        draft("b", &["x y z", "w v"]),
        draft("c", &["x y z w v"]),
    ];
    let out = normalize_sections(&drafts, &AlignerConfig::default()).expect("normalize");
    assert_eq!(bodies(&out[2]), ["x y ", "z w v"]);
    assert_eq!(out[0], drafts[0]);
    assert_eq!(out[1], drafts[1]);
}

#[test]
fn header_stays_with_first_piece() {
    let mut merged = draft("merged", &["north line of lot 4 south line of lot 5"]);
    merged.sections[0].header = Some("Parcel A".to_string());
    let drafts = vec![
        draft("target", &["Parcel A north line of lot 4", "south line of lot 5"]),
        merged,
    ];
    let out = normalize_sections(&drafts, &AlignerConfig::default()).expect("normalize");
    let sections = &out[1].sections;
    assert_eq!(sections.len(), 2);
    assert_eq!(sections[0].header.as_deref(), Some("Parcel A"));
    assert_eq!(sections[0].text(), "Parcel A north line of lot 4 ");
    assert_eq!(sections[1].header, None);
    assert_eq!(sections[1].body, "south line of lot 5");
}

#[test]
fn every_draft_ends_with_the_same_count() {
    let drafts = vec![
        draft("a", &["one"]),
        draft("b", &["one", "two", "three", "four"]),
        draft("c", &["one two", "three four"]),
        draft("d", &[]),
    ];
    let out = normalize_sections(&drafts, &AlignerConfig::default()).expect("normalize");
    assert!(out.iter().all(|draft| draft.sections.len() == 4));
    for (before, after) in drafts.iter().zip(&out) {
        assert_eq!(non_whitespace(before), non_whitespace(after));
    }
}

#[test]
fn divergent_counts_are_reported() {
    let drafts = vec![draft("a", &["x", "y"]), draft("b", &["x"])];
    let err = check_section_counts(&drafts, 2).expect_err("b has one section");
    assert!(matches!(
        err,
        AlignmentError::SectionCountDivergence {
            expected: 2,
            actual: 1,
            ..
        }
    ));
}
