//! Property tests for the reconciliation invariants:
//! - whole-text and per-token normalization agree
//! - a lone draft reconstructs byte for byte
//! - aligned blocks are rectangular with no all-gap column
//! - section normalization equalizes counts without losing text

use draft_consensus::{
    align_block, normalize_formatted_token, normalize_sections, normalize_whole_text, reconstruct,
    tokenize_with_mapping, AlignerConfig, Draft, Section, GAP,
};
use draft_consensus::types::SequenceInput;
use proptest::prelude::*;

const WORDS: [&str; 12] = [
    "N.", "4°00'W.,", "1,638", "feet", "Thence", "lot", "4", "(the)", "S.89°", "12.5", "—", "corner;",
];

fn legal_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        (prop::sample::select(WORDS.to_vec()), prop::sample::select(vec![" ", "  ", "\n", "\t", ", "])),
        0..24,
    )
    .prop_map(|pieces| {
        pieces
            .into_iter()
            .map(|(word, sep)| format!("{word}{sep}"))
            .collect()
    })
}

fn non_whitespace(draft: &Draft) -> String {
    draft
        .sections
        .iter()
        .flat_map(|section| section.body.chars().collect::<Vec<_>>())
        .filter(|c| !c.is_whitespace())
        .collect()
}

proptest! {
    #[test]
    fn whole_text_and_per_token_normalization_agree(
        text in prop_oneof![legal_text(), "[a-zA-Z0-9,.°' \\n\\t;()-]{0,80}"]
    ) {
        let whole = normalize_whole_text(&text);
        let per_token: Vec<String> = text
            .split_whitespace()
            .flat_map(normalize_formatted_token)
            .collect();
        prop_assert_eq!(&whole, &per_token);
        prop_assert_eq!(&tokenize_with_mapping("p", &text).tokens, &whole);
    }

    #[test]
    fn lone_draft_round_trips(text in legal_text()) {
        let tokenized = tokenize_with_mapping("solo", &text);
        let inputs = [SequenceInput { draft_id: "solo", tokens: &tokenized.tokens }];
        let block = align_block(1, &inputs, &AlignerConfig::default()).expect("aligns");
        let sequence = &block.aligned_sequences[0];
        prop_assert_eq!(sequence.gap_count(), 0);
        let out = reconstruct(&sequence.tokens, Some(&tokenized.mapping), &sequence.original_to_alignment);
        prop_assert_eq!(out.text, text);
    }

    #[test]
    fn aligned_blocks_are_rectangular(
        drafts in prop::collection::vec(
            prop::collection::vec(prop::sample::select(vec!["a", "b", "c", "lot", "lit", "4", "40"]), 0..12),
            1..5,
        )
    ) {
        let streams: Vec<Vec<String>> = drafts
            .iter()
            .map(|tokens| tokens.iter().map(|token| token.to_string()).collect())
            .collect();
        let ids: Vec<String> = (0..streams.len()).map(|idx| format!("d{idx}")).collect();
        let inputs: Vec<SequenceInput<'_>> = streams
            .iter()
            .zip(&ids)
            .map(|(tokens, id)| SequenceInput { draft_id: id, tokens })
            .collect();
        let block = align_block(1, &inputs, &AlignerConfig::default()).expect("aligns");

        let longest = streams.iter().map(Vec::len).max().unwrap_or(0);
        prop_assert!(block.alignment_length >= longest);
        for (sequence, original) in block.aligned_sequences.iter().zip(&streams) {
            prop_assert_eq!(sequence.len(), block.alignment_length);
            prop_assert_eq!(sequence.original_to_alignment.len(), original.len());
            prop_assert!(sequence.original_to_alignment.windows(2).all(|pair| pair[0] < pair[1]));
            for (token_idx, &column) in sequence.original_to_alignment.iter().enumerate() {
                prop_assert_eq!(&sequence.tokens[column as usize], &original[token_idx]);
            }
            prop_assert_eq!(sequence.non_gap_tokens().count(), original.len());
        }
        for column in 0..block.alignment_length {
            prop_assert!(block.aligned_sequences.iter().any(|sequence| sequence.tokens[column] != GAP));
        }
    }

    #[test]
    fn section_normalization_equalizes_counts(
        drafts in prop::collection::vec(
            prop::collection::vec(legal_text(), 0..5),
            1..4,
        )
    ) {
        let drafts: Vec<Draft> = drafts
            .into_iter()
            .enumerate()
            .map(|(idx, bodies)| {
                let sections = bodies
                    .into_iter()
                    .enumerate()
                    .map(|(section_idx, body)| Section::new(section_idx as u32 + 1, body))
                    .collect();
                Draft::new(format!("d{idx}"), sections)
            })
            .collect();
        let out = normalize_sections(&drafts, &AlignerConfig::default()).expect("normalizes");
        let expected = drafts.iter().map(|draft| draft.sections.len()).max().unwrap_or(0).max(1);
        prop_assert_eq!(out.len(), drafts.len());
        for (before, after) in drafts.iter().zip(&out) {
            prop_assert_eq!(after.sections.len(), expected);
            prop_assert_eq!(non_whitespace(before), non_whitespace(after));
            prop_assert_eq!(&before.draft_id, &after.draft_id);
        }
    }
}
