//! End-to-end summarization behavior against a stub collaborator

mod common;

use common::StubGenerator;
use memora::summary::{
    HierarchicalSummarizer, ScriptWeightedEstimator, SummarizeError, SummarizerConfig,
    TextChunker, TokenEstimator,
};

fn summarizer(stub: std::sync::Arc<StubGenerator>) -> HierarchicalSummarizer {
    HierarchicalSummarizer::new(stub, SummarizerConfig::default()).unwrap()
}

/// Words and CJK runs with punctuation removed
fn content_words(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || matches!(c, '.' | '!' | '?' | '。' | '！' | '？'))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn numbered_sections(count: usize) -> String {
    (0..count)
        .map(|i| format!("Section {} covers topic number {}.", i, i))
        .collect::<Vec<_>>()
        .join(" ")
}

#[test]
fn test_estimate_is_monotonic_under_concatenation() {
    let estimator = ScriptWeightedEstimator::default();
    let samples = ["", "a", "Buy milk.", "우유 사기", "会議は三時。", "mixed 한국어 text", "!!"];

    for a in samples {
        for b in samples {
            let joined = format!("{}{}", a, b);
            let total = estimator.estimate(&joined);
            assert!(total >= estimator.estimate(a), "{:?} + {:?}", a, b);
            assert!(total >= estimator.estimate(b), "{:?} + {:?}", a, b);
        }
    }
}

#[test]
fn test_short_text_is_not_split() {
    let chunker = TextChunker::default();
    let text = "  Buy milk.\nCall mom!  ";

    let chunks = chunker.split(text, 15_000);
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, text);
}

#[test]
fn test_chunks_respect_budget_when_sentences_fit() {
    let chunker = TextChunker::default();
    let text = (0..60)
        .map(|i| vec!["note"; i % 5 + 1].join(" "))
        .collect::<Vec<_>>()
        .join(". ");

    for budget in [8, 20, 60] {
        let chunks = chunker.split(&text, budget);
        assert!(chunks.len() > 1, "budget {}", budget);
        for chunk in &chunks {
            assert!(
                chunker.estimator().estimate(&chunk.text) <= budget,
                "chunk {} over budget {}",
                chunk.index,
                budget
            );
        }
    }
}

#[test]
fn test_split_preserves_content_in_order() {
    let chunker = TextChunker::default();
    let long_sentence = vec!["overflow"; 40].join(" ");
    let text = format!(
        "First point here. {}! 두 번째 문장입니다。 Final question?",
        long_sentence
    );

    let chunks = chunker.split(&text, 12);
    let rebuilt: Vec<String> = chunks.iter().flat_map(|c| content_words(&c.text)).collect();

    assert_eq!(rebuilt, content_words(&text));
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.index, i);
    }
}

#[tokio::test]
async fn test_single_sentence_makes_one_call() {
    let stub = StubGenerator::new().into_arc();
    let summarizer = summarizer(stub.clone());

    assert_eq!(summarizer.chunker().split("Buy milk.", 15_000).len(), 1);

    let summary = summarizer.summarize("Buy milk.", 200).await.unwrap();
    assert_eq!(summary.text, "- point from call 0");
    assert_eq!(summary.chunk_count, 1);
    assert!(!summary.is_degraded());
    assert_eq!(stub.calls(), 1);
    assert!(!stub.prompts()[0].contains("Section summaries:"));
}

#[tokio::test]
async fn test_long_cjk_text_issues_chunk_and_aggregate_calls() {
    let stub = StubGenerator::new()
        .with_aggregate_response("통합 요약: 회의 내용 정리")
        .into_arc();
    let summarizer = summarizer(stub.clone());

    let mut text = "会議の内容を確認しました。".repeat(3_846);
    text.push_str("메모");
    assert_eq!(text.chars().count(), 50_000);

    let budget = summarizer.config().budget.max_input_tokens;
    assert!(summarizer.estimate_tokens(&text) > budget);

    let chunks = summarizer.chunker().split(&text, budget);
    assert!(chunks.len() >= 2);
    for chunk in &chunks {
        assert!(chunk.token_estimate <= budget);
    }

    let summary = summarizer.summarize(&text, 200).await.unwrap();
    assert_eq!(summary.chunk_count, chunks.len());
    assert_eq!(stub.calls(), chunks.len() + 1);
    assert_eq!(summary.text, "회의 내용 정리");
}

#[test]
fn test_boundary_between_two_sentences() {
    let chunker = TextChunker::default();
    let estimator = chunker.estimator();
    assert!(estimator.estimate("A.") <= 1);
    assert!(estimator.estimate("B.") <= 1);
    assert_eq!(estimator.estimate("A. B."), 2);

    let texts: Vec<String> = chunker.split("A. B.", 1).into_iter().map(|c| c.text).collect();
    assert_eq!(texts, vec!["A", "B"]);
}

#[tokio::test]
async fn test_failed_chunk_is_replaced_by_excerpt() {
    let stub = StubGenerator::new()
        .failing_on(2)
        .with_aggregate_response("**Combined summary:** merged points")
        .into_arc();
    let summarizer = summarizer(stub.clone());
    let text = numbered_sections(4);

    let summary = summarizer.summarize_with_budget(&text, 200, 10).await.unwrap();

    assert_eq!(summary.chunk_count, 4);
    assert_eq!(summary.degraded_chunks, vec![2]);
    assert_eq!(summary.text, "merged points");
    assert_eq!(stub.calls(), 5);

    let aggregate_prompt = stub.prompts().pop().unwrap();
    assert!(aggregate_prompt.contains("Section 2 covers topic number 2..."));
    assert!(aggregate_prompt.contains("- point from call 3"));
}

#[tokio::test]
async fn test_failed_aggregation_is_terminal() {
    let stub = StubGenerator::new().failing_on(4).into_arc();
    let summarizer = summarizer(stub.clone());
    let text = numbered_sections(4);

    let err = summarizer.summarize_with_budget(&text, 200, 10).await.unwrap_err();
    assert!(matches!(err, SummarizeError::Aggregation { chunks: 4, .. }));
}

#[tokio::test]
async fn test_direct_failure_propagates() {
    let stub = StubGenerator::new().failing_on(0).into_arc();
    let summarizer = summarizer(stub.clone());

    let err = summarizer.summarize("Buy milk.", 200).await.unwrap_err();
    assert!(matches!(err, SummarizeError::Generation(_)));
    assert_eq!(stub.calls(), 1);
}

#[tokio::test]
async fn test_blank_input_rejected_without_calls() {
    let stub = StubGenerator::new().into_arc();
    let summarizer = summarizer(stub.clone());

    for text in ["", "   ", "\n\t"] {
        let err = summarizer.summarize(text, 200).await.unwrap_err();
        assert!(matches!(err, SummarizeError::EmptyInput));
    }
    assert_eq!(stub.calls(), 0);
}

#[tokio::test]
async fn test_chunk_prompts_share_requested_length() {
    let stub = StubGenerator::new().into_arc();
    let summarizer = summarizer(stub.clone());
    let text = numbered_sections(4);

    summarizer.summarize_with_budget(&text, 200, 10).await.unwrap();

    let prompts = stub.prompts();
    for prompt in &prompts[..4] {
        assert!(prompt.contains("at most 50 characters"));
    }
}
