//! Integration tests for the question-answering pipeline
//!
//! Runs the full Planner -> Retriever -> Summarizer -> Verifier flow against
//! deterministic backends; no Ollama or Qdrant required.

mod common;

use common::{
    planner_reply, FailingRetriever, FixtureRetriever, GroundedGenerator, UNSUPPORTED_CLAIM,
};
use ikms::agent::prompts::{RETRIEVAL_SYSTEM_PROMPT, SUMMARIZATION_SYSTEM_PROMPT};
use ikms::agent::NO_CONTEXT_FOUND;
use ikms::errors::QaError;
use ikms::retrieval::{Passage, NO_RELEVANT_CONTEXT};
use ikms::telemetry::MAX_RECENT_EVENTS;
use ikms::QaPipeline;
use std::sync::Arc;
use std::time::Duration;

fn passage(content: &str, page: u32) -> Passage {
    Passage::new(content).with_page(page)
}

#[tokio::test]
async fn test_answer_is_grounded_in_context() {
    let generator = Arc::new(GroundedGenerator::new(planner_reply(
        "Define the term, then cover scaling",
        &["vector database definition", "vector database scalability"],
    )));
    let retriever = Arc::new(
        FixtureRetriever::new()
            .with_passages(
                "vector database definition",
                vec![passage("A vector database stores embeddings", 3)],
            )
            .with_passages(
                "vector database scalability",
                vec![passage("Sharding spreads\nvectors across nodes", 7)],
            ),
    );

    let pipeline = QaPipeline::new(generator.clone(), retriever);
    let response = pipeline
        .answer("What is a vector database and how does it scale?")
        .await
        .unwrap();

    assert_eq!(
        response.context,
        "Chunk 1 (page=3): A vector database stores embeddings\n\n\
         Chunk 1 (page=7): Sharding spreads vectors across nodes"
    );
    assert!(response.answer.contains("A vector database stores embeddings"));
    assert!(response.answer.contains("Sharding spreads vectors across nodes"));
    assert!(!response.answer.contains(UNSUPPORTED_CLAIM));

    // The draft carried the unsupported claim; verification removed it
    let summarizer_inputs = generator.user_messages_for(SUMMARIZATION_SYSTEM_PROMPT);
    assert_eq!(summarizer_inputs.len(), 1);
    assert!(summarizer_inputs[0].starts_with(
        "Question: What is a vector database and how does it scale?\n\nContext:\nChunk 1"
    ));
}

#[tokio::test]
async fn test_unmarked_plan_answers_from_single_passage() {
    let question = "What is a vector database?";
    let generator = Arc::new(
        GroundedGenerator::new("Look up what a vector database is.").faithful(),
    );
    let retriever = Arc::new(FixtureRetriever::new().with_passages(
        question,
        vec![passage("A vector database stores embeddings.", 1)],
    ));

    let pipeline = QaPipeline::new(generator, retriever);
    let state = pipeline.run(question).await.unwrap();

    assert_eq!(state.plan(), Some(""));
    assert_eq!(state.sub_questions().unwrap(), [question.to_string()]);
    assert_eq!(
        state.context(),
        Some("Chunk 1 (page=1): A vector database stores embeddings.")
    );
    assert_eq!(state.answer(), Some("A vector database stores embeddings."));
}

#[tokio::test]
async fn test_missing_sub_questions_uses_question() {
    let question = "What does Qdrant store?";
    let generator = Arc::new(GroundedGenerator::new("Plan: look it up directly."));
    let retriever = Arc::new(
        FixtureRetriever::new().with_passages(question, vec![passage("Qdrant stores points", 1)]),
    );

    let pipeline = QaPipeline::new(generator.clone(), retriever);
    let state = pipeline.run(question).await.unwrap();

    assert_eq!(state.plan(), Some("look it up directly."));
    assert_eq!(state.sub_questions().unwrap(), [question.to_string()]);
    assert_eq!(
        generator.user_messages_for(RETRIEVAL_SYSTEM_PROMPT),
        vec![format!("Retrieve context for: {}", question)]
    );
    assert_eq!(state.context(), Some("Chunk 1 (page=1): Qdrant stores points"));
}

#[tokio::test]
async fn test_plan_parsed_from_markers() {
    let generator = Arc::new(GroundedGenerator::new("Plan:\nDo X\nSub-questions:\n- a\n- b"));
    let retriever = Arc::new(FixtureRetriever::new());

    let pipeline = QaPipeline::new(generator, retriever);
    let state = pipeline.run("original").await.unwrap();

    assert_eq!(state.plan(), Some("Do X"));
    assert_eq!(
        state.sub_questions().unwrap(),
        ["a".to_string(), "b".to_string()]
    );
}

#[tokio::test]
async fn test_merge_follows_submission_order() {
    let generator = Arc::new(GroundedGenerator::new(planner_reply("two parts", &["q1", "q2"])));
    let retriever = Arc::new(
        FixtureRetriever::new()
            .with_passages("q1", vec![passage("first fact", 1)])
            .with_passages("q2", vec![passage("second fact", 2)])
            .with_delay("q1", Duration::from_millis(150)),
    );

    let pipeline = QaPipeline::new(generator, retriever.clone());
    let state = pipeline.run("two-part question").await.unwrap();

    // q2 finished first, yet q1's contribution leads
    assert_eq!(retriever.completion_order(), vec!["q2", "q1"]);
    assert_eq!(
        state.context(),
        Some("Chunk 1 (page=1): first fact\n\nChunk 1 (page=2): second fact")
    );
}

#[tokio::test]
async fn test_sub_questions_run_concurrently() {
    let generator = Arc::new(GroundedGenerator::new(planner_reply(
        "three parts",
        &["a", "b", "c"],
    )));
    // Each search blocks until all three are in flight
    let retriever = Arc::new(FixtureRetriever::new().with_barrier(3));

    let pipeline = QaPipeline::new(generator, retriever);
    let state = tokio::time::timeout(Duration::from_secs(5), pipeline.run("q"))
        .await
        .expect("sub-question searches were not concurrent")
        .unwrap();

    assert!(state.is_complete());
}

#[tokio::test]
async fn test_no_tool_calls_yields_no_context_found() {
    let generator = Arc::new(GroundedGenerator::new(planner_reply("p", &["a"])).without_tool_calls());
    let retriever = Arc::new(FixtureRetriever::new());

    let pipeline = QaPipeline::new(generator, retriever.clone());
    let response = pipeline.answer("anything").await.unwrap();

    assert_eq!(response.context, NO_CONTEXT_FOUND);
    assert!(retriever.completion_order().is_empty());
}

#[tokio::test]
async fn test_empty_search_yields_no_relevant_context() {
    let generator = Arc::new(GroundedGenerator::new(planner_reply("p", &["unindexed topic"])));
    let retriever = Arc::new(FixtureRetriever::new());

    let pipeline = QaPipeline::new(generator, retriever);
    let response = pipeline.answer("anything").await.unwrap();

    assert_eq!(response.context, NO_RELEVANT_CONTEXT);
    assert_ne!(response.context, NO_CONTEXT_FOUND);
}

#[tokio::test]
async fn test_retrieval_failure_fails_run() {
    let generator = Arc::new(GroundedGenerator::new(planner_reply("p", &["a", "b"])));

    let pipeline = QaPipeline::new(generator.clone(), Arc::new(FailingRetriever));
    let result = pipeline.run("question").await;

    assert!(matches!(result, Err(QaError::RetrievalError(_))));
    // Nothing downstream of retrieval ran
    assert!(generator
        .user_messages_for(SUMMARIZATION_SYSTEM_PROMPT)
        .is_empty());
}

#[tokio::test]
async fn test_telemetry_covers_all_stages() {
    let generator = Arc::new(GroundedGenerator::new(planner_reply("p", &["a", "b"])));
    let retriever = Arc::new(
        FixtureRetriever::new()
            .with_passages("a", vec![passage("fact a", 1)])
            .with_passages("b", vec![passage("fact b", 2)]),
    );

    let pipeline = QaPipeline::new(generator, retriever);
    pipeline.run("q").await.unwrap();

    let stats = pipeline.telemetry().get_stats();
    assert_eq!(stats.stages_started, 4);
    assert_eq!(stats.stages_completed, 4);
    assert_eq!(stats.sub_questions_dispatched, 2);
    assert_eq!(stats.tools_executed, 2);
    assert_eq!(stats.tools_failed, 0);
}

#[tokio::test]
async fn test_telemetry_stays_bounded_across_runs() {
    let generator = Arc::new(GroundedGenerator::new(planner_reply("p", &["a", "b"])));
    let retriever = Arc::new(
        FixtureRetriever::new()
            .with_passages("a", vec![passage("fact a", 1)])
            .with_passages("b", vec![passage("fact b", 2)]),
    );
    let pipeline = QaPipeline::new(generator, retriever);

    let runs = 60;
    for _ in 0..runs {
        pipeline.run("q").await.unwrap();
    }

    let telemetry = pipeline.telemetry();
    let stats = telemetry.get_stats();
    assert_eq!(telemetry.event_count(), MAX_RECENT_EVENTS);
    assert_eq!(stats.stage_durations_ms.len(), 4);
    assert_eq!(stats.stages_completed, 4 * runs);
    assert_eq!(stats.sub_questions_dispatched, 2 * runs);
}
