//! End-to-end tests for pipeline runs with a scripted model client.

#[cfg(test)]
mod tests {
    use crate::config::{FailurePolicy, ParsingMode, PipelineConfig};
    use crate::core::{PipelineStage, RunState};
    use crate::errors::{ProviderError, StageError};
    use crate::events::{CollectingEventSink, PIPELINE_FAILED, STAGE_COMPLETED};
    use crate::pipeline::{ContractPipeline, StageGate};
    use crate::schemas::{RiskLevel, StageResult};
    use crate::testing::{
        assert_done, assert_failed_at, assert_prompt_contains_result, sample_document,
        sample_replies, scripted_except, scripted_happy_path, ScriptedModelClient, PARSING_REPLY,
        SAMPLE_CONTRACT,
    };
    use crate::text::chunk_text;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;

    fn pipeline(client: &Arc<ScriptedModelClient>) -> ContractPipeline {
        ContractPipeline::new(client.clone())
    }

    #[derive(Debug)]
    struct DeclineAt(PipelineStage);

    #[async_trait]
    impl StageGate for DeclineAt {
        async fn should_proceed(&self, next: PipelineStage, _completed: &[StageResult]) -> bool {
            next != self.0
        }
    }

    #[tokio::test]
    async fn test_happy_path_runs_every_stage_once() {
        let client = Arc::new(scripted_happy_path());
        let run = pipeline(&client).run(sample_document()).await;

        assert_done(&run);
        assert_eq!(client.call_count(), PipelineStage::COUNT);
        assert_eq!(run.model_calls(), PipelineStage::COUNT);
        assert_eq!(run.timings().len(), PipelineStage::COUNT);
        assert!(run.failed_stage().is_none());

        let tags: Vec<Option<String>> = client.requests().into_iter().map(|r| r.tag).collect();
        let expected: Vec<Option<String>> = PipelineStage::ALL
            .iter()
            .map(|s| Some(s.name().to_string()))
            .collect();
        assert_eq!(tags, expected);
    }

    #[tokio::test]
    async fn test_each_prompt_embeds_previous_result_verbatim() {
        let client = Arc::new(scripted_happy_path());
        let document = sample_document();
        let run = pipeline(&client).run(Arc::clone(&document)).await;
        assert_done(&run);

        let parsing_prompt = client.last_prompt(PipelineStage::Parsing).unwrap();
        assert!(parsing_prompt.contains(&document.normalized_text()));

        for stage in &PipelineStage::ALL[1..] {
            let prompt = client.last_prompt(*stage).unwrap();
            let previous = stage.previous().unwrap();
            assert_prompt_contains_result(&prompt, &run, previous);
        }
    }

    #[tokio::test]
    async fn test_termination_clause_scenario() {
        let client = Arc::new(scripted_happy_path());
        let run = pipeline(&client).run(sample_document()).await;

        assert_eq!(run.state(), RunState::Done);
        assert_eq!(run.results().len(), 5);

        let entities = run.result(PipelineStage::Ner).and_then(StageResult::as_entities).unwrap();
        let duration = entities.find("DURATION", "30 days").unwrap();
        assert_eq!(duration.clause_index, Some(1));

        let summary_prompt = client.last_prompt(PipelineStage::Summarization).unwrap();
        for stage in &PipelineStage::ALL[..4] {
            assert_prompt_contains_result(&summary_prompt, &run, *stage);
        }

        let summary = run
            .result(PipelineStage::Summarization)
            .and_then(StageResult::as_summary)
            .unwrap();
        assert_eq!(summary.risk_level, Some(RiskLevel::Low));
    }

    #[tokio::test]
    async fn test_provider_error_at_ner_keeps_two_results() {
        let client = Arc::new(
            scripted_except(PipelineStage::Ner)
                .fail(PipelineStage::Ner, ProviderError::network("connection reset")),
        );
        let run = pipeline(&client).run(sample_document()).await;

        assert_failed_at(&run, PipelineStage::Ner, 2);
        assert_eq!(
            run.error().and_then(StageError::as_provider),
            Some(&ProviderError::network("connection reset"))
        );
        assert!(client.requests_for(PipelineStage::ClauseGeneration).is_empty());
        assert!(client.requests_for(PipelineStage::Summarization).is_empty());

        let err = run.into_result().unwrap_err();
        assert_eq!(err.stage, PipelineStage::Ner);
        assert_eq!(err.partial_results.len(), 2);
    }

    #[tokio::test]
    async fn test_parse_failure_appends_nothing_for_the_stage() {
        let raw = "I could not find any clauses in this document.";
        let client = Arc::new(
            ScriptedModelClient::new()
                .reply(PipelineStage::Parsing, PARSING_REPLY)
                .reply(PipelineStage::ClauseExtraction, raw),
        );
        let run = pipeline(&client).run(sample_document()).await;

        assert_failed_at(&run, PipelineStage::ClauseExtraction, 1);
        let parse = run.error().and_then(StageError::as_parse).unwrap();
        assert_eq!(parse.stage, PipelineStage::ClauseExtraction);
        assert_eq!(parse.raw_response, raw);
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn test_runs_serialize_identically() {
        let client = Arc::new(scripted_happy_path());
        let pipeline = pipeline(&client);

        let first = pipeline.run(sample_document()).await;
        let second = pipeline.run(sample_document()).await;

        assert_ne!(first.run_id(), second.run_id());
        assert_eq!(
            first.output().to_json().unwrap(),
            second.output().to_json().unwrap()
        );
    }

    #[tokio::test]
    async fn test_failed_runs_serialize_identically() {
        let client = Arc::new(
            scripted_except(PipelineStage::Summarization)
                .reply(PipelineStage::Summarization, "   "),
        );
        let pipeline = pipeline(&client);

        let first = pipeline.run(sample_document()).await.output();
        let second = pipeline.run(sample_document()).await.output();

        assert_eq!(first.status, RunState::Failed);
        assert_eq!(first.failed_stage, Some(PipelineStage::Summarization));
        assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
    }

    #[tokio::test]
    async fn test_discard_partial_policy() {
        let client = Arc::new(
            scripted_except(PipelineStage::ClauseGeneration)
                .fail(PipelineStage::ClauseGeneration, ProviderError::auth("expired key")),
        );
        let run = pipeline(&client)
            .with_config(PipelineConfig::new().with_failure_policy(FailurePolicy::DiscardPartial))
            .run(sample_document())
            .await;

        assert_failed_at(&run, PipelineStage::ClauseGeneration, 0);
        let report = run.report();
        assert!(!report.is_success());
        assert!(report.document.is_none());
    }

    #[tokio::test]
    async fn test_gate_decline_halts_before_the_stage() {
        let client = Arc::new(scripted_happy_path());
        let run = pipeline(&client)
            .with_gate(Arc::new(DeclineAt(PipelineStage::ClauseGeneration)))
            .run(sample_document())
            .await;

        assert_failed_at(&run, PipelineStage::ClauseGeneration, 3);
        assert_eq!(
            run.error(),
            Some(&StageError::Declined {
                stage: PipelineStage::ClauseGeneration
            })
        );
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stage_timeout_fails_as_provider_timeout() {
        let client = Arc::new(
            scripted_happy_path().delay(PipelineStage::ClauseExtraction, Duration::from_secs(300)),
        );
        let run = pipeline(&client)
            .with_config(PipelineConfig::new().with_stage_timeout(10.0))
            .run(sample_document())
            .await;

        assert_failed_at(&run, PipelineStage::ClauseExtraction, 1);
        assert_eq!(
            run.error().and_then(StageError::as_provider),
            Some(&ProviderError::Timeout { timeout_ms: 10_000 })
        );
    }

    #[tokio::test]
    async fn test_events_for_complete_run() {
        let client = Arc::new(scripted_happy_path());
        let sink = Arc::new(CollectingEventSink::new());
        let run = pipeline(&client)
            .with_event_sink(sink.clone())
            .run(sample_document())
            .await;
        assert_done(&run);

        let mut expected = vec!["pipeline.started".to_string()];
        for _ in PipelineStage::ALL {
            expected.push("stage.started".to_string());
            expected.push("stage.completed".to_string());
        }
        expected.push("pipeline.completed".to_string());
        assert_eq!(sink.event_types(), expected);

        let completed = sink.payloads(STAGE_COMPLETED);
        let run_id = run.run_id().to_string();
        for (payload, stage) in completed.iter().zip(PipelineStage::ALL) {
            assert_eq!(payload["stage"], stage.name());
            assert_eq!(payload["run_id"], run_id.as_str());
            assert_eq!(payload["index"], stage.index());
            assert_eq!(payload["result"]["stage"], stage.name());
        }
    }

    #[tokio::test]
    async fn test_events_for_failed_run() {
        let client = Arc::new(
            scripted_except(PipelineStage::Ner)
                .fail(PipelineStage::Ner, ProviderError::rate_limited(None)),
        );
        let sink = Arc::new(CollectingEventSink::new());
        let run = pipeline(&client)
            .with_event_sink(sink.clone())
            .run(sample_document())
            .await;
        assert!(run.is_failed());

        assert_eq!(
            sink.event_types(),
            vec![
                "pipeline.started",
                "stage.started",
                "stage.completed",
                "stage.started",
                "stage.completed",
                "stage.started",
                "stage.failed",
                "pipeline.failed",
            ]
        );
        let payloads = sink.payloads(PIPELINE_FAILED);
        let failed = &payloads[0];
        assert_eq!(failed["failed_stage"], "NER");
        assert_eq!(failed["completed"], 2);
        assert_eq!(failed["results"], 2);
    }

    #[tokio::test]
    async fn test_chunked_parsing_merges_metadata() {
        let document = sample_document();
        let expected_chunks = chunk_text(&document.normalized_text(), 60, 0).len();
        assert!(expected_chunks > 1);

        let scripted = ScriptedModelClient::new()
            .reply(
                PipelineStage::Parsing,
                r#"{"contract_title": "Master Services Agreement",
                    "parties_involved": [{"party_name": "Acme Corp", "role": "Provider"}]}"#,
            )
            .reply(
                PipelineStage::Parsing,
                r#"{"contract_title": "Payment Schedule", "contract_date": "2025-01-15",
                    "parties_involved": [{"party_name": "ACME CORP", "role": "provider"},
                                         {"party_name": "Globex LLC", "role": "Client"}]}"#,
            );
        let client = Arc::new(
            sample_replies()
                .into_iter()
                .skip(1)
                .fold(scripted, |c, (stage, reply)| c.reply(stage, reply)),
        );

        let run = pipeline(&client)
            .with_config(PipelineConfig::new().with_parsing_mode(ParsingMode::Chunked {
                chunk_size: 60,
                overlap: 0,
            }))
            .run(Arc::clone(&document))
            .await;

        assert_done(&run);
        assert_eq!(client.requests_for(PipelineStage::Parsing).len(), expected_chunks);
        assert_eq!(run.model_calls(), expected_chunks + 4);

        let parsed = run.result(PipelineStage::Parsing).and_then(StageResult::as_parsed).unwrap();
        assert_eq!(parsed.contract_title.as_deref(), Some("Master Services Agreement"));
        assert_eq!(parsed.contract_date.as_deref(), Some("2025-01-15"));
        assert_eq!(parsed.parties_involved.len(), 2);

        let first_chunk_prompt = &client.requests_for(PipelineStage::Parsing)[0].prompt;
        assert!(first_chunk_prompt.contains(&format!("chunk 1 of {expected_chunks}")));
    }

    #[tokio::test]
    async fn test_report_combines_results() {
        let client = Arc::new(scripted_happy_path());
        let response = pipeline(&client).analyze(sample_document()).await;

        assert!(response.is_success());
        let report = response.document.unwrap();
        assert_eq!(report.source_name.as_deref(), Some("services-agreement.txt"));
        assert_eq!(report.contract_title.as_deref(), Some("Master Services Agreement"));
        assert_eq!(report.clauses.len(), 3);
        assert_eq!(report.suggestions.len(), 1);
        assert!(report.amounts.contains(&"$5,000".to_string()));
        assert_eq!(report.risk_level, Some(RiskLevel::Low));
    }

    #[tokio::test]
    async fn test_concurrent_runs_share_one_client() {
        let client = Arc::new(scripted_happy_path());
        let pipeline = pipeline(&client);

        let (a, b) = tokio::join!(
            pipeline.run(sample_document()),
            pipeline.run_text(SAMPLE_CONTRACT)
        );

        assert_done(&a);
        assert_done(&b);
        assert_eq!(client.call_count(), 2 * PipelineStage::COUNT);
        assert_eq!(a.output().results, b.output().results);
    }
}
