//! Benchmarks for prompt composition and reply parsing.

use clauseflow::core::PipelineStage;
use clauseflow::prompts::PromptBuilder;
use clauseflow::schemas::{parse_list_reply, ClauseSet, SchemaHint, StageResult};
use clauseflow::stages::standard_stages;
use clauseflow::testing::{sample_replies, CLAUSE_EXTRACTION_REPLY, SAMPLE_CONTRACT};
use clauseflow::text::{chunk_text, normalize_text};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn text_benchmark(c: &mut Criterion) {
    let long = SAMPLE_CONTRACT.repeat(50);

    c.bench_function("normalize_text", |b| b.iter(|| normalize_text(black_box(&long))));

    let normalized = normalize_text(&long);
    c.bench_function("chunk_text", |b| {
        b.iter(|| chunk_text(black_box(&normalized), 2000, 500))
    });
}

fn prompt_benchmark(c: &mut Criterion) {
    let normalized = normalize_text(SAMPLE_CONTRACT);
    let results: Vec<StageResult> = standard_stages()
        .iter()
        .zip(sample_replies())
        .filter_map(|(stage, (_, reply))| stage.parse_response(reply).ok())
        .collect();

    c.bench_function("summarization_prompt", |b| {
        b.iter(|| {
            let mut builder =
                PromptBuilder::new(PipelineStage::Summarization).contract_text(&normalized);
            for result in &results[..4] {
                builder = builder.prior_result(black_box(result)).ok()?;
            }
            Some(builder.build(SchemaHint::json("ContractSummary", "summary")))
        })
    });
}

fn reply_benchmark(c: &mut Criterion) {
    c.bench_function("parse_clause_reply", |b| {
        b.iter(|| {
            parse_list_reply::<ClauseSet>(
                PipelineStage::ClauseExtraction,
                black_box(CLAUSE_EXTRACTION_REPLY),
                "clauses",
            )
        })
    });

    let stages = standard_stages();
    c.bench_function("parse_all_sample_replies", |b| {
        b.iter(|| {
            for (stage, (_, reply)) in stages.iter().zip(sample_replies()) {
                let _ = black_box(stage.parse_response(reply));
            }
        })
    });
}

criterion_group!(benches, text_benchmark, prompt_benchmark, reply_benchmark);
criterion_main!(benches);
