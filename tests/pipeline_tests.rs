//! End-to-end runs against fake gene-caller and profile-search executables
#![cfg(unix)]

mod common;

use annoshard::bio::SequenceType;
use annoshard::core::hits::Database;
use annoshard::core::paths::OutputLayout;
use annoshard::tools::Phase;
use annoshard::{AnnoshardError, Pipeline, PipelineOptions};
use common::{nucleotide_fasta, protein_fasta, read_table, TestEnvironment};
use pretty_assertions::assert_eq;
use std::fs;

fn options(env: &TestEnvironment, input: &str, sequence_type: SequenceType, workers: usize) -> PipelineOptions {
    let mut options = PipelineOptions::new(env.path(input), sequence_type);
    options.output_dir = Some(env.path("results"));
    options.workers = workers;
    options.database_dir = Some(env.database_dir());
    options.aux_dir = Some(env.aux_dir());
    options.config = env.config();
    options.command_line = "annoshard annotate".to_string();
    options
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_protein_run_produces_every_report() {
    let env = TestEnvironment::new();
    env.write("phages.faa", &protein_fasta(3, 2));

    let summary = Pipeline::new(options(&env, "phages.faa", SequenceType::Protein, 2))
        .run()
        .unwrap();
    assert!(summary.is_clean(), "unexpected failures: {:?}", summary.failures);
    assert!(summary.shards >= 1 && summary.shards <= 2);
    assert_eq!(summary.proteins, 6);
    assert_eq!(summary.special_interest, 6);

    let layout = OutputLayout::new(env.path("results"), "phages");

    let best = read_table(&layout.best_annotations());
    assert_eq!(best[0], strings(&["protein", "scaffold", "accession", "name", "evalue", "score"]));
    let proteins: Vec<&str> = best[1..].iter().map(|row| row[0].as_str()).collect();
    assert_eq!(
        proteins,
        vec!["phage 0_1", "phage 0_2", "phage 1_1", "phage 1_2", "phage 2_1", "phage 2_2"]
    );
    // Pfam loses to KEGG, then VOG ties KEGG and takes over
    assert_eq!(
        best[1],
        strings(&["phage 0_1", "phage 0", "vog_q", "fake phage protein", "1e-10", "50"])
    );

    let full = read_table(&layout.full_annotations());
    assert_eq!(full[0].len(), 18);
    assert_eq!(
        full[3],
        strings(&[
            "phage 1_1", "phage 1", "kegg_q", "AMG", "fake kinase", "1e-10", "50", "0.25",
            "pfam_acc", "fake domain", "1e-10", "40", "0",
            "vog_q", "fake phage protein", "1e-10", "50", "0.8",
        ])
    );

    // The special-interest table reports the KEGG hit even though VOG won
    let individuals = read_table(&layout.special_individuals());
    assert_eq!(individuals.len(), 7);
    assert_eq!(
        individuals[6],
        strings(&["phage 2_2", "phage 2", "kegg_q", "fake kinase", "1e-10", "50"])
    );

    let counts = read_table(&layout.special_counts());
    assert_eq!(
        counts,
        vec![
            strings(&["AMG count", "AMG KO", "AMG KO name"]),
            strings(&["6", "kegg_q", "fake kinase"]),
        ]
    );

    let pathways = read_table(&layout.special_pathways());
    assert_eq!(pathways.len(), 3);
    assert_eq!(
        pathways[1],
        strings(&["map00010", "Carbohydrate metabolism", "Glycolysis", "6", "kegg_q"])
    );
    assert_eq!(pathways[2][2], "Pyrimidine metabolism");

    let pfam = read_table(&layout.search_results(Database::Pfam));
    assert_eq!(pfam[0], strings(&["protein", "accession", "evalue", "score"]));
    assert_eq!(pfam[1], strings(&["phage 0_1", "pfam_acc", "1e-10", "40"]));
    assert_eq!(pfam.len(), 7);

    for transient in layout.transient_dirs() {
        assert!(!transient.exists(), "{} should be removed", transient.display());
    }
    assert!(!layout.gene_calls_dir().exists());

    let log = fs::read_to_string(layout.run_log()).unwrap();
    assert!(log.starts_with("Command:   annoshard annotate\n"));
    assert!(log.contains("Failures:  0\n"));
}

#[test]
fn test_nucleotide_run_merges_gene_calls() {
    let env = TestEnvironment::new();
    env.write("contigs.fna", &nucleotide_fasta(3));

    let summary = Pipeline::new(options(&env, "contigs.fna", SequenceType::Nucleotide, 3))
        .run()
        .unwrap();
    assert!(summary.is_clean(), "unexpected failures: {:?}", summary.failures);
    assert_eq!(summary.proteins, 6);

    let layout = OutputLayout::new(env.path("results"), "contigs");
    let best = read_table(&layout.best_annotations());
    assert_eq!(best.len(), 7);
    assert_eq!(best[1][0], "scaffold 0 circular_1");
    assert_eq!(best[1][1], "scaffold 0 circular");
    assert_eq!(best[6][0], "scaffold 2 circular_2");

    let proteins = fs::read_to_string(layout.gene_calls("faa")).unwrap();
    assert!(proteins.starts_with(">scaffold 0 circular_1 # 1 # 90 # 1 # ID=1_1\n"));
    assert!(!proteins.contains("$~&"));
    assert_eq!(proteins.matches('>').count(), 6);

    let coordinates = read_table(&layout.gene_calls("gff"));
    assert_eq!(coordinates.len(), 6);
    assert_eq!(coordinates[0][0], "scaffold 0 circular");
    assert!(layout.gene_calls("ffn").exists());

    for transient in layout.transient_dirs() {
        assert!(!transient.exists());
    }
}

#[test]
fn test_failed_search_is_reported_not_fatal() {
    let env = TestEnvironment::new();
    env.write("phages.faa", &protein_fasta(4, 3));

    let mut options = options(&env, "phages.faa", SequenceType::Protein, 2);
    options.config.databases.vog.profile = "broken.hmm".to_string();
    let summary = Pipeline::new(options).run().unwrap();

    let search_failures: Vec<_> = summary
        .failures
        .iter()
        .filter(|r| r.phase == Phase::ProfileSearch)
        .collect();
    assert_eq!(search_failures.len(), summary.shards);
    for failure in &search_failures {
        assert_eq!(failure.unit.database, Some(Database::Vog));
        assert!(failure.to_string().contains("exited with code 1"));
        assert!(failure.to_string().contains("failed to open"));
    }

    let layout = OutputLayout::new(env.path("results"), "phages");
    let best = read_table(&layout.best_annotations());
    assert_eq!(best.len(), 13);
    // Without VOG, KEGG keeps the win over the lower Pfam score
    assert!(best[1..].iter().all(|row| row[2] == "kegg_q"));

    let full = read_table(&layout.full_annotations());
    assert!(full[1][13..].iter().all(|field| field.is_empty()));

    let log = fs::read_to_string(layout.run_log()).unwrap();
    assert!(log.contains("profile search shard_0 VOG: exited with code 1"));
}

#[test]
fn test_format_error_leaves_nothing_behind() {
    let env = TestEnvironment::new();
    env.write("phages.faa", &protein_fasta(2, 2));

    let result = Pipeline::new(options(&env, "phages.faa", SequenceType::Nucleotide, 2)).run();
    assert!(matches!(result, Err(AnnoshardError::Format(_))));
    assert!(!env.path("results").exists());
}

#[test]
fn test_existing_output_folder_is_rejected() {
    let env = TestEnvironment::new();
    env.write("phages.faa", &protein_fasta(2, 2));
    env.write("results/keep.txt", "previous run");

    let result = Pipeline::new(options(&env, "phages.faa", SequenceType::Protein, 1)).run();
    match result {
        Err(AnnoshardError::Precondition(msg)) => assert!(msg.contains("already exists")),
        other => panic!("expected precondition error, got {:?}", other.map(|s| s.shards)),
    }
    assert_eq!(fs::read_to_string(env.path("results/keep.txt")).unwrap(), "previous run");
}

#[test]
fn test_concurrency_cap_gives_same_tables() {
    let env = TestEnvironment::new();
    env.write("phages.faa", &protein_fasta(8, 2));

    let mut options = options(&env, "phages.faa", SequenceType::Protein, 4);
    options.config.pipeline.max_concurrent_workers = Some(1);
    let summary = Pipeline::new(options).run().unwrap();
    assert!(summary.is_clean());
    assert_eq!(summary.proteins, 16);

    let layout = OutputLayout::new(env.path("results"), "phages");
    let best = read_table(&layout.best_annotations());
    assert_eq!(best[16][0], "phage 7_2");
}

#[test]
fn test_ten_thousand_proteins_four_workers() {
    let env = TestEnvironment::new();
    let text = protein_fasta(2_000, 5);
    env.write("phages.faa", &text);

    let summary = Pipeline::new(options(&env, "phages.faa", SequenceType::Protein, 4))
        .run()
        .unwrap();
    assert!(summary.is_clean(), "unexpected failures: {:?}", summary.failures);
    assert_eq!(summary.shards, 4);
    assert_eq!(summary.proteins, 10_000);

    // Shards are contiguous slices, so shard-then-input order is input order
    let expected: Vec<String> = text
        .lines()
        .filter_map(|l| l.strip_prefix('>'))
        .map(|h| h.split(" # ").next().unwrap_or(h).to_string())
        .collect();
    let layout = OutputLayout::new(env.path("results"), "phages");
    let best = read_table(&layout.best_annotations());
    assert_eq!(best.len(), 10_001);
    let proteins: Vec<String> = best[1..].iter().map(|row| row[0].clone()).collect();
    assert_eq!(proteins, expected);
    assert!(best[1..].iter().all(|row| row[2] == "vog_q"));
}
