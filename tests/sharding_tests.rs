/// Tests for byte-balanced sharding of nucleotide and protein input
///
/// These tests check:
/// - The shard count never exceeds the worker count
/// - Every shard except the last reaches the byte target
/// - Proteins of one scaffold are never split across shards
/// - Record order is preserved across the concatenated shards
mod common;

use annoshard::bio::fasta::read_headers;
use annoshard::bio::sequence::{encode_whitespace, gene_call_id, group_id};
use annoshard::bio::SequenceType;
use annoshard::core::sharder::{ShardSet, Sharder};
use common::{nucleotide_fasta, protein_fasta, TestEnvironment};
use rstest::rstest;
use std::collections::HashMap;
use std::fs;

fn shard(env: &TestEnvironment, name: &str, text: &str, sequence_type: SequenceType, workers: usize) -> ShardSet {
    let input = env.write(name, text);
    let dir = env.path("split_files");
    fs::create_dir_all(&dir).unwrap();
    Sharder::new(&dir, workers)
        .unwrap()
        .shard(&input, sequence_type)
        .unwrap()
}

fn all_headers(set: &ShardSet) -> Vec<(usize, String)> {
    set.shards
        .iter()
        .flat_map(|s| {
            read_headers(&s.path)
                .unwrap()
                .into_iter()
                .map(move |h| (s.index, h))
        })
        .collect()
}

#[test]
fn test_ten_thousand_proteins_fill_four_shards() {
    let env = TestEnvironment::new();
    let set = shard(&env, "big.faa", &protein_fasta(2_000, 5), SequenceType::Protein, 4);

    assert_eq!(set.len(), 4);
    assert_eq!(set.total_records(), 10_000);
    let indexes: Vec<usize> = set.shards.iter().map(|s| s.index).collect();
    assert_eq!(indexes, vec![0, 1, 2, 3]);

    for shard in &set.shards[..set.len() - 1] {
        assert!(
            shard.bytes >= set.target_bytes,
            "{} has {} bytes, target {}",
            shard.name,
            shard.bytes,
            set.target_bytes
        );
    }
}

#[test]
fn test_scaffold_never_split() {
    let env = TestEnvironment::new();
    let set = shard(&env, "proteins.faa", &protein_fasta(37, 7), SequenceType::Protein, 5);

    let mut owner: HashMap<String, usize> = HashMap::new();
    for (index, header) in all_headers(&set) {
        let group = group_id(&header).to_string();
        let previous = owner.insert(group.clone(), index);
        assert!(
            previous.is_none() || previous == Some(index),
            "scaffold {} found in shards {:?} and {}",
            group,
            previous,
            index
        );
    }
    assert_eq!(owner.len(), 37);
}

#[test]
fn test_order_preserved_and_headers_normalized() {
    let env = TestEnvironment::new();
    let text = protein_fasta(10, 3);
    let set = shard(&env, "proteins.faa", &text, SequenceType::Protein, 3);

    let expected: Vec<String> = text
        .lines()
        .filter_map(|l| l.strip_prefix('>'))
        .map(|h| encode_whitespace(gene_call_id(h)))
        .collect();
    let actual: Vec<String> = all_headers(&set).into_iter().map(|(_, h)| h).collect();
    assert_eq!(actual, expected);
}

#[rstest]
#[case(1, 1)]
#[case(2, 2)]
#[case(4, 4)]
#[case(50, 20)]
fn test_nucleotide_shard_count(#[case] workers: usize, #[case] expected: usize) {
    let env = TestEnvironment::new();
    let set = shard(&env, "contigs.fna", &nucleotide_fasta(20), SequenceType::Nucleotide, workers);
    assert_eq!(set.len(), expected);
    assert_eq!(set.total_records(), 20);
    assert_eq!(set.sequence_type, SequenceType::Nucleotide);
}

#[test]
fn test_nucleotide_headers_encoded() {
    let env = TestEnvironment::new();
    let set = shard(&env, "contigs.fna", &nucleotide_fasta(4), SequenceType::Nucleotide, 2);
    let headers: Vec<String> = all_headers(&set).into_iter().map(|(_, h)| h).collect();
    assert_eq!(headers[0], "scaffold$~&0$~&circular");
    assert!(headers.iter().all(|h| !h.contains(' ')));
    assert!(set.shards.iter().all(|s| s.path.extension().unwrap() == "fna"));
}
