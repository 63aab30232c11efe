//! Common test utilities for annoshard tests
//!
//! Provides a scratch environment with installed-looking profile databases,
//! reference tables, and fake gene-caller / profile-search executables written
//! as POSIX shell scripts.
#![allow(dead_code)]

use annoshard::core::config::Config;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Fake search: every protein hits every profile with e-value 1e-10; scores are
/// KEGG 50, Pfam 40, VOG 50, so VOG wins on the KEGG tie. `broken.hmm` fails.
const FAKE_SEARCH: &str = r##"#!/bin/sh
out=""
while [ $# -gt 2 ]; do
  case "$1" in
    --tblout) out="$2"; shift 2 ;;
    *) shift ;;
  esac
done
profile="$1"
proteins="$2"
name=$(basename "$profile" .hmm)
case "$name" in
  broken) echo "Error: failed to open binary auxfiles for $profile" >&2; exit 1 ;;
  kegg) score=50.0 ;;
  pfam) score=40.0 ;;
  *) score=50.0 ;;
esac
{
  echo "#                                                               --- full sequence ----"
  echo "# target name        accession  query name           accession    E-value  score  bias"
  echo "#------------------- ---------- -------------------- ---------- --------- ------ -----"
  grep '^>' "$proteins" | sed 's/^>//' | awk -v n="$name" -v s="$score" '{ print $1, "-", n "_q", n "_acc", "1e-10", s, "0.0" }'
  echo "#"
  echo "# [ok]"
} > "$out"
"##;

const FAKE_GENE_CALLER: &str = r##"#!/bin/sh
while [ $# -gt 0 ]; do
  case "$1" in
    -i) in="$2"; shift 2 ;;
    -a) faa="$2"; shift 2 ;;
    -d) ffn="$2"; shift 2 ;;
    -o) gff="$2"; shift 2 ;;
    -p|-f) shift 2 ;;
    *) shift ;;
  esac
done
grep '^>' "$in" | sed 's/^>//' | awk '{ printf(">%s_1 # 1 # 90 # 1 # ID=1_1\nMKVLAAGIVGLLLAQ\n>%s_2 # 100 # 200 # -1 # ID=1_2\nMSTNPKPQRKTKRNT\n", $1, $1) }' > "$faa"
grep '^>' "$in" | sed 's/^>//' | awk '{ printf(">%s_1 # 1 # 90 # 1 # ID=1_1\nATGAAAGTTCTG\n>%s_2 # 100 # 200 # -1 # ID=1_2\nATGAGCACCAAT\n", $1, $1) }' > "$ffn"
grep '^>' "$in" | sed 's/^>//' | awk '{ printf("%s\tProdigal\tCDS\t1\t90\t.\t+\t0\tID=1_1\n%s\tProdigal\tCDS\t100\t200\t.\t-\t0\tID=1_2\n", $1, $1) }' > "$gff"
"##;

/// Test environment that manages temporary directories and cleanup
pub struct TestEnvironment {
    temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Self {
        TestEnvironment {
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.temp_dir.path().join(relative)
    }

    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&path, contents).expect("Failed to write test file");
        path
    }

    /// Database folder with pressed-looking `kegg.hmm`, `pfam.hmm`, `vog.hmm` and `broken.hmm`
    pub fn database_dir(&self) -> PathBuf {
        let dir = self.path("databases");
        fs::create_dir_all(&dir).expect("Failed to create database dir");
        for name in ["kegg", "pfam", "vog", "broken"] {
            fs::write(dir.join(format!("{}.hmm", name)), "HMMER3/f\n").unwrap();
            fs::write(dir.join(format!("{}.hmm.h3f", name)), "").unwrap();
        }
        dir
    }

    /// Reference folder whose names, special-interest and pathway tables know the fake accessions
    pub fn aux_dir(&self) -> PathBuf {
        let dir = self.path("files");
        fs::create_dir_all(&dir).expect("Failed to create aux dir");
        fs::write(
            dir.join("VIBRANT_names.tsv"),
            "kegg_q\tfake kinase\npfam_acc\tfake domain\nvog_q\tfake phage protein\n",
        )
        .unwrap();
        fs::write(dir.join("VIBRANT_AMGs.tsv"), "KO\nkegg_q\n").unwrap();
        fs::write(
            dir.join("VIBRANT_categories.tsv"),
            "accession\tv-score\nvog_q\t80\nkegg_q\t25\n",
        )
        .unwrap();
        fs::write(
            dir.join("VIBRANT_KEGG_pathways_summary.tsv"),
            "map00010\tCarbohydrate metabolism\tGlycolysis\tkegg_q~K00134\nmap00240\tNucleotide metabolism\tPyrimidine metabolism\tkegg_q\n",
        )
        .unwrap();
        dir
    }

    #[cfg(unix)]
    fn executable(&self, name: &str, script: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = self.write(&format!("bin/{}", name), script);
        let mut permissions = fs::metadata(&path).unwrap().permissions();
        permissions.set_mode(0o755);
        fs::set_permissions(&path, permissions).unwrap();
        path
    }

    /// Configuration pointing at the fake tools and profiles
    #[cfg(unix)]
    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.tools.gene_caller = self
            .executable("fake-prodigal", FAKE_GENE_CALLER)
            .to_string_lossy()
            .to_string();
        config.tools.profile_search = self
            .executable("fake-hmmsearch", FAKE_SEARCH)
            .to_string_lossy()
            .to_string();
        config.databases.kegg.profile = "kegg.hmm".to_string();
        config.databases.pfam.profile = "pfam.hmm".to_string();
        config.databases.vog.profile = "vog.hmm".to_string();
        config
    }
}

/// `scaffolds` scaffolds named `phage <n>` with `per_scaffold` proteins each, in
/// gene-caller header style
pub fn protein_fasta(scaffolds: usize, per_scaffold: usize) -> String {
    let mut text = String::new();
    for s in 0..scaffolds {
        for p in 1..=per_scaffold {
            text.push_str(&format!(
                ">phage {}_{} # {} # {} # 1 # ID={}_{}\nMKVLAAGIVGLLLAQWERTYHKLPMSTNPK\n",
                s,
                p,
                p * 100,
                p * 100 + 90,
                s + 1,
                p
            ));
        }
    }
    text
}

/// `count` scaffolds named `scaffold <n> circular`
pub fn nucleotide_fasta(count: usize) -> String {
    let mut text = String::new();
    for i in 0..count {
        text.push_str(&format!(
            ">scaffold {} circular\nATGCGTACGTTAGCNNATGCATGCATGCATGCATTTAAACCCGGG\nATGCATGCATGCAAACCCGGGTTT\n",
            i
        ));
    }
    text
}

/// Tab-separated file as rows of fields
pub fn read_table(path: &Path) -> Vec<Vec<String>> {
    fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("cannot read {}: {}", path.display(), e))
        .lines()
        .map(|line| line.split('\t').map(str::to_string).collect())
        .collect()
}
