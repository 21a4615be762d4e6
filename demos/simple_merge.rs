//! 演示如何在 library 模式下使用 artefact-rs 识别并合并 artefact 序列。
//!
//! 运行方式：
//! ```bash
//! cargo run --example simple_merge
//! ```

use artefact_rs::audit::RunHeader;
use artefact_rs::config::{Method, Params};
use artefact_rs::pipeline::DecisionPipeline;
use artefact_rs::pipeline::SilentReporter;
use artefact_rs::table::{AbundanceMatrix, AbundanceRow, Assignment, RankBy, SequenceStore, TaxonSet, TaxonomyTable};

fn main() -> anyhow::Result<()> {
    // 1. 丰度表：三个样本，z2 是 z1 的单碱基变体，z3 是独立物种
    let samples: Vec<String> = ["lake_1", "lake_2", "neg_ctrl"].iter().map(|s| s.to_string()).collect();
    let matrix = AbundanceMatrix::new(
        samples,
        vec![
            AbundanceRow::new("z1", vec![900, 450, 0]),
            AbundanceRow::new("z2", vec![12, 4, 3]),
            AbundanceRow::new("z3", vec![0, 300, 0]),
        ],
        RankBy::Total,
    )?;

    // 2. 序列与分类注释
    let z1 = b"TTAGATACCCCACTATGCTTAGCCCTAAACCTCAACAGTTAAATCAACAAAACTGCT".to_vec();
    let mut z2 = z1.clone();
    z2[20] = b'G';
    let z3 = b"TTAGATACCCCACTATGCCTAGCCGTAAACTTTGATAGTTCAATTAACAAAATTAT".to_vec();
    let seqs = SequenceStore::from_records(vec![("z1".to_string(), z1), ("z2".to_string(), z2), ("z3".to_string(), z3)]);

    let mut tax = TaxonomyTable::new();
    tax.push("z1", Assignment::new("Salmo trutta", 100.0, 100.0), "z1\tSalmo trutta\t100\t100");
    tax.push("z2", Assignment::new("Salmo trutta", 98.3, 100.0), "z2\tSalmo trutta\t98.3\t100");
    tax.push("z3", Assignment::new("Perca fluviatilis", 100.0, 100.0), "z3\tPerca fluviatilis\t100\t100");

    let set = TaxonSet::assemble(&matrix, Some(&seqs), Some(&tax))?;
    println!("taxa: {}, samples: {}", set.len(), set.samples.len());

    // 3. 运行：排除阴性对照样本
    let params = Params {
        method: Method::TaxonDependent,
        exclude: vec!["neg*".to_string()],
        ..Params::default()
    };
    params.validate()?;
    let mut pipeline = DecisionPipeline::new(&set, &params).recording(true);
    let excluded = pipeline.excluded_samples();
    let outcome = pipeline.run(&mut SilentReporter);

    // 4. 输出
    let summary = outcome.summary(&set);
    print!("{}", summary);
    for row in outcome.surviving_rows(&set) {
        println!("{}\t{:?}", row.id, row.counts);
    }

    let header = RunHeader::new(&params, excluded, "simple_merge".to_string());
    let mut log = Vec::new();
    outcome.audit.write_condensed(&mut log, &header, &summary, &set.taxa)?;
    println!("\n{}", String::from_utf8_lossy(&log));
    Ok(())
}
