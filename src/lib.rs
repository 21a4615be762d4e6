//! # artefact-rs
//!
//! 从 metabarcoding 丰度表中识别并合并人工序列（PCR / 测序错误产生的
//! artefact）。每个低丰度的 child 与排名在前的 parent 逐对比较，
//! 依次经过分类一致性、注释质量、样本共现与序列相似度检查，
//! 通过全部检查的 child 被并入其 parent（或 parent 的 root）。
//!
//! ## 快速示例
//!
//! ```rust
//! use artefact_rs::config::Params;
//! use artefact_rs::pipeline;
//! use artefact_rs::table::{AbundanceMatrix, AbundanceRow, Assignment, RankBy, SequenceStore, TaxonSet, TaxonomyTable};
//!
//! let samples = vec!["s1".to_string(), "s2".to_string()];
//! let matrix = AbundanceMatrix::new(
//!     samples,
//!     vec![AbundanceRow::new("z1", vec![120, 80]), AbundanceRow::new("z2", vec![3, 2])],
//!     RankBy::Total,
//! )
//! .unwrap();
//! let seqs = SequenceStore::from_records(vec![
//!     ("z1".to_string(), b"ACGTACGTACGTACGTACGT".to_vec()),
//!     ("z2".to_string(), b"ACGTACGTACGTACGTACGA".to_vec()),
//! ]);
//! let mut tax = TaxonomyTable::new();
//! tax.push("z1", Assignment::new("sp_A", 99.0, 100.0), "z1\tsp_A");
//! tax.push("z2", Assignment::new("sp_A", 97.0, 100.0), "z2\tsp_A");
//!
//! let set = TaxonSet::assemble(&matrix, Some(&seqs), Some(&tax)).unwrap();
//! let outcome = pipeline::run(&set, &Params::default());
//! assert_eq!(outcome.resolver.merged_count(), 1);
//! assert_eq!(outcome.surviving_rows(&set)[0].counts, vec![123, 82]);
//! ```
//!
//! ## 模块说明
//!
//! - [`table`]：丰度矩阵、序列、分类注释与合并后的 taxon 视图
//! - [`pipeline`]：成对判定流水线、合并解析器与进度回调
//! - [`align`]：Needleman–Wunsch / Smith–Waterman 与预计算比对
//! - [`audit`]：判定记录、详细 / 精简日志与汇总
//! - [`io`]：频率表、FASTA、BLAST / SINTAX 读写
//! - [`workflow`]：命令行使用的完整运行流程
//! - [`config`] / [`error`]：运行参数与错误类型

pub mod align;
pub mod audit;
pub mod config;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod table;
pub mod util;
pub mod workflow;
