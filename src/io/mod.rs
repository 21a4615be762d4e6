//! 文件读写：频率表、FASTA（含比对后的 FASTA）与分类注释。
//!
//! 读取函数返回 `anyhow::Result` 并在错误上附带文件路径；写出函数只依赖
//! `std::io::Write`，由调用方决定目标。

pub mod abundance;
pub mod fasta;
pub mod taxonomy;

pub use abundance::{read_frequency_table, write_frequency_table, Layout};
pub use fasta::{read_alignment, read_sequences, write_fasta};
pub use taxonomy::{read_taxonomy, write_taxonomy_records, BlastColumns, TaxonomyDialect, TaxonomySource};
