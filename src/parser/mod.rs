//! Parsers for the imported file formats and for search queries.

pub mod gtf;
pub mod locus;
pub mod tsv;
pub mod util;

pub use gtf::{parse_gtf, GtfData};
pub use locus::parse_locus;
pub use tsv::{VariantReader, VariantRow};
pub use util::normalize_chrom;
