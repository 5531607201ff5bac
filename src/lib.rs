//! snpdb - variant-effect database and browser backend.
//!
//! Imports tab-separated variant-effect tables and GTF gene annotations into
//! SQLite and serves them over a read-only REST API.
//!
//! # Features
//!
//! - Parse TSV and GTF files (with gzip support)
//! - Parallel batch import with per-row error isolation
//! - Nearest-gene lookup with exon/intron/intergenic classification
//! - Genome-browser windows in 0-based half-open coordinates
//! - Paginated listing and `chrom:pos` / rs-id search
//!
//! # Example
//!
//! ```ignore
//! use snpdb::resolver::find_nearest_gene;
//! use snpdb::store::Database;
//!
//! let db = Database::open("snpdb.sqlite")?;
//! let nearest = find_nearest_gene(&*db.connection(), "1", 15449431)?;
//! ```

pub mod api;
pub mod config;
pub mod import;
pub mod parser;
pub mod resolver;
pub mod store;
pub mod types;

pub use config::{Config, ImportConfig};
pub use store::Database;
pub use types::{Gene, GeneRegion, Location, NearestGene, Strand, Transcript, Variant};
