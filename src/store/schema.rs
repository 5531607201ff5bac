//! Table definitions.

use rusqlite::Connection;

/// Tables that must exist for the API to serve requests.
pub const REQUIRED_TABLES: [&str; 7] = [
    "variants",
    "targets",
    "effects",
    "genes",
    "transcripts",
    "exons",
    "import_log",
];

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS variants (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    chrom TEXT NOT NULL,
    pos INTEGER NOT NULL,
    rs_id TEXT,
    ref_allele TEXT NOT NULL,
    alt_allele TEXT NOT NULL,
    max_abs_sad REAL NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT,
    UNIQUE (chrom, pos, ref_allele, alt_allele)
);
CREATE INDEX IF NOT EXISTS idx_variants_rs_id ON variants(rs_id);
CREATE INDEX IF NOT EXISTS idx_variants_max_abs_sad ON variants(max_abs_sad);

CREATE TABLE IF NOT EXISTS targets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    category TEXT,
    description TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS effects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    variant_id INTEGER NOT NULL,
    target_id INTEGER NOT NULL,
    effect_value REAL NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE (variant_id, target_id)
);
CREATE INDEX IF NOT EXISTS idx_effects_target_id ON effects(target_id);

CREATE TABLE IF NOT EXISTS genes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    gene_id TEXT NOT NULL UNIQUE,
    gene_name TEXT,
    chrom TEXT NOT NULL,
    start_pos INTEGER NOT NULL,
    end_pos INTEGER NOT NULL,
    strand TEXT,
    gene_biotype TEXT,
    created_at TEXT NOT NULL,
    CHECK (start_pos <= end_pos)
);
CREATE INDEX IF NOT EXISTS idx_genes_span ON genes(chrom, start_pos, end_pos);
CREATE INDEX IF NOT EXISTS idx_genes_end ON genes(chrom, end_pos);

CREATE TABLE IF NOT EXISTS transcripts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    transcript_id TEXT NOT NULL UNIQUE,
    gene_id TEXT NOT NULL,
    chrom TEXT NOT NULL,
    start_pos INTEGER NOT NULL,
    end_pos INTEGER NOT NULL,
    strand TEXT,
    created_at TEXT NOT NULL,
    CHECK (start_pos <= end_pos)
);
CREATE INDEX IF NOT EXISTS idx_transcripts_gene ON transcripts(gene_id, chrom);

CREATE TABLE IF NOT EXISTS exons (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    transcript_id TEXT NOT NULL,
    chrom TEXT NOT NULL,
    start_pos INTEGER NOT NULL,
    end_pos INTEGER NOT NULL,
    exon_number INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE (transcript_id, exon_number),
    CHECK (start_pos <= end_pos)
);

CREATE TABLE IF NOT EXISTS import_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    import_type TEXT NOT NULL,
    source_file TEXT NOT NULL,
    records_processed INTEGER NOT NULL,
    status TEXT NOT NULL,
    error_message TEXT,
    completed_at TEXT NOT NULL
);
";

/// Create all tables and indexes that do not exist yet.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)
}

/// Names of required tables missing from the database.
pub fn missing_tables(conn: &Connection) -> rusqlite::Result<Vec<&'static str>> {
    let mut stmt = conn.prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1")?;
    let mut missing = Vec::new();
    for table in REQUIRED_TABLES {
        if !stmt.exists([table])? {
            missing.push(table);
        }
    }
    Ok(missing)
}
