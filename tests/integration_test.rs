use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn data_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("data")
}

fn snpdb(database: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_snpdb"));
    cmd.arg("--database").arg(database).env("RUST_LOG", "info");
    cmd
}

/// Import the GTF and TSV fixtures into `database`.
fn load_fixtures(database: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = data_dir();

    snpdb(database)
        .arg("import-genes")
        .arg("-f")
        .arg(data_dir.join("annotation.gtf"))
        .arg("--yes")
        .assert()
        .success()
        .stderr(predicate::str::contains("Imported 4 genes"));

    snpdb(database)
        .arg("import-transcripts")
        .arg("-f")
        .arg(data_dir.join("annotation.gtf"))
        .assert()
        .success()
        .stderr(predicate::str::contains("Imported 1 transcripts and 2 exons"));

    snpdb(database)
        .arg("import-variants")
        .arg("-f")
        .arg(data_dir.join("variants.tsv"))
        .arg("--batch-size")
        .arg("2")
        .arg("-j")
        .arg("2")
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "Imported 5 variants and 14 effect values (1 rows skipped, 0 errors)",
        ));

    Ok(())
}

#[test]
fn test_import_then_check_db() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let database = dir.path().join("snps.sqlite");

    load_fixtures(&database)?;

    snpdb(&database)
        .arg("check-db")
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "Database OK: 5 variants, 3 targets, 14 effect values",
        ))
        .stderr(predicate::str::contains("Import TSV_IMPORT: completed (5 records)"))
        .stderr(predicate::str::contains(
            "Import GTF_GENES: completed_with_errors (4 records)",
        ));

    Ok(())
}

#[test]
fn test_database_url_env_with_scheme() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let database = dir.path().join("env.sqlite");

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_snpdb"));
    cmd.env("DATABASE_URL", format!("sqlite://{}", database.display()))
        .arg("import-variants")
        .arg("-f")
        .arg(data_dir().join("variants.tsv"))
        .assert()
        .success();

    assert!(database.exists());
    Ok(())
}

#[test]
fn test_check_db_missing_file_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let database = dir.path().join("absent.sqlite");

    snpdb(&database)
        .arg("check-db")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Database not found"));

    // check-db never creates the file
    assert!(!database.exists());
    Ok(())
}

#[test]
fn test_gene_reimport_declined_keeps_genes() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let database = dir.path().join("snps.sqlite");
    let gtf = data_dir().join("annotation.gtf");

    snpdb(&database)
        .arg("import-genes")
        .arg("-f")
        .arg(&gtf)
        .arg("-y")
        .assert()
        .success();

    snpdb(&database)
        .arg("import-genes")
        .arg("-f")
        .arg(&gtf)
        .write_stdin("no\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Existing genes kept"));

    snpdb(&database)
        .arg("import-genes")
        .arg("-f")
        .arg(&gtf)
        .write_stdin("yes\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Imported 4 genes"));

    Ok(())
}

#[test]
fn test_missing_input_file_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let database = dir.path().join("snps.sqlite");

    snpdb(&database)
        .arg("import-variants")
        .arg("-f")
        .arg(dir.path().join("missing.tsv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("TSV file not found"));

    snpdb(&database)
        .arg("import-transcripts")
        .arg("-f")
        .arg(dir.path().join("missing.gtf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("GTF file not found"));

    Ok(())
}

#[test]
fn test_zero_batch_size_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let database = dir.path().join("snps.sqlite");

    snpdb(&database)
        .arg("import-variants")
        .arg("-f")
        .arg(data_dir().join("variants.tsv"))
        .arg("--batch-size")
        .arg("0")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Batch size must be greater than 0"));

    Ok(())
}
