//! CLI Integration Tests
//!
//! Tests for the mailforge command-line interface using assert_cmd.
//! None of these reach a generation provider.

use assert_cmd::Command;
use assert_fs::prelude::*;
use predicates::prelude::*;

/// Get a command for the mailforge binary.
fn mailforge() -> Command {
    Command::cargo_bin("mailforge").unwrap()
}

/// Temp dir holding a minimal config file.
fn isolated() -> (assert_fs::TempDir, std::path::PathBuf) {
    let temp = assert_fs::TempDir::new().unwrap();
    let config = temp.child("mailforge.toml");
    config.write_str("[campaign]\nvariants_per_tone = 1\n").unwrap();
    let path = config.path().to_path_buf();
    (temp, path)
}

// ============================================================================
// Help & Version Tests
// ============================================================================

#[test]
fn test_help_flag() {
    mailforge()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Marketing email campaigns"))
        .stdout(predicate::str::contains("Multi-product marketing").not());
}

#[test]
fn test_help_short_flag() {
    mailforge().arg("-h").assert().success().stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_version_flag() {
    mailforge()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_generate_help_lists_flags() {
    mailforge()
        .args(["generate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--segment"))
        .stdout(predicate::str::contains("--product"))
        .stdout(predicate::str::contains("--tone"));
}

#[test]
fn test_unknown_subcommand_fails() {
    mailforge().arg("explode").assert().failure();
}

// ============================================================================
// Products Command Tests
// ============================================================================

#[test]
fn test_products_lists_catalog() {
    let (temp, config) = isolated();

    mailforge()
        .arg("products")
        .arg("--config")
        .arg(&config)
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("phones:Galaxy_S24"))
        .stdout(predicate::str::contains("watches:"));
}

#[test]
fn test_products_json_output() {
    let (temp, config) = isolated();

    mailforge()
        .args(["products", "--format", "json"])
        .arg("--config")
        .arg(&config)
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("["))
        .stdout(predicate::str::contains("\"category\""));
}

#[test]
fn test_products_uses_configured_catalog() {
    let temp = assert_fs::TempDir::new().unwrap();
    let config = temp.child("catalog.toml");
    config
        .write_str("[[catalog]]\ncategory = \"laptops\"\noptions = [\"Book4_Pro\"]\n")
        .unwrap();

    mailforge()
        .arg("products")
        .arg("--config")
        .arg(config.path())
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("laptops:Book4_Pro"))
        .stdout(predicate::str::contains("phones").not());
}

// ============================================================================
// Config Command Tests
// ============================================================================

#[test]
fn test_config_path_prints_override() {
    let (temp, config) = isolated();

    mailforge()
        .args(["config", "--path"])
        .arg("--config")
        .arg(&config)
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("mailforge.toml"));
}

#[test]
fn test_config_shows_sections() {
    let (temp, config) = isolated();

    mailforge()
        .arg("config")
        .arg("--config")
        .arg(&config)
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("[campaign]"))
        .stdout(predicate::str::contains("[retry]"));
}

#[test]
fn test_config_rejects_invalid_values() {
    let temp = assert_fs::TempDir::new().unwrap();
    let config = temp.child("bad.toml");
    config.write_str("[campaign]\ntones = []\n").unwrap();

    mailforge()
        .arg("config")
        .arg("--config")
        .arg(config.path())
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least one tone"));
}

#[test]
fn test_config_from_env_var() {
    let (temp, config) = isolated();

    mailforge()
        .args(["config", "--path"])
        .env("MAILFORGE_CONFIG", &config)
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("mailforge.toml"));
}

// ============================================================================
// Completions Tests
// ============================================================================

#[test]
fn test_completions_bash() {
    mailforge()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mailforge"));
}

#[test]
fn test_completions_zsh() {
    mailforge().args(["completions", "zsh"]).assert().success();
}

// ============================================================================
// Generate Input Validation Tests
// ============================================================================

#[test]
fn test_generate_requires_segment() {
    let (temp, config) = isolated();

    mailforge()
        .args(["generate", "--campaign-type", "Reactivation", "--product", "phones:Galaxy_S24"])
        .arg("--config")
        .arg(&config)
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("segment name is required"));
}

#[test]
fn test_generate_requires_a_product() {
    let (temp, config) = isolated();

    mailforge()
        .args(["generate", "--segment", "Existing customers", "--campaign-type", "Reactivation"])
        .arg("--config")
        .arg(&config)
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least one product"));
}

#[test]
fn test_generate_rejects_unknown_product() {
    let (temp, config) = isolated();

    mailforge()
        .args(["generate", "-s", "Existing customers", "-t", "Reactivation"])
        .args(["--product", "phones:Nokia_3310"])
        .arg("--config")
        .arg(&config)
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("not in the catalog"));
}

#[test]
fn test_generate_rejects_malformed_product() {
    let (temp, config) = isolated();

    mailforge()
        .args(["generate", "-s", "Existing customers", "-t", "Reactivation", "-p", "Galaxy_S24"])
        .arg("--config")
        .arg(&config)
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("category:name"));
}

#[test]
fn test_generate_rejects_zero_variants() {
    let (temp, config) = isolated();

    mailforge()
        .args(["generate", "-s", "Existing customers", "-t", "Reactivation"])
        .args(["-p", "phones:Galaxy_S24", "--variants", "0"])
        .arg("--config")
        .arg(&config)
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("variants_per_tone"));
}

#[test]
fn test_generate_rejects_uncountable_variant_total() {
    let (temp, config) = isolated();

    mailforge()
        .args(["generate", "-s", "Existing customers", "-t", "Reactivation"])
        .args(["-p", "phones:Galaxy_S24", "--variants"])
        .arg(usize::MAX.to_string())
        .arg("--config")
        .arg(&config)
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("more than can be counted"));
}

#[test]
fn test_generate_rejects_invalid_campaign_file() {
    let (temp, config) = isolated();
    let campaign = temp.child("campaign.toml");
    campaign.write_str("segment_name = \"Existing customers\"\n").unwrap();

    mailforge()
        .arg("generate")
        .arg("--input")
        .arg(campaign.path())
        .arg("--config")
        .arg(&config)
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid campaign file"));
}

#[test]
fn test_generate_missing_campaign_file() {
    let (temp, config) = isolated();

    mailforge()
        .args(["generate", "--input", "does-not-exist.toml"])
        .arg("--config")
        .arg(&config)
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_campaign_file_products_are_checked() {
    let (temp, config) = isolated();
    let campaign = temp.child("campaign.toml");
    campaign
        .write_str(
            "segment_name = \"Existing customers\"\n\
             campaign_type = \"Reactivation\"\n\
             products = [\"tv:Not_A_Set\"]\n",
        )
        .unwrap();

    mailforge()
        .arg("generate")
        .arg("--input")
        .arg(campaign.path())
        .arg("--config")
        .arg(&config)
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("not in the catalog"));
}
