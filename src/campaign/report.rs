//! Export of a finished campaign.
//!
//! Writes the plan, the research, every variant as text and HTML, combined
//! files, and a JSON summary into one directory.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::model::{FinalizedVariant, Product};
use super::state::CampaignState;

/// Metadata written to `summary.json`.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignSummary {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub segment_name: String,
    pub campaign_type: String,
    pub products: Vec<Product>,
    pub tones: Vec<String>,
    pub variant_count: usize,
    pub files: Vec<String>,
}

/// Turn a tone label into a file name fragment.
pub fn tone_slug(tone: &str) -> String {
    let mut slug = String::with_capacity(tone.len());
    for c in tone.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('_') && !slug.is_empty() {
            slug.push('_');
        }
    }
    slug.trim_end_matches('_').to_string()
}

/// Variants grouped by tone, in rotation order, numbered from 1 within each tone.
///
/// A label repeated in the rotation forms a single group.
pub fn grouped_variants(state: &CampaignState) -> Vec<(&str, Vec<(usize, &FinalizedVariant)>)> {
    let mut tones: Vec<&str> = Vec::new();
    for tone in state.tones.iter() {
        if !tones.contains(&tone) {
            tones.push(tone);
        }
    }

    tones
        .into_iter()
        .map(|tone| {
            let variants = state
                .variants
                .iter()
                .filter(|v| v.tone == tone)
                .enumerate()
                .map(|(i, v)| (i + 1, v))
                .collect();
            (tone, variants)
        })
        .collect()
}

/// One file name stem per tone, suffixed `_2`, `_3`, ... where slugs collide.
fn file_stems<'a>(tones: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    tones
        .into_iter()
        .map(|tone| {
            let mut base = tone_slug(tone);
            if base.is_empty() {
                base = "tone".to_string();
            }
            let mut stem = base.clone();
            let mut n = 2;
            while used.contains(&stem) {
                stem = format!("{}_{}", base, n);
                n += 1;
            }
            used.insert(stem.clone());
            stem
        })
        .collect()
}

fn research_text(state: &CampaignState) -> String {
    let Some(ref findings) = state.research_findings else {
        return String::new();
    };

    findings
        .iter()
        .map(|f| {
            format!(
                "Product: {}\n\nResearch Summary:\n{}\n\nOffer Summary:\n{}\n",
                f.product_name, f.research_summary, f.offer_summary
            )
        })
        .collect::<Vec<_>>()
        .join("\n---\n\n")
}

/// Write every export file into `dir` and return the summary.
pub fn write_report(state: &CampaignState, dir: &Path) -> anyhow::Result<CampaignSummary> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let mut files: Vec<PathBuf> = Vec::new();
    let mut write = |name: &str, content: &str| -> anyhow::Result<()> {
        let path = dir.join(name);
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        files.push(path);
        Ok(())
    };

    if let Some(ref plan) = state.campaign_plan {
        write("campaign_plan.txt", plan)?;
    }
    if state.research_findings.is_some() {
        write("research_findings.txt", &research_text(state))?;
    }

    let mut all_text = String::new();
    let mut all_html = String::new();

    let groups = grouped_variants(state);
    let stems = file_stems(groups.iter().map(|(tone, _)| *tone));

    for ((tone, variants), stem) in groups.into_iter().zip(stems) {
        for (i, variant) in variants {
            let text = variant.content.to_text();
            write(&format!("{}_variant_{}_content.txt", stem, i), &text)?;
            write(&format!("{}_variant_{}.html", stem, i), &variant.html)?;

            all_text.push_str(&format!("Tone: {} - Variant {}\n\n{}\n\n", tone, i, text));
            all_html.push_str(&format!("<!-- Tone: {} - Variant {} -->\n{}\n", tone, i, variant.html));
        }
    }

    write("all_variants_content.txt", &all_text)?;
    write("all_variants.html", &all_html)?;

    let mut summary = CampaignSummary {
        run_id: uuid::Uuid::new_v4().to_string(),
        generated_at: Utc::now(),
        segment_name: state.campaign_info.segment_name.clone(),
        campaign_type: state.campaign_info.campaign_type.clone(),
        products: state.products.clone(),
        tones: state.tones.iter().map(str::to_string).collect(),
        variant_count: state.variants.len(),
        files: Vec::new(),
    };

    summary.files = files
        .iter()
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .chain(std::iter::once("summary.json".to_string()))
        .collect();

    let json = serde_json::to_string_pretty(&summary)?;
    fs::write(dir.join("summary.json"), json)
        .with_context(|| format!("Failed to write {}", dir.join("summary.json").display()))?;

    tracing::info!(dir = %dir.display(), files = summary.files.len(), "Report written");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaign::model::fixtures;
    use crate::campaign::tones::ToneRotation;

    fn state_with(tones: &[&str], variant_tones: &[&str]) -> CampaignState {
        let tones = ToneRotation::new(tones.iter().map(|t| t.to_string()).collect()).unwrap();
        let mut state = CampaignState::new(fixtures::input(), tones);
        state.campaign_plan = Some("Plan".to_string());
        for tone in variant_tones {
            state.variants.push(FinalizedVariant {
                tone: tone.to_string(),
                content: fixtures::variant(),
                html: "<html></html>".to_string(),
            });
        }
        state
    }

    fn finished_state() -> CampaignState {
        let tone = "urgent and action oriented";
        state_with(&[tone, "calm"], &[tone, "calm", tone])
    }

    #[test]
    fn test_tone_slug() {
        assert_eq!(tone_slug("urgent and action oriented"), "urgent_and_action_oriented");
        assert_eq!(tone_slug("  Playful & Humorous! "), "playful_humorous");
    }

    #[test]
    fn test_grouping_numbers_per_tone() {
        let state = finished_state();
        let groups = grouped_variants(&state);

        assert_eq!(groups[0].0, "urgent and action oriented");
        assert_eq!(groups[0].1.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(groups[1].1.len(), 1);
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let summary = write_report(&finished_state(), dir.path()).unwrap();

        assert_eq!(summary.variant_count, 3);
        for name in [
            "campaign_plan.txt",
            "urgent_and_action_oriented_variant_1_content.txt",
            "urgent_and_action_oriented_variant_2.html",
            "calm_variant_1.html",
            "all_variants_content.txt",
            "all_variants.html",
            "summary.json",
        ] {
            assert!(dir.path().join(name).exists(), "missing {}", name);
        }
        assert!(!dir.path().join("research_findings.txt").exists());

        let text = fs::read_to_string(dir.path().join("calm_variant_1_content.txt")).unwrap();
        assert!(text.starts_with("Subject: [NAME], meet the Galaxy S24"));

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("summary.json")).unwrap())
                .unwrap();
        assert_eq!(json["segment_name"], "Existing customers");
        assert_eq!(json["variant_count"], 3);
    }

    #[test]
    fn test_colliding_slugs_get_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(&["Calm", "calm!"], &["Calm", "calm!"]);

        let summary = write_report(&state, dir.path()).unwrap();

        assert!(dir.path().join("calm_variant_1.html").exists());
        assert!(dir.path().join("calm_2_variant_1.html").exists());
        assert!(dir.path().join("calm_2_variant_1_content.txt").exists());

        let mut names = summary.files.clone();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), summary.files.len());
    }

    #[test]
    fn test_repeated_tone_label_is_exported_once() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(&["warm", "warm"], &["warm", "warm"]);

        assert_eq!(grouped_variants(&state).len(), 1);
        write_report(&state, dir.path()).unwrap();

        let all = fs::read_to_string(dir.path().join("all_variants_content.txt")).unwrap();
        assert_eq!(all.matches("Tone: warm").count(), 2);
        assert!(dir.path().join("warm_variant_2.html").exists());
        assert!(!dir.path().join("warm_2_variant_1.html").exists());
    }

    #[test]
    fn test_symbol_only_tone_still_gets_a_stem() {
        assert_eq!(file_stems(["!!!", "?"]), vec!["tone", "tone_2"]);
    }
}
