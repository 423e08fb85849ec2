//! Campaign state threaded through the workflow.
//!
//! The engine owns one [`CampaignState`] per run and hands it from node to
//! node. Fields prefixed `current_` together with `qa_feedback` and
//! `html_email` are scratch: they hold the single in-flight candidate and are
//! cleared either when QA sends it back or when it is finalized.

use serde::{Deserialize, Serialize};

use super::error::CampaignError;
use super::model::{
    CampaignInput, EmailBody, EmailVariant, FinalizedVariant, Preheader, Product,
    ProductResearch, QaVerdict, SubjectLine,
};
use super::tones::ToneRotation;

/// The state of one campaign run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignState {
    pub products: Vec<Product>,
    pub campaign_info: CampaignInput,
    pub campaign_plan: Option<String>,
    pub research_findings: Option<Vec<ProductResearch>>,

    pub current_subject_line: Option<SubjectLine>,
    pub current_preheader: Option<Preheader>,
    pub current_body: Option<EmailBody>,
    pub current_variant: Option<EmailVariant>,
    pub qa_feedback: Option<QaVerdict>,
    pub html_email: Option<String>,

    pub current_tone: String,
    pub variants: Vec<FinalizedVariant>,

    /// QA rejections of the in-flight variant
    pub revision_count: u32,
    pub tones: ToneRotation,
}

impl CampaignState {
    /// Fresh state: no scratch, tone set to the first in the rotation.
    pub fn new(campaign_info: CampaignInput, tones: ToneRotation) -> Self {
        Self {
            products: campaign_info.products.clone(),
            current_tone: tones.first().to_string(),
            campaign_info,
            campaign_plan: None,
            research_findings: None,
            current_subject_line: None,
            current_preheader: None,
            current_body: None,
            current_variant: None,
            qa_feedback: None,
            html_email: None,
            variants: Vec::new(),
            revision_count: 0,
            tones,
        }
    }

    /// Number of variants the run must finalize.
    pub fn quota(&self) -> usize {
        self.tones.quota(self.campaign_info.variants_per_tone)
    }

    /// Check the input and that the state can start a run.
    pub fn validate(&self) -> Result<(), CampaignError> {
        self.campaign_info.validate()?;

        let variants_per_tone = self.campaign_info.variants_per_tone;
        if self.tones.checked_quota(variants_per_tone).is_none() {
            return Err(CampaignError::InvalidInput(format!(
                "{} variants per tone across {} tones is more than can be counted",
                variants_per_tone,
                self.tones.len()
            )));
        }
        if self.has_scratch() {
            return Err(CampaignError::InvalidInput(
                "state already carries an in-flight draft".to_string(),
            ));
        }
        Ok(())
    }

    pub fn quota_met(&self) -> bool {
        self.variants.len() >= self.quota()
    }

    /// Whether any scratch field holds data.
    pub fn has_scratch(&self) -> bool {
        self.current_subject_line.is_some()
            || self.current_preheader.is_some()
            || self.current_body.is_some()
            || self.current_variant.is_some()
            || self.qa_feedback.is_some()
            || self.html_email.is_some()
    }

    /// Drop the in-flight copy so the next cycle regenerates it from scratch.
    ///
    /// QA feedback is kept so the writers can address it.
    pub fn discard_draft(&mut self) {
        self.current_subject_line = None;
        self.current_preheader = None;
        self.current_body = None;
        self.current_variant = None;
        self.html_email = None;
    }

    /// Record a QA rejection and discard the draft.
    pub fn begin_revision(&mut self) {
        self.revision_count += 1;
        self.discard_draft();
    }

    /// Consume the subject, preheader and body into `current_variant`.
    pub fn aggregate(&mut self) -> Result<(), CampaignError> {
        let missing: Vec<&str> = [
            ("subject line", self.current_subject_line.is_none()),
            ("preheader", self.current_preheader.is_none()),
            ("body", self.current_body.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        if !missing.is_empty() {
            return Err(CampaignError::Aggregation(format!("missing {}", missing.join(", "))));
        }

        match (
            self.current_subject_line.take(),
            self.current_preheader.take(),
            self.current_body.take(),
        ) {
            (Some(subject), Some(preheader), Some(body)) => {
                self.current_variant = Some(EmailVariant::new(subject, preheader, body));
                Ok(())
            }
            _ => Err(CampaignError::Aggregation("scratch fields changed underneath".to_string())),
        }
    }

    /// Append the approved variant and reset every scratch field.
    ///
    /// The tone then advances to `tones[variants.len() % tones.len()]`.
    pub fn finalize(&mut self) -> Result<(), CampaignError> {
        let Some(html) = self.html_email.take() else {
            return Err(CampaignError::Aggregation("no rendered HTML to finalize".to_string()));
        };
        let Some(mut content) = self.current_variant.take() else {
            self.html_email = Some(html);
            return Err(CampaignError::Aggregation("no variant to finalize".to_string()));
        };

        content.html = Some(html.clone());
        self.variants.push(FinalizedVariant { tone: self.current_tone.clone(), content, html });

        self.current_subject_line = None;
        self.current_preheader = None;
        self.current_body = None;
        self.qa_feedback = None;
        self.revision_count = 0;
        self.current_tone = self.tones.tone_for(self.variants.len()).to_string();

        Ok(())
    }
}
