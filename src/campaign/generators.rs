//! Content generators.
//!
//! Each generator makes one provider call, parses the answer into its
//! validated artifact type and, when the answer breaks the contract,
//! re-prompts with the violation spelled out. Output is never truncated or
//! padded to fit.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::error::{Artifact, ContractError, GenerationError};
use super::model::{
    CampaignInput, EmailBody, EmailVariant, Preheader, Product, ProductResearch, QaFeedback,
    QaVerdict, RawEmailBody, SubjectLine,
};
use super::prompts::{self, CopyContext};
use crate::ai::{GenerationProvider, GenerationRequest};

/// Produces every generated artifact of a campaign.
#[derive(Clone)]
pub struct ContentGenerator {
    provider: Arc<dyn GenerationProvider>,
    contract_attempts: u32,
}

impl ContentGenerator {
    /// Create a generator with three contract attempts per artifact.
    pub fn new(provider: Arc<dyn GenerationProvider>) -> Self {
        Self { provider, contract_attempts: 3 }
    }

    /// Set how many times an artifact may be requested before giving up.
    pub fn with_contract_attempts(mut self, attempts: u32) -> Self {
        self.contract_attempts = attempts.max(1);
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Campaign plan (free text).
    pub async fn plan(&self, input: &CampaignInput) -> Result<String, GenerationError> {
        self.generate(Artifact::Plan, prompts::plan(input), |raw| {
            let plan = raw.trim();
            if plan.is_empty() {
                return Err(ContractError::new(Artifact::Plan, "plan is empty"));
            }
            Ok(plan.to_string())
        })
        .await
    }

    /// Research and offer summaries for one product.
    ///
    /// Either context may be empty when retrieval found nothing.
    pub async fn research(
        &self,
        product: &Product,
        research_data: &str,
        offers_data: &str,
    ) -> Result<ProductResearch, GenerationError> {
        let summary = |raw: &str| {
            let text = raw.trim();
            if text.is_empty() {
                return Err(ContractError::new(Artifact::Research, "summary is empty"));
            }
            Ok(text.to_string())
        };

        let research_summary = self
            .generate(Artifact::Research, prompts::product_research(product, research_data), summary)
            .await?;
        let offer_summary = self
            .generate(Artifact::Research, prompts::offer_research(product, offers_data), summary)
            .await?;

        ProductResearch::new(&product.name, &research_summary, &offer_summary).map_err(|e| {
            GenerationError::ContractViolation { artifact: e.artifact, reason: e.reason, attempts: 1 }
        })
    }

    pub async fn subject_line(&self, ctx: &CopyContext) -> Result<SubjectLine, GenerationError> {
        #[derive(Deserialize)]
        struct Answer {
            subject: String,
        }

        self.generate(Artifact::SubjectLine, prompts::subject_line(ctx), |raw| {
            let answer: Answer = parse_json(Artifact::SubjectLine, raw)?;
            SubjectLine::new(answer.subject)
        })
        .await
    }

    pub async fn preheader(
        &self,
        ctx: &CopyContext,
        subject: &SubjectLine,
    ) -> Result<Preheader, GenerationError> {
        #[derive(Deserialize)]
        struct Answer {
            preheader: String,
        }

        self.generate(Artifact::Preheader, prompts::preheader(ctx, subject), |raw| {
            let answer: Answer = parse_json(Artifact::Preheader, raw)?;
            Preheader::new(answer.preheader)
        })
        .await
    }

    pub async fn body(&self, ctx: &CopyContext) -> Result<EmailBody, GenerationError> {
        self.generate(Artifact::Body, prompts::body(ctx), |raw| {
            let answer: RawEmailBody = parse_json(Artifact::Body, raw)?;
            EmailBody::try_from(answer)
        })
        .await
    }

    /// Review a variant.
    ///
    /// Feedback that stays unreadable after every contract attempt becomes
    /// [`QaVerdict::Unparsable`] so routing can send the variant back.
    /// Provider failures are still errors.
    pub async fn qa_review(
        &self,
        input: &CampaignInput,
        variant: &EmailVariant,
    ) -> Result<QaVerdict, GenerationError> {
        let result = self
            .generate(Artifact::QaFeedback, prompts::qa_review(input, variant), |raw| {
                let feedback: QaFeedback = parse_json(Artifact::QaFeedback, raw)?;
                feedback.validate()?;
                Ok(feedback)
            })
            .await;

        match result {
            Ok(feedback) => Ok(QaVerdict::Parsed(feedback)),
            Err(GenerationError::ContractViolation { reason, .. }) => {
                Ok(QaVerdict::Unparsable(reason))
            }
            Err(e) => Err(e),
        }
    }

    async fn generate<T, F>(
        &self,
        artifact: Artifact,
        request: GenerationRequest,
        parse: F,
    ) -> Result<T, GenerationError>
    where
        F: Fn(&str) -> Result<T, ContractError>,
    {
        let mut current = request.clone();
        let mut last_reason = String::new();

        for attempt in 1..=self.contract_attempts {
            tracing::debug!(
                artifact = %artifact,
                attempt,
                prompt_chars = current.prompt.len(),
                "Requesting artifact"
            );

            let raw = self.provider.complete(&current).await?;

            match parse(&raw) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    tracing::warn!(artifact = %artifact, attempt, reason = %e.reason, "Output out of contract");
                    current = prompts::correction(&request, &e.reason);
                    last_reason = e.reason;
                }
            }
        }

        Err(GenerationError::ContractViolation {
            artifact,
            reason: last_reason,
            attempts: self.contract_attempts,
        })
    }
}

/// Extract the JSON object from a model answer.
///
/// Models like to wrap JSON in code fences or add a sentence around it.
pub(crate) fn extract_json(raw: &str) -> &str {
    let trimmed = raw.trim();
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}

fn parse_json<T: DeserializeOwned>(artifact: Artifact, raw: &str) -> Result<T, ContractError> {
    serde_json::from_str(extract_json(raw))
        .map_err(|e| ContractError::new(artifact, format!("invalid JSON: {}", e)))
}
