//! Prompt construction.
//!
//! Each builder takes only the context its generator needs and returns a
//! ready [`GenerationRequest`]. Wording can change freely; the JSON schemas
//! must match the types the generators parse.

use serde_json::{json, Value};

use super::error::CampaignError;
use super::model::{CampaignInput, EmailVariant, Product, SubjectLine};
use super::state::CampaignState;
use crate::ai::GenerationRequest;

/// Read-only view of the state used by the copy writers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyContext {
    pub tone: String,
    pub campaign_type: String,
    pub segment_name: String,
    pub products: String,
    pub product_research: String,
    pub offer_research: String,
    /// Suggestions from the last QA rejection, if any
    pub revision_notes: Vec<String>,
}

impl CopyContext {
    /// Project the state; research must already be present.
    pub fn from_state(state: &CampaignState) -> Result<Self, CampaignError> {
        let research = state.research_findings.as_ref().ok_or_else(|| {
            CampaignError::Aggregation("research findings missing before copy generation".to_string())
        })?;

        let mut product_research = String::new();
        let mut offer_research = String::new();
        for finding in research {
            product_research.push_str(&format!("\n{}: {}", finding.product_name, finding.research_summary));
            offer_research.push_str(&format!("\n{}: {}", finding.product_name, finding.offer_summary));
        }

        let revision_notes = state
            .qa_feedback
            .as_ref()
            .and_then(|verdict| verdict.feedback())
            .filter(|feedback| feedback.needs_revision)
            .map(|feedback| {
                feedback.weaknesses.iter().chain(feedback.suggestions.iter()).cloned().collect()
            })
            .unwrap_or_default();

        Ok(Self {
            tone: state.current_tone.clone(),
            campaign_type: state.campaign_info.campaign_type.clone(),
            segment_name: state.campaign_info.segment_name.clone(),
            products: state.campaign_info.product_names(),
            product_research,
            offer_research,
            revision_notes,
        })
    }

    fn revision_block(&self) -> String {
        if self.revision_notes.is_empty() {
            return String::new();
        }
        let notes: Vec<String> = self.revision_notes.iter().map(|n| format!("- {}", n)).collect();
        format!("\nA reviewer rejected the previous draft. Address these points:\n{}\n", notes.join("\n"))
    }
}

/// Query sent to the product-features store.
pub fn feature_query(product: &Product) -> String {
    format!("What are the key features of the {}?", product.name)
}

/// Query sent to the promotions store.
pub fn offer_query(product: &Product) -> String {
    format!("Can you fetch me the pricing, deals and promotions information for {}?", product.name)
}

/// Format the best match for a query, or nothing when there was none.
pub fn retrieval_context(query: &str, best_match: Option<&str>) -> String {
    match best_match {
        Some(text) => format!("\nQuery: {}\nResult: {}\n", query, text),
        None => String::new(),
    }
}

pub fn plan(input: &CampaignInput) -> GenerationRequest {
    GenerationRequest::text(format!(
        "Create a high-level plan for an email campaign featuring multiple products.\n\n\
         Segment: {}\nCampaign type: {}\nProducts: {}\n\n\
         Cover goals and measurable objectives, audience analysis, key messages and offers per \
         product, personalization, email structure, timing, success metrics, risks, and \
         compliance considerations.",
        input.segment_name,
        input.campaign_type,
        input.product_names()
    ))
    .with_system("You are an expert email marketing campaign planner.")
}

pub fn product_research(product: &Product, research_data: &str) -> GenerationRequest {
    let data = if research_data.trim().is_empty() {
        "(no matching documents were found; rely on general knowledge of the product)"
    } else {
        research_data
    };
    GenerationRequest::text(format!(
        "Analyze the following research data for {} in the {} category:\n{}\n\n\
         Summarize the key features, standout technologies, marketing language, competitive \
         advantages, and three to five points worth emphasizing in an email.",
        product.name, product.category, data
    ))
    .with_system("You are a product marketing specialist.")
}

pub fn offer_research(product: &Product, offers_data: &str) -> GenerationRequest {
    let data = if offers_data.trim().is_empty() {
        "(no pricing or promotion documents were found)"
    } else {
        offers_data
    };
    GenerationRequest::text(format!(
        "Analyze the following pricing and promotions information for {}:\n{}\n\n\
         Summarize prices, discounts, trade-in and bundle offers, included services, and the \
         most compelling deal. Use concrete numbers where available.",
        product.name, data
    ))
    .with_system("You are a pricing and promotions specialist.")
}

pub fn subject_line(ctx: &CopyContext) -> GenerationRequest {
    GenerationRequest::structured(
        format!(
            "Write an email subject line in a {} tone.\n\
             Campaign type: {}\nTarget segment: {}\nProducts: {}\nResearch:{}\n{}\n\
             Rules:\n- At most {} characters\n- Include a product name and the [NAME] placeholder\n\
             - Highlight one key feature\n- Create FOMO or ask a question\n\n\
             Answer as JSON: {{\"subject\": \"...\"}}",
            ctx.tone,
            ctx.campaign_type,
            ctx.segment_name,
            ctx.products,
            ctx.product_research,
            ctx.revision_block(),
            SubjectLine::MAX_CHARS
        ),
        json!({
            "type": "object",
            "properties": { "subject": { "type": "string" } },
            "required": ["subject"]
        }),
    )
    .with_system("You are an expert email subject line writer.")
}

pub fn preheader(ctx: &CopyContext, subject: &SubjectLine) -> GenerationRequest {
    GenerationRequest::structured(
        format!(
            "Write an email preheader in a {} tone.\n\
             Campaign type: {}\nTarget segment: {}\nProducts: {}\nSubject line: {}\nOffers:{}\n{}\n\
             Rules:\n- Between 50 and 100 characters\n- Add information the subject line does not \
             carry\n- Highlight a key offer\n\n\
             Answer as JSON: {{\"preheader\": \"...\"}}",
            ctx.tone,
            ctx.campaign_type,
            ctx.segment_name,
            ctx.products,
            subject.as_str(),
            ctx.offer_research,
            ctx.revision_block()
        ),
        json!({
            "type": "object",
            "properties": { "preheader": { "type": "string" } },
            "required": ["preheader"]
        }),
    )
    .with_system("You are an expert email preheader writer.")
}

pub fn body(ctx: &CopyContext) -> GenerationRequest {
    GenerationRequest::structured(
        format!(
            "Write an email body in a {} tone.\n\
             Campaign type: {}\nTarget segment: {}\nProducts: {}\nResearch:{}\nOffers:{}\n{}\n\
             For each product create feature modules, each with a title, a one line description, \
             a call-to-action text and link. Finish with a main call to action and its link.\n\n\
             Answer as JSON: {{\"product_modules\": [{{\"title\": \"...\", \"content\": \"...\", \
             \"cta_text\": \"...\", \"cta_link\": \"...\"}}], \"main_cta\": \"...\", \
             \"main_cta_link\": \"...\"}}",
            ctx.tone,
            ctx.campaign_type,
            ctx.segment_name,
            ctx.products,
            ctx.product_research,
            ctx.offer_research,
            ctx.revision_block()
        ),
        body_schema(),
    )
    .with_system("You are an expert email body writer for product campaigns.")
}

fn body_schema() -> Value {
    let text = json!({ "type": "string" });
    json!({
        "type": "object",
        "properties": {
            "product_modules": {
                "type": "array",
                "minItems": 1,
                "items": {
                    "type": "object",
                    "properties": {
                        "title": text,
                        "content": text,
                        "cta_text": text,
                        "cta_link": text
                    },
                    "required": ["title", "content", "cta_text", "cta_link"]
                }
            },
            "main_cta": text,
            "main_cta_link": text
        },
        "required": ["product_modules", "main_cta", "main_cta_link"]
    })
}

pub fn qa_review(input: &CampaignInput, variant: &EmailVariant) -> GenerationRequest {
    let list = json!({ "type": "array", "items": { "type": "string" } });
    GenerationRequest::structured(
        format!(
            "Review this email variant.\n\
             Campaign type: {}\nTarget segment: {}\nProducts: {}\n\n\
             Subject line: {}\nPre-header: {}\nBody:\n{}\n\n\
             Judge alignment with the campaign, audience fit, personalization, calls to action, \
             product coverage, and grammar. Set needs_revision only for critical issues.\n\n\
             Answer as JSON: {{\"overall_rating\": 1-10, \"strengths\": [...], \
             \"weaknesses\": [...], \"suggestions\": [...], \"needs_revision\": true|false}}",
            input.campaign_type,
            input.segment_name,
            input.product_names(),
            variant.subject_line.as_str(),
            variant.pre_header.as_str(),
            variant.body
        ),
        json!({
            "type": "object",
            "properties": {
                "overall_rating": { "type": "integer", "minimum": 1, "maximum": 10 },
                "strengths": list,
                "weaknesses": list,
                "suggestions": list,
                "needs_revision": { "type": "boolean" }
            },
            "required": ["overall_rating", "strengths", "weaknesses", "suggestions", "needs_revision"]
        }),
    )
    .with_system("You are an expert quality assurance specialist for email marketing campaigns.")
}

/// Re-issue a request after its answer broke the contract.
pub fn correction(request: &GenerationRequest, reason: &str) -> GenerationRequest {
    GenerationRequest {
        prompt: format!(
            "{}\n\nYour previous answer was rejected: {}. Answer again and follow every rule.",
            request.prompt, reason
        ),
        ..request.clone()
    }
}
