//! Campaign data model.
//!
//! Generated artifacts are validated when they are constructed, so a value
//! of [`SubjectLine`], [`Preheader`], [`EmailBody`] or [`QaFeedback`] is
//! always within its contract.

use serde::{Deserialize, Serialize};

use super::error::{Artifact, CampaignError, ContractError};

/// A product featured in the campaign. Identity is the name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub category: String,
}

impl Product {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self { name: name.into(), category: category.into() }
    }

    /// Parse `category:name`.
    pub fn parse(spec: &str) -> Result<Self, CampaignError> {
        let (category, name) = spec.split_once(':').ok_or_else(|| {
            CampaignError::InvalidInput(format!("expected category:name, got '{}'", spec))
        })?;
        let (category, name) = (category.trim(), name.trim());
        if category.is_empty() || name.is_empty() {
            return Err(CampaignError::InvalidInput(format!(
                "expected category:name, got '{}'",
                spec
            )));
        }
        Ok(Self::new(name, category))
    }
}

impl PartialEq for Product {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Product {}

/// What the operator asked for. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignInput {
    pub segment_name: String,
    pub campaign_type: String,
    pub products: Vec<Product>,
    pub variants_per_tone: usize,
}

impl CampaignInput {
    /// Create a validated campaign input.
    pub fn new(
        segment_name: impl Into<String>,
        campaign_type: impl Into<String>,
        products: Vec<Product>,
        variants_per_tone: usize,
    ) -> Result<Self, CampaignError> {
        let input = Self {
            segment_name: segment_name.into(),
            campaign_type: campaign_type.into(),
            products,
            variants_per_tone,
        };
        input.validate()?;
        Ok(input)
    }

    /// Check the input invariants.
    pub fn validate(&self) -> Result<(), CampaignError> {
        if self.segment_name.trim().is_empty() {
            return Err(CampaignError::InvalidInput("segment name is required".to_string()));
        }
        if self.campaign_type.trim().is_empty() {
            return Err(CampaignError::InvalidInput("campaign type is required".to_string()));
        }
        if self.products.is_empty() {
            return Err(CampaignError::InvalidInput("at least one product is required".to_string()));
        }
        if self.variants_per_tone == 0 {
            return Err(CampaignError::InvalidInput(
                "variants per tone must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Comma separated product names.
    pub fn product_names(&self) -> String {
        self.products.iter().map(|p| p.name.as_str()).collect::<Vec<_>>().join(", ")
    }
}

/// Research and offer summaries for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductResearch {
    pub product_name: String,
    pub research_summary: String,
    pub offer_summary: String,
}

impl ProductResearch {
    pub fn new(
        product_name: impl Into<String>,
        research_summary: &str,
        offer_summary: &str,
    ) -> Result<Self, ContractError> {
        let research_summary = research_summary.trim();
        let offer_summary = offer_summary.trim();
        if research_summary.is_empty() {
            return Err(ContractError::new(Artifact::Research, "research summary is empty"));
        }
        if offer_summary.is_empty() {
            return Err(ContractError::new(Artifact::Research, "offer summary is empty"));
        }
        Ok(Self {
            product_name: product_name.into(),
            research_summary: research_summary.to_string(),
            offer_summary: offer_summary.to_string(),
        })
    }
}

/// Length in characters as a reader counts them.
fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// A subject line of at most [`SubjectLine::MAX_CHARS`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubjectLine(String);

impl SubjectLine {
    pub const MAX_CHARS: usize = 50;

    pub fn new(text: impl Into<String>) -> Result<Self, ContractError> {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ContractError::new(Artifact::SubjectLine, "subject line is empty"));
        }
        let len = char_len(trimmed);
        if len > Self::MAX_CHARS {
            return Err(ContractError::new(
                Artifact::SubjectLine,
                format!("{} characters, at most {} allowed", len, Self::MAX_CHARS),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SubjectLine {
    type Error = ContractError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SubjectLine> for String {
    fn from(value: SubjectLine) -> Self {
        value.0
    }
}

/// A preheader between [`Preheader::MIN_CHARS`] and [`Preheader::MAX_CHARS`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Preheader(String);

impl Preheader {
    pub const MIN_CHARS: usize = 50;
    pub const MAX_CHARS: usize = 100;

    pub fn new(text: impl Into<String>) -> Result<Self, ContractError> {
        let text = text.into();
        let trimmed = text.trim();
        let len = char_len(trimmed);
        if !(Self::MIN_CHARS..=Self::MAX_CHARS).contains(&len) {
            return Err(ContractError::new(
                Artifact::Preheader,
                format!(
                    "{} characters, must be between {} and {}",
                    len,
                    Self::MIN_CHARS,
                    Self::MAX_CHARS
                ),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Preheader {
    type Error = ContractError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Preheader> for String {
    fn from(value: Preheader) -> Self {
        value.0
    }
}

/// One feature block of the email body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailModule {
    pub title: String,
    pub content: String,
    pub cta_text: String,
    pub cta_link: String,
}

/// Structured email body: feature modules plus the main call to action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEmailBody")]
pub struct EmailBody {
    product_modules: Vec<EmailModule>,
    main_cta: String,
    main_cta_link: String,
}

/// Unchecked body as it comes off the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEmailBody {
    #[serde(default)]
    pub product_modules: Vec<EmailModule>,
    #[serde(default)]
    pub main_cta: String,
    #[serde(default)]
    pub main_cta_link: String,
}

impl TryFrom<RawEmailBody> for EmailBody {
    type Error = ContractError;

    fn try_from(raw: RawEmailBody) -> Result<Self, Self::Error> {
        Self::new(raw.product_modules, raw.main_cta, raw.main_cta_link)
    }
}

impl EmailBody {
    pub fn new(
        product_modules: Vec<EmailModule>,
        main_cta: impl Into<String>,
        main_cta_link: impl Into<String>,
    ) -> Result<Self, ContractError> {
        let body = Self {
            product_modules,
            main_cta: main_cta.into(),
            main_cta_link: main_cta_link.into(),
        };

        if body.product_modules.is_empty() {
            return Err(ContractError::new(Artifact::Body, "no feature modules"));
        }
        for (i, module) in body.product_modules.iter().enumerate() {
            let missing = [
                ("title", &module.title),
                ("content", &module.content),
                ("cta_text", &module.cta_text),
                ("cta_link", &module.cta_link),
            ]
            .into_iter()
            .find(|(_, value)| value.trim().is_empty());

            if let Some((field, _)) = missing {
                return Err(ContractError::new(
                    Artifact::Body,
                    format!("module {} has an empty {}", i + 1, field),
                ));
            }
        }
        if body.main_cta.trim().is_empty() {
            return Err(ContractError::new(Artifact::Body, "main_cta is empty"));
        }
        if body.main_cta_link.trim().is_empty() {
            return Err(ContractError::new(Artifact::Body, "main_cta_link is empty"));
        }

        Ok(body)
    }

    pub fn modules(&self) -> &[EmailModule] {
        &self.product_modules
    }

    pub fn main_cta(&self) -> &str {
        &self.main_cta
    }

    pub fn main_cta_link(&self) -> &str {
        &self.main_cta_link
    }

    /// Plain-text rendition used in the variant and in QA prompts.
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for module in &self.product_modules {
            text.push_str(&format!(
                "{}\n{}\n{}: {}\n\n",
                module.title, module.content, module.cta_text, module.cta_link
            ));
        }
        text.push_str(&format!("{}\n{}\n", self.main_cta, self.main_cta_link));
        text
    }
}

/// A QA review of one variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaFeedback {
    pub overall_rating: u8,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    pub needs_revision: bool,
}

impl QaFeedback {
    pub const RATING_RANGE: std::ops::RangeInclusive<u8> = 1..=10;

    /// Check the rating range.
    pub fn validate(&self) -> Result<(), ContractError> {
        if !Self::RATING_RANGE.contains(&self.overall_rating) {
            return Err(ContractError::new(
                Artifact::QaFeedback,
                format!("overall_rating {} is outside 1..=10", self.overall_rating),
            ));
        }
        Ok(())
    }
}

/// Outcome of the QA node as stored in the state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum QaVerdict {
    Parsed(QaFeedback),
    /// The reviewer answered but the answer could not be read
    Unparsable(String),
}

impl QaVerdict {
    /// Approved only when feedback parsed and did not ask for revision.
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Parsed(feedback) if !feedback.needs_revision)
    }

    pub fn feedback(&self) -> Option<&QaFeedback> {
        match self {
            Self::Parsed(feedback) => Some(feedback),
            Self::Unparsable(_) => None,
        }
    }
}

/// One assembled candidate email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailVariant {
    pub subject_line: SubjectLine,
    pub pre_header: Preheader,
    /// Plain-text body
    pub body: String,
    /// Structured body kept for HTML rendering
    pub layout: EmailBody,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

impl EmailVariant {
    pub fn new(subject_line: SubjectLine, pre_header: Preheader, layout: EmailBody) -> Self {
        Self { subject_line, pre_header, body: layout.to_text(), layout, html: None }
    }

    /// Text export: subject, preheader, body.
    pub fn to_text(&self) -> String {
        format!(
            "Subject: {}\nPre-header: {}\n\n{}",
            self.subject_line.as_str(),
            self.pre_header.as_str(),
            self.body
        )
    }
}

/// An approved variant, tagged with the tone it was written in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizedVariant {
    pub tone: String,
    pub content: EmailVariant,
    pub html: String,
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_line_length_limit() {
        assert!(SubjectLine::new("a".repeat(50)).is_ok());

        let err = SubjectLine::new("a".repeat(51)).unwrap_err();
        assert_eq!(err.artifact, Artifact::SubjectLine);
        assert!(err.reason.contains("51 characters"));
    }

    #[test]
    fn test_subject_line_counts_characters_not_bytes() {
        // 48 chars plus two multi-byte emoji
        let subject = format!("{}🔥🔥", "a".repeat(48));
        assert!(subject.len() > 50);
        assert!(SubjectLine::new(subject).is_ok());
    }

    #[test]
    fn test_subject_line_rejects_empty() {
        assert!(SubjectLine::new("   ").is_err());
    }

    #[test]
    fn test_preheader_bounds() {
        assert!(Preheader::new("a".repeat(49)).is_err());
        assert!(Preheader::new("a".repeat(50)).is_ok());
        assert!(Preheader::new("a".repeat(100)).is_ok());
        assert!(Preheader::new("a".repeat(101)).is_err());
    }

    #[test]
    fn test_deserialize_enforces_contract() {
        let result: Result<SubjectLine, _> = serde_json::from_str(&format!("\"{}\"", "x".repeat(60)));
        assert!(result.is_err());
    }

    #[test]
    fn test_body_requires_modules() {
        let err = EmailBody::new(vec![], "Shop", "https://example.com").unwrap_err();
        assert_eq!(err.reason, "no feature modules");
    }

    #[test]
    fn test_body_rejects_empty_module_field() {
        let mut module = fixtures::module("Battery");
        module.cta_link = String::new();

        let err = EmailBody::new(vec![module], "Shop", "https://example.com").unwrap_err();
        assert_eq!(err.reason, "module 1 has an empty cta_link");
    }

    #[test]
    fn test_body_deserialize_validates() {
        let json = r#"{"product_modules": [], "main_cta": "Shop", "main_cta_link": "https://x"}"#;
        assert!(serde_json::from_str::<EmailBody>(json).is_err());
    }

    #[test]
    fn test_body_text() {
        let text = fixtures::body().to_text();
        assert!(text.starts_with("Galaxy AI\n"));
        assert!(text.contains("Shop now: https://www.example.com/shop"));
        assert!(text.ends_with("Upgrade today\nhttps://www.example.com/\n"));
    }

    #[test]
    fn test_qa_rating_range() {
        let mut feedback = QaFeedback {
            overall_rating: 8,
            strengths: vec![],
            weaknesses: vec![],
            suggestions: vec![],
            needs_revision: false,
        };
        assert!(feedback.validate().is_ok());

        feedback.overall_rating = 0;
        assert!(feedback.validate().is_err());
        feedback.overall_rating = 11;
        assert!(feedback.validate().is_err());
    }

    #[test]
    fn test_verdict_approval() {
        let feedback = QaFeedback {
            overall_rating: 9,
            strengths: vec!["clear CTA".to_string()],
            weaknesses: vec![],
            suggestions: vec![],
            needs_revision: false,
        };
        assert!(QaVerdict::Parsed(feedback.clone()).is_approved());
        assert!(!QaVerdict::Parsed(QaFeedback { needs_revision: true, ..feedback }).is_approved());
        assert!(!QaVerdict::Unparsable("not json".to_string()).is_approved());
    }

    #[test]
    fn test_campaign_input_validation() {
        let products = vec![Product::new("Tab_S9", "tablets")];
        assert!(CampaignInput::new("Students", "Launch", products.clone(), 1).is_ok());
        assert!(CampaignInput::new(" ", "Launch", products.clone(), 1).is_err());
        assert!(CampaignInput::new("Students", "", products.clone(), 1).is_err());
        assert!(CampaignInput::new("Students", "Launch", vec![], 1).is_err());
        assert!(CampaignInput::new("Students", "Launch", products, 0).is_err());
    }

    #[test]
    fn test_product_parse() {
        let product = Product::parse("phones:Galaxy_S24").unwrap();
        assert_eq!(product.category, "phones");
        assert_eq!(product.name, "Galaxy_S24");

        assert!(Product::parse("Galaxy_S24").is_err());
        assert!(Product::parse("phones:").is_err());
    }

    #[test]
    fn test_product_identity_is_name() {
        assert_eq!(Product::new("Watch7", "watches"), Product::new("Watch7", "wearables"));
    }

    #[test]
    fn test_research_requires_both_summaries() {
        assert!(ProductResearch::new("Tab_A9", "  light and fast ", "10% off").is_ok());
        assert!(ProductResearch::new("Tab_A9", "", "10% off").is_err());
        assert!(ProductResearch::new("Tab_A9", "light", " \n").is_err());
    }
}
