//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use mailforge::ai::{AIError, GenerationProvider, GenerationRequest};
use mailforge::campaign::{
    CampaignInput, CampaignState, ContentGenerator, NodePolicies, Product, ToneRotation,
    WorkflowEngine,
};
use mailforge::core::RetryPolicy;
use mailforge::retrieval::{DocumentStore, MemoryStore, StoreId};

/// Which generator a request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Plan,
    Research,
    Offers,
    Subject,
    Preheader,
    Body,
    Qa,
}

fn kind_of(request: &GenerationRequest) -> Kind {
    let system = request.system.as_deref().unwrap_or_default();
    if system.contains("planner") {
        Kind::Plan
    } else if system.contains("pricing and promotions") {
        Kind::Offers
    } else if system.contains("product marketing") {
        Kind::Research
    } else if system.contains("subject line") {
        Kind::Subject
    } else if system.contains("preheader") {
        Kind::Preheader
    } else if system.contains("body writer") {
        Kind::Body
    } else {
        Kind::Qa
    }
}

pub const SUBJECT: &str = "[NAME], Galaxy AI is waiting for you";
pub const PREHEADER: &str = "Trade in any phone and save up to $750 on Galaxy S24 before Sunday.";

pub fn approve() -> String {
    r#"{"overall_rating": 9, "strengths": ["clear offer"], "weaknesses": [], "suggestions": [], "needs_revision": false}"#
        .to_string()
}

pub fn reject() -> String {
    r#"{"overall_rating": 4, "strengths": [], "weaknesses": ["no offer"], "suggestions": ["lead with the trade-in credit"], "needs_revision": true}"#
        .to_string()
}

const BODY: &str = r#"{
    "product_modules": [
        {"title": "Galaxy AI", "content": "Circle to search anything", "cta_text": "Explore", "cta_link": "https://www.example.com/ai"},
        {"title": "Titanium build", "content": "Tough enough for the trail", "cta_text": "See more", "cta_link": "https://www.example.com/watch"}
    ],
    "main_cta": "Shop the collection",
    "main_cta_link": "https://www.example.com/"
}"#;

#[derive(Default)]
struct Script {
    calls: Vec<(Kind, GenerationRequest)>,
    /// (calls to let through first, failures after that)
    failures: HashMap<Kind, (usize, usize)>,
    delays: HashMap<Kind, Duration>,
    qa_answers: VecDeque<String>,
    subject: Option<String>,
}

/// Provider that answers every generator with valid output unless told otherwise.
#[derive(Default)]
pub struct FakeProvider {
    script: Mutex<Script>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the first `times` requests of a kind.
    pub fn fail(self, kind: Kind, times: usize) -> Self {
        self.fail_after(kind, 0, times)
    }

    /// Let `skip` requests of a kind through, then fail the next `times`.
    pub fn fail_after(self, kind: Kind, skip: usize, times: usize) -> Self {
        self.script.lock().unwrap().failures.insert(kind, (skip, times));
        self
    }

    /// Sleep before answering a kind.
    pub fn delay(self, kind: Kind, delay: Duration) -> Self {
        self.script.lock().unwrap().delays.insert(kind, delay);
        self
    }

    /// QA answers in order; approval once the script runs out.
    pub fn qa_answers(self, answers: Vec<String>) -> Self {
        self.script.lock().unwrap().qa_answers = answers.into();
        self
    }

    /// Subject the writer always returns.
    pub fn subject(self, subject: impl Into<String>) -> Self {
        self.script.lock().unwrap().subject = Some(subject.into());
        self
    }

    pub fn calls(&self, kind: Kind) -> usize {
        self.script.lock().unwrap().calls.iter().filter(|(k, _)| *k == kind).count()
    }

    pub fn total_calls(&self) -> usize {
        self.script.lock().unwrap().calls.len()
    }

    pub fn prompts(&self, kind: Kind) -> Vec<String> {
        self.script
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, r)| r.prompt.clone())
            .collect()
    }
}

#[async_trait]
impl GenerationProvider for FakeProvider {
    async fn complete(&self, request: &GenerationRequest) -> Result<String, AIError> {
        let kind = kind_of(request);

        let (delay, fail, answer) = {
            let mut script = self.script.lock().unwrap();
            script.calls.push((kind, request.clone()));
            let seen = script.calls.iter().filter(|(k, _)| *k == kind).count();

            let fail = script
                .failures
                .get(&kind)
                .is_some_and(|(skip, times)| seen > *skip && seen <= skip + times);

            let answer = match kind {
                Kind::Plan => "Goal: reactivate lapsed owners with trade-in offers.".to_string(),
                Kind::Research => "Galaxy AI, 50MP camera, all-day battery.".to_string(),
                Kind::Offers => "Up to $750 trade-in credit, 0% APR for 36 months.".to_string(),
                Kind::Subject => {
                    let subject = script.subject.clone().unwrap_or_else(|| SUBJECT.to_string());
                    serde_json::json!({ "subject": subject }).to_string()
                }
                Kind::Preheader => serde_json::json!({ "preheader": PREHEADER }).to_string(),
                Kind::Body => BODY.to_string(),
                Kind::Qa => script.qa_answers.pop_front().unwrap_or_else(approve),
            };

            (script.delays.get(&kind).copied(), fail, answer)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(AIError::Transport("connection refused".to_string()));
        }
        Ok(answer)
    }

    fn name(&self) -> &str {
        "fake"
    }

    async fn is_available(&self) -> bool {
        true
    }
}

/// Retry policy with the default attempt count and a tiny delay.
pub fn quick_policy() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(1)).with_attempt_timeout(Some(Duration::from_secs(5)))
}

pub fn tones(labels: &[&str]) -> ToneRotation {
    ToneRotation::new(labels.iter().map(|t| t.to_string()).collect()).unwrap()
}

pub fn input(products: usize, variants_per_tone: usize) -> CampaignInput {
    let catalog = [
        Product::new("Galaxy_S24", "phones"),
        Product::new("Watch_Ultra", "watches"),
        Product::new("Tab_S9", "tablets"),
    ];
    CampaignInput::new(
        "Existing customers",
        "Reactivation",
        catalog.into_iter().take(products).collect(),
        variants_per_tone,
    )
    .unwrap()
}

pub fn state(products: usize, variants_per_tone: usize, tone_labels: &[&str]) -> CampaignState {
    CampaignState::new(input(products, variants_per_tone), tones(tone_labels))
}

pub fn store() -> MemoryStore {
    MemoryStore::new()
        .with_document(StoreId::ProductFeatures, "Galaxy S24 features Galaxy AI and a 50MP camera")
        .with_document(StoreId::Promotions, "Galaxy S24 pricing: trade-in deals up to $750")
}

/// Engine over a fake provider with fast retries.
pub fn engine(provider: Arc<FakeProvider>, store: impl DocumentStore + 'static) -> WorkflowEngine {
    let generator = ContentGenerator::new(provider).with_contract_attempts(1);
    WorkflowEngine::new(generator, Arc::new(store))
        .with_policies(NodePolicies::uniform(quick_policy()))
}
