#![allow(clippy::format_push_string)]
#![allow(clippy::unused_self)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::trivially_copy_pass_by_ref)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::should_implement_trait)]

//! # Mailforge
//!
//! Multi-product marketing email campaigns, generated by a local LLM workflow.
//!
//! A campaign run plans the campaign, researches every product against two
//! document stores (features, and pricing/promotions), then writes subject
//! line, preheader and body, has them reviewed, and renders approved variants
//! to HTML. Variants rotate through a fixed list of tones until each tone has
//! the requested number.
//!
//! ## Features
//!
//! - **Explicit workflow**: nine named nodes, two pure routing functions
//! - **Validated artifacts**: subject lines, preheaders and bodies are checked on construction
//! - **Fixed retry policy**: per node, with a per-attempt timeout
//! - **Bounded revisions**: QA cannot reject a variant forever
//! - **Local first**: Ollama by default, any OpenAI-compatible endpoint otherwise
//!
//! ## Quick Start
//!
//! ```bash
//! mailforge generate --segment "Existing customers" --campaign-type Reactivation \
//!     --product phones:Galaxy_S24 --product watches:Watch_Ultra
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::map_unwrap_or)]
#![allow(clippy::redundant_clone)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::use_self)]

pub mod ai;
pub mod campaign;
pub mod core;
pub mod retrieval;

// Re-export commonly used types
pub use ai::{AIError, GenerationProvider, GenerationRequest};
#[cfg(feature = "ai")]
pub use ai::{OllamaProvider, OpenAIProvider};
pub use campaign::{
    CampaignError, CampaignInput, CampaignState, ContentGenerator, NodeId, Product, RunError,
    WorkflowEngine,
};
pub use core::{CancelFlag, Config, RetryPolicy};
pub use retrieval::{DocumentStore, MemoryStore, StoreId};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "mailforge";
