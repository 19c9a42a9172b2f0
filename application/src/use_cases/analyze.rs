//! Discussion analyzer
//!
//! Two advisory judgment calls made between rounds, each a single short
//! invocation of a fixed lightweight participant. Neither call can fail the
//! workflow: runner errors and unreadable answers resolve to "stop" and
//! "no input needed" respectively.

use crate::config::{AnalysisConfig, WorkflowConfig};
use crate::ports::agent_runner::{AgentRunner, RunOptions};
use roundtable_domain::analysis::{
    ContinuationDecision, InputGap, parse_continuation, parse_input_gap, truncate_document,
};
use roundtable_domain::PromptTemplate;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct DiscussionAnalyzer<R: AgentRunner + 'static> {
    runner: Arc<R>,
    config: AnalysisConfig,
    base_options: RunOptions,
}

impl<R: AgentRunner + 'static> DiscussionAnalyzer<R> {
    pub fn new(runner: Arc<R>, workflow: &WorkflowConfig) -> Self {
        let config = workflow.analysis.clone();
        let base_options = workflow
            .run_options(config.timeout)
            .with_model(config.model.clone());
        Self {
            runner,
            config,
            base_options,
        }
    }

    /// Should the discussion run another round after `round`?
    pub async fn should_continue(
        &self,
        document: &str,
        round: u32,
        max_rounds: u32,
    ) -> ContinuationDecision {
        let prompt = PromptTemplate::continuation(&self.bounded(document), round, max_rounds);
        let Some(response) = self.ask(&prompt, &format!("continuation-{}", round)).await else {
            return ContinuationDecision::analysis_failed();
        };
        let decision = parse_continuation(&response);
        info!(
            round,
            should_continue = decision.should_continue,
            "Continuation analysis: {}",
            decision.reason
        );
        decision
    }

    /// Does the discussion need facts only the user can provide?
    pub async fn find_input_gaps(&self, document: &str, round: u32) -> InputGap {
        let prompt = PromptTemplate::input_gap(&self.bounded(document));
        let Some(response) = self.ask(&prompt, &format!("gap-{}", round)).await else {
            return InputGap::none();
        };
        let gap = parse_input_gap(&response);
        debug!(round, needs_input = gap.needs_input, questions = gap.questions.len(), "Gap analysis");
        gap
    }

    fn bounded(&self, document: &str) -> String {
        truncate_document(document, self.config.max_document_chars)
    }

    async fn ask(&self, prompt: &str, label: &str) -> Option<String> {
        let options = self.base_options.clone().with_label(label);
        match self.runner.run(self.config.participant, prompt, &options).await {
            Ok(turn) if !turn.clean_text.trim().is_empty() => Some(turn.clean_text),
            Ok(_) => {
                warn!("Analysis call {} returned no text", label);
                None
            }
            Err(e) => {
                warn!("Analysis call {} failed: {}", label, e);
                None
            }
        }
    }
}
