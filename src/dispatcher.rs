//! Request dispatcher
//!
//! Classifies a query and routes it to either the general Q&A prompt or the
//! portfolio plan generator. Holds no per-request state.

use std::sync::Arc;
use tracing::info;

use crate::classifier::{QueryCategory, QueryClassifier};
use crate::gemini::TextGenerator;
use crate::models::{GenerateRequest, GenerateResponse, RiskLevel};
use crate::portfolio::PortfolioPlanGenerator;
use crate::Result;

pub fn build_general_prompt(query: &str, language: &str) -> String {
    format!(
        "Answer this finance question in a friendly tone and in {}: {}",
        language, query
    )
}

pub struct Dispatcher {
    classifier: Box<dyn QueryClassifier>,
    generator: Arc<dyn TextGenerator>,
    planner: Arc<dyn PortfolioPlanGenerator>,
}

impl Dispatcher {
    pub fn new(
        classifier: Box<dyn QueryClassifier>,
        generator: Arc<dyn TextGenerator>,
        planner: Arc<dyn PortfolioPlanGenerator>,
    ) -> Self {
        Self {
            classifier,
            generator,
            planner,
        }
    }

    pub fn classify(&self, query: &str) -> QueryCategory {
        self.classifier.classify(query)
    }

    pub async fn handle_general(&self, query: &str, language: &str) -> Result<String> {
        let prompt = build_general_prompt(query, language);
        self.generator.generate(&prompt).await
    }

    pub async fn handle_portfolio(
        &self,
        query: &str,
        risk: Option<RiskLevel>,
        language: &str,
    ) -> Result<String> {
        self.planner
            .generate_portfolio_plan(query, risk, language)
            .await
    }

    pub async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        let query = request.query();
        let language = request.language();

        let category = self.classify(query);
        info!(?category, %language, "Query classified");

        let response = match category {
            QueryCategory::General => self.handle_general(query, language).await?,
            QueryCategory::Portfolio => {
                self.handle_portfolio(query, request.risk(), language)
                    .await?
            }
        };

        Ok(GenerateResponse { response })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::KeywordClassifier;
    use crate::error::GatewayError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingGenerator {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextGenerator for RecordingGenerator {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("generated answer".to_string())
        }
    }

    #[derive(Default)]
    struct RecordingPlanner {
        calls: Mutex<Vec<(String, Option<RiskLevel>, String)>>,
    }

    #[async_trait]
    impl PortfolioPlanGenerator for RecordingPlanner {
        async fn generate_portfolio_plan(
            &self,
            query: &str,
            risk: Option<RiskLevel>,
            language: &str,
        ) -> Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((query.to_string(), risk, language.to_string()));
            Ok("portfolio plan".to_string())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl TextGenerator for FailingGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Err(GatewayError::LlmError("quota exceeded".into()))
        }
    }

    fn dispatcher() -> (Dispatcher, Arc<RecordingGenerator>, Arc<RecordingPlanner>) {
        let generator = Arc::new(RecordingGenerator::default());
        let planner = Arc::new(RecordingPlanner::default());
        let dispatcher = Dispatcher::new(
            Box::new(KeywordClassifier),
            generator.clone(),
            planner.clone(),
        );
        (dispatcher, generator, planner)
    }

    #[tokio::test]
    async fn test_general_question_scenario() {
        let (dispatcher, generator, planner) = dispatcher();
        let request = GenerateRequest::new("What is compound interest?");

        let response = dispatcher.generate(&request).await.unwrap();
        assert_eq!(response.response, "generated answer");

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(
            prompts.as_slice(),
            ["Answer this finance question in a friendly tone and in English: What is compound interest?"]
        );
        assert!(planner.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_portfolio_request_scenario() {
        let (dispatcher, generator, planner) = dispatcher();
        let request = GenerateRequest {
            query: Some("Build me a portfolio".into()),
            language: Some("French".into()),
            risk: Some(RiskLevel::High),
        };

        let response = dispatcher.generate(&request).await.unwrap();
        assert_eq!(response.response, "portfolio plan");

        let calls = planner.calls.lock().unwrap();
        assert_eq!(
            calls.as_slice(),
            [(
                "Build me a portfolio".to_string(),
                Some(RiskLevel::High),
                "French".to_string()
            )]
        );
        assert!(generator.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_query_is_general() {
        let (dispatcher, generator, _) = dispatcher();

        dispatcher
            .generate(&GenerateRequest::default())
            .await
            .unwrap();

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(
            prompts[0],
            "Answer this finance question in a friendly tone and in English: "
        );
    }

    #[tokio::test]
    async fn test_portfolio_without_risk_passes_none() {
        let (dispatcher, _, planner) = dispatcher();

        dispatcher
            .generate(&GenerateRequest::new("I am reinvesting dividends"))
            .await
            .unwrap();

        let calls = planner.calls.lock().unwrap();
        assert_eq!(calls[0].1, None);
        assert_eq!(calls[0].2, "English");
    }

    #[tokio::test]
    async fn test_upstream_failure_propagates() {
        let dispatcher = Dispatcher::new(
            Box::new(KeywordClassifier),
            Arc::new(FailingGenerator),
            Arc::new(RecordingPlanner::default()),
        );

        let err = dispatcher
            .generate(&GenerateRequest::new("What is a bond?"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::LlmError(_)));
    }
}
