use crate::llm::{CompletionRequest, LlmClient, Message, ResponseFormat};
use crate::statement_extractor::types::{ExtractError, ExtractionOptions};
use extractors::{normalize_transactions_with_stats, recover_json, JsonRecoveryError};
use shared_types::{ExtractionResult, TransactionRecord};
use std::sync::Arc;
use std::time::Instant;

/// Turns raw statement text into normalized transactions with a single LLM call.
pub struct StatementExtractor {
    llm_client: Arc<dyn LlmClient>,
    options: ExtractionOptions,
}

impl StatementExtractor {
    pub fn new(llm_client: Arc<dyn LlmClient>, options: ExtractionOptions) -> Self {
        Self {
            llm_client,
            options,
        }
    }

    /// Never fails: every error is folded into a failure envelope.
    pub async fn extract_transactions(&self, raw_text: &str) -> ExtractionResult {
        match self.run(raw_text).await {
            Ok(transactions) => ExtractionResult::success(transactions),
            Err(e) => {
                tracing::error!("Statement extraction failed: {}", e);
                ExtractionResult::failure(e.to_string())
            }
        }
    }

    async fn run(&self, raw_text: &str) -> Result<Vec<TransactionRecord>, ExtractError> {
        if raw_text.trim().is_empty() {
            return Err(ExtractError::EmptyInput);
        }

        let request = self.build_request(raw_text);
        tracing::info!(
            model = %request.model,
            text_len = raw_text.len(),
            "Requesting transaction extraction"
        );

        let started = Instant::now();
        let completion = self.llm_client.complete(request).await?;
        tracing::info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "LLM call finished"
        );

        if completion.finish_reason.as_deref() == Some("length") {
            tracing::warn!("LLM output hit the token limit, relying on JSON repair");
        }

        let parsed = recover_json(&completion.content).inspect_err(log_unparseable)?;
        let batch = normalize_transactions_with_stats(&parsed);
        if batch.dropped > 0 {
            tracing::info!(dropped = batch.dropped, "Discarded invalid transaction entries");
        }
        tracing::info!(count = batch.records.len(), "Extracted transactions");

        Ok(batch.records)
    }

    fn build_request(&self, raw_text: &str) -> CompletionRequest {
        let response_format = if self.options.json_mode {
            ResponseFormat::JsonObject
        } else {
            ResponseFormat::Text
        };

        CompletionRequest {
            model: self.options.model.clone(),
            messages: vec![
                Message::system(super::system_prompt::build_system_prompt()),
                Message::user(raw_text),
            ],
            temperature: Some(self.options.temperature),
            max_tokens: Some(self.options.max_tokens),
            response_format: Some(response_format),
        }
    }
}

fn log_unparseable(err: &JsonRecoveryError) {
    tracing::warn!(snippet = err.snippet(), "Unparseable LLM output: {}", err);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{CompletionResponse, LlmError, Role};
    use async_trait::async_trait;
    use shared_types::TransactionType;
    use std::sync::Mutex;

    /// Replays canned completions and records every request
    struct ScriptedClient {
        reply: Mutex<Option<Result<CompletionResponse, LlmError>>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedClient {
        fn replying(content: &str) -> Arc<Self> {
            Self::with(Ok(CompletionResponse {
                content: content.to_string(),
                model: None,
                finish_reason: Some("stop".to_string()),
            }))
        }

        fn with(reply: Result<CompletionResponse, LlmError>) -> Arc<Self> {
            Arc::new(Self {
                reply: Mutex::new(Some(reply)),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedClient {
        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            self.requests.lock().unwrap().push(request);
            self.reply
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Err(LlmError::EmptyCompletion))
        }
    }

    fn extractor(client: Arc<ScriptedClient>) -> StatementExtractor {
        StatementExtractor::new(client, ExtractionOptions::default())
    }

    #[tokio::test]
    async fn test_extracts_from_prose_wrapped_output() {
        let client = ScriptedClient::replying(
            r#"Here you go: {"transactions":[{"date":"2024-01-02","description":"ATM WDL","amount":"12.50","type":"Debit","balance":"987.50"}]} thanks"#,
        );
        let result = extractor(client.clone())
            .extract_transactions("02/01/24 ATM WDL 12.50 987.50")
            .await;

        assert!(result.success);
        assert_eq!(result.count, Some(1));
        let txns = result.transactions.unwrap();
        assert_eq!(txns[0].amount, 12.5);
        assert_eq!(txns[0].transaction_type, TransactionType::Debit);
        assert_eq!(txns[0].balance, Some(987.5));
        assert_eq!(txns[0].date.as_deref(), Some("2024-01-02"));
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_request_shape() {
        let client = ScriptedClient::replying(r#"{"transactions": []}"#);
        extractor(client.clone())
            .extract_transactions("statement body")
            .await;

        let requests = client.requests.lock().unwrap();
        let request = &requests[0];
        assert_eq!(request.model, "qwen/qwen3-235b-a22b-2507");
        assert_eq!(request.temperature, Some(0.2));
        assert_eq!(request.max_tokens, Some(4096));
        assert_eq!(request.response_format, Some(ResponseFormat::JsonObject));
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.messages[1].role, Role::User);
        assert_eq!(request.messages[1].content, "statement body");
    }

    #[tokio::test]
    async fn test_json_mode_off_requests_text() {
        let client = ScriptedClient::replying(r#"{"transactions": []}"#);
        let options = ExtractionOptions {
            json_mode: false,
            ..ExtractionOptions::default()
        };
        StatementExtractor::new(client.clone(), options)
            .extract_transactions("statement body")
            .await;

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests[0].response_format, Some(ResponseFormat::Text));
    }

    #[tokio::test]
    async fn test_invalid_entries_are_dropped() {
        let client = ScriptedClient::replying(
            r#"{"transactions":[
                {"amount": 10, "type": "Credit"},
                {"amount": 5, "type": "Transfer"},
                {"amount": null, "type": "Debit"},
                {"amount": "N/A", "type": "Debit"},
                {"amount": "1,234.56CR", "type": "Credit"}
            ]}"#,
        );
        let result = extractor(client).extract_transactions("text").await;

        assert!(result.success);
        assert_eq!(result.count, Some(2));
        let amounts: Vec<f64> = result
            .transactions
            .unwrap()
            .iter()
            .map(|t| t.amount)
            .collect();
        assert_eq!(amounts, vec![10.0, 1234.56]);
    }

    #[tokio::test]
    async fn test_truncated_output_keeps_complete_entries() {
        let client = ScriptedClient::with(Ok(CompletionResponse {
            content: r#"{"transactions":[{"amount":1,"type":"Credit"},{"amou"#.to_string(),
            model: None,
            finish_reason: Some("length".to_string()),
        }));
        let result = extractor(client).extract_transactions("text").await;

        assert!(result.success);
        assert_eq!(result.count, Some(1));
        assert_eq!(result.transactions.unwrap()[0].amount, 1.0);
    }

    #[tokio::test]
    async fn test_malformed_numbers_do_not_sink_the_batch() {
        let client = ScriptedClient::replying(
            r#"{"transactions":[
                {"date":2024-01-01,"amount":05.00,"type":"Debit"},
                {"date":"2024-01-02","amount":7,"type":"Credit"}
            ]}"#,
        );
        let result = extractor(client).extract_transactions("text").await;

        assert!(result.success);
        let txns = result.transactions.unwrap();
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[0].amount, 5.0);
        assert_eq!(txns[0].date.as_deref(), Some("2024-01-01"));
        assert_eq!(txns[1].amount, 7.0);
    }

    #[tokio::test]
    async fn test_llm_error_becomes_failure() {
        let client = ScriptedClient::with(Err(LlmError::Status {
            status: 401,
            body: "invalid key".to_string(),
        }));
        let result = extractor(client).extract_transactions("text").await;

        assert!(!result.success);
        assert!(result.transactions.is_none());
        assert_eq!(
            result.error.as_deref(),
            Some("LLM returned status 401: invalid key")
        );
    }

    #[tokio::test]
    async fn test_unparseable_output_becomes_failure() {
        let client = ScriptedClient::replying("I could not find any transactions.");
        let result = extractor(client).extract_transactions("text").await;

        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("Failed to extract valid JSON structure from LLM output.")
        );
    }

    #[tokio::test]
    async fn test_blank_text_skips_llm() {
        let client = ScriptedClient::replying(r#"{"transactions": []}"#);
        let result = extractor(client.clone()).extract_transactions(" \n\t ").await;

        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("No text could be extracted from the document")
        );
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_transactions_key_is_empty_success() {
        let client = ScriptedClient::replying(r#"{"rows": [{"amount": 1, "type": "Debit"}]}"#);
        let result = extractor(client).extract_transactions("text").await;

        assert!(result.success);
        assert_eq!(result.count, Some(0));
        assert_eq!(result.transactions, Some(vec![]));
    }
}
