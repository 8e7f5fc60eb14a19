//! Subcommand implementations.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use lore_invoke::{
    BackendConfig, ChatClient, InvokeOptions, ResilientInvoker, RetryHooks, clean_json_output,
};
use lore_retrieval::{OpenAIProvider, RetrievalConfig, RetrievalService, ScoredHit};
use tracing::info;

const SYSTEM_PROMPT: &str = "You are a helpful customer support assistant for Swiss Airlines. \
Answer the traveller's question using only the policy excerpts below. \
If the excerpts do not cover the question, say so.";

const JSON_INSTRUCTION: &str = "Reply with a single JSON object with the keys \
\"answer\" (string) and \"allowed\" (true, false or null).";

pub struct AskArgs {
    pub model: String,
    pub base_url: Option<String>,
    pub max_attempts: u32,
    pub session: String,
    pub json: bool,
}

pub fn build_service(
    data_dir: Option<PathBuf>,
    corpus_url: Option<String>,
    embedding_model: &str,
) -> RetrievalService {
    let mut config = data_dir.map(RetrievalConfig::new).unwrap_or_default();
    if let Some(url) = corpus_url {
        config = config.with_corpus_url(url);
    }
    let provider = OpenAIProvider::new().with_model(embedding_model);
    RetrievalService::new(config, Arc::new(provider))
}

pub async fn query(service: &RetrievalService, text: &str, k: Option<usize>) -> anyhow::Result<()> {
    let hits = match k {
        Some(k) => service.query(text, k).await?,
        None => service.search(text).await?,
    };
    for (rank, hit) in hits.iter().enumerate() {
        println!("{}", format_hit(rank + 1, hit));
    }
    Ok(())
}

pub async fn lookup(service: &RetrievalService, text: &str) -> anyhow::Result<()> {
    println!("{}", service.lookup(text).await?);
    Ok(())
}

pub async fn ask(service: &RetrievalService, question: &str, args: &AskArgs) -> anyhow::Result<()> {
    let context = service.lookup(question).await?;
    let system = system_prompt(&context, args.json);

    let mut backend = BackendConfig::for_model(&args.model)?;
    if let Some(url) = &args.base_url {
        backend = backend.with_base_url(url);
    }
    let client = ChatClient::new(backend).context("failed to build chat client")?;
    info!("Asking {} with {} characters of context", args.model, context.len());

    let mut hooks = RetryHooks::new();
    if args.json {
        hooks = hooks.with_validator(|reply: &String| validate_json_answer(reply));
    }
    let options = InvokeOptions::new()
        .with_name("policy-answer")
        .with_session_id(&args.session)
        .with_tags([args.model.clone()])
        .with_max_attempts(args.max_attempts);

    let json = args.json;
    let answer = ResilientInvoker::default()
        .invoke_with_retries(
            |question: String| {
                let client = &client;
                let system = system.as_str();
                async move {
                    let reply = client.complete(system, &question).await?;
                    Ok::<_, lore_invoke::InvokeError>(if json {
                        clean_json_output(&reply)
                    } else {
                        reply
                    })
                }
            },
            question.to_string(),
            &hooks,
            &options,
        )
        .await;

    match answer {
        Some(answer) => println!("{answer}"),
        None => anyhow::bail!("no answer after {} attempts", args.max_attempts),
    }
    Ok(())
}

fn system_prompt(context: &str, json: bool) -> String {
    let mut prompt = format!("{SYSTEM_PROMPT}\n\n<policies>\n{context}\n</policies>");
    if json {
        prompt.push_str("\n\n");
        prompt.push_str(JSON_INSTRUCTION);
    }
    prompt
}

fn validate_json_answer(reply: &str) -> Result<(), String> {
    let value: serde_json::Value =
        serde_json::from_str(reply).map_err(|e| format!("reply is not JSON: {e}"))?;
    if value.get("answer").is_some_and(serde_json::Value::is_string) {
        Ok(())
    } else {
        Err("reply has no string `answer`".to_string())
    }
}

fn format_hit(rank: usize, hit: &ScoredHit) -> String {
    let heading = hit
        .document
        .content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default();
    format!("{rank}. [{:.3}] {heading}", hit.similarity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lore_retrieval::Document;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_system_prompt_wraps_context() {
        let prompt = system_prompt("## Pets\nCats travel in the cabin.", false);
        assert!(prompt.starts_with(SYSTEM_PROMPT));
        assert!(prompt.ends_with("<policies>\n## Pets\nCats travel in the cabin.\n</policies>"));

        let prompt = system_prompt("ctx", true);
        assert!(prompt.ends_with(JSON_INSTRUCTION));
    }

    #[test]
    fn test_validate_json_answer() {
        assert!(validate_json_answer(r#"{"answer": "Yes", "allowed": true}"#).is_ok());
        assert_eq!(
            validate_json_answer(r#"{"allowed": true}"#),
            Err("reply has no string `answer`".to_string())
        );
        assert!(validate_json_answer("Yes, you can.").is_err());
    }

    #[test]
    fn test_format_hit_uses_first_line() {
        let hit = ScoredHit {
            document: Document::new("\n## Baggage\nOne bag is free."),
            similarity: 0.71234,
        };
        assert_eq!(format_hit(2, &hit), "2. [0.712] ## Baggage");
    }
}
