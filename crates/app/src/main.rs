use anyhow::Context;
use axum::extract::{Form, State};
use axum::response::Html;
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use clap::Parser;
use pdf_chat_core::{
    ingest_document, AnswerPipeline, ChunkingConfig, OllamaEmbedder, OllamaGenerator,
    PromptBuilder, PromptVariant, Retriever, VectorIndex,
};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pdf-chat-server", version)]
struct Cli {
    /// PDF document to answer questions about.
    #[arg(long, env = "PDF_CHAT_DOCUMENT")]
    document: PathBuf,

    /// Directory holding the persisted vector index.
    #[arg(long, env = "PDF_CHAT_PERSIST_DIR", default_value = "./vector_store")]
    persist_dir: PathBuf,

    /// Collection name inside the persistence directory.
    #[arg(long, default_value = "document_chunks")]
    collection: String,

    /// Target chunk size in characters.
    #[arg(long, default_value = "1000")]
    chunk_size: usize,

    /// Overlap between consecutive chunks in characters.
    #[arg(long, default_value = "200")]
    chunk_overlap: usize,

    /// Number of chunks retrieved per question.
    #[arg(long, default_value = "3")]
    top_k: usize,

    /// Ollama embedding model.
    #[arg(long, default_value = "nomic-embed-text")]
    embedding_model: String,

    /// Ollama generation model.
    #[arg(long, default_value = "llama3.2")]
    generation_model: String,

    /// Decoding temperature for generation.
    #[arg(long, default_value = "0.1")]
    temperature: f32,

    /// Prompt template variant: "permissive" or "strict".
    #[arg(long, default_value = "permissive")]
    prompt_variant: String,

    /// Subject domain the document covers, referenced by the prompt.
    #[arg(long, default_value = "rugby")]
    domain: String,

    /// Maximum number of memoized question contexts.
    #[arg(long, default_value = "50")]
    cache_capacity: usize,

    /// Base URL of the Ollama server.
    #[arg(long, env = "OLLAMA_BASE_URL", default_value = "http://localhost:11434")]
    ollama_url: String,

    /// Host to serve the question form on.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to serve the question form on.
    #[arg(long, default_value = "7860")]
    port: u16,
}

struct AppState {
    pipeline: AnswerPipeline<OllamaEmbedder, OllamaGenerator>,
    document_title: String,
}

const EXAMPLE_QUESTIONS: [&str; 3] = [
    "What is rugby?",
    "How long does a rugby match last?",
    "What are the main rules?",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        started_at = %Utc::now().to_rfc3339(),
        "pdf-chat-server boot"
    );

    let variant: PromptVariant = cli
        .prompt_variant
        .parse()
        .map_err(|reason: String| anyhow::anyhow!(reason))?;

    let chunking = ChunkingConfig {
        chunk_size: cli.chunk_size,
        chunk_overlap: cli.chunk_overlap,
    };

    let (fingerprint, chunks) = ingest_document(&cli.document, chunking)
        .with_context(|| format!("failed to ingest {}", cli.document.display()))?;

    let embedder = OllamaEmbedder::new(&cli.ollama_url, &cli.embedding_model)
        .context("invalid embedding endpoint")?;
    let generator = OllamaGenerator::new(&cli.ollama_url, &cli.generation_model, cli.temperature)
        .context("invalid generation endpoint")?;

    let index = VectorIndex::open_or_build(&cli.persist_dir, &cli.collection, chunks, &embedder)
        .await
        .context("vector index startup failed")?;
    info!(
        collection = %cli.collection,
        entries = index.len(),
        "vector index ready"
    );

    let retriever = Retriever::new(Arc::new(index), embedder, cli.top_k);
    let prompt = PromptBuilder::new(variant, &cli.domain);
    let pipeline = AnswerPipeline::new(retriever, cli.cache_capacity, prompt, generator);

    let state = Arc::new(AppState {
        pipeline,
        document_title: fingerprint.document_title.clone(),
    });

    let app = Router::new()
        .route("/", get(form_page))
        .route("/ask", post(ask))
        .with_state(state);

    let bind_addr = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!(%bind_addr, "serving question form");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn form_page(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render_page(&state.document_title, "", None, None))
}

#[derive(Deserialize)]
struct AskForm {
    question: String,
}

async fn ask(State(state): State<Arc<AppState>>, Form(form): Form<AskForm>) -> Html<String> {
    let question = form.question.trim().to_string();
    if question.is_empty() {
        return Html(render_page(
            &state.document_title,
            "",
            None,
            Some("Please enter a question."),
        ));
    }

    match state.pipeline.answer(&question).await {
        Ok(answer) => Html(render_page(
            &state.document_title,
            &question,
            Some(&answer),
            None,
        )),
        Err(error) => {
            warn!(%error, %question, "request failed");
            Html(render_page(
                &state.document_title,
                &question,
                None,
                Some(&error.to_string()),
            ))
        }
    }
}

fn render_page(title: &str, question: &str, answer: Option<&str>, error: Option<&str>) -> String {
    let mut body = String::new();

    body.push_str(&format!(
        "<h1>RAG Chatbot: {}</h1>\n\
         <p>Ask a question about the document.</p>\n",
        escape_html(title)
    ));

    body.push_str(&format!(
        "<form method=\"post\" action=\"/ask\">\n\
         <input type=\"text\" name=\"question\" size=\"80\" \
         placeholder=\"Ex: What is a try in rugby?\" value=\"{}\">\n\
         <button type=\"submit\">Ask</button>\n\
         </form>\n",
        escape_html(question)
    ));

    if let Some(error) = error {
        body.push_str(&format!(
            "<p class=\"error\"><strong>Error:</strong> {}</p>\n",
            escape_html(error)
        ));
    }

    if let Some(answer) = answer {
        body.push_str(&format!(
            "<h2>Answer</h2>\n<pre>{}</pre>\n",
            escape_html(answer)
        ));
    }

    body.push_str("<h3>Example questions</h3>\n<ul>\n");
    for example in EXAMPLE_QUESTIONS {
        body.push_str(&format!("<li>{}</li>\n", escape_html(example)));
    }
    body.push_str("</ul>\n");

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>RAG Chatbot</title>\n\
         <style>body {{ font-family: sans-serif; margin: 2em; }} \
         pre {{ white-space: pre-wrap; background: #f4f4f4; padding: 1em; }} \
         .error {{ color: #b00020; }}</style>\n\
         </head>\n<body>\n{body}</body>\n</html>\n"
    )
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for character in raw.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::{escape_html, render_page};

    #[test]
    fn html_special_characters_are_escaped() {
        assert_eq!(
            escape_html("<think> & \"quotes\""),
            "&lt;think&gt; &amp; &quot;quotes&quot;"
        );
    }

    #[test]
    fn error_page_shows_the_message_not_a_crash() {
        let page = render_page("rules.pdf", "What is a try?", None, Some("generation failed"));
        assert!(page.contains("generation failed"));
        assert!(page.contains("What is a try?"));
    }

    #[test]
    fn answer_page_embeds_the_sanitized_answer() {
        let page = render_page("rules.pdf", "q", Some("A try is worth five points."), None);
        assert!(page.contains("A try is worth five points."));
    }
}
