pub mod chain;
pub mod loader;
pub mod openai;
pub mod provider;

pub use chain::{DocumentSummarizer, Summarizer, Summary};
pub use loader::{TextSplitter, extract_pdf_text};
pub use openai::OpenAiProvider;
pub use provider::LlmProvider;
