//! Prompt construction for the council flow

pub mod template;

pub use template::PromptTemplate;
