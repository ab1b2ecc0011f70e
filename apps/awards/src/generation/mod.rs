// Recommendation generation: prompt composition, document rendering, output
// files and the batch loop that ties them together.
// All LLM calls go through llm_client.

pub mod composer;
pub mod document;
pub mod pipeline;
pub mod prompts;
pub mod writer;
