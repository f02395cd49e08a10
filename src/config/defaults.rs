//! Default values for configuration

/// Default OpenAI-compatible API base URL
pub fn default_api_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

/// Default timeout for each provider call, in seconds
pub fn default_request_timeout_secs() -> u64 {
    60
}

/// Default embedding model
pub fn default_embedding_model() -> String {
    "text-embedding-ada-002".to_string()
}

/// Default number of chunk texts per embedding request
pub fn default_embedding_batch_size() -> usize {
    64
}

/// Default chat completion model
pub fn default_chat_model() -> String {
    "gpt-3.5-turbo".to_string()
}

/// Default maximum characters per chunk
pub fn default_chunk_size() -> usize {
    1000
}

/// Default overlap characters between consecutive chunks
pub fn default_chunk_overlap() -> usize {
    200
}

/// Default number of chunks retrieved per question
pub fn default_top_k() -> usize {
    4
}

/// Default knowledge base directory
pub fn default_knowledge_base_path() -> String {
    "./data/knowledge_base".to_string()
}

/// Default persisted index directory
pub fn default_vector_store_path() -> String {
    "./data/vector_store".to_string()
}

/// Default file extensions picked up by the loader
pub fn default_loader_extensions() -> Vec<String> {
    vec!["txt".to_string()]
}
