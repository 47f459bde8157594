//! OpenTelemetry GenAI semantic convention attribute names.
//!
//! `tracing` macros need literal field names, so spans declare these fields
//! inline (with `field::Empty` for values known only later). Code that fills
//! a field in after the fact uses the constants with `Span::record`.

/// The name of the operation being performed (e.g. "chat").
pub const GEN_AI_OPERATION_NAME: &str = "gen_ai.operation.name";

/// The name of the GenAI provider (e.g. "groq").
pub const GEN_AI_PROVIDER_NAME: &str = "gen_ai.provider.name";

/// The model id requested.
pub const GEN_AI_REQUEST_MODEL: &str = "gen_ai.request.model";

/// The model id that actually served the response.
pub const GEN_AI_RESPONSE_MODEL: &str = "gen_ai.response.model";

/// The unique response id from the provider.
pub const GEN_AI_RESPONSE_ID: &str = "gen_ai.response.id";

/// The number of input tokens consumed.
pub const GEN_AI_USAGE_INPUT_TOKENS: &str = "gen_ai.usage.input_tokens";

/// The number of output tokens generated.
pub const GEN_AI_USAGE_OUTPUT_TOKENS: &str = "gen_ai.usage.output_tokens";

/// Standard chat completion operation.
pub const OP_CHAT: &str = "chat";

/// Groq provider identifier.
pub const PROVIDER_GROQ: &str = "groq";
