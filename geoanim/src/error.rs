use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown animation '{name}' requested for {animatable}")]
    UnknownAnimation { name: String, animatable: String },

    #[error("function '{function}' expects {expected} argument(s), got {actual}")]
    Arity {
        function: String,
        expected: usize,
        actual: usize,
    },

    #[error("unknown function: {name}")]
    UnknownFunction { name: String },

    #[error("failed to parse expression '{source_text}' at {position}: {message}")]
    ExpressionParse {
        source_text: String,
        position: usize,
        message: String,
    },

    #[error("unknown bone '{bone}' referenced by animation '{animation}'")]
    MissingBone { animation: String, bone: String },

    #[error("invalid value: {message}")]
    InvalidValue { message: String },
}
