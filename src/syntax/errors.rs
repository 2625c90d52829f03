use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyntaxError {
    #[error("failed to set language for parser")]
    LanguageSet,

    #[error("failed to parse source code")]
    ParseFailed,

    #[error("syntax error detected at byte {byte_start}..{byte_end}")]
    Malformed { byte_start: usize, byte_end: usize },
}
