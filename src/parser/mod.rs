use std::path::Path;

use anyhow::Context;
use thiserror::Error;

mod lexer;
mod parser;

pub use lexer::Range;
pub use parser::parse;

use crate::scene::Scene;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("unrecognized input `{text}` at {range}")]
    LexerError { text: String, range: Range },

    #[error("expected {expected}, found `{found}` at {range}")]
    Unexpected {
        expected: &'static str,
        found: String,
        range: Range,
    },

    #[error("unexpected end of input, expected {0}")]
    UnexpectedEof(&'static str),

    #[error("{message} at {range}")]
    Invalid {
        message: &'static str,
        range: Range,
    },
}

/// Read and parse the scene description at `path`.
pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Scene> {
    let path = path.as_ref();
    let input = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read scene file `{}`", path.display()))?;
    parse(&input).with_context(|| format!("failed to parse scene file `{}`", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_shipped_scene() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/scenes/pulse.scene");
        assert_eq!(Scene::default(), load(path).expect("load"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load("no/such/file.scene").expect_err("load should fail");
        assert!(err.to_string().contains("no/such/file.scene"));
    }
}
