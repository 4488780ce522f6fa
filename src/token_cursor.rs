use std::{
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

use json_event_parser::{JsonEvent, ReaderJsonParser};

use crate::error::{Error, Result};

/// One unit of the JSON input stream.
///
/// Tokens are transient: the transducer inspects the current token and
/// moves on, never retaining one across steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawToken {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    FieldName(String),
    StringValue(String),
    IntValue(i64),
    /// A scalar the transducer never consults (float, boolean, null).
    OtherValue,
}

/// Pull-based cursor over a streaming JSON tokenizer.
///
/// Strictly forward; the only side effect of any call is advancing the
/// stream position. Parse failures carry the input path so a bad dump
/// can be pinpointed among several.
pub struct TokenCursor<R: Read> {
    parser: ReaderJsonParser<R>,
    current: Option<RawToken>,
    origin: PathBuf,
}

impl TokenCursor<BufReader<File>> {
    /// Open a UTF-8 JSON file and position the cursor on its first token.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), path.to_path_buf())
    }
}

impl<R: Read> TokenCursor<R> {
    /// `origin` labels the stream in error reports.
    pub fn from_reader(reader: R, origin: PathBuf) -> Result<Self> {
        let mut cursor = Self {
            parser: ReaderJsonParser::new(reader),
            current: None,
            origin,
        };
        cursor.advance()?;
        Ok(cursor)
    }

    /// The token the cursor sits on, or `None` past the end of the stream.
    pub fn current(&self) -> Option<&RawToken> {
        self.current.as_ref()
    }

    /// Move to the next token. Returns `false` once the stream is exhausted.
    pub fn advance(&mut self) -> Result<bool> {
        let event = self.parser.parse_next().map_err(|source| Error::Stream {
            path: self.origin.clone(),
            source,
        })?;

        self.current = match event {
            JsonEvent::StartObject => Some(RawToken::StartObject),
            JsonEvent::EndObject => Some(RawToken::EndObject),
            JsonEvent::StartArray => Some(RawToken::StartArray),
            JsonEvent::EndArray => Some(RawToken::EndArray),
            JsonEvent::ObjectKey(name) => {
                Some(RawToken::FieldName(name.into_owned()))
            }
            JsonEvent::String(value) => {
                Some(RawToken::StringValue(value.into_owned()))
            }
            // Only whole numbers are of interest; anything else is
            // carried as an opaque scalar.
            JsonEvent::Number(repr) => Some(match repr.parse::<i64>() {
                Ok(value) => RawToken::IntValue(value),
                Err(_) => RawToken::OtherValue,
            }),
            JsonEvent::Boolean(_) | JsonEvent::Null => Some(RawToken::OtherValue),
            JsonEvent::Eof => None,
        };

        Ok(self.current.is_some())
    }
}
