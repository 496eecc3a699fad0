//! Callable functions declared to the chat model and the mapping of a
//! function-call directive onto a media generation request.

use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};

use crate::error::{RelayError, Result};
use crate::models::chat::{FunctionCall, FunctionDef};

pub const CREATE_MUSIC: &str = "createMusic";
pub const CREATE_IMAGE: &str = "createImage";

/// Fixed model-version tag sent with every music request.
pub const MUSIC_MODEL_VERSION: &str = "melody";

static DECLARATIONS: Lazy<Vec<FunctionDef>> = Lazy::new(|| {
    vec![
        FunctionDef {
            name: CREATE_MUSIC.to_string(),
            description: Some(
                "call this function if the request asks to generate music".to_string(),
            ),
            parameters: json!({
                "type": "object",
                "properties": {
                    "prompt": {
                        "type": "string",
                        "description": "the exact prompt passed in"
                    },
                    "duration": {
                        "type": "number",
                        "description": "if the user defines a length for audio or music, or for a duration, return the number only"
                    }
                },
                "required": ["prompt"]
            }),
        },
        FunctionDef {
            name: CREATE_IMAGE.to_string(),
            description: Some(
                "call this function if the request asks to generate an image".to_string(),
            ),
            parameters: json!({
                "type": "object",
                "properties": {
                    "prompt": {
                        "type": "string",
                        "description": "the exact prompt passed in"
                    }
                },
                "required": ["prompt"]
            }),
        },
    ]
});

/// The function declarations attached to every chat request.
pub fn declarations() -> &'static [FunctionDef] {
    &DECLARATIONS
}

/// A declared media function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFunction {
    Music,
    Image,
}

impl MediaFunction {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            CREATE_MUSIC => Some(Self::Music),
            CREATE_IMAGE => Some(Self::Image),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Music => CREATE_MUSIC,
            Self::Image => CREATE_IMAGE,
        }
    }

    /// Build the media API input from parsed arguments.
    ///
    /// Music gets `model_version` first with the arguments layered on top, so
    /// an argument of the same name overrides it. Image input is the arguments alone.
    pub fn media_input(self, args: Map<String, Value>) -> Map<String, Value> {
        match self {
            Self::Music => {
                let mut input = Map::new();
                input.insert(
                    "model_version".to_string(),
                    Value::String(MUSIC_MODEL_VERSION.to_string()),
                );
                input.extend(args);
                input
            }
            Self::Image => args,
        }
    }
}

/// A directive resolved against the declared functions, arguments decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub function: MediaFunction,
    pub arguments: Map<String, Value>,
}

impl Invocation {
    /// Decode the JSON argument string and match the function name.
    ///
    /// Arguments are decoded before the name is checked, so malformed JSON is
    /// reported even for an unknown function.
    pub fn resolve(call: &FunctionCall) -> Result<Self> {
        let arguments = parse_arguments(&call.arguments)?;
        let function = MediaFunction::from_name(&call.name)
            .ok_or_else(|| RelayError::UnknownFunction(call.name.clone()))?;
        Ok(Self {
            function,
            arguments,
        })
    }
}

/// Parse a function-call argument string into a key/value map.
pub fn parse_arguments(raw: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(RelayError::shape(
            "openai",
            format!("function arguments must be a JSON object, got {other}"),
        )),
        Err(e) => Err(RelayError::shape(
            "openai",
            format!("function arguments are not valid JSON: {e}"),
        )),
    }
}
