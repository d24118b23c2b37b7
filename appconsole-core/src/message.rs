//! Typed message envelopes: the metadata document, the message-type
//! discriminant, and the payload shapes each type carries.
//!
//! The transport deals in opaque `(metadata, payload)` byte pairs; this
//! module gives them meaning. Unknown message types decode to `None` and are
//! ignored by sessions rather than treated as fatal.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::CommandsSpecification;
use crate::encoding;
use crate::error::Result;
use crate::host::HostInfo;
use crate::invocation::Invocation;

/// The message-type discriminant transported in the metadata document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    ListCommands,
    ExecuteCommand,
    GeneralInfo,
    CommandsSpecification,
    ConsoleOutput,
    Screenshot,
    ReadyForCommand,
    File,
}

impl MessageType {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::ListCommands => "listCommands",
            MessageType::ExecuteCommand => "executeCommand",
            MessageType::GeneralInfo => "generalInfo",
            MessageType::CommandsSpecification => "commandsSpecification",
            MessageType::ConsoleOutput => "consoleOutput",
            MessageType::Screenshot => "screenshot",
            MessageType::ReadyForCommand => "readyForCommand",
            MessageType::File => "file",
        }
    }

    /// Resolve a wire name. `None` for message types this implementation
    /// does not know, which receivers ignore.
    pub fn from_name(name: &str) -> Option<MessageType> {
        Some(match name {
            "listCommands" => MessageType::ListCommands,
            "executeCommand" => MessageType::ExecuteCommand,
            "generalInfo" => MessageType::GeneralInfo,
            "commandsSpecification" => MessageType::CommandsSpecification,
            "consoleOutput" => MessageType::ConsoleOutput,
            "screenshot" => MessageType::Screenshot,
            "readyForCommand" => MessageType::ReadyForCommand,
            "file" => MessageType::File,
            _ => return None,
        })
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The metadata document. Exactly one field matters to the core.
#[derive(Debug, Serialize, Deserialize)]
struct Metadata {
    #[serde(rename = "messageType")]
    message_type: String,
}

/// A file pushed from the service to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTransfer {
    pub filename: String,
    #[serde(with = "encoding::base64_blob")]
    pub filedata: Vec<u8>,
}

/// One typed message, either direction.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Client asks for the catalog. Empty payload.
    ListCommands,
    /// Client dispatches a parsed invocation.
    ExecuteCommand(Invocation),
    /// Service introduces itself, unsolicited after the handshake.
    GeneralInfo(HostInfo),
    /// Service answers `listCommands`.
    CommandsSpecification(CommandsSpecification),
    /// Service streams human-readable text.
    ConsoleOutput(String),
    /// Service streams raw image bytes.
    Screenshot(Vec<u8>),
    /// Service is ready for the next command line. Empty payload.
    ReadyForCommand,
    /// Service pushes a file.
    File(FileTransfer),
}

impl Message {
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::ListCommands => MessageType::ListCommands,
            Message::ExecuteCommand(_) => MessageType::ExecuteCommand,
            Message::GeneralInfo(_) => MessageType::GeneralInfo,
            Message::CommandsSpecification(_) => MessageType::CommandsSpecification,
            Message::ConsoleOutput(_) => MessageType::ConsoleOutput,
            Message::Screenshot(_) => MessageType::Screenshot,
            Message::ReadyForCommand => MessageType::ReadyForCommand,
            Message::File(_) => MessageType::File,
        }
    }

    /// Encode into the `(metadata, payload)` pair the transport carries.
    pub fn encode(&self) -> Result<(Vec<u8>, Vec<u8>)> {
        let metadata = serde_json::to_vec(&Metadata {
            message_type: self.message_type().as_str().to_string(),
        })?;
        let payload = match self {
            Message::ListCommands | Message::ReadyForCommand => Vec::new(),
            Message::ExecuteCommand(invocation) => invocation.to_bytes()?,
            Message::GeneralInfo(info) => serde_json::to_vec(info)?,
            Message::CommandsSpecification(spec) => spec.to_bytes()?,
            Message::ConsoleOutput(text) => text.as_bytes().to_vec(),
            Message::Screenshot(bytes) => bytes.clone(),
            Message::File(file) => serde_json::to_vec(file)?,
        };
        Ok((metadata, payload))
    }

    /// Decode a received `(metadata, payload)` pair. Returns `Ok(None)` for
    /// an unknown message type; document errors (bad payload, version
    /// mismatch) are fatal to the message, not the session.
    pub fn decode(metadata: &[u8], payload: &[u8]) -> Result<Option<Message>> {
        let metadata: Metadata = serde_json::from_slice(metadata)?;
        let Some(message_type) = MessageType::from_name(&metadata.message_type) else {
            return Ok(None);
        };
        let message = match message_type {
            MessageType::ListCommands => Message::ListCommands,
            MessageType::ExecuteCommand => Message::ExecuteCommand(Invocation::from_bytes(payload)?),
            MessageType::GeneralInfo => Message::GeneralInfo(serde_json::from_slice(payload)?),
            MessageType::CommandsSpecification => {
                Message::CommandsSpecification(CommandsSpecification::from_bytes(payload)?)
            }
            MessageType::ConsoleOutput => {
                Message::ConsoleOutput(String::from_utf8_lossy(payload).into_owned())
            }
            MessageType::Screenshot => Message::Screenshot(payload.to_vec()),
            MessageType::ReadyForCommand => Message::ReadyForCommand,
            MessageType::File => Message::File(serde_json::from_slice(payload)?),
        };
        Ok(Some(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn metadata_carries_the_message_type() {
        let (metadata, payload) = Message::ReadyForCommand.encode().unwrap();
        assert_eq!(
            String::from_utf8(metadata).unwrap(),
            r#"{"messageType":"readyForCommand"}"#
        );
        assert!(payload.is_empty());
    }

    #[test]
    fn console_output_is_utf8_text() {
        let (metadata, payload) = Message::ConsoleOutput("hello".into()).encode().unwrap();
        assert_eq!(payload, b"hello");
        let back = Message::decode(&metadata, &payload).unwrap().unwrap();
        assert_eq!(back, Message::ConsoleOutput("hello".into()));
    }

    #[test]
    fn screenshot_payload_is_raw_bytes() {
        let bytes = vec![0u8, 159, 146, 150];
        let (metadata, payload) = Message::Screenshot(bytes.clone()).encode().unwrap();
        assert_eq!(payload, bytes);
        let back = Message::decode(&metadata, &payload).unwrap().unwrap();
        assert_eq!(back, Message::Screenshot(bytes));
    }

    #[test]
    fn invocation_round_trip() {
        let mut arguments = BTreeMap::new();
        arguments.insert(
            "passes".to_string(),
            crate::catalog::ArgumentValue::Int { value: 3 },
        );
        let message = Message::ExecuteCommand(Invocation::new(
            vec!["stuff".to_string(), "process".to_string()],
            arguments,
        ));
        let (metadata, payload) = message.encode().unwrap();
        let back = Message::decode(&metadata, &payload).unwrap().unwrap();
        assert_eq!(back, message);
    }

    #[test]
    fn file_transfer_round_trip() {
        let message = Message::File(FileTransfer {
            filename: "report.txt".into(),
            filedata: vec![1, 2, 3],
        });
        let (metadata, payload) = message.encode().unwrap();
        let back = Message::decode(&metadata, &payload).unwrap().unwrap();
        assert_eq!(back, message);
    }

    #[test]
    fn unknown_message_type_decodes_to_none() {
        let metadata = br#"{"messageType":"somethingNew"}"#;
        assert!(Message::decode(metadata, &[]).unwrap().is_none());
    }

    #[test]
    fn garbage_metadata_is_an_encoding_error() {
        let err = Message::decode(b"not json", &[]).unwrap_err();
        assert!(matches!(err, crate::ConsoleError::Encoding(_)));
    }
}
