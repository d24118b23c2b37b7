use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{ArgumentValue, SPECIFICATION_VERSION};
use crate::error::{ConsoleError, Result};

/// The structured result of parsing one command line against a catalog, as
/// it travels on the wire in an `executeCommand` message.
///
/// `commands` is the resolved name chain, root first; `arguments` maps each
/// consumed argument's name to its parsed typed value. The map is ordered by
/// name, which keeps encodings stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    pub version: u32,
    pub commands: Vec<String>,
    pub arguments: BTreeMap<String, ArgumentValue>,
}

impl Invocation {
    pub fn new(commands: Vec<String>, arguments: BTreeMap<String, ArgumentValue>) -> Invocation {
        Invocation {
            version: SPECIFICATION_VERSION,
            commands,
            arguments,
        }
    }

    /// Encode for the wire.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode from the wire. Invocation documents advertise the same
    /// version as the catalog; a mismatch is rejected with the same error.
    pub fn from_bytes(bytes: &[u8]) -> Result<Invocation> {
        let invocation: Invocation = serde_json::from_slice(bytes)?;
        if invocation.version != SPECIFICATION_VERSION {
            return Err(ConsoleError::IncorrectCommandSpecificationVersion {
                found: invocation.version,
            });
        }
        Ok(invocation)
    }

    pub fn argument(&self, name: &str) -> Option<&ArgumentValue> {
        self.arguments.get(name)
    }

    /// The resolved command chain joined for matching, e.g. `stuff process`.
    pub fn command_path(&self) -> String {
        self.commands.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let mut arguments = BTreeMap::new();
        arguments.insert("verbose".to_string(), ArgumentValue::Bool { value: true });
        arguments.insert("passes".to_string(), ArgumentValue::Int { value: 8 });
        let invocation = Invocation::new(
            vec!["stuff".to_string(), "process".to_string()],
            arguments,
        );

        let bytes = invocation.to_bytes().unwrap();
        let back = Invocation::from_bytes(&bytes).unwrap();
        assert_eq!(back, invocation);
        assert_eq!(back.command_path(), "stuff process");
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let mut invocation = Invocation::new(vec!["x".to_string()], BTreeMap::new());
        invocation.version = 9;
        let bytes = serde_json::to_vec(&invocation).unwrap();
        let err = Invocation::from_bytes(&bytes).unwrap_err();
        assert!(matches!(
            err,
            ConsoleError::IncorrectCommandSpecificationVersion { found: 9 }
        ));
    }
}
