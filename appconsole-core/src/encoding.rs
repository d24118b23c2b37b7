//! Serde helpers for byte blobs carried inside JSON documents.

pub(crate) mod base64_blob {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text.as_bytes()).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Blob {
        #[serde(with = "super::base64_blob")]
        data: Vec<u8>,
    }

    #[test]
    fn blob_round_trip() {
        let blob = Blob {
            data: vec![0, 1, 2, 254, 255],
        };
        let json = serde_json::to_string(&blob).unwrap();
        let back: Blob = serde_json::from_str(&json).unwrap();
        assert_eq!(blob, back);
    }

    #[test]
    fn blob_is_text_in_json() {
        let blob = Blob { data: vec![104, 105] };
        let json = serde_json::to_string(&blob).unwrap();
        assert_eq!(json, r#"{"data":"aGk="}"#);
    }
}
