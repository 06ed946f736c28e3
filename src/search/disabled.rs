use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::search::request::{
    AnyRequest, ChartRequest, DecodeError, FilterRequest, RangeRequest, Request,
};
use crate::storage::Entry;
use crate::types::{Guid, Key};

/// Wire form of a disabled request: `{"key": <kind>, "value": <entry>}`
#[derive(Debug, Serialize)]
struct Envelope<'a> {
    key: Key,
    value: &'a Entry,
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    key: String,
    value: Value,
}

/// A request taken out of its store and parked as inactive.
///
/// The wrapped request keeps its uuid and definition so enabling it again
/// restores exactly what was disabled.
#[derive(Debug, Clone, PartialEq)]
pub struct DisabledRequest {
    request: AnyRequest,
}

impl DisabledRequest {
    pub fn new(request: impl Into<AnyRequest>) -> Self {
        Self {
            request: request.into(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, DecodeError> {
        let raw: RawEnvelope = serde_json::from_str(json)?;
        let entry: Entry = match raw.key.parse::<Key>() {
            Ok(Key::Filters | Key::Charts | Key::Ranges) => serde_json::from_value(raw.value)?,
            _ => return Err(DecodeError::UnsupportedKey(raw.key)),
        };
        let request = AnyRequest::from_entry(&raw.key, &entry)?;
        Ok(Self { request })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        let value = self.request.to_entry()?;
        serde_json::to_string(&Envelope {
            key: self.request.key(),
            value: &value,
        })
    }

    /// Kind of the wrapped request
    pub fn key(&self) -> Key {
        self.request.key()
    }

    pub fn request(&self) -> &AnyRequest {
        &self.request
    }

    pub fn into_request(self) -> AnyRequest {
        self.request
    }

    pub fn as_filter(&self) -> Option<&FilterRequest> {
        self.request.as_filter()
    }

    pub fn as_chart(&self) -> Option<&ChartRequest> {
        self.request.as_chart()
    }

    pub fn as_range(&self) -> Option<&RangeRequest> {
        self.request.as_range()
    }
}

impl Request for DisabledRequest {
    const KEY: Key = Key::Disabled;

    fn uuid(&self) -> &Guid {
        self.request.uuid()
    }

    // Prefixed with the kind so a filter and a chart never collide
    fn hash(&self) -> String {
        format!("{}:{}", self.request.key(), self.request.hash())
    }

    fn to_entry(&self) -> serde_json::Result<Entry> {
        Ok(Entry::new(self.uuid().as_str(), self.to_json()?))
    }

    fn from_entry(entry: &Entry) -> Result<Self, DecodeError> {
        Self::from_json(&entry.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::request::{FilterFlags, SearchFilter};

    fn filter(text: &str, flags: FilterFlags) -> FilterRequest {
        FilterRequest::new(SearchFilter::new(text).with_flags(flags)).unwrap()
    }

    #[test]
    fn test_json_round_trip_keeps_hash() {
        let requests: Vec<AnyRequest> = vec![
            filter("fatal", FilterFlags::default()).into(),
            ChartRequest::new(r"temp=(\d+)", "#FF0000").unwrap().into(),
            RangeRequest::new(
                filter("start", FilterFlags::default()),
                filter("stop", FilterFlags::default()),
            )
            .unwrap()
            .into(),
        ];

        for request in requests {
            let disabled = DisabledRequest::new(request.clone());
            let json = disabled.to_json().unwrap();
            let restored = DisabledRequest::from_json(&json).unwrap();
            assert_eq!(restored.request().hash(), request.hash());
            assert_eq!(restored.key(), request.key());
            assert_eq!(restored.uuid(), request.uuid());
        }
    }

    #[test]
    fn test_envelope_shape() {
        let request = filter("abc", FilterFlags::default());
        let json = DisabledRequest::new(request.clone()).to_json().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["key"], "filters");
        assert_eq!(value["value"]["uuid"], request.uuid().as_str());
        assert!(value["value"]["content"].is_string());
    }

    #[test]
    fn test_unsupported_key_is_reported() {
        let json = r#"{"key":"bookmarks","value":{"uuid":"x","content":"{}"}}"#;
        match DisabledRequest::from_json(json) {
            Err(DecodeError::UnsupportedKey(key)) => assert_eq!(key, "bookmarks"),
            other => panic!("unexpected result: {other:?}"),
        }

        let nested = r#"{"key":"disabled","value":{"uuid":"x","content":"{}"}}"#;
        assert!(matches!(
            DisabledRequest::from_json(nested),
            Err(DecodeError::UnsupportedKey(_))
        ));
    }

    #[test]
    fn test_malformed_json_is_reported() {
        assert!(matches!(
            DisabledRequest::from_json("{not json"),
            Err(DecodeError::Json(_))
        ));
        let bad_content = r#"{"key":"filters","value":{"uuid":"x","content":"{}"}}"#;
        assert!(matches!(
            DisabledRequest::from_json(bad_content),
            Err(DecodeError::Json(_))
        ));
    }

    #[test]
    fn test_invalid_request_inside_envelope() {
        let content = r#"{"filter":{"filter":"a[","flags":{"cases":false,"reg":true,"word":false}}}"#;
        let json = serde_json::json!({
            "key": "filters",
            "value": { "uuid": "x", "content": content },
        })
        .to_string();
        assert!(matches!(
            DisabledRequest::from_json(&json),
            Err(DecodeError::Invalid(_))
        ));
    }

    #[test]
    fn test_is_same_compares_content_not_uuid() {
        let flags = FilterFlags {
            cases: true,
            reg: false,
            word: true,
        };
        let a = DisabledRequest::new(filter("connect", flags));
        let b = DisabledRequest::new(filter("connect", flags));
        assert_ne!(a.uuid(), b.uuid());
        assert!(a.is_same(&b));

        let c = DisabledRequest::new(filter("connect", FilterFlags::default()));
        assert!(!a.is_same(&c));
    }

    #[test]
    fn test_different_kinds_never_same() {
        let chart = ChartRequest::new("(a)", "#FFFFFF").unwrap();
        let as_filter = filter(&chart.hash(), FilterFlags::default());
        let a = DisabledRequest::new(chart);
        let b = DisabledRequest::new(as_filter);
        assert!(!a.is_same(&b));
    }

    #[test]
    fn test_entry_round_trip() {
        let disabled = DisabledRequest::new(filter("x", FilterFlags::default()));
        let entry = disabled.to_entry().unwrap();
        assert_eq!(entry.uuid, disabled.uuid().as_str());
        assert_eq!(DisabledRequest::from_entry(&entry).unwrap(), disabled);
    }
}
