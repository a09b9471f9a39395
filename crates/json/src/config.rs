//! Configuration of the JSON extension.
//!
//! A [`JsonConfig`] can be assembled in code through [`JsonConfig::builder`], or deserialized from
//! any serde format using the option names below (the `JSON_` prefixed forms are accepted too):
//!
//! | option                  | default                  |
//! |-------------------------|--------------------------|
//! | `ADD_STATUS`            | `true`                   |
//! | `STATUS_FIELD_NAME`     | `"status"`               |
//! | `DECODE_ERROR_MESSAGE`  | `"Not a JSON."`          |
//! | `DATE_FORMAT`           | unset                    |
//! | `TIME_FORMAT`           | unset                    |
//! | `DATETIME_FORMAT`       | unset                    |
//! | `USE_ENCODE_METHODS`    | `false`                  |
//! | `JSONIFY_HTTP_ERRORS`   | `false`                  |
//! | `JSONP_OPTIONAL`        | `true`                   |
//! | `JSONP_QUERY_CALLBACKS` | `["callback", "jsonp"]`  |
//! | `JSONP_STRING_QUOTES`   | `true`                   |

use serde::Deserialize;

/// Format of date and time values: `"iso"` or a strftime pattern.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum TemporalFormat {
    Iso,
    Pattern(String),
}

impl From<String> for TemporalFormat {
    fn from(value: String) -> Self {
        if value == "iso" { TemporalFormat::Iso } else { TemporalFormat::Pattern(value) }
    }
}

impl From<&str> for TemporalFormat {
    fn from(value: &str) -> Self {
        TemporalFormat::from(value.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct JsonConfig {
    #[serde(alias = "JSON_ADD_STATUS")]
    add_status: bool,
    #[serde(alias = "JSON_STATUS_FIELD_NAME")]
    status_field_name: String,
    #[serde(alias = "JSON_DECODE_ERROR_MESSAGE")]
    decode_error_message: Option<String>,
    #[serde(alias = "JSON_DATE_FORMAT")]
    date_format: Option<TemporalFormat>,
    #[serde(alias = "JSON_TIME_FORMAT")]
    time_format: Option<TemporalFormat>,
    #[serde(alias = "JSON_DATETIME_FORMAT")]
    datetime_format: Option<TemporalFormat>,
    #[serde(alias = "JSON_USE_ENCODE_METHODS")]
    use_encode_methods: bool,
    #[serde(alias = "JSON_JSONIFY_HTTP_ERRORS")]
    jsonify_http_errors: bool,
    #[serde(alias = "JSON_JSONP_OPTIONAL")]
    jsonp_optional: bool,
    #[serde(alias = "JSON_JSONP_QUERY_CALLBACKS")]
    jsonp_query_callbacks: Vec<String>,
    #[serde(alias = "JSON_JSONP_STRING_QUOTES")]
    jsonp_string_quotes: bool,
}

impl Default for JsonConfig {
    fn default() -> Self {
        Self {
            add_status: true,
            status_field_name: "status".into(),
            decode_error_message: Some("Not a JSON.".into()),
            date_format: None,
            time_format: None,
            datetime_format: None,
            use_encode_methods: false,
            jsonify_http_errors: false,
            jsonp_optional: true,
            jsonp_query_callbacks: vec!["callback".into(), "jsonp".into()],
            jsonp_string_quotes: true,
        }
    }
}

impl JsonConfig {
    pub fn builder() -> JsonConfigBuilder {
        JsonConfigBuilder::new()
    }

    pub fn add_status(&self) -> bool {
        self.add_status
    }

    pub fn status_field_name(&self) -> &str {
        &self.status_field_name
    }

    /// The description of malformed request JSON errors; `None` when unset or empty.
    pub fn decode_error_message(&self) -> Option<&str> {
        self.decode_error_message.as_deref().filter(|m| !m.is_empty())
    }

    pub fn date_format(&self) -> Option<&TemporalFormat> {
        self.date_format.as_ref()
    }

    pub fn time_format(&self) -> Option<&TemporalFormat> {
        self.time_format.as_ref()
    }

    pub fn datetime_format(&self) -> Option<&TemporalFormat> {
        self.datetime_format.as_ref()
    }

    pub fn use_encode_methods(&self) -> bool {
        self.use_encode_methods
    }

    pub fn jsonify_http_errors(&self) -> bool {
        self.jsonify_http_errors
    }

    pub fn jsonp_optional(&self) -> bool {
        self.jsonp_optional
    }

    pub fn jsonp_query_callbacks(&self) -> &[String] {
        &self.jsonp_query_callbacks
    }

    pub fn jsonp_string_quotes(&self) -> bool {
        self.jsonp_string_quotes
    }
}

#[derive(Debug, Clone, Default)]
pub struct JsonConfigBuilder {
    config: JsonConfig,
}

impl JsonConfigBuilder {
    fn new() -> Self {
        Self { config: JsonConfig::default() }
    }

    pub fn add_status(mut self, add_status: bool) -> Self {
        self.config.add_status = add_status;
        self
    }

    pub fn status_field_name(mut self, name: impl Into<String>) -> Self {
        self.config.status_field_name = name.into();
        self
    }

    pub fn decode_error_message(mut self, message: Option<&str>) -> Self {
        self.config.decode_error_message = message.map(str::to_owned);
        self
    }

    pub fn date_format(mut self, format: impl Into<TemporalFormat>) -> Self {
        self.config.date_format = Some(format.into());
        self
    }

    pub fn time_format(mut self, format: impl Into<TemporalFormat>) -> Self {
        self.config.time_format = Some(format.into());
        self
    }

    pub fn datetime_format(mut self, format: impl Into<TemporalFormat>) -> Self {
        self.config.datetime_format = Some(format.into());
        self
    }

    pub fn use_encode_methods(mut self, enabled: bool) -> Self {
        self.config.use_encode_methods = enabled;
        self
    }

    pub fn jsonify_http_errors(mut self, enabled: bool) -> Self {
        self.config.jsonify_http_errors = enabled;
        self
    }

    pub fn jsonp_optional(mut self, optional: bool) -> Self {
        self.config.jsonp_optional = optional;
        self
    }

    pub fn jsonp_query_callbacks<I, S>(mut self, callbacks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.jsonp_query_callbacks = callbacks.into_iter().map(Into::into).collect();
        self
    }

    pub fn jsonp_string_quotes(mut self, quotes: bool) -> Self {
        self.config.jsonp_string_quotes = quotes;
        self
    }

    pub fn build(self) -> JsonConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = JsonConfig::default();
        assert!(config.add_status());
        assert_eq!(config.status_field_name(), "status");
        assert_eq!(config.decode_error_message(), Some("Not a JSON."));
        assert_eq!(config.date_format(), None);
        assert!(!config.use_encode_methods());
        assert!(!config.jsonify_http_errors());
        assert!(config.jsonp_optional());
        assert_eq!(config.jsonp_query_callbacks(), ["callback", "jsonp"]);
        assert!(config.jsonp_string_quotes());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: JsonConfig = serde_json::from_value(json!({
            "ADD_STATUS": false,
            "JSON_STATUS_FIELD_NAME": "http_status",
            "DATE_FORMAT": "iso",
            "TIME_FORMAT": "%M:%S:%H",
            "JSONP_QUERY_CALLBACKS": ["boo"],
        }))
        .unwrap();

        assert!(!config.add_status());
        assert_eq!(config.status_field_name(), "http_status");
        assert_eq!(config.date_format(), Some(&TemporalFormat::Iso));
        assert_eq!(config.time_format(), Some(&TemporalFormat::Pattern("%M:%S:%H".into())));
        assert_eq!(config.jsonp_query_callbacks(), ["boo"]);
        // untouched options keep their defaults
        assert_eq!(config.decode_error_message(), Some("Not a JSON."));
        assert!(config.jsonp_optional());
    }

    #[test]
    fn test_empty_decode_message_is_unset() {
        let config = JsonConfig::builder().decode_error_message(Some("")).build();
        assert_eq!(config.decode_error_message(), None);

        let config: JsonConfig = serde_json::from_value(json!({"DECODE_ERROR_MESSAGE": null})).unwrap();
        assert_eq!(config.decode_error_message(), None);
    }

    #[test]
    fn test_builder() {
        let config = JsonConfig::builder()
            .add_status(false)
            .status_field_name("code")
            .datetime_format("%Y")
            .jsonify_http_errors(true)
            .jsonp_query_callbacks(["cb"])
            .build();

        assert!(!config.add_status());
        assert_eq!(config.status_field_name(), "code");
        assert_eq!(config.datetime_format(), Some(&TemporalFormat::Pattern("%Y".into())));
        assert!(config.jsonify_http_errors());
        assert_eq!(config.jsonp_query_callbacks(), ["cb"]);
    }
}
