//! Parses the `nvim_get_api_info` handshake response into typed metadata.

use crate::error::ProtocolError;
use crate::value::{self, Value};

/// The peer's advertised API version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiVersion {
    pub major: i64,
    pub minor: i64,
    pub patch: i64,
    pub api_level: i64,
    pub api_compatible: i64,
    pub api_prerelease: bool,
    pub prerelease: String,
    pub build: Option<String>,
}

/// One remote procedure the peer advertises, as listed under
/// `metadata.functions`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiFunction {
    pub name: String,
    pub since: i64,
    pub method: bool,
    pub return_type: String,
    pub parameters: Vec<(String, String)>,
}

/// The cached result of the `nvim_get_api_info` handshake.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiInfo {
    pub channel_id: i64,
    pub version: ApiVersion,
    pub functions: Vec<ApiFunction>,
}

impl ApiInfo {
    /// Looks up an advertised function by name.
    #[must_use]
    pub fn find_function(&self, name: &str) -> Option<&ApiFunction> {
        self.functions.iter().find(|f| f.name == name)
    }
}

/// Parses the raw `[channel_id, metadata]` reply into an [`ApiInfo`].
///
/// Unknown fields in `metadata` are ignored; a required field missing or of
/// the wrong type aborts the handshake with [`ProtocolError`], matching
/// `SPEC_FULL.md` §4.4.
pub(crate) fn parse_api_info(reply: &Value) -> Result<ApiInfo, ProtocolError> {
    let top = value::expect_array(reply).map_err(|_| ProtocolError::MalformedHandshake)?;
    let [channel_id_val, metadata_val] = <[Value; 2]>::try_from(top).map_err(|_| ProtocolError::MalformedHandshake)?;
    let channel_id = value::expect_i64(&channel_id_val).map_err(|_| ProtocolError::MissingField("channel_id"))?;
    let metadata = value::expect_map(&metadata_val).map_err(|_| ProtocolError::MissingField("metadata"))?;

    let version_val = metadata.get("version").ok_or(ProtocolError::MissingField("version"))?;
    let version = parse_version(version_val)?;

    let functions_val = metadata.get("functions").ok_or(ProtocolError::MissingField("functions"))?;
    let functions_array = value::expect_array(functions_val).map_err(|_| ProtocolError::MissingField("functions"))?;
    let functions = functions_array.iter().map(parse_function).collect::<Result<Vec<_>, _>>()?;

    Ok(ApiInfo { channel_id, version, functions })
}

fn parse_version(v: &Value) -> Result<ApiVersion, ProtocolError> {
    let map = value::expect_map(v).map_err(|_| ProtocolError::MissingField("version"))?;
    let int_field = |name: &'static str| -> Result<i64, ProtocolError> {
        map.get(name).and_then(value::as_i64).ok_or(ProtocolError::MissingField(name))
    };
    let bool_field = |name: &'static str, default: bool| -> bool { map.get(name).and_then(value::as_bool).unwrap_or(default) };
    let str_field = |name: &'static str, default: &str| -> String {
        map.get(name).and_then(|v| value::expect_str(v).ok()).unwrap_or_else(|| default.to_string())
    };

    Ok(ApiVersion {
        major: int_field("major")?,
        minor: int_field("minor")?,
        patch: int_field("patch")?,
        api_level: int_field("api_level")?,
        api_compatible: int_field("api_compatible")?,
        api_prerelease: bool_field("api_prerelease", false),
        prerelease: str_field("prerelease", ""),
        build: map.get("build").and_then(|v| value::expect_str(v).ok()),
    })
}

fn parse_function(v: &Value) -> Result<ApiFunction, ProtocolError> {
    let map = value::expect_map(v).map_err(|_| ProtocolError::MalformedHandshake)?;
    let name = map.get("name").and_then(|v| value::expect_str(v).ok()).ok_or(ProtocolError::MissingField("name"))?;
    let since = map.get("since").and_then(value::as_i64).ok_or(ProtocolError::MissingField("since"))?;
    let method = map.get("method").and_then(value::as_bool).unwrap_or(false);
    let return_type = map.get("return_type").and_then(|v| value::expect_str(v).ok()).ok_or(ProtocolError::MissingField("return_type"))?;
    let parameters = map
        .get("parameters")
        .and_then(|v| value::expect_array(v).ok())
        .ok_or(ProtocolError::MissingField("parameters"))?
        .iter()
        .filter_map(parse_parameter)
        .collect();

    Ok(ApiFunction { name, since, method, return_type, parameters })
}

fn parse_parameter(v: &Value) -> Option<(String, String)> {
    let pair = value::expect_array(v).ok()?;
    let [ty, name] = <[Value; 2]>::try_from(pair).ok()?;
    Some((value::expect_str(&name).ok()?, value::expect_str(&ty).ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{array, boolean, int, map, object, string};

    fn sample_reply() -> Value {
        let mut version = map();
        if let Value::Map(m) = &mut version {
            m.put("major", int(0));
            m.put("minor", int(10));
            m.put("patch", int(2));
            m.put("api_level", int(12));
            m.put("api_compatible", int(0));
            m.put("api_prerelease", boolean(true));
            m.put("prerelease", string("dev"));
        }
        let function = object([
            ("name", string("nvim_eval")),
            ("since", int(1)),
            ("method", boolean(false)),
            ("return_type", string("Object")),
            ("parameters", array(vec![array(vec![string("String"), string("expr")])])),
        ]);
        let mut metadata = map();
        if let Value::Map(m) = &mut metadata {
            m.put("version", version);
            m.put("functions", array(vec![function]));
        }
        array(vec![int(7), metadata])
    }

    #[test]
    fn parses_well_formed_handshake() {
        let info = parse_api_info(&sample_reply()).unwrap();
        assert_eq!(info.channel_id, 7);
        assert_eq!(info.version.minor, 10);
        assert!(info.version.api_prerelease);
        let f = info.find_function("nvim_eval").unwrap();
        assert_eq!(f.return_type, "Object");
        assert_eq!(f.parameters, vec![("expr".to_string(), "String".to_string())]);
    }

    #[test]
    fn missing_required_field_is_protocol_error() {
        let metadata = map();
        let reply = array(vec![int(1), metadata]);
        let err = parse_api_info(&reply).unwrap_err();
        assert_eq!(err, ProtocolError::MissingField("version"));
    }
}
