use serde::{Deserialize, Serialize};

/// Kind of user-defined function a script implements.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScriptType {
    #[default]
    Map,
    Reduce,
}

/// A user-authored transform script. `name` is its addressing key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub name: String,
    #[serde(rename = "type", default)]
    pub script_type: ScriptType,
    #[serde(rename = "data")]
    pub body: String,
}

const MAP_TEMPLATE: &str = r#"from pynumaflow.mapper import Messages, Message, Datum, MapServer


def handler(keys: list[str], datum: Datum) -> Messages:
    messages = Messages()
    # transform datum.value here
    messages.append(Message(datum.value, keys=keys))
    return messages


if __name__ == "__main__":
    MapServer(handler).start()
"#;

const REDUCE_TEMPLATE: &str = r#"from collections.abc import AsyncIterable

from pynumaflow.reducer import Messages, Message, Datum, Metadata, ReduceAsyncServer


async def handler(keys: list[str], datums: AsyncIterable[Datum], md: Metadata) -> Messages:
    count = 0
    async for _ in datums:
        count += 1
    # aggregate the window here
    return Messages(Message(str.encode(str(count)), keys=keys))


if __name__ == "__main__":
    ReduceAsyncServer(handler).start()
"#;

impl Script {
    pub fn new(
        name: impl Into<String>,
        script_type: ScriptType,
        body: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            script_type,
            body: body.into(),
        }
    }

    /// A new script whose body is the starter handler for its type.
    pub fn from_template(
        name: impl Into<String>,
        script_type: ScriptType,
    ) -> Self {
        let body = match script_type {
            ScriptType::Map => MAP_TEMPLATE,
            ScriptType::Reduce => REDUCE_TEMPLATE,
        };
        Self::new(name, script_type, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_wire_shape() {
        let script = Script::new("even-odd", ScriptType::Map, "print(1)");
        let value = serde_json::to_value(&script).unwrap();
        assert_eq!(value["type"], "map");
        assert_eq!(value["data"], "print(1)");

        let back: Script = serde_json::from_value(value).unwrap();
        assert_eq!(back, script);
    }

    #[test]
    fn test_script_type_defaults_to_map() {
        let script: Script = serde_json::from_str(r#"{"name": "legacy", "data": "pass"}"#).unwrap();
        assert_eq!(script.script_type, ScriptType::Map);
    }

    #[test]
    fn test_templates() {
        assert!(Script::from_template("m", ScriptType::Map).body.contains("MapServer"));
        assert!(Script::from_template("r", ScriptType::Reduce).body.contains("ReduceAsyncServer"));
    }
}
