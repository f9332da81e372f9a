use super::{Growth, ModelParameters, SeasonalityMode};
use serde_json::{Map, Value, json};

struct Field {
    name: &'static str,
    description: &'static str,
    shape: Value,
}

fn fields() -> Vec<Field> {
    vec![
        Field {
            name: "changepoint_prior_scale",
            description: "Flexibility of the trend changes. Higher values allow more flexibility.",
            shape: json!({ "type": "number", "exclusiveMinimum": 0 }),
        },
        Field {
            name: "seasonality_prior_scale",
            description: "Strength of the seasonality model. Higher values allow stronger seasonal patterns.",
            shape: json!({ "type": "number", "exclusiveMinimum": 0 }),
        },
        Field {
            name: "holidays_prior_scale",
            description: "Strength of the holiday effects. Higher values allow stronger holiday effects.",
            shape: json!({ "type": "number", "exclusiveMinimum": 0 }),
        },
        Field {
            name: "seasonality_mode",
            description: "Type of seasonality, either 'additive' or 'multiplicative'",
            shape: json!({
                "type": "string",
                "enum": SeasonalityMode::NAMES,
                "pattern": format!("^({})$", SeasonalityMode::NAMES.join("|")),
            }),
        },
        Field {
            name: "yearly_seasonality",
            description: "Whether to include yearly seasonality",
            shape: json!({ "type": "boolean" }),
        },
        Field {
            name: "weekly_seasonality",
            description: "Whether to include weekly seasonality",
            shape: json!({ "type": "boolean" }),
        },
        Field {
            name: "daily_seasonality",
            description: "Whether to include daily seasonality",
            shape: json!({ "type": "boolean" }),
        },
        Field {
            name: "growth",
            description: "Type of growth trend: 'linear', 'logistic', or 'flat'",
            shape: json!({
                "type": "string",
                "enum": Growth::NAMES,
                "pattern": format!("^({})$", Growth::NAMES.join("|")),
            }),
        },
        Field {
            name: "cap",
            description: "Growth cap for logistic growth",
            shape: json!({ "anyOf": [{ "type": "number" }, { "type": "null" }] }),
        },
        Field {
            name: "floor",
            description: "Growth floor for logistic growth",
            shape: json!({ "anyOf": [{ "type": "number" }, { "type": "null" }] }),
        },
        Field {
            name: "n_changepoints",
            description: "Number of potential changepoints",
            shape: json!({ "type": "integer", "minimum": 0 }),
        },
        Field {
            name: "changepoint_range",
            description: "Proportion of history where changepoints are considered",
            shape: json!({ "type": "number", "exclusiveMinimum": 0, "maximum": 1 }),
        },
    ]
}

fn title(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub(super) fn build() -> Value {
    let defaults = match serde_json::to_value(ModelParameters::default()) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };

    let mut properties = Map::new();
    for field in fields() {
        let mut property = match field.shape {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        property.insert("title".into(), title(field.name).into());
        property.insert("description".into(), field.description.into());
        property.insert(
            "default".into(),
            defaults.get(field.name).cloned().unwrap_or(Value::Null),
        );
        properties.insert(field.name.into(), Value::Object(property));
    }

    json!({
        "title": "ModelParameters",
        "type": "object",
        "properties": properties,
        "if": { "properties": { "growth": { "const": "logistic" } }, "required": ["growth"] },
        "then": {
            "required": ["cap", "floor"],
            "properties": {
                "cap": { "type": "number" },
                "floor": { "type": "number" },
            },
        },
    })
}
