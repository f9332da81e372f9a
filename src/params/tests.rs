use super::*;
use crate::errors::Error;
use serde_json::json;

fn params(value: serde_json::Value) -> ModelParameters {
    serde_json::from_value(value).unwrap()
}

#[test]
fn test_empty_object_uses_defaults() {
    let parsed = params(json!({}));
    assert_eq!(parsed, ModelParameters::default());

    let config = ModelConfig::try_from(parsed).unwrap();
    assert_eq!(config, ModelConfig::default());
}

#[test]
fn test_default_values() {
    let config = ModelConfig::default();
    assert_eq!(config.changepoint_prior_scale, 0.05);
    assert_eq!(config.seasonality_prior_scale, 10.0);
    assert_eq!(config.holidays_prior_scale, 10.0);
    assert_eq!(config.seasonality_mode, SeasonalityMode::Additive);
    assert!(config.yearly_seasonality);
    assert!(config.weekly_seasonality);
    assert!(!config.daily_seasonality);
    assert_eq!(config.growth, Growth::Linear);
    assert_eq!(config.n_changepoints, 25);
    assert_eq!(config.changepoint_range, 0.8);
}

#[test]
fn test_partial_override() {
    let config = ModelConfig::try_from(params(json!({
        "changepoint_prior_scale": 0.08,
        "seasonality_prior_scale": 12.0,
        "seasonality_mode": "multiplicative",
        "yearly_seasonality": true,
        "growth": "linear"
    })))
    .unwrap();

    assert_eq!(config.changepoint_prior_scale, 0.08);
    assert_eq!(config.seasonality_prior_scale, 12.0);
    assert_eq!(config.seasonality_mode, SeasonalityMode::Multiplicative);
    assert_eq!(config.holidays_prior_scale, 10.0);
    assert_eq!(config.n_changepoints, 25);
}

#[test]
fn test_rejects_non_positive_scales() {
    for field in [
        "changepoint_prior_scale",
        "seasonality_prior_scale",
        "holidays_prior_scale",
    ] {
        for bad in [0.0, -1.0] {
            let err = ModelConfig::try_from(params(json!({ field: bad }))).unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "{field}={bad}: {err:?}");
            assert!(err.to_string().contains(field));
        }
    }
}

#[test]
fn test_rejects_unknown_seasonality_mode() {
    let err =
        ModelConfig::try_from(params(json!({ "seasonality_mode": "cubic" }))).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(err.to_string().contains("seasonality_mode"));
}

#[test]
fn test_rejects_unknown_growth() {
    let err = ModelConfig::try_from(params(json!({ "growth": "exponential" }))).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(err.to_string().contains("growth"));
}

#[test]
fn test_rejects_negative_changepoints() {
    let err = ModelConfig::try_from(params(json!({ "n_changepoints": -1 }))).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let config = ModelConfig::try_from(params(json!({ "n_changepoints": 0 }))).unwrap();
    assert_eq!(config.n_changepoints, 0);
}

#[test]
fn test_changepoint_range_bounds() {
    for bad in [0.0, -0.1, 1.01] {
        let err =
            ModelConfig::try_from(params(json!({ "changepoint_range": bad }))).unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "range={bad}");
    }
    let config = ModelConfig::try_from(params(json!({ "changepoint_range": 1.0 }))).unwrap();
    assert_eq!(config.changepoint_range, 1.0);
}

#[test]
fn test_logistic_requires_cap_and_floor() {
    for body in [
        json!({ "growth": "logistic" }),
        json!({ "growth": "logistic", "cap": 100.0 }),
        json!({ "growth": "logistic", "floor": 0.0 }),
        json!({ "growth": "logistic", "cap": null, "floor": 0.0 }),
    ] {
        let err = ModelConfig::try_from(params(body.clone())).unwrap_err();
        assert!(matches!(err, Error::Input(_)), "{body}: {err:?}");
        assert!(err.to_string().contains("Cap and floor"));
    }
}

#[test]
fn test_logistic_with_capacity() {
    let config = ModelConfig::try_from(params(json!({
        "growth": "logistic",
        "cap": 100.0,
        "floor": 1.5
    })))
    .unwrap();
    assert_eq!(
        config.growth,
        Growth::Logistic(Capacity {
            cap: 100.0,
            floor: 1.5
        })
    );
    assert_eq!(config.growth.name(), "logistic");
    assert_eq!(config.growth.capacity().map(|c| c.cap), Some(100.0));
}

#[test]
fn test_cap_ignored_without_logistic_growth() {
    let config = ModelConfig::try_from(params(json!({ "cap": 5.0 }))).unwrap();
    assert_eq!(config.growth, Growth::Linear);
    assert_eq!(config.growth.capacity(), None);
}

#[test]
fn test_schema_lists_every_field() {
    let schema = ModelParameters::json_schema();
    let properties = schema["properties"].as_object().unwrap();
    let defaults = serde_json::to_value(ModelParameters::default()).unwrap();
    let defaults = defaults.as_object().unwrap();

    let mut schema_keys: Vec<_> = properties.keys().collect();
    let mut field_keys: Vec<_> = defaults.keys().collect();
    schema_keys.sort();
    field_keys.sort();
    assert_eq!(schema_keys, field_keys);

    for (name, property) in properties {
        assert_eq!(&property["default"], &defaults[name], "default of {name}");
        assert!(property["description"].is_string(), "description of {name}");
        assert!(property["title"].is_string(), "title of {name}");
    }
}

#[test]
fn test_schema_constraints() {
    let schema = ModelParameters::json_schema();
    let p = &schema["properties"];

    assert_eq!(p["changepoint_prior_scale"]["default"], json!(0.05));
    assert_eq!(p["changepoint_prior_scale"]["exclusiveMinimum"], json!(0));
    assert_eq!(p["changepoint_prior_scale"]["title"], json!("Changepoint Prior Scale"));
    assert_eq!(p["n_changepoints"]["type"], json!("integer"));
    assert_eq!(p["n_changepoints"]["minimum"], json!(0));
    assert_eq!(p["n_changepoints"]["default"], json!(25));
    assert_eq!(p["changepoint_range"]["maximum"], json!(1));
    assert_eq!(p["growth"]["enum"], json!(["linear", "logistic", "flat"]));
    assert_eq!(p["seasonality_mode"]["pattern"], json!("^(additive|multiplicative)$"));
    assert_eq!(p["cap"]["default"], json!(null));
    assert_eq!(schema["then"]["required"], json!(["cap", "floor"]));
}
