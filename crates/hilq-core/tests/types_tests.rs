//! Tests for agent parameters, rating scales and error reporting

use hilq_core::{AgentParams, AgentVariant, ExplorationMode, HilqError, RatingScale};

#[test]
fn test_mode_strings_round_trip() {
    for name in ExplorationMode::SUPPORTED {
        let mode: ExplorationMode = name.parse().unwrap();
        assert_eq!(mode.as_str(), *name);
        assert_eq!(mode.to_string(), *name);
    }
}

#[test]
fn test_unknown_mode_lists_supported() {
    let err = "boltzmann".parse::<ExplorationMode>().unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("'boltzmann' -> "));
    assert!(message.contains("e_greedy"));
    assert!(message.contains("e_decaying"));
    assert!(err.is_configuration());
}

#[test]
fn test_variant_parsing_ignores_case() {
    assert_eq!("Simple".parse::<AgentVariant>().unwrap(), AgentVariant::Simple);
    assert_eq!("EXTENDED".parse::<AgentVariant>().unwrap(), AgentVariant::Extended);
    assert!(matches!(
        "tabular".parse::<AgentVariant>(),
        Err(HilqError::InvalidVariant { .. })
    ));
}

#[test]
fn test_param_bounds_are_inclusive() {
    let edge = AgentParams {
        alpha: 1.0,
        gamma: 0.0,
        epsilon: 1.0,
        epsilon_low: 0.0,
        ..AgentParams::default()
    };
    assert!(edge.validate().is_ok());

    let cases = [
        AgentParams {
            alpha: -0.1,
            ..AgentParams::default()
        },
        AgentParams {
            gamma: 1.1,
            ..AgentParams::default()
        },
        AgentParams {
            epsilon: f64::NAN,
            ..AgentParams::default()
        },
        AgentParams {
            epsilon_low: 2.0,
            ..AgentParams::default()
        },
    ];
    for params in cases {
        let err = params.validate().unwrap_err();
        assert!(err.is_configuration(), "{err}");
    }
}

#[test]
fn test_beta_only_matters_for_extended() {
    let params = AgentParams {
        beta: 0.0,
        ..AgentParams::default()
    };
    assert!(params.validate().is_ok());
    assert!(matches!(
        params.validate_extended(),
        Err(HilqError::InvalidBeta(_))
    ));
}

#[test]
fn test_params_deserialize_from_snake_case() {
    let json = r#"{
        "alpha": 0.5,
        "gamma": 0.8,
        "epsilon": 0.3,
        "epsilon_mode": "e_greedy",
        "epsilon_decay": 0.9,
        "epsilon_low": 0.05,
        "beta": 1.5
    }"#;
    let params: AgentParams = serde_json::from_str(json).unwrap();
    assert_eq!(params.epsilon_mode, ExplorationMode::EGreedy);
    assert_eq!(params.seed, None);
    assert!(params.validate_extended().is_ok());
}

#[test]
fn test_rating_scale() {
    let scale = RatingScale::default();
    assert!(scale.contains(-1.0));
    assert!(scale.contains(3.0));
    assert!(!scale.contains(3.5));
    assert_eq!(scale.check(0.5).unwrap(), 0.5);

    let err = scale.check(-2.0).unwrap_err();
    assert_eq!(err.to_string(), "'-2' -> rating must be in [-1, 3]");
    assert!(!err.is_configuration());

    assert!(RatingScale::new(2.0, 1.0).is_err());
    assert!(RatingScale::new(0.0, 0.0).is_ok());
}
