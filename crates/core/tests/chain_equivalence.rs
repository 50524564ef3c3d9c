//! Hillslope routing cross-checks
//!
//! A three-column catena driven by hand, column by column, must match the
//! same catena routed through upslope index lists.

use approx::assert_relative_eq;
use hillslope_core::simulation::{run_chain, ScenarioConfig, SimulationSettings, TimeSeries};
use hillslope_core::{HillslopeChain, RainfallSchedule, SoilColumn, SoilParameters, StepRecord};

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

const ONE_MINUTE: f64 = 1.0 / 60.0;
const STORM_STEPS: usize = 60;
const STORM_RAINFALL: f64 = 20.0;

fn catena_parameters() -> SoilParameters {
    SoilParameters {
        final_infilt_rate: 5.0,
        ..Default::default()
    }
}

fn column() -> SoilColumn {
    SoilColumn::new(&catena_parameters()).unwrap()
}

fn record(step: usize, column: &SoilColumn) -> StepRecord {
    StepRecord {
        step,
        time_hours: step as f64 * ONE_MINUTE,
        rainfall: STORM_RAINFALL,
        result: column.last_step(),
    }
}

/// Each column updated explicitly with the one above it
fn explicit_catena() -> (TimeSeries, [SoilColumn; 3]) {
    let mut soil1 = column();
    let mut soil2 = column();
    let mut soil3 = column();
    let mut series = TimeSeries::with_capacity(STORM_STEPS);

    for step in 0..STORM_STEPS {
        soil1.advance(STORM_RAINFALL, 0.0, 0.0, ONE_MINUTE);
        soil2.advance(
            STORM_RAINFALL,
            soil1.overland_flow(),
            soil1.subsurface_flow(),
            ONE_MINUTE,
        );
        soil3.advance(
            STORM_RAINFALL,
            soil2.overland_flow(),
            soil2.subsurface_flow(),
            ONE_MINUTE,
        );
        series.push(&record(step, &soil3));
    }

    (series, [soil1, soil2, soil3])
}

fn storm_settings() -> SimulationSettings {
    SimulationSettings {
        steps: STORM_STEPS,
        timestep_hours: ONE_MINUTE,
        rainfall: RainfallSchedule::Constant {
            rate: STORM_RAINFALL,
        },
    }
}

fn routed_catena() -> (TimeSeries, HillslopeChain) {
    let mut chain = HillslopeChain::new();
    let top = chain.push(column());
    let middle = chain.push_linked(column(), &[top]).unwrap();
    let bottom = chain.push_linked(column(), &[middle]).unwrap();

    let mut series = TimeSeries::with_capacity(STORM_STEPS);
    run_chain(&mut chain, &storm_settings(), bottom, &mut series).unwrap();
    (series, chain)
}

#[test]
fn test_explicit_and_routed_catena_agree() {
    let (explicit, columns) = explicit_catena();
    let (routed, chain) = routed_catena();

    let diff = explicit.total_abs_difference(&routed);
    assert!(diff.max() < 1e-9, "implementations differ: {diff}");

    for (index, soil) in columns.iter().enumerate() {
        assert_eq!(chain.column(index).unwrap().last_step(), soil.last_step());
    }
}

#[test]
fn test_catena_end_state() {
    let (_, chain) = routed_catena();

    // Every column infiltrates at capacity, so storage barely varies downslope
    for index in 0..3 {
        assert_relative_eq!(
            chain.column(index).unwrap().soil_moisture(),
            31.456386496012623,
            epsilon = 1e-6
        );
    }
    // Overland flow accumulates downslope
    let expected = [9.927483517007737, 19.854967039919845, 29.78245056283195];
    for (index, overland_flow) in expected.into_iter().enumerate() {
        assert_relative_eq!(
            chain.column(index).unwrap().overland_flow(),
            overland_flow,
            epsilon = 1e-6
        );
    }
}

#[test]
fn test_routing_uses_current_step_upslope_values() {
    let mut chain = HillslopeChain::linear(vec![column(), column(), column()]);

    for _ in 0..STORM_STEPS {
        let previous_top = chain.column(0).unwrap().last_step();
        chain.step(STORM_RAINFALL, ONE_MINUTE);
        let top = chain.column(0).unwrap().last_step();

        let inflow = chain.inflow(1).unwrap();
        assert_eq!(inflow.runon, top.overland_flow);
        assert_eq!(inflow.subsurface_inflow, top.subsurface_flow);
        if top.overland_flow != previous_top.overland_flow {
            assert_ne!(inflow.runon, previous_top.overland_flow);
        }
    }
}

#[test]
fn test_scenario_config_matches_explicit_catena() {
    let config = ScenarioConfig::reference_hillslope();
    let mut chain = config.build_chain().unwrap();
    let observed = config.observed_index(&chain).unwrap();
    let mut series = TimeSeries::default();
    run_chain(&mut chain, &config.settings, observed, &mut series).unwrap();

    let (explicit, _) = explicit_catena();
    assert!(explicit.total_abs_difference(&series).max() < 1e-9);
}

#[test]
fn test_result_independent_of_column_insertion_order() {
    // Two ridge columns draining into one valley column, inserted in
    // different index orders.
    let ridge_a = SoilParameters {
        slope_degrees: 8.0,
        ..catena_parameters()
    };
    let ridge_b = SoilParameters {
        final_infilt_rate: 8.0,
        ..catena_parameters()
    };
    let settings = storm_settings();

    let mut first = HillslopeChain::new();
    let a = first.push(SoilColumn::new(&ridge_a).unwrap());
    let b = first.push(SoilColumn::new(&ridge_b).unwrap());
    let valley = first.push_linked(column(), &[a, b]).unwrap();
    let mut first_series = TimeSeries::default();
    run_chain(&mut first, &settings, valley, &mut first_series).unwrap();

    let mut second = HillslopeChain::new();
    let valley = second.push(column());
    let b = second.push(SoilColumn::new(&ridge_b).unwrap());
    let a = second.push(SoilColumn::new(&ridge_a).unwrap());
    second.link(b, valley).unwrap();
    second.link(a, valley).unwrap();
    let mut second_series = TimeSeries::default();
    run_chain(&mut second, &settings, valley, &mut second_series).unwrap();

    assert_eq!(second.outlet(), Some(valley));
    assert!(first_series.total_abs_difference(&second_series).max() < 1e-9);
}

#[test]
fn test_identical_chain_runs_are_bit_identical() {
    let (first, _) = routed_catena();
    let (second, _) = routed_catena();
    assert_eq!(first, second);
}
