use plastix::prelude::*;
use russell_lab::approx_eq;

const COMPOSITE: &str = r#"{
    "id": 10,
    "law": {"SerialParallel": {"fiber_fraction": 0.4, "parallel_directions": [true, false, true]}},
    "sub_properties": [
        {
            "id": 11,
            "law": {"Plasticity": {"yield_surface": "DruckerPrager", "hardening": "Exponential"}},
            "values": {
                "YoungModulus": 1000.0,
                "PoissonRatio": 0.25,
                "YieldStress": 2.0,
                "SaturationStress": 4.0,
                "HardeningExponent": 50.0,
                "HardeningModulus": 0.0,
                "FrictionAngle": 20.0,
                "DilatancyAngle": 5.0
            }
        },
        {
            "id": 12,
            "law": "LinearElastic",
            "values": {"YoungModulus": 5000.0, "PoissonRatio": 0.2}
        }
    ]
}"#;

#[test]
fn test_properties_json() -> Result<()> {
    let props = Properties::from_json(COMPOSITE)?;
    assert_eq!(props.id, 10);
    assert_eq!(props.n_sub_properties(), 2);
    assert_eq!(props.sub_properties(0)?.get(Variable::FrictionAngle)?, 20.0);

    // allocation and evaluation
    let ideal = Idealization::new(2);
    let mut law = allocate_law(&props, &ideal, &Config::new())?;
    assert_eq!(law.voigt_size(), 3);
    assert!(!law.symmetric_tangent());
    let path = StrainPath::from_json(r#"{"voigt_size": 3, "strains": [[0.0, 0.001, 0.0], [0.0, 0.003, 0.001]]}"#)?;
    let results = path.follow(law.as_mut(), true)?;
    assert_eq!(results.states.len(), 2);
    approx_eq(results.states[0].strain[1], 0.001, 1e-15);

    // the calculation is repeatable (trial evaluations do not commit)
    let mut p1 = ConstitutiveLawParameters::with_strain(&[0.0005, 0.004, 0.002]);
    let mut p2 = p1.clone();
    law.calculate_material_response(&mut p1)?;
    law.calculate_material_response(&mut p2)?;
    for i in 0..3 {
        assert_eq!(p1.stress[i], p2.stress[i]);
    }

    // round trip
    let json = props.to_json()?;
    assert_eq!(Properties::from_json(&json)?, props);

    // missing sub-properties
    let mut single = Properties::from_json(r#"{"id": 20, "law": {"SerialParallel": {"fiber_fraction": 0.4, "parallel_directions": [true, false, true]}}}"#)?;
    assert_eq!(
        allocate_law(&single, &ideal, &Config::new()).err(),
        Some(Error::input("sub-properties 0 are missing (properties 20)"))
    );
    single.add_sub_properties(props.sub_properties(0)?.clone());
    assert_eq!(
        allocate_law(&single, &ideal, &Config::new()).err(),
        Some(Error::input("sub-properties 1 are missing (properties 20)"))
    );

    // invalid fiber fraction
    let bad = SampleProperties::serial_parallel(
        SampleProperties::linear_elastic(1.0, 0.2),
        SampleProperties::linear_elastic(2.0, 0.2),
        1.0,
        &[true, false, true],
    );
    assert_eq!(
        allocate_law(&bad, &ideal, &Config::new()).err(),
        Some(Error::input("the fiber volumetric participation must be in (0, 1)"))
    );
    Ok(())
}
