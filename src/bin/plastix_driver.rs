use plastix::prelude::*;
use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

/// Command line options
#[derive(StructOpt, Debug)]
#[structopt(
    name = "plastix_driver",
    about = "Drives a constitutive law through a total strain path and prints the stresses"
)]
struct Options {
    /// JSON file with the material properties
    properties: String,

    /// JSON file with the strain path
    path: String,

    /// Space dimension (2 or 3)
    #[structopt(long, default_value = "3")]
    ndim: usize,

    /// Uses the plane-stress idealization in 2D
    #[structopt(long)]
    plane_stress: bool,

    /// Computes and prints the tangent matrix of the last state
    #[structopt(long)]
    tangent: bool,
}

fn run(options: &Options) -> Result<()> {
    if options.ndim != 2 && options.ndim != 3 {
        return Err(Error::input("ndim must be 2 or 3"));
    }
    let mut ideal = Idealization::new(options.ndim);
    ideal.plane_stress = options.ndim == 2 && options.plane_stress;

    let props = Properties::read_json(&options.properties)?;
    let path = StrainPath::read_json(&options.path)?;
    let config = Config::new();
    let mut law = allocate_law(&props, &ideal, &config)?;
    law.initialize_material()?;

    let results = path.follow(law.as_mut(), options.tangent)?;
    println!("{} ({} states)", law.name(), results.states.len());
    print!("{}", results);
    if let Some(tangent) = results.states.last().and_then(|s| s.tangent.as_ref()) {
        println!("tangent of the last state =\n{}", tangent);
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let options = Options::from_args();
    if let Err(e) = run(&options) {
        eprintln!("ERROR: {}", e);
        std::process::exit(1);
    }
}
